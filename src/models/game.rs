//! Match, its result, and the round it belongs to.

use crate::models::player::PlayerId;
use crate::models::tournament::TournamentError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a match within a tournament (assigned sequentially from 1).
pub type MatchId = u32;

/// Outcome of a decided game, written the way chess results are written.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum MatchResult {
    /// Player 1 wins.
    #[serde(rename = "1-0")]
    Player1Wins,
    /// Player 2 wins.
    #[serde(rename = "0-1")]
    Player2Wins,
    #[serde(rename = "0.5-0.5")]
    Draw,
}

impl MatchResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchResult::Player1Wins => "1-0",
            MatchResult::Player2Wins => "0-1",
            MatchResult::Draw => "0.5-0.5",
        }
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchResult {
    type Err = TournamentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1-0" => Ok(MatchResult::Player1Wins),
            "0-1" => Ok(MatchResult::Player2Wins),
            "0.5-0.5" => Ok(MatchResult::Draw),
            other => Err(TournamentError::InvalidResult(other.to_string())),
        }
    }
}

/// Knockout stage a bracket match belongs to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EliminationStage {
    Quarterfinals,
    Semifinals,
    ThirdPlace,
    Final,
}

/// Round label: a numbered group-stage round (1-based) or a knockout stage.
/// Serialized untagged, so group rounds appear as plain integers.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Round {
    Group(u32),
    Elimination(EliminationStage),
}

/// Tournament phase a match was created in.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    GroupStage,
    Elimination,
}

/// A single game between two players. Players are referenced by id; their
/// statistics live in the tournament's standings.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Match {
    pub id: MatchId,
    pub round: Round,
    pub player1: PlayerId,
    pub player2: PlayerId,
    /// None until the result is recorded; set at most once.
    pub result: Option<MatchResult>,
}

impl Match {
    pub fn new(id: MatchId, round: Round, player1: PlayerId, player2: PlayerId) -> Self {
        Self {
            id,
            round,
            player1,
            player2,
            result: None,
        }
    }

    pub fn is_decided(&self) -> bool {
        self.result.is_some()
    }

    pub fn phase(&self) -> MatchPhase {
        match self.round {
            Round::Group(_) => MatchPhase::GroupStage,
            Round::Elimination(_) => MatchPhase::Elimination,
        }
    }

    /// Knockout stage of this match, if it is a bracket match.
    pub fn stage(&self) -> Option<EliminationStage> {
        match self.round {
            Round::Group(_) => None,
            Round::Elimination(stage) => Some(stage),
        }
    }

    pub fn involves(&self, player: PlayerId) -> bool {
        self.player1 == player || self.player2 == player
    }
}
