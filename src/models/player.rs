//! Player record: identity plus cumulative standings statistics.

use serde::{Deserialize, Serialize};

/// Identifier assigned at registration (1-based, stable for the tournament's lifetime).
pub type PlayerId = u32;

/// A registered player and their running record.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub points: u32,
    pub matches_played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
}

impl Player {
    /// Create a player with the given id and name. All statistics start at zero.
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            points: 0,
            matches_played: 0,
            wins: 0,
            draws: 0,
            losses: 0,
        }
    }

    /// Record a win (3 points).
    pub fn add_win(&mut self) {
        self.matches_played += 1;
        self.wins += 1;
        self.points += 3;
    }

    /// Record a draw (1 point).
    pub fn add_draw(&mut self) {
        self.matches_played += 1;
        self.draws += 1;
        self.points += 1;
    }

    /// Record a loss.
    pub fn add_loss(&mut self) {
        self.matches_played += 1;
        self.losses += 1;
    }
}
