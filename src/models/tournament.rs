//! Tournament, TournamentPhase, and the phase state machine.

use crate::logic::{
    derive_qualifiers, generate_finals, generate_opening_round, generate_round_robin,
    generate_semifinals, rank, resolve, round_count, standings, Finals, Standings,
};
use crate::models::game::{EliminationStage, Match, MatchId, MatchResult, Round};
use crate::models::player::{Player, PlayerId};
use crate::store::TournamentRecord;
use serde::{Deserialize, Serialize};

/// Errors that can occur during tournament operations.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TournamentError {
    /// No group or elimination match has this id.
    MatchNotFound(MatchId),
    /// The match already has a result; it is kept as is.
    MatchAlreadyDecided { id: MatchId, result: MatchResult },
    /// Result literal is not one of "1-0", "0-1", "0.5-0.5".
    InvalidResult(String),
    /// Bracket requested before every group match has a result.
    GroupStageIncomplete,
    /// Semifinals requested before every quarterfinal has a result.
    QuarterfinalsIncomplete,
    /// Final requested before every semifinal has a result.
    SemifinalsIncomplete,
    /// Tournament is not in a phase that allows this action.
    InvalidState,
    /// Not enough players to schedule a group stage.
    NotEnoughPlayers { required: usize },
    /// A player with this name is already registered (case-insensitive, Unicode-aware).
    DuplicatePlayerName(String),
    /// A match refers to a player missing from the standings.
    PlayerNotFound(PlayerId),
}

impl std::fmt::Display for TournamentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentError::MatchNotFound(id) => write!(f, "Match {} not found", id),
            TournamentError::MatchAlreadyDecided { id, result } => {
                write!(f, "Match {} already has a result ({})", id, result)
            }
            TournamentError::InvalidResult(literal) => {
                write!(f, "Invalid result '{}'. Use 1-0, 0-1 or 0.5-0.5", literal)
            }
            TournamentError::GroupStageIncomplete => {
                write!(f, "All group stage matches must be decided first")
            }
            TournamentError::QuarterfinalsIncomplete => {
                write!(f, "All quarterfinals must be decided first")
            }
            TournamentError::SemifinalsIncomplete => {
                write!(f, "All semifinals must be decided before the final")
            }
            TournamentError::InvalidState => write!(f, "Invalid state for this action"),
            TournamentError::NotEnoughPlayers { required } => {
                write!(f, "Need at least {} players", required)
            }
            TournamentError::DuplicatePlayerName(name) => {
                write!(f, "A player named '{}' is already registered", name)
            }
            TournamentError::PlayerNotFound(id) => write!(f, "Player {} not found", id),
        }
    }
}

impl std::error::Error for TournamentError {}

/// Current phase of the tournament. Only ever moves forward.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentPhase {
    /// Registering players.
    #[default]
    Setup,
    /// Round-robin rounds.
    GroupStage,
    /// Knockout bracket seeded from the group table.
    Elimination,
    /// Final (and third-place match, if any) decided.
    Finished,
}

/// Which round a batch of fixtures belongs to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundTag {
    Group(u32),
    /// Knockout matches, reported together.
    Elimination,
}

/// A round label together with its matches.
#[derive(Clone, Debug, PartialEq)]
pub struct RoundFixtures<'a> {
    pub round: RoundTag,
    pub matches: Vec<&'a Match>,
}

/// Top three once the tournament is finished.
#[derive(Clone, Debug, PartialEq)]
pub struct Podium<'a> {
    pub champion: &'a Player,
    pub runner_up: &'a Player,
    /// None for a two-player bracket, which has no third-place match.
    pub third: Option<&'a Player>,
}

/// Full tournament state: roster, standings, fixtures, and phase.
///
/// `standings` owns every player's record; matches hold player ids and are
/// resolved against it when read.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(into = "TournamentRecord", try_from = "TournamentRecord")]
pub struct Tournament {
    name: String,
    /// Registration order.
    players: Vec<PlayerId>,
    standings: Standings,
    group_matches: Vec<Match>,
    elimination_matches: Vec<Match>,
    phase: TournamentPhase,
    /// Group stage pointer (1-based); 0 until the group stage starts.
    current_round: u32,
}

enum Slot {
    Group(usize),
    Elimination(usize),
}

impl Tournament {
    /// Create an empty tournament in Setup.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            players: Vec::new(),
            standings: Standings::new(),
            group_matches: Vec::new(),
            elimination_matches: Vec::new(),
            phase: TournamentPhase::Setup,
            current_round: 0,
        }
    }

    /// Rebuild a tournament from already-validated parts (used by the store).
    pub(crate) fn from_parts(
        name: String,
        players: Vec<PlayerId>,
        standings: Standings,
        group_matches: Vec<Match>,
        elimination_matches: Vec<Match>,
        phase: TournamentPhase,
        current_round: u32,
    ) -> Self {
        Self {
            name,
            players,
            standings,
            group_matches,
            elimination_matches,
            phase,
            current_round,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phase(&self) -> TournamentPhase {
        self.phase
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn group_matches(&self) -> &[Match] {
        &self.group_matches
    }

    pub fn elimination_matches(&self) -> &[Match] {
        &self.elimination_matches
    }

    /// Canonical record for a player.
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.standings.get(&id)
    }

    /// Players in registration order.
    pub fn roster(&self) -> Vec<&Player> {
        self.players
            .iter()
            .filter_map(|id| self.standings.get(id))
            .collect()
    }

    /// Register players (Setup only). Ids are assigned 1..=k in input order.
    /// Names are trimmed and blank entries skipped; calling again replaces the roster.
    pub fn register_players<I, S>(&mut self, names: I) -> Result<(), TournamentError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.phase != TournamentPhase::Setup {
            return Err(TournamentError::InvalidState);
        }
        let mut roster: Vec<Player> = Vec::new();
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            let folded = name.to_lowercase();
            if roster.iter().any(|p| p.name.to_lowercase() == folded) {
                return Err(TournamentError::DuplicatePlayerName(name.to_string()));
            }
            roster.push(Player::new(roster.len() as PlayerId + 1, name));
        }

        self.players = roster.iter().map(|p| p.id).collect();
        self.standings = roster.into_iter().map(|p| (p.id, p)).collect();
        log::info!("'{}': registered {} players", self.name, self.players.len());
        Ok(())
    }

    /// Schedule the round robin and enter the group stage at round 1.
    pub fn start_group_stage(&mut self) -> Result<&[Match], TournamentError> {
        if self.phase != TournamentPhase::Setup {
            return Err(TournamentError::InvalidState);
        }
        if self.players.len() < 2 {
            return Err(TournamentError::NotEnoughPlayers { required: 2 });
        }
        self.group_matches = generate_round_robin(&self.players);
        self.phase = TournamentPhase::GroupStage;
        self.current_round = 1;
        log::info!(
            "'{}': group stage started with {} matches over {} rounds",
            self.name,
            self.group_matches.len(),
            round_count(self.players.len())
        );
        Ok(&self.group_matches)
    }

    fn locate(&self, match_id: MatchId) -> Option<Slot> {
        // Group stage first; ids never collide across the two lists.
        self.group_matches
            .iter()
            .position(|m| m.id == match_id)
            .map(Slot::Group)
            .or_else(|| {
                self.elimination_matches
                    .iter()
                    .position(|m| m.id == match_id)
                    .map(Slot::Elimination)
            })
    }

    /// Look up a match by id in either list.
    pub fn find_match(&self, match_id: MatchId) -> Option<&Match> {
        match self.locate(match_id)? {
            Slot::Group(i) => self.group_matches.get(i),
            Slot::Elimination(i) => self.elimination_matches.get(i),
        }
    }

    /// Record a result given as a literal ("1-0", "0-1", "0.5-0.5").
    ///
    /// Checks run in order: the match exists, it is still open, the literal is
    /// valid. Returns the updated match.
    pub fn record_result(
        &mut self,
        match_id: MatchId,
        result: &str,
    ) -> Result<Match, TournamentError> {
        let game = self
            .find_match(match_id)
            .ok_or(TournamentError::MatchNotFound(match_id))?;
        if let Some(existing) = game.result {
            return Err(TournamentError::MatchAlreadyDecided {
                id: match_id,
                result: existing,
            });
        }
        let result: MatchResult = result.parse()?;
        self.record(match_id, result)
    }

    /// Record a result and fire any phase transition it completes: the last
    /// group match seeds the bracket, a finished knockout stage generates the
    /// next one, and a decided final finishes the tournament.
    ///
    /// The result and the transition are applied to a staged copy and
    /// committed together, so an error leaves the tournament untouched.
    pub fn record(
        &mut self,
        match_id: MatchId,
        result: MatchResult,
    ) -> Result<Match, TournamentError> {
        let slot = self
            .locate(match_id)
            .ok_or(TournamentError::MatchNotFound(match_id))?;
        let mut staged = self.clone();
        let game = staged.apply(slot, result)?;
        *self = staged;
        log::debug!(
            "'{}': match {} ({} vs {}) recorded as {}",
            self.name,
            game.id,
            game.player1,
            game.player2,
            result
        );
        Ok(game)
    }

    fn apply(&mut self, slot: Slot, result: MatchResult) -> Result<Match, TournamentError> {
        match slot {
            Slot::Group(i) => {
                let game = &mut self.group_matches[i];
                standings::apply_result(game, result, &mut self.standings)?;
                let game = game.clone();
                if self.phase == TournamentPhase::GroupStage && self.is_group_stage_complete() {
                    self.start_elimination()?;
                }
                Ok(game)
            }
            Slot::Elimination(i) => {
                let game = &mut self.elimination_matches[i];
                standings::apply_result(game, result, &mut self.standings)?;
                let game = game.clone();
                self.advance_bracket()?;
                Ok(game)
            }
        }
    }

    pub fn is_group_stage_complete(&self) -> bool {
        !self.group_matches.is_empty() && self.group_matches.iter().all(Match::is_decided)
    }

    fn start_elimination(&mut self) -> Result<(), TournamentError> {
        let qualifiers = derive_qualifiers(&self.standings, &self.group_matches)?;
        let first_id = self.group_matches.iter().map(|m| m.id).max().unwrap_or(0) + 1;
        self.elimination_matches = generate_opening_round(&qualifiers, first_id);
        self.phase = TournamentPhase::Elimination;
        log::info!(
            "'{}': group stage complete, {} qualifiers, {} opening bracket matches",
            self.name,
            qualifiers.len(),
            self.elimination_matches.len()
        );
        Ok(())
    }

    fn next_elimination_id(&self) -> MatchId {
        self.elimination_matches
            .iter()
            .map(|m| m.id)
            .max()
            .unwrap_or(0)
            + 1
    }

    fn stage_matches(&self, stage: EliminationStage) -> Vec<&Match> {
        self.elimination_matches
            .iter()
            .filter(|m| m.stage() == Some(stage))
            .collect()
    }

    /// Generate the next knockout stage once every bracket match so far is decided.
    fn advance_bracket(&mut self) -> Result<(), TournamentError> {
        if self.elimination_matches.iter().any(|m| !m.is_decided()) {
            return Ok(());
        }
        match self.elimination_matches.last().and_then(Match::stage) {
            Some(EliminationStage::Quarterfinals) => {
                let next_id = self.next_elimination_id();
                let semis = generate_semifinals(
                    &self.stage_matches(EliminationStage::Quarterfinals),
                    &self.standings,
                    next_id,
                )?;
                log::info!("'{}': quarterfinals complete, semifinals generated", self.name);
                self.elimination_matches.extend(semis);
            }
            Some(EliminationStage::Semifinals) => {
                self.generate_finals()?;
            }
            Some(EliminationStage::Final | EliminationStage::ThirdPlace) => {
                self.phase = TournamentPhase::Finished;
                log::info!("'{}': tournament finished", self.name);
            }
            None => {}
        }
        Ok(())
    }

    /// Generate the final and third-place match from the decided semifinals.
    /// Runs automatically when the last semifinal is recorded.
    pub fn generate_finals(&mut self) -> Result<Finals, TournamentError> {
        if self.phase != TournamentPhase::Elimination {
            return Err(TournamentError::InvalidState);
        }
        if !self.stage_matches(EliminationStage::Final).is_empty() {
            return Err(TournamentError::InvalidState);
        }
        let semifinals = self.stage_matches(EliminationStage::Semifinals);
        if semifinals.is_empty() {
            return Err(TournamentError::InvalidState);
        }
        let finals = generate_finals(&semifinals, &self.standings, self.next_elimination_id())?;
        self.elimination_matches.push(finals.final_match.clone());
        self.elimination_matches.push(finals.third_place.clone());
        log::info!(
            "'{}': semifinals complete, final is match {}, third place is match {}",
            self.name,
            finals.final_match.id,
            finals.third_place.id
        );
        Ok(finals)
    }

    /// Move to the next group round when every match of the current one is decided.
    /// Returns whether the round advanced; a no-op outside the group stage.
    pub fn advance_round(&mut self) -> bool {
        if self.phase != TournamentPhase::GroupStage {
            return false;
        }
        let current = self.matches_in_round(self.current_round);
        if current.is_empty() || !current.iter().all(|m| m.is_decided()) {
            return false;
        }
        if self.current_round >= self.last_group_round() {
            return false;
        }
        self.current_round += 1;
        log::debug!("'{}': advanced to round {}", self.name, self.current_round);
        true
    }

    fn last_group_round(&self) -> u32 {
        self.group_matches
            .iter()
            .filter_map(|m| match m.round {
                Round::Group(r) => Some(r),
                Round::Elimination(_) => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// Classification: points, then wins, then name.
    pub fn standings(&self) -> Vec<&Player> {
        rank(self.standings.values())
    }

    /// Group matches scheduled in round `round`.
    pub fn matches_in_round(&self, round: u32) -> Vec<&Match> {
        self.group_matches
            .iter()
            .filter(|m| m.round == Round::Group(round))
            .collect()
    }

    /// Group stage: the current round. Elimination: every undecided bracket match.
    pub fn current_round_matches(&self) -> Vec<&Match> {
        match self.phase {
            TournamentPhase::GroupStage => self.matches_in_round(self.current_round),
            TournamentPhase::Elimination => self.open_elimination_matches(),
            TournamentPhase::Setup | TournamentPhase::Finished => Vec::new(),
        }
    }

    /// Group stage: the latest fully decided round before the current one.
    /// Elimination: every decided bracket match, once there is at least one.
    pub fn last_completed_round(&self) -> Option<RoundFixtures<'_>> {
        match self.phase {
            TournamentPhase::GroupStage => (1..self.current_round).rev().find_map(|r| {
                let matches = self.matches_in_round(r);
                (!matches.is_empty() && matches.iter().all(|m| m.is_decided())).then(|| {
                    RoundFixtures {
                        round: RoundTag::Group(r),
                        matches,
                    }
                })
            }),
            TournamentPhase::Elimination => {
                let matches: Vec<&Match> = self
                    .elimination_matches
                    .iter()
                    .filter(|m| m.is_decided())
                    .collect();
                (!matches.is_empty()).then_some(RoundFixtures {
                    round: RoundTag::Elimination,
                    matches,
                })
            }
            TournamentPhase::Setup | TournamentPhase::Finished => None,
        }
    }

    /// Group stage: each later round with its matches. Elimination: the
    /// undecided bracket matches as a single entry.
    pub fn upcoming_matches(&self) -> Vec<RoundFixtures<'_>> {
        match self.phase {
            TournamentPhase::GroupStage => (self.current_round + 1..=self.last_group_round())
                .map(|r| RoundFixtures {
                    round: RoundTag::Group(r),
                    matches: self.matches_in_round(r),
                })
                .filter(|f| !f.matches.is_empty())
                .collect(),
            TournamentPhase::Elimination => {
                let matches = self.open_elimination_matches();
                if matches.is_empty() {
                    Vec::new()
                } else {
                    vec![RoundFixtures {
                        round: RoundTag::Elimination,
                        matches,
                    }]
                }
            }
            TournamentPhase::Setup | TournamentPhase::Finished => Vec::new(),
        }
    }

    fn open_elimination_matches(&self) -> Vec<&Match> {
        self.elimination_matches
            .iter()
            .filter(|m| !m.is_decided())
            .collect()
    }

    /// Champion, runner-up, and third place once the tournament is finished.
    pub fn podium(&self) -> Option<Podium<'_>> {
        if self.phase != TournamentPhase::Finished {
            return None;
        }
        let decided = |stage| {
            self.stage_matches(stage)
                .first()
                .and_then(|m| resolve(m, &self.standings))
        };
        let (champion, runner_up) = decided(EliminationStage::Final)?;
        let third =
            decided(EliminationStage::ThirdPlace).and_then(|(winner, _)| self.player(winner));
        Some(Podium {
            champion: self.player(champion)?,
            runner_up: self.player(runner_up)?,
            third,
        })
    }

    pub(crate) fn standings_table(&self) -> &Standings {
        &self.standings
    }
}
