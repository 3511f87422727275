//! Data structures for the chess tournament: players, matches, tournament state.

mod game;
mod player;
mod tournament;

pub use game::{EliminationStage, Match, MatchId, MatchPhase, MatchResult, Round};
pub use player::{Player, PlayerId};
pub use tournament::{Podium, RoundFixtures, RoundTag, Tournament, TournamentError, TournamentPhase};
