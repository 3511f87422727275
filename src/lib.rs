//! Chess tournament organizer: round-robin group stage followed by a knockout
//! bracket, with a JSON store for persisting tournaments between runs.

pub mod logic;
pub mod models;
pub mod store;

pub use logic::{
    apply_result, bracket_size, derive_qualifiers, generate_finals, generate_opening_round,
    generate_round_robin, generate_semifinals, rank, Finals, Standings,
};
pub use models::{
    EliminationStage, Match, MatchId, MatchPhase, MatchResult, Player, PlayerId, Podium, Round,
    RoundFixtures, RoundTag, Tournament, TournamentError, TournamentPhase,
};
pub use store::{
    JsonFileStore, RestoreError, StoreError, TournamentId, TournamentMap, TournamentRecord,
    TournamentStore,
};
