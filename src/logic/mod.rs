//! Tournament logic: round-robin fixtures, standings, and the knockout bracket.

pub mod bracket;
pub mod fixtures;
pub mod standings;

pub use bracket::{
    bracket_size, derive_qualifiers, generate_finals, generate_opening_round, generate_semifinals,
    resolve, Finals,
};
pub use fixtures::{generate_round_robin, round_count};
pub use standings::{apply_result, rank, Standings};
