//! Group stage fixtures: round-robin schedule by the circle method.

use crate::models::{Match, MatchId, PlayerId, Round};

/// Generate the full round-robin schedule for `players`, in the given order.
///
/// An odd roster gets a bye slot appended; pairings against the bye are dropped,
/// so each player sits out exactly one round. With `n` slots (even) there are
/// `n - 1` rounds: slot `n - 1` stays fixed while the others rotate. Match ids
/// start at 1 and run round-major. Output depends only on input order.
pub fn generate_round_robin(players: &[PlayerId]) -> Vec<Match> {
    // None is the bye.
    let mut slots: Vec<Option<PlayerId>> = players.iter().copied().map(Some).collect();
    if slots.len() % 2 == 1 {
        slots.push(None);
    }
    let n = slots.len();
    if n < 2 {
        return Vec::new();
    }
    let rotating = n - 1;

    let mut matches = Vec::with_capacity(players.len() * players.len().saturating_sub(1) / 2);
    let mut next_id: MatchId = 1;

    for r in 0..rotating {
        for m in 0..n / 2 {
            let (home, away) = if m == 0 {
                // Alternate sides for the fixed slot so it does not always play second.
                if r % 2 == 0 {
                    (r, rotating)
                } else {
                    (rotating, r)
                }
            } else {
                ((r + m) % rotating, (rotating - m + r) % rotating)
            };

            if let (Some(p1), Some(p2)) = (slots[home], slots[away]) {
                matches.push(Match::new(next_id, Round::Group(r as u32 + 1), p1, p2));
                next_id += 1;
            }
        }
    }

    log::debug!(
        "generated {} group matches over {} rounds for {} players",
        matches.len(),
        rotating,
        players.len()
    );
    matches
}

/// Number of group rounds the schedule spans for `player_count` players.
pub fn round_count(player_count: usize) -> u32 {
    match player_count {
        0 | 1 => 0,
        n if n % 2 == 0 => (n - 1) as u32,
        n => n as u32,
    }
}
