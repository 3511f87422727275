//! Standings: applying results to player records and ranking the table.

use crate::models::{Match, MatchResult, Player, PlayerId, TournamentError};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Canonical player records keyed by id. Matches refer into this table by id.
pub type Standings = BTreeMap<PlayerId, Player>;

/// Record `result` on `game` and credit both players in `standings`.
///
/// Decisive games give the winner 3 points; a draw gives each player 1.
/// Nothing is mutated unless the match is still open and both players exist.
pub fn apply_result(
    game: &mut Match,
    result: MatchResult,
    standings: &mut Standings,
) -> Result<(), TournamentError> {
    if let Some(existing) = game.result {
        return Err(TournamentError::MatchAlreadyDecided {
            id: game.id,
            result: existing,
        });
    }
    for pid in [game.player1, game.player2] {
        if !standings.contains_key(&pid) {
            return Err(TournamentError::PlayerNotFound(pid));
        }
    }

    let (p1, p2) = (game.player1, game.player2);
    let mut credit = |pid: PlayerId, apply: fn(&mut Player)| {
        if let Some(player) = standings.get_mut(&pid) {
            apply(player);
        }
    };
    match result {
        MatchResult::Player1Wins => {
            credit(p1, Player::add_win);
            credit(p2, Player::add_loss);
        }
        MatchResult::Player2Wins => {
            credit(p2, Player::add_win);
            credit(p1, Player::add_loss);
        }
        MatchResult::Draw => {
            credit(p1, Player::add_draw);
            credit(p2, Player::add_draw);
        }
    }
    game.result = Some(result);
    Ok(())
}

/// Table order: points descending, then wins descending, then name ascending.
/// Id is the last resort so the order is total.
pub fn compare(a: &Player, b: &Player) -> Ordering {
    b.points
        .cmp(&a.points)
        .then_with(|| b.wins.cmp(&a.wins))
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.id.cmp(&b.id))
}

/// Players sorted into table order. Used for display and for bracket seeding.
pub fn rank<'a>(players: impl IntoIterator<Item = &'a Player>) -> Vec<&'a Player> {
    let mut ranked: Vec<&Player> = players.into_iter().collect();
    ranked.sort_by(|a, b| compare(a, b));
    ranked
}
