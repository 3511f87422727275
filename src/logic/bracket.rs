//! Knockout bracket: qualifier seeding from the group table, and the pairings
//! for each later stage derived from the previous stage's outcomes.

use crate::logic::standings::{rank, Standings};
use crate::models::{
    EliminationStage, Match, MatchId, MatchResult, PlayerId, Round, TournamentError,
};

/// Supported bracket sizes as `(minimum players, bracket size)`, largest first.
/// A group of `n` players seeds the first bracket whose minimum `n` reaches.
pub const BRACKET_SIZES: &[(usize, usize)] = &[(8, 8), (4, 4), (2, 2)];

/// Bracket size for a group of `player_count` players, or None below 2.
pub fn bracket_size(player_count: usize) -> Option<usize> {
    BRACKET_SIZES
        .iter()
        .find(|(min_players, _)| player_count >= *min_players)
        .map(|(_, size)| *size)
}

/// Stage the bracket opens with for a given bracket size.
pub fn opening_stage(bracket_size: usize) -> EliminationStage {
    match bracket_size {
        8 => EliminationStage::Quarterfinals,
        4 => EliminationStage::Semifinals,
        _ => EliminationStage::Final,
    }
}

/// Top of the group table, seeded 1..=k, where k is the bracket size for the group.
/// Every group match must be decided.
pub fn derive_qualifiers(
    standings: &Standings,
    group_matches: &[Match],
) -> Result<Vec<PlayerId>, TournamentError> {
    if group_matches.iter().any(|m| !m.is_decided()) {
        return Err(TournamentError::GroupStageIncomplete);
    }
    let size = bracket_size(standings.len())
        .ok_or(TournamentError::NotEnoughPlayers { required: 2 })?;
    Ok(rank(standings.values())
        .into_iter()
        .take(size)
        .map(|p| p.id)
        .collect())
}

/// Pair seeds 1-vs-last, 2-vs-second-to-last, and so on. Ids start at `first_id`.
pub fn pair_seeds(seeds: &[PlayerId], stage: EliminationStage, first_id: MatchId) -> Vec<Match> {
    let count = seeds.len();
    (0..count / 2)
        .map(|i| {
            Match::new(
                first_id + i as MatchId,
                Round::Elimination(stage),
                seeds[i],
                seeds[count - 1 - i],
            )
        })
        .collect()
}

/// First knockout round for the given qualifiers (quarterfinals, semifinals, or a
/// lone final, depending on how many qualified).
pub fn generate_opening_round(qualifiers: &[PlayerId], first_id: MatchId) -> Vec<Match> {
    pair_seeds(qualifiers, opening_stage(qualifiers.len()), first_id)
}

/// Winner and loser of a decided match. A drawn knockout game goes to the player
/// with more standings points; player 1 keeps the tie.
pub fn resolve(game: &Match, standings: &Standings) -> Option<(PlayerId, PlayerId)> {
    let (p1, p2) = (game.player1, game.player2);
    match game.result? {
        MatchResult::Player1Wins => Some((p1, p2)),
        MatchResult::Player2Wins => Some((p2, p1)),
        MatchResult::Draw => {
            let points = |pid: PlayerId| standings.get(&pid).map(|p| p.points).unwrap_or(0);
            if points(p1) >= points(p2) {
                Some((p1, p2))
            } else {
                Some((p2, p1))
            }
        }
    }
}

fn winners_and_losers(
    games: &[&Match],
    standings: &Standings,
    incomplete: TournamentError,
) -> Result<(Vec<PlayerId>, Vec<PlayerId>), TournamentError> {
    let mut winners = Vec::with_capacity(games.len());
    let mut losers = Vec::with_capacity(games.len());
    for game in games {
        let (winner, loser) = resolve(game, standings).ok_or_else(|| incomplete.clone())?;
        winners.push(winner);
        losers.push(loser);
    }
    Ok((winners, losers))
}

/// Semifinals from decided quarterfinals: winners, in quarterfinal order, paired 1-vs-last.
pub fn generate_semifinals(
    quarterfinals: &[&Match],
    standings: &Standings,
    first_id: MatchId,
) -> Result<Vec<Match>, TournamentError> {
    let (winners, _) = winners_and_losers(
        quarterfinals,
        standings,
        TournamentError::QuarterfinalsIncomplete,
    )?;
    Ok(pair_seeds(&winners, EliminationStage::Semifinals, first_id))
}

/// Final and third-place matches generated from the two semifinals.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Finals {
    pub final_match: Match,
    pub third_place: Match,
}

/// Final (semifinal winners) and third-place match (semifinal losers), in semifinal
/// order. The final takes `next_id`, the third-place match `next_id + 1`.
pub fn generate_finals(
    semifinals: &[&Match],
    standings: &Standings,
    next_id: MatchId,
) -> Result<Finals, TournamentError> {
    let (winners, losers) =
        winners_and_losers(semifinals, standings, TournamentError::SemifinalsIncomplete)?;
    if winners.len() != 2 {
        return Err(TournamentError::InvalidState);
    }
    Ok(Finals {
        final_match: Match::new(
            next_id,
            Round::Elimination(EliminationStage::Final),
            winners[0],
            winners[1],
        ),
        third_place: Match::new(
            next_id + 1,
            Round::Elimination(EliminationStage::ThirdPlace),
            losers[0],
            losers[1],
        ),
    })
}
