//! Integration tests for round-robin fixture generation.

use chess_tournament::{generate_round_robin, PlayerId, Round};
use std::collections::{HashMap, HashSet};

fn ids(n: u32) -> Vec<PlayerId> {
    (1..=n).collect()
}

fn round_of(m: &chess_tournament::Match) -> u32 {
    match m.round {
        Round::Group(r) => r,
        Round::Elimination(_) => panic!("group fixture with a knockout label"),
    }
}

#[test]
fn every_pair_meets_exactly_once_for_2_to_16_players() {
    for n in 2..=16u32 {
        let matches = generate_round_robin(&ids(n));
        assert_eq!(matches.len() as u32, n * (n - 1) / 2, "match count for n={n}");

        let mut pairs = HashSet::new();
        for m in &matches {
            assert_ne!(m.player1, m.player2, "self pairing for n={n}");
            let pair = (m.player1.min(m.player2), m.player1.max(m.player2));
            assert!(pairs.insert(pair), "pair {pair:?} repeated for n={n}");
        }
    }
}

#[test]
fn nobody_plays_twice_in_a_round() {
    for n in 2..=16u32 {
        let matches = generate_round_robin(&ids(n));
        let mut seen: HashMap<u32, HashSet<PlayerId>> = HashMap::new();
        for m in &matches {
            let round = seen.entry(round_of(m)).or_default();
            assert!(round.insert(m.player1), "n={n}: {} twice in a round", m.player1);
            assert!(round.insert(m.player2), "n={n}: {} twice in a round", m.player2);
        }
    }
}

#[test]
fn odd_rosters_sit_each_player_out_exactly_once() {
    for n in (3..=15u32).step_by(2) {
        let matches = generate_round_robin(&ids(n));
        let rounds: HashSet<u32> = matches.iter().map(round_of).collect();
        assert_eq!(rounds.len() as u32, n, "n={n} needs n rounds");

        for p in ids(n) {
            let played: HashSet<u32> = matches
                .iter()
                .filter(|m| m.involves(p))
                .map(round_of)
                .collect();
            assert_eq!(played.len() as u32, n - 1, "player {p} of {n} should idle once");
        }
    }
}

#[test]
fn even_rosters_fill_every_round() {
    let matches = generate_round_robin(&ids(6));
    let mut per_round: HashMap<u32, usize> = HashMap::new();
    for m in &matches {
        *per_round.entry(round_of(m)).or_default() += 1;
    }
    assert_eq!(per_round.len(), 5);
    assert!(per_round.values().all(|&c| c == 3));
}

#[test]
fn ids_are_sequential_and_round_major() {
    let matches = generate_round_robin(&ids(5));
    let match_ids: Vec<u32> = matches.iter().map(|m| m.id).collect();
    assert_eq!(match_ids, (1..=10).collect::<Vec<_>>());
    let rounds: Vec<u32> = matches.iter().map(round_of).collect();
    let mut sorted = rounds.clone();
    sorted.sort();
    assert_eq!(rounds, sorted);
    assert_eq!(rounds.first(), Some(&1));
}

#[test]
fn generation_is_deterministic() {
    let roster = [4, 9, 2, 7, 1, 3, 8];
    assert_eq!(generate_round_robin(&roster), generate_round_robin(&roster));
}

#[test]
fn fewer_than_two_players_yield_no_matches() {
    assert!(generate_round_robin(&[]).is_empty());
    assert!(generate_round_robin(&[1]).is_empty());
}
