//! Integration tests for registration, result recording, and group-stage queries.

use chess_tournament::{
    rank, MatchResult, Player, RoundTag, Tournament, TournamentError, TournamentPhase,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn started(names: &[&str]) -> Tournament {
    let mut t = Tournament::new("Club Championship");
    t.register_players(names).unwrap();
    t.start_group_stage().unwrap();
    t
}

fn points(t: &Tournament) -> Vec<(u32, u32)> {
    t.roster().iter().map(|p| (p.id, p.points)).collect()
}

#[test]
fn register_assigns_sequential_ids_in_input_order() {
    let mut t = Tournament::new("Open");
    t.register_players([" Ana ", "Luis", "", "Marta"]).unwrap();
    let roster = t.roster();
    let names: Vec<(u32, &str)> = roster.iter().map(|p| (p.id, p.name.as_str())).collect();
    assert_eq!(names, vec![(1, "Ana"), (2, "Luis"), (3, "Marta")]);
    assert!(roster
        .iter()
        .all(|p| p.points == 0 && p.matches_played == 0 && p.wins == 0));
    assert_eq!(t.phase(), TournamentPhase::Setup);
    assert_eq!(t.current_round(), 0);
}

#[test]
fn register_rejects_duplicate_names() {
    let mut t = Tournament::new("Open");
    assert_eq!(
        t.register_players(["Ana", "ana"]),
        Err(TournamentError::DuplicatePlayerName("ana".to_string()))
    );
}

#[test]
fn register_folds_non_ascii_case() {
    let mut t = Tournament::new("Open");
    assert_eq!(
        t.register_players(["Ñandú", "ñandú"]),
        Err(TournamentError::DuplicatePlayerName("ñandú".to_string()))
    );
    assert_eq!(t.register_players(["Ñandú", "Nandu"]), Ok(()));
}

#[test]
fn register_only_in_setup() {
    let mut t = started(&["A", "B"]);
    assert_eq!(t.register_players(["C"]), Err(TournamentError::InvalidState));
    assert_eq!(t.start_group_stage().err(), Some(TournamentError::InvalidState));
}

#[test]
fn start_requires_two_players() {
    let mut t = Tournament::new("Open");
    t.register_players(["Solo"]).unwrap();
    assert_eq!(
        t.start_group_stage().err(),
        Some(TournamentError::NotEnoughPlayers { required: 2 })
    );
    assert_eq!(t.phase(), TournamentPhase::Setup);
}

#[test]
fn start_enters_group_stage_at_round_one() {
    let t = started(&["A", "B", "C", "D"]);
    assert_eq!(t.phase(), TournamentPhase::GroupStage);
    assert_eq!(t.current_round(), 1);
    assert_eq!(t.group_matches().len(), 6);
    assert_eq!(t.current_round_matches().len(), 2);
}

#[test]
fn unknown_match_fails_and_leaves_standings_alone() {
    let mut t = started(&["A", "B", "C"]);
    let before = points(&t);
    assert_eq!(
        t.record_result(999, "1-0").err(),
        Some(TournamentError::MatchNotFound(999))
    );
    assert_eq!(points(&t), before);
}

#[test]
fn results_are_write_once() {
    let mut t = started(&["A", "B", "C", "D"]);
    let id = t.group_matches()[0].id;
    t.record_result(id, "1-0").unwrap();
    let before = points(&t);

    for again in ["1-0", "0-1", "0.5-0.5", "bogus"] {
        assert_eq!(
            t.record_result(id, again).err(),
            Some(TournamentError::MatchAlreadyDecided {
                id,
                result: MatchResult::Player1Wins
            })
        );
    }
    assert_eq!(points(&t), before);
    assert_eq!(t.find_match(id).and_then(|m| m.result), Some(MatchResult::Player1Wins));
}

#[test]
fn invalid_literal_is_rejected_before_anything_changes() {
    let mut t = started(&["A", "B", "C", "D"]);
    let id = t.group_matches()[0].id;
    assert_eq!(
        t.record_result(id, "2-0").err(),
        Some(TournamentError::InvalidResult("2-0".to_string()))
    );
    assert!(t.roster().iter().all(|p| p.matches_played == 0));
    assert_eq!(t.find_match(id).and_then(|m| m.result), None);
}

#[test]
fn results_update_both_players() {
    let mut t = started(&["A", "B"]);
    let m = t.group_matches()[0].clone();
    t.record_result(m.id, "0.5-0.5").unwrap();
    for pid in [m.player1, m.player2] {
        let p = t.player(pid).unwrap();
        assert_eq!((p.points, p.draws, p.matches_played), (1, 1, 1));
    }
}

#[test]
fn points_are_conserved_for_random_results() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut t = started(&["A", "B", "C", "D", "E", "F", "G"]);
    let ids: Vec<(u32, u32, u32)> = t
        .group_matches()
        .iter()
        .map(|m| (m.id, m.player1, m.player2))
        .collect();

    for (id, p1, p2) in ids {
        let before = t.player(p1).unwrap().points + t.player(p2).unwrap().points;
        let result = ["1-0", "0-1", "0.5-0.5"][rng.gen_range(0..3)];
        t.record_result(id, result).unwrap();
        let after = t.player(p1).unwrap().points + t.player(p2).unwrap().points;
        let expected = if result == "0.5-0.5" { 2 } else { 3 };
        assert_eq!(after - before, expected, "match {id} with {result}");
    }
}

#[test]
fn advance_round_waits_for_every_result() {
    let mut t = started(&["A", "B", "C", "D"]);
    let round_one: Vec<u32> = t.current_round_matches().iter().map(|m| m.id).collect();

    t.record_result(round_one[0], "1-0").unwrap();
    assert!(!t.advance_round());
    assert_eq!(t.current_round(), 1);

    t.record_result(round_one[1], "0-1").unwrap();
    assert!(t.advance_round());
    assert_eq!(t.current_round(), 2);
    assert!(!t.advance_round(), "second call without new results is a no-op");
    assert_eq!(t.current_round(), 2);
}

#[test]
fn advance_round_is_a_no_op_outside_group_stage() {
    let mut t = Tournament::new("Open");
    t.register_players(["A", "B"]).unwrap();
    assert!(!t.advance_round());
    assert_eq!(t.current_round(), 0);
}

#[test]
fn standings_sort_by_points_then_wins_then_name() {
    let mut zed = Player::new(1, "Zed");
    zed.points = 6;
    zed.wins = 2;
    let mut amy = Player::new(2, "Amy");
    amy.points = 6;
    amy.wins = 1;
    let mut bob = Player::new(3, "Bob");
    bob.points = 9;
    bob.wins = 3;
    let mut cat = Player::new(4, "Cat");
    cat.points = 6;
    cat.wins = 1;

    let players = [zed, amy, bob, cat];
    let order: Vec<&str> = rank(&players).iter().map(|p| p.name.as_str()).collect();
    assert_eq!(order, vec!["Bob", "Zed", "Amy", "Cat"]);
}

#[test]
fn standings_are_strictly_descending_for_distinct_points() {
    let mut t = started(&["A", "B", "C", "D"]);
    let matches: Vec<(u32, u32, u32)> = t
        .group_matches()
        .iter()
        .map(|m| (m.id, m.player1, m.player2))
        .collect();
    // Lower id always wins: 9, 6, 3, 0 points.
    for (id, p1, p2) in matches {
        t.record_result(id, if p1 < p2 { "1-0" } else { "0-1" }).unwrap();
    }
    let table: Vec<u32> = t.standings().iter().map(|p| p.points).collect();
    assert_eq!(table, vec![9, 6, 3, 0]);
}

#[test]
fn round_queries_follow_the_current_round() {
    let mut t = started(&["A", "B", "C", "D", "E"]);
    assert_eq!(t.matches_in_round(1).len(), 2);
    assert!(t.last_completed_round().is_none());

    let upcoming = t.upcoming_matches();
    let rounds: Vec<RoundTag> = upcoming.iter().map(|f| f.round).collect();
    assert_eq!(
        rounds,
        vec![RoundTag::Group(2), RoundTag::Group(3), RoundTag::Group(4), RoundTag::Group(5)]
    );

    let round_one: Vec<u32> = t.matches_in_round(1).iter().map(|m| m.id).collect();
    for id in round_one {
        t.record_result(id, "1-0").unwrap();
    }
    assert!(t.advance_round());

    let last = t.last_completed_round().unwrap();
    assert_eq!(last.round, RoundTag::Group(1));
    assert_eq!(last.matches.len(), 2);
    assert!(t.current_round_matches().iter().all(|m| m.round == chess_tournament::Round::Group(2)));
    assert_eq!(t.upcoming_matches().len(), 3);
}

#[test]
fn five_players_promote_the_undefeated_player_to_first_seed() {
    let mut t = started(&["A", "B", "C", "D", "E"]);
    assert_eq!(t.group_matches().len(), 10);
    let rounds: std::collections::HashSet<_> = t.group_matches().iter().map(|m| m.round).collect();
    assert_eq!(rounds.len(), 5);

    let a = 1;
    let matches: Vec<(u32, u32, u32)> = t
        .group_matches()
        .iter()
        .map(|m| (m.id, m.player1, m.player2))
        .collect();
    for (id, p1, p2) in matches {
        let result = if p2 == a { "0-1" } else if p1 == a { "1-0" } else { "0.5-0.5" };
        t.record_result(id, result).unwrap();
    }

    assert_eq!(t.phase(), TournamentPhase::Elimination);
    assert_eq!(t.standings()[0].name, "A");
    let bracket = t.elimination_matches();
    assert_eq!(bracket.len(), 2);
    assert_eq!(bracket[0].player1, a);
    let ids: Vec<u32> = bracket.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![11, 12]);
}
