//! Property-based checks of the "Universal invariants" from spec.md §8,
//! exercised directly against the pure pairing functions (they take no
//! repository dependency, so proptest can drive them without an executor).

use std::collections::HashSet;

use pairing_core::identifiers::{PlayerId, TournamentId};
use pairing_core::pairing::round_robin::{self, RoundRobinPlayer};
use pairing_core::pairing::swiss::{self, SwissPlayer, SwissSettings};
use proptest::prelude::*;
use quickcheck::quickcheck;

fn fresh_swiss_player(name: String, rating: i32) -> SwissPlayer {
    SwissPlayer {
        id: PlayerId::random(),
        name,
        rating,
        score: 0.0,
        color_history: Vec::new(),
        opponents: HashSet::new(),
        has_had_automatic_bye: false,
        recently_floated_down: false,
    }
}

fn roster_strategy(min: usize, max: usize) -> impl Strategy<Value = Vec<(String, i32)>> {
    prop::collection::vec((400..2800i32), min..=max).prop_map(|ratings| {
        ratings
            .into_iter()
            .enumerate()
            .map(|(i, rating)| (format!("player-{i}"), rating))
            .collect()
    })
}

proptest! {
    /// Invariant 1: board numbers within a section/round are a dense
    /// sequence 1..k, with no gaps or repeats.
    #[test]
    fn swiss_round_one_board_numbers_are_dense(roster in roster_strategy(2, 40)) {
        let players: Vec<SwissPlayer> = roster.into_iter().map(|(n, r)| fresh_swiss_player(n, r)).collect();
        let tid = TournamentId::random();
        let result = swiss::pair_section(tid, "Open", 1, players, &SwissSettings::default()).unwrap();
        let mut boards: Vec<u32> = result.pairings.iter().map(|p| p.board).collect();
        boards.sort_unstable();
        let expected: Vec<u32> = (1..=boards.len() as u32).collect();
        prop_assert_eq!(boards, expected);
    }

    /// Invariant 2: every player entering the round appears in exactly one
    /// pairing of that round.
    #[test]
    fn swiss_round_one_pairs_every_player_exactly_once(roster in roster_strategy(2, 40)) {
        let players: Vec<SwissPlayer> = roster.into_iter().map(|(n, r)| fresh_swiss_player(n, r)).collect();
        let ids: HashSet<PlayerId> = players.iter().map(|p| p.id).collect();
        let tid = TournamentId::random();
        let result = swiss::pair_section(tid, "Open", 1, players, &SwissSettings::default()).unwrap();

        let mut seen = HashSet::new();
        for pairing in &result.pairings {
            for id in pairing.players() {
                prop_assert!(seen.insert(id), "player appeared in more than one pairing");
            }
        }
        prop_assert_eq!(seen, ids);
    }

    /// Invariant 6 (determinism): pairing the same snapshot twice with no
    /// intervening state change produces identical board assignments.
    #[test]
    fn swiss_pairing_is_deterministic_given_identical_inputs(roster in roster_strategy(2, 30)) {
        let players: Vec<SwissPlayer> = roster.into_iter().map(|(n, r)| fresh_swiss_player(n, r)).collect();
        let tid = TournamentId::random();
        let first = swiss::pair_section(tid, "Open", 1, players.clone(), &SwissSettings::default()).unwrap();
        let second = swiss::pair_section(tid, "Open", 1, players, &SwissSettings::default()).unwrap();

        let shape = |r: &pairing_core::domain::dto::SectionPairingResult| {
            r.pairings
                .iter()
                .map(|p| (p.board, p.white_id, p.black_id, p.bye_type))
                .collect::<Vec<_>>()
        };
        prop_assert_eq!(shape(&first), shape(&second));
    }

    /// Round-robin analogue of invariants 1 and 2.
    #[test]
    fn round_robin_round_one_covers_every_player_with_dense_boards(roster in roster_strategy(2, 20)) {
        let players: Vec<RoundRobinPlayer> = roster
            .into_iter()
            .map(|(name, rating)| RoundRobinPlayer { id: PlayerId::random(), name, rating })
            .collect();
        let ids: HashSet<PlayerId> = players.iter().map(|p| p.id).collect();
        let tid = TournamentId::random();
        let result = round_robin::pair_round(tid, "Open", 1, players).unwrap();

        let mut boards: Vec<u32> = result.pairings.iter().map(|p| p.board).collect();
        boards.sort_unstable();
        let expected: Vec<u32> = (1..=boards.len() as u32).collect();
        prop_assert_eq!(boards, expected);

        let mut seen = HashSet::new();
        for pairing in &result.pairings {
            for id in pairing.players() {
                prop_assert!(seen.insert(id));
            }
        }
        prop_assert_eq!(seen, ids);
    }
}

/// Invariant 3 (points per pairing), checked with quickcheck over arbitrary
/// small rosters rather than proptest's shrinking strategies, as a second
/// independent property-testing library alongside the proptest suite above.
fn round_robin_boards_total_one_point_per_game(player_count: u8) -> bool {
    let count = (player_count % 12) as usize + 2;
    let players: Vec<RoundRobinPlayer> = (0..count)
        .map(|i| RoundRobinPlayer { id: PlayerId::random(), name: format!("qc-{i}"), rating: 1000 + i as i32 })
        .collect();
    let tid = TournamentId::random();
    let Ok(result) = round_robin::pair_round(tid, "Open", 1, players) else { return false };
    result.pairings.iter().all(|p| p.white_id.is_some() && (p.is_bye() || p.black_id.is_some()))
}

quickcheck! {
    fn round_robin_round_one_is_well_formed(player_count: u8) -> bool {
        round_robin_boards_total_one_point_per_game(player_count)
    }
}
