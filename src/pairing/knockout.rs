//! Single-elimination pairing (§4.3.4): rating-seeded bracket, byes to the
//! highest seeds in round 1, winners advance in bracket order.

use crate::domain::dto::SectionPairingResult;
use crate::domain::model::{ByeType, Pairing};
use crate::error::EngineResult;
use crate::identifiers::{PlayerId, TournamentId};

/// One player entering bracket seeding.
#[derive(Debug, Clone)]
pub struct KnockoutPlayer {
    pub id: PlayerId,
    pub name: String,
    pub rating: i32,
}

/// Standard single-elimination seeding for a bracket of size `n` (a power of
/// two): seed 1 plays seed n, seed 2 plays seed n-1, and so on, recursively
/// consistent so seeds 1 and 2 can only meet in the final.
fn bracket_order(n: usize) -> Vec<usize> {
    let mut order = vec![1usize];
    while order.len() < n {
        let round_size = order.len() * 2;
        let mut next = Vec::with_capacity(round_size);
        for seed in &order {
            next.push(*seed);
            next.push(round_size + 1 - *seed);
        }
        order = next;
    }
    order
}

/// Pairs round 1 of the bracket. Byes are assigned to the highest seeds when
/// the field isn't a power of two.
pub fn pair_round_one(
    tournament_id: TournamentId,
    section: &str,
    players: Vec<KnockoutPlayer>,
) -> EngineResult<SectionPairingResult> {
    let mut sorted = players;
    sorted.sort_by(|a, b| b.rating.cmp(&a.rating).then_with(|| a.name.cmp(&b.name)));
    let n = sorted.len();
    let bracket_size = n.next_power_of_two().max(1);
    let byes = bracket_size - n;
    let order = bracket_order(bracket_size);

    // Map seed number -> player, with the lowest `byes` seeds (weakest
    // players) replaced by a phantom opponent so the top seeds draw them.
    let mut by_seed: Vec<Option<KnockoutPlayer>> = sorted.into_iter().map(Some).collect();
    for _ in 0..byes {
        by_seed.push(None);
    }

    let mut pairings = Vec::new();
    let mut board = 1;
    for pair in order.chunks(2) {
        let (seed_a, seed_b) = (pair[0], pair[1]);
        let a = by_seed[seed_a - 1].take();
        let b = by_seed[seed_b - 1].take();
        match (a, b) {
            (Some(x), Some(y)) => {
                pairings.push(Pairing::game(tournament_id, 1, section, board, x.id, y.id));
            }
            (Some(x), None) | (None, Some(x)) => {
                pairings.push(Pairing::bye(tournament_id, 1, section, board, x.id, ByeType::Bye));
            }
            (None, None) => continue,
        }
        board += 1;
    }
    Ok(SectionPairingResult { pairings, warnings: vec![] })
}

/// Pairs a later bracket round from the advancing winners, in the order they
/// advanced (bracket order is preserved by always taking winners pairwise).
pub fn pair_next_round(
    tournament_id: TournamentId,
    section: &str,
    round: u32,
    advancing: Vec<PlayerId>,
) -> EngineResult<SectionPairingResult> {
    let mut pairings = Vec::new();
    let mut board = 1;
    for pair in advancing.chunks(2) {
        if let [a, b] = pair {
            pairings.push(Pairing::game(tournament_id, round, section, board, *a, *b));
            board += 1;
        }
    }
    Ok(SectionPairingResult { pairings, warnings: vec![] })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(name: &str, rating: i32) -> KnockoutPlayer {
        KnockoutPlayer { id: PlayerId::random(), name: name.to_string(), rating }
    }

    #[test]
    fn power_of_two_field_has_no_byes() {
        let tid = TournamentId::random();
        let players: Vec<KnockoutPlayer> = (0..8).map(|i| player(&format!("p{i}"), 2000 - i * 50)).collect();
        let result = pair_round_one(tid, "Open", players).unwrap();
        assert_eq!(result.pairings.len(), 4);
        assert!(result.pairings.iter().all(|p| !p.is_bye()));
    }

    #[test]
    fn non_power_of_two_gives_byes_to_top_seeds() {
        let tid = TournamentId::random();
        let players: Vec<KnockoutPlayer> = (0..5).map(|i| player(&format!("p{i}"), 2000 - i * 50)).collect();
        let top_seed_id = players[0].id;
        let result = pair_round_one(tid, "Open", players).unwrap();
        // Bracket size 8, 3 byes go to seeds 1-3.
        let bye_ids: Vec<PlayerId> = result
            .pairings
            .iter()
            .filter(|p| p.is_bye())
            .map(|p| p.white_id.unwrap())
            .collect();
        assert_eq!(bye_ids.len(), 3);
        assert!(bye_ids.contains(&top_seed_id));
    }

    #[test]
    fn bracket_order_keeps_top_two_seeds_apart_until_final() {
        let order = bracket_order(8);
        assert_eq!(order, vec![1, 8, 4, 5, 2, 7, 3, 6]);
    }
}
