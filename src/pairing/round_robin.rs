//! Round-robin pairing via the circle method (§4.3.2).

use std::collections::HashMap;

use crate::domain::dto::SectionPairingResult;
use crate::domain::model::{ByeType, Pairing};
use crate::error::EngineResult;
use crate::identifiers::{PlayerId, TournamentId};

/// One player entering a round-robin section.
#[derive(Debug, Clone)]
pub struct RoundRobinPlayer {
    pub id: PlayerId,
    pub name: String,
    pub rating: i32,
}

/// Seeds players by (rating desc, name asc) into fixed circle-method slots.
/// Slot 0 stays fixed across rounds; the remaining slots rotate. An odd
/// player count gets a phantom `None` slot, which produces a bye pairing for
/// whoever it is paired against that round.
fn seed_slots(mut players: Vec<RoundRobinPlayer>) -> (Vec<Option<PlayerId>>, HashMap<PlayerId, i32>) {
    players.sort_by(|a, b| b.rating.cmp(&a.rating).then_with(|| a.name.cmp(&b.name)));
    let ratings: HashMap<PlayerId, i32> = players.iter().map(|p| (p.id, p.rating)).collect();
    let mut slots: Vec<Option<PlayerId>> = players.into_iter().map(|p| Some(p.id)).collect();
    if slots.len() % 2 == 1 {
        slots.push(None);
    }
    (slots, ratings)
}

/// Generates round `round` (1-based) of an N-1-round single round-robin
/// (§4.3.2). `round` must be in `1..=n-1` where `n` is the slot count
/// (players plus phantom if odd).
pub fn pair_round(
    tournament_id: TournamentId,
    section: &str,
    round: u32,
    players: Vec<RoundRobinPlayer>,
) -> EngineResult<SectionPairingResult> {
    let (slots, ratings) = seed_slots(players);
    let n = slots.len();
    if n < 2 {
        return Ok(SectionPairingResult::default());
    }

    let mut arr = slots;
    let rotation = ((round.saturating_sub(1)) as usize) % (n - 1);
    arr[1..].rotate_right(rotation);

    let mut pairings = Vec::new();
    let mut board = 1;
    for i in 0..n / 2 {
        let a = arr[i];
        let b = arr[n - 1 - i];
        match (a, b) {
            (Some(x), Some(y)) => {
                let (white, black) = if ratings[&x] >= ratings[&y] { (x, y) } else { (y, x) };
                pairings.push(Pairing::game(tournament_id, round, section, board, white, black));
                board += 1;
            }
            (Some(x), None) | (None, Some(x)) => {
                pairings.push(Pairing::bye(tournament_id, round, section, board, x, ByeType::Bye));
                board += 1;
            }
            (None, None) => {}
        }
    }
    Ok(SectionPairingResult { pairings, warnings: vec![] })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(name: &str, rating: i32) -> RoundRobinPlayer {
        RoundRobinPlayer { id: PlayerId::random(), name: name.to_string(), rating }
    }

    #[test]
    fn four_players_play_three_full_rounds() {
        let tid = TournamentId::random();
        let players = vec![player("A", 1800), player("B", 1700), player("C", 1600), player("D", 1500)];

        for round in 1..=3 {
            let result = pair_round(tid, "Open", round, players.clone()).unwrap();
            assert_eq!(result.pairings.len(), 2);
            for pairing in &result.pairings {
                assert!(!pairing.is_bye());
            }
        }
    }

    #[test]
    fn odd_count_produces_one_bye_per_round() {
        let tid = TournamentId::random();
        let players = vec![player("A", 1800), player("B", 1700), player("C", 1600)];

        for round in 1..=2 {
            let result = pair_round(tid, "Open", round, players.clone()).unwrap();
            assert_eq!(result.pairings.len(), 2);
            assert_eq!(result.pairings.iter().filter(|p| p.is_bye()).count(), 1);
        }
    }

    #[test]
    fn every_player_meets_every_other_exactly_once_across_all_rounds() {
        let tid = TournamentId::random();
        let players = vec![
            player("A", 1800),
            player("B", 1700),
            player("C", 1600),
            player("D", 1500),
            player("E", 1400),
        ];
        let mut seen: std::collections::HashSet<(PlayerId, PlayerId)> = std::collections::HashSet::new();
        for round in 1..=5 {
            let result = pair_round(tid, "Open", round, players.clone()).unwrap();
            for pairing in &result.pairings {
                if pairing.is_bye() {
                    continue;
                }
                let (a, b) = (pairing.white_id.unwrap(), pairing.black_id.unwrap());
                let key = if a < b { (a, b) } else { (b, a) };
                assert!(seen.insert(key), "players paired twice");
            }
        }
    }
}
