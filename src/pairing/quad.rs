//! Quad pairing (§4.3.3): consecutive groups of four by rating, each playing
//! an internal 3-round round-robin.

use crate::domain::dto::SectionPairingResult;
use crate::domain::model::{ByeType, Pairing};
use crate::error::EngineResult;
use crate::identifiers::{PlayerId, TournamentId};

/// One player entering quad assignment.
#[derive(Debug, Clone)]
pub struct QuadPlayer {
    pub id: PlayerId,
    pub name: String,
    pub rating: i32,
}

/// Splits a roster into consecutive quads by descending rating: `quad-1` gets
/// the top four, `quad-2` the next four, and so on. The final quad may have
/// fewer than four players (§4.3.3).
pub fn form_quads(mut players: Vec<QuadPlayer>) -> Vec<(String, Vec<QuadPlayer>)> {
    players.sort_by(|a, b| b.rating.cmp(&a.rating).then_with(|| a.name.cmp(&b.name)));
    players
        .chunks(4)
        .enumerate()
        .map(|(i, chunk)| (format!("quad-{}", i + 1), chunk.to_vec()))
        .collect()
}

/// Pairs one quad's internal round (1..=3), board numbers restarting at 1.
/// A quad always runs exactly three rounds; slots beyond the quad's actual
/// player count are phantoms that turn their opponent's pairing into a bye,
/// and a round with nothing to play (both slots phantom) produces no board
/// for that position.
pub fn pair_quad_round(
    tournament_id: TournamentId,
    quad_section: &str,
    round: u32,
    quad: &[QuadPlayer],
) -> EngineResult<SectionPairingResult> {
    let mut slots: Vec<Option<&QuadPlayer>> = quad.iter().map(Some).collect();
    while slots.len() < 4 {
        slots.push(None);
    }

    // Fixed 4-slot circle method: slot 0 stays put, the rest rotate by
    // (round - 1) positions out of 3.
    let rotation = ((round.saturating_sub(1)) as usize) % 3;
    let mut arr = slots.clone();
    arr[1..].rotate_right(rotation);

    let mut pairings = Vec::new();
    let mut board = 1;
    for i in 0..2 {
        let a = arr[i];
        let b = arr[3 - i];
        match (a, b) {
            (Some(x), Some(y)) => {
                let (white, black) = if x.rating >= y.rating { (x.id, y.id) } else { (y.id, x.id) };
                pairings.push(Pairing::game(tournament_id, round, quad_section, board, white, black));
                board += 1;
            }
            (Some(x), None) | (None, Some(x)) => {
                pairings.push(Pairing::bye(tournament_id, round, quad_section, board, x.id, ByeType::Bye));
                board += 1;
            }
            (None, None) => {}
        }
    }
    Ok(SectionPairingResult { pairings, warnings: vec![] })
}
