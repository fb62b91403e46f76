//! Tiebreak formulas (§4.5): each takes a player's per-round game history and
//! a lookup of final total points per player, since every tiebreak in this
//! system is defined over opponents' *final* tournament scores.

use std::collections::HashMap;

use crate::identifiers::PlayerId;

/// A player's outcome in one played game (byes have no outcome).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Draw,
    Loss,
}

impl Outcome {
    fn weight(self) -> f64 {
        match self {
            Outcome::Win => 1.0,
            Outcome::Draw => 0.5,
            Outcome::Loss => 0.0,
        }
    }
}

/// One round's entry in a player's game log. `opponent` is `None` for a bye
/// or unpaired pairing; `outcome` is `None` exactly when `opponent` is
/// `None`.
#[derive(Debug, Clone)]
pub struct GameRecord {
    pub round: u32,
    pub opponent: Option<PlayerId>,
    pub points: f64,
    pub outcome: Option<Outcome>,
}

/// Sum of opponents' final total points; a bye contributes 0 (§4.5).
pub fn buchholz(games: &[GameRecord], totals: &HashMap<PlayerId, f64>) -> f64 {
    games
        .iter()
        .map(|g| g.opponent.and_then(|o| totals.get(&o)).copied().unwrap_or(0.0))
        .sum()
}

/// Buchholz minus the single highest and single lowest per-round term.
/// Unchanged if fewer than two rounds have been played.
pub fn median_buchholz(games: &[GameRecord], totals: &HashMap<PlayerId, f64>) -> f64 {
    let mut terms: Vec<f64> = games
        .iter()
        .map(|g| g.opponent.and_then(|o| totals.get(&o)).copied().unwrap_or(0.0))
        .collect();
    if terms.len() < 2 {
        return terms.iter().sum();
    }
    terms.sort_by(|a, b| a.partial_cmp(b).unwrap());
    terms[1..terms.len() - 1].iter().sum()
}

/// Sum over game opponents (byes excluded) of opponent's total points weighted
/// by this player's result against them (1/0.5/0).
pub fn sonneborn_berger(games: &[GameRecord], totals: &HashMap<PlayerId, f64>) -> f64 {
    games
        .iter()
        .filter_map(|g| {
            let opponent = g.opponent?;
            let outcome = g.outcome?;
            let opponent_total = totals.get(&opponent).copied().unwrap_or(0.0);
            Some(opponent_total * outcome.weight())
        })
        .sum()
}

/// Sum of the player's running total after each round (§4.5).
pub fn cumulative(games: &[GameRecord]) -> f64 {
    let mut running = 0.0;
    let mut sum = 0.0;
    let mut ordered = games.to_vec();
    ordered.sort_by_key(|g| g.round);
    for game in &ordered {
        running += game.points;
        sum += running;
    }
    sum
}

/// Identical to [`buchholz`] in this system (§4.5: Solkoff is an alias).
pub fn solkoff(games: &[GameRecord], totals: &HashMap<PlayerId, f64>) -> f64 {
    buchholz(games, totals)
}

/// Points scored against opponents who finished with the same total as this
/// player — the practical form of "result of game(s) between tied players"
/// when computed as a per-player numeric tiebreak rather than a pairwise
/// comparison (§4.5, §9 open design choice).
pub fn direct_encounter(games: &[GameRecord], own_total: f64, totals: &HashMap<PlayerId, f64>) -> f64 {
    games
        .iter()
        .filter(|g| {
            g.opponent
                .and_then(|o| totals.get(&o))
                .map(|t| (*t - own_total).abs() < f64::EPSILON)
                .unwrap_or(false)
        })
        .map(|g| g.points)
        .sum()
}
