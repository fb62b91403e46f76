//! Standings & Tiebreak Calculator (§4.5): aggregates a section's game
//! history into ranked standings.

pub mod tiebreak;

use std::collections::HashMap;

use crate::domain::dto::StandingsRow;
use crate::domain::model::TiebreakKind;
use crate::identifiers::PlayerId;

use tiebreak::GameRecord;

/// One player's full game log for a section, the input to standings
/// computation.
#[derive(Debug, Clone)]
pub struct PlayerSummary {
    pub player_id: PlayerId,
    pub name: String,
    pub rating: i32,
    pub games: Vec<GameRecord>,
}

fn tiebreak_value(kind: TiebreakKind, games: &[GameRecord], own_total: f64, totals: &HashMap<PlayerId, f64>) -> f64 {
    match kind {
        TiebreakKind::Buchholz => tiebreak::buchholz(games, totals),
        TiebreakKind::MedianBuchholz => tiebreak::median_buchholz(games, totals),
        TiebreakKind::SonnebornBerger => tiebreak::sonneborn_berger(games, totals),
        TiebreakKind::Cumulative => tiebreak::cumulative(games),
        TiebreakKind::Solkoff => tiebreak::solkoff(games, totals),
        TiebreakKind::DirectEncounter => tiebreak::direct_encounter(games, own_total, totals),
    }
}

/// Computes ranked standings for one section (§4.5). Ranks are assigned by
/// lexicographic comparison of `(-points, tiebreak1, tiebreak2, ..., rating
/// desc, name asc)` (§4.5, invariant 7 in §8).
pub fn compute_standings(players: Vec<PlayerSummary>, tiebreak_order: &[TiebreakKind]) -> Vec<StandingsRow> {
    let totals: HashMap<PlayerId, f64> = players
        .iter()
        .map(|p| (p.player_id, p.games.iter().map(|g| g.points).sum()))
        .collect();

    struct Row {
        player_id: PlayerId,
        name: String,
        rating: i32,
        points: f64,
        games_played: u32,
        wins: u32,
        losses: u32,
        draws: u32,
        tiebreaks: Vec<(TiebreakKind, f64)>,
    }

    let mut rows: Vec<Row> = players
        .into_iter()
        .map(|p| {
            let points = totals[&p.player_id];
            let games_played = p.games.iter().filter(|g| g.opponent.is_some()).count() as u32;
            let wins = p
                .games
                .iter()
                .filter(|g| matches!(g.outcome, Some(tiebreak::Outcome::Win)))
                .count() as u32;
            let losses = p
                .games
                .iter()
                .filter(|g| matches!(g.outcome, Some(tiebreak::Outcome::Loss)))
                .count() as u32;
            let draws = p
                .games
                .iter()
                .filter(|g| matches!(g.outcome, Some(tiebreak::Outcome::Draw)))
                .count() as u32;
            let tiebreaks = tiebreak_order
                .iter()
                .map(|kind| (*kind, tiebreak_value(*kind, &p.games, points, &totals)))
                .collect();
            Row {
                player_id: p.player_id,
                name: p.name,
                rating: p.rating,
                points,
                games_played,
                wins,
                losses,
                draws,
                tiebreaks,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.points
            .partial_cmp(&a.points)
            .unwrap()
            .then_with(|| {
                a.tiebreaks
                    .iter()
                    .zip(&b.tiebreaks)
                    .map(|((_, av), (_, bv))| bv.partial_cmp(av).unwrap())
                    .find(|ord| *ord != std::cmp::Ordering::Equal)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| b.rating.cmp(&a.rating))
            .then_with(|| a.name.cmp(&b.name))
    });

    rows.into_iter()
        .enumerate()
        .map(|(i, row)| StandingsRow {
            player_id: row.player_id,
            rank: i as u32 + 1,
            points: row.points,
            games_played: row.games_played,
            wins: row.wins,
            losses: row.losses,
            draws: row.draws,
            tiebreaks: row.tiebreaks,
        })
        .collect()
}
