//! Team Swiss pairing (§4.3.5): Swiss over teams as meta-players, materialized
//! into per-board individual pairings.

use std::collections::HashSet;

use crate::domain::model::{Pairing, Team};
use crate::error::EngineResult;
use crate::identifiers::{PlayerId, TeamId, TournamentId};
use crate::player_registry::Color;

use super::swiss::{self, SwissPlayer, SwissSettings};

/// A team as a meta-player for the Swiss engine: team score, opponent teams
/// already faced, and the usual color-preference inputs computed over the
/// team's board-1 player (the de facto team color record).
#[derive(Debug, Clone)]
pub struct TeamSwissPlayer {
    pub team_id: TeamId,
    pub name: String,
    pub rating: i32,
    pub score: f64,
    pub color_history: Vec<Color>,
    pub opponent_teams: HashSet<TeamId>,
    pub has_had_automatic_bye: bool,
    pub recently_floated_down: bool,
}

/// Pairs the team level for one round, then materializes per-board individual
/// pairings. `teams` maps each paired team id back to its board roster (board
/// 1 first); a team missing a board plays with a walkover on that board,
/// represented as a bye for the present player (no individual pairing when
/// both sides are missing that board).
pub fn pair_round(
    tournament_id: TournamentId,
    section: &str,
    round: u32,
    team_players: Vec<TeamSwissPlayer>,
    rosters: &std::collections::HashMap<TeamId, Team>,
    swiss_settings: &SwissSettings,
) -> EngineResult<Vec<Pairing>> {
    let swiss_players: Vec<SwissPlayer> = team_players
        .iter()
        .map(|t| SwissPlayer {
            id: PlayerId::new(t.team_id.uuid()),
            name: t.name.clone(),
            rating: t.rating,
            score: t.score,
            color_history: t.color_history.clone(),
            opponents: t.opponent_teams.iter().map(|id| PlayerId::new(id.uuid())).collect(),
            has_had_automatic_bye: t.has_had_automatic_bye,
            recently_floated_down: t.recently_floated_down,
        })
        .collect();

    let team_result = swiss::pair_section(tournament_id, section, round, swiss_players, swiss_settings)?;
    let ratings: std::collections::HashMap<TeamId, i32> =
        team_players.iter().map(|t| (t.team_id, t.rating)).collect();

    let mut pairings = Vec::new();
    let mut board = 1;
    for team_pairing in &team_result.pairings {
        if team_pairing.is_bye() {
            let team_id = TeamId::new(team_pairing.white_id.unwrap().uuid());
            if let Some(team) = rosters.get(&team_id) {
                for player_id in &team.boards {
                    pairings.push(Pairing::bye(
                        tournament_id,
                        round,
                        section,
                        board,
                        *player_id,
                        crate::domain::model::ByeType::Bye,
                    ));
                    board += 1;
                }
            }
            continue;
        }

        let team_a = TeamId::new(team_pairing.white_id.unwrap().uuid());
        let team_b = TeamId::new(team_pairing.black_id.unwrap().uuid());
        let (roster_a, roster_b) = match (rosters.get(&team_a), rosters.get(&team_b)) {
            (Some(a), Some(b)) => (a, b),
            _ => continue,
        };

        // Board 1 of the lower-rated team takes black in odd team-rounds and
        // white in even ones; the rest of the boards follow the same split
        // (§4.3.5).
        let rating_a = ratings.get(&team_a).copied().unwrap_or(0);
        let rating_b = ratings.get(&team_b).copied().unwrap_or(0);
        let (higher_roster, lower_roster) = if rating_a >= rating_b {
            (roster_a, roster_b)
        } else {
            (roster_b, roster_a)
        };
        let lower_gets_black = round % 2 == 1;
        let board_count = higher_roster.boards.len().max(lower_roster.boards.len());
        for i in 0..board_count {
            let higher_player = higher_roster.boards.get(i).copied();
            let lower_player = lower_roster.boards.get(i).copied();
            match (higher_player, lower_player) {
                (Some(hp), Some(lp)) => {
                    let (white, black) = if lower_gets_black { (hp, lp) } else { (lp, hp) };
                    pairings.push(Pairing::game(tournament_id, round, section, board, white, black));
                }
                (Some(hp), None) => {
                    pairings.push(Pairing::bye(tournament_id, round, section, board, hp, crate::domain::model::ByeType::Bye));
                }
                (None, Some(lp)) => {
                    pairings.push(Pairing::bye(tournament_id, round, section, board, lp, crate::domain::model::ByeType::Bye));
                }
                (None, None) => continue,
            }
            board += 1;
        }
    }

    Ok(pairings)
}

/// Sums a team's match score from its boards' recorded points for one round,
/// used to compute team match points (1/0.5/0) once boards finish.
pub fn team_match_score(board_points: &[f64]) -> f64 {
    board_points.iter().sum()
}

/// Converts a team's board-score sum against the opposing team's sum into
/// match points (§4.3.5: win 1, draw 0.5, loss 0).
pub fn team_match_points(own_score: f64, opponent_score: f64) -> f64 {
    if own_score > opponent_score {
        1.0
    } else if (own_score - opponent_score).abs() < f64::EPSILON {
        0.5
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn team_match_points_reward_higher_board_total() {
        assert_eq!(team_match_points(2.5, 1.5), 1.0);
        assert_eq!(team_match_points(2.0, 2.0), 0.5);
        assert_eq!(team_match_points(1.0, 3.0), 0.0);
    }

    #[test]
    fn team_match_score_sums_boards() {
        assert_eq!(team_match_score(&[1.0, 0.5, 0.0, 1.0]), 2.5);
    }
}
