//! Round Controller (§4.6): the top-level state machine that gates when a
//! tournament may be paired, recorded against, and advanced. This is the
//! entry point the external HTTP layer calls (§6.2's endpoint table is
//! reproduced on each method below).
//!
//! `StartRound` and `AdvanceRound` are split, per §9 ("'Continue to next
//! round' coupled in source... separated here into AdvanceRound (state
//! transition + validation) and StartRound (pure pairing). Round Controller
//! composes them").

use std::collections::{HashMap, HashSet};

use crate::context::EngineContext;
use crate::domain::dto::{MissingResults, SectionPairingResult, StandingsRow};
use crate::domain::model::{Pairing, Team, Tournament, TournamentFormat, TournamentStatus};
use crate::error::{EngineError, EngineResult};
use crate::identifiers::{PlayerId, TeamId, TournamentId};
use crate::pairing::swiss::SwissPlayer;
use crate::pairing::{knockout, quad, round_robin, swiss, team_swiss};
use crate::player_registry::PlayerRegistry;
use crate::repository::{PairingRepo, PlayerRepo, ResultRepo, TournamentRepo};
use crate::scoring::tiebreak::{GameRecord, Outcome};
use crate::scoring::{self, PlayerSummary};
use crate::section::SectionPartitioner;

/// Where a tournament sits in its round lifecycle (§4.6's state diagram).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundState {
    NotStarted,
    RoundInProgress(u32),
    RoundComplete(u32),
    TournamentComplete,
}

pub struct RoundController<'a, T, P, G, R> {
    tournaments: &'a T,
    players: &'a P,
    pairings: &'a G,
    results: &'a R,
    context: &'a EngineContext,
}

impl<'a, T, P, G, R> RoundController<'a, T, P, G, R>
where
    T: TournamentRepo,
    P: PlayerRepo,
    G: PairingRepo,
    R: ResultRepo,
{
    pub fn new(tournaments: &'a T, players: &'a P, pairings: &'a G, results: &'a R, context: &'a EngineContext) -> Self {
        Self { tournaments, players, pairings, results, context }
    }

    fn registry(&self) -> PlayerRegistry<'a, P, G> {
        PlayerRegistry::new(self.players, self.pairings)
    }

    fn partitioner(&self) -> SectionPartitioner<'a, T, P> {
        SectionPartitioner::new(self.tournaments, self.players)
    }

    /// The tournament's current position in the lifecycle (§4.6).
    pub async fn state(&self, tournament_id: TournamentId) -> EngineResult<RoundState> {
        let tournament = self.tournaments.get(tournament_id).await?;
        if tournament.status == TournamentStatus::Completed {
            return Ok(RoundState::TournamentComplete);
        }
        if tournament.current_round == 0 {
            return Ok(RoundState::NotStarted);
        }
        let missing = self.missing_results(tournament_id, tournament.current_round).await?;
        if missing.is_empty() {
            Ok(RoundState::RoundComplete(tournament.current_round))
        } else {
            Ok(RoundState::RoundInProgress(tournament.current_round))
        }
    }

    /// `GET /tournaments/:id/standings` (§6.2): assembles each active
    /// player's game log from persisted pairings and results, then delegates
    /// the ranking itself to the Standings & Tiebreak Calculator.
    pub async fn standings(&self, tournament_id: TournamentId, section: &str) -> EngineResult<Vec<StandingsRow>> {
        let tournament = self.tournaments.get(tournament_id).await?;
        let roster = self.partitioner().roster(tournament_id, section).await?;
        let upto_round = tournament.current_round + 1;
        let pairings = self
            .pairings
            .list_historical_in_section(tournament_id, section, upto_round)
            .await?;

        let mut summaries = Vec::with_capacity(roster.len());
        for player in roster {
            let mut games = Vec::new();
            for pairing in pairings.iter().filter(|p| p.players().any(|id| id == player.id)) {
                let rows = self.results.list_for_pairing(pairing.id).await?;
                let Some(row) = rows.iter().find(|r| r.player_id == player.id) else { continue };
                let opponent = if pairing.is_bye() {
                    None
                } else if pairing.white_id == Some(player.id) {
                    pairing.black_id
                } else {
                    pairing.white_id
                };
                let outcome = opponent.map(|_| outcome_from_points(row.points));
                games.push(GameRecord { round: pairing.round, opponent, points: row.points, outcome });
            }
            summaries.push(PlayerSummary {
                player_id: player.id,
                name: player.name,
                rating: player.rating.unwrap_or(1500),
                games,
            });
        }

        Ok(scoring::compute_standings(summaries, &tournament.settings.tiebreak_order))
    }

    /// Every pairing in `round` (across all sections) that has no recorded
    /// result yet, grouped by section (§4.6 "Partial completion is detected
    /// and reported with a per-section list of missing pairings").
    async fn missing_results(&self, tournament_id: TournamentId, round: u32) -> EngineResult<Vec<MissingResults>> {
        let sections = self.partitioner().sections(tournament_id).await?;
        let mut out = Vec::new();
        for section in sections {
            let pairings = self
                .pairings
                .list_by_tournament_round_section(tournament_id, round, &section)
                .await?;
            let pending: Vec<_> = pairings.iter().filter(|p| !p.has_result()).map(|p| p.id).collect();
            if !pending.is_empty() {
                out.push(MissingResults { section, pairing_ids: pending });
            }
        }
        Ok(out)
    }

    /// Total points a player has scored in a section over rounds strictly
    /// before `upto_round`, used to seed Swiss score groups and round-robin/
    /// quad/knockout bookkeeping. A pure aggregation over persisted pairings
    /// and results, not a cache of anything the engine owns.
    async fn scores_through(&self, tournament_id: TournamentId, section: &str, upto_round: u32) -> EngineResult<HashMap<PlayerId, f64>> {
        let pairings = self
            .pairings
            .list_historical_in_section(tournament_id, section, upto_round)
            .await?;
        let mut scores = HashMap::new();
        for pairing in &pairings {
            let rows = self.results.list_for_pairing(pairing.id).await?;
            for row in rows {
                *scores.entry(row.player_id).or_insert(0.0) += row.points;
            }
        }
        Ok(scores)
    }

    /// True if the player paired against a lower-scoring opponent (a
    /// downfloat) in either of the two rounds immediately before
    /// `upto_round` (§4.3.1 step 6 "track two-round history").
    async fn recently_floated_down(&self, tournament_id: TournamentId, section: &str, player_id: PlayerId, upto_round: u32) -> EngineResult<bool> {
        for round in upto_round.saturating_sub(2)..upto_round {
            if round == 0 {
                continue;
            }
            let pairings = self
                .pairings
                .list_by_tournament_round_section(tournament_id, round, section)
                .await?;
            let Some(pairing) = pairings.iter().find(|p| p.players().any(|id| id == player_id)) else {
                continue;
            };
            if pairing.is_bye() {
                continue;
            }
            let opponent = if pairing.white_id == Some(player_id) { pairing.black_id } else { pairing.white_id };
            let Some(opponent) = opponent else { continue };
            let scores = self.scores_through(tournament_id, section, round).await?;
            let own = scores.get(&player_id).copied().unwrap_or(0.0);
            let opp = scores.get(&opponent).copied().unwrap_or(0.0);
            if own > opp {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Assembles the Swiss engine's input for one section/round from the
    /// repository (§4.3.1 "Input").
    async fn build_swiss_players(&self, tournament_id: TournamentId, section: &str, round: u32, pairable: &[PlayerId]) -> EngineResult<Vec<SwissPlayer>> {
        let registry = self.registry();
        let scores = self.scores_through(tournament_id, section, round).await?;
        let opponent_map = registry.opponent_map(tournament_id, section, round).await?;
        let mut out = Vec::with_capacity(pairable.len());
        for &player_id in pairable {
            let player = self
                .players
                .list_for_tournament(tournament_id)
                .await?
                .into_iter()
                .find(|p| p.id == player_id)
                .ok_or_else(|| EngineError::not_found(format!("player {player_id}")))?;
            let color_history = registry.color_history(tournament_id, section, player_id, round).await?;
            let opponents = opponent_map.get(&player_id).cloned().unwrap_or_default();
            let has_had_automatic_bye = registry.automatic_bye_count(tournament_id, section, player_id, round).await? > 0;
            let recently_floated_down = self.recently_floated_down(tournament_id, section, player_id, round).await?;
            out.push(SwissPlayer {
                id: player_id,
                name: player.name,
                rating: player.rating.unwrap_or(1500),
                score: scores.get(&player_id).copied().unwrap_or(0.0),
                color_history,
                opponents,
                has_had_automatic_bye,
                recently_floated_down,
            });
        }
        Ok(out)
    }

    /// Materializes a section's registered byes as `unpaired` pairings,
    /// appended after the game pairings with ascending board numbers
    /// (§4.3.1 step 9), sorted by name for determinism.
    async fn registered_bye_pairings(&self, tournament_id: TournamentId, section: &str, round: u32, registered_byes: &[PlayerId], next_board: u32) -> EngineResult<Vec<Pairing>> {
        let mut players = Vec::with_capacity(registered_byes.len());
        for &player_id in registered_byes {
            let player = self
                .players
                .list_for_tournament(tournament_id)
                .await?
                .into_iter()
                .find(|p| p.id == player_id)
                .ok_or_else(|| EngineError::not_found(format!("player {player_id}")))?;
            players.push(player);
        }
        players.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(players
            .into_iter()
            .enumerate()
            .map(|(i, player)| {
                Pairing::bye(
                    tournament_id,
                    round,
                    section,
                    next_board + i as u32,
                    player.id,
                    crate::domain::model::ByeType::Unpaired,
                )
            })
            .collect())
    }

    /// `StartRound(r)` (§4.6, `POST /pairings/generate`, `POST
    /// /pairings/generate/section`): valid only from `NotStarted` (r=1) or
    /// `RoundComplete(r-1)`. Handles every format except `TeamSwiss`, which
    /// needs externally supplied team rosters — see `start_team_round`.
    /// Pairs every section, persists the result, and advances the
    /// tournament into `RoundInProgress(r)`.
    pub async fn start_round(&self, tournament_id: TournamentId, round: u32) -> EngineResult<HashMap<String, SectionPairingResult>> {
        let _lock = self.context.lock_tournament(tournament_id).await;
        let tournament = self.tournaments.get(tournament_id).await?;
        self.validate_can_start(&tournament, round)?;
        if tournament.format == TournamentFormat::TeamSwiss {
            return Err(EngineError::validation("team_swiss requires start_team_round"));
        }

        let fut = self.pair_all_sections(&tournament, round);
        let out = tokio::time::timeout(self.context.pairing_timeout(), fut)
            .await
            .map_err(|_| EngineError::Timeout(format!("pairing round {round} exceeded its wall-clock budget")))??;

        self.tournaments.update_status(tournament_id, TournamentStatus::Active).await?;
        self.tournaments.update_round(tournament_id, round).await?;
        Ok(out)
    }

    async fn pair_all_sections(&self, tournament: &Tournament, round: u32) -> EngineResult<HashMap<String, SectionPairingResult>> {
        let sections = self.partitioner().sections(tournament.id).await?;
        let mut out = HashMap::new();
        for section in sections {
            let roster = self.registry().pairable_for_round(tournament.id, &section, round).await?;
            let result = self.pair_one_section(tournament, &section, round, &roster.pairable).await?;
            let next_board = result.pairings.iter().map(|p| p.board).max().unwrap_or(0) + 1;
            let bye_pairings = self
                .registered_bye_pairings(tournament.id, &section, round, &roster.registered_byes, next_board)
                .await?;

            let mut all_pairings = result.pairings;
            all_pairings.extend(bye_pairings);
            self.pairings.insert_batch(all_pairings.clone()).await?;
            out.insert(section, SectionPairingResult { pairings: all_pairings, warnings: result.warnings });
        }
        Ok(out)
    }

    async fn pair_one_section(&self, tournament: &Tournament, section: &str, round: u32, pairable: &[PlayerId]) -> EngineResult<SectionPairingResult> {
        match tournament.format {
            TournamentFormat::Swiss | TournamentFormat::OnlineRated => {
                let players = self.build_swiss_players(tournament.id, section, round, pairable).await?;
                swiss::pair_section(tournament.id, section, round, players, &tournament.settings.swiss)
            }
            TournamentFormat::RoundRobin => {
                let players = self.build_round_robin_players(tournament.id, pairable).await?;
                round_robin::pair_round(tournament.id, section, round, players)
            }
            TournamentFormat::Quad => {
                let quad_index = section
                    .strip_prefix("quad-")
                    .and_then(|s| s.parse::<usize>().ok())
                    .ok_or_else(|| EngineError::validation(format!("quad section name {section} is not quad-N")))?;
                let all_players = self.build_quad_players(tournament.id, pairable).await?;
                let quads = quad::form_quads(all_players);
                let (_, members) = quads
                    .into_iter()
                    .nth(quad_index - 1)
                    .ok_or_else(|| EngineError::not_found(format!("quad {section}")))?;
                quad::pair_quad_round(tournament.id, section, round, &members)
            }
            TournamentFormat::SingleElimination => {
                if round == 1 {
                    let players = self.build_knockout_players(tournament.id, pairable).await?;
                    knockout::pair_round_one(tournament.id, section, players)
                } else {
                    let advancing = self.advancing_players(tournament.id, section, round - 1).await?;
                    knockout::pair_next_round(tournament.id, section, round, advancing)
                }
            }
            TournamentFormat::TeamSwiss => unreachable!("dispatched to start_team_round by the caller"),
        }
    }

    async fn player_by_id(&self, tournament_id: TournamentId, player_id: PlayerId) -> EngineResult<crate::domain::model::Player> {
        self.players
            .list_for_tournament(tournament_id)
            .await?
            .into_iter()
            .find(|p| p.id == player_id)
            .ok_or_else(|| EngineError::not_found(format!("player {player_id}")))
    }

    async fn build_round_robin_players(&self, tournament_id: TournamentId, pairable: &[PlayerId]) -> EngineResult<Vec<round_robin::RoundRobinPlayer>> {
        let mut out = Vec::with_capacity(pairable.len());
        for &id in pairable {
            let p = self.player_by_id(tournament_id, id).await?;
            out.push(round_robin::RoundRobinPlayer { id, name: p.name, rating: p.rating.unwrap_or(1500) });
        }
        Ok(out)
    }

    async fn build_quad_players(&self, tournament_id: TournamentId, pairable: &[PlayerId]) -> EngineResult<Vec<quad::QuadPlayer>> {
        let mut out = Vec::with_capacity(pairable.len());
        for &id in pairable {
            let p = self.player_by_id(tournament_id, id).await?;
            out.push(quad::QuadPlayer { id, name: p.name, rating: p.rating.unwrap_or(1500) });
        }
        Ok(out)
    }

    async fn build_knockout_players(&self, tournament_id: TournamentId, pairable: &[PlayerId]) -> EngineResult<Vec<knockout::KnockoutPlayer>> {
        let mut out = Vec::with_capacity(pairable.len());
        for &id in pairable {
            let p = self.player_by_id(tournament_id, id).await?;
            out.push(knockout::KnockoutPlayer { id, name: p.name, rating: p.rating.unwrap_or(1500) });
        }
        Ok(out)
    }

    /// The players who won (or received a bye as the higher seed) in a
    /// single-elimination section's previous round, in bracket order, ready
    /// to feed `knockout::pair_next_round`. A drawn result has no winner
    /// under knockout rules; ties resolve to the white player.
    async fn advancing_players(&self, tournament_id: TournamentId, section: &str, prior_round: u32) -> EngineResult<Vec<PlayerId>> {
        let pairings = self
            .pairings
            .list_by_tournament_round_section(tournament_id, prior_round, section)
            .await?;
        let mut advancing = Vec::with_capacity(pairings.len());
        for pairing in pairings {
            if pairing.is_bye() {
                advancing.push(pairing.white_id.ok_or_else(|| EngineError::state("bye pairing missing player"))?);
                continue;
            }
            let rows = self.results.list_for_pairing(pairing.id).await?;
            let white_id = pairing.white_id.ok_or_else(|| EngineError::state("game pairing missing white"))?;
            let black_id = pairing.black_id.ok_or_else(|| EngineError::state("game pairing missing black"))?;
            let white_pts = rows.iter().find(|r| r.player_id == white_id).map(|r| r.points).unwrap_or(0.0);
            let black_pts = rows.iter().find(|r| r.player_id == black_id).map(|r| r.points).unwrap_or(0.0);
            advancing.push(if black_pts > white_pts { black_id } else { white_id });
        }
        Ok(advancing)
    }

    /// `StartRound` for `team_swiss`: team rosters have no repository
    /// contract of their own (§6.1 lists only Tournament/Player/Pairing/
    /// Result repos), so the caller supplies them directly, the way
    /// `pairing::team_swiss::pair_round` already takes `rosters` as an
    /// explicit argument rather than fetching it.
    pub async fn start_team_round(&self, tournament_id: TournamentId, round: u32, rosters: &HashMap<TeamId, Team>) -> EngineResult<HashMap<String, Vec<Pairing>>> {
        let _lock = self.context.lock_tournament(tournament_id).await;
        let tournament = self.tournaments.get(tournament_id).await?;
        self.validate_can_start(&tournament, round)?;
        if tournament.format != TournamentFormat::TeamSwiss {
            return Err(EngineError::validation("start_team_round requires a team_swiss tournament"));
        }

        let sections: HashSet<String> = rosters.values().map(|t| t.section.clone()).collect();
        let mut out = HashMap::new();
        for section in sections {
            let team_players = self.build_team_players(tournament_id, &section, round, rosters).await?;
            let team_rosters: HashMap<TeamId, Team> = rosters
                .iter()
                .filter(|(_, team)| team.section == section)
                .map(|(id, team)| (*id, team.clone()))
                .collect();
            let pairings = team_swiss::pair_round(tournament_id, &section, round, team_players, &team_rosters, &tournament.settings.swiss)?;
            self.pairings.insert_batch(pairings.clone()).await?;
            out.insert(section, pairings);
        }

        self.tournaments.update_status(tournament_id, TournamentStatus::Active).await?;
        self.tournaments.update_round(tournament_id, round).await?;
        Ok(out)
    }

    async fn build_team_players(&self, tournament_id: TournamentId, section: &str, round: u32, rosters: &HashMap<TeamId, Team>) -> EngineResult<Vec<team_swiss::TeamSwissPlayer>> {
        let section_teams: Vec<&Team> = rosters.values().filter(|t| t.section == section).collect();
        let team_scores = self.team_scores_through(tournament_id, section, rosters, round).await?;
        let mut out = Vec::with_capacity(section_teams.len());
        for team in section_teams {
            let board1 = team.boards.first().copied();
            let rating = match board1 {
                Some(id) => self.player_by_id(tournament_id, id).await?.rating.unwrap_or(1500),
                None => 1500,
            };
            let color_history = match board1 {
                Some(id) => self.registry().color_history(tournament_id, section, id, round).await?,
                None => Vec::new(),
            };
            out.push(team_swiss::TeamSwissPlayer {
                team_id: team.id,
                name: team.name.clone(),
                rating,
                score: team_scores.get(&team.id).copied().unwrap_or(0.0),
                color_history,
                opponent_teams: HashSet::new(),
                has_had_automatic_bye: false,
                recently_floated_down: false,
            });
        }
        Ok(out)
    }

    /// Aggregates each team's match points (1/0.5/0 per round, §4.3.5) over
    /// rounds strictly before `upto_round`, by grouping individual board
    /// results back into team matches via roster membership.
    async fn team_scores_through(&self, tournament_id: TournamentId, section: &str, rosters: &HashMap<TeamId, Team>, upto_round: u32) -> EngineResult<HashMap<TeamId, f64>> {
        let player_team: HashMap<PlayerId, TeamId> = rosters
            .values()
            .flat_map(|team| team.boards.iter().map(move |p| (*p, team.id)))
            .collect();

        let mut cumulative: HashMap<TeamId, f64> = HashMap::new();
        for round in 1..upto_round {
            let pairings = self
                .pairings
                .list_by_tournament_round_section(tournament_id, round, section)
                .await?;
            let mut match_sums: HashMap<(TeamId, TeamId), (f64, f64)> = HashMap::new();
            let mut byes_seen: HashSet<TeamId> = HashSet::new();
            for pairing in &pairings {
                if pairing.is_bye() {
                    if let Some(team) = pairing.white_id.and_then(|id| player_team.get(&id)) {
                        byes_seen.insert(*team);
                    }
                    continue;
                }
                let (Some(white), Some(black)) = (pairing.white_id, pairing.black_id) else { continue };
                let (Some(&team_a), Some(&team_b)) = (player_team.get(&white), player_team.get(&black)) else { continue };
                let rows = self.results.list_for_pairing(pairing.id).await?;
                let white_pts = rows.iter().find(|r| r.player_id == white).map(|r| r.points).unwrap_or(0.0);
                let black_pts = rows.iter().find(|r| r.player_id == black).map(|r| r.points).unwrap_or(0.0);
                let key = if team_a.uuid() < team_b.uuid() { (team_a, team_b) } else { (team_b, team_a) };
                let entry = match_sums.entry(key).or_insert((0.0, 0.0));
                if team_a == key.0 {
                    entry.0 += white_pts;
                    entry.1 += black_pts;
                } else {
                    entry.0 += black_pts;
                    entry.1 += white_pts;
                }
            }
            for ((team_a, team_b), (score_a, score_b)) in match_sums {
                *cumulative.entry(team_a).or_insert(0.0) += team_swiss::team_match_points(score_a, score_b);
                *cumulative.entry(team_b).or_insert(0.0) += team_swiss::team_match_points(score_b, score_a);
            }
            for team in byes_seen {
                *cumulative.entry(team).or_insert(0.0) += 1.0;
            }
        }
        Ok(cumulative)
    }

    fn validate_can_start(&self, tournament: &Tournament, round: u32) -> EngineResult<()> {
        if round == 1 {
            if tournament.current_round != 0 {
                return Err(EngineError::state(format!(
                    "tournament {} already started (current round {})",
                    tournament.id, tournament.current_round
                )));
            }
            return Ok(());
        }
        if tournament.current_round != round - 1 {
            return Err(EngineError::state(format!(
                "cannot start round {round}: tournament is at round {}",
                tournament.current_round
            )));
        }
        Ok(())
    }

    /// `AdvanceRound` (§4.6, `POST /tournaments/:id/continue`): requires
    /// every pairing of the current round to have a recorded result. Returns
    /// `StateError` listing the unrecorded pairings otherwise (Scenario E).
    /// Only flips status — the tournament is left at `current_round` until
    /// the next `StartRound(r+1)` call actually advances the marker, keeping
    /// completion checking and pairing generation as separate operations.
    pub async fn advance_round(&self, tournament_id: TournamentId) -> EngineResult<Tournament> {
        let _lock = self.context.lock_tournament(tournament_id).await;
        let tournament = self.tournaments.get(tournament_id).await?;
        if tournament.current_round == 0 {
            return Err(EngineError::state("cannot advance before any round has started"));
        }
        let missing = self.missing_results(tournament_id, tournament.current_round).await?;
        if !missing.is_empty() {
            let detail = missing
                .iter()
                .map(|m| format!("{}: {} pairing(s)", m.section, m.pairing_ids.len()))
                .collect::<Vec<_>>()
                .join(", ");
            return Err(EngineError::state(format!("round {} incomplete: {detail}", tournament.current_round)));
        }

        if tournament.current_round >= tournament.round_count {
            self.tournaments.update_status(tournament_id, TournamentStatus::Completed).await?;
        } else {
            self.tournaments.update_status(tournament_id, TournamentStatus::Active).await?;
        }
        self.tournaments.get(tournament_id).await
    }

    /// `RegenerateRound(r)` (§4.6): permitted only if no result exists yet
    /// for round `r` in any section. Clears the round's pairings and
    /// re-invokes pairing, producing identical output given identical inputs
    /// (§8 invariant 6, determinism).
    pub async fn regenerate_round(&self, tournament_id: TournamentId, round: u32) -> EngineResult<HashMap<String, SectionPairingResult>> {
        let _lock = self.context.lock_tournament(tournament_id).await;
        let tournament = self.tournaments.get(tournament_id).await?;
        if tournament.format == TournamentFormat::TeamSwiss {
            return Err(EngineError::validation("team_swiss regeneration requires the team entry point"));
        }

        let sections = self.partitioner().sections(tournament_id).await?;
        for section in &sections {
            let existing = self
                .pairings
                .list_by_tournament_round_section(tournament_id, round, section)
                .await?;
            if existing.iter().any(|p| p.has_result()) {
                return Err(EngineError::state(format!(
                    "round {round} in section {section} already has recorded results"
                )));
            }
        }
        for section in &sections {
            self.pairings.delete_round(tournament_id, round, section).await?;
        }

        self.pair_all_sections(&tournament, round).await
    }
}

/// Classifies a recorded point value for tiebreak purposes. Forfeit results
/// carry the same numeric points as their non-forfeit counterparts, so this
/// sees them identically (§9 open question 2).
fn outcome_from_points(points: f64) -> Outcome {
    if (points - 1.0).abs() < f64::EPSILON {
        Outcome::Win
    } else if (points - 0.5).abs() < f64::EPSILON {
        Outcome::Draw
    } else {
        Outcome::Loss
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::EngineContextSettings;
    use crate::domain::dto::RecordGameResult;
    use crate::domain::model::{Player, TournamentFormat};
    use crate::repository::memory::MemoryRepo;

    fn make_tournament(format: TournamentFormat, round_count: u32) -> Tournament {
        Tournament::new("Test", format, round_count)
    }

    fn controller<'a>(repo: &'a MemoryRepo, ctx: &'a EngineContext) -> RoundController<'a, MemoryRepo, MemoryRepo, MemoryRepo, MemoryRepo> {
        RoundController::new(repo, repo, repo, repo, ctx)
    }

    #[tokio::test]
    async fn scenario_e_advance_round_gated_on_missing_results() {
        let repo = MemoryRepo::new();
        let ctx = EngineContext::new(EngineContextSettings::default());
        let mut tournament = make_tournament(TournamentFormat::Swiss, 3);
        let tid = tournament.id;
        tournament.current_round = 0;
        repo.insert_tournament(tournament);

        for name in ["A", "B", "C", "D"] {
            repo.insert_player(Player::new(tid, name, "Open"));
        }

        let ctrl = controller(&repo, &ctx);
        ctrl.start_round(tid, 1).await.unwrap();

        let pairings = repo.list_by_tournament_round_section(tid, 1, "Open").await.unwrap();
        assert_eq!(pairings.len(), 2);

        let recorder = crate::result_recorder::ResultRecorder::new(&repo, &repo);
        recorder
            .record_game_result(RecordGameResult { pairing_id: pairings[0].id, code: "1-0".to_string() })
            .await
            .unwrap();

        let err = ctrl.advance_round(tid).await.unwrap_err();
        assert!(matches!(err, EngineError::State(_)));
    }

    #[tokio::test]
    async fn advance_round_succeeds_once_every_pairing_has_a_result() {
        let repo = MemoryRepo::new();
        let ctx = EngineContext::new(EngineContextSettings::default());
        let mut tournament = make_tournament(TournamentFormat::Swiss, 3);
        let tid = tournament.id;
        tournament.current_round = 0;
        repo.insert_tournament(tournament);
        for name in ["A", "B", "C", "D"] {
            repo.insert_player(Player::new(tid, name, "Open"));
        }

        let ctrl = controller(&repo, &ctx);
        ctrl.start_round(tid, 1).await.unwrap();
        let pairings = repo.list_by_tournament_round_section(tid, 1, "Open").await.unwrap();
        let recorder = crate::result_recorder::ResultRecorder::new(&repo, &repo);
        for pairing in &pairings {
            recorder
                .record_game_result(RecordGameResult { pairing_id: pairing.id, code: "1-0".to_string() })
                .await
                .unwrap();
        }

        let advanced = ctrl.advance_round(tid).await.unwrap();
        assert_eq!(advanced.status, TournamentStatus::Active);
    }

    #[tokio::test]
    async fn standings_rank_winner_above_loser_after_one_round() {
        let repo = MemoryRepo::new();
        let ctx = EngineContext::new(EngineContextSettings::default());
        let mut tournament = make_tournament(TournamentFormat::Swiss, 3);
        let tid = tournament.id;
        tournament.current_round = 0;
        repo.insert_tournament(tournament);
        for name in ["A", "B", "C", "D"] {
            repo.insert_player(Player::new(tid, name, "Open"));
        }

        let ctrl = controller(&repo, &ctx);
        ctrl.start_round(tid, 1).await.unwrap();
        let pairings = repo.list_by_tournament_round_section(tid, 1, "Open").await.unwrap();
        let recorder = crate::result_recorder::ResultRecorder::new(&repo, &repo);
        for pairing in &pairings {
            recorder
                .record_game_result(RecordGameResult { pairing_id: pairing.id, code: "1-0".to_string() })
                .await
                .unwrap();
        }

        let standings = ctrl.standings(tid, "Open").await.unwrap();
        assert_eq!(standings.len(), 4);
        assert_eq!(standings[0].rank, 1);
        assert_eq!(standings[0].points, 1.0);
        assert_eq!(standings[0].wins, 1);
        assert!(standings.iter().skip(2).all(|row| row.points == 0.0));
        let total_points: f64 = standings.iter().map(|row| row.points).sum();
        assert_eq!(total_points, pairings.len() as f64);
    }

    #[tokio::test]
    async fn scenario_f_regenerate_with_recorded_results_rejected() {
        let repo = MemoryRepo::new();
        let ctx = EngineContext::new(EngineContextSettings::default());
        let mut tournament = make_tournament(TournamentFormat::Swiss, 3);
        let tid = tournament.id;
        tournament.current_round = 0;
        repo.insert_tournament(tournament);
        for name in ["A", "B", "C", "D"] {
            repo.insert_player(Player::new(tid, name, "Open"));
        }

        let ctrl = controller(&repo, &ctx);
        ctrl.start_round(tid, 1).await.unwrap();
        let pairings = repo.list_by_tournament_round_section(tid, 1, "Open").await.unwrap();
        let recorder = crate::result_recorder::ResultRecorder::new(&repo, &repo);
        recorder
            .record_game_result(RecordGameResult { pairing_id: pairings[0].id, code: "1-0".to_string() })
            .await
            .unwrap();

        let err = ctrl.regenerate_round(tid, 1).await.unwrap_err();
        assert!(matches!(err, EngineError::State(_)));
    }

    #[tokio::test]
    async fn regenerate_round_is_deterministic_before_any_result() {
        let repo = MemoryRepo::new();
        let ctx = EngineContext::new(EngineContextSettings::default());
        let mut tournament = make_tournament(TournamentFormat::Swiss, 3);
        let tid = tournament.id;
        tournament.current_round = 0;
        repo.insert_tournament(tournament);
        for name in ["A", "B", "C", "D", "E"] {
            repo.insert_player(Player::new(tid, name, "Open"));
        }

        let ctrl = controller(&repo, &ctx);
        ctrl.start_round(tid, 1).await.unwrap();
        let first = repo.list_by_tournament_round_section(tid, 1, "Open").await.unwrap();

        let regenerated = ctrl.regenerate_round(tid, 1).await.unwrap();
        let second = repo.list_by_tournament_round_section(tid, 1, "Open").await.unwrap();

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.white_id, b.white_id);
            assert_eq!(a.black_id, b.black_id);
            assert_eq!(a.bye_type, b.bye_type);
        }
        assert!(regenerated.contains_key("Open"));
    }

    #[tokio::test]
    async fn start_round_requires_sequential_progression() {
        let repo = MemoryRepo::new();
        let ctx = EngineContext::new(EngineContextSettings::default());
        let mut tournament = make_tournament(TournamentFormat::Swiss, 3);
        let tid = tournament.id;
        tournament.current_round = 0;
        repo.insert_tournament(tournament);
        for name in ["A", "B"] {
            repo.insert_player(Player::new(tid, name, "Open"));
        }

        let ctrl = controller(&repo, &ctx);
        let err = ctrl.start_round(tid, 2).await.unwrap_err();
        assert!(matches!(err, EngineError::State(_)));
    }

    #[tokio::test]
    async fn registered_bye_is_excluded_from_pairing_and_appended_as_unpaired() {
        let repo = MemoryRepo::new();
        let ctx = EngineContext::new(EngineContextSettings::default());
        let mut tournament = make_tournament(TournamentFormat::Swiss, 3);
        let tid = tournament.id;
        tournament.current_round = 0;
        repo.insert_tournament(tournament);

        let mut p1 = Player::new(tid, "Alice", "Open");
        p1.rating = Some(2000);
        let mut p2 = Player::new(tid, "Bob", "Open");
        p2.rating = Some(1900);
        p2.intentional_bye_rounds.insert(1);
        let mut p3 = Player::new(tid, "Cara", "Open");
        p3.rating = Some(1800);
        let mut p4 = Player::new(tid, "Dan", "Open");
        p4.rating = Some(1700);
        for p in [p1, p2, p3, p4] {
            repo.insert_player(p);
        }

        let ctrl = controller(&repo, &ctx);
        let result = ctrl.start_round(tid, 1).await.unwrap();
        let open = &result["Open"];
        assert_eq!(open.pairings.iter().filter(|p| p.bye_type == Some(crate::domain::model::ByeType::Unpaired)).count(), 1);
        assert!(open.pairings.iter().all(|p| p.white_id != Some(p_id_of(&repo, tid, "Bob").await) || p.is_bye()));
    }

    async fn p_id_of(repo: &MemoryRepo, tid: TournamentId, name: &str) -> PlayerId {
        repo.list_for_tournament(tid).await.unwrap().into_iter().find(|p| p.name == name).unwrap().id
    }
}
