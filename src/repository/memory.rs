//! An in-memory reference implementation of the repository traits.
//!
//! Not a production persistence layer — a real implementation backed by a SQL
//! database is the external HTTP layer's responsibility (§6.1, out of scope
//! here). This exists so the engine's own tests and any host process
//! embedding it for tests/demos have something to run against, grounded on
//! `grok-rs-pawn::pawn::test::mock_db::MockDb`.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::model::{
    Pairing, Player, Result as GameResult, ResultCode, Tournament, TournamentStatus,
};
use crate::error::{EngineError, EngineResult};
use crate::identifiers::{PairingId, PlayerId, TournamentId};

use super::{PairingRepo, PlayerRepo, ResultRepo, TournamentRepo};

#[derive(Default)]
struct Inner {
    tournaments: HashMap<TournamentId, Tournament>,
    players: HashMap<PlayerId, Player>,
    pairings: HashMap<PairingId, Pairing>,
    results: HashMap<crate::identifiers::ResultId, GameResult>,
}

/// A single process-local store implementing every repository trait at once,
/// the way one SQL database backs all four traits in a real deployment.
pub struct MemoryRepo {
    inner: Mutex<Inner>,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn insert_tournament(&self, tournament: Tournament) {
        let mut inner = self.inner.lock().unwrap();
        inner.tournaments.insert(tournament.id, tournament);
    }

    pub fn insert_player(&self, player: Player) {
        let mut inner = self.inner.lock().unwrap();
        inner.players.insert(player.id, player);
    }
}

impl Default for MemoryRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl TournamentRepo for MemoryRepo {
    async fn get(&self, id: TournamentId) -> EngineResult<Tournament> {
        let inner = self.inner.lock().unwrap();
        inner
            .tournaments
            .get(&id)
            .cloned()
            .ok_or_else(|| EngineError::not_found(format!("tournament {id}")))
    }

    async fn update_status(&self, id: TournamentId, status: TournamentStatus) -> EngineResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let tournament = inner
            .tournaments
            .get_mut(&id)
            .ok_or_else(|| EngineError::not_found(format!("tournament {id}")))?;
        tournament.status = status;
        Ok(())
    }

    async fn update_round(&self, id: TournamentId, round: u32) -> EngineResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let tournament = inner
            .tournaments
            .get_mut(&id)
            .ok_or_else(|| EngineError::not_found(format!("tournament {id}")))?;
        tournament.current_round = round;
        Ok(())
    }

    async fn list_sections(&self, id: TournamentId) -> EngineResult<Vec<String>> {
        let inner = self.inner.lock().unwrap();
        let tournament = inner
            .tournaments
            .get(&id)
            .ok_or_else(|| EngineError::not_found(format!("tournament {id}")))?;
        let mut sections: Vec<String> = inner
            .players
            .values()
            .filter(|p| p.tournament_id == id)
            .map(|p| p.section.clone())
            .collect();
        sections.sort();
        sections.dedup();
        if sections.is_empty() {
            sections = tournament.sections.clone();
        }
        Ok(sections)
    }
}

impl PlayerRepo for MemoryRepo {
    async fn list_for_tournament(&self, tournament_id: TournamentId) -> EngineResult<Vec<Player>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .players
            .values()
            .filter(|p| p.tournament_id == tournament_id)
            .cloned()
            .collect())
    }

    async fn list_active_in_section(
        &self,
        tournament_id: TournamentId,
        section: &str,
    ) -> EngineResult<Vec<Player>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .players
            .values()
            .filter(|p| {
                p.tournament_id == tournament_id && p.section == section && p.can_play()
            })
            .cloned()
            .collect())
    }

    async fn get_intentional_byes(&self, player_id: PlayerId) -> EngineResult<Vec<u32>> {
        let inner = self.inner.lock().unwrap();
        let player = inner
            .players
            .get(&player_id)
            .ok_or_else(|| EngineError::not_found(format!("player {player_id}")))?;
        let mut rounds: Vec<u32> = player.intentional_bye_rounds.iter().copied().collect();
        rounds.sort_unstable();
        Ok(rounds)
    }
}

impl PairingRepo for MemoryRepo {
    async fn list_by_tournament_round_section(
        &self,
        tournament_id: TournamentId,
        round: u32,
        section: &str,
    ) -> EngineResult<Vec<Pairing>> {
        let inner = self.inner.lock().unwrap();
        let mut out: Vec<Pairing> = inner
            .pairings
            .values()
            .filter(|p| p.tournament_id == tournament_id && p.round == round && p.section == section)
            .cloned()
            .collect();
        out.sort_by_key(|p| p.board);
        Ok(out)
    }

    async fn list_historical_in_section(
        &self,
        tournament_id: TournamentId,
        section: &str,
        upto_round: u32,
    ) -> EngineResult<Vec<Pairing>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .pairings
            .values()
            .filter(|p| {
                p.tournament_id == tournament_id && p.section == section && p.round < upto_round
            })
            .cloned()
            .collect())
    }

    async fn insert_batch(&self, pairings: Vec<Pairing>) -> EngineResult<()> {
        let mut inner = self.inner.lock().unwrap();
        for pairing in pairings {
            inner.pairings.insert(pairing.id, pairing);
        }
        Ok(())
    }

    async fn delete_round(
        &self,
        tournament_id: TournamentId,
        round: u32,
        section: &str,
    ) -> EngineResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let to_delete: Vec<PairingId> = inner
            .pairings
            .values()
            .filter(|p| p.tournament_id == tournament_id && p.round == round && p.section == section)
            .map(|p| p.id)
            .collect();
        for id in to_delete {
            inner.pairings.remove(&id);
            inner.results.retain(|_, r| r.pairing_id != id);
        }
        Ok(())
    }

    async fn update_result(&self, pairing_id: PairingId, code: ResultCode) -> EngineResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let pairing = inner
            .pairings
            .get_mut(&pairing_id)
            .ok_or_else(|| EngineError::not_found(format!("pairing {pairing_id}")))?;
        pairing.result = Some(code);
        Ok(())
    }

    async fn get(&self, pairing_id: PairingId) -> EngineResult<Pairing> {
        let inner = self.inner.lock().unwrap();
        inner
            .pairings
            .get(&pairing_id)
            .cloned()
            .ok_or_else(|| EngineError::not_found(format!("pairing {pairing_id}")))
    }
}

impl ResultRepo for MemoryRepo {
    async fn insert_for_pairing(&self, rows: Vec<GameResult>) -> EngineResult<()> {
        let mut inner = self.inner.lock().unwrap();
        for row in rows {
            inner.results.insert(row.id, row);
        }
        Ok(())
    }

    async fn list_for_player(&self, player_id: PlayerId) -> EngineResult<Vec<GameResult>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .results
            .values()
            .filter(|r| r.player_id == player_id)
            .cloned()
            .collect())
    }

    async fn list_for_tournament(&self, tournament_id: TournamentId) -> EngineResult<Vec<GameResult>> {
        let inner = self.inner.lock().unwrap();
        let pairing_ids: std::collections::HashSet<PairingId> = inner
            .pairings
            .values()
            .filter(|p| p.tournament_id == tournament_id)
            .map(|p| p.id)
            .collect();
        Ok(inner
            .results
            .values()
            .filter(|r| pairing_ids.contains(&r.pairing_id))
            .cloned()
            .collect())
    }

    async fn list_for_pairing(&self, pairing_id: PairingId) -> EngineResult<Vec<GameResult>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .results
            .values()
            .filter(|r| r.pairing_id == pairing_id)
            .cloned()
            .collect())
    }

    async fn delete_for_pairing(&self, pairing_id: PairingId) -> EngineResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.results.retain(|_, r| r.pairing_id != pairing_id);
        Ok(())
    }
}
