//! The persistence repository contract (§6.1).
//!
//! These traits are the engine's only dependency on storage. One trait per
//! entity family, matching the grouping spec.md uses ("Tournament repo /
//! Player repo / Pairing repo / Result repo"), grounded on `grok-rs-pawn`'s
//! single `pawn::db::Db` trait (whose methods are all `async fn`, since every
//! database read/write may block per §5) but split apart since this engine
//! has no single god-object database handle. All reads are snapshot-consistent
//! within one call; `insert_batch`, `delete_round`, and `update_result` are
//! transactional (§6.1).

pub mod memory;

use crate::domain::model::{Pairing, Player, Result as GameResult, Tournament, TournamentStatus};
use crate::error::EngineResult;
use crate::identifiers::{PairingId, PlayerId, TournamentId};

/// Tournament-level reads and status transitions.
pub trait TournamentRepo: Send + Sync {
    async fn get(&self, id: TournamentId) -> EngineResult<Tournament>;
    async fn update_status(&self, id: TournamentId, status: TournamentStatus) -> EngineResult<()>;
    /// Advances (or resets) the tournament's current round marker, the
    /// Round Controller's record of where `StartRound`/`AdvanceRound` left
    /// off (§4.6).
    async fn update_round(&self, id: TournamentId, round: u32) -> EngineResult<()>;
    async fn list_sections(&self, id: TournamentId) -> EngineResult<Vec<String>>;
}

/// Player roster reads.
pub trait PlayerRepo: Send + Sync {
    async fn list_for_tournament(&self, tournament_id: TournamentId) -> EngineResult<Vec<Player>>;
    async fn list_active_in_section(
        &self,
        tournament_id: TournamentId,
        section: &str,
    ) -> EngineResult<Vec<Player>>;
    async fn get_intentional_byes(&self, player_id: PlayerId) -> EngineResult<Vec<u32>>;
}

/// Pairing reads and transactional writes.
pub trait PairingRepo: Send + Sync {
    async fn list_by_tournament_round_section(
        &self,
        tournament_id: TournamentId,
        round: u32,
        section: &str,
    ) -> EngineResult<Vec<Pairing>>;

    /// All pairings for a section strictly before `upto_round`, used to build
    /// opponent/color history.
    async fn list_historical_in_section(
        &self,
        tournament_id: TournamentId,
        section: &str,
        upto_round: u32,
    ) -> EngineResult<Vec<Pairing>>;

    /// Transactionally persists a freshly generated set of pairings.
    async fn insert_batch(&self, pairings: Vec<Pairing>) -> EngineResult<()>;

    /// Transactionally deletes every pairing of `round` in `section` (used by
    /// `RegenerateRound`).
    async fn delete_round(
        &self,
        tournament_id: TournamentId,
        round: u32,
        section: &str,
    ) -> EngineResult<()>;

    /// Transactionally stamps a pairing's `result` summary field.
    async fn update_result(
        &self,
        pairing_id: PairingId,
        code: crate::domain::model::ResultCode,
    ) -> EngineResult<()>;

    async fn get(&self, pairing_id: PairingId) -> EngineResult<Pairing>;
}

/// Result row reads and writes.
pub trait ResultRepo: Send + Sync {
    async fn insert_for_pairing(&self, rows: Vec<GameResult>) -> EngineResult<()>;
    async fn list_for_player(&self, player_id: PlayerId) -> EngineResult<Vec<GameResult>>;
    async fn list_for_tournament(&self, tournament_id: TournamentId) -> EngineResult<Vec<GameResult>>;
    async fn list_for_pairing(&self, pairing_id: PairingId) -> EngineResult<Vec<GameResult>>;
    async fn delete_for_pairing(&self, pairing_id: PairingId) -> EngineResult<()>;
}
