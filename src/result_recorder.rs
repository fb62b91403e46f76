//! Result Recorder (§4.4): the only component permitted to write game
//! outcomes. Enforces atomicity (pairing status and result rows move
//! together) and per-pairing once-only writes.

use crate::domain::dto::{RecordByeResult, RecordGameResult};
use crate::domain::model::{GameResultRow, Pairing, ResultCode};
use crate::error::{EngineError, EngineResult};
use crate::identifiers::{PairingId, ResultId};
use crate::repository::{PairingRepo, ResultRepo};

pub struct ResultRecorder<'a, G, R> {
    pairings: &'a G,
    results: &'a R,
}

impl<'a, G, R> ResultRecorder<'a, G, R>
where
    G: PairingRepo,
    R: ResultRepo,
{
    pub fn new(pairings: &'a G, results: &'a R) -> Self {
        Self { pairings, results }
    }

    /// `RecordGameResult(pairingId, code)` (§4.4). Writes two Result rows,
    /// one per player, with points derived from `code`. Rejects byes and
    /// resubmission with a divergent payload; an identical resubmission is a
    /// no-op (idempotence, §8).
    pub async fn record_game_result(&self, request: RecordGameResult) -> EngineResult<Pairing> {
        let RecordGameResult { pairing_id, code } = request;
        let pairing = self.pairings.get(pairing_id).await?;
        if pairing.is_bye() {
            return Err(EngineError::validation(format!(
                "pairing {pairing_id} is a bye; use record_bye_result"
            )));
        }
        let parsed = ResultCode::parse_game_code(&code)
            .ok_or_else(|| EngineError::validation(format!("unknown result code {code}")))?;

        if let Some(existing) = pairing.result {
            return if existing == parsed {
                Ok(pairing)
            } else {
                Err(EngineError::conflict(format!(
                    "pairing {pairing_id} already has result {existing:?}, got {parsed:?}"
                )))
            };
        }

        let white_id = pairing.white_id.expect("non-bye pairing has a white player");
        let black_id = pairing.black_id.expect("non-bye pairing has a black player");
        let white_points = parsed.white_points();
        let rows = vec![
            GameResultRow {
                id: ResultId::random(),
                pairing_id,
                player_id: white_id,
                points: white_points,
                code: parsed,
            },
            GameResultRow {
                id: ResultId::random(),
                pairing_id,
                player_id: black_id,
                points: 1.0 - white_points,
                code: parsed,
            },
        ];

        self.results.insert_for_pairing(rows).await?;
        self.pairings.update_result(pairing_id, parsed).await?;

        let mut updated = pairing;
        updated.result = Some(parsed);
        Ok(updated)
    }

    /// `RecordByeResult(pairingId, byeType)` (§4.4). Writes one Result row
    /// with points 0.5 (bye) or 1.0 (unpaired). Rejects a pairing that has a
    /// black player.
    pub async fn record_bye_result(&self, request: RecordByeResult) -> EngineResult<Pairing> {
        let RecordByeResult { pairing_id, bye_type } = request;
        let pairing = self.pairings.get(pairing_id).await?;
        if pairing.black_id.is_some() {
            return Err(EngineError::validation(format!(
                "pairing {pairing_id} has two players; use record_game_result"
            )));
        }
        let parsed = match bye_type {
            crate::domain::model::ByeType::Bye => ResultCode::Bye,
            crate::domain::model::ByeType::Unpaired => ResultCode::Unpaired,
        };

        if let Some(existing) = pairing.result {
            return if existing == parsed {
                Ok(pairing)
            } else {
                Err(EngineError::conflict(format!(
                    "pairing {pairing_id} already has result {existing:?}, got {parsed:?}"
                )))
            };
        }

        let player_id = pairing.white_id.expect("bye pairing has a player in white_id");
        let points = match parsed {
            ResultCode::Bye => 0.5,
            ResultCode::Unpaired => 1.0,
            _ => unreachable!(),
        };

        self.results
            .insert_for_pairing(vec![GameResultRow {
                id: ResultId::random(),
                pairing_id,
                player_id,
                points,
                code: parsed,
            }])
            .await?;
        self.pairings.update_result(pairing_id, parsed).await?;

        let mut updated = pairing;
        updated.result = Some(parsed);
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ByeType, Player, Tournament, TournamentFormat};
    use crate::repository::memory::MemoryRepo;

    async fn setup_game() -> (MemoryRepo, PairingId) {
        let repo = MemoryRepo::new();
        let tournament = Tournament::new("Test", TournamentFormat::Swiss, 3);
        let tid = tournament.id;
        repo.insert_tournament(tournament);
        let white = Player::new(tid, "Alice", "Open");
        let black = Player::new(tid, "Bob", "Open");
        let pairing = Pairing::game(tid, 1, "Open", 1, white.id, black.id);
        let pairing_id = pairing.id;
        repo.insert_player(white);
        repo.insert_player(black);
        repo.insert_batch(vec![pairing]).await.unwrap();
        (repo, pairing_id)
    }

    #[tokio::test]
    async fn records_game_result_with_two_rows() {
        let (repo, pairing_id) = setup_game().await;
        let recorder = ResultRecorder::new(&repo, &repo);
        let pairing = recorder
            .record_game_result(RecordGameResult { pairing_id, code: "1-0".to_string() })
            .await
            .unwrap();
        assert_eq!(pairing.result, Some(ResultCode::WhiteWins));

        let rows = ResultRepo::list_for_pairing(&repo, pairing_id).await.unwrap();
        assert_eq!(rows.len(), 2);
        let total: f64 = rows.iter().map(|r| r.points).sum();
        assert_eq!(total, 1.0);
    }

    #[tokio::test]
    async fn identical_resubmission_is_a_no_op() {
        let (repo, pairing_id) = setup_game().await;
        let recorder = ResultRecorder::new(&repo, &repo);
        recorder
            .record_game_result(RecordGameResult { pairing_id, code: "1/2-1/2".to_string() })
            .await
            .unwrap();
        let second = recorder
            .record_game_result(RecordGameResult { pairing_id, code: "1/2-1/2".to_string() })
            .await
            .unwrap();
        assert_eq!(second.result, Some(ResultCode::Draw));
        let rows = ResultRepo::list_for_pairing(&repo, pairing_id).await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn divergent_resubmission_conflicts() {
        let (repo, pairing_id) = setup_game().await;
        let recorder = ResultRecorder::new(&repo, &repo);
        recorder
            .record_game_result(RecordGameResult { pairing_id, code: "1-0".to_string() })
            .await
            .unwrap();
        let err = recorder
            .record_game_result(RecordGameResult { pairing_id, code: "0-1".to_string() })
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Conflict(_)));
    }

    #[tokio::test]
    async fn bye_result_awards_half_point() {
        let repo = MemoryRepo::new();
        let tournament = Tournament::new("Test", TournamentFormat::Swiss, 3);
        let tid = tournament.id;
        repo.insert_tournament(tournament);
        let player = Player::new(tid, "Alice", "Open");
        let pairing = Pairing::bye(tid, 1, "Open", 1, player.id, ByeType::Bye);
        let pairing_id = pairing.id;
        repo.insert_player(player);
        repo.insert_batch(vec![pairing]).await.unwrap();

        let recorder = ResultRecorder::new(&repo, &repo);
        let updated = recorder
            .record_bye_result(RecordByeResult { pairing_id, bye_type: ByeType::Bye })
            .await
            .unwrap();
        assert_eq!(updated.result, Some(ResultCode::Bye));
        let rows = ResultRepo::list_for_pairing(&repo, pairing_id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].points, 0.5);
    }
}
