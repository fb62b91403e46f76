//! Input/output shapes that cross component boundaries but are not entities
//! in their own right (§4.3.6 contract summary, §4.1 registry views).

use serde::{Deserialize, Serialize};

use crate::domain::model::{ByeType, Pairing};
use crate::identifiers::PlayerId;

/// One relaxation or soft-limit event reported alongside a section's pairings
/// (§4.3.1 "Failure semantics").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairingWarning {
    pub kind: WarningKind,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// A pairing repeats an earlier-round opponent.
    RepeatPairing,
    /// A color preference was violated (but not an absolute one).
    ColorPreferenceViolated,
    /// The FIDE float budget for this section/round was exceeded (§4.3.1 post-check).
    FloatLimitExceeded,
}

/// The result of pairing one section for one round (§4.3.6).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SectionPairingResult {
    pub pairings: Vec<Pairing>,
    pub warnings: Vec<PairingWarning>,
}

/// View of a roster split by registered-bye status for a round (§4.1
/// `PairablePlayersForRound`).
#[derive(Debug, Clone)]
pub struct RoundRoster {
    pub pairable: Vec<PlayerId>,
    pub registered_byes: Vec<PlayerId>,
}

/// One game result entry as submitted to the Result Recorder (§4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordGameResult {
    pub pairing_id: crate::identifiers::PairingId,
    pub code: String,
}

/// A bye/unpaired result entry as submitted to the Result Recorder (§4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordByeResult {
    pub pairing_id: crate::identifiers::PairingId,
    pub bye_type: ByeType,
}

/// One player's row in the standings output (§4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandingsRow {
    pub player_id: PlayerId,
    pub rank: u32,
    pub points: f64,
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub tiebreaks: Vec<(crate::domain::model::TiebreakKind, f64)>,
}

/// A report of pairings missing a recorded result, returned by a failed
/// `AdvanceRound` (Scenario E).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissingResults {
    pub section: String,
    pub pairing_ids: Vec<crate::identifiers::PairingId>,
}
