//! Entities from the data model (§3): [`Tournament`], [`Player`], [`Team`],
//! [`Pairing`], [`Result`], and the tagged variants that replace the source's
//! nullable free-strings (§9 "Dynamic typing → tagged variants").

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::identifiers::{PairingId, PlayerId, TeamId, TournamentId};

/// The pairing format a tournament uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentFormat {
    Swiss,
    RoundRobin,
    Quad,
    SingleElimination,
    TeamSwiss,
    OnlineRated,
}

/// Lifecycle status of a tournament.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    Draft,
    Active,
    Completed,
}

/// Per-tournament configuration: pairing variant and tiebreak order (§4.5, §9
/// "Configuration" in SPEC_FULL.md).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentSettings {
    /// Order in which tiebreaks are applied when points are equal.
    pub tiebreak_order: Vec<TiebreakKind>,
    /// Swiss-specific knobs; ignored for other formats.
    pub swiss: crate::pairing::swiss::SwissSettings,
}

impl Default for TournamentSettings {
    fn default() -> Self {
        Self {
            tiebreak_order: vec![
                TiebreakKind::Buchholz,
                TiebreakKind::MedianBuchholz,
                TiebreakKind::SonnebornBerger,
                TiebreakKind::Cumulative,
            ],
            swiss: crate::pairing::swiss::SwissSettings::default(),
        }
    }
}

/// A tournament.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub format: TournamentFormat,
    pub round_count: u32,
    pub current_round: u32,
    pub sections: Vec<String>,
    pub time_control: String,
    pub status: TournamentStatus,
    pub settings: TournamentSettings,
}

impl Tournament {
    pub fn new(name: impl Into<String>, format: TournamentFormat, round_count: u32) -> Self {
        Self {
            id: TournamentId::random(),
            name: name.into(),
            format,
            round_count,
            current_round: 0,
            sections: vec!["Open".to_string()],
            time_control: String::new(),
            status: TournamentStatus::Draft,
            settings: TournamentSettings::default(),
        }
    }
}

/// A player's roster status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    Active,
    Withdrawn,
}

/// A player registered in a tournament.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub tournament_id: TournamentId,
    pub name: String,
    /// 0-3000, nullable.
    pub rating: Option<i32>,
    pub uscf_id: Option<String>,
    pub fide_id: Option<String>,
    pub section: String,
    pub status: PlayerStatus,
    /// Rounds in which this player has registered a bye in advance.
    pub intentional_bye_rounds: HashSet<u32>,
    pub team_id: Option<TeamId>,
}

impl Player {
    pub fn new(tournament_id: TournamentId, name: impl Into<String>, section: impl Into<String>) -> Self {
        Self {
            id: PlayerId::random(),
            tournament_id,
            name: name.into(),
            rating: None,
            uscf_id: None,
            fide_id: None,
            section: section.into(),
            status: PlayerStatus::Active,
            intentional_bye_rounds: HashSet::new(),
            team_id: None,
        }
    }

    pub fn can_play(&self) -> bool {
        self.status == PlayerStatus::Active
    }

    pub fn has_registered_bye(&self, round: u32) -> bool {
        self.intentional_bye_rounds.contains(&round)
    }
}

/// A team (team format only). Board 1 is the highest-rated player.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub tournament_id: TournamentId,
    pub name: String,
    pub section: String,
    /// Ordered board list; `boards[0]` is board 1.
    pub boards: Vec<PlayerId>,
}

/// Why a pairing is not a normal game between two players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByeType {
    /// Automatic half-point bye assigned by the engine to balance an odd section.
    Bye,
    /// Registered/no-show full-point bye.
    Unpaired,
}

/// A single board's pairing within a (tournament, round, section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pairing {
    pub id: PairingId,
    pub tournament_id: TournamentId,
    pub round: u32,
    pub section: String,
    /// 1-based, dense, independent per section (invariant 1 in §3).
    pub board: u32,
    pub white_id: Option<PlayerId>,
    pub black_id: Option<PlayerId>,
    pub bye_type: Option<ByeType>,
    pub result: Option<ResultCode>,
}

impl Pairing {
    /// A normal game between two players.
    pub fn game(
        tournament_id: TournamentId,
        round: u32,
        section: impl Into<String>,
        board: u32,
        white_id: PlayerId,
        black_id: PlayerId,
    ) -> Self {
        Self {
            id: PairingId::random(),
            tournament_id,
            round,
            section: section.into(),
            board,
            white_id: Some(white_id),
            black_id: Some(black_id),
            bye_type: None,
            result: None,
        }
    }

    /// A bye or unpaired pairing for a single player.
    pub fn bye(
        tournament_id: TournamentId,
        round: u32,
        section: impl Into<String>,
        board: u32,
        player_id: PlayerId,
        bye_type: ByeType,
    ) -> Self {
        Self {
            id: PairingId::random(),
            tournament_id,
            round,
            section: section.into(),
            board,
            white_id: Some(player_id),
            black_id: None,
            bye_type: Some(bye_type),
            result: None,
        }
    }

    pub fn is_bye(&self) -> bool {
        self.bye_type.is_some()
    }

    pub fn has_result(&self) -> bool {
        self.result.is_some()
    }

    /// All non-null player ids in this pairing.
    pub fn players(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.white_id.into_iter().chain(self.black_id)
    }
}

/// The derived outcome code for a game result, a closed variant replacing the
/// source's free-string `result` field (§9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultCode {
    WhiteWins,
    BlackWins,
    Draw,
    WhiteWinsForfeit,
    BlackWinsForfeit,
    DrawForfeit,
    Bye,
    Unpaired,
}

impl ResultCode {
    /// Parses the wire codes from §4.4 (`1-0`, `0-1`, `1/2-1/2`, and their `F`
    /// forfeit variants).
    pub fn parse_game_code(code: &str) -> Option<Self> {
        Some(match code {
            "1-0" => Self::WhiteWins,
            "0-1" => Self::BlackWins,
            "1/2-1/2" => Self::Draw,
            "1-0F" => Self::WhiteWinsForfeit,
            "0-1F" => Self::BlackWinsForfeit,
            "1/2-1/2F" => Self::DrawForfeit,
            _ => return None,
        })
    }

    pub fn is_forfeit(&self) -> bool {
        matches!(self, Self::WhiteWinsForfeit | Self::BlackWinsForfeit | Self::DrawForfeit)
    }

    /// Points awarded to the white player (black is the complement for games).
    pub fn white_points(&self) -> f64 {
        match self {
            Self::WhiteWins | Self::WhiteWinsForfeit => 1.0,
            Self::BlackWins | Self::BlackWinsForfeit => 0.0,
            Self::Draw | Self::DrawForfeit => 0.5,
            Self::Bye | Self::Unpaired => unreachable!("bye codes have no white/black split"),
        }
    }
}

/// A single player's recorded outcome for a pairing (§3 `Result`). Two rows
/// exist per game, one per bye/unpaired pairing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameResultRow {
    pub id: crate::identifiers::ResultId,
    pub pairing_id: PairingId,
    pub player_id: PlayerId,
    pub points: f64,
    pub code: ResultCode,
}

/// Alias matching the vocabulary used in §3 ("Result"); renamed internally to
/// avoid colliding with [`std::result::Result`].
pub type Result = GameResultRow;

/// A tiebreak the Standings & Tiebreak Calculator can compute (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TiebreakKind {
    Buchholz,
    MedianBuchholz,
    SonnebornBerger,
    Cumulative,
    /// Identical definition to Buchholz in this system (§4.5).
    Solkoff,
    DirectEncounter,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1-0", ResultCode::WhiteWins, 1.0, false)]
    #[case("0-1", ResultCode::BlackWins, 0.0, false)]
    #[case("1/2-1/2", ResultCode::Draw, 0.5, false)]
    #[case("1-0F", ResultCode::WhiteWinsForfeit, 1.0, true)]
    #[case("0-1F", ResultCode::BlackWinsForfeit, 0.0, true)]
    #[case("1/2-1/2F", ResultCode::DrawForfeit, 0.5, true)]
    fn parses_every_wire_code(#[case] code: &str, #[case] expected: ResultCode, #[case] white_points: f64, #[case] is_forfeit: bool) {
        let parsed = ResultCode::parse_game_code(code).unwrap();
        assert_eq!(parsed, expected);
        assert_eq!(parsed.white_points(), white_points);
        assert_eq!(parsed.is_forfeit(), is_forfeit);
    }

    #[test]
    fn rejects_unknown_codes() {
        assert!(ResultCode::parse_game_code("1-1").is_none());
        assert!(ResultCode::parse_game_code("").is_none());
    }

    #[rstest]
    #[case(1, false)]
    #[case(2, true)]
    fn has_registered_bye_checks_exact_round(#[case] round: u32, #[case] expected: bool) {
        let mut player = Player::new(TournamentId::random(), "Alice", "Open");
        player.intentional_bye_rounds.insert(2);
        assert_eq!(player.has_registered_bye(round), expected);
    }
}
