//! Player Registry (§4.1): read-side views over the player roster that every
//! other component builds on.

use std::collections::{HashMap, HashSet};

use crate::domain::dto::RoundRoster;
use crate::domain::model::{ByeType, Pairing, Player};
use crate::error::EngineResult;
use crate::identifiers::{PlayerId, TournamentId};
use crate::repository::{PairingRepo, PlayerRepo};

/// A player's color history, oldest round first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    White,
    Black,
}

pub struct PlayerRegistry<'a, P, G> {
    players: &'a P,
    pairings: &'a G,
}

impl<'a, P, G> PlayerRegistry<'a, P, G>
where
    P: PlayerRepo,
    G: PairingRepo,
{
    pub fn new(players: &'a P, pairings: &'a G) -> Self {
        Self { players, pairings }
    }

    /// `ListActive` — every active player in a section.
    pub async fn list_active(
        &self,
        tournament_id: TournamentId,
        section: &str,
    ) -> EngineResult<Vec<Player>> {
        self.players.list_active_in_section(tournament_id, section).await
    }

    /// `PairablePlayersForRound` — splits active players into those who need a
    /// pairing this round and those who have a registered bye for it.
    pub async fn pairable_for_round(
        &self,
        tournament_id: TournamentId,
        section: &str,
        round: u32,
    ) -> EngineResult<RoundRoster> {
        let active = self.list_active(tournament_id, section).await?;
        let mut pairable = Vec::new();
        let mut registered_byes = Vec::new();
        for player in active {
            if player.has_registered_bye(round) {
                registered_byes.push(player.id);
            } else {
                pairable.push(player.id);
            }
        }
        Ok(RoundRoster { pairable, registered_byes })
    }

    /// `ColorHistory` — the sequence of colors a player has played, oldest
    /// first, up to (but not including) `upto_round`. Byes and unpaired
    /// rounds contribute no entry (§4.3.1 color preference rules only look at
    /// games actually played).
    pub async fn color_history(
        &self,
        tournament_id: TournamentId,
        section: &str,
        player_id: PlayerId,
        upto_round: u32,
    ) -> EngineResult<Vec<Color>> {
        let mut pairings = self
            .pairings
            .list_historical_in_section(tournament_id, section, upto_round)
            .await?;
        pairings.sort_by_key(|p| p.round);
        let mut history = Vec::new();
        for pairing in &pairings {
            if pairing.is_bye() {
                continue;
            }
            if pairing.white_id == Some(player_id) {
                history.push(Color::White);
            } else if pairing.black_id == Some(player_id) {
                history.push(Color::Black);
            }
        }
        Ok(history)
    }

    /// `OpponentsOf` — the set of players this player has already faced in a
    /// real game (byes excluded), up to (but not including) `upto_round`.
    pub async fn opponents_of(
        &self,
        tournament_id: TournamentId,
        section: &str,
        player_id: PlayerId,
        upto_round: u32,
    ) -> EngineResult<HashSet<PlayerId>> {
        let pairings = self
            .pairings
            .list_historical_in_section(tournament_id, section, upto_round)
            .await?;
        Ok(opponents_from_pairings(&pairings, player_id))
    }

    /// Builds the full opponent map for a section in one pass, used by the
    /// pairing engines so they don't re-query history once per player.
    pub async fn opponent_map(
        &self,
        tournament_id: TournamentId,
        section: &str,
        upto_round: u32,
    ) -> EngineResult<HashMap<PlayerId, HashSet<PlayerId>>> {
        let pairings = self
            .pairings
            .list_historical_in_section(tournament_id, section, upto_round)
            .await?;
        let mut map: HashMap<PlayerId, HashSet<PlayerId>> = HashMap::new();
        for pairing in &pairings {
            if pairing.is_bye() {
                continue;
            }
            if let (Some(white), Some(black)) = (pairing.white_id, pairing.black_id) {
                map.entry(white).or_default().insert(black);
                map.entry(black).or_default().insert(white);
            }
        }
        Ok(map)
    }

    /// How many automatic (half-point) byes a player has already received —
    /// used to pick who takes the next one when a section is odd (§4.3.1).
    pub async fn automatic_bye_count(
        &self,
        tournament_id: TournamentId,
        section: &str,
        player_id: PlayerId,
        upto_round: u32,
    ) -> EngineResult<u32> {
        let pairings = self
            .pairings
            .list_historical_in_section(tournament_id, section, upto_round)
            .await?;
        Ok(pairings
            .iter()
            .filter(|p| p.bye_type == Some(ByeType::Bye) && p.white_id == Some(player_id))
            .count() as u32)
    }
}

fn opponents_from_pairings(pairings: &[Pairing], player_id: PlayerId) -> HashSet<PlayerId> {
    let mut opponents = HashSet::new();
    for pairing in pairings {
        if pairing.is_bye() {
            continue;
        }
        match (pairing.white_id, pairing.black_id) {
            (Some(white), Some(black)) if white == player_id => {
                opponents.insert(black);
            }
            (Some(white), Some(black)) if black == player_id => {
                opponents.insert(white);
            }
            _ => {}
        }
    }
    opponents
}
