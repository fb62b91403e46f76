//! Section Partitioner (§4.2): splits a tournament's roster into independent
//! pairing universes. A section never sees another section's players,
//! pairings, or standings — every downstream component takes a section name
//! and operates only within it.

use crate::domain::model::Player;
use crate::error::{EngineError, EngineResult};
use crate::identifiers::TournamentId;
use crate::repository::{PlayerRepo, TournamentRepo};

pub struct SectionPartitioner<'a, T, P> {
    tournaments: &'a T,
    players: &'a P,
}

impl<'a, T, P> SectionPartitioner<'a, T, P>
where
    T: TournamentRepo,
    P: PlayerRepo,
{
    pub fn new(tournaments: &'a T, players: &'a P) -> Self {
        Self { tournaments, players }
    }

    /// The tournament's declared sections, alphabetically ordered — pairing
    /// and round-advance logic always iterates sections in this order so
    /// results are deterministic across runs.
    pub async fn sections(&self, tournament_id: TournamentId) -> EngineResult<Vec<String>> {
        let mut sections = self.tournaments.list_sections(tournament_id).await?;
        sections.sort();
        sections.dedup();
        Ok(sections)
    }

    /// Every active player assigned to `section`, independent of every other
    /// section in the tournament.
    pub async fn roster(&self, tournament_id: TournamentId, section: &str) -> EngineResult<Vec<Player>> {
        if !self.sections(tournament_id).await?.iter().any(|s| s == section) {
            return Err(EngineError::not_found(format!(
                "section {section} in tournament {tournament_id}"
            )));
        }
        self.players.list_active_in_section(tournament_id, section).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Tournament, TournamentFormat};
    use crate::repository::memory::MemoryRepo;

    #[tokio::test]
    async fn sections_are_alphabetical_and_deduped() {
        let repo = MemoryRepo::new();
        let mut tournament = Tournament::new("Test", TournamentFormat::Swiss, 5);
        tournament.sections = vec!["B".into(), "A".into(), "A".into()];
        let tid = tournament.id;
        repo.insert_tournament(tournament);

        let partitioner = SectionPartitioner::new(&repo, &repo);
        let sections = partitioner.sections(tid).await.unwrap();
        assert_eq!(sections, vec!["A".to_string(), "B".to_string()]);
    }

    #[tokio::test]
    async fn roster_rejects_unknown_section() {
        let repo = MemoryRepo::new();
        let tournament = Tournament::new("Test", TournamentFormat::Swiss, 5);
        let tid = tournament.id;
        repo.insert_tournament(tournament);

        let partitioner = SectionPartitioner::new(&repo, &repo);
        let err = partitioner.roster(tid, "Nonexistent").await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[tokio::test]
    async fn roster_only_returns_players_in_that_section() {
        let repo = MemoryRepo::new();
        let tournament = Tournament::new("Test", TournamentFormat::Swiss, 5);
        let tid = tournament.id;
        repo.insert_tournament(tournament);
        let p1 = Player::new(tid, "Alice", "Open");
        let p2 = Player::new(tid, "Bob", "U1800");
        repo.insert_player(p1.clone());
        repo.insert_player(p2.clone());

        let partitioner = SectionPartitioner::new(&repo, &repo);
        let roster = partitioner.roster(tid, "Open").await.unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].id, p1.id);
    }
}
