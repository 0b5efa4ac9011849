//! Storage seam for the engine: the `MatchRepository` trait and an in-memory implementation.
//!
//! The engine functions in `logic` never touch storage. Only `PhaseController` talks to a
//! repository, and it receives one explicitly.

use crate::models::{
    Match, MatchId, MatchStatus, Phase, Side, Team, Tournament, TournamentId,
};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

/// Errors raised by a repository implementation.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum RepositoryError {
    #[error("Tournament {0} not found")]
    TournamentNotFound(TournamentId),
    #[error("Match {0} not found")]
    MatchNotFound(MatchId),
    /// The write conflicts with the stored state (e.g. a stale phase).
    #[error("Conflicting write: {0}")]
    Conflict(String),
    #[error("Repository lock poisoned")]
    LockPoisoned,
}

/// Supplies and stores tournament data on behalf of the engine.
pub trait MatchRepository {
    fn get_tournament(&self, tournament_id: TournamentId) -> Result<Tournament, RepositoryError>;

    fn list_teams(&self, tournament_id: TournamentId) -> Result<Vec<Team>, RepositoryError>;

    /// Every match of the tournament regardless of status, optionally limited to one phase.
    fn list_matches(
        &self,
        tournament_id: TournamentId,
        phase: Option<Phase>,
    ) -> Result<Vec<Match>, RepositoryError>;

    fn list_finalized_matches(
        &self,
        tournament_id: TournamentId,
        phase: Option<Phase>,
    ) -> Result<Vec<Match>, RepositoryError> {
        let mut matches = self.list_matches(tournament_id, phase)?;
        matches.retain(|m| m.status == MatchStatus::Finalized);
        Ok(matches)
    }

    fn insert_matches(&self, matches: Vec<Match>) -> Result<(), RepositoryError>;

    fn update_tournament_phase(
        &self,
        tournament_id: TournamentId,
        phase: Phase,
    ) -> Result<(), RepositoryError>;

    /// Persist the next round's matches together with the new phase pointer.
    ///
    /// Implementations backed by a transactional store should override this to write both
    /// atomically.
    fn commit_phase_advance(
        &self,
        tournament_id: TournamentId,
        matches: Vec<Match>,
        phase: Phase,
    ) -> Result<(), RepositoryError> {
        self.insert_matches(matches)?;
        self.update_tournament_phase(tournament_id, phase)
    }
}

#[derive(Debug, Default)]
struct Store {
    tournaments: HashMap<TournamentId, Tournament>,
    teams: HashMap<TournamentId, Vec<Team>>,
    matches: HashMap<TournamentId, Vec<Match>>,
}

impl Store {
    fn tournament_mut(&mut self, id: TournamentId) -> Result<&mut Tournament, RepositoryError> {
        self.tournaments
            .get_mut(&id)
            .ok_or(RepositoryError::TournamentNotFound(id))
    }

    fn match_mut(
        &mut self,
        tournament_id: TournamentId,
        match_id: MatchId,
    ) -> Result<&mut Match, RepositoryError> {
        self.matches
            .get_mut(&tournament_id)
            .and_then(|ms| ms.iter_mut().find(|m| m.id == match_id))
            .ok_or(RepositoryError::MatchNotFound(match_id))
    }

    fn insert(&mut self, matches: Vec<Match>) -> Result<(), RepositoryError> {
        // Check every target first so a bad batch leaves the store untouched.
        for m in &matches {
            if !self.tournaments.contains_key(&m.tournament_id) {
                return Err(RepositoryError::TournamentNotFound(m.tournament_id));
            }
        }
        for m in matches {
            self.matches.entry(m.tournament_id).or_default().push(m);
        }
        Ok(())
    }

    fn set_phase(&mut self, id: TournamentId, phase: Phase) -> Result<(), RepositoryError> {
        self.tournament_mut(id)?
            .advance_to(phase)
            .map_err(|e| RepositoryError::Conflict(e.to_string()))
    }
}

/// Thread-safe in-memory repository. Entities are stored in maps keyed by id.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    store: RwLock<Store>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Store>, RepositoryError> {
        self.store.read().map_err(|_| RepositoryError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Store>, RepositoryError> {
        self.store.write().map_err(|_| RepositoryError::LockPoisoned)
    }

    /// Store a tournament header (overwrites one with the same id).
    pub fn create_tournament(&self, tournament: Tournament) -> Result<Tournament, RepositoryError> {
        let mut store = self.write()?;
        store.teams.entry(tournament.id).or_default();
        store.tournaments.insert(tournament.id, tournament.clone());
        Ok(tournament)
    }

    pub fn add_team(&self, tournament_id: TournamentId, team: Team) -> Result<Team, RepositoryError> {
        let mut store = self.write()?;
        store.tournament_mut(tournament_id)?;
        store
            .teams
            .entry(tournament_id)
            .or_default()
            .push(team.clone());
        Ok(team)
    }

    pub fn get_match(
        &self,
        tournament_id: TournamentId,
        match_id: MatchId,
    ) -> Result<Match, RepositoryError> {
        let store = self.read()?;
        store
            .matches
            .get(&tournament_id)
            .and_then(|ms| ms.iter().find(|m| m.id == match_id))
            .cloned()
            .ok_or(RepositoryError::MatchNotFound(match_id))
    }

    /// Result entry: finalize a match with a played score.
    pub fn record_result(
        &self,
        tournament_id: TournamentId,
        match_id: MatchId,
        home_score: u32,
        away_score: u32,
    ) -> Result<Match, RepositoryError> {
        let mut store = self.write()?;
        let m = store.match_mut(tournament_id, match_id)?;
        m.record_result(home_score, away_score);
        Ok(m.clone())
    }

    /// Result entry: finalize a match as a walkover against the absent side.
    pub fn record_walkover(
        &self,
        tournament_id: TournamentId,
        match_id: MatchId,
        absent: Side,
    ) -> Result<Match, RepositoryError> {
        let mut store = self.write()?;
        let m = store.match_mut(tournament_id, match_id)?;
        m.record_walkover(absent);
        Ok(m.clone())
    }

    pub fn cancel_match(
        &self,
        tournament_id: TournamentId,
        match_id: MatchId,
    ) -> Result<Match, RepositoryError> {
        let mut store = self.write()?;
        let m = store.match_mut(tournament_id, match_id)?;
        m.cancel();
        Ok(m.clone())
    }
}

impl MatchRepository for InMemoryRepository {
    fn get_tournament(&self, tournament_id: TournamentId) -> Result<Tournament, RepositoryError> {
        self.read()?
            .tournaments
            .get(&tournament_id)
            .cloned()
            .ok_or(RepositoryError::TournamentNotFound(tournament_id))
    }

    fn list_teams(&self, tournament_id: TournamentId) -> Result<Vec<Team>, RepositoryError> {
        let store = self.read()?;
        if !store.tournaments.contains_key(&tournament_id) {
            return Err(RepositoryError::TournamentNotFound(tournament_id));
        }
        Ok(store.teams.get(&tournament_id).cloned().unwrap_or_default())
    }

    fn list_matches(
        &self,
        tournament_id: TournamentId,
        phase: Option<Phase>,
    ) -> Result<Vec<Match>, RepositoryError> {
        let store = self.read()?;
        if !store.tournaments.contains_key(&tournament_id) {
            return Err(RepositoryError::TournamentNotFound(tournament_id));
        }
        Ok(store
            .matches
            .get(&tournament_id)
            .map(|ms| {
                ms.iter()
                    .filter(|m| phase.map_or(true, |p| m.phase == p))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn insert_matches(&self, matches: Vec<Match>) -> Result<(), RepositoryError> {
        self.write()?.insert(matches)
    }

    fn update_tournament_phase(
        &self,
        tournament_id: TournamentId,
        phase: Phase,
    ) -> Result<(), RepositoryError> {
        self.write()?.set_phase(tournament_id, phase)
    }

    fn commit_phase_advance(
        &self,
        tournament_id: TournamentId,
        matches: Vec<Match>,
        phase: Phase,
    ) -> Result<(), RepositoryError> {
        let mut store = self.write()?;
        // Phase check first: a stale advance must not leave orphan matches behind.
        let current = store.tournament_mut(tournament_id)?.current_phase;
        if phase <= current {
            return Err(RepositoryError::Conflict(format!(
                "Cannot move from {current} to {phase}"
            )));
        }
        store.insert(matches)?;
        store.set_phase(tournament_id, phase)
    }
}
