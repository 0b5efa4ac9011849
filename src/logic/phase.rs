//! Phase controller: drives a tournament through groups → knockout rounds → completed.
//!
//! All reads and writes go through the injected `MatchRepository`. Advancement and fixture
//! generation are serialized per tournament, so a double submission produces at most one
//! transition or batch.

use crate::logic::bracket::{self, pairings_to_matches, seed_from_standings, PhaseAdvance};
use crate::logic::fixtures::{
    generate_full_round_robin, generate_session, played_pairs, SessionOutcome, SlotPlan,
};
use crate::logic::standings::compute_standings;
use crate::models::{
    Match, MatchId, Phase, StandingsRow, Tournament, TournamentError, TournamentId,
};
use crate::repository::MatchRepository;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub struct PhaseController<R> {
    repository: R,
    locks: Mutex<HashMap<TournamentId, Arc<Mutex<()>>>>,
}

impl<R: MatchRepository> PhaseController<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// The lock serializing mutations of one tournament.
    ///
    /// Neither mutex guards data of its own, so a poisoned one is taken over as is.
    fn lock_for(&self, tournament_id: TournamentId) -> Arc<Mutex<()>> {
        self.tracked_locks()
            .entry(tournament_id)
            .or_default()
            .clone()
    }

    fn tracked_locks(&self) -> MutexGuard<'_, HashMap<TournamentId, Arc<Mutex<()>>>> {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of tournaments that currently hold a mutation lock entry.
    pub fn tracked_tournaments(&self) -> usize {
        self.tracked_locks().len()
    }

    fn group_stage(&self, tournament_id: TournamentId) -> Result<Tournament, TournamentError> {
        let tournament = self.repository.get_tournament(tournament_id)?;
        if tournament.current_phase != Phase::Groups {
            return Err(TournamentError::InvalidState);
        }
        Ok(tournament)
    }

    /// Current group-stage standings.
    pub fn standings(&self, tournament_id: TournamentId) -> Result<Vec<StandingsRow>, TournamentError> {
        let tournament = self.repository.get_tournament(tournament_id)?;
        let teams = self.repository.list_teams(tournament_id)?;
        let matches = self
            .repository
            .list_finalized_matches(tournament_id, Some(Phase::Groups))?;
        compute_standings(&teams, &matches, tournament.qualifiers_count)
    }

    /// Generate and store the full group-stage round robin.
    pub fn generate_round_robin(
        &self,
        tournament_id: TournamentId,
        plan: &SlotPlan,
    ) -> Result<Vec<Match>, TournamentError> {
        let lock = self.lock_for(tournament_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        self.group_stage(tournament_id)?;
        let teams = self.repository.list_teams(tournament_id)?;
        let existing = self.repository.list_matches(tournament_id, None)?;
        let matches = generate_full_round_robin(tournament_id, &teams, plan, &existing)?;
        self.repository.insert_matches(matches.clone())?;
        log::info!(
            "Stored round robin for {}: {} matches",
            tournament_id,
            matches.len()
        );
        Ok(matches)
    }

    /// Generate and store the next group-stage session.
    pub fn generate_session(
        &self,
        tournament_id: TournamentId,
        max_matches: usize,
        plan: &SlotPlan,
    ) -> Result<SessionOutcome, TournamentError> {
        let lock = self.lock_for(tournament_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        self.group_stage(tournament_id)?;
        let teams = self.repository.list_teams(tournament_id)?;
        let existing = self
            .repository
            .list_matches(tournament_id, Some(Phase::Groups))?;
        let played = played_pairs(&existing);
        let outcome = generate_session(tournament_id, &teams, &played, max_matches, plan)?;
        self.repository.insert_matches(outcome.matches().to_vec())?;
        log::info!(
            "Stored session for {}: {} matches{}",
            tournament_id,
            outcome.matches().len(),
            if outcome.is_partial() { " (partial)" } else { "" }
        );
        Ok(outcome)
    }

    /// Close the active phase and open the next one.
    ///
    /// From `groups` the top `qualifiers_count` teams are seeded into the knockout round of
    /// that size, which skips the larger rounds: 4 qualifiers go straight from `groups` to
    /// `semi`, 2 to `final`. From a knockout round the winners are paired in match order.
    /// The new matches and phase are committed together. Once the tournament is completed
    /// its lock entry is dropped.
    pub fn advance(
        &self,
        tournament_id: TournamentId,
        venue: &str,
    ) -> Result<PhaseAdvance, TournamentError> {
        let lock = self.lock_for(tournament_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        // Re-read under the lock: a concurrent caller may already have advanced.
        let tournament = self.repository.get_tournament(tournament_id)?;
        let advance = match tournament.current_phase {
            Phase::Completed => return Err(TournamentError::InvalidState),
            Phase::Groups => self.close_group_stage(&tournament, venue)?,
            phase => {
                let round = self.repository.list_matches(tournament_id, Some(phase))?;
                bracket::advance_phase(&tournament, &round, venue)?
            }
        };

        self.repository
            .commit_phase_advance(tournament_id, advance.matches.clone(), advance.to)?;
        log::info!(
            "Tournament {} advanced {} -> {} ({} new matches)",
            tournament_id,
            advance.from,
            advance.to,
            advance.matches.len()
        );
        if let Some(champion) = advance.champion {
            log::info!("Tournament {} completed; champion {}", tournament_id, champion);
        }
        if advance.to == Phase::Completed {
            self.tracked_locks().remove(&tournament_id);
        }
        Ok(advance)
    }

    fn close_group_stage(
        &self,
        tournament: &Tournament,
        venue: &str,
    ) -> Result<PhaseAdvance, TournamentError> {
        let matches = self
            .repository
            .list_matches(tournament.id, Some(Phase::Groups))?;
        let pending: Vec<MatchId> = matches
            .iter()
            .filter(|m| !m.status.is_settled())
            .map(|m| m.id)
            .collect();
        if !pending.is_empty() {
            return Err(TournamentError::MatchesPending(pending));
        }

        let teams = self.repository.list_teams(tournament.id)?;
        let qualifiers: Vec<StandingsRow> =
            compute_standings(&teams, &matches, tournament.qualifiers_count)?
                .into_iter()
                .filter(|row| row.qualified)
                .collect();
        let pairings = seed_from_standings(&qualifiers, tournament.seeding)?;
        let entry = Phase::entry_for_bracket(qualifiers.len())
            .ok_or(TournamentError::UnsupportedBracketSize(qualifiers.len()))?;

        Ok(PhaseAdvance {
            from: Phase::Groups,
            to: entry,
            matches: pairings_to_matches(tournament.id, &pairings, entry, venue),
            champion: None,
        })
    }
}
