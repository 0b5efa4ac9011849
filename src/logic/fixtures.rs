//! Group stage: round-robin fixture generation, either the whole schedule at once or one
//! session (a batch in which no team plays twice) at a time.

use crate::models::{
    Match, MatchStatus, PairKey, Phase, Team, TeamId, TournamentError, TournamentId,
};
use chrono::{DateTime, TimeDelta, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Where and when generated matches are played.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SlotPlan {
    /// Kickoff of the first match.
    pub start_time: DateTime<Utc>,
    /// Each following match kicks off this many minutes after the previous one.
    pub match_duration_minutes: u32,
    pub venue: String,
    #[serde(default)]
    pub round_number: Option<u32>,
}

impl SlotPlan {
    pub fn new(start_time: DateTime<Utc>, match_duration_minutes: u32, venue: impl Into<String>) -> Self {
        Self {
            start_time,
            match_duration_minutes,
            venue: venue.into(),
            round_number: None,
        }
    }

    pub fn with_round(mut self, round_number: u32) -> Self {
        self.round_number = Some(round_number);
        self
    }

    /// Kickoff time of the match in slot `slot` (0-based), None past the calendar's range.
    pub fn kickoff(&self, slot: usize) -> Option<DateTime<Utc>> {
        let slot = i64::try_from(slot).ok()?;
        let offset = i64::from(self.match_duration_minutes).checked_mul(slot)?;
        self.start_time.checked_add_signed(TimeDelta::try_minutes(offset)?)
    }
}

/// Result of `generate_session`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SessionOutcome {
    /// As many matches as requested.
    Full(Vec<Match>),
    /// Fewer matches than requested could be built without repeating a team.
    Partial { matches: Vec<Match>, requested: usize },
}

impl SessionOutcome {
    pub fn matches(&self) -> &[Match] {
        match self {
            SessionOutcome::Full(matches) => matches,
            SessionOutcome::Partial { matches, .. } => matches,
        }
    }

    pub fn into_matches(self) -> Vec<Match> {
        match self {
            SessionOutcome::Full(matches) => matches,
            SessionOutcome::Partial { matches, .. } => matches,
        }
    }

    pub fn is_partial(&self) -> bool {
        matches!(self, SessionOutcome::Partial { .. })
    }
}

/// Pairs that already have a fixture. Every non-cancelled match counts, played or not.
pub fn played_pairs(matches: &[Match]) -> HashSet<PairKey> {
    matches
        .iter()
        .filter(|m| m.status != MatchStatus::Cancelled)
        .map(Match::pair_key)
        .collect()
}

/// Team ids in input order, first occurrence wins.
fn distinct_team_ids(teams: &[Team]) -> Vec<TeamId> {
    let mut seen = HashSet::with_capacity(teams.len());
    teams
        .iter()
        .filter(|t| {
            let fresh = seen.insert(t.id);
            if !fresh {
                log::debug!("Ignoring duplicate team {} ({})", t.id, t.name);
            }
            fresh
        })
        .map(|t| t.id)
        .collect()
}

/// Every unordered pair once; home is the team listed first.
fn all_pairs(ids: &[TeamId]) -> Vec<(TeamId, TeamId)> {
    ids.iter()
        .enumerate()
        .flat_map(|(i, &home)| ids[i + 1..].iter().map(move |&away| (home, away)))
        .collect()
}

/// Turn ordered pairings into group matches with sequential kickoff slots.
///
/// Fails with `InvalidSchedule` if any slot falls outside the representable time range.
fn schedule(
    tournament_id: TournamentId,
    pairs: &[(TeamId, TeamId)],
    plan: &SlotPlan,
) -> Result<Vec<Match>, TournamentError> {
    pairs
        .iter()
        .enumerate()
        .map(|(slot, &(home, away))| {
            let kickoff = plan.kickoff(slot).ok_or(TournamentError::InvalidSchedule {
                slots: pairs.len(),
                match_duration_minutes: plan.match_duration_minutes,
            })?;
            Ok(Match::new(tournament_id, home, away, Phase::Groups)
                .scheduled_at(kickoff)
                .at_venue(plan.venue.clone())
                .in_round(plan.round_number))
        })
        .collect()
}

/// Generate the complete single round robin: n*(n-1)/2 matches in random order.
///
/// `existing` is the caller's view of already stored matches; if any non-cancelled one is
/// scheduled on the same day as `plan.start_time`, nothing is generated.
pub fn generate_full_round_robin(
    tournament_id: TournamentId,
    teams: &[Team],
    plan: &SlotPlan,
    existing: &[Match],
) -> Result<Vec<Match>, TournamentError> {
    generate_full_round_robin_with_rng(tournament_id, teams, plan, existing, &mut rand::thread_rng())
}

/// `generate_full_round_robin` with a caller-supplied random source.
pub fn generate_full_round_robin_with_rng<R: Rng + ?Sized>(
    tournament_id: TournamentId,
    teams: &[Team],
    plan: &SlotPlan,
    existing: &[Match],
    rng: &mut R,
) -> Result<Vec<Match>, TournamentError> {
    let ids = distinct_team_ids(teams);
    if ids.len() < 2 {
        return Err(TournamentError::InsufficientTeams);
    }

    let date = plan.start_time.date_naive();
    let clash = existing.iter().any(|m| {
        m.status != MatchStatus::Cancelled
            && m.scheduled_at.map(|at| at.date_naive()) == Some(date)
    });
    if clash {
        return Err(TournamentError::DuplicateFixtures { date });
    }

    let mut pairs = all_pairs(&ids);
    pairs.shuffle(rng);
    log::debug!(
        "Generated full round robin for {}: {} teams, {} matches",
        tournament_id,
        ids.len(),
        pairs.len()
    );
    schedule(tournament_id, &pairs, plan)
}

/// Generate one session: up to `max_matches` not-yet-played pairings, no team twice.
///
/// Candidates are tried in random order and accepted greedily. When fewer than
/// `max_matches` can be assembled the result is `SessionOutcome::Partial`.
///
/// With fewer than 2 distinct teams there are no pairs at all, which is reported as
/// `InsufficientTeams` (as for the full round robin) rather than `TournamentComplete`.
pub fn generate_session(
    tournament_id: TournamentId,
    teams: &[Team],
    played: &HashSet<PairKey>,
    max_matches: usize,
    plan: &SlotPlan,
) -> Result<SessionOutcome, TournamentError> {
    generate_session_with_rng(
        tournament_id,
        teams,
        played,
        max_matches,
        plan,
        &mut rand::thread_rng(),
    )
}

/// `generate_session` with a caller-supplied random source.
pub fn generate_session_with_rng<R: Rng + ?Sized>(
    tournament_id: TournamentId,
    teams: &[Team],
    played: &HashSet<PairKey>,
    max_matches: usize,
    plan: &SlotPlan,
    rng: &mut R,
) -> Result<SessionOutcome, TournamentError> {
    if max_matches == 0 {
        return Err(TournamentError::InvalidSessionSize);
    }
    let ids = distinct_team_ids(teams);
    if ids.len() < 2 {
        return Err(TournamentError::InsufficientTeams);
    }

    let mut candidates: Vec<(TeamId, TeamId)> = all_pairs(&ids)
        .into_iter()
        .filter(|&(a, b)| !played.contains(&PairKey::new(a, b)))
        .collect();
    if candidates.is_empty() {
        return Err(TournamentError::TournamentComplete);
    }
    candidates.shuffle(rng);

    let mut busy: HashSet<TeamId> = HashSet::new();
    let mut accepted = Vec::with_capacity(max_matches);
    for (home, away) in candidates {
        if accepted.len() == max_matches {
            break;
        }
        if busy.contains(&home) || busy.contains(&away) {
            continue;
        }
        busy.insert(home);
        busy.insert(away);
        accepted.push((home, away));
    }

    let matches = schedule(tournament_id, &accepted, plan)?;
    if matches.len() < max_matches {
        log::warn!(
            "Session for {} is partial: {} of {} requested matches",
            tournament_id,
            matches.len(),
            max_matches
        );
        return Ok(SessionOutcome::Partial {
            matches,
            requested: max_matches,
        });
    }
    log::debug!("Generated session for {}: {} matches", tournament_id, matches.len());
    Ok(SessionOutcome::Full(matches))
}
