//! Tournament, Phase and TournamentError.

use crate::models::game::MatchId;
use crate::repository::RepositoryError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during tournament operations.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum TournamentError {
    /// Fewer than 2 distinct teams to build fixtures from.
    #[error("Need at least 2 teams to generate fixtures")]
    InsufficientTeams,
    /// Fixtures already exist on the target date.
    #[error("Fixtures already exist for {date}")]
    DuplicateFixtures { date: NaiveDate },
    /// Every pair of teams has already met.
    #[error("Every pair of teams has already played; the round robin is complete")]
    TournamentComplete,
    /// A kickoff slot would fall outside the representable time range.
    #[error("Cannot schedule {slots} match(es) {match_duration_minutes} minutes apart")]
    InvalidSchedule {
        slots: usize,
        match_duration_minutes: u32,
    },
    /// A session must allow at least one match.
    #[error("Session size must be at least 1 match")]
    InvalidSessionSize,
    /// Fewer than 2 participants to seed a bracket.
    #[error("Need at least 2 participants to seed a bracket")]
    InsufficientParticipants,
    /// A bracket needs an even number of participants.
    #[error("Cannot pair an odd number of participants ({0})")]
    OddParticipantCount(usize),
    /// No knockout round starts with this many teams.
    #[error("No knockout round starts with {0} teams (expected 2, 4, 8 or 16)")]
    UnsupportedBracketSize(usize),
    /// Matches of the current round are still scheduled or in progress.
    #[error("{} match(es) of the current round are not finished", .0.len())]
    MatchesPending(Vec<MatchId>),
    /// Knockout matches ended level and have no winner.
    #[error("{} knockout match(es) ended in a draw and have no winner", .0.len())]
    UndecidedMatches(Vec<MatchId>),
    /// A finalized match without both scores.
    #[error("Finalized match {0} is missing a score")]
    MissingScore(MatchId),
    /// A walkover without the absent side.
    #[error("Walkover match {0} does not say which side was absent")]
    MissingWalkoverSide(MatchId),
    /// A walkover whose score is not 3-0 for the present side.
    #[error("Walkover match {0} must be scored 3-0 for the side that showed up")]
    MalformedWalkover(MatchId),
    /// Tournament is not in a phase that allows this action.
    #[error("Invalid state for this action")]
    InvalidState,
    /// Phases only move forward.
    #[error("Cannot move from {from} to {to}")]
    PhaseRegression { from: Phase, to: Phase },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Unique identifier for a tournament.
pub type TournamentId = Uuid;

/// Named stage of the tournament, in play order.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Round-robin group stage.
    #[default]
    Groups,
    Round16,
    Quarter,
    Semi,
    Final,
    /// Terminal; no more matches.
    Completed,
}

impl Phase {
    /// The phase that follows this one, None once completed.
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Groups => Some(Phase::Round16),
            Phase::Round16 => Some(Phase::Quarter),
            Phase::Quarter => Some(Phase::Semi),
            Phase::Semi => Some(Phase::Final),
            Phase::Final => Some(Phase::Completed),
            Phase::Completed => None,
        }
    }

    pub fn is_knockout(self) -> bool {
        matches!(
            self,
            Phase::Round16 | Phase::Quarter | Phase::Semi | Phase::Final
        )
    }

    /// Number of teams that start this knockout round.
    pub fn bracket_size(self) -> Option<usize> {
        match self {
            Phase::Round16 => Some(16),
            Phase::Quarter => Some(8),
            Phase::Semi => Some(4),
            Phase::Final => Some(2),
            Phase::Groups | Phase::Completed => None,
        }
    }

    /// Knockout round that starts with exactly `teams` participants.
    pub fn entry_for_bracket(teams: usize) -> Option<Phase> {
        [Phase::Round16, Phase::Quarter, Phase::Semi, Phase::Final]
            .into_iter()
            .find(|p| p.bracket_size() == Some(teams))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Groups => "groups",
            Phase::Round16 => "round16",
            Phase::Quarter => "quarter",
            Phase::Semi => "semi",
            Phase::Final => "final",
            Phase::Completed => "completed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How qualifiers are placed into the first knockout round.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedingMode {
    /// Best vs. worst: rank i meets rank n+1-i.
    #[default]
    ByPosition,
    /// Shuffle the qualifiers, then pair them in order.
    Random,
}

/// Tournament header: which phase is active and how many teams leave the groups.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub current_phase: Phase,
    /// Teams advancing from groups to the knockout stage.
    pub qualifiers_count: usize,
    #[serde(default)]
    pub seeding: SeedingMode,
}

impl Tournament {
    /// Create a new tournament in the group phase.
    pub fn new(name: impl Into<String>, qualifiers_count: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            current_phase: Phase::Groups,
            qualifiers_count,
            seeding: SeedingMode::default(),
        }
    }

    pub fn with_seeding(mut self, seeding: SeedingMode) -> Self {
        self.seeding = seeding;
        self
    }

    /// Move the phase pointer. Only strictly forward moves are accepted.
    pub fn advance_to(&mut self, phase: Phase) -> Result<(), TournamentError> {
        if phase <= self.current_phase {
            return Err(TournamentError::PhaseRegression {
                from: self.current_phase,
                to: phase,
            });
        }
        self.current_phase = phase;
        Ok(())
    }
}
