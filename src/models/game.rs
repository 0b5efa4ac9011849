//! Match record, match status, side and pair identity.

use crate::models::team::TeamId;
use crate::models::tournament::{Phase, TournamentId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a match.
pub type MatchId = Uuid;

/// Goals awarded to the present side of a walkover.
pub const WALKOVER_GOALS: u32 = 3;

/// Home or away side of a match.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Home,
    Away,
}

/// Lifecycle status of a match.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Scheduled,
    InProgress,
    Finalized,
    Cancelled,
}

impl MatchStatus {
    /// Finalized or cancelled: nothing more will happen to this match.
    pub fn is_settled(self) -> bool {
        matches!(self, MatchStatus::Finalized | MatchStatus::Cancelled)
    }
}

/// Unordered pair of team ids. `PairKey::new(a, b) == PairKey::new(b, a)`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct PairKey(TeamId, TeamId);

impl PairKey {
    pub fn new(a: TeamId, b: TeamId) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }
}

/// A single match between a home and an away team.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    /// Kickoff time; None until the match is put on the calendar.
    pub scheduled_at: Option<DateTime<Utc>>,
    pub venue: String,
    pub round_number: Option<u32>,
    pub phase: Phase,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    pub is_walkover: bool,
    /// Required when `is_walkover` is set.
    pub walkover_absent_side: Option<Side>,
    pub status: MatchStatus,
    /// Bumped on every result mutation.
    pub updated_at: DateTime<Utc>,
}

impl Match {
    /// A new scheduled match with no kickoff time, venue or score.
    pub fn new(tournament_id: TournamentId, home: TeamId, away: TeamId, phase: Phase) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            home_team_id: home,
            away_team_id: away,
            scheduled_at: None,
            venue: String::new(),
            round_number: None,
            phase,
            home_score: None,
            away_score: None,
            is_walkover: false,
            walkover_absent_side: None,
            status: MatchStatus::Scheduled,
            updated_at: Utc::now(),
        }
    }

    pub fn scheduled_at(mut self, at: DateTime<Utc>) -> Self {
        self.scheduled_at = Some(at);
        self
    }

    pub fn at_venue(mut self, venue: impl Into<String>) -> Self {
        self.venue = venue.into();
        self
    }

    pub fn in_round(mut self, round_number: Option<u32>) -> Self {
        self.round_number = round_number;
        self
    }

    pub fn pair_key(&self) -> PairKey {
        PairKey::new(self.home_team_id, self.away_team_id)
    }

    /// Finalize with an ordinary played result. Clears any walkover marker.
    pub fn record_result(&mut self, home_score: u32, away_score: u32) {
        self.home_score = Some(home_score);
        self.away_score = Some(away_score);
        self.is_walkover = false;
        self.walkover_absent_side = None;
        self.status = MatchStatus::Finalized;
        self.updated_at = Utc::now();
    }

    /// Finalize as a walkover: the side that showed up wins 3-0.
    pub fn record_walkover(&mut self, absent: Side) {
        let (home, away) = match absent {
            Side::Home => (0, WALKOVER_GOALS),
            Side::Away => (WALKOVER_GOALS, 0),
        };
        self.home_score = Some(home);
        self.away_score = Some(away);
        self.is_walkover = true;
        self.walkover_absent_side = Some(absent);
        self.status = MatchStatus::Finalized;
        self.updated_at = Utc::now();
    }

    pub fn cancel(&mut self) {
        self.status = MatchStatus::Cancelled;
        self.updated_at = Utc::now();
    }

    /// Both scores, only for a finalized match.
    pub fn final_score(&self) -> Option<(u32, u32)> {
        if self.status != MatchStatus::Finalized {
            return None;
        }
        Some((self.home_score?, self.away_score?))
    }

    /// Winner of a finalized match; None for a draw or an unfinished match.
    pub fn winner(&self) -> Option<TeamId> {
        let (home, away) = self.final_score()?;
        match home.cmp(&away) {
            std::cmp::Ordering::Greater => Some(self.home_team_id),
            std::cmp::Ordering::Less => Some(self.away_team_id),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn is_draw(&self) -> bool {
        matches!(self.final_score(), Some((home, away)) if home == away)
    }
}
