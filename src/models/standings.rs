//! Standings table rows and per-match outcomes.

use crate::models::team::TeamId;
use serde::{Deserialize, Serialize};

/// Maximum number of results kept in `StandingsRow::recent_form`.
pub const RECENT_FORM_LEN: usize = 5;

/// Result of a match from one team's point of view.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    Win,
    Draw,
    Loss,
}

impl MatchOutcome {
    pub fn from_goals(scored: u32, conceded: u32) -> Self {
        match scored.cmp(&conceded) {
            std::cmp::Ordering::Greater => MatchOutcome::Win,
            std::cmp::Ordering::Equal => MatchOutcome::Draw,
            std::cmp::Ordering::Less => MatchOutcome::Loss,
        }
    }

    /// Table points: win 3, draw 1, loss 0.
    pub fn points(self) -> u32 {
        match self {
            MatchOutcome::Win => 3,
            MatchOutcome::Draw => 1,
            MatchOutcome::Loss => 0,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            MatchOutcome::Win => 'W',
            MatchOutcome::Draw => 'D',
            MatchOutcome::Loss => 'L',
        }
    }
}

/// One team's line in the standings table.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct StandingsRow {
    /// 1-based position after sorting.
    pub rank: u32,
    pub team_id: TeamId,
    pub points: u32,
    pub played: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub goal_diff: i64,
    /// Newest first, at most `RECENT_FORM_LEN` entries.
    pub recent_form: Vec<MatchOutcome>,
    pub qualified: bool,
}

impl StandingsRow {
    pub fn new(team_id: TeamId) -> Self {
        Self {
            team_id,
            ..Self::default()
        }
    }

    /// Fold one finalized result into the row.
    pub fn record(&mut self, scored: u32, conceded: u32) {
        let outcome = MatchOutcome::from_goals(scored, conceded);
        self.played += 1;
        match outcome {
            MatchOutcome::Win => self.won += 1,
            MatchOutcome::Draw => self.drawn += 1,
            MatchOutcome::Loss => self.lost += 1,
        }
        self.points += outcome.points();
        self.goals_for = self.goals_for.saturating_add(scored);
        self.goals_against = self.goals_against.saturating_add(conceded);
        self.goal_diff = i64::from(self.goals_for) - i64::from(self.goals_against);
    }

    /// Form as a compact string, newest first (e.g. "WWDL").
    pub fn form_string(&self) -> String {
        self.recent_form.iter().map(|o| o.as_char()).collect()
    }
}
