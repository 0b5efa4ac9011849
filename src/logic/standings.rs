//! Standings: aggregate finalized matches into a ranked table.

use crate::logic::walkover::validate_finalized;
use crate::models::{
    Match, MatchOutcome, MatchStatus, Phase, StandingsRow, Team, TeamId, TournamentError,
    TournamentId, RECENT_FORM_LEN,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::{Ordering, Reverse};
use std::collections::HashMap;

/// Compute the standings table.
///
/// Only finalized matches count (win 3, draw 1, loss 0); walkovers are ordinary 3-0 results.
/// Rows are ordered by points, wins, goal difference, goals for (all descending); teams
/// still level keep the order they have in `teams`. The top `qualifiers_count` rows are
/// flagged as qualified.
///
/// A finalized match with an invalid score fails the whole call. A match naming a team that
/// is not in `teams` is skipped with a warning.
pub fn compute_standings(
    teams: &[Team],
    matches: &[Match],
    qualifiers_count: usize,
) -> Result<Vec<StandingsRow>, TournamentError> {
    let mut finalized: Vec<&Match> = matches
        .iter()
        .filter(|m| m.status == MatchStatus::Finalized)
        .collect();
    validate_finalized(finalized.iter().copied())?;

    let mut rows: Vec<StandingsRow> = Vec::with_capacity(teams.len());
    let mut index: HashMap<TeamId, usize> = HashMap::with_capacity(teams.len());
    for team in teams {
        if !index.contains_key(&team.id) {
            index.insert(team.id, rows.len());
            rows.push(StandingsRow::new(team.id));
        }
    }

    // Newest first so recent form can be filled while aggregating. Unscheduled sorts last.
    finalized.sort_by_key(|m| Reverse(m.scheduled_at));

    for m in finalized {
        let (home, away) = match (index.get(&m.home_team_id), index.get(&m.away_team_id)) {
            (Some(&home), Some(&away)) if home != away => (home, away),
            _ => {
                log::warn!(
                    "Skipping match {}: teams {} vs {} are not both in this tournament",
                    m.id,
                    m.home_team_id,
                    m.away_team_id
                );
                continue;
            }
        };
        let Some((home_score, away_score)) = m.final_score() else {
            continue;
        };
        for (idx, scored, conceded) in [(home, home_score, away_score), (away, away_score, home_score)] {
            let row = &mut rows[idx];
            row.record(scored, conceded);
            if row.recent_form.len() < RECENT_FORM_LEN {
                row.recent_form.push(MatchOutcome::from_goals(scored, conceded));
            }
        }
    }

    rows.sort_by(compare_rows);
    for (i, row) in rows.iter_mut().enumerate() {
        row.rank = i as u32 + 1;
        row.qualified = i < qualifiers_count;
    }
    Ok(rows)
}

/// Better row first: points, wins, goal difference, goals for.
fn compare_rows(a: &StandingsRow, b: &StandingsRow) -> Ordering {
    b.points
        .cmp(&a.points)
        .then(b.won.cmp(&a.won))
        .then(b.goal_diff.cmp(&a.goal_diff))
        .then(b.goals_for.cmp(&a.goals_for))
}

#[derive(Serialize)]
struct CsvRow<'a> {
    rank: u32,
    team: &'a str,
    points: u32,
    played: u32,
    won: u32,
    drawn: u32,
    lost: u32,
    goals_for: u32,
    goals_against: u32,
    goal_diff: i64,
    form: String,
    qualified: bool,
}

/// Render standings as CSV with a header row. Unknown team ids are written as the raw id.
pub fn standings_to_csv(rows: &[StandingsRow], teams: &[Team]) -> Result<String, csv::Error> {
    let names: HashMap<TeamId, &str> = teams.iter().map(|t| (t.id, t.name.as_str())).collect();
    let mut wtr = csv::Writer::from_writer(Vec::new());
    for row in rows {
        let fallback = row.team_id.to_string();
        wtr.serialize(CsvRow {
            rank: row.rank,
            team: names.get(&row.team_id).copied().unwrap_or(&fallback),
            points: row.points,
            played: row.played,
            won: row.won,
            drawn: row.drawn,
            lost: row.lost,
            goals_for: row.goals_for,
            goals_against: row.goals_against,
            goal_diff: row.goal_diff,
            form: row.form_string(),
            qualified: row.qualified,
        })?;
    }
    let bytes = wtr.into_inner().map_err(|e| csv::Error::from(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| csv::Error::from(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// What a cached table was computed from. Any change means recompute.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Fingerprint {
    latest_update: Option<DateTime<Utc>>,
    matches: usize,
    teams: usize,
    qualifiers_count: usize,
}

impl Fingerprint {
    fn of(teams: &[Team], matches: &[Match], qualifiers_count: usize) -> Self {
        Self {
            latest_update: matches.iter().map(|m| m.updated_at).max(),
            matches: matches.len(),
            teams: teams.len(),
            qualifiers_count,
        }
    }
}

/// Standings cache keyed by (tournament, phase), invalidated by the latest match update.
#[derive(Debug, Default)]
pub struct StandingsCache {
    entries: HashMap<(TournamentId, Phase), (Fingerprint, Vec<StandingsRow>)>,
}

impl StandingsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached table if the inputs are unchanged, otherwise compute and store it.
    pub fn get_or_compute(
        &mut self,
        tournament_id: TournamentId,
        phase: Phase,
        teams: &[Team],
        matches: &[Match],
        qualifiers_count: usize,
    ) -> Result<Vec<StandingsRow>, TournamentError> {
        let fingerprint = Fingerprint::of(teams, matches, qualifiers_count);
        if let Some((cached, rows)) = self.entries.get(&(tournament_id, phase)) {
            if *cached == fingerprint {
                return Ok(rows.clone());
            }
        }
        let rows = compute_standings(teams, matches, qualifiers_count)?;
        self.entries
            .insert((tournament_id, phase), (fingerprint, rows.clone()));
        Ok(rows)
    }

    pub fn invalidate(&mut self, tournament_id: TournamentId) {
        self.entries.retain(|(id, _), _| *id != tournament_id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
