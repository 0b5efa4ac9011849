//! Result validation: score presence and the fixed walkover score.

use crate::models::{Match, MatchStatus, Side, TournamentError, WALKOVER_GOALS};

/// Check the score invariants of a single match.
///
/// - A finalized match carries both scores.
/// - A walkover names the absent side and is scored 3-0 for the other side.
///
/// Scheduled, in-progress and cancelled matches without a walkover flag always pass.
pub fn validate_match(m: &Match) -> Result<(), TournamentError> {
    if m.status == MatchStatus::Finalized && (m.home_score.is_none() || m.away_score.is_none()) {
        return Err(TournamentError::MissingScore(m.id));
    }
    if !m.is_walkover {
        return Ok(());
    }
    let absent = m
        .walkover_absent_side
        .ok_or(TournamentError::MissingWalkoverSide(m.id))?;
    let expected = match absent {
        Side::Home => (Some(0), Some(WALKOVER_GOALS)),
        Side::Away => (Some(WALKOVER_GOALS), Some(0)),
    };
    if (m.home_score, m.away_score) != expected {
        return Err(TournamentError::MalformedWalkover(m.id));
    }
    Ok(())
}

/// Validate every finalized match; the first failure wins.
pub fn validate_finalized<'a>(
    matches: impl IntoIterator<Item = &'a Match>,
) -> Result<(), TournamentError> {
    matches
        .into_iter()
        .filter(|m| m.status == MatchStatus::Finalized)
        .try_for_each(validate_match)
}
