//! Knockout stage (single-elimination bracket): seeding, round winners and round advancement.

use crate::logic::walkover::validate_finalized;
use crate::models::{
    Match, MatchId, Phase, SeedingMode, StandingsRow, TeamId, Tournament, TournamentError,
    TournamentId,
};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One first-round knockout tie built from the standings.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Pairing {
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    /// Group-stage rank of the home team.
    pub home_seed: u32,
    pub away_seed: u32,
}

impl Pairing {
    fn between(home: &StandingsRow, away: &StandingsRow) -> Self {
        Self {
            home_team_id: home.team_id,
            away_team_id: away.team_id,
            home_seed: home.rank,
            away_seed: away.rank,
        }
    }
}

/// Winners of a knockout round, in the order of their matches.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RoundWinners {
    pub winners: Vec<TeamId>,
    /// Finalized matches that ended level and therefore have no winner.
    pub undecided: Vec<MatchId>,
}

/// Result of a successful phase transition, to be persisted by the caller.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct PhaseAdvance {
    pub from: Phase,
    pub to: Phase,
    /// Matches of the new phase; empty when the tournament is completed.
    pub matches: Vec<Match>,
    /// Winner of the final, once the tournament is completed.
    pub champion: Option<TeamId>,
}

/// Pair the qualifiers for the first knockout round. Seeds randomly or best vs. worst.
pub fn seed_from_standings(
    rows: &[StandingsRow],
    mode: SeedingMode,
) -> Result<Vec<Pairing>, TournamentError> {
    seed_from_standings_with_rng(rows, mode, &mut rand::thread_rng())
}

/// `seed_from_standings` with a caller-supplied random source.
///
/// `ByPosition`: rows are ordered by rank and rank i meets rank n+1-i.
/// `Random`: rows are shuffled and paired in order.
pub fn seed_from_standings_with_rng<R: Rng + ?Sized>(
    rows: &[StandingsRow],
    mode: SeedingMode,
    rng: &mut R,
) -> Result<Vec<Pairing>, TournamentError> {
    let n = rows.len();
    if n < 2 {
        return Err(TournamentError::InsufficientParticipants);
    }
    if n % 2 != 0 {
        return Err(TournamentError::OddParticipantCount(n));
    }

    let mut seeded: Vec<&StandingsRow> = rows.iter().collect();
    let pairings = match mode {
        SeedingMode::ByPosition => {
            seeded.sort_by_key(|r| r.rank);
            (0..n / 2)
                .map(|i| Pairing::between(seeded[i], seeded[n - 1 - i]))
                .collect()
        }
        SeedingMode::Random => {
            seeded.shuffle(rng);
            seeded
                .chunks_exact(2)
                .map(|pair| Pairing::between(pair[0], pair[1]))
                .collect()
        }
    };
    Ok(pairings)
}

/// Teams playing in the given round, in order of first appearance.
pub fn participants_of_round(matches: &[Match]) -> Vec<TeamId> {
    let mut seen = HashSet::new();
    matches
        .iter()
        .flat_map(|m| [m.home_team_id, m.away_team_id])
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Winners of the finalized matches, in match order. Draws are reported, never resolved.
pub fn winners_of_round(matches: &[Match]) -> RoundWinners {
    let mut result = RoundWinners::default();
    for m in matches {
        if let Some(winner) = m.winner() {
            result.winners.push(winner);
        } else if m.is_draw() {
            result.undecided.push(m.id);
        }
    }
    result
}

/// Build the matches of a knockout phase from seeded pairings.
pub fn pairings_to_matches(
    tournament_id: TournamentId,
    pairings: &[Pairing],
    phase: Phase,
    venue: &str,
) -> Vec<Match> {
    pairings
        .iter()
        .map(|p| Match::new(tournament_id, p.home_team_id, p.away_team_id, phase).at_venue(venue))
        .collect()
}

/// Close the current knockout round and produce the next one.
///
/// Every match must be finalized or cancelled. Winners are paired in the order of their
/// matches (winner of match 1 vs. winner of match 2, and so on). After the final the
/// tournament is completed and no matches are produced.
pub fn advance_phase(
    tournament: &Tournament,
    current_round_matches: &[Match],
    venue: &str,
) -> Result<PhaseAdvance, TournamentError> {
    let phase = tournament.current_phase;
    let next = match phase.next() {
        Some(next) if phase.is_knockout() => next,
        _ => return Err(TournamentError::InvalidState),
    };
    if current_round_matches.is_empty() {
        return Err(TournamentError::InsufficientParticipants);
    }

    let pending: Vec<MatchId> = current_round_matches
        .iter()
        .filter(|m| !m.status.is_settled())
        .map(|m| m.id)
        .collect();
    if !pending.is_empty() {
        return Err(TournamentError::MatchesPending(pending));
    }
    validate_finalized(current_round_matches)?;

    let RoundWinners { winners, undecided } = winners_of_round(current_round_matches);
    if !undecided.is_empty() {
        log::warn!(
            "{} {} match(es) of {} ended level; no winner can be derived",
            undecided.len(),
            phase,
            tournament.id
        );
        return Err(TournamentError::UndecidedMatches(undecided));
    }

    if phase == Phase::Final {
        let champion = winners.first().copied();
        if champion.is_none() {
            return Err(TournamentError::InsufficientParticipants);
        }
        return Ok(PhaseAdvance {
            from: phase,
            to: Phase::Completed,
            matches: Vec::new(),
            champion,
        });
    }

    if winners.len() < 2 {
        return Err(TournamentError::InsufficientParticipants);
    }
    if winners.len() % 2 != 0 {
        return Err(TournamentError::OddParticipantCount(winners.len()));
    }
    let matches = winners
        .chunks_exact(2)
        .map(|pair| Match::new(tournament.id, pair[0], pair[1], next).at_venue(venue))
        .collect();
    Ok(PhaseAdvance {
        from: phase,
        to: next,
        matches,
        champion: None,
    })
}
