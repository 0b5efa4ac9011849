//! Integration tests for the knockout bracket: seeding, round winners and advancement.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use tournament_engine::{
    advance_phase, participants_of_round, seed_from_standings, seed_from_standings_with_rng,
    winners_of_round, Match, MatchStatus, Phase, SeedingMode, Side, StandingsRow, TeamId,
    Tournament, TournamentError,
};
use uuid::Uuid;

/// Rows ranked 1..=n, listed in reverse so seeding has to sort them.
fn ranked_rows(n: u32) -> Vec<StandingsRow> {
    (1..=n)
        .rev()
        .map(|rank| StandingsRow {
            rank,
            ..StandingsRow::new(Uuid::new_v4())
        })
        .collect()
}

fn rank_of(rows: &[StandingsRow], team: TeamId) -> u32 {
    rows.iter().find(|r| r.team_id == team).unwrap().rank
}

fn tournament_in(phase: Phase) -> Tournament {
    let mut t = Tournament::new("Cup", 8);
    t.current_phase = phase;
    t
}

fn round(t: &Tournament, teams: &[TeamId], phase: Phase) -> Vec<Match> {
    teams
        .chunks_exact(2)
        .map(|pair| Match::new(t.id, pair[0], pair[1], phase))
        .collect()
}

fn ids(n: usize) -> Vec<TeamId> {
    (0..n).map(|_| Uuid::new_v4()).collect()
}

#[test]
fn eight_qualifiers_by_position_pair_best_with_worst() {
    let rows = ranked_rows(8);
    let pairings = seed_from_standings(&rows, SeedingMode::ByPosition).unwrap();

    let seeds: Vec<(u32, u32)> = pairings
        .iter()
        .map(|p| (rank_of(&rows, p.home_team_id), rank_of(&rows, p.away_team_id)))
        .collect();
    assert_eq!(seeds, vec![(1, 8), (2, 7), (3, 6), (4, 5)]);
    let recorded: Vec<(u32, u32)> = pairings.iter().map(|p| (p.home_seed, p.away_seed)).collect();
    assert_eq!(recorded, seeds);
}

#[test]
fn random_seeding_uses_every_qualifier_once() {
    let rows = ranked_rows(8);
    let mut rng = StdRng::seed_from_u64(9);
    let pairings = seed_from_standings_with_rng(&rows, SeedingMode::Random, &mut rng).unwrap();

    assert_eq!(pairings.len(), 4);
    let used: HashSet<TeamId> = pairings
        .iter()
        .flat_map(|p| [p.home_team_id, p.away_team_id])
        .collect();
    assert_eq!(used.len(), 8);
}

#[test]
fn seeding_rejects_odd_and_tiny_fields() {
    assert_eq!(
        seed_from_standings(&ranked_rows(3), SeedingMode::ByPosition),
        Err(TournamentError::OddParticipantCount(3))
    );
    assert_eq!(
        seed_from_standings(&ranked_rows(1), SeedingMode::ByPosition),
        Err(TournamentError::InsufficientParticipants)
    );
    assert_eq!(
        seed_from_standings(&[], SeedingMode::Random),
        Err(TournamentError::InsufficientParticipants)
    );
}

#[test]
fn participants_are_listed_once_in_order() {
    let t = tournament_in(Phase::Quarter);
    let teams = ids(4);
    let matches = round(&t, &teams, Phase::Quarter);
    assert_eq!(participants_of_round(&matches), teams);
}

#[test]
fn winners_follow_match_order_and_draws_are_flagged() {
    let t = tournament_in(Phase::Quarter);
    let teams = ids(6);
    let mut matches = round(&t, &teams, Phase::Quarter);
    matches[0].record_result(0, 2);
    matches[1].record_result(1, 1);
    matches[2].record_walkover(Side::Away);

    let result = winners_of_round(&matches);
    assert_eq!(result.winners, vec![teams[1], teams[4]]);
    assert_eq!(result.undecided, vec![matches[1].id]);
}

#[test]
fn advance_is_blocked_by_unfinished_matches() {
    let t = tournament_in(Phase::Quarter);
    let mut matches = round(&t, &ids(8), Phase::Quarter);
    matches[0].record_result(1, 0);
    matches[1].status = MatchStatus::InProgress;
    matches[3].cancel();

    assert_eq!(
        advance_phase(&t, &matches, "Arena"),
        Err(TournamentError::MatchesPending(vec![matches[1].id, matches[2].id]))
    );
}

#[test]
fn quarter_final_winners_meet_in_arrival_order() {
    let t = tournament_in(Phase::Quarter);
    let teams = ids(8);
    let mut matches = round(&t, &teams, Phase::Quarter);
    matches[0].record_result(3, 1); // teams[0]
    matches[1].record_result(0, 1); // teams[3]
    matches[2].record_walkover(Side::Home); // teams[5]
    matches[3].record_result(2, 0); // teams[6]

    let advance = advance_phase(&t, &matches, "Arena").unwrap();
    assert_eq!(advance.from, Phase::Quarter);
    assert_eq!(advance.to, Phase::Semi);
    assert_eq!(advance.champion, None);
    let pairs: Vec<(TeamId, TeamId)> = advance
        .matches
        .iter()
        .map(|m| (m.home_team_id, m.away_team_id))
        .collect();
    assert_eq!(pairs, vec![(teams[0], teams[3]), (teams[5], teams[6])]);
    for m in &advance.matches {
        assert_eq!(m.phase, Phase::Semi);
        assert_eq!(m.status, MatchStatus::Scheduled);
        assert_eq!(m.venue, "Arena");
        assert_eq!(m.tournament_id, t.id);
    }
}

#[test]
fn final_completes_the_tournament() {
    let t = tournament_in(Phase::Final);
    let teams = ids(2);
    let mut matches = round(&t, &teams, Phase::Final);
    matches[0].record_result(1, 2);

    let advance = advance_phase(&t, &matches, "").unwrap();
    assert_eq!(advance.to, Phase::Completed);
    assert!(advance.matches.is_empty());
    assert_eq!(advance.champion, Some(teams[1]));
}

#[test]
fn drawn_knockout_match_blocks_advancement() {
    let t = tournament_in(Phase::Semi);
    let mut matches = round(&t, &ids(4), Phase::Semi);
    matches[0].record_result(1, 0);
    matches[1].record_result(2, 2);

    assert_eq!(
        advance_phase(&t, &matches, ""),
        Err(TournamentError::UndecidedMatches(vec![matches[1].id]))
    );
}

#[test]
fn malformed_walkover_blocks_advancement() {
    let t = tournament_in(Phase::Semi);
    let mut matches = round(&t, &ids(4), Phase::Semi);
    matches[0].record_result(1, 0);
    matches[1].record_walkover(Side::Home);
    matches[1].away_score = Some(1);

    assert_eq!(
        advance_phase(&t, &matches, ""),
        Err(TournamentError::MalformedWalkover(matches[1].id))
    );
}

#[test]
fn advance_outside_knockout_phases_is_invalid() {
    for phase in [Phase::Groups, Phase::Completed] {
        let t = tournament_in(phase);
        assert_eq!(advance_phase(&t, &[], ""), Err(TournamentError::InvalidState));
    }
}

#[test]
fn odd_number_of_winners_cannot_be_paired() {
    let t = tournament_in(Phase::Round16);
    let mut matches = round(&t, &ids(6), Phase::Round16);
    matches[0].record_result(1, 0);
    matches[1].record_result(1, 0);
    matches[2].record_result(1, 0);

    assert_eq!(
        advance_phase(&t, &matches, ""),
        Err(TournamentError::OddParticipantCount(3))
    );
}
