//! Integration tests for standings: points, tie-breaks, recent form, walkovers, export.

use chrono::{TimeZone, Utc};
use tournament_engine::{
    compute_standings, standings_to_csv, Match, MatchOutcome, Phase, Side, StandingsCache,
    StandingsRow, Team, TeamId, TournamentError, TournamentId,
};
use uuid::Uuid;

fn teams(names: &[&str]) -> Vec<Team> {
    names.iter().map(|n| Team::new(*n)).collect()
}

/// A finalized group match played on day `day` of June 2024.
fn played(
    tournament_id: TournamentId,
    home: &Team,
    away: &Team,
    home_score: u32,
    away_score: u32,
    day: u32,
) -> Match {
    let mut m = Match::new(tournament_id, home.id, away.id, Phase::Groups)
        .scheduled_at(Utc.with_ymd_and_hms(2024, 6, day, 18, 0, 0).unwrap());
    m.record_result(home_score, away_score);
    m
}

fn row<'a>(rows: &'a [StandingsRow], team: &Team) -> &'a StandingsRow {
    rows.iter().find(|r| r.team_id == team.id).unwrap()
}

fn order(rows: &[StandingsRow]) -> Vec<TeamId> {
    rows.iter().map(|r| r.team_id).collect()
}

#[test]
fn team_that_wins_every_match_ranks_first() {
    let tid = Uuid::new_v4();
    let ts = teams(&["A", "B", "C", "D"]);
    let (a, b, c, d) = (&ts[0], &ts[1], &ts[2], &ts[3]);
    let matches = vec![
        played(tid, a, b, 2, 0, 1),
        played(tid, a, c, 1, 0, 2),
        played(tid, d, a, 1, 3, 3),
        played(tid, b, c, 1, 1, 4),
        played(tid, c, d, 2, 1, 5),
        played(tid, b, d, 0, 1, 6),
    ];

    let rows = compute_standings(&ts, &matches, 0).unwrap();

    assert_eq!(rows[0].team_id, a.id);
    assert_eq!(rows[0].rank, 1);
    assert_eq!(rows[0].points, 9);
    assert_eq!(rows[0].won, 3);
    assert_eq!(rows[0].played, 3);
    assert_eq!(rows[0].goals_for, 6);
    assert_eq!(rows[0].goals_against, 1);
    assert_eq!(rows[0].goal_diff, 5);
    let ranks: Vec<u32> = rows.iter().map(|r| r.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3, 4]);

    let total_points: u32 = rows.iter().map(|r| r.points).sum();
    // 5 decisive matches and 1 draw.
    assert_eq!(total_points, 5 * 3 + 2);
}

#[test]
fn walkover_counts_as_an_ordinary_three_nil_win() {
    let tid = Uuid::new_v4();
    let ts = teams(&["A", "B"]);
    let mut m = Match::new(tid, ts[0].id, ts[1].id, Phase::Groups);
    m.record_walkover(Side::Away);

    let rows = compute_standings(&ts, &[m], 0).unwrap();
    let a = row(&rows, &ts[0]);
    let b = row(&rows, &ts[1]);

    assert_eq!((a.won, a.points, a.goals_for, a.goals_against), (1, 3, 3, 0));
    assert_eq!((b.lost, b.points, b.goals_for, b.goals_against), (1, 0, 0, 3));
    assert_eq!(b.goal_diff, -3);
}

#[test]
fn malformed_walkover_fails_without_partial_output() {
    let tid = Uuid::new_v4();
    let ts = teams(&["A", "B"]);
    let mut m = Match::new(tid, ts[0].id, ts[1].id, Phase::Groups);
    m.record_walkover(Side::Home);
    m.away_score = Some(5);

    assert_eq!(
        compute_standings(&ts, &[m.clone()], 0),
        Err(TournamentError::MalformedWalkover(m.id))
    );
}

#[test]
fn only_finalized_matches_count() {
    let tid = Uuid::new_v4();
    let ts = teams(&["A", "B"]);
    let scheduled = Match::new(tid, ts[0].id, ts[1].id, Phase::Groups);
    let mut cancelled = played(tid, &ts[0], &ts[1], 4, 0, 2);
    cancelled.cancel();
    let mut in_progress = Match::new(tid, ts[1].id, ts[0].id, Phase::Groups);
    in_progress.status = tournament_engine::MatchStatus::InProgress;
    in_progress.home_score = Some(1);
    in_progress.away_score = Some(0);

    let rows = compute_standings(&ts, &[scheduled, cancelled, in_progress], 0).unwrap();
    assert!(rows.iter().all(|r| r.played == 0 && r.points == 0));
}

#[test]
fn match_with_unknown_team_is_skipped() {
    let tid = Uuid::new_v4();
    let ts = teams(&["A", "B"]);
    let stranger = Team::new("Stranger");
    let matches = vec![
        played(tid, &ts[0], &stranger, 5, 0, 1),
        played(tid, &ts[1], &ts[0], 1, 0, 2),
    ];

    let rows = compute_standings(&ts, &matches, 0).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(row(&rows, &ts[0]).played, 1);
    assert_eq!(rows[0].team_id, ts[1].id);
}

#[test]
fn ties_break_on_wins_then_goal_difference_then_goals_for() {
    let tid = Uuid::new_v4();
    let ts = teams(&["Drawer", "Winner", "Filler", "Other"]);
    let (drawer, winner, filler, other) = (&ts[0], &ts[1], &ts[2], &ts[3]);
    // Drawer: 3 draws = 3 pts, 0 wins. Winner: 1 win, 2 losses = 3 pts, 1 win.
    let matches = vec![
        played(tid, drawer, filler, 0, 0, 1),
        played(tid, drawer, other, 1, 1, 2),
        played(tid, drawer, filler, 2, 2, 3),
        played(tid, winner, filler, 1, 0, 4),
        played(tid, winner, other, 0, 1, 5),
        played(tid, other, winner, 1, 0, 6),
    ];
    let rows = compute_standings(&ts, &matches, 0).unwrap();
    let pos = |t: &Team| rows.iter().position(|r| r.team_id == t.id).unwrap();
    assert_eq!(row(&rows, drawer).points, row(&rows, winner).points);
    assert!(pos(winner) < pos(drawer));

    // Same points and wins: goal difference decides.
    let ts = teams(&["Narrow", "Big", "X", "Y"]);
    let matches = vec![
        played(tid, &ts[0], &ts[2], 1, 0, 1),
        played(tid, &ts[1], &ts[3], 4, 0, 2),
    ];
    let rows = compute_standings(&ts, &matches, 0).unwrap();
    assert_eq!(rows[0].team_id, ts[1].id);
    assert_eq!(rows[1].team_id, ts[0].id);

    // Same points, wins and goal difference: goals for decides.
    let ts = teams(&["Low", "High", "X", "Y"]);
    let matches = vec![
        played(tid, &ts[0], &ts[2], 1, 0, 1),
        played(tid, &ts[1], &ts[3], 3, 2, 2),
    ];
    let rows = compute_standings(&ts, &matches, 0).unwrap();
    assert_eq!(rows[0].team_id, ts[1].id);
    assert_eq!(rows[1].team_id, ts[0].id);
}

#[test]
fn full_ties_keep_input_order() {
    let ts = teams(&["First", "Second", "Third"]);
    let rows = compute_standings(&ts, &[], 0).unwrap();
    assert_eq!(order(&rows), ts.iter().map(|t| t.id).collect::<Vec<_>>());
}

#[test]
fn recent_form_lists_last_five_newest_first() {
    let tid = Uuid::new_v4();
    let ts = teams(&["A", "B"]);
    let (a, b) = (&ts[0], &ts[1]);
    // Stored out of date order on purpose.
    let matches = vec![
        played(tid, a, b, 0, 1, 3), // L
        played(tid, a, b, 2, 0, 1), // W (oldest, falls off)
        played(tid, b, a, 1, 1, 6), // D (newest)
        played(tid, a, b, 3, 0, 2), // W
        played(tid, b, a, 2, 0, 5), // L
        played(tid, a, b, 1, 0, 4), // W
    ];

    let rows = compute_standings(&ts, &matches, 0).unwrap();
    let a_row = row(&rows, a);
    assert_eq!(a_row.played, 6);
    assert_eq!(
        a_row.recent_form,
        vec![
            MatchOutcome::Draw,
            MatchOutcome::Loss,
            MatchOutcome::Win,
            MatchOutcome::Loss,
            MatchOutcome::Win,
        ]
    );
    assert_eq!(a_row.form_string(), "DLWLW");
    assert_eq!(row(&rows, b).form_string(), "DWLWL");
}

#[test]
fn top_rows_are_flagged_qualified() {
    let tid = Uuid::new_v4();
    let ts = teams(&["A", "B", "C", "D"]);
    let matches = vec![
        played(tid, &ts[0], &ts[1], 1, 0, 1),
        played(tid, &ts[2], &ts[3], 1, 0, 2),
    ];

    let rows = compute_standings(&ts, &matches, 2).unwrap();
    let flags: Vec<bool> = rows.iter().map(|r| r.qualified).collect();
    assert_eq!(flags, vec![true, true, false, false]);

    let rows = compute_standings(&ts, &matches, 0).unwrap();
    assert!(rows.iter().all(|r| !r.qualified));
}

#[test]
fn standings_are_idempotent() {
    let tid = Uuid::new_v4();
    let ts = teams(&["A", "B", "C"]);
    let matches = vec![
        played(tid, &ts[0], &ts[1], 1, 1, 1),
        played(tid, &ts[1], &ts[2], 1, 1, 2),
        played(tid, &ts[2], &ts[0], 1, 1, 3),
    ];
    let first = compute_standings(&ts, &matches, 1).unwrap();
    let second = compute_standings(&ts, &matches, 1).unwrap();
    assert_eq!(first, second);
}

#[test]
fn csv_export_has_header_and_one_line_per_team() {
    let tid = Uuid::new_v4();
    let ts = teams(&["Lions", "Tigers"]);
    let rows = compute_standings(&ts, &[played(tid, &ts[0], &ts[1], 2, 1, 1)], 1).unwrap();

    let csv = standings_to_csv(&rows, &ts).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines[0],
        "rank,team,points,played,won,drawn,lost,goals_for,goals_against,goal_diff,form,qualified"
    );
    assert_eq!(lines[1], "1,Lions,3,1,1,0,0,2,1,1,W,true");
    assert_eq!(lines[2], "2,Tigers,0,1,0,0,1,1,2,-1,L,false");
    assert_eq!(lines.len(), 3);
}

#[test]
fn cache_recomputes_after_a_result_changes() {
    let tid = Uuid::new_v4();
    let ts = teams(&["A", "B"]);
    let mut matches = vec![played(tid, &ts[0], &ts[1], 1, 0, 1)];
    let mut cache = StandingsCache::new();

    let first = cache.get_or_compute(tid, Phase::Groups, &ts, &matches, 1).unwrap();
    assert_eq!(first[0].team_id, ts[0].id);
    assert_eq!(cache.len(), 1);

    matches.push(played(tid, &ts[1], &ts[0], 3, 0, 2));
    let second = cache.get_or_compute(tid, Phase::Groups, &ts, &matches, 1).unwrap();
    assert_eq!(second[0].team_id, ts[1].id);
    assert_eq!(second, compute_standings(&ts, &matches, 1).unwrap());

    cache.invalidate(tid);
    assert!(cache.is_empty());
}

#[test]
fn unscheduled_results_count_as_oldest_in_recent_form() {
    let tid = Uuid::new_v4();
    let ts = teams(&["A", "B"]);
    let (a, b) = (&ts[0], &ts[1]);
    let mut undated = Match::new(tid, a.id, b.id, Phase::Groups);
    undated.record_result(1, 1);
    let mut matches = vec![
        undated,
        played(tid, a, b, 1, 0, 2), // W
        played(tid, a, b, 0, 2, 3), // L
    ];

    let rows = compute_standings(&ts, &matches, 0).unwrap();
    assert_eq!(row(&rows, a).form_string(), "LWD");

    // Three more dated results push the undated draw out of the last five.
    matches.push(played(tid, b, a, 0, 1, 4)); // W
    matches.push(played(tid, a, b, 2, 2, 5)); // D
    matches.push(played(tid, a, b, 0, 1, 6)); // L
    let rows = compute_standings(&ts, &matches, 0).unwrap();
    let a_row = row(&rows, a);
    assert_eq!(a_row.played, 6);
    assert_eq!(a_row.form_string(), "LDWLW");
}

#[test]
fn huge_scores_saturate_goal_totals() {
    let tid = Uuid::new_v4();
    let ts = teams(&["A", "B"]);
    let matches = vec![
        played(tid, &ts[0], &ts[1], 3_000_000_000, 0, 1),
        played(tid, &ts[0], &ts[1], 3_000_000_000, 0, 2),
    ];

    let rows = compute_standings(&ts, &matches, 0).unwrap();
    let a = row(&rows, &ts[0]);
    assert_eq!((a.won, a.points), (2, 6));
    assert_eq!(a.goals_for, u32::MAX);
    assert_eq!(a.goal_diff, i64::from(u32::MAX));
    assert_eq!(row(&rows, &ts[1]).goals_against, u32::MAX);
}
