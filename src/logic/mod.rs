//! Tournament business logic: fixtures, standings, knockout bracket, phase control.

pub mod bracket;
pub mod fixtures;
pub mod phase;
pub mod standings;
pub mod walkover;

pub use bracket::{
    advance_phase, pairings_to_matches, participants_of_round, seed_from_standings,
    seed_from_standings_with_rng, winners_of_round, Pairing, PhaseAdvance, RoundWinners,
};
pub use fixtures::{
    generate_full_round_robin, generate_full_round_robin_with_rng, generate_session,
    generate_session_with_rng, played_pairs, SessionOutcome, SlotPlan,
};
pub use phase::PhaseController;
pub use standings::{compute_standings, standings_to_csv, StandingsCache};
pub use walkover::{validate_finalized, validate_match};
