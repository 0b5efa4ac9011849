//! Tournament engine: library with models, fixture/standings/bracket logic and the repository seam.

pub mod logic;
pub mod models;
pub mod repository;

pub use logic::{
    advance_phase, compute_standings, generate_full_round_robin, generate_full_round_robin_with_rng,
    generate_session, generate_session_with_rng, pairings_to_matches, participants_of_round,
    played_pairs, seed_from_standings, seed_from_standings_with_rng, standings_to_csv,
    validate_match, winners_of_round, Pairing, PhaseAdvance, PhaseController, RoundWinners,
    SessionOutcome, SlotPlan, StandingsCache,
};
pub use models::{
    Match, MatchId, MatchOutcome, MatchStatus, PairKey, Phase, SeedingMode, Side, StandingsRow,
    Team, TeamId, Tournament, TournamentError, TournamentId,
};
pub use repository::{InMemoryRepository, MatchRepository, RepositoryError};
