//! Data structures for the tournament engine: teams, matches, standings, tournament phase.

mod game;
mod standings;
mod team;
mod tournament;

pub use game::{Match, MatchId, MatchStatus, PairKey, Side, WALKOVER_GOALS};
pub use standings::{MatchOutcome, StandingsRow, RECENT_FORM_LEN};
pub use team::{Team, TeamId};
pub use tournament::{Phase, SeedingMode, Tournament, TournamentError, TournamentId};
