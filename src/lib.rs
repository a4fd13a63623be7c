pub mod config;
pub mod error;
pub mod league;
pub mod records;
pub mod schedule;
pub mod simulate;
pub mod snapshot;
pub mod standings;
pub mod what_if;
pub mod win_prob;

pub use error::EngineError;
pub use league::{LeagueSettings, Matchup, MatchupId, Team, TeamId, Tiebreaker};
pub use simulate::{OddsReport, OddsResult, Simulator, simulate_odds};
pub use standings::{Standings, compute_standings};
pub use what_if::LockedResults;
