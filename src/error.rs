use thiserror::Error;

use crate::league::TeamId;

/// Rejected simulation requests. Every variant is a caller bug or bad input,
/// never a transient failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("trial count must be at least 1")]
    NoTrials,

    #[error("playoff seeds must be at least 1")]
    NoPlayoffSeeds,

    #[error("playoff seeds ({seeds}) exceed team count ({teams})")]
    SeedsExceedTeams { seeds: usize, teams: usize },

    #[error("win-probability steepness must be a positive finite number, got {steepness}")]
    InvalidSteepness { steepness: f64 },

    #[error("duplicate team id: {id}")]
    DuplicateTeam { id: TeamId },
}
