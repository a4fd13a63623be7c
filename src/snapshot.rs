use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::league::{LeagueSettings, Matchup, MatchupId, Team, TeamId};
use crate::records::ensure_records;
use crate::what_if::{LockedResults, lock_picks};

/// A materialized league: what the surrounding service hands the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueSnapshot {
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub matchups: Vec<Matchup>,
    #[serde(default)]
    pub settings: LeagueSettings,
    /// Raw picks as submitted; validated by `locked_results`.
    #[serde(default)]
    pub locked_results: HashMap<MatchupId, TeamId>,
}

impl LeagueSnapshot {
    pub fn locked_results(&self) -> LockedResults {
        lock_picks(&self.locked_results, &self.matchups)
    }
}

/// Parses a snapshot and back-fills team records from the schedule when the
/// source left them empty.
pub fn parse_league_snapshot_json(raw: &str) -> Result<LeagueSnapshot> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(LeagueSnapshot::default());
    }
    let mut snap: LeagueSnapshot =
        serde_json::from_str(trimmed).context("invalid league snapshot json")?;
    snap.teams = ensure_records(std::mem::take(&mut snap.teams), &snap.matchups);
    Ok(snap)
}

pub fn load_league_snapshot(path: &Path) -> Result<LeagueSnapshot> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read league snapshot {}", path.display()))?;
    parse_league_snapshot_json(&raw)
}
