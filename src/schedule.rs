use std::collections::BTreeSet;

use crate::league::Matchup;

/// The week after the latest one with a completed game, or the earliest
/// scheduled week when nothing has been played yet.
pub fn current_week(matchups: &[Matchup]) -> Option<u32> {
    let last_played = matchups
        .iter()
        .filter(|m| m.is_complete())
        .map(|m| m.week)
        .max();
    match last_played {
        Some(week) => Some(week + 1),
        None => matchups.iter().map(|m| m.week).min(),
    }
}

/// Weeks from the current week on that still have unplayed games, ascending.
pub fn open_weeks(matchups: &[Matchup]) -> Vec<u32> {
    let Some(current) = current_week(matchups) else {
        return Vec::new();
    };
    matchups
        .iter()
        .filter(|m| m.week >= current && m.is_unplayed())
        .map(|m| m.week)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn open_games(matchups: &[Matchup], week: u32) -> Vec<&Matchup> {
    matchups
        .iter()
        .filter(|m| m.week == week && m.is_unplayed())
        .collect()
}
