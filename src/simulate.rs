use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::SimConfig;
use crate::error::EngineError;
use crate::league::{LeagueSettings, Matchup, Team, TeamId};
use crate::standings::{StandingKey, compare_keys};
use crate::what_if::LockedResults;
use crate::win_prob::{WinProbModel, rating};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OddsResult {
    pub team_id: TeamId,
    pub clinch_pct: f64,
    /// Index 0 is the 1 seed.
    pub seed_pct: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OddsReport {
    pub odds: Vec<OddsResult>,
    pub trials_requested: u32,
    /// Percentages are computed against this, not `trials_requested`.
    pub trials_completed: u32,
    pub cancelled: bool,
}

/// Shared stop signal for a running simulation.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrialRecord {
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
}

/// Trial-local win/loss/tie counters, parallel to the plan's team slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialSnapshot {
    records: Vec<TrialRecord>,
}

impl TrialSnapshot {
    pub fn of(teams: &[Team]) -> Self {
        Self {
            records: teams
                .iter()
                .map(|t| TrialRecord {
                    wins: t.wins,
                    losses: t.losses,
                    ties: t.ties,
                })
                .collect(),
        }
    }

    pub fn records(&self) -> &[TrialRecord] {
        &self.records
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Fate {
    Locked { home_wins: bool },
    Sampled { p_home: f64 },
}

#[derive(Debug, Clone, Copy)]
struct ScheduledGame {
    home: usize,
    away: usize,
    fate: Fate,
}

/// The unplayed part of the schedule resolved against one set of teams:
/// each game is either locked or carries its home win probability.
///
/// Ratings are taken once from the incoming records, so a game's probability
/// does not depend on which simulated games happen to be played before it.
#[derive(Debug, Clone)]
pub struct TrialPlan<'a> {
    teams: &'a [Team],
    games: Vec<ScheduledGame>,
    skipped: usize,
}

impl<'a> TrialPlan<'a> {
    pub fn new(
        teams: &'a [Team],
        matchups: &[Matchup],
        locked: &LockedResults,
        model: &WinProbModel,
    ) -> Self {
        let index: HashMap<TeamId, usize> =
            teams.iter().enumerate().map(|(i, t)| (t.id, i)).collect();
        let ratings: Vec<f64> = teams.iter().map(rating).collect();

        let mut games = Vec::new();
        let mut skipped = 0usize;
        for m in matchups.iter().filter(|m| m.is_unplayed()) {
            let (Some(&home), Some(&away)) = (index.get(&m.home_id), index.get(&m.away_id)) else {
                skipped += 1;
                continue;
            };
            if home == away {
                skipped += 1;
                continue;
            }
            let fate = match locked.winner(&m.id) {
                Some(w) if w == m.home_id => Fate::Locked { home_wins: true },
                Some(w) if w == m.away_id => Fate::Locked { home_wins: false },
                _ => Fate::Sampled {
                    p_home: model.prob_from_ratings(ratings[home], ratings[away]),
                },
            };
            games.push(ScheduledGame { home, away, fate });
        }

        if skipped > 0 {
            debug!(skipped, "unplayed matchups reference unknown teams; ignoring them");
        }
        Self {
            teams,
            games,
            skipped,
        }
    }

    /// Unplayed games the plan will decide each trial.
    pub fn remaining_games(&self) -> usize {
        self.games.len()
    }

    pub fn skipped_games(&self) -> usize {
        self.skipped
    }

    /// True when no remaining game needs a random draw.
    pub fn is_deterministic(&self) -> bool {
        self.games
            .iter()
            .all(|g| matches!(g.fate, Fate::Locked { .. }))
    }

    pub fn snapshot(&self) -> TrialSnapshot {
        TrialSnapshot::of(self.teams)
    }

    /// Decides every remaining game on `snapshot`. Simulated games never tie
    /// and leave points for/against alone.
    pub fn play<R: Rng>(&self, snapshot: &mut TrialSnapshot, rng: &mut R) {
        for g in &self.games {
            let home_wins = match g.fate {
                Fate::Locked { home_wins } => home_wins,
                Fate::Sampled { p_home } => rng.gen_range(0.0..1.0) < p_home,
            };
            let (winner, loser) = if home_wins {
                (g.home, g.away)
            } else {
                (g.away, g.home)
            };
            snapshot.records[winner].wins += 1;
            snapshot.records[loser].losses += 1;
        }
    }

    /// Team indices, most favorable first.
    pub fn rank(&self, snapshot: &TrialSnapshot) -> Vec<usize> {
        let keys: Vec<StandingKey<'_>> = self
            .teams
            .iter()
            .zip(&snapshot.records)
            .map(|(t, r)| StandingKey::with_record(t, r.wins, r.losses, r.ties))
            .collect();
        let mut order: Vec<usize> = (0..self.teams.len()).collect();
        order.sort_by(|&a, &b| compare_keys(&keys[a], &keys[b]));
        order
    }

    pub fn run_trial<R: Rng>(&self, rng: &mut R) -> Vec<usize> {
        let mut snapshot = self.snapshot();
        self.play(&mut snapshot, rng);
        self.rank(&snapshot)
    }

    pub fn ranked_ids(&self, order: &[usize]) -> Vec<TeamId> {
        order.iter().map(|&i| self.teams[i].id).collect()
    }
}

#[derive(Debug, Clone)]
struct Tally {
    seeds: usize,
    clinch: Vec<u64>,
    // team-major: seed_counts[team * seeds + rank]
    seed_counts: Vec<u64>,
    completed: u64,
}

impl Tally {
    fn new(teams: usize, seeds: usize) -> Self {
        Self {
            seeds,
            clinch: vec![0; teams],
            seed_counts: vec![0; teams * seeds],
            completed: 0,
        }
    }

    fn record(&mut self, order: &[usize], weight: u64) {
        for (rank, &team) in order.iter().take(self.seeds).enumerate() {
            self.clinch[team] += weight;
            self.seed_counts[team * self.seeds + rank] += weight;
        }
        self.completed += weight;
    }

    fn merge(mut self, other: Tally) -> Tally {
        for (a, b) in self.clinch.iter_mut().zip(other.clinch) {
            *a += b;
        }
        for (a, b) in self.seed_counts.iter_mut().zip(other.seed_counts) {
            *a += b;
        }
        self.completed += other.completed;
        self
    }

    fn into_odds(self, teams: &[Team]) -> Vec<OddsResult> {
        teams
            .iter()
            .enumerate()
            .map(|(i, t)| OddsResult {
                team_id: t.id,
                clinch_pct: pct(self.clinch[i], self.completed),
                seed_pct: self.seed_counts[i * self.seeds..(i + 1) * self.seeds]
                    .iter()
                    .map(|&n| pct(n, self.completed))
                    .collect(),
            })
            .collect()
    }
}

/// `100 * count / trials`, one decimal.
fn pct(count: u64, trials: u64) -> f64 {
    if trials == 0 {
        return 0.0;
    }
    let raw = 100.0 * count as f64 / trials as f64;
    (raw * 10.0).round() / 10.0
}

pub fn validate(teams: &[Team], settings: &LeagueSettings, trials: u32) -> Result<(), EngineError> {
    if trials == 0 {
        return Err(EngineError::NoTrials);
    }
    if settings.playoff_seeds == 0 {
        return Err(EngineError::NoPlayoffSeeds);
    }
    if settings.playoff_seeds > teams.len() {
        return Err(EngineError::SeedsExceedTeams {
            seeds: settings.playoff_seeds,
            teams: teams.len(),
        });
    }
    let mut seen = HashSet::with_capacity(teams.len());
    for t in teams {
        if !seen.insert(t.id) {
            return Err(EngineError::DuplicateTeam { id: t.id });
        }
    }
    Ok(())
}

/// Trials handed to a worker at a time; the stop signal is also checked
/// before each trial inside a chunk.
const TRIAL_CHUNK: u64 = 1024;

/// Runs playoff-odds simulations.
///
/// Every trial gets its own ChaCha stream keyed by the base seed and the trial
/// index, so a fixed seed gives the same report on any number of threads.
#[derive(Debug, Clone, Default)]
pub struct Simulator {
    model: WinProbModel,
    seed: Option<u64>,
    parallelism: Option<usize>,
    cancel: Option<CancelFlag>,
    timeout: Option<Duration>,
}

impl Simulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(cfg: &SimConfig) -> Self {
        Self {
            model: cfg.model(),
            seed: cfg.seed,
            parallelism: cfg.parallelism,
            cancel: None,
            timeout: cfg.timeout,
        }
    }

    pub fn with_model(mut self, model: WinProbModel) -> Self {
        self.model = model;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_parallelism(mut self, threads: usize) -> Self {
        self.parallelism = Some(threads.max(1));
        self
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn run(
        &self,
        teams: &[Team],
        matchups: &[Matchup],
        settings: &LeagueSettings,
        trials: u32,
        locked: &LockedResults,
    ) -> Result<OddsReport, EngineError> {
        validate(teams, settings, trials)?;
        if !self.model.is_valid() {
            return Err(EngineError::InvalidSteepness {
                steepness: self.model.steepness,
            });
        }

        let seeds = settings.playoff_seeds;
        let plan = TrialPlan::new(teams, matchups, locked, &self.model);

        if plan.is_deterministic() {
            // Every trial would come out the same; play it once.
            let order = plan.run_trial(&mut ChaCha8Rng::seed_from_u64(0));
            let mut tally = Tally::new(teams.len(), seeds);
            tally.record(&order, u64::from(trials));
            debug!(
                locked = plan.remaining_games(),
                trials, "no games left to sample; single deterministic trial"
            );
            return Ok(OddsReport {
                odds: tally.into_odds(teams),
                trials_requested: trials,
                trials_completed: trials,
                cancelled: false,
            });
        }

        let base_seed = self.seed.unwrap_or_else(rand::random);
        let deadline = self.timeout.map(|t| Instant::now() + t);
        let should_stop = || {
            self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled)
                || deadline.is_some_and(|d| Instant::now() >= d)
        };

        let started = Instant::now();
        let pool = build_sim_pool(self.parallelism);
        let total = u64::from(trials);
        let chunks = total.div_ceil(TRIAL_CHUNK);
        let tally = with_sim_pool(&pool, || {
            (0..chunks)
                .into_par_iter()
                .map(|chunk| {
                    if should_stop() {
                        return None;
                    }
                    let mut tally = Tally::new(teams.len(), seeds);
                    let end = ((chunk + 1) * TRIAL_CHUNK).min(total);
                    for trial in chunk * TRIAL_CHUNK..end {
                        if should_stop() {
                            break;
                        }
                        let mut rng = ChaCha8Rng::seed_from_u64(base_seed);
                        rng.set_stream(trial);
                        let order = plan.run_trial(&mut rng);
                        tally.record(&order, 1);
                    }
                    Some(tally)
                })
                .while_some()
                .reduce(|| Tally::new(teams.len(), seeds), Tally::merge)
        });

        let completed = u32::try_from(tally.completed).unwrap_or(trials);
        let cancelled = completed < trials;
        if cancelled {
            warn!(
                requested = trials,
                completed, "simulation stopped early; odds use completed trials only"
            );
        }
        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            trials = completed,
            games = plan.remaining_games(),
            elapsed_ms,
            "playoff odds simulated"
        );

        Ok(OddsReport {
            odds: tally.into_odds(teams),
            trials_requested: trials,
            trials_completed: completed,
            cancelled,
        })
    }
}

/// One-shot odds with default model and entropy seed.
pub fn simulate_odds(
    teams: &[Team],
    matchups: &[Matchup],
    settings: &LeagueSettings,
    trials: u32,
    locked: &LockedResults,
) -> Result<Vec<OddsResult>, EngineError> {
    Ok(Simulator::new()
        .run(teams, matchups, settings, trials, locked)?
        .odds)
}

fn build_sim_pool(threads: Option<usize>) -> Option<rayon::ThreadPool> {
    let threads = threads?;
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .ok()
}

fn with_sim_pool<T>(pool: &Option<rayon::ThreadPool>, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    if let Some(pool) = pool.as_ref() {
        pool.install(action)
    } else {
        action()
    }
}
