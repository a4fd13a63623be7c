use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use playoff_odds::error::EngineError;
use playoff_odds::league::{LeagueSettings, Matchup, Team};
use playoff_odds::schedule::open_weeks;
use playoff_odds::simulate::{CancelFlag, Simulator, simulate_odds};
use playoff_odds::snapshot::{LeagueSnapshot, parse_league_snapshot_json};
use playoff_odds::standings::compute_standings;
use playoff_odds::what_if::{LockedResults, Side, lock_picks, pick_all, what_if_standings};
use playoff_odds::win_prob::WinProbModel;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn league() -> LeagueSnapshot {
    parse_league_snapshot_json(&read_fixture("league_snapshot.json")).expect("fixture should parse")
}

fn open(id: &str, home: u32, away: u32) -> Matchup {
    Matchup {
        id: id.to_string(),
        week: 14,
        home_id: home,
        away_id: away,
        home_score: None,
        away_score: None,
    }
}

#[test]
fn locked_head_to_head_is_certain() {
    let teams = vec![Team::new(1, "A"), Team::new(2, "B")];
    let matchups = vec![open("final", 1, 2)];
    let mut locked = LockedResults::new();
    locked.insert("final", 1);

    let odds = simulate_odds(&teams, &matchups, &LeagueSettings::new(1, 14), 500, &locked)
        .expect("valid request");
    assert_eq!(odds[0].team_id, 1);
    assert_eq!(odds[0].clinch_pct, 100.0);
    assert_eq!(odds[0].seed_pct, vec![100.0]);
    assert_eq!(odds[1].clinch_pct, 0.0);
    assert_eq!(odds[1].seed_pct, vec![0.0]);
}

#[test]
fn fully_locked_season_matches_deterministic_table() {
    let snap = league();
    let mut picks = HashMap::new();
    for week in open_weeks(&snap.matchups) {
        picks.extend(pick_all(&snap.matchups, week, Side::Home));
    }
    let locked = lock_picks(&picks, &snap.matchups);
    assert_eq!(locked.len(), 6);

    let table = what_if_standings(&snap.teams, &snap.matchups, &snap.settings, &picks);
    for trials in [1, 37, 400] {
        let report = Simulator::new()
            .run(&snap.teams, &snap.matchups, &snap.settings, trials, &locked)
            .expect("valid request");
        assert_eq!(report.trials_completed, trials);
        for o in &report.odds {
            let seed = table.seeds.iter().position(|&id| id == o.team_id);
            let expected_clinch = if seed.is_some() { 100.0 } else { 0.0 };
            assert_eq!(o.clinch_pct, expected_clinch, "team {}", o.team_id);
            for (rank, &p) in o.seed_pct.iter().enumerate() {
                let expected = if seed == Some(rank) { 100.0 } else { 0.0 };
                assert_eq!(p, expected, "team {} seed {}", o.team_id, rank + 1);
            }
        }
    }
}

#[test]
fn finished_season_equals_current_table() {
    let snap = league();
    let finished: Vec<Matchup> = snap
        .matchups
        .iter()
        .filter(|m| m.is_complete())
        .cloned()
        .collect();
    let table = compute_standings(&snap.teams, &snap.settings);

    for trials in [1, 250, 9999] {
        let report = Simulator::new()
            .run(&snap.teams, &finished, &snap.settings, trials, &LockedResults::new())
            .expect("valid request");
        assert_eq!(report.trials_completed, trials);
        assert!(!report.cancelled);
        for o in &report.odds {
            let seed = table.seeds.iter().position(|&id| id == o.team_id);
            let expected_clinch = if seed.is_some() { 100.0 } else { 0.0 };
            assert_eq!(o.clinch_pct, expected_clinch, "team {}", o.team_id);
            for (rank, &p) in o.seed_pct.iter().enumerate() {
                let expected = if seed == Some(rank) { 100.0 } else { 0.0 };
                assert_eq!(p, expected, "team {} seed {}", o.team_id, rank + 1);
            }
        }
    }
}

#[test]
fn fixed_seed_is_reproducible_across_thread_counts() {
    let snap = league();
    let locked = snap.locked_results();
    let single = Simulator::new()
        .with_seed(2024)
        .with_parallelism(1)
        .run(&snap.teams, &snap.matchups, &snap.settings, 2000, &locked)
        .expect("valid request");
    let many = Simulator::new()
        .with_seed(2024)
        .with_parallelism(4)
        .run(&snap.teams, &snap.matchups, &snap.settings, 2000, &locked)
        .expect("valid request");
    assert_eq!(single, many);
}

#[test]
fn percentages_are_bounded_and_seeds_fill_once_per_trial() {
    let snap = league();
    let report = Simulator::new()
        .with_seed(7)
        .run(&snap.teams, &snap.matchups, &snap.settings, 3000, &LockedResults::new())
        .expect("valid request");
    let seeds = snap.settings.playoff_seeds;

    for o in &report.odds {
        assert!((0.0..=100.0).contains(&o.clinch_pct));
        assert_eq!(o.seed_pct.len(), seeds);
        let by_seed: f64 = o.seed_pct.iter().sum();
        // Rounding drift only.
        assert!((by_seed - o.clinch_pct).abs() <= 0.05 * (seeds + 1) as f64 + 1e-9);
    }
    let total: f64 = report.odds.iter().map(|o| o.clinch_pct).sum();
    assert!((total - 100.0 * seeds as f64).abs() <= 0.05 * report.odds.len() as f64 + 1e-9);
    for rank in 0..seeds {
        let column: f64 = report.odds.iter().map(|o| o.seed_pct[rank]).sum();
        assert!((column - 100.0).abs() <= 0.05 * report.odds.len() as f64 + 1e-9);
    }
}

#[test]
fn winless_team_with_locked_losses_is_eliminated() {
    let snap = league();
    // Team 5 is 0-3; lock its two remaining games as losses.
    let picks = HashMap::from([("w4-1".to_string(), 1), ("w5-3".to_string(), 3)]);
    let locked = lock_picks(&picks, &snap.matchups);
    let report = Simulator::new()
        .with_seed(11)
        .run(&snap.teams, &snap.matchups, &snap.settings, 1500, &locked)
        .expect("valid request");
    let rebels = report.odds.iter().find(|o| o.team_id == 5).expect("team 5 present");
    assert_eq!(rebels.clinch_pct, 0.0);
}

#[test]
fn dominant_rating_nearly_always_clinches() {
    let strong = Team {
        wins: 3,
        losses: 0,
        pf: 450.0,
        pa: 330.0,
        ..Team::new(1, "Strong")
    };
    let weak = Team {
        wins: 3,
        losses: 0,
        pf: 330.0,
        pa: 450.0,
        ..Team::new(2, "Weak")
    };
    let matchups = vec![open("a", 1, 2), open("b", 2, 1), open("c", 1, 2)];
    let report = Simulator::new()
        .with_seed(99)
        .run(&[strong, weak], &matchups, &LeagueSettings::new(1, 6), 1000, &LockedResults::new())
        .expect("valid request");
    assert!(report.odds[0].clinch_pct > 95.0);
}

#[test]
fn caller_teams_are_not_mutated() {
    let snap = league();
    let before = snap.teams.clone();
    let _ = Simulator::new()
        .with_seed(3)
        .run(&snap.teams, &snap.matchups, &snap.settings, 200, &LockedResults::new())
        .expect("valid request");
    assert_eq!(snap.teams, before);
}

#[test]
fn unknown_team_reference_is_ignored() {
    let teams = vec![Team::new(1, "A"), Team::new(2, "B")];
    let matchups = vec![open("ghost", 1, 404)];
    let odds = simulate_odds(&teams, &matchups, &LeagueSettings::new(1, 14), 50, &LockedResults::new())
        .expect("malformed matchup is not an error");
    // Nothing left to sample: A wins the name tie-break every trial.
    assert_eq!(odds[0].clinch_pct, 100.0);
    assert_eq!(odds[1].clinch_pct, 0.0);
}

#[test]
fn invalid_configuration_is_rejected() {
    let snap = league();
    let locked = LockedResults::new();
    assert_eq!(
        simulate_odds(&snap.teams, &snap.matchups, &snap.settings, 0, &locked),
        Err(EngineError::NoTrials)
    );
    let too_many = LeagueSettings::new(7, 5);
    assert_eq!(
        simulate_odds(&snap.teams, &snap.matchups, &too_many, 10, &locked),
        Err(EngineError::SeedsExceedTeams { seeds: 7, teams: 6 })
    );
    let none = LeagueSettings::new(0, 5);
    assert_eq!(
        simulate_odds(&snap.teams, &snap.matchups, &none, 10, &locked),
        Err(EngineError::NoPlayoffSeeds)
    );
}

#[test]
fn cancelled_run_reports_partial_trials() {
    let snap = league();
    let cancel = CancelFlag::new();
    cancel.cancel();
    let report = Simulator::new()
        .with_cancel(cancel)
        .run(&snap.teams, &snap.matchups, &snap.settings, 5000, &LockedResults::new())
        .expect("valid request");
    assert!(report.cancelled);
    assert_eq!(report.trials_requested, 5000);
    assert_eq!(report.trials_completed, 0);
    assert!(report.odds.iter().all(|o| o.clinch_pct == 0.0));
}

#[test]
fn expired_deadline_stops_before_first_trial() {
    let snap = league();
    let report = Simulator::new()
        .with_timeout(Duration::ZERO)
        .run(&snap.teams, &snap.matchups, &snap.settings, 1000, &LockedResults::new())
        .expect("valid request");
    assert!(report.cancelled);
    assert!(report.trials_completed < report.trials_requested);
}

#[test]
fn cancel_mid_run_divides_by_completed_trials() {
    let snap = league();
    let cancel = CancelFlag::new();
    let trigger = cancel.clone();
    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(30));
        trigger.cancel();
    });

    let report = Simulator::new()
        .with_seed(21)
        .with_cancel(cancel)
        .run(&snap.teams, &snap.matchups, &snap.settings, 200_000_000, &LockedResults::new())
        .expect("valid request");
    canceller.join().expect("canceller thread");

    assert!(report.cancelled);
    assert!(report.trials_completed > 0);
    assert!(report.trials_completed < report.trials_requested);

    // Each completed trial fills every seed once, so shares add up to full
    // seeds only when divided by the completed count.
    let seeds = snap.settings.playoff_seeds;
    let total: f64 = report.odds.iter().map(|o| o.clinch_pct).sum();
    assert!((total - 100.0 * seeds as f64).abs() <= 0.05 * report.odds.len() as f64 + 1e-9);
}

#[test]
fn timeout_returns_promptly_on_huge_runs() {
    let snap = league();
    let started = Instant::now();
    let report = Simulator::new()
        .with_seed(8)
        .with_timeout(Duration::from_millis(50))
        .run(&snap.teams, &snap.matchups, &snap.settings, u32::MAX, &LockedResults::new())
        .expect("valid request");
    let elapsed = started.elapsed();

    assert!(report.cancelled);
    assert!(report.trials_completed > 0);
    assert!(elapsed < Duration::from_secs(2), "took {elapsed:?}");
}

#[test]
fn degenerate_model_is_rejected() {
    let snap = league();
    for k in [0.0, -8.0, f64::NAN] {
        let err = Simulator::new()
            .with_model(WinProbModel::new(k))
            .run(&snap.teams, &snap.matchups, &snap.settings, 10, &LockedResults::new())
            .expect_err("bad steepness must be rejected");
        assert!(matches!(err, EngineError::InvalidSteepness { .. }));
    }

    let flat = Simulator::new()
        .with_model(WinProbModel::new(40.0))
        .with_seed(1)
        .run(&snap.teams, &snap.matchups, &snap.settings, 10, &LockedResults::new())
        .expect("positive steepness is fine");
    assert_eq!(flat.trials_completed, 10);
}
