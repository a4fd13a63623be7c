use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use playoff_odds::config::SimConfig;
use playoff_odds::simulate::Simulator;
use playoff_odds::snapshot::load_league_snapshot;
use playoff_odds::standings::{compute_standings, win_pct};

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("tests/fixtures/league_snapshot.json"));

    let mut cfg = SimConfig::from_env();
    if let Some(raw) = std::env::args().nth(2) {
        cfg.trials = raw
            .parse()
            .with_context(|| format!("trial count must be an integer, got {raw:?}"))?;
    }

    // One snapshot in, standings and odds out. No network; meant for quick
    // manual checks of the model against a saved league.
    let snap = load_league_snapshot(&path)?;
    let locked = snap.locked_results();
    let table = compute_standings(&snap.teams, &snap.settings);
    let report = Simulator::from_config(&cfg)
        .run(&snap.teams, &snap.matchups, &snap.settings, cfg.trials, &locked)
        .context("invalid simulation request")?;

    let odds: HashMap<_, _> = report.odds.iter().map(|o| (o.team_id, o)).collect();

    println!(
        "{:<4} {:<28} {:>8} {:>6} {:>9} {:>9} {:>8}",
        "#", "Team", "W-L-T", "Pct", "PF", "PA", "Playoff"
    );
    for (rank, t) in table.sorted.iter().enumerate() {
        let clinch = odds.get(&t.id).map(|o| o.clinch_pct).unwrap_or(0.0);
        println!(
            "{:<4} {:<28} {:>8} {:>6.3} {:>9.1} {:>9.1} {:>7.1}%",
            rank + 1,
            t.name,
            format!("{}-{}-{}", t.wins, t.losses, t.ties),
            win_pct(t.wins, t.losses, t.ties),
            t.pf,
            t.pa,
            clinch,
        );
    }
    println!();
    println!(
        "Trials: {}/{}{}",
        report.trials_completed,
        report.trials_requested,
        if report.cancelled { " (stopped early)" } else { "" }
    );
    println!("Locked picks: {}", locked.len());
    let names: HashMap<_, _> = snap.teams.iter().map(|t| (t.id, t.name.as_str())).collect();
    for (matchup_id, winner) in locked.iter() {
        let name = names.get(&winner).copied().unwrap_or("?");
        println!("  {matchup_id}: {name}");
    }

    Ok(())
}
