use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use kepler_sim::io::csv;
use kepler_sim::physics::{AU, DAY};
use kepler_sim::{ScenarioConfig, Simulation};

const BUNDLED_SCENARIO: &str = include_str!("../scenarios/sol.toml");

#[derive(Parser)]
#[command(name = "kepler-sim")]
#[command(about = "Patched two-body simulation of a star system")]
struct Cli {
    /// Scenario TOML file (defaults to the bundled solar system)
    #[arg(short, long)]
    scenario: Option<PathBuf>,

    /// Number of ticks to run
    #[arg(short = 'n', long, default_value_t = 24 * 365)]
    steps: u64,

    /// Tick length in seconds, overriding the scenario's engine.time_step
    #[arg(long)]
    dt: Option<u64>,

    /// Write body states to this CSV file
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Write a CSV sample every this many ticks
    #[arg(long, default_value_t = 24)]
    every: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let scenario = match &cli.scenario {
        Some(path) => ScenarioConfig::from_file(path)
            .with_context(|| format!("loading scenario {}", path.display()))?,
        None => {
            ScenarioConfig::from_toml_str(BUNDLED_SCENARIO).context("parsing bundled scenario")?
        }
    };
    let mut sim = Simulation::from_scenario(&scenario)?;
    if let Some(dt) = cli.dt {
        warn!(dt, scenario_dt = sim.time_step(), "overriding time step");
        sim.set_time_step(dt)?;
    }

    // -----------------------------------------------------------------------
    // Bodies at t = 0
    // -----------------------------------------------------------------------
    println!();
    println!("====================================================================");
    println!("  KEPLER SIMULATION — {} bodies", sim.system().len());
    println!("====================================================================");
    println!();
    println!(
        "  {:<26} {:<12} {:<10} {:>10} {:>8} {:>8} {:>10}",
        "body", "type", "parent", "a (AU)", "e", "i (deg)", "P (days)"
    );
    println!("  {}", "─".repeat(90));
    for kb in sim.system().bodies() {
        let parent = kb
            .parent()
            .and_then(|p| sim.system().body(p).ok())
            .map_or("-", |p| p.name());
        match kb.orbit() {
            Some(orbit) => {
                let el = orbit.elements();
                println!(
                    "  {:<26} {:<12} {:<10} {:>10.5} {:>8.5} {:>8.3} {:>10.2}{}",
                    kb.display_name(),
                    kb.body_type().to_string(),
                    parent,
                    el.sma / AU,
                    el.ecc,
                    el.inc.to_degrees(),
                    orbit.period() / DAY as f64,
                    if kb.is_perturbator() { "  *" } else { "" },
                );
            }
            None => println!(
                "  {:<26} {:<12} {:<10}",
                kb.display_name(),
                kb.body_type().to_string(),
                parent
            ),
        }
    }
    println!("  (* perturbs its parent)");
    println!();

    // -----------------------------------------------------------------------
    // Run
    // -----------------------------------------------------------------------
    let mut out = match &cli.csv {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
            let mut w = BufWriter::new(file);
            csv::write_header(&mut w)?;
            csv::write_states(&mut w, 0, sim.system().bodies())?;
            Some(w)
        }
        None => None,
    };
    let every = cli.every.max(1);

    let start: Vec<_> = sim
        .system()
        .bodies()
        .map(|kb| (kb.name().to_string(), *kb.body().position()))
        .collect();

    sim.start();
    for i in 1..=cli.steps {
        sim.tick()?;
        if let Some(w) = out.as_mut() {
            if i % every == 0 || i == cli.steps {
                csv::write_states(w, sim.elapsed(), sim.system().bodies())?;
            }
        }
    }
    sim.pause();
    if let Some(w) = out.as_mut() {
        w.flush()?;
    }

    // -----------------------------------------------------------------------
    // Summary
    // -----------------------------------------------------------------------
    println!(
        "  After {:.2} days ({} ticks of {} s)",
        sim.elapsed() as f64 / DAY as f64,
        sim.ticks(),
        sim.time_step()
    );
    println!("  {}", "─".repeat(79));
    println!(
        "  {:<26} {:>12} {:>12} {:>12} {:>12}",
        "body", "x (AU)", "y (AU)", "moved (AU)", "v (km/s)"
    );
    for (name, p0) in &start {
        let kb = sim.system().body(name)?;
        let p = kb.body().position();
        println!(
            "  {:<26} {:>12.6} {:>12.6} {:>12.6} {:>12.3}",
            kb.display_name(),
            p.x / AU,
            p.y / AU,
            (p - p0).norm() / AU,
            kb.body().speed() / 1000.0
        );
    }
    if let Some(path) = &cli.csv {
        println!();
        println!("  States written to {}", path.display());
    }
    println!("====================================================================");
    println!();
    Ok(())
}
