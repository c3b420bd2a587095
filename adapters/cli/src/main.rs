#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line driver that runs a drover scenario headlessly.

mod terrain;

use std::{collections::BTreeMap, fs, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use drover_core::{Command as SimCommand, Event, PlayerId};
use drover_system_bootstrap::Scenario;
use drover_system_grounding::GroundSampler;
use drover_system_motion::Motion;
use drover_system_spawning::Spawning;
use drover_world::{self as world, query, World};

use crate::terrain::HeightField;

/// Runs a scenario for a fixed number of ticks and prints a summary.
#[derive(Debug, Parser)]
#[command(name = "drover", about = "Headless agent spawn-and-movement driver")]
struct Args {
    /// Path to the TOML scenario file.
    scenario: PathBuf,
    /// Number of fixed-step ticks to simulate.
    #[arg(long, default_value_t = 600)]
    ticks: u32,
    /// Seconds of simulated time per tick.
    #[arg(long, default_value_t = 0.05)]
    dt: f32,
}

/// Entry point for the drover command-line driver.
fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    anyhow::ensure!(args.dt > 0.0, "tick duration must be positive");

    let text = fs::read_to_string(&args.scenario)
        .with_context(|| format!("reading scenario {}", args.scenario.display()))?;
    let scenario: Scenario = toml::from_str(&text)
        .with_context(|| format!("parsing scenario {}", args.scenario.display()))?;
    scenario.validate().context("scenario failed validation")?;

    let report = run(&scenario, args.ticks, Duration::from_secs_f32(args.dt));
    print_report(&scenario, &report);
    Ok(())
}

/// Aggregated outcome of one headless run.
struct RunReport {
    world: World,
    spawned: u32,
    despawned: u32,
    rejected: u32,
    deliveries: BTreeMap<PlayerId, u32>,
}

fn run(scenario: &Scenario, ticks: u32, dt: Duration) -> RunReport {
    let mut world = World::new();
    let mut events = Vec::new();
    for command in scenario.commands() {
        world::apply(&mut world, command, &mut events);
    }

    let sampler = GroundSampler::new(HeightField::from_scenario(&scenario.terrain));
    let mut spawning = Spawning::new();
    let mut motion = Motion::new();

    let mut report = RunReport {
        world: World::new(),
        spawned: 0,
        despawned: 0,
        rejected: 0,
        deliveries: BTreeMap::new(),
    };

    for _ in 0..ticks {
        let mut events = Vec::new();
        world::apply(&mut world, SimCommand::Tick { dt }, &mut events);

        let categories = query::category_view(&world);
        let mut commands = Vec::new();
        spawning.handle(&events, &categories, &mut commands);
        for command in commands {
            world::apply(&mut world, command, &mut events);
        }

        let agents = query::agent_view(&world);
        let categories = query::category_view(&world);
        let mut commands = Vec::new();
        motion.handle(&events, &agents, &categories, &sampler, &mut commands);
        for command in commands {
            world::apply(&mut world, command, &mut events);
        }

        tally(scenario, &events, &mut report);
    }

    report.world = world;
    report
}

fn tally(scenario: &Scenario, events: &[Event], report: &mut RunReport) {
    for event in events {
        match event {
            Event::AgentSpawned { agent, category, position, .. } => {
                report.spawned += 1;
                log::info!(
                    "spawned agent {} for {} at ({:.2}, {:.2}, {:.2})",
                    agent.get(),
                    category_label(scenario, *category),
                    position.x,
                    position.y,
                    position.z
                );
            }
            Event::AgentDespawned { agent, category, cause } => {
                report.despawned += 1;
                log::info!(
                    "despawned agent {} from {} ({cause:?})",
                    agent.get(),
                    category_label(scenario, *category)
                );
            }
            Event::SpawnRejected { category, reason } => {
                report.rejected += 1;
                log::warn!(
                    "spawn rejected for {}: {reason:?}",
                    category_label(scenario, *category)
                );
            }
            Event::CargoDelivered { owner, amount, .. } => {
                *report.deliveries.entry(*owner).or_insert(0) += amount;
                log::info!("player {} received {amount} cargo", owner.get());
            }
            _ => {}
        }
    }
}

fn category_label(scenario: &Scenario, category: drover_core::CategoryId) -> String {
    scenario
        .category_name(category)
        .map(str::to_owned)
        .unwrap_or_else(|| format!("category {}", category.get()))
}

fn print_report(scenario: &Scenario, report: &RunReport) {
    println!("spawned:   {}", report.spawned);
    println!("despawned: {}", report.despawned);
    println!("rejected:  {}", report.rejected);

    let pool = query::pool_stats(&report.world);
    println!("pool:      {} slots, {} free", pool.slots, pool.free);

    for category in query::category_view(&report.world).iter() {
        println!(
            "active:    {} = {}",
            category_label(scenario, category.id),
            category.active
        );
    }

    if report.deliveries.is_empty() {
        println!("deliveries: none");
    } else {
        for (owner, amount) in &report.deliveries {
            println!("deliveries: player {} = {amount}", owner.get());
        }
    }
}
