#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Portal Defence game to completion.

mod layout_transfer;

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use clap::Parser;
use portal_defence_core::{config::SimulationConfig, Event, GameState, UpgradeAxis};
use portal_defence_simulation::Simulation;
use portal_defence_system_builder::PlayerAction;
use portal_defence_world::query;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::layout_transfer::{LayoutTower, TowerLayout};

#[derive(Debug, Parser)]
#[command(name = "portal-defence", about = "Runs a headless Portal Defence game")]
struct CliArgs {
    /// TOML file overriding parts of the default configuration.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Tower layout string to build before the first wave.
    #[arg(long, value_name = "LAYOUT")]
    layout: Option<String>,
    /// Adds the cost of the imported layout to the starting money.
    #[arg(long, requires = "layout")]
    grant_funds: bool,
    /// Overrides the configured random seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Real milliseconds simulated per step.
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,
    /// Steps after which an unfinished game is abandoned.
    #[arg(long, default_value_t = 500_000)]
    max_steps: u64,
    /// Game speed multiplier to run at.
    #[arg(long, default_value_t = 1)]
    speed: u8,
    /// Starts the first wave without waiting for the countdown.
    #[arg(long)]
    start_now: bool,
    /// Prints the final tower layout as a single-line string.
    #[arg(long)]
    export_layout: bool,
}

fn main() -> Result<()> {
    init_logging();
    let args = CliArgs::parse();

    let mut config = load_config(args.config.as_ref())?;
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let layout = args
        .layout
        .as_deref()
        .map(TowerLayout::decode)
        .transpose()
        .context("failed to read tower layout")?;
    if let (Some(layout), true) = (&layout, args.grant_funds) {
        config.economy.starting_money = config
            .economy
            .starting_money
            .saturating_add(layout.total_cost());
    }

    let mut simulation = Simulation::new(config).context("invalid configuration")?;
    if let Some(layout) = &layout {
        build_layout(&mut simulation, layout)?;
    }
    select_speed(&mut simulation, args.speed)?;
    if args.start_now {
        let _ = simulation.act(&[PlayerAction::StartWave]);
    }

    let frame = Duration::from_millis(args.frame_ms.max(1));
    let outcome = run(&mut simulation, frame, args.max_steps);

    let world = simulation.world();
    println!(
        "{outcome:?} after wave {}/{}: lives {}, money {}, score {}",
        query::wave(world),
        query::wave_count(world),
        query::lives(world),
        query::money(world),
        query::score(world),
    );

    if args.export_layout {
        let dimensions = query::grid(world).dimensions();
        let towers = query::tower_view(world);
        let exported = TowerLayout::capture(dimensions.columns(), dimensions.rows(), towers.iter());
        println!("{}", exported.encode()?);
    }
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn load_config(path: Option<&PathBuf>) -> Result<SimulationConfig> {
    let Some(path) = path else {
        return Ok(SimulationConfig::default());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration {}", path.display()))?;
    let config = toml::from_str(&contents)
        .with_context(|| format!("failed to parse configuration {}", path.display()))?;
    info!(path = %path.display(), "configuration loaded");
    Ok(config)
}

/// Places every tower of the layout through the builder, then buys its upgrades.
fn build_layout(simulation: &mut Simulation, layout: &TowerLayout) -> Result<()> {
    let dimensions = query::grid(simulation.world()).dimensions();
    if dimensions.columns() != layout.columns || dimensions.rows() != layout.rows {
        bail!(
            "layout is for a {}x{} grid but the configured grid is {}x{}",
            layout.columns,
            layout.rows,
            dimensions.columns(),
            dimensions.rows()
        );
    }

    for tower in &layout.towers {
        build_tower(simulation, tower)?;
    }
    info!(
        towers = layout.towers.len(),
        money = query::money(simulation.world()),
        "layout built"
    );
    Ok(())
}

fn build_tower(simulation: &mut Simulation, tower: &LayoutTower) -> Result<()> {
    let placed = simulation.act(&[
        PlayerAction::SelectKind(tower.kind),
        PlayerAction::ClickCell(tower.cell),
    ]);
    for event in &placed {
        if let Event::TowerPlacementRejected { reason, .. } = event {
            bail!("cannot place {:?} at {:?}: {reason}", tower.kind, tower.cell);
        }
    }

    // A second click selects the tower that now occupies the cell.
    let _ = simulation.act(&[PlayerAction::ClickCell(tower.cell)]);
    let mut upgrades = Vec::new();
    for axis in UpgradeAxis::ALL {
        for _ in 1..tower.levels.level(axis) {
            upgrades.push(PlayerAction::UpgradeSelected(axis));
        }
    }
    for event in simulation.act(&upgrades) {
        if let Event::TowerUpgradeRejected { axis, reason, .. } = event {
            bail!("cannot upgrade {axis:?} of tower at {:?}: {reason}", tower.cell);
        }
    }
    let _ = simulation.act(&[PlayerAction::ClearSelection]);
    debug!(kind = ?tower.kind, cell = ?tower.cell, "tower built");
    Ok(())
}

fn select_speed(simulation: &mut Simulation, speed: u8) -> Result<()> {
    let options = query::config(simulation.world()).timing.speeds.len();
    for _ in 0..options {
        if query::speed_multiplier(simulation.world()) == speed {
            return Ok(());
        }
        let _ = simulation.act(&[PlayerAction::CycleSpeed]);
    }
    bail!("speed {speed} is not one of the configured speeds")
}

fn run(simulation: &mut Simulation, frame: Duration, max_steps: u64) -> GameState {
    for _ in 0..max_steps {
        let events = simulation.step(frame).to_vec();
        for event in &events {
            match event {
                Event::WaveCleared { wave } => {
                    let world = simulation.world();
                    info!(
                        wave,
                        lives = query::lives(world),
                        money = query::money(world),
                        "wave cleared"
                    );
                }
                Event::EnemyLeaked { lives, .. } => debug!(lives, "enemy leaked"),
                Event::GameWon => info!("all waves cleared"),
                Event::GameLost => info!("no lives left"),
                _ => {}
            }
        }

        let state = query::game_state(simulation.world());
        if state.is_terminal() {
            return state;
        }
    }
    warn!(max_steps, "step limit reached before the game ended");
    query::game_state(simulation.world())
}
