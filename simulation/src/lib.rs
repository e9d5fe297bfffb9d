#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Simulation facade that owns the world and drives every system once per tick.
//!
//! A step feeds the world's events through the systems in a fixed order:
//! spawns are resolved first, then ordinary enemies are re-planned, enemies
//! move, ready towers fire and finally projectiles land. Player input is
//! routed through the builder between steps and its consequences are visible
//! to the systems on the next step.

use std::time::Duration;

use portal_defence_core::{
    config::{ConfigError, SimulationConfig},
    CellCoord, Command, Event, PortalId, TowerTarget, WavePlan,
};
use portal_defence_system_builder::{Builder, PlayerAction, Selection};
use portal_defence_system_danger_field::DangerField;
use portal_defence_system_movement::Movement;
use portal_defence_system_path_planner::PathPlanner;
use portal_defence_system_spawning::{SpawnContext, Spawning};
use portal_defence_system_tower_combat::TowerCombat;
use portal_defence_system_tower_targeting::TowerTargeting;
use portal_defence_world::{self as world, query, World};
use tracing::{debug, trace};

/// Owns the authoritative world together with every per-tick system.
#[derive(Debug)]
pub struct Simulation {
    world: World,
    danger: DangerField,
    planner: PathPlanner,
    builder: Builder,
    spawning: Spawning,
    movement: Movement,
    targeting: TowerTargeting,
    combat: TowerCombat,
    targets: Vec<TowerTarget>,
    pending: Vec<Event>,
    events: Vec<Event>,
    danger_stale: bool,
}

impl Simulation {
    /// Builds a simulation whose wave schedule is generated from the configuration.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        let waves = portal_defence_system_wave_generation::generate(&config.waves);
        Self::with_waves(config, waves)
    }

    /// Builds a simulation with an explicit wave schedule.
    pub fn with_waves(config: SimulationConfig, waves: Vec<WavePlan>) -> Result<Self, ConfigError> {
        let seed = config.seed;
        let world = World::new(config, waves)?;
        let danger = DangerField::new(query::grid(&world).dimensions());

        Ok(Self {
            world,
            danger,
            planner: PathPlanner::default(),
            builder: Builder::new(),
            spawning: Spawning::new(seed),
            movement: Movement::default(),
            targeting: TowerTargeting::new(),
            combat: TowerCombat::new(),
            targets: Vec::new(),
            pending: Vec::new(),
            events: Vec::new(),
            danger_stale: false,
        })
    }

    /// Read-only access to the authoritative world for the `query` functions.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Danger field as of the most recent rebuild.
    #[must_use]
    pub fn danger(&self) -> &DangerField {
        &self.danger
    }

    /// What the player currently has selected.
    #[must_use]
    pub fn selection(&self) -> Selection {
        self.builder.selection()
    }

    /// Applies a command directly, bypassing the builder.
    ///
    /// Returns the events it produced; the systems observe them on the next step.
    pub fn submit(&mut self, command: Command) -> Vec<Event> {
        let mut produced = Vec::new();
        world::apply(&mut self.world, command, &mut produced);
        self.observe(&produced);
        produced
    }

    /// Translates player actions into world commands and applies them.
    pub fn act(&mut self, actions: &[PlayerAction]) -> Vec<Event> {
        let mut commands = Vec::new();
        let current = &self.world;
        self.builder.handle(
            &[],
            actions,
            |cell| query::tower_at(current, cell),
            &mut commands,
        );

        let mut produced = Vec::new();
        for command in commands {
            let mut batch = Vec::new();
            world::apply(&mut self.world, command, &mut batch);
            self.observe(&batch);
            produced.extend(batch);
        }
        produced
    }

    /// Advances the simulation by `dt` of real time and returns every event of the step.
    pub fn step(&mut self, dt: Duration) -> &[Event] {
        self.events.clear();
        self.events.append(&mut self.pending);
        self.run(Command::Tick { dt });

        if self.danger_stale || self.events.contains(&Event::ReplanDue) {
            self.rebuild_danger();
        }

        let mut commands = Vec::new();
        self.spawning.handle(
            &self.events,
            SpawnContext {
                grid: query::grid(&self.world),
                portals: query::portals(&self.world),
                danger: &self.danger,
                occupancy: query::occupancy_view(&self.world),
                danger_tuning: &query::config(&self.world).danger,
                scout_tuning: &query::config(&self.world).scouts,
            },
            &mut commands,
        );
        self.run_all(&mut commands);

        self.movement.handle(
            &self.events,
            &query::enemy_view(&self.world),
            query::grid(&self.world),
            &self.danger,
            query::occupancy_view(&self.world),
            &query::config(&self.world).danger,
            &mut commands,
        );
        self.run_all(&mut commands);

        self.run(Command::MoveEnemies);

        self.targeting.handle(
            &query::tower_view(&self.world),
            &query::enemy_view(&self.world),
            query::grid(&self.world),
            &mut self.targets,
        );
        self.combat.handle(
            query::game_state(&self.world),
            &query::tower_cooldowns(&self.world),
            &self.targets,
            &mut commands,
        );
        self.run_all(&mut commands);

        self.run(Command::ResolveProjectiles);

        self.builder.handle(&self.events, &[], |_| None, &mut commands);
        trace!(events = self.events.len(), "step complete");
        &self.events
    }

    /// Safest route from a portal to the goal under the current layout.
    ///
    /// Useful for previewing the path ordinary enemies will take.
    pub fn route_from(&mut self, portal: PortalId) -> Option<Vec<CellCoord>> {
        let start = query::portals(&self.world)
            .iter()
            .find(|candidate| candidate.id == portal)?
            .cell;
        if self.danger_stale {
            self.rebuild_danger();
        }

        let grid = query::grid(&self.world);
        let occupancy = query::occupancy_view(&self.world);
        self.planner.plan(
            grid.dimensions(),
            start,
            grid.goal(),
            &self.danger,
            &query::config(&self.world).danger,
            |cell| occupancy.is_blocked(cell),
        )
    }

    /// Records events produced between steps so the systems see them next step.
    fn observe(&mut self, produced: &[Event]) {
        self.builder.handle(produced, &[], |_| None, &mut Vec::new());
        if produced.contains(&Event::TowerLayoutChanged) {
            self.danger_stale = true;
        }
        self.pending.extend_from_slice(produced);
    }

    fn rebuild_danger(&mut self) {
        let towers = query::tower_view(&self.world);
        self.danger.rebuild(
            query::grid(&self.world),
            towers.iter(),
            &query::config(&self.world).danger,
        );
        self.danger_stale = false;
        debug!(towers = towers.len(), "danger field rebuilt");
    }

    fn run(&mut self, command: Command) {
        world::apply(&mut self.world, command, &mut self.events);
    }

    fn run_all(&mut self, commands: &mut Vec<Command>) {
        for command in commands.drain(..) {
            world::apply(&mut self.world, command, &mut self.events);
        }
    }
}
