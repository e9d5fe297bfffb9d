#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Portal Defence.
//!
//! The world owns towers, enemies, projectiles, the economy, the wave
//! scheduler and the game state machine. It is mutated exclusively through
//! [`apply`] and read through the [`query`] module.

mod enemies;
mod projectiles;
mod schedule;
mod towers;

use std::time::Duration;

use glam::Vec2;
use portal_defence_core::{
    config::{ConfigError, SimulationConfig},
    CellCoord, Command, EnemyId, EnemyKind, Event, GameState, Grid, GridDimensions,
    OccupancyView, PlacementError, PortalError, PortalId, PortalSnapshot, SellError, TowerId,
    TowerKind, TowerSnapshot, UpgradeAxis, UpgradeError, UpgradeLevels, WavePlan,
    SPLASH_DAMAGE_RATIO,
};
use portal_defence_system_placement::PlacementValidator;
use tracing::{debug, info, warn};

use enemies::{Enemy, EnemyRegistry};
use projectiles::{Flight, Payload, ProjectileRegistry};
use schedule::{ScheduledAction, Scheduler};
use towers::TowerRegistry;

/// Represents the authoritative Portal Defence world state.
#[derive(Debug)]
pub struct World {
    config: SimulationConfig,
    grid: Grid,
    portals: Vec<PortalSnapshot>,
    towers: TowerRegistry,
    occupancy: Vec<Option<TowerId>>,
    enemies: EnemyRegistry,
    projectiles: ProjectileRegistry,
    economy: Economy,
    state: GameState,
    waves: Vec<WavePlan>,
    wave: u32,
    scheduler: Scheduler,
    outstanding_spawns: u32,
    clock: Duration,
    last_scaled: Duration,
    since_replan: Duration,
    paused: bool,
    speed_index: usize,
    validator: PlacementValidator,
}

#[derive(Clone, Copy, Debug)]
struct Economy {
    money: u32,
    lives: u32,
    score: u64,
}

impl World {
    /// Creates a world from a validated configuration and a wave schedule.
    ///
    /// The first wave is scheduled to start automatically after the
    /// configured auto-wave delay.
    pub fn new(config: SimulationConfig, waves: Vec<WavePlan>) -> Result<Self, ConfigError> {
        config.validate()?;

        let dimensions = GridDimensions::new(config.grid.columns, config.grid.rows);
        let grid = Grid::new(dimensions, config.grid.cell_size, config.grid.goal);
        let portals = config
            .grid
            .portals
            .iter()
            .enumerate()
            .map(|(index, portal)| PortalSnapshot {
                id: PortalId::new(u32::try_from(index).unwrap_or(u32::MAX)),
                cell: portal.cell,
                active: portal.opens_at_wave == 0,
                opens_at_wave: portal.opens_at_wave,
            })
            .collect();

        let mut scheduler = Scheduler::default();
        if !waves.is_empty() {
            scheduler.schedule(config.timing.auto_wave_delay(), ScheduledAction::StartWave);
        }

        Ok(Self {
            economy: Economy {
                money: config.economy.starting_money,
                lives: config.economy.starting_lives,
                score: 0,
            },
            occupancy: vec![None; dimensions.cell_count()],
            validator: PlacementValidator::new(&grid),
            grid,
            portals,
            towers: TowerRegistry::new(),
            enemies: EnemyRegistry::new(),
            projectiles: ProjectileRegistry::new(),
            state: GameState::Idle,
            waves,
            wave: 0,
            scheduler,
            outstanding_spawns: 0,
            clock: Duration::ZERO,
            last_scaled: Duration::ZERO,
            since_replan: Duration::ZERO,
            paused: false,
            speed_index: 0,
            config,
        })
    }

    fn speed_multiplier(&self) -> u8 {
        self.config
            .timing
            .speeds
            .get(self.speed_index)
            .copied()
            .unwrap_or(1)
    }

    fn occupancy_view(&self) -> OccupancyView<'_> {
        OccupancyView::new(&self.occupancy, self.grid.dimensions())
    }

    fn set_occupant(&mut self, cell: CellCoord, occupant: Option<TowerId>) {
        if let Some(slot) = self
            .grid
            .dimensions()
            .index(cell)
            .and_then(|index| self.occupancy.get_mut(index))
        {
            *slot = occupant;
        }
    }

    fn advance_clock(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if self.paused || self.state.is_terminal() {
            self.last_scaled = Duration::ZERO;
            return;
        }

        let scaled = dt.saturating_mul(u32::from(self.speed_multiplier()));
        self.clock = self.clock.saturating_add(scaled);
        self.last_scaled = scaled;
        out_events.push(Event::TimeAdvanced { dt, scaled });

        self.since_replan = self.since_replan.saturating_add(dt);
        if self.since_replan >= self.config.timing.replan_interval() {
            self.since_replan = Duration::ZERO;
            out_events.push(Event::ReplanDue);
        }

        while let Some(action) = self.scheduler.pop_due(self.clock) {
            match action {
                ScheduledAction::Spawn { wave, kind } => {
                    self.outstanding_spawns = self.outstanding_spawns.saturating_sub(1);
                    out_events.push(Event::SpawnDue { wave, kind });
                }
                ScheduledAction::StartWave => self.start_wave(out_events),
            }
        }
    }

    fn start_wave(&mut self, out_events: &mut Vec<Event>) {
        if self.state != GameState::Idle {
            return;
        }
        let Some(plan) = usize::try_from(self.wave)
            .ok()
            .and_then(|index| self.waves.get(index))
        else {
            return;
        };

        let spawns: Vec<_> = plan.spawns().to_vec();
        let scouts = plan.scouts();
        let kinds = plan.groups().len();
        self.scheduler.cancel_wave_start();
        self.wave += 1;
        self.state = GameState::WaveInProgress;
        let wave = self.wave;

        let opening: Vec<PortalId> = self
            .portals
            .iter()
            .filter(|portal| !portal.active && portal.opens_at_wave == wave)
            .map(|portal| portal.id)
            .collect();
        for portal in opening {
            self.activate_portal(portal, out_events);
        }

        for spawn in &spawns {
            self.scheduler.schedule(
                self.clock.saturating_add(spawn.offset),
                ScheduledAction::Spawn {
                    wave,
                    kind: spawn.kind,
                },
            );
        }
        self.outstanding_spawns = self
            .outstanding_spawns
            .saturating_add(u32::try_from(spawns.len()).unwrap_or(u32::MAX));

        info!(wave, enemies = spawns.len(), scouts, kinds, "wave started");
        out_events.push(Event::WaveStarted { wave });
    }

    fn check_wave_progress(&mut self, out_events: &mut Vec<Event>) {
        if self.state != GameState::WaveInProgress
            || self.outstanding_spawns > 0
            || !self.enemies.is_empty()
        {
            return;
        }

        let wave = self.wave;
        info!(wave, "wave cleared");
        out_events.push(Event::WaveCleared { wave });

        if usize::try_from(wave).map_or(true, |cleared| cleared >= self.waves.len()) {
            self.state = GameState::Won;
            self.scheduler.clear();
            info!(score = self.economy.score, "all waves cleared");
            out_events.push(Event::GameWon);
            return;
        }

        self.state = GameState::Idle;
        let due = self
            .clock
            .saturating_add(self.config.timing.auto_wave_delay());
        self.scheduler.schedule(due, ScheduledAction::StartWave);
        out_events.push(Event::NextWaveScheduled {
            wave: wave + 1,
            due,
        });
    }

    fn activate_portal(&mut self, portal: PortalId, out_events: &mut Vec<Event>) {
        let Some(index) = self.portal_index(portal) else {
            out_events.push(Event::PortalActivationRejected {
                portal,
                reason: PortalError::MissingPortal,
            });
            return;
        };

        let snapshot = self.portals[index];
        let towers = self.towers.snapshots();
        let verdict = self.validator.validate_portal(
            &self.grid,
            &snapshot,
            &towers,
            OccupancyView::new(&self.occupancy, self.grid.dimensions()),
            &self.config.danger,
        );

        match verdict {
            Ok(()) => {
                self.portals[index].active = true;
                info!(portal = portal.get(), "portal activated");
                out_events.push(Event::PortalActivated { portal });
            }
            Err(reason) => {
                warn!(portal = portal.get(), %reason, "portal activation rejected");
                out_events.push(Event::PortalActivationRejected { portal, reason });
            }
        }
    }

    fn portal_index(&self, portal: PortalId) -> Option<usize> {
        self.portals.iter().position(|candidate| candidate.id == portal)
    }

    fn place_tower(
        &mut self,
        kind: TowerKind,
        cell: CellCoord,
        out_events: &mut Vec<Event>,
    ) -> Result<TowerId, PlacementError> {
        if self.state.is_terminal() {
            return Err(PlacementError::GameOver);
        }

        let candidate = TowerSnapshot {
            id: self.towers.peek_id(),
            kind,
            cell,
            levels: UpgradeLevels::new(),
            invested: kind.cost(),
        };
        let towers = self.towers.snapshots();
        self.validator.validate_tower(
            &self.grid,
            &candidate,
            &towers,
            OccupancyView::new(&self.occupancy, self.grid.dimensions()),
            &self.portals,
            &self.config.danger,
        )?;

        if self.economy.money < kind.cost() {
            return Err(PlacementError::InsufficientFunds);
        }

        self.economy.money -= kind.cost();
        let tower = self.towers.insert(kind, cell);
        self.set_occupant(cell, Some(tower));
        info!(tower = tower.get(), ?kind, ?cell, money = self.economy.money, "tower placed");
        out_events.push(Event::TowerPlaced { tower, kind, cell });
        out_events.push(Event::TowerLayoutChanged);
        Ok(tower)
    }

    fn sell_tower(&mut self, tower: TowerId, out_events: &mut Vec<Event>) -> Result<(), SellError> {
        if self.state.is_terminal() {
            return Err(SellError::GameOver);
        }
        let removed = self.towers.remove(tower).ok_or(SellError::MissingTower)?;

        let percent = u64::from(self.config.economy.sell_refund_percent);
        let refund = u32::try_from(u64::from(removed.invested) * percent / 100).unwrap_or(u32::MAX);
        self.economy.money = self.economy.money.saturating_add(refund);
        self.set_occupant(removed.cell, None);

        info!(tower = tower.get(), refund, "tower sold");
        out_events.push(Event::TowerSold {
            tower,
            cell: removed.cell,
            refund,
        });
        out_events.push(Event::TowerLayoutChanged);
        Ok(())
    }

    fn upgrade_tower(
        &mut self,
        tower: TowerId,
        axis: UpgradeAxis,
        out_events: &mut Vec<Event>,
    ) -> Result<(), UpgradeError> {
        if self.state.is_terminal() {
            return Err(UpgradeError::GameOver);
        }
        let money = self.economy.money;
        let state = self
            .towers
            .get_mut(tower)
            .ok_or(UpgradeError::MissingTower)?;
        if state.levels.is_maxed(axis) {
            return Err(UpgradeError::MaxLevel);
        }

        let cost = state.kind.upgrade_price(state.levels.level(axis));
        if money < cost {
            return Err(UpgradeError::InsufficientFunds);
        }
        let level = state.upgrade(axis, cost).ok_or(UpgradeError::MaxLevel)?;
        self.economy.money -= cost;

        info!(tower = tower.get(), ?axis, level, cost, "tower upgraded");
        out_events.push(Event::TowerUpgraded {
            tower,
            axis,
            level,
            cost,
        });
        out_events.push(Event::TowerLayoutChanged);
        Ok(())
    }

    fn spawn_enemy(
        &mut self,
        kind: EnemyKind,
        portal: PortalId,
        path: Vec<CellCoord>,
        out_events: &mut Vec<Event>,
    ) {
        if self.state.is_terminal() || self.portal_index(portal).is_none() {
            return;
        }
        let id = self.enemies.allocate_id();
        let Some(enemy) = Enemy::spawn(id, kind, portal, path, &self.grid) else {
            warn!(?kind, portal = portal.get(), "discarding spawn with an invalid path");
            return;
        };

        self.enemies.insert(enemy);
        out_events.push(Event::EnemySpawned {
            enemy: id,
            kind,
            portal,
        });
    }

    fn assign_path(&mut self, enemy: EnemyId, path: Vec<CellCoord>) {
        let dimensions = self.grid.dimensions();
        let Some(state) = self.enemies.get_mut(enemy) else {
            return;
        };
        if state.kind.is_scout() || path.len() < 2 {
            return;
        }
        if !path.iter().all(|cell| dimensions.contains(*cell)) {
            return;
        }
        state.assign_path(path);
    }

    fn fire_projectile(&mut self, tower: TowerId, target: EnemyId, out_events: &mut Vec<Event>) {
        if self.paused || self.state.is_terminal() {
            return;
        }
        let now = self.clock;
        let Some(state) = self.towers.get_mut(tower) else {
            return;
        };
        if state.ready_in(now) > Duration::ZERO {
            return;
        }
        let Some(enemy) = self.enemies.get(target) else {
            return;
        };

        let profile = state.kind.profile(state.levels);
        let origin = self.grid.cell_center(state.cell);
        if origin.distance(enemy.position) >= profile.range {
            return;
        }

        state.last_fired = Some(now);
        let kind = state.kind;
        let projectile = self.projectiles.launch(
            tower,
            kind,
            target,
            origin,
            profile.projectile_speed,
            Payload {
                damage: profile.damage,
                splash_radius: profile.splash_radius,
                slow: profile.slow,
            },
        );
        out_events.push(Event::ProjectileFired {
            projectile,
            tower,
            target,
        });
    }

    fn move_enemies(&mut self, out_events: &mut Vec<Event>) {
        if self.paused || self.state.is_terminal() {
            return;
        }

        let now = self.clock;
        let elapsed = self.last_scaled;
        let tower_centers: Vec<Vec2> = self
            .towers
            .iter()
            .map(|tower| self.grid.cell_center(tower.cell))
            .collect();

        let mut leaked = Vec::new();
        for enemy in self.enemies.iter_mut() {
            if !enemy.reached_end() {
                enemy.advance(&self.grid, tower_centers.iter().copied(), now, elapsed);
            }
            if enemy.reached_end() {
                leaked.push(enemy.id);
            }
        }

        for id in leaked {
            let _ = self.enemies.remove(id);
            self.economy.lives = self.economy.lives.saturating_sub(1);
            debug!(enemy = id.get(), lives = self.economy.lives, "enemy leaked");
            out_events.push(Event::EnemyLeaked {
                enemy: id,
                lives: self.economy.lives,
            });

            if self.economy.lives == 0 {
                self.lose(out_events);
                return;
            }
        }

        self.check_wave_progress(out_events);
    }

    fn lose(&mut self, out_events: &mut Vec<Event>) {
        self.state = GameState::Lost;
        self.scheduler.clear();
        self.outstanding_spawns = 0;
        self.projectiles.clear();
        info!(wave = self.wave, score = self.economy.score, "game lost");
        out_events.push(Event::GameLost);
    }

    fn resolve_projectiles(&mut self, out_events: &mut Vec<Event>) {
        if self.paused || self.state.is_terminal() {
            return;
        }

        let now = self.clock;
        let elapsed_ms = self.last_scaled.as_secs_f32() * 1_000.0;

        for id in self.projectiles.ids() {
            let Some(projectile) = self.projectiles.get_mut(id) else {
                continue;
            };
            let Some(target) = self.enemies.get(projectile.target) else {
                let _ = self.projectiles.remove(id);
                out_events.push(Event::ProjectileDiscarded { projectile: id });
                continue;
            };

            let impact_point = target.position;
            if projectile.fly_towards(impact_point, elapsed_ms) == Flight::InFlight {
                continue;
            }

            let target = projectile.target;
            let payload = projectile.payload;
            let _ = self.projectiles.remove(id);

            if let Some(radius) = payload.splash_radius {
                for enemy in self.enemies.iter_mut() {
                    if enemy.position.distance(impact_point) < radius {
                        enemy.health -= payload.damage * SPLASH_DAMAGE_RATIO;
                    }
                }
            }
            if let Some(enemy) = self.enemies.get_mut(target) {
                if let Some(slow) = payload.slow {
                    enemy.apply_slow(slow, now);
                }
                enemy.health -= payload.damage;
            }
            out_events.push(Event::ProjectileImpact {
                projectile: id,
                target,
            });
        }

        self.sweep_dead(out_events);
        self.check_wave_progress(out_events);
    }

    fn sweep_dead(&mut self, out_events: &mut Vec<Event>) {
        let dead: Vec<EnemyId> = self
            .enemies
            .iter()
            .filter(|enemy| enemy.is_dead())
            .map(|enemy| enemy.id)
            .collect();

        for id in dead {
            let Some(enemy) = self.enemies.remove(id) else {
                continue;
            };
            let reward = enemy.kind.stats().reward;
            self.economy.money = self.economy.money.saturating_add(reward);
            self.economy.score = self.economy.score.saturating_add(
                u64::from(reward) * u64::from(self.config.economy.score_per_reward),
            );
            debug!(enemy = id.get(), reward, "enemy killed");
            out_events.push(Event::EnemyKilled { enemy: id, reward });
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => world.advance_clock(dt, out_events),
        Command::MoveEnemies => world.move_enemies(out_events),
        Command::ResolveProjectiles => world.resolve_projectiles(out_events),
        Command::PlaceTower { kind, cell } => {
            if let Err(reason) = world.place_tower(kind, cell, out_events) {
                debug!(?kind, ?cell, %reason, "tower placement rejected");
                out_events.push(Event::TowerPlacementRejected { kind, cell, reason });
            }
        }
        Command::SellTower { tower } => {
            if let Err(reason) = world.sell_tower(tower, out_events) {
                debug!(tower = tower.get(), %reason, "tower sale rejected");
                out_events.push(Event::TowerSaleRejected { tower, reason });
            }
        }
        Command::UpgradeTower { tower, axis } => {
            if let Err(reason) = world.upgrade_tower(tower, axis, out_events) {
                debug!(tower = tower.get(), ?axis, %reason, "tower upgrade rejected");
                out_events.push(Event::TowerUpgradeRejected {
                    tower,
                    axis,
                    reason,
                });
            }
        }
        Command::StartWave => {
            if world.state == GameState::Idle {
                world.start_wave(out_events);
            }
        }
        Command::TogglePause => {
            world.paused = !world.paused;
            out_events.push(Event::PauseChanged {
                paused: world.paused,
            });
        }
        Command::CycleSpeed => {
            let table = world.config.timing.speeds.len().max(1);
            world.speed_index = (world.speed_index + 1) % table;
            out_events.push(Event::SpeedChanged {
                multiplier: world.speed_multiplier(),
            });
        }
        Command::SetPortalActive { portal, active } => {
            let Some(index) = world.portal_index(portal) else {
                out_events.push(Event::PortalActivationRejected {
                    portal,
                    reason: PortalError::MissingPortal,
                });
                return;
            };
            match (world.portals[index].active, active) {
                (false, true) => world.activate_portal(portal, out_events),
                (true, false) => {
                    world.portals[index].active = false;
                    out_events.push(Event::PortalDeactivated { portal });
                }
                _ => {}
            }
        }
        Command::SpawnEnemy { kind, portal, path } => {
            world.spawn_enemy(kind, portal, path, out_events);
        }
        Command::AssignPath { enemy, path } => world.assign_path(enemy, path),
        Command::FireProjectile { tower, target } => {
            world.fire_projectile(tower, target, out_events);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::World;
    use portal_defence_core::{
        config::SimulationConfig, CellCoord, EnemyId, EnemyView, GameState, Grid, OccupancyView,
        PortalSnapshot, ProjectileView, TowerCooldownView, TowerId, TowerSnapshot, TowerView,
    };

    /// Provides read-only access to the grid geometry.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Configuration the world was built from.
    #[must_use]
    pub fn config(world: &World) -> &SimulationConfig {
        &world.config
    }

    /// Every portal in identifier order.
    #[must_use]
    pub fn portals(world: &World) -> &[PortalSnapshot] {
        &world.portals
    }

    /// Captures a read-only view of the towers on the grid.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        TowerView::from_snapshots(world.towers.snapshots())
    }

    /// Snapshot of a single tower.
    #[must_use]
    pub fn tower(world: &World, tower: TowerId) -> Option<TowerSnapshot> {
        world.towers.get(tower).map(|state| state.snapshot())
    }

    /// Tower occupying the provided cell, if any.
    #[must_use]
    pub fn tower_at(world: &World, cell: CellCoord) -> Option<TowerId> {
        world.occupancy_view().occupant(cell)
    }

    /// Remaining cooldown of every tower on the simulated clock.
    #[must_use]
    pub fn tower_cooldowns(world: &World) -> TowerCooldownView {
        TowerCooldownView::from_snapshots(
            world
                .towers
                .iter()
                .map(|tower| tower.cooldown(world.clock))
                .collect(),
        )
    }

    /// Captures a read-only view of the live enemies.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(
            world
                .enemies
                .iter()
                .map(|enemy| enemy.snapshot(world.clock))
                .collect(),
        )
    }

    /// Path currently assigned to an enemy.
    #[must_use]
    pub fn enemy_path(world: &World, enemy: EnemyId) -> Option<&[CellCoord]> {
        world.enemies.get(enemy).map(|state| state.path.as_slice())
    }

    /// Number of live enemies.
    #[must_use]
    pub fn enemy_count(world: &World) -> usize {
        world.enemies.len()
    }

    /// Captures a read-only view of projectiles in flight.
    #[must_use]
    pub fn projectile_view(world: &World) -> ProjectileView {
        ProjectileView::from_snapshots(
            world
                .projectiles
                .iter()
                .map(|projectile| projectile.snapshot())
                .collect(),
        )
    }

    /// Exposes a read-only view of the dense tower occupancy grid.
    #[must_use]
    pub fn occupancy_view(world: &World) -> OccupancyView<'_> {
        world.occupancy_view()
    }

    /// Money available to the player.
    #[must_use]
    pub fn money(world: &World) -> u32 {
        world.economy.money
    }

    /// Lives remaining.
    #[must_use]
    pub fn lives(world: &World) -> u32 {
        world.economy.lives
    }

    /// Accumulated score.
    #[must_use]
    pub fn score(world: &World) -> u64 {
        world.economy.score
    }

    /// One-based number of the most recently started wave; zero before the first.
    #[must_use]
    pub fn wave(world: &World) -> u32 {
        world.wave
    }

    /// Total number of waves in the schedule.
    #[must_use]
    pub fn wave_count(world: &World) -> usize {
        world.waves.len()
    }

    /// Spawns of the running wave that have not fallen due yet.
    #[must_use]
    pub fn outstanding_spawns(world: &World) -> u32 {
        world.outstanding_spawns
    }

    /// Simulated clock value at which the next wave starts automatically.
    #[must_use]
    pub fn next_wave_due(world: &World) -> Option<Duration> {
        world.scheduler.wave_start_due()
    }

    /// Logical state of the wave state machine.
    #[must_use]
    pub fn game_state(world: &World) -> GameState {
        world.state
    }

    /// Whether per-tick mutation is suspended.
    #[must_use]
    pub fn is_paused(world: &World) -> bool {
        world.paused
    }

    /// Current game speed multiplier.
    #[must_use]
    pub fn speed_multiplier(world: &World) -> u8 {
        world.speed_multiplier()
    }

    /// Simulated clock value.
    #[must_use]
    pub fn clock(world: &World) -> Duration {
        world.clock
    }
}
