#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Portal Defence engine.
//!
//! This crate defines the message surface that connects the simulation
//! facade, the authoritative world, and pure systems. Callers submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems to react to. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

pub mod catalog;
pub mod config;

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use catalog::{
    EnemyKind, EnemyStats, SlowEffect, TowerKind, TowerProfile, TowerStats, UpgradeAxis,
    UpgradeLevels, MAX_UPGRADE_LEVEL, MIN_UPGRADE_LEVEL, SPLASH_DAMAGE_RATIO,
};

/// Logical state of the wave state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameState {
    /// No wave is running; the next one is pending.
    Idle,
    /// A wave is spawning or still has live enemies.
    WaveInProgress,
    /// Every wave was cleared. Terminal.
    Won,
    /// Lives reached zero. Terminal.
    Lost,
}

impl GameState {
    /// Reports whether the state accepts no further mutation.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances clocks and fires due scheduled events.
    Tick {
        /// Real time elapsed since the previous tick.
        dt: Duration,
    },
    /// Moves every enemy along its path using the scaled time of the last tick.
    MoveEnemies,
    /// Advances projectiles, resolves impacts and removes dead enemies.
    ResolveProjectiles,
    /// Requests placement of a tower.
    PlaceTower {
        /// Type of tower to construct.
        kind: TowerKind,
        /// Cell the tower should occupy.
        cell: CellCoord,
    },
    /// Requests the sale of a tower.
    SellTower {
        /// Tower to sell.
        tower: TowerId,
    },
    /// Requests an upgrade on one axis of a tower.
    UpgradeTower {
        /// Tower to upgrade.
        tower: TowerId,
        /// Axis to raise.
        axis: UpgradeAxis,
    },
    /// Starts the next wave immediately when none is running.
    StartWave,
    /// Flips the paused flag.
    TogglePause,
    /// Advances to the next entry of the speed table.
    CycleSpeed,
    /// Activates or deactivates a portal.
    SetPortalActive {
        /// Portal to change.
        portal: PortalId,
        /// Requested activity.
        active: bool,
    },
    /// Creates an enemy that follows the provided path.
    SpawnEnemy {
        /// Kind of enemy to create.
        kind: EnemyKind,
        /// Portal the enemy emerges from.
        portal: PortalId,
        /// Cells to walk, starting with the spawn cell.
        path: Vec<CellCoord>,
    },
    /// Replaces an enemy's path and resets its waypoint index.
    AssignPath {
        /// Enemy receiving the path.
        enemy: EnemyId,
        /// Cells to walk, starting with the enemy's current cell.
        path: Vec<CellCoord>,
    },
    /// Fires a projectile from a tower at an enemy.
    FireProjectile {
        /// Firing tower.
        tower: TowerId,
        /// Targeted enemy.
        target: EnemyId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// The simulation clock advanced.
    TimeAdvanced {
        /// Real time that elapsed.
        dt: Duration,
        /// Simulated time that elapsed after applying the speed multiplier.
        scaled: Duration,
    },
    /// The re-plan throttle elapsed; danger and paths should be refreshed.
    ReplanDue,
    /// A tower was placed, sold or upgraded.
    TowerLayoutChanged,
    /// A tower was placed.
    TowerPlaced {
        /// Identifier assigned to the tower.
        tower: TowerId,
        /// Kind of the tower.
        kind: TowerKind,
        /// Cell the tower occupies.
        cell: CellCoord,
    },
    /// A placement request was rejected.
    TowerPlacementRejected {
        /// Requested kind.
        kind: TowerKind,
        /// Requested cell.
        cell: CellCoord,
        /// Why the request failed.
        reason: PlacementError,
    },
    /// A tower was sold.
    TowerSold {
        /// Tower that was removed.
        tower: TowerId,
        /// Cell it occupied.
        cell: CellCoord,
        /// Money returned to the player.
        refund: u32,
    },
    /// A sale request was rejected.
    TowerSaleRejected {
        /// Targeted tower.
        tower: TowerId,
        /// Why the request failed.
        reason: SellError,
    },
    /// A tower axis was upgraded.
    TowerUpgraded {
        /// Upgraded tower.
        tower: TowerId,
        /// Raised axis.
        axis: UpgradeAxis,
        /// Level reached.
        level: u8,
        /// Money spent.
        cost: u32,
    },
    /// An upgrade request was rejected.
    TowerUpgradeRejected {
        /// Targeted tower.
        tower: TowerId,
        /// Requested axis.
        axis: UpgradeAxis,
        /// Why the request failed.
        reason: UpgradeError,
    },
    /// A wave started.
    WaveStarted {
        /// One-based wave number.
        wave: u32,
    },
    /// Every enemy of a wave was spawned and resolved.
    WaveCleared {
        /// One-based wave number.
        wave: u32,
    },
    /// The next wave will start automatically at the given simulated time.
    NextWaveScheduled {
        /// One-based number of the upcoming wave.
        wave: u32,
        /// Simulated clock value at which it starts.
        due: Duration,
    },
    /// A scheduled spawn fell due and needs a portal and a path.
    SpawnDue {
        /// Wave the spawn belongs to.
        wave: u32,
        /// Kind of enemy to spawn.
        kind: EnemyKind,
    },
    /// An enemy entered the grid.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Kind of the enemy.
        kind: EnemyKind,
        /// Portal it came from.
        portal: PortalId,
    },
    /// An enemy reached the end of its path and cost a life.
    EnemyLeaked {
        /// Enemy that leaked.
        enemy: EnemyId,
        /// Lives remaining afterwards.
        lives: u32,
    },
    /// An enemy died.
    EnemyKilled {
        /// Enemy that died.
        enemy: EnemyId,
        /// Money granted.
        reward: u32,
    },
    /// A tower fired.
    ProjectileFired {
        /// New projectile.
        projectile: ProjectileId,
        /// Firing tower.
        tower: TowerId,
        /// Targeted enemy.
        target: EnemyId,
    },
    /// A projectile reached its target.
    ProjectileImpact {
        /// Resolved projectile.
        projectile: ProjectileId,
        /// Enemy that was hit.
        target: EnemyId,
    },
    /// A projectile lost its target and was discarded.
    ProjectileDiscarded {
        /// Discarded projectile.
        projectile: ProjectileId,
    },
    /// A portal became active.
    PortalActivated {
        /// Activated portal.
        portal: PortalId,
    },
    /// A portal became inactive.
    PortalDeactivated {
        /// Deactivated portal.
        portal: PortalId,
    },
    /// A portal activation request was rejected.
    PortalActivationRejected {
        /// Targeted portal.
        portal: PortalId,
        /// Why the request failed.
        reason: PortalError,
    },
    /// The paused flag changed.
    PauseChanged {
        /// New value of the flag.
        paused: bool,
    },
    /// The speed multiplier changed.
    SpeedChanged {
        /// New multiplier.
        multiplier: u8,
    },
    /// All waves were cleared.
    GameWon,
    /// Lives reached zero.
    GameLost,
}

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(u32);

        impl $name {
            /// Creates a new identifier with the provided numeric value.
            #[must_use]
            pub const fn new(value: u32) -> Self {
                Self(value)
            }

            /// Retrieves the numeric representation of the identifier.
            #[must_use]
            pub const fn get(&self) -> u32 {
                self.0
            }
        }
    };
}

identifier!(
    /// Unique identifier assigned to a tower.
    TowerId
);
identifier!(
    /// Unique identifier assigned to an enemy.
    EnemyId
);
identifier!(
    /// Unique identifier assigned to a projectile.
    ProjectileId
);
identifier!(
    /// Identifier of a portal; equal to its position in the configuration list.
    PortalId
);

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Computes the Chebyshev distance, the step count of an unobstructed 8-connected walk.
    #[must_use]
    pub fn chebyshev_distance(self, other: CellCoord) -> u32 {
        self.column()
            .abs_diff(other.column())
            .max(self.row().abs_diff(other.row()))
    }

    /// Reports whether two distinct cells touch horizontally, vertically or diagonally.
    #[must_use]
    pub fn is_adjacent(self, other: CellCoord) -> bool {
        self != other && self.chebyshev_distance(other) == 1
    }
}

/// Immutable dimensions of the cell grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridDimensions {
    columns: u32,
    rows: u32,
}

impl GridDimensions {
    /// Creates dimensions from column and row counts.
    #[must_use]
    pub const fn new(columns: u32, rows: u32) -> Self {
        Self { columns, rows }
    }

    /// Number of columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Total number of cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        let count = u64::from(self.columns) * u64::from(self.rows);
        usize::try_from(count).unwrap_or(0)
    }

    /// Reports whether the cell lies within the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Row-major index of the cell, or `None` when it lies outside the grid.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }

    /// Cell stored at the provided row-major index.
    #[must_use]
    pub fn cell_at(&self, index: usize) -> Option<CellCoord> {
        if index >= self.cell_count() {
            return None;
        }
        let width = usize::try_from(self.columns).ok()?;
        let column = u32::try_from(index % width).ok()?;
        let row = u32::try_from(index / width).ok()?;
        Some(CellCoord::new(column, row))
    }

    /// In-bounds 8-connected neighbors in the order N, E, S, W, NE, SE, SW, NW.
    #[must_use]
    pub fn neighbors(&self, cell: CellCoord) -> NeighborIter {
        const OFFSETS: [(i64, i64); 8] = [
            (0, -1),
            (1, 0),
            (0, 1),
            (-1, 0),
            (1, -1),
            (1, 1),
            (-1, 1),
            (-1, -1),
        ];

        let mut neighbors = NeighborIter::default();
        for (dx, dy) in OFFSETS {
            let column = i64::from(cell.column()) + dx;
            let row = i64::from(cell.row()) + dy;
            if column < 0 || row < 0 {
                continue;
            }
            let (Ok(column), Ok(row)) = (u32::try_from(column), u32::try_from(row)) else {
                continue;
            };
            let candidate = CellCoord::new(column, row);
            if self.contains(candidate) {
                neighbors.push(Neighbor {
                    cell: candidate,
                    diagonal: dx != 0 && dy != 0,
                });
            }
        }
        neighbors
    }
}

/// Adjacent cell produced by [`GridDimensions::neighbors`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Neighbor {
    /// Adjacent cell.
    pub cell: CellCoord,
    /// Whether the move to the cell is diagonal.
    pub diagonal: bool,
}

/// Fixed-capacity iterator over up to eight neighbors.
#[derive(Clone, Debug, Default)]
pub struct NeighborIter {
    buffer: [Option<Neighbor>; 8],
    len: usize,
    cursor: usize,
}

impl NeighborIter {
    fn push(&mut self, neighbor: Neighbor) {
        if self.len < self.buffer.len() {
            self.buffer[self.len] = Some(neighbor);
            self.len += 1;
        }
    }
}

impl Iterator for NeighborIter {
    type Item = Neighbor;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.len {
            return None;
        }

        let value = self.buffer[self.cursor];
        self.cursor += 1;
        value
    }
}

/// Fixed grid geometry: dimensions, pixel scale and goal cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Grid {
    dimensions: GridDimensions,
    cell_size: f32,
    goal: CellCoord,
}

impl Grid {
    /// Creates a new grid description.
    #[must_use]
    pub const fn new(dimensions: GridDimensions, cell_size: f32, goal: CellCoord) -> Self {
        Self {
            dimensions,
            cell_size,
            goal,
        }
    }

    /// Dimensions of the grid.
    #[must_use]
    pub const fn dimensions(&self) -> GridDimensions {
        self.dimensions
    }

    /// Side length of a cell in pixels.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Cell enemies try to reach.
    #[must_use]
    pub const fn goal(&self) -> CellCoord {
        self.goal
    }

    /// Pixel position of the center of a cell.
    #[must_use]
    pub fn cell_center(&self, cell: CellCoord) -> Vec2 {
        Vec2::new(
            (cell.column() as f32 + 0.5) * self.cell_size,
            (cell.row() as f32 + 0.5) * self.cell_size,
        )
    }

    /// Cell containing the pixel position, clamped into the grid.
    #[must_use]
    pub fn cell_containing(&self, point: Vec2) -> CellCoord {
        let clamp = |value: f32, count: u32| -> u32 {
            let max = count.saturating_sub(1);
            if value.is_nan() || value <= 0.0 {
                return 0;
            }
            let index = (value / self.cell_size).floor();
            if index >= max as f32 {
                max
            } else {
                index as u32
            }
        };

        CellCoord::new(
            clamp(point.x, self.dimensions.columns()),
            clamp(point.y, self.dimensions.rows()),
        )
    }
}

/// Immutable representation of a tower used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Kind of tower that was constructed.
    pub kind: TowerKind,
    /// Cell occupied by the tower.
    pub cell: CellCoord,
    /// Upgrade counters.
    pub levels: UpgradeLevels,
    /// Money spent on construction and upgrades.
    pub invested: u32,
}

impl TowerSnapshot {
    /// Effective combat profile of the tower.
    #[must_use]
    pub fn profile(&self) -> TowerProfile {
        self.kind.profile(self.levels)
    }
}

/// Read-only snapshot describing all towers on the grid.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Number of towers captured.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no tower was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Immutable representation of an enemy used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Kind of the enemy.
    pub kind: EnemyKind,
    /// Pixel position.
    pub position: Vec2,
    /// Cell containing the position.
    pub cell: CellCoord,
    /// Remaining health.
    pub health: f32,
    /// Starting health.
    pub max_health: f32,
    /// Current slow multiplier, `1.0` when unaffected.
    pub speed_multiplier: f32,
    /// Index of the next waypoint in the enemy's path.
    pub waypoint: usize,
    /// Portal the enemy spawned from.
    pub portal: PortalId,
}

/// Read-only snapshot describing all enemies on the grid.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Number of enemies captured.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no enemy was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Immutable representation of a projectile in flight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Unique identifier of the projectile.
    pub id: ProjectileId,
    /// Tower that fired it.
    pub tower: TowerId,
    /// Kind of the firing tower.
    pub kind: TowerKind,
    /// Targeted enemy.
    pub target: EnemyId,
    /// Pixel position.
    pub position: Vec2,
}

/// Read-only snapshot describing all projectiles in flight.
#[derive(Clone, Debug, Default)]
pub struct ProjectileView {
    snapshots: Vec<ProjectileSnapshot>,
}

impl ProjectileView {
    /// Creates a new projectile view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<ProjectileSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured projectiles in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &ProjectileSnapshot> {
        self.snapshots.iter()
    }

    /// Number of projectiles captured.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no projectile was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Immutable representation of a portal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PortalSnapshot {
    /// Identifier of the portal.
    pub id: PortalId,
    /// Cell the portal occupies.
    pub cell: CellCoord,
    /// Whether enemies currently spawn from it.
    pub active: bool,
    /// Wave number whose start opens the portal.
    pub opens_at_wave: u32,
}

/// Remaining cooldown of a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TowerCooldownSnapshot {
    /// Tower the cooldown belongs to.
    pub tower: TowerId,
    /// Kind of the tower.
    pub kind: TowerKind,
    /// Simulated time until the tower may fire again.
    pub ready_in: Duration,
}

/// Read-only snapshot of every tower cooldown, sorted by tower identifier.
#[derive(Clone, Debug, Default)]
pub struct TowerCooldownView {
    snapshots: Vec<TowerCooldownSnapshot>,
}

impl TowerCooldownView {
    /// Creates a new cooldown view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerCooldownSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.tower);
        Self { snapshots }
    }

    /// Iterator over cooldowns in tower identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerCooldownSnapshot> {
        self.snapshots.iter()
    }
}

/// Target chosen for a tower by the targeting system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerTarget {
    /// Tower that should fire.
    pub tower: TowerId,
    /// Enemy it should fire at.
    pub enemy: EnemyId,
    /// Distance in pixels between the two at selection time.
    pub distance: f32,
}

/// Read-only view into the dense tower occupancy grid.
#[derive(Clone, Copy, Debug)]
pub struct OccupancyView<'a> {
    cells: &'a [Option<TowerId>],
    dimensions: GridDimensions,
}

impl<'a> OccupancyView<'a> {
    /// Captures a new occupancy view backed by the provided cell slice.
    #[must_use]
    pub fn new(cells: &'a [Option<TowerId>], dimensions: GridDimensions) -> Self {
        Self { cells, dimensions }
    }

    /// Returns the tower occupying the provided cell, if any.
    #[must_use]
    pub fn occupant(&self, cell: CellCoord) -> Option<TowerId> {
        self.dimensions
            .index(cell)
            .and_then(|index| self.cells.get(index).copied().flatten())
    }

    /// Reports whether the cell is blocked for movement. Out-of-bounds cells are blocked.
    #[must_use]
    pub fn is_blocked(&self, cell: CellCoord) -> bool {
        match self.dimensions.index(cell) {
            Some(index) => self.cells.get(index).copied().flatten().is_some(),
            None => true,
        }
    }

    /// Provides the dimensions of the underlying grid.
    #[must_use]
    pub const fn dimensions(&self) -> GridDimensions {
        self.dimensions
    }
}

/// Spawn scheduled relative to the start of its wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedSpawn {
    /// Kind of enemy to spawn.
    pub kind: EnemyKind,
    /// Offset from the wave start on the simulated clock.
    pub offset: Duration,
}

/// Enemy kind and count pair within a wave definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyGroup {
    /// Kind of enemy.
    pub kind: EnemyKind,
    /// Number of enemies of this kind.
    pub count: u32,
}

/// Complete plan for a single wave: its composition and spawn timeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WavePlan {
    groups: Vec<EnemyGroup>,
    scouts: u32,
    spawns: Vec<PlannedSpawn>,
}

impl WavePlan {
    /// Creates a wave plan. Spawns are sorted by offset.
    #[must_use]
    pub fn new(groups: Vec<EnemyGroup>, scouts: u32, mut spawns: Vec<PlannedSpawn>) -> Self {
        spawns.sort_by_key(|spawn| spawn.offset);
        Self {
            groups,
            scouts,
            spawns,
        }
    }

    /// Ordinary enemy groups in the wave.
    #[must_use]
    pub fn groups(&self) -> &[EnemyGroup] {
        &self.groups
    }

    /// Number of scouts in the wave.
    #[must_use]
    pub const fn scouts(&self) -> u32 {
        self.scouts
    }

    /// Spawn timeline ordered by offset.
    #[must_use]
    pub fn spawns(&self) -> &[PlannedSpawn] {
        &self.spawns
    }
}

/// Reasons a tower placement request may be rejected.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// The game already ended.
    #[error("the game is over")]
    GameOver,
    /// The requested cell lies outside the grid.
    #[error("cell lies outside the grid")]
    OutOfBounds,
    /// The requested cell is the goal or a portal.
    #[error("cell is reserved for the goal or a portal")]
    ReservedCell,
    /// The requested cell already holds a tower.
    #[error("cell already holds a tower")]
    Occupied,
    /// The player cannot afford the tower.
    #[error("not enough money")]
    InsufficientFunds,
    /// The tower would leave an active portal without any path to the goal.
    #[error("placement would cut portal {portal:?} off from the goal")]
    BlocksPortal {
        /// First portal found to be cut off.
        portal: PortalId,
    },
}

/// Reasons an upgrade request may be rejected.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeError {
    /// The game already ended.
    #[error("the game is over")]
    GameOver,
    /// No tower with the provided identifier exists.
    #[error("no such tower")]
    MissingTower,
    /// The axis is already at its cap.
    #[error("axis already at its maximum level")]
    MaxLevel,
    /// The player cannot afford the upgrade.
    #[error("not enough money")]
    InsufficientFunds,
}

/// Reasons a sale request may be rejected.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SellError {
    /// The game already ended.
    #[error("the game is over")]
    GameOver,
    /// No tower with the provided identifier exists.
    #[error("no such tower")]
    MissingTower,
}

/// Reasons a portal activation request may be rejected.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortalError {
    /// No portal with the provided identifier exists.
    #[error("no such portal")]
    MissingPortal,
    /// The portal has no path to the goal.
    #[error("portal has no path to the goal")]
    Unreachable,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
        assert_eq!(origin.chebyshev_distance(destination), 3);
    }

    #[test]
    fn adjacency_covers_diagonals_only_once_removed() {
        let center = CellCoord::new(3, 3);
        assert!(center.is_adjacent(CellCoord::new(4, 4)));
        assert!(center.is_adjacent(CellCoord::new(3, 2)));
        assert!(!center.is_adjacent(center));
        assert!(!center.is_adjacent(CellCoord::new(5, 3)));
    }

    #[test]
    fn corner_cells_have_three_neighbors() {
        let dimensions = GridDimensions::new(4, 3);
        let neighbors: Vec<_> = dimensions.neighbors(CellCoord::new(0, 0)).collect();
        assert_eq!(neighbors.len(), 3);
        assert_eq!(
            neighbors.iter().filter(|neighbor| neighbor.diagonal).count(),
            1
        );

        let interior = dimensions.neighbors(CellCoord::new(1, 1)).count();
        assert_eq!(interior, 8);
    }

    #[test]
    fn index_round_trips_through_cell_at() {
        let dimensions = GridDimensions::new(5, 4);
        let cell = CellCoord::new(3, 2);
        let index = dimensions.index(cell).expect("in bounds");
        assert_eq!(index, 13);
        assert_eq!(dimensions.cell_at(index), Some(cell));
        assert_eq!(dimensions.index(CellCoord::new(5, 0)), None);
    }

    #[test]
    fn cell_containing_clamps_into_grid() {
        let grid = Grid::new(GridDimensions::new(20, 15), 40.0, CellCoord::new(19, 7));
        assert_eq!(
            grid.cell_containing(Vec2::new(85.0, 41.0)),
            CellCoord::new(2, 1)
        );
        assert_eq!(
            grid.cell_containing(Vec2::new(-3.0, 9_000.0)),
            CellCoord::new(0, 14)
        );
        assert_eq!(grid.cell_center(CellCoord::new(0, 7)), Vec2::new(20.0, 300.0));
    }

    #[test]
    fn occupancy_treats_out_of_bounds_as_blocked() {
        let dimensions = GridDimensions::new(2, 1);
        let cells = [Some(TowerId::new(4)), None];
        let view = OccupancyView::new(&cells, dimensions);
        assert!(view.is_blocked(CellCoord::new(0, 0)));
        assert!(!view.is_blocked(CellCoord::new(1, 0)));
        assert!(view.is_blocked(CellCoord::new(2, 0)));
        assert_eq!(view.occupant(CellCoord::new(0, 0)), Some(TowerId::new(4)));
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn placement_error_round_trips_through_bincode() {
        assert_round_trip(&PlacementError::BlocksPortal {
            portal: PortalId::new(1),
        });
    }

    #[test]
    fn wave_plan_sorts_spawns_by_offset() {
        let plan = WavePlan::new(
            vec![EnemyGroup {
                kind: EnemyKind::Basic,
                count: 1,
            }],
            1,
            vec![
                PlannedSpawn {
                    kind: EnemyKind::Basic,
                    offset: Duration::from_millis(1_500),
                },
                PlannedSpawn {
                    kind: EnemyKind::Scout,
                    offset: Duration::ZERO,
                },
            ],
        );
        assert_eq!(plan.spawns()[0].kind, EnemyKind::Scout);
        assert_round_trip(&plan);
    }
}
