//! Tunable configuration shared by the world and the pure systems.
//!
//! All sections deserialize with `#[serde(default)]` so a TOML file only needs
//! to mention the values it overrides.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::CellCoord;

/// Complete configuration for a simulation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Grid dimensions, goal and portals.
    pub grid: GridConfig,
    /// Starting money and lives.
    pub economy: EconomyConfig,
    /// Re-plan throttle, wave delays and speed table.
    pub timing: TimingConfig,
    /// Danger field and path cost tuning.
    pub danger: DangerTuning,
    /// Scout walk tuning.
    pub scouts: ScoutTuning,
    /// Procedural wave schedule parameters.
    pub waves: WaveConfig,
    /// Seed for every random stream used by the simulation.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            economy: EconomyConfig::default(),
            timing: TimingConfig::default(),
            danger: DangerTuning::default(),
            scouts: ScoutTuning::default(),
            waves: WaveConfig::default(),
            seed: 0x5eed_0f_9a7e,
        }
    }
}

impl SimulationConfig {
    /// Checks the structural invariants the world relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let grid = &self.grid;
        if grid.columns == 0 || grid.rows == 0 {
            return Err(ConfigError::EmptyGrid);
        }
        if !(grid.cell_size > 0.0) {
            return Err(ConfigError::InvalidCellSize);
        }

        let in_bounds = |cell: CellCoord| cell.column() < grid.columns && cell.row() < grid.rows;
        if !in_bounds(grid.goal) {
            return Err(ConfigError::GoalOutOfBounds { goal: grid.goal });
        }
        if grid.portals.is_empty() {
            return Err(ConfigError::NoPortals);
        }

        for (index, portal) in grid.portals.iter().enumerate() {
            if !in_bounds(portal.cell) {
                return Err(ConfigError::PortalOutOfBounds { index });
            }
            if portal.cell == grid.goal {
                return Err(ConfigError::PortalOnGoal { index });
            }
            if grid.portals[..index]
                .iter()
                .any(|other| other.cell == portal.cell)
            {
                return Err(ConfigError::DuplicatePortal { index });
            }
        }

        if self.timing.speeds.is_empty() || self.timing.speeds.contains(&0) {
            return Err(ConfigError::InvalidSpeedTable);
        }

        self.danger.validate()?;
        let bias = self.scouts.progress_bias;
        if !(0.0..=1.0).contains(&bias) {
            return Err(ConfigError::InvalidProgressBias);
        }

        Ok(())
    }
}

/// Reasons a configuration is rejected before the world is built.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The grid has no cells.
    #[error("grid must have at least one column and one row")]
    EmptyGrid,
    /// The cell size is zero, negative or not a number.
    #[error("cell size must be a positive number of pixels")]
    InvalidCellSize,
    /// The goal lies outside the grid.
    #[error("goal {goal:?} lies outside the grid")]
    GoalOutOfBounds {
        /// Offending goal cell.
        goal: CellCoord,
    },
    /// No portal was configured.
    #[error("at least one portal is required")]
    NoPortals,
    /// A portal lies outside the grid.
    #[error("portal #{index} lies outside the grid")]
    PortalOutOfBounds {
        /// Position of the portal in the configuration list.
        index: usize,
    },
    /// A portal shares the goal cell.
    #[error("portal #{index} sits on the goal cell")]
    PortalOnGoal {
        /// Position of the portal in the configuration list.
        index: usize,
    },
    /// Two portals share a cell.
    #[error("portal #{index} duplicates an earlier portal cell")]
    DuplicatePortal {
        /// Position of the later portal in the configuration list.
        index: usize,
    },
    /// The speed table is empty or contains a zero multiplier.
    #[error("speed table must contain only non-zero multipliers")]
    InvalidSpeedTable,
    /// A danger tuning value is negative or not finite.
    #[error("danger tuning `{field}` must be a finite, non-negative number")]
    InvalidDangerTuning {
        /// Name of the offending field.
        field: &'static str,
    },
    /// The scout progress bias is not a probability.
    #[error("scout progress bias must lie within 0..=1")]
    InvalidProgressBias,
}

/// Grid layout configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Number of columns.
    pub columns: u32,
    /// Number of rows.
    pub rows: u32,
    /// Side length of a cell in pixels.
    pub cell_size: f32,
    /// Cell enemies try to reach.
    pub goal: CellCoord,
    /// Spawn points in identifier order.
    pub portals: Vec<PortalConfig>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: 20,
            rows: 15,
            cell_size: 40.0,
            goal: CellCoord::new(19, 7),
            portals: vec![PortalConfig {
                cell: CellCoord::new(0, 7),
                opens_at_wave: 0,
            }],
        }
    }
}

/// Spawn point configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Cell the portal occupies.
    pub cell: CellCoord,
    /// Wave number whose start opens the portal; zero means open from the start.
    #[serde(default)]
    pub opens_at_wave: u32,
}

/// Economy configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Money available before the first wave.
    pub starting_money: u32,
    /// Lives available before the first wave.
    pub starting_lives: u32,
    /// Score granted per point of kill reward.
    pub score_per_reward: u32,
    /// Percentage of invested money refunded on sale.
    pub sell_refund_percent: u32,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            starting_money: 200,
            starting_lives: 20,
            score_per_reward: 10,
            sell_refund_percent: 50,
        }
    }
}

/// Timing configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Unscaled milliseconds between scheduled danger rebuilds and re-plans.
    pub replan_interval_ms: u64,
    /// Simulated milliseconds between a cleared wave and the next automatic start.
    pub auto_wave_delay_ms: u64,
    /// Speed multipliers cycled through by the player.
    pub speeds: Vec<u8>,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            replan_interval_ms: 100,
            auto_wave_delay_ms: 7_000,
            speeds: vec![1, 2, 3],
        }
    }
}

impl TimingConfig {
    /// Re-plan throttle as a duration.
    #[must_use]
    pub fn replan_interval(&self) -> Duration {
        Duration::from_millis(self.replan_interval_ms)
    }

    /// Automatic wave delay as a duration.
    #[must_use]
    pub fn auto_wave_delay(&self) -> Duration {
        Duration::from_millis(self.auto_wave_delay_ms)
    }
}

/// Game-balance constants for the danger field and path costs.
///
/// The defaults make a single covered cell cost more than any detour through
/// uncovered cells, which turns shortest-path search into safest-path search.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DangerTuning {
    /// Multiplier applied to tower DPS at the tower's center.
    pub scale: f64,
    /// Falloff exponent applied to `1 - normalized_distance`.
    pub exponent: i32,
    /// Multiplier converting a cell's danger into an additive step penalty.
    pub penalty_factor: f64,
    /// Weight applied to the Manhattan heuristic.
    pub heuristic_weight: f64,
}

impl Default for DangerTuning {
    fn default() -> Self {
        Self {
            scale: 2_000_000.0,
            exponent: 5,
            penalty_factor: 50_000.0,
            heuristic_weight: 0.000_01,
        }
    }
}

impl DangerTuning {
    fn validate(&self) -> Result<(), ConfigError> {
        let weights = [
            ("scale", self.scale),
            ("penalty_factor", self.penalty_factor),
            ("heuristic_weight", self.heuristic_weight),
        ];
        for (field, value) in weights {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::InvalidDangerTuning { field });
            }
        }
        if self.exponent < 0 {
            return Err(ConfigError::InvalidDangerTuning { field: "exponent" });
        }
        Ok(())
    }
}

/// Scout walk tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoutTuning {
    /// Probability of taking the goal-closest unvisited neighbor.
    pub progress_bias: f64,
    /// Maximum row offset applied to a scout's spawn cell.
    pub portal_jitter_rows: u32,
}

impl Default for ScoutTuning {
    fn default() -> Self {
        Self {
            progress_bias: 0.75,
            portal_jitter_rows: 1,
        }
    }
}

/// Procedural wave schedule parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    /// Number of waves before the game is won.
    pub count: u32,
    /// Ordinary enemies in the first wave.
    pub base_enemies: u32,
    /// Ordinary enemies added per subsequent wave.
    pub enemies_per_wave: u32,
    /// Scouts added to every wave.
    pub scouts_per_wave: u32,
    /// Milliseconds between consecutive scouts.
    pub scout_interval_ms: u64,
    /// Milliseconds between wave start and the first ordinary enemy.
    pub main_body_delay_ms: u64,
    /// Milliseconds between consecutive ordinary enemies.
    pub enemy_interval_ms: u64,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            count: 15,
            base_enemies: 7,
            enemies_per_wave: 3,
            scouts_per_wave: 4,
            scout_interval_ms: 300,
            main_body_delay_ms: 1_500,
            enemy_interval_ms: 800,
        }
    }
}
