//! Immutable tower and enemy catalogs plus the upgrade arithmetic built on top of them.
//!
//! Every stat that the simulation reads for a tower or enemy originates from
//! the tables in this module. Values are expressed in pixels and milliseconds
//! so that they line up with the grid's configured cell size.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Lowest level any upgrade axis can hold.
pub const MIN_UPGRADE_LEVEL: u8 = 1;
/// Highest level any upgrade axis can reach.
pub const MAX_UPGRADE_LEVEL: u8 = 7;

const DAMAGE_GAIN_PER_LEVEL: f32 = 0.3;
const RANGE_GAIN_PER_LEVEL: f32 = 0.2;
const SPEED_GAIN_PER_LEVEL: f32 = 0.15;

/// Fraction of primary damage applied to every enemy caught in a splash.
pub const SPLASH_DAMAGE_RATIO: f32 = 0.7;

/// Types of towers that can be constructed on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TowerKind {
    /// Cheap all-rounder.
    Basic,
    /// Long range, slow, heavy hitting.
    Sniper,
    /// Short range tower whose shells splash around the impact point.
    Cannon,
    /// Weak tower whose shots slow their target.
    Freeze,
}

impl TowerKind {
    /// Every tower kind in catalog order.
    pub const ALL: [TowerKind; 4] = [Self::Basic, Self::Sniper, Self::Cannon, Self::Freeze];

    /// Base statistics for the tower kind.
    #[must_use]
    pub const fn stats(self) -> TowerStats {
        match self {
            Self::Basic => TowerStats {
                cost: 50,
                damage: 10.0,
                range: 120.0,
                fire_interval_ms: 1_000,
                projectile_speed: 5.0,
                splash_radius: None,
                slow: None,
                upgrade_base_cost: 20,
            },
            Self::Sniper => TowerStats {
                cost: 100,
                damage: 50.0,
                range: 200.0,
                fire_interval_ms: 2_000,
                projectile_speed: 8.0,
                splash_radius: None,
                slow: None,
                upgrade_base_cost: 40,
            },
            Self::Cannon => TowerStats {
                cost: 150,
                damage: 30.0,
                range: 100.0,
                fire_interval_ms: 1_500,
                projectile_speed: 4.0,
                splash_radius: Some(40.0),
                slow: None,
                upgrade_base_cost: 60,
            },
            Self::Freeze => TowerStats {
                cost: 120,
                damage: 5.0,
                range: 150.0,
                fire_interval_ms: 800,
                projectile_speed: 6.0,
                splash_radius: None,
                slow: Some(SlowEffect::new(0.5, Duration::from_millis(2_000))),
                upgrade_base_cost: 50,
            },
        }
    }

    /// Price of constructing the tower.
    #[must_use]
    pub const fn cost(self) -> u32 {
        self.stats().cost
    }

    /// Price of raising an axis that currently sits at `current_level`.
    #[must_use]
    pub const fn upgrade_price(self, current_level: u8) -> u32 {
        self.stats().upgrade_base_cost * current_level as u32
    }

    /// Resolves the effective combat profile for the provided upgrade levels.
    #[must_use]
    pub fn profile(self, levels: UpgradeLevels) -> TowerProfile {
        let stats = self.stats();
        let damage = stats.damage * level_multiplier(levels.damage, DAMAGE_GAIN_PER_LEVEL);
        let range = stats.range * level_multiplier(levels.range, RANGE_GAIN_PER_LEVEL);
        let interval_ms =
            stats.fire_interval_ms as f32 / level_multiplier(levels.speed, SPEED_GAIN_PER_LEVEL);

        TowerProfile {
            damage,
            range,
            fire_interval: Duration::from_secs_f32(interval_ms / 1_000.0),
            projectile_speed: stats.projectile_speed,
            splash_radius: stats.splash_radius,
            slow: stats.slow,
        }
    }
}

fn level_multiplier(level: u8, gain: f32) -> f32 {
    let steps = level.clamp(MIN_UPGRADE_LEVEL, MAX_UPGRADE_LEVEL) - MIN_UPGRADE_LEVEL;
    1.0 + f32::from(steps) * gain
}

/// Static catalog entry describing a tower kind at level one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerStats {
    /// Construction price.
    pub cost: u32,
    /// Damage dealt by a single projectile.
    pub damage: f32,
    /// Targeting radius in pixels.
    pub range: f32,
    /// Milliseconds between shots.
    pub fire_interval_ms: u32,
    /// Projectile travel speed scalar.
    pub projectile_speed: f32,
    /// Radius in pixels of the splash applied on impact, if any.
    pub splash_radius: Option<f32>,
    /// Slow applied to the primary target on impact, if any.
    pub slow: Option<SlowEffect>,
    /// Base price used to derive upgrade costs.
    pub upgrade_base_cost: u32,
}

/// Timed movement penalty applied by freezing projectiles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlowEffect {
    factor: f32,
    duration: Duration,
}

impl SlowEffect {
    /// Creates a slow effect multiplying speed by `factor` for `duration`.
    #[must_use]
    pub const fn new(factor: f32, duration: Duration) -> Self {
        Self { factor, duration }
    }

    /// Speed multiplier applied while the effect lasts.
    #[must_use]
    pub const fn factor(&self) -> f32 {
        self.factor
    }

    /// How long the effect lasts after impact.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }
}

/// Effective combat statistics for a tower after upgrades are applied.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerProfile {
    /// Damage per projectile.
    pub damage: f32,
    /// Targeting radius in pixels.
    pub range: f32,
    /// Minimum simulated time between shots.
    pub fire_interval: Duration,
    /// Projectile travel speed scalar.
    pub projectile_speed: f32,
    /// Splash radius in pixels, if any.
    pub splash_radius: Option<f32>,
    /// Slow applied on impact, if any.
    pub slow: Option<SlowEffect>,
}

impl TowerProfile {
    /// Sustained damage per second, `damage / (interval in seconds)`.
    #[must_use]
    pub fn damage_per_second(&self) -> f32 {
        let seconds = self.fire_interval.as_secs_f32();
        if seconds <= 0.0 {
            return 0.0;
        }
        self.damage / seconds
    }
}

/// Independent axes a tower can be upgraded along.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeAxis {
    /// Raises projectile damage.
    Damage,
    /// Raises targeting range.
    Range,
    /// Shortens the fire interval.
    Speed,
}

impl UpgradeAxis {
    /// Every axis in display order.
    pub const ALL: [UpgradeAxis; 3] = [Self::Damage, Self::Range, Self::Speed];
}

/// Upgrade counters tracked per tower, each bounded to `1..=7`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UpgradeLevels {
    damage: u8,
    range: u8,
    speed: u8,
}

impl Default for UpgradeLevels {
    fn default() -> Self {
        Self::new()
    }
}

impl UpgradeLevels {
    /// Levels held by a freshly placed tower.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            damage: MIN_UPGRADE_LEVEL,
            range: MIN_UPGRADE_LEVEL,
            speed: MIN_UPGRADE_LEVEL,
        }
    }

    /// Creates levels from explicit values, clamping each into the valid band.
    #[must_use]
    pub fn from_levels(damage: u8, range: u8, speed: u8) -> Self {
        let clamp = |level: u8| level.clamp(MIN_UPGRADE_LEVEL, MAX_UPGRADE_LEVEL);
        Self {
            damage: clamp(damage),
            range: clamp(range),
            speed: clamp(speed),
        }
    }

    /// Level currently held on the provided axis.
    #[must_use]
    pub const fn level(&self, axis: UpgradeAxis) -> u8 {
        match axis {
            UpgradeAxis::Damage => self.damage,
            UpgradeAxis::Range => self.range,
            UpgradeAxis::Speed => self.speed,
        }
    }

    /// Reports whether the axis already sits at its cap.
    #[must_use]
    pub const fn is_maxed(&self, axis: UpgradeAxis) -> bool {
        self.level(axis) >= MAX_UPGRADE_LEVEL
    }

    /// Returns the levels with `axis` raised by one, or `None` at the cap.
    #[must_use]
    pub fn raised(self, axis: UpgradeAxis) -> Option<Self> {
        if self.is_maxed(axis) {
            return None;
        }

        let mut next = self;
        match axis {
            UpgradeAxis::Damage => next.damage += 1,
            UpgradeAxis::Range => next.range += 1,
            UpgradeAxis::Speed => next.speed += 1,
        }
        Some(next)
    }
}

/// Types of enemies that can walk the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    /// Baseline enemy.
    Basic,
    /// Fragile and quick.
    Fast,
    /// Armoured and slow.
    Tank,
    /// Very durable and very slow.
    Boss,
    /// Quick enemy that ignores danger and wanders toward the goal.
    Scout,
}

impl EnemyKind {
    /// Base statistics for the enemy kind.
    #[must_use]
    pub const fn stats(self) -> EnemyStats {
        match self {
            Self::Basic => EnemyStats::new(50.0, 1.2, 10),
            Self::Fast => EnemyStats::new(30.0, 2.5, 15),
            Self::Tank => EnemyStats::new(200.0, 0.6, 30),
            Self::Boss => EnemyStats::new(500.0, 0.4, 100),
            Self::Scout => EnemyStats::new(20.0, 3.0, 8),
        }
    }

    /// Scouts follow randomized walks and are never re-planned.
    #[must_use]
    pub const fn is_scout(self) -> bool {
        matches!(self, Self::Scout)
    }
}

/// Static catalog entry describing an enemy kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyStats {
    /// Starting and maximum health.
    pub health: f32,
    /// Base movement speed scalar.
    pub speed: f32,
    /// Money granted on death; score grows by ten times this value.
    pub reward: u32,
}

impl EnemyStats {
    const fn new(health: f32, speed: f32, reward: u32) -> Self {
        Self {
            health,
            speed,
            reward,
        }
    }
}
