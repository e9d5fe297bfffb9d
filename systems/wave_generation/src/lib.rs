#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Procedural wave schedule.
//!
//! Waves grow linearly in size and unlock tougher enemy kinds as the wave
//! index rises. Each wave opens with a quick burst of scouts followed, after a
//! short lull, by the ordinary enemies in catalog order.

use std::time::Duration;

use portal_defence_core::{
    config::WaveConfig, EnemyGroup, EnemyKind, PlannedSpawn, WavePlan,
};

/// Share of a wave's ordinary enemies, in percent, assigned to a kind.
#[derive(Clone, Copy, Debug)]
struct Share {
    kind: EnemyKind,
    percent: u32,
    minimum: u32,
}

const fn share(kind: EnemyKind, percent: u32) -> Share {
    Share {
        kind,
        percent,
        minimum: 0,
    }
}

const OPENING: [Share; 1] = [share(EnemyKind::Basic, 100)];
const EARLY: [Share; 2] = [share(EnemyKind::Basic, 70), share(EnemyKind::Fast, 30)];
const MIDDLE: [Share; 3] = [
    share(EnemyKind::Basic, 50),
    share(EnemyKind::Fast, 30),
    share(EnemyKind::Tank, 20),
];
const LATE: [Share; 3] = [
    share(EnemyKind::Basic, 40),
    share(EnemyKind::Fast, 30),
    share(EnemyKind::Tank, 30),
];
const FINAL: [Share; 4] = [
    share(EnemyKind::Basic, 30),
    share(EnemyKind::Fast, 30),
    share(EnemyKind::Tank, 30),
    Share {
        kind: EnemyKind::Boss,
        percent: 10,
        minimum: 1,
    },
];

fn shares_for(index: u32) -> &'static [Share] {
    match index {
        0 => &OPENING,
        1..=2 => &EARLY,
        3..=5 => &MIDDLE,
        6..=9 => &LATE,
        _ => &FINAL,
    }
}

/// Generates the complete schedule of `config.count` waves.
#[must_use]
pub fn generate(config: &WaveConfig) -> Vec<WavePlan> {
    (0..config.count)
        .map(|index| plan_wave(index, config))
        .collect()
}

/// Builds the plan for the zero-based wave `index`.
#[must_use]
pub fn plan_wave(index: u32, config: &WaveConfig) -> WavePlan {
    let total = config
        .base_enemies
        .saturating_add(config.enemies_per_wave.saturating_mul(index));

    let groups: Vec<EnemyGroup> = shares_for(index)
        .iter()
        .map(|share| EnemyGroup {
            kind: share.kind,
            count: (u64::from(total) * u64::from(share.percent) / 100)
                .try_into()
                .unwrap_or(u32::MAX)
                .max(share.minimum),
        })
        .filter(|group| group.count > 0)
        .collect();

    let mut spawns = Vec::new();
    let scout_interval = Duration::from_millis(config.scout_interval_ms);
    for scout in 0..config.scouts_per_wave {
        spawns.push(PlannedSpawn {
            kind: EnemyKind::Scout,
            offset: scout_interval * scout,
        });
    }

    let enemy_interval = Duration::from_millis(config.enemy_interval_ms);
    let mut offset = Duration::from_millis(config.main_body_delay_ms);
    for group in &groups {
        for _ in 0..group.count {
            spawns.push(PlannedSpawn {
                kind: group.kind,
                offset,
            });
            offset += enemy_interval;
        }
    }

    WavePlan::new(groups, config.scouts_per_wave, spawns)
}
