#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that picks the nearest enemy in range for every tower.

use glam::Vec2;
use portal_defence_core::{EnemyId, EnemyView, Grid, TowerId, TowerTarget, TowerView};

/// Tower targeting system that reuses scratch buffers to avoid repeated allocations.
#[derive(Debug, Default)]
pub struct TowerTargeting {
    tower_workspace: Vec<TowerWorkspace>,
    enemy_workspace: Vec<EnemyCandidate>,
}

impl TowerTargeting {
    /// Creates a new tower targeting system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes tower targets for the provided world snapshot.
    ///
    /// The output buffer is cleared before populating it. An enemy counts as
    /// in range only when its distance is strictly below the tower's effective
    /// range; equally distant enemies resolve to the lower identifier.
    pub fn handle(
        &mut self,
        towers: &TowerView,
        enemies: &EnemyView,
        grid: &Grid,
        out: &mut Vec<TowerTarget>,
    ) {
        out.clear();
        if towers.is_empty() || enemies.is_empty() {
            return;
        }

        self.prepare_tower_workspace(towers, grid);
        self.prepare_enemy_workspace(enemies);

        for tower in &self.tower_workspace {
            let mut best: Option<(EnemyId, f32)> = None;

            for candidate in &self.enemy_workspace {
                let distance = tower.center.distance(candidate.position);
                if distance >= tower.range {
                    continue;
                }
                if best.map_or(true, |(_, closest)| distance < closest) {
                    best = Some((candidate.id, distance));
                }
            }

            if let Some((enemy, distance)) = best {
                out.push(TowerTarget {
                    tower: tower.id,
                    enemy,
                    distance,
                });
            }
        }
    }

    fn prepare_tower_workspace(&mut self, towers: &TowerView, grid: &Grid) {
        self.tower_workspace.clear();
        self.tower_workspace.reserve(towers.len());

        for snapshot in towers.iter() {
            self.tower_workspace.push(TowerWorkspace {
                id: snapshot.id,
                center: grid.cell_center(snapshot.cell),
                range: snapshot.profile().range,
            });
        }
    }

    fn prepare_enemy_workspace(&mut self, enemies: &EnemyView) {
        self.enemy_workspace.clear();
        self.enemy_workspace.reserve(enemies.len());

        for snapshot in enemies.iter() {
            self.enemy_workspace.push(EnemyCandidate {
                id: snapshot.id,
                position: snapshot.position,
            });
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct TowerWorkspace {
    id: TowerId,
    center: Vec2,
    range: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct EnemyCandidate {
    id: EnemyId,
    position: Vec2,
}
