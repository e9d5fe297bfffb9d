//! Enemy state and per-tick motion.

use std::{collections::BTreeMap, time::Duration};

use glam::Vec2;
use portal_defence_core::{
    CellCoord, EnemyId, EnemyKind, EnemySnapshot, Grid, PortalId, SlowEffect,
};

/// Pixels travelled per unit of speed per simulated millisecond.
const ENEMY_STEP_SCALE: f32 = 0.03;
/// Radius around a tower center inside which enemies are pushed outward.
const REPULSION_RADIUS: f32 = 30.0;
/// Push applied at a tower's center, fading linearly to zero at the radius.
const REPULSION_STRENGTH: f32 = 5.0;

#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    pub(crate) id: EnemyId,
    pub(crate) kind: EnemyKind,
    pub(crate) portal: PortalId,
    pub(crate) position: Vec2,
    pub(crate) cell: CellCoord,
    pub(crate) health: f32,
    pub(crate) path: Vec<CellCoord>,
    /// Index of the last waypoint reached; the next one is `path_index + 1`.
    pub(crate) path_index: usize,
    slow: Option<ActiveSlow>,
}

#[derive(Clone, Copy, Debug)]
struct ActiveSlow {
    factor: f32,
    until: Duration,
}

impl Enemy {
    pub(crate) fn spawn(
        id: EnemyId,
        kind: EnemyKind,
        portal: PortalId,
        path: Vec<CellCoord>,
        grid: &Grid,
    ) -> Option<Self> {
        let start = *path.first()?;
        if !grid.dimensions().contains(start) {
            return None;
        }

        Some(Self {
            id,
            kind,
            portal,
            position: grid.cell_center(start),
            cell: start,
            health: kind.stats().health,
            path,
            path_index: 0,
            slow: None,
        })
    }

    /// Slow multiplier in effect at `now`; expired slows read as `1.0`.
    pub(crate) fn speed_multiplier(&self, now: Duration) -> f32 {
        match self.slow {
            Some(slow) if now < slow.until => slow.factor,
            _ => 1.0,
        }
    }

    pub(crate) fn apply_slow(&mut self, effect: SlowEffect, now: Duration) {
        self.slow = Some(ActiveSlow {
            factor: effect.factor(),
            until: now.saturating_add(effect.duration()),
        });
    }

    pub(crate) fn reached_end(&self) -> bool {
        self.path_index + 1 >= self.path.len()
    }

    pub(crate) fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    pub(crate) fn assign_path(&mut self, path: Vec<CellCoord>) {
        self.path = path;
        self.path_index = 0;
    }

    /// Advances toward the next waypoint by `elapsed` of simulated time.
    ///
    /// Tower centers within [`REPULSION_RADIUS`] push the enemy outward. The
    /// enemy only snaps onto the waypoint on ticks without any push.
    pub(crate) fn advance<I>(&mut self, grid: &Grid, towers: I, now: Duration, elapsed: Duration)
    where
        I: IntoIterator<Item = Vec2>,
    {
        let Some(next) = self.path.get(self.path_index + 1).copied() else {
            return;
        };

        let target = grid.cell_center(next);
        let mut repulsion = Vec2::ZERO;
        for tower in towers {
            let offset = self.position - tower;
            let distance = offset.length();
            if distance < REPULSION_RADIUS && distance > f32::EPSILON {
                let force = (REPULSION_RADIUS - distance) / REPULSION_RADIUS;
                repulsion += offset / distance * force * REPULSION_STRENGTH;
            }
        }

        let delta = target - self.position + repulsion;
        let distance = delta.length();
        let step = self.kind.stats().speed
            * self.speed_multiplier(now)
            * elapsed.as_secs_f32()
            * 1_000.0
            * ENEMY_STEP_SCALE;

        if distance < step && repulsion == Vec2::ZERO {
            self.position = target;
            self.path_index += 1;
            self.cell = next;
        } else {
            if distance > 0.0 {
                self.position += delta / distance * step;
            }
            self.cell = grid.cell_containing(self.position);
        }
    }

    pub(crate) fn snapshot(&self, now: Duration) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id,
            kind: self.kind,
            position: self.position,
            cell: self.cell,
            health: self.health,
            max_health: self.kind.stats().health,
            speed_multiplier: self.speed_multiplier(now),
            waypoint: self.path_index + 1,
            portal: self.portal,
        }
    }
}

/// Live enemies keyed by identifier.
#[derive(Debug)]
pub(crate) struct EnemyRegistry {
    entries: BTreeMap<EnemyId, Enemy>,
    next_enemy_id: EnemyId,
}

impl EnemyRegistry {
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_enemy_id: EnemyId::new(0),
        }
    }

    pub(crate) fn allocate_id(&mut self) -> EnemyId {
        let id = self.next_enemy_id;
        self.next_enemy_id = EnemyId::new(id.get().saturating_add(1));
        id
    }

    pub(crate) fn insert(&mut self, enemy: Enemy) {
        let _ = self.entries.insert(enemy.id, enemy);
    }

    pub(crate) fn remove(&mut self, id: EnemyId) -> Option<Enemy> {
        self.entries.remove(&id)
    }

    pub(crate) fn get(&self, id: EnemyId) -> Option<&Enemy> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: EnemyId) -> Option<&mut Enemy> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Enemy> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Enemy> {
        self.entries.values_mut()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_defence_core::GridDimensions;

    fn grid() -> Grid {
        Grid::new(GridDimensions::new(20, 15), 40.0, CellCoord::new(19, 7))
    }

    fn walker(kind: EnemyKind, path: Vec<CellCoord>) -> Enemy {
        Enemy::spawn(EnemyId::new(0), kind, PortalId::new(0), path, &grid()).expect("valid path")
    }

    #[test]
    fn empty_or_out_of_bounds_paths_do_not_spawn() {
        let grid = grid();
        assert!(Enemy::spawn(EnemyId::new(0), EnemyKind::Basic, PortalId::new(0), Vec::new(), &grid)
            .is_none());
        assert!(Enemy::spawn(
            EnemyId::new(0),
            EnemyKind::Basic,
            PortalId::new(0),
            vec![CellCoord::new(40, 0)],
            &grid
        )
        .is_none());
    }

    #[test]
    fn step_length_scales_with_speed_and_time() {
        let grid = grid();
        let mut enemy = walker(
            EnemyKind::Basic,
            vec![CellCoord::new(0, 7), CellCoord::new(1, 7)],
        );
        let start = enemy.position;

        enemy.advance(&grid, std::iter::empty(), Duration::ZERO, Duration::from_millis(100));

        let travelled = enemy.position.distance(start);
        assert!((travelled - 1.2 * 100.0 * 0.03).abs() < 1e-3);
        assert_eq!(enemy.path_index, 0);
    }

    #[test]
    fn enemy_snaps_onto_waypoint_when_within_one_step() {
        let grid = grid();
        let mut enemy = walker(
            EnemyKind::Scout,
            vec![CellCoord::new(0, 7), CellCoord::new(1, 7)],
        );

        enemy.advance(&grid, std::iter::empty(), Duration::ZERO, Duration::from_millis(500));

        assert_eq!(enemy.path_index, 1);
        assert_eq!(enemy.cell, CellCoord::new(1, 7));
        assert_eq!(enemy.position, grid.cell_center(CellCoord::new(1, 7)));
        assert!(enemy.reached_end());
    }

    #[test]
    fn nearby_tower_pushes_enemy_away() {
        let grid = grid();
        let mut enemy = walker(
            EnemyKind::Basic,
            vec![CellCoord::new(5, 5), CellCoord::new(6, 5)],
        );
        let tower = enemy.position + Vec2::new(0.0, 20.0);

        enemy.advance(&grid, [tower], Duration::ZERO, Duration::from_millis(16));

        assert!(enemy.position.y < grid.cell_center(CellCoord::new(5, 5)).y);
    }

    #[test]
    fn slow_expires_without_explicit_reset() {
        let mut enemy = walker(EnemyKind::Basic, vec![CellCoord::new(0, 0)]);
        enemy.apply_slow(
            SlowEffect::new(0.5, Duration::from_millis(2_000)),
            Duration::from_millis(1_000),
        );

        assert_eq!(enemy.speed_multiplier(Duration::from_millis(2_999)), 0.5);
        assert_eq!(enemy.speed_multiplier(Duration::from_millis(3_000)), 1.0);
    }
}
