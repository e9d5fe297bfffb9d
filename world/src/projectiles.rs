//! Projectiles in flight and their impact payloads.

use std::collections::BTreeMap;

use glam::Vec2;
use portal_defence_core::{
    EnemyId, ProjectileId, ProjectileSnapshot, SlowEffect, TowerId, TowerKind,
};

/// Pixels travelled per unit of projectile speed per simulated millisecond.
const PROJECTILE_STEP_SCALE: f32 = 0.1;
/// Distance below which a projectile always counts as a hit.
const HIT_RADIUS: f32 = 5.0;

/// Damage and effects carried by a projectile, fixed when it is fired.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Payload {
    pub(crate) damage: f32,
    pub(crate) splash_radius: Option<f32>,
    pub(crate) slow: Option<SlowEffect>,
}

#[derive(Clone, Debug)]
pub(crate) struct Projectile {
    pub(crate) id: ProjectileId,
    pub(crate) tower: TowerId,
    pub(crate) kind: TowerKind,
    pub(crate) target: EnemyId,
    pub(crate) position: Vec2,
    pub(crate) speed: f32,
    pub(crate) payload: Payload,
}

/// Result of moving a projectile for one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Flight {
    InFlight,
    Arrived,
}

impl Projectile {
    /// Homes toward `target` by one step of `elapsed_ms` simulated milliseconds.
    pub(crate) fn fly_towards(&mut self, target: Vec2, elapsed_ms: f32) -> Flight {
        let delta = target - self.position;
        let distance = delta.length();
        let step = self.speed * elapsed_ms * PROJECTILE_STEP_SCALE;

        if distance < step || distance < HIT_RADIUS {
            self.position = target;
            return Flight::Arrived;
        }

        self.position += delta / distance * step;
        Flight::InFlight
    }

    pub(crate) fn snapshot(&self) -> ProjectileSnapshot {
        ProjectileSnapshot {
            id: self.id,
            tower: self.tower,
            kind: self.kind,
            target: self.target,
            position: self.position,
        }
    }
}

#[derive(Debug)]
pub(crate) struct ProjectileRegistry {
    entries: BTreeMap<ProjectileId, Projectile>,
    next_projectile_id: ProjectileId,
}

impl ProjectileRegistry {
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_projectile_id: ProjectileId::new(0),
        }
    }

    pub(crate) fn launch(
        &mut self,
        tower: TowerId,
        kind: TowerKind,
        target: EnemyId,
        position: Vec2,
        speed: f32,
        payload: Payload,
    ) -> ProjectileId {
        let id = self.next_projectile_id;
        self.next_projectile_id = ProjectileId::new(id.get().saturating_add(1));
        let _ = self.entries.insert(
            id,
            Projectile {
                id,
                tower,
                kind,
                target,
                position,
                speed,
                payload,
            },
        );
        id
    }

    pub(crate) fn ids(&self) -> Vec<ProjectileId> {
        self.entries.keys().copied().collect()
    }

    pub(crate) fn get_mut(&mut self, id: ProjectileId) -> Option<&mut Projectile> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: ProjectileId) -> Option<Projectile> {
        self.entries.remove(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Projectile> {
        self.entries.values()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
