//! Authoritative tower state management utilities.

use std::{collections::BTreeMap, time::Duration};

use portal_defence_core::{
    CellCoord, TowerCooldownSnapshot, TowerId, TowerKind, TowerSnapshot, UpgradeAxis,
    UpgradeLevels,
};

/// Tower stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct TowerState {
    pub(crate) id: TowerId,
    pub(crate) kind: TowerKind,
    pub(crate) cell: CellCoord,
    pub(crate) levels: UpgradeLevels,
    /// Placement cost plus every upgrade price paid.
    pub(crate) invested: u32,
    /// Simulated clock value of the last shot.
    pub(crate) last_fired: Option<Duration>,
}

impl TowerState {
    pub(crate) fn snapshot(&self) -> TowerSnapshot {
        TowerSnapshot {
            id: self.id,
            kind: self.kind,
            cell: self.cell,
            levels: self.levels,
            invested: self.invested,
        }
    }

    /// Simulated time left before the tower may fire again.
    pub(crate) fn ready_in(&self, now: Duration) -> Duration {
        let Some(last_fired) = self.last_fired else {
            return Duration::ZERO;
        };
        let interval = self.kind.profile(self.levels).fire_interval;
        interval.saturating_sub(now.saturating_sub(last_fired))
    }

    pub(crate) fn cooldown(&self, now: Duration) -> TowerCooldownSnapshot {
        TowerCooldownSnapshot {
            tower: self.id,
            kind: self.kind,
            ready_in: self.ready_in(now),
        }
    }

    /// Raises `axis` and records the spend, returning the new level.
    pub(crate) fn upgrade(&mut self, axis: UpgradeAxis, price: u32) -> Option<u8> {
        let raised = self.levels.raised(axis)?;
        self.levels = raised;
        self.invested = self.invested.saturating_add(price);
        Some(raised.level(axis))
    }
}

/// Registry that stores towers and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct TowerRegistry {
    entries: BTreeMap<TowerId, TowerState>,
    next_tower_id: TowerId,
}

impl TowerRegistry {
    /// Creates an empty tower registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_tower_id: TowerId::new(0),
        }
    }

    /// Identifier the next inserted tower will receive.
    pub(crate) fn peek_id(&self) -> TowerId {
        self.next_tower_id
    }

    /// Stores a freshly placed tower and advances the identifier counter.
    pub(crate) fn insert(&mut self, kind: TowerKind, cell: CellCoord) -> TowerId {
        let id = self.next_tower_id;
        self.next_tower_id = TowerId::new(id.get().saturating_add(1));
        let _ = self.entries.insert(
            id,
            TowerState {
                id,
                kind,
                cell,
                levels: UpgradeLevels::new(),
                invested: kind.cost(),
                last_fired: None,
            },
        );
        id
    }

    pub(crate) fn remove(&mut self, id: TowerId) -> Option<TowerState> {
        self.entries.remove(&id)
    }

    pub(crate) fn get(&self, id: TowerId) -> Option<&TowerState> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut TowerState> {
        self.entries.get_mut(&id)
    }

    /// Towers in identifier order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &TowerState> {
        self.entries.values()
    }

    pub(crate) fn snapshots(&self) -> Vec<TowerSnapshot> {
        self.iter().map(TowerState::snapshot).collect()
    }
}
