#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Spawning system that turns due spawn events into concrete enemy spawns.
//!
//! Every [`Event::SpawnDue`] independently picks an active portal and asks
//! either the danger-aware planner or the scout walker for a route. A spawn
//! that cannot reach the goal is skipped.

use portal_defence_core::{
    config::{DangerTuning, ScoutTuning},
    CellCoord, Command, EnemyKind, Event, Grid, OccupancyView, PortalSnapshot,
};
use portal_defence_system_danger_field::DangerField;
use portal_defence_system_path_planner::PathPlanner;
use portal_defence_system_scout_paths::ScoutPathGenerator;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

/// Read-only state the spawning system needs to resolve a spawn.
#[derive(Clone, Copy, Debug)]
pub struct SpawnContext<'a> {
    /// Grid geometry including the goal.
    pub grid: &'a Grid,
    /// Every portal; inactive ones are never chosen.
    pub portals: &'a [PortalSnapshot],
    /// Danger field matching the current tower layout.
    pub danger: &'a DangerField,
    /// Cells currently holding towers.
    pub occupancy: OccupancyView<'a>,
    /// Tuning used by the danger-aware planner.
    pub danger_tuning: &'a DangerTuning,
    /// Tuning used by the scout walker.
    pub scout_tuning: &'a ScoutTuning,
}

/// Pure system that resolves portal choice and routes for due spawns.
#[derive(Debug)]
pub struct Spawning {
    rng: ChaCha8Rng,
    planner: PathPlanner,
    scouts: ScoutPathGenerator,
}

impl Spawning {
    /// Creates a spawning system whose random choices derive from `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            planner: PathPlanner::default(),
            scouts: ScoutPathGenerator::default(),
        }
    }

    /// Consumes events and emits one spawn command per resolvable due spawn.
    pub fn handle(&mut self, events: &[Event], context: SpawnContext<'_>, out: &mut Vec<Command>) {
        for event in events {
            if let Event::SpawnDue { wave, kind } = event {
                match self.resolve(*kind, context) {
                    Some(command) => out.push(command),
                    None => warn!(wave, ?kind, "spawn skipped: no route to the goal"),
                }
            }
        }
    }

    fn resolve(&mut self, kind: EnemyKind, context: SpawnContext<'_>) -> Option<Command> {
        let active: Vec<&PortalSnapshot> = context
            .portals
            .iter()
            .filter(|portal| portal.active)
            .collect();
        if active.is_empty() {
            return None;
        }
        let portal = active[self.rng.gen_range(0..active.len())];

        let dimensions = context.grid.dimensions();
        let goal = context.grid.goal();
        let occupancy = context.occupancy;
        let path = if kind.is_scout() {
            let start = self.jittered_start(portal.cell, context);
            self.scouts
                .generate(
                    dimensions,
                    start,
                    goal,
                    context.scout_tuning,
                    &mut self.rng,
                    |cell| occupancy.is_blocked(cell),
                )
                .into_complete()?
        } else {
            self.planner.plan(
                dimensions,
                portal.cell,
                goal,
                context.danger,
                context.danger_tuning,
                |cell| occupancy.is_blocked(cell),
            )?
        };

        debug!(?kind, portal = portal.id.get(), steps = path.len(), "spawn resolved");
        Some(Command::SpawnEnemy {
            kind,
            portal: portal.id,
            path,
        })
    }

    /// Shifts a scout's spawn row by up to the configured jitter, staying on the grid.
    fn jittered_start(&mut self, portal: CellCoord, context: SpawnContext<'_>) -> CellCoord {
        let jitter = i64::from(context.scout_tuning.portal_jitter_rows);
        if jitter == 0 {
            return portal;
        }

        let offset = self.rng.gen_range(-jitter..=jitter);
        let last_row = i64::from(context.grid.dimensions().rows().saturating_sub(1));
        let row = (i64::from(portal.row()) + offset).clamp(0, last_row);
        let candidate = CellCoord::new(portal.column(), u32::try_from(row).unwrap_or(0));

        if context.occupancy.is_blocked(candidate) {
            portal
        } else {
            candidate
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_defence_core::{GridDimensions, PortalId, TowerId};

    #[test]
    fn jitter_stays_within_rows_and_avoids_towers() {
        let dimensions = GridDimensions::new(20, 3);
        let grid = Grid::new(dimensions, 40.0, CellCoord::new(19, 1));
        let mut cells = vec![None; dimensions.cell_count()];
        cells[dimensions.index(CellCoord::new(0, 1)).expect("in bounds")] = Some(TowerId::new(0));
        let danger = DangerField::new(dimensions);
        let portals = [PortalSnapshot {
            id: PortalId::new(0),
            cell: CellCoord::new(0, 0),
            active: true,
            opens_at_wave: 0,
        }];
        let context = SpawnContext {
            grid: &grid,
            portals: &portals,
            danger: &danger,
            occupancy: OccupancyView::new(&cells, dimensions),
            danger_tuning: &DangerTuning::default(),
            scout_tuning: &ScoutTuning::default(),
        };

        let mut spawning = Spawning::new(3);
        for _ in 0..64 {
            assert_eq!(
                spawning.jittered_start(CellCoord::new(0, 0), context),
                CellCoord::new(0, 0)
            );
        }
    }
}
