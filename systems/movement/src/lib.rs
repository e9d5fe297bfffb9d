#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Re-planning system that keeps ordinary enemies on the safest route.
//!
//! Whenever the re-plan throttle fires or the tower layout changes, every
//! live enemy that is not a scout is routed again from the cell it currently
//! occupies. Scouts keep the walk they spawned with.

use portal_defence_core::{
    config::DangerTuning, Command, EnemyView, Event, Grid, OccupancyView,
};
use portal_defence_system_danger_field::DangerField;
use portal_defence_system_path_planner::PathPlanner;
use tracing::debug;

/// Pure system that reacts to re-plan triggers and emits path assignments.
#[derive(Debug, Default)]
pub struct Movement {
    planner: PathPlanner,
}

impl Movement {
    /// Reports whether the event batch asks for a re-plan.
    #[must_use]
    pub fn replan_requested(events: &[Event]) -> bool {
        events
            .iter()
            .any(|event| matches!(event, Event::ReplanDue | Event::TowerLayoutChanged))
    }

    /// Consumes world events and immutable views to emit path assignments.
    ///
    /// `danger` must already reflect the current tower layout.
    pub fn handle(
        &mut self,
        events: &[Event],
        enemies: &EnemyView,
        grid: &Grid,
        danger: &DangerField,
        occupancy: OccupancyView<'_>,
        tuning: &DangerTuning,
        out: &mut Vec<Command>,
    ) {
        if !Self::replan_requested(events) {
            return;
        }

        let mut assigned = 0_usize;
        for enemy in enemies.iter().filter(|enemy| !enemy.kind.is_scout()) {
            let path = self.planner.plan(
                grid.dimensions(),
                enemy.cell,
                grid.goal(),
                danger,
                tuning,
                |cell| occupancy.is_blocked(cell),
            );

            match path {
                Some(path) if path.len() > 1 => {
                    assigned += 1;
                    out.push(Command::AssignPath {
                        enemy: enemy.id,
                        path,
                    });
                }
                _ => {}
            }
        }

        if assigned > 0 {
            debug!(assigned, "enemies re-planned");
        }
    }
}
