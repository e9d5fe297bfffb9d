#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Placement validation that keeps every active portal connected to the goal.
//!
//! A candidate tower is accepted only when its cell is free, is neither the
//! goal nor a portal, and the danger-aware planner still finds a route from
//! every active portal once the tower is tentatively added. Danger never
//! blocks a route; only tower cells do.

use portal_defence_core::{
    config::DangerTuning, CellCoord, Grid, OccupancyView, PlacementError, PortalError,
    PortalSnapshot, TowerSnapshot,
};
use portal_defence_system_danger_field::DangerField;
use portal_defence_system_path_planner::PathPlanner;

/// Stateful validator that reuses its planner and danger buffers.
#[derive(Debug)]
pub struct PlacementValidator {
    planner: PathPlanner,
    danger: DangerField,
}

impl PlacementValidator {
    /// Creates a validator sized for the provided grid.
    #[must_use]
    pub fn new(grid: &Grid) -> Self {
        Self {
            planner: PathPlanner::default(),
            danger: DangerField::new(grid.dimensions()),
        }
    }

    /// Checks whether `candidate` may be added to the existing towers.
    ///
    /// Funds are not considered here; the caller owns the economy.
    pub fn validate_tower(
        &mut self,
        grid: &Grid,
        candidate: &TowerSnapshot,
        towers: &[TowerSnapshot],
        occupancy: OccupancyView<'_>,
        portals: &[PortalSnapshot],
        tuning: &DangerTuning,
    ) -> Result<(), PlacementError> {
        let cell = candidate.cell;
        if !grid.dimensions().contains(cell) {
            return Err(PlacementError::OutOfBounds);
        }
        if is_reserved(grid, portals, cell) {
            return Err(PlacementError::ReservedCell);
        }
        if occupancy.occupant(cell).is_some() {
            return Err(PlacementError::Occupied);
        }

        self.danger.rebuild(
            grid,
            towers.iter().chain(std::iter::once(candidate)),
            tuning,
        );

        let blocked = |other: CellCoord| other == cell || occupancy.is_blocked(other);
        for portal in portals.iter().filter(|portal| portal.active) {
            let path = self.planner.plan(
                grid.dimensions(),
                portal.cell,
                grid.goal(),
                &self.danger,
                tuning,
                blocked,
            );
            if path.is_none() {
                return Err(PlacementError::BlocksPortal { portal: portal.id });
            }
        }

        Ok(())
    }

    /// Checks whether `portal` has a route to the goal under the current layout.
    pub fn validate_portal(
        &mut self,
        grid: &Grid,
        portal: &PortalSnapshot,
        towers: &[TowerSnapshot],
        occupancy: OccupancyView<'_>,
        tuning: &DangerTuning,
    ) -> Result<(), PortalError> {
        self.danger.rebuild(grid, towers, tuning);
        let path = self.planner.plan(
            grid.dimensions(),
            portal.cell,
            grid.goal(),
            &self.danger,
            tuning,
            |other| occupancy.is_blocked(other),
        );

        match path {
            Some(_) => Ok(()),
            None => Err(PortalError::Unreachable),
        }
    }
}

/// Reports whether the cell is the goal or any portal, active or not.
#[must_use]
pub fn is_reserved(grid: &Grid, portals: &[PortalSnapshot], cell: CellCoord) -> bool {
    cell == grid.goal() || portals.iter().any(|portal| portal.cell == cell)
}
