use portal_defence_core::{
    config::DangerTuning, CellCoord, Grid, GridDimensions, OccupancyView, PlacementError,
    PortalError, PortalId, PortalSnapshot, TowerId, TowerKind, TowerSnapshot, UpgradeLevels,
};
use portal_defence_system_placement::{is_reserved, PlacementValidator};

struct Layout {
    grid: Grid,
    portals: Vec<PortalSnapshot>,
    towers: Vec<TowerSnapshot>,
    occupancy: Vec<Option<TowerId>>,
}

impl Layout {
    fn new(grid: Grid, portals: &[(CellCoord, bool)]) -> Self {
        let portals = portals
            .iter()
            .enumerate()
            .map(|(index, (cell, active))| PortalSnapshot {
                id: PortalId::new(index as u32),
                cell: *cell,
                active: *active,
                opens_at_wave: 0,
            })
            .collect();
        Self {
            grid,
            portals,
            towers: Vec::new(),
            occupancy: vec![None; grid.dimensions().cell_count()],
        }
    }

    fn candidate(&self, cell: CellCoord) -> TowerSnapshot {
        TowerSnapshot {
            id: TowerId::new(self.towers.len() as u32),
            kind: TowerKind::Basic,
            cell,
            levels: UpgradeLevels::new(),
            invested: TowerKind::Basic.cost(),
        }
    }

    fn add(&mut self, cell: CellCoord) {
        let tower = self.candidate(cell);
        let index = self.grid.dimensions().index(cell).expect("in bounds");
        self.occupancy[index] = Some(tower.id);
        self.towers.push(tower);
    }

    fn validate(
        &self,
        validator: &mut PlacementValidator,
        cell: CellCoord,
    ) -> Result<(), PlacementError> {
        validator.validate_tower(
            &self.grid,
            &self.candidate(cell),
            &self.towers,
            OccupancyView::new(&self.occupancy, self.grid.dimensions()),
            &self.portals,
            &DangerTuning::default(),
        )
    }
}

fn corridor() -> Layout {
    let grid = Grid::new(GridDimensions::new(5, 3), 40.0, CellCoord::new(4, 1));
    Layout::new(grid, &[(CellCoord::new(0, 1), true)])
}

#[test]
fn sealing_the_only_corridor_is_rejected() {
    let mut layout = corridor();
    let mut validator = PlacementValidator::new(&layout.grid);

    assert_eq!(layout.validate(&mut validator, CellCoord::new(2, 0)), Ok(()));
    layout.add(CellCoord::new(2, 0));
    assert_eq!(layout.validate(&mut validator, CellCoord::new(2, 2)), Ok(()));
    layout.add(CellCoord::new(2, 2));

    assert_eq!(
        layout.validate(&mut validator, CellCoord::new(2, 1)),
        Err(PlacementError::BlocksPortal {
            portal: PortalId::new(0)
        })
    );
}

#[test]
fn expensive_but_open_route_is_accepted() {
    let grid = Grid::new(GridDimensions::new(20, 15), 40.0, CellCoord::new(19, 7));
    let mut layout = Layout::new(grid, &[(CellCoord::new(0, 7), true)]);
    let mut validator = PlacementValidator::new(&layout.grid);

    for row in 0..14 {
        layout.add(CellCoord::new(10, row));
    }
    assert_eq!(layout.validate(&mut validator, CellCoord::new(11, 13)), Ok(()));
    assert_eq!(
        layout.validate(&mut validator, CellCoord::new(10, 14)),
        Err(PlacementError::BlocksPortal {
            portal: PortalId::new(0)
        })
    );
}

#[test]
fn reserved_and_occupied_cells_are_rejected() {
    let mut layout = corridor();
    let mut validator = PlacementValidator::new(&layout.grid);
    layout.add(CellCoord::new(1, 0));

    assert_eq!(
        layout.validate(&mut validator, CellCoord::new(4, 1)),
        Err(PlacementError::ReservedCell)
    );
    assert_eq!(
        layout.validate(&mut validator, CellCoord::new(0, 1)),
        Err(PlacementError::ReservedCell)
    );
    assert_eq!(
        layout.validate(&mut validator, CellCoord::new(1, 0)),
        Err(PlacementError::Occupied)
    );
    assert_eq!(
        layout.validate(&mut validator, CellCoord::new(9, 9)),
        Err(PlacementError::OutOfBounds)
    );
}

#[test]
fn inactive_portals_are_reserved_but_not_required_reachable() {
    let grid = Grid::new(GridDimensions::new(5, 3), 40.0, CellCoord::new(4, 1));
    let mut layout = Layout::new(
        grid,
        &[(CellCoord::new(2, 1), true), (CellCoord::new(0, 0), false)],
    );
    let mut validator = PlacementValidator::new(&layout.grid);

    assert!(is_reserved(&layout.grid, &layout.portals, CellCoord::new(0, 0)));
    assert_eq!(
        layout.validate(&mut validator, CellCoord::new(0, 0)),
        Err(PlacementError::ReservedCell)
    );

    // Walling off the inactive portal's corner is fine while it stays closed.
    layout.add(CellCoord::new(1, 0));
    layout.add(CellCoord::new(0, 1));
    assert_eq!(layout.validate(&mut validator, CellCoord::new(1, 1)), Ok(()));

    let closed = layout.portals[1];
    layout.add(CellCoord::new(1, 1));
    assert_eq!(
        validator.validate_portal(
            &layout.grid,
            &closed,
            &layout.towers,
            OccupancyView::new(&layout.occupancy, layout.grid.dimensions()),
            &DangerTuning::default(),
        ),
        Err(PortalError::Unreachable)
    );
}
