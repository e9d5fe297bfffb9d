use portal_defence_core::{
    config::DangerTuning, CellCoord, Grid, GridDimensions, TowerId, TowerKind, TowerSnapshot,
    UpgradeLevels,
};
use portal_defence_system_danger_field::DangerField;
use portal_defence_system_path_planner::PathPlanner;

fn default_grid() -> Grid {
    Grid::new(GridDimensions::new(20, 15), 40.0, CellCoord::new(19, 7))
}

fn tower(id: u32, kind: TowerKind, cell: CellCoord) -> TowerSnapshot {
    TowerSnapshot {
        id: TowerId::new(id),
        kind,
        cell,
        levels: UpgradeLevels::new(),
        invested: kind.cost(),
    }
}

fn assert_well_formed(path: &[CellCoord], start: CellCoord, goal: CellCoord) {
    assert_eq!(path.first(), Some(&start));
    assert_eq!(path.last(), Some(&goal));
    for pair in path.windows(2) {
        assert!(
            pair[0].is_adjacent(pair[1]),
            "{:?} and {:?} are not 8-adjacent",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn open_grid_yields_straight_row() {
    let grid = default_grid();
    let start = CellCoord::new(0, 7);
    let mut planner = PathPlanner::default();
    let danger = DangerField::new(grid.dimensions());
    assert!(danger.is_clear());

    let path = planner
        .plan(
            grid.dimensions(),
            start,
            grid.goal(),
            &danger,
            &DangerTuning::default(),
            |_| false,
        )
        .expect("open grid is traversable");

    assert_well_formed(&path, start, grid.goal());
    assert_eq!(path.len(), 20);
    assert!(path.iter().all(|cell| cell.row() == 7));
}

#[test]
fn blocked_cells_are_never_entered() {
    let grid = default_grid();
    let start = CellCoord::new(0, 7);
    let wall: Vec<CellCoord> = (0..14).map(|row| CellCoord::new(10, row)).collect();
    let is_blocked = |cell: CellCoord| wall.contains(&cell);

    let mut planner = PathPlanner::default();
    let path = planner
        .plan(
            grid.dimensions(),
            start,
            grid.goal(),
            &DangerField::new(grid.dimensions()),
            &DangerTuning::default(),
            is_blocked,
        )
        .expect("gap at the bottom row remains open");

    assert_well_formed(&path, start, grid.goal());
    assert!(path.iter().all(|cell| !wall.contains(cell)));
    assert!(path.contains(&CellCoord::new(10, 14)));
}

#[test]
fn sealed_goal_reports_no_path() {
    let grid = default_grid();
    let wall: Vec<CellCoord> = (0..15).map(|row| CellCoord::new(10, row)).collect();

    let mut planner = PathPlanner::default();
    let path = planner.plan(
        grid.dimensions(),
        CellCoord::new(0, 7),
        grid.goal(),
        &DangerField::new(grid.dimensions()),
        &DangerTuning::default(),
        |cell| wall.contains(&cell),
    );

    assert!(path.is_none());
}

#[test]
fn path_detours_around_covered_cells() {
    let grid = default_grid();
    let basic = tower(0, TowerKind::Basic, CellCoord::new(10, 6));
    let occupied = [basic.cell];
    let mut danger = DangerField::new(grid.dimensions());
    let tuning = DangerTuning::default();
    danger.rebuild(&grid, &[basic], &tuning);

    let start = CellCoord::new(0, 7);
    let mut planner = PathPlanner::default();
    let path = planner
        .plan(
            grid.dimensions(),
            start,
            grid.goal(),
            &danger,
            &tuning,
            |cell| occupied.contains(&cell),
        )
        .expect("detour exists");

    assert_well_formed(&path, start, grid.goal());
    let exposure: f64 = path.iter().map(|cell| danger.danger(*cell)).sum();
    assert_eq!(exposure, 0.0, "a fully safe detour exists and must be taken");
    assert!(!path.contains(&CellCoord::new(10, 7)));
}

#[test]
fn blocked_start_cell_may_still_be_left() {
    let grid = default_grid();
    let start = CellCoord::new(4, 7);
    let mut planner = PathPlanner::default();
    let path = planner
        .plan(
            grid.dimensions(),
            start,
            grid.goal(),
            &DangerField::new(grid.dimensions()),
            &DangerTuning::default(),
            |cell| cell == start,
        )
        .expect("start cell is exempt from blocking");

    assert_well_formed(&path, start, grid.goal());
}

#[test]
fn repeated_searches_reuse_workspace() {
    let grid = default_grid();
    let danger = DangerField::new(grid.dimensions());
    let tuning = DangerTuning::default();
    let mut planner = PathPlanner::default();

    let first = planner.plan(
        grid.dimensions(),
        CellCoord::new(0, 0),
        grid.goal(),
        &danger,
        &tuning,
        |_| false,
    );
    let second = planner.plan(
        grid.dimensions(),
        CellCoord::new(0, 0),
        grid.goal(),
        &danger,
        &tuning,
        |_| false,
    );

    assert_eq!(first, second);
    let path = first.expect("open grid");
    assert_eq!(path.len(), 20);
}
