use std::time::Duration;

use portal_defence_core::{
    config::{DangerTuning, ScoutTuning, SimulationConfig},
    CellCoord, Command, EnemyKind, Event, GridDimensions, OccupancyView, PortalId,
    PortalSnapshot,
};
use portal_defence_system_danger_field::DangerField;
use portal_defence_system_spawning::{SpawnContext, Spawning};
use portal_defence_system_wave_generation::generate;
use portal_defence_world::{self as world, query, World};

fn spawn_commands(world: &World, spawning: &mut Spawning, events: &[Event]) -> Vec<Command> {
    let grid = query::grid(world);
    let mut danger = DangerField::new(grid.dimensions());
    danger.rebuild(grid, query::tower_view(world).iter(), &query::config(world).danger);

    let mut commands = Vec::new();
    spawning.handle(
        events,
        SpawnContext {
            grid,
            portals: query::portals(world),
            danger: &danger,
            occupancy: query::occupancy_view(world),
            danger_tuning: &query::config(world).danger,
            scout_tuning: &query::config(world).scouts,
        },
        &mut commands,
    );
    commands
}

#[test]
fn due_spawns_become_enemies_on_a_full_route() {
    let config = SimulationConfig::default();
    let waves = generate(&config.waves);
    let mut world = World::new(config, waves).expect("valid configuration");
    let mut spawning = Spawning::new(0x5eed);

    let mut events = Vec::new();
    world::apply(&mut world, Command::StartWave, &mut events);
    events.clear();
    world::apply(
        &mut world,
        Command::Tick {
            dt: Duration::from_millis(1_000),
        },
        &mut events,
    );

    let due = events
        .iter()
        .filter(|event| matches!(event, Event::SpawnDue { .. }))
        .count();
    assert_eq!(due, 4, "four scouts fall due within the first second");

    let commands = spawn_commands(&world, &mut spawning, &events);
    assert_eq!(commands.len(), due);

    for command in commands {
        match &command {
            Command::SpawnEnemy { kind, portal, path } => {
                assert_eq!(*kind, EnemyKind::Scout);
                assert_eq!(*portal, PortalId::new(0));
                assert_eq!(path.last(), Some(&CellCoord::new(19, 7)));
                assert_eq!(path[0].column(), 0);
                assert!(path[0].row().abs_diff(7) <= 1);
            }
            other => panic!("unexpected command emitted: {other:?}"),
        }

        let mut spawned = Vec::new();
        world::apply(&mut world, command, &mut spawned);
        assert!(matches!(spawned.as_slice(), [Event::EnemySpawned { .. }]));
    }
    assert_eq!(query::enemy_count(&world), 4);
}

#[test]
fn ordinary_enemies_follow_the_safest_route() {
    let config = SimulationConfig::default();
    let mut world = World::new(config, Vec::new()).expect("valid configuration");
    let mut spawning = Spawning::new(11);

    let commands = spawn_commands(
        &world,
        &mut spawning,
        &[Event::SpawnDue {
            wave: 1,
            kind: EnemyKind::Tank,
        }],
    );

    let [Command::SpawnEnemy { path, .. }] = commands.as_slice() else {
        panic!("expected exactly one spawn, got {commands:?}");
    };
    let expected: Vec<CellCoord> = (0..20).map(|column| CellCoord::new(column, 7)).collect();
    assert_eq!(path, &expected);

    let mut events = Vec::new();
    world::apply(&mut world, commands[0].clone(), &mut events);
    assert_eq!(query::enemy_count(&world), 1);
}

#[test]
fn spawns_without_an_open_portal_are_skipped() {
    let dimensions = GridDimensions::new(20, 15);
    let grid = portal_defence_core::Grid::new(dimensions, 40.0, CellCoord::new(19, 7));
    let cells = vec![None; dimensions.cell_count()];
    let danger = DangerField::new(dimensions);
    let portals = [PortalSnapshot {
        id: PortalId::new(0),
        cell: CellCoord::new(0, 7),
        active: false,
        opens_at_wave: 3,
    }];

    let mut spawning = Spawning::new(1);
    let mut commands = Vec::new();
    spawning.handle(
        &[Event::SpawnDue {
            wave: 1,
            kind: EnemyKind::Basic,
        }],
        SpawnContext {
            grid: &grid,
            portals: &portals,
            danger: &danger,
            occupancy: OccupancyView::new(&cells, dimensions),
            danger_tuning: &DangerTuning::default(),
            scout_tuning: &ScoutTuning::default(),
        },
        &mut commands,
    );

    assert!(commands.is_empty());
}

#[test]
fn identical_seeds_choose_identical_routes() {
    let config = SimulationConfig::default();
    let world = World::new(config, Vec::new()).expect("valid configuration");
    let scouts = vec![
        Event::SpawnDue {
            wave: 1,
            kind: EnemyKind::Scout,
        };
        3
    ];

    let first = spawn_commands(&world, &mut Spawning::new(42), &scouts);
    let second = spawn_commands(&world, &mut Spawning::new(42), &scouts);

    assert_eq!(first, second);
}
