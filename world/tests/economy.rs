use std::time::Duration;

use portal_defence_core::{
    config::{GridConfig, PortalConfig, SimulationConfig},
    CellCoord, Command, EnemyKind, Event, GameState, PlacementError, PortalId, SellError, TowerId,
    TowerKind, UpgradeAxis, UpgradeError,
};
use portal_defence_system_wave_generation::generate;
use portal_defence_world::{apply, query, World};

fn new_world(config: SimulationConfig) -> World {
    let waves = generate(&config.waves);
    World::new(config, waves).expect("configuration is valid")
}

fn place(world: &mut World, kind: TowerKind, cell: CellCoord) -> Vec<Event> {
    let mut events = Vec::new();
    apply(world, Command::PlaceTower { kind, cell }, &mut events);
    events
}

#[test]
fn placing_tower_spends_money_and_occupies_cell() {
    let mut world = new_world(SimulationConfig::default());
    let cell = CellCoord::new(5, 5);

    let events = place(&mut world, TowerKind::Basic, cell);

    assert_eq!(
        events,
        vec![
            Event::TowerPlaced {
                tower: TowerId::new(0),
                kind: TowerKind::Basic,
                cell,
            },
            Event::TowerLayoutChanged,
        ]
    );
    assert_eq!(query::money(&world), 150);
    assert_eq!(query::tower_at(&world, cell), Some(TowerId::new(0)));
    assert!(query::occupancy_view(&world).is_blocked(cell));
}

#[test]
fn placement_rejections_leave_state_untouched() {
    let mut world = new_world(SimulationConfig::default());
    let _ = place(&mut world, TowerKind::Cannon, CellCoord::new(4, 4));

    let cases = [
        (TowerKind::Basic, CellCoord::new(4, 4), PlacementError::Occupied),
        (TowerKind::Basic, CellCoord::new(19, 7), PlacementError::ReservedCell),
        (TowerKind::Basic, CellCoord::new(0, 7), PlacementError::ReservedCell),
        (TowerKind::Basic, CellCoord::new(20, 0), PlacementError::OutOfBounds),
        (TowerKind::Sniper, CellCoord::new(8, 8), PlacementError::InsufficientFunds),
    ];

    for (kind, cell, reason) in cases {
        assert_eq!(
            place(&mut world, kind, cell),
            vec![Event::TowerPlacementRejected { kind, cell, reason }]
        );
    }
    assert_eq!(query::money(&world), 50);
    assert_eq!(query::tower_view(&world).len(), 1);
}

#[test]
fn sealing_the_only_corridor_is_rejected_without_charge() {
    let config = SimulationConfig {
        grid: GridConfig {
            columns: 5,
            rows: 3,
            cell_size: 40.0,
            goal: CellCoord::new(4, 1),
            portals: vec![PortalConfig {
                cell: CellCoord::new(0, 1),
                opens_at_wave: 0,
            }],
        },
        ..SimulationConfig::default()
    };
    let mut world = new_world(config);
    let _ = place(&mut world, TowerKind::Basic, CellCoord::new(2, 0));
    let _ = place(&mut world, TowerKind::Basic, CellCoord::new(2, 2));
    let money = query::money(&world);
    let towers: Vec<_> = query::tower_view(&world).iter().copied().collect();
    assert_eq!(towers.len(), 2);

    let cell = CellCoord::new(2, 1);
    assert_eq!(
        place(&mut world, TowerKind::Basic, cell),
        vec![Event::TowerPlacementRejected {
            kind: TowerKind::Basic,
            cell,
            reason: PlacementError::BlocksPortal {
                portal: PortalId::new(0),
            },
        }]
    );
    assert_eq!(query::money(&world), money);
    assert_eq!(
        query::tower_view(&world).iter().copied().collect::<Vec<_>>(),
        towers
    );
    assert_eq!(query::tower_at(&world, cell), None);
}

#[test]
fn selling_refunds_half_of_invested_money() {
    let mut world = new_world(SimulationConfig::default());
    let _ = place(&mut world, TowerKind::Basic, CellCoord::new(3, 3));
    let tower = TowerId::new(0);

    let mut events = Vec::new();
    apply(
        &mut world,
        Command::UpgradeTower {
            tower,
            axis: UpgradeAxis::Damage,
        },
        &mut events,
    );
    assert_eq!(query::money(&world), 130);
    assert_eq!(query::tower(&world, tower).map(|t| t.invested), Some(70));

    events.clear();
    apply(&mut world, Command::SellTower { tower }, &mut events);

    assert_eq!(
        events,
        vec![
            Event::TowerSold {
                tower,
                cell: CellCoord::new(3, 3),
                refund: 35,
            },
            Event::TowerLayoutChanged,
        ]
    );
    assert_eq!(query::money(&world), 165);
    assert_eq!(query::tower_at(&world, CellCoord::new(3, 3)), None);

    events.clear();
    apply(&mut world, Command::SellTower { tower }, &mut events);
    assert_eq!(
        events,
        vec![Event::TowerSaleRejected {
            tower,
            reason: SellError::MissingTower,
        }]
    );
}

#[test]
fn upgrades_stop_at_the_level_cap() {
    let mut config = SimulationConfig::default();
    config.economy.starting_money = 10_000;
    let mut world = new_world(config);
    let _ = place(&mut world, TowerKind::Basic, CellCoord::new(6, 2));
    let tower = TowerId::new(0);

    let mut events = Vec::new();
    for _ in 0..7 {
        apply(
            &mut world,
            Command::UpgradeTower {
                tower,
                axis: UpgradeAxis::Range,
            },
            &mut events,
        );
    }

    let levels: Vec<u8> = events
        .iter()
        .filter_map(|event| match event {
            Event::TowerUpgraded { level, .. } => Some(*level),
            _ => None,
        })
        .collect();
    assert_eq!(levels, vec![2, 3, 4, 5, 6, 7]);
    assert_eq!(
        events.last(),
        Some(&Event::TowerUpgradeRejected {
            tower,
            axis: UpgradeAxis::Range,
            reason: UpgradeError::MaxLevel,
        })
    );
    assert_eq!(query::money(&world), 10_000 - 50 - (20 + 40 + 60 + 80 + 100 + 120));
}

#[test]
fn upgrade_without_funds_is_rejected() {
    let mut config = SimulationConfig::default();
    config.economy.starting_money = 150;
    let mut world = new_world(config);
    let _ = place(&mut world, TowerKind::Cannon, CellCoord::new(6, 2));

    let mut events = Vec::new();
    apply(
        &mut world,
        Command::UpgradeTower {
            tower: TowerId::new(0),
            axis: UpgradeAxis::Speed,
        },
        &mut events,
    );

    assert_eq!(
        events,
        vec![Event::TowerUpgradeRejected {
            tower: TowerId::new(0),
            axis: UpgradeAxis::Speed,
            reason: UpgradeError::InsufficientFunds,
        }]
    );
}

#[test]
fn automatic_wave_releases_every_planned_spawn() {
    let config = SimulationConfig::default();
    let first_wave = generate(&config.waves)[0].clone();
    let mut world = new_world(config);

    let mut events = Vec::new();
    for _ in 0..1_000 {
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(20),
            },
            &mut events,
        );
    }

    assert!(events.contains(&Event::WaveStarted { wave: 1 }));
    let released: Vec<EnemyKind> = events
        .iter()
        .filter_map(|event| match event {
            Event::SpawnDue { wave: 1, kind } => Some(*kind),
            _ => None,
        })
        .collect();
    let planned: Vec<EnemyKind> = first_wave.spawns().iter().map(|spawn| spawn.kind).collect();

    assert_eq!(released, planned);
    assert_eq!(query::outstanding_spawns(&world), 0);
    assert_eq!(query::game_state(&world), GameState::WaveInProgress);
}
