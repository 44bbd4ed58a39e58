use duel_defence_core::{Command, Event, PlacementError, Point, Side, TowerTypeRecord, UnitTypeRecord};
use duel_defence_world::{self as world, query, Catalog, MatchConfig, World};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const KINDS: [&str; 2] = ["normal", "heavy"];

fn rich_world() -> World {
    let catalog = Catalog::from_records(
        &[
            TowerTypeRecord {
                name: "normal".to_owned(),
                extent: [2, 2],
                health: 100,
                damage_per_second: 10.0,
                range: 3,
                cost: 50,
            },
            TowerTypeRecord {
                name: "heavy".to_owned(),
                extent: [3, 3],
                health: 250,
                damage_per_second: 25.0,
                range: 5,
                cost: 120,
            },
        ],
        &[UnitTypeRecord {
            name: "grunt".to_owned(),
            ms_per_move: 100,
            health: 100,
            damage_per_second: 1.0,
            cost: 10,
        }],
    )
    .expect("valid catalog");
    let config = MatchConfig {
        starting_money: 1_000_000,
        ..MatchConfig::default()
    };
    let mut world = World::new(&config, catalog).expect("valid config");
    let mut events = Vec::new();
    world::apply(&mut world, Command::OpenConstruction, &mut events);
    world
}

fn routes_exist(world: &World) -> bool {
    let board = query::board(world);
    let spawners = board.spawners().expect("spawners created");
    let top = spawners.get(Side::Top);
    let bottom = spawners.get(Side::Bottom);
    !board.find_path(top, bottom, &[]).is_empty() && !board.find_path(bottom, top, &[]).is_empty()
}

#[test]
fn accepted_placements_never_seal_the_board() {
    let mut world = rich_world();
    let mut rng = ChaCha8Rng::seed_from_u64(0x5eed_d0e1);
    let mut accepted = 0;
    let mut blocked = 0;

    for attempt in 0..1_500 {
        let side = Side::ALL[attempt % 2];
        let kind = KINDS[rng.gen_range(0..KINDS.len())];
        let origin = Point::new(rng.gen_range(0..25), rng.gen_range(0..33));
        let mut events = Vec::new();

        world::apply(
            &mut world,
            Command::PlaceTower {
                side,
                kind: kind.to_owned(),
                origin,
            },
            &mut events,
        );

        match events.first() {
            Some(Event::TowerPlaced { .. }) => accepted += 1,
            Some(Event::TowerPlacementRejected {
                reason: PlacementError::BlocksPath,
                ..
            }) => blocked += 1,
            _ => {}
        }
        assert!(routes_exist(&world), "attempt {attempt} sealed the board");
    }

    assert!(accepted > 20, "only {accepted} placements were accepted");
    assert!(blocked > 0, "the board never came close to being sealed");
}

#[test]
fn spending_is_symmetric_with_refunds() {
    let mut world = rich_world();
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let start = query::money(&world, Side::Top);

    for _ in 0..200 {
        let origin = Point::new(rng.gen_range(0..25), rng.gen_range(0..16));
        let mut events = Vec::new();
        world::apply(
            &mut world,
            Command::PlaceTower {
                side: Side::Top,
                kind: KINDS[rng.gen_range(0..KINDS.len())].to_owned(),
                origin,
            },
            &mut events,
        );
    }

    let live: Vec<_> = query::towers(&world).map(|tower| tower.id()).collect();
    assert!(!live.is_empty());
    for tower in live {
        let mut events = Vec::new();
        world::apply(&mut world, Command::RemoveTower { side: Side::Top, tower }, &mut events);
        assert!(matches!(events.first(), Some(Event::TowerRemoved { .. })));
    }

    assert_eq!(query::money(&world, Side::Top), start);
    assert!(query::board(&world)
        .cells()
        .iter()
        .all(|cell| cell.is_walkable()));
}

#[test]
fn identifiers_increase_even_after_removals() {
    let mut world = rich_world();
    let mut placed = Vec::new();

    for x in [0, 4, 8, 0, 4] {
        let mut events = Vec::new();
        world::apply(
            &mut world,
            Command::PlaceTower {
                side: Side::Top,
                kind: "normal".to_owned(),
                origin: Point::new(x, 2),
            },
            &mut events,
        );
        if let Some(Event::TowerPlaced { tower, .. }) = events.first() {
            placed.push(*tower);
            if x == 0 || x == 4 {
                let mut removal = Vec::new();
                world::apply(
                    &mut world,
                    Command::RemoveTower {
                        side: Side::Top,
                        tower: *tower,
                    },
                    &mut removal,
                );
            }
        }
    }

    assert_eq!(placed.len(), 5);
    assert!(placed.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(query::match_state(&world).towers.len(), 5);
}
