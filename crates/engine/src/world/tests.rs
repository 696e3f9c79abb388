    use std::sync::Arc;

    use super::*;
    use crate::geometry::TileCoord;
    use crate::pixels::PixelMask;
    use crate::test_support::{grid_from_rows, open_grid, square_body};
    use crate::tiles::{KeyTile, KeyTileKind, TileUnlock, SPENT_KEY_CODE};

    const TILE: u32 = 64;
    const PLAYER_START: PixelPoint = PixelPoint::new(96, 96);

    fn frames(count: usize) -> SpriteFrames {
        Arc::from(vec![PixelMask::filled(20, 20); count])
    }

    fn enemy_sprites() -> AgentSprites {
        AgentSprites {
            walk: frames(4),
            attack: frames(3),
            death: frames(1),
        }
    }

    fn world_with(grid: TileGrid, keys: KeyRing) -> World {
        let mut config = SimConfig::default();
        config.weapons.pistol_muzzle = PixelPoint::new(0, 0);
        config.weapons.rifle_muzzle = PixelPoint::new(0, 0);
        let sprites = PlayerSprites {
            pistol_walk: frames(2),
            pistol_shot: frames(2),
            rifle_walk: frames(2),
            rifle_shot: frames(3),
            melee: frames(7),
        };
        World::new(
            config,
            grid,
            keys,
            square_body(PLAYER_START, 20),
            sprites,
            Vitals::new(100, 0),
        )
        .expect("world")
    }

    fn open_world() -> World {
        world_with(open_grid(40, 12, TILE), KeyRing::default())
    }

    fn walk_right() -> TickInput {
        TickInput {
            intent: DirectionIntent {
                right: true,
                ..DirectionIntent::default()
            },
            aim_point: PixelPoint::new(1000, 96),
            ..TickInput::default()
        }
    }

    fn aim_at(point: PixelPoint) -> TickInput {
        TickInput {
            aim_point: point,
            ..TickInput::default()
        }
    }

    /// Ticks every 20 ms from `first_ms` through `last_ms` inclusive.
    fn run(world: &mut World, first_ms: u64, last_ms: u64, input: &TickInput) -> Vec<TickReport> {
        (first_ms..=last_ms)
            .step_by(20)
            .map(|now| world.tick(now, input))
            .collect()
    }

    #[test]
    fn tick_is_gated_by_interval() {
        let mut world = open_world();
        let idle = TickInput::default();
        assert!(!world.tick(10, &idle).ticked);
        assert!(world.tick(20, &idle).ticked);
        assert!(!world.tick(35, &idle).ticked);
        assert!(world.tick(40, &idle).ticked);
        assert_eq!(world.ticks(), 2);
        assert_eq!(world.last_tick_order(), WORLD_SYSTEM_ORDER.as_slice());
    }

    #[test]
    fn player_moves_and_recentres_viewport() {
        let mut world = open_world();
        let start = world.player().body.position();
        let report = world.tick(20, &walk_right());
        assert!(report.player_moved);
        assert_eq!(world.player().body.position(), PixelPoint::new(start.x + 1, start.y));
        let expected = world
            .config()
            .viewport
            .centred_on(world.player().body.exact_centre());
        assert_eq!(*world.viewport(), expected);
    }

    #[test]
    fn door_key_unlocks_tiles_and_rebuilds_graph() {
        let grid = grid_from_rows(TILE, &["......", ".D.#..", "......"]);
        let keys = KeyRing::new(vec![KeyTile::new(
            TileCoord::new(1, 1),
            KeyTileKind::Door,
            vec![TileUnlock {
                tile: TileCoord::new(3, 1),
                new_code: 0,
            }],
        )]);
        let mut world = world_with(grid, keys);

        let report = world.tick(20, &walk_right());
        assert_eq!(report.keys_triggered, 1);
        assert!(report.graph_rebuilt);
        assert_eq!(world.graph().generation(), 1);
        assert_eq!(world.grid().code_at(TileCoord::new(3, 1)), Some(0));
        assert_eq!(
            world.grid().code_at(TileCoord::new(1, 1)),
            Some(SPENT_KEY_CODE)
        );

        let report = world.tick(40, &walk_right());
        assert_eq!(report.keys_triggered, 0);
        assert!(!report.graph_rebuilt);
    }

    #[test]
    fn progress_area_counts_only_after_main_keys() {
        let grid = grid_from_rows(TILE, &["......", ".KE...", "......"]);
        let keys = KeyRing::new(vec![KeyTile::new(
            TileCoord::new(1, 1),
            KeyTileKind::Main,
            Vec::new(),
        )]);
        let mut world = world_with(grid, keys);

        let reports = run(&mut world, 20, 800, &walk_right());
        assert!(reports[0].level_completed);
        let progressed = reports
            .iter()
            .position(|report| report.level_progressed)
            .expect("progress reached");
        assert!(progressed > 0);
        assert!(world.keys().level_complete());
    }

    #[test]
    fn touching_pickup_is_collected_and_removed() {
        let mut world = open_world();
        world.player_mut().vitals = Vitals::new(50, 0);
        let pickup = world.spawn_pickup(PickupKind::Health, square_body(PixelPoint::new(100, 96), 20));

        let report = world.tick(20, &TickInput::default());
        assert_eq!(report.pickups_collected, vec![PickupKind::Health]);
        assert_eq!(report.despawned, vec![pickup]);
        assert_eq!(world.player().vitals.health, 100);
        assert!(world.agents().is_empty());
    }

    #[test]
    fn off_screen_enemy_waits_until_spotted() {
        let mut world = open_world();
        let id = world.spawn_enemy(
            EnemyKind::Zombie,
            square_body(PixelPoint::new(2000, 96), 20),
            enemy_sprites(),
        );
        let start = world.agent(id).expect("enemy").body.position();

        let report = world.tick(20, &TickInput::default());
        assert_eq!(report.enemies_moved, 0);
        let enemy = world.agent(id).expect("enemy");
        assert!(!enemy.spotted);
        assert_eq!(enemy.body.position(), start);
    }

    #[test]
    fn visible_enemy_spots_and_closes_in() {
        let mut world = open_world();
        let id = world.spawn_enemy(
            EnemyKind::Zombie,
            square_body(PixelPoint::new(600, 96), 20),
            enemy_sprites(),
        );
        let start = world.agent(id).expect("enemy").body.position();

        let report = world.tick(20, &TickInput::default());
        assert_eq!(report.enemies_spotted, 1);
        assert_eq!(report.enemies_moved, 1);
        let enemy = world.agent(id).expect("enemy");
        assert!(enemy.spotted);
        assert!(enemy.body.position().x < start.x);
        assert_eq!(enemy.body.position().y, start.y);
    }

    #[test]
    fn enemy_swing_hits_player_once_per_cycle() {
        let mut world = open_world();
        world.spawn_enemy(
            EnemyKind::Zombie,
            square_body(PixelPoint::new(110, 96), 20),
            enemy_sprites(),
        );

        let reports = run(&mut world, 20, 120, &TickInput::default());
        let hits: Vec<HitOutcome> = reports
            .iter()
            .flat_map(|report| report.player_hits.iter().copied())
            .collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].health_lost, 15);
        assert_eq!(world.player().vitals.health, 85);
    }

    #[test]
    fn pistol_shot_kills_enemy_in_sights_then_despawns_it() {
        let mut world = open_world();
        let target = PixelPoint::new(400, 96);
        let id = world.spawn_enemy(EnemyKind::Zombie, square_body(target, 20), enemy_sprites());

        let fire = TickInput {
            fire: true,
            ..aim_at(target)
        };
        let mut reports = vec![world.tick(20, &fire)];
        assert!(world.sight_line().is_some());
        reports.extend(run(&mut world, 40, 200, &aim_at(target)));

        let shot = reports
            .iter()
            .flat_map(|report| report.shots.iter())
            .next()
            .copied()
            .expect("shot landed");
        assert_eq!(shot.target, id);
        assert_eq!(shot.source, AttackSource::Pistol);
        assert!(shot.outcome.killed);
        assert!(reports.iter().any(|report| report.despawned.contains(&id)));
        assert!(world.agent(id).is_none());
        assert!(!world.is_firing());
    }

    #[test]
    fn armoured_enemy_drops_ammo_when_despawned() {
        let mut world = open_world();
        world.register_pickup_sprites(PickupKind::Ammo, frames(1));
        let target = PixelPoint::new(400, 96);
        let id = world.spawn_enemy(EnemyKind::Armoured, square_body(target, 20), enemy_sprites());
        world.agent_mut(id).expect("enemy").vitals = Vitals::new(1, 0);

        let fire = TickInput {
            fire: true,
            ..aim_at(target)
        };
        let mut reports = vec![world.tick(20, &fire)];
        reports.extend(run(&mut world, 40, 200, &aim_at(target)));

        let dropped: Vec<AgentId> = reports
            .iter()
            .flat_map(|report| report.dropped.iter().copied())
            .collect();
        assert_eq!(dropped.len(), 1);
        let pickup = world.agent(dropped[0]).expect("dropped pickup");
        assert_eq!(pickup.kind(), AgentKind::Pickup(PickupKind::Ammo));
    }

    #[test]
    fn rifle_spends_ammo_and_stops_when_empty() {
        let mut world = open_world();
        world.player_mut().vitals.ammo = 2;
        let switch = TickInput {
            switch_weapon: true,
            ..TickInput::default()
        };
        world.tick(20, &switch);
        assert_eq!(world.weapon(), Weapon::Rifle);

        let fire = TickInput {
            fire: true,
            ..TickInput::default()
        };
        world.tick(40, &fire);
        assert!(world.is_firing());
        run(&mut world, 60, 600, &TickInput::default());
        assert_eq!(world.player().vitals.ammo, 0);
        assert!(!world.is_firing());
    }

    #[test]
    fn empty_rifle_never_fires() {
        let mut world = open_world();
        let switch_and_fire = TickInput {
            switch_weapon: true,
            fire: true,
            ..TickInput::default()
        };
        let report = world.tick(20, &switch_and_fire);
        assert!(report.shots.is_empty());
        assert!(!world.is_firing());
    }

    #[test]
    fn melee_swing_hits_touching_enemy() {
        let mut world = open_world();
        let id = world.spawn_enemy(
            EnemyKind::Zombie,
            square_body(PixelPoint::new(110, 96), 20),
            enemy_sprites(),
        );
        let swing = TickInput {
            melee: true,
            ..TickInput::default()
        };
        let mut reports = vec![world.tick(20, &swing)];
        reports.extend(run(&mut world, 40, 200, &TickInput::default()));

        let shot = reports
            .iter()
            .flat_map(|report| report.shots.iter())
            .find(|shot| shot.target == id)
            .copied()
            .expect("melee landed");
        assert_eq!(shot.source, AttackSource::Melee);
        assert!(shot.outcome.killed);
    }

    #[test]
    fn dead_player_halts_the_world() {
        let mut world = open_world();
        world.player_mut().vitals = Vitals::new(10, 0);
        assert!(world.player_mut().vitals.apply_player_hit().killed);

        let report = world.tick(20, &walk_right());
        assert!(!report.ticked);
        assert!(report.player_dead);
        assert!(world.is_game_over());
    }

    #[test]
    fn mismatched_tile_size_is_rejected() {
        let err = World::new(
            SimConfig::default(),
            open_grid(4, 4, 32),
            KeyRing::default(),
            square_body(PLAYER_START, 20),
            PlayerSprites::still(frames(1)),
            Vitals::default(),
        )
        .expect_err("tile size mismatch");
        assert!(matches!(
            err,
            WorldError::TileSizeMismatch {
                grid: 32,
                config: 64
            }
        ));
    }
