//! Property tests for level generation.

use dungeon_sim::generation::{build_level, seeding};
use dungeon_sim::{Entity, GenerationConfig, Generator, Position, RoomCorridorGenerator};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn rooms_never_overlap(seed in any::<u64>(), depth in 0u32..8) {
        let config = GenerationConfig::for_depth(depth, seed);
        let mut rng = seeding::create_rng(&config);
        let level = RoomCorridorGenerator::new().generate(&config, &mut rng).unwrap();

        let rooms = level.rooms();
        for (i, room) in rooms.iter().enumerate() {
            for other in &rooms[i + 1..] {
                prop_assert!(!room.intersects(other), "{:?} overlaps {:?}", room, other);
            }
        }
    }

    #[test]
    fn room_count_within_bounds(seed in any::<u64>(), depth in 0u32..8) {
        let config = GenerationConfig::for_depth(depth, seed);
        let mut rng = seeding::create_rng(&config);
        let level = RoomCorridorGenerator::new().generate(&config, &mut rng).unwrap();

        let count = level.rooms().len() as u32;
        prop_assert!(count >= config.min_rooms);
        prop_assert!(count <= config.max_rooms);
    }

    #[test]
    fn built_levels_are_consistent(seed in any::<u64>(), depth in 0u32..8) {
        let config = GenerationConfig::for_depth(depth, seed);
        let mut rng = seeding::create_rng(&config);
        let level = build_level(&config, Entity::player(Position::origin()), &mut rng).unwrap();

        prop_assert!(level.is_consistent());
        prop_assert_eq!(level.player().map(|p| p.position), Some(level.rooms()[0].center()));
        prop_assert!(level.exit_position().is_some());
    }

    #[test]
    fn difficulty_is_monotone(depth in 0u32..1000) {
        let now = GenerationConfig::for_depth(depth, 0);
        let next = GenerationConfig::for_depth(depth + 1, 0);

        prop_assert!(next.min_rooms >= now.min_rooms);
        prop_assert!(next.max_room_size >= now.max_room_size);
        prop_assert!(next.num_enemies >= now.num_enemies);
        prop_assert!(next.num_potions >= now.num_potions);
        prop_assert!(next.min_rooms <= 4 && next.max_room_size <= 5);
        prop_assert!(next.num_enemies <= 6 && next.num_potions <= 6);
    }
}

#[test]
fn test_seed_42_layout_is_stable() {
    let config = GenerationConfig::for_testing(42);
    let layouts: Vec<_> = (0..3)
        .map(|_| {
            let mut rng = seeding::create_rng(&config);
            RoomCorridorGenerator::new()
                .generate(&config, &mut rng)
                .unwrap()
                .rooms()
                .to_vec()
        })
        .collect();

    assert_eq!(layouts[0], layouts[1]);
    assert_eq!(layouts[1], layouts[2]);
    assert_eq!(
        (config.min_rooms, config.max_rooms, config.min_room_size, config.max_room_size),
        (3, 3, 4, 4)
    );
}

#[test]
fn test_enemy_count_caps_at_depth_ten() {
    assert_eq!(GenerationConfig::for_depth(10, 0).num_enemies, 6);
}
