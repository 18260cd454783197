//! Property tests for floor generation and population.

use proptest::prelude::*;
use rand::{rngs::StdRng, SeedableRng};
use std::collections::HashSet;
use undercrawl::{flood_fill, DungeonGenerator, GameState, GenerationConfig, Generator, RoomType};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn generated_floors_are_connected(seed in any::<u64>(), depth in -3_i32..=0) {
        let mut config = GenerationConfig::for_testing(seed);
        config.depth = depth;
        let floor_config = config.for_depth(depth);
        let mut rng = StdRng::seed_from_u64(floor_config.seed);
        let layout = DungeonGenerator::new().generate(&floor_config, &mut rng).unwrap();

        let reachable = flood_fill(&layout.map, layout.entry_point());
        prop_assert_eq!(reachable.len(), layout.map.walkable_count(), "seed={} depth={}", seed, depth);
        prop_assert!(reachable.contains(&layout.exit_point()));

        prop_assert_eq!(layout.map.upstairs.is_some(), depth < 0);
        prop_assert_eq!(layout.map.downstairs.is_some(), depth > floor_config.final_depth);
        prop_assert_eq!(layout.rooms_of(RoomType::EntryHub).count(), 1);
        prop_assert_eq!(layout.rooms_of(RoomType::ExitHub).count(), 1);
    }

    #[test]
    fn populated_floors_never_stack_blockers(seed in any::<u64>(), depth in -3_i32..=0) {
        let mut config = GenerationConfig::for_testing(seed);
        config.depth = depth;
        let state = GameState::with_config(config).unwrap();

        let mut occupied = HashSet::new();
        for entity in state.world.entities.on_map().filter(|e| e.blocks_movement) {
            prop_assert!(state.world.map.is_walkable(entity.position), "{} sits in a wall", entity.name);
            prop_assert!(occupied.insert(entity.position), "{} shares a tile", entity.name);
        }
    }
}
