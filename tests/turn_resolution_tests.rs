//! Integration tests for scripted play and long autopilot runs.

use std::collections::HashMap;
use undercrawl::game::prototypes;
use undercrawl::{
    parse_inputs, AutoexploreState, Container, EntityArena, GameMap, GameState, GenerationConfig,
    InputHandler, InputOutcome, MessageTag, Position, World,
};

fn hall() -> GameState {
    let mut map = GameMap::new(20, 9);
    map.carve(Position::new(1, 1), Position::new(18, 7));
    let mut entities = EntityArena::new();
    let player = entities
        .spawn(prototypes::player(), Container::Map, Position::new(3, 4))
        .unwrap();
    GameState::from_world(World::new(map, entities, player, -1), 77)
}

fn play(state: &mut GameState, script: &str) -> Vec<InputOutcome> {
    let handler = InputHandler::new();
    parse_inputs(script, &handler)
        .unwrap()
        .into_iter()
        .map(|input| handler.handle(input, state))
        .collect()
}

/// No two movement-blocking entities may share a tile.
fn assert_no_stacked_blockers(state: &GameState) {
    let mut seen: HashMap<Position, String> = HashMap::new();
    for entity in state.world.entities.on_map().filter(|e| e.blocks_movement) {
        if let Some(other) = seen.insert(entity.position, entity.name.clone()) {
            panic!("{} and {} share {}", other, entity.name, entity.position);
        }
    }
}

#[test]
fn test_scripted_walk() {
    let mut state = hall();
    let outcomes = play(&mut state, "3l2j");
    assert!(outcomes.iter().all(|&o| o == InputOutcome::TurnTaken));
    assert_eq!(state.world.player_position(), Some(Position::new(6, 6)));
    assert_eq!(state.turn_number, 5);
    assert_eq!(state.statistics.steps_taken, 5);
}

#[test]
fn test_blocked_moves_cost_nothing() {
    let mut state = hall();
    let outcomes = play(&mut state, "4k");
    assert_eq!(
        outcomes,
        vec![
            InputOutcome::TurnTaken,
            InputOutcome::TurnTaken,
            InputOutcome::TurnTaken,
            InputOutcome::NoTurn,
        ]
    );
    assert_eq!(state.turn_number, 3);
    assert_eq!(state.message_log.last().unwrap().tag, MessageTag::Impossible);
}

#[test]
fn test_fighting_a_rat_to_the_death() {
    let mut state = hall();
    let rat = state
        .world
        .entities
        .spawn(prototypes::rat(), Container::Map, Position::new(4, 4))
        .unwrap();
    state.world.entities.actor_mut(rat).unwrap().turn_hostile();
    for _ in 0..50 {
        if !state.world.entities.get(rat).map(|e| e.is_alive_actor()).unwrap_or(false) {
            break;
        }
        play(&mut state, "l");
    }
    let remains = state.world.entities.get(rat).unwrap();
    assert!(!remains.is_alive_actor());
    assert!(remains.name.starts_with("remains of"));
    assert!(!remains.blocks_movement);
    assert_eq!(state.statistics.total_kills(), 1);
}

#[test]
fn test_autopilot_soak() {
    for seed in [1, 2, 3] {
        let mut state = GameState::with_config(GenerationConfig::for_testing(seed)).unwrap();
        let mut autoexplore = AutoexploreState::new();
        for _ in 0..400 {
            let Some(action) = autoexplore.next_action(&state) else {
                break;
            };
            state.handle_action(action);
            assert_no_stacked_blockers(&state);

            let player = state.world.entities.actor(state.world.player).unwrap();
            assert!(player.fighter.hp() <= player.fighter.max_hp());
        }
        assert!(state.statistics.turns_taken <= state.turn_number);
        assert!(state.world.floor <= 0);
        assert!(state.world.floor >= state.config.final_depth);
    }
}
