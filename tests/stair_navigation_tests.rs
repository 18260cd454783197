//! Integration tests for moving between floors and reaching the way out.

use undercrawl::game::prototypes;
use undercrawl::{
    Action, Container, GameCompletionState, GameState, GenerationConfig, Interactable, Position,
    UndercrawlResult,
};

fn new_run(seed: u64) -> GameState {
    GameState::with_config(GenerationConfig::for_testing(seed)).expect("Failed to start run")
}

fn stand_on(state: &mut GameState, pos: Position) {
    let player = state.world.player;
    state.world.entities.set_position(player, pos);
    state.refresh_fov();
}

fn floor_contents(state: &GameState) -> Vec<(String, Position)> {
    let player = state.world.player;
    let mut contents: Vec<(String, Position)> = state
        .world
        .entities
        .on_map()
        .filter(|e| e.id != player)
        .map(|e| (e.name.clone(), e.position))
        .collect();
    contents.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
    contents
}

#[test]
fn test_stairs_round_trip() {
    let mut state = new_run(98765);
    let down = state.world.map.downstairs.expect("Surface should have stairs down");
    stand_on(&mut state, down);

    assert!(state.handle_action(Action::TakeStairs));
    assert_eq!(state.world.floor, -1);
    let up = state.world.map.upstairs.expect("Floor -1 should have stairs up");
    assert_eq!(state.world.player_position(), Some(up));
    assert!(state.message_log.contains("You descend the staircase."));
    assert_eq!(state.statistics.deepest_floor, -1);

    assert!(state.handle_action(Action::TakeStairs));
    assert_eq!(state.world.floor, 0);
    assert_eq!(state.world.player_position(), state.world.map.downstairs);
    assert!(state.message_log.contains("You ascend the staircase."));
}

#[test]
fn test_stairs_elsewhere_are_impossible() {
    let mut state = new_run(11);
    let turn = state.turn_number;
    assert!(!state.handle_action(Action::TakeStairs));
    assert_eq!(state.turn_number, turn);
    assert!(state.message_log.contains("There are no stairs here."));
}

#[test]
fn test_revisited_floor_is_regenerated_identically() -> UndercrawlResult<()> {
    let mut state = new_run(4242);
    state.descend()?;
    let first_map = state.world.map.clone();

    state.ascend()?;
    state.descend()?;
    assert_eq!(state.world.map, first_map);
    assert!(floor_contents(&state).iter().all(|(name, _)| name != "broken sword"));
    Ok(())
}

#[test]
fn test_equipment_tier_is_handed_out_once() -> UndercrawlResult<()> {
    let mut state = new_run(4242);
    let player = state.world.player;
    state.descend()?;
    assert_eq!(floor_contents(&state).iter().filter(|(n, _)| n == "broken sword").count(), 1);

    let sword = state
        .world
        .items()
        .find(|e| e.name == "broken sword")
        .map(|e| e.id)
        .expect("Floor -1 stocks its equipment tier");
    state.world.entities.place(sword, Container::Inventory(player), Position::origin())?;
    state.ascend()?;
    state.descend()?;
    assert!(floor_contents(&state).iter().all(|(n, _)| n != "broken sword"));
    let carried_swords = state
        .world
        .carried_by(player)
        .into_iter()
        .filter(|&id| state.world.entities.get(id).map(|e| e.name == "broken sword").unwrap_or(false))
        .count();
    assert_eq!(carried_swords, 1);
    Ok(())
}

#[test]
fn test_surface_guide_does_not_return() -> UndercrawlResult<()> {
    let mut state = new_run(77);
    assert_eq!(floor_contents(&state).iter().filter(|(n, _)| n == "ragged old man").count(), 1);
    state.descend()?;
    state.ascend()?;
    assert!(floor_contents(&state).iter().all(|(n, _)| n != "ragged old man" && n != "mysterious egg"));
    assert!(state.fixed_content.guide_placed);
    Ok(())
}

#[test]
fn test_petted_rat_follows_downstairs() -> UndercrawlResult<()> {
    let mut state = new_run(12);
    let player = state.world.player;
    let here = state.world.player_position().unwrap();
    let spot = here
        .adjacent_positions()
        .into_iter()
        .find(|&p| state.world.is_free(p))
        .expect("Room next to the player");
    let rat = state.world.entities.spawn(prototypes::rat(), Container::Map, spot)?;

    let pet = state
        .world
        .available_interactables(rat, player)
        .into_iter()
        .find(|i| matches!(i, Interactable::Pet { .. }))
        .expect("A calm rat can be petted");
    assert!(state.handle_action(Action::Interact {
        owner: rat,
        interactable: pet,
        target: None,
    }));
    assert!(state.world.entities.actor(rat).unwrap().companion);

    state.descend()?;
    let landing = state.world.player_position().unwrap();
    let rat_entity = state.world.entities.get(rat).expect("The rat came along");
    assert!(rat_entity.is_alive_actor());
    assert!(rat_entity.is_on_map());
    assert_ne!(rat_entity.position, landing);
    assert!(rat_entity.position.chebyshev_distance(landing) <= 4);

    let mut occupied = std::collections::HashSet::new();
    for entity in state.world.entities.on_map().filter(|e| e.blocks_movement) {
        assert!(occupied.insert(entity.position), "{} shares a tile", entity.name);
    }
    Ok(())
}

#[test]
fn test_inventory_survives_floor_change() -> UndercrawlResult<()> {
    let mut state = new_run(7);
    let player = state.world.player;
    let food = state.world.entities.spawn(
        prototypes::food_ration(),
        Container::Inventory(player),
        Position::origin(),
    )?;
    state.descend()?;
    let actor = state.world.entities.actor(player).unwrap();
    assert!(actor.inventory.contains(food));
    assert!(state.world.entities.get(food).is_some());
    Ok(())
}

#[test]
fn test_no_way_up_from_surface_or_down_from_bottom() -> UndercrawlResult<()> {
    let mut state = new_run(21);
    assert!(state.ascend().unwrap_err().is_impossible());

    let mut config = GenerationConfig::for_testing(21);
    config.depth = config.final_depth;
    let mut bottom = GameState::with_config(config)?;
    assert!(bottom.world.map.downstairs.is_none());
    let err = bottom.descend().unwrap_err();
    assert_eq!(err.to_string(), "There is no way further down.");
    Ok(())
}

#[test]
fn test_gate_with_key_wins_the_run() -> UndercrawlResult<()> {
    let mut config = GenerationConfig::for_testing(31);
    config.depth = config.final_depth;
    let mut state = GameState::with_config(config)?;

    let gate = state
        .world
        .entities
        .on_map()
        .find(|e| e.name == "sealed gate")
        .map(|e| (e.id, e.position))
        .expect("Final floor should have the gate");
    stand_on(&mut state, gate.1 - Position::new(1, 0));

    let open = Action::Interact {
        owner: gate.0,
        interactable: Interactable::Open,
        target: None,
    };
    assert!(!state.handle_action(open.clone()));
    assert!(state.message_log.contains("You need a key to open this."));

    let player = state.world.player;
    state
        .world
        .entities
        .spawn(prototypes::rusty_key(), Container::Inventory(player), Position::origin())?;
    assert!(state.handle_action(open));
    assert_eq!(state.completion_state, GameCompletionState::Won);
    assert!(!state.is_running());
    Ok(())
}
