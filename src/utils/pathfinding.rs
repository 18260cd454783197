//! # Pathfinding
//!
//! Weighted A* over the current floor.
//!
//! Walkable tiles cost 1 and walls are impassable. Tiles holding a
//! movement-blocking entity stay passable at a surcharge, so actors route
//! around each other when a detour exists and queue up behind each other when
//! it does not. Diagonal steps cost 3 against 2 for cardinal steps.

use crate::config::BLOCKER_PATH_COST;
use crate::game::{Direction, GameMap, Position, World};
use ::pathfinding::prelude::astar;

const CARDINAL_STEP: u32 = 2;
const DIAGONAL_STEP: u32 = 3;

/// Per-tile movement costs; 0 marks an impassable tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostField {
    width: i32,
    height: i32,
    costs: Vec<u32>,
}

impl CostField {
    /// Costs from tile walkability alone.
    pub fn new(map: &GameMap) -> Self {
        let costs = map
            .positions()
            .map(|p| u32::from(map.is_walkable(p)))
            .collect();
        Self {
            width: map.width,
            height: map.height,
            costs,
        }
    }

    /// Costs including the surcharge for blocking entities on the map.
    pub fn from_world(world: &World) -> Self {
        let mut field = Self::new(&world.map);
        for entity in world.entities.on_map().filter(|e| e.blocks_movement) {
            field.add_cost(entity.position, BLOCKER_PATH_COST);
        }
        field
    }

    fn index(&self, pos: Position) -> Option<usize> {
        (pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height)
            .then(|| (pos.y * self.width + pos.x) as usize)
    }

    pub fn cost(&self, pos: Position) -> u32 {
        self.index(pos).map(|i| self.costs[i]).unwrap_or(0)
    }

    /// Adds to a passable tile's cost. Impassable tiles stay impassable.
    pub fn add_cost(&mut self, pos: Position, extra: u32) {
        if let Some(i) = self.index(pos) {
            if self.costs[i] > 0 {
                self.costs[i] += extra;
            }
        }
    }

    /// Cheapest path from `start` to `goal`, excluding `start`.
    ///
    /// Returns an empty path when the goal is impassable or unreachable, or when
    /// `start == goal`.
    ///
    /// # Examples
    ///
    /// ```
    /// use undercrawl::{CostField, GameMap, Position};
    ///
    /// let mut map = GameMap::new(6, 3);
    /// map.carve(Position::new(1, 1), Position::new(4, 1));
    /// let path = CostField::new(&map).path(Position::new(1, 1), Position::new(4, 1));
    /// assert_eq!(path.len(), 3);
    /// assert_eq!(path.last(), Some(&Position::new(4, 1)));
    /// ```
    pub fn path(&self, start: Position, goal: Position) -> Vec<Position> {
        if start == goal || self.cost(goal) == 0 {
            return Vec::new();
        }
        let result = astar(
            &start,
            |&p| self.successors(p),
            |&p| p.chebyshev_distance(goal) as u32 * CARDINAL_STEP,
            |&p| p == goal,
        );
        match result {
            Some((mut path, _)) => {
                path.remove(0);
                path
            }
            None => Vec::new(),
        }
    }

    fn successors(&self, from: Position) -> Vec<(Position, u32)> {
        Direction::all()
            .into_iter()
            .filter_map(|direction| {
                let delta = direction.to_delta();
                let next = from + delta;
                let cost = self.cost(next);
                if cost == 0 {
                    return None;
                }
                let step = if delta.x != 0 && delta.y != 0 {
                    DIAGONAL_STEP
                } else {
                    CARDINAL_STEP
                };
                Some((next, cost * step))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{prototypes, Container, EntityArena};

    fn corridor_map() -> GameMap {
        let mut map = GameMap::new(10, 5);
        map.carve(Position::new(1, 1), Position::new(8, 3));
        map
    }

    #[test]
    fn test_path_excludes_start_and_ends_at_goal() {
        let field = CostField::new(&corridor_map());
        let path = field.path(Position::new(1, 2), Position::new(8, 2));
        assert_eq!(path.len(), 7);
        assert_eq!(path[0], Position::new(2, 2));
        assert_eq!(path.last(), Some(&Position::new(8, 2)));
    }

    #[test]
    fn test_same_inputs_same_path() {
        let mut map = GameMap::new(12, 12);
        map.carve(Position::new(1, 1), Position::new(10, 10));
        let field = CostField::new(&map);
        let first = field.path(Position::new(1, 1), Position::new(10, 7));
        assert_eq!(first, CostField::new(&map).path(Position::new(1, 1), Position::new(10, 7)));
        assert_eq!(first.len(), 9);
    }

    #[test]
    fn test_unwalkable_goal_has_no_path() {
        let field = CostField::new(&corridor_map());
        assert!(field.path(Position::new(1, 2), Position::new(0, 0)).is_empty());
        assert!(field.path(Position::new(1, 2), Position::new(1, 2)).is_empty());
    }

    #[test]
    fn test_path_detours_around_blockers() {
        let map = corridor_map();
        let mut entities = EntityArena::new();
        let player = entities
            .spawn(prototypes::player(), Container::Map, Position::new(1, 2))
            .unwrap();
        entities
            .spawn(prototypes::rat(), Container::Map, Position::new(4, 2))
            .unwrap();
        let world = World::new(map, entities, player, 0);

        let path = world.path_to(Position::new(1, 2), Position::new(8, 2));
        assert!(!path.contains(&Position::new(4, 2)));
        assert_eq!(path.last(), Some(&Position::new(8, 2)));
    }

    #[test]
    fn test_blocked_corridor_still_passable_at_cost() {
        let mut map = GameMap::new(8, 3);
        map.carve(Position::new(1, 1), Position::new(6, 1));
        let mut entities = EntityArena::new();
        let player = entities
            .spawn(prototypes::player(), Container::Map, Position::new(1, 1))
            .unwrap();
        entities
            .spawn(prototypes::rat(), Container::Map, Position::new(3, 1))
            .unwrap();
        let world = World::new(map, entities, player, 0);

        let field = CostField::from_world(&world);
        assert_eq!(field.cost(Position::new(3, 1)), 1 + BLOCKER_PATH_COST);
        let path = world.path_to(Position::new(1, 1), Position::new(6, 1));
        assert_eq!(path.len(), 5);
    }
}
