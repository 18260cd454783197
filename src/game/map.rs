//! # Map Module
//!
//! Dense tile grid of a single floor together with its visibility state.
//!
//! The map knows nothing about entities. Entity queries such as
//! `get_blocking_entity_at` live on [`crate::World`], which pairs a map with the
//! entity arena.

use crate::game::{compute_fov, Color, Position};
use serde::{Deserialize, Serialize};

/// Structural kind of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    Wall,
    Floor,
    /// Always walkable, never transparent.
    Door,
    DownStairs,
    UpStairs,
}

/// How a tile is drawn in one lighting state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Glyph {
    pub ch: char,
    pub fg: Color,
    pub bg: Color,
}

impl Glyph {
    pub const fn new(ch: char, fg: Color, bg: Color) -> Self {
        Self { ch, fg, bg }
    }
}

/// One cell of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub kind: TileKind,
    pub walkable: bool,
    pub transparent: bool,
    /// Appearance while inside the field of view
    pub light: Glyph,
    /// Appearance once explored but out of view
    pub dark: Glyph,
}

impl Tile {
    /// Builds the canonical tile for a kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use undercrawl::{Tile, TileKind};
    ///
    /// let door = Tile::new(TileKind::Door);
    /// assert!(door.walkable);
    /// assert!(!door.transparent);
    /// ```
    pub fn new(kind: TileKind) -> Self {
        let (walkable, transparent, ch, lit_bg, dark_bg) = match kind {
            TileKind::Wall => (false, false, '#', Color(130, 110, 50), Color(0, 0, 100)),
            TileKind::Floor => (true, true, '.', Color(200, 180, 50), Color(50, 50, 150)),
            TileKind::Door => (true, false, '+', Color(160, 120, 60), Color(40, 40, 120)),
            TileKind::DownStairs => (true, true, '>', Color(200, 180, 50), Color(50, 50, 150)),
            TileKind::UpStairs => (true, true, '<', Color(200, 180, 50), Color(50, 50, 150)),
        };
        Self {
            kind,
            walkable,
            transparent,
            light: Glyph::new(ch, Color::WHITE, lit_bg),
            dark: Glyph::new(ch, Color::GRAY, dark_bg),
        }
    }

    pub fn wall() -> Self {
        Self::new(TileKind::Wall)
    }

    pub fn floor() -> Self {
        Self::new(TileKind::Floor)
    }

    pub fn door() -> Self {
        Self::new(TileKind::Door)
    }
}

/// Tile grid of one floor plus its visible and explored bitsets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameMap {
    pub width: i32,
    pub height: i32,
    tiles: Vec<Tile>,
    visible: Vec<bool>,
    explored: Vec<bool>,
    /// Registered location of the down staircase, if the floor has one
    pub downstairs: Option<Position>,
    /// Registered location of the up staircase, if the floor has one
    pub upstairs: Option<Position>,
}

impl GameMap {
    /// Allocates a map filled with walls; nothing is visible or explored.
    pub fn new(width: i32, height: i32) -> Self {
        let size = (width.max(0) * height.max(0)) as usize;
        Self {
            width,
            height,
            tiles: vec![Tile::wall(); size],
            visible: vec![false; size],
            explored: vec![false; size],
            downstairs: None,
            upstairs: None,
        }
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if self.in_bounds(pos) {
            Some((pos.y * self.width + pos.x) as usize)
        } else {
            None
        }
    }

    /// Returns true if the position lies inside the grid.
    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    pub fn tile(&self, pos: Position) -> Option<&Tile> {
        self.index(pos).map(|i| &self.tiles[i])
    }

    /// Replaces the tile at `pos`; out-of-bounds writes are ignored.
    pub fn set_tile(&mut self, pos: Position, tile: Tile) {
        if let Some(i) = self.index(pos) {
            self.tiles[i] = tile;
        }
    }

    pub fn is_walkable(&self, pos: Position) -> bool {
        self.tile(pos).map(|t| t.walkable).unwrap_or(false)
    }

    pub fn is_transparent(&self, pos: Position) -> bool {
        self.tile(pos).map(|t| t.transparent).unwrap_or(false)
    }

    pub fn is_visible(&self, pos: Position) -> bool {
        self.index(pos).map(|i| self.visible[i]).unwrap_or(false)
    }

    pub fn is_explored(&self, pos: Position) -> bool {
        self.index(pos).map(|i| self.explored[i]).unwrap_or(false)
    }

    /// Marks a tile explored without making it visible.
    pub fn mark_explored(&mut self, pos: Position) {
        if let Some(i) = self.index(pos) {
            self.explored[i] = true;
        }
    }

    /// Recomputes the visible set from `origin` and folds it into the explored set.
    ///
    /// Visibility depends only on tile transparency. Explored never shrinks.
    pub fn compute_fov(&mut self, origin: Position, radius: i32) {
        let visible = compute_fov(origin, radius, self.width, self.height, |p| {
            self.is_transparent(p)
        });
        for (i, seen) in visible.into_iter().enumerate() {
            self.visible[i] = seen;
            if seen {
                self.explored[i] = true;
            }
        }
    }

    /// Clears the visible set, keeping explored tiles.
    pub fn clear_visible(&mut self) {
        self.visible.iter_mut().for_each(|v| *v = false);
    }

    /// Iterates every position of the grid in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| Position::new(x, y)))
    }

    pub fn walkable_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.walkable).count()
    }

    pub fn visible_count(&self) -> usize {
        self.visible.iter().filter(|v| **v).count()
    }

    pub fn explored_count(&self) -> usize {
        self.explored.iter().filter(|v| **v).count()
    }

    /// Carves a floor rectangle given inclusive corners, clipped to the grid.
    pub fn carve(&mut self, top_left: Position, bottom_right: Position) {
        for y in top_left.y..=bottom_right.y {
            for x in top_left.x..=bottom_right.x {
                self.set_tile(Position::new(x, y), Tile::floor());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_map_is_all_walls() {
        let map = GameMap::new(10, 6);
        assert_eq!(map.walkable_count(), 0);
        assert_eq!(map.visible_count(), 0);
        assert_eq!(map.explored_count(), 0);
        assert!(map.positions().all(|p| map.tile(p).map(|t| t.kind) == Some(TileKind::Wall)));
    }

    #[test]
    fn test_bounds() {
        let map = GameMap::new(10, 6);
        assert!(map.in_bounds(Position::new(0, 0)));
        assert!(map.in_bounds(Position::new(9, 5)));
        assert!(!map.in_bounds(Position::new(10, 5)));
        assert!(!map.in_bounds(Position::new(-1, 0)));
        assert!(map.tile(Position::new(20, 20)).is_none());
        assert!(!map.is_walkable(Position::new(-3, 2)));
    }

    #[test]
    fn test_door_blocks_sight_but_not_movement() {
        let mut map = GameMap::new(5, 5);
        map.set_tile(Position::new(2, 2), Tile::door());
        assert!(map.is_walkable(Position::new(2, 2)));
        assert!(!map.is_transparent(Position::new(2, 2)));
    }

    #[test]
    fn test_explored_is_monotonic() {
        let mut map = GameMap::new(20, 5);
        map.carve(Position::new(1, 1), Position::new(18, 3));

        map.compute_fov(Position::new(2, 2), 4);
        assert!(map.is_visible(Position::new(4, 2)));
        assert!(!map.is_visible(Position::new(15, 2)));
        let explored_before = map.explored_count();

        map.compute_fov(Position::new(16, 2), 4);
        assert!(!map.is_visible(Position::new(4, 2)));
        assert!(map.is_explored(Position::new(4, 2)));
        assert!(map.explored_count() > explored_before);
    }
}
