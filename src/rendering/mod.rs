//! # Rendering Module
//!
//! Read-only views of the world for front ends.
//!
//! [`RenderView`] captures what the player can currently see and remember:
//! tile glyphs, the visible and explored bitsets, and the visible entities in
//! drawing order. [`RenderView::to_ascii`] turns it into a plain text frame for
//! the headless binary and for tests.

pub mod ui;

pub use ui::*;

use crate::game::{Color, Position, RenderOrder, World};

/// One entity as a front end should draw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderEntity {
    pub position: Position,
    pub glyph: char,
    pub fg: Color,
    pub bg: Option<Color>,
    pub render_order: RenderOrder,
    pub name: String,
}

/// Snapshot of one floor as seen by the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderView {
    pub width: i32,
    pub height: i32,
    /// Glyph per tile, row-major
    pub tiles: Vec<char>,
    pub visible: Vec<bool>,
    pub explored: Vec<bool>,
    /// Visible entities sorted by render order, lowest first
    pub entities: Vec<RenderEntity>,
}

impl RenderView {
    /// Captures the current floor.
    ///
    /// # Examples
    ///
    /// ```
    /// use undercrawl::{GameState, RenderView};
    ///
    /// let state = GameState::new(4).unwrap();
    /// let view = RenderView::from_world(&state.world);
    /// assert!(view.entities.iter().any(|e| e.glyph == '@'));
    /// ```
    pub fn from_world(world: &World) -> Self {
        let map = &world.map;
        let positions: Vec<Position> = map.positions().collect();
        let tiles = positions
            .iter()
            .map(|&p| map.tile(p).map(|t| t.light.ch).unwrap_or(' '))
            .collect();
        let visible = positions.iter().map(|&p| map.is_visible(p)).collect();
        let explored = positions.iter().map(|&p| map.is_explored(p)).collect();

        let mut entities: Vec<RenderEntity> = world
            .entities
            .on_map()
            .filter(|e| map.is_visible(e.position))
            .map(|e| RenderEntity {
                position: e.position,
                glyph: e.appearance.glyph,
                fg: e.appearance.fg,
                bg: e.appearance.bg,
                render_order: e.render_order,
                name: e.name.clone(),
            })
            .collect();
        entities.sort_by_key(|e| e.render_order);

        Self {
            width: map.width,
            height: map.height,
            tiles,
            visible,
            explored,
            entities,
        }
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if pos.x < 0 || pos.y < 0 || pos.x >= self.width || pos.y >= self.height {
            return None;
        }
        Some((pos.y * self.width + pos.x) as usize)
    }

    /// Topmost entity glyph drawn at `pos`, if any.
    pub fn entity_glyph_at(&self, pos: Position) -> Option<char> {
        self.entities.iter().rev().find(|e| e.position == pos).map(|e| e.glyph)
    }

    /// Renders the view as text, one line per row.
    ///
    /// Unexplored tiles are blank unless `reveal_map` is set, which draws every
    /// tile as if it had been seen.
    pub fn to_ascii(&self, reveal_map: bool) -> String {
        let mut frame = String::with_capacity(((self.width + 1) * self.height.max(0)) as usize);
        for y in 0..self.height {
            for x in 0..self.width {
                let pos = Position::new(x, y);
                let Some(i) = self.index(pos) else {
                    continue;
                };
                let ch = if self.visible[i] {
                    self.entity_glyph_at(pos).unwrap_or(self.tiles[i])
                } else if self.explored[i] || reveal_map {
                    self.tiles[i]
                } else {
                    ' '
                };
                frame.push(ch);
            }
            frame.push('\n');
        }
        frame
    }
}
