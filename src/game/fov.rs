//! # Field of View
//!
//! Symmetric shadowcasting over an opacity callback.
//!
//! Each quadrant is scanned row by row outward from the origin while the open
//! interval of slopes narrows around opaque tiles. Slopes are kept as exact
//! fractions so results are deterministic and symmetric: if `a` sees `b` on an
//! open floor then `b` sees `a`. Opaque tiles bordering the lit area are revealed
//! so walls are drawn, and positions outside the grid count as opaque.

use crate::game::Position;
use std::cmp::Ordering;

/// Computes the visible set around `origin` as a row-major `width * height` bitset.
///
/// Only tiles within the circle `dx² + dy² <= radius²` are revealed.
///
/// # Examples
///
/// ```
/// use undercrawl::{compute_fov, Position};
///
/// // Open 5x5 room: everything within radius 2 of the center is lit.
/// let visible = compute_fov(Position::new(2, 2), 2, 5, 5, |_| true);
/// assert!(visible[2 * 5 + 2]);
/// assert!(visible[2 * 5 + 4]);
/// assert!(!visible[0]); // the corner is outside the circle
/// ```
pub fn compute_fov<F>(origin: Position, radius: i32, width: i32, height: i32, is_transparent: F) -> Vec<bool>
where
    F: Fn(Position) -> bool,
{
    let size = (width.max(0) * height.max(0)) as usize;
    let mut visible = vec![false; size];
    let in_bounds = |p: Position| p.x >= 0 && p.y >= 0 && p.x < width && p.y < height;
    if !in_bounds(origin) {
        return visible;
    }

    let mut caster = Caster {
        origin,
        radius: radius.max(0),
        width,
        visible: &mut visible,
        is_opaque: &|p: Position| !in_bounds(p) || !is_transparent(p),
        in_bounds: &in_bounds,
    };
    caster.reveal(origin);

    for quadrant in Quadrant::ALL {
        caster.scan(quadrant, Row::new(1, Slope::new(-1, 1), Slope::new(1, 1)));
    }

    visible
}

/// Exact rational slope `num / den` with a positive denominator.
#[derive(Debug, Clone, Copy)]
struct Slope {
    num: i64,
    den: i64,
}

impl Slope {
    fn new(num: i64, den: i64) -> Self {
        if den < 0 {
            Self { num: -num, den: -den }
        } else {
            Self { num, den }
        }
    }

    /// Slope of the edge of the tile at `col` in a row at `depth`.
    fn of_tile(depth: i64, col: i64) -> Self {
        Self::new(2 * col - 1, 2 * depth)
    }

    fn cmp_value(self, other: Slope) -> Ordering {
        (self.num * other.den).cmp(&(other.num * self.den))
    }
}

/// `floor(depth * slope + 0.5)`
fn round_ties_up(depth: i64, slope: Slope) -> i64 {
    (2 * depth * slope.num + slope.den).div_euclid(2 * slope.den)
}

/// `ceil(depth * slope - 0.5)`
fn round_ties_down(depth: i64, slope: Slope) -> i64 {
    -((slope.den - 2 * depth * slope.num).div_euclid(2 * slope.den))
}

#[derive(Debug, Clone, Copy)]
enum Quadrant {
    North,
    East,
    South,
    West,
}

impl Quadrant {
    const ALL: [Quadrant; 4] = [Quadrant::North, Quadrant::East, Quadrant::South, Quadrant::West];

    fn transform(self, origin: Position, depth: i64, col: i64) -> Position {
        let (depth, col) = (depth as i32, col as i32);
        match self {
            Quadrant::North => Position::new(origin.x + col, origin.y - depth),
            Quadrant::South => Position::new(origin.x + col, origin.y + depth),
            Quadrant::East => Position::new(origin.x + depth, origin.y + col),
            Quadrant::West => Position::new(origin.x - depth, origin.y + col),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Row {
    depth: i64,
    start: Slope,
    end: Slope,
}

impl Row {
    fn new(depth: i64, start: Slope, end: Slope) -> Self {
        Self { depth, start, end }
    }

    fn columns(&self) -> std::ops::RangeInclusive<i64> {
        round_ties_up(self.depth, self.start)..=round_ties_down(self.depth, self.end)
    }

    fn next(&self) -> Row {
        Row::new(self.depth + 1, self.start, self.end)
    }

    fn is_symmetric(&self, col: i64) -> bool {
        let col = Slope::new(col, 1);
        let depth_start = Slope::new(self.depth * self.start.num, self.start.den);
        let depth_end = Slope::new(self.depth * self.end.num, self.end.den);
        col.cmp_value(depth_start) != Ordering::Less && col.cmp_value(depth_end) != Ordering::Greater
    }
}

struct Caster<'a> {
    origin: Position,
    radius: i32,
    width: i32,
    visible: &'a mut Vec<bool>,
    is_opaque: &'a dyn Fn(Position) -> bool,
    in_bounds: &'a dyn Fn(Position) -> bool,
}

impl Caster<'_> {
    fn reveal(&mut self, pos: Position) {
        if (self.in_bounds)(pos) && pos.distance_squared(self.origin) <= self.radius * self.radius {
            self.visible[(pos.y * self.width + pos.x) as usize] = true;
        }
    }

    fn scan(&mut self, quadrant: Quadrant, mut row: Row) {
        if row.depth > self.radius as i64 {
            return;
        }

        let mut prev_opaque: Option<bool> = None;
        for col in row.columns() {
            let pos = quadrant.transform(self.origin, row.depth, col);
            let opaque = (self.is_opaque)(pos);

            if opaque || row.is_symmetric(col) {
                self.reveal(pos);
            }
            if prev_opaque == Some(true) && !opaque {
                row.start = Slope::of_tile(row.depth, col);
            }
            if prev_opaque == Some(false) && opaque {
                let mut next = row.next();
                next.end = Slope::of_tile(row.depth, col);
                self.scan(quadrant, next);
            }
            prev_opaque = Some(opaque);
        }

        if prev_opaque == Some(false) {
            self.scan(quadrant, row.next());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn visible_set(
        origin: Position,
        radius: i32,
        walls: &HashSet<Position>,
        size: (i32, i32),
    ) -> HashSet<Position> {
        let (w, h) = size;
        let bits = compute_fov(origin, radius, w, h, |p| !walls.contains(&p));
        (0..h)
            .flat_map(|y| (0..w).map(move |x| Position::new(x, y)))
            .filter(|p| bits[(p.y * w + p.x) as usize])
            .collect()
    }

    #[test]
    fn test_rounding_helpers() {
        // depth 1, slope -1: columns start at -1
        assert_eq!(round_ties_up(1, Slope::new(-1, 1)), -1);
        assert_eq!(round_ties_down(1, Slope::new(1, 1)), 1);
        // 0.5 rounds up for the start and down for the end
        assert_eq!(round_ties_up(1, Slope::new(1, 2)), 1);
        assert_eq!(round_ties_down(1, Slope::new(1, 2)), 0);
    }

    #[test]
    fn test_origin_always_visible() {
        let walls = HashSet::new();
        let seen = visible_set(Position::new(3, 3), 0, &walls, (7, 7));
        assert_eq!(seen.len(), 1);
        assert!(seen.contains(&Position::new(3, 3)));
    }

    #[test]
    fn test_wall_casts_shadow_and_is_lit() {
        let walls: HashSet<Position> = [Position::new(5, 3)].into_iter().collect();
        let seen = visible_set(Position::new(3, 3), 6, &walls, (12, 7));
        assert!(seen.contains(&Position::new(5, 3)));
        assert!(!seen.contains(&Position::new(6, 3)));
        assert!(!seen.contains(&Position::new(8, 3)));
        assert!(seen.contains(&Position::new(6, 1)));
    }

    #[test]
    fn test_radius_limits_sight() {
        let walls = HashSet::new();
        let seen = visible_set(Position::new(10, 10), 3, &walls, (21, 21));
        assert!(seen.contains(&Position::new(13, 10)));
        assert!(!seen.contains(&Position::new(14, 10)));
        assert!(!seen.contains(&Position::new(13, 13)));
        assert!(seen.iter().all(|p| p.distance_squared(Position::new(10, 10)) <= 9));
    }

    #[test]
    fn test_symmetry_on_open_floor_with_pillars() {
        let walls: HashSet<Position> = [(4, 4), (7, 3), (6, 7), (9, 6)]
            .into_iter()
            .map(|(x, y)| Position::new(x, y))
            .collect();
        let size = (13, 11);
        let floors: Vec<Position> = (0..size.1)
            .flat_map(|y| (0..size.0).map(move |x| Position::new(x, y)))
            .filter(|p| !walls.contains(p))
            .collect();

        for &a in &floors {
            let from_a = visible_set(a, 20, &walls, size);
            for &b in &floors {
                if from_a.contains(&b) {
                    let from_b = visible_set(b, 20, &walls, size);
                    assert!(from_b.contains(&a), "{} sees {} but not back", a, b);
                }
            }
        }
    }

    #[test]
    fn test_origin_outside_grid_sees_nothing() {
        let bits = compute_fov(Position::new(-1, 0), 5, 4, 4, |_| true);
        assert!(bits.iter().all(|v| !v));
    }
}
