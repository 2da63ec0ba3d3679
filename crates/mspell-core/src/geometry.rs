//! Grid coordinates, distances and line tracing
//!
//! Pure arithmetic only. Whether a grid blocks sight or projections is the
//! world's business (see [`crate::world::Geometry`]); the functions here only
//! enumerate candidate grids.

use serde::{Deserialize, Serialize};

/// Maximum reach of any projected ability, in grids.
pub const MAX_RANGE: u32 = 18;

/// Largest range any configuration may ask for.
pub const RANGE_LIMIT: u32 = MAX_RANGE * 4;

/// A grid position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Dungeon distance: the long axis plus half the short axis.
    pub fn distance(self, other: Point) -> u32 {
        let dx = (self.x - other.x).unsigned_abs();
        let dy = (self.y - other.y).unsigned_abs();
        if dy > dx { dy + dx / 2 } else { dx + dy / 2 }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }

    /// The eight neighbours, clockwise from north.
    pub fn neighbours(self) -> [Point; 8] {
        [
            self.offset(0, -1),
            self.offset(1, -1),
            self.offset(1, 0),
            self.offset(1, 1),
            self.offset(0, 1),
            self.offset(-1, 1),
            self.offset(-1, 0),
            self.offset(-1, -1),
        ]
    }
}

/// Trace a straight line from `from` toward `to`.
///
/// The origin is excluded. The line stops at `to` unless `past_target` is
/// set, in which case it continues along the same slope until it leaves
/// `range`. Grids farther than `range` from the origin are never returned.
pub fn line_path(from: Point, to: Point, range: u32, past_target: bool) -> Vec<Point> {
    let mut path = Vec::new();
    if from == to {
        return path;
    }
    let range = range.min(RANGE_LIMIT);

    let (vx, vy) = (to.x - from.x, to.y - from.y);
    let end = if past_target {
        let span = vx.abs().max(vy.abs()).max(1);
        let k = range as i32 / span + 1;
        Point::new(from.x + vx * k, from.y + vy * k)
    } else {
        to
    };

    // Bresenham
    let dx = (end.x - from.x).abs();
    let dy = (end.y - from.y).abs();
    let sx = if from.x < end.x { 1 } else { -1 };
    let sy = if from.y < end.y { 1 } else { -1 };
    let mut err = dx - dy;
    let (mut x, mut y) = (from.x, from.y);

    while x != end.x || y != end.y {
        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            x += sx;
        }
        if e2 < dx {
            err += dx;
            y += sy;
        }

        let p = Point::new(x, y);
        if from.distance(p) > range {
            break;
        }
        path.push(p);
        if !past_target && p == to {
            break;
        }
    }

    path
}

/// Every grid within `radius` of `center`, center first.
pub fn disc(center: Point, radius: u32) -> Vec<Point> {
    let r = radius as i32;
    let mut cells = vec![center];
    for y in (center.y - r)..=(center.y + r) {
        for x in (center.x - r)..=(center.x + r) {
            let p = Point::new(x, y);
            if p != center && center.distance(p) <= radius {
                cells.push(p);
            }
        }
    }
    cells
}

/// Grids covered by a cone fanning out from `origin` toward `target`.
///
/// The cone is a thin line at the origin and reaches its full half-width of
/// `radius` at the target; the disc of `radius` around the target is always
/// included. No blocking is applied.
pub fn cone(origin: Point, target: Point, radius: u32) -> Vec<Point> {
    let reach = origin.distance(target).max(1);
    let (vx, vy) = ((target.x - origin.x) as f64, (target.y - origin.y) as f64);
    let len = (vx * vx + vy * vy).sqrt().max(1.0);
    let outer = (reach + radius) as i32;

    let mut cells = Vec::new();
    for y in (origin.y - outer)..=(origin.y + outer) {
        for x in (origin.x - outer)..=(origin.x + outer) {
            let p = Point::new(x, y);
            if p == origin {
                continue;
            }
            if target.distance(p) <= radius {
                cells.push(p);
                continue;
            }
            let along = origin.distance(p);
            if along > reach {
                continue;
            }
            let (wx, wy) = ((p.x - origin.x) as f64, (p.y - origin.y) as f64);
            if vx * wx + vy * wy <= 0.0 {
                continue;
            }
            let offset = (vx * wy - vy * wx).abs() / len;
            let allowed = radius as f64 * along as f64 / reach as f64 + 0.5;
            if offset <= allowed {
                cells.push(p);
            }
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_long_axis_plus_half() {
        let a = Point::new(0, 0);
        assert_eq!(a.distance(Point::new(4, 0)), 4);
        assert_eq!(a.distance(Point::new(4, 2)), 5);
        assert_eq!(a.distance(Point::new(1, 5)), 5);
        assert_eq!(a.distance(a), 0);
    }

    #[test]
    fn test_line_path_stops_at_target() {
        let path = line_path(Point::new(0, 0), Point::new(5, 0), MAX_RANGE, false);
        assert_eq!(path.len(), 5);
        assert_eq!(path.last(), Some(&Point::new(5, 0)));
        assert!(!path.contains(&Point::new(0, 0)));
    }

    #[test]
    fn test_line_path_past_target_keeps_slope() {
        let path = line_path(Point::new(0, 0), Point::new(2, 1), 10, true);
        assert!(path.contains(&Point::new(2, 1)));
        assert!(path.contains(&Point::new(4, 2)));
        assert!(path.iter().all(|p| Point::new(0, 0).distance(*p) <= 10));
    }

    #[test]
    fn test_line_path_respects_range() {
        let path = line_path(Point::new(0, 0), Point::new(30, 0), 18, false);
        assert_eq!(path.len(), 18);
    }

    #[test]
    fn test_huge_range_is_capped() {
        let path = line_path(Point::new(0, 0), Point::new(3, 1), u32::MAX, true);
        assert!(!path.is_empty());
        assert!(path.iter().all(|p| Point::new(0, 0).distance(*p) <= RANGE_LIMIT));
    }

    #[test]
    fn test_disc_contains_center_and_rim() {
        let cells = disc(Point::new(5, 5), 2);
        assert_eq!(cells[0], Point::new(5, 5));
        assert!(cells.contains(&Point::new(7, 5)));
        assert!(!cells.contains(&Point::new(8, 5)));
    }

    #[test]
    fn test_cone_widens_toward_target() {
        let origin = Point::new(0, 10);
        let target = Point::new(8, 10);
        let cells = cone(origin, target, 2);
        assert!(cells.contains(&Point::new(1, 10)));
        assert!(!cells.contains(&Point::new(1, 13)));
        assert!(cells.contains(&Point::new(8, 12)));
        assert!(!cells.contains(&Point::new(-2, 10)));
    }
}
