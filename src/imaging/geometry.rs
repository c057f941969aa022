//! Integer points and half-open rectangles.

/// A pixel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Rectangle containing points with `min.x <= x < max.x` and
/// `min.y <= y < max.y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub min: Point,
    pub max: Point,
}

impl Rect {
    pub const EMPTY: Rect = Rect {
        min: Point::ZERO,
        max: Point::ZERO,
    };

    pub const fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self {
            min: Point::new(x0, y0),
            max: Point::new(x1, y1),
        }
    }

    /// A `width` by `height` rectangle at the origin.
    pub const fn sized(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn dx(&self) -> i32 {
        self.max.x - self.min.x
    }

    pub fn dy(&self) -> i32 {
        self.max.y - self.min.y
    }

    pub fn is_empty(&self) -> bool {
        self.min.x >= self.max.x || self.min.y >= self.max.y
    }

    /// The same rectangle with `min` and `max` swapped where needed.
    pub fn canon(&self) -> Rect {
        Rect::new(
            self.min.x.min(self.max.x),
            self.min.y.min(self.max.y),
            self.min.x.max(self.max.x),
            self.min.y.max(self.max.y),
        )
    }

    /// Largest rectangle inside both; [`Rect::EMPTY`] if they do not overlap.
    pub fn intersect(&self, other: &Rect) -> Rect {
        let r = Rect::new(
            self.min.x.max(other.min.x),
            self.min.y.max(other.min.y),
            self.max.x.min(other.max.x),
            self.max.y.min(other.max.y),
        );
        if r.is_empty() {
            Rect::EMPTY
        } else {
            r
        }
    }

    /// Translate by `-p`.
    pub fn sub(&self, p: Point) -> Rect {
        Rect::new(self.min.x - p.x, self.min.y - p.y, self.max.x - p.x, self.max.y - p.y)
    }

    pub fn contains(&self, p: Point) -> bool {
        self.min.x <= p.x && p.x < self.max.x && self.min.y <= p.y && p.y < self.max.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_and_emptiness() {
        let r = Rect::new(2, 3, 10, 7);
        assert_eq!((r.dx(), r.dy()), (8, 4));
        assert!(!r.is_empty());
        assert!(Rect::new(5, 5, 5, 9).is_empty());
    }

    #[test]
    fn canon_swaps_reversed_corners() {
        assert_eq!(Rect::new(10, 7, 2, 3).canon(), Rect::new(2, 3, 10, 7));
    }

    #[test]
    fn intersect_and_sub() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, -5, 15, 5);
        assert_eq!(a.intersect(&b), Rect::new(5, 0, 10, 5));
        assert_eq!(a.intersect(&Rect::new(20, 20, 30, 30)), Rect::EMPTY);
        assert_eq!(b.sub(b.min), Rect::sized(10, 10));
    }

    #[test]
    fn contains_is_half_open() {
        let r = Rect::sized(2, 2);
        assert!(r.contains(Point::new(1, 1)));
        assert!(!r.contains(Point::new(2, 1)));
    }
}
