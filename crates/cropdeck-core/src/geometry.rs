//! Plain geometry shared by the viewport, frame and renderer.
//!
//! All values are `f64` canvas or source pixels. The origin is the top-left
//! corner and the y axis points down.

use serde::{Deserialize, Serialize};

/// A point in canvas (or source) pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Size of a bitmap with integer dimensions.
    pub fn from_pixels(width: u32, height: u32) -> Self {
        Self::new(width as f64, height as f64)
    }

    /// Width and height swapped, as seen after a quarter turn.
    pub fn transposed(self) -> Self {
        Self::new(self.height, self.width)
    }

    /// True if either side is zero, negative or not a number.
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Axis-aligned rectangle described by its top-left corner and size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle of `size` centered on `center`.
    pub fn centered(center: Point, size: Size) -> Self {
        Self::new(
            center.x - size.width / 2.0,
            center.y - size.height / 2.0,
            size.width,
            size.height,
        )
    }

    /// Rectangle spanning two corners.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::new(x1, y1, x2 - x1, y2 - y1)
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// True for zero-area, inverted or NaN rectangles.
    pub fn is_empty(&self) -> bool {
        self.size().is_degenerate()
    }

    /// Overlap of two rectangles, or `None` when they do not overlap.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x1 = self.left().max(other.left());
        let y1 = self.top().max(other.top());
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(Rect::from_corners(x1, y1, x2, y2))
    }

    /// True if `other` lies fully inside `self`, with `epsilon` slack.
    pub fn contains_rect(&self, other: &Rect, epsilon: f64) -> bool {
        other.left() >= self.left() - epsilon
            && other.top() >= self.top() - epsilon
            && other.right() <= self.right() + epsilon
            && other.bottom() <= self.bottom() + epsilon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect() {
        let r = Rect::centered(Point::new(100.0, 50.0), Size::new(40.0, 20.0));
        assert_eq!(r, Rect::new(80.0, 40.0, 40.0, 20.0));
        assert_eq!(r.center(), Point::new(100.0, 50.0));
    }

    #[test]
    fn test_intersect_overlapping() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(50.0, 25.0, 100.0, 100.0);
        assert_eq!(a.intersect(&b), Some(Rect::new(50.0, 25.0, 50.0, 75.0)));
    }

    #[test]
    fn test_intersect_disjoint_and_touching() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(a.intersect(&Rect::new(20.0, 0.0, 5.0, 5.0)), None);
        // Shared edge has zero area
        assert_eq!(a.intersect(&Rect::new(10.0, 0.0, 5.0, 5.0)), None);
    }

    #[test]
    fn test_degenerate_sizes() {
        assert!(Size::new(0.0, 10.0).is_degenerate());
        assert!(Size::new(10.0, -1.0).is_degenerate());
        assert!(Size::new(f64::NAN, 1.0).is_degenerate());
        assert!(!Size::new(1.0, 1.0).is_degenerate());
        assert!(Rect::from_corners(10.0, 10.0, 5.0, 20.0).is_empty());
    }

    #[test]
    fn test_contains_rect() {
        let outer = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(outer.contains_rect(&Rect::new(10.0, 10.0, 80.0, 80.0), 0.0));
        assert!(outer.contains_rect(&outer, 0.0));
        assert!(!outer.contains_rect(&Rect::new(-1.0, 10.0, 50.0, 50.0), 0.0));
        assert!(outer.contains_rect(&Rect::new(-1e-10, 0.0, 100.0, 100.0), 1e-9));
    }
}
