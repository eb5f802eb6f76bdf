//! Geometry primitives: rectangles, sizes and the visible viewport.

use serde::{Deserialize, Serialize};

/// Viewport information for coordinate conversion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Viewport width in CSS pixels.
    pub width: f64,
    /// Viewport height in CSS pixels.
    pub height: f64,
    /// Horizontal scroll offset of the document.
    pub scroll_x: f64,
    /// Vertical scroll offset of the document.
    pub scroll_y: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }

    /// The visible window as a rectangle in viewport coordinates.
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// Convert a viewport-relative rectangle into document coordinates.
    pub fn to_document(&self, rect: Rect) -> Rect {
        Rect::new(rect.x + self.scroll_x, rect.y + self.scroll_y, rect.width, rect.height)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

/// Width and height of a box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle.
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

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Get the center point of this rectangle.
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Shift the rectangle by the given offset.
    pub fn translate(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Check if this rectangle overlaps another.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Whether any part of the rectangle lies inside the visible window.
    ///
    /// Zero-sized boxes count as visible when their origin is inside the window.
    pub fn is_visible_in(&self, viewport: &Viewport) -> bool {
        let bounds = viewport.bounds();
        if self.width <= 0.0 || self.height <= 0.0 {
            return self.x >= 0.0 && self.x < bounds.width && self.y >= 0.0 && self.y < bounds.height;
        }
        self.intersects(&bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_edges() {
        let rect = Rect::new(10.0, 20.0, 100.0, 50.0);
        assert_eq!(rect.right(), 110.0);
        assert_eq!(rect.bottom(), 70.0);
        assert_eq!(rect.center(), (60.0, 45.0));
    }

    #[test]
    fn test_rect_intersects() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(50.0, 50.0, 100.0, 100.0);
        let c = Rect::new(200.0, 200.0, 10.0, 10.0);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_visible_in_viewport() {
        let viewport = Viewport::new(800.0, 600.0);
        assert!(Rect::new(10.0, 10.0, 50.0, 20.0).is_visible_in(&viewport));
        assert!(Rect::new(-20.0, 10.0, 50.0, 20.0).is_visible_in(&viewport));
        assert!(!Rect::new(10.0, 2000.0, 50.0, 20.0).is_visible_in(&viewport));
        assert!(!Rect::new(10.0, -100.0, 50.0, 20.0).is_visible_in(&viewport));
    }

    #[test]
    fn test_zero_sized_visibility() {
        let viewport = Viewport::new(800.0, 600.0);
        assert!(Rect::new(5.0, 5.0, 0.0, 0.0).is_visible_in(&viewport));
        assert!(!Rect::new(5.0, 900.0, 0.0, 0.0).is_visible_in(&viewport));
    }

    #[test]
    fn test_to_document_adds_scroll() {
        let viewport = Viewport {
            scroll_x: 5.0,
            scroll_y: 300.0,
            ..Viewport::default()
        };
        let rect = viewport.to_document(Rect::new(10.0, 10.0, 20.0, 20.0));
        assert_eq!(rect, Rect::new(15.0, 310.0, 20.0, 20.0));
    }
}
