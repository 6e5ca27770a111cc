use serde::{Deserialize, Serialize};

/// A pixel-space rectangle at the scale a page was rendered at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
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

    /// Project into scale-independent page fractions.
    pub fn to_relative(&self, viewport: PageViewport) -> RelativeRect {
        RelativeRect {
            x: self.x / viewport.width,
            y: self.y / viewport.height,
            width: self.width / viewport.width,
            height: self.height / viewport.height,
        }
    }
}

/// A rectangle expressed as fractions of a page's viewport dimensions,
/// each component in `[0, 1]`.
///
/// This is the only representation safe to persist across zoom changes;
/// the pixel rectangle is a cached projection of it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelativeRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl RelativeRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Project back into pixel space for the given viewport.
    pub fn to_pixels(&self, viewport: PageViewport) -> Rect {
        Rect {
            x: self.x * viewport.width,
            y: self.y * viewport.height,
            width: self.width * viewport.width,
            height: self.height * viewport.height,
        }
    }
}

/// Per-page viewport size supplied by the external PDF renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageViewport {
    pub width: f64,
    pub height: f64,
}

impl PageViewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_to_relative() {
        let viewport = PageViewport::new(800.0, 1000.0);
        let rect = Rect::new(80.0, 250.0, 400.0, 100.0);

        let relative = rect.to_relative(viewport);

        assert!((relative.x - 0.1).abs() < EPSILON);
        assert!((relative.y - 0.25).abs() < EPSILON);
        assert!((relative.width - 0.5).abs() < EPSILON);
        assert!((relative.height - 0.1).abs() < EPSILON);
    }

    #[test]
    fn test_round_trip_through_different_viewport() {
        let original = PageViewport::new(612.0, 792.0);
        let zoomed = PageViewport::new(918.0, 1188.0); // 1.5x

        let rect = Rect::new(51.0, 100.0, 200.0, 40.0);
        let relative = rect.to_relative(original);
        let projected = relative.to_pixels(zoomed);

        // Same fractions, 1.5x the pixels
        assert!((projected.x - 76.5).abs() < EPSILON);
        assert!((projected.width - 300.0).abs() < EPSILON);

        let back = projected.to_relative(zoomed);
        assert!((back.x - relative.x).abs() < EPSILON);
        assert!((back.height - relative.height).abs() < EPSILON);
    }

    #[test]
    fn test_serde_field_names() {
        let rect = Rect::new(1.0, 2.0, 3.0, 4.0);
        let json = serde_json::to_string(&rect).unwrap();
        assert_eq!(json, r#"{"x":1.0,"y":2.0,"width":3.0,"height":4.0}"#);
    }
}
