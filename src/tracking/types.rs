/// Axis-aligned rectangle in frame pixel coordinates
///
/// Signed so that inflation around a point near the border can go negative
/// before being clipped back to the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle covering a whole `width` x `height` frame
    pub fn frame(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    /// Box spanning two corner points, in either order
    pub fn spanning(a: (i32, i32), b: (i32, i32)) -> Self {
        Self::new(
            a.0.min(b.0),
            a.1.min(b.1),
            (a.0 - b.0).abs(),
            (a.1 - b.1).abs(),
        )
    }

    pub fn area(&self) -> i64 {
        self.width.max(0) as i64 * self.height.max(0) as i64
    }

    /// True when either side is zero (or negative)
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (
            self.x as f32 + self.width as f32 * 0.5,
            self.y as f32 + self.height as f32 * 0.5,
        )
    }

    /// Intersection; disjoint rectangles yield `Rect::default()`
    pub fn intersect(&self, other: &Rect) -> Rect {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 <= x0 || y1 <= y0 {
            Rect::default()
        } else {
            Rect::new(x0, y0, x1 - x0, y1 - y0)
        }
    }

    #[cfg(test)]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

/// Tracking result: a rectangle of `size` centred on `center`, rotated by
/// `angle` degrees
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RotatedRect {
    pub center: (f32, f32),
    /// (width, height) before rotation
    pub size: (f32, f32),
    /// Degrees, in [0, 180)
    pub angle: f32,
}

impl RotatedRect {
    pub fn is_empty(&self) -> bool {
        self.size.0 <= 0.0 || self.size.1 <= 0.0
    }
}

/// Where the tracker is in the select → build model → track lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingState {
    /// Nothing selected yet
    Idle,
    /// Pointer drag in progress
    Selecting,
    /// Selection finalised, histogram not yet built
    Armed,
    /// Histogram built, window search runs every frame
    Tracking,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spanning_normalises_corner_order() {
        assert_eq!(Rect::spanning((50, 80), (10, 10)), Rect::new(10, 10, 40, 70));
        assert_eq!(Rect::spanning((10, 10), (50, 80)), Rect::new(10, 10, 40, 70));
    }

    #[test]
    fn intersect_clips_to_frame() {
        let frame = Rect::frame(100, 50);
        let r = Rect::new(-10, 40, 30, 30);
        assert_eq!(r.intersect(&frame), Rect::new(0, 40, 20, 10));
    }

    #[test]
    fn disjoint_intersection_is_empty() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(20, 20, 5, 5);
        let i = a.intersect(&b);
        assert!(i.is_empty());
        assert_eq!(i.area(), 0);
    }
}
