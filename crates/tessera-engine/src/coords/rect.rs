use glam::{Mat4, Vec2};

/// Axis-aligned rectangle (top-left origin).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    /// Rectangle anchored at the origin, the shape of a node's own bounds.
    #[inline]
    pub const fn from_size(w: f32, h: f32) -> Self {
        Self::new(0.0, 0.0, w, h)
    }

    /// Builds a rectangle from left/top/right/bottom edges.
    #[inline]
    pub fn from_ltrb(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self::new(left, top, right - left, bottom - top)
    }

    #[inline]
    pub fn min(self) -> Vec2 {
        self.origin
    }

    #[inline]
    pub fn max(self) -> Vec2 {
        self.origin + self.size
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    /// Normalizes the rectangle so width/height are non-negative.
    #[inline]
    pub fn normalized(self) -> Self {
        let min = self.origin.min(self.origin + self.size);
        let max = self.origin.max(self.origin + self.size);
        Self::from_ltrb(min.x, min.y, max.x, max.y)
    }

    #[inline]
    pub fn intersect(self, other: Rect) -> Option<Rect> {
        let a = self.normalized();
        let b = other.normalized();

        let min = a.min().max(b.min());
        let max = a.max().min(b.max());

        if max.x - min.x <= 0.0 || max.y - min.y <= 0.0 {
            None
        } else {
            Some(Rect::from_ltrb(min.x, min.y, max.x, max.y))
        }
    }

    /// Axis-aligned bounds of this rectangle after mapping its four corners
    /// through `matrix` (Z is dropped).
    pub fn map_bounds(self, matrix: &Mat4) -> Rect {
        let r = self.normalized();
        let corners = [
            r.min(),
            Vec2::new(r.max().x, r.min().y),
            r.max(),
            Vec2::new(r.min().x, r.max().y),
        ];

        let mut min = Vec2::splat(f32::INFINITY);
        let mut max = Vec2::splat(f32::NEG_INFINITY);
        for corner in corners {
            let p = matrix.project_point3(corner.extend(0.0)).truncate();
            min = min.min(p);
            max = max.max(p);
        }
        Rect::from_ltrb(min.x, min.y, max.x, max.y)
    }
}
