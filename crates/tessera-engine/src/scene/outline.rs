use glam::Vec2;

use crate::coords::Rect;

/// Outline geometry used for outline clipping and shadow casting.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Outline {
    #[default]
    Empty,
    RoundRect { rect: Rect, radius: f32 },
    /// Convex polygon, in node-local coordinates.
    ConvexPath(Vec<Vec2>),
}

impl Outline {
    #[inline]
    pub fn rect(rect: Rect) -> Self {
        Outline::RoundRect { rect, radius: 0.0 }
    }

    #[inline]
    pub fn round_rect(rect: Rect, radius: f32) -> Self {
        Outline::RoundRect { rect, radius }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Outline::Empty => true,
            Outline::RoundRect { rect, .. } => rect.is_empty(),
            Outline::ConvexPath(points) => points.len() < 3,
        }
    }

    /// Conservative local bounds, `None` for an empty outline.
    pub fn bounds(&self) -> Option<Rect> {
        if self.is_empty() {
            return None;
        }
        match self {
            Outline::Empty => None,
            Outline::RoundRect { rect, .. } => Some(rect.normalized()),
            Outline::ConvexPath(points) => {
                let (min, max) = points.iter().fold(
                    (Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY)),
                    |(min, max), &p| (min.min(p), max.max(p)),
                );
                Some(Rect::from_ltrb(min.x, min.y, max.x, max.y))
            }
        }
    }
}
