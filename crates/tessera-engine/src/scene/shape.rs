use glam::Vec2;

use crate::coords::Rect;

/// Node-owned path copy. Only its bounds matter to the engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    pub points: Vec<Vec2>,
    pub closed: bool,
}

impl Path {
    pub fn polygon(points: impl Into<Vec<Vec2>>) -> Self {
        Self { points: points.into(), closed: true }
    }

    pub fn bounds(&self) -> Rect {
        let Some(&first) = self.points.first() else {
            return Rect::default();
        };
        let (min, max) = self
            .points
            .iter()
            .fold((first, first), |(min, max), &p| (min.min(p), max.max(p)));
        Rect::from_ltrb(min.x, min.y, max.x, max.y)
    }
}

/// Node-owned union of rectangles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Region {
    pub rects: Vec<Rect>,
}

impl Region {
    pub fn bounds(&self) -> Rect {
        let mut iter = self.rects.iter().map(|r| r.normalized());
        let Some(first) = iter.next() else {
            return Rect::default();
        };
        let (min, max) = iter.fold((first.min(), first.max()), |(min, max), r| {
            (min.min(r.min()), max.max(r.max()))
        });
        Rect::from_ltrb(min.x, min.y, max.x, max.y)
    }
}
