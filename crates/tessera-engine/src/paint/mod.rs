//! Paint model referenced by recorded draw operations.
//!
//! Paints are owned by the recorded op list that uses them; ops refer to
//! them by index. A paint may reference a shared shader resource, which is
//! refcounted in the [`ResourceCache`](crate::resource::ResourceCache).

mod color;

pub use color::Color;

use crate::resource::ResourceId;

/// How geometry is filled.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PaintStyle {
    Fill,
    Stroke { width: f32 },
}

/// Node-owned paint.
#[derive(Debug, Clone, PartialEq)]
pub struct Paint {
    pub color: Color,
    pub style: PaintStyle,
    /// Optional shared shader. The recorder registers the reference.
    pub shader: Option<ResourceId>,
}

impl Paint {
    #[inline]
    pub fn fill(color: Color) -> Self {
        Self { color, style: PaintStyle::Fill, shader: None }
    }

    #[inline]
    pub fn stroke(color: Color, width: f32) -> Self {
        Self { color, style: PaintStyle::Stroke { width }, shader: None }
    }

    #[inline]
    pub fn with_shader(mut self, shader: ResourceId) -> Self {
        self.shader = Some(shader);
        self
    }
}

impl Default for Paint {
    fn default() -> Self {
        Self::fill(Color::BLACK)
    }
}
