//! Geometry shared by recording, traversal and renderers.
//!
//! Canonical space:
//! - Origin top-left, +X right, +Y down
//! - Node-local coordinates start at `(0, 0)` and span the node's width/height
//!
//! Transforms are plain `glam::Mat4`s so the same matrix can carry both the
//! flattened 2D transform and the true 3D one used for shadow casting.

mod rect;

pub use glam::{Mat4, Vec2, Vec3};
pub use rect::Rect;
