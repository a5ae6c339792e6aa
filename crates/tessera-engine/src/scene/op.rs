use bitflags::bitflags;
use glam::Vec2;

use crate::coords::Rect;
use crate::paint::Color;
use crate::resource::ResourceId;

bitflags! {
    /// What a save captures.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct SaveFlags: u32 {
        const MATRIX          = 1 << 0;
        const CLIP            = 1 << 1;
        const HAS_ALPHA_LAYER = 1 << 2;
        const CLIP_TO_LAYER   = 1 << 3;
    }
}

impl SaveFlags {
    pub const MATRIX_CLIP: SaveFlags = SaveFlags::MATRIX.union(SaveFlags::CLIP);
}

/// How a clip combines with the current clip.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ClipOp {
    Intersect,
    Replace,
}

/// One recorded operation.
///
/// Indices (`paint`, `path`, `region`, `matrix`, `child`) point into the
/// owning [`RecordedOpList`](super::RecordedOpList).
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Save(SaveFlags),
    Restore,
    /// Restore count relative to the save count at the start of the list.
    RestoreToCount(i32),
    Translate { dx: f32, dy: f32 },
    ConcatMatrix { matrix: usize },
    ClipRect { rect: Rect, op: ClipOp },
    ClipPath { path: usize, op: ClipOp },
    ClipRegion { region: usize, op: ClipOp },

    DrawColor { color: Color },
    DrawRect { rect: Rect, paint: usize },
    DrawRoundRect { rect: Rect, rx: f32, ry: f32, paint: usize },
    DrawCircle { center: Vec2, radius: f32, paint: usize },
    DrawPath { path: usize, paint: usize },
    DrawBitmap { bitmap: ResourceId, dst: Rect, paint: Option<usize> },
    DrawPatch { patch: ResourceId, dst: Rect, paint: Option<usize> },
    DrawText { text: String, origin: Vec2, paint: usize },
    DrawLayer { layer: ResourceId, x: f32, y: f32 },
    DrawFunctor { functor: u32 },
    DrawRenderNode { child: usize },
}

/// Draws that may share a batch when recorded back to back.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BatchKind {
    Color,
    Shape,
    Path,
    Bitmap,
    Patch,
    Text,
    Layer,
    Functor,
    Shadow,
}

impl DrawOp {
    pub fn name(&self) -> &'static str {
        match self {
            DrawOp::Save(_) => "Save",
            DrawOp::Restore => "Restore",
            DrawOp::RestoreToCount(_) => "RestoreToCount",
            DrawOp::Translate { .. } => "Translate",
            DrawOp::ConcatMatrix { .. } => "ConcatMatrix",
            DrawOp::ClipRect { .. } => "ClipRect",
            DrawOp::ClipPath { .. } => "ClipPath",
            DrawOp::ClipRegion { .. } => "ClipRegion",
            DrawOp::DrawColor { .. } => "DrawColor",
            DrawOp::DrawRect { .. } => "DrawRect",
            DrawOp::DrawRoundRect { .. } => "DrawRoundRect",
            DrawOp::DrawCircle { .. } => "DrawCircle",
            DrawOp::DrawPath { .. } => "DrawPath",
            DrawOp::DrawBitmap { .. } => "DrawBitmap",
            DrawOp::DrawPatch { .. } => "DrawPatch",
            DrawOp::DrawText { .. } => "DrawText",
            DrawOp::DrawLayer { .. } => "DrawLayer",
            DrawOp::DrawFunctor { .. } => "DrawFunctor",
            DrawOp::DrawRenderNode { .. } => "DrawRenderNode",
        }
    }

    /// Save/restore, transform and clip ops.
    pub fn is_state_op(&self) -> bool {
        matches!(
            self,
            DrawOp::Save(_)
                | DrawOp::Restore
                | DrawOp::RestoreToCount(_)
                | DrawOp::Translate { .. }
                | DrawOp::ConcatMatrix { .. }
                | DrawOp::ClipRect { .. }
                | DrawOp::ClipPath { .. }
                | DrawOp::ClipRegion { .. }
        )
    }

    pub fn batch_kind(&self) -> Option<BatchKind> {
        Some(match self {
            DrawOp::DrawColor { .. } => BatchKind::Color,
            DrawOp::DrawRect { .. } | DrawOp::DrawRoundRect { .. } | DrawOp::DrawCircle { .. } => {
                BatchKind::Shape
            }
            DrawOp::DrawPath { .. } => BatchKind::Path,
            DrawOp::DrawBitmap { .. } => BatchKind::Bitmap,
            DrawOp::DrawPatch { .. } => BatchKind::Patch,
            DrawOp::DrawText { .. } => BatchKind::Text,
            DrawOp::DrawLayer { .. } => BatchKind::Layer,
            DrawOp::DrawFunctor { .. } => BatchKind::Functor,
            _ => return None,
        })
    }
}
