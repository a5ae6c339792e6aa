use glam::Mat4;

use crate::coords::Rect;
use crate::render::Renderer;
use crate::scene::{BatchKind, ChildEdge, ClipOp, DrawOp, NodeKey, Outline, RecordedOpList, SaveFlags};

/// Shadow of an elevated child, drawn by its parent before the child's
/// content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowOp<'f> {
    pub caster: NodeKey,
    /// Caster transform flattened onto the parent's plane.
    pub transform_xy: Mat4,
    /// Caster transform with real Z, for the light position.
    pub transform_z: Mat4,
    pub alpha: f32,
    pub outline: &'f Outline,
    pub width: f32,
    pub height: f32,
}

/// Operations built during traversal, allocated from the frame allocator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyntheticOp<'f> {
    Save(SaveFlags),
    /// Absolute count; issued with a save-count offset of 0.
    RestoreToCount(i32),
    SaveLayerAlpha { bounds: Rect, alpha: u8, flags: SaveFlags },
    ClipRect { rect: Rect, op: ClipOp },
    ClipOutline(&'f Outline),
    DrawShadow(ShadowOp<'f>),
}

impl SyntheticOp<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            SyntheticOp::Save(_) => "Save",
            SyntheticOp::RestoreToCount(_) => "RestoreToCount",
            SyntheticOp::SaveLayerAlpha { .. } => "SaveLayerAlpha",
            SyntheticOp::ClipRect { .. } => "ClipRect",
            SyntheticOp::ClipOutline(_) => "ClipOutline",
            SyntheticOp::DrawShadow(_) => "DrawShadow",
        }
    }
}

/// What a handler receives from the traversal.
#[derive(Debug, Clone, Copy)]
pub enum Operation<'f> {
    Recorded { op: &'f DrawOp, list: &'f RecordedOpList },
    Synthetic(&'f SyntheticOp<'f>),
    /// Draw of a child node; the handler decides whether to descend.
    Child(&'f ChildEdge),
}

impl<'f> Operation<'f> {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Recorded { op, .. } => op.name(),
            Operation::Synthetic(op) => op.name(),
            Operation::Child(_) => "DrawRenderNode",
        }
    }

    /// Changes renderer state rather than producing pixels.
    pub fn is_state_op(&self) -> bool {
        match self {
            Operation::Recorded { op, .. } => op.is_state_op(),
            Operation::Synthetic(op) => !matches!(op, SyntheticOp::DrawShadow(_)),
            Operation::Child(_) => false,
        }
    }

    pub fn batch_kind(&self) -> Option<BatchKind> {
        match self {
            Operation::Recorded { op, .. } => op.batch_kind(),
            Operation::Synthetic(SyntheticOp::DrawShadow(_)) => Some(BatchKind::Shadow),
            _ => None,
        }
    }

    /// Issues the operation against `renderer`.
    ///
    /// Recorded restores resolve against `save_count`. Child draws are a
    /// no-op here; descending is up to the handler.
    pub fn issue(&self, renderer: &mut dyn Renderer, save_count: i32) {
        match *self {
            Operation::Recorded { op, list } => issue_recorded(op, list, renderer, save_count),
            Operation::Synthetic(op) => match *op {
                SyntheticOp::Save(flags) => {
                    renderer.save(flags);
                }
                SyntheticOp::RestoreToCount(count) => renderer.restore_to_count(save_count + count),
                SyntheticOp::SaveLayerAlpha { bounds, alpha, flags } => {
                    renderer.save_layer_alpha(bounds, alpha, flags);
                }
                SyntheticOp::ClipRect { rect, op } => {
                    renderer.clip_rect(rect, op);
                }
                SyntheticOp::ClipOutline(outline) => renderer.clip_outline(outline),
                SyntheticOp::DrawShadow(ref shadow) => renderer.draw_shadow(shadow),
            },
            Operation::Child(_) => {}
        }
    }
}

fn issue_recorded(op: &DrawOp, list: &RecordedOpList, renderer: &mut dyn Renderer, save_count: i32) {
    match *op {
        DrawOp::Save(flags) => {
            renderer.save(flags);
        }
        DrawOp::Restore => renderer.restore(),
        DrawOp::RestoreToCount(count) => renderer.restore_to_count(save_count + count),
        DrawOp::Translate { dx, dy } => renderer.translate(dx, dy),
        DrawOp::ConcatMatrix { matrix } => {
            if let Some(m) = list.matrix(matrix) {
                renderer.concat(m);
            }
        }
        DrawOp::ClipRect { rect, op } => {
            renderer.clip_rect(rect, op);
        }
        DrawOp::ClipPath { path, op } => {
            if let Some(path) = list.path(path) {
                renderer.clip_rect(path.bounds(), op);
            }
        }
        DrawOp::ClipRegion { region, op } => {
            if let Some(region) = list.region(region) {
                renderer.clip_rect(region.bounds(), op);
            }
        }
        DrawOp::DrawRenderNode { .. } => {}
        _ => renderer.draw(op, list),
    }
}
