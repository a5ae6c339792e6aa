use core::fmt;

use glam::{Mat4, Vec2, Vec3};

use super::{ChildEdge, ClipOp, DrawOp, NodeKey, Path, RecordedOpList, Region, SaveFlags};
use crate::coords::Rect;
use crate::paint::{Color, Paint};
use crate::resource::{ResourceCache, ResourceId};

/// Recording failed; every reference taken so far has been returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// `restore` without a matching `save`.
    RestoreUnderflow,
    /// `restore_to_count` below the base count of 1.
    InvalidRestoreCount { count: i32 },
    /// `finish` with saves still open.
    UnbalancedSave { depth: usize },
    /// Projection receive point marked before any op was recorded.
    ReceivePointWithoutOps,
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::RestoreUnderflow => write!(f, "restore without matching save"),
            RecordError::InvalidRestoreCount { count } => {
                write!(f, "restore to invalid save count {count}")
            }
            RecordError::UnbalancedSave { depth } => {
                write!(f, "recording finished with {depth} unmatched save(s)")
            }
            RecordError::ReceivePointWithoutOps => {
                write!(f, "projection receive point marked on an empty recording")
            }
        }
    }
}

impl std::error::Error for RecordError {}

/// Canvas-like builder for a [`RecordedOpList`].
///
/// Save counts start at 1, as on the playback side. Every shared resource
/// used by a recorded op gains one cache reference here.
pub struct DisplayListRecorder<'c> {
    cache: &'c ResourceCache,
    list: RecordedOpList,
    matrix: Mat4,
    saves: Vec<Mat4>,
}

impl<'c> DisplayListRecorder<'c> {
    pub fn new(cache: &'c ResourceCache) -> Self {
        Self {
            cache,
            list: RecordedOpList::default(),
            matrix: Mat4::IDENTITY,
            saves: Vec::new(),
        }
    }

    #[inline]
    pub fn save_count(&self) -> i32 {
        self.saves.len() as i32 + 1
    }

    /// Current recording transform.
    #[inline]
    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    /// Returns the count to pass to [`restore_to_count`](Self::restore_to_count).
    pub fn save(&mut self, flags: SaveFlags) -> i32 {
        let count = self.save_count();
        self.saves.push(self.matrix);
        self.list.ops.push(DrawOp::Save(flags));
        count
    }

    pub fn restore(&mut self) -> Result<(), RecordError> {
        self.matrix = self.saves.pop().ok_or(RecordError::RestoreUnderflow)?;
        self.list.ops.push(DrawOp::Restore);
        Ok(())
    }

    pub fn restore_to_count(&mut self, count: i32) -> Result<(), RecordError> {
        if count < 1 {
            return Err(RecordError::InvalidRestoreCount { count });
        }
        while self.save_count() > count {
            if let Some(m) = self.saves.pop() {
                self.matrix = m;
            }
        }
        self.list.ops.push(DrawOp::RestoreToCount(count));
        Ok(())
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.matrix *= Mat4::from_translation(Vec3::new(dx, dy, 0.0));
        self.list.ops.push(DrawOp::Translate { dx, dy });
    }

    pub fn concat(&mut self, matrix: Mat4) {
        self.matrix *= matrix;
        let index = self.list.matrices.len();
        self.list.matrices.push(matrix);
        self.list.ops.push(DrawOp::ConcatMatrix { matrix: index });
    }

    pub fn clip_rect(&mut self, rect: Rect, op: ClipOp) {
        self.list.ops.push(DrawOp::ClipRect { rect, op });
    }

    pub fn clip_path(&mut self, path: Path, op: ClipOp) {
        let index = self.list.paths.len();
        self.list.paths.push(path);
        self.list.ops.push(DrawOp::ClipPath { path: index, op });
    }

    pub fn clip_region(&mut self, region: Region, op: ClipOp) {
        let index = self.list.regions.len();
        self.list.regions.push(region);
        self.list.ops.push(DrawOp::ClipRegion { region: index, op });
    }

    pub fn draw_color(&mut self, color: Color) {
        self.list.ops.push(DrawOp::DrawColor { color });
    }

    pub fn draw_rect(&mut self, rect: Rect, paint: Paint) {
        let paint = self.push_paint(paint);
        self.list.ops.push(DrawOp::DrawRect { rect, paint });
    }

    pub fn draw_round_rect(&mut self, rect: Rect, rx: f32, ry: f32, paint: Paint) {
        let paint = self.push_paint(paint);
        self.list.ops.push(DrawOp::DrawRoundRect { rect, rx, ry, paint });
    }

    pub fn draw_circle(&mut self, center: Vec2, radius: f32, paint: Paint) {
        let paint = self.push_paint(paint);
        self.list.ops.push(DrawOp::DrawCircle { center, radius, paint });
    }

    /// `source` is the cached path the copy was made from, if any.
    pub fn draw_path(&mut self, path: Path, source: Option<ResourceId>, paint: Paint) {
        if let Some(source) = source {
            self.cache.increment_refcount(source);
            self.list.resources.source_paths.push(source);
        }
        let paint = self.push_paint(paint);
        let index = self.list.paths.len();
        self.list.paths.push(path);
        self.list.ops.push(DrawOp::DrawPath { path: index, paint });
    }

    pub fn draw_bitmap(&mut self, bitmap: ResourceId, dst: Rect, paint: Option<Paint>) {
        self.cache.increment_refcount(bitmap);
        self.list.resources.bitmaps.push(bitmap);
        let paint = paint.map(|p| self.push_paint(p));
        self.list.ops.push(DrawOp::DrawBitmap { bitmap, dst, paint });
    }

    /// Like [`draw_bitmap`](Self::draw_bitmap), but the recording takes
    /// ownership: the bitmap is destroyed with the op list.
    pub fn draw_owned_bitmap(&mut self, bitmap: ResourceId, dst: Rect, paint: Option<Paint>) {
        self.cache.increment_refcount(bitmap);
        self.list.resources.owned_bitmaps.push(bitmap);
        let paint = paint.map(|p| self.push_paint(p));
        self.list.ops.push(DrawOp::DrawBitmap { bitmap, dst, paint });
    }

    pub fn draw_patch(&mut self, patch: ResourceId, dst: Rect, paint: Option<Paint>) {
        self.cache.increment_refcount(patch);
        self.list.resources.patches.push(patch);
        let paint = paint.map(|p| self.push_paint(p));
        self.list.ops.push(DrawOp::DrawPatch { patch, dst, paint });
    }

    pub fn draw_text(&mut self, text: impl Into<String>, origin: Vec2, paint: Paint) {
        let paint = self.push_paint(paint);
        self.list.ops.push(DrawOp::DrawText { text: text.into(), origin, paint });
    }

    pub fn draw_layer(&mut self, layer: ResourceId, x: f32, y: f32) {
        self.cache.increment_refcount(layer);
        self.list.resources.layers.push(layer);
        self.list.ops.push(DrawOp::DrawLayer { layer, x, y });
    }

    pub fn draw_functor(&mut self, functor: u32) {
        self.list.functor_count += 1;
        self.list.ops.push(DrawOp::DrawFunctor { functor });
    }

    /// Records a child draw under the current recording transform.
    pub fn draw_render_node(&mut self, child: NodeKey) {
        let index = self.list.children.len();
        self.list.children.push(ChildEdge::new(child, self.matrix));
        self.list.ops.push(DrawOp::DrawRenderNode { child: index });
    }

    /// Projected descendants will be drawn right after the last recorded op.
    pub fn mark_projection_receive_point(&mut self) -> Result<(), RecordError> {
        if self.list.ops.is_empty() {
            return Err(RecordError::ReceivePointWithoutOps);
        }
        self.list.projection_receive_index = Some(self.list.ops.len() - 1);
        Ok(())
    }

    pub fn finish(mut self) -> Result<RecordedOpList, RecordError> {
        if !self.saves.is_empty() {
            let depth = self.saves.len();
            self.list.release_resources(self.cache);
            return Err(RecordError::UnbalancedSave { depth });
        }
        log::trace!(
            "recorded {} ops, {} children",
            self.list.ops.len(),
            self.list.children.len()
        );
        Ok(self.list)
    }

    fn push_paint(&mut self, paint: Paint) -> usize {
        if let Some(shader) = paint.shader {
            self.cache.increment_refcount(shader);
            self.list.resources.shaders.push(shader);
        }
        self.list.paints.push(paint);
        self.list.paints.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceKind;
    use slotmap::KeyData;

    fn key(n: u64) -> NodeKey {
        NodeKey::from(KeyData::from_ffi(n))
    }

    #[test]
    fn recording_takes_references() {
        let cache = ResourceCache::new();
        let bitmap = cache.register(ResourceKind::Bitmap, 16);
        let shader = cache.register(ResourceKind::Shader, 8);

        let mut rec = DisplayListRecorder::new(&cache);
        rec.draw_bitmap(bitmap, Rect::from_size(4.0, 4.0), None);
        rec.draw_rect(Rect::from_size(2.0, 2.0), Paint::default().with_shader(shader));
        rec.draw_functor(7);
        let mut list = rec.finish().expect("balanced recording");

        assert_eq!(cache.refcount(bitmap), Some(1));
        assert_eq!(cache.refcount(shader), Some(1));
        assert_eq!(list.functor_count(), 1);
        list.release_resources(&cache);
        assert_eq!(cache.refcount(bitmap), Some(0));
    }

    #[test]
    fn child_edges_capture_recording_transform() {
        let cache = ResourceCache::new();
        let mut rec = DisplayListRecorder::new(&cache);
        let restore_to = rec.save(SaveFlags::MATRIX);
        rec.translate(5.0, 6.0);
        rec.draw_render_node(key(1));
        rec.restore_to_count(restore_to).expect("valid count");
        rec.draw_render_node(key(2));
        let list = rec.finish().expect("balanced recording");

        let children = list.children();
        assert_eq!(children[0].transform_from_parent.w_axis.truncate(), Vec3::new(5.0, 6.0, 0.0));
        assert_eq!(children[1].transform_from_parent, Mat4::IDENTITY);
        assert_eq!(list.ops()[3], DrawOp::RestoreToCount(1));
    }

    #[test]
    fn unbalanced_recording_gives_references_back() {
        let cache = ResourceCache::new();
        let layer = cache.register(ResourceKind::Layer, 128);
        let mut rec = DisplayListRecorder::new(&cache);
        rec.save(SaveFlags::MATRIX_CLIP);
        rec.draw_layer(layer, 0.0, 0.0);
        assert_eq!(rec.finish().err(), Some(RecordError::UnbalancedSave { depth: 1 }));
        assert_eq!(cache.refcount(layer), Some(0));
    }

    #[test]
    fn restore_errors() {
        let cache = ResourceCache::new();
        let mut rec = DisplayListRecorder::new(&cache);
        assert_eq!(rec.restore(), Err(RecordError::RestoreUnderflow));
        assert_eq!(rec.restore_to_count(0), Err(RecordError::InvalidRestoreCount { count: 0 }));
        assert_eq!(rec.mark_projection_receive_point(), Err(RecordError::ReceivePointWithoutOps));
    }
}
