use glam::Mat4;

use crate::coords::Rect;
use crate::playback::ShadowOp;
use crate::scene::{ClipOp, DrawOp, Outline, RecordedOpList, SaveFlags};

/// Snapshot of the state a draw depends on, captured when deferring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayState {
    pub transform: Mat4,
    /// Device-space clip; `None` is unbounded.
    pub clip: Option<Rect>,
    pub alpha: f32,
    pub override_layer_alpha: f32,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            transform: Mat4::IDENTITY,
            clip: None,
            alpha: 1.0,
            override_layer_alpha: 1.0,
        }
    }
}

/// Target of a traversal.
///
/// Save counts start at 1. `save` and `save_layer_alpha` return the count
/// before saving, which is the token to hand back to `restore_to_count`.
pub trait Renderer {
    fn save(&mut self, flags: SaveFlags) -> i32;
    fn restore(&mut self);
    fn restore_to_count(&mut self, count: i32);
    fn save_count(&self) -> i32;

    fn translate(&mut self, dx: f32, dy: f32);
    fn concat(&mut self, matrix: &Mat4);

    /// Alpha applied when the caller composites this node's cached layer.
    fn set_override_layer_alpha(&mut self, alpha: f32);
    /// Multiplies alpha into subsequent draws.
    fn scale_alpha(&mut self, alpha: f32);

    /// True when `rect` (local space) is certainly outside the clip.
    fn quick_reject_conservative(&self, rect: Rect) -> bool;

    fn save_layer_alpha(&mut self, bounds: Rect, alpha: u8, flags: SaveFlags) -> i32;
    /// Returns false when the resulting clip is empty.
    fn clip_rect(&mut self, rect: Rect, op: ClipOp) -> bool;
    fn clip_outline(&mut self, outline: &Outline);

    /// Draws a recorded primitive.
    fn draw(&mut self, op: &DrawOp, list: &RecordedOpList);
    fn draw_shadow(&mut self, shadow: &ShadowOp<'_>);

    fn display_state(&self) -> DisplayState;
    fn set_display_state(&mut self, state: &DisplayState);

    fn start_mark(&mut self, _name: &str) {}
    fn end_mark(&mut self) {}
}
