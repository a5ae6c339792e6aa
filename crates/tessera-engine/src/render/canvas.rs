use glam::{Mat4, Vec3};

use super::{DisplayState, Renderer};
use crate::coords::Rect;
use crate::playback::ShadowOp;
use crate::scene::{ClipOp, DrawOp, NodeKey, Outline, RecordedOpList, SaveFlags};

/// One call observed by [`CanvasRenderer`]. Transform-only calls are not
/// logged; their effect shows up in the transforms of later draws.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCall {
    Save { flags: SaveFlags, count: i32 },
    Restore,
    RestoreToCount(i32),
    SaveLayerAlpha { bounds: Rect, alpha: u8, flags: SaveFlags },
    /// Resulting device-space clip.
    ClipRect { clip: Rect, op: ClipOp },
    ClipOutline { clip: Rect },
    Draw {
        name: &'static str,
        /// Text of a `DrawText` op.
        label: Option<String>,
        transform: Mat4,
        alpha: f32,
    },
    Shadow { caster: NodeKey, transform: Mat4, alpha: f32 },
    StartMark(String),
    EndMark,
}

impl RenderCall {
    #[inline]
    pub fn is_draw(&self) -> bool {
        matches!(self, RenderCall::Draw { .. } | RenderCall::Shadow { .. })
    }
}

#[derive(Debug, Clone, Copy)]
struct Snapshot {
    transform: Mat4,
    clip: Option<Rect>,
    alpha: f32,
}

/// Headless renderer: tracks matrix, clip and alpha stacks and logs every
/// issued call.
#[derive(Debug)]
pub struct CanvasRenderer {
    stack: Vec<Snapshot>,
    override_layer_alpha: f32,
    calls: Vec<RenderCall>,
}

impl Default for CanvasRenderer {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl CanvasRenderer {
    /// Renderer whose initial clip is the `width` x `height` viewport.
    pub fn new(width: f32, height: f32) -> Self {
        Self::with_clip(Some(Rect::from_size(width, height)))
    }

    /// Renderer that never rejects anything.
    pub fn unbounded() -> Self {
        Self::with_clip(None)
    }

    fn with_clip(clip: Option<Rect>) -> Self {
        Self {
            stack: vec![Snapshot { transform: Mat4::IDENTITY, clip, alpha: 1.0 }],
            override_layer_alpha: 1.0,
            calls: Vec::new(),
        }
    }

    #[inline]
    pub fn calls(&self) -> &[RenderCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<RenderCall> {
        core::mem::take(&mut self.calls)
    }

    /// Draw and shadow calls only.
    pub fn draw_calls(&self) -> impl Iterator<Item = &RenderCall> {
        self.calls.iter().filter(|c| c.is_draw())
    }

    /// Labels of text draws, in issue order.
    pub fn draw_labels(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                RenderCall::Draw { label: Some(label), .. } => Some(label.as_str()),
                _ => None,
            })
            .collect()
    }

    #[inline]
    pub fn transform(&self) -> Mat4 {
        self.top().transform
    }

    #[inline]
    pub fn clip(&self) -> Option<Rect> {
        self.top().clip
    }

    #[inline]
    pub fn override_layer_alpha(&self) -> f32 {
        self.override_layer_alpha
    }

    fn top(&self) -> &Snapshot {
        // The base snapshot is never popped.
        &self.stack[self.stack.len() - 1]
    }

    fn top_mut(&mut self) -> &mut Snapshot {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn intersect_clip(&mut self, local: Rect) -> Rect {
        let top = self.top_mut();
        let mapped = local.map_bounds(&top.transform);
        let clip = match top.clip {
            None => mapped,
            Some(current) => current
                .intersect(mapped)
                .unwrap_or(Rect::new(current.origin.x, current.origin.y, 0.0, 0.0)),
        };
        top.clip = Some(clip);
        clip
    }
}

impl Renderer for CanvasRenderer {
    fn save(&mut self, flags: SaveFlags) -> i32 {
        let count = self.save_count();
        let top = *self.top();
        self.stack.push(top);
        self.calls.push(RenderCall::Save { flags, count });
        count
    }

    fn restore(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
        self.calls.push(RenderCall::Restore);
    }

    fn restore_to_count(&mut self, count: i32) {
        self.stack.truncate(count.max(1) as usize);
        self.calls.push(RenderCall::RestoreToCount(count));
    }

    #[inline]
    fn save_count(&self) -> i32 {
        self.stack.len() as i32
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.top_mut().transform *= Mat4::from_translation(Vec3::new(dx, dy, 0.0));
    }

    fn concat(&mut self, matrix: &Mat4) {
        self.top_mut().transform *= *matrix;
    }

    fn set_override_layer_alpha(&mut self, alpha: f32) {
        self.override_layer_alpha = alpha;
    }

    fn scale_alpha(&mut self, alpha: f32) {
        self.top_mut().alpha *= alpha;
    }

    fn quick_reject_conservative(&self, rect: Rect) -> bool {
        if rect.is_empty() {
            return true;
        }
        let top = self.top();
        match top.clip {
            None => false,
            Some(clip) => clip.intersect(rect.map_bounds(&top.transform)).is_none(),
        }
    }

    fn save_layer_alpha(&mut self, bounds: Rect, alpha: u8, flags: SaveFlags) -> i32 {
        let count = self.save_count();
        let top = *self.top();
        self.stack.push(top);
        self.top_mut().alpha *= f32::from(alpha) / 255.0;
        if flags.contains(SaveFlags::CLIP_TO_LAYER) {
            self.intersect_clip(bounds);
        }
        self.calls.push(RenderCall::SaveLayerAlpha { bounds, alpha, flags });
        count
    }

    fn clip_rect(&mut self, rect: Rect, op: ClipOp) -> bool {
        let clip = match op {
            ClipOp::Intersect => self.intersect_clip(rect),
            ClipOp::Replace => {
                let top = self.top_mut();
                let mapped = rect.map_bounds(&top.transform);
                top.clip = Some(mapped);
                mapped
            }
        };
        self.calls.push(RenderCall::ClipRect { clip, op });
        !clip.is_empty()
    }

    fn clip_outline(&mut self, outline: &Outline) {
        if let Some(bounds) = outline.bounds() {
            let clip = self.intersect_clip(bounds);
            self.calls.push(RenderCall::ClipOutline { clip });
        }
    }

    fn draw(&mut self, op: &DrawOp, _list: &RecordedOpList) {
        let top = *self.top();
        let label = match op {
            DrawOp::DrawText { text, .. } => Some(text.clone()),
            _ => None,
        };
        self.calls.push(RenderCall::Draw {
            name: op.name(),
            label,
            transform: top.transform,
            alpha: top.alpha * self.override_layer_alpha,
        });
    }

    fn draw_shadow(&mut self, shadow: &ShadowOp<'_>) {
        let top = *self.top();
        self.calls.push(RenderCall::Shadow {
            caster: shadow.caster,
            transform: top.transform * shadow.transform_xy,
            alpha: top.alpha * shadow.alpha,
        });
    }

    fn display_state(&self) -> DisplayState {
        let top = self.top();
        DisplayState {
            transform: top.transform,
            clip: top.clip,
            alpha: top.alpha,
            override_layer_alpha: self.override_layer_alpha,
        }
    }

    fn set_display_state(&mut self, state: &DisplayState) {
        let top = self.top_mut();
        top.transform = state.transform;
        top.clip = state.clip;
        top.alpha = state.alpha;
        self.override_layer_alpha = state.override_layer_alpha;
    }

    fn start_mark(&mut self, name: &str) {
        self.calls.push(RenderCall::StartMark(name.to_owned()));
    }

    fn end_mark(&mut self) {
        self.calls.push(RenderCall::EndMark);
    }
}
