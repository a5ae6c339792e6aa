use super::{Frame, Operation, OperationHandler, iterate};
use crate::frame::FrameAllocator;
use crate::render::{DisplayState, Renderer};
use crate::scene::{BatchKind, NodeKey};

/// One entry of a deferred plan.
#[derive(Debug, Clone, Copy)]
pub enum DeferredEntry<'f> {
    /// Draw with the display state captured at defer time.
    Draw { op: Operation<'f>, state: DisplayState, clip_to_bounds: bool },
    /// State change; ends the current batch.
    Barrier { op: Operation<'f>, save_count: i32 },
}

/// Run of consecutive draws of the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch {
    pub kind: BatchKind,
    pub start: usize,
    pub len: usize,
}

/// Frame's worth of deferred operations, grouped into batches.
#[derive(Debug, Default)]
pub struct DeferredPlan<'f> {
    entries: Vec<DeferredEntry<'f>>,
    batches: Vec<Batch>,
    batch_open: bool,
}

impl<'f> DeferredPlan<'f> {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn entries(&self) -> &[DeferredEntry<'f>] {
        &self.entries
    }

    #[inline]
    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn draw_count(&self) -> usize {
        self.batches.iter().map(|b| b.len).sum()
    }

    pub(crate) fn push_draw(&mut self, op: Operation<'f>, state: DisplayState, clip_to_bounds: bool) {
        let Some(kind) = op.batch_kind() else {
            log::warn!("cannot defer {}", op.name());
            return;
        };
        let index = self.entries.len();
        self.entries.push(DeferredEntry::Draw { op, state, clip_to_bounds });

        match self.batches.last_mut() {
            Some(batch) if self.batch_open && batch.kind == kind => batch.len += 1,
            _ => self.batches.push(Batch { kind, start: index, len: 1 }),
        }
        self.batch_open = true;
    }

    pub(crate) fn push_barrier(&mut self, op: Operation<'f>, save_count: i32) {
        self.entries.push(DeferredEntry::Barrier { op, save_count });
        self.batch_open = false;
    }

    /// Issues every entry in order.
    pub fn flush(&self, renderer: &mut dyn Renderer) {
        log::trace!("flushing {} entries in {} batches", self.entries.len(), self.batches.len());
        for entry in &self.entries {
            match *entry {
                DeferredEntry::Draw { op, ref state, .. } => {
                    renderer.set_display_state(state);
                    op.issue(renderer, 0);
                }
                DeferredEntry::Barrier { op, save_count } => op.issue(renderer, save_count),
            }
        }
    }
}

/// Handler that applies state immediately and defers draws into a plan.
pub struct DeferHandler<'p, 'f> {
    frame: Frame<'f>,
    plan: &'p mut DeferredPlan<'f>,
    allocator: &'f FrameAllocator,
    level: u32,
}

impl<'p, 'f> DeferHandler<'p, 'f> {
    pub fn new(frame: Frame<'f>, plan: &'p mut DeferredPlan<'f>, allocator: &'f FrameAllocator, level: u32) -> Self {
        Self { frame, plan, allocator, level }
    }
}

impl<'f> OperationHandler<'f> for DeferHandler<'_, 'f> {
    fn accept(&mut self, renderer: &mut dyn Renderer, op: Operation<'f>, save_count: i32, clip_to_bounds: bool) {
        match op {
            Operation::Child(edge) => {
                if !edge.skip_in_order_draw() {
                    defer_node(self.frame, edge.child, renderer, self.plan, self.allocator, self.level + 1);
                }
            }
            _ if op.is_state_op() => {
                // Applied now so clip tracking and quick rejects stay exact.
                op.issue(renderer, save_count);
                self.plan.push_barrier(op, save_count);
            }
            _ => self.plan.push_draw(op, renderer.display_state(), clip_to_bounds),
        }
    }

    #[inline]
    fn allocator(&self) -> &'f FrameAllocator {
        self.allocator
    }
}

/// Walks `key` in deferred mode, appending to `plan`.
pub fn defer_node<'f>(
    frame: Frame<'f>,
    key: NodeKey,
    renderer: &mut dyn Renderer,
    plan: &mut DeferredPlan<'f>,
    allocator: &'f FrameAllocator,
    level: u32,
) {
    let mut handler = DeferHandler::new(frame, plan, allocator, level);
    iterate(frame, key, renderer, &mut handler, level);
}

/// Builds the deferred plan for the tree under `root`.
///
/// `renderer` tracks state while deferring; the plan is issued later with
/// [`DeferredPlan::flush`].
pub fn defer<'f>(
    frame: Frame<'f>,
    root: NodeKey,
    renderer: &mut dyn Renderer,
    allocator: &'f FrameAllocator,
) -> DeferredPlan<'f> {
    let mut plan = DeferredPlan::new();
    defer_node(frame, root, renderer, &mut plan, allocator, 0);
    log::debug!("deferred {} draws into {} batches", plan.draw_count(), plan.batches().len());
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Rect;
    use crate::playback::SyntheticOp;
    use crate::scene::{ClipOp, DrawOp, RecordedOpList};

    #[test]
    fn barriers_split_batches() {
        let list = RecordedOpList::default();
        let text = DrawOp::DrawText { text: "a".into(), origin: glam::Vec2::ZERO, paint: 0 };
        let rect = DrawOp::DrawRect { rect: Rect::from_size(1.0, 1.0), paint: 0 };
        let clip = SyntheticOp::ClipRect { rect: Rect::from_size(1.0, 1.0), op: ClipOp::Intersect };
        let state = DisplayState::default();

        let mut plan = DeferredPlan::new();
        plan.push_draw(Operation::Recorded { op: &text, list: &list }, state, true);
        plan.push_draw(Operation::Recorded { op: &text, list: &list }, state, true);
        plan.push_draw(Operation::Recorded { op: &rect, list: &list }, state, true);
        plan.push_barrier(Operation::Synthetic(&clip), 0);
        plan.push_draw(Operation::Recorded { op: &rect, list: &list }, state, true);

        let batches: Vec<_> = plan.batches().iter().map(|b| (b.kind, b.start, b.len)).collect();
        assert_eq!(
            batches,
            [(BatchKind::Text, 0, 2), (BatchKind::Shape, 2, 1), (BatchKind::Shape, 4, 1)]
        );
        assert_eq!(plan.draw_count(), 4);
        assert_eq!(plan.entries().len(), 5);
    }
}
