use super::{Frame, Operation, OperationHandler, iterate};
use crate::frame::FrameAllocator;
use crate::render::Renderer;
use crate::scene::NodeKey;

/// Handler that issues every operation as soon as it is produced.
pub struct ReplayHandler<'f> {
    frame: Frame<'f>,
    allocator: &'f FrameAllocator,
    level: u32,
}

impl<'f> ReplayHandler<'f> {
    pub fn new(frame: Frame<'f>, allocator: &'f FrameAllocator, level: u32) -> Self {
        Self { frame, allocator, level }
    }
}

impl<'f> OperationHandler<'f> for ReplayHandler<'f> {
    fn accept(&mut self, renderer: &mut dyn Renderer, op: Operation<'f>, save_count: i32, _clip_to_bounds: bool) {
        match op {
            Operation::Child(edge) => {
                if !edge.skip_in_order_draw() {
                    replay(self.frame, edge.child, renderer, self.allocator, self.level + 1);
                }
            }
            _ => op.issue(renderer, save_count),
        }
    }

    #[inline]
    fn allocator(&self) -> &'f FrameAllocator {
        self.allocator
    }
}

/// Draws `key` and its subtree immediately, bracketed by trace markers
/// named after the node.
pub fn replay<'f>(
    frame: Frame<'f>,
    key: NodeKey,
    renderer: &mut dyn Renderer,
    allocator: &'f FrameAllocator,
    level: u32,
) {
    let node = frame.graph.node(key);
    renderer.start_mark(node.name());
    let mut handler = ReplayHandler::new(frame, allocator, level);
    iterate(frame, key, renderer, &mut handler, level);
    renderer.end_mark();
    log::trace!("{:indent$}Done ({})", "", node.name(), indent = level as usize * 2);
}
