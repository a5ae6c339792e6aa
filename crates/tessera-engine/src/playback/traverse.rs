use super::z_order::{ChildrenSelectMode, build_z_sorted_child_list, iterate_3d_children};
use super::{Operation, SyntheticOp};
use crate::context::RenderContext;
use crate::coords::Rect;
use crate::frame::FrameAllocator;
use crate::render::Renderer;
use crate::scene::{ChildEdge, ClipOp, DrawOp, MatrixFlags, NodeKey, SaveFlags, SceneGraph, SceneNode};

/// Save count passed with operations generated from node properties.
pub(crate) const PROPERTY_SAVE_COUNT: i32 = 0;

/// Read-only inputs of one traversal pass.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'f> {
    pub graph: &'f SceneGraph,
    pub ctx: &'f RenderContext,
}

impl<'f> Frame<'f> {
    pub fn new(graph: &'f SceneGraph, ctx: &'f RenderContext) -> Self {
        Self { graph, ctx }
    }
}

/// Receives every operation the traversal produces.
///
/// Deferred and immediate playback differ only in their handler.
pub trait OperationHandler<'f> {
    fn accept(
        &mut self,
        renderer: &mut dyn Renderer,
        op: Operation<'f>,
        save_count: i32,
        clip_to_bounds: bool,
    );

    /// Backing store for operations synthesized during the frame.
    fn allocator(&self) -> &'f FrameAllocator;
}

/// Clears an edge's skip flag for one out-of-order draw and sets it again
/// on drop.
pub(crate) struct DrawInPlaceGuard<'e> {
    edge: &'e ChildEdge,
}

impl<'e> DrawInPlaceGuard<'e> {
    pub(crate) fn new(edge: &'e ChildEdge) -> Self {
        edge.set_skip_in_order_draw(false);
        Self { edge }
    }
}

impl Drop for DrawInPlaceGuard<'_> {
    fn drop(&mut self) {
        self.edge.set_skip_in_order_draw(true);
    }
}

/// Walks one node: property state, negative-Z children, recorded ops
/// (with projected children at the receive point), positive-Z children.
pub fn iterate<'f, H>(
    frame: Frame<'f>,
    key: NodeKey,
    renderer: &mut dyn Renderer,
    handler: &mut H,
    level: u32,
) where
    H: OperationHandler<'f> + ?Sized,
{
    let node = frame.graph.node(key);
    let props = node.properties();
    let list = match node.op_list() {
        Some(list) if !list.is_empty() && props.alpha > 0.0 => list,
        _ => {
            log::trace!("{:indent$}Empty display list ({})", "", node.name(), indent = level as usize * 2);
            return;
        }
    };
    let clip_to_bounds = props.clip_to_bounds;
    let debug = frame.ctx.config.debug_display_list;
    if debug {
        log::debug!(
            "{:indent$}Start display list ({}), clip: {:?}",
            "",
            node.name(),
            renderer.display_state().clip,
            indent = level as usize * 2
        );
    }

    let alloc = handler.allocator();
    let restore_to = renderer.save_count();
    let save = alloc.alloc(SyntheticOp::Save(SaveFlags::MATRIX_CLIP));
    handler.accept(renderer, Operation::Synthetic(save), PROPERTY_SAVE_COUNT, clip_to_bounds);
    log::trace!("{:indent$}Save {restore_to} ({})", "", node.name(), indent = (level as usize + 1) * 2);

    set_view_properties(node, renderer, handler, level + 1);

    let bounds = Rect::from_size(props.width(), props.height());
    let quick_rejected = clip_to_bounds && renderer.quick_reject_conservative(bounds);
    if !quick_rejected {
        let z_children = build_z_sorted_child_list(frame.graph, list);
        iterate_3d_children(frame, node, &z_children, ChildrenSelectMode::NegativeZ, renderer, handler);

        let save_count_offset = renderer.save_count() - 1;
        let receive_index = list.projection_receive_index();
        for (index, op) in list.ops().iter().enumerate() {
            if debug {
                log::debug!("{:indent$}{}", "", op.name(), indent = (level as usize + 1) * 2);
            }
            frame.ctx.op_log.write_command(level, op.name());

            let operation = match op {
                DrawOp::DrawRenderNode { child } => match list.children().get(*child) {
                    Some(edge) => Operation::Child(edge),
                    None => {
                        log::warn!("{} references missing child edge {child}", node.name());
                        continue;
                    }
                },
                _ => Operation::Recorded { op, list },
            };
            handler.accept(renderer, operation, save_count_offset, clip_to_bounds);

            if receive_index == Some(index) && !node.projected_edges().is_empty() {
                iterate_projected_children(frame, node, renderer, handler, level);
            }
        }

        iterate_3d_children(frame, node, &z_children, ChildrenSelectMode::PositiveZ, renderer, handler);
    } else if debug {
        log::debug!("{:indent$}Quick rejected ({})", "", node.name(), indent = (level as usize + 1) * 2);
    }

    log::trace!("{:indent$}RestoreToCount {restore_to}", "", indent = (level as usize + 1) * 2);
    let restore = alloc.alloc(SyntheticOp::RestoreToCount(restore_to));
    handler.accept(renderer, Operation::Synthetic(restore), PROPERTY_SAVE_COUNT, clip_to_bounds);
    renderer.set_override_layer_alpha(1.0);
}

/// Applies a node's transform, alpha and clip properties.
fn set_view_properties<'f, H>(node: &'f SceneNode, renderer: &mut dyn Renderer, handler: &mut H, level: u32)
where
    H: OperationHandler<'f> + ?Sized,
{
    let props = node.properties();
    let alloc = handler.allocator();

    if props.left != 0.0 || props.top != 0.0 {
        renderer.translate(props.left, props.top);
    }
    if let Some(stat) = &props.static_matrix {
        renderer.concat(stat);
    } else if let Some(anim) = &props.animation_matrix {
        renderer.concat(anim);
    }
    let flags = props.matrix_flags();
    if flags == MatrixFlags::TRANSLATION {
        renderer.translate(props.translation_x, props.translation_y);
    } else if !flags.is_empty() {
        renderer.concat(&props.transform_matrix(false));
    }

    let bounds = Rect::from_size(props.width(), props.height());
    let mut clip_needed = !props.caching && props.clip_to_bounds;
    if props.alpha < 1.0 {
        if props.caching {
            renderer.set_override_layer_alpha(props.alpha);
        } else if !props.has_overlapping_rendering {
            renderer.scale_alpha(props.alpha);
        } else {
            let mut save_flags = SaveFlags::HAS_ALPHA_LAYER;
            if clip_needed {
                save_flags |= SaveFlags::CLIP_TO_LAYER;
                clip_needed = false;
            }
            log::trace!("{:indent$}SaveLayerAlpha {}", "", props.alpha, indent = level as usize * 2);
            let layer = alloc.alloc(SyntheticOp::SaveLayerAlpha {
                bounds,
                alpha: (props.alpha * 255.0) as u8,
                flags: save_flags,
            });
            handler.accept(renderer, Operation::Synthetic(layer), PROPERTY_SAVE_COUNT, props.clip_to_bounds);
        }
    }
    if clip_needed {
        let clip = alloc.alloc(SyntheticOp::ClipRect { rect: bounds, op: ClipOp::Intersect });
        handler.accept(renderer, Operation::Synthetic(clip), PROPERTY_SAVE_COUNT, props.clip_to_bounds);
    }
    if props.clip_to_outline && !props.outline.is_empty() {
        let clip = alloc.alloc(SyntheticOp::ClipOutline(&props.outline));
        handler.accept(renderer, Operation::Synthetic(clip), PROPERTY_SAVE_COUNT, props.clip_to_bounds);
    }
}

/// Draws the edges projected onto `node`, each under its transform from
/// this receiver, clipped to the receiver's bounds.
fn iterate_projected_children<'f, H>(
    frame: Frame<'f>,
    node: &'f SceneNode,
    renderer: &mut dyn Renderer,
    handler: &mut H,
    level: u32,
) where
    H: OperationHandler<'f> + ?Sized,
{
    let props = node.properties();
    let alloc = handler.allocator();
    let root_restore_to = renderer.save(SaveFlags::MATRIX_CLIP);

    // Projected content may escape intermediate clips, not the receiver's.
    let clip = alloc.alloc(SyntheticOp::ClipRect {
        rect: Rect::from_size(props.width(), props.height()),
        op: ClipOp::Replace,
    });
    handler.accept(renderer, Operation::Synthetic(clip), PROPERTY_SAVE_COUNT, props.clip_to_bounds);

    log::trace!(
        "{:indent$}{} projected children of {}",
        "",
        node.projected_edges().len(),
        node.name(),
        indent = level as usize * 2
    );
    for &edge_ref in node.projected_edges() {
        let edge = frame.graph.edge(edge_ref);
        let restore_to = renderer.save(SaveFlags::MATRIX);
        renderer.concat(&edge.transform_from_compositing_ancestor());
        {
            let _in_place = DrawInPlaceGuard::new(edge);
            let save_count = renderer.save_count() - 1;
            handler.accept(renderer, Operation::Child(edge), save_count, props.clip_to_bounds);
        }
        renderer.restore_to_count(restore_to);
    }

    let restore = alloc.alloc(SyntheticOp::RestoreToCount(root_restore_to));
    handler.accept(renderer, Operation::Synthetic(restore), PROPERTY_SAVE_COUNT, props.clip_to_bounds);
}
