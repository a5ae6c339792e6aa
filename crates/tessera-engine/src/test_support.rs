//! Scene-building helpers shared by unit tests.

use glam::Vec2;

use crate::context::RenderContext;
use crate::paint::{Color, Paint};
use crate::scene::{DisplayListRecorder, NodeKey, NodeProperties, SceneGraph};

/// Node whose only content is a text op carrying its name.
pub(crate) fn label_leaf(
    graph: &mut SceneGraph,
    ctx: &RenderContext,
    name: &str,
    props: NodeProperties,
) -> NodeKey {
    build(graph, ctx, name, props, &[], false)
}

/// Label op followed by one child edge per entry in `children`.
pub(crate) fn container(
    graph: &mut SceneGraph,
    ctx: &RenderContext,
    name: &str,
    props: NodeProperties,
    children: &[NodeKey],
) -> NodeKey {
    build(graph, ctx, name, props, children, false)
}

/// Like [`container`], with the projection receive point right after the
/// label.
pub(crate) fn receiver(
    graph: &mut SceneGraph,
    ctx: &RenderContext,
    name: &str,
    props: NodeProperties,
    children: &[NodeKey],
) -> NodeKey {
    build(graph, ctx, name, props, children, true)
}

fn build(
    graph: &mut SceneGraph,
    ctx: &RenderContext,
    name: &str,
    props: NodeProperties,
    children: &[NodeKey],
    receive: bool,
) -> NodeKey {
    let key = graph.create_node(name);
    let mut rec = DisplayListRecorder::new(&ctx.resources);
    rec.draw_text(name, Vec2::ZERO, Paint::fill(Color::BLACK));
    if receive {
        rec.mark_projection_receive_point().expect("label recorded");
    }
    for &child in children {
        rec.draw_render_node(child);
    }
    graph.set_properties(key, props);
    graph.set_op_list(key, Some(rec.finish().expect("balanced recording")), ctx);
    key
}
