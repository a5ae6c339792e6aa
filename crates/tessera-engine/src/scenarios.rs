//! End-to-end frames: ordering, then deferred or immediate playback onto a
//! [`CanvasRenderer`].

use glam::{Mat4, Vec3};

use crate::context::RenderContext;
use crate::frame::FrameAllocator;
use crate::logging::{LoggingConfig, init_logging};
use crate::playback::{Frame, defer, replay};
use crate::render::{CanvasRenderer, RenderCall};
use crate::scene::{NodeKey, NodeProperties, SaveFlags, SceneGraph};
use crate::test_support::{container, label_leaf, receiver};

fn replay_frame(graph: &mut SceneGraph, ctx: &RenderContext, root: NodeKey) -> CanvasRenderer {
    init_logging(LoggingConfig::for_tests());
    graph.compute_ordering(root);
    let alloc = FrameAllocator::new();
    let mut canvas = CanvasRenderer::new(200.0, 200.0);
    replay(Frame::new(graph, ctx), root, &mut canvas, &alloc, 0);
    canvas
}

fn defer_frame(graph: &mut SceneGraph, ctx: &RenderContext, root: NodeKey) -> CanvasRenderer {
    init_logging(LoggingConfig::for_tests());
    graph.compute_ordering(root);
    let alloc = FrameAllocator::new();
    let mut tracking = CanvasRenderer::new(200.0, 200.0);
    let plan = defer(Frame::new(graph, ctx), root, &mut tracking, &alloc);
    assert!(tracking.draw_calls().next().is_none(), "deferring must not draw");

    let mut canvas = CanvasRenderer::new(200.0, 200.0);
    plan.flush(&mut canvas);
    canvas
}

fn bounds(size: f32) -> NodeProperties {
    NodeProperties::with_bounds(0.0, 0.0, size, size)
}

fn elevated(z: f32, casts_shadow: bool) -> NodeProperties {
    NodeProperties { translation_z: z, casts_shadow, ..bounds(20.0) }
}

/// Draw and shadow calls as (kind, label or caster name).
fn draw_sequence(graph: &SceneGraph, canvas: &CanvasRenderer) -> Vec<String> {
    canvas
        .draw_calls()
        .map(|call| match call {
            RenderCall::Draw { label: Some(label), .. } => label.clone(),
            RenderCall::Draw { name, .. } => (*name).to_owned(),
            RenderCall::Shadow { caster, .. } => format!("shadow:{}", graph.node(*caster).name()),
            other => unreachable!("{other:?}"),
        })
        .collect()
}

fn draw_transform(canvas: &CanvasRenderer, label: &str) -> Mat4 {
    let mut found = canvas.calls().iter().filter_map(|c| match c {
        RenderCall::Draw { label: Some(l), transform, .. } if l == label => Some(*transform),
        _ => None,
    });
    let transform = found.next().expect("label drawn");
    assert!(found.next().is_none(), "{label} drawn more than once");
    transform
}

#[test]
fn unelevated_children_draw_in_recorded_order() {
    let ctx = RenderContext::default();
    let mut graph = SceneGraph::new();
    let a = label_leaf(&mut graph, &ctx, "a", bounds(10.0));
    let b = label_leaf(&mut graph, &ctx, "b", bounds(10.0));
    let root = container(&mut graph, &ctx, "root", bounds(100.0), &[a, b]);

    let canvas = replay_frame(&mut graph, &ctx, root);
    assert_eq!(canvas.draw_labels(), ["root", "a", "b"]);
    // Only the per-node property saves; no 3D pass ran.
    let saves = canvas
        .calls()
        .iter()
        .filter(|c| matches!(c, RenderCall::Save { flags, .. } if *flags == SaveFlags::MATRIX_CLIP))
        .count();
    assert_eq!(saves, 3);
}

#[test]
fn negative_then_content_then_positive_with_merged_shadows() {
    let ctx = RenderContext::default();
    let mut graph = SceneGraph::new();
    let below = label_leaf(&mut graph, &ctx, "below", elevated(-2.0, true));
    let p = label_leaf(&mut graph, &ctx, "p", elevated(3.0, true));
    let q = label_leaf(&mut graph, &ctx, "q", elevated(3.0, true));
    let root = container(&mut graph, &ctx, "root", bounds(100.0), &[below, p, q]);

    let canvas = replay_frame(&mut graph, &ctx, root);
    assert_eq!(
        draw_sequence(&graph, &canvas),
        ["below", "root", "shadow:p", "shadow:q", "p", "q"]
    );
}

#[test]
fn nearby_elevations_group_shadows_regardless_of_sibling_order() {
    let ctx = RenderContext::default();
    let mut graph = SceneGraph::new();
    let high = label_leaf(&mut graph, &ctx, "high", elevated(3.05, true));
    let low = label_leaf(&mut graph, &ctx, "low", elevated(3.0, true));
    let root = container(&mut graph, &ctx, "root", bounds(100.0), &[high, low]);

    let canvas = replay_frame(&mut graph, &ctx, root);
    assert_eq!(
        draw_sequence(&graph, &canvas),
        ["root", "shadow:low", "shadow:high", "low", "high"]
    );
}

#[test]
fn distant_elevations_interleave_shadows() {
    let ctx = RenderContext::default();
    let mut graph = SceneGraph::new();
    let a = label_leaf(&mut graph, &ctx, "a", elevated(1.0, true));
    let b = label_leaf(&mut graph, &ctx, "b", elevated(5.0, true));
    let root = container(&mut graph, &ctx, "root", bounds(100.0), &[a, b]);

    let canvas = replay_frame(&mut graph, &ctx, root);
    assert_eq!(
        draw_sequence(&graph, &canvas),
        ["root", "shadow:a", "a", "shadow:b", "b"]
    );
}

#[test]
fn suppressed_shadow_still_advances_the_shadow_cursor() {
    let ctx = RenderContext::default();
    let mut graph = SceneGraph::new();
    let silent = label_leaf(&mut graph, &ctx, "silent", elevated(2.0, false));
    let near = label_leaf(&mut graph, &ctx, "near", elevated(2.05, true));
    let root = container(&mut graph, &ctx, "root", bounds(100.0), &[silent, near]);

    let canvas = replay_frame(&mut graph, &ctx, root);
    // "near" is within range of the suppressed caster, so its shadow still
    // precedes both draws.
    assert_eq!(
        draw_sequence(&graph, &canvas),
        ["root", "shadow:near", "silent", "near"]
    );
}

#[test]
fn projected_descendant_draws_once_at_receiver() {
    let ctx = RenderContext::default();
    let mut graph = SceneGraph::new();
    let x = label_leaf(&mut graph, &ctx, "X", NodeProperties {
        project_backwards: true,
        ..NodeProperties::with_bounds(1.0, 2.0, 11.0, 12.0)
    });
    let g = container(&mut graph, &ctx, "G", NodeProperties::with_bounds(5.0, 7.0, 60.0, 60.0), &[x]);
    let p = receiver(&mut graph, &ctx, "P", NodeProperties::with_bounds(10.0, 10.0, 110.0, 110.0), &[g]);
    let root = container(&mut graph, &ctx, "root", bounds(200.0), &[p]);

    let canvas = replay_frame(&mut graph, &ctx, root);
    assert_eq!(canvas.draw_labels(), ["root", "P", "X", "G"]);

    let origin = draw_transform(&canvas, "X").transform_point3(Vec3::ZERO);
    assert_eq!(origin, Vec3::new(16.0, 19.0, 0.0));

    // Skip flags are back to "skip" after the projected draw.
    let g_list = graph.node(g).op_list().expect("recorded");
    assert!(g_list.children()[0].skip_in_order_draw());
}

#[test]
fn elevated_projector_draws_once_at_receiver() {
    let ctx = RenderContext::default();
    let mut graph = SceneGraph::new();
    let x = label_leaf(&mut graph, &ctx, "X", NodeProperties {
        project_backwards: true,
        translation_z: 3.0,
        casts_shadow: true,
        ..NodeProperties::with_bounds(1.0, 2.0, 11.0, 12.0)
    });
    let g = container(&mut graph, &ctx, "G", NodeProperties::with_bounds(5.0, 7.0, 60.0, 60.0), &[x]);
    let p = receiver(&mut graph, &ctx, "P", NodeProperties::with_bounds(10.0, 10.0, 110.0, 110.0), &[g]);
    let root = container(&mut graph, &ctx, "root", bounds(200.0), &[p]);

    for canvas in [replay_frame(&mut graph, &ctx, root), defer_frame(&mut graph, &ctx, root)] {
        // G's positive pass must not pick X up again.
        assert_eq!(draw_sequence(&graph, &canvas), ["root", "P", "X", "G"]);
        let origin = draw_transform(&canvas, "X").transform_point3(Vec3::ZERO);
        assert_eq!((origin.x, origin.y), (16.0, 19.0));
    }
}

#[test]
fn projection_survives_quick_reject_of_in_place_parent() {
    let ctx = RenderContext::default();
    let mut graph = SceneGraph::new();
    let x = label_leaf(&mut graph, &ctx, "X", NodeProperties {
        project_backwards: true,
        ..NodeProperties::with_bounds(-490.0, 0.0, -480.0, 10.0)
    });
    // G lies outside the viewport and is rejected wholesale.
    let g = container(&mut graph, &ctx, "G", NodeProperties::with_bounds(500.0, 0.0, 550.0, 50.0), &[x]);
    let p = receiver(&mut graph, &ctx, "P", NodeProperties::with_bounds(10.0, 10.0, 110.0, 110.0), &[g]);
    let root = container(&mut graph, &ctx, "root", bounds(200.0), &[p]);

    let canvas = replay_frame(&mut graph, &ctx, root);
    assert_eq!(canvas.draw_labels(), ["root", "P", "X"]);
    let origin = draw_transform(&canvas, "X").transform_point3(Vec3::ZERO);
    assert_eq!(origin, Vec3::new(20.0, 10.0, 0.0));
}

#[test]
fn alpha_uses_narrowest_representation() {
    let ctx = RenderContext::default();
    let mut graph = SceneGraph::new();
    let layered = label_leaf(&mut graph, &ctx, "layered", NodeProperties { alpha: 0.2, ..bounds(10.0) });
    let scaled = label_leaf(&mut graph, &ctx, "scaled", NodeProperties {
        alpha: 0.5,
        has_overlapping_rendering: false,
        ..bounds(10.0)
    });
    let cached = label_leaf(&mut graph, &ctx, "cached", NodeProperties {
        alpha: 0.25,
        caching: true,
        ..bounds(10.0)
    });
    let hidden = label_leaf(&mut graph, &ctx, "hidden", NodeProperties { alpha: 0.0, ..bounds(10.0) });
    let root = container(&mut graph, &ctx, "root", bounds(100.0), &[layered, scaled, cached, hidden]);

    let canvas = replay_frame(&mut graph, &ctx, root);
    assert_eq!(canvas.draw_labels(), ["root", "layered", "scaled", "cached"]);

    let alpha_of = |label: &str| {
        canvas.calls().iter().find_map(|c| match c {
            RenderCall::Draw { label: Some(l), alpha, .. } if l == label => Some(*alpha),
            _ => None,
        })
    };
    assert_eq!(alpha_of("layered"), Some(51.0 / 255.0));
    assert_eq!(alpha_of("scaled"), Some(0.5));
    assert_eq!(alpha_of("cached"), Some(0.25));

    let layers: Vec<_> = canvas
        .calls()
        .iter()
        .filter_map(|c| match c {
            RenderCall::SaveLayerAlpha { alpha, flags, .. } => Some((*alpha, *flags)),
            _ => None,
        })
        .collect();
    assert_eq!(layers, [(51u8, SaveFlags::HAS_ALPHA_LAYER | SaveFlags::CLIP_TO_LAYER)]);
    // Override alpha does not leak past the node.
    assert_eq!(canvas.override_layer_alpha(), 1.0);
}

#[test]
fn deferred_and_immediate_modes_draw_the_same_frame() {
    let build = |graph: &mut SceneGraph, ctx: &RenderContext| {
        let x = label_leaf(graph, ctx, "X", NodeProperties {
            project_backwards: true,
            ..NodeProperties::with_bounds(3.0, 3.0, 13.0, 13.0)
        });
        let lifted = label_leaf(graph, ctx, "lifted", NodeProperties {
            rotation: 15.0,
            ..elevated(4.0, true)
        });
        let sunk = label_leaf(graph, ctx, "sunk", elevated(-1.0, false));
        let faded = label_leaf(graph, ctx, "faded", NodeProperties {
            alpha: 0.5,
            ..NodeProperties::with_bounds(30.0, 0.0, 60.0, 30.0)
        });
        let g = container(graph, ctx, "G", NodeProperties::with_bounds(20.0, 20.0, 80.0, 80.0), &[x, faded]);
        let p = receiver(graph, ctx, "P", bounds(150.0), &[sunk, g, lifted]);
        container(graph, ctx, "root", bounds(200.0), &[p])
    };

    let ctx = RenderContext::default();
    let mut graph = SceneGraph::new();
    let root = build(&mut graph, &ctx);

    let immediate = replay_frame(&mut graph, &ctx, root);
    let deferred = defer_frame(&mut graph, &ctx, root);

    let immediate_draws: Vec<_> = immediate.draw_calls().cloned().collect();
    let deferred_draws: Vec<_> = deferred.draw_calls().cloned().collect();
    assert_eq!(immediate_draws, deferred_draws);
    assert_eq!(
        draw_sequence(&graph, &immediate),
        ["root", "sunk", "P", "X", "G", "faded", "shadow:lifted", "lifted"]
    );
}

#[test]
fn replay_brackets_each_node_with_marks_and_logs_ops() {
    let ctx = RenderContext::default();
    let mut graph = SceneGraph::new();
    let leaf = label_leaf(&mut graph, &ctx, "leaf", bounds(10.0));
    let root = container(&mut graph, &ctx, "root", bounds(100.0), &[leaf]);

    let canvas = replay_frame(&mut graph, &ctx, root);
    let calls = canvas.calls();
    assert_eq!(calls.first(), Some(&RenderCall::StartMark("root".into())));
    assert_eq!(calls.last(), Some(&RenderCall::EndMark));
    let marks = calls.iter().filter(|c| matches!(c, RenderCall::StartMark(_))).count();
    assert_eq!(marks, 2);

    // root: DrawText, DrawRenderNode; leaf: DrawText.
    assert_eq!(ctx.op_log.len(), 3);
}

#[test]
fn ordering_twice_renders_identically() {
    let ctx = RenderContext::default();
    let mut graph = SceneGraph::new();
    let x = label_leaf(&mut graph, &ctx, "X", NodeProperties { project_backwards: true, ..bounds(10.0) });
    let g = container(&mut graph, &ctx, "G", bounds(50.0), &[x]);
    let root = receiver(&mut graph, &ctx, "root", bounds(100.0), &[g]);

    graph.compute_ordering(root);
    let first = replay_frame(&mut graph, &ctx, root);
    let second = replay_frame(&mut graph, &ctx, root);
    assert_eq!(first.calls(), second.calls());
    assert_eq!(first.draw_labels(), ["root", "X", "G"]);
}

#[test]
#[should_panic(expected = "drawing after destruction")]
fn drawing_a_destroyed_child_is_fatal() {
    let ctx = RenderContext::default();
    let mut graph = SceneGraph::new();
    let leaf = label_leaf(&mut graph, &ctx, "leaf", bounds(10.0));
    let root = container(&mut graph, &ctx, "root", bounds(100.0), &[leaf]);
    graph.destroy(leaf, &ctx);

    let alloc = FrameAllocator::new();
    let mut canvas = CanvasRenderer::unbounded();
    replay(Frame::new(&graph, &ctx), root, &mut canvas, &alloc, 0);
}
