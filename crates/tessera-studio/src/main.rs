use std::io::{self, Write as _};

use anyhow::{Context, Result};
use glam::Vec2;
use tessera_engine::context::{RenderConfig, RenderContext};
use tessera_engine::coords::Rect;
use tessera_engine::diagnostics;
use tessera_engine::frame::FrameAllocator;
use tessera_engine::logging::{LoggingConfig, init_logging};
use tessera_engine::paint::{Color, Paint};
use tessera_engine::playback::{Frame, defer, replay};
use tessera_engine::render::{CanvasRenderer, RenderCall};
use tessera_engine::resource::ResourceKind;
use tessera_engine::scene::{DisplayListRecorder, NodeKey, NodeProperties, Outline, SceneGraph};

const WIDTH: f32 = 360.0;
const HEIGHT: f32 = 640.0;
const DIVIDER: Color = Color::from_premul(0.0, 0.0, 0.0, 0.12);

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    println!();
    println!("  ╔════════════════════════════════════════╗");
    println!("  ║         TESSERA SCENE REPLAY v0.1      ║");
    println!("  ║   headless canvas  ·  deferred/replay  ║");
    println!("  ╚════════════════════════════════════════╝");
    println!();

    let ctx = RenderContext::new(RenderConfig::default());
    let mut graph = SceneGraph::new();
    let root = build_scene(&mut graph, &ctx).context("recording demo scene")?;

    graph.compute_ordering(root);

    let mut alloc = FrameAllocator::new();
    let mut immediate = CanvasRenderer::new(WIDTH, HEIGHT);
    replay(Frame::new(&graph, &ctx), root, &mut immediate, &alloc, 0);
    print_draws("immediate", &graph, &immediate);
    alloc.reset();

    let mut tracking = CanvasRenderer::new(WIDTH, HEIGHT);
    let plan = defer(Frame::new(&graph, &ctx), root, &mut tracking, &alloc);
    println!("  deferred plan: {} draws in {} batches", plan.draw_count(), plan.batches().len());
    let mut deferred = CanvasRenderer::new(WIDTH, HEIGHT);
    plan.flush(&mut deferred);
    drop(plan);
    print_draws("deferred", &graph, &deferred);
    alloc.reset();

    let mut dump = String::new();
    diagnostics::dump_node(&graph, root, 1, &mut dump);
    println!("{dump}");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    diagnostics::output_log_buffer(&ctx, &mut out).context("writing op log")?;
    out.flush()?;

    // Every node holds its own resource references, not just the root.
    for key in graph.keys() {
        graph.destroy_deferred(key, &ctx);
    }
    let destroyed = graph.flush_deferred_destruction(&ctx);
    log::info!("destroyed {destroyed} node(s), {} still live", graph.len());
    Ok(())
}

/// A list of cards with a floating action button and a ripple that projects
/// onto the list background.
fn build_scene(graph: &mut SceneGraph, ctx: &RenderContext) -> Result<NodeKey> {
    let avatar = ctx.resources.register(ResourceKind::Bitmap, 48 * 48 * 4);

    let ripple = graph.create_node("ripple");
    graph.set_properties(ripple, NodeProperties {
        project_backwards: true,
        alpha: 0.3,
        ..NodeProperties::with_bounds(-20.0, -20.0, 140.0, 100.0)
    });
    let mut rec = DisplayListRecorder::new(&ctx.resources);
    rec.draw_circle(Vec2::new(80.0, 60.0), 80.0, Paint::fill(Color::WHITE));
    graph.set_op_list(ripple, Some(rec.finish()?), ctx);

    let mut cards = Vec::new();
    for i in 0..3 {
        let card = graph.create_node(format!("card{i}"));
        let top = 16.0 + i as f32 * 96.0;
        graph.set_properties(card, NodeProperties {
            translation_z: 2.0,
            casts_shadow: true,
            outline: Outline::round_rect(Rect::from_size(328.0, 80.0), 8.0),
            clip_to_outline: true,
            ..NodeProperties::with_bounds(16.0, top, 344.0, top + 80.0)
        });
        let mut rec = DisplayListRecorder::new(&ctx.resources);
        rec.draw_round_rect(Rect::from_size(328.0, 80.0), 8.0, 8.0, Paint::fill(Color::WHITE));
        rec.draw_round_rect(Rect::from_size(328.0, 80.0), 8.0, 8.0, Paint::stroke(DIVIDER, 1.0));
        rec.draw_bitmap(avatar, Rect::new(16.0, 16.0, 48.0, 48.0), None);
        rec.draw_text(format!("Card {i}"), Vec2::new(80.0, 44.0), Paint::default());
        if i == 1 {
            rec.draw_render_node(ripple);
        }
        graph.set_op_list(card, Some(rec.finish()?), ctx);
        cards.push(card);
    }

    let fab = graph.create_node("fab");
    graph.set_properties(fab, NodeProperties {
        translation_z: 6.0,
        casts_shadow: true,
        outline: Outline::round_rect(Rect::from_size(56.0, 56.0), 28.0),
        ..NodeProperties::with_bounds(288.0, 568.0, 344.0, 624.0)
    });
    let mut rec = DisplayListRecorder::new(&ctx.resources);
    rec.draw_circle(Vec2::new(28.0, 28.0), 28.0, Paint::fill(Color::from_srgb_u8(0x62, 0x00, 0xee, 0xff)));
    graph.set_op_list(fab, Some(rec.finish()?), ctx);

    let root = graph.create_node("list");
    graph.set_properties(root, NodeProperties::with_bounds(0.0, 0.0, WIDTH, HEIGHT));
    let mut rec = DisplayListRecorder::new(&ctx.resources);
    rec.draw_color(Color::from_srgb_u8(0xf5, 0xf5, 0xf5, 0xff));
    rec.mark_projection_receive_point()?;
    for &card in &cards {
        rec.draw_render_node(card);
    }
    rec.draw_render_node(fab);
    graph.set_op_list(root, Some(rec.finish()?), ctx);

    // The scene holds the only references now.
    ctx.resources.destructor(avatar);
    Ok(root)
}

fn print_draws(mode: &str, graph: &SceneGraph, canvas: &CanvasRenderer) {
    println!("  [{mode}]");
    for call in canvas.draw_calls() {
        match call {
            RenderCall::Draw { name, label, transform, alpha } => {
                let at = transform.w_axis;
                match label {
                    Some(label) => println!("    {name:<14} {label:?} at ({:.0}, {:.0}) alpha {alpha:.2}", at.x, at.y),
                    None => println!("    {name:<14} at ({:.0}, {:.0}) alpha {alpha:.2}", at.x, at.y),
                }
            }
            RenderCall::Shadow { caster, alpha, .. } => {
                let name = graph.get(*caster).map_or("?", |n| n.name());
                println!("    {:<14} {name} alpha {alpha:.2}", "DrawShadow");
            }
            _ => {}
        }
    }
    println!();
}
