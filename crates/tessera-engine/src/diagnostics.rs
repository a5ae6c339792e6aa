//! Human-readable dumps for debugging.
//!
//! - [`output_log_buffer`]: recent traversal ops plus cache memory usage
//! - [`dump_node`] / [`output`]: recursive print of a node's properties
//!   and recorded ops

use core::fmt::Write as _;
use std::io;

use crate::context::RenderContext;
use crate::scene::{DrawOp, MatrixFlags, NodeKey, RecordedOpList, SaveFlags, SceneGraph};

/// Writes the recent-op ring and the cache report. Nothing is written when
/// no op has been logged yet.
pub fn output_log_buffer(ctx: &RenderContext, out: &mut dyn io::Write) -> io::Result<()> {
    if ctx.op_log.is_empty() {
        return Ok(());
    }
    writeln!(out, "\nRecent DisplayList operations")?;
    ctx.op_log.output_commands(out)?;

    let mut caches = String::new();
    ctx.dump_memory_usage(&mut caches);
    writeln!(out, "\nCaches:\n{caches}")?;
    out.flush()
}

/// Logs [`dump_node`] output line by line at debug level.
pub fn output(graph: &SceneGraph, key: NodeKey, level: u32) {
    let mut text = String::new();
    dump_node(graph, key, level, &mut text);
    for line in text.lines() {
        log::debug!("{line}");
    }
}

/// Appends a recursive description of `key` to `out`. `level` is 1 for a
/// top-level node.
pub fn dump_node(graph: &SceneGraph, key: NodeKey, level: u32, out: &mut String) {
    let node = graph.node(key);
    let outer = level.saturating_sub(1) as usize * 2;
    let inner = level as usize * 2;

    let _ = writeln!(out, "{:outer$}Start display list ({}, render={})", "", node.name(), node.is_renderable());
    let _ = writeln!(out, "{:inner$}Save {:?}", "", SaveFlags::MATRIX_CLIP);
    dump_view_properties(graph, key, inner, out);

    if let Some(list) = node.op_list() {
        for op in list.ops() {
            let _ = writeln!(out, "{:inner$}{}", "", describe_op(op, list));
            if let DrawOp::DrawRenderNode { child } = op {
                if let Some(edge) = list.children().get(*child) {
                    dump_node(graph, edge.child, level + 1, out);
                }
            }
        }
    }
    let _ = writeln!(out, "{:outer$}Done ({})", "", node.name());
}

fn dump_view_properties(graph: &SceneGraph, key: NodeKey, indent: usize, out: &mut String) {
    let props = graph.node(key).properties();
    if props.left != 0.0 || props.top != 0.0 {
        let _ = writeln!(out, "{:indent$}Translate (left, top) {}, {}", "", props.left, props.top);
    }
    if let Some(m) = props.static_matrix {
        let _ = writeln!(out, "{:indent$}ConcatMatrix (static) {m}", "");
    } else if let Some(m) = props.animation_matrix {
        let _ = writeln!(out, "{:indent$}ConcatMatrix (animation) {m}", "");
    }
    let flags = props.matrix_flags();
    if flags == MatrixFlags::TRANSLATION {
        let _ = writeln!(
            out,
            "{:indent$}Translate {:.2}, {:.2}, {:.2}",
            "", props.translation_x, props.translation_y, props.translation_z
        );
    } else if !flags.is_empty() {
        let _ = writeln!(out, "{:indent$}ConcatMatrix {}", "", props.transform_matrix(false));
    }

    let mut clip_needed = !props.caching && props.clip_to_bounds;
    if props.alpha < 1.0 {
        if props.caching {
            let _ = writeln!(out, "{:indent$}SetOverrideLayerAlpha {:.2}", "", props.alpha);
        } else if !props.has_overlapping_rendering {
            let _ = writeln!(out, "{:indent$}ScaleAlpha {:.2}", "", props.alpha);
        } else {
            let mut save_flags = SaveFlags::HAS_ALPHA_LAYER;
            if clip_needed {
                save_flags |= SaveFlags::CLIP_TO_LAYER;
                clip_needed = false;
            }
            let _ = writeln!(
                out,
                "{:indent$}SaveLayerAlpha 0.00, 0.00, {:.2}, {:.2}, {}, {:?}",
                "",
                props.width(),
                props.height(),
                (props.alpha * 255.0) as u8,
                save_flags
            );
        }
    }
    if clip_needed {
        let _ = writeln!(out, "{:indent$}ClipRect 0.00, 0.00, {:.2}, {:.2}", "", props.width(), props.height());
    }
    if props.clip_to_outline && !props.outline.is_empty() {
        let _ = writeln!(out, "{:indent$}ClipOutline {:?}", "", props.outline);
    }
}

fn describe_op(op: &DrawOp, list: &RecordedOpList) -> String {
    let name = op.name();
    match op {
        DrawOp::Save(flags) => format!("{name} {flags:?}"),
        DrawOp::RestoreToCount(count) => format!("{name} {count}"),
        DrawOp::Translate { dx, dy } => format!("{name} {dx:.2}, {dy:.2}"),
        DrawOp::ClipRect { rect, op } => format!(
            "{name} {:.2}, {:.2}, {:.2}, {:.2} {op:?}",
            rect.min().x,
            rect.min().y,
            rect.max().x,
            rect.max().y
        ),
        DrawOp::DrawRect { rect, .. } | DrawOp::DrawRoundRect { rect, .. } => format!(
            "{name} {:.2}, {:.2}, {:.2}, {:.2}",
            rect.min().x,
            rect.min().y,
            rect.max().x,
            rect.max().y
        ),
        DrawOp::DrawText { text, .. } => format!("{name} {text:?}"),
        DrawOp::DrawBitmap { bitmap, .. } => format!("{name} {bitmap}"),
        DrawOp::DrawPatch { patch, .. } => format!("{name} {patch}"),
        DrawOp::DrawLayer { layer, x, y } => format!("{name} {layer} at {x:.2}, {y:.2}"),
        DrawOp::DrawFunctor { functor } => format!("{name} {functor}"),
        DrawOp::DrawRenderNode { child } => match list.children().get(*child) {
            Some(edge) => format!("{name} {:?}", edge.child),
            None => format!("{name} <missing>"),
        },
        _ => name.to_owned(),
    }
}
