use super::traverse::{DrawInPlaceGuard, PROPERTY_SAVE_COUNT};
use super::{Frame, Operation, OperationHandler, ShadowOp, SyntheticOp};
use crate::coords::Rect;
use crate::render::Renderer;
use crate::scene::{ChildEdge, ClipOp, RecordedOpList, SaveFlags, SceneGraph, SceneNode};

/// Casters closer than this in Z to the previous caster have their shadows
/// drawn as one group, ahead of any of their content.
pub const SHADOW_DELTA: f32 = 0.1;

/// Elevated child paired with its Z.
#[derive(Debug, Clone, Copy)]
pub struct ZChild<'f> {
    pub z: f32,
    pub edge: &'f ChildEdge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildrenSelectMode {
    NegativeZ,
    PositiveZ,
}

/// Elevated children of `list`, sorted by Z with ties in sibling order.
///
/// Elevated edges are flagged to skip in-order drawing; unelevated edges
/// are flagged to draw in place. Projecting edges are left out whatever
/// their Z, and keep the flag set by ordering: they draw only at their
/// receiver.
pub fn build_z_sorted_child_list<'f>(graph: &'f SceneGraph, list: &'f RecordedOpList) -> Vec<ZChild<'f>> {
    let mut z_children = Vec::new();
    for edge in list.children() {
        let props = graph.node(edge.child).properties();
        if props.project_backwards {
            continue;
        }
        let z = props.translation_z;
        if z != 0.0 {
            z_children.push(ZChild { z, edge });
        }
        edge.set_skip_in_order_draw(z != 0.0);
    }
    // `sort_by` is stable.
    z_children.sort_by(|a, b| a.z.total_cmp(&b.z));
    z_children
}

/// Draws the negative-Z prefix or non-negative suffix of `z_children`,
/// interleaving shadows for the non-negative side.
pub(crate) fn iterate_3d_children<'f, H>(
    frame: Frame<'f>,
    node: &'f SceneNode,
    z_children: &[ZChild<'f>],
    mode: ChildrenSelectMode,
    renderer: &mut dyn Renderer,
    handler: &mut H,
) where
    H: OperationHandler<'f> + ?Sized,
{
    let size = z_children.len();
    let nothing_selected = match mode {
        ChildrenSelectMode::NegativeZ => z_children.first().is_none_or(|c| c.z > 0.0),
        ChildrenSelectMode::PositiveZ => z_children.last().is_none_or(|c| c.z < 0.0),
    };
    if nothing_selected {
        return;
    }

    let props = node.properties();
    let clip_to_bounds = props.clip_to_bounds;
    let alloc = handler.allocator();

    let root_restore_to = renderer.save(SaveFlags::MATRIX_CLIP);
    let clip = alloc.alloc(SyntheticOp::ClipRect {
        rect: Rect::from_size(props.width(), props.height()),
        op: ClipOp::Intersect,
    });
    handler.accept(renderer, Operation::Synthetic(clip), PROPERTY_SAVE_COUNT, clip_to_bounds);

    let non_negative = z_children.iter().position(|c| c.z >= 0.0).unwrap_or(size);
    let (mut draw_index, end, mut shadow_index) = match mode {
        ChildrenSelectMode::NegativeZ => (0, non_negative, non_negative),
        ChildrenSelectMode::PositiveZ => (non_negative, size, non_negative),
    };

    let mut last_caster_z = 0.0;
    while shadow_index < end || draw_index < end {
        if shadow_index < end {
            let ZChild { z: caster_z, edge } = z_children[shadow_index];
            if shadow_index == draw_index || caster_z - last_caster_z < SHADOW_DELTA {
                let caster = frame.graph.node(edge.child).properties();
                if caster.casts_shadow && caster.alpha > 0.0 {
                    let mut transform_xy = edge.transform_from_parent;
                    caster.apply_view_property_transforms(&mut transform_xy, false);
                    let mut transform_z = edge.transform_from_parent;
                    caster.apply_view_property_transforms(&mut transform_z, true);

                    let shadow = alloc.alloc(SyntheticOp::DrawShadow(ShadowOp {
                        caster: edge.child,
                        transform_xy,
                        transform_z,
                        alpha: caster.alpha,
                        outline: &caster.outline,
                        width: caster.width(),
                        height: caster.height(),
                    }));
                    handler.accept(renderer, Operation::Synthetic(shadow), PROPERTY_SAVE_COUNT, clip_to_bounds);
                }
                // Suppressed shadows still advance the cursor.
                last_caster_z = caster_z;
                shadow_index += 1;
                continue;
            }
        }

        let edge = z_children[draw_index].edge;
        let restore_to = renderer.save(SaveFlags::MATRIX);
        renderer.concat(&edge.transform_from_parent);
        {
            let _in_place = DrawInPlaceGuard::new(edge);
            let save_count = renderer.save_count() - 1;
            handler.accept(renderer, Operation::Child(edge), save_count, clip_to_bounds);
        }
        renderer.restore_to_count(restore_to);
        draw_index += 1;
    }

    let restore = alloc.alloc(SyntheticOp::RestoreToCount(root_restore_to));
    handler.accept(renderer, Operation::Synthetic(restore), PROPERTY_SAVE_COUNT, clip_to_bounds);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RenderContext;
    use crate::scene::NodeProperties;
    use crate::test_support::{container, label_leaf};

    fn elevated(z: f32) -> NodeProperties {
        NodeProperties { translation_z: z, ..NodeProperties::with_bounds(0.0, 0.0, 10.0, 10.0) }
    }

    fn permutations(items: &[usize]) -> Vec<Vec<usize>> {
        if items.len() <= 1 {
            return vec![items.to_vec()];
        }
        let mut out = Vec::new();
        for (i, &first) in items.iter().enumerate() {
            let mut rest = items.to_vec();
            rest.remove(i);
            for mut tail in permutations(&rest) {
                tail.insert(0, first);
                out.push(tail);
            }
        }
        out
    }

    #[test]
    fn equal_elevations_keep_sibling_order() {
        let ctx = RenderContext::default();
        let mut graph = SceneGraph::new();
        let names = ["a", "b", "c", "d", "e"];
        let zs = [2.0, -1.0, 2.0, 0.0, 2.0];
        let children: Vec<_> = names
            .iter()
            .zip(zs)
            .map(|(name, z)| label_leaf(&mut graph, &ctx, name, elevated(z)))
            .collect();
        let parent = container(&mut graph, &ctx, "p", NodeProperties::default(), &children);

        let list = graph.node(parent).op_list().expect("recorded");
        let sorted = build_z_sorted_child_list(&graph, list);
        let order: Vec<_> = sorted.iter().map(|c| graph.node(c.edge.child).name()).collect();
        assert_eq!(order, ["b", "a", "c", "e"]);

        let skips: Vec<_> = list.children().iter().map(|e| e.skip_in_order_draw()).collect();
        assert_eq!(skips, [true, true, true, false, true]);
    }

    #[test]
    fn equal_elevations_keep_sibling_order_for_every_insertion_order() {
        let ctx = RenderContext::default();
        let mut graph = SceneGraph::new();
        let names = ["a", "b", "c", "d"];
        // Two Z groups so ties sit next to a different elevation.
        let zs = [1.0, 1.0, 1.0, 4.0];
        let leaves: Vec<_> = names
            .iter()
            .zip(zs)
            .map(|(name, z)| label_leaf(&mut graph, &ctx, name, elevated(z)))
            .collect();

        for order in permutations(&[0, 1, 2, 3]) {
            let children: Vec<_> = order.iter().map(|&i| leaves[i]).collect();
            let parent = container(&mut graph, &ctx, "p", NodeProperties::default(), &children);

            let list = graph.node(parent).op_list().expect("recorded");
            let sorted: Vec<_> = build_z_sorted_child_list(&graph, list)
                .iter()
                .map(|c| graph.node(c.edge.child).name().to_owned())
                .collect();
            let mut expected: Vec<_> = order
                .iter()
                .filter(|&&i| zs[i] == 1.0)
                .map(|&i| names[i].to_owned())
                .collect();
            expected.push("d".to_owned());
            assert_eq!(sorted, expected, "insertion order {order:?}");
        }
    }

    #[test]
    fn projecting_unelevated_child_keeps_its_skip_flag() {
        let ctx = RenderContext::default();
        let mut graph = SceneGraph::new();
        let projector = label_leaf(&mut graph, &ctx, "x", NodeProperties {
            project_backwards: true,
            ..NodeProperties::default()
        });
        let parent = container(&mut graph, &ctx, "p", NodeProperties::default(), &[projector]);

        let list = graph.node(parent).op_list().expect("recorded");
        list.children()[0].set_skip_in_order_draw(true);
        assert!(build_z_sorted_child_list(&graph, list).is_empty());
        assert!(list.children()[0].skip_in_order_draw());
    }

    #[test]
    fn elevated_projector_stays_out_of_the_z_list() {
        let ctx = RenderContext::default();
        let mut graph = SceneGraph::new();
        let projector = label_leaf(&mut graph, &ctx, "x", NodeProperties {
            project_backwards: true,
            ..elevated(3.0)
        });
        let sibling = label_leaf(&mut graph, &ctx, "y", elevated(3.0));
        let parent = container(&mut graph, &ctx, "p", NodeProperties::default(), &[projector, sibling]);

        let list = graph.node(parent).op_list().expect("recorded");
        list.children()[0].set_skip_in_order_draw(true);
        let sorted = build_z_sorted_child_list(&graph, list);
        assert_eq!(sorted.len(), 1);
        assert_eq!(sorted[0].edge.child, sibling);
        assert!(list.children()[0].skip_in_order_draw());
    }
}
