use glam::Mat4;

use super::{EdgeRef, NodeKey, SceneGraph};

impl SceneGraph {
    /// Routes every projecting edge below `root` to its receiver and resets
    /// in-order skip flags.
    ///
    /// Must run once per frame before traversal. Top-level projectors land
    /// in `root`'s own projected list.
    pub fn compute_ordering(&mut self, root: NodeKey) {
        let node = self.node_mut(root);
        node.projected.clear();
        let Some(count) = node.op_list.as_ref().map(|l| l.children().len()) else {
            return;
        };
        for index in 0..count {
            self.compute_ordering_impl(EdgeRef { parent: root, index }, root, Mat4::IDENTITY);
        }
    }

    /// `receiver` collects projecting edges; `ambient` maps the receiver's
    /// content space to the edge's parent.
    fn compute_ordering_impl(&mut self, edge: EdgeRef, receiver: NodeKey, ambient: Mat4) {
        let (key, transform_from_parent) = {
            let e = self.edge(edge);
            (e.child, e.transform_from_parent)
        };

        let node = self.node_mut(key);
        node.projected.clear();
        if !node.is_renderable() {
            return;
        }
        let project_backwards = node.properties.project_backwards;
        let is_receiver = node.is_projection_receiver();
        let child_count = node.op_list.as_ref().map_or(0, |l| l.children().len());

        let mut local = ambient * transform_from_parent;

        let e = self.edge_mut(edge);
        e.set_skip_in_order_draw(project_backwards);
        if project_backwards {
            e.set_transform_from_compositing_ancestor(local);
            self.node_mut(receiver).projected.push(edge);
        }

        let mut applied_properties = false;
        for index in 0..child_count {
            let child_edge = EdgeRef { parent: key, index };
            let grandchild = self.edge(child_edge).child;
            let grandchild_projects = self.node(grandchild).properties.project_backwards;

            // A direct child projecting backwards skips this receiver: it
            // would land where it already draws.
            let (target, transform) = if is_receiver && !grandchild_projects {
                (key, Mat4::IDENTITY)
            } else {
                if !applied_properties {
                    self.node(key).properties.apply_view_property_transforms(&mut local, false);
                    applied_properties = true;
                }
                (receiver, local)
            };
            self.compute_ordering_impl(child_edge, target, transform);
        }
    }
}
