use slotmap::SlotMap;

use super::{ChildEdge, EdgeRef, NodeKey, NodeProperties, RecordedOpList, SceneNode, fatal};
use crate::context::RenderContext;

/// Owner of every scene node.
///
/// Keys are generational: a key whose node was destroyed resolves to
/// nothing, and traversing or destroying it again is fatal.
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: SlotMap<NodeKey, SceneNode>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_node(&mut self, name: impl Into<String>) -> NodeKey {
        let name = name.into();
        let key = self.nodes.insert(SceneNode::new(name));
        log::trace!("created node {key:?}");
        key
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    /// Keys of every live node, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = NodeKey> + '_ {
        self.nodes.keys()
    }

    #[inline]
    pub fn get(&self, key: NodeKey) -> Option<&SceneNode> {
        self.nodes.get(key)
    }

    /// Live node for `key`. Using a destroyed node is fatal.
    #[track_caller]
    pub fn node(&self, key: NodeKey) -> &SceneNode {
        match self.nodes.get(key) {
            Some(node) => node,
            None => fatal(format_args!("{key:?} is drawing after destruction")),
        }
    }

    #[track_caller]
    pub(crate) fn node_mut(&mut self, key: NodeKey) -> &mut SceneNode {
        match self.nodes.get_mut(key) {
            Some(node) => node,
            None => fatal(format_args!("{key:?} used after destruction")),
        }
    }

    #[track_caller]
    pub fn edge(&self, edge: EdgeRef) -> &ChildEdge {
        let parent = self.node(edge.parent);
        match parent.op_list().and_then(|l| l.children().get(edge.index)) {
            Some(e) => e,
            None => fatal(format_args!(
                "stale edge {} of {:?} ({})",
                edge.index,
                edge.parent,
                parent.name()
            )),
        }
    }

    #[track_caller]
    pub(crate) fn edge_mut(&mut self, edge: EdgeRef) -> &mut ChildEdge {
        let parent = self.node_mut(edge.parent);
        match parent.op_list.as_mut().and_then(|l| l.children_mut().get_mut(edge.index)) {
            Some(e) => e,
            None => fatal(format_args!("stale edge {} of {:?}", edge.index, edge.parent)),
        }
    }

    pub fn set_properties(&mut self, key: NodeKey, properties: NodeProperties) {
        self.node_mut(key).properties = properties;
    }

    pub fn properties_mut(&mut self, key: NodeKey) -> &mut NodeProperties {
        &mut self.node_mut(key).properties
    }

    /// Replaces the node's content. The old list's resources are released
    /// and the new list's functors registered.
    pub fn set_op_list(&mut self, key: NodeKey, list: Option<RecordedOpList>, ctx: &RenderContext) {
        let node = self.node_mut(key);
        if let Some(mut old) = node.op_list.take() {
            old.cleanup_resources(ctx);
        }
        node.projected.clear();
        if let Some(list) = &list {
            ctx.register_functors(list.functor_count());
        }
        node.op_list = list;
    }

    /// Destroys the node now and releases its content.
    ///
    /// Must not be called while a traversal of this graph is in flight; use
    /// [`destroy_deferred`](Self::destroy_deferred) instead.
    #[track_caller]
    pub fn destroy(&mut self, key: NodeKey, ctx: &RenderContext) {
        let Some(mut node) = self.nodes.remove(key) else {
            fatal(format_args!("double destroyed node {key:?}"));
        };
        if let Some(list) = node.op_list.as_mut() {
            list.cleanup_resources(ctx);
        }
        log::debug!("destroyed node {key:?} ({})", node.name());
    }

    /// Queues destruction until [`flush_deferred_destruction`](Self::flush_deferred_destruction).
    pub fn destroy_deferred(&self, key: NodeKey, ctx: &RenderContext) {
        ctx.queue_destruction(key);
    }

    /// Destroys every queued node; returns how many were destroyed.
    pub fn flush_deferred_destruction(&mut self, ctx: &RenderContext) -> usize {
        let pending = ctx.take_pending_destruction();
        for &key in &pending {
            self.destroy(key, ctx);
        }
        pending.len()
    }
}
