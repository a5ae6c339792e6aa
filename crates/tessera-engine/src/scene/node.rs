use super::{EdgeRef, NodeProperties, RecordedOpList};

/// A node in the scene graph: properties, optional content and the edges
/// projected onto it by the last ordering pass.
#[derive(Debug, Default)]
pub struct SceneNode {
    name: String,
    pub(crate) properties: NodeProperties,
    pub(crate) op_list: Option<RecordedOpList>,
    pub(crate) projected: Vec<EdgeRef>,
}

impl SceneNode {
    pub(crate) fn new(name: String) -> Self {
        Self { name, ..Self::default() }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn properties(&self) -> &NodeProperties {
        &self.properties
    }

    #[inline]
    pub fn op_list(&self) -> Option<&RecordedOpList> {
        self.op_list.as_ref()
    }

    /// Has content to draw.
    #[inline]
    pub fn is_renderable(&self) -> bool {
        self.op_list.as_ref().is_some_and(|l| !l.is_empty())
    }

    /// Edges this node draws at its projection receive point, in
    /// discovery order.
    #[inline]
    pub fn projected_edges(&self) -> &[EdgeRef] {
        &self.projected
    }

    /// Receives projections iff its content marks a receive point.
    #[inline]
    pub fn is_projection_receiver(&self) -> bool {
        self.op_list
            .as_ref()
            .is_some_and(|l| l.projection_receive_index().is_some())
    }
}
