use core::cell::Cell;

use glam::Mat4;

use super::{DrawOp, NodeKey, Path, Region};
use crate::context::RenderContext;
use crate::paint::Paint;
use crate::resource::{ResourceCache, ResourceId};

/// Parent-to-child link stored in the parent's op list.
#[derive(Debug)]
pub struct ChildEdge {
    pub child: NodeKey,
    /// Recording-time transform from the parent's content space.
    pub transform_from_parent: Mat4,
    /// Set by ordering for edges drawn out of order (3D or projected).
    skip_in_order_draw: Cell<bool>,
    /// Accumulated transform from the projection receiver to this edge.
    transform_from_compositing_ancestor: Mat4,
}

impl ChildEdge {
    pub fn new(child: NodeKey, transform_from_parent: Mat4) -> Self {
        Self {
            child,
            transform_from_parent,
            skip_in_order_draw: Cell::new(false),
            transform_from_compositing_ancestor: Mat4::IDENTITY,
        }
    }

    #[inline]
    pub fn skip_in_order_draw(&self) -> bool {
        self.skip_in_order_draw.get()
    }

    #[inline]
    pub(crate) fn set_skip_in_order_draw(&self, skip: bool) {
        self.skip_in_order_draw.set(skip);
    }

    #[inline]
    pub fn transform_from_compositing_ancestor(&self) -> Mat4 {
        self.transform_from_compositing_ancestor
    }

    #[inline]
    pub(crate) fn set_transform_from_compositing_ancestor(&mut self, m: Mat4) {
        self.transform_from_compositing_ancestor = m;
    }
}

/// Address of a [`ChildEdge`]: the parent node and the edge's index in its
/// op list.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct EdgeRef {
    pub parent: NodeKey,
    pub index: usize,
}

/// Shared resources referenced by an op list, by release policy.
#[derive(Debug, Default)]
pub(crate) struct ResourceRefs {
    pub bitmaps: Vec<ResourceId>,
    /// Bitmaps the list owns outright: destroyed along with it.
    pub owned_bitmaps: Vec<ResourceId>,
    pub patches: Vec<ResourceId>,
    /// Paint shader copies: destroyed along with the list.
    pub shaders: Vec<ResourceId>,
    pub source_paths: Vec<ResourceId>,
    pub layers: Vec<ResourceId>,
}

/// Immutable recording of a node's content.
///
/// Produced by [`DisplayListRecorder`](super::DisplayListRecorder). While a
/// list is alive it holds one cache reference per recorded resource use;
/// [`cleanup_resources`](Self::cleanup_resources) gives them back.
#[derive(Debug, Default)]
pub struct RecordedOpList {
    pub(crate) ops: Vec<DrawOp>,
    pub(crate) children: Vec<ChildEdge>,
    pub(crate) projection_receive_index: Option<usize>,
    pub(crate) functor_count: u32,
    pub(crate) resources: ResourceRefs,

    pub(crate) paints: Vec<Paint>,
    pub(crate) paths: Vec<Path>,
    pub(crate) regions: Vec<Region>,
    pub(crate) matrices: Vec<Mat4>,

    released: bool,
}

impl RecordedOpList {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    #[inline]
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    #[inline]
    pub fn children(&self) -> &[ChildEdge] {
        &self.children
    }

    #[inline]
    pub(crate) fn children_mut(&mut self) -> &mut [ChildEdge] {
        &mut self.children
    }

    /// Index of the op after which projected descendants are drawn.
    #[inline]
    pub fn projection_receive_index(&self) -> Option<usize> {
        self.projection_receive_index
    }

    #[inline]
    pub fn functor_count(&self) -> u32 {
        self.functor_count
    }

    pub fn paint(&self, index: usize) -> Option<&Paint> {
        self.paints.get(index)
    }

    pub fn path(&self, index: usize) -> Option<&Path> {
        self.paths.get(index)
    }

    pub fn region(&self, index: usize) -> Option<&Region> {
        self.regions.get(index)
    }

    pub fn matrix(&self, index: usize) -> Option<&Mat4> {
        self.matrices.get(index)
    }

    #[inline]
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Returns every resource reference and unregisters functors.
    ///
    /// Runs at most once; later calls are no-ops.
    pub fn cleanup_resources(&mut self, ctx: &RenderContext) {
        if self.released {
            log::debug!("op list resources already released");
            return;
        }
        ctx.unregister_functors(self.functor_count);
        self.release_resources(&ctx.resources);
    }

    /// Cache-side half of the teardown, for lists that never had their
    /// functors registered.
    pub(crate) fn release_resources(&mut self, cache: &ResourceCache) {
        if self.released {
            return;
        }
        self.released = true;

        {
            let mut cache = cache.lock();
            let refs = &self.resources;
            for &id in refs
                .bitmaps
                .iter()
                .chain(&refs.patches)
                .chain(&refs.source_paths)
                .chain(&refs.layers)
            {
                cache.decrement_refcount_locked(id);
            }
            for &id in refs.owned_bitmaps.iter().chain(&refs.shaders) {
                cache.decrement_refcount_locked(id);
                cache.destructor_locked(id);
            }
        }

        self.resources = ResourceRefs::default();
        self.paints.clear();
        self.regions.clear();
        self.paths.clear();
        self.matrices.clear();
        log::trace!("released op list with {} ops", self.ops.len());
    }
}

impl Drop for RecordedOpList {
    fn drop(&mut self) {
        let refs = &self.resources;
        let held = refs.bitmaps.len()
            + refs.owned_bitmaps.len()
            + refs.patches.len()
            + refs.shaders.len()
            + refs.source_paths.len()
            + refs.layers.len();
        if !self.released && held > 0 {
            log::warn!("op list dropped while holding {held} resource references");
        }
    }
}
