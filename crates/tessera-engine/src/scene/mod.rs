//! Scene model.
//!
//! Responsibilities:
//! - node storage and lifetime ([`SceneGraph`], [`NodeKey`])
//! - node properties and their transforms
//! - recorded content ([`RecordedOpList`]) and its recorder
//! - the per-frame ordering pass that routes projected edges

mod graph;
mod node;
mod op;
mod op_list;
mod ordering;
mod outline;
mod props;
mod recorder;
mod shape;

pub use graph::SceneGraph;
pub use node::SceneNode;
pub use op::{BatchKind, ClipOp, DrawOp, SaveFlags};
pub use op_list::{ChildEdge, EdgeRef, RecordedOpList};
pub use outline::Outline;
pub use props::{MatrixFlags, NodeProperties};
pub use recorder::{DisplayListRecorder, RecordError};
pub use shape::{Path, Region};

slotmap::new_key_type! {
    /// Generational handle to a [`SceneNode`].
    pub struct NodeKey;
}

/// Lifetime-management bugs are unrecoverable: log, then panic (aborts in
/// release builds).
#[cold]
#[track_caller]
pub(crate) fn fatal(args: core::fmt::Arguments<'_>) -> ! {
    log::error!("{args}");
    panic!("{args}");
}
