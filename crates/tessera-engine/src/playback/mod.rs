//! Per-frame playback.
//!
//! Responsibilities:
//! - the shared traversal ([`iterate`]) and its handler seam
//! - Z sorting of elevated children and shadow interleaving
//! - deferred (batched) and immediate (replay) handlers
//!
//! Run [`SceneGraph::compute_ordering`](crate::scene::SceneGraph::compute_ordering)
//! on the root first; playback consumes the skip flags and projected lists
//! it leaves behind.

mod defer;
mod operation;
mod replay;
mod traverse;
mod z_order;

pub use defer::{Batch, DeferHandler, DeferredEntry, DeferredPlan, defer, defer_node};
pub use operation::{Operation, ShadowOp, SyntheticOp};
pub use replay::{ReplayHandler, replay};
pub use traverse::{Frame, OperationHandler, iterate};
pub use z_order::{ChildrenSelectMode, SHADOW_DELTA, ZChild, build_z_sorted_child_list};
