//! Shared GPU-side resources referenced by recorded op lists.
//!
//! Bitmaps, nine-patches, shaders, source paths and layers are shared
//! across nodes and frames. Op lists only hold [`ResourceId`]s; lifetimes
//! are governed by refcounts in the [`ResourceCache`], which is only ever
//! mutated under its own lock.

mod cache;
mod id;

pub use cache::{ReleaseHook, ResourceCache, ResourceCacheGuard};
pub use id::{ResourceId, ResourceKind};
