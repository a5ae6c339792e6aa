//! Explicit per-engine context.
//!
//! Everything the core would otherwise reach through process-wide
//! singletons lives here and is passed into ordering, traversal and
//! teardown entry points:
//! - the shared [`ResourceCache`]
//! - the functor registry
//! - the recent-operation log ring
//! - the deferred-destruction queue

mod op_log;

pub use op_log::OpLogBuffer;

use core::sync::atomic::{AtomicU32, Ordering};

use parking_lot::Mutex;

use crate::resource::ResourceCache;
use crate::scene::NodeKey;

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Number of `(level, op name)` entries kept for diagnostics.
    pub op_log_capacity: usize,
    /// Emits per-op debug output (at `debug` level) while traversing.
    pub debug_display_list: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            op_log_capacity: 512,
            debug_display_list: false,
        }
    }
}

/// Shared state injected into every engine entry point.
#[derive(Debug)]
pub struct RenderContext {
    pub config: RenderConfig,
    pub resources: ResourceCache,
    pub op_log: OpLogBuffer,
    functors: AtomicU32,
    pending_destruction: Mutex<Vec<NodeKey>>,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}

impl RenderContext {
    pub fn new(config: RenderConfig) -> Self {
        Self::with_resources(config, ResourceCache::new())
    }

    /// Builds a context around an existing cache (e.g. one with a release hook).
    pub fn with_resources(config: RenderConfig, resources: ResourceCache) -> Self {
        Self {
            op_log: OpLogBuffer::new(config.op_log_capacity),
            config,
            resources,
            functors: AtomicU32::new(0),
            pending_destruction: Mutex::new(Vec::new()),
        }
    }

    pub fn register_functors(&self, count: u32) {
        if count > 0 {
            self.functors.fetch_add(count, Ordering::Relaxed);
        }
    }

    pub fn unregister_functors(&self, count: u32) {
        if count > 0 {
            let prev = self.functors.fetch_sub(count, Ordering::Relaxed);
            debug_assert!(prev >= count, "functor registry underflow ({prev} < {count})");
        }
    }

    /// Number of functor slots currently registered by live op lists.
    pub fn functor_count(&self) -> u32 {
        self.functors.load(Ordering::Relaxed)
    }

    pub(crate) fn queue_destruction(&self, key: NodeKey) {
        self.pending_destruction.lock().push(key);
    }

    pub(crate) fn take_pending_destruction(&self) -> Vec<NodeKey> {
        core::mem::take(&mut *self.pending_destruction.lock())
    }

    pub fn pending_destruction_len(&self) -> usize {
        self.pending_destruction.lock().len()
    }

    /// Appends the cache memory report to `out`.
    pub fn dump_memory_usage(&self, out: &mut String) {
        self.resources.dump_memory_usage(out);
        use core::fmt::Write as _;
        let _ = writeln!(out, "  functors {}", self.functor_count());
    }
}
