use core::fmt::Write as _;

use parking_lot::{Mutex, MutexGuard};
use rustc_hash::FxHashMap;

use super::{ResourceId, ResourceKind};

/// Callback invoked when a resource finally leaves the cache.
///
/// Runs while the cache lock is held. The lock is not reentrant, so a hook
/// must not call back into the same [`ResourceCache`]; doing so deadlocks.
pub type ReleaseHook = Box<dyn Fn(ResourceId, ResourceKind) + Send + Sync>;

#[derive(Debug)]
struct ResourceEntry {
    kind: ResourceKind,
    refcount: u32,
    /// Owner asked for destruction while references were still live.
    destroyed: bool,
    size_bytes: usize,
}

#[derive(Debug, Default)]
struct CacheInner {
    next_id: u64,
    entries: FxHashMap<ResourceId, ResourceEntry>,
}

/// Refcount table for shared resources.
///
/// All mutation happens through [`ResourceCache::lock`], which hands out a
/// guard for a batch of refcount operations. Callers must drop the guard
/// before issuing any drawing call.
pub struct ResourceCache {
    inner: Mutex<CacheInner>,
    release_hook: Option<ReleaseHook>,
}

impl core::fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("inner", &self.inner)
            .field("release_hook", &self.release_hook.is_some())
            .finish()
    }
}

impl Default for ResourceCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceCache {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(CacheInner::default()),
            release_hook: None,
        }
    }

    /// Installs the callback run when a resource is released.
    pub fn with_release_hook(mut self, hook: ReleaseHook) -> Self {
        self.release_hook = Some(hook);
        self
    }

    /// Registers a new resource with a refcount of zero.
    pub fn register(&self, kind: ResourceKind, size_bytes: usize) -> ResourceId {
        let mut inner = self.inner.lock();
        let id = ResourceId(inner.next_id);
        inner.next_id += 1;
        inner.entries.insert(
            id,
            ResourceEntry { kind, refcount: 0, destroyed: false, size_bytes },
        );
        id
    }

    /// Acquires the cache lock for a batch of refcount operations.
    pub fn lock(&self) -> ResourceCacheGuard<'_> {
        ResourceCacheGuard {
            inner: self.inner.lock(),
            release_hook: self.release_hook.as_ref(),
        }
    }

    /// Convenience for a single reference taken outside a batch.
    pub fn increment_refcount(&self, id: ResourceId) {
        self.lock().increment_refcount_locked(id);
    }

    /// Convenience for the owner dropping its handle outside a batch.
    pub fn destructor(&self, id: ResourceId) {
        self.lock().destructor_locked(id);
    }

    pub fn refcount(&self, id: ResourceId) -> Option<u32> {
        self.inner.lock().entries.get(&id).map(|e| e.refcount)
    }

    pub fn contains(&self, id: ResourceId) -> bool {
        self.inner.lock().entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends a per-kind summary of live resources to `out`.
    pub fn dump_memory_usage(&self, out: &mut String) {
        let inner = self.inner.lock();
        let mut total = 0usize;
        let _ = writeln!(out, "ResourceCache: {} entries", inner.entries.len());
        for kind in ResourceKind::ALL {
            let (count, bytes) = inner
                .entries
                .values()
                .filter(|e| e.kind == kind)
                .fold((0usize, 0usize), |(c, b), e| (c + 1, b + e.size_bytes));
            total += bytes;
            let _ = writeln!(out, "  {:<8} {:>5} ({} bytes)", kind.label(), count, bytes);
        }
        let _ = writeln!(out, "  total {total} bytes");
    }
}

/// Exclusive access to the refcount table.
pub struct ResourceCacheGuard<'a> {
    inner: MutexGuard<'a, CacheInner>,
    release_hook: Option<&'a ReleaseHook>,
}

impl ResourceCacheGuard<'_> {
    pub fn increment_refcount_locked(&mut self, id: ResourceId) {
        match self.inner.entries.get_mut(&id) {
            Some(entry) => entry.refcount += 1,
            None => log::warn!("increment of unknown resource {id}"),
        }
    }

    /// Drops one reference. A destroyed resource is released when its
    /// count reaches zero.
    pub fn decrement_refcount_locked(&mut self, id: ResourceId) {
        let Some(entry) = self.inner.entries.get_mut(&id) else {
            log::warn!("decrement of unknown resource {id}");
            return;
        };
        entry.refcount = entry.refcount.saturating_sub(1);
        if entry.refcount == 0 && entry.destroyed {
            self.release_locked(id);
        }
    }

    /// Owner-side destruction: releases immediately when unreferenced,
    /// otherwise defers release to the last decrement.
    pub fn destructor_locked(&mut self, id: ResourceId) {
        let Some(entry) = self.inner.entries.get_mut(&id) else {
            return;
        };
        if entry.refcount == 0 {
            self.release_locked(id);
        } else {
            entry.destroyed = true;
        }
    }

    fn release_locked(&mut self, id: ResourceId) {
        if let Some(entry) = self.inner.entries.remove(&id) {
            log::trace!("releasing {:?} {id} ({} bytes)", entry.kind, entry.size_bytes);
            if let Some(hook) = self.release_hook {
                hook(id, entry.kind);
            }
        }
    }
}
