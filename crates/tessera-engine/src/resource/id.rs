use core::fmt;

/// Identity of a shared resource in the [`ResourceCache`](super::ResourceCache).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ResourceId(pub(crate) u64);

impl ResourceId {
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "res#{}", self.0)
    }
}

/// Resource categories tracked by the cache.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ResourceKind {
    Bitmap,
    Patch,
    Shader,
    Path,
    Layer,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Bitmap,
        ResourceKind::Patch,
        ResourceKind::Shader,
        ResourceKind::Path,
        ResourceKind::Layer,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ResourceKind::Bitmap => "bitmaps",
            ResourceKind::Patch => "patches",
            ResourceKind::Shader => "shaders",
            ResourceKind::Path => "paths",
            ResourceKind::Layer => "layers",
        }
    }
}
