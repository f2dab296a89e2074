//! Identity registry: one wrapper per native handle.
//!
//! The registry maps a native object's handle to the single script wrapper
//! constructed for it. Generated wrappers talk to it through three calls
//! (`register`, `lookup`, `evict`), modelled here by [`IdentityRegistry`].
//!
//! # Thread Safety
//!
//! Registries are **not thread-safe**. The script runtime owns the registry
//! and touches it from its own thread only; native code never mutates it.
//!
//! # Example
//!
//! ```
//! use polybind_registry::{Handle, HandleRegistry, IdentityRegistry};
//!
//! let mut registry = HandleRegistry::new();
//! registry.register(Handle::from_addr(0x1000), "label");
//! assert_eq!(registry.lookup(Handle::from_addr(0x1000)), Some("label"));
//!
//! registry.evict(Handle::from_addr(0x1000));
//! assert!(registry.lookup(Handle::from_addr(0x1000)).is_none());
//! ```

use std::fmt;

use rustc_hash::FxHashMap;

/// A native object address crossing the boundary as an opaque value.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Handle(usize);

impl Handle {
    /// The null handle. Returned by native calls that produce no object and
    /// translated to the runtime's nil value.
    pub const NULL: Handle = Handle(0);

    pub fn from_addr(addr: usize) -> Self {
        Self(addr)
    }

    pub fn addr(self) -> usize {
        self.0
    }

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({:#x})", self.0)
    }
}

/// The service generated wrappers use to keep one wrapper per handle.
pub trait IdentityRegistry {
    /// Reference to a wrapper. Cloning must preserve identity.
    type Wrapper: Clone;

    /// Record `wrapper` as the wrapper for `handle` and hand it back.
    ///
    /// A stale entry for a recycled address is replaced.
    fn register(&mut self, handle: Handle, wrapper: Self::Wrapper) -> Self::Wrapper;

    /// The wrapper registered for `handle`, if any.
    fn lookup(&self, handle: Handle) -> Option<Self::Wrapper>;

    /// Forget `handle`. Returns the evicted wrapper.
    fn evict(&mut self, handle: Handle) -> Option<Self::Wrapper>;

    /// Number of live entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Hash-map backed [`IdentityRegistry`].
#[derive(Debug)]
pub struct HandleRegistry<W> {
    entries: FxHashMap<Handle, W>,
}

impl<W> Default for HandleRegistry<W> {
    fn default() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }
}

impl<W> HandleRegistry<W> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `handle` currently has a wrapper.
    pub fn contains(&self, handle: Handle) -> bool {
        self.entries.contains_key(&handle)
    }

    /// Registered handles, in no particular order.
    pub fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.entries.keys().copied()
    }
}

impl<W: Clone> IdentityRegistry for HandleRegistry<W> {
    type Wrapper = W;

    fn register(&mut self, handle: Handle, wrapper: W) -> W {
        self.entries.insert(handle, wrapper.clone());
        wrapper
    }

    fn lookup(&self, handle: Handle) -> Option<W> {
        self.entries.get(&handle).cloned()
    }

    fn evict(&mut self, handle: Handle) -> Option<W> {
        self.entries.remove(&handle)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
