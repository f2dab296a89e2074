//! Wrapper lifecycle: construction, lookup-or-wrap and disposal.
//!
//! Every generated wrapper class follows the same protocol. [`Lifecycle`]
//! is that protocol written once in Rust, parameterised over the native
//! side ([`NativeGlue`]) and the identity service ([`IdentityRegistry`]).
//! Hosts embedding the runtime use it directly; the generator's tests use
//! it to pin down the behavior the emitted scripts must reproduce.
//!
//! # State machine
//!
//! ```text
//! Unbound --bind--> Bound --dispose--> Disposed
//! ```
//!
//! There is no transition back. Disposing an unbound or already disposed
//! wrapper does nothing.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::error::LifecycleError;
use crate::registry::{Handle, IdentityRegistry};

// ============================================================================
// Wrapper
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    /// Created with the skip marker; no native object yet.
    Unbound,
    /// Holds a live handle.
    Bound,
    /// Native object destroyed; the handle is gone.
    Disposed,
}

/// Script-side proxy for one native object.
pub struct Wrapper {
    class: String,
    handle: Cell<Handle>,
    state: Cell<BindingState>,
}

/// Shared reference to a wrapper. Identity is pointer identity.
pub type WrapperRef = Rc<Wrapper>;

impl Wrapper {
    pub fn unbound(class: impl Into<String>) -> WrapperRef {
        Rc::new(Self {
            class: class.into(),
            handle: Cell::new(Handle::NULL),
            state: Cell::new(BindingState::Unbound),
        })
    }

    fn bound(class: impl Into<String>, handle: Handle) -> WrapperRef {
        Rc::new(Self {
            class: class.into(),
            handle: Cell::new(handle),
            state: Cell::new(BindingState::Bound),
        })
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    /// Current handle, [`Handle::NULL`] unless bound.
    pub fn handle(&self) -> Handle {
        self.handle.get()
    }

    pub fn state(&self) -> BindingState {
        self.state.get()
    }

    pub fn is_bound(&self) -> bool {
        self.state.get() == BindingState::Bound
    }

    /// Attach a handle to an unbound wrapper.
    pub fn bind(&self, handle: Handle) -> Result<(), LifecycleError> {
        match self.state.get() {
            BindingState::Bound => Err(LifecycleError::AlreadyBound {
                class: self.class.clone(),
                handle: self.handle.get(),
            }),
            BindingState::Disposed => Err(LifecycleError::Disposed {
                class: self.class.clone(),
            }),
            BindingState::Unbound if handle.is_null() => Err(LifecycleError::NullHandle {
                class: self.class.clone(),
            }),
            BindingState::Unbound => {
                self.handle.set(handle);
                self.state.set(BindingState::Bound);
                Ok(())
            }
        }
    }

    fn mark_disposed(&self) {
        self.handle.set(Handle::NULL);
        self.state.set(BindingState::Disposed);
    }
}

impl fmt::Debug for Wrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wrapper")
            .field("class", &self.class)
            .field("handle", &self.handle.get())
            .field("state", &self.state.get())
            .finish()
    }
}

// ============================================================================
// Native side
// ============================================================================

/// A value passed to a constructor proxy.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Number(f64),
    Int(i64),
    Bool(bool),
    Str(String),
    Object(WrapperRef),
    /// The `"__skip_ptr__"` marker: build the wrapper without a native object.
    SkipPtr,
}

impl Value {
    /// Argument as it crosses into glue code: wrappers are unwrapped to
    /// their handle, nil stays nil.
    pub fn unwrap_handle(&self) -> Option<Handle> {
        match self {
            Value::Object(w) => Some(w.handle()),
            _ => None,
        }
    }
}

/// The generated glue functions, as seen from the script side.
pub trait NativeGlue {
    /// Call the glue constructor for `class`. Returns the new object's handle.
    fn construct(&mut self, class: &str, args: &[Value]) -> Handle;

    /// Call `delete_<class>` for `handle`.
    fn destroy(&mut self, class: &str, handle: Handle);
}

// ============================================================================
// Lifecycle
// ============================================================================

/// Runs the wrapper protocol against a glue layer and an identity registry.
pub struct Lifecycle<G, R> {
    glue: G,
    registry: R,
    /// Class name -> first base, for constructor sharing.
    bases: FxHashMap<String, String>,
}

impl<G, R> Lifecycle<G, R>
where
    G: NativeGlue,
    R: IdentityRegistry<Wrapper = WrapperRef>,
{
    pub fn new(glue: G, registry: R) -> Self {
        Self {
            glue,
            registry,
            bases: FxHashMap::default(),
        }
    }

    /// Record `class`'s first base. Sharing follows recorded bases up the
    /// chain, so grandparents count too.
    pub fn with_base(mut self, class: impl Into<String>, base: impl Into<String>) -> Self {
        self.bases.insert(class.into(), base.into());
        self
    }

    pub fn glue(&self) -> &G {
        &self.glue
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Wrapper for a handle returned by native code.
    ///
    /// Null yields `None`. A known handle yields the registered wrapper
    /// itself; an unseen one is wrapped and registered.
    pub fn lookup_or_wrap(&mut self, class: &str, handle: Handle) -> Option<WrapperRef> {
        if handle.is_null() {
            return None;
        }
        if let Some(existing) = self.registry.lookup(handle) {
            return Some(existing);
        }
        Some(self.registry.register(handle, Wrapper::bound(class, handle)))
    }

    /// Run the constructor proxy of `class`.
    ///
    /// A single argument that is a bound wrapper of `class` or of an ancestor
    /// is shared: the new wrapper takes its handle and the glue constructor
    /// is not called. The shared wrapper is not registered, so lookups keep
    /// returning the original.
    pub fn construct(&mut self, class: &str, args: &[Value]) -> WrapperRef {
        if let Some(shared) = self.shared_construct(class, args) {
            return shared;
        }
        if matches!(args.first(), Some(Value::SkipPtr)) {
            return Wrapper::unbound(class);
        }
        let handle = self.glue.construct(class, args);
        if handle.is_null() {
            return Wrapper::unbound(class);
        }
        self.registry.register(handle, Wrapper::bound(class, handle))
    }

    fn shared_construct(&self, class: &str, args: &[Value]) -> Option<WrapperRef> {
        let [Value::Object(other)] = args else {
            return None;
        };
        if !other.is_bound() {
            return None;
        }
        let shares = other.class() == class || self.is_ancestor(class, other.class());
        shares.then(|| Wrapper::bound(class, other.handle()))
    }

    /// Whether `ancestor` is on the recorded base chain of `class`.
    fn is_ancestor(&self, class: &str, ancestor: &str) -> bool {
        let mut current = class;
        // Bounded by the table size so a cyclic chain ends.
        for _ in 0..self.bases.len() {
            match self.bases.get(current) {
                Some(base) if base == ancestor => return true,
                Some(base) => current = base,
                None => return false,
            }
        }
        false
    }

    /// Run `__delete()`.
    ///
    /// The registry entry is evicted before the native object is destroyed.
    /// Returns whether a native object was destroyed.
    pub fn dispose(&mut self, wrapper: &Wrapper) -> bool {
        if !wrapper.is_bound() {
            return false;
        }
        let handle = wrapper.handle();
        self.registry.evict(handle);
        self.glue.destroy(wrapper.class(), handle);
        wrapper.mark_disposed();
        true
    }
}
