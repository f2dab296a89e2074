//! Runtime contract for generated bindings.
//!
//! The wrappers polybind emits rely on a small protocol on the script side:
//! an identity registry keeping one wrapper per native handle, a
//! construct/dispose lifecycle, and a non-reentrant event adapter. This
//! crate models that protocol so hosts can implement it natively and tests
//! can check it.
//!
//! ```
//! use polybind_registry::{Handle, HandleRegistry, Lifecycle, NativeGlue, Value};
//!
//! struct Glue;
//!
//! impl NativeGlue for Glue {
//!     fn construct(&mut self, _class: &str, _args: &[Value]) -> Handle {
//!         Handle::from_addr(0x1000)
//!     }
//!     fn destroy(&mut self, _class: &str, _handle: Handle) {}
//! }
//!
//! let mut lifecycle = Lifecycle::new(Glue, HandleRegistry::new());
//! let scene = lifecycle.construct("Scene", &[]);
//! let again = lifecycle.lookup_or_wrap("Scene", scene.handle()).unwrap();
//! assert!(std::rc::Rc::ptr_eq(&scene, &again));
//! ```

mod dispatch;
mod error;
mod lifecycle;
mod registry;

pub use dispatch::EventDispatcher;
pub use error::{DispatchError, LifecycleError};
pub use lifecycle::{BindingState, Lifecycle, NativeGlue, Value, Wrapper, WrapperRef};
pub use registry::{Handle, HandleRegistry, IdentityRegistry};
