//! Native-to-script event dispatch.
//!
//! An [`EventDispatcher`] is the Rust shape of the generated event adapter:
//! native code hands it an event handle and it calls back into the script
//! synchronously. Only one dispatch may be in flight; a callback that
//! triggers another dispatch on the same adapter gets
//! [`DispatchError::Reentrant`] instead of re-entering the interpreter.

use std::cell::{Cell, RefCell};

use crate::error::DispatchError;
use crate::registry::Handle;

type Callback = Box<dyn FnMut(Handle)>;

#[derive(Default)]
pub struct EventDispatcher {
    callback: RefCell<Option<Callback>>,
    in_flight: Cell<bool>,
    /// Cleared by `bind`/`unbind` while a callback runs.
    rebind_to_running: Cell<bool>,
    delivered: Cell<u64>,
}

/// Clears the in-flight flag even if the callback unwinds.
struct FlightGuard<'a>(&'a Cell<bool>);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the script callback, replacing any previous one.
    pub fn bind(&self, callback: impl FnMut(Handle) + 'static) {
        self.rebind_to_running.set(false);
        *self.callback.borrow_mut() = Some(Box::new(callback));
    }

    pub fn unbind(&self) {
        self.rebind_to_running.set(false);
        *self.callback.borrow_mut() = None;
    }

    /// Whether a callback is attached. The running callback counts as
    /// attached until it unbinds.
    pub fn is_bound(&self) -> bool {
        if self.in_flight.get() && self.rebind_to_running.get() {
            return true;
        }
        self.callback.borrow().is_some()
    }

    pub fn is_dispatching(&self) -> bool {
        self.in_flight.get()
    }

    /// Events delivered so far.
    pub fn delivered(&self) -> u64 {
        self.delivered.get()
    }

    /// Deliver `event` to the bound callback.
    ///
    /// The callback is taken out of its slot while it runs, so it may
    /// `bind`, `unbind` or query its own dispatcher. A binding change made
    /// during the call wins over the running callback.
    pub fn dispatch(&self, event: Handle) -> Result<(), DispatchError> {
        if self.in_flight.get() {
            return Err(DispatchError::Reentrant);
        }
        let mut callback = self.callback.borrow_mut().take().ok_or(DispatchError::Unbound)?;

        self.in_flight.set(true);
        let _guard = FlightGuard(&self.in_flight);
        self.rebind_to_running.set(true);
        callback(event);
        if self.rebind_to_running.get() {
            let mut slot = self.callback.borrow_mut();
            if slot.is_none() {
                *slot = Some(callback);
            }
        }
        self.delivered.set(self.delivered.get() + 1);
        Ok(())
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("in_flight", &self.in_flight.get())
            .field("delivered", &self.delivered.get())
            .finish_non_exhaustive()
    }
}
