//! Errors raised by the runtime contract.

use thiserror::Error;

use crate::Handle;

/// Misuse of a wrapper's lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("wrapper of '{class}' is already bound to {handle:?}")]
    AlreadyBound { class: String, handle: Handle },

    #[error("wrapper of '{class}' was disposed")]
    Disposed { class: String },

    #[error("cannot bind a wrapper of '{class}' to the null handle")]
    NullHandle { class: String },
}

/// Failure to deliver an event to a script callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("event dispatch re-entered while another dispatch is in flight")]
    Reentrant,

    #[error("dispatcher has no script callback bound")]
    Unbound,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        let err = LifecycleError::AlreadyBound {
            class: "Scene".into(),
            handle: Handle::from_addr(16),
        };
        assert_eq!(err.to_string(), "wrapper of 'Scene' is already bound to Handle(0x10)");
        assert_eq!(
            DispatchError::Reentrant.to_string(),
            "event dispatch re-entered while another dispatch is in flight"
        );
    }
}
