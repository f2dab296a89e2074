//! Header parsing for polybind.
//!
//! This crate turns C++ headers into the [`HeaderUnit`] class model:
//! - Lexical analysis that skips comments and preprocessor lines
//! - A declaration scanner that records public methods, properties and
//!   base classes of every class and struct
//!
//! # Example
//!
//! ```
//! use polybind_parser::HeaderParser;
//!
//! let source = r#"
//!     class _PolyExport Timer : public EventDispatcher {
//!         public:
//!             Timer(bool triggerMode, int msecs);
//!             void Pause(bool paused);
//!     };
//! "#;
//!
//! let unit = HeaderParser::new()
//!     .with_ignored_macros(["_PolyExport"])
//!     .parse("PolyTimer.h", source)
//!     .unwrap();
//! assert_eq!(unit.classes[0].name, "Timer");
//! assert_eq!(unit.classes[0].bases, vec!["EventDispatcher"]);
//! ```
//!
//! [`HeaderUnit`]: polybind_core::HeaderUnit

mod header;
pub mod lexer;

pub use header::{HeaderParser, HeaderSource};
pub use lexer::{Lexer, Token, TokenKind};
