//! Lua binding generator for C++ class libraries.
//!
//! `polybind` reads a directory of C++ headers and writes, for every class
//! worth binding, native glue callable from Lua plus a Lua wrapper class
//! proxying to it. The workspace crates do the work:
//!
//! - [`polybind_core`]: class model and type descriptors
//! - [`polybind_parser`]: the header scanner
//! - [`polybind_codegen`]: filtering and emission
//! - [`polybind_registry`]: the runtime identity and lifecycle contract
//!
//! This crate ties them into a run driven by a [`BindingConfig`].
//!
//! ```no_run
//! use polybind::{BindingConfig, FsSink, Generator, Invocation};
//!
//! let invocation = Invocation {
//!     input: "Core/Contents/Include".into(),
//!     prefix: "Polycode".into(),
//!     main_include: "Polycode.h".into(),
//!     lib_small_name: "polycode".into(),
//!     lib_name: "Polycode".into(),
//!     api_path: "Bindings/Contents/LUA/API".into(),
//!     api_class_path: "Bindings/Contents/LUA/API/Polycode".into(),
//!     include_path: "Bindings/Contents/LUA/Include".into(),
//!     source_path: "Bindings/Contents/LUA/Source".into(),
//!     manifest: None,
//! };
//!
//! let report = Generator::new(BindingConfig::default())
//!     .run(&invocation, FsSink::new())
//!     .unwrap();
//! println!("bound {} classes", report.bound.len());
//! ```

pub mod config;
pub mod error;
pub mod generator;
pub mod sink;

pub use config::{BindingConfig, MixinConfig};
pub use error::{ConfigError, GenerateError, Result};
pub use generator::{
    GenerationReport, Generator, Invocation, SkippedClass, check_duplicates, discover_headers,
    read_manifest,
};
pub use sink::{FsSink, MemorySink, OutputSink};

pub use polybind_codegen as codegen;
pub use polybind_core as model;
pub use polybind_parser as parser;
pub use polybind_registry as registry;
