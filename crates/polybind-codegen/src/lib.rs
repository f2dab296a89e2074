//! Binding generation engine.
//!
//! Turns parsed [`ClassModel`](polybind_core::ClassModel)s into two
//! mutually consistent artifacts per class: native glue functions callable
//! from Lua, and a Lua wrapper class that proxies to them while keeping
//! one wrapper per native object.
//!
//! The pipeline, leaf first:
//!
//! - [`TypeMarshaller`]: type classification and per-category marshalling
//! - [`ClassModelFilter`]: inclusion policy, producing a [`ClassPlan`]
//! - [`GlueEmitter`] and [`WrapperEmitter`]: run in lockstep on each plan
//! - [`ModuleAssembler`]: module-wide files
//!
//! ```
//! use polybind_codegen::{ClassModelFilter, FilterPolicy, ModuleAssembler, ModuleSettings, TypeMarshaller};
//! use polybind_core::{ClassModel, MethodModel, TypeRef};
//!
//! let class = ClassModel::new("Timer")
//!     .with_method(MethodModel::constructor("Timer"))
//!     .with_method(MethodModel::new("getElapsed", TypeRef::parse("Number")));
//!
//! let marshaller = TypeMarshaller::new().with_declared(["Timer"]);
//! let policy = FilterPolicy::default();
//! let plan = ClassModelFilter::new(&policy, &marshaller).plan(&class).unwrap();
//!
//! let mut assembler = ModuleAssembler::new(ModuleSettings::default(), &marshaller);
//! let wrapper = assembler.add_class(&plan);
//! assert!(wrapper.contents.contains("function Timer:getElapsed()"));
//! ```

mod assembler;
mod filter;
mod glue;
mod literal;
mod marshal;
mod wrapper;
mod writer;

pub use assembler::{Artifact, ArtifactSet, ModuleAssembler, ModuleSettings};
pub use filter::{
    BasePlan, ClassModelFilter, ClassPlan, ConstantPlan, FilterPolicy, MethodKind, MethodPlan,
    MixinSpec, ParamPlan, PropertyPlan, SkipReason, ViewPlan, is_lua_keyword, safe_name,
};
pub use glue::{EventAdapter, GlueEmitter, GlueOutput, SymbolEntry};
pub use literal::{is_null_literal, repair as repair_literal};
pub use marshal::{PushStrategy, TypeMarshaller};
pub use wrapper::{SKIP_PTR, WrapperEmitter, WrapperOutput};
pub use writer::CodeWriter;
