//! Core types for polybind.
//!
//! This crate holds the class model produced by the header parser and
//! consumed by the code generator:
//! - [`ClassModel`], [`MethodModel`], [`ParameterModel`], [`PropertyModel`]
//! - [`TypeRef`] (declared types) and [`TypeDescriptor`] (classified types)
//! - Source spans and the shared error types

mod error;
mod model;
mod qualified_name;
mod span;
mod type_ref;

pub use error::{ModelError, ParseError, ParseErrorKind};
pub use model::{
    ClassModel, HeaderUnit, MethodFlags, MethodModel, ParameterModel, PropertyFlags,
    PropertyModel,
};
pub use qualified_name::QualifiedName;
pub use span::Span;
pub use type_ref::{Indirection, PrimitiveKind, TypeCategory, TypeDescriptor, TypeRef};
