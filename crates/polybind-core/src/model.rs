//! The class model handed from the header parser to the generator.
//!
//! Everything here is plain data: the parser builds it, the filter reads it,
//! and nothing mutates it during emission.

use bitflags::bitflags;

use crate::{Span, TypeRef};

bitflags! {
    /// Method traits that change how a binding is emitted.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MethodFlags: u8 {
        /// Name equals the class name.
        const CONSTRUCTOR = 1 << 0;
        /// `~Name`.
        const DESTRUCTOR = 1 << 1;
        /// Called as `Class::method`, no instance argument.
        const STATIC = 1 << 2;
        const VIRTUAL = 1 << 3;
        /// Trailing `const` qualifier.
        const CONST = 1 << 4;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PropertyFlags: u8 {
        const STATIC = 1 << 0;
        const CONST = 1 << 1;
    }
}

/// One parameter of a method.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterModel {
    pub name: String,
    pub ty: TypeRef,
    /// Default literal exactly as it appeared in the header.
    pub default: Option<String>,
}

impl ParameterModel {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// A public method, constructor or destructor.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodModel {
    pub name: String,
    pub return_type: TypeRef,
    pub params: Vec<ParameterModel>,
    pub flags: MethodFlags,
    pub span: Span,
}

impl MethodModel {
    pub fn new(name: impl Into<String>, return_type: TypeRef) -> Self {
        let mut flags = MethodFlags::empty();
        if return_type.is_static {
            flags |= MethodFlags::STATIC;
        }
        if return_type.is_virtual {
            flags |= MethodFlags::VIRTUAL;
        }
        Self {
            name: name.into(),
            return_type,
            params: Vec::new(),
            flags,
            span: Span::synthetic(),
        }
    }

    /// A constructor for `class_name`.
    pub fn constructor(class_name: &str) -> Self {
        let mut method = Self::new(class_name, TypeRef::default());
        method.flags |= MethodFlags::CONSTRUCTOR;
        method
    }

    /// A destructor for `class_name`.
    pub fn destructor(class_name: &str) -> Self {
        let mut method = Self::new(format!("~{class_name}"), TypeRef::default());
        method.flags |= MethodFlags::DESTRUCTOR;
        method
    }

    pub fn with_param(mut self, param: ParameterModel) -> Self {
        self.params.push(param);
        self
    }

    pub fn with_flags(mut self, flags: MethodFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn is_constructor(&self) -> bool {
        self.flags.contains(MethodFlags::CONSTRUCTOR)
    }

    pub fn is_destructor(&self) -> bool {
        self.flags.contains(MethodFlags::DESTRUCTOR)
    }

    pub fn is_static(&self) -> bool {
        self.flags.contains(MethodFlags::STATIC)
    }

    pub fn is_operator(&self) -> bool {
        self.name.starts_with("operator")
    }
}

/// A public data member.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyModel {
    pub name: String,
    pub ty: TypeRef,
    pub flags: PropertyFlags,
    /// Initializer literal; only meaningful for static members.
    pub default: Option<String>,
    pub span: Span,
}

impl PropertyModel {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        let mut flags = PropertyFlags::empty();
        if ty.is_static {
            flags |= PropertyFlags::STATIC;
        }
        if ty.is_const {
            flags |= PropertyFlags::CONST;
        }
        Self {
            name: name.into(),
            ty,
            flags,
            default: None,
            span: Span::synthetic(),
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn is_static(&self) -> bool {
        self.flags.contains(PropertyFlags::STATIC)
    }
}

/// A class (or struct) declaration with its public surface.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassModel {
    pub name: String,
    /// Base classes in declaration order. Only the first is ever bound.
    pub bases: Vec<String>,
    pub methods: Vec<MethodModel>,
    pub properties: Vec<PropertyModel>,
    pub span: Span,
}

impl ClassModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bases: Vec::new(),
            methods: Vec::new(),
            properties: Vec::new(),
            span: Span::synthetic(),
        }
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.bases.push(base.into());
        self
    }

    pub fn with_method(mut self, method: MethodModel) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_property(mut self, property: PropertyModel) -> Self {
        self.properties.push(property);
        self
    }

    /// The single base class the binding layer considers.
    pub fn primary_base(&self) -> Option<&str> {
        self.bases.first().map(String::as_str)
    }
}

/// Everything parsed out of one header file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderUnit {
    /// File name relative to the input directory (`PolyScreenLabel.h`).
    pub file_name: String,
    /// Classes in declaration order.
    pub classes: Vec<ClassModel>,
    /// Every type name the header declares or forward-declares, including
    /// structs and enums that never become classes.
    pub declared_types: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_flags_from_return_type() {
        let method = MethodModel::new("getInstance", TypeRef::parse("static CoreServices *"));
        assert!(method.is_static());
        assert!(!method.is_constructor());
    }

    #[test]
    fn constructor_and_destructor() {
        assert!(MethodModel::constructor("Label").is_constructor());
        let dtor = MethodModel::destructor("Label");
        assert!(dtor.is_destructor());
        assert_eq!(dtor.name, "~Label");
    }

    #[test]
    fn operator_detection() {
        let method = MethodModel::new("operator+", TypeRef::parse("Vector3"));
        assert!(method.is_operator());
    }

    #[test]
    fn primary_base_is_first() {
        let class = ClassModel::new("ScreenParticleEmitter")
            .with_base("ScreenEntity")
            .with_base("ParticleEmitter");
        assert_eq!(class.primary_base(), Some("ScreenEntity"));
    }

    #[test]
    fn static_property_flags() {
        let prop = PropertyModel::new("BLEND_NORMAL", TypeRef::parse("static const int"))
            .with_default("0");
        assert!(prop.is_static());
        assert!(prop.flags.contains(PropertyFlags::CONST));
        assert_eq!(prop.default.as_deref(), Some("0"));
    }
}
