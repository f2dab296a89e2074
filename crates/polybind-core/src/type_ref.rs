//! Type references as written in headers, and their classified form.
//!
//! A [`TypeRef`] is the normalized shape of a declared type: qualifiers,
//! namespaces and pointer/reference decorations are peeled off and recorded
//! separately so the remaining base name can be looked up. A
//! [`TypeDescriptor`] is the result of classifying a `TypeRef` against the
//! primitive table and the set of declared types.

use std::fmt;

use crate::QualifiedName;

/// How a type is passed, after stripping the base name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Indirection {
    /// Passed by value.
    #[default]
    Value,
    /// Declared with at least one `*`.
    Pointer,
    /// Declared with `&` and no `*`.
    Reference,
}

/// Words that qualify a declaration but never name a type.
const IGNORED_SPECIFIERS: &[&str] = &[
    "inline", "volatile", "mutable", "explicit", "extern", "friend", "typename", "struct",
    "class", "enum", "register",
];

/// A normalized type as it appears in a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TypeRef {
    /// The declaration text this was parsed from.
    pub raw: String,
    /// Base name with qualifiers, scopes and decorations removed
    /// (`"unsigned int"`, `"Vector3"`, `"vector"`).
    pub name: String,
    pub indirection: Indirection,
    pub is_const: bool,
    pub is_static: bool,
    pub is_virtual: bool,
    /// Carries template arguments (`vector<Entity*>`).
    pub is_generic: bool,
    /// Declared with an array extent (`int data[4]`).
    pub is_array: bool,
}

impl TypeRef {
    /// Parse declaration text into a normalized type.
    ///
    /// ```
    /// use polybind_core::{Indirection, TypeRef};
    ///
    /// let ty = TypeRef::parse("const Polycode::Vector3 &");
    /// assert_eq!(ty.name, "Vector3");
    /// assert_eq!(ty.indirection, Indirection::Reference);
    /// assert!(ty.is_const);
    /// ```
    pub fn parse(text: &str) -> Self {
        let raw = text.trim().to_string();
        let (outer, is_generic) = strip_template_args(&raw);
        let (outer, is_array) = strip_array_extents(&outer);

        let indirection = if outer.contains('*') {
            Indirection::Pointer
        } else if outer.contains('&') {
            Indirection::Reference
        } else {
            Indirection::Value
        };

        let joined = outer
            .split("::")
            .map(str::trim)
            .collect::<Vec<_>>()
            .join("::");
        let cleaned = joined.replace(['*', '&'], " ");

        let mut ty = TypeRef {
            raw,
            indirection,
            is_generic,
            is_array,
            ..Default::default()
        };

        let mut words = Vec::new();
        for word in cleaned.split_whitespace() {
            match word {
                "const" => ty.is_const = true,
                "static" => ty.is_static = true,
                "virtual" => ty.is_virtual = true,
                w if IGNORED_SPECIFIERS.contains(&w) => {}
                w => words.push(QualifiedName::from_qualified_string(w).name),
            }
        }
        ty.name = words.join(" ");
        ty
    }

    /// Shorthand for a by-value type with no qualifiers.
    pub fn named(name: &str) -> Self {
        Self::parse(name)
    }

    /// `void` returned by value.
    pub fn is_void(&self) -> bool {
        self.name == "void" && self.indirection == Indirection::Value
    }

    /// Type text left behind by a confused upstream parser: empty or a bare
    /// number. Parameters of this shape are dropped.
    pub fn is_placeholder(&self) -> bool {
        self.name.is_empty() || self.name.chars().all(|c| c.is_ascii_digit())
    }

    /// Pointer, array, or template container.
    pub fn is_raw_collection_or_pointer(&self) -> bool {
        self.indirection == Indirection::Pointer
            || self.is_array
            || self.is_generic
            || self.name == "vector"
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Remove `<...>` argument lists, keeping text after the closing bracket.
fn strip_template_args(text: &str) -> (String, bool) {
    let Some(open) = text.find('<') else {
        return (text.to_string(), false);
    };
    let mut depth = 0usize;
    let mut close = text.len();
    for (i, ch) in text[open..].char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => {
                depth -= 1;
                if depth == 0 {
                    close = open + i + 1;
                    break;
                }
            }
            _ => {}
        }
    }
    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..open]);
    out.push(' ');
    out.push_str(&text[close.min(text.len())..]);
    (out, true)
}

fn strip_array_extents(text: &str) -> (String, bool) {
    match text.find('[') {
        Some(pos) => (text[..pos].to_string(), true),
        None => (text.to_string(), false),
    }
}

// ============================================================================
// Classified types
// ============================================================================

/// Scalar types the scripting runtime reads and pushes natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Number,
    String,
    Int,
    Bool,
}

impl PrimitiveKind {
    /// Look up a normalized base name.
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "Number" | "float" | "double" => Some(Self::Number),
            "String" | "string" => Some(Self::String),
            "int" | "unsigned int" | "unsigned" | "long" | "unsigned long" | "long long"
            | "short" | "unsigned short" | "size_t" => Some(Self::Int),
            "bool" => Some(Self::Bool),
            _ => None,
        }
    }
}

/// Marshalling category of a type crossing the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    Number,
    String,
    Int,
    Bool,
    /// A declared class passed by pointer.
    OpaquePointer,
    /// A declared class passed by reference or value; the handle stands in
    /// for the object and is dereferenced on the native side.
    OpaqueReference,
    /// `void` in return position.
    Void,
    /// A type name declared nowhere in the input. Marshalled as an opaque
    /// handle following its [`Indirection`].
    Unknown,
}

impl TypeCategory {
    pub fn from_primitive(kind: PrimitiveKind) -> Self {
        match kind {
            PrimitiveKind::Number => TypeCategory::Number,
            PrimitiveKind::String => TypeCategory::String,
            PrimitiveKind::Int => TypeCategory::Int,
            PrimitiveKind::Bool => TypeCategory::Bool,
        }
    }

    pub fn is_primitive(self) -> bool {
        matches!(
            self,
            TypeCategory::Number | TypeCategory::String | TypeCategory::Int | TypeCategory::Bool
        )
    }

    pub fn is_opaque(self) -> bool {
        matches!(
            self,
            TypeCategory::OpaquePointer | TypeCategory::OpaqueReference | TypeCategory::Unknown
        )
    }
}

/// A classified type, ready for marshalling.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    pub category: TypeCategory,
    /// Base name, also the script-side class used to wrap opaque handles.
    pub name: String,
    /// Spelling used in native source (may carry a namespace).
    pub native: String,
    pub indirection: Indirection,
}

impl TypeDescriptor {
    pub fn void() -> Self {
        Self {
            category: TypeCategory::Void,
            name: "void".into(),
            native: "void".into(),
            indirection: Indirection::Value,
        }
    }

    pub fn is_primitive(&self) -> bool {
        self.category.is_primitive()
    }

    pub fn is_opaque(&self) -> bool {
        self.category.is_opaque()
    }

    pub fn is_void(&self) -> bool {
        self.category == TypeCategory::Void
    }

    /// Opaque handle the native side receives as a raw pointer.
    pub fn is_pointer_handle(&self) -> bool {
        self.is_opaque() && self.indirection == Indirection::Pointer
    }
}
