use std::fmt;

/// A C++ scoped name such as `Polycode::Vector3` or `std::vector`.
///
/// Headers spell types with or without their namespace; the binding layer
/// only cares about the final segment, so lookups go through
/// [`simple_name`](Self::simple_name).
///
/// # Examples
///
/// ```
/// use polybind_core::QualifiedName;
///
/// let name = QualifiedName::from_qualified_string("Polycode::Vector3");
/// assert_eq!(name.simple_name(), "Vector3");
/// assert_eq!(name.namespace_string(), "Polycode");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    /// Final segment (e.g. "Vector3").
    pub name: String,
    /// Leading scope segments, empty for unscoped names.
    pub namespace: Vec<String>,
}

impl QualifiedName {
    /// Create a name in the global scope.
    pub fn global(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: Vec::new(),
        }
    }

    /// Split a scoped string on `::`.
    ///
    /// Whitespace around the separator is tolerated (`Polycode :: Color`) and
    /// a leading `::` is ignored.
    pub fn from_qualified_string(s: &str) -> Self {
        let mut parts: Vec<String> = s
            .split("::")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        match parts.pop() {
            Some(name) => Self {
                name,
                namespace: parts,
            },
            None => Self::global(""),
        }
    }

    /// Whether the name carries no scope.
    pub fn is_global(&self) -> bool {
        self.namespace.is_empty()
    }

    /// The unscoped name.
    pub fn simple_name(&self) -> &str {
        &self.name
    }

    /// Scope segments joined with `::`.
    pub fn namespace_string(&self) -> String {
        self.namespace.join("::")
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}::{}", self.namespace.join("::"), self.name)
        }
    }
}

impl From<&str> for QualifiedName {
    fn from(s: &str) -> Self {
        Self::from_qualified_string(s)
    }
}
