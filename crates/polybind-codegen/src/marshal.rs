//! Type classification and marshalling strategies.
//!
//! [`TypeMarshaller`] turns a parsed [`TypeRef`] into a [`TypeDescriptor`]
//! and knows, per category, how a value is checked, read from an argument
//! slot, pushed as a result, and passed from the script side.
//!
//! | category         | check tag            | test                  | read                        |
//! |------------------|----------------------|-----------------------|-----------------------------|
//! | Number           | `LUA_TNUMBER`        | `lua_isnumber`        | `lua_tonumber`              |
//! | Int              | `LUA_TNUMBER`        | `lua_isnumber`        | `lua_tointeger`             |
//! | Bool             | `LUA_TBOOLEAN`       | `lua_isboolean`       | `lua_toboolean`             |
//! | String           | `LUA_TSTRING`        | `lua_isstring`        | owned copy of `lua_tostring`|
//! | Opaque pointer   | `LUA_TLIGHTUSERDATA` | `lua_islightuserdata` | `(T*)lua_topointer`         |
//! | Opaque ref/value | `LUA_TLIGHTUSERDATA` | `lua_islightuserdata` | `*(T*)lua_topointer`        |

use polybind_core::{Indirection, PrimitiveKind, TypeCategory, TypeDescriptor, TypeRef};
use rustc_hash::{FxHashMap, FxHashSet};

/// How a call result reaches the script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushStrategy {
    /// No result; the function reports zero values.
    Nothing,
    /// Pass the value to a push function, with an optional accessor suffix.
    Direct {
        func: &'static str,
        suffix: &'static str,
    },
    /// Raw pointer pushed as light userdata, null pushed as nil.
    NullablePointer,
    /// Value copied into a heap object whose address is pushed.
    HeapCopy { native: String },
}

/// Classifies types and supplies per-category marshalling code.
#[derive(Debug, Default, Clone)]
pub struct TypeMarshaller {
    /// Names declared by any header in the input set.
    declared: FxHashSet<String>,
    /// Extra names treated as declared.
    known: FxHashSet<String>,
    /// Base name -> native spelling.
    spellings: FxHashMap<String, String>,
}

impl TypeMarshaller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_declared<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declared.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_known<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_spelling(mut self, name: impl Into<String>, native: impl Into<String>) -> Self {
        self.spellings.insert(name.into(), native.into());
        self
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.declared.contains(name) || self.known.contains(name)
    }

    /// Native spelling of a base name.
    pub fn native_spelling<'a>(&'a self, name: &'a str) -> &'a str {
        self.spellings.get(name).map(String::as_str).unwrap_or(name)
    }

    // =========================================
    // Classification
    // =========================================

    /// Classify a normalized type.
    ///
    /// A by-value `void` is [`TypeCategory::Void`]; `void*` and pointers to
    /// primitives are opaque pointers. Primitive names win over declarations. Anything else is
    /// opaque when declared and [`TypeCategory::Unknown`] otherwise.
    pub fn classify(&self, ty: &TypeRef) -> TypeDescriptor {
        if ty.is_void() {
            return TypeDescriptor::void();
        }
        let category = match PrimitiveKind::from_type_name(&ty.name) {
            Some(kind) if ty.indirection != Indirection::Pointer => {
                TypeCategory::from_primitive(kind)
            }
            Some(_) => TypeCategory::OpaquePointer,
            None if ty.name == "void" || self.is_declared(&ty.name) => match ty.indirection {
                Indirection::Pointer => TypeCategory::OpaquePointer,
                Indirection::Reference | Indirection::Value => TypeCategory::OpaqueReference,
            },
            None => TypeCategory::Unknown,
        };
        TypeDescriptor {
            category,
            name: ty.name.clone(),
            native: self.native_spelling(&ty.name).to_string(),
            indirection: ty.indirection,
        }
    }

    // =========================================
    // Strategies
    // =========================================

    /// Lua type tag passed to `luaL_checktype`.
    pub fn check_tag(&self, desc: &TypeDescriptor) -> Option<&'static str> {
        match desc.category {
            TypeCategory::Number | TypeCategory::Int => Some("LUA_TNUMBER"),
            TypeCategory::Bool => Some("LUA_TBOOLEAN"),
            TypeCategory::String => Some("LUA_TSTRING"),
            TypeCategory::OpaquePointer | TypeCategory::OpaqueReference | TypeCategory::Unknown => {
                Some("LUA_TLIGHTUSERDATA")
            }
            TypeCategory::Void => None,
        }
    }

    /// Compatibility test used for optional parameters.
    pub fn test_fn(&self, desc: &TypeDescriptor) -> Option<&'static str> {
        match desc.category {
            TypeCategory::Number | TypeCategory::Int => Some("lua_isnumber"),
            TypeCategory::Bool => Some("lua_isboolean"),
            TypeCategory::String => Some("lua_isstring"),
            TypeCategory::OpaquePointer | TypeCategory::OpaqueReference | TypeCategory::Unknown => {
                Some("lua_islightuserdata")
            }
            TypeCategory::Void => None,
        }
    }

    /// Native type of a local holding a read argument.
    pub fn local_type(&self, desc: &TypeDescriptor) -> String {
        if desc.is_pointer_handle() {
            format!("{}*", desc.native)
        } else {
            desc.native.clone()
        }
    }

    /// Expression reading argument `slot` as `desc`.
    pub fn read_expr(&self, desc: &TypeDescriptor, slot: usize) -> String {
        match desc.category {
            TypeCategory::Number => format!("lua_tonumber(L, {slot})"),
            TypeCategory::Int => format!("lua_tointeger(L, {slot})"),
            TypeCategory::Bool => format!("lua_toboolean(L, {slot})"),
            TypeCategory::String => format!("{}(lua_tostring(L, {slot}))", desc.native),
            TypeCategory::Void => String::new(),
            _ if desc.is_pointer_handle() => {
                format!("({}*)lua_topointer(L, {slot})", desc.native)
            }
            _ => format!("*({}*)lua_topointer(L, {slot})", desc.native),
        }
    }

    pub fn push_strategy(&self, desc: &TypeDescriptor) -> PushStrategy {
        match desc.category {
            TypeCategory::Void => PushStrategy::Nothing,
            TypeCategory::Number => PushStrategy::Direct {
                func: "lua_pushnumber",
                suffix: "",
            },
            TypeCategory::Int => PushStrategy::Direct {
                func: "lua_pushinteger",
                suffix: "",
            },
            TypeCategory::Bool => PushStrategy::Direct {
                func: "lua_pushboolean",
                suffix: "",
            },
            TypeCategory::String => PushStrategy::Direct {
                func: "lua_pushstring",
                suffix: ".c_str()",
            },
            _ if desc.is_pointer_handle() => PushStrategy::NullablePointer,
            _ => PushStrategy::HeapCopy {
                native: desc.native.clone(),
            },
        }
    }

    /// Script-side expression passing `name` to a glue function.
    pub fn script_arg(&self, desc: &TypeDescriptor, name: &str, optional: bool) -> String {
        match (desc.is_opaque(), optional) {
            (false, _) => name.to_string(),
            (true, false) => format!("{name}.__ptr"),
            (true, true) => format!("{name} and {name}.__ptr"),
        }
    }
}
