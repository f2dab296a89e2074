//! Class model filtering.
//!
//! [`ClassModelFilter`] decides which parsed classes, methods and properties
//! take part in the bindings and resolves everything the emitters need into
//! a [`ClassPlan`]: classified types, repaired defaults, argument names safe
//! in both languages, the base-class require path and any mixins.
//!
//! Nothing here is fatal. Rejected declarations are logged at `debug` and
//! dropped; questionable ones that can still be bound are logged at `warn`.

use std::fmt;

use polybind_core::{ClassModel, MethodModel, ParameterModel, PropertyModel, TypeCategory, TypeDescriptor};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

use crate::literal;
use crate::marshal::TypeMarshaller;

/// Lua reserved words. Parameters with these names get a `_` suffix; members
/// keep their name and are emitted under a bracketed key.
const LUA_KEYWORDS: &[&str] = &[
    "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "if", "in",
    "local", "nil", "not", "or", "repeat", "return", "then", "true", "until", "while",
];

/// Locals every glue function declares; parameters may not shadow them.
const GLUE_LOCALS: &[&str] = &["L", "inst", "param", "retInst", "ptrRetVal", "self"];

// ============================================================================
// Policy
// ============================================================================

/// Composes an interface class into a target class that cannot inherit it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixinSpec {
    pub target: String,
    pub source: String,
    /// Property on the target returning a wrapper of `source` sharing the
    /// target's handle.
    pub view: Option<String>,
    /// Bind the source's methods on the target.
    pub import_methods: bool,
}

/// Inclusion rules applied by [`ClassModelFilter`].
#[derive(Debug, Clone)]
pub struct FilterPolicy {
    /// Name of the module being generated.
    pub prefix: String,
    /// Module that owns every base class not listed in `module_owned`.
    pub root_module: String,
    pub min_public_methods: usize,
    pub ignore_classes: FxHashSet<String>,
    /// Bound even with fewer than `min_public_methods` methods.
    pub required_classes: FxHashSet<String>,
    pub ignore_methods: FxHashSet<String>,
    pub property_denylist: FxHashSet<String>,
    /// Bases required from this module rather than the root module.
    pub module_owned: FxHashSet<String>,
    /// Class whose constructor builds the event adapter.
    pub event_base: String,
    pub mixins: Vec<MixinSpec>,
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self {
            prefix: "Polycode".into(),
            root_module: "Polycode".into(),
            min_public_methods: 2,
            ignore_classes: FxHashSet::default(),
            required_classes: FxHashSet::default(),
            ignore_methods: FxHashSet::default(),
            property_denylist: FxHashSet::default(),
            module_owned: FxHashSet::default(),
            event_base: "EventHandler".into(),
            mixins: Vec::new(),
        }
    }
}

impl FilterPolicy {
    pub fn is_root_module(&self) -> bool {
        self.prefix == self.root_module
    }

    /// Module path a base class is required from.
    pub fn require_path(&self, base: &str) -> String {
        let module = if self.module_owned.contains(base) {
            &self.prefix
        } else {
            &self.root_module
        };
        format!("{module}/{base}")
    }
}

// ============================================================================
// Plans
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Constructor,
    Instance,
    Static,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamPlan {
    /// Name used for both the native local and the script parameter.
    pub name: String,
    pub ty: TypeDescriptor,
    /// Repaired fallback used when the argument is absent or incompatible.
    pub default: Option<String>,
}

impl ParamPlan {
    pub fn is_optional(&self) -> bool {
        self.default.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodPlan {
    pub name: String,
    /// Registration name: `<Class>_<method>`, or `<Class>` for constructors.
    pub symbol: String,
    pub kind: MethodKind,
    pub params: Vec<ParamPlan>,
    pub ret: TypeDescriptor,
}

impl MethodPlan {
    pub fn is_constructor(&self) -> bool {
        self.kind == MethodKind::Constructor
    }

    /// First argument slot holding a parameter.
    pub fn first_slot(&self) -> usize {
        match self.kind {
            MethodKind::Instance => 2,
            MethodKind::Constructor | MethodKind::Static => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyPlan {
    pub name: String,
    pub ty: TypeDescriptor,
}

impl PropertyPlan {
    /// Primitive properties get a setter.
    pub fn is_writable(&self) -> bool {
        self.ty.is_primitive()
    }
}

/// A handle-sharing view onto a mixed-in interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewPlan {
    pub name: String,
    pub class: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantPlan {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasePlan {
    pub name: String,
    pub require_path: String,
}

/// Everything both emitters need to bind one class.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassPlan {
    pub name: String,
    /// Spelling in native source.
    pub native: String,
    pub base: Option<BasePlan>,
    /// Bound ancestors, nearest first. A wrapper of any of them may be
    /// passed to the constructor to share its handle.
    pub ancestors: Vec<String>,
    pub constructor: Option<MethodPlan>,
    pub methods: Vec<MethodPlan>,
    pub properties: Vec<PropertyPlan>,
    pub views: Vec<ViewPlan>,
    pub constants: Vec<ConstantPlan>,
    /// Constructor builds the event adapter instead of the class itself.
    pub is_event_base: bool,
}

impl ClassPlan {
    pub fn delete_symbol(&self) -> String {
        format!("delete_{}", self.name)
    }

    pub fn getter_symbol(&self, property: &str) -> String {
        format!("{}_get_{}", self.name, property)
    }

    pub fn setter_symbol(&self, property: &str) -> String {
        format!("{}_set_{}", self.name, property)
    }

    /// Constructor followed by the other methods, in emission order.
    pub fn all_methods(&self) -> impl Iterator<Item = &MethodPlan> {
        self.constructor.iter().chain(self.methods.iter())
    }
}

// ============================================================================
// Skip reasons
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    IgnoredClass,
    TooFewMethods(usize),
    Duplicate,
    Operator,
    Destructor,
    GenericReturn,
    IgnoredMethod,
    MalformedDefault(String),
    StaticProperty,
    RawCollectionOrPointer,
    Denylisted,
    NumericName,
    ShadowedByView,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::IgnoredClass => write!(f, "class is ignored"),
            SkipReason::TooFewMethods(n) => write!(f, "only {n} public methods"),
            SkipReason::Duplicate => write!(f, "overload of an earlier method"),
            SkipReason::Operator => write!(f, "operator"),
            SkipReason::Destructor => write!(f, "destructor"),
            SkipReason::GenericReturn => write!(f, "templated return type"),
            SkipReason::IgnoredMethod => write!(f, "method is ignored"),
            SkipReason::MalformedDefault(p) => write!(f, "parameter '{p}' has an empty default"),
            SkipReason::StaticProperty => write!(f, "static property"),
            SkipReason::RawCollectionOrPointer => write!(f, "pointer, array or collection"),
            SkipReason::Denylisted => write!(f, "name is denylisted"),
            SkipReason::NumericName => write!(f, "numeric name"),
            SkipReason::ShadowedByView => write!(f, "replaced by a view property"),
        }
    }
}

// ============================================================================
// Filter
// ============================================================================

pub struct ClassModelFilter<'a> {
    policy: &'a FilterPolicy,
    marshaller: &'a TypeMarshaller,
    /// Every parsed class, for mixin sources.
    classes: FxHashMap<&'a str, &'a ClassModel>,
    /// Unknown type names already reported.
    warned: FxHashSet<String>,
}

impl<'a> ClassModelFilter<'a> {
    pub fn new(policy: &'a FilterPolicy, marshaller: &'a TypeMarshaller) -> Self {
        Self {
            policy,
            marshaller,
            classes: FxHashMap::default(),
            warned: FxHashSet::default(),
        }
    }

    /// Make `classes` available as mixin sources.
    pub fn with_classes(mut self, classes: impl IntoIterator<Item = &'a ClassModel>) -> Self {
        self.classes
            .extend(classes.into_iter().map(|c| (c.name.as_str(), c)));
        self
    }

    /// Why `class` is excluded, if it is.
    pub fn class_skip_reason(&self, class: &ClassModel) -> Option<SkipReason> {
        if self.policy.ignore_classes.contains(&class.name) {
            return Some(SkipReason::IgnoredClass);
        }
        let count = class.methods.len();
        if count < self.policy.min_public_methods && !self.policy.required_classes.contains(&class.name)
        {
            return Some(SkipReason::TooFewMethods(count));
        }
        None
    }

    /// Resolve `class` into a plan, or `None` when it is excluded.
    pub fn plan(&mut self, class: &ClassModel) -> Option<ClassPlan> {
        if let Some(reason) = self.class_skip_reason(class) {
            debug!(class = %class.name, %reason, "skipping class");
            return None;
        }

        let base = class
            .primary_base()
            .filter(|b| !self.policy.ignore_classes.contains(*b))
            .map(|b| BasePlan {
                name: b.to_string(),
                require_path: self.policy.require_path(b),
            });

        let ancestors = self.ancestors(class);

        let policy = self.policy;
        let mixins: Vec<&MixinSpec> = policy
            .mixins
            .iter()
            .filter(|m| m.target == class.name)
            .collect();

        let views: Vec<ViewPlan> = mixins
            .iter()
            .filter_map(|m| {
                m.view.as_ref().map(|name| ViewPlan {
                    name: name.clone(),
                    class: m.source.clone(),
                })
            })
            .collect();

        let (constructor, methods) = self.plan_methods(class, &mixins);
        let (properties, constants) = self.plan_properties(class, &views);

        Some(ClassPlan {
            name: class.name.clone(),
            native: self.marshaller.native_spelling(&class.name).to_string(),
            base,
            ancestors,
            constructor,
            methods,
            properties,
            views,
            constants,
            is_event_base: class.name == self.policy.event_base,
        })
    }

    // =========================================
    // Methods
    // =========================================

    /// Walk the primary-base chain of `class`. The walk stops at an ignored
    /// class and after the first base no header declares.
    fn ancestors(&self, class: &ClassModel) -> Vec<String> {
        let mut chain: Vec<String> = Vec::new();
        let mut next = class.primary_base();
        while let Some(base) = next {
            if self.policy.ignore_classes.contains(base)
                || base == class.name
                || chain.iter().any(|c| c == base)
            {
                break;
            }
            chain.push(base.to_string());
            next = self.classes.get(base).and_then(|c| c.primary_base());
        }
        chain
    }

    fn plan_methods(
        &mut self,
        class: &ClassModel,
        mixins: &[&MixinSpec],
    ) -> (Option<MethodPlan>, Vec<MethodPlan>) {
        let imported: Vec<&MethodModel> = mixins
            .iter()
            .filter(|m| m.import_methods)
            .filter_map(|m| {
                let source = self.classes.get(m.source.as_str()).copied();
                if source.is_none() {
                    warn!(class = %class.name, source = %m.source, "mixin source class not found");
                }
                source
            })
            .flat_map(|source| source.methods.iter())
            .filter(|m| !m.is_constructor() && !m.is_destructor())
            .collect();

        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let mut constructor = None;
        let mut methods = Vec::new();

        for method in class.methods.iter().chain(imported) {
            if let Some(reason) = self.method_skip_reason(method, &seen) {
                debug!(class = %class.name, method = %method.name, %reason, "skipping method");
                if reason != SkipReason::Duplicate {
                    seen.insert(&method.name);
                }
                continue;
            }
            seen.insert(&method.name);

            match self.plan_method(class, method) {
                Ok(plan) if plan.is_constructor() => constructor = Some(plan),
                Ok(plan) => methods.push(plan),
                Err(reason) => {
                    warn!(class = %class.name, method = %method.name, %reason, "skipping method");
                }
            }
        }
        (constructor, methods)
    }

    /// Why `method` is not bound, checked before its parameters are read.
    pub fn method_skip_reason(&self, method: &MethodModel, seen: &FxHashSet<&str>) -> Option<SkipReason> {
        if seen.contains(method.name.as_str()) {
            Some(SkipReason::Duplicate)
        } else if method.is_operator() {
            Some(SkipReason::Operator)
        } else if method.is_destructor() {
            Some(SkipReason::Destructor)
        } else if method.return_type.is_generic {
            Some(SkipReason::GenericReturn)
        } else if self.policy.ignore_methods.contains(&method.name) {
            Some(SkipReason::IgnoredMethod)
        } else {
            None
        }
    }

    fn plan_method(&mut self, class: &ClassModel, method: &MethodModel) -> Result<MethodPlan, SkipReason> {
        let kind = if method.is_constructor() {
            MethodKind::Constructor
        } else if method.is_static() {
            MethodKind::Static
        } else {
            MethodKind::Instance
        };

        let mut params = Vec::with_capacity(method.params.len());
        for (index, param) in method.params.iter().enumerate() {
            if param.ty.is_placeholder() {
                continue;
            }
            params.push(self.plan_param(class, method, index, param)?);
        }

        let (symbol, ret) = match kind {
            MethodKind::Constructor => (class.name.clone(), TypeDescriptor::void()),
            _ => (
                format!("{}_{}", class.name, method.name),
                self.classify(&class.name, &method.return_type),
            ),
        };

        Ok(MethodPlan {
            name: method.name.clone(),
            symbol,
            kind,
            params,
            ret,
        })
    }

    fn plan_param(
        &mut self,
        class: &ClassModel,
        method: &MethodModel,
        index: usize,
        param: &ParameterModel,
    ) -> Result<ParamPlan, SkipReason> {
        let name = if param.name.is_empty() {
            format!("arg{index}")
        } else {
            safe_name(&param.name)
        };
        let ty = self.classify(&class.name, &param.ty);

        let default = match &param.default {
            None => None,
            Some(raw) => {
                let repaired = literal::repair(raw);
                if repaired.is_empty() {
                    return Err(SkipReason::MalformedDefault(name));
                }
                if !ty.is_opaque() {
                    Some(repaired)
                } else if ty.is_pointer_handle() && literal::is_null_literal(&repaired) {
                    Some(repaired)
                } else {
                    warn!(
                        class = %class.name,
                        method = %method.name,
                        param = %name,
                        default = %repaired,
                        "default of an object parameter is not null; argument is required"
                    );
                    None
                }
            }
        };

        Ok(ParamPlan { name, ty, default })
    }

    // =========================================
    // Properties
    // =========================================

    fn plan_properties(
        &mut self,
        class: &ClassModel,
        views: &[ViewPlan],
    ) -> (Vec<PropertyPlan>, Vec<ConstantPlan>) {
        let mut properties = Vec::new();
        let mut constants = Vec::new();

        for property in &class.properties {
            if property.is_static() {
                if let Some(value) = &property.default {
                    constants.push(ConstantPlan {
                        name: property.name.clone(),
                        value: literal::repair(value),
                    });
                }
                continue;
            }
            if let Some(reason) = self.property_skip_reason(property, views) {
                debug!(class = %class.name, property = %property.name, %reason, "skipping property");
                continue;
            }
            let ty = self.classify(&class.name, &property.ty);
            properties.push(PropertyPlan {
                name: property.name.clone(),
                ty,
            });
        }
        (properties, constants)
    }

    pub fn property_skip_reason(&self, property: &PropertyModel, views: &[ViewPlan]) -> Option<SkipReason> {
        if property.is_static() {
            Some(SkipReason::StaticProperty)
        } else if property.ty.is_raw_collection_or_pointer() {
            Some(SkipReason::RawCollectionOrPointer)
        } else if self.policy.property_denylist.contains(&property.name) {
            Some(SkipReason::Denylisted)
        } else if property.name.chars().all(|c| c.is_ascii_digit()) {
            Some(SkipReason::NumericName)
        } else if views.iter().any(|v| v.name == property.name) {
            Some(SkipReason::ShadowedByView)
        } else {
            None
        }
    }

    fn classify(&mut self, class: &str, ty: &polybind_core::TypeRef) -> TypeDescriptor {
        let desc = self.marshaller.classify(ty);
        if desc.category == TypeCategory::Unknown && self.warned.insert(desc.name.clone()) {
            warn!(class, ty = %desc.name, "type is not declared in any header; binding as an opaque handle");
        }
        desc
    }
}

pub fn is_lua_keyword(name: &str) -> bool {
    LUA_KEYWORDS.contains(&name)
}

/// Rename identifiers that are reserved in Lua or taken by glue locals.
pub fn safe_name(name: &str) -> String {
    if is_lua_keyword(name) || GLUE_LOCALS.contains(&name) {
        format!("{name}_")
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polybind_core::{MethodFlags, PropertyFlags, TypeRef};

    fn policy() -> FilterPolicy {
        FilterPolicy {
            prefix: "Physics".into(),
            ignore_classes: ["Object".to_string()].into_iter().collect(),
            ignore_methods: ["handleEvent".to_string()].into_iter().collect(),
            property_denylist: ["BUFFER_CACHE_PRECISION".to_string()].into_iter().collect(),
            module_owned: ["CollisionScene".to_string()].into_iter().collect(),
            ..FilterPolicy::default()
        }
    }

    fn marshaller() -> TypeMarshaller {
        TypeMarshaller::new().with_declared(["Entity", "Vector3", "Scene", "ParticleEmitter"])
    }

    fn param(name: &str, ty: &str) -> ParameterModel {
        ParameterModel::new(name, TypeRef::parse(ty))
    }

    fn method(name: &str, ret: &str) -> MethodModel {
        MethodModel::new(name, TypeRef::parse(ret))
    }

    fn label() -> ClassModel {
        ClassModel::new("SceneLabel")
            .with_base("Entity")
            .with_method(MethodModel::constructor("SceneLabel").with_param(param("text", "const String &")))
            .with_method(MethodModel::destructor("SceneLabel"))
            .with_method(
                method("setSize", "void")
                    .with_param(param("w", "Number"))
                    .with_param(param("h", "Number").with_default("0")),
            )
            .with_method(method("setSize", "void").with_param(param("size", "const Vector3 &")))
            .with_method(method("operator==", "bool"))
            .with_method(method("getEntities", "std::vector<Entity*>"))
            .with_method(method("handleEvent", "void"))
            .with_method(method("getParent", "Entity *"))
            .with_property(PropertyModel::new("text", TypeRef::parse("String")))
            .with_property(PropertyModel::new("position", TypeRef::parse("Vector3")))
            .with_property(PropertyModel::new("owner", TypeRef::parse("Entity *")))
            .with_property(PropertyModel::new("children", TypeRef::parse("std::vector<Entity*>")))
            .with_property(PropertyModel::new("BUFFER_CACHE_PRECISION", TypeRef::parse("int")))
            .with_property(PropertyModel::new("42", TypeRef::parse("int")))
            .with_property(
                PropertyModel::new("MAX_CHARS", TypeRef::parse("static const int")).with_default("128"),
            )
    }

    fn plan(class: &ClassModel) -> Option<ClassPlan> {
        let policy = policy();
        let marshaller = marshaller();
        ClassModelFilter::new(&policy, &marshaller).plan(class)
    }

    #[test]
    fn plans_accepted_class() {
        let plan = plan(&label()).unwrap();
        assert_eq!(plan.name, "SceneLabel");
        assert_eq!(
            plan.base,
            Some(BasePlan {
                name: "Entity".into(),
                require_path: "Polycode/Entity".into()
            })
        );

        let ctor = plan.constructor.as_ref().unwrap();
        assert_eq!(ctor.symbol, "SceneLabel");
        assert_eq!(ctor.first_slot(), 1);
        assert_eq!(ctor.params[0].ty.category, TypeCategory::String);

        let names: Vec<_> = plan.methods.iter().map(|m| m.symbol.as_str()).collect();
        assert_eq!(names, vec!["SceneLabel_setSize", "SceneLabel_getParent"]);
    }

    #[test]
    fn first_overload_wins_with_default() {
        let plan = plan(&label()).unwrap();
        let set_size = &plan.methods[0];
        assert_eq!(set_size.params.len(), 2);
        assert!(!set_size.params[0].is_optional());
        assert_eq!(set_size.params[1].default.as_deref(), Some("0"));
        assert_eq!(set_size.first_slot(), 2);
    }

    #[test]
    fn properties_and_constants() {
        let plan = plan(&label()).unwrap();
        let props: Vec<_> = plan.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(props, vec!["text", "position"]);
        assert!(plan.properties[0].is_writable());
        assert!(!plan.properties[1].is_writable());
        assert_eq!(
            plan.constants,
            vec![ConstantPlan {
                name: "MAX_CHARS".into(),
                value: "128".into()
            }]
        );
    }

    #[test]
    fn skips_small_and_ignored_classes() {
        let small = ClassModel::new("Tiny").with_method(method("get", "int"));
        assert!(plan(&small).is_none());

        let ignored = ClassModel::new("Object")
            .with_method(method("a", "void"))
            .with_method(method("b", "void"));
        assert!(plan(&ignored).is_none());
    }

    #[test]
    fn required_class_overrides_method_count() {
        let mut policy = policy();
        policy.required_classes.insert("Tiny".into());
        let marshaller = marshaller();
        let small = ClassModel::new("Tiny").with_method(method("get", "int"));
        assert!(ClassModelFilter::new(&policy, &marshaller).plan(&small).is_some());
    }

    #[test]
    fn lifecycle_methods_count_towards_minimum() {
        let class = ClassModel::new("Timer")
            .with_method(MethodModel::constructor("Timer"))
            .with_method(MethodModel::destructor("Timer"));
        let plan = plan(&class).unwrap();
        assert!(plan.constructor.is_some());
        assert!(plan.methods.is_empty());
    }

    #[test]
    fn module_owned_base_path() {
        let class = ClassModel::new("PhysicsScene")
            .with_base("CollisionScene")
            .with_method(method("a", "void"))
            .with_method(method("b", "void"));
        assert_eq!(plan(&class).unwrap().base.unwrap().require_path, "Physics/CollisionScene");
    }

    #[test]
    fn ignored_base_counts_as_none() {
        let class = ClassModel::new("Thing")
            .with_base("Object")
            .with_method(method("a", "void"))
            .with_method(method("b", "void"));
        let plan = plan(&class).unwrap();
        assert!(plan.base.is_none());
        assert!(plan.ancestors.is_empty());
    }

    #[test]
    fn ancestors_follow_parsed_bases() {
        let two = |c: ClassModel| c.with_method(method("a", "void")).with_method(method("b", "void"));
        let classes = [
            two(ClassModel::new("EventHandler").with_base("Object")),
            two(ClassModel::new("Entity").with_base("EventHandler")),
            two(ClassModel::new("ScreenShape").with_base("Entity")),
            two(ClassModel::new("Orphan").with_base("Unparsed")),
        ];
        let policy = policy();
        let marshaller = marshaller();
        let mut filter = ClassModelFilter::new(&policy, &marshaller).with_classes(classes.iter());

        assert_eq!(filter.plan(&classes[2]).unwrap().ancestors, vec!["Entity", "EventHandler"]);
        assert_eq!(filter.plan(&classes[3]).unwrap().ancestors, vec!["Unparsed"]);
        // stops at an ignored base
        assert!(filter.plan(&classes[0]).unwrap().ancestors.is_empty());
    }

    #[test]
    fn keyword_parameters_are_renamed() {
        let class = ClassModel::new("Tween")
            .with_method(method("setRange", "void").with_param(param("end", "Number")))
            .with_method(method("setRepeat", "void").with_param(param("repeat", "bool")));
        let plan = plan(&class).unwrap();
        assert_eq!(plan.methods[0].params[0].name, "end_");
        assert_eq!(plan.methods[1].params[0].name, "repeat_");
        assert_eq!(safe_name("inst"), "inst_");
        assert!(is_lua_keyword("until"));
        assert!(!is_lua_keyword("self"));
        assert_eq!(safe_name("width"), "width");
    }

    #[test]
    fn placeholder_parameters_are_dropped() {
        let class = ClassModel::new("Odd")
            .with_method(
                method("f", "void")
                    .with_param(param("x", "0"))
                    .with_param(param("y", "int")),
            )
            .with_method(method("g", "void"));
        let plan = plan(&class).unwrap();
        assert_eq!(plan.methods[0].params.len(), 1);
        assert_eq!(plan.methods[0].params[0].name, "y");
    }

    #[test]
    fn literal_defaults_are_repaired() {
        let class = ClassModel::new("Light")
            .with_method(method("setIntensity", "void").with_param(param("v", "Number").with_default("1 0f")))
            .with_method(method("g", "void"));
        let plan = plan(&class).unwrap();
        assert_eq!(plan.methods[0].params[0].default.as_deref(), Some("1.0f"));
    }

    #[test]
    fn empty_default_skips_method() {
        let class = ClassModel::new("Light")
            .with_method(method("broken", "void").with_param(param("v", "Number").with_default(" ")))
            .with_method(method("fine", "void"));
        let plan = plan(&class).unwrap();
        let names: Vec<_> = plan.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["fine"]);
    }

    #[test]
    fn opaque_defaults() {
        let class = ClassModel::new("Camera")
            .with_method(
                method("attach", "void").with_param(param("parent", "Entity *").with_default("NULL")),
            )
            .with_method(
                method("lookAt", "void").with_param(param("up", "const Vector3 &").with_default("Vector3(0,1,0)")),
            );
        let plan = plan(&class).unwrap();
        assert!(plan.methods[0].params[0].is_optional());
        assert!(!plan.methods[1].params[0].is_optional());
    }

    #[test]
    fn static_method_reads_from_first_slot() {
        let class = ClassModel::new("Services")
            .with_method(method("getInstance", "static Services *"))
            .with_method(method("setInstance", "void").with_flags(MethodFlags::STATIC));
        let plan = plan(&class).unwrap();
        assert_eq!(plan.methods[0].kind, MethodKind::Static);
        assert_eq!(plan.methods[0].first_slot(), 1);
        assert_eq!(plan.methods[1].kind, MethodKind::Static);
    }

    #[test]
    fn static_property_without_default_is_dropped() {
        let mut prop = PropertyModel::new("count", TypeRef::parse("int"));
        prop.flags |= PropertyFlags::STATIC;
        let class = ClassModel::new("Counter")
            .with_method(method("a", "void"))
            .with_method(method("b", "void"))
            .with_property(prop);
        let plan = plan(&class).unwrap();
        assert!(plan.properties.is_empty());
        assert!(plan.constants.is_empty());
    }

    #[test]
    fn mixin_view_and_import() {
        let emitter = ClassModel::new("ParticleEmitter")
            .with_method(MethodModel::constructor("ParticleEmitter"))
            .with_method(method("setParticleCount", "void").with_param(param("count", "int")))
            .with_method(method("getParticleCount", "int"));
        let scene_emitter = ClassModel::new("SceneParticleEmitter")
            .with_base("Entity")
            .with_method(method("getParticleCount", "Number"))
            .with_method(method("update", "void"))
            .with_property(PropertyModel::new("emitter", TypeRef::parse("ParticleEmitter")));

        let mut policy = policy();
        policy.mixins.push(MixinSpec {
            target: "SceneParticleEmitter".into(),
            source: "ParticleEmitter".into(),
            view: Some("emitter".into()),
            import_methods: true,
        });
        let marshaller = marshaller();
        let classes = [emitter, scene_emitter];
        let plan = ClassModelFilter::new(&policy, &marshaller)
            .with_classes(classes.iter())
            .plan(&classes[1])
            .unwrap();

        assert_eq!(
            plan.views,
            vec![ViewPlan {
                name: "emitter".into(),
                class: "ParticleEmitter".into()
            }]
        );
        assert!(plan.properties.is_empty());

        let names: Vec<_> = plan.methods.iter().map(|m| m.symbol.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "SceneParticleEmitter_getParticleCount",
                "SceneParticleEmitter_update",
                "SceneParticleEmitter_setParticleCount",
            ]
        );
        // the target's own overload wins
        assert_eq!(plan.methods[0].ret.category, TypeCategory::Number);
        assert!(plan.constructor.is_none());
    }

    #[test]
    fn unknown_types_are_bound_as_handles() {
        let class = ClassModel::new("Loader")
            .with_method(method("load", "Mystery *"))
            .with_method(method("b", "void"));
        let plan = plan(&class).unwrap();
        assert_eq!(plan.methods[0].ret.category, TypeCategory::Unknown);
        assert!(plan.methods[0].ret.is_pointer_handle());
    }

    #[test]
    fn event_base_flag() {
        let class = ClassModel::new("EventHandler")
            .with_method(MethodModel::constructor("EventHandler"))
            .with_method(method("handleEvent", "void").with_param(param("e", "Event *")));
        let plan = plan(&class).unwrap();
        assert!(plan.is_event_base);
        assert!(plan.methods.is_empty());
    }
}
