//! Generator configuration.
//!
//! Every policy list the generator applies lives in [`BindingConfig`]. All
//! fields are optional in the TOML file; missing ones take the defaults
//! below, which bind the Polycode engine out of the box.
//!
//! ```toml
//! min_public_methods = 2
//! ignore_classes = ["Object", "Threaded"]
//! module_owned = ["CollisionScene"]
//!
//! [type_spellings]
//! Polygon = "Polycode::Polygon"
//!
//! [[mixins]]
//! target = "SceneParticleEmitter"
//! source = "ParticleEmitter"
//! view = "emitter"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use polybind_codegen::{FilterPolicy, MixinSpec, ModuleSettings, TypeMarshaller};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::generator::Invocation;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixinConfig {
    pub target: String,
    pub source: String,
    #[serde(default)]
    pub view: Option<String>,
    #[serde(default)]
    pub import_methods: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingConfig {
    /// Module owning shared services and base classes.
    pub root_module: String,
    pub native_namespace: String,
    pub services_header: String,
    pub services_class: String,
    pub export_macro: String,
    /// Expression wrappers use to reach the identity registry.
    pub identity: String,
    pub event_base: String,
    pub event_class: String,

    pub min_public_methods: usize,
    /// Header stems never read.
    pub ignore_files: Vec<String>,
    pub ignore_classes: Vec<String>,
    pub required_classes: Vec<String>,
    pub ignore_methods: Vec<String>,
    pub property_denylist: Vec<String>,
    pub module_owned: Vec<String>,
    /// Type names treated as declared even though no header declares them.
    pub known_types: Vec<String>,
    /// Identifiers dropped from headers before scanning.
    pub ignored_macros: Vec<String>,
    pub type_spellings: BTreeMap<String, String>,
    pub mixins: Vec<MixinConfig>,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            root_module: "Polycode".into(),
            native_namespace: "Polycode".into(),
            services_header: "PolyCoreServices.h".into(),
            services_class: "CoreServices".into(),
            export_macro: "_PolyExport".into(),
            identity: "Polycore.__identity".into(),
            event_base: "EventHandler".into(),
            event_class: "Event".into(),
            min_public_methods: 2,
            ignore_files: strings(&[
                "PolyGLSLProgram",
                "PolyGLSLShader",
                "PolyGLSLShaderModule",
                "PolyWinCore",
                "PolyCocoaCore",
                "PolyAGLCore",
                "PolySDLCore",
                "Poly_iPhone",
                "PolyGLES1Renderer",
                "PolyGLRenderer",
                "tinyxml",
                "tinystr",
                "OpenGLCubemap",
                "PolyiPhoneCore",
                "PolyGLES1Texture",
                "PolyGLTexture",
                "PolyGLVertexBuffer",
                "PolyThreaded",
                "PolyGLHeaders",
                "GLee",
            ]),
            ignore_classes: strings(&[
                "PolycodeShaderModule",
                "Object",
                "Threaded",
                "OpenGLCubemap",
                "ParticleEmitter",
            ]),
            required_classes: Vec::new(),
            ignore_methods: strings(&[
                "readByte32",
                "readByte16",
                "getCustomEntitiesByType",
                "Core",
                "Renderer",
                "Shader",
                "Texture",
                "handleEvent",
                "secondaryHandler",
                "getSTLString",
            ]),
            property_denylist: strings(&["setScale", "setPosition", "BUFFER_CACHE_PRECISION"]),
            module_owned: strings(&["PhysicsSceneEntity", "CollisionScene", "CollisionSceneEntity"]),
            known_types: Vec::new(),
            ignored_macros: strings(&["_PolyExport"]),
            type_spellings: [
                ("Polygon", "Polycode::Polygon"),
                ("Rectangle", "Polycode::Rectangle"),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
            mixins: ["ScreenParticleEmitter", "SceneParticleEmitter"]
                .into_iter()
                .map(|target| MixinConfig {
                    target: target.into(),
                    source: "ParticleEmitter".into(),
                    view: Some("emitter".into()),
                    import_methods: false,
                })
                .collect(),
        }
    }
}

impl BindingConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text, path)
    }

    /// Parse TOML text; `origin` is only used in errors.
    pub fn from_toml(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Filter policy for the module `prefix`. `manifest` lists classes the
    /// module owns on top of `module_owned`.
    pub fn filter_policy(&self, prefix: &str, manifest: &[String]) -> FilterPolicy {
        FilterPolicy {
            prefix: prefix.to_string(),
            root_module: self.root_module.clone(),
            min_public_methods: self.min_public_methods,
            ignore_classes: self.ignore_classes.iter().cloned().collect(),
            required_classes: self.required_classes.iter().cloned().collect(),
            ignore_methods: self.ignore_methods.iter().cloned().collect(),
            property_denylist: self.property_denylist.iter().cloned().collect(),
            module_owned: self
                .module_owned
                .iter()
                .chain(manifest)
                .cloned()
                .collect(),
            event_base: self.event_base.clone(),
            mixins: self
                .mixins
                .iter()
                .map(|m| MixinSpec {
                    target: m.target.clone(),
                    source: m.source.clone(),
                    view: m.view.clone(),
                    import_methods: m.import_methods,
                })
                .collect(),
        }
    }

    pub fn module_settings(&self, invocation: &Invocation) -> ModuleSettings {
        ModuleSettings {
            prefix: invocation.prefix.clone(),
            main_include: invocation.main_include.clone(),
            lib_small_name: invocation.lib_small_name.clone(),
            lib_name: invocation.lib_name.clone(),
            api_path: invocation.api_path.clone(),
            api_class_path: invocation.api_class_path.clone(),
            include_path: invocation.include_path.clone(),
            source_path: invocation.source_path.clone(),
            root_module: self.root_module.clone(),
            native_namespace: self.native_namespace.clone(),
            services_header: self.services_header.clone(),
            services_class: self.services_class.clone(),
            export_macro: self.export_macro.clone(),
            identity: self.identity.clone(),
            event_base: self.event_base.clone(),
            event_class: self.event_class.clone(),
        }
    }

    /// Marshaller knowing `declared` plus the configured extra types.
    pub fn marshaller<I>(&self, declared: I) -> TypeMarshaller
    where
        I: IntoIterator<Item = String>,
    {
        self.type_spellings.iter().fold(
            TypeMarshaller::new()
                .with_declared(declared)
                .with_known(self.known_types.iter().cloned()),
            |m, (name, native)| m.with_spelling(name.clone(), native.clone()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polybind_core::{TypeCategory, TypeRef};

    #[test]
    fn empty_file_gives_defaults() {
        let config = BindingConfig::from_toml("", Path::new("polybind.toml")).unwrap();
        assert_eq!(config, BindingConfig::default());
        assert_eq!(config.min_public_methods, 2);
        assert!(config.ignore_classes.contains(&"ParticleEmitter".to_string()));
        assert_eq!(config.mixins.len(), 2);
    }

    #[test]
    fn partial_file_overrides_only_given_fields() {
        let text = r#"
min_public_methods = 1
ignore_classes = ["Widget"]
known_types = ["char"]

[type_spellings]
Matrix = "Polycode::Matrix4"

[[mixins]]
target = "Sprite"
source = "Drawable"
import_methods = true
"#;
        let config = BindingConfig::from_toml(text, Path::new("polybind.toml")).unwrap();
        assert_eq!(config.min_public_methods, 1);
        assert_eq!(config.ignore_classes, vec!["Widget".to_string()]);
        assert_eq!(config.root_module, "Polycode");
        assert_eq!(config.type_spellings.len(), 1);
        assert_eq!(
            config.mixins,
            vec![MixinConfig {
                target: "Sprite".into(),
                source: "Drawable".into(),
                view: None,
                import_methods: true,
            }]
        );
    }

    #[test]
    fn invalid_toml_names_file() {
        let err = BindingConfig::from_toml("min_public_methods = \"two\"", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().starts_with("invalid config bad.toml:"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = BindingConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn manifest_extends_module_owned() {
        let config = BindingConfig::default();
        let policy = config.filter_policy("Physics", &["PhysicsScreen".to_string()]);
        assert!(policy.module_owned.contains("CollisionScene"));
        assert!(policy.module_owned.contains("PhysicsScreen"));
        assert_eq!(policy.require_path("PhysicsScreen"), "Physics/PhysicsScreen");
        assert_eq!(policy.require_path("Entity"), "Polycode/Entity");
    }

    #[test]
    fn marshaller_uses_spellings_and_known_types() {
        let config = BindingConfig {
            known_types: vec!["char".into()],
            ..BindingConfig::default()
        };
        let m = config.marshaller(vec!["Polygon".to_string()]);
        let polygon = m.classify(&TypeRef::parse("Polygon *"));
        assert_eq!(polygon.native, "Polycode::Polygon");
        assert_eq!(
            m.classify(&TypeRef::parse("const char *")).category,
            TypeCategory::OpaquePointer
        );
    }
}
