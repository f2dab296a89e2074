//! Module assembly.
//!
//! The [`ModuleAssembler`] runs the glue and wrapper emitters in lockstep
//! for each accepted class and, once every class is in, renders the
//! module-wide files:
//!
//! | artifact                              | contents                                   |
//! |---------------------------------------|--------------------------------------------|
//! | `<include>/<prefix>LUA.h`             | entry point declaration, main include      |
//! | `<include>/<prefix>LUAWrappers.h`     | header includes, event adapter, glue       |
//! | `<source>/<prefix>LUA.cpp`            | registration table and `luaopen_<prefix>`  |
//! | `<api_class>/<Class>.lua`             | one wrapper per class                      |
//! | `<api>/<prefix>.lua`                  | module index requiring every wrapper       |

use std::path::PathBuf;

use crate::filter::ClassPlan;
use crate::glue::{EventAdapter, GlueEmitter};
use crate::marshal::TypeMarshaller;
use crate::wrapper::WrapperEmitter;
use crate::writer::CodeWriter;

/// Names and locations for one generated module.
#[derive(Debug, Clone)]
pub struct ModuleSettings {
    /// Module name: file prefix, entry point suffix and require path root.
    pub prefix: String,
    /// Header included by the entry point declaration.
    pub main_include: String,
    /// Name of the registration table variable.
    pub lib_small_name: String,
    /// Script table the glue is registered in; prefixes native names.
    pub lib_name: String,
    pub api_path: PathBuf,
    pub api_class_path: PathBuf,
    pub include_path: PathBuf,
    pub source_path: PathBuf,
    /// Module owning the shared services; other modules adopt its instance.
    pub root_module: String,
    /// Namespace the glue is emitted into.
    pub native_namespace: String,
    pub services_header: String,
    pub services_class: String,
    /// Export macro on the entry point declaration.
    pub export_macro: String,
    /// Expression evaluating to the identity registry.
    pub identity: String,
    pub event_base: String,
    pub event_class: String,
}

impl Default for ModuleSettings {
    fn default() -> Self {
        Self {
            prefix: "Polycode".into(),
            main_include: "Polycode.h".into(),
            lib_small_name: "polycode".into(),
            lib_name: "Polycode".into(),
            api_path: PathBuf::new(),
            api_class_path: PathBuf::new(),
            include_path: PathBuf::new(),
            source_path: PathBuf::new(),
            root_module: "Polycode".into(),
            native_namespace: "Polycode".into(),
            services_header: "PolyCoreServices.h".into(),
            services_class: "CoreServices".into(),
            export_macro: "_PolyExport".into(),
            identity: "Polycore.__identity".into(),
            event_base: "EventHandler".into(),
            event_class: "Event".into(),
        }
    }
}

impl ModuleSettings {
    pub fn is_root_module(&self) -> bool {
        self.prefix == self.root_module
    }
}

/// A generated file and where it goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub contents: String,
}

impl Artifact {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// The module-wide files, produced after every class is emitted.
#[derive(Debug, Clone, Default)]
pub struct ArtifactSet {
    pub artifacts: Vec<Artifact>,
    /// Registration symbols in table order.
    pub symbols: Vec<String>,
}

impl ArtifactSet {
    pub fn get(&self, path: &std::path::Path) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.path == path)
    }
}

pub struct ModuleAssembler<'m> {
    settings: ModuleSettings,
    headers: Vec<String>,
    glue: GlueEmitter<'m>,
    wrappers: WrapperEmitter<'m>,
    /// Accepted classes, in processing order.
    classes: Vec<String>,
}

impl<'m> ModuleAssembler<'m> {
    pub fn new(settings: ModuleSettings, marshaller: &'m TypeMarshaller) -> Self {
        let glue = GlueEmitter::new(settings.lib_name.clone(), marshaller);
        let wrappers = WrapperEmitter::new(settings.lib_name.clone(), marshaller)
            .with_identity(settings.identity.clone())
            .with_event_class(settings.event_class.clone());
        Self {
            settings,
            headers: Vec::new(),
            glue,
            wrappers,
            classes: Vec::new(),
        }
    }

    pub fn settings(&self) -> &ModuleSettings {
        &self.settings
    }

    /// Include `file_name` in the wrappers header.
    pub fn add_header(&mut self, file_name: impl Into<String>) {
        self.headers.push(file_name.into());
    }

    /// Emit glue and wrapper for one class. The wrapper is returned so it
    /// can be written straight away; glue is held for [`finish`](Self::finish).
    pub fn add_class(&mut self, plan: &ClassPlan) -> Artifact {
        self.glue.emit_class(plan);
        let wrapper = self.wrappers.emit(plan);
        self.classes.push(plan.name.clone());
        Artifact::new(
            self.settings.api_class_path.join(format!("{}.lua", plan.name)),
            wrapper.source,
        )
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn finish(self) -> ArtifactSet {
        let s = &self.settings;
        let entry = Artifact::new(
            s.include_path.join(format!("{}LUA.h", s.prefix)),
            self.render_entry_header(),
        );
        let wrappers = Artifact::new(
            s.include_path.join(format!("{}LUAWrappers.h", s.prefix)),
            self.render_wrappers_header(),
        );
        let source = Artifact::new(
            s.source_path.join(format!("{}LUA.cpp", s.prefix)),
            self.render_source(),
        );
        let index = Artifact::new(
            s.api_path.join(format!("{}.lua", s.prefix)),
            self.render_index(),
        );
        let symbols = self.glue.symbols().iter().map(|e| e.symbol.clone()).collect();
        ArtifactSet {
            artifacts: vec![entry, wrappers, source, index],
            symbols,
        }
    }

    // =========================================
    // Rendering
    // =========================================

    fn lua_includes(w: &mut CodeWriter) {
        w.line("#include <stdio.h>")
            .line("#include \"lua.h\"")
            .line("#include \"lualib.h\"")
            .line("#include \"lauxlib.h\"");
    }

    fn render_entry_header(&self) -> String {
        let s = &self.settings;
        let mut w = CodeWriter::new();
        w.line("#pragma once")
            .line(format!("#include <{}>", s.main_include))
            .line("extern \"C\" {");
        Self::lua_includes(&mut w);
        w.line(format!("int {} luaopen_{}(lua_State *L);", s.export_macro, s.prefix))
            .line("}");
        w.finish()
    }

    fn render_wrappers_header(&self) -> String {
        let s = &self.settings;
        let mut w = CodeWriter::new();
        w.line("#pragma once").blank().line("extern \"C\" {").blank();
        Self::lua_includes(&mut w);
        w.line("} // extern \"C\"").blank();
        for header in &self.headers {
            w.line(format!("#include \"{header}\""));
        }
        w.blank().line(format!("namespace {} {{", s.native_namespace)).blank();
        if s.is_root_module() {
            let adapter = EventAdapter {
                base: &s.event_base,
                event: &s.event_class,
            };
            w.raw(adapter.render()).blank();
        }
        w.raw(self.glue.functions());
        w.line(format!("}} // namespace {}", s.native_namespace));
        w.finish()
    }

    fn render_source(&self) -> String {
        let s = &self.settings;
        let mut w = CodeWriter::new();
        w.line(format!("#include \"{}LUA.h\"", s.prefix))
            .line(format!("#include \"{}LUAWrappers.h\"", s.prefix))
            .line(format!("#include \"{}\"", s.services_header))
            .blank()
            .line(format!("using namespace {};", s.native_namespace))
            .blank()
            .open(format!("int luaopen_{}(lua_State *L) {{", s.prefix));
        if !s.is_root_module() {
            w.line(format!(
                "{0} *inst = ({0}*)lua_topointer(L, 1);",
                s.services_class
            ))
            .line(format!("{}::setInstance(inst);", s.services_class));
        }
        w.open(format!("static const struct luaL_reg {}Lib [] = {{", s.lib_small_name));
        for entry in self.glue.symbols() {
            w.line(format!("{{\"{}\", {}}},", entry.symbol, entry.function));
        }
        w.line("{NULL, NULL}")
            .close("};")
            .line(format!(
                "luaL_openlib(L, \"{}\", {}Lib, 0);",
                s.lib_name, s.lib_small_name
            ))
            .line("return 1;")
            .close("}");
        w.finish()
    }

    fn render_index(&self) -> String {
        let s = &self.settings;
        let mut w = CodeWriter::new();
        if s.is_root_module() {
            render_identity_registry(&mut w, &s.identity);
        }
        for class in &self.classes {
            w.line(format!("require \"{}/{}\"", s.prefix, class));
        }
        w.finish()
    }
}

/// Default identity registry, installed only when none is present.
fn render_identity_registry(w: &mut CodeWriter, identity: &str) {
    let segments: Vec<&str> = identity.split('.').collect();
    for depth in 1..segments.len() {
        let table = segments[..depth].join(".");
        w.line(format!("{table} = {table} or {{}}"));
    }
    w.open(format!("if {identity} == nil then"))
        .line("local handles = {}")
        .open(format!("{identity} = {{"))
        .open("lookup = function(ptr)")
        .line("return handles[ptr]")
        .close("end,")
        .open("register = function(ptr, wrapper)")
        .line("handles[ptr] = wrapper")
        .line("return wrapper")
        .close("end,")
        .open("evict = function(ptr)")
        .line("handles[ptr] = nil")
        .close("end,")
        .close("}")
        .close("end")
        .blank();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{ClassModelFilter, FilterPolicy};
    use polybind_core::{ClassModel, MethodModel, ParameterModel, TypeRef};
    use std::path::Path;

    fn settings(prefix: &str) -> ModuleSettings {
        ModuleSettings {
            prefix: prefix.into(),
            main_include: format!("{prefix}.h"),
            lib_small_name: prefix.to_lowercase(),
            lib_name: prefix.into(),
            api_path: "api".into(),
            api_class_path: format!("api/{prefix}").into(),
            include_path: "include".into(),
            source_path: "src".into(),
            ..ModuleSettings::default()
        }
    }

    fn classes() -> Vec<ClassModel> {
        vec![
            ClassModel::new("Timer")
                .with_method(MethodModel::constructor("Timer"))
                .with_method(
                    MethodModel::new("setTimer", TypeRef::parse("void"))
                        .with_param(ParameterModel::new("ms", TypeRef::parse("int"))),
                ),
            ClassModel::new("Clock")
                .with_base("Timer")
                .with_method(MethodModel::new("getTime", TypeRef::parse("Number")))
                .with_method(MethodModel::new("reset", TypeRef::parse("void"))),
        ]
    }

    fn assemble(prefix: &str) -> (Vec<Artifact>, ArtifactSet) {
        let marshaller = TypeMarshaller::new().with_declared(["Timer", "Clock"]);
        let policy = FilterPolicy {
            prefix: prefix.into(),
            ..FilterPolicy::default()
        };
        let mut filter = ClassModelFilter::new(&policy, &marshaller);
        let mut assembler = ModuleAssembler::new(settings(prefix), &marshaller);
        assembler.add_header("PolyTimer.h");
        let wrappers = classes()
            .iter()
            .filter_map(|c| filter.plan(c))
            .map(|plan| assembler.add_class(&plan))
            .collect();
        (wrappers, assembler.finish())
    }

    #[test]
    fn wrapper_paths() {
        let (wrappers, _) = assemble("Polycode");
        let paths: Vec<_> = wrappers.iter().map(|a| a.path.clone()).collect();
        assert_eq!(
            paths,
            vec![PathBuf::from("api/Polycode/Timer.lua"), PathBuf::from("api/Polycode/Clock.lua")]
        );
    }

    #[test]
    fn entry_header() {
        let (_, set) = assemble("Polycode");
        let entry = set.get(Path::new("include/PolycodeLUA.h")).unwrap();
        assert_eq!(
            entry.contents,
            "#pragma once
#include <Polycode.h>
extern \"C\" {
#include <stdio.h>
#include \"lua.h\"
#include \"lualib.h\"
#include \"lauxlib.h\"
int _PolyExport luaopen_Polycode(lua_State *L);
}
"
        );
    }

    #[test]
    fn registration_table_matches_glue() {
        let (_, set) = assemble("Polycode");
        let source = set.get(Path::new("src/PolycodeLUA.cpp")).unwrap();
        assert!(source.contents.contains(
            "\tstatic const struct luaL_reg polycodeLib [] = {
\t\t{\"Timer\", Polycode_Timer},
\t\t{\"Timer_setTimer\", Polycode_Timer_setTimer},
\t\t{\"delete_Timer\", Polycode_delete_Timer},
\t\t{\"Clock_getTime\", Polycode_Clock_getTime},
\t\t{\"Clock_reset\", Polycode_Clock_reset},
\t\t{\"delete_Clock\", Polycode_delete_Clock},
\t\t{NULL, NULL}
\t};
\tluaL_openlib(L, \"Polycode\", polycodeLib, 0);
\treturn 1;
}
"
        ));
        assert!(!source.contents.contains("setInstance"));
        assert_eq!(set.symbols.len(), 6);
    }

    #[test]
    fn non_root_module_adopts_services() {
        let (_, set) = assemble("Physics");
        let source = set.get(Path::new("src/PhysicsLUA.cpp")).unwrap();
        assert!(source.contents.contains(
            "int luaopen_Physics(lua_State *L) {
\tCoreServices *inst = (CoreServices*)lua_topointer(L, 1);
\tCoreServices::setInstance(inst);
"
        ));
        let wrappers = set.get(Path::new("include/PhysicsLUAWrappers.h")).unwrap();
        assert!(!wrappers.contents.contains("LuaEventHandler"));
        let index = set.get(Path::new("api/Physics.lua")).unwrap();
        assert_eq!(index.contents, "require \"Physics/Timer\"\nrequire \"Physics/Clock\"\n");
    }

    #[test]
    fn wrappers_header_layout() {
        let (_, set) = assemble("Polycode");
        let header = set.get(Path::new("include/PolycodeLUAWrappers.h")).unwrap();
        assert!(header.contents.starts_with("#pragma once\n\nextern \"C\" {\n\n#include <stdio.h>\n"));
        assert!(header.contents.contains("} // extern \"C\"\n\n#include \"PolyTimer.h\"\n\nnamespace Polycode {\n\n"));
        assert!(header.contents.contains("class LuaEventHandler : public EventHandler {"));
        assert!(header.contents.contains("static int Polycode_Clock_getTime(lua_State *L) {"));
        assert!(header.contents.ends_with("} // namespace Polycode\n"));
    }

    #[test]
    fn root_index_installs_identity_registry() {
        let (_, set) = assemble("Polycode");
        let index = set.get(Path::new("api/Polycode.lua")).unwrap();
        assert!(index.contents.starts_with(
            "Polycore = Polycore or {}
if Polycore.__identity == nil then
\tlocal handles = {}
\tPolycore.__identity = {
\t\tlookup = function(ptr)
\t\t\treturn handles[ptr]
\t\tend,
"
        ));
        assert!(index.contents.ends_with("require \"Polycode/Timer\"\nrequire \"Polycode/Clock\"\n"));
    }
}
