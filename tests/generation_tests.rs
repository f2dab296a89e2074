//! End-to-end generation tests.
//!
//! These run the full pipeline (discovery, parsing, filtering, emission)
//! over the fixture headers in `tests/fixtures` and inspect what lands in
//! the sink.

use std::fs;
use std::path::{Path, PathBuf};

use polybind::{
    BindingConfig, FsSink, GenerateError, GenerationReport, Generator, Invocation, MemorySink,
};

/// Directory of a fixture header set.
fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn invocation(input: PathBuf, prefix: &str, out: &Path) -> Invocation {
    Invocation {
        input,
        prefix: prefix.into(),
        main_include: format!("{prefix}.h"),
        lib_small_name: prefix.to_lowercase(),
        lib_name: prefix.into(),
        api_path: out.join("api"),
        api_class_path: out.join("api").join(prefix),
        include_path: out.join("include"),
        source_path: out.join("src"),
        manifest: None,
    }
}

/// Generate the core fixture module into memory.
fn generate_core() -> (GenerationReport, MemorySink) {
    let mut sink = MemorySink::new();
    let report = Generator::new(BindingConfig::default())
        .run(&invocation(fixture("core"), "Polycode", Path::new("out")), &mut sink)
        .expect("core fixtures generate");
    (report, sink)
}

fn contents<'a>(sink: &'a MemorySink, path: &str) -> &'a str {
    &sink
        .get(path)
        .unwrap_or_else(|| panic!("{path} was not written"))
        .contents
}

/// Every `Polycode.<symbol>(` call in `source`.
fn glue_calls(source: &str) -> Vec<String> {
    source
        .split("Polycode.")
        .skip(1)
        .filter_map(|rest| {
            let end = rest.find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))?;
            rest[end..].starts_with('(').then(|| rest[..end].to_string())
        })
        .collect()
}

// =============================================================================
// Module layout
// =============================================================================

#[test]
fn test_core_module_files() {
    let dir = tempfile::tempdir().unwrap();
    let report = Generator::new(BindingConfig::default())
        .run(&invocation(fixture("core"), "Polycode", dir.path()), FsSink::new())
        .unwrap();

    for file in [
        "api/Polycode.lua",
        "api/Polycode/Entity.lua",
        "api/Polycode/EventHandler.lua",
        "api/Polycode/ScreenShape.lua",
        "include/PolycodeLUA.h",
        "include/PolycodeLUAWrappers.h",
        "src/PolycodeLUA.cpp",
    ] {
        assert!(dir.path().join(file).is_file(), "{file} missing");
    }
    assert!(!dir.path().join("api/Polycode/Tiny.lua").exists());
    assert_eq!(report.written.len(), 7);
}

#[test]
fn test_headers_processed_in_sorted_order() {
    let (report, sink) = generate_core();

    // GLee.h is ignored by stem and would not parse.
    assert_eq!(
        report.headers,
        vec!["PolyEntity.h", "PolyEventHandler.h", "PolyScreenShape.h", "PolyTiny.h"]
    );
    assert_eq!(report.bound, vec!["Entity", "EventHandler", "ScreenShape"]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].name, "Tiny");

    assert_eq!(
        contents(&sink, "out/api/Polycode.lua")
            .lines()
            .filter(|l| l.starts_with("require"))
            .collect::<Vec<_>>(),
        vec![
            "require \"Polycode/Entity\"",
            "require \"Polycode/EventHandler\"",
            "require \"Polycode/ScreenShape\"",
        ]
    );
}

#[test]
fn test_wrappers_written_before_module_files() {
    let (report, _) = generate_core();
    let last_wrapper = report
        .written
        .iter()
        .rposition(|p| p.starts_with("out/api/Polycode"))
        .unwrap();
    assert_eq!(last_wrapper, 2);
    assert_eq!(report.written[3], PathBuf::from("out/include/PolycodeLUA.h"));
}

// =============================================================================
// Glue and wrapper consistency
// =============================================================================

#[test]
fn test_glue_symbols_match_wrapper_calls() {
    let (report, sink) = generate_core();

    let mut called: Vec<String> = ["Entity", "EventHandler", "ScreenShape"]
        .iter()
        .flat_map(|class| glue_calls(contents(&sink, &format!("out/api/Polycode/{class}.lua"))))
        .collect();
    called.sort();
    called.dedup();

    let mut symbols = report.symbols.clone();
    symbols.sort();
    assert_eq!(called, symbols);

    let table = contents(&sink, "out/src/PolycodeLUA.cpp");
    let glue = contents(&sink, "out/include/PolycodeLUAWrappers.h");
    for symbol in &report.symbols {
        assert!(table.contains(&format!("{{\"{symbol}\", Polycode_{symbol}}},")), "{symbol}");
        assert!(glue.contains(&format!("static int Polycode_{symbol}(lua_State *L) {{")), "{symbol}");
    }
}

#[test]
fn test_omitted_argument_takes_default() {
    let (_, sink) = generate_core();
    let glue = contents(&sink, "out/include/PolycodeLUAWrappers.h");
    assert!(glue.contains(
        "static int Polycode_ScreenShape_setSize(lua_State *L) {
\tluaL_checktype(L, 1, LUA_TLIGHTUSERDATA);
\tScreenShape *inst = (ScreenShape*)lua_topointer(L, 1);
\tluaL_checktype(L, 2, LUA_TNUMBER);
\tNumber w = lua_tonumber(L, 2);
\tNumber h;
\tif(lua_isnumber(L, 3)) {
\t\th = lua_tonumber(L, 3);
\t} else {
\t\th = 0;
\t}
\tinst->setSize(w, h);
\treturn 0;
}
"
    ));

    let wrapper = contents(&sink, "out/api/Polycode/ScreenShape.lua");
    assert!(wrapper.contains(
        "function ScreenShape:setSize(w, h)
\tPolycode.ScreenShape_setSize(self.__ptr, w, h)
end
"
    ));
}

#[test]
fn test_split_float_default_is_repaired() {
    let (_, sink) = generate_core();
    let glue = contents(&sink, "out/include/PolycodeLUAWrappers.h");
    assert!(glue.contains("\t\ty = 1.0f;\n"));
    assert!(!glue.contains("1 0f"));
}

#[test]
fn test_static_constant_on_class_table() {
    let (_, sink) = generate_core();
    let wrapper = contents(&sink, "out/api/Polycode/Entity.lua");
    assert!(wrapper.contains("Entity.ENTITY_TYPE = 1\n"));
    assert!(!contents(&sink, "out/include/PolycodeLUAWrappers.h").contains("ENTITY_TYPE"));
}

#[test]
fn test_delete_evicts_before_native_delete() {
    let (_, sink) = generate_core();
    let wrapper = contents(&sink, "out/api/Polycode/Entity.lua");
    let evict = wrapper.find("Polycore.__identity.evict(self.__ptr)").unwrap();
    let delete = wrapper.find("Polycode.delete_Entity(self.__ptr)").unwrap();
    let clear = wrapper.find("self.__ptr = nil").unwrap();
    assert!(evict < delete && delete < clear);
}

#[test]
fn test_inherited_wrapper_requires_base() {
    let (_, sink) = generate_core();
    let wrapper = contents(&sink, "out/api/Polycode/ScreenShape.lua");
    assert!(wrapper.starts_with("require \"Polycode/Entity\"\n\nclass \"ScreenShape\" (Entity)\n"));
    // Any wrapper up the parsed base chain shares its handle.
    assert!(wrapper.contains(
        "if cls == \"ScreenShape\" or cls == \"Entity\" or cls == \"EventHandler\" then"
    ));
}

#[test]
fn test_event_base_builds_adapter() {
    let (_, sink) = generate_core();
    let glue = contents(&sink, "out/include/PolycodeLUAWrappers.h");
    assert!(glue.contains("class LuaEventHandler : public EventHandler {"));
    assert!(glue.contains("\tLuaEventHandler *inst = new LuaEventHandler();\n"));

    let wrapper = contents(&sink, "out/api/Polycode/EventHandler.lua");
    assert!(wrapper.contains("self.__ptr = Polycode.EventHandler(self)"));
    assert!(wrapper.contains("function EventHandler:__handleEvent(event)"));
    // handleEvent itself is never bound.
    assert!(!wrapper.contains("Polycode.EventHandler_handleEvent"));
}

#[test]
fn test_root_index_installs_identity_registry() {
    let (_, sink) = generate_core();
    let index = contents(&sink, "out/api/Polycode.lua");
    assert!(index.starts_with("Polycore = Polycore or {}\nif Polycore.__identity == nil then\n"));
}

// =============================================================================
// Module ownership
// =============================================================================

#[test]
fn test_manifest_sets_require_path() {
    let config = BindingConfig {
        module_owned: Vec::new(),
        ..BindingConfig::default()
    };
    let generator = Generator::new(config);

    let mut plain = MemorySink::new();
    generator
        .run(&invocation(fixture("physics"), "Physics", Path::new("out")), &mut plain)
        .unwrap();
    assert!(
        contents(&plain, "out/api/Physics/PhysicsScene.lua")
            .starts_with("require \"Polycode/CollisionScene\"\n")
    );

    let manifest = fixture("physics").join("manifest.txt");
    let mut owned = MemorySink::new();
    let inv = Invocation {
        manifest: Some(manifest.display().to_string()),
        ..invocation(fixture("physics"), "Physics", Path::new("out"))
    };
    generator.run(&inv, &mut owned).unwrap();
    assert!(
        contents(&owned, "out/api/Physics/PhysicsScene.lua")
            .starts_with("require \"Physics/CollisionScene\"\n")
    );
}

#[test]
fn test_non_root_module_adopts_services() {
    let mut sink = MemorySink::new();
    Generator::new(BindingConfig::default())
        .run(&invocation(fixture("physics"), "Physics", Path::new("out")), &mut sink)
        .unwrap();

    assert!(contents(&sink, "out/src/PhysicsLUA.cpp").contains("\tCoreServices::setInstance(inst);\n"));
    assert!(!contents(&sink, "out/include/PhysicsLUAWrappers.h").contains("LuaEventHandler"));
    assert!(!contents(&sink, "out/api/Physics.lua").contains("__identity"));
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_config_file_overrides_policy() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("polybind.toml");
    fs::write(&path, "min_public_methods = 1\n").unwrap();

    let config = BindingConfig::load(&path).unwrap();
    let mut sink = MemorySink::new();
    let report = Generator::new(config)
        .run(&invocation(fixture("core"), "Polycode", Path::new("out")), &mut sink)
        .unwrap();

    assert!(report.bound.contains(&"Tiny".to_string()));
    assert!(report.skipped.is_empty());
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_parse_error_aborts_before_writing() {
    let input = tempfile::tempdir().unwrap();
    fs::write(
        input.path().join("PolyGood.h"),
        "class Good { public: Good(); void a(); };",
    )
    .unwrap();
    fs::write(input.path().join("PolyBroken.h"), "class Broken { public: void a();").unwrap();

    let mut sink = MemorySink::new();
    let err = Generator::new(BindingConfig::default())
        .run(&invocation(input.path().to_path_buf(), "Polycode", Path::new("out")), &mut sink)
        .unwrap_err();

    assert!(matches!(err, GenerateError::Parse(_)));
    assert!(err.to_string().starts_with("PolyBroken.h:"));
    assert!(sink.is_empty());
}

#[test]
fn test_duplicate_class_aborts() {
    let input = tempfile::tempdir().unwrap();
    let source = "class Twice { public: Twice(); void a(); };";
    fs::write(input.path().join("PolyA.h"), source).unwrap();
    fs::write(input.path().join("PolyB.h"), source).unwrap();

    let mut sink = MemorySink::new();
    let err = Generator::new(BindingConfig::default())
        .run(&invocation(input.path().to_path_buf(), "Polycode", Path::new("out")), &mut sink)
        .unwrap_err();

    assert!(matches!(err, GenerateError::Model(_)));
    assert!(sink.is_empty());
}

#[test]
fn test_missing_input_directory() {
    let err = Generator::new(BindingConfig::default())
        .run(
            &invocation(PathBuf::from("/nonexistent/headers"), "Polycode", Path::new("out")),
            MemorySink::new(),
        )
        .unwrap_err();
    assert!(matches!(err, GenerateError::Io { .. }));
}
