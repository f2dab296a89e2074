//! Native glue emission.
//!
//! For every [`ClassPlan`] the [`GlueEmitter`] writes one `lua_CFunction`
//! per bound method and property, plus the `delete_<Class>` function, and
//! records each under its registration symbol. The functions and the symbol
//! list are collected across classes and assembled into the module files
//! once every class has been emitted.

use crate::filter::{ClassPlan, MethodKind, MethodPlan, ParamPlan, PropertyPlan};
use crate::marshal::{PushStrategy, TypeMarshaller};
use crate::writer::CodeWriter;

/// One row of the module's registration table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntry {
    /// Name the script calls.
    pub symbol: String,
    /// Native function implementing it.
    pub function: String,
}

/// Everything the glue emitter produced for a module.
#[derive(Debug, Clone, Default)]
pub struct GlueOutput {
    pub functions: String,
    pub symbols: Vec<SymbolEntry>,
}

/// Names used by the event adapter.
#[derive(Debug, Clone, Copy)]
pub struct EventAdapter<'a> {
    /// Native base class the adapter derives from.
    pub base: &'a str,
    /// Native event type handed to `handleEvent`.
    pub event: &'a str,
}

impl EventAdapter<'_> {
    pub const CLASS: &'static str = "LuaEventHandler";

    /// The adapter class. Re-enters the script synchronously and drops any
    /// event delivered while a dispatch is already running.
    pub fn render(&self) -> String {
        let mut w = CodeWriter::new();
        w.line(format!("class {} : public {} {{", Self::CLASS, self.base))
            .line("public:")
            .indent()
            .line(format!(
                "{}() : {}(), wrapperIndex(LUA_NOREF), L(NULL), dispatching(false) {{}}",
                Self::CLASS,
                self.base
            ))
            .open(format!("void handleEvent({} *e) {{", self.event))
            .line("if(dispatching) return;")
            .line("dispatching = true;")
            .line("lua_rawgeti(L, LUA_REGISTRYINDEX, wrapperIndex);")
            .line("lua_getfield(L, -1, \"__handleEvent\");")
            .line("lua_rawgeti(L, LUA_REGISTRYINDEX, wrapperIndex);")
            .line("lua_pushlightuserdata(L, e);")
            .line("lua_call(L, 2, 0);")
            .line("lua_pop(L, 1);")
            .line("dispatching = false;")
            .close("}")
            .line("int wrapperIndex;")
            .line("lua_State *L;")
            .line("bool dispatching;")
            .dedent()
            .line("};");
        w.finish()
    }
}

// ============================================================================
// Emitter
// ============================================================================

pub struct GlueEmitter<'m> {
    lib_name: String,
    marshaller: &'m TypeMarshaller,
    out: CodeWriter,
    symbols: Vec<SymbolEntry>,
}

impl<'m> GlueEmitter<'m> {
    /// `lib_name` prefixes every native function name and is the table the
    /// functions are registered in.
    pub fn new(lib_name: impl Into<String>, marshaller: &'m TypeMarshaller) -> Self {
        Self {
            lib_name: lib_name.into(),
            marshaller,
            out: CodeWriter::new(),
            symbols: Vec::new(),
        }
    }

    pub fn symbols(&self) -> &[SymbolEntry] {
        &self.symbols
    }

    pub fn functions(&self) -> &str {
        self.out.as_str()
    }

    pub fn finish(self) -> GlueOutput {
        GlueOutput {
            functions: self.out.finish(),
            symbols: self.symbols,
        }
    }

    /// Emit all glue functions for one class.
    pub fn emit_class(&mut self, plan: &ClassPlan) {
        for property in &plan.properties {
            self.emit_getter(plan, property);
        }
        for property in plan.properties.iter().filter(|p| p.is_writable()) {
            self.emit_setter(plan, property);
        }
        for method in plan.all_methods() {
            self.emit_method(plan, method);
        }
        self.emit_delete(plan);
    }

    fn register(&mut self, symbol: String) -> String {
        let function = format!("{}_{}", self.lib_name, symbol);
        self.symbols.push(SymbolEntry {
            symbol,
            function: function.clone(),
        });
        function
    }

    fn open_function(&mut self, function: &str) {
        self.out.open(format!("static int {function}(lua_State *L) {{"));
    }

    fn close_function(&mut self) {
        self.out.close("}").blank();
    }

    fn read_instance(&mut self, native: &str) {
        self.out
            .line("luaL_checktype(L, 1, LUA_TLIGHTUSERDATA);")
            .line(format!("{native} *inst = ({native}*)lua_topointer(L, 1);"));
    }

    // =========================================
    // Properties
    // =========================================

    fn emit_getter(&mut self, plan: &ClassPlan, property: &PropertyPlan) {
        let function = self.register(plan.getter_symbol(&property.name));
        self.open_function(&function);
        self.read_instance(&plan.native);
        match self.marshaller.push_strategy(&property.ty) {
            PushStrategy::Direct { func, suffix } => {
                self.out
                    .line(format!("{func}(L, inst->{}{suffix});", property.name));
            }
            _ => {
                self.out
                    .line(format!("lua_pushlightuserdata(L, &inst->{});", property.name));
            }
        }
        self.out.line("return 1;");
        self.close_function();
    }

    fn emit_setter(&mut self, plan: &ClassPlan, property: &PropertyPlan) {
        let function = self.register(plan.setter_symbol(&property.name));
        self.open_function(&function);
        self.read_instance(&plan.native);
        let local = self.marshaller.local_type(&property.ty);
        let read = self.marshaller.read_expr(&property.ty, 2);
        self.out
            .line(format!("{local} param = {read};"))
            .line(format!("inst->{} = param;", property.name))
            .line("return 0;");
        self.close_function();
    }

    // =========================================
    // Methods
    // =========================================

    fn emit_method(&mut self, plan: &ClassPlan, method: &MethodPlan) {
        let function = self.register(method.symbol.clone());
        self.open_function(&function);
        if method.kind == MethodKind::Instance {
            self.read_instance(&plan.native);
        }

        let mut slot = method.first_slot();
        for param in &method.params {
            self.emit_param(param, slot);
            slot += 1;
        }
        let args = method
            .params
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        match method.kind {
            MethodKind::Constructor => self.emit_construction(plan, &args),
            MethodKind::Instance => {
                self.emit_call(method, &format!("inst->{}({args})", method.name));
            }
            MethodKind::Static => {
                self.emit_call(method, &format!("{}::{}({args})", plan.native, method.name));
            }
        }
        self.close_function();
    }

    fn emit_param(&mut self, param: &ParamPlan, slot: usize) {
        let m = self.marshaller;
        let local = m.local_type(&param.ty);
        let read = m.read_expr(&param.ty, slot);
        match (&param.default, m.test_fn(&param.ty)) {
            (Some(default), Some(test)) => {
                self.out
                    .line(format!("{local} {};", param.name))
                    .open(format!("if({test}(L, {slot})) {{"))
                    .line(format!("{} = {read};", param.name))
                    .reopen("} else {")
                    .line(format!("{} = {default};", param.name))
                    .close("}");
            }
            _ => {
                if let Some(tag) = m.check_tag(&param.ty) {
                    self.out.line(format!("luaL_checktype(L, {slot}, {tag});"));
                }
                self.out.line(format!("{local} {} = {read};", param.name));
            }
        }
    }

    fn emit_construction(&mut self, plan: &ClassPlan, args: &str) {
        if plan.is_event_base {
            let adapter = EventAdapter::CLASS;
            self.out
                .line(format!("{adapter} *inst = new {adapter}();"))
                .line("inst->wrapperIndex = luaL_ref(L, LUA_REGISTRYINDEX);")
                .line("inst->L = L;");
        } else {
            self.out
                .line(format!("{0} *inst = new {0}({args});", plan.native));
        }
        self.out
            .line("lua_pushlightuserdata(L, (void*)inst);")
            .line("return 1;");
    }

    fn emit_call(&mut self, method: &MethodPlan, call: &str) {
        match self.marshaller.push_strategy(&method.ret) {
            PushStrategy::Nothing => {
                self.out.line(format!("{call};")).line("return 0;");
                return;
            }
            PushStrategy::Direct { func, suffix } => {
                self.out.line(format!("{func}(L, {call}{suffix});"));
            }
            PushStrategy::NullablePointer => {
                self.out
                    .line(format!("void *ptrRetVal = (void*){call};"))
                    .open("if(ptrRetVal == NULL) {")
                    .line("lua_pushnil(L);")
                    .reopen("} else {")
                    .line("lua_pushlightuserdata(L, ptrRetVal);")
                    .close("}");
            }
            PushStrategy::HeapCopy { native } => {
                self.out
                    .line(format!("{native} *retInst = new {native}();"))
                    .line(format!("*retInst = {call};"))
                    .line("lua_pushlightuserdata(L, retInst);");
            }
        }
        self.out.line("return 1;");
    }

    fn emit_delete(&mut self, plan: &ClassPlan) {
        let function = self.register(plan.delete_symbol());
        self.open_function(&function);
        self.read_instance(&plan.native);
        self.out.line("delete inst;").line("return 0;");
        self.close_function();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{ClassModelFilter, FilterPolicy};
    use polybind_core::{ClassModel, MethodModel, ParameterModel, PropertyModel, TypeRef};

    fn marshaller() -> TypeMarshaller {
        TypeMarshaller::new().with_declared(["SceneLabel", "Entity", "Vector3", "EventHandler", "Event"])
    }

    fn label() -> ClassModel {
        ClassModel::new("SceneLabel")
            .with_base("Entity")
            .with_method(
                MethodModel::constructor("SceneLabel")
                    .with_param(ParameterModel::new("text", TypeRef::parse("const String &"))),
            )
            .with_method(
                MethodModel::new("setSize", TypeRef::parse("void"))
                    .with_param(ParameterModel::new("w", TypeRef::parse("Number")))
                    .with_param(ParameterModel::new("h", TypeRef::parse("Number")).with_default("0")),
            )
            .with_method(MethodModel::new("getParent", TypeRef::parse("Entity *")))
            .with_method(MethodModel::new("getPosition", TypeRef::parse("Vector3")))
            .with_method(MethodModel::new("getText", TypeRef::parse("String")))
            .with_property(PropertyModel::new("text", TypeRef::parse("String")))
            .with_property(PropertyModel::new("position", TypeRef::parse("Vector3")))
    }

    fn emit(class: &ClassModel) -> GlueOutput {
        let policy = FilterPolicy::default();
        let m = marshaller();
        let plan = ClassModelFilter::new(&policy, &m).plan(class).unwrap();
        let mut emitter = GlueEmitter::new("Polycode", &m);
        emitter.emit_class(&plan);
        emitter.finish()
    }

    #[test]
    fn registers_symbols_in_emission_order() {
        let out = emit(&label());
        let symbols: Vec<_> = out.symbols.iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(
            symbols,
            vec![
                "SceneLabel_get_text",
                "SceneLabel_get_position",
                "SceneLabel_set_text",
                "SceneLabel",
                "SceneLabel_setSize",
                "SceneLabel_getParent",
                "SceneLabel_getPosition",
                "SceneLabel_getText",
                "delete_SceneLabel",
            ]
        );
        assert_eq!(out.symbols[3].function, "Polycode_SceneLabel");
    }

    #[test]
    fn optional_parameter_falls_back_to_default() {
        let out = emit(&label());
        let expected = "static int Polycode_SceneLabel_setSize(lua_State *L) {
\tluaL_checktype(L, 1, LUA_TLIGHTUSERDATA);
\tSceneLabel *inst = (SceneLabel*)lua_topointer(L, 1);
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
";
        assert!(out.functions.contains(expected), "{}", out.functions);
    }

    #[test]
    fn constructor_reads_from_first_slot() {
        let out = emit(&label());
        let expected = "static int Polycode_SceneLabel(lua_State *L) {
\tluaL_checktype(L, 1, LUA_TSTRING);
\tString text = String(lua_tostring(L, 1));
\tSceneLabel *inst = new SceneLabel(text);
\tlua_pushlightuserdata(L, (void*)inst);
\treturn 1;
}
";
        assert!(out.functions.contains(expected), "{}", out.functions);
    }

    #[test]
    fn pointer_return_pushes_nil_for_null() {
        let out = emit(&label());
        assert!(out.functions.contains(
            "\tvoid *ptrRetVal = (void*)inst->getParent();
\tif(ptrRetVal == NULL) {
\t\tlua_pushnil(L);
\t} else {
\t\tlua_pushlightuserdata(L, ptrRetVal);
\t}
\treturn 1;
"
        ));
    }

    #[test]
    fn value_return_is_heap_copied() {
        let out = emit(&label());
        assert!(out.functions.contains(
            "\tVector3 *retInst = new Vector3();
\t*retInst = inst->getPosition();
\tlua_pushlightuserdata(L, retInst);
"
        ));
        assert!(out.functions.contains("\tlua_pushstring(L, inst->getText().c_str());\n"));
    }

    #[test]
    fn property_accessors() {
        let out = emit(&label());
        assert!(out.functions.contains("\tlua_pushstring(L, inst->text.c_str());\n"));
        assert!(out.functions.contains("\tlua_pushlightuserdata(L, &inst->position);\n"));
        assert!(out.functions.contains(
            "\tString param = String(lua_tostring(L, 2));
\tinst->text = param;
\treturn 0;
"
        ));
        assert!(!out.functions.contains("SceneLabel_set_position"));
    }

    #[test]
    fn delete_function() {
        let out = emit(&label());
        assert!(out.functions.contains(
            "static int Polycode_delete_SceneLabel(lua_State *L) {
\tluaL_checktype(L, 1, LUA_TLIGHTUSERDATA);
\tSceneLabel *inst = (SceneLabel*)lua_topointer(L, 1);
\tdelete inst;
\treturn 0;
}
"
        ));
    }

    #[test]
    fn static_method_has_no_instance() {
        let class = ClassModel::new("Services")
            .with_method(
                MethodModel::new("createInstance", TypeRef::parse("static void"))
                    .with_param(ParameterModel::new("id", TypeRef::parse("int"))),
            )
            .with_method(MethodModel::new("other", TypeRef::parse("void")));
        let out = emit(&class);
        assert!(out.functions.contains(
            "static int Polycode_Services_createInstance(lua_State *L) {
\tluaL_checktype(L, 1, LUA_TNUMBER);
\tint id = lua_tointeger(L, 1);
\tServices::createInstance(id);
\treturn 0;
}
"
        ));
    }

    #[test]
    fn event_base_constructor_builds_adapter() {
        let class = ClassModel::new("EventHandler")
            .with_method(MethodModel::constructor("EventHandler"))
            .with_method(
                MethodModel::new("secondaryHandler", TypeRef::parse("void"))
                    .with_param(ParameterModel::new("e", TypeRef::parse("Event *"))),
            );
        let out = emit(&class);
        assert!(out.functions.contains(
            "\tLuaEventHandler *inst = new LuaEventHandler();
\tinst->wrapperIndex = luaL_ref(L, LUA_REGISTRYINDEX);
\tinst->L = L;
\tlua_pushlightuserdata(L, (void*)inst);
"
        ));
    }

    #[test]
    fn adapter_guards_reentry() {
        let text = EventAdapter {
            base: "EventHandler",
            event: "Event",
        }
        .render();
        assert!(text.starts_with("class LuaEventHandler : public EventHandler {\npublic:\n"));
        assert!(text.contains("\tvoid handleEvent(Event *e) {\n\t\tif(dispatching) return;\n"));
        assert!(text.contains("\t\tlua_call(L, 2, 0);\n\t\tlua_pop(L, 1);\n"));
        assert!(text.ends_with("\tbool dispatching;\n};\n"));
    }
}
