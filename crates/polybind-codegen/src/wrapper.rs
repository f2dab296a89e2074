//! Script-side wrapper emission.
//!
//! Each accepted class becomes one Lua file declaring a class that proxies
//! to the glue functions. Wrappers hold the native handle in `__ptr` and go
//! through the identity registry so a handle always maps to the same
//! wrapper:
//!
//! - handles returned from native code run lookup-or-wrap,
//! - constructed objects are registered,
//! - `__delete()` evicts before the native object is destroyed.

use crate::filter::{ClassPlan, MethodKind, MethodPlan, PropertyPlan, ViewPlan, is_lua_keyword};
use crate::marshal::TypeMarshaller;
use crate::writer::CodeWriter;

/// Argument that builds a wrapper without a native object.
pub const SKIP_PTR: &str = "__skip_ptr__";

/// Table key for a member; reserved words need the bracketed form.
fn table_key(name: &str) -> String {
    if is_lua_keyword(name) {
        format!("[\"{name}\"]")
    } else {
        name.to_string()
    }
}

/// One generated wrapper file.
#[derive(Debug, Clone, Default)]
pub struct WrapperOutput {
    pub source: String,
    /// Glue symbols the wrapper calls, in the order they appear.
    pub glue_calls: Vec<String>,
}

pub struct WrapperEmitter<'m> {
    lib_name: String,
    /// Expression evaluating to the identity registry.
    identity: String,
    /// Script class wrapping events passed to `__handleEvent`.
    event_class: String,
    marshaller: &'m TypeMarshaller,
}

impl<'m> WrapperEmitter<'m> {
    pub fn new(lib_name: impl Into<String>, marshaller: &'m TypeMarshaller) -> Self {
        Self {
            lib_name: lib_name.into(),
            identity: "Polycore.__identity".into(),
            event_class: "Event".into(),
            marshaller,
        }
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = identity.into();
        self
    }

    pub fn with_event_class(mut self, event_class: impl Into<String>) -> Self {
        self.event_class = event_class.into();
        self
    }

    pub fn emit(&self, plan: &ClassPlan) -> WrapperOutput {
        let mut ctx = Emission {
            emitter: self,
            plan,
            w: CodeWriter::new(),
            calls: Vec::new(),
        };
        ctx.header();
        ctx.constants();
        ctx.getters();
        ctx.setters();
        ctx.constructor();
        for method in &plan.methods {
            ctx.method(method);
        }
        ctx.delete();
        if plan.is_event_base {
            ctx.handle_event();
        }
        WrapperOutput {
            source: ctx.w.finish(),
            glue_calls: ctx.calls,
        }
    }
}

/// State for emitting one class.
struct Emission<'e, 'm> {
    emitter: &'e WrapperEmitter<'m>,
    plan: &'e ClassPlan,
    w: CodeWriter,
    calls: Vec<String>,
}

impl Emission<'_, '_> {
    /// `lib.symbol`, recording the call.
    fn glue(&mut self, symbol: String) -> String {
        let expr = format!("{}.{}", self.emitter.lib_name, symbol);
        self.calls.push(symbol);
        expr
    }

    /// Lookup-or-wrap for the handle in `retVal`, returning the wrapper.
    fn wrap_return(&mut self, class: &str) {
        let identity = &self.emitter.identity;
        self.w
            .line("if retVal == nil then return nil end")
            .line(format!("local wrapper = {identity}.lookup(retVal)"))
            .open("if wrapper == nil then")
            .line(format!("wrapper = {class}(\"{SKIP_PTR}\")"))
            .line("wrapper.__ptr = retVal")
            .line(format!("{identity}.register(retVal, wrapper)"))
            .close("end")
            .line("return wrapper");
    }

    // =========================================
    // Class header
    // =========================================

    fn header(&mut self) {
        let name = &self.plan.name;
        match &self.plan.base {
            Some(base) => {
                self.w
                    .line(format!("require \"{}\"", base.require_path))
                    .blank()
                    .line(format!("class \"{name}\" ({})", base.name));
            }
            None => {
                self.w.line(format!("class \"{name}\""));
            }
        }
        self.w.blank();
    }

    fn constants(&mut self) {
        if self.plan.constants.is_empty() {
            return;
        }
        for constant in &self.plan.constants {
            let target = if is_lua_keyword(&constant.name) {
                format!("{}[\"{}\"]", self.plan.name, constant.name)
            } else {
                format!("{}.{}", self.plan.name, constant.name)
            };
            self.w.line(format!("{target} = {}", constant.value));
        }
        self.w.blank();
    }

    // =========================================
    // Properties
    // =========================================

    fn getters(&mut self) {
        let plan = self.plan;
        if plan.properties.is_empty() && plan.views.is_empty() {
            return;
        }
        self.w.open("local getters = {");
        for property in &plan.properties {
            self.getter(property);
        }
        for view in &plan.views {
            self.view(view);
        }
        self.w.close("}").blank();

        self.w
            .open(format!("function {}:__index__(name)", plan.name))
            .line("local getter = getters[name]")
            .open("if getter ~= nil then")
            .line("return getter(self)")
            .close("end");
        if let Some(base) = &plan.base {
            self.w
                .open(format!("if {0}.__index__ ~= nil then", base.name))
                .line(format!("return {0}.__index__(self, name)", base.name))
                .close("end");
        }
        self.w.close("end").blank();
    }

    fn getter(&mut self, property: &PropertyPlan) {
        let call = self.glue(self.plan.getter_symbol(&property.name));
        self.w.open(format!("{} = function(self)", table_key(&property.name)));
        if property.ty.is_primitive() {
            self.w.line(format!("return {call}(self.__ptr)"));
        } else {
            self.w.line(format!("local retVal = {call}(self.__ptr)"));
            self.wrap_return(&property.ty.name);
        }
        self.w.close("end,");
    }

    fn view(&mut self, view: &ViewPlan) {
        self.w
            .open(format!("{} = function(self)", table_key(&view.name)))
            .line(format!("local ret = {}(\"{SKIP_PTR}\")", view.class))
            .line("ret.__ptr = self.__ptr")
            .line("return ret")
            .close("end,");
    }

    fn setters(&mut self) {
        let plan = self.plan;
        let writable: Vec<&PropertyPlan> = plan.properties.iter().filter(|p| p.is_writable()).collect();
        if writable.is_empty() {
            return;
        }
        self.w.open("local setters = {");
        for property in writable {
            let call = self.glue(plan.setter_symbol(&property.name));
            self.w
                .open(format!("{} = function(self, value)", table_key(&property.name)))
                .line(format!("{call}(self.__ptr, value)"))
                .close("end,");
        }
        self.w.close("}").blank();

        self.w
            .open(format!("function {}:__set_callback(name, value)", plan.name))
            .line("local setter = setters[name]")
            .open("if setter ~= nil then")
            .line("setter(self, value)")
            .line("return true")
            .close("end");
        if let Some(base) = &plan.base {
            self.w
                .open(format!("if {0}.__set_callback ~= nil then", base.name))
                .line(format!("return {0}.__set_callback(self, name, value)", base.name))
                .close("end");
        }
        self.w.line("return false").close("end").blank();
    }

    // =========================================
    // Construction
    // =========================================

    fn constructor(&mut self) {
        let plan = self.plan;
        let name = &plan.name;
        let identity = self.emitter.identity.clone();

        let shared: Vec<String> = std::iter::once(name)
            .chain(&plan.ancestors)
            .map(|c| format!("cls == \"{c}\""))
            .collect();

        self.w
            .open(format!("function {name}:{name}(...)"))
            .line("local arg = {...}")
            .line("local n = select(\"#\", ...)")
            .open("if n == 1 and type(arg[1]) == \"table\" and arg[1].__ptr ~= nil then")
            .line("local cls = \"\" .. arg[1]:class()")
            .open(format!("if {} then", shared.join(" or ")))
            .line("self.__ptr = arg[1].__ptr")
            .line("return")
            .close("end")
            .close("end");

        if plan.constructor.is_some() {
            let call = self.glue(name.clone());
            let args = if plan.is_event_base {
                "self".to_string()
            } else {
                "unpack(arg, 1, n)".to_string()
            };
            self.w
                .open("for k, v in pairs(arg) do")
                .open("if type(v) == \"table\" and v.__ptr ~= nil then")
                .line("arg[k] = v.__ptr")
                .close("end")
                .close("end")
                .open(format!("if self.__ptr == nil and arg[1] ~= \"{SKIP_PTR}\" then"))
                .line(format!("self.__ptr = {call}({args})"))
                .line(format!("{identity}.register(self.__ptr, self)"))
                .close("end");
        }
        self.w.close("end").blank();
    }

    // =========================================
    // Methods
    // =========================================

    fn method(&mut self, method: &MethodPlan) {
        let m = self.emitter.marshaller;
        let params = method
            .params
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let mut args: Vec<String> = Vec::with_capacity(method.params.len() + 1);
        if method.kind == MethodKind::Instance {
            args.push("self.__ptr".into());
        }
        args.extend(
            method
                .params
                .iter()
                .map(|p| m.script_arg(&p.ty, &p.name, p.is_optional())),
        );

        let call = format!("{}({})", self.glue(method.symbol.clone()), args.join(", "));
        let class = &self.plan.name;
        if is_lua_keyword(&method.name) {
            let params = if params.is_empty() {
                "self".to_string()
            } else {
                format!("self, {params}")
            };
            self.w
                .open(format!("{class}[\"{}\"] = function({params})", method.name));
        } else {
            self.w.open(format!("function {class}:{}({params})", method.name));
        }
        if method.ret.is_void() {
            self.w.line(call);
        } else if method.ret.is_primitive() {
            self.w.line(format!("return {call}"));
        } else {
            self.w.line(format!("local retVal = {call}"));
            self.wrap_return(&method.ret.name);
        }
        self.w.close("end").blank();
    }

    fn delete(&mut self) {
        let call = self.glue(self.plan.delete_symbol());
        let identity = &self.emitter.identity;
        self.w
            .open(format!("function {}:__delete()", self.plan.name))
            .line("if self.__ptr == nil then return end")
            .line(format!("{identity}.evict(self.__ptr)"))
            .line(format!("{call}(self.__ptr)"))
            .line("self.__ptr = nil")
            .close("end");
    }

    fn handle_event(&mut self) {
        let event = &self.emitter.event_class;
        self.w
            .blank()
            .open(format!("function {}:__handleEvent(event)", self.plan.name))
            .line(format!("local evt = {event}(\"{SKIP_PTR}\")"))
            .line("evt.__ptr = event")
            .line("self:handleEvent(evt)")
            .close("end");
    }
}
