//! The furipota engine.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use ecow::EcoString;
use hashbrown::HashMap;
use tracing::debug;

use super::environment::ModuleFactory;
use super::loader::{FileSystemLoader, SourceLoader, SourceParser};
use super::{EngineOptions, EnvironmentBuilder};
use crate::ast::{ModuleKind, Node};
use crate::environment::{EnvId, Environments};
use crate::errors::{Error, ErrorKind, Result};
use crate::evaluator::Context;
use crate::module::Module;
use crate::passes;
use crate::stdlib;
use crate::values::{Record, Value};

/// The furipota runtime.
///
/// The engine owns:
/// - Every environment frame (an arena addressed by [`EnvId`])
/// - The global frame every module environment descends from
/// - The registered core modules and plugins, and the module caches
/// - Runtime configuration (EngineOptions)
///
/// `Engine` is a cheap handle; clones share the same runtime. It is not
/// `Send`: one engine drives one single-threaded scheduler.
///
/// # Example
///
/// ```
/// use furipota_core::api::{Engine, EngineOptions};
/// use furipota_core::ast::build::{int, invoke, var};
/// use furipota_core::values::Value;
///
/// let engine = Engine::new(EngineOptions::default(), |_| {}).unwrap();
/// let module = engine.new_module("main.frp").unwrap();
/// let sum = invoke(invoke(var("+"), int(1)), int(2));
/// assert_eq!(engine.evaluate(&module, &sum).unwrap(), Value::Number(3.0));
/// ```
#[derive(Clone)]
pub struct Engine(Rc<EngineInner>);

struct EngineInner {
    options: EngineOptions,
    environments: RefCell<Environments>,
    globals: EnvId,
    core_modules: HashMap<EcoString, ModuleFactory>,
    plugins: HashMap<EcoString, ModuleFactory>,
    parser: Option<Rc<dyn SourceParser>>,
    loader: Rc<dyn SourceLoader>,
    core_cache: RefCell<HashMap<EcoString, Rc<Module>>>,
    module_cache: RefCell<HashMap<PathBuf, Rc<Module>>>,
}

impl Engine {
    /// Create a new engine.
    ///
    /// The initialization closure receives an [`EnvironmentBuilder`] that
    /// already holds the standard core modules.
    pub fn new(options: EngineOptions, init: impl FnOnce(&mut EnvironmentBuilder)) -> Result<Self> {
        let mut builder = EnvironmentBuilder::new();
        stdlib::register_core_modules(&mut builder);
        init(&mut builder);

        let mut environments = Environments::new();
        let globals = environments.root();
        environments.extend(globals, builder.globals)?;

        let engine = Engine(Rc::new(EngineInner {
            options,
            environments: RefCell::new(environments),
            globals,
            core_modules: builder.core_modules,
            plugins: builder.plugins,
            parser: builder.parser,
            loader: builder
                .loader
                .unwrap_or_else(|| Rc::new(FileSystemLoader)),
            core_cache: RefCell::new(HashMap::new()),
            module_cache: RefCell::new(HashMap::new()),
        }));

        if engine.0.options.prelude {
            let prelude = engine.core_module("prelude")?;
            let bindings = prelude.exported_bindings(&engine)?;
            engine.extend(globals, bindings.iter().map(|(k, v)| (k.clone(), v.clone())))?;
        }

        Ok(engine)
    }

    pub fn options(&self) -> &EngineOptions {
        &self.0.options
    }

    /// The frame every module environment descends from.
    pub fn globals(&self) -> EnvId {
        self.0.globals
    }

    /// The raw global binding for `name`.
    pub fn global(&self, name: &str) -> Result<Value> {
        self.lookup(self.0.globals, name)
    }

    /// A fresh, empty frame with no parent.
    pub fn root_env(&self) -> EnvId {
        self.0.environments.borrow_mut().root()
    }

    pub fn child_env(&self, parent: EnvId) -> EnvId {
        self.0.environments.borrow_mut().child(parent)
    }

    pub fn define(&self, env: EnvId, name: impl Into<EcoString>, value: Value) -> Result<()> {
        self.0.environments.borrow_mut().define(env, name, value)
    }

    pub fn extend(
        &self,
        env: EnvId,
        bindings: impl IntoIterator<Item = (EcoString, Value)>,
    ) -> Result<()> {
        self.0.environments.borrow_mut().extend(env, bindings)
    }

    /// Looks `name` up from `env` outwards, without forcing thunks.
    pub fn lookup(&self, env: EnvId, name: &str) -> Result<Value> {
        self.0.environments.borrow().get(env, name)
    }

    /// Creates a module whose environment is a child of the globals, with
    /// `self` bound to `{ path: file_name }`.
    pub fn new_module(&self, file_name: &str) -> Result<Rc<Module>> {
        let env = self.child_env(self.0.globals);
        let this: Record = [("path", Value::text(file_name))].into_iter().collect();
        self.define(env, "self", Value::Record(this))?;
        Ok(Rc::new(Module::new(file_name, env)))
    }

    /// A fresh evaluation context at the top of `module`.
    pub fn context(&self, module: &Rc<Module>) -> Context {
        Context::new(self.clone(), module.clone())
    }

    /// Desugars and evaluates `node` at the top level of `module`.
    pub fn evaluate(&self, module: &Rc<Module>, node: &Node) -> Result<Value> {
        let compiled = passes::compile(node)?;
        self.context(module).evaluate(&compiled)
    }

    /// Parses and evaluates a single expression in `module`.
    pub fn evaluate_source(&self, module: &Rc<Module>, source: &str) -> Result<Value> {
        let node = self.parser()?.parse_expression(source)?;
        self.evaluate(module, &node)
    }

    /// Evaluates a whole program as a new module named `file_name`.
    pub fn run_program(&self, file_name: &str, program: &Node) -> Result<Rc<Module>> {
        let module = self.new_module(file_name)?;
        self.evaluate(&module, program)?;
        Ok(module)
    }

    /// Resolves an import of `path` made from `ctx`'s module.
    pub fn load_module(&self, ctx: &Context, path: &str, kind: ModuleKind) -> Result<Rc<Module>> {
        let loaded = match kind {
            ModuleKind::Core => self.core_module(path),
            ModuleKind::Plugin => self.plugin_module(path),
            ModuleKind::Furipota => self.source_module(ctx, path),
        };
        loaded.map_err(|error| ctx.rethrow(error))
    }

    /// The core module registered as `name`, built on first use.
    pub fn core_module(&self, name: &str) -> Result<Rc<Module>> {
        if let Some(module) = self.0.core_cache.borrow().get(name) {
            debug!(module = name, "core module cache hit");
            return Ok(module.clone());
        }
        let factory = self
            .0
            .core_modules
            .get(name)
            .cloned()
            .ok_or_else(|| not_found(name, ModuleKind::Core))?;

        debug!(module = name, "building core module");
        let module = factory(self)?;
        self.0
            .core_cache
            .borrow_mut()
            .insert(name.into(), module.clone());
        Ok(module)
    }

    fn plugin_module(&self, name: &str) -> Result<Rc<Module>> {
        let factory = self
            .0
            .plugins
            .get(name)
            .cloned()
            .ok_or_else(|| not_found(name, ModuleKind::Plugin))?;
        debug!(module = name, "loading plugin");
        factory(self)
    }

    fn source_module(&self, ctx: &Context, path: &str) -> Result<Rc<Module>> {
        let resolved = self.0.loader.resolve(ctx.module().directory(), path)?;
        if let Some(module) = self.0.module_cache.borrow().get(&resolved) {
            debug!(module = %resolved.display(), "module cache hit");
            return Ok(module.clone());
        }

        let file_name = resolved.display().to_string();
        let source = self.0.loader.read(&resolved)?;
        let program = self.parser()?.parse(&file_name, &source)?;

        debug!(module = %file_name, "loading module");
        let module = self.new_module(&file_name)?;
        // Cached before evaluation: a cyclic import sees the partially
        // populated module instead of loading it again.
        self.0
            .module_cache
            .borrow_mut()
            .insert(resolved.clone(), module.clone());

        let outcome = passes::compile(&program).and_then(|compiled| {
            ctx.with_scope(module.env(), module.clone())
                .trace_procedure(&file_name)
                .evaluate(&compiled)
        });
        if let Err(error) = outcome {
            self.0.module_cache.borrow_mut().remove(&resolved);
            return Err(error);
        }
        Ok(module)
    }

    fn parser(&self) -> Result<Rc<dyn SourceParser>> {
        self.0.parser.clone().ok_or_else(|| {
            Error::runtime("No parser is configured, so furipota sources cannot be loaded")
        })
    }
}

fn not_found(path: &str, kind: ModuleKind) -> Error {
    Error::new(ErrorKind::ModuleNotFound {
        path: path.to_string(),
        kind: kind.to_string(),
    })
}
