//! Environment builder for registering globals and modules.

use std::rc::Rc;

use ecow::EcoString;
use hashbrown::HashMap;

use super::Engine;
use super::loader::{SourceLoader, SourceParser};
use crate::errors::Result;
use crate::module::Module;
use crate::values::Value;

/// Builds a module on demand. Core module factories run once per engine;
/// plugin factories run on every import.
pub type ModuleFactory = Rc<dyn Fn(&Engine) -> Result<Rc<Module>>>;

/// Builder for constructing the global environment.
///
/// The engine registers the standard core modules before calling the
/// host's initialization closure, so hosts can add to them or replace
/// them by name.
///
/// # Example
///
/// ```
/// use furipota_core::api::{Engine, EngineOptions};
/// use furipota_core::values::Value;
///
/// let engine = Engine::new(EngineOptions::default(), |env| {
///     env.register("answer", Value::Number(42.0));
/// })
/// .unwrap();
/// assert_eq!(engine.global("answer").unwrap(), Value::Number(42.0));
/// ```
#[derive(Default)]
pub struct EnvironmentBuilder {
    pub(crate) globals: Vec<(EcoString, Value)>,
    pub(crate) core_modules: HashMap<EcoString, ModuleFactory>,
    pub(crate) plugins: HashMap<EcoString, ModuleFactory>,
    pub(crate) parser: Option<Rc<dyn SourceParser>>,
    pub(crate) loader: Option<Rc<dyn SourceLoader>>,
}

impl EnvironmentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a global value. Registering a name twice is an error when
    /// the engine is built.
    pub fn register(&mut self, name: &str, value: Value) {
        self.globals.push((name.into(), value));
    }

    /// Register a module importable with `import core "name"`.
    pub fn core_module(
        &mut self,
        name: &str,
        factory: impl Fn(&Engine) -> Result<Rc<Module>> + 'static,
    ) {
        self.core_modules.insert(name.into(), Rc::new(factory));
    }

    /// Register a module importable with `import plugin "name"`.
    pub fn plugin(
        &mut self,
        name: &str,
        factory: impl Fn(&Engine) -> Result<Rc<Module>> + 'static,
    ) {
        self.plugins.insert(name.into(), Rc::new(factory));
    }

    /// The parser used for `furipota` modules. Without one, such imports
    /// fail.
    pub fn parser(&mut self, parser: impl SourceParser + 'static) {
        self.parser = Some(Rc::new(parser));
    }

    /// Replaces the default [`super::FileSystemLoader`].
    pub fn loader(&mut self, loader: impl SourceLoader + 'static) {
        self.loader = Some(Rc::new(loader));
    }
}
