//! The evaluation context threaded through every evaluation step.

use std::rc::Rc;

use ecow::EcoString;

use super::trace::Trace;
use crate::api::Engine;
use crate::ast::Node;
use crate::environment::EnvId;
use crate::errors::{Error, ErrorKind, Result};
use crate::module::Module;
use crate::values::{TypeTag, Value};

/// Where evaluation is happening: the engine, the current environment
/// frame, the module being evaluated and the trace leading here.
///
/// Contexts are immutable. Every `with_*`/`trace_*` method returns a new
/// context and leaves the receiver as it was.
#[derive(Clone)]
pub struct Context {
    engine: Engine,
    env: EnvId,
    module: Rc<Module>,
    trace: Trace,
    depth: usize,
}

impl Context {
    pub fn new(engine: Engine, module: Rc<Module>) -> Self {
        let trace = Trace::new(engine.options().trace_depth);
        Self {
            env: module.env(),
            engine,
            module,
            trace,
            depth: 0,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn env(&self) -> EnvId {
        self.env
    }

    pub fn module(&self) -> &Rc<Module> {
        &self.module
    }

    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn with_env(&self, env: EnvId) -> Self {
        Self {
            env,
            ..self.clone()
        }
    }

    /// Switches to another module's scope, keeping the trace.
    pub fn with_scope(&self, env: EnvId, module: Rc<Module>) -> Self {
        Self {
            env,
            module,
            ..self.clone()
        }
    }

    pub fn trace_expression(&self, node: &Node) -> Self {
        Self {
            trace: self.trace.expression(self.module.file_name(), node),
            ..self.clone()
        }
    }

    pub fn trace_native(&self, name: &str) -> Self {
        Self {
            trace: self.trace.native(self.module.file_name(), name),
            ..self.clone()
        }
    }

    pub fn trace_procedure(&self, name: &str) -> Self {
        Self {
            trace: self.trace.procedure(self.module.file_name(), name),
            ..self.clone()
        }
    }

    /// Enters a nested evaluation of `node`, failing once the nesting
    /// exceeds the engine's limit.
    pub(crate) fn descend(&self, node: &Node) -> Result<Self> {
        let max_depth = self.engine.options().max_depth;
        if self.depth >= max_depth {
            return Err(self.error(ErrorKind::ResourceExceeded {
                depth: self.depth,
                max_depth,
            }));
        }
        Ok(Self {
            trace: self.trace.expression(self.module.file_name(), node),
            depth: self.depth + 1,
            ..self.clone()
        })
    }

    /// A context whose environment is a fresh child frame holding `bindings`.
    pub fn extend_environment(
        &self,
        bindings: impl IntoIterator<Item = (EcoString, Value)>,
    ) -> Result<Self> {
        let env = self.engine.child_env(self.env);
        self.engine
            .extend(env, bindings)
            .map_err(|error| self.rethrow(error))?;
        Ok(self.with_env(env))
    }

    /// Defines `name` in the current frame.
    pub fn define(&self, name: impl Into<EcoString>, value: Value) -> Result<()> {
        self.engine
            .define(self.env, name, value)
            .map_err(|error| self.rethrow(error))
    }

    /// The raw binding for `name`, without forcing thunks.
    pub fn lookup(&self, name: &str) -> Result<Value> {
        self.engine
            .lookup(self.env, name)
            .map_err(|error| self.rethrow(error))
    }

    pub fn evaluate(&self, node: &Node) -> Result<Value> {
        super::eval::evaluate(node, self)
    }

    /// Builds an error carrying this context's trace.
    pub fn error(&self, kind: ErrorKind) -> Error {
        Error::new(kind).with_trace(self.trace.format())
    }

    /// Attaches this context's trace unless `error` already has one.
    pub fn rethrow(&self, error: Error) -> Error {
        if error.is_traced() {
            error
        } else {
            error.with_trace(self.trace.format())
        }
    }

    pub fn assert(&self, condition: bool, message: impl FnOnce() -> String) -> Result<()> {
        if condition {
            Ok(())
        } else {
            Err(self.error(ErrorKind::Assertion { message: message() }))
        }
    }

    /// Checks `value` against `ty`; `site` describes what was expecting it.
    pub fn assert_type(
        &self,
        ty: TypeTag,
        value: &Value,
        site: impl FnOnce() -> String,
    ) -> Result<()> {
        if ty.matches(value) {
            Ok(())
        } else {
            Err(self.rethrow(Error::type_mismatch(
                ty.to_string(),
                value.type_name().to_string(),
                site(),
            )))
        }
    }
}
