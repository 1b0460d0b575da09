use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use ecow::EcoString;
use once_cell::unsync::OnceCell;
use tracing::trace;

use super::Value;
use crate::ast::Node;
use crate::environment::EnvId;
use crate::errors::{ErrorKind, Result};
use crate::evaluator::Context;
use crate::module::Module;

/// A lazily evaluated definition.
///
/// The expression runs in the scope captured at definition time the first
/// time the thunk is forced; the outcome, success or failure, is cached.
pub struct Thunk {
    name: EcoString,
    documentation: Option<EcoString>,
    expression: Node,
    env: EnvId,
    module: Rc<Module>,
    value: OnceCell<Result<Value>>,
    forcing: Cell<bool>,
}

impl Thunk {
    pub fn new(
        name: EcoString,
        documentation: Option<EcoString>,
        expression: Node,
        env: EnvId,
        module: Rc<Module>,
    ) -> Self {
        Self {
            name,
            documentation,
            expression,
            env,
            module,
            value: OnceCell::new(),
            forcing: Cell::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn documentation(&self) -> Option<&str> {
        self.documentation.as_deref()
    }

    pub fn is_forced(&self) -> bool {
        self.value.get().is_some()
    }

    pub fn force(&self, ctx: &Context) -> Result<Value> {
        if let Some(result) = self.value.get() {
            return result.clone();
        }
        if self.forcing.get() {
            return Err(ctx.error(ErrorKind::CyclicDefinition {
                name: self.name.clone(),
            }));
        }

        trace!(name = %self.name, "forcing thunk");
        self.forcing.set(true);
        let result = ctx
            .with_scope(self.env, self.module.clone())
            .trace_procedure(&self.name)
            .evaluate(&self.expression);
        self.forcing.set(false);

        self.value.get_or_init(|| result).clone()
    }
}

impl fmt::Debug for Thunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thunk")
            .field("name", &self.name)
            .field("forced", &self.is_forced())
            .finish()
    }
}

type Compute = Rc<dyn Fn(&Context) -> Result<Value>>;

/// A binding whose value is produced by the host on every lookup.
pub struct NativeThunk {
    name: EcoString,
    documentation: EcoString,
    compute: Compute,
}

impl NativeThunk {
    pub fn new(
        name: impl Into<EcoString>,
        documentation: impl Into<EcoString>,
        compute: impl Fn(&Context) -> Result<Value> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            documentation: documentation.into(),
            compute: Rc::new(compute),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn documentation(&self) -> &str {
        &self.documentation
    }

    pub fn force(&self, ctx: &Context) -> Result<Value> {
        let ctx = ctx.trace_native(&self.name);
        (self.compute)(&ctx).map_err(|error| ctx.rethrow(error))
    }
}

impl From<NativeThunk> for Value {
    fn from(value: NativeThunk) -> Self {
        Value::NativeThunk(Rc::new(value))
    }
}
