//! Callable values: native primitives, user lambdas and partial applications.
//!
//! Every invocation takes exactly one positional input plus an options
//! record. Natives with more than one declared parameter are curried: each
//! call appends one argument, and the body runs once all are present.

use std::rc::Rc;

use ecow::{EcoString, EcoVec};

use super::{Record, TypeTag, Value};
use crate::ast::Node;
use crate::environment::EnvId;
use crate::errors::{Error, ErrorKind, Result, ordinal};
use crate::evaluator::Context;
use crate::module::Module;

pub type NativeFn = Rc<dyn Fn(&Context, &[Value], &Record) -> Result<Value>>;

#[derive(Clone)]
pub enum Invokable {
    Primitive(Rc<Primitive>),
    Partial(Rc<Partial>),
    Lambda(Rc<Lambda>),
}

impl Invokable {
    pub fn invoke(&self, ctx: &Context, input: Value, options: Record) -> Result<Value> {
        match self {
            Invokable::Primitive(primitive) => primitive.invoke(ctx, input, options),
            Invokable::Partial(partial) => {
                partial.callee.invoke(ctx, input, partial.options.clone())
            }
            Invokable::Lambda(lambda) => lambda.invoke(ctx, input, options),
        }
    }

    /// Invokes with an empty options record.
    pub fn call(&self, ctx: &Context, input: Value) -> Result<Value> {
        self.invoke(ctx, input, Record::new())
    }

    /// Fixes the options record used by every later invocation.
    pub fn with_options(&self, options: Record) -> Invokable {
        Invokable::Partial(Rc::new(Partial {
            callee: self.clone(),
            options,
        }))
    }

    pub fn name(&self) -> EcoString {
        match self {
            Invokable::Primitive(primitive) => primitive.name.clone(),
            Invokable::Partial(partial) => partial.callee.name(),
            Invokable::Lambda(_) => "(lambda)".into(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Invokable::Primitive(_) => "Primitive",
            Invokable::Partial(_) => "Partial",
            Invokable::Lambda(_) => "Lambda",
        }
    }

    pub fn documentation(&self) -> Option<&str> {
        match self {
            Invokable::Primitive(primitive) if !primitive.documentation.is_empty() => {
                Some(primitive.documentation.as_str())
            }
            Invokable::Partial(partial) => partial.callee.documentation(),
            _ => None,
        }
    }

    pub fn ptr_eq(&self, other: &Invokable) -> bool {
        match (self, other) {
            (Invokable::Primitive(a), Invokable::Primitive(b)) => Rc::ptr_eq(a, b),
            (Invokable::Partial(a), Invokable::Partial(b)) => Rc::ptr_eq(a, b),
            (Invokable::Lambda(a), Invokable::Lambda(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Invokable> for Value {
    fn from(value: Invokable) -> Self {
        Value::Invokable(value)
    }
}

// ============================================================================
// Primitives
// ============================================================================

/// A named option accepted by a native.
#[derive(Debug, Clone)]
pub struct OptionSpec {
    pub key: EcoString,
    pub ty: TypeTag,
    pub required: bool,
}

impl OptionSpec {
    /// `"key"` declares a required option, `"key?"` an optional one.
    pub fn new(key: &str, ty: TypeTag) -> Self {
        match key.strip_suffix('?') {
            Some(key) => Self {
                key: key.into(),
                ty,
                required: false,
            },
            None => Self {
                key: key.into(),
                ty,
                required: true,
            },
        }
    }
}

#[derive(Clone)]
pub struct Primitive {
    name: EcoString,
    documentation: EcoString,
    params: Rc<[TypeTag]>,
    options: Rc<[OptionSpec]>,
    applied: EcoVec<Value>,
    body: NativeFn,
}

/// Wraps a host function as a furipota value.
///
/// `params` declares the positional parameters (and thus the arity);
/// `options` declares the accepted option keys. Arguments are checked
/// against both before `body` runs.
pub fn native(
    name: &str,
    params: &[TypeTag],
    options: &[OptionSpec],
    documentation: &str,
    body: impl Fn(&Context, &[Value], &Record) -> Result<Value> + 'static,
) -> Value {
    Value::Invokable(primitive(name, params, options, documentation, body))
}

/// Like [`native`], without the `Value` wrapper.
pub fn primitive(
    name: &str,
    params: &[TypeTag],
    options: &[OptionSpec],
    documentation: &str,
    body: impl Fn(&Context, &[Value], &Record) -> Result<Value> + 'static,
) -> Invokable {
    debug_assert!(!params.is_empty(), "natives take at least one parameter");
    Invokable::Primitive(Rc::new(Primitive {
        name: name.into(),
        documentation: documentation.into(),
        params: params.into(),
        options: options.into(),
        applied: EcoVec::new(),
        body: Rc::new(body),
    }))
}

impl Primitive {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    fn invoke(&self, ctx: &Context, input: Value, options: Record) -> Result<Value> {
        let ctx = ctx.trace_native(&self.name);
        let mut args = self.applied.clone();
        args.push(input);

        if args.len() < self.params.len() {
            return Ok(Value::Invokable(Invokable::Primitive(Rc::new(Primitive {
                applied: args,
                ..self.clone()
            }))));
        }

        self.check_arguments(&ctx, &args, &options)?;
        (self.body)(&ctx, &args, &options).map_err(|error| ctx.rethrow(error))
    }

    fn check_arguments(&self, ctx: &Context, args: &[Value], options: &Record) -> Result<()> {
        for (index, (ty, arg)) in self.params.iter().zip(args).enumerate() {
            if !ty.matches(arg) {
                return Err(ctx.rethrow(Error::type_mismatch(
                    ty.to_string(),
                    arg.type_name().to_string(),
                    format!("The {} parameter of {}", ordinal(index + 1), self.name),
                )));
            }
        }

        for spec in self.options.iter() {
            match options.get(&spec.key) {
                Some(value) if !spec.ty.matches(value) => {
                    return Err(ctx.rethrow(Error::type_mismatch(
                        spec.ty.to_string(),
                        value.type_name().to_string(),
                        format!("The option {} of {}", spec.key, self.name),
                    )));
                }
                None if spec.required => {
                    return Err(ctx.error(ErrorKind::Assertion {
                        message: format!(
                            "{} expects an option {} of type {}, but none was provided",
                            self.name, spec.key, spec.ty
                        ),
                    }));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

// ============================================================================
// Partial application of options
// ============================================================================

pub struct Partial {
    callee: Invokable,
    options: Record,
}

impl Partial {
    pub fn callee(&self) -> &Invokable {
        &self.callee
    }

    pub fn options(&self) -> &Record {
        &self.options
    }
}

// ============================================================================
// Lambdas
// ============================================================================

/// A user function closing over the environment it was created in.
pub struct Lambda {
    value_param: EcoString,
    options_param: EcoString,
    body: Node,
    env: EnvId,
    module: Rc<Module>,
}

impl Lambda {
    pub fn new(
        value_param: EcoString,
        options_param: EcoString,
        body: Node,
        env: EnvId,
        module: Rc<Module>,
    ) -> Self {
        Self {
            value_param,
            options_param,
            body,
            env,
            module,
        }
    }

    fn invoke(&self, ctx: &Context, input: Value, options: Record) -> Result<Value> {
        let engine = ctx.engine();
        let frame = engine.child_env(self.env);
        // With identical names the options record wins.
        if self.value_param != self.options_param {
            engine
                .define(frame, self.value_param.clone(), input)
                .map_err(|error| ctx.rethrow(error))?;
        }
        engine
            .define(frame, self.options_param.clone(), Value::Record(options))
            .map_err(|error| ctx.rethrow(error))?;

        ctx.with_scope(frame, self.module.clone())
            .trace_procedure("(lambda)")
            .evaluate(&self.body)
    }
}
