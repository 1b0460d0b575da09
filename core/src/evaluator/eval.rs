//! Core evaluation logic.

use std::rc::Rc;

use ecow::{EcoString, EcoVec};
use tracing::trace;

use super::{Context, do_block, pattern};
use crate::ast::{
    Expr, InterpolationPart, ModuleKind, Node, OpenModifier, ShellArg, ShellCommand, VectorItem,
    pretty,
};
use crate::errors::{Error, ErrorKind, Result};
use crate::values::{Invokable, Lambda, NativeThunk, Record, Thunk, TypeTag, Value, Variant};

/// Evaluates `node` in `ctx`.
///
/// The node must have gone through [`crate::passes::compile`]; operator and
/// hole nodes are rejected. Errors raised below this point that carry no
/// trace yet get the trace of the innermost enclosing node.
pub fn evaluate(node: &Node, ctx: &Context) -> Result<Value> {
    let ctx = ctx.descend(node)?;
    eval_node(node, &ctx).map_err(|error| ctx.rethrow(error))
}

fn eval_node(node: &Node, ctx: &Context) -> Result<Value> {
    match &**node {
        Expr::Keyword { name } => Ok(Value::Text(name.clone())),
        Expr::Text { value } => Ok(Value::Text(value.clone())),
        Expr::Character { character } => Ok(Value::Text(character.clone())),
        Expr::Integer { value } => Ok(Value::Number(*value as f64)),
        Expr::Decimal { value } => Ok(Value::Number(*value)),
        Expr::Boolean { value } => Ok(Value::Boolean(*value)),

        Expr::Interpolate { parts } => {
            let mut out = String::new();
            for part in parts {
                match part {
                    InterpolationPart::Text(text) => out.push_str(text),
                    InterpolationPart::Expression(expr) => {
                        out.push_str(&ctx.evaluate(expr)?.show())
                    }
                }
            }
            Ok(Value::text(out))
        }

        Expr::Vector { items } => {
            let mut out = EcoVec::with_capacity(items.len());
            for item in items {
                match item {
                    VectorItem::Element(expr) => out.push(ctx.evaluate(expr)?),
                    VectorItem::Spread(expr) => {
                        let spread = ctx.evaluate(expr)?;
                        let Value::Vector(values) = spread else {
                            return Err(mismatch(ctx, TypeTag::Vector, &spread, "A vector spread"));
                        };
                        for value in values.iter() {
                            out.push(value.clone());
                        }
                    }
                }
            }
            Ok(Value::Vector(out))
        }

        Expr::Record { pairs } => {
            let record = pairs
                .iter()
                .map(|(key, value)| Ok((key.clone(), ctx.evaluate(value)?)))
                .collect::<Result<Record>>()?;
            Ok(Value::Record(record))
        }

        Expr::Lambda {
            value_param,
            options_param,
            body,
        } => Ok(Value::Invokable(Invokable::Lambda(Rc::new(Lambda::new(
            value_param.clone(),
            options_param.clone(),
            body.clone(),
            ctx.env(),
            ctx.module().clone(),
        ))))),

        Expr::Tagged { tag, predicates } => {
            let mut checks = Vec::with_capacity(predicates.len());
            for predicate in predicates {
                let value = ctx.evaluate(predicate)?;
                checks.push(expect_invokable(ctx, value, predicate)?);
            }
            Ok(Value::Variant(Rc::new(Variant::new(tag.clone(), checks))))
        }

        Expr::Seq { items } => {
            let mut last = Value::unit();
            for item in items {
                last = ctx.evaluate(item)?;
            }
            Ok(last)
        }

        Expr::Hole => Err(ctx.error(ErrorKind::Desugar {
            message: "Holes are only allowed in function applications".into(),
        })),

        Expr::Infix { .. } | Expr::Prefix { .. } => Err(ctx.error(ErrorKind::Desugar {
            message: format!(
                "{} node reached the evaluator before being desugared",
                node.kind_name()
            ),
        })),

        Expr::Variable { name } => ctx.lookup(name)?.force(ctx),

        Expr::Invoke {
            callee,
            input,
            options,
        } => {
            let function = ctx.evaluate(callee)?;
            let function = expect_invokable(ctx, function, callee)?;
            let input = ctx.evaluate(input)?;
            let options =
                expect_record(ctx, ctx.evaluate(options)?, "The options of an invocation")?;
            trace!(callee = %function.name(), "invoking");
            function.invoke(ctx, input, options)
        }

        Expr::Partial { callee, options } => {
            let function = ctx.evaluate(callee)?;
            let function = expect_invokable(ctx, function, callee)?;
            let options = expect_record(
                ctx,
                ctx.evaluate(options)?,
                "The options of a partial application",
            )?;
            Ok(Value::Invokable(function.with_options(options)))
        }

        Expr::Pipe {
            input,
            transformation,
        } => {
            let source = ctx
                .evaluate(input)?
                .into_stream("The input of a pipe")
                .map_err(|error| ctx.rethrow(error))?;
            let function = ctx.evaluate(transformation)?;
            let function = expect_invokable(ctx, function, transformation)?;
            let pipe_ctx = ctx.clone();
            Ok(Value::Stream(source.chain(move |value| {
                function
                    .call(&pipe_ctx, value)?
                    .into_stream("The result of a pipe transformation")
                    .map_err(|error| pipe_ctx.rethrow(error))
            })))
        }

        Expr::Let {
            binding,
            value,
            body,
        } => {
            let thunk = Thunk::new(
                binding.clone(),
                None,
                value.clone(),
                ctx.env(),
                ctx.module().clone(),
            );
            ctx.extend_environment([(binding.clone(), Value::Thunk(Rc::new(thunk)))])?
                .evaluate(body)
        }

        Expr::IfThenElse {
            condition,
            consequent,
            alternate,
        } => match ctx.evaluate(condition)? {
            Value::Boolean(true) => ctx.evaluate(consequent),
            Value::Boolean(false) => ctx.evaluate(alternate),
            other => Err(mismatch(
                ctx,
                TypeTag::Boolean,
                &other,
                "The condition of an if expression",
            )),
        },

        Expr::Get { record, property } => {
            let record = expect_record(ctx, ctx.evaluate(record)?, "A property access")?;
            match record.get(property) {
                Some(value) => value.clone().force(ctx),
                None => Err(ctx.error(ErrorKind::MissingProperty {
                    property: property.clone(),
                })),
            }
        }

        Expr::Match { scrutinee, cases } => {
            let value = ctx.evaluate(scrutinee)?;
            pattern::evaluate_match(ctx, value, cases)
        }

        Expr::Open {
            record,
            modifier,
            body,
        } => {
            let record = expect_record(ctx, ctx.evaluate(record)?, "An open expression")?;
            let bindings = restrict(ctx, &record, modifier)?;
            ctx.extend_environment(bindings)?.evaluate(body)
        }

        Expr::ExprSequence { first, rest } => {
            ctx.evaluate(first)?;
            ctx.evaluate(rest)
        }

        Expr::Shell {
            command,
            args,
            options,
        } => eval_shell(ctx, command, args, options),

        Expr::Do { instructions } => do_block::evaluate_block(ctx, instructions).map(Value::Stream),

        Expr::Define {
            name,
            value,
            documentation,
        } => {
            let thunk = Thunk::new(
                name.clone(),
                documentation.clone(),
                value.clone(),
                ctx.env(),
                ctx.module().clone(),
            );
            ctx.define(name.clone(), Value::Thunk(Rc::new(thunk)))?;
            Ok(Value::unit())
        }

        Expr::Import {
            path,
            kind,
            modifier,
        } => {
            let module = ctx.engine().load_module(ctx, path, *kind)?;
            let exports = module
                .exported_bindings(ctx.engine())
                .map_err(|error| ctx.rethrow(error))?;
            let bindings = restrict(ctx, &exports, modifier)?;
            ctx.engine()
                .extend(ctx.env(), bindings)
                .map_err(|error| ctx.rethrow(error))?;
            Ok(Value::unit())
        }

        Expr::ImportAliasing { path, alias, kind } => {
            let module = ctx.engine().load_module(ctx, path, *kind)?;
            let handle = NativeThunk::new(
                alias.clone(),
                module_documentation(*kind, path),
                move |ctx: &Context| module.exported_bindings(ctx.engine()).map(Value::Record),
            );
            ctx.define(alias.clone(), handle.into())?;
            Ok(Value::unit())
        }

        Expr::Export { name } => {
            ctx.module().export(name.clone(), name.clone());
            Ok(Value::unit())
        }

        Expr::ExportAliasing { name, alias } => {
            ctx.module().export(alias.clone(), name.clone());
            Ok(Value::unit())
        }

        Expr::Program { declarations } => {
            for declaration in declarations {
                ctx.evaluate(declaration)?;
            }
            Ok(Value::unit())
        }
    }
}

fn module_documentation(kind: ModuleKind, path: &str) -> String {
    format!("The {kind} module {path}")
}

/// Selects the bindings an `open`/`import` brings into scope.
fn restrict(
    ctx: &Context,
    record: &Record,
    modifier: &OpenModifier,
) -> Result<Vec<(EcoString, Value)>> {
    match modifier {
        OpenModifier::All => Ok(record
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()),
        OpenModifier::Hide(hidden) => Ok(record
            .iter()
            .filter(|(key, _)| !hidden.contains(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()),
        OpenModifier::Expose(exposed) => exposed
            .iter()
            .map(|(name, alias)| match record.get(name) {
                Some(value) => Ok((alias.clone(), value.clone())),
                None => Err(ctx.error(ErrorKind::MissingProperty {
                    property: name.clone(),
                })),
            })
            .collect(),
    }
}

/// `$(command args... @ options)` is `shell command args options`, using
/// whichever `shell` is in scope.
fn eval_shell(
    ctx: &Context,
    command: &ShellCommand,
    args: &[ShellArg],
    options: &Node,
) -> Result<Value> {
    let command = match command {
        ShellCommand::Symbol(name) => Value::Text(name.clone()),
        ShellCommand::Expression(expr) => ctx.evaluate(expr)?,
    };

    let mut arguments = EcoVec::with_capacity(args.len());
    for arg in args {
        match arg {
            ShellArg::Symbol(symbol) => arguments.push(Value::Text(symbol.clone())),
            ShellArg::Expression(expr) => arguments.push(ctx.evaluate(expr)?),
            ShellArg::Spread(expr) => {
                let spread = ctx.evaluate(expr)?;
                let Value::Vector(values) = spread else {
                    return Err(mismatch(ctx, TypeTag::Vector, &spread, "A shell argument spread"));
                };
                for value in values.iter() {
                    arguments.push(value.clone());
                }
            }
        }
    }

    let options = expect_record(ctx, ctx.evaluate(options)?, "The options of a shell command")?;
    let shell = ctx.lookup("shell")?.force(ctx)?;
    let shell = shell
        .as_invokable()
        .cloned()
        .ok_or_else(|| mismatch(ctx, TypeTag::Invokable, &shell, "The shell binding"))?;

    let runner = shell.call(ctx, command)?;
    let runner = runner
        .as_invokable()
        .cloned()
        .ok_or_else(|| mismatch(ctx, TypeTag::Invokable, &runner, "The result of applying shell"))?;
    runner.invoke(ctx, Value::Vector(arguments), options)
}

fn mismatch(ctx: &Context, expected: TypeTag, actual: &Value, site: &str) -> Error {
    ctx.rethrow(Error::type_mismatch(
        expected.to_string(),
        actual.type_name().to_string(),
        site,
    ))
}

fn expect_invokable(ctx: &Context, value: Value, callee: &Node) -> Result<Invokable> {
    match value {
        Value::Invokable(invokable) => Ok(invokable),
        other => {
            let rendered = pretty(callee, 0);
            let first_line = rendered.lines().next().unwrap_or_default();
            Err(mismatch(
                ctx,
                TypeTag::Invokable,
                &other,
                &format!("The callee `{first_line}`"),
            ))
        }
    }
}

fn expect_record(ctx: &Context, value: Value, site: &str) -> Result<Record> {
    match value {
        Value::Record(record) => Ok(record),
        other => Err(mismatch(ctx, TypeTag::Record, &other, site)),
    }
}
