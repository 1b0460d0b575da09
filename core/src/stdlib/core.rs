//! Core Module
//!
//! The builtin variants (`Unit`, `Ok`, `Error`), result constructors,
//! variant construction (`make`, `union`), boolean logic and assertions.

use std::rc::Rc;

use super::{bool_arg, native_module, native_thunk, text_option, vector_arg};
use crate::api::Engine;
use crate::errors::{Error, Result};
use crate::evaluator::Context;
use crate::module::Module;
use crate::values::{BuiltinVariant, OptionSpec, Record, TypeTag, Value, Variant, native};

// ============================================================================
// Results and variants
// ============================================================================

fn make(ctx: &Context, args: &[Value], _options: &Record) -> Result<Value> {
    let variant = variant_arg(args, 0)?;
    let values = vector_arg(args, 1)?.iter().cloned().collect();
    variant.create(ctx, values)
}

/// A record holding each variant under its tag, plus a constructor under
/// the lower-cased tag.
fn union(ctx: &Context, args: &[Value], _options: &Record) -> Result<Value> {
    let mut members = Record::new();
    for value in vector_arg(args, 0)?.iter() {
        ctx.assert_type(TypeTag::Variant, value, || "Each member of a union".to_string())?;
        let Value::Variant(variant) = value else {
            continue;
        };
        let constructor = variant_constructor(variant);
        members = members
            .with(variant.tag(), value.clone())
            .with(variant.tag().to_lowercase(), constructor);
    }
    Ok(Value::Record(members))
}

fn variant_constructor(variant: &Rc<Variant>) -> Value {
    let name = format!("make-{}", variant.tag());
    let documentation = format!("constructs a {} instance", variant.tag());
    let variant = variant.clone();
    if variant.arity() == 0 {
        native_thunk(&name, &documentation, move |ctx| variant.create(ctx, Vec::new()))
    } else {
        let params = vec![TypeTag::Any; variant.arity()];
        native(&name, &params, &[], &documentation, move |ctx, args, _| {
            variant.create(ctx, args.to_vec())
        })
    }
}

fn variant_arg(args: &[Value], index: usize) -> Result<&Rc<Variant>> {
    args.get(index)
        .and_then(Value::as_variant)
        .ok_or_else(|| Error::runtime(format!("native argument {index} is not a Variant")))
}

// ============================================================================
// Logic
// ============================================================================

fn and(_ctx: &Context, args: &[Value], _options: &Record) -> Result<Value> {
    Ok(Value::Boolean(bool_arg(args, 0)? && bool_arg(args, 1)?))
}

fn or(_ctx: &Context, args: &[Value], _options: &Record) -> Result<Value> {
    Ok(Value::Boolean(bool_arg(args, 0)? || bool_arg(args, 1)?))
}

fn not(_ctx: &Context, args: &[Value], _options: &Record) -> Result<Value> {
    Ok(Value::Boolean(!bool_arg(args, 0)?))
}

fn equals(_ctx: &Context, args: &[Value], _options: &Record) -> Result<Value> {
    Ok(Value::Boolean(args[0].structural_eq(&args[1])))
}

fn differs(_ctx: &Context, args: &[Value], _options: &Record) -> Result<Value> {
    Ok(Value::Boolean(!args[0].structural_eq(&args[1])))
}

/// Fails unless the argument is `true`. Without a `message` option the
/// failure names the innermost trace entry.
pub(crate) fn assert(ctx: &Context, args: &[Value], options: &Record) -> Result<Value> {
    let holds = bool_arg(args, 0)?;
    ctx.assert(holds, || {
        text_option(options, "message")
            .map(|message| message.to_string())
            .or_else(|| ctx.trace().format_top_entry())
            .unwrap_or_else(|| "assertion failed".to_string())
    })?;
    Ok(Value::unit())
}

pub(crate) fn logic_entries() -> Vec<(&'static str, Value)> {
    use TypeTag::{Any, Boolean};
    vec![
        (
            "and",
            native("and", &[Boolean, Boolean], &[], "logical conjunction", and),
        ),
        (
            "or",
            native("or", &[Boolean, Boolean], &[], "logical disjunction", or),
        ),
        (
            "not",
            native("not", &[Boolean], &[], "logical negation", not),
        ),
        (
            "===",
            native("===", &[Any, Any], &[], "structural equality", equals),
        ),
        (
            "=/=",
            native("=/=", &[Any, Any], &[], "structural inequality", differs),
        ),
        (
            "assert",
            native(
                "assert",
                &[Boolean],
                &[OptionSpec::new("message?", TypeTag::Text)],
                "Simple boolean assertion",
                assert,
            ),
        ),
    ]
}

fn wrap_ok(_ctx: &Context, args: &[Value], _options: &Record) -> Result<Value> {
    Ok(Value::ok(args[0].clone()))
}

fn wrap_error(_ctx: &Context, args: &[Value], _options: &Record) -> Result<Value> {
    Ok(Value::error(args[0].clone()))
}

pub fn build_core_module(engine: &Engine) -> Result<Rc<Module>> {
    let builtin =
        |which: BuiltinVariant| move |_: &Context| Ok(Value::Variant(Variant::builtin(which)));

    let mut entries = vec![
        (
            "Unit",
            native_thunk(
                "Unit",
                "Variant for no value",
                builtin(BuiltinVariant::Unit),
            ),
        ),
        (
            "Ok",
            native_thunk(
                "Ok",
                "Variant for successful results",
                builtin(BuiltinVariant::Ok),
            ),
        ),
        (
            "Error",
            native_thunk(
                "Error",
                "Variant for failed results",
                builtin(BuiltinVariant::Error),
            ),
        ),
        (
            "unit",
            native_thunk("unit", "Represents the no value", |_| Ok(Value::unit())),
        ),
        (
            "ok",
            native(
                "ok",
                &[TypeTag::Any],
                &[],
                "constructs a representation of a successful result",
                wrap_ok,
            ),
        ),
        (
            "error",
            native(
                "error",
                &[TypeTag::Any],
                &[],
                "constructs a representation of a failed result",
                wrap_error,
            ),
        ),
        (
            "make",
            native(
                "make",
                &[TypeTag::Variant, TypeTag::Vector],
                &[],
                "constructs a value from a variant",
                make,
            ),
        ),
        (
            "union",
            native(
                "union",
                &[TypeTag::Vector],
                &[],
                "constructs an union module",
                union,
            ),
        ),
    ];
    entries.extend(logic_entries());
    native_module(engine, "core", entries)
}
