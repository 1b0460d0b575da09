//! Prelude Module
//!
//! Opened into the global environment of every engine created with
//! `EngineOptions::prelude` set: arithmetic, comparisons, logic and the
//! handful of stream helpers most programs need.

use std::rc::Rc;

use super::{native_module, native_thunk, number_arg, vector_arg};
use crate::api::Engine;
use crate::errors::{Error, Result};
use crate::evaluator::Context;
use crate::module::Module;
use crate::stream::Stream;
use crate::values::{Record, TypeTag, Value, native};

// ============================================================================
// Arithmetic
// ============================================================================

/// Adds numbers, or concatenates text.
fn add(_ctx: &Context, args: &[Value], _options: &Record) -> Result<Value> {
    match (&args[0], &args[1]) {
        (Value::Number(left), Value::Number(right)) => Ok(Value::Number(left + right)),
        (Value::Text(left), Value::Text(right)) => {
            let mut joined = left.clone();
            joined.push_str(right);
            Ok(Value::Text(joined))
        }
        (left, right) => Err(Error::type_mismatch(
            "Number or Text",
            format!("{} and {}", left.type_name(), right.type_name()),
            "The operands of +",
        )),
    }
}

fn arithmetic(
    name: &'static str,
    documentation: &'static str,
    operation: fn(f64, f64) -> f64,
) -> (&'static str, Value) {
    let value = native(
        name,
        &[TypeTag::Number, TypeTag::Number],
        &[],
        documentation,
        move |_, args, _| Ok(Value::Number(operation(number_arg(args, 0)?, number_arg(args, 1)?))),
    );
    (name, value)
}

fn comparison(
    name: &'static str,
    documentation: &'static str,
    operation: fn(f64, f64) -> bool,
) -> (&'static str, Value) {
    let value = native(
        name,
        &[TypeTag::Number, TypeTag::Number],
        &[],
        documentation,
        move |_, args, _| Ok(Value::Boolean(operation(number_arg(args, 0)?, number_arg(args, 1)?))),
    );
    (name, value)
}

// ============================================================================
// Streams and text
// ============================================================================

fn of(_ctx: &Context, args: &[Value], _options: &Record) -> Result<Value> {
    Ok(Value::Stream(Stream::of(args[0].clone())))
}

fn from_vector(_ctx: &Context, args: &[Value], _options: &Record) -> Result<Value> {
    let items = vector_arg(args, 0)?.clone();
    Ok(Value::Stream(Stream::from_sequence(items)))
}

fn show(_ctx: &Context, args: &[Value], _options: &Record) -> Result<Value> {
    Ok(Value::text(args[0].show()))
}

pub fn build_prelude_module(engine: &Engine) -> Result<Rc<Module>> {
    let mut entries = vec![
        (
            "+",
            native(
                "+",
                &[TypeTag::Any, TypeTag::Any],
                &[],
                "adds numbers or joins text",
                add,
            ),
        ),
        arithmetic("-", "subtraction", |a, b| a - b),
        arithmetic("*", "multiplication", |a, b| a * b),
        arithmetic("/", "division", |a, b| a / b),
        comparison("<", "less than", |a, b| a < b),
        comparison("<=", "less than or equal to", |a, b| a <= b),
        comparison(">", "greater than", |a, b| a > b),
        comparison(">=", "greater than or equal to", |a, b| a >= b),
        (
            "of",
            native("of", &[TypeTag::Any], &[], "a stream of a single value", of),
        ),
        (
            "empty",
            native_thunk("empty", "a stream with no values", |_| {
                Ok(Value::Stream(Stream::empty()))
            }),
        ),
        (
            "from-vector",
            native(
                "from-vector",
                &[TypeTag::Vector],
                &[],
                "a stream of the vector's items",
                from_vector,
            ),
        ),
        (
            "show",
            native(
                "show",
                &[TypeTag::Any],
                &[],
                "a textual representation of a value",
                show,
            ),
        ),
    ];
    entries.extend(super::core::logic_entries());
    native_module(engine, "prelude", entries)
}
