//! Streams Module
//!
//! Stream constructors and combinators. Functions come first and the
//! stream last, so they read well in pipelines: `streams.map f xs`.

use std::rc::Rc;

use super::{invokable_arg, native_module, native_thunk, number_arg, stream_arg, vector_arg};
use crate::api::Engine;
use crate::errors::{Error, Result};
use crate::evaluator::Context;
use crate::module::Module;
use crate::stream::Stream;
use crate::values::{Invokable, Record, TypeTag, Value, native};

/// Calls `function` with `value`, expecting a stream (or a vector) back.
fn call_for_stream(
    ctx: &Context,
    function: &Invokable,
    value: Value,
    site: &str,
) -> Result<Stream> {
    function
        .call(ctx, value)?
        .into_stream(site)
        .map_err(|error| ctx.rethrow(error))
}

fn count_arg(ctx: &Context, args: &[Value], index: usize, name: &str) -> Result<usize> {
    let n = number_arg(args, index)?;
    ctx.assert(n >= 0.0 && n.fract() == 0.0, || {
        format!("{name} expects a non-negative integer count, but got {n}")
    })?;
    Ok(n as usize)
}

// ============================================================================
// Transformations
// ============================================================================

fn map(ctx: &Context, args: &[Value], _options: &Record) -> Result<Value> {
    let (ctx, function) = (ctx.clone(), invokable_arg(args, 0)?.clone());
    let stream = stream_arg(args, 1)?.map(move |value| function.call(&ctx, value));
    Ok(Value::Stream(stream))
}

fn map_errors(ctx: &Context, args: &[Value], _options: &Record) -> Result<Value> {
    let (ctx, function) = (ctx.clone(), invokable_arg(args, 0)?.clone());
    let stream = stream_arg(args, 1)?.map_error(move |error| function.call(&ctx, error));
    Ok(Value::Stream(stream))
}

fn bimap(ctx: &Context, args: &[Value], _options: &Record) -> Result<Value> {
    let (on_value, on_error) = (invokable_arg(args, 0)?.clone(), invokable_arg(args, 1)?.clone());
    let (value_ctx, error_ctx) = (ctx.clone(), ctx.clone());
    let stream = stream_arg(args, 2)?.bimap(
        move |value| on_value.call(&value_ctx, value),
        move |error| on_error.call(&error_ctx, error),
    );
    Ok(Value::Stream(stream))
}

fn filter(ctx: &Context, args: &[Value], _options: &Record) -> Result<Value> {
    let (ctx, predicate) = (ctx.clone(), invokable_arg(args, 0)?.clone());
    let stream = stream_arg(args, 1)?.filter(move |value| {
        match predicate.call(&ctx, value.clone())? {
            Value::Boolean(keep) => Ok(keep),
            other => Err(ctx.rethrow(Error::type_mismatch(
                "Boolean",
                other.type_name().to_string(),
                "The result of a filter predicate",
            ))),
        }
    });
    Ok(Value::Stream(stream))
}

fn chain(ctx: &Context, args: &[Value], _options: &Record) -> Result<Value> {
    let (ctx, function) = (ctx.clone(), invokable_arg(args, 0)?.clone());
    let stream = stream_arg(args, 1)?.chain(move |value| {
        call_for_stream(&ctx, &function, value, "The result of a chain function")
    });
    Ok(Value::Stream(stream))
}

fn recover(ctx: &Context, args: &[Value], _options: &Record) -> Result<Value> {
    let (ctx, function) = (ctx.clone(), invokable_arg(args, 0)?.clone());
    let stream = stream_arg(args, 1)?.or_else(move |error| {
        call_for_stream(&ctx, &function, error, "The result of a recover function")
    });
    Ok(Value::Stream(stream))
}

fn tap(ctx: &Context, args: &[Value], _options: &Record) -> Result<Value> {
    let (ctx, function) = (ctx.clone(), invokable_arg(args, 0)?.clone());
    let stream = stream_arg(args, 1)?.tap(move |value| {
        function.call(&ctx, value.clone()).map(|_| ())
    });
    Ok(Value::Stream(stream))
}

/// `fold f initial xs`, where `f` is curried: `f accumulator value`.
fn fold(ctx: &Context, args: &[Value], _options: &Record) -> Result<Value> {
    let (ctx, function) = (ctx.clone(), invokable_arg(args, 0)?.clone());
    let initial = args[1].clone();
    let stream = stream_arg(args, 2)?.fold(initial, move |total, value| {
        let step = function.call(&ctx, total)?;
        match step {
            Value::Invokable(step) => step.call(&ctx, value),
            other => Err(ctx.rethrow(Error::type_mismatch(
                "Invokable",
                other.type_name().to_string(),
                "The result of applying a fold function to the accumulator",
            ))),
        }
    });
    Ok(Value::Stream(stream))
}

// ============================================================================
// Combining and slicing
// ============================================================================

fn concatenate(_ctx: &Context, args: &[Value], _options: &Record) -> Result<Value> {
    Ok(Value::Stream(stream_arg(args, 0)?.concat(stream_arg(args, 1)?)))
}

fn merge(_ctx: &Context, args: &[Value], _options: &Record) -> Result<Value> {
    Ok(Value::Stream(stream_arg(args, 0)?.merge(stream_arg(args, 1)?)))
}

fn invert(_ctx: &Context, args: &[Value], _options: &Record) -> Result<Value> {
    Ok(Value::Stream(stream_arg(args, 0)?.swap()))
}

fn take(ctx: &Context, args: &[Value], _options: &Record) -> Result<Value> {
    let n = count_arg(ctx, args, 0, "take")?;
    Ok(Value::Stream(stream_arg(args, 1)?.take(n)))
}

fn drop(ctx: &Context, args: &[Value], _options: &Record) -> Result<Value> {
    let n = count_arg(ctx, args, 0, "drop")?;
    Ok(Value::Stream(stream_arg(args, 1)?.drop(n)))
}

// ============================================================================
// Constructors
// ============================================================================

fn from_vector(_ctx: &Context, args: &[Value], _options: &Record) -> Result<Value> {
    Ok(Value::Stream(Stream::from_sequence(vector_arg(args, 0)?.clone())))
}

fn of(_ctx: &Context, args: &[Value], _options: &Record) -> Result<Value> {
    Ok(Value::Stream(Stream::of(args[0].clone())))
}

fn error(_ctx: &Context, args: &[Value], _options: &Record) -> Result<Value> {
    Ok(Value::Stream(Stream::error(args[0].clone())))
}

pub fn build_streams_module(engine: &Engine) -> Result<Rc<Module>> {
    use TypeTag::{Any, Invokable, Number, Stream, Vector};
    native_module(
        engine,
        "streams",
        vec![
            (
                "map",
                native(
                    "map",
                    &[Invokable, Stream],
                    &[],
                    "transforms each value",
                    map,
                ),
            ),
            (
                "map-errors",
                native(
                    "map-errors",
                    &[Invokable, Stream],
                    &[],
                    "transforms each error",
                    map_errors,
                ),
            ),
            (
                "bimap",
                native(
                    "bimap",
                    &[Invokable, Invokable, Stream],
                    &[],
                    "transforms values and errors",
                    bimap,
                ),
            ),
            (
                "filter",
                native(
                    "filter",
                    &[Invokable, Stream],
                    &[],
                    "keeps the values a predicate accepts",
                    filter,
                ),
            ),
            (
                "chain",
                native(
                    "chain",
                    &[Invokable, Stream],
                    &[],
                    "flat-maps each value into a stream",
                    chain,
                ),
            ),
            (
                "recover",
                native(
                    "recover",
                    &[Invokable, Stream],
                    &[],
                    "replaces each error with a stream",
                    recover,
                ),
            ),
            (
                "tap",
                native("tap", &[Invokable, Stream], &[], "observes each value", tap),
            ),
            (
                "fold",
                native(
                    "fold",
                    &[Invokable, Any, Stream],
                    &[],
                    "accumulates the values of a stream",
                    fold,
                ),
            ),
            (
                "concatenate",
                native(
                    "concatenate",
                    &[Stream, Stream],
                    &[],
                    "plays one stream after another",
                    concatenate,
                ),
            ),
            (
                "merge",
                native(
                    "merge",
                    &[Stream, Stream],
                    &[],
                    "plays two streams concurrently",
                    merge,
                ),
            ),
            (
                "invert",
                native(
                    "invert",
                    &[Stream],
                    &[],
                    "swaps the value and error channels",
                    invert,
                ),
            ),
            (
                "take",
                native(
                    "take",
                    &[Number, Stream],
                    &[],
                    "keeps the first values",
                    take,
                ),
            ),
            (
                "drop",
                native(
                    "drop",
                    &[Number, Stream],
                    &[],
                    "skips the first values",
                    drop,
                ),
            ),
            (
                "from-vector",
                native(
                    "from-vector",
                    &[Vector],
                    &[],
                    "a stream of the vector's items",
                    from_vector,
                ),
            ),
            (
                "of",
                native("of", &[Any], &[], "a stream of a single value", of),
            ),
            (
                "error",
                native("error", &[Any], &[], "a stream of a single error", error),
            ),
            (
                "empty",
                native_thunk("empty", "a stream with no values", |_| {
                    Ok(Value::Stream(crate::stream::Stream::empty()))
                }),
            ),
        ],
    )
}
