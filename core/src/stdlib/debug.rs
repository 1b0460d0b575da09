//! Debug Module
//!
//! Diagnostics for furipota programs. Output goes through `tracing` under
//! the `furipota::debug` target, so hosts decide where (and whether) it is
//! shown.

use std::rc::Rc;

use tracing::info;

use super::{native_module, stream_arg, text_option};
use crate::api::Engine;
use crate::errors::Result;
use crate::evaluator::Context;
use crate::module::Module;
use crate::stream::Handler;
use crate::values::{OptionSpec, Record, TypeTag, Value, native};

fn show_options() -> [OptionSpec; 1] {
    [OptionSpec::new("prefix?", TypeTag::Text)]
}

/// Logs a value and returns unit.
fn log(_ctx: &Context, args: &[Value], options: &Record) -> Result<Value> {
    let prefix = text_option(options, "prefix").unwrap_or_default();
    info!(target: "furipota::debug", prefix = %prefix, "{}", args[0].show());
    Ok(Value::unit())
}

/// Logs every event of a stream as it happens and returns the stream.
fn trace(_ctx: &Context, args: &[Value], options: &Record) -> Result<Value> {
    let stream = stream_arg(args, 0)?.clone();
    let prefix = text_option(options, "prefix").unwrap_or_default();
    let (on_value, on_error, on_close) = (prefix.clone(), prefix.clone(), prefix);
    stream.subscribe(Handler::new(
        move |value: Value| {
            info!(target: "furipota::debug", prefix = %on_value, "OK    {}", value.show());
            std::future::ready(Ok(()))
        },
        move |error: Value| {
            info!(target: "furipota::debug", prefix = %on_error, "ERROR {}", error.show());
            std::future::ready(Ok(()))
        },
        move || {
            info!(target: "furipota::debug", prefix = %on_close, "CLOSE");
            std::future::ready(Ok(()))
        },
    ));
    Ok(Value::Stream(stream))
}

fn type_of(_ctx: &Context, args: &[Value], _options: &Record) -> Result<Value> {
    Ok(Value::Text(args[0].type_name()))
}

pub fn build_debug_module(engine: &Engine) -> Result<Rc<Module>> {
    native_module(
        engine,
        "debug",
        vec![
            (
                "log",
                native(
                    "log",
                    &[TypeTag::Any],
                    &show_options(),
                    "shows a value in the log",
                    log,
                ),
            ),
            (
                "trace",
                native(
                    "trace",
                    &[TypeTag::Stream],
                    &show_options(),
                    "shows the events of a stream over time",
                    trace,
                ),
            ),
            (
                "type",
                native(
                    "type",
                    &[TypeTag::Any],
                    &[],
                    "the runtime type of a value",
                    type_of,
                ),
            ),
        ],
    )
}
