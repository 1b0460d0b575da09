//! Text Module

use std::rc::Rc;

use super::{native_module, text_arg};
use crate::api::Engine;
use crate::errors::Result;
use crate::evaluator::Context;
use crate::module::Module;
use crate::values::{Record, TypeTag, Value, native};

/// Joins two portions of text together
fn concatenate(_ctx: &Context, args: &[Value], _options: &Record) -> Result<Value> {
    let mut joined = text_arg(args, 0)?.clone();
    joined.push_str(text_arg(args, 1)?);
    Ok(Value::Text(joined))
}

fn show(_ctx: &Context, args: &[Value], _options: &Record) -> Result<Value> {
    Ok(Value::text(args[0].show()))
}

pub fn build_text_module(engine: &Engine) -> Result<Rc<Module>> {
    native_module(
        engine,
        "text",
        vec![
            (
                "concatenate",
                native(
                    "concatenate",
                    &[TypeTag::Text, TypeTag::Text],
                    &[],
                    "joins two portions of text together",
                    concatenate,
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
        ],
    )
}
