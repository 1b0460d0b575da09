//! Vector Module

use std::rc::Rc;

use ecow::EcoVec;

use super::{invokable_arg, native_module, vector_arg};
use crate::api::Engine;
use crate::errors::Result;
use crate::evaluator::Context;
use crate::module::Module;
use crate::values::{Record, TypeTag, Value, native};

/// Applies a function to every item, eagerly.
fn map(ctx: &Context, args: &[Value], _options: &Record) -> Result<Value> {
    let function = invokable_arg(args, 0)?;
    let items = vector_arg(args, 1)?
        .iter()
        .map(|item| function.call(ctx, item.clone()))
        .collect::<Result<EcoVec<Value>>>()?;
    Ok(Value::Vector(items))
}

fn length(_ctx: &Context, args: &[Value], _options: &Record) -> Result<Value> {
    Ok(Value::Number(vector_arg(args, 0)?.len() as f64))
}

pub fn build_vector_module(engine: &Engine) -> Result<Rc<Module>> {
    native_module(
        engine,
        "vector",
        vec![
            (
                "map",
                native(
                    "map",
                    &[TypeTag::Invokable, TypeTag::Vector],
                    &[],
                    "transforms each item",
                    map,
                ),
            ),
            (
                "length",
                native(
                    "length",
                    &[TypeTag::Vector],
                    &[],
                    "the number of items",
                    length,
                ),
            ),
        ],
    )
}
