//! Predicates Module
//!
//! Type tests returning Booleans. They are ordinary natives, so they also
//! serve as field predicates for user variants: `^Point(number, number)`.

use std::rc::Rc;

use super::native_module;
use crate::api::Engine;
use crate::errors::{Error, Result};
use crate::evaluator::Context;
use crate::module::Module;
use crate::values::{Record, TypeTag, Value, native};

fn type_test(name: &'static str, tag: TypeTag) -> (&'static str, Value) {
    let documentation = format!("whether a value is of type {tag}");
    let value = native(name, &[TypeTag::Any], &[], &documentation, move |_, args, _| {
        Ok(Value::Boolean(tag.matches(&args[0])))
    });
    (name, value)
}

fn instance(_ctx: &Context, args: &[Value], _options: &Record) -> Result<Value> {
    let variant = args[0]
        .as_variant()
        .ok_or_else(|| Error::runtime("native argument 0 is not a Variant"))?;
    Ok(Value::Boolean(variant.has_instance(&args[1])))
}

pub fn build_predicates_module(engine: &Engine) -> Result<Rc<Module>> {
    native_module(
        engine,
        "predicates",
        vec![
            type_test("any", TypeTag::Any),
            type_test("number", TypeTag::Number),
            type_test("text", TypeTag::Text),
            type_test("boolean", TypeTag::Boolean),
            type_test("vector", TypeTag::Vector),
            type_test("record", TypeTag::Record),
            type_test("invokable", TypeTag::Invokable),
            type_test("stream", TypeTag::Stream),
            type_test("any-variant", TypeTag::Tagged),
            (
                "instance",
                native(
                    "instance",
                    &[TypeTag::Variant, TypeTag::Any],
                    &[],
                    "whether a value was built from a variant",
                    instance,
                ),
            ),
        ],
    )
}
