//! Furipota Standard Library
//!
//! The core modules every engine starts with, importable with
//! `import core "<name>"`:
//! - `core`: the builtin variants, results, unions and boolean logic
//! - `prelude`: operators and helpers opened into the global environment
//! - `streams`: stream constructors and combinators
//! - `text`, `vector`: operations on text and vectors
//! - `debug`: logging through `tracing`
//! - `predicates`: type tests, usable as variant field predicates
//!
//! Each module is a native module: a fresh environment holding one binding
//! per entry, all of them exported.

use std::rc::Rc;

use ecow::{EcoString, EcoVec};

use crate::api::{Engine, EnvironmentBuilder};
use crate::errors::{Error, Result};
use crate::evaluator::Context;
use crate::module::Module;
use crate::stream::Stream;
use crate::values::{Invokable, NativeThunk, Record, Value};

pub mod core;
pub mod debug;
pub mod predicates;
pub mod prelude;
pub mod streams;
pub mod text;
pub mod vector;


/// Registers the standard core modules.
pub fn register_core_modules(env: &mut EnvironmentBuilder) {
    env.core_module("core", self::core::build_core_module);
    env.core_module("prelude", prelude::build_prelude_module);
    env.core_module("streams", streams::build_streams_module);
    env.core_module("text", text::build_text_module);
    env.core_module("vector", vector::build_vector_module);
    env.core_module("debug", debug::build_debug_module);
    env.core_module("predicates", predicates::build_predicates_module);
}

/// Builds a module named `core:<name>` exporting every entry.
pub fn native_module(
    engine: &Engine,
    name: &str,
    entries: impl IntoIterator<Item = (&'static str, Value)>,
) -> Result<Rc<Module>> {
    let module = Rc::new(Module::new(format!("core:{name}"), engine.root_env()));
    for (key, value) in entries {
        engine.define(module.env(), key, value)?;
        module.export(key, key);
    }
    Ok(module)
}

/// A binding recomputed every time it is looked up.
pub fn native_thunk(
    name: &str,
    documentation: &str,
    compute: impl Fn(&Context) -> Result<Value> + 'static,
) -> Value {
    NativeThunk::new(name, documentation, compute).into()
}

// ============================================================================
// Argument access
// ============================================================================
//
// Natives only run after their declared parameter types were checked, so
// these fail only when a declaration and its body disagree.

fn argument<'a, T: ?Sized>(
    args: &'a [Value],
    index: usize,
    expected: &str,
    extract: impl FnOnce(&'a Value) -> Option<&'a T>,
) -> Result<&'a T> {
    args.get(index).and_then(extract).ok_or_else(|| {
        Error::runtime(format!(
            "native argument {index} was declared as {expected} but is missing or mistyped"
        ))
    })
}

pub(crate) fn number_arg(args: &[Value], index: usize) -> Result<f64> {
    args.get(index)
        .and_then(Value::as_number)
        .ok_or_else(|| Error::runtime(format!("native argument {index} is not a Number")))
}

pub(crate) fn bool_arg(args: &[Value], index: usize) -> Result<bool> {
    args.get(index)
        .and_then(Value::as_bool)
        .ok_or_else(|| Error::runtime(format!("native argument {index} is not a Boolean")))
}

pub(crate) fn text_arg(args: &[Value], index: usize) -> Result<&EcoString> {
    argument(args, index, "Text", Value::as_text)
}

pub(crate) fn vector_arg(args: &[Value], index: usize) -> Result<&EcoVec<Value>> {
    argument(args, index, "Vector", Value::as_vector)
}

pub(crate) fn invokable_arg(args: &[Value], index: usize) -> Result<&Invokable> {
    argument(args, index, "Invokable", Value::as_invokable)
}

pub(crate) fn stream_arg(args: &[Value], index: usize) -> Result<&Stream> {
    argument(args, index, "Stream", Value::as_stream)
}

pub(crate) fn text_option(options: &Record, key: &str) -> Option<EcoString> {
    options.get(key).and_then(Value::as_text).cloned()
}
