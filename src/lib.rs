//! Furipota - a language for describing build and automation pipelines
//!
//! # Overview
//!
//! Furipota programs are expressions over asynchronous streams. A program
//! defines tasks as streams of values and errors, composes them with
//! ordinary functions, and runs them on a single-threaded tokio runtime.
//!
//! This crate is the embedding facade: it re-exports the runtime from
//! `furipota-core` and adds terminal error rendering.
//!
//! # Quick Start
//!
//! ```
//! use furipota::{Engine, EngineOptions, Value};
//! use furipota::ast::build::{infix, int, var};
//!
//! let engine = Engine::new(EngineOptions::default(), |env| {
//!     env.register("answer", Value::Number(41.0));
//! })
//! .unwrap();
//!
//! let module = engine.new_module("main.frp").unwrap();
//! let expr = infix(var("+"), var("answer"), int(1));
//! assert_eq!(engine.evaluate(&module, &expr).unwrap(), Value::Number(42.0));
//! ```
//!
//! # Running streams
//!
//! Stream values do nothing until run. Running one drives its producer and
//! every listener to completion:
//!
//! ```ignore
//! let stream = engine.evaluate(&module, &program)?.into_stream("main")?;
//! let events = stream.collect().await?;
//! ```
//!
//! # Host extensions
//!
//! Hosts add globals, core modules and plugins through the
//! [`EnvironmentBuilder`] handed to [`Engine::new`], and plug in a
//! [`SourceParser`] to load `furipota` modules from text.

// Re-export public API from furipota_core
pub use furipota_core::api::{
    Engine, EngineOptions, EnvironmentBuilder, FileSystemLoader, ModuleFactory, SourceLoader,
    SourceParser,
};
pub use furipota_core::{ast, errors, evaluator, module, passes, stdlib, stream, values};

// Re-export commonly used types and values
pub use furipota_core::errors::{Error, ErrorKind, Result};
pub use furipota_core::stream::{Emitter, Event, Handler, Stream};
pub use furipota_core::values::{OptionSpec, Record, TypeTag, Value, native};

mod error_renderer;
pub use error_renderer::{
    render_error, render_error_to, render_error_to_string, render_error_to_string_no_color,
};
