//! Public API for embedding the furipota runtime.
//!
//! An [`Engine`] owns the global environment, the registered core modules
//! and plugins, and the module caches. Hosts configure it once through
//! [`EnvironmentBuilder`] and then evaluate syntax trees produced by their
//! parser (or built with [`crate::ast::build`]).
//!
//! # Example
//!
//! ```ignore
//! use furipota_core::api::{Engine, EngineOptions};
//! use furipota_core::values::{native, TypeTag, Value};
//!
//! let engine = Engine::new(EngineOptions::default(), |env| {
//!     env.register("twice", native("twice", &[TypeTag::Number], &[], "Doubles a number",
//!         |_ctx, args, _options| Ok(Value::Number(args[0].as_number().unwrap_or(0.0) * 2.0))));
//!     env.parser(MyParser);
//! })?;
//!
//! let module = engine.new_module("main.frp")?;
//! let value = engine.evaluate_source(&module, "twice 21")?;
//! ```

pub mod engine;
pub mod environment;
pub mod loader;
pub mod options;

#[cfg(test)]
mod engine_test;

pub use engine::Engine;
pub use environment::{EnvironmentBuilder, ModuleFactory};
pub use loader::{FileSystemLoader, SourceLoader, SourceParser};
pub use options::EngineOptions;
