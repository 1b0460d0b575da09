//! The furipota language runtime.
//!
//! Furipota programs are expressions that evaluate to values, most usefully
//! to [`stream::Stream`]s: asynchronous, fallible sequences of values that
//! describe build and automation pipelines. This crate holds everything
//! between a parsed syntax tree and a running stream:
//!
//! - [`ast`]: the syntax tree, its pretty-printer and serialization
//! - [`passes`]: desugaring of operators and holes
//! - [`evaluator`]: the tree-walking evaluator and its traces
//! - [`environment`], [`module`]: lexical scopes and modules
//! - [`values`]: the runtime value model, natives and variants
//! - [`stream`]: the push-based stream engine
//! - [`stdlib`]: the builtin core modules
//! - [`api`]: the [`api::Engine`] hosts embed

pub mod api;
pub mod ast;
pub mod environment;
pub mod errors;
pub mod evaluator;
pub mod module;
pub mod passes;
pub mod stdlib;
pub mod stream;
pub mod values;

pub use errors::{Error, ErrorKind, Result};
