//! Tree-walking evaluator for desugared furipota programs.
//!
//! The evaluator interprets [`crate::ast::Node`]s (after
//! [`crate::passes::compile`]) and produces runtime [`crate::values::Value`]s.
//!
//! ## Design Principles
//!
//! - **Never panic**: malformed trees and host failures surface as errors
//! - **Stack-safe**: nesting depth is tracked against `EngineOptions::max_depth`
//! - **Traced**: every error carries the bounded trace active where it was raised
//!
//! Stream-producing forms (pipes and do-blocks) only build streams here;
//! nothing is pushed until a stream is run.

mod context;
mod do_block;
mod eval;
mod pattern;
mod trace;

#[cfg(test)]
mod eval_test;

pub use context::Context;
pub use eval::evaluate;
pub use pattern::{Bindings, test_pattern};
pub use trace::{DEFAULT_TRACE_DEPTH, Trace, TraceEntry};
