//! Tree-to-tree rewrites that run before evaluation.
//!
//! [`compile`] first turns operator applications into plain invocations and
//! then replaces argument holes with lambdas. Hole removal only understands
//! plain invocations, so the order is fixed.

mod application;
mod holes;


pub use application::desugar_application;
pub use holes::desugar_holes;

use crate::ast::Node;
use crate::errors::Result;

/// Runs every pass over `node`. The result contains no `Infix`, `Prefix`
/// or `Hole` nodes.
pub fn compile(node: &Node) -> Result<Node> {
    let applied = desugar_application(node)?;
    desugar_holes(&applied)
}
