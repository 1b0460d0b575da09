use std::rc::Rc;

use crate::ast::{Expr, Node, build, map_children};
use crate::errors::Result;

/// Rewrites operator forms into invocations:
///
/// - `l op r` becomes `(op l {}) r {}`
/// - `op e` becomes `op e {}`
pub fn desugar_application(node: &Node) -> Result<Node> {
    match &**node {
        Expr::Infix {
            operator,
            left,
            right,
        } => {
            let partially_applied = Rc::new(Expr::Invoke {
                callee: desugar_application(operator)?,
                input: desugar_application(left)?,
                options: build::empty_record(),
            });
            Ok(Rc::new(Expr::Invoke {
                callee: partially_applied,
                input: desugar_application(right)?,
                options: build::empty_record(),
            }))
        }
        Expr::Prefix { operator, operand } => Ok(Rc::new(Expr::Invoke {
            callee: desugar_application(operator)?,
            input: desugar_application(operand)?,
            options: build::empty_record(),
        })),
        _ => map_children(node, &mut desugar_application),
    }
}
