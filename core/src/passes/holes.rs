use std::rc::Rc;

use ecow::{EcoString, eco_format};

use crate::ast::{Expr, Node, map_children};
use crate::errors::{Error, Result};

/// Replaces argument holes with lambdas.
///
/// Every hole in the immediate argument positions of an invocation chain
/// (the callee spine, the input, and the values of a literal options record)
/// becomes a fresh `$n` parameter, leftmost first:
///
/// ```text
/// f _ {key: _}   ==>   $1 -> $2 -> f $1 {key: $2}
/// ```
///
/// The rightmost hole's lambda is innermost. In a pipe, only the
/// transformation is wrapped. A hole anywhere else is a syntax error.
pub fn desugar_holes(node: &Node) -> Result<Node> {
    Desugarer::default().desugar(node)
}

#[derive(Default)]
struct Desugarer {
    count: usize,
}

type Collected = (Vec<EcoString>, Node);

impl Desugarer {
    fn fresh(&mut self) -> EcoString {
        self.count += 1;
        eco_format!("${}", self.count)
    }

    fn desugar(&mut self, node: &Node) -> Result<Node> {
        match &**node {
            Expr::Hole => Err(Error::desugar(
                "Holes are only allowed in function applications",
            )),
            Expr::Infix { .. } | Expr::Prefix { .. } => Err(Error::desugar(format!(
                "{} node found while desugaring holes, after desugaring applications",
                node.kind_name()
            ))),
            Expr::Invoke { .. } => {
                let (holes, invoke) = self.collect_invoke(node)?;
                Ok(make_lambda(holes, invoke))
            }
            Expr::Pipe {
                input,
                transformation,
            } => {
                let input = self.desugar(input)?;
                let (holes, transformation) = self.collect_immediate(transformation)?;
                Ok(Rc::new(Expr::Pipe {
                    input,
                    transformation: make_lambda(holes, transformation),
                }))
            }
            _ => map_children(node, &mut |child| self.desugar(child)),
        }
    }

    fn collect_invoke(&mut self, node: &Node) -> Result<Collected> {
        let Expr::Invoke {
            callee,
            input,
            options,
        } = &**node
        else {
            return Err(Error::desugar(format!(
                "Expected an Invoke node, got {}",
                node.kind_name()
            )));
        };

        let (mut holes, callee) = self.collect_immediate(callee)?;
        let (input_holes, input) = self.collect_hole(input)?;
        let (option_holes, options) = self.collect_option_holes(options)?;
        holes.extend(input_holes);
        holes.extend(option_holes);

        Ok((
            holes,
            Rc::new(Expr::Invoke {
                callee,
                input,
                options,
            }),
        ))
    }

    fn collect_immediate(&mut self, node: &Node) -> Result<Collected> {
        if matches!(&**node, Expr::Invoke { .. }) {
            self.collect_invoke(node)
        } else {
            self.collect_hole(node)
        }
    }

    fn collect_hole(&mut self, node: &Node) -> Result<Collected> {
        if matches!(&**node, Expr::Hole) {
            let name = self.fresh();
            let variable = Rc::new(Expr::Variable { name: name.clone() });
            Ok((vec![name], variable))
        } else {
            Ok((Vec::new(), self.desugar(node)?))
        }
    }

    fn collect_option_holes(&mut self, options: &Node) -> Result<Collected> {
        let Expr::Record { pairs } = &**options else {
            return Ok((Vec::new(), self.desugar(options)?));
        };

        let mut holes = Vec::new();
        let mut rewritten = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let (value_holes, value) = self.collect_hole(value)?;
            holes.extend(value_holes);
            rewritten.push((key.clone(), value));
        }
        Ok((holes, Rc::new(Expr::Record { pairs: rewritten })))
    }
}

fn make_lambda(holes: Vec<EcoString>, body: Node) -> Node {
    holes.into_iter().rev().fold(body, |body, param| {
        Rc::new(Expr::Lambda {
            value_param: param,
            options_param: "_".into(),
            body,
        })
    })
}
