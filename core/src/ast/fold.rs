//! Structural rebuilding of syntax trees.
//!
//! Passes only care about a handful of node kinds; everything else is
//! rebuilt from transformed children with [`map_children`].

use std::rc::Rc;

use super::{
    Block, DoInstruction, Expr, InterpolationPart, MatchCase, Node, Pattern, ShellArg,
    ShellCommand, VectorItem, VectorPattern,
};
use crate::errors::Result;

type Rewrite<'f> = dyn FnMut(&Node) -> Result<Node> + 'f;

/// Rebuilds `node` with `f` applied to each direct child expression,
/// including expressions nested in patterns, do-blocks and shell arguments.
/// Leaves are returned as-is without allocating.
pub fn map_children(node: &Node, f: &mut Rewrite<'_>) -> Result<Node> {
    let rebuilt = match &**node {
        Expr::Keyword { .. }
        | Expr::Text { .. }
        | Expr::Character { .. }
        | Expr::Integer { .. }
        | Expr::Decimal { .. }
        | Expr::Boolean { .. }
        | Expr::Hole
        | Expr::Variable { .. }
        | Expr::Import { .. }
        | Expr::ImportAliasing { .. }
        | Expr::Export { .. }
        | Expr::ExportAliasing { .. } => return Ok(node.clone()),

        Expr::Interpolate { parts } => Expr::Interpolate {
            parts: parts
                .iter()
                .map(|part| match part {
                    InterpolationPart::Text(text) => Ok(InterpolationPart::Text(text.clone())),
                    InterpolationPart::Expression(expr) => {
                        Ok(InterpolationPart::Expression(f(expr)?))
                    }
                })
                .collect::<Result<_>>()?,
        },
        Expr::Vector { items } => Expr::Vector {
            items: items
                .iter()
                .map(|item| match item {
                    VectorItem::Element(expr) => Ok(VectorItem::Element(f(expr)?)),
                    VectorItem::Spread(expr) => Ok(VectorItem::Spread(f(expr)?)),
                })
                .collect::<Result<_>>()?,
        },
        Expr::Record { pairs } => Expr::Record {
            pairs: pairs
                .iter()
                .map(|(key, value)| Ok((key.clone(), f(value)?)))
                .collect::<Result<_>>()?,
        },
        Expr::Lambda {
            value_param,
            options_param,
            body,
        } => Expr::Lambda {
            value_param: value_param.clone(),
            options_param: options_param.clone(),
            body: f(body)?,
        },
        Expr::Tagged { tag, predicates } => Expr::Tagged {
            tag: tag.clone(),
            predicates: predicates.iter().map(|p| f(p)).collect::<Result<_>>()?,
        },
        Expr::Seq { items } => Expr::Seq {
            items: items.iter().map(|item| f(item)).collect::<Result<_>>()?,
        },
        Expr::Invoke {
            callee,
            input,
            options,
        } => Expr::Invoke {
            callee: f(callee)?,
            input: f(input)?,
            options: f(options)?,
        },
        Expr::Partial { callee, options } => Expr::Partial {
            callee: f(callee)?,
            options: f(options)?,
        },
        Expr::Pipe {
            input,
            transformation,
        } => Expr::Pipe {
            input: f(input)?,
            transformation: f(transformation)?,
        },
        Expr::Infix {
            operator,
            left,
            right,
        } => Expr::Infix {
            operator: f(operator)?,
            left: f(left)?,
            right: f(right)?,
        },
        Expr::Prefix { operator, operand } => Expr::Prefix {
            operator: f(operator)?,
            operand: f(operand)?,
        },
        Expr::Let {
            binding,
            value,
            body,
        } => Expr::Let {
            binding: binding.clone(),
            value: f(value)?,
            body: f(body)?,
        },
        Expr::IfThenElse {
            condition,
            consequent,
            alternate,
        } => Expr::IfThenElse {
            condition: f(condition)?,
            consequent: f(consequent)?,
            alternate: f(alternate)?,
        },
        Expr::Get { record, property } => Expr::Get {
            record: f(record)?,
            property: property.clone(),
        },
        Expr::Match { scrutinee, cases } => Expr::Match {
            scrutinee: f(scrutinee)?,
            cases: cases
                .iter()
                .map(|case| {
                    Ok(MatchCase {
                        pattern: map_pattern(&case.pattern, f)?,
                        body: f(&case.body)?,
                    })
                })
                .collect::<Result<_>>()?,
        },
        Expr::Open {
            record,
            modifier,
            body,
        } => Expr::Open {
            record: f(record)?,
            modifier: modifier.clone(),
            body: f(body)?,
        },
        Expr::ExprSequence { first, rest } => Expr::ExprSequence {
            first: f(first)?,
            rest: f(rest)?,
        },
        Expr::Shell {
            command,
            args,
            options,
        } => Expr::Shell {
            command: match command {
                ShellCommand::Symbol(name) => ShellCommand::Symbol(name.clone()),
                ShellCommand::Expression(expr) => ShellCommand::Expression(f(expr)?),
            },
            args: args
                .iter()
                .map(|arg| match arg {
                    ShellArg::Symbol(name) => Ok(ShellArg::Symbol(name.clone())),
                    ShellArg::Spread(expr) => Ok(ShellArg::Spread(f(expr)?)),
                    ShellArg::Expression(expr) => Ok(ShellArg::Expression(f(expr)?)),
                })
                .collect::<Result<_>>()?,
            options: f(options)?,
        },
        Expr::Do { instructions } => Expr::Do {
            instructions: map_block(instructions, f)?,
        },
        Expr::Define {
            name,
            value,
            documentation,
        } => Expr::Define {
            name: name.clone(),
            value: f(value)?,
            documentation: documentation.clone(),
        },
        Expr::Program { declarations } => Expr::Program {
            declarations: declarations.iter().map(|d| f(d)).collect::<Result<_>>()?,
        },
    };
    Ok(Rc::new(rebuilt))
}

fn map_pattern(pattern: &Pattern, f: &mut Rewrite<'_>) -> Result<Pattern> {
    Ok(match pattern {
        Pattern::Bind { .. } | Pattern::Any => pattern.clone(),
        Pattern::Equals { name, expression } => Pattern::Equals {
            name: name.clone(),
            expression: f(expression)?,
        },
        Pattern::Tagged { tag, patterns } => Pattern::Tagged {
            tag: f(tag)?,
            patterns: patterns
                .iter()
                .map(|p| map_pattern(p, f))
                .collect::<Result<_>>()?,
        },
        Pattern::Vector { items } => Pattern::Vector {
            items: items
                .iter()
                .map(|item| match item {
                    VectorPattern::Element(p) => Ok(VectorPattern::Element(map_pattern(p, f)?)),
                    VectorPattern::Spread(p) => Ok(VectorPattern::Spread(map_pattern(p, f)?)),
                })
                .collect::<Result<_>>()?,
        },
    })
}

fn map_block(block: &Block, f: &mut Rewrite<'_>) -> Result<Block> {
    block
        .iter()
        .map(|instruction| {
            Ok(match instruction {
                DoInstruction::Call(expr) => DoInstruction::Call(f(expr)?),
                DoInstruction::Action(expr) => DoInstruction::Action(f(expr)?),
                DoInstruction::Return(expr) => DoInstruction::Return(f(expr)?),
                DoInstruction::Bind { name, expression } => DoInstruction::Bind {
                    name: name.clone(),
                    expression: f(expression)?,
                },
                DoInstruction::Let { name, expression } => DoInstruction::Let {
                    name: name.clone(),
                    expression: f(expression)?,
                },
                DoInstruction::IfThenElse {
                    condition,
                    consequent,
                    alternate,
                } => DoInstruction::IfThenElse {
                    condition: f(condition)?,
                    consequent: map_block(consequent, f)?,
                    alternate: map_block(alternate, f)?,
                },
            })
        })
        .collect()
}
