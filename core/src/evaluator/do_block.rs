//! Do-blocks: imperative sequencing over streams.
//!
//! A block is compiled lazily into a chain of streams. Each instruction
//! decides how the rest of the block is reached:
//!
//! - `call e` evaluates `e` for its effect and continues.
//! - `action e` runs the stream `e`, ignores its values and continues once
//!   it closes.
//! - `x <- e` continues once per value of the stream `e`, with `x` bound.
//! - `let x = e` binds `x` and continues.
//! - `return e` and `if` end the block.

use super::Context;
use crate::ast::{Block, DoInstruction};
use crate::errors::{Error, ErrorKind, Result};
use crate::stream::Stream;
use crate::values::Value;

pub(crate) fn evaluate_block(ctx: &Context, block: &Block) -> Result<Stream> {
    validate(ctx, block)?;
    run_from(ctx, block, 0)
}

fn validate(ctx: &Context, block: &[DoInstruction]) -> Result<()> {
    let last = block.len().saturating_sub(1);
    for (index, instruction) in block.iter().enumerate() {
        let is_last = index == last;
        match instruction {
            DoInstruction::Return(_) if !is_last => {
                return Err(misplaced(ctx, "return must be the last instruction of a do block"));
            }
            DoInstruction::Bind { .. } if is_last => {
                return Err(misplaced(ctx, "a binding can't be the last instruction of a do block"));
            }
            DoInstruction::IfThenElse {
                consequent,
                alternate,
                ..
            } => {
                if !is_last {
                    return Err(misplaced(ctx, "if must be the last instruction of a do block"));
                }
                validate(ctx, consequent)?;
                validate(ctx, alternate)?;
            }
            _ => {}
        }
    }
    Ok(())
}

fn misplaced(ctx: &Context, message: &str) -> Error {
    ctx.error(ErrorKind::Desugar {
        message: message.to_string(),
    })
}

fn run_from(ctx: &Context, block: &Block, start: usize) -> Result<Stream> {
    let Some(instruction) = block.get(start) else {
        return Ok(Stream::empty());
    };
    let next = start + 1;

    match instruction {
        DoInstruction::Call(expression) => {
            ctx.evaluate(expression)?;
            run_from(ctx, block, next)
        }

        DoInstruction::Action(expression) => {
            let stream = expect_stream(ctx, ctx.evaluate(expression)?, "An action in a do block")?;
            if next == block.len() {
                return Ok(stream);
            }
            let (ctx, block) = (ctx.clone(), block.clone());
            Ok(stream.and_then(move || run_from(&ctx, &block, next)))
        }

        DoInstruction::Bind { name, expression } => {
            let stream = expect_stream(ctx, ctx.evaluate(expression)?, "A binding in a do block")?;
            let (ctx, block, name) = (ctx.clone(), block.clone(), name.clone());
            Ok(stream.chain(move |value| {
                let scope = ctx.extend_environment([(name.clone(), value)])?;
                run_from(&scope, &block, next)
            }))
        }

        DoInstruction::Let { name, expression } => {
            let value = ctx.evaluate(expression)?;
            let scope = ctx.extend_environment([(name.clone(), value)])?;
            run_from(&scope, block, next)
        }

        DoInstruction::Return(expression) => Ok(Stream::of(ctx.evaluate(expression)?)),

        DoInstruction::IfThenElse {
            condition,
            consequent,
            alternate,
        } => {
            let condition = ctx.evaluate(condition)?;
            match condition {
                Value::Boolean(true) => run_from(ctx, consequent, 0),
                Value::Boolean(false) => run_from(ctx, alternate, 0),
                other => Err(ctx.rethrow(Error::type_mismatch(
                    "Boolean",
                    other.type_name().to_string(),
                    "The condition of an if instruction",
                ))),
            }
        }
    }
}

fn expect_stream(ctx: &Context, value: Value, site: &str) -> Result<Stream> {
    value.into_stream(site).map_err(|error| ctx.rethrow(error))
}
