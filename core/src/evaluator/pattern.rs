//! Structural pattern matching.

use ecow::{EcoString, EcoVec};

use super::Context;
use crate::ast::{MatchCase, Pattern, VectorPattern};
use crate::errors::{Error, ErrorKind, Result};
use crate::values::{TypeTag, Value};

/// Names bound by a successful match, in pattern order.
pub type Bindings = Vec<(EcoString, Value)>;

/// Evaluates the body of the first case whose pattern matches `value`.
pub(crate) fn evaluate_match(ctx: &Context, value: Value, cases: &[MatchCase]) -> Result<Value> {
    for case in cases {
        if let Some(bindings) = test_pattern(ctx, &case.pattern, &value)? {
            return ctx.extend_environment(bindings)?.evaluate(&case.body);
        }
    }
    Err(ctx.error(ErrorKind::PatternExhausted {
        value: value.show(),
    }))
}

/// Tests `pattern` against `value`.
///
/// Returns `Ok(None)` when the value does not fit; a failing sub-pattern
/// discards every binding gathered so far. Errors are reserved for malformed
/// patterns and for failures evaluating the expressions patterns embed.
pub fn test_pattern(ctx: &Context, pattern: &Pattern, value: &Value) -> Result<Option<Bindings>> {
    match pattern {
        Pattern::Any => Ok(Some(Vec::new())),

        Pattern::Bind { name } => Ok(Some(vec![(name.clone(), value.clone())])),

        Pattern::Equals { name, expression } => {
            let expected = ctx.evaluate(expression)?;
            if value.structural_eq(&expected) {
                Ok(Some(vec![(name.clone(), value.clone())]))
            } else {
                Ok(None)
            }
        }

        Pattern::Tagged { tag, patterns } => {
            let variant = ctx.evaluate(tag)?;
            let Value::Variant(variant) = variant else {
                return Err(ctx.rethrow(Error::type_mismatch(
                    TypeTag::Variant.to_string(),
                    variant.type_name().to_string(),
                    "The tag of a pattern",
                )));
            };

            let Some(fields) = variant.unapply(value) else {
                return Ok(None);
            };
            if patterns.is_empty() {
                return Ok(Some(Vec::new()));
            }
            if patterns.len() != fields.len() {
                return Ok(None);
            }

            let mut bindings = Vec::new();
            for (pattern, field) in patterns.iter().zip(fields) {
                match test_pattern(ctx, pattern, field)? {
                    Some(found) => merge(ctx, &mut bindings, found)?,
                    None => return Ok(None),
                }
            }
            Ok(Some(bindings))
        }

        Pattern::Vector { items } => {
            let spread_at = items
                .iter()
                .position(|item| matches!(item, VectorPattern::Spread(_)));
            if let Some(index) = spread_at {
                ctx.assert(index + 1 == items.len(), || {
                    "A spread must be the last item of a vector pattern".to_string()
                })?;
            }

            let Value::Vector(values) = value else {
                return Ok(None);
            };
            let required = items.len() - usize::from(spread_at.is_some());
            if values.len() < required {
                return Ok(None);
            }

            let mut bindings = Vec::new();
            for (index, item) in items.iter().enumerate() {
                let found = match item {
                    VectorPattern::Element(pattern) => test_pattern(ctx, pattern, &values[index])?,
                    VectorPattern::Spread(pattern) => {
                        let rest: EcoVec<Value> = values.iter().skip(index).cloned().collect();
                        test_pattern(ctx, pattern, &Value::Vector(rest))?
                    }
                };
                match found {
                    Some(found) => merge(ctx, &mut bindings, found)?,
                    None => return Ok(None),
                }
            }
            Ok(Some(bindings))
        }
    }
}

fn merge(ctx: &Context, bindings: &mut Bindings, found: Bindings) -> Result<()> {
    for (name, value) in found {
        if bindings.iter().any(|(existing, _)| *existing == name) {
            return Err(ctx.error(ErrorKind::DuplicateBinding { name }));
        }
        bindings.push((name, value));
    }
    Ok(())
}
