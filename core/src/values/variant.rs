use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use ecow::EcoString;

use super::{Invokable, TypeTag, Value, primitive};
use crate::errors::{Error, ErrorKind, Result, ordinal};
use crate::evaluator::Context;

/// Variants defined by the runtime itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinVariant {
    Unit,
    Ok,
    Error,
}

/// Identity of a variant. Two variants with the same tag text are still
/// distinct unless they share an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantId {
    Builtin(BuiltinVariant),
    User(u64),
}

static NEXT_VARIANT: AtomicU64 = AtomicU64::new(0);

thread_local! {
    static BUILTINS: [Rc<Variant>; 3] = {
        let is_any = primitive("is-any", &[TypeTag::Any], &[], "", |_, _, _| {
            Ok(Value::Boolean(true))
        });
        let builtin = |which: BuiltinVariant, tag: &str, predicates: Vec<Invokable>| {
            Rc::new(Variant::with_id(VariantId::Builtin(which), tag.into(), predicates))
        };
        [
            builtin(BuiltinVariant::Unit, "Unit", Vec::new()),
            builtin(BuiltinVariant::Ok, "Ok", vec![is_any.clone()]),
            builtin(BuiltinVariant::Error, "Error", vec![is_any]),
        ]
    };
}

/// A tag constructor with one predicate per field.
pub struct Variant {
    id: VariantId,
    tag: EcoString,
    predicates: Vec<Invokable>,
}

impl Variant {
    pub fn new(tag: EcoString, predicates: Vec<Invokable>) -> Self {
        let id = VariantId::User(NEXT_VARIANT.fetch_add(1, Ordering::Relaxed));
        Self::with_id(id, tag, predicates)
    }

    fn with_id(id: VariantId, tag: EcoString, predicates: Vec<Invokable>) -> Self {
        Self {
            id,
            tag,
            predicates,
        }
    }

    pub fn builtin(which: BuiltinVariant) -> Rc<Variant> {
        BUILTINS.with(|builtins| match which {
            BuiltinVariant::Unit => builtins[0].clone(),
            BuiltinVariant::Ok => builtins[1].clone(),
            BuiltinVariant::Error => builtins[2].clone(),
        })
    }

    pub fn id(&self) -> VariantId {
        self.id
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn arity(&self) -> usize {
        self.predicates.len()
    }

    pub fn has_instance(&self, value: &Value) -> bool {
        matches!(value, Value::Tagged(tagged) if tagged.variant.id == self.id)
    }

    /// The field values of `value`, if it is an instance of this variant.
    pub fn unapply<'v>(&self, value: &'v Value) -> Option<&'v [Value]> {
        match value {
            Value::Tagged(tagged) if tagged.variant.id == self.id => Some(&tagged.values),
            _ => None,
        }
    }

    /// Builds an instance without running the predicates.
    pub fn instance(self: &Rc<Self>, values: Vec<Value>) -> Value {
        Value::Tagged(Rc::new(Tagged {
            variant: self.clone(),
            values,
        }))
    }

    /// Builds an instance, checking the arity and every field predicate.
    pub fn create(self: &Rc<Self>, ctx: &Context, values: Vec<Value>) -> Result<Value> {
        if values.len() != self.arity() {
            return Err(ctx.error(ErrorKind::VariantConstruction {
                tag: self.tag.clone(),
                message: format!(
                    "the variant accepts exactly {} parameters, but was given {}",
                    self.arity(),
                    values.len()
                ),
            }));
        }

        for (index, (predicate, value)) in self.predicates.iter().zip(&values).enumerate() {
            let verdict = predicate.call(ctx, value.clone())?;
            match verdict {
                Value::Boolean(true) => {}
                Value::Boolean(false) => {
                    return Err(ctx.error(ErrorKind::VariantConstruction {
                        tag: self.tag.clone(),
                        message: format!(
                            "the {} argument is not valid for this structure",
                            ordinal(index + 1)
                        ),
                    }));
                }
                other => {
                    return Err(ctx.rethrow(Error::type_mismatch(
                        "Boolean",
                        other.type_name().to_string(),
                        format!(
                            "The predicate for the {} field of ^{}",
                            ordinal(index + 1),
                            self.tag
                        ),
                    )));
                }
            }
        }

        Ok(self.instance(values))
    }
}

/// An instance of a variant.
pub struct Tagged {
    variant: Rc<Variant>,
    values: Vec<Value>,
}

impl Tagged {
    pub fn variant(&self) -> &Rc<Variant> {
        &self.variant
    }

    pub fn tag(&self) -> &str {
        self.variant.tag()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}
