//! Runtime values.
//!
//! [`Value`] is a cheap-to-clone handle: compound values share their
//! contents through reference counting, so passing values into closures,
//! stream callbacks and environments never deep-copies.

mod invokable;
mod record;
mod thunk;
mod variant;


pub use invokable::{
    Invokable, Lambda, NativeFn, OptionSpec, Partial, Primitive, native, primitive,
};
pub use record::Record;
pub use thunk::{NativeThunk, Thunk};
pub use variant::{BuiltinVariant, Tagged, Variant, VariantId};

use std::fmt;
use std::rc::Rc;

use ecow::{EcoString, EcoVec};

use crate::errors::{Error, Result};
use crate::evaluator::Context;
use crate::stream::Stream;

#[derive(Clone)]
pub enum Value {
    Boolean(bool),
    Number(f64),
    Text(EcoString),
    Vector(EcoVec<Value>),
    Record(Record),
    Invokable(Invokable),
    /// A deferred definition, forced when looked up.
    Thunk(Rc<Thunk>),
    /// A host-computed binding, recomputed each time it is looked up.
    NativeThunk(Rc<NativeThunk>),
    Variant(Rc<Variant>),
    Tagged(Rc<Tagged>),
    Stream(Stream),
}

impl Value {
    pub fn text(value: impl Into<EcoString>) -> Self {
        Value::Text(value.into())
    }

    pub fn vector(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Vector(items.into_iter().collect())
    }

    pub fn unit() -> Self {
        Variant::builtin(BuiltinVariant::Unit).instance(Vec::new())
    }

    pub fn ok(value: Value) -> Self {
        Variant::builtin(BuiltinVariant::Ok).instance(vec![value])
    }

    pub fn error(value: Value) -> Self {
        Variant::builtin(BuiltinVariant::Error).instance(vec![value])
    }

    /// The runtime type name reported in type errors and by `type`.
    pub fn type_name(&self) -> EcoString {
        match self {
            Value::Boolean(_) => "Boolean".into(),
            Value::Number(_) => "Number".into(),
            Value::Text(_) => "Text".into(),
            Value::Vector(_) => "Vector".into(),
            Value::Record(_) => "Record".into(),
            Value::Invokable(invokable) => invokable.kind_name().into(),
            Value::Thunk(_) | Value::NativeThunk(_) => "Thunk".into(),
            Value::Variant(variant) => ecow::eco_format!("^{}", variant.tag()),
            Value::Tagged(tagged) => ecow::eco_format!("^{} instance", tagged.tag()),
            Value::Stream(_) => "Stream".into(),
        }
    }

    pub fn is_unit(&self) -> bool {
        let unit = VariantId::Builtin(BuiltinVariant::Unit);
        matches!(self, Value::Tagged(tagged) if tagged.variant().id() == unit)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&EcoString> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&EcoVec<Value>> {
        match self {
            Value::Vector(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_invokable(&self) -> Option<&Invokable> {
        match self {
            Value::Invokable(invokable) => Some(invokable),
            _ => None,
        }
    }

    pub fn as_stream(&self) -> Option<&Stream> {
        match self {
            Value::Stream(stream) => Some(stream),
            _ => None,
        }
    }

    pub fn as_variant(&self) -> Option<&Rc<Variant>> {
        match self {
            Value::Variant(variant) => Some(variant),
            _ => None,
        }
    }

    /// Forces thunks, leaving every other value untouched.
    pub fn force(self, ctx: &Context) -> Result<Value> {
        match self {
            Value::Thunk(thunk) => thunk.force(ctx),
            Value::NativeThunk(thunk) => thunk.force(ctx),
            other => Ok(other),
        }
    }

    /// Structural equality. Functions and streams compare by identity.
    pub fn structural_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Vector(a), Value::Vector(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.structural_eq(y))
            }
            (Value::Record(a), Value::Record(b)) => a.structural_eq(b),
            (Value::Invokable(a), Value::Invokable(b)) => a.ptr_eq(b),
            (Value::Thunk(a), Value::Thunk(b)) => Rc::ptr_eq(a, b),
            (Value::NativeThunk(a), Value::NativeThunk(b)) => Rc::ptr_eq(a, b),
            (Value::Variant(a), Value::Variant(b)) => a.id() == b.id(),
            (Value::Tagged(a), Value::Tagged(b)) => {
                a.variant().id() == b.variant().id()
                    && a.values().len() == b.values().len()
                    && a
                        .values()
                        .iter()
                        .zip(b.values())
                        .all(|(x, y)| x.structural_eq(y))
            }
            (Value::Stream(a), Value::Stream(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Renders the value for interpolation, logging and error messages.
    pub fn show(&self) -> String {
        match self {
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::Text(text) => text.to_string(),
            Value::Vector(items) => {
                let items: Vec<String> = items.iter().map(Value::show_nested).collect();
                format!("[{}]", items.join(", "))
            }
            Value::Record(record) => {
                let pairs: Vec<String> = record
                    .iter()
                    .map(|(key, value)| format!("{key}: {}", value.show_nested()))
                    .collect();
                format!("{{{}}}", pairs.join(", "))
            }
            Value::Invokable(invokable) => {
                format!("<{} {}>", invokable.kind_name(), invokable.name())
            }
            Value::Thunk(thunk) => format!("<Thunk {}>", thunk.name()),
            Value::NativeThunk(thunk) => format!("<Thunk {}>", thunk.name()),
            Value::Variant(variant) => format!("^{}", variant.tag()),
            Value::Tagged(tagged) => {
                let values: Vec<String> = tagged.values().iter().map(Value::show_nested).collect();
                format!("^{}({})", tagged.tag(), values.join(", "))
            }
            Value::Stream(stream) => format!("<Stream {}>", stream.name()),
        }
    }

    fn show_nested(&self) -> String {
        match self {
            Value::Text(text) => format!("{:?}", text.as_str()),
            other => other.show(),
        }
    }

    /// Unwraps a stream, lifting vectors into streams of their items.
    pub fn into_stream(self, site: &str) -> Result<Stream> {
        match self {
            Value::Stream(stream) => Ok(stream),
            Value::Vector(items) => Ok(Stream::from_sequence(items)),
            other => Err(Error::type_mismatch("Stream", other.type_name().to_string(), site)),
        }
    }
}

/// Formats numbers the way users write them: integral values have no
/// fractional part.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n.is_sign_positive() {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.type_name(), self.show_nested())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.show())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.structural_eq(other)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.into())
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Value::Record(value)
    }
}

impl From<Stream> for Value {
    fn from(value: Stream) -> Self {
        Value::Stream(value)
    }
}

/// Declared shape of a native parameter or option, checked before the
/// native body runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    Any,
    Boolean,
    Number,
    Text,
    Vector,
    Record,
    Invokable,
    Stream,
    Variant,
    Tagged,
}

impl TypeTag {
    pub fn matches(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (TypeTag::Any, _)
                | (TypeTag::Boolean, Value::Boolean(_))
                | (TypeTag::Number, Value::Number(_))
                | (TypeTag::Text, Value::Text(_))
                | (TypeTag::Vector, Value::Vector(_))
                | (TypeTag::Record, Value::Record(_))
                | (TypeTag::Invokable, Value::Invokable(_))
                | (TypeTag::Stream, Value::Stream(_))
                | (TypeTag::Variant, Value::Variant(_))
                | (TypeTag::Tagged, Value::Tagged(_))
        )
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TypeTag::Any => "Any",
            TypeTag::Boolean => "Boolean",
            TypeTag::Number => "Number",
            TypeTag::Text => "Text",
            TypeTag::Vector => "Vector",
            TypeTag::Record => "Record",
            TypeTag::Invokable => "Invokable",
            TypeTag::Stream => "Stream",
            TypeTag::Variant => "Variant",
            TypeTag::Tagged => "Tagged",
        })
    }
}
