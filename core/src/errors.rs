//! Error types shared by every stage of the runtime.
//!
//! An [`Error`] carries its [`ErrorKind`] plus, once it has crossed an
//! evaluation boundary, the trace frames that were active when it was raised.
//! Errors are enriched at most once: the innermost frame that observes an
//! untraced error attaches its trace, and every outer frame leaves it alone.

use std::fmt;
use std::sync::Arc;

use ecow::EcoString;
use thiserror::Error as ThisError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone)]
pub struct Error {
    pub kind: Arc<ErrorKind>,
    /// Formatted frames, most recent first. `None` until the error is traced.
    pub trace: Option<Vec<String>>,
    /// Host-level detail, only shown when the engine runs in debug mode.
    pub host: Option<String>,
}

#[derive(Debug, ThisError)]
pub enum ErrorKind {
    #[error("{message} (at line {line}, column {column})")]
    Syntax {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("{message}")]
    Desugar { message: String },

    #[error("No binding defined for {name}")]
    UnboundName { name: EcoString },

    #[error("{name} is already defined in this scope")]
    DuplicateBinding { name: EcoString },

    #[error("{site} expects a value of type {expected}, but got {actual} instead")]
    TypeMismatch {
        expected: String,
        actual: String,
        site: String,
    },

    #[error("Could not construct ^{tag}: {message}")]
    VariantConstruction { tag: EcoString, message: String },

    #[error("Could not match {value} against any of the provided patterns")]
    PatternExhausted { value: String },

    #[error("{message}")]
    Assertion { message: String },

    #[error("{message}")]
    Runtime { message: String },

    #[error("No property {property} in the record")]
    MissingProperty { property: EcoString },

    #[error("The definition of {name} depends on itself")]
    CyclicDefinition { name: EcoString },

    #[error("No {kind} module found for {path}")]
    ModuleNotFound { path: String, kind: String },

    #[error("The stream {stream} is already running")]
    StreamAlreadyRunning { stream: EcoString },

    #[error("Evaluation nested deeper than {max_depth} levels")]
    ResourceExceeded { depth: usize, max_depth: usize },

    #[error("Could not read {path}: {reason}")]
    Io { path: String, reason: String },
}

impl ErrorKind {
    /// The user-facing category name, printed before the message.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Syntax { .. } | ErrorKind::Desugar { .. } => "SyntaxError",
            ErrorKind::UnboundName { .. } => "UnboundNameError",
            ErrorKind::DuplicateBinding { .. } => "DuplicateBindingError",
            ErrorKind::TypeMismatch { .. } => "TypeMismatchError",
            ErrorKind::VariantConstruction { .. } => "VariantConstructionError",
            ErrorKind::PatternExhausted { .. } => "PatternExhaustedError",
            ErrorKind::Assertion { .. } => "AssertionError",
            ErrorKind::Runtime { .. } => "RuntimeError",
            ErrorKind::MissingProperty { .. } => "MissingPropertyError",
            ErrorKind::CyclicDefinition { .. } => "CyclicDefinitionError",
            ErrorKind::ModuleNotFound { .. } => "ModuleNotFoundError",
            ErrorKind::StreamAlreadyRunning { .. } => "StreamAlreadyRunningError",
            ErrorKind::ResourceExceeded { .. } => "ResourceExceededError",
            ErrorKind::Io { .. } => "IoError",
        }
    }
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind: Arc::new(kind),
            trace: None,
            host: None,
        }
    }

    pub fn assertion(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Assertion {
            message: message.into(),
        })
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Runtime {
            message: message.into(),
        })
    }

    pub fn desugar(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Desugar {
            message: message.into(),
        })
    }

    pub fn type_mismatch(
        expected: impl Into<String>,
        actual: impl Into<String>,
        site: impl Into<String>,
    ) -> Self {
        Self::new(ErrorKind::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
            site: site.into(),
        })
    }

    pub fn with_host(mut self, detail: impl Into<String>) -> Self {
        self.host = Some(detail.into());
        self
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn is_traced(&self) -> bool {
        self.trace.is_some()
    }

    /// Attaches `frames` unless the error already carries a trace.
    pub fn with_trace(mut self, frames: Vec<String>) -> Self {
        if self.trace.is_none() {
            self.trace = Some(frames);
        }
        self
    }

    pub fn frames(&self) -> &[String] {
        self.trace.as_deref().unwrap_or(&[])
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.name(), self.kind)
    }
}

impl std::error::Error for Error {}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::new(kind)
    }
}

/// Formats a 1-based position as an English ordinal ("1st", "2nd", "11th").
pub fn ordinal(n: usize) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}
