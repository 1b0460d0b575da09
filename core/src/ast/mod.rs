//! The furipota abstract syntax tree.
//!
//! Every node is an immutable [`Expr`] behind an [`Rc`], so passes and the
//! evaluator share subtrees freely. Nodes are produced by a host-supplied
//! parser (see [`crate::api::SourceParser`]), by the builders in [`build`],
//! or by decoding a tree previously written with [`encode`].

pub mod build;
mod fold;
mod pretty;

pub use fold::map_children;
pub use pretty::pretty;

use std::fmt;
use std::rc::Rc;

use ecow::EcoString;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

pub type Node = Rc<Expr>;

/// A list of do-block instructions. Shared so that continuations of a block
/// can outlive the evaluation of the block node itself.
pub type Block = Rc<[DoInstruction]>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    // Literals
    Keyword { name: EcoString },
    Text { value: EcoString },
    Character { character: EcoString },
    Interpolate { parts: Vec<InterpolationPart> },
    Integer { value: i64 },
    Decimal { value: f64 },
    Boolean { value: bool },
    Vector { items: Vec<VectorItem> },
    Record { pairs: Vec<(EcoString, Node)> },
    Lambda {
        value_param: EcoString,
        options_param: EcoString,
        body: Node,
    },
    Tagged { tag: EcoString, predicates: Vec<Node> },

    // Expressions
    Seq { items: Vec<Node> },
    Hole,
    Variable { name: EcoString },
    Invoke { callee: Node, input: Node, options: Node },
    Partial { callee: Node, options: Node },
    Pipe { input: Node, transformation: Node },
    Infix { operator: Node, left: Node, right: Node },
    Prefix { operator: Node, operand: Node },
    Let {
        binding: EcoString,
        value: Node,
        body: Node,
    },
    IfThenElse {
        condition: Node,
        consequent: Node,
        alternate: Node,
    },
    Get { record: Node, property: EcoString },
    Match { scrutinee: Node, cases: Vec<MatchCase> },
    Open {
        record: Node,
        modifier: OpenModifier,
        body: Node,
    },
    ExprSequence { first: Node, rest: Node },
    Shell {
        command: ShellCommand,
        args: Vec<ShellArg>,
        options: Node,
    },
    Do { instructions: Block },

    // Declarations
    Define {
        name: EcoString,
        value: Node,
        documentation: Option<EcoString>,
    },
    Import {
        path: EcoString,
        kind: ModuleKind,
        modifier: OpenModifier,
    },
    ImportAliasing {
        path: EcoString,
        alias: EcoString,
        kind: ModuleKind,
    },
    Export { name: EcoString },
    ExportAliasing { name: EcoString, alias: EcoString },
    Program { declarations: Vec<Node> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InterpolationPart {
    Text(EcoString),
    Expression(Node),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VectorItem {
    Element(Node),
    Spread(Node),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCase {
    pub pattern: Pattern,
    pub body: Node,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Pattern {
    /// Binds the whole value to a name.
    Bind { name: EcoString },
    /// Matches when the value is structurally equal to `expression`.
    Equals { name: EcoString, expression: Node },
    /// Matches an instance of the variant `tag` evaluates to.
    Tagged { tag: Node, patterns: Vec<Pattern> },
    Vector { items: Vec<VectorPattern> },
    Any,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VectorPattern {
    Element(Pattern),
    Spread(Pattern),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DoInstruction {
    /// Evaluates an expression for its effects, ignoring the result.
    Call(Node),
    /// Runs a stream to completion before the rest of the block.
    Action(Node),
    Return(Node),
    Bind { name: EcoString, expression: Node },
    Let { name: EcoString, expression: Node },
    IfThenElse {
        condition: Node,
        consequent: Block,
        alternate: Block,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OpenModifier {
    All,
    Hide(Vec<EcoString>),
    /// Pairs of `(name, alias)`.
    Expose(Vec<(EcoString, EcoString)>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleKind {
    Core,
    Plugin,
    Furipota,
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ModuleKind::Core => "core",
            ModuleKind::Plugin => "plugin",
            ModuleKind::Furipota => "furipota",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShellCommand {
    Symbol(EcoString),
    Expression(Node),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShellArg {
    Symbol(EcoString),
    Spread(Node),
    Expression(Node),
}

impl Expr {
    /// The constructor name, used when an unexpected node reaches a pass.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Keyword { .. } => "Keyword",
            Expr::Text { .. } => "Text",
            Expr::Character { .. } => "Character",
            Expr::Interpolate { .. } => "Interpolate",
            Expr::Integer { .. } => "Integer",
            Expr::Decimal { .. } => "Decimal",
            Expr::Boolean { .. } => "Boolean",
            Expr::Vector { .. } => "Vector",
            Expr::Record { .. } => "Record",
            Expr::Lambda { .. } => "Lambda",
            Expr::Tagged { .. } => "Tagged",
            Expr::Seq { .. } => "Seq",
            Expr::Hole => "Hole",
            Expr::Variable { .. } => "Variable",
            Expr::Invoke { .. } => "Invoke",
            Expr::Partial { .. } => "Partial",
            Expr::Pipe { .. } => "Pipe",
            Expr::Infix { .. } => "Infix",
            Expr::Prefix { .. } => "Prefix",
            Expr::Let { .. } => "Let",
            Expr::IfThenElse { .. } => "IfThenElse",
            Expr::Get { .. } => "Get",
            Expr::Match { .. } => "Match",
            Expr::Open { .. } => "Open",
            Expr::ExprSequence { .. } => "ExprSequence",
            Expr::Shell { .. } => "Shell",
            Expr::Do { .. } => "Do",
            Expr::Define { .. } => "Define",
            Expr::Import { .. } => "Import",
            Expr::ImportAliasing { .. } => "ImportAliasing",
            Expr::Export { .. } => "Export",
            Expr::ExportAliasing { .. } => "ExportAliasing",
            Expr::Program { .. } => "Program",
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&pretty(self, 0))
    }
}

/// Serializes a tree to the compact postcard encoding.
pub fn encode(node: &Expr) -> Result<Vec<u8>> {
    postcard::to_allocvec(node).map_err(|err| {
        Error::runtime("Could not encode the syntax tree").with_host(err.to_string())
    })
}

/// Reads a tree previously written by [`encode`].
pub fn decode(bytes: &[u8]) -> Result<Node> {
    postcard::from_bytes::<Expr>(bytes)
        .map(Rc::new)
        .map_err(|err| {
            Error::runtime("Could not decode the syntax tree").with_host(err.to_string())
        })
}
