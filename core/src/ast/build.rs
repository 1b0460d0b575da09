//! Convenience constructors for building trees without a parser.
//!
//! Hosts embedding the runtime and the test suites use these to assemble
//! programs directly.

use std::rc::Rc;

use ecow::EcoString;

use super::{
    Block, DoInstruction, Expr, MatchCase, ModuleKind, Node, OpenModifier, Pattern, VectorItem,
};

pub fn var(name: &str) -> Node {
    Rc::new(Expr::Variable { name: name.into() })
}

pub fn int(value: i64) -> Node {
    Rc::new(Expr::Integer { value })
}

pub fn decimal(value: f64) -> Node {
    Rc::new(Expr::Decimal { value })
}

pub fn text(value: &str) -> Node {
    Rc::new(Expr::Text {
        value: value.into(),
    })
}

pub fn boolean(value: bool) -> Node {
    Rc::new(Expr::Boolean { value })
}

pub fn hole() -> Node {
    Rc::new(Expr::Hole)
}

pub fn vector(items: Vec<Node>) -> Node {
    Rc::new(Expr::Vector {
        items: items.into_iter().map(VectorItem::Element).collect(),
    })
}

pub fn record(pairs: Vec<(&str, Node)>) -> Node {
    Rc::new(Expr::Record {
        pairs: pairs
            .into_iter()
            .map(|(key, value)| (EcoString::from(key), value))
            .collect(),
    })
}

pub fn empty_record() -> Node {
    record(Vec::new())
}

/// A lambda whose options parameter is unused.
pub fn lambda(param: &str, body: Node) -> Node {
    lambda_with_options(param, "_", body)
}

pub fn lambda_with_options(param: &str, options: &str, body: Node) -> Node {
    Rc::new(Expr::Lambda {
        value_param: param.into(),
        options_param: options.into(),
        body,
    })
}

pub fn tagged(tag: &str, predicates: Vec<Node>) -> Node {
    Rc::new(Expr::Tagged {
        tag: tag.into(),
        predicates,
    })
}

pub fn invoke(callee: Node, input: Node) -> Node {
    invoke_with(callee, input, empty_record())
}

pub fn invoke_with(callee: Node, input: Node, options: Node) -> Node {
    Rc::new(Expr::Invoke {
        callee,
        input,
        options,
    })
}

pub fn partial(callee: Node, options: Node) -> Node {
    Rc::new(Expr::Partial { callee, options })
}

pub fn pipe(input: Node, transformation: Node) -> Node {
    Rc::new(Expr::Pipe {
        input,
        transformation,
    })
}

pub fn infix(operator: Node, left: Node, right: Node) -> Node {
    Rc::new(Expr::Infix {
        operator,
        left,
        right,
    })
}

pub fn prefix(operator: Node, operand: Node) -> Node {
    Rc::new(Expr::Prefix { operator, operand })
}

pub fn let_in(binding: &str, value: Node, body: Node) -> Node {
    Rc::new(Expr::Let {
        binding: binding.into(),
        value,
        body,
    })
}

pub fn if_then_else(condition: Node, consequent: Node, alternate: Node) -> Node {
    Rc::new(Expr::IfThenElse {
        condition,
        consequent,
        alternate,
    })
}

pub fn get(record: Node, property: &str) -> Node {
    Rc::new(Expr::Get {
        record,
        property: property.into(),
    })
}

pub fn match_with(scrutinee: Node, cases: Vec<(Pattern, Node)>) -> Node {
    Rc::new(Expr::Match {
        scrutinee,
        cases: cases
            .into_iter()
            .map(|(pattern, body)| MatchCase { pattern, body })
            .collect(),
    })
}

pub fn bind_pattern(name: &str) -> Pattern {
    Pattern::Bind { name: name.into() }
}

pub fn tagged_pattern(tag: Node, patterns: Vec<Pattern>) -> Pattern {
    Pattern::Tagged { tag, patterns }
}

pub fn open(record: Node, modifier: OpenModifier, body: Node) -> Node {
    Rc::new(Expr::Open {
        record,
        modifier,
        body,
    })
}

pub fn do_block(instructions: Vec<DoInstruction>) -> Node {
    Rc::new(Expr::Do {
        instructions: block(instructions),
    })
}

pub fn block(instructions: Vec<DoInstruction>) -> Block {
    instructions.into()
}

pub fn do_bind(name: &str, expression: Node) -> DoInstruction {
    DoInstruction::Bind {
        name: name.into(),
        expression,
    }
}

pub fn do_let(name: &str, expression: Node) -> DoInstruction {
    DoInstruction::Let {
        name: name.into(),
        expression,
    }
}

pub fn define(name: &str, value: Node) -> Node {
    Rc::new(Expr::Define {
        name: name.into(),
        value,
        documentation: None,
    })
}

pub fn import(kind: ModuleKind, path: &str, modifier: OpenModifier) -> Node {
    Rc::new(Expr::Import {
        path: path.into(),
        kind,
        modifier,
    })
}

pub fn import_as(kind: ModuleKind, path: &str, alias: &str) -> Node {
    Rc::new(Expr::ImportAliasing {
        path: path.into(),
        alias: alias.into(),
        kind,
    })
}

pub fn export(name: &str) -> Node {
    Rc::new(Expr::Export { name: name.into() })
}

pub fn export_as(name: &str, alias: &str) -> Node {
    Rc::new(Expr::ExportAliasing {
        name: name.into(),
        alias: alias.into(),
    })
}

pub fn program(declarations: Vec<Node>) -> Node {
    Rc::new(Expr::Program { declarations })
}
