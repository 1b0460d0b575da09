//! Source-like rendering of syntax trees, used in traces and diagnostics.

use std::fmt::Write;

use super::{
    DoInstruction, Expr, InterpolationPart, ModuleKind, OpenModifier, Pattern, ShellArg,
    ShellCommand, VectorItem, VectorPattern,
};

/// Renders `expr` with continuation lines indented by `indent` spaces.
pub fn pretty(expr: &Expr, indent: usize) -> String {
    let mut printer = Printer {
        out: String::new(),
        indent,
    };
    printer.expr(expr);
    printer.out
}

struct Printer {
    out: String,
    indent: usize,
}

fn is_atomic(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::Keyword { .. }
            | Expr::Text { .. }
            | Expr::Integer { .. }
            | Expr::Decimal { .. }
            | Expr::Boolean { .. }
            | Expr::Record { .. }
            | Expr::Vector { .. }
            | Expr::Variable { .. }
            | Expr::Shell { .. }
            | Expr::Get { .. }
    )
}

impl Printer {
    fn newline(&mut self, extra: usize) {
        self.out.push('\n');
        for _ in 0..self.indent + extra {
            self.out.push(' ');
        }
    }

    fn nested(&mut self, extra: usize, f: impl FnOnce(&mut Self)) {
        self.indent += extra;
        f(self);
        self.indent -= extra;
    }

    fn operand(&mut self, expr: &Expr) {
        if is_atomic(expr) {
            self.expr(expr);
        } else {
            self.out.push('(');
            self.expr(expr);
            self.out.push(')');
        }
    }

    fn text(&mut self, value: &str) {
        let _ = write!(self.out, "{value:?}");
    }

    fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Keyword { name } => {
                let _ = write!(self.out, "{name}:");
            }
            Expr::Text { value } => self.text(value),
            Expr::Character { character } => self.out.push_str(character),
            Expr::Interpolate { parts } => {
                self.out.push('"');
                for part in parts {
                    match part {
                        InterpolationPart::Text(text) => {
                            let escaped = format!("{text:?}");
                            self.out.push_str(&escaped[1..escaped.len() - 1]);
                        }
                        InterpolationPart::Expression(inner) => {
                            self.out.push('{');
                            self.expr(inner);
                            self.out.push('}');
                        }
                    }
                }
                self.out.push('"');
            }
            Expr::Integer { value } => {
                let _ = write!(self.out, "{value}");
            }
            Expr::Decimal { value } => {
                let _ = write!(self.out, "{value:?}");
            }
            Expr::Boolean { value } => {
                let _ = write!(self.out, "{value}");
            }
            Expr::Vector { items } => {
                self.out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    match item {
                        VectorItem::Element(inner) => self.expr(inner),
                        VectorItem::Spread(inner) => {
                            self.out.push_str("...");
                            self.expr(inner);
                        }
                    }
                }
                self.out.push(']');
            }
            Expr::Record { pairs } => {
                self.out.push('{');
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        self.out.push(' ');
                    }
                    let _ = write!(self.out, "{key}: ");
                    self.operand(value);
                }
                self.out.push('}');
            }
            Expr::Lambda {
                value_param,
                options_param,
                body,
            } => {
                let _ = write!(self.out, "{value_param} @{options_param} -> ");
                self.expr(body);
            }
            Expr::Tagged { tag, predicates } => {
                let _ = write!(self.out, "^{tag}");
                for predicate in predicates {
                    self.out.push(' ');
                    self.operand(predicate);
                }
            }
            Expr::Seq { items } => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.newline(0);
                    }
                    self.expr(item);
                }
            }
            Expr::Hole => self.out.push('_'),
            Expr::Variable { name } => self.out.push_str(name),
            Expr::Invoke {
                callee,
                input,
                options,
            } => {
                self.operand(callee);
                self.out.push(' ');
                self.operand(input);
                if !matches!(&**options, Expr::Record { pairs } if pairs.is_empty()) {
                    self.out.push(' ');
                    self.expr(options);
                }
            }
            Expr::Partial { callee, options } => {
                self.operand(callee);
                self.out.push_str(" _ ");
                self.expr(options);
            }
            Expr::Pipe {
                input,
                transformation,
            } => {
                self.operand(input);
                self.out.push_str(" |> ");
                self.operand(transformation);
            }
            Expr::Infix {
                operator,
                left,
                right,
            } => {
                self.operand(left);
                self.out.push_str(" `");
                self.expr(operator);
                self.out.push(' ');
                self.operand(right);
            }
            Expr::Prefix { operator, operand } => {
                self.expr(operator);
                self.out.push(' ');
                self.operand(operand);
            }
            Expr::Let {
                binding,
                value,
                body,
            } => {
                let _ = write!(self.out, "let {binding} = ");
                self.expr(value);
                self.out.push_str(" in");
                self.newline(0);
                self.expr(body);
            }
            Expr::IfThenElse {
                condition,
                consequent,
                alternate,
            } => {
                self.out.push_str("if ");
                self.expr(condition);
                self.out.push_str(" then ");
                self.expr(consequent);
                self.out.push_str(" else ");
                self.expr(alternate);
            }
            Expr::Get { record, property } => {
                self.operand(record);
                let _ = write!(self.out, ".{property}");
            }
            Expr::Match { scrutinee, cases } => {
                self.out.push_str("match ");
                self.expr(scrutinee);
                self.out.push_str(" with");
                self.nested(2, |p| {
                    for case in cases {
                        p.newline(0);
                        p.out.push_str("| ");
                        p.pattern(&case.pattern);
                        p.out.push_str(" => ");
                        p.expr(&case.body);
                    }
                });
            }
            Expr::Open {
                record,
                modifier,
                body,
            } => {
                self.out.push_str("open ");
                self.operand(record);
                self.modifier(modifier);
                self.out.push_str(" in");
                self.newline(0);
                self.expr(body);
            }
            Expr::ExprSequence { first, rest } => {
                self.expr(first);
                self.out.push(';');
                self.newline(0);
                self.expr(rest);
            }
            Expr::Shell {
                command,
                args,
                options,
            } => {
                self.out.push_str("$(");
                match command {
                    ShellCommand::Symbol(name) => self.out.push_str(name),
                    ShellCommand::Expression(inner) => self.operand(inner),
                }
                for arg in args {
                    self.out.push(' ');
                    match arg {
                        ShellArg::Symbol(name) => self.out.push_str(name),
                        ShellArg::Spread(inner) => {
                            self.out.push_str("...");
                            self.operand(inner);
                        }
                        ShellArg::Expression(inner) => self.operand(inner),
                    }
                }
                self.out.push_str(" @ ");
                self.expr(options);
                self.out.push(')');
            }
            Expr::Do { instructions } => {
                self.out.push_str("do");
                self.nested(2, |p| p.block(instructions));
            }
            Expr::Define { name, value, .. } => {
                let _ = write!(self.out, "define {name} =");
                self.nested(2, |p| {
                    p.newline(0);
                    p.expr(value);
                });
            }
            Expr::Import {
                path,
                kind,
                modifier,
            } => {
                self.import_head(*kind, path);
                self.modifier(modifier);
            }
            Expr::ImportAliasing { path, alias, kind } => {
                self.import_head(*kind, path);
                let _ = write!(self.out, " as {alias}");
            }
            Expr::Export { name } => {
                let _ = write!(self.out, "export {name}");
            }
            Expr::ExportAliasing { name, alias } => {
                let _ = write!(self.out, "export {name} as {alias}");
            }
            Expr::Program { declarations } => {
                for (i, declaration) in declarations.iter().enumerate() {
                    if i > 0 {
                        self.newline(0);
                    }
                    self.expr(declaration);
                }
            }
        }
    }

    fn import_head(&mut self, kind: ModuleKind, path: &str) {
        let _ = write!(self.out, "import {kind} ");
        self.text(path);
    }

    fn modifier(&mut self, modifier: &OpenModifier) {
        match modifier {
            OpenModifier::All => {}
            OpenModifier::Hide(names) => {
                let _ = write!(self.out, " hiding ({})", names.join(", "));
            }
            OpenModifier::Expose(pairs) => {
                self.out.push_str(" exposing (");
                for (i, (name, alias)) in pairs.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    if name == alias {
                        self.out.push_str(name);
                    } else {
                        let _ = write!(self.out, "{name} as {alias}");
                    }
                }
                self.out.push(')');
            }
        }
    }

    fn block(&mut self, instructions: &[DoInstruction]) {
        for instruction in instructions {
            self.newline(0);
            match instruction {
                DoInstruction::Call(expr) => {
                    self.out.push_str("call ");
                    self.expr(expr);
                }
                DoInstruction::Action(expr) => {
                    self.out.push_str("action ");
                    self.expr(expr);
                }
                DoInstruction::Return(expr) => {
                    self.out.push_str("return ");
                    self.expr(expr);
                }
                DoInstruction::Bind { name, expression } => {
                    let _ = write!(self.out, "bind {name} <- ");
                    self.expr(expression);
                }
                DoInstruction::Let { name, expression } => {
                    let _ = write!(self.out, "let {name} = ");
                    self.expr(expression);
                }
                DoInstruction::IfThenElse {
                    condition,
                    consequent,
                    alternate,
                } => {
                    self.out.push_str("if ");
                    self.expr(condition);
                    self.newline(0);
                    self.out.push_str("then");
                    self.nested(2, |p| p.block(consequent));
                    self.newline(0);
                    self.out.push_str("else");
                    self.nested(2, |p| p.block(alternate));
                }
            }
        }
    }

    fn pattern(&mut self, pattern: &Pattern) {
        match pattern {
            Pattern::Bind { name } => self.out.push_str(name),
            Pattern::Equals { name, expression } => {
                let _ = write!(self.out, "{name} == ");
                self.operand(expression);
            }
            Pattern::Tagged { tag, patterns } => {
                self.out.push('^');
                self.operand(tag);
                self.out.push('(');
                for (i, inner) in patterns.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    self.pattern(inner);
                }
                self.out.push(')');
            }
            Pattern::Vector { items } => {
                self.out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    match item {
                        VectorPattern::Element(inner) => self.pattern(inner),
                        VectorPattern::Spread(inner) => {
                            self.out.push_str("...");
                            self.pattern(inner);
                        }
                    }
                }
                self.out.push(']');
            }
            Pattern::Any => self.out.push('_'),
        }
    }
}
