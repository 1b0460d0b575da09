//! Unit tests for the evaluator.

use std::cell::Cell;
use std::rc::Rc;

use pretty_assertions::assert_eq;

use crate::api::{Engine, EngineOptions};
use crate::ast::build::*;
use crate::ast::{
    DoInstruction, Expr, InterpolationPart, ModuleKind, Node, OpenModifier, Pattern, ShellArg,
    ShellCommand, VectorItem, VectorPattern,
};
use crate::errors::{Error, ErrorKind, Result};
use crate::stream::Event;
use crate::values::{OptionSpec, TypeTag, Value, native};

fn engine() -> Engine {
    Engine::new(EngineOptions::default(), |_| {}).unwrap()
}

fn run_with(engine: &Engine, node: Node) -> Result<Value> {
    let module = engine.new_module("main.frp").unwrap();
    engine.evaluate(&module, &node)
}

fn run(node: Node) -> Result<Value> {
    run_with(&engine(), node)
}

/// Evaluates `declarations` as a program, then `expression` inside it.
fn run_program(declarations: Vec<Node>, expression: Node) -> Result<Value> {
    let engine = engine();
    let module = engine.run_program("main.frp", &program(declarations))?;
    engine.evaluate(&module, &expression)
}

fn number(n: f64) -> Value {
    Value::Number(n)
}

fn numbers(ns: &[f64]) -> Value {
    Value::vector(ns.iter().copied().map(Value::Number))
}

async fn values_of(value: Value) -> Vec<Value> {
    let stream = value.into_stream("test").unwrap();
    stream
        .collect()
        .await
        .unwrap()
        .into_iter()
        .map(|event| match event {
            Event::Value(value) => value,
            Event::Error(error) => panic!("unexpected error event: {error:?}"),
        })
        .collect()
}

fn add(left: Node, right: Node) -> Node {
    infix(var("+"), left, right)
}

/// A global `tick` native counting how often it runs.
fn counting_engine() -> (Engine, Rc<Cell<usize>>) {
    let count = Rc::new(Cell::new(0));
    let counter = count.clone();
    let engine = Engine::new(EngineOptions::default(), move |env| {
        env.register(
            "tick",
            native("tick", &[TypeTag::Any], &[], "", move |_, _, _| {
                counter.set(counter.get() + 1);
                Ok(Value::Number(counter.get() as f64))
            }),
        );
    })
    .unwrap();
    (engine, count)
}

// ============================================================================
// Literals and data
// ============================================================================

#[test]
fn literals() {
    assert_eq!(run(int(42)).unwrap(), number(42.0));
    assert_eq!(run(decimal(1.5)).unwrap(), number(1.5));
    assert_eq!(run(boolean(true)).unwrap(), Value::Boolean(true));
    assert_eq!(run(text("hi")).unwrap(), Value::text("hi"));
    assert_eq!(
        run(Rc::new(Expr::Keyword { name: "build".into() })).unwrap(),
        Value::text("build")
    );
}

#[test]
fn interpolation_shows_each_part() {
    let node = Rc::new(Expr::Interpolate {
        parts: vec![
            InterpolationPart::Text("n = ".into()),
            InterpolationPart::Expression(add(int(1), int(2))),
            InterpolationPart::Text(", v = ".into()),
            InterpolationPart::Expression(vector(vec![int(1), text("a")])),
        ],
    });
    assert_eq!(run(node).unwrap(), Value::text("n = 3, v = [1, \"a\"]"));
}

#[test]
fn vector_spreads_are_flattened() {
    let node = Rc::new(Expr::Vector {
        items: vec![
            VectorItem::Element(int(1)),
            VectorItem::Spread(vector(vec![int(2), int(3)])),
            VectorItem::Element(int(4)),
        ],
    });
    assert_eq!(run(node).unwrap(), numbers(&[1.0, 2.0, 3.0, 4.0]));
}

#[test]
fn spreading_a_non_vector_is_a_type_error() {
    let node = Rc::new(Expr::Vector {
        items: vec![VectorItem::Spread(int(2))],
    });
    let error = run(node).unwrap_err();
    assert!(matches!(
        error.kind(),
        ErrorKind::TypeMismatch { expected, actual, .. }
            if expected == "Vector" && actual == "Number"
    ));
}

#[test]
fn records_and_property_access() {
    let node = get(record(vec![("a", int(1)), ("b", add(int(1), int(1)))]), "b");
    assert_eq!(run(node).unwrap(), number(2.0));
}

#[test]
fn missing_property() {
    let error = run(get(record(vec![("a", int(1))]), "b")).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::MissingProperty { property } if property == "b"));
}

#[test]
fn seq_yields_the_last_item() {
    let node = Rc::new(Expr::Seq {
        items: vec![int(1), int(2), int(3)],
    });
    assert_eq!(run(node).unwrap(), number(3.0));
    let empty = Rc::new(Expr::Seq { items: Vec::new() });
    assert!(run(empty).unwrap().is_unit());
}

// ============================================================================
// Functions
// ============================================================================

#[test]
fn natives_are_curried() {
    let plus_one = run(invoke(var("+"), int(1))).unwrap();
    assert!(plus_one.as_invokable().is_some());
    assert_eq!(run(invoke(invoke(var("+"), int(1)), int(2))).unwrap(), number(3.0));
    assert_eq!(run(add(text("a"), text("b"))).unwrap(), Value::text("ab"));
}

#[test]
fn native_parameter_types_are_checked() {
    let error = run(infix(var("-"), int(1), text("x"))).unwrap_err();
    match error.kind() {
        ErrorKind::TypeMismatch { expected, actual, site } => {
            assert_eq!(expected, "Number");
            assert_eq!(actual, "Text");
            assert_eq!(site, "The 2nd parameter of -");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn invoking_a_non_invokable() {
    let error = run(invoke(int(1), int(2))).unwrap_err();
    match error.kind() {
        ErrorKind::TypeMismatch { expected, site, .. } => {
            assert_eq!(expected, "Invokable");
            assert_eq!(site, "The callee `1`");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn invocation_options_must_be_a_record() {
    let error = run(invoke_with(var("show"), int(1), int(2))).unwrap_err();
    assert!(matches!(
        error.kind(),
        ErrorKind::TypeMismatch { site, .. } if site == "The options of an invocation"
    ));
}

#[test]
fn lambdas_close_over_their_scope() {
    let node = let_in(
        "n",
        int(10),
        let_in("add-n", lambda("x", add(var("x"), var("n"))), invoke(var("add-n"), int(5))),
    );
    assert_eq!(run(node).unwrap(), number(15.0));
}

#[test]
fn lambdas_receive_options() {
    let read_option = lambda_with_options("x", "o", add(var("x"), get(var("o"), "k")));
    let direct = invoke_with(read_option.clone(), int(1), record(vec![("k", int(2))]));
    assert_eq!(run(direct).unwrap(), number(3.0));

    let fixed = invoke(partial(read_option, record(vec![("k", int(7))])), int(1));
    assert_eq!(run(fixed).unwrap(), number(8.0));
}

#[test]
fn holes_become_parameters() {
    let halve = invoke(invoke(var("/"), hole()), int(2));
    assert_eq!(run(halve.clone()).unwrap().type_name(), "Lambda");
    let node = let_in("halve", halve, invoke(var("halve"), int(10)));
    assert_eq!(run(node).unwrap(), number(5.0));
}

// ============================================================================
// Bindings
// ============================================================================

#[test]
fn let_bindings_are_evaluated_once() {
    let (engine, count) = counting_engine();
    let node = let_in("x", invoke(var("tick"), int(0)), vector(vec![var("x"), var("x")]));
    assert_eq!(run_with(&engine, node).unwrap(), numbers(&[1.0, 1.0]));
    assert_eq!(count.get(), 1);
}

#[test]
fn unused_definitions_are_never_evaluated() {
    let (engine, count) = counting_engine();
    let node = program(vec![
        define("unused", invoke(var("tick"), int(0))),
        define("used", int(1)),
    ]);
    engine.run_program("main.frp", &node).unwrap();
    assert_eq!(count.get(), 0);
}

#[test]
fn failed_definitions_are_not_retried() {
    let count = Rc::new(Cell::new(0));
    let counter = count.clone();
    let engine = Engine::new(EngineOptions::default(), move |env| {
        env.register(
            "boom",
            native("boom", &[TypeTag::Any], &[], "", move |_, _, _| {
                counter.set(counter.get() + 1);
                Err(Error::runtime("boom"))
            }),
        );
    })
    .unwrap();
    let module = engine
        .run_program("main.frp", &program(vec![define("bad", invoke(var("boom"), int(0)))]))
        .unwrap();

    let first = engine.evaluate(&module, &var("bad")).unwrap_err();
    let second = engine.evaluate(&module, &var("bad")).unwrap_err();
    assert_eq!(count.get(), 1);
    assert!(matches!(first.kind(), ErrorKind::Runtime { .. }));
    assert_eq!(first.to_string(), second.to_string());
}

#[test]
fn definitions_may_refer_to_later_ones() {
    let result = run_program(
        vec![define("a", add(var("b"), int(1))), define("b", int(41))],
        var("a"),
    );
    assert_eq!(result.unwrap(), number(42.0));
}

#[test]
fn self_referential_definition() {
    let error = run_program(vec![define("a", var("a"))], var("a")).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::CyclicDefinition { name } if name == "a"));
}

#[test]
fn redefinition_in_one_scope_fails() {
    let error = run_program(vec![define("a", int(1)), define("a", int(2))], var("a")).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::DuplicateBinding { name } if name == "a"));
}

#[test]
fn unbound_names() {
    let error = run(var("missing")).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::UnboundName { name } if name == "missing"));
}

#[test]
fn module_self_holds_the_path() {
    assert_eq!(run(get(var("self"), "path")).unwrap(), Value::text("main.frp"));
}

#[test]
fn open_brings_fields_into_scope() {
    let fields = || record(vec![("a", int(1)), ("b", int(2))]);

    let all = open(fields(), OpenModifier::All, add(var("a"), var("b")));
    assert_eq!(run(all).unwrap(), number(3.0));

    let exposed = open(
        fields(),
        OpenModifier::Expose(vec![("a".into(), "first".into())]),
        var("first"),
    );
    assert_eq!(run(exposed).unwrap(), number(1.0));

    let hidden = open(fields(), OpenModifier::Hide(vec!["a".into()]), var("a"));
    assert!(matches!(run(hidden).unwrap_err().kind(), ErrorKind::UnboundName { .. }));

    let missing = open(
        fields(),
        OpenModifier::Expose(vec![("c".into(), "c".into())]),
        int(0),
    );
    assert!(matches!(
        run(missing).unwrap_err().kind(),
        ErrorKind::MissingProperty { property } if property == "c"
    ));
}

#[test]
fn importing_a_core_module() {
    let result = run_program(
        vec![import(
            ModuleKind::Core,
            "text",
            OpenModifier::Expose(vec![("concatenate".into(), "join".into())]),
        )],
        invoke(invoke(var("join"), text("a")), text("b")),
    );
    assert_eq!(result.unwrap(), Value::text("ab"));
}

#[test]
fn aliased_imports_are_records() {
    let result = run_program(
        vec![import_as(ModuleKind::Core, "vector", "v")],
        invoke(get(var("v"), "length"), vector(vec![int(1), int(2)])),
    );
    assert_eq!(result.unwrap(), number(2.0));
}

#[test]
fn importing_an_unknown_module() {
    let error = run_program(
        vec![import(ModuleKind::Plugin, "nope", OpenModifier::All)],
        int(0),
    )
    .unwrap_err();
    assert!(matches!(
        error.kind(),
        ErrorKind::ModuleNotFound { path, kind } if path == "nope" && kind == "plugin"
    ));
}

// ============================================================================
// Conditionals and matching
// ============================================================================

#[test]
fn conditionals() {
    let node = if_then_else(infix(var("<"), int(1), int(2)), text("yes"), text("no"));
    assert_eq!(run(node).unwrap(), Value::text("yes"));
}

#[test]
fn if_requires_a_boolean() {
    let error = run(if_then_else(int(1), int(2), int(3))).unwrap_err();
    assert!(matches!(
        error.kind(),
        ErrorKind::TypeMismatch { expected, site, .. }
            if expected == "Boolean" && site == "The condition of an if expression"
    ));
}

fn point_program() -> Vec<Node> {
    vec![
        import(
            ModuleKind::Core,
            "core",
            OpenModifier::Expose(vec![("make".into(), "make".into())]),
        ),
        import(
            ModuleKind::Core,
            "predicates",
            OpenModifier::Expose(vec![("number".into(), "is-number".into())]),
        ),
        define("Point", tagged("Point", vec![var("is-number"), var("is-number")])),
        define("Other", tagged("Point", vec![var("is-number"), var("is-number")])),
    ]
}

fn make_point(x: Node, y: Node) -> Node {
    invoke(invoke(var("make"), var("Point")), vector(vec![x, y]))
}

#[test]
fn tagged_patterns_destructure_instances() {
    let node = match_with(
        make_point(int(1), int(2)),
        vec![(
            tagged_pattern(var("Point"), vec![bind_pattern("x"), bind_pattern("y")]),
            add(var("x"), var("y")),
        )],
    );
    assert_eq!(run_program(point_program(), node).unwrap(), number(3.0));
}

#[test]
fn variants_with_the_same_tag_are_distinct() {
    let node = match_with(
        make_point(int(1), int(2)),
        vec![
            (tagged_pattern(var("Other"), vec![]), text("other")),
            (tagged_pattern(var("Point"), vec![]), text("point")),
        ],
    );
    assert_eq!(run_program(point_program(), node).unwrap(), Value::text("point"));
}

#[test]
fn variant_predicates_are_checked() {
    let error = run_program(point_program(), make_point(int(1), text("y"))).unwrap_err();
    match error.kind() {
        ErrorKind::VariantConstruction { tag, message } => {
            assert_eq!(tag, "Point");
            assert_eq!(message, "the 2nd argument is not valid for this structure");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn pattern_tag_must_be_a_variant() {
    let node = match_with(int(1), vec![(tagged_pattern(int(2), vec![]), int(0))]);
    assert!(matches!(
        run(node).unwrap_err().kind(),
        ErrorKind::TypeMismatch { site, .. } if site == "The tag of a pattern"
    ));
}

#[test]
fn vector_patterns_with_a_rest() {
    let pattern = Pattern::Vector {
        items: vec![
            VectorPattern::Element(bind_pattern("head")),
            VectorPattern::Spread(bind_pattern("tail")),
        ],
    };
    let node = match_with(
        vector(vec![int(1), int(2), int(3)]),
        vec![(pattern, vector(vec![var("tail"), var("head")]))],
    );
    assert_eq!(
        run(node).unwrap(),
        Value::vector([numbers(&[2.0, 3.0]), number(1.0)])
    );
}

#[test]
fn vector_patterns_need_enough_items() {
    let pair = Pattern::Vector {
        items: vec![
            VectorPattern::Element(Pattern::Any),
            VectorPattern::Element(Pattern::Any),
        ],
    };
    let node = match_with(
        vector(vec![int(1)]),
        vec![(pair, text("pair")), (Pattern::Any, text("other"))],
    );
    assert_eq!(run(node).unwrap(), Value::text("other"));
}

#[test]
fn spread_must_come_last() {
    let pattern = Pattern::Vector {
        items: vec![
            VectorPattern::Spread(bind_pattern("init")),
            VectorPattern::Element(bind_pattern("last")),
        ],
    };
    let node = match_with(vector(vec![int(1)]), vec![(pattern, int(0))]);
    assert!(matches!(run(node).unwrap_err().kind(), ErrorKind::Assertion { .. }));
}

#[test]
fn duplicate_pattern_bindings() {
    let pattern = Pattern::Vector {
        items: vec![
            VectorPattern::Element(bind_pattern("a")),
            VectorPattern::Element(bind_pattern("a")),
        ],
    };
    let node = match_with(vector(vec![int(1), int(2)]), vec![(pattern, int(0))]);
    assert!(matches!(
        run(node).unwrap_err().kind(),
        ErrorKind::DuplicateBinding { name } if name == "a"
    ));
}

#[test]
fn equality_patterns() {
    let node = |scrutinee: i64| {
        match_with(
            int(scrutinee),
            vec![(
                Pattern::Equals {
                    name: "n".into(),
                    expression: int(4),
                },
                add(var("n"), int(1)),
            )],
        )
    };
    assert_eq!(run(node(4)).unwrap(), number(5.0));
    assert!(matches!(
        run(node(3)).unwrap_err().kind(),
        ErrorKind::PatternExhausted { value } if value == "3"
    ));
}

// ============================================================================
// Streams
// ============================================================================

#[tokio::test]
async fn pipe_flat_maps_a_vector() {
    let node = pipe(
        vector(vec![int(1), int(2)]),
        lambda("x", vector(vec![var("x"), infix(var("*"), var("x"), int(10))])),
    );
    let stream = run(node).unwrap();
    assert_eq!(values_of(stream).await, [number(1.0), number(10.0), number(2.0), number(20.0)]);
}

#[test]
fn pipe_requires_a_stream() {
    let error = run(pipe(int(1), var("of"))).unwrap_err();
    assert!(matches!(
        error.kind(),
        ErrorKind::TypeMismatch { site, .. } if site == "The input of a pipe"
    ));
}

#[tokio::test]
async fn do_blocks_bind_each_value() {
    let node = do_block(vec![
        do_bind("x", vector(vec![int(1), int(2)])),
        do_let("y", infix(var("*"), var("x"), int(10))),
        DoInstruction::IfThenElse {
            condition: infix(var(">"), var("x"), int(1)),
            consequent: block(vec![DoInstruction::Return(var("y"))]),
            alternate: block(vec![DoInstruction::Return(int(0))]),
        },
    ]);
    assert_eq!(values_of(run(node).unwrap()).await, [number(0.0), number(20.0)]);
}

#[tokio::test]
async fn do_block_actions_run_in_order() {
    let node = do_block(vec![
        DoInstruction::Action(vector(vec![int(1), int(2)])),
        DoInstruction::Call(int(3)),
        DoInstruction::Return(int(4)),
    ]);
    assert_eq!(values_of(run(node).unwrap()).await, [number(4.0)]);
}

#[test]
fn do_block_ordering_rules() {
    let cases = [
        (
            vec![DoInstruction::Return(int(1)), DoInstruction::Call(int(2))],
            "return must be the last instruction of a do block",
        ),
        (
            vec![DoInstruction::Call(int(1)), do_bind("x", vector(vec![]))],
            "a binding can't be the last instruction of a do block",
        ),
        (
            vec![
                DoInstruction::IfThenElse {
                    condition: boolean(true),
                    consequent: block(vec![]),
                    alternate: block(vec![]),
                },
                DoInstruction::Call(int(1)),
            ],
            "if must be the last instruction of a do block",
        ),
    ];
    for (instructions, expected) in cases {
        let error = run(do_block(instructions)).unwrap_err();
        match error.kind() {
            ErrorKind::Desugar { message } => assert_eq!(message, expected),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

// ============================================================================
// Shell commands
// ============================================================================

#[test]
fn shell_commands_delegate_to_the_shell_binding() {
    let engine = Engine::new(EngineOptions::default(), |env| {
        env.register(
            "shell",
            native("shell", &[TypeTag::Text], &[], "", |_, args, _| {
                let command = args[0].show();
                Ok(native(
                    "run",
                    &[TypeTag::Vector],
                    &[OptionSpec::new("cwd?", TypeTag::Text)],
                    "",
                    move |_, args, options| {
                        let words: Vec<String> = args[0]
                            .as_vector()
                            .map(|items| items.iter().map(Value::show).collect())
                            .unwrap_or_default();
                        let cwd = options.get("cwd").map(Value::show).unwrap_or_default();
                        Ok(Value::text(format!("{command} {} in {cwd}", words.join(" "))))
                    },
                ))
            }),
        );
    })
    .unwrap();

    let node = Rc::new(Expr::Shell {
        command: ShellCommand::Symbol("echo".into()),
        args: vec![
            ShellArg::Symbol("hello".into()),
            ShellArg::Spread(vector(vec![text("a"), text("b")])),
            ShellArg::Expression(add(int(1), int(2))),
        ],
        options: record(vec![("cwd", text("/tmp"))]),
    });
    assert_eq!(
        run_with(&engine, node).unwrap(),
        Value::text("echo hello a b 3 in /tmp")
    );
}

#[test]
fn shell_commands_without_a_shell() {
    let node = Rc::new(Expr::Shell {
        command: ShellCommand::Symbol("ls".into()),
        args: vec![],
        options: empty_record(),
    });
    assert!(matches!(
        run(node).unwrap_err().kind(),
        ErrorKind::UnboundName { name } if name == "shell"
    ));
}

// ============================================================================
// Limits and traces
// ============================================================================

fn nested_vectors(depth: usize) -> Node {
    (0..depth).fold(int(0), |node, _| vector(vec![node]))
}

#[test]
fn nesting_is_bounded() {
    let options = EngineOptions {
        max_depth: 5,
        ..EngineOptions::default()
    };
    let engine = Engine::new(options, |_| {}).unwrap();
    let error = run_with(&engine, nested_vectors(10)).unwrap_err();
    assert!(matches!(
        error.kind(),
        ErrorKind::ResourceExceeded { max_depth: 5, .. }
    ));
    assert!(run(nested_vectors(10)).is_ok());
}

#[test]
fn errors_carry_the_trace_of_the_failing_expression() {
    let error = run(vector(vec![int(1), var("missing")])).unwrap_err();
    let frames = error.frames();
    assert_eq!(frames[0], "in main.frp\n  : missing");
    assert!(frames.len() >= 2);
}

#[test]
fn traces_are_bounded() {
    let options = EngineOptions {
        trace_depth: 3,
        ..EngineOptions::default()
    };
    let engine = Engine::new(options, |_| {}).unwrap();
    let node = (0..10).fold(var("missing"), |node, _| vector(vec![node]));
    let error = run_with(&engine, node).unwrap_err();
    assert_eq!(error.frames().len(), 3);
}

#[test]
fn native_failures_name_the_native() {
    let error = run(infix(var("-"), int(1), text("x"))).unwrap_err();
    assert!(error.frames().iter().any(|frame| frame == "at native - in main.frp"));
}
