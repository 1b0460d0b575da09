use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use hashbrown::HashMap;
use pretty_assertions::assert_eq;

use super::*;
use crate::ast::build::*;
use crate::ast::{ModuleKind, Node, OpenModifier};
use crate::errors::{Error, ErrorKind, Result};
use crate::stdlib::native_module;
use crate::values::{TypeTag, Value, native};

fn engine() -> Engine {
    Engine::new(EngineOptions::default(), |_| {}).unwrap()
}

// ============================================================================
// In-memory sources
// ============================================================================

/// Serves module sources from a map keyed by file name. The "source text" of
/// each module is the name of a program in [`ProgramParser`].
#[derive(Clone, Default)]
struct MemoryLoader {
    files: Rc<HashMap<&'static str, &'static str>>,
}

impl MemoryLoader {
    fn new(files: &[(&'static str, &'static str)]) -> Self {
        Self {
            files: Rc::new(files.iter().copied().collect()),
        }
    }
}

impl SourceLoader for MemoryLoader {
    fn resolve(&self, directory: &Path, path: &str) -> Result<PathBuf> {
        let resolved = directory.join(path);
        let key = resolved.to_string_lossy();
        if self.files.contains_key(key.as_ref()) {
            Ok(resolved)
        } else {
            Err(Error::new(ErrorKind::ModuleNotFound {
                path: path.to_string(),
                kind: "furipota".to_string(),
            }))
        }
    }

    fn read(&self, path: &Path) -> Result<String> {
        let key = path.to_string_lossy();
        Ok(self.files.get(key.as_ref()).copied().unwrap_or_default().to_string())
    }
}

/// Hands out prebuilt programs by name and counts how often it parses.
#[derive(Clone, Default)]
struct ProgramParser {
    programs: Rc<RefCell<HashMap<String, Node>>>,
    parses: Rc<Cell<usize>>,
}

impl ProgramParser {
    fn with(self, name: &str, program: Node) -> Self {
        self.programs.borrow_mut().insert(name.to_string(), program);
        self
    }
}

impl SourceParser for ProgramParser {
    fn parse(&self, _file_name: &str, source: &str) -> Result<Node> {
        self.parses.set(self.parses.get() + 1);
        self.programs.borrow().get(source).cloned().ok_or_else(|| {
            Error::new(ErrorKind::Syntax {
                message: format!("unknown program {source}"),
                line: 1,
                column: 1,
            })
        })
    }

    fn parse_expression(&self, source: &str) -> Result<Node> {
        self.parse("<expression>", source)
    }
}

fn engine_with_sources(loader: MemoryLoader, parser: ProgramParser) -> Engine {
    Engine::new(EngineOptions::default(), move |env| {
        env.loader(loader);
        env.parser(parser);
    })
    .unwrap()
}

fn import_lib(alias: &str) -> Node {
    import_as(ModuleKind::Furipota, "lib.frp", alias)
}

// ============================================================================
// Globals and the prelude
// ============================================================================

#[test]
fn prelude_is_opened_into_the_globals() {
    let engine = engine();
    assert!(engine.global("+").is_ok());
    assert!(engine.global("from-vector").is_ok());
}

#[test]
fn prelude_can_be_disabled() {
    let options = EngineOptions {
        prelude: false,
        ..EngineOptions::default()
    };
    let engine = Engine::new(options, |_| {}).unwrap();
    assert!(matches!(
        engine.global("+").unwrap_err().kind(),
        ErrorKind::UnboundName { .. }
    ));
    assert!(engine.core_module("prelude").is_ok());
}

#[test]
fn registered_globals_are_visible_to_modules() {
    let engine = Engine::new(EngineOptions::default(), |env| {
        env.register("answer", Value::Number(42.0));
    })
    .unwrap();
    let module = engine.new_module("main.frp").unwrap();
    let sum = infix(var("+"), var("answer"), int(1));
    assert_eq!(engine.evaluate(&module, &sum).unwrap(), Value::Number(43.0));
}

#[test]
fn globals_clashing_with_the_prelude_fail() {
    let result = Engine::new(EngineOptions::default(), |env| {
        env.register("+", Value::Number(0.0));
    });
    assert!(matches!(
        result.err().map(|error| error.kind.clone()).as_deref(),
        Some(ErrorKind::DuplicateBinding { .. })
    ));
}

#[test]
fn modules_do_not_leak_definitions() {
    let engine = engine();
    engine
        .run_program("a.frp", &program(vec![define("private", int(1))]))
        .unwrap();
    let other = engine.new_module("b.frp").unwrap();
    assert!(engine.evaluate(&other, &var("private")).is_err());
}

// ============================================================================
// Core modules and plugins
// ============================================================================

fn counted_module(
    builds: Rc<Cell<usize>>,
) -> impl Fn(&Engine) -> Result<Rc<crate::module::Module>> {
    move |engine: &Engine| {
        builds.set(builds.get() + 1);
        native_module(
            engine,
            "counted",
            vec![("build", Value::Number(builds.get() as f64))],
        )
    }
}

#[test]
fn core_modules_are_built_once() {
    let builds = Rc::new(Cell::new(0));
    let factory = counted_module(builds.clone());
    let engine = Engine::new(EngineOptions::default(), move |env| {
        env.core_module("counted", factory)
    })
    .unwrap();

    let first = engine.core_module("counted").unwrap();
    let second = engine.core_module("counted").unwrap();
    assert!(Rc::ptr_eq(&first, &second));
    assert_eq!(builds.get(), 1);
}

#[test]
fn plugins_are_loaded_on_every_import() {
    let builds = Rc::new(Cell::new(0));
    let factory = counted_module(builds.clone());
    let engine = Engine::new(EngineOptions::default(), move |env| env.plugin("counted", factory))
        .unwrap();

    let node = program(vec![
        import_as(ModuleKind::Plugin, "counted", "first"),
        import_as(ModuleKind::Plugin, "counted", "second"),
    ]);
    let module = engine.run_program("main.frp", &node).unwrap();
    assert_eq!(builds.get(), 2);

    let read = vector(vec![get(var("first"), "build"), get(var("second"), "build")]);
    assert_eq!(
        engine.evaluate(&module, &read).unwrap(),
        Value::vector([Value::Number(1.0), Value::Number(2.0)])
    );
}

#[test]
fn host_core_modules_replace_standard_ones() {
    let engine = Engine::new(EngineOptions::default(), |env| {
        env.core_module("text", |engine| {
            native_module(
                engine,
                "text",
                vec![(
                    "shout",
                    native("shout", &[TypeTag::Text], &[], "", |_, args, _| {
                        Ok(Value::text(args[0].show().to_uppercase()))
                    }),
                )],
            )
        });
    })
    .unwrap();
    let module = engine
        .run_program(
            "main.frp",
            &program(vec![import(ModuleKind::Core, "text", OpenModifier::All)]),
        )
        .unwrap();
    assert_eq!(
        engine.evaluate(&module, &invoke(var("shout"), text("hi"))).unwrap(),
        Value::text("HI")
    );
}

#[test]
fn unknown_core_module() {
    let error = engine().core_module("nope").unwrap_err();
    assert_eq!(error.to_string(), "ModuleNotFoundError: No core module found for nope");
}

// ============================================================================
// Furipota modules
// ============================================================================

fn library() -> Node {
    program(vec![
        define("double", lambda("x", infix(var("*"), var("x"), int(2)))),
        define("where", get(var("self"), "path")),
        export("double"),
        export_as("where", "location"),
    ])
}

#[test]
fn source_modules_are_parsed_once_and_cached() {
    let parser = ProgramParser::default().with("library", library());
    let parses = parser.parses.clone();
    let engine = engine_with_sources(MemoryLoader::new(&[("lib.frp", "library")]), parser);

    let node = program(vec![import_lib("a"), import_lib("b")]);
    let module = engine.run_program("main.frp", &node).unwrap();
    assert_eq!(parses.get(), 1);

    let doubled = invoke(get(var("a"), "double"), int(21));
    assert_eq!(engine.evaluate(&module, &doubled).unwrap(), Value::Number(42.0));
    let location = get(var("b"), "location");
    assert_eq!(engine.evaluate(&module, &location).unwrap(), Value::text("lib.frp"));
}

#[test]
fn imports_only_see_exports() {
    let parser = ProgramParser::default().with("library", library());
    let engine = engine_with_sources(MemoryLoader::new(&[("lib.frp", "library")]), parser);

    let node = program(vec![import(ModuleKind::Furipota, "lib.frp", OpenModifier::All)]);
    let module = engine.run_program("main.frp", &node).unwrap();
    assert!(engine.evaluate(&module, &var("double")).is_ok());
    assert!(engine.evaluate(&module, &var("location")).is_ok());
    assert!(matches!(
        engine.evaluate(&module, &var("where")).unwrap_err().kind(),
        ErrorKind::UnboundName { .. }
    ));
}

#[test]
fn failed_modules_are_not_cached() {
    let parser = ProgramParser::default().with(
        "broken",
        program(vec![define("x", int(1)), define("x", int(2))]),
    );
    let parses = parser.parses.clone();
    let engine = engine_with_sources(MemoryLoader::new(&[("lib.frp", "broken")]), parser);

    for attempt in 1..=2 {
        let error = engine
            .run_program("main.frp", &program(vec![import_lib("lib")]))
            .unwrap_err();
        assert!(matches!(error.kind(), ErrorKind::DuplicateBinding { .. }));
        assert_eq!(parses.get(), attempt);
    }
}

#[test]
fn cyclic_imports_see_the_partial_module() {
    let parser = ProgramParser::default()
        .with(
            "a",
            program(vec![
                define("a-value", int(1)),
                export("a-value"),
                import_as(ModuleKind::Furipota, "b.frp", "b"),
                define("from-b", get(var("b"), "b-value")),
                export("from-b"),
            ]),
        )
        .with(
            "b",
            program(vec![
                import_as(ModuleKind::Furipota, "a.frp", "a"),
                define("b-value", int(2)),
                export("b-value"),
            ]),
        );
    let parses = parser.parses.clone();
    let engine = engine_with_sources(MemoryLoader::new(&[("a.frp", "a"), ("b.frp", "b")]), parser);

    let node = program(vec![import(ModuleKind::Furipota, "a.frp", OpenModifier::All)]);
    let module = engine.run_program("main.frp", &node).unwrap();
    assert_eq!(parses.get(), 2);
    assert_eq!(engine.evaluate(&module, &var("from-b")).unwrap(), Value::Number(2.0));
}

#[test]
fn missing_source_modules() {
    let engine = engine_with_sources(MemoryLoader::default(), ProgramParser::default());
    let error = engine
        .run_program("main.frp", &program(vec![import_lib("lib")]))
        .unwrap_err();
    assert!(matches!(
        error.kind(),
        ErrorKind::ModuleNotFound { path, .. } if path == "lib.frp"
    ));
    assert!(!error.frames().is_empty());
}

#[test]
fn source_modules_need_a_parser() {
    let engine = Engine::new(EngineOptions::default(), |env| {
        env.loader(MemoryLoader::new(&[("lib.frp", "library")]));
    })
    .unwrap();
    let error = engine
        .run_program("main.frp", &program(vec![import_lib("lib")]))
        .unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::Runtime { .. }));
}

#[test]
fn evaluating_source_text() {
    let parser = ProgramParser::default().with("one plus one", infix(var("+"), int(1), int(1)));
    let engine = engine_with_sources(MemoryLoader::default(), parser);
    let module = engine.new_module("repl.frp").unwrap();
    assert_eq!(
        engine.evaluate_source(&module, "one plus one").unwrap(),
        Value::Number(2.0)
    );
    assert!(matches!(
        engine.evaluate_source(&module, "gibberish").unwrap_err().kind(),
        ErrorKind::Syntax { .. }
    ));
}
