// Integration tests for the pseudocode front end

use std::cell::RefCell;

use algoritmo::checker::TypeError;
use algoritmo::compile;
use algoritmo::events::{Event, EventEmitter, EventKind};
use algoritmo::lowering::graph::{Action, LoopKind, Node, NodeId};
use algoritmo::lowering::{LoweredModule, Program};
use algoritmo::memory::value::Value;
use algoritmo::parser::ast::{AtomicType, ModuleKind, Operator, Type};
use algoritmo::pipeline::{CompileError, Stage};

const PROGRAM: &str = "\
// Factoriales de 1 a 3, intercambiados
entero funcion factorial(entero n)
  entero i, r
inicio
  r <- 1
  para i <- 2 hasta n
    r <- r * i
  finpara
  retornar r
finfuncion

procedimiento intercambiar(ref entero a, ref entero b)
  entero t
inicio
  t <- a
  a <- b
  b <- t
finprocedimiento

variables
  entero v[3], k
  real promedio
inicio
  para k <- 0 hasta 2
    v[k] <- factorial(k + 1)
  finpara
  intercambiar(v[0], v[2])
  promedio <- (v[0] + v[1] + v[2]) / 3
  si promedio > 2 and not (v[0] = 1) entonces
    escribir_linea(\"promedio: \", promedio)
  sino
    escribir_linea(\"ninguno\")
  finsi
  repetir
    k <- k - 1
  hasta que k <= 0
fin
";

fn compile_quietly(source: &str) -> Result<Program, CompileError> {
    let mut events = EventEmitter::new();
    compile(source, &mut events)
}

fn type_reasons(error: &CompileError) -> Vec<(String, &'static str)> {
    match error {
        CompileError::Type(reports) => reports
            .iter()
            .flat_map(|r| r.errors.iter().map(|e| (r.module.clone(), e.reason())))
            .collect(),
        other => panic!("Expected type errors, got {:?}", other),
    }
}

/// Follow structural next from the entry, stopping at the first revisit
fn walk(module: &LoweredModule) -> Vec<NodeId> {
    let mut seen = Vec::new();
    let mut current = module.entry;
    while let Some(id) = current {
        if seen.contains(&id) {
            break;
        }
        seen.push(id);
        current = module.graph[id].structural_next();
    }
    seen
}

#[test]
fn test_full_program_compiles() {
    let program = compile_quietly(PROGRAM).expect("Compilation failed");

    assert_eq!(program.modules.len(), 2);
    assert_eq!(program.main.kind, ModuleKind::Main);

    let factorial = program.module("factorial").expect("factorial missing");
    assert_eq!(
        factorial.kind,
        ModuleKind::Function {
            return_type: AtomicType::Integer
        }
    );
    assert_eq!(factorial.parameters.len(), 1);
    assert!(factorial.locals.contains("n"));
    assert!(factorial.locals.contains("r"));

    let swap = program.module("intercambiar").expect("intercambiar missing");
    assert_eq!(swap.kind, ModuleKind::Procedure);
    assert!(swap.parameters.iter().all(|p| p.by_reference));

    assert!(program.module("principal").is_some());
    assert!(program.module("desconocido").is_none());
}

#[test]
fn test_arrays_are_allocated() {
    let program = compile_quietly(PROGRAM).unwrap();
    let v = program.main.locals.get("v").unwrap();

    assert_eq!(v.ty(), Type::with_dimensions(AtomicType::Integer, &[3]));
    assert_eq!(
        v.values.as_deref(),
        Some(&[Value::Uninitialized, Value::Uninitialized, Value::Uninitialized][..])
    );
    assert!(program.main.locals.get("k").unwrap().values.is_none());
}

#[test]
fn test_main_structure() {
    let program = compile_quietly(PROGRAM).unwrap();
    let main = &program.main;

    let kinds: Vec<&str> = walk(main)
        .into_iter()
        .map(|id| match &main.graph[id] {
            Node::Generic { .. } => "generic",
            Node::Branch { .. } => "branch",
            Node::Loop { kind: LoopKind::While, .. } => "while",
            Node::Loop { kind: LoopKind::Until, .. } => "until",
        })
        .collect();

    assert_eq!(kinds[0..3], ["generic", "generic", "while"]);
    assert!(kinds.contains(&"branch"));
    assert_eq!(kinds.last(), Some(&"until"));
}

#[test]
fn test_until_condition_is_negated() {
    let program = compile_quietly(PROGRAM).unwrap();
    let main = &program.main;
    let last = *walk(main).last().unwrap();

    match &main.graph[last] {
        Node::Loop {
            kind: LoopKind::Until,
            condition,
            body_head,
            next,
            ..
        } => {
            assert_eq!(
                condition,
                &vec![
                    Action::Load("k".to_string()),
                    Action::Push(Value::Integer(0)),
                    Action::Apply(Operator::LessEqual),
                    Action::Apply(Operator::Not),
                ]
            );
            assert!(body_head.is_some());
            assert_eq!(*next, None);
        }
        other => panic!("Expected until loop, got {:?}", other),
    }
}

#[test]
fn test_function_result_is_stored_not_discarded() {
    let program = compile_quietly(PROGRAM).unwrap();
    let main = &program.main;

    let calls: Vec<&Action> = main
        .graph
        .iter()
        .filter_map(|(_, node)| match node {
            Node::Generic { action, .. } => Some(action),
            _ => None,
        })
        .filter(|action| matches!(action, Action::ModuleCall { .. } | Action::Discard))
        .collect();

    assert_eq!(
        calls,
        vec![
            &Action::ModuleCall {
                name: "factorial".to_string(),
                args: 1
            },
            &Action::ModuleCall {
                name: "intercambiar".to_string(),
                args: 2
            },
            &Action::ModuleCall {
                name: "escribir_linea".to_string(),
                args: 2
            },
            &Action::ModuleCall {
                name: "escribir_linea".to_string(),
                args: 1
            },
        ]
    );
}

#[test]
fn test_real_into_integer_is_rejected() {
    let source = "variables\n  entero n\ninicio\n  n <- 7 / 2\nfin";
    let error = compile_quietly(source).unwrap_err();

    assert_eq!(error.stage(), Stage::Type);
    match &error {
        CompileError::Type(reports) => match &reports[0].errors[0] {
            TypeError::AssignmentIncompatibleTypes {
                expected,
                received,
                location,
            } => {
                assert_eq!(expected, "entero");
                assert_eq!(received, "real");
                assert_eq!(location.line, 4);
            }
            other => panic!("Expected assignment error, got {:?}", other),
        },
        other => panic!("Expected type errors, got {:?}", other),
    }
}

#[test]
fn test_integer_into_real_is_accepted() {
    let source = "variables\n  real x\n  entero n\ninicio\n  n <- 4\n  x <- n div 3\nfin";
    assert!(compile_quietly(source).is_ok());
}

#[test]
fn test_character_literal_matches_its_type() {
    let program = compile_quietly("variables\n  caracter c\ninicio\n  c <- \"a\"\nfin").unwrap();
    let main = &program.main;
    let entry = main.entry.unwrap();

    match &main.graph[entry] {
        Node::Generic { action, .. } => assert_eq!(action, &Action::Push(Value::Character('a'))),
        other => panic!("Expected generic node, got {:?}", other),
    }

    let error = compile_quietly("variables\n  caracter c\ninicio\n  c <- \"ab\"\nfin").unwrap_err();
    assert_eq!(
        type_reasons(&error),
        vec![("principal".to_string(), "assignment-incompatible-types")]
    );
}

#[test]
fn test_oversized_array_is_a_syntax_error() {
    let error = compile_quietly("variables\n  entero v[4294967296, 4294967296]\ninicio\nfin\n").unwrap_err();
    match error {
        CompileError::Syntax(error) => assert_eq!(error.reason(), Some("array-too-large")),
        other => panic!("Expected syntax error, got {:?}", other),
    }
}

#[test]
fn test_for_goal_must_be_integer() {
    let source = "variables\n  entero i\ninicio\n  para i <- 0 hasta 2.5\n    escribir(i)\n  finpara\nfin";
    let error = compile_quietly(source).unwrap_err();

    assert_eq!(
        type_reasons(&error),
        vec![("principal".to_string(), "for-non-integer-goal")]
    );
}

#[test]
fn test_type_errors_are_grouped_by_module() {
    let source = "\
logico funcion positivo(entero x)
inicio
  retornar x
finfuncion

variables
  entero n
inicio
  n <- positivo(1.5)
  y <- 2
fin";
    let error = compile_quietly(source).unwrap_err();
    let reasons = type_reasons(&error);

    assert!(reasons.contains(&("positivo".to_string(), "function-bad-return-type")));
    assert!(reasons.contains(&("principal".to_string(), "call-wrong-argument-type")));
    assert!(reasons.contains(&("principal".to_string(), "undefined-variable")));
    assert!(error.to_string().starts_with("type errors in"));
}

#[test]
fn test_lexical_errors_are_all_reported() {
    let source = "variables\ninicio\n  x <- 1 @ 2.a\n  s <- \"abc\nfin";
    let error = compile_quietly(source).unwrap_err();

    match error {
        CompileError::Lexical(errors) => {
            let reasons: Vec<_> = errors.iter().map(|e| e.kind.reason()).collect();
            assert_eq!(
                reasons,
                vec!["unknownToken", "unexpectedCharAtFloat", "unexpectedCharAtString"]
            );
            assert_eq!(errors[0].unexpected, Some('@'));
            assert_eq!(errors[0].location.line, 3);
            assert_eq!(errors[0].location.column, 10);
        }
        other => panic!("Expected lexical errors, got {:?}", other),
    }
}

#[test]
fn test_syntax_error_stops_at_first_problem() {
    let cases = [
        ("variables\ninicio\n  mientras verdadero\n  finmientras\nfin", "empty-loop-body"),
        ("variables\ninicio\n  x <- (1 + 2\nfin", "mismatched-parenthesis"),
        ("variables\ninicio\n  si x entonces\n    x <- 1\nfin", "missing-finsi"),
        ("variables\ninicio\n  repetir\n    x <- 1\n  hasta x\nfin", "missing-que"),
        ("variables\ninicio\n  x = 1\nfin", "bad-assignment-operator"),
        ("procedimiento p()\ninicio\nfinprocedimiento\n", "missing-main"),
    ];

    for (source, expected) in cases {
        match compile_quietly(source) {
            Err(CompileError::Syntax(error)) => {
                assert_eq!(error.reason(), Some(expected), "source: {:?}", source)
            }
            other => panic!("Expected {} for {:?}, got {:?}", expected, source, other),
        }
    }
}

#[test]
fn test_events_are_broadcast_in_order() {
    let log = RefCell::new(Vec::new());
    let lexical = RefCell::new(0);

    {
        let mut events = EventEmitter::new();
        events.on_any(|event| log.borrow_mut().push(format!("any:{}", event.kind())));
        events.on(EventKind::LexicalError, |event| {
            if let Event::LexicalError(_) = event {
                *lexical.borrow_mut() += 1;
            }
        });
        events.on(EventKind::ParsingFinished, |event| {
            if let Event::ParsingFinished { success } = event {
                log.borrow_mut().push(format!("finished:{}", success));
            }
        });

        let result = compile("variables\ninicio\n  x <- # $\nfin", &mut events);
        assert!(matches!(result, Err(CompileError::Lexical(_))));
    }

    assert_eq!(*lexical.borrow(), 2);
    assert_eq!(
        *log.borrow(),
        vec![
            "any:parsing-started",
            "any:lexical-error",
            "any:lexical-error",
            "any:parsing-finished",
            "finished:false",
        ]
    );
}

#[test]
fn test_successful_compile_reports_success() {
    let finished = RefCell::new(None);
    {
        let mut events = EventEmitter::new();
        events.on(EventKind::ParsingFinished, |event| {
            if let Event::ParsingFinished { success } = event {
                *finished.borrow_mut() = Some(*success);
            }
        });
        if let Err(error) = compile(PROGRAM, &mut events) {
            panic!("Compilation failed: {}", error);
        }
    }
    assert_eq!(*finished.borrow(), Some(true));
}

#[test]
fn test_graph_listing() {
    let program = compile_quietly("variables\n  entero x\ninicio\n  x <- 2 + 3\nfin").unwrap();
    let listing = program.main.to_string();

    assert!(listing.starts_with("principal (entry #0)"));
    assert!(listing.contains("var x: entero"));
    assert!(listing.contains("push 2"));
    assert!(listing.contains("assign x 0"));
}
