//! Control-flow lowering
//!
//! Turns type-checked modules into executable node graphs:
//! - [`graph`]: nodes, actions, selectors and the per-module arena
//! - `expressions`: element sequences → actions
//! - `statements`: statements → chains of nodes
//!
//! Lowering only runs on modules that passed the checker, so it has no error
//! path of its own.

pub mod graph;
mod expressions;
mod statements;

use crate::checker::{ScopedModule, Signatures};
use crate::memory::locals::SymbolTable;
use crate::parser::ast::{Module, ModuleKind, Parameter};
use graph::{Graph, NodeId};
use rustc_hash::FxHashMap;
use std::fmt;

/// A module ready for the evaluator
#[derive(Debug, Clone, PartialEq)]
pub struct LoweredModule {
    pub name: String,
    pub kind: ModuleKind,
    pub parameters: Vec<Parameter>,
    pub locals: SymbolTable,
    pub graph: Graph,
    /// First node to run; `None` for an empty body
    pub entry: Option<NodeId>,
}

impl fmt::Display for LoweredModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entry = self.entry.map_or_else(|| "end".to_string(), |id| id.to_string());
        writeln!(f, "{} (entry {})", self.name, entry)?;
        for var in self.locals.iter() {
            writeln!(f, "  var {}: {}", var.name, var.ty())?;
        }
        write!(f, "{}", self.graph)
    }
}

/// The lowered program: the main module plus procedures and functions by name
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub main: LoweredModule,
    pub modules: FxHashMap<String, LoweredModule>,
}

impl Program {
    pub fn module(&self, name: &str) -> Option<&LoweredModule> {
        if name == Module::MAIN {
            Some(&self.main)
        } else {
            self.modules.get(name)
        }
    }
}

/// Builds one module's graph
pub(crate) struct Lowerer<'a> {
    pub(crate) graph: Graph,
    pub(crate) signatures: &'a Signatures,
}

/// Lower one checked module and allocate its array storage
pub fn lower_module(scoped: ScopedModule, signatures: &Signatures) -> LoweredModule {
    let ScopedModule {
        module, mut locals, ..
    } = scoped;

    let mut lowerer = Lowerer {
        graph: Graph::new(),
        signatures,
    };
    let chain = lowerer.lower_statements(&module.body);
    locals.allocate_arrays();

    tracing::trace!(module = %module.name, nodes = lowerer.graph.len(), "lowered module");

    LoweredModule {
        name: module.name,
        kind: module.kind,
        parameters: module.parameters,
        locals,
        graph: lowerer.graph,
        entry: chain.head,
    }
}

/// Lower the main module and every procedure and function
pub fn lower_program(
    main: ScopedModule,
    subprograms: Vec<ScopedModule>,
    signatures: &Signatures,
) -> Program {
    let main = lower_module(main, signatures);
    let modules = subprograms
        .into_iter()
        .map(|scoped| lower_module(scoped, signatures))
        .map(|module| (module.name.clone(), module))
        .collect();

    Program { main, modules }
}

#[cfg(test)]
mod tests {
    use super::graph::{Action, LoopKind, Node};
    use super::*;
    use crate::checker::signatures;
    use crate::memory::value::Value;
    use crate::parser::ast::Operator;
    use crate::parser::lexer::tokenize;
    use crate::parser::Parser;

    fn lower_source(source: &str) -> Program {
        let program = Parser::new(tokenize(source).unwrap()).parse_program().unwrap();
        let signatures = signatures(&program);
        let main = ScopedModule::new(&program.main);
        let subprograms = program.subprograms.iter().map(ScopedModule::new).collect();
        lower_program(main, subprograms, &signatures)
    }

    fn main_of(body: &str) -> LoweredModule {
        let source = format!(
            "variables\n  entero i, x, v[4]\n  logico b\ninicio\n{}\nfin",
            body
        );
        lower_source(&source).main
    }

    /// Nodes visited from `from` following structural next only
    fn structural_path(module: &LoweredModule, from: Option<NodeId>) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut current = from;
        while let Some(id) = current {
            if path.contains(&id) {
                break;
            }
            path.push(id);
            current = module.graph[id].structural_next();
        }
        path
    }

    fn action(module: &LoweredModule, id: NodeId) -> &Action {
        match &module.graph[id] {
            Node::Generic { action, .. } => action,
            other => panic!("Expected generic node, got {:?}", other),
        }
    }

    #[test]
    fn test_assignment_actions() {
        let module = main_of("  v[i + 1] <- x * 2");
        let path = structural_path(&module, module.entry);
        let actions: Vec<_> = path.iter().map(|id| action(&module, *id).clone()).collect();

        assert_eq!(
            actions,
            vec![
                Action::Load("x".to_string()),
                Action::Push(Value::Integer(2)),
                Action::Apply(Operator::Times),
                Action::Load("i".to_string()),
                Action::Push(Value::Integer(1)),
                Action::Apply(Operator::Plus),
                Action::Assign {
                    name: "v".to_string(),
                    indices: 1
                },
            ]
        );
    }

    #[test]
    fn test_branches_converge() {
        let module = main_of("  si b entonces\n    x <- 1\n  sino\n    x <- 2\n  finsi\n  i <- 0");

        let entry = module.entry.unwrap();
        let (true_head, false_head, next) = match &module.graph[entry] {
            Node::Branch {
                true_head,
                false_head,
                next,
                ..
            } => (true_head.unwrap(), false_head.unwrap(), next.unwrap()),
            other => panic!("Expected branch node, got {:?}", other),
        };

        let then_tail = *structural_path(&module, Some(true_head)).get(1).unwrap();
        let else_tail = *structural_path(&module, Some(false_head)).get(1).unwrap();
        assert_eq!(module.graph[then_tail].structural_next(), Some(next));
        assert_eq!(module.graph[else_tail].structural_next(), Some(next));
        assert_eq!(action(&module, next), &Action::Push(Value::Integer(0)));
    }

    #[test]
    fn test_empty_branch_points_at_follow_on() {
        let module = main_of("  si b entonces\n    x <- 1\n  finsi\n  i <- 0");

        match &module.graph[module.entry.unwrap()] {
            Node::Branch {
                false_head, next, ..
            } => assert_eq!(false_head, next),
            other => panic!("Expected branch node, got {:?}", other),
        }
    }

    #[test]
    fn test_while_closes_loop() {
        let module = main_of("  mientras i < 3\n    x <- x + i\n    i <- i + 1\n  finmientras");

        let entry = module.entry.unwrap();
        let body_head = match &module.graph[entry] {
            Node::Loop {
                kind, body_head, condition, ..
            } => {
                assert_eq!(*kind, LoopKind::While);
                assert_eq!(condition.last(), Some(&Action::Apply(Operator::Less)));
                body_head.unwrap()
            }
            other => panic!("Expected loop node, got {:?}", other),
        };

        let body = structural_path(&module, Some(body_head));
        let tail = *body.last().unwrap();
        assert_eq!(tail, entry);
        let last_body_node = body[body.len() - 2];
        assert_eq!(module.graph[last_body_node].structural_next(), Some(entry));
    }

    #[test]
    fn test_until_enters_body_first() {
        let module = main_of("  repetir\n    i <- i + 1\n  hasta que i = 3");

        let entry = module.entry.unwrap();
        assert!(matches!(module.graph[entry], Node::Generic { .. }));

        let path = structural_path(&module, module.entry);
        let loop_id = *path.last().unwrap();
        match &module.graph[loop_id] {
            Node::Loop {
                kind,
                condition,
                body_head,
                ..
            } => {
                assert_eq!(*kind, LoopKind::Until);
                assert_eq!(*body_head, Some(entry));
                assert_eq!(
                    &condition[condition.len() - 2..],
                    &[Action::Apply(Operator::Equal), Action::Apply(Operator::Not)]
                );
            }
            other => panic!("Expected loop node, got {:?}", other),
        }
    }

    #[test]
    fn test_for_round_trip() {
        let module = main_of("  para i <- 1 hasta 3\n    x <- i\n  finpara");

        let path = structural_path(&module, module.entry);
        assert_eq!(action(&module, path[0]), &Action::Push(Value::Integer(1)));
        assert_eq!(
            action(&module, path[1]),
            &Action::Assign {
                name: "i".to_string(),
                indices: 0
            }
        );

        let loop_id = path[2];
        let body_head = match &module.graph[loop_id] {
            Node::Loop {
                condition,
                body_head,
                ..
            } => {
                assert_eq!(
                    condition,
                    &vec![
                        Action::Load("i".to_string()),
                        Action::Push(Value::Integer(3)),
                        Action::Apply(Operator::LessEqual),
                    ]
                );
                body_head.unwrap()
            }
            other => panic!("Expected loop node, got {:?}", other),
        };

        let body: Vec<_> = structural_path(&module, Some(body_head))
            .into_iter()
            .take_while(|id| *id != loop_id)
            .map(|id| action(&module, id).clone())
            .collect();
        assert_eq!(
            body,
            vec![
                Action::Load("i".to_string()),
                Action::Assign {
                    name: "x".to_string(),
                    indices: 0
                },
                Action::Load("i".to_string()),
                Action::Push(Value::Integer(1)),
                Action::Apply(Operator::Plus),
                Action::Assign {
                    name: "i".to_string(),
                    indices: 0
                },
            ]
        );
    }

    #[test]
    fn test_calls_pass_references_and_discard() {
        let source = "\
entero funcion incrementar(ref entero n)
inicio
  n <- n + 1
  retornar n
finfuncion

variables
  entero v[2]
inicio
  incrementar(v[1])
  leer(v[0])
fin";
        let program = lower_source(source);
        let main = &program.main;
        let actions: Vec<_> = structural_path(main, main.entry)
            .into_iter()
            .map(|id| action(main, id).clone())
            .collect();

        assert_eq!(
            actions,
            vec![
                Action::Push(Value::Integer(1)),
                Action::Reference {
                    name: "v".to_string(),
                    indices: 1
                },
                Action::ModuleCall {
                    name: "incrementar".to_string(),
                    args: 1
                },
                Action::Discard,
                Action::Push(Value::Integer(0)),
                Action::Reference {
                    name: "v".to_string(),
                    indices: 1
                },
                Action::ModuleCall {
                    name: "leer".to_string(),
                    args: 1
                },
            ]
        );

        assert_eq!(main.locals.get("v").unwrap().values.as_ref().unwrap().len(), 2);
        assert!(program.module("incrementar").is_some());
    }

    #[test]
    fn test_character_literal_lowering() {
        let program = lower_source("variables\n  caracter c\ninicio\n  c <- \"a\"\n  escribir(\"ab\")\nfin");
        let main = &program.main;
        let actions: Vec<_> = structural_path(main, main.entry)
            .into_iter()
            .map(|id| action(main, id).clone())
            .collect();

        assert_eq!(actions[0], Action::Push(Value::Character('a')));
        assert_eq!(actions[2], Action::Push(Value::String("ab".to_string())));
    }

    #[test]
    fn test_selectors_drive_control_next() {
        let mut module = main_of("  mientras b\n    x <- 1\n  finmientras\n  i <- 2");
        let entry = module.entry.unwrap();
        let after = module.graph[entry].structural_next();

        assert_eq!(module.graph[entry].control_next(), after);
        module.graph.select(entry, "loop_body").unwrap();
        assert_ne!(module.graph[entry].control_next(), after);
        assert!(module.graph[entry].control_next().is_some());
    }
}
