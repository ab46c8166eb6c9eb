//! Statement lowering
//!
//! Simple statements become straight chains of generic nodes, one action per
//! node. Control statements build branch and loop nodes:
//!
//! - `si`: both branches lowered independently; every branch tail, an empty
//!   branch's head link and the branch node's own next are exits, so the
//!   branches converge on whatever follows.
//! - `mientras`: the body tail is linked back to the loop node.
//! - `repetir ... hasta que c`: a loop on `not c` entered at the body head,
//!   so the body runs once before the first test.
//! - `para`: the initialising assignment followed by the equivalent `mientras`.

use super::graph::{Action, BranchSelector, Chain, LoopKind, LoopSelector, Node, Slot};
use super::Lowerer;
use crate::parser::ast::*;

impl Lowerer<'_> {
    pub(crate) fn lower_statements(&mut self, statements: &[Statement]) -> Chain {
        let mut chain = Chain::default();
        for statement in statements {
            let next = self.lower_statement(statement);
            chain = self.graph.then(chain, next);
        }
        chain
    }

    fn lower_statement(&mut self, statement: &Statement) -> Chain {
        match statement {
            // Hoisted into the symbol table before lowering
            Statement::Declaration { .. } => Chain::default(),

            Statement::Assignment(assignment) => {
                let actions = self.assignment_actions(assignment);
                self.sequence(actions)
            }

            Statement::Call(call) => {
                let mut actions = Vec::new();
                self.emit_call(call, &mut actions);
                if self.returns_value(&call.name) {
                    actions.push(Action::Discard);
                }
                self.sequence(actions)
            }

            Statement::Return { value, .. } => {
                let mut actions = self.lower_expression(value);
                actions.push(Action::Return);
                self.sequence(actions)
            }

            Statement::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => self.lower_if(condition, then_branch, else_branch),

            Statement::While { condition, body, .. } => {
                let condition = self.lower_expression(condition);
                self.lower_loop(LoopKind::While, condition, body)
            }

            Statement::Until { body, condition, .. } => {
                let mut condition = self.lower_expression(condition);
                condition.push(Action::Apply(Operator::Not));
                self.lower_loop(LoopKind::Until, condition, body)
            }

            Statement::For(for_loop) => {
                let (init, while_loop) = for_loop.desugar();
                let init = self.lower_statement(&Statement::Assignment(init));
                let body = self.lower_statement(&while_loop);
                self.graph.then(init, body)
            }
        }
    }

    /// Value, then target indices, then the store
    fn assignment_actions(&self, assignment: &Assignment) -> Vec<Action> {
        let mut actions = self.lower_expression(&assignment.value);
        self.emit_indices(&assignment.target, &mut actions);
        actions.push(Action::Assign {
            name: assignment.target.name.clone(),
            indices: assignment.target.indices.len(),
        });
        actions
    }

    /// One generic node per action, linked in order
    fn sequence(&mut self, actions: Vec<Action>) -> Chain {
        let mut chain = Chain::default();
        for action in actions {
            let id = self.graph.push(Node::Generic { action, next: None });
            let node = Chain {
                head: Some(id),
                exits: vec![Slot::Next(id)],
            };
            chain = self.graph.then(chain, node);
        }
        chain
    }

    fn lower_if(
        &mut self,
        condition: &Expression,
        then_branch: &[Statement],
        else_branch: &[Statement],
    ) -> Chain {
        let condition = self.lower_expression(condition);
        let then_chain = self.lower_statements(then_branch);
        let else_chain = self.lower_statements(else_branch);

        let id = self.graph.push(Node::Branch {
            condition,
            true_head: then_chain.head,
            false_head: else_chain.head,
            next: None,
            selector: BranchSelector::default(),
        });

        let mut exits = vec![Slot::Next(id)];
        if then_chain.is_empty() {
            exits.push(Slot::TrueHead(id));
        } else {
            exits.extend(then_chain.exits);
        }
        if else_chain.is_empty() {
            exits.push(Slot::FalseHead(id));
        } else {
            exits.extend(else_chain.exits);
        }

        Chain {
            head: Some(id),
            exits,
        }
    }

    fn lower_loop(&mut self, kind: LoopKind, condition: Vec<Action>, body: &[Statement]) -> Chain {
        let body = self.lower_statements(body);

        let id = self.graph.push(Node::Loop {
            kind,
            condition,
            body_head: body.head,
            next: None,
            selector: LoopSelector::default(),
        });

        // Loop closure; an empty body loops on the node itself.
        if body.is_empty() {
            self.graph.attach(
                &Chain {
                    head: None,
                    exits: vec![Slot::BodyHead(id)],
                },
                id,
            );
        } else {
            self.graph.attach(&body, id);
        }

        let head = match kind {
            LoopKind::While => Some(id),
            LoopKind::Until => body.head.or(Some(id)),
        };
        Chain {
            head,
            exits: vec![Slot::Next(id)],
        }
    }
}
