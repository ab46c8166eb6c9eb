//! Executable node graph
//!
//! Lowered modules are graphs of [`Node`]s stored in a per-module [`Graph`]
//! arena and addressed by [`NodeId`]. The graph is both the control-flow
//! structure and the instruction stream of the stack-machine evaluator.
//!
//! # Two Successors
//!
//! Every node has:
//! - a **structural next**: the statement that lexically follows. Fixed once
//!   the chain is assembled and the only link lowering ever reads.
//! - a **control next**: what the evaluator visits next. For branch and loop
//!   nodes it depends on the node's active selector, which the evaluator sets
//!   with [`Graph::select`] after evaluating the node's condition.
//!
//! # Exit Slots
//!
//! A lowered [`Chain`] records every link that must point at whatever comes
//! after it (one for plain and loop chains, several for conditionals whose
//! branches converge). Attaching a successor writes all of them at once.

use crate::memory::value::Value;
use crate::parser::ast::Operator;
use std::fmt;
use std::ops::Index;

/// Handle of a node inside its module's [`Graph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&format!("#{}", self.0))
    }
}

/// Stack-machine instruction
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Push a literal
    Push(Value),
    /// Push the value of a scalar variable or a whole array
    Load(String),
    /// Pop `indices` indices and push the selected element or sub-array
    Subscript { name: String, indices: usize },
    /// Pop `indices` indices and push a reference to the storage they select
    Reference { name: String, indices: usize },
    /// Pop the operator's operands and push its result
    Apply(Operator),
    /// Pop `args` arguments and run a module; functions push their result
    ModuleCall { name: String, args: usize },
    /// Drop the top of the stack
    Discard,
    /// Pop `indices` indices, then the value, and store it
    Assign { name: String, indices: usize },
    /// Pop the result and leave the current function
    Return,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Push(value) => write!(f, "push {}", value),
            Action::Load(name) => write!(f, "load {}", name),
            Action::Subscript { name, indices } => write!(f, "subscript {} {}", name, indices),
            Action::Reference { name, indices } => write!(f, "reference {} {}", name, indices),
            Action::Apply(op) => write!(f, "apply {}", op),
            Action::ModuleCall { name, args } => write!(f, "module_call {} {}", name, args),
            Action::Discard => write!(f, "discard"),
            Action::Assign { name, indices } => write!(f, "assign {} {}", name, indices),
            Action::Return => write!(f, "return"),
        }
    }
}

/// Which successor a branch node reports as its control next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BranchSelector {
    TrueBranch,
    FalseBranch,
    #[default]
    NextStatement,
}

impl BranchSelector {
    pub fn name(self) -> &'static str {
        match self {
            BranchSelector::TrueBranch => "true_branch",
            BranchSelector::FalseBranch => "false_branch",
            BranchSelector::NextStatement => "next_statement",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "true_branch" => Some(BranchSelector::TrueBranch),
            "false_branch" => Some(BranchSelector::FalseBranch),
            "next_statement" => Some(BranchSelector::NextStatement),
            _ => None,
        }
    }
}

/// Which successor a loop node reports as its control next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopSelector {
    LoopBody,
    #[default]
    ProgramBody,
}

impl LoopSelector {
    pub fn name(self) -> &'static str {
        match self {
            LoopSelector::LoopBody => "loop_body",
            LoopSelector::ProgramBody => "program_body",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "loop_body" => Some(LoopSelector::LoopBody),
            "program_body" => Some(LoopSelector::ProgramBody),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopKind {
    While,
    /// `repetir ... hasta que`; the stored condition is already negated
    Until,
}

/// One executable node
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Generic {
        action: Action,
        next: Option<NodeId>,
    },
    Branch {
        condition: Vec<Action>,
        true_head: Option<NodeId>,
        false_head: Option<NodeId>,
        /// Convergence point after the whole conditional
        next: Option<NodeId>,
        selector: BranchSelector,
    },
    Loop {
        kind: LoopKind,
        /// Re-evaluated every time control reaches the node; true means iterate
        condition: Vec<Action>,
        body_head: Option<NodeId>,
        next: Option<NodeId>,
        selector: LoopSelector,
    },
}

impl Node {
    pub fn structural_next(&self) -> Option<NodeId> {
        match self {
            Node::Generic { next, .. } | Node::Branch { next, .. } | Node::Loop { next, .. } => *next,
        }
    }

    pub fn control_next(&self) -> Option<NodeId> {
        match self {
            Node::Generic { next, .. } => *next,
            Node::Branch {
                true_head,
                false_head,
                next,
                selector,
                ..
            } => match selector {
                BranchSelector::TrueBranch => *true_head,
                BranchSelector::FalseBranch => *false_head,
                BranchSelector::NextStatement => *next,
            },
            Node::Loop {
                body_head,
                next,
                selector,
                ..
            } => match selector {
                LoopSelector::LoopBody => *body_head,
                LoopSelector::ProgramBody => *next,
            },
        }
    }

    /// Condition program of a branch or loop node
    pub fn condition(&self) -> Option<&[Action]> {
        match self {
            Node::Generic { .. } => None,
            Node::Branch { condition, .. } | Node::Loop { condition, .. } => Some(condition),
        }
    }
}

/// Graph access errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("Node {0} does not exist")]
    UnknownNode(NodeId),

    #[error("Node {0} has a single successor and cannot select one")]
    NotSelectable(NodeId),

    #[error("Node {node} has no successor named '{name}'")]
    UnknownSelector { node: NodeId, name: String },
}

/// Link of a node that still has to be pointed at a chain's successor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Next(NodeId),
    TrueHead(NodeId),
    FalseHead(NodeId),
    BodyHead(NodeId),
}

/// A lowered statement sequence: where it starts and which links leave it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chain {
    /// `None` for an empty sequence
    pub head: Option<NodeId>,
    pub exits: Vec<Slot>,
}

impl Chain {
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }
}

/// Arena of a module's nodes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    nodes: Vec<Node>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId(i as u32), node))
    }

    /// Set the active selector of a branch or loop node by name
    pub fn select(&mut self, id: NodeId, name: &str) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get_mut(id.0 as usize)
            .ok_or(GraphError::UnknownNode(id))?;
        let unknown = || GraphError::UnknownSelector {
            node: id,
            name: name.to_string(),
        };

        match node {
            Node::Generic { .. } => Err(GraphError::NotSelectable(id)),
            Node::Branch { selector, .. } => {
                *selector = BranchSelector::from_name(name).ok_or_else(unknown)?;
                Ok(())
            }
            Node::Loop { selector, .. } => {
                *selector = LoopSelector::from_name(name).ok_or_else(unknown)?;
                Ok(())
            }
        }
    }

    /// Point every exit of `chain` at `target`
    pub fn attach(&mut self, chain: &Chain, target: NodeId) {
        for slot in &chain.exits {
            self.fill(*slot, target);
        }
    }

    /// Concatenate two chains; the second one's head becomes the first one's successor
    pub fn then(&mut self, first: Chain, second: Chain) -> Chain {
        let Some(head) = second.head else {
            return first;
        };
        if first.is_empty() {
            return second;
        }
        self.attach(&first, head);
        Chain {
            head: first.head,
            exits: second.exits,
        }
    }

    fn fill(&mut self, slot: Slot, target: NodeId) {
        let (id, link) = match slot {
            Slot::Next(id) => (id, LinkField::Next),
            Slot::TrueHead(id) => (id, LinkField::TrueHead),
            Slot::FalseHead(id) => (id, LinkField::FalseHead),
            Slot::BodyHead(id) => (id, LinkField::BodyHead),
        };
        let Some(node) = self.nodes.get_mut(id.0 as usize) else {
            return;
        };

        let field = match (node, link) {
            (Node::Generic { next, .. }, LinkField::Next)
            | (Node::Branch { next, .. }, LinkField::Next)
            | (Node::Loop { next, .. }, LinkField::Next) => next,
            (Node::Branch { true_head, .. }, LinkField::TrueHead) => true_head,
            (Node::Branch { false_head, .. }, LinkField::FalseHead) => false_head,
            (Node::Loop { body_head, .. }, LinkField::BodyHead) => body_head,
            _ => return,
        };
        *field = Some(target);
    }
}

#[derive(Clone, Copy)]
enum LinkField {
    Next,
    TrueHead,
    FalseHead,
    BodyHead,
}

impl Index<NodeId> for Graph {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }
}

fn link(target: Option<NodeId>) -> String {
    target.map_or_else(|| "end".to_string(), |id| id.to_string())
}

fn program(actions: &[Action]) -> String {
    actions
        .iter()
        .map(Action::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (id, node) in self.iter() {
            match node {
                Node::Generic { action, next } => {
                    writeln!(f, "{:>4}  {} -> {}", id, action, link(*next))?;
                }
                Node::Branch {
                    condition,
                    true_head,
                    false_head,
                    next,
                    selector,
                } => {
                    writeln!(
                        f,
                        "{:>4}  si [{}] true {} false {} -> {} ({})",
                        id,
                        program(condition),
                        link(*true_head),
                        link(*false_head),
                        link(*next),
                        selector.name()
                    )?;
                }
                Node::Loop {
                    kind,
                    condition,
                    body_head,
                    next,
                    selector,
                } => {
                    let label = match kind {
                        LoopKind::While => "mientras",
                        LoopKind::Until => "repetir",
                    };
                    writeln!(
                        f,
                        "{:>4}  {} [{}] body {} -> {} ({})",
                        id,
                        label,
                        program(condition),
                        link(*body_head),
                        link(*next),
                        selector.name()
                    )?;
                }
            }
        }
        Ok(())
    }
}
