//! Lifecycle events broadcast while parsing
//!
//! An [`EventEmitter`] is owned by the caller and passed into
//! [`crate::parser::parse()`] / [`crate::compile`]. Listeners registered for
//! every event run before listeners registered for the specific event; within
//! each group they run in registration order.
//!
//! `emit` takes `&mut self`, so a listener can never reach the emitter it is
//! registered on and the listener lists cannot change during an emission.

use crate::parser::lexer::LexicalError;
use crate::parser::parse::PatternError;
use std::fmt;

/// Event names, used to register for a specific event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ParsingStarted,
    LexicalError,
    SyntaxError,
    ParsingFinished,
}

impl EventKind {
    pub fn name(self) -> &'static str {
        match self {
            EventKind::ParsingStarted => "parsing-started",
            EventKind::LexicalError => "lexical-error",
            EventKind::SyntaxError => "syntax-error",
            EventKind::ParsingFinished => "parsing-finished",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    ParsingStarted,
    /// One per malformed token
    LexicalError(LexicalError),
    /// Parsing halts after this one
    SyntaxError(PatternError),
    ParsingFinished { success: bool },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::ParsingStarted => EventKind::ParsingStarted,
            Event::LexicalError(_) => EventKind::LexicalError,
            Event::SyntaxError(_) => EventKind::SyntaxError,
            Event::ParsingFinished { .. } => EventKind::ParsingFinished,
        }
    }
}

type Listener<'a> = Box<dyn FnMut(&Event) + 'a>;

/// Synchronous publish/subscribe hub for [`Event`]s
#[derive(Default)]
pub struct EventEmitter<'a> {
    any: Vec<Listener<'a>>,
    specific: Vec<(EventKind, Listener<'a>)>,
}

impl<'a> EventEmitter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for one kind of event
    pub fn on(&mut self, kind: EventKind, listener: impl FnMut(&Event) + 'a) {
        self.specific.push((kind, Box::new(listener)));
    }

    /// Register a listener for every event
    pub fn on_any(&mut self, listener: impl FnMut(&Event) + 'a) {
        self.any.push(Box::new(listener));
    }

    /// Deliver `event` to wildcard listeners, then to listeners of its kind
    pub fn emit(&mut self, event: &Event) {
        tracing::trace!(event = %event.kind(), "emit");

        for listener in &mut self.any {
            listener(event);
        }
        let kind = event.kind();
        for (_, listener) in self.specific.iter_mut().filter(|(k, _)| *k == kind) {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.any.len() + self.specific.len()
    }
}

impl fmt::Debug for EventEmitter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("any", &self.any.len())
            .field("specific", &self.specific.len())
            .finish()
    }
}
