//! Bounded evaluation traces.
//!
//! A [`Trace`] is an immutable list of the most recent frames, newest first,
//! capped at a fixed size. Extending a trace produces a new one; the old
//! trace is untouched, so contexts can hand their trace to children freely.

use ecow::EcoString;
use smallvec::SmallVec;

use crate::ast::{Node, pretty};

pub const DEFAULT_TRACE_DEPTH: usize = 10;

#[derive(Clone)]
pub enum TraceEntry {
    Expression { module: EcoString, node: Node },
    Native { module: EcoString, name: EcoString },
    Procedure { module: EcoString, name: EcoString },
}

#[derive(Clone)]
pub struct Trace {
    entries: SmallVec<[TraceEntry; DEFAULT_TRACE_DEPTH]>,
    limit: usize,
}

impl Default for Trace {
    fn default() -> Self {
        Self::new(DEFAULT_TRACE_DEPTH)
    }
}

impl Trace {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: SmallVec::new(),
            limit: limit.max(1),
        }
    }

    fn extend(&self, entry: TraceEntry) -> Self {
        let mut entries = SmallVec::with_capacity(self.limit);
        entries.push(entry);
        entries.extend(self.entries.iter().take(self.limit - 1).cloned());
        Self {
            entries,
            limit: self.limit,
        }
    }

    pub fn expression(&self, module: &str, node: &Node) -> Self {
        self.extend(TraceEntry::Expression {
            module: module.into(),
            node: node.clone(),
        })
    }

    pub fn native(&self, module: &str, name: &str) -> Self {
        self.extend(TraceEntry::Native {
            module: module.into(),
            name: name.into(),
        })
    }

    pub fn procedure(&self, module: &str, name: &str) -> Self {
        self.extend(TraceEntry::Procedure {
            module: module.into(),
            name: name.into(),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    /// One line per frame, most recent first.
    pub fn format(&self) -> Vec<String> {
        self.entries.iter().map(format_entry).collect()
    }

    /// A short description of the most recent frame.
    pub fn format_top_entry(&self) -> Option<String> {
        self.entries.first().map(|entry| match entry {
            TraceEntry::Native { module, name } => format!("native {name} in {module}"),
            TraceEntry::Procedure { name, .. } => name.to_string(),
            TraceEntry::Expression { node, .. } => first_line(node),
        })
    }
}

fn first_line(node: &Node) -> String {
    let rendered = pretty(node, 4);
    rendered.lines().next().unwrap_or_default().to_string()
}

fn format_entry(entry: &TraceEntry) -> String {
    match entry {
        TraceEntry::Native { module, name } => format!("at native {name} in {module}"),
        TraceEntry::Procedure { module, name } => format!("at {name} in {module}"),
        TraceEntry::Expression { module, node } => {
            format!("in {module}\n  : {}", first_line(node))
        }
    }
}
