//! Evaluation trace
//!
//! The evaluator can record how a formula was computed as a tree: one node per
//! function call, argument, conditional branch and atom. Nodes live in an
//! arena and refer to their children by [`NodeId`]. While evaluating, the
//! builder keeps a stack of the scopes that are still open; leaves are appended
//! to the innermost one.
//!
//! ```
//! use tableur_formula::trace::{TraceBuilder, TraceKind};
//! use tableur_formula::Value;
//!
//! let mut builder = TraceBuilder::new();
//! builder.open_scope(TraceKind::Function { name: "SOMME".into() });
//! builder.add_leaf(TraceKind::Number, "1", Value::Number(1.0));
//! builder.close_scope("SOMME(1)", Some(Value::Number(1.0)));
//!
//! let tree = builder.finish();
//! assert_eq!(tree.leaf_count(), 1);
//! ```

use crate::value::{format_number, Value};
use std::fmt::Write as _;

/// Index of a node in a trace arena
pub type NodeId = usize;

/// Maximum number of range values shown in a preview
const RANGE_PREVIEW: usize = 5;

/// Branch of a conditional
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Branch {
    /// Value if the test is true
    IfTrue,
    /// Value if the test is false
    IfFalse,
}

impl Branch {
    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            Branch::IfTrue => "Si vrai",
            Branch::IfFalse => "Si faux",
        }
    }
}

/// What a trace node stands for
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "kebab-case"))]
pub enum TraceKind {
    /// The formula itself
    Root,
    /// An eagerly evaluated function call
    Function { name: String },
    /// A lazy `SI`/`IF` call
    Si,
    /// The test of a conditional
    SiCondition,
    /// One branch of a conditional
    SiBranch { branch: Branch, active: bool },
    /// One argument of a function call (0-based)
    FnArg { index: usize },
    /// A cell reference
    Cell { reference: String },
    /// A named constant
    Name { name: String },
    /// A range reference
    Range { reference: String },
    /// A string literal
    String,
    /// A number literal
    Number,
    /// A boolean literal
    Bool,
}

impl TraceKind {
    /// Whether the node stands for a single atom of the formula
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            TraceKind::Cell { .. }
                | TraceKind::Name { .. }
                | TraceKind::Range { .. }
                | TraceKind::String
                | TraceKind::Number
                | TraceKind::Bool
        )
    }
}

/// A node of the trace tree
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TraceNode {
    /// Node kind
    pub kind: TraceKind,
    /// Source text the node was computed from
    pub raw: String,
    /// Computed value, unset for scopes that never completed
    pub result: Option<Value>,
    /// Test outcome, only set on conditional nodes
    pub condition: Option<Value>,
    /// Children, in evaluation order
    pub children: Vec<NodeId>,
}

impl TraceNode {
    fn new(kind: TraceKind) -> Self {
        Self {
            kind,
            raw: String::new(),
            result: None,
            condition: None,
            children: Vec::new(),
        }
    }
}

/// Builds a trace tree during one evaluation pass
#[derive(Debug, Clone)]
pub struct TraceBuilder {
    nodes: Vec<TraceNode>,
    open: Vec<NodeId>,
}

impl Default for TraceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceBuilder {
    /// Create a builder holding only the (open) root node
    pub fn new() -> Self {
        Self {
            nodes: vec![TraceNode::new(TraceKind::Root)],
            open: vec![0],
        }
    }

    /// Innermost open scope
    pub fn current(&self) -> NodeId {
        self.open.last().copied().unwrap_or(0)
    }

    /// Append a leaf to the innermost open scope
    pub fn add_leaf(&mut self, kind: TraceKind, raw: impl Into<String>, result: Value) -> NodeId {
        let id = self.attach(kind);
        let node = &mut self.nodes[id];
        node.raw = raw.into();
        node.result = Some(result);
        id
    }

    /// Append a scope to the innermost open scope and make it the new
    /// innermost scope
    pub fn open_scope(&mut self, kind: TraceKind) -> NodeId {
        let id = self.attach(kind);
        self.open.push(id);
        id
    }

    /// Close the innermost scope, recording its source text and result.
    /// The root is never closed this way.
    pub fn close_scope(&mut self, raw: impl Into<String>, result: Option<Value>) -> Option<NodeId> {
        if self.open.len() <= 1 {
            return None;
        }
        let id = self.open.pop()?;
        let node = &mut self.nodes[id];
        node.raw = raw.into();
        node.result = result;
        Some(id)
    }

    /// Record the test outcome of a conditional node
    pub fn set_condition(&mut self, id: NodeId, condition: Value) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.condition = Some(condition);
        }
    }

    /// Drop every open scope above `id`, leaving `id` innermost. Scopes
    /// dropped this way stay in the tree without a result.
    pub fn unwind_to(&mut self, id: NodeId) {
        while self.open.len() > 1 && self.current() != id {
            self.open.pop();
        }
    }

    /// Return the tree as built so far. Scopes still open, such as those
    /// left by an error, keep no source text and no result.
    pub fn finish(self) -> TraceTree {
        TraceTree { nodes: self.nodes }
    }

    fn attach(&mut self, kind: TraceKind) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(TraceNode::new(kind));
        let parent = self.current();
        self.nodes[parent].children.push(id);
        id
    }
}

/// A finished evaluation trace
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TraceTree {
    nodes: Vec<TraceNode>,
}

impl Default for TraceTree {
    fn default() -> Self {
        TraceBuilder::new().finish()
    }
}

impl TraceTree {
    /// The root node id
    pub fn root(&self) -> NodeId {
        0
    }

    /// Look up a node
    pub fn node(&self, id: NodeId) -> Option<&TraceNode> {
        self.nodes.get(id)
    }

    /// Children of a node (empty for unknown ids)
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// All nodes, root first
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &TraceNode)> {
        self.nodes.iter().enumerate()
    }

    /// Whether nothing was recorded below the root
    pub fn is_empty(&self) -> bool {
        self.children(self.root()).is_empty()
    }

    /// Number of atom nodes
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.kind.is_leaf()).count()
    }

    /// Indented text rendering, one node per line
    pub fn render(&self) -> String {
        let mut out = String::new();
        for &child in self.children(self.root()) {
            self.render_node(child, 0, &mut out);
        }
        out
    }

    fn render_node(&self, id: NodeId, depth: usize, out: &mut String) {
        let Some(node) = self.node(id) else {
            return;
        };
        let indent = "  ".repeat(depth);
        let result = node
            .result
            .as_ref()
            .map(format_trace_value)
            .unwrap_or_else(|| "?".to_string());

        let _ = match &node.kind {
            TraceKind::Root => writeln!(out, "{indent}formule"),
            TraceKind::Function { name } => writeln!(out, "{indent}{name}(…) → {result}"),
            TraceKind::Si => {
                let condition = node
                    .condition
                    .as_ref()
                    .map(format_trace_value)
                    .unwrap_or_else(|| "?".to_string());
                writeln!(out, "{indent}{} → {result} [test: {condition}]", node.raw)
            }
            TraceKind::SiCondition => writeln!(out, "{indent}Test: {} → {result}", node.raw),
            TraceKind::SiBranch { branch, active } => {
                let state = if *active { "actif" } else { "inactif" };
                writeln!(
                    out,
                    "{indent}{} ({state}): {} → {result}",
                    branch.label(),
                    node.raw
                )
            }
            TraceKind::FnArg { index } => {
                writeln!(out, "{indent}arg {}: {} → {result}", index + 1, node.raw)
            }
            TraceKind::Cell { .. } if matches!(&node.result, Some(Value::Text(s)) if s.is_empty()) => {
                writeln!(out, "{indent}{} = (vide)", node.raw)
            }
            _ => writeln!(out, "{indent}{} = {result}", node.raw),
        };

        for &child in &node.children {
            self.render_node(child, depth + 1, out);
        }
    }
}

/// Format a value for a trace: scalars like results, text quoted, ranges
/// previewed as `{a; b; …}`
pub fn format_trace_value(value: &Value) -> String {
    match value {
        Value::Boolean(true) => "VRAI".to_string(),
        Value::Boolean(false) => "FAUX".to_string(),
        Value::Number(n) => format_number(*n, 10),
        Value::Text(s) => format!("\"{}\"", s),
        Value::Range(values) => {
            let preview: Vec<&str> = values
                .iter()
                .take(RANGE_PREVIEW)
                .map(|v| if v.is_empty() { "\"\"" } else { v.as_str() })
                .collect();
            let more = if values.len() > RANGE_PREVIEW { "; …" } else { "" };
            format!("{{{}{}}}", preview.join("; "), more)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scopes_nest() {
        let mut builder = TraceBuilder::new();
        let func = builder.open_scope(TraceKind::Function { name: "SOMME".into() });
        let arg = builder.open_scope(TraceKind::FnArg { index: 0 });
        builder.add_leaf(TraceKind::Number, "1", Value::Number(1.0));
        assert_eq!(builder.close_scope("1", Some(Value::Number(1.0))), Some(arg));
        assert_eq!(builder.close_scope("SOMME(1)", Some(Value::Number(1.0))), Some(func));
        assert_eq!(builder.close_scope("", None), None);

        let tree = builder.finish();
        assert_eq!(tree.children(tree.root()), &[func]);
        assert_eq!(tree.children(func), &[arg]);
        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(tree.node(func).unwrap().raw, "SOMME(1)");
    }

    #[test]
    fn test_unwind() {
        let mut builder = TraceBuilder::new();
        let branch = builder.open_scope(TraceKind::SiBranch {
            branch: Branch::IfFalse,
            active: false,
        });
        builder.open_scope(TraceKind::Function { name: "X".into() });
        builder.open_scope(TraceKind::FnArg { index: 0 });
        builder.unwind_to(branch);
        assert_eq!(builder.current(), branch);
        builder.close_scope("X(1)", Some(Value::Text("#N/A".into())));
        assert_eq!(builder.current(), 0);
    }

    #[test]
    fn test_finish_with_open_scopes() {
        let mut builder = TraceBuilder::new();
        builder.open_scope(TraceKind::Function { name: "SOMME".into() });
        builder.add_leaf(TraceKind::Cell { reference: "A1".into() }, "A1", Value::Number(2.0));
        let tree = builder.finish();
        assert!(!tree.is_empty());
        let open = tree.node(1).unwrap();
        assert_eq!(open.result, None);
        assert_eq!(open.raw, "");
        assert_eq!(tree.node(2).unwrap().result, Some(Value::Number(2.0)));
    }

    #[test]
    fn test_format_trace_value() {
        assert_eq!(format_trace_value(&Value::Boolean(true)), "VRAI");
        assert_eq!(format_trace_value(&Value::Number(1.0 / 0.0)), "#DIV/0!");
        assert_eq!(format_trace_value(&Value::Text("a".into())), "\"a\"");
        let range = Value::Range(
            ["1", "", "3", "4", "5", "6"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        assert_eq!(format_trace_value(&range), "{1; \"\"; 3; 4; 5; …}");
        assert_eq!(
            format_trace_value(&Value::Range(vec!["a".into(), "b".into()])),
            "{a; b}"
        );
    }

    #[test]
    fn test_render() {
        let mut builder = TraceBuilder::new();
        builder.open_scope(TraceKind::Function { name: "SOMME".into() });
        builder.add_leaf(TraceKind::Cell { reference: "A1".into() }, "A1", Value::Text(String::new()));
        builder.close_scope("SOMME(A1)", Some(Value::Number(0.0)));
        let rendered = builder.finish().render();
        assert_eq!(rendered, "SOMME(…) → 0\n  A1 = (vide)\n");
    }
}
