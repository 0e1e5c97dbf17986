use std::fmt::Write as _;

use crate::command::Command;
use crate::error::{Error, Result};

/// Handle of a node in the record's arena. It is the node's index, so any
/// node a `Vec` can hold has a handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Link {
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

#[derive(Debug)]
enum NodeKind<'r> {
    /// A resolved command, and the loop whose body it sits in.
    Op {
        command: &'r Command,
        enclosing: Option<NodeId>,
    },
    /// The start of a loop. `first` is the first node of the body (always
    /// the loop-open command itself once it has been appended); `parent`
    /// is the loop this one is nested in.
    Loop {
        first: Option<NodeId>,
        parent: Option<NodeId>,
    },
}

#[derive(Debug)]
struct Node<'r> {
    link: Link,
    kind: NodeKind<'r>,
}

/// The control-flow skeleton of a script, built one token at a time.
///
/// Nodes live in an arena and are never removed. Each loop body forms its
/// own `prev`/`next` chain whose first node has no `prev`; the loop node
/// sits in the enclosing chain, and its `next` is whatever follows the
/// loop's close. Re-entering a loop therefore means walking back along the
/// body chain, and leaving it means following the loop node's `next`.
///
/// While `skip` is set, nodes are recorded but nothing is executed: this is
/// how the body of a loop that is false on first entry is scanned past
/// without reading ahead in the source.
#[derive(Debug, Default)]
pub struct Record<'r> {
    nodes: Vec<Node<'r>>,
    /// Next node to execute.
    pending: Option<NodeId>,
    /// Node executed last.
    current: Option<NodeId>,
    /// Loops whose close has not been scanned yet, innermost last.
    open: Vec<NodeId>,
    /// Node the next append links after. `None` at the start of the script
    /// and at the start of every loop body.
    tail: Option<NodeId>,
    /// Loop whose body is being scanned without execution.
    skip: Option<NodeId>,
    /// Operations appended while `skip` was set.
    skipped: usize,
}

impl<'r> Record<'r> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded nodes, loop nodes included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn loop_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n.kind, NodeKind::Loop { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Number of loops still waiting for their close.
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    pub fn current_loop(&self) -> Option<NodeId> {
        self.open.last().copied()
    }

    pub fn is_skipping(&self) -> bool {
        self.skip.is_some()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).link.next
    }

    pub fn prev(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).link.prev
    }

    pub fn has_more_elements(&self, id: NodeId) -> bool {
        self.next(id).is_some()
    }

    /// The loop `id` belongs to: itself for a loop node, the enclosing
    /// loop for an operation.
    pub fn loop_of(&self, id: NodeId) -> Option<NodeId> {
        match self.node(id).kind {
            NodeKind::Op { enclosing, .. } => enclosing,
            NodeKind::Loop { .. } => Some(id),
        }
    }

    /// The loop `id` is nested in.
    pub fn parent_loop(&self, id: NodeId) -> Option<NodeId> {
        match self.node(id).kind {
            NodeKind::Op { enclosing, .. } => enclosing,
            NodeKind::Loop { parent, .. } => parent,
        }
    }

    /// Walk `prev` links from `id` to the first node of its chain: the start
    /// of the enclosing loop body, or the start of the script.
    pub fn rewind_to_start(&self, id: NodeId) -> NodeId {
        let mut at = id;
        while let Some(prev) = self.prev(at) {
            at = prev;
        }
        at
    }

    /// Record an operation. It becomes the last appended node and the next
    /// pending one.
    pub fn append(&mut self, command: &'r Command) -> NodeId {
        let enclosing = self.current_loop();
        let id = self.push(NodeKind::Op { command, enclosing });
        if let Some(loop_id) = enclosing {
            if let NodeKind::Loop { first, .. } = &mut self.node_mut(loop_id).kind {
                if first.is_none() {
                    *first = Some(id);
                }
            }
        }
        self.link_after_tail(id);
        self.tail = Some(id);
        self.pending = Some(id);
        if self.skip.is_some() {
            self.skipped += 1;
        }
        id
    }

    /// Begin a new loop scope nested in the current one.
    pub fn open_loop(&mut self) -> NodeId {
        let parent = self.current_loop();
        let id = self.push(NodeKind::Loop {
            first: None,
            parent,
        });
        self.link_after_tail(id);
        // The body starts a fresh chain.
        self.tail = None;
        self.open.push(id);
        tracing::trace!(node = id.0, depth = self.open.len(), "loop opened");
        id
    }

    /// Mark the innermost open loop as fully recorded.
    pub fn close_loop(&mut self) -> Result<NodeId> {
        let id = self.open.pop().ok_or(Error::MissingLoopOpen)?;
        self.tail = Some(id);
        if self.skip == Some(id) {
            // The skipped body is now fully scanned; execution resumes with
            // whatever gets appended after the loop.
            self.skip = None;
            self.pending = None;
            tracing::trace!(node = id.0, "skip mode left");
        }
        tracing::trace!(node = id.0, depth = self.open.len(), "loop closed");
        Ok(id)
    }

    /// Take the next pending operation, making it current and advancing the
    /// pending cursor to its successor.
    pub fn advance(&mut self) -> Option<&'r Command> {
        let pending = self.pending?;
        let id = self.operation_at(pending)?;
        self.current = Some(id);
        self.pending = self.next(id);
        match self.node(id).kind {
            NodeKind::Op { command, .. } => Some(command),
            NodeKind::Loop { .. } => None,
        }
    }

    /// Leave the loop of the current node, continuing after its close. If
    /// the close has not been scanned yet the rest of the body is recorded
    /// without being executed.
    pub fn break_loop(&mut self) {
        let Some(current) = self.current else {
            return;
        };
        let Some(loop_id) = self.loop_of(current) else {
            return;
        };
        self.pending = self.next(loop_id);
        if !self.has_more_elements(current) {
            tracing::trace!(node = loop_id.0, "skip mode entered");
            self.skip = Some(loop_id);
        }
    }

    /// Go back to the start of the current loop body, where the loop
    /// condition is checked again.
    pub fn end_loop(&mut self) {
        if let Some(current) = self.current {
            let start = self.rewind_to_start(current);
            debug_assert_eq!(
                self.loop_of(current).and_then(|l| self.first_of(l)),
                Some(start)
            );
            tracing::trace!(from = current.0, to = start.0, "loop rewound");
            self.pending = Some(start);
        }
    }

    /// Fails if any loop was left open.
    pub fn validate(&self) -> Result<()> {
        if self.open.is_empty() {
            Ok(())
        } else {
            Err(Error::UnterminatedLoop(self.open.len()))
        }
    }

    /// Human-readable listing of the recorded skeleton, one node per line,
    /// loop bodies indented under their loop node.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        // Node 0 is always the head of the top-level chain.
        if !self.nodes.is_empty() {
            self.outline_chain(NodeId(0), 0, &mut out);
        }
        out
    }

    fn outline_chain(&self, from: NodeId, depth: usize, out: &mut String) {
        let mut at = Some(from);
        while let Some(id) = at {
            let indent = "  ".repeat(depth);
            match self.node(id).kind {
                NodeKind::Op { command, .. } => {
                    let _ = writeln!(out, "{indent}{:>4}  {}", id.0, char::from(command.token()));
                }
                NodeKind::Loop { first, .. } => {
                    let _ = writeln!(out, "{indent}{:>4}  loop", id.0);
                    if let Some(first) = first {
                        self.outline_chain(first, depth + 1, out);
                    }
                }
            }
            at = self.next(id);
        }
    }

    fn first_of(&self, loop_id: NodeId) -> Option<NodeId> {
        match self.node(loop_id).kind {
            NodeKind::Loop { first, .. } => first,
            NodeKind::Op { .. } => None,
        }
    }

    /// Resolve a pending node to the operation to run: a loop node stands
    /// for the first node of its body.
    fn operation_at(&self, id: NodeId) -> Option<NodeId> {
        match self.node(id).kind {
            NodeKind::Op { .. } => Some(id),
            NodeKind::Loop { first, .. } => first,
        }
    }

    fn link_after_tail(&mut self, id: NodeId) {
        if let Some(tail) = self.tail {
            self.node_mut(tail).link.next = Some(id);
            self.node_mut(id).link.prev = Some(tail);
        }
    }

    fn push(&mut self, kind: NodeKind<'r>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            link: Link::default(),
            kind,
        });
        id
    }

    fn node(&self, id: NodeId) -> &Node<'r> {
        &self.nodes[id.index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<'r> {
        &mut self.nodes[id.index()]
    }
}
