//! Pipe tree: steps, sequences of steps, and nested groups
//!
//! The tree is declared once when a handler is built and never changes
//! afterwards, so it can be shared by every concurrent invocation.

use super::step::Step;

/// A node of the pipe tree
#[derive(Debug, Clone)]
pub enum PipeNode<I> {
    /// A bare step; a stop here propagates to the parent group
    Step(Step<I>),

    /// Ordered steps; a stop ends the sequence but not the parent group
    Sequence(Vec<Step<I>>),

    /// A nested group; a stop inside propagates further up, and an empty
    /// group counts as a stop
    Group(PipeGroup<I>),
}

impl<I> From<Step<I>> for PipeNode<I> {
    fn from(step: Step<I>) -> Self {
        PipeNode::Step(step)
    }
}

impl<I> From<Vec<Step<I>>> for PipeNode<I> {
    fn from(steps: Vec<Step<I>>) -> Self {
        PipeNode::Sequence(steps)
    }
}

impl<I> From<PipeGroup<I>> for PipeNode<I> {
    fn from(group: PipeGroup<I>) -> Self {
        PipeNode::Group(group)
    }
}

/// Ordered list of pipe nodes; the root of every pipe tree
#[derive(Debug, Clone)]
pub struct PipeGroup<I> {
    nodes: Vec<PipeNode<I>>,
}

impl<I> Default for PipeGroup<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I> PipeGroup<I> {
    /// Create an empty group
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Append any node
    pub fn push(&mut self, node: impl Into<PipeNode<I>>) {
        self.nodes.push(node.into());
    }

    /// Append a bare step
    pub fn step(mut self, step: Step<I>) -> Self {
        self.nodes.push(PipeNode::Step(step));
        self
    }

    /// Append a sequence of steps
    pub fn sequence(mut self, steps: impl IntoIterator<Item = Step<I>>) -> Self {
        self.nodes
            .push(PipeNode::Sequence(steps.into_iter().collect()));
        self
    }

    /// Append a nested group
    pub fn group(mut self, group: PipeGroup<I>) -> Self {
        self.nodes.push(PipeNode::Group(group));
        self
    }

    /// Child nodes in declaration order
    pub fn nodes(&self) -> &[PipeNode<I>] {
        &self.nodes
    }

    /// Number of direct children
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the group has no children
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Total number of steps anywhere below this group
    pub fn step_count(&self) -> usize {
        self.nodes
            .iter()
            .map(|node| match node {
                PipeNode::Step(_) => 1,
                PipeNode::Sequence(steps) => steps.len(),
                PipeNode::Group(group) => group.step_count(),
            })
            .sum()
    }

    /// Nesting depth; a group without nested groups has depth 1
    pub fn depth(&self) -> usize {
        1 + self
            .nodes
            .iter()
            .filter_map(|node| match node {
                PipeNode::Group(group) => Some(group.depth()),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }
}

impl<I> FromIterator<PipeNode<I>> for PipeGroup<I> {
    fn from_iter<T: IntoIterator<Item = PipeNode<I>>>(iter: T) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}
