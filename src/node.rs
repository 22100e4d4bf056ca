//! Condition tree nodes.
//!
//! A node is either a leaf carrying one [`Filter`] or an AND/OR branch over
//! its children; both kinds are valid roots. A root grown through
//! [`add_child`](Node::add_child) is always a branch, since adding to a
//! leaf pushes it down into the child list.

use std::{fmt, sync::Arc};

use crate::{bitmap::Selection, error::FilterError, filter::Filter};

/// One node of a condition tree.
#[derive(Debug, Default)]
pub struct Node {
    pub(crate) filter: Option<Filter>,
    pub(crate) or_kind: bool,
    pub(crate) children: Vec<Node>,
    pub(crate) skip: bool,
    pub(crate) bits: Option<Selection>,
}

impl Node {
    /// Empty AND branch.
    #[must_use]
    pub fn and(children: Vec<Node>) -> Self {
        Self {
            children,
            ..Self::default()
        }
    }

    /// Empty OR branch.
    #[must_use]
    pub fn or(children: Vec<Node>) -> Self {
        Self {
            or_kind: true,
            children,
            ..Self::default()
        }
    }

    /// Leaf around a single filter.
    #[must_use]
    pub fn leaf(filter: Filter) -> Self {
        Self {
            filter: Some(filter),
            ..Self::default()
        }
    }

    /// Adds a child, lifting a leaf root into a branch and splicing plain
    /// same-kind branches instead of nesting them.
    pub fn add_child(&mut self, node: Node) {
        if let Some(filter) = self.filter.take() {
            self.children.push(Node::leaf(filter));
        }
        if !node.is_leaf()
            && node.or_kind == self.or_kind
            && !node.skip
            && node.bits.is_none()
            && !node.children.is_empty()
        {
            self.children.extend(node.children);
        } else {
            self.children.push(node);
        }
    }

    /// Adds a leaf child.
    pub fn add_leaf(&mut self, filter: Filter) {
        self.add_child(Node::leaf(filter));
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.filter.is_some()
    }

    /// True for a branch with nothing underneath.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filter.is_none() && self.children.is_empty()
    }

    #[must_use]
    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    #[must_use]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// True for OR branches.
    #[must_use]
    pub fn is_or(&self) -> bool {
        self.or_kind
    }

    /// Marks this subtree as already resolved; the evaluator and optimizer
    /// will not touch it again.
    pub fn set_skip(&mut self) {
        self.skip = true;
    }

    #[must_use]
    pub fn is_skip(&self) -> bool {
        self.skip
    }

    /// Installs a pre-computed selection for this subtree (index
    /// resolution). Must happen strictly before evaluation starts.
    pub fn set_bits(&mut self, bits: Selection) {
        self.bits = Some(bits);
    }

    #[must_use]
    pub fn cached_bits(&self) -> Option<&Selection> {
        self.bits.as_ref()
    }

    /// Number of leaves.
    #[must_use]
    pub fn size(&self) -> usize {
        if self.is_leaf() {
            1
        } else {
            self.children.iter().map(Node::size).sum()
        }
    }

    /// Height of the tree; a leaf counts 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        if self.is_leaf() {
            1
        } else {
            1 + self.children.iter().map(Node::depth).max().unwrap_or(0)
        }
    }

    /// Total matcher weight of the subtree; resolved subtrees cost nothing.
    #[must_use]
    pub fn weight(&self) -> usize {
        if self.skip {
            return 0;
        }
        match &self.filter {
            Some(f) => f.weight(),
            None => self.children.iter().map(Node::weight).sum(),
        }
    }

    /// Estimated evaluation cost against `rows` rows.
    #[must_use]
    pub fn cost(&self, rows: usize) -> usize {
        self.weight() * rows
    }

    /// Unique referenced column names, in first-appearance order.
    #[must_use]
    pub fn fields(&self) -> Vec<Arc<str>> {
        let mut out: Vec<Arc<str>> = Vec::new();
        self.walk_leaves(&mut |f| {
            if !out.iter().any(|n| n == f.name()) {
                out.push(f.name().clone());
            }
        });
        out
    }

    /// Unique referenced field ids, sorted.
    #[must_use]
    pub fn field_ids(&self) -> Vec<u16> {
        let mut out = Vec::new();
        self.walk_leaves(&mut |f| out.push(f.id()));
        out.sort_unstable();
        out.dedup();
        out
    }

    fn walk_leaves(&self, visit: &mut impl FnMut(&Filter)) {
        match &self.filter {
            Some(f) => visit(f),
            None => {
                for child in &self.children {
                    child.walk_leaves(visit);
                }
            }
        }
    }

    /// True when the subtree provably matches no row.
    #[must_use]
    pub fn is_no_match(&self) -> bool {
        match &self.filter {
            Some(f) => f.mode() == crate::types::FilterMode::False,
            None if self.children.is_empty() => false,
            None if self.or_kind => self.children.iter().all(Node::is_no_match),
            None => self.children.iter().any(Node::is_no_match),
        }
    }

    /// True when the subtree provably matches every row.
    #[must_use]
    pub fn is_any_match(&self) -> bool {
        match &self.filter {
            Some(f) => f.mode() == crate::types::FilterMode::True,
            None if self.or_kind => self.children.iter().any(Node::is_any_match),
            None => self.children.iter().all(Node::is_any_match),
        }
    }

    /// Checks the subtree structurally, reporting the first violation with
    /// its tree path.
    pub fn validate(&self, path: &str) -> Result<(), FilterError> {
        if let Some(filter) = &self.filter {
            return filter.validate().map_err(|e| e.at(path));
        }
        if self.children.is_empty() {
            return Err(FilterError::EmptyNode(path.to_string()));
        }
        for (i, child) in self.children.iter().enumerate() {
            child.validate(&format!("{path}/{i}"))?;
        }
        Ok(())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.filter {
            Some(filter) => write!(f, "{filter}"),
            None => {
                let sep = if self.or_kind { " OR " } else { " AND " };
                write!(f, "(")?;
                for (i, child) in self.children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(sep)?;
                    }
                    write!(f, "{child}")?;
                }
                write!(f, ")")
            }
        }
    }
}
