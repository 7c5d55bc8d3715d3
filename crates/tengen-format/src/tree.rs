//! Storage format trees.
//!
//! A tensor's layout is an ordered chain of per-level storage strategies,
//! outermost first, terminated by a [`TreeLevel::Values`] leaf. The chain
//! depth equals the tensor's dimensionality plus one: each non-leaf level
//! stores the coordinates of one index dimension, and the leaf stores the
//! actual components.
//!
//! Trees are immutable after construction and compared structurally.
//!
//! # Examples
//!
//! ```
//! use tengen_format::tree::{self, TreeLevel};
//!
//! // CSR: dense rows over compressed columns
//! let csr = TreeLevel::parse("ds").unwrap();
//! assert_eq!(csr, tree::dense(tree::sparse(tree::values())));
//! assert_eq!(csr.to_string(), "dsv");
//! assert_eq!(csr.order(), 2);
//! ```

use std::fmt;
use std::rc::Rc;

use crate::error::FormatError;

/// Shared handle to a format tree node.
pub type TreeLevelRef = Rc<TreeLevel>;

/// One level of a tensor's storage hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeLevel {
    /// Terminal level storing actual component values.
    Values,
    /// Every coordinate in the dimension is stored.
    Dense(TreeLevelRef),
    /// Compressed level storing only nonzero coordinates.
    Sparse(TreeLevelRef),
    /// Fixed number of stored coordinates per parent.
    Fixed(TreeLevelRef),
    /// Duplicated parent-to-child edges.
    Replicated(TreeLevelRef),
}

/// Construct a terminal values level.
pub fn values() -> TreeLevelRef {
    Rc::new(TreeLevel::Values)
}

/// Wrap a subtree in a dense level.
pub fn dense(child: TreeLevelRef) -> TreeLevelRef {
    Rc::new(TreeLevel::Dense(child))
}

/// Wrap a subtree in a compressed sparse level.
pub fn sparse(child: TreeLevelRef) -> TreeLevelRef {
    Rc::new(TreeLevel::Sparse(child))
}

/// Wrap a subtree in a fixed-fanout level.
pub fn fixed(child: TreeLevelRef) -> TreeLevelRef {
    Rc::new(TreeLevel::Fixed(child))
}

/// Wrap a subtree in a replicated level.
pub fn replicated(child: TreeLevelRef) -> TreeLevelRef {
    Rc::new(TreeLevel::Replicated(child))
}

impl TreeLevel {
    /// Parse a format string of single-character level codes, outermost
    /// first, with an implicit values terminator.
    ///
    /// Recognized codes: `d` (dense), `s` (sparse), `f` (fixed),
    /// `r` (replicated). The empty string is the scalar format (a bare
    /// values level).
    ///
    /// # Examples
    ///
    /// ```
    /// use tengen_format::tree::TreeLevel;
    /// use tengen_format::FormatError;
    ///
    /// assert!(TreeLevel::parse("ds").is_ok());
    /// assert_eq!(
    ///     TreeLevel::parse("dqs").unwrap_err(),
    ///     FormatError::UnknownCode { code: 'q', position: 1 }
    /// );
    /// ```
    pub fn parse(format: &str) -> Result<TreeLevelRef, FormatError> {
        for (position, code) in format.chars().enumerate() {
            if !matches!(code, 'd' | 's' | 'f' | 'r') {
                return Err(FormatError::UnknownCode { code, position });
            }
        }
        let mut level = values();
        for code in format.chars().rev() {
            level = match code {
                'd' => dense(level),
                's' => sparse(level),
                'f' => fixed(level),
                'r' => replicated(level),
                _ => unreachable!("validated above"),
            };
        }
        Ok(level)
    }

    /// The sub-level, if any. `None` exactly for [`TreeLevel::Values`].
    pub fn child(&self) -> Option<&TreeLevelRef> {
        match self {
            TreeLevel::Values => None,
            TreeLevel::Dense(child)
            | TreeLevel::Sparse(child)
            | TreeLevel::Fixed(child)
            | TreeLevel::Replicated(child) => Some(child),
        }
    }

    /// Number of coordinate levels (tensor dimensionality).
    pub fn order(&self) -> usize {
        match self.child() {
            Some(child) => 1 + child.order(),
            None => 0,
        }
    }

    /// The single-character code of this level.
    pub fn code(&self) -> char {
        match self {
            TreeLevel::Values => 'v',
            TreeLevel::Dense(_) => 'd',
            TreeLevel::Sparse(_) => 's',
            TreeLevel::Fixed(_) => 'f',
            TreeLevel::Replicated(_) => 'r',
        }
    }

    /// Dispatch to the matching strict visit method.
    pub fn accept(&self, v: &mut dyn TreeVisitorStrict) {
        match self {
            TreeLevel::Values => v.visit_values(self),
            TreeLevel::Dense(_) => v.visit_dense(self),
            TreeLevel::Sparse(_) => v.visit_sparse(self),
            TreeLevel::Fixed(_) => v.visit_fixed(self),
            TreeLevel::Replicated(_) => v.visit_replicated(self),
        }
    }
}

/// Exhaustive visitor over the five level variants.
pub trait TreeVisitorStrict {
    fn visit_values(&mut self, level: &TreeLevel);
    fn visit_dense(&mut self, level: &TreeLevel);
    fn visit_sparse(&mut self, level: &TreeLevel);
    fn visit_fixed(&mut self, level: &TreeLevel);
    fn visit_replicated(&mut self, level: &TreeLevel);
}

/// Permissive visitor: every method defaults to descending into the
/// child level.
pub trait TreeVisitor: Sized {
    fn visit_level(&mut self, level: &TreeLevel) {
        walk_level(self, level);
    }

    fn visit_values(&mut self, level: &TreeLevel) {
        let _ = level;
    }

    fn visit_dense(&mut self, level: &TreeLevel) {
        walk_child(self, level);
    }

    fn visit_sparse(&mut self, level: &TreeLevel) {
        walk_child(self, level);
    }

    fn visit_fixed(&mut self, level: &TreeLevel) {
        walk_child(self, level);
    }

    fn visit_replicated(&mut self, level: &TreeLevel) {
        walk_child(self, level);
    }
}

/// Dispatch a level to the matching permissive visit method.
pub fn walk_level<V: TreeVisitor>(v: &mut V, level: &TreeLevel) {
    match level {
        TreeLevel::Values => v.visit_values(level),
        TreeLevel::Dense(_) => v.visit_dense(level),
        TreeLevel::Sparse(_) => v.visit_sparse(level),
        TreeLevel::Fixed(_) => v.visit_fixed(level),
        TreeLevel::Replicated(_) => v.visit_replicated(level),
    }
}

/// Descend into the child of a non-terminal level.
pub fn walk_child<V: TreeVisitor>(v: &mut V, level: &TreeLevel) {
    if let Some(child) = level.child() {
        v.visit_level(child);
    }
}

/// Renders a tree as its code string, values terminator included.
struct TreeRenderer {
    out: String,
}

impl TreeVisitorStrict for TreeRenderer {
    fn visit_values(&mut self, level: &TreeLevel) {
        self.out.push(level.code());
    }

    fn visit_dense(&mut self, level: &TreeLevel) {
        self.out.push(level.code());
        level.child().expect("dense level has a child").accept(self);
    }

    fn visit_sparse(&mut self, level: &TreeLevel) {
        self.out.push(level.code());
        level.child().expect("sparse level has a child").accept(self);
    }

    fn visit_fixed(&mut self, level: &TreeLevel) {
        self.out.push(level.code());
        level.child().expect("fixed level has a child").accept(self);
    }

    fn visit_replicated(&mut self, level: &TreeLevel) {
        self.out.push(level.code());
        level
            .child()
            .expect("replicated level has a child")
            .accept(self);
    }
}

impl fmt::Display for TreeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut renderer = TreeRenderer { out: String::new() };
        self.accept(&mut renderer);
        write!(f, "{}", renderer.out)
    }
}
