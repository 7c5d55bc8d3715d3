//! Index notation for tensor assignments.
//!
//! A kernel is described by an [`Assignment`]: a left-hand [`Access`]
//! (the result tensor applied to index variables) and a right-hand
//! [`IndexExpr`] combining accesses, literals, products and sums.
//! Index variables are single characters, einsum-style. This is a
//! construction API; parsing a surface expression language is a
//! front-end concern and lives elsewhere.
//!
//! # Examples
//!
//! ```
//! use tengen_lower::notation::{Assignment, IndexExpr, TensorVar};
//! use tengen_ir::ComponentType;
//!
//! // y(i) = A(i,j) * x(j), with A stored as CSR
//! let a = TensorVar::new("A", "ds", ComponentType::Double).unwrap();
//! let x = TensorVar::new("x", "d", ComponentType::Double).unwrap();
//! let y = TensorVar::new("y", "d", ComponentType::Double).unwrap();
//!
//! let spmv = Assignment::new(
//!     y.access("i"),
//!     IndexExpr::mul(a.access("ij").into(), x.access("j").into()),
//! );
//! assert_eq!(spmv.index_order(), vec!['i', 'j']);
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;
use tengen_ir::ComponentType;
use tengen_format::tree::{TreeLevel, TreeLevelRef};
use tengen_format::FormatError;

/// Index variables of one access; short in practice.
pub type IndexVars = SmallVec<[char; 4]>;

struct TensorVarInner {
    name: String,
    format: TreeLevelRef,
    component: ComponentType,
}

/// A declared tensor operand: name, storage format and component type.
#[derive(Clone)]
pub struct TensorVar {
    inner: Rc<TensorVarInner>,
}

impl TensorVar {
    /// Declare a tensor with a format string (see
    /// [`TreeLevel::parse`]).
    pub fn new(
        name: impl Into<String>,
        format: &str,
        component: ComponentType,
    ) -> Result<TensorVar, FormatError> {
        Ok(TensorVar::with_format(
            name,
            TreeLevel::parse(format)?,
            component,
        ))
    }

    /// Declare a tensor with an already-built format tree.
    pub fn with_format(
        name: impl Into<String>,
        format: TreeLevelRef,
        component: ComponentType,
    ) -> TensorVar {
        TensorVar {
            inner: Rc::new(TensorVarInner {
                name: name.into(),
                format,
                component,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn format(&self) -> &TreeLevelRef {
        &self.inner.format
    }

    pub fn component(&self) -> ComponentType {
        self.inner.component
    }

    /// Number of index dimensions.
    pub fn order(&self) -> usize {
        self.inner.format.order()
    }

    /// Apply the tensor to index variables, e.g. `a.access("ij")`.
    pub fn access(&self, indices: &str) -> Access {
        Access {
            tensor: self.clone(),
            indices: indices.chars().collect(),
        }
    }
}

impl fmt::Debug for TensorVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.inner.name, self.inner.format, self.inner.component
        )
    }
}

/// A tensor applied to index variables, e.g. `A(i,j)`.
#[derive(Debug, Clone)]
pub struct Access {
    pub tensor: TensorVar,
    pub indices: IndexVars,
}

impl Access {
    /// Key identifying this access shape within one assignment.
    pub fn key(&self) -> String {
        let indices: String = self.indices.iter().collect();
        format!("{}({})", self.tensor.name(), indices)
    }

    /// Whether the access uses the given index variable.
    pub fn uses(&self, index: char) -> bool {
        self.indices.contains(&index)
    }

    /// The level at which the access uses the index variable.
    pub fn level_of(&self, index: char) -> Option<usize> {
        self.indices.iter().position(|&c| c == index)
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// The access of a single mode of an [`Access`]. `A(i,j)` consists of
/// two mode accesses, `A@0` and `A@1`. Ordered so it can key maps during
/// lowering.
#[derive(Debug, Clone)]
pub struct ModeAccess {
    pub access: Access,
    pub mode: usize,
}

impl ModeAccess {
    pub fn new(access: Access, mode: usize) -> ModeAccess {
        ModeAccess { access, mode }
    }

    fn sort_key(&self) -> (String, usize) {
        (self.access.key(), self.mode)
    }
}

impl PartialEq for ModeAccess {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
    }
}

impl Eq for ModeAccess {}

impl PartialOrd for ModeAccess {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ModeAccess {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

/// Right-hand-side expression over accesses.
#[derive(Debug, Clone)]
pub enum IndexExpr {
    Access(Access),
    Literal(f64),
    Mul(Box<IndexExpr>, Box<IndexExpr>),
    Add(Box<IndexExpr>, Box<IndexExpr>),
}

impl IndexExpr {
    pub fn mul(lhs: IndexExpr, rhs: IndexExpr) -> IndexExpr {
        IndexExpr::Mul(Box::new(lhs), Box::new(rhs))
    }

    pub fn add(lhs: IndexExpr, rhs: IndexExpr) -> IndexExpr {
        IndexExpr::Add(Box::new(lhs), Box::new(rhs))
    }

    /// All accesses, left-to-right.
    pub fn accesses(&self) -> Vec<&Access> {
        let mut out = Vec::new();
        self.collect_accesses(&mut out);
        out
    }

    fn collect_accesses<'a>(&'a self, out: &mut Vec<&'a Access>) {
        match self {
            IndexExpr::Access(a) => out.push(a),
            IndexExpr::Literal(_) => {}
            IndexExpr::Mul(lhs, rhs) | IndexExpr::Add(lhs, rhs) => {
                lhs.collect_accesses(out);
                rhs.collect_accesses(out);
            }
        }
    }

    /// Index variables in order of first appearance.
    pub fn index_vars(&self) -> Vec<char> {
        let mut out = Vec::new();
        for access in self.accesses() {
            for &c in &access.indices {
                if !out.contains(&c) {
                    out.push(c);
                }
            }
        }
        out
    }
}

impl From<Access> for IndexExpr {
    fn from(access: Access) -> IndexExpr {
        IndexExpr::Access(access)
    }
}

/// A tensor assignment `lhs = rhs`.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub lhs: Access,
    pub rhs: IndexExpr,
}

impl Assignment {
    pub fn new(lhs: Access, rhs: IndexExpr) -> Assignment {
        Assignment { lhs, rhs }
    }

    /// Loop order: LHS indices first, then contracted indices in order
    /// of first RHS appearance.
    pub fn index_order(&self) -> Vec<char> {
        let mut order: Vec<char> = self.lhs.indices.iter().copied().collect();
        for c in self.rhs.index_vars() {
            if !order.contains(&c) {
                order.push(c);
            }
        }
        order
    }

    /// Indices summed over (present on the right, absent on the left).
    pub fn contracted_indices(&self) -> Vec<char> {
        self.rhs
            .index_vars()
            .into_iter()
            .filter(|c| !self.lhs.uses(*c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spmv() -> Assignment {
        let a = TensorVar::new("A", "ds", ComponentType::Double).unwrap();
        let x = TensorVar::new("x", "d", ComponentType::Double).unwrap();
        let y = TensorVar::new("y", "d", ComponentType::Double).unwrap();
        Assignment::new(
            y.access("i"),
            IndexExpr::mul(a.access("ij").into(), x.access("j").into()),
        )
    }

    #[test]
    fn test_index_order_and_contraction() {
        let assign = spmv();
        assert_eq!(assign.index_order(), vec!['i', 'j']);
        assert_eq!(assign.contracted_indices(), vec!['j']);
    }

    #[test]
    fn test_access_levels() {
        let a = TensorVar::new("A", "ds", ComponentType::Double).unwrap();
        let access = a.access("ij");
        assert_eq!(access.level_of('i'), Some(0));
        assert_eq!(access.level_of('j'), Some(1));
        assert_eq!(access.level_of('k'), None);
        assert!(access.uses('i'));
    }

    #[test]
    fn test_mode_access_ordering() {
        let a = TensorVar::new("A", "ds", ComponentType::Double).unwrap();
        let m0 = ModeAccess::new(a.access("ij"), 0);
        let m1 = ModeAccess::new(a.access("ij"), 1);
        assert!(m0 < m1);
        assert_eq!(m0, ModeAccess::new(a.access("ij"), 0));
    }

    #[test]
    fn test_rhs_access_collection() {
        let assign = spmv();
        let keys: Vec<String> = assign.rhs.accesses().iter().map(|a| a.key()).collect();
        assert_eq!(keys, vec!["A(ij)", "x(j)"]);
    }

    #[test]
    fn test_invalid_format_is_reported() {
        let err = TensorVar::new("A", "dq", ComponentType::Double).unwrap_err();
        assert_eq!(
            err,
            FormatError::UnknownCode {
                code: 'q',
                position: 1
            }
        );
    }
}
