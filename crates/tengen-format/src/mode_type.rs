//! The mode-type capability model.
//!
//! A [`ModeType`] describes one storage kind as a record of structural
//! properties, capability bits, and a vtable of code-generating hooks
//! ([`ModeTypeImpl`]). The hooks produce IR *fragments* (statements and
//! expressions to be stitched into a kernel by the lowering driver), not
//! runtime values.
//!
//! Every hook has a default implementation returning the empty fragment
//! ("not applicable"). The capability bits state which hooks a kind
//! actually implements: a false bit means the corresponding primary hook
//! returns an undefined fragment and callers must route around it; a true
//! bit means the hook returns a defined fragment on well-formed inputs.
//! For mutation hooks, a defined empty block is the "supported, nothing
//! to do" answer.

use std::fmt;
use std::rc::Rc;

use tengen_ir::{Expr, Stmt};

use crate::mode::Mode;

/// Structural properties of a mode's stored coordinate set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeProperties {
    /// Every coordinate in the mode's range is stored.
    pub full: bool,
    /// Stored coordinates increase.
    pub ordered: bool,
    /// No duplicate coordinates.
    pub unique: bool,
    /// Single child per parent coordinate.
    pub branchless: bool,
    /// No gaps between stored coordinates of one parent.
    pub compact: bool,
}

/// Which iteration and mutation strategies a mode kind implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeCapabilities {
    /// Iterate coordinates directly (range loop).
    pub coord_val_iter: bool,
    /// Iterate stored positions (segment loop).
    pub coord_pos_iter: bool,
    /// Find the position of a given coordinate.
    pub locate: bool,
    /// Random-order insertion of coordinates.
    pub insert: bool,
    /// In-order appending of coordinates.
    pub append: bool,
}

impl ModeCapabilities {
    /// No capabilities at all (extension-point kinds).
    pub const NONE: ModeCapabilities = ModeCapabilities {
        coord_val_iter: false,
        coord_pos_iter: false,
        locate: false,
        insert: false,
        append: false,
    };
}

/// Iteration-bounds fragment: an optional setup statement plus begin/end
/// expressions. Undefined begin/end means the strategy is unsupported.
#[derive(Debug, Clone, Default)]
pub struct ModeIterator {
    pub setup: Option<Stmt>,
    pub begin: Option<Expr>,
    pub end: Option<Expr>,
}

impl ModeIterator {
    /// The "not applicable" fragment.
    pub fn undefined() -> ModeIterator {
        ModeIterator::default()
    }

    /// A defined fragment.
    pub fn new(setup: Option<Stmt>, begin: Expr, end: Expr) -> ModeIterator {
        ModeIterator {
            setup,
            begin: Some(begin),
            end: Some(end),
        }
    }

    /// Whether the fragment carries usable bounds.
    pub fn is_defined(&self) -> bool {
        self.begin.is_some() && self.end.is_some()
    }
}

/// Access/locate fragment: an optional guard/setup statement, a result
/// expression (a coordinate for position access, a position for
/// coordinate access and locate) and a validity flag.
#[derive(Debug, Clone, Default)]
pub struct ModeLookup {
    pub setup: Option<Stmt>,
    pub result: Option<Expr>,
    pub valid: Option<Expr>,
}

impl ModeLookup {
    /// The "not applicable" fragment.
    pub fn undefined() -> ModeLookup {
        ModeLookup::default()
    }

    /// A defined fragment.
    pub fn new(setup: Option<Stmt>, result: Expr, valid: Expr) -> ModeLookup {
        ModeLookup {
            setup,
            result: Some(result),
            valid: Some(valid),
        }
    }

    /// Whether the fragment carries a usable result.
    pub fn is_defined(&self) -> bool {
        self.result.is_some()
    }

    /// Whether the validity flag is statically true, so callers can skip
    /// the guard.
    pub fn always_valid(&self) -> bool {
        self.valid.as_ref().map(Expr::is_true_literal).unwrap_or(false)
    }
}

/// Vtable of code-generating hooks for one storage kind.
///
/// All methods default to the empty fragment. Implementations override
/// exactly the hooks their capability bits advertise.
pub trait ModeTypeImpl {
    /// Bounds for iterating the mode's coordinate range directly.
    /// `coords` holds the index expressions of the enclosing levels,
    /// innermost last.
    fn coord_iter(&self, coords: &[Expr], mode: &Mode) -> ModeIterator {
        let _ = (coords, mode);
        ModeIterator::undefined()
    }

    /// Child position for a coordinate, given the parent position.
    fn coord_access(&self, parent_pos: &Expr, coords: &[Expr], mode: &Mode) -> ModeLookup {
        let _ = (parent_pos, coords, mode);
        ModeLookup::undefined()
    }

    /// Bounds for iterating the stored positions under a parent position.
    fn pos_iter(&self, parent_pos: &Expr, mode: &Mode) -> ModeIterator {
        let _ = (parent_pos, mode);
        ModeIterator::undefined()
    }

    /// Coordinate stored at a position.
    fn pos_access(&self, pos: &Expr, coords: &[Expr], mode: &Mode) -> ModeLookup {
        let _ = (pos, coords, mode);
        ModeLookup::undefined()
    }

    /// Position of a target coordinate under a parent position, with a
    /// found flag.
    fn locate(&self, parent_pos: &Expr, coords: &[Expr], mode: &Mode) -> ModeLookup {
        let _ = (parent_pos, coords, mode);
        ModeLookup::undefined()
    }

    /// Record a coordinate at a position (random-order insertion).
    fn insert_coord(&self, pos: &Expr, coords: &[Expr], mode: &Mode) -> Option<Stmt> {
        let _ = (pos, coords, mode);
        None
    }

    /// Prepare the coordinate range `[p_begin, p_end)` for insertion.
    fn insert_init_coords(&self, p_begin: &Expr, p_end: &Expr, mode: &Mode) -> Option<Stmt> {
        let _ = (p_begin, p_end, mode);
        None
    }

    /// Initialize the level's storage for insertion.
    fn insert_init_level(&self, size_prev: &Expr, size: &Expr, mode: &Mode) -> Option<Stmt> {
        let _ = (size_prev, size, mode);
        None
    }

    /// Finalize the level's storage after insertion.
    fn insert_finalize_level(&self, size_prev: &Expr, size: &Expr, mode: &Mode) -> Option<Stmt> {
        let _ = (size_prev, size, mode);
        None
    }

    /// Record a coordinate at a position (in-order append).
    fn append_coord(&self, pos: &Expr, coord: &Expr, mode: &Mode) -> Option<Stmt> {
        let _ = (pos, coord, mode);
        None
    }

    /// Record the edge range `[p_begin, p_end)` produced under a parent
    /// position.
    fn append_edges(
        &self,
        parent_pos: &Expr,
        p_begin: &Expr,
        p_end: &Expr,
        mode: &Mode,
    ) -> Option<Stmt> {
        let _ = (parent_pos, p_begin, p_end, mode);
        None
    }

    /// Prepare edge bookkeeping for parents in `[p_prev_begin, p_prev_end)`.
    fn append_init_edges(
        &self,
        p_prev_begin: &Expr,
        p_prev_end: &Expr,
        mode: &Mode,
    ) -> Option<Stmt> {
        let _ = (p_prev_begin, p_prev_end, mode);
        None
    }

    /// Initialize the level's storage for appending.
    fn append_init_level(&self, size_prev: &Expr, size: &Expr, mode: &Mode) -> Option<Stmt> {
        let _ = (size_prev, size, mode);
        None
    }

    /// Finalize the level's storage after appending.
    fn append_finalize_level(&self, size_prev: &Expr, size: &Expr, mode: &Mode) -> Option<Stmt> {
        let _ = (size_prev, size, mode);
        None
    }

    /// The number of coordinates this level can hold, if statically known
    /// to the kind.
    fn size(&self, mode: &Mode) -> Option<Expr> {
        let _ = mode;
        None
    }

    /// The physical array at `slot`, if this kind owns one.
    fn array(&self, slot: usize, mode: &Mode) -> Option<Expr> {
        let _ = (slot, mode);
        None
    }
}

/// A storage kind: name, properties, capabilities and hook vtable.
///
/// Cheap to clone; registered once per process and shared read-only.
#[derive(Clone)]
pub struct ModeType {
    inner: Rc<ModeTypeInner>,
}

struct ModeTypeInner {
    name: String,
    props: ModeProperties,
    caps: ModeCapabilities,
    ops: Rc<dyn ModeTypeImpl>,
}

impl ModeType {
    pub fn new(
        name: impl Into<String>,
        props: ModeProperties,
        caps: ModeCapabilities,
        ops: Rc<dyn ModeTypeImpl>,
    ) -> ModeType {
        ModeType {
            inner: Rc::new(ModeTypeInner {
                name: name.into(),
                props,
                caps,
                ops,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn properties(&self) -> ModeProperties {
        self.inner.props
    }

    pub fn capabilities(&self) -> ModeCapabilities {
        self.inner.caps
    }

    pub fn is_full(&self) -> bool {
        self.inner.props.full
    }

    pub fn is_ordered(&self) -> bool {
        self.inner.props.ordered
    }

    pub fn is_unique(&self) -> bool {
        self.inner.props.unique
    }

    pub fn is_branchless(&self) -> bool {
        self.inner.props.branchless
    }

    pub fn is_compact(&self) -> bool {
        self.inner.props.compact
    }

    pub fn has_coord_val_iter(&self) -> bool {
        self.inner.caps.coord_val_iter
    }

    pub fn has_coord_pos_iter(&self) -> bool {
        self.inner.caps.coord_pos_iter
    }

    pub fn has_locate(&self) -> bool {
        self.inner.caps.locate
    }

    pub fn has_insert(&self) -> bool {
        self.inner.caps.insert
    }

    pub fn has_append(&self) -> bool {
        self.inner.caps.append
    }

    /// The hook vtable.
    pub fn ops(&self) -> &Rc<dyn ModeTypeImpl> {
        &self.inner.ops
    }
}

impl fmt::Debug for ModeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModeType")
            .field("name", &self.inner.name)
            .field("props", &self.inner.props)
            .field("caps", &self.inner.caps)
            .finish()
    }
}

impl PartialEq for ModeType {
    fn eq(&self, other: &Self) -> bool {
        self.inner.name == other.inner.name
    }
}

impl Eq for ModeType {}
