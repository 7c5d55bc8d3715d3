//! Per-compilation mode instances and mode packs.
//!
//! A [`Mode`] instantiates a [`ModeType`] at one level of one tensor
//! operand for the duration of a single lowering. It carries the
//! operand's IR handle, the dimension size expression, the level index,
//! and a keyed map of working variables that hooks memoize across calls.
//!
//! A [`ModePack`] groups consecutive modes whose physical arrays are
//! interleaved. Every mode holds a non-owning reference back to its pack;
//! the pack owns its modes. Both are cheap-clone handles scoped to one
//! compilation.
//!
//! The undefined/default-constructed mode of collections that must fill a
//! slot before assignment is modeled as `Option<Mode>` at the use site;
//! there is no null-interior `Mode`.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use tengen_ir::Expr;

use crate::mode_type::ModeType;

struct ModeInner {
    tensor: Expr,
    size: Expr,
    level: usize,
    mode_type: ModeType,
    parent_mode_type: Option<ModeType>,
    pack: RefCell<Weak<ModePackInner>>,
    pack_pos: Cell<usize>,
    vars: RefCell<HashMap<String, Expr>>,
}

/// One level of one tensor operand during a single lowering.
#[derive(Clone)]
pub struct Mode {
    inner: Rc<ModeInner>,
}

impl Mode {
    /// Create a mode. `tensor` must be a variable expression; `size` is
    /// the dimension extent (itself an IR expression); `level` is
    /// 0-based, outermost first. The pack back-reference is wired by
    /// [`ModePack::new`].
    pub fn new(
        tensor: Expr,
        size: Expr,
        level: usize,
        mode_type: ModeType,
        parent_mode_type: Option<ModeType>,
    ) -> Mode {
        if tensor.as_var().is_none() {
            panic!(
                "ill-formed mode: tensor handle {:?} is not a variable",
                tensor
            );
        }
        Mode {
            inner: Rc::new(ModeInner {
                tensor,
                size,
                level,
                mode_type,
                parent_mode_type,
                pack: RefCell::new(Weak::new()),
                pack_pos: Cell::new(0),
                vars: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// `<tensor><level+1>`, e.g. `A2` for the second level of `A`.
    pub fn name(&self) -> String {
        let tensor = &self.inner.tensor.as_var().expect("checked at construction").name;
        format!("{}{}", tensor, self.inner.level + 1)
    }

    /// The operand's IR handle.
    pub fn tensor(&self) -> &Expr {
        &self.inner.tensor
    }

    /// The dimension extent.
    pub fn size(&self) -> &Expr {
        &self.inner.size
    }

    /// 0-based level in the mode hierarchy, outermost first.
    pub fn level(&self) -> usize {
        self.inner.level
    }

    pub fn mode_type(&self) -> &ModeType {
        &self.inner.mode_type
    }

    /// The type of the parent level; `None` at level 0.
    pub fn parent_mode_type(&self) -> Option<&ModeType> {
        self.inner.parent_mode_type.as_ref()
    }

    /// The pack containing this mode. Panics if the mode was never put
    /// in a pack or the pack has been dropped.
    pub fn pack(&self) -> ModePack {
        ModePack {
            inner: self
                .inner
                .pack
                .borrow()
                .upgrade()
                .expect("mode queried outside its pack's lifetime"),
        }
    }

    /// Position of this mode within its pack.
    pub fn pack_pos(&self) -> usize {
        self.inner.pack_pos.get()
    }

    /// Whether a working variable is bound under `name`.
    pub fn has_var(&self, name: &str) -> bool {
        self.inner.vars.borrow().contains_key(name)
    }

    /// The working variable bound under `name`. Panics if unbound.
    pub fn var(&self, name: &str) -> Expr {
        self.inner
            .vars
            .borrow()
            .get(name)
            .unwrap_or_else(|| panic!("mode {} has no variable `{}`", self.name(), name))
            .clone()
    }

    /// Bind a working variable. The expression must be a variable, and
    /// bindings are write-once within a lowering.
    pub fn add_var(&self, name: impl Into<String>, var: Expr) {
        let name = name.into();
        if var.as_var().is_none() {
            panic!(
                "mode {}: binding `{}` to non-variable {:?}",
                self.name(),
                name,
                var
            );
        }
        let mut vars = self.inner.vars.borrow_mut();
        if vars.contains_key(&name) {
            panic!("mode {}: variable `{}` is already bound", self.name(), name);
        }
        vars.insert(name, var);
    }

    /// Fetch the variable bound under `name`, creating and binding it
    /// with `make` on first use. Hooks memoize their working variables
    /// through this.
    pub fn memo_var(&self, name: &str, make: impl FnOnce() -> Expr) -> Expr {
        if !self.has_var(name) {
            self.add_var(name, make());
        }
        self.var(name)
    }
}

impl fmt::Debug for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mode")
            .field("name", &self.name())
            .field("level", &self.inner.level)
            .field("mode_type", &self.inner.mode_type.name())
            .finish()
    }
}

pub(crate) struct ModePackInner {
    modes: Vec<Mode>,
}

/// A group of consecutive modes with interleaved physical arrays.
#[derive(Clone)]
pub struct ModePack {
    inner: Rc<ModePackInner>,
}

impl ModePack {
    /// Build a pack and wire every member's back-reference and position.
    pub fn new(modes: Vec<Mode>) -> ModePack {
        let inner = Rc::new(ModePackInner { modes });
        for (pos, mode) in inner.modes.iter().enumerate() {
            *mode.inner.pack.borrow_mut() = Rc::downgrade(&inner);
            mode.inner.pack_pos.set(pos);
        }
        ModePack { inner }
    }

    /// Number of modes in the pack.
    pub fn len(&self) -> usize {
        self.inner.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.modes.is_empty()
    }

    /// The modes in pack order.
    pub fn modes(&self) -> &[Mode] {
        &self.inner.modes
    }

    /// The physical array at `slot`: each member mode is asked in order
    /// and the first defined answer wins.
    pub fn array(&self, slot: usize) -> Option<Expr> {
        for mode in &self.inner.modes {
            if let Some(arr) = mode.mode_type().ops().array(slot, mode) {
                return Some(arr);
            }
        }
        None
    }
}

impl fmt::Debug for ModePack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.inner.modes.iter().map(|m| m.name()))
            .finish()
    }
}
