//! Fixed mode: a fixed number of stored coordinates per parent.
//!
//! The fanout lives in a one-element `size` array (slot 0); coordinates
//! live in a `crd` array (slot 1) of stride `size[0]`. Position iteration
//! is the strided segment `parent_pos * size[0] .. (parent_pos + 1) * size[0]`.

use std::rc::Rc;

use tengen_ir::{ComponentType, Expr, Stmt};

use crate::mode::Mode;
use crate::mode_type::{
    ModeCapabilities, ModeIterator, ModeLookup, ModeProperties, ModeType, ModeTypeImpl,
};

/// Array slot of the one-element fanout array.
pub const SIZE_SLOT: usize = 0;
/// Array slot of the coordinate array.
pub const CRD_SLOT: usize = 1;

pub struct FixedMode;

impl FixedMode {
    fn size_array(&self, mode: &Mode) -> Expr {
        mode.memo_var("size", || {
            Expr::ptr(format!("{}_size", mode.name()), ComponentType::Int)
        })
    }

    fn crd_array(&self, mode: &Mode) -> Expr {
        mode.memo_var("crd", || {
            Expr::ptr(format!("{}_crd", mode.name()), ComponentType::Int)
        })
    }

    fn fanout(&self, mode: &Mode) -> Expr {
        Expr::load(self.size_array(mode), Expr::int(0))
    }
}

impl ModeTypeImpl for FixedMode {
    fn pos_iter(&self, parent_pos: &Expr, mode: &Mode) -> ModeIterator {
        let fanout = self.fanout(mode);
        let begin = Expr::mul(parent_pos.clone(), fanout.clone());
        let end = Expr::mul(Expr::add(parent_pos.clone(), Expr::int(1)), fanout);
        ModeIterator::new(None, begin, end)
    }

    fn pos_access(&self, pos: &Expr, _coords: &[Expr], mode: &Mode) -> ModeLookup {
        let crd = self.crd_array(mode);
        ModeLookup::new(None, Expr::load(crd, pos.clone()), Expr::bool_(true))
    }

    fn append_coord(&self, pos: &Expr, coord: &Expr, mode: &Mode) -> Option<Stmt> {
        let crd = self.crd_array(mode);
        Some(Stmt::store(crd, pos.clone(), coord.clone()))
    }

    fn append_edges(
        &self,
        _parent_pos: &Expr,
        _p_begin: &Expr,
        _p_end: &Expr,
        _mode: &Mode,
    ) -> Option<Stmt> {
        // stride is fixed, no edge bookkeeping
        Some(Stmt::empty_block())
    }

    fn append_init_level(&self, _size_prev: &Expr, _size: &Expr, _mode: &Mode) -> Option<Stmt> {
        Some(Stmt::empty_block())
    }

    fn append_finalize_level(&self, _size_prev: &Expr, _size: &Expr, _mode: &Mode) -> Option<Stmt> {
        Some(Stmt::empty_block())
    }

    fn array(&self, slot: usize, mode: &Mode) -> Option<Expr> {
        match slot {
            SIZE_SLOT => Some(self.size_array(mode)),
            CRD_SLOT => Some(self.crd_array(mode)),
            _ => None,
        }
    }
}

/// The `fixed` mode type.
pub fn mode_type() -> ModeType {
    ModeType::new(
        "fixed",
        ModeProperties {
            full: false,
            ordered: true,
            unique: true,
            branchless: true,
            compact: true,
        },
        ModeCapabilities {
            coord_val_iter: false,
            coord_pos_iter: true,
            locate: false,
            insert: false,
            append: true,
        },
        Rc::new(FixedMode),
    )
}
