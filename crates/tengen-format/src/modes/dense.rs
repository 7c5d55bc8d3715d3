//! Dense mode: every coordinate in the dimension is stored.
//!
//! Dense levels own no physical arrays; positions are computed as
//! `parent_pos * size + coord`. Coordinate iteration is a range loop over
//! `0..size` and locate is that same identity computation with a
//! statically-true found flag. Insertion needs no bookkeeping because
//! coordinates are implicit.

use std::rc::Rc;

use tengen_ir::{Expr, Stmt};

use crate::mode::Mode;
use crate::mode_type::{
    ModeCapabilities, ModeIterator, ModeLookup, ModeProperties, ModeType, ModeTypeImpl,
};

pub struct DenseMode;

impl DenseMode {
    fn position(&self, parent_pos: &Expr, coords: &[Expr], mode: &Mode) -> Expr {
        let coord = coords
            .last()
            .expect("dense access requires at least one coordinate");
        Expr::add(
            Expr::mul(parent_pos.clone(), mode.size().clone()),
            coord.clone(),
        )
    }
}

impl ModeTypeImpl for DenseMode {
    fn coord_iter(&self, _coords: &[Expr], mode: &Mode) -> ModeIterator {
        ModeIterator::new(None, Expr::int(0), mode.size().clone())
    }

    fn coord_access(&self, parent_pos: &Expr, coords: &[Expr], mode: &Mode) -> ModeLookup {
        ModeLookup::new(
            None,
            self.position(parent_pos, coords, mode),
            Expr::bool_(true),
        )
    }

    fn locate(&self, parent_pos: &Expr, coords: &[Expr], mode: &Mode) -> ModeLookup {
        ModeLookup::new(
            None,
            self.position(parent_pos, coords, mode),
            Expr::bool_(true),
        )
    }

    fn insert_coord(&self, _pos: &Expr, _coords: &[Expr], _mode: &Mode) -> Option<Stmt> {
        Some(Stmt::empty_block())
    }

    fn insert_init_coords(&self, _p_begin: &Expr, _p_end: &Expr, _mode: &Mode) -> Option<Stmt> {
        Some(Stmt::empty_block())
    }

    fn insert_init_level(&self, _size_prev: &Expr, _size: &Expr, _mode: &Mode) -> Option<Stmt> {
        Some(Stmt::empty_block())
    }

    fn insert_finalize_level(&self, _size_prev: &Expr, _size: &Expr, _mode: &Mode) -> Option<Stmt> {
        Some(Stmt::empty_block())
    }

    fn size(&self, mode: &Mode) -> Option<Expr> {
        Some(mode.size().clone())
    }
}

/// The `dense` mode type.
pub fn mode_type() -> ModeType {
    ModeType::new(
        "dense",
        ModeProperties {
            full: true,
            ordered: true,
            unique: true,
            branchless: true,
            compact: true,
        },
        ModeCapabilities {
            coord_val_iter: true,
            coord_pos_iter: false,
            locate: true,
            insert: true,
            append: false,
        },
        Rc::new(DenseMode),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tengen_ir::ComponentType;

    fn mode() -> Mode {
        Mode::new(
            Expr::ptr("A", ComponentType::Double),
            Expr::var("N", ComponentType::Int),
            0,
            mode_type(),
            None,
        )
    }

    #[test]
    fn test_coord_iter_is_range() {
        let mode = mode();
        let iter = mode.mode_type().ops().coord_iter(&[], &mode);
        assert!(iter.is_defined());
        assert!(iter.setup.is_none());
        assert!(iter.begin.unwrap().is_int_literal(0));
        assert!(Expr::same(&iter.end.unwrap(), mode.size()));
    }

    #[test]
    fn test_locate_at_root_is_identity() {
        let mode = mode();
        let i = Expr::var("i", ComponentType::Int);
        let lookup = mode
            .mode_type()
            .ops()
            .locate(&Expr::int(0), &[i.clone()], &mode);
        assert!(lookup.always_valid());
        // parent position 0 folds away entirely
        assert!(Expr::same(&lookup.result.unwrap(), &i));
    }

    #[test]
    fn test_insert_hooks_are_vacuous() {
        let mode = mode();
        let stmt = mode
            .mode_type()
            .ops()
            .insert_coord(&Expr::int(0), &[], &mode)
            .unwrap();
        assert!(stmt.is_empty_block());
    }
}
