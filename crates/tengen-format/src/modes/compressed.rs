//! Compressed sparse mode.
//!
//! Stores the coordinates of one level in two arrays, the classic
//! CSR/CSF fiber layout: `pos` segments the `crd` array by
//! parent position, so the stored children of parent `p` live at
//! positions `pos[p]..pos[p+1]` and `crd[q]` is the coordinate at
//! position `q`. Both arrays are memoized per-mode as
//! `<tensor><level+1>_pos` / `<tensor><level+1>_crd` working variables.

use std::rc::Rc;

use tengen_ir::{ComponentType, Expr, Stmt};

use crate::mode::Mode;
use crate::mode_type::{
    ModeCapabilities, ModeIterator, ModeLookup, ModeProperties, ModeType, ModeTypeImpl,
};

/// Array slot of the segment-pointer array.
pub const POS_SLOT: usize = 0;
/// Array slot of the coordinate array.
pub const CRD_SLOT: usize = 1;

pub struct CompressedMode;

impl CompressedMode {
    fn pos_array(&self, mode: &Mode) -> Expr {
        mode.memo_var("pos", || {
            Expr::ptr(format!("{}_pos", mode.name()), ComponentType::Int)
        })
    }

    fn crd_array(&self, mode: &Mode) -> Expr {
        mode.memo_var("crd", || {
            Expr::ptr(format!("{}_crd", mode.name()), ComponentType::Int)
        })
    }
}

impl ModeTypeImpl for CompressedMode {
    fn pos_iter(&self, parent_pos: &Expr, mode: &Mode) -> ModeIterator {
        let pos = self.pos_array(mode);
        let begin = Expr::load(pos.clone(), parent_pos.clone());
        let end = Expr::load(pos, Expr::add(parent_pos.clone(), Expr::int(1)));
        ModeIterator::new(None, begin, end)
    }

    fn pos_access(&self, pos: &Expr, _coords: &[Expr], mode: &Mode) -> ModeLookup {
        let crd = self.crd_array(mode);
        ModeLookup::new(None, Expr::load(crd, pos.clone()), Expr::bool_(true))
    }

    /// Binary search for the target coordinate in the parent's segment.
    /// The setup fragment narrows `[lo, hi)` until it collapses; the
    /// found flag re-checks the end bound before reading `crd[lo]`, so
    /// the emitted `&&` short-circuits out-of-segment loads.
    fn locate(&self, parent_pos: &Expr, coords: &[Expr], mode: &Mode) -> ModeLookup {
        let target = coords
            .last()
            .expect("locate requires the target coordinate");
        let pos = self.pos_array(mode);
        let crd = self.crd_array(mode);

        let lo = Expr::var("lo", ComponentType::Int);
        let hi = Expr::var("hi", ComponentType::Int);
        let mid = Expr::var("mid", ComponentType::Int);
        // int flag so it declares cleanly in emitted C
        let found = Expr::var("found", ComponentType::Int);

        let segment_end = Expr::load(pos.clone(), Expr::add(parent_pos.clone(), Expr::int(1)));

        let narrow = Stmt::block(vec![
            Stmt::assign(
                mid.clone(),
                Expr::div(Expr::add(lo.clone(), hi.clone()), Expr::int(2)),
            ),
            Stmt::if_then_else(
                Expr::lt(Expr::load(crd.clone(), mid.clone()), target.clone()),
                Stmt::assign(lo.clone(), Expr::add(mid.clone(), Expr::int(1))),
                Stmt::assign(hi.clone(), mid.clone()),
            ),
        ]);

        let setup = Stmt::block(vec![
            Stmt::assign(lo.clone(), Expr::load(pos, parent_pos.clone())),
            Stmt::assign(hi.clone(), segment_end.clone()),
            Stmt::while_(Expr::lt(lo.clone(), hi.clone()), narrow),
            Stmt::assign(
                found.clone(),
                Expr::and(
                    Expr::lt(lo.clone(), segment_end),
                    Expr::eq(Expr::load(crd, lo.clone()), target.clone()),
                ),
            ),
        ]);

        ModeLookup::new(Some(setup), lo, found)
    }

    fn append_coord(&self, pos: &Expr, coord: &Expr, mode: &Mode) -> Option<Stmt> {
        let crd = self.crd_array(mode);
        Some(Stmt::store(crd, pos.clone(), coord.clone()))
    }

    fn append_edges(
        &self,
        parent_pos: &Expr,
        p_begin: &Expr,
        p_end: &Expr,
        mode: &Mode,
    ) -> Option<Stmt> {
        let pos = self.pos_array(mode);
        Some(Stmt::store(
            pos,
            Expr::add(parent_pos.clone(), Expr::int(1)),
            Expr::sub(p_end.clone(), p_begin.clone()),
        ))
    }

    fn append_init_edges(
        &self,
        p_prev_begin: &Expr,
        p_prev_end: &Expr,
        mode: &Mode,
    ) -> Option<Stmt> {
        let pos = self.pos_array(mode);
        let p = Expr::var("p", ComponentType::Int);
        let body = Stmt::store(pos, Expr::add(p.clone(), Expr::int(1)), Expr::int(0));
        Some(Stmt::for_(
            p,
            p_prev_begin.clone(),
            p_prev_end.clone(),
            body,
        ))
    }

    fn append_init_level(&self, size_prev: &Expr, _size: &Expr, mode: &Mode) -> Option<Stmt> {
        let pos = self.pos_array(mode);
        let p = Expr::var("p", ComponentType::Int);
        let body = Stmt::store(pos, p.clone(), Expr::int(0));
        Some(Stmt::for_(
            p,
            Expr::int(0),
            Expr::add(size_prev.clone(), Expr::int(1)),
            body,
        ))
    }

    /// Turn per-parent edge counts into segment pointers by an in-place
    /// prefix sum.
    fn append_finalize_level(&self, size_prev: &Expr, _size: &Expr, mode: &Mode) -> Option<Stmt> {
        let pos = self.pos_array(mode);
        let p = Expr::var("p", ComponentType::Int);
        let accumulate = Stmt::store(
            pos.clone(),
            p.clone(),
            Expr::add(
                Expr::load(pos.clone(), p.clone()),
                Expr::load(pos, Expr::sub(p.clone(), Expr::int(1))),
            ),
        );
        Some(Stmt::for_(
            p,
            Expr::int(1),
            Expr::add(size_prev.clone(), Expr::int(1)),
            accumulate,
        ))
    }

    fn array(&self, slot: usize, mode: &Mode) -> Option<Expr> {
        match slot {
            POS_SLOT => Some(self.pos_array(mode)),
            CRD_SLOT => Some(self.crd_array(mode)),
            _ => None,
        }
    }
}

/// The `compressed` mode type.
pub fn mode_type() -> ModeType {
    ModeType::new(
        "compressed",
        ModeProperties {
            full: false,
            ordered: true,
            unique: true,
            branchless: false,
            compact: true,
        },
        ModeCapabilities {
            coord_val_iter: false,
            coord_pos_iter: true,
            locate: true,
            insert: false,
            append: true,
        },
        Rc::new(CompressedMode),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tengen_ir::{ExprNode, StmtNode};

    fn mode() -> Mode {
        Mode::new(
            Expr::ptr("A", ComponentType::Double),
            Expr::var("M", ComponentType::Int),
            1,
            mode_type(),
            Some(crate::modes::dense::mode_type()),
        )
    }

    #[test]
    fn test_pos_iter_segments_by_parent() {
        let mode = mode();
        let parent = Expr::var("i", ComponentType::Int);
        let iter = mode.mode_type().ops().pos_iter(&parent, &mode);
        assert!(iter.is_defined());

        // begin = A2_pos[i]
        match iter.begin.unwrap().node() {
            ExprNode::Load(l) => {
                assert_eq!(l.array.as_var().unwrap().name, "A2_pos");
                assert!(Expr::same(&l.index, &parent));
            }
            other => panic!("expected load, got {:?}", other),
        }
        // end = A2_pos[i + 1]
        match iter.end.unwrap().node() {
            ExprNode::Load(l) => {
                assert!(matches!(l.index.node(), ExprNode::Binary(_)));
            }
            other => panic!("expected load, got {:?}", other),
        }
    }

    #[test]
    fn test_arrays_are_memoized_per_mode() {
        let mode = mode();
        let a = mode.mode_type().ops().array(POS_SLOT, &mode).unwrap();
        let b = mode.mode_type().ops().array(POS_SLOT, &mode).unwrap();
        assert!(Expr::same(&a, &b));
        assert!(mode.has_var("pos"));
        assert!(!mode.has_var("crd"));
    }

    #[test]
    fn test_pos_access_loads_coordinate() {
        let mode = mode();
        let p = Expr::var("p", ComponentType::Int);
        let access = mode.mode_type().ops().pos_access(&p, &[], &mode);
        assert!(access.always_valid());
        match access.result.unwrap().node() {
            ExprNode::Load(l) => assert_eq!(l.array.as_var().unwrap().name, "A2_crd"),
            other => panic!("expected load, got {:?}", other),
        }
    }

    #[test]
    fn test_locate_emits_search_setup() {
        let mode = mode();
        let j = Expr::var("j", ComponentType::Int);
        let lookup = mode
            .mode_type()
            .ops()
            .locate(&Expr::var("i", ComponentType::Int), &[j], &mode);
        assert!(lookup.is_defined());
        assert!(!lookup.always_valid());
        let setup = lookup.setup.expect("binary search setup");
        match setup.node() {
            StmtNode::Block(b) => assert_eq!(b.stmts.len(), 4),
            other => panic!("expected block, got {:?}", other),
        }
    }

    #[test]
    fn test_finalize_is_prefix_sum() {
        let mode = mode();
        let n = Expr::var("N", ComponentType::Int);
        let fin = mode
            .mode_type()
            .ops()
            .append_finalize_level(&n, &Expr::int(0), &mode)
            .unwrap();
        match fin.node() {
            StmtNode::For(f) => {
                assert!(f.start.is_int_literal(1));
                assert!(matches!(f.body.node(), StmtNode::Store(_)));
            }
            other => panic!("expected for, got {:?}", other),
        }
    }
}
