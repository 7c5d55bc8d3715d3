//! Replicated mode: duplicated parent-to-child edges.
//!
//! Declared as an extension point. The kind is registered so formats can
//! name it, but no iteration or mutation strategy is implemented yet:
//! every capability bit is false and every hook inherits the empty
//! default, so lowering routes around it or rejects the format.

use std::rc::Rc;

use crate::mode_type::{ModeCapabilities, ModeProperties, ModeType, ModeTypeImpl};

pub struct ReplicatedMode;

impl ModeTypeImpl for ReplicatedMode {}

/// The `replicated` mode type.
pub fn mode_type() -> ModeType {
    ModeType::new(
        "replicated",
        ModeProperties {
            full: false,
            ordered: true,
            unique: false,
            branchless: false,
            compact: true,
        },
        ModeCapabilities::NONE,
        Rc::new(ReplicatedMode),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::Mode;
    use tengen_ir::{ComponentType, Expr};

    #[test]
    fn test_all_hooks_default_to_empty() {
        let mt = mode_type();
        let mode = Mode::new(
            Expr::ptr("R", ComponentType::Double),
            Expr::var("N", ComponentType::Int),
            0,
            mt.clone(),
            None,
        );
        let p = Expr::int(0);
        assert!(!mt.ops().coord_iter(&[], &mode).is_defined());
        assert!(!mt.ops().pos_iter(&p, &mode).is_defined());
        assert!(!mt.ops().locate(&p, &[], &mode).is_defined());
        assert!(mt.ops().insert_coord(&p, &[], &mode).is_none());
        assert!(mt.ops().append_coord(&p, &p, &mode).is_none());
        assert!(mt.ops().size(&mode).is_none());
        assert!(mt.ops().array(0, &mode).is_none());
    }
}
