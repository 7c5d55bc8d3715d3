//! Values level: the terminal mode holding actual components.
//!
//! Exposes a single array, `<tensor>_vals` (slot 0), typed after the
//! tensor handle's component type. The level itself carries no iteration
//! strategy; positions flowing out of the innermost coordinate level
//! index this array directly, and materialization appends to it.

use std::rc::Rc;

use tengen_ir::Expr;

use crate::mode::Mode;
use crate::mode_type::{ModeCapabilities, ModeProperties, ModeType, ModeTypeImpl};

/// Array slot of the component array.
pub const VALS_SLOT: usize = 0;

pub struct ValuesMode;

impl ValuesMode {
    fn vals_array(&self, mode: &Mode) -> Expr {
        mode.memo_var("vals", || {
            let tensor = mode.tensor().as_var().expect("checked at construction");
            Expr::ptr(format!("{}_vals", tensor.name), tensor.ty)
        })
    }
}

impl ModeTypeImpl for ValuesMode {
    fn array(&self, slot: usize, mode: &Mode) -> Option<Expr> {
        match slot {
            VALS_SLOT => Some(self.vals_array(mode)),
            _ => None,
        }
    }
}

/// The `values` mode type.
pub fn mode_type() -> ModeType {
    ModeType::new(
        "values",
        ModeProperties {
            full: true,
            ordered: true,
            unique: true,
            branchless: true,
            compact: true,
        },
        ModeCapabilities::NONE,
        Rc::new(ValuesMode),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tengen_ir::ComponentType;

    #[test]
    fn test_vals_array_takes_component_type() {
        let mode = Mode::new(
            Expr::ptr("A", ComponentType::Float),
            Expr::int(0),
            2,
            mode_type(),
            None,
        );
        let vals = mode.mode_type().ops().array(VALS_SLOT, &mode).unwrap();
        let var = vals.as_var().unwrap();
        assert_eq!(var.name, "A_vals");
        assert_eq!(var.ty, ComponentType::Float);
        assert!(var.is_ptr);
    }
}
