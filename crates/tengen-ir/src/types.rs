//! Scalar component types for IR values.
//!
//! Every IR expression carries a [`ComponentType`] describing the scalar
//! type of the value it produces. Pointer-ness is tracked separately on
//! variables, since only variables name storage.

use std::fmt;

/// Scalar type of an IR value.
///
/// `Bool` types comparisons and validity flags inside the IR. It has no
/// rendering in emitted C, so a `Bool`-typed variable reaching a function
/// signature or local declaration is an ill-formed-IR error.
///
/// # Examples
///
/// ```
/// use tengen_ir::ComponentType;
///
/// assert_eq!(ComponentType::Double.to_string(), "double");
/// assert!(ComponentType::Float.is_float());
/// assert!(!ComponentType::Int.is_float());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    Bool,
    Int,
    Float,
    Double,
}

impl ComponentType {
    /// Whether this is a floating-point type.
    pub fn is_float(&self) -> bool {
        matches!(self, ComponentType::Float | ComponentType::Double)
    }

    /// Whether values of this type can appear in arithmetic.
    pub fn is_numeric(&self) -> bool {
        !matches!(self, ComponentType::Bool)
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ComponentType::Bool => "bool",
            ComponentType::Int => "int",
            ComponentType::Float => "float",
            ComponentType::Double => "double",
        };
        write!(f, "{}", name)
    }
}
