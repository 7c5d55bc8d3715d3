//! # tengen-lower
//!
//! Index notation and format-directed lowering for TenGen.
//!
//! This crate provides:
//! - **Index notation** ([`notation`]): tensor declarations
//!   ([`TensorVar`]), accesses, products/sums and assignments, as a
//!   construction API, deliberately without a surface parser
//! - **Mode accesses** ([`ModeAccess`]): the per-level view of an access,
//!   ordered for use as lowering map keys
//! - **The lowering driver** ([`lower()`]): builds per-compilation
//!   [`Mode`](tengen_format::Mode) chains from each operand's format and
//!   stitches the mode hooks' IR fragments into a specialized kernel
//!   function
//!
//! ## Iteration strategy
//!
//! Per index variable the driver picks one operand to drive the loop:
//! sparse-led position iteration when exactly one participating mode is
//! non-full, coordinate-range iteration otherwise. Remaining operands
//! resolve their positions through `locate`. General sparse-sparse
//! co-iteration (merge loops) is detected and rejected as unsupported.
//!
//! ## Quick Start
//!
//! ```
//! use tengen_lower::notation::{Assignment, IndexExpr, TensorVar};
//! use tengen_lower::lower;
//! use tengen_format::ModeTypeRegistry;
//! use tengen_ir::ComponentType;
//!
//! // CSR sparse matrix-vector product
//! let a = TensorVar::new("A", "ds", ComponentType::Double).unwrap();
//! let x = TensorVar::new("x", "d", ComponentType::Double).unwrap();
//! let y = TensorVar::new("y", "d", ComponentType::Double).unwrap();
//! let spmv = Assignment::new(
//!     y.access("i"),
//!     IndexExpr::mul(a.access("ij").into(), x.access("j").into()),
//! );
//!
//! let registry = ModeTypeRegistry::with_builtins();
//! let kernel = lower(&spmv, "spmv", &registry).unwrap();
//! assert_eq!(kernel.as_function().unwrap().name, "spmv");
//! ```

#![deny(warnings)]

pub mod error;
pub mod lower;
pub mod notation;

// Re-exports
pub use error::{LowerError, LowerResult};
pub use lower::lower;
pub use notation::{Access, Assignment, IndexExpr, ModeAccess, TensorVar};
