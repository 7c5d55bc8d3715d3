//! # TenGen - Sparse Tensor Kernel Compiler for COOLJAPAN
//!
//! **Format-directed code generation** for tensor-algebra kernels over
//! mixed sparse/dense operands: describe an assignment in index notation
//! plus a storage format per operand, and TenGen emits a specialized C
//! procedure that traverses only the stored coordinates of each operand.
//!
//! This is the **meta crate** that re-exports all TenGen components for
//! convenient access.
//!
//! ## Quick Start
//!
//! ```
//! use tengen::prelude::*;
//!
//! // y(i) = A(i,j) * x(j) with A stored as CSR
//! let a = TensorVar::new("A", "ds", ComponentType::Double)?;
//! let x = TensorVar::new("x", "d", ComponentType::Double)?;
//! let y = TensorVar::new("y", "d", ComponentType::Double)?;
//! let spmv = Assignment::new(
//!     y.access("i"),
//!     IndexExpr::mul(a.access("ij").into(), x.access("j").into()),
//! );
//!
//! let source = tengen::compile(&spmv, "spmv")?;
//! assert!(source.starts_with("int spmv("));
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Components
//!
//! ### Low-level IR ([`ir`])
//!
//! Typed imperative expression/statement trees with identity semantics,
//! plus strict and permissive visitor contracts.
//!
//! ### Storage formats ([`format`])
//!
//! Format trees parsed from level-code strings (`"ds"` is CSR), the
//! mode-type capability model, the built-in dense/compressed/fixed/
//! replicated/values kinds, and the mode-type registry.
//!
//! ### Lowering ([`lower`])
//!
//! Index notation and the format-directed driver that stitches mode
//! hooks' IR fragments into kernel loops.
//!
//! ### Code generation ([`codegen`])
//!
//! The hygienic C emitter and the compile-and-load module wrapper around
//! the external C compiler.

#![deny(warnings)]

pub mod compile;

pub use compile::{compile, compile_module, compile_with};

pub use tengen_codegen as codegen;
pub use tengen_format as format;
pub use tengen_ir as ir;
pub use tengen_lower as lower;

/// Commonly used items in one import.
pub mod prelude {
    pub use crate::compile::{compile, compile_module, compile_with};
    pub use tengen_codegen::{CodeGenC, Module};
    pub use tengen_format::{ModeTypeRegistry, TreeLevel};
    pub use tengen_ir::{ComponentType, Expr, LoopKind, Stmt};
    pub use tengen_lower::{Access, Assignment, IndexExpr, TensorVar};
}
