//! # tengen-codegen
//!
//! C code emission and JIT loading for TenGen.
//!
//! This crate provides:
//! - **The hygienic namer** ([`namer::fresh_name`]): process-wide atomic
//!   counter, `_<original>_<n>` names that never collide
//! - **The C emitter** ([`CodeGenC`]): translates a function IR node to
//!   a C translation unit: identity-keyed variable table, first-seen
//!   declaration order, per-loop-kind vectorization pragmas, `return 0;`
//!   epilogue
//! - **The module wrapper** ([`Module`]): writes emitted source to a
//!   temporary directory, invokes `cc`, loads the shared object and
//!   resolves kernel symbols
//!
//! ## Quick Start
//!
//! ```
//! use tengen_codegen::CodeGenC;
//! use tengen_ir::{ComponentType, Expr, Stmt};
//!
//! let x = Expr::ptr("x", ComponentType::Double);
//! let y = Expr::ptr("y", ComponentType::Double);
//! let n = Expr::var("n", ComponentType::Int);
//! let i = Expr::var("i", ComponentType::Int);
//!
//! let body = Stmt::block(vec![Stmt::for_(
//!     i.clone(),
//!     Expr::int(0),
//!     n.clone(),
//!     Stmt::store(y.clone(), i.clone(), Expr::load(x.clone(), i.clone())),
//! )]);
//! let func = Stmt::function("copy", vec![n, x], vec![y], body);
//!
//! let source = CodeGenC::emit(&func);
//! assert!(source.starts_with("int copy(int n, double* x, double* y)"));
//! ```

#![deny(warnings)]

pub mod cemit;
pub mod module;
pub mod namer;

// Re-exports
pub use cemit::{vectorize_pragma, CodeGenC};
pub use module::Module;
pub use namer::fresh_name;
