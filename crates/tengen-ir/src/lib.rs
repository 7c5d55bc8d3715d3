//! # tengen-ir
//!
//! Low-level imperative IR for the TenGen compiler.
//!
//! This crate provides:
//! - **Component types** ([`ComponentType`]) for scalar IR values
//! - **Expressions** ([`Expr`]): variables, literals, binary/unary
//!   operators, typed loads, casts
//! - **Statements** ([`Stmt`]): assignment, store, for/while loops with
//!   loop-kind tags, conditionals, blocks, functions
//! - **Visitors**: a strict contract ([`IrVisitorStrict`], exhaustive by
//!   construction) and a permissive contract ([`IrVisitor`], default
//!   recursive descent)
//!
//! ## Identity semantics
//!
//! IR nodes form a shared-ownership DAG. Handles are cheap clones of
//! reference-counted nodes, and a node may appear many times by identity.
//! Wherever the compiler keys on expressions (the emitter's variable
//! table in particular) it keys on [`ExprId`] (node address), never on
//! structure. Two distinct variables named `t` are two variables.
//!
//! ## Quick Start
//!
//! ```
//! use tengen_ir::{ComponentType, Expr, Stmt};
//!
//! // y[i] = x[i] inside a loop over 0..N
//! let i = Expr::var("i", ComponentType::Int);
//! let n = Expr::var("N", ComponentType::Int);
//! let x = Expr::ptr("x", ComponentType::Double);
//! let y = Expr::ptr("y", ComponentType::Double);
//!
//! let body = Stmt::store(y, i.clone(), Expr::load(x, i.clone()));
//! let copy = Stmt::for_(i, Expr::int(0), n, body);
//! # let _ = copy;
//! ```

#![deny(warnings)]

pub mod expr;
pub mod stmt;
pub mod types;
pub mod visit;


// Re-exports
pub use expr::{BinOp, Binary, Cast, Expr, ExprId, ExprNode, LitValue, Literal, Load, UnOp, Unary, Var};
pub use stmt::{Assign, Block, For, Function, IfThenElse, LoopKind, Stmt, StmtNode, Store, While};
pub use types::ComponentType;
pub use visit::{walk_expr, walk_stmt, IrVisitor, IrVisitorStrict};
