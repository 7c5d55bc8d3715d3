//! # tengen-format
//!
//! Storage format model for the TenGen compiler.
//!
//! This crate provides:
//! - **Format trees** ([`tree::TreeLevel`]): ordered chains of per-level
//!   storage strategies with a values terminator, built from format
//!   strings like `"ds"` (CSR)
//! - **Mode types** ([`ModeType`]): storage kinds as records of
//!   structural properties, capability bits and a vtable of
//!   IR-producing hooks ([`ModeTypeImpl`])
//! - **Built-in kinds** ([`modes`]): dense, compressed, fixed,
//!   replicated, values
//! - **Per-compilation instances** ([`Mode`], [`ModePack`]) with memoized
//!   working variables
//! - **The registry** ([`ModeTypeRegistry`]) resolving format trees to
//!   mode-type chains
//!
//! ## Capability contract
//!
//! Hooks return IR fragments, never runtime values. A capability bit set
//! to false means the corresponding hook returns an undefined fragment
//! and the lowering driver must choose a different strategy; set to true,
//! the hook returns a defined fragment on well-formed inputs. Callers
//! consult the bits first: asking an unsupported kind for a strategy is
//! a lowering bug, not a recoverable condition.
//!
//! ## Quick Start
//!
//! ```
//! use tengen_format::tree::TreeLevel;
//! use tengen_format::ModeTypeRegistry;
//!
//! let registry = ModeTypeRegistry::with_builtins();
//! let csr = TreeLevel::parse("ds").unwrap();
//! let chain = registry.mode_types_for(&csr).unwrap();
//!
//! assert_eq!(chain.len(), 3); // dense, compressed, values
//! assert!(chain[0].has_coord_val_iter());
//! assert!(chain[1].has_coord_pos_iter());
//! ```

#![deny(warnings)]

pub mod error;
pub mod mode;
pub mod mode_type;
pub mod modes;
pub mod registry;
pub mod tree;


// Re-exports
pub use error::{FormatError, FormatResult};
pub use mode::{Mode, ModePack};
pub use mode_type::{
    ModeCapabilities, ModeIterator, ModeLookup, ModeProperties, ModeType, ModeTypeImpl,
};
pub use registry::ModeTypeRegistry;
pub use tree::{TreeLevel, TreeLevelRef, TreeVisitor, TreeVisitorStrict};
