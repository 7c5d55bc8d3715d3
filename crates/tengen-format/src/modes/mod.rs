//! Built-in mode kind implementations.
//!
//! Each submodule provides one storage kind as a [`crate::ModeTypeImpl`]
//! plus a `mode_type()` constructor bundling its properties and
//! capability bits. The hooks emit IR fragments against the per-mode
//! working variables (`pos`, `crd`, `size`, `vals`) memoized on the
//! [`crate::Mode`] they are handed.

pub mod compressed;
pub mod dense;
pub mod fixed;
pub mod replicated;
pub mod values;
