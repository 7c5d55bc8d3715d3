//! Mode-type registry.
//!
//! The lowering engine holds one registry, populated at startup and
//! read-only thereafter. Format construction resolves level codes and
//! tree kinds through it, so custom kinds can be registered alongside
//! the builtins before any compilation runs.

use std::collections::HashMap;

use crate::error::FormatError;
use crate::mode_type::ModeType;
use crate::modes;
use crate::tree::{TreeLevel, TreeLevelRef};

/// Name-keyed collection of registered mode types.
#[derive(Debug, Default)]
pub struct ModeTypeRegistry {
    kinds: HashMap<String, ModeType>,
}

impl ModeTypeRegistry {
    /// An empty registry.
    pub fn new() -> ModeTypeRegistry {
        ModeTypeRegistry::default()
    }

    /// A registry holding the built-in kinds: `dense`, `compressed`,
    /// `fixed`, `replicated` and `values`.
    pub fn with_builtins() -> ModeTypeRegistry {
        let mut registry = ModeTypeRegistry::new();
        registry.register(modes::dense::mode_type());
        registry.register(modes::compressed::mode_type());
        registry.register(modes::fixed::mode_type());
        registry.register(modes::replicated::mode_type());
        registry.register(modes::values::mode_type());
        registry
    }

    /// Register a kind. Registration happens once per process, before
    /// any lowering; re-registering a name is a programmer error.
    pub fn register(&mut self, mode_type: ModeType) {
        let name = mode_type.name().to_string();
        if self.kinds.insert(name.clone(), mode_type).is_some() {
            panic!("mode kind `{}` registered twice", name);
        }
    }

    /// Look up a kind by name.
    pub fn get(&self, name: &str) -> Option<&ModeType> {
        self.kinds.get(name)
    }

    /// The kind name a tree level resolves to.
    pub fn kind_name(level: &TreeLevel) -> &'static str {
        match level {
            TreeLevel::Values => "values",
            TreeLevel::Dense(_) => "dense",
            TreeLevel::Sparse(_) => "compressed",
            TreeLevel::Fixed(_) => "fixed",
            TreeLevel::Replicated(_) => "replicated",
        }
    }

    /// Resolve a format tree to its mode-type chain, outermost first,
    /// values level included.
    pub fn mode_types_for(&self, tree: &TreeLevelRef) -> Result<Vec<ModeType>, FormatError> {
        let mut chain = Vec::with_capacity(tree.order() + 1);
        let mut level: &TreeLevelRef = tree;
        loop {
            let name = Self::kind_name(level);
            let mode_type = self
                .get(name)
                .ok_or_else(|| FormatError::UnregisteredKind {
                    name: name.to_string(),
                })?;
            chain.push(mode_type.clone());
            match level.child() {
                Some(child) => level = child,
                None => break,
            }
        }
        Ok(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_present() {
        let registry = ModeTypeRegistry::with_builtins();
        for name in ["dense", "compressed", "fixed", "replicated", "values"] {
            assert!(registry.get(name).is_some(), "missing builtin `{}`", name);
        }
        assert!(registry.get("singleton").is_none());
    }

    #[test]
    fn test_mode_types_for_csr() {
        let registry = ModeTypeRegistry::with_builtins();
        let tree = TreeLevel::parse("ds").unwrap();
        let chain = registry.mode_types_for(&tree).unwrap();
        let names: Vec<&str> = chain.iter().map(|mt| mt.name()).collect();
        assert_eq!(names, ["dense", "compressed", "values"]);
    }

    #[test]
    fn test_unregistered_kind_reported() {
        let registry = ModeTypeRegistry::new();
        let tree = TreeLevel::parse("d").unwrap();
        let err = registry.mode_types_for(&tree).unwrap_err();
        assert_eq!(
            err,
            FormatError::UnregisteredKind {
                name: "dense".to_string()
            }
        );
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn test_double_registration_panics() {
        let mut registry = ModeTypeRegistry::with_builtins();
        registry.register(modes::dense::mode_type());
    }
}
