//! The compilation pipeline: lower, emit, optionally build and load.

use anyhow::{Context, Result};

use tengen_codegen::{CodeGenC, Module};
use tengen_format::ModeTypeRegistry;
use tengen_lower::{lower, Assignment};

/// Compile an assignment to C source with the built-in mode kinds.
///
/// Recoverable failures (invalid formats, unsupported iteration
/// structure) surface as typed errors in the result chain; no partial
/// output is produced.
///
/// # Examples
///
/// ```
/// use tengen::prelude::*;
///
/// let x = TensorVar::new("x", "d", ComponentType::Double)?;
/// let y = TensorVar::new("y", "d", ComponentType::Double)?;
/// let assign = Assignment::new(y.access("i"), x.access("i").into());
///
/// let source = tengen::compile(&assign, "copy")?;
/// assert!(source.starts_with("int copy("));
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn compile(assign: &Assignment, name: &str) -> Result<String> {
    let registry = ModeTypeRegistry::with_builtins();
    compile_with(assign, name, &registry)
}

/// Compile against a caller-supplied mode-type registry.
pub fn compile_with(
    assign: &Assignment,
    name: &str,
    registry: &ModeTypeRegistry,
) -> Result<String> {
    let func =
        lower(assign, name, registry).with_context(|| format!("lowering kernel `{}`", name))?;
    Ok(CodeGenC::emit(&func))
}

/// Compile an assignment all the way to a loaded shared object.
pub fn compile_module(assign: &Assignment, name: &str) -> Result<Module> {
    let source = compile(assign, name)?;
    let mut module = Module::new(&source)?;
    module
        .compile()
        .with_context(|| format!("building kernel `{}`", name))?;
    Ok(module)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tengen_ir::ComponentType;
    use tengen_lower::{IndexExpr, LowerError, TensorVar};

    #[test]
    fn test_compile_produces_source() {
        let a = TensorVar::new("A", "ds", ComponentType::Double).unwrap();
        let x = TensorVar::new("x", "d", ComponentType::Double).unwrap();
        let y = TensorVar::new("y", "d", ComponentType::Double).unwrap();
        let assign = Assignment::new(
            y.access("i"),
            IndexExpr::mul(a.access("ij").into(), x.access("j").into()),
        );
        let source = compile(&assign, "spmv").unwrap();
        assert!(source.starts_with("int spmv("));
        assert!(source.contains("return 0;"));
    }

    #[test]
    fn test_unsupported_structure_is_typed() {
        let a = TensorVar::new("a", "s", ComponentType::Double).unwrap();
        let b = TensorVar::new("b", "s", ComponentType::Double).unwrap();
        let y = TensorVar::new("y", "d", ComponentType::Double).unwrap();
        let assign = Assignment::new(
            y.access("i"),
            IndexExpr::mul(a.access("i").into(), b.access("i").into()),
        );
        let err = compile(&assign, "mul").unwrap_err();
        assert!(err.downcast_ref::<LowerError>().is_some());
    }
}
