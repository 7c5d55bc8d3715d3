//! End-to-end scenarios: lower an index-notation assignment against
//! concrete storage formats, emit C, and check the iteration structure
//! of the generated kernel. The final test compiles and runs a CSR
//! matrix-vector kernel through the module wrapper when a C compiler is
//! present.

use std::process::Command;

use tengen_codegen::{CodeGenC, Module};
use tengen_format::ModeTypeRegistry;
use tengen_ir::ComponentType;
use tengen_lower::lower;
use tengen_lower::notation::{Assignment, IndexExpr, TensorVar};

fn emit(assign: &Assignment, name: &str) -> String {
    let registry = ModeTypeRegistry::with_builtins();
    let func = lower(assign, name, &registry).unwrap();
    CodeGenC::emit(&func)
}

#[test]
fn test_dense_copy_kernel() {
    // y(i) = x(i), both dense: one loop, direct load/store
    let x = TensorVar::new("x", "d", ComponentType::Double).unwrap();
    let y = TensorVar::new("y", "d", ComponentType::Double).unwrap();
    let assign = Assignment::new(y.access("i"), x.access("i").into());
    let source = emit(&assign, "copy");

    assert!(source.starts_with("int copy(int i_dim, double* x_vals, double* y_vals) {"));
    // a single hygienically-renamed induction variable over 0..i_dim
    assert!(source.contains("for (_i_"));
    assert!(source.contains("=0; _i_"));
    assert!(source.contains("<i_dim; _i_"));
    assert!(source.contains("y_vals[_i_"));
    assert!(source.contains("] = x_vals[_i_"));
    assert!(source.trim_end().ends_with("}"));
    assert!(source.contains("  return 0;\n"));
}

#[test]
fn test_sparse_to_dense_copy_kernel() {
    // y(i) = x(i), x compressed: loop over pos[0]..pos[1], gather crd
    let x = TensorVar::new("x", "s", ComponentType::Double).unwrap();
    let y = TensorVar::new("y", "d", ComponentType::Double).unwrap();
    let assign = Assignment::new(y.access("i"), x.access("i").into());
    let source = emit(&assign, "gather");

    assert!(source.starts_with(
        "int gather(int i_dim, int* x1_pos, int* x1_crd, double* x_vals, double* y_vals) {"
    ));
    // position loop bounds
    assert!(source.contains("=x1_pos[0]; _px1_"));
    assert!(source.contains("<x1_pos[1]; _px1_"));
    // coordinate recovery and scatter into the dense result
    assert!(source.contains(" = x1_crd[_px1_"));
    assert!(source.contains("y_vals[_i_"));
    assert!(source.contains("] = x_vals[_px1_"));
}

#[test]
fn test_csr_spmv_kernel() {
    // y(i) = A(i,j) * x(j) with A in CSR: dense rows, compressed columns
    let a = TensorVar::new("A", "ds", ComponentType::Double).unwrap();
    let x = TensorVar::new("x", "d", ComponentType::Double).unwrap();
    let y = TensorVar::new("y", "d", ComponentType::Double).unwrap();
    let assign = Assignment::new(
        y.access("i"),
        IndexExpr::mul(a.access("ij").into(), x.access("j").into()),
    );
    let source = emit(&assign, "spmv");

    assert!(source.starts_with(
        "int spmv(int i_dim, int j_dim, int* A2_pos, int* A2_crd, double* A_vals, \
         double* x_vals, double* y_vals) {"
    ));
    // outer dense loop over rows
    assert!(source.contains("<i_dim; _i_"));
    // inner position loop segmented by the row
    assert!(source.contains("=A2_pos[_i_"));
    // accumulation of A_vals[p] * x_vals[j]
    assert!(source.contains("] = (y_vals[_i_"));
    assert!(source.contains("] + (A_vals[_pA2_"));
    assert!(source.contains("] * x_vals[_j_"));
}

#[test]
fn test_emitted_source_compiles_and_runs() {
    let available = Command::new("cc")
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false);
    if !available {
        return;
    }

    let a = TensorVar::new("A", "ds", ComponentType::Double).unwrap();
    let x = TensorVar::new("x", "d", ComponentType::Double).unwrap();
    let y = TensorVar::new("y", "d", ComponentType::Double).unwrap();
    let assign = Assignment::new(
        y.access("i"),
        IndexExpr::mul(a.access("ij").into(), x.access("j").into()),
    );
    let source = emit(&assign, "spmv");

    let mut module = Module::new(&source).unwrap();
    module.compile().unwrap();

    // A = [[10, 0, 20], [0, 30, 0]] in CSR
    let pos: Vec<i32> = vec![0, 2, 3];
    let crd: Vec<i32> = vec![0, 2, 1];
    let vals: Vec<f64> = vec![10.0, 20.0, 30.0];
    let xv: Vec<f64> = vec![1.0, 2.0, 3.0];
    let mut yv: Vec<f64> = vec![0.0, 0.0];

    type Spmv = unsafe extern "C" fn(
        i32,
        i32,
        *const i32,
        *const i32,
        *const f64,
        *const f64,
        *mut f64,
    ) -> i32;

    let status = unsafe {
        let kernel = module.get::<Spmv>("spmv").unwrap();
        (*kernel)(
            2,
            3,
            pos.as_ptr(),
            crd.as_ptr(),
            vals.as_ptr(),
            xv.as_ptr(),
            yv.as_mut_ptr(),
        )
    };
    assert_eq!(status, 0);
    // y[0] = 10*1 + 20*3, y[1] = 30*2
    assert_eq!(yv, vec![70.0, 60.0]);
}
