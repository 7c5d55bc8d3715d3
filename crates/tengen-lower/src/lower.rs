//! Format-directed lowering.
//!
//! Turns an [`Assignment`] plus the operands' storage formats into a
//! [`Function`](tengen_ir::Function) IR node whose loop structure walks
//! only the stored coordinates of each operand.
//!
//! The driver consults capability bits before asking any mode for a
//! strategy. Per index variable it picks the iterator operand: a unique
//! non-full mode iterates by stored position (`pos_iter`/`pos_access`),
//! otherwise a full mode iterates its coordinate range (`coord_iter`),
//! and every other participating operand resolves its position through
//! `locate`. Two non-full operands on one index require merged
//! co-iteration, which this driver does not implement; the case is
//! detected up front and reported as [`LowerError::Unsupported`].

use std::collections::HashMap;

use log::debug;

use tengen_format::modes::values::VALS_SLOT;
use tengen_format::{Mode, ModePack, ModeTypeRegistry};
use tengen_ir::{BinOp, ComponentType, Expr, Stmt};

use crate::error::{LowerError, LowerResult};
use crate::notation::{Access, Assignment, IndexExpr};

/// One tensor operand in flight: its modes, the packs that own them, and
/// the position cursor of the storage level reached so far.
#[derive(Clone)]
struct Operand {
    access: Access,
    modes: Vec<Mode>,
    values: Mode,
    packs: Vec<ModePack>,
    pos: Expr,
    next_level: usize,
}

impl Operand {
    fn build(
        access: &Access,
        registry: &ModeTypeRegistry,
        dims: &HashMap<char, Expr>,
    ) -> LowerResult<Operand> {
        let order = access.tensor.order();
        if access.indices.len() != order {
            return Err(LowerError::ArityMismatch {
                access: access.key(),
                expected: order,
                got: access.indices.len(),
            });
        }
        for (i, &c) in access.indices.iter().enumerate() {
            if access.indices[..i].contains(&c) {
                return Err(LowerError::RepeatedIndex {
                    access: access.key(),
                    index: c,
                });
            }
        }

        let chain = registry.mode_types_for(access.tensor.format())?;
        let tensor_var = Expr::ptr(access.tensor.name(), access.tensor.component());

        let mut modes = Vec::with_capacity(order);
        let mut parent = None;
        for (level, mode_type) in chain[..order].iter().enumerate() {
            let size = dims[&access.indices[level]].clone();
            modes.push(Mode::new(
                tensor_var.clone(),
                size,
                level,
                mode_type.clone(),
                parent.clone(),
            ));
            parent = Some(mode_type.clone());
        }
        let values = Mode::new(tensor_var, Expr::int(0), order, chain[order].clone(), parent);

        let packs = modes
            .iter()
            .chain(std::iter::once(&values))
            .map(|mode| ModePack::new(vec![mode.clone()]))
            .collect();

        Ok(Operand {
            access: access.clone(),
            modes,
            values,
            packs,
            pos: Expr::int(0),
            next_level: 0,
        })
    }

    /// The operand's physical arrays in level order, values last. Each
    /// level's pack is queried slot by slot until it runs dry.
    fn arrays(&self) -> Vec<Expr> {
        let mut out = Vec::new();
        for pack in &self.packs {
            let mut slot = 0;
            while let Some(array) = pack.array(slot) {
                out.push(array);
                slot += 1;
            }
        }
        out
    }

    fn values_array(&self) -> Expr {
        self.values
            .mode_type()
            .ops()
            .array(VALS_SLOT, &self.values)
            .expect("values level owns its array")
    }
}

/// Lower an assignment to a `Function` IR node named `name`.
///
/// The function's inputs are the dimension extents (one int per index
/// variable, in loop order) followed by each input operand's arrays in
/// format order; its outputs are the result operand's arrays.
///
/// # Examples
///
/// ```
/// use tengen_lower::notation::{Assignment, IndexExpr, TensorVar};
/// use tengen_lower::lower;
/// use tengen_format::ModeTypeRegistry;
/// use tengen_ir::ComponentType;
///
/// let x = TensorVar::new("x", "d", ComponentType::Double).unwrap();
/// let y = TensorVar::new("y", "d", ComponentType::Double).unwrap();
/// let copy = Assignment::new(y.access("i"), x.access("i").into());
///
/// let registry = ModeTypeRegistry::with_builtins();
/// let func = lower(&copy, "copy", &registry).unwrap();
/// assert!(func.as_function().is_some());
/// ```
pub fn lower(
    assign: &Assignment,
    name: &str,
    registry: &ModeTypeRegistry,
) -> LowerResult<Stmt> {
    let order = assign.index_order();
    debug!("lowering `{}`: loop order {:?}", name, order);

    let mut dims: HashMap<char, Expr> = HashMap::new();
    for &c in &order {
        dims.entry(c)
            .or_insert_with(|| Expr::var(format!("{}_dim", c), ComponentType::Int));
    }

    let mut inputs: Vec<Operand> = Vec::new();
    for access in assign.rhs.accesses() {
        if inputs.iter().any(|o| o.access.key() == access.key()) {
            continue;
        }
        inputs.push(Operand::build(access, registry, &dims)?);
    }
    let output = Operand::build(&assign.lhs, registry, &dims)?;

    let accumulate = !assign.contracted_indices().is_empty();

    let body = emit_index(
        0,
        &order,
        inputs.clone(),
        output.clone(),
        &assign.rhs,
        accumulate,
    )?;

    let mut params: Vec<Expr> = order.iter().map(|c| dims[c].clone()).collect();
    for operand in &inputs {
        params.extend(operand.arrays());
    }
    let out_params = output.arrays();

    Ok(Stmt::function(
        name,
        params,
        out_params,
        Stmt::block(vec![body]),
    ))
}

enum Driver {
    Input(usize),
    Output,
}

fn emit_index(
    k: usize,
    order: &[char],
    mut inputs: Vec<Operand>,
    mut output: Operand,
    rhs: &IndexExpr,
    accumulate: bool,
) -> LowerResult<Stmt> {
    if k == order.len() {
        return Ok(emit_compute(&inputs, &output, rhs, accumulate));
    }
    let iv = order[k];

    // participants, checked against each operand's storage order
    let mut part_inputs: Vec<usize> = Vec::new();
    for (ix, operand) in inputs.iter().enumerate() {
        if let Some(level) = operand.access.level_of(iv) {
            if level != operand.next_level {
                return Err(LowerError::Unsupported {
                    reason: format!(
                        "access {} uses index '{}' out of storage order",
                        operand.access, iv
                    ),
                });
            }
            part_inputs.push(ix);
        }
    }
    let out_participates = match output.access.level_of(iv) {
        Some(level) => {
            if level != output.next_level {
                return Err(LowerError::Unsupported {
                    reason: format!(
                        "result {} uses index '{}' out of storage order",
                        output.access, iv
                    ),
                });
            }
            true
        }
        None => false,
    };

    if out_participates {
        let mode_type = output.modes[output.next_level].mode_type();
        if !mode_type.is_full() && !mode_type.has_locate() {
            return Err(LowerError::Unsupported {
                reason: format!(
                    "result mode `{}` of {} cannot be located for materialization",
                    mode_type.name(),
                    output.access
                ),
            });
        }
    }

    // iterator selection by capability bits: a unique non-full operand
    // iterates by position, else a full operand iterates coordinates
    let sparse: Vec<usize> = part_inputs
        .iter()
        .copied()
        .filter(|&ix| !inputs[ix].modes[inputs[ix].next_level].mode_type().is_full())
        .collect();
    if sparse.len() > 1 {
        return Err(LowerError::Unsupported {
            reason: format!(
                "co-iteration of multiple sparse operands over index '{}'",
                iv
            ),
        });
    }

    let chosen = if let Some(&ix) = sparse.first() {
        let mode_type = inputs[ix].modes[inputs[ix].next_level].mode_type();
        if !mode_type.has_coord_pos_iter() {
            return Err(LowerError::Unsupported {
                reason: format!(
                    "mode `{}` of {} supports no iteration strategy",
                    mode_type.name(),
                    inputs[ix].access
                ),
            });
        }
        Driver::Input(ix)
    } else if let Some(&ix) = part_inputs.iter().find(|&&ix| {
        inputs[ix].modes[inputs[ix].next_level]
            .mode_type()
            .has_coord_val_iter()
    }) {
        Driver::Input(ix)
    } else if out_participates
        && output.modes[output.next_level]
            .mode_type()
            .has_coord_val_iter()
    {
        Driver::Output
    } else {
        return Err(LowerError::Unsupported {
            reason: format!("no operand can drive iteration over index '{}'", iv),
        });
    };

    let coord_var = Expr::var(iv.to_string(), ComponentType::Int);
    let mut body: Vec<Stmt> = Vec::new();
    let mut guards: Vec<Expr> = Vec::new();

    // drive the chosen operand's level and bind the loop variable
    let (loop_var, bounds) = match chosen {
        Driver::Input(ix) if !inputs[ix].modes[inputs[ix].next_level].mode_type().is_full() => {
            let mode = inputs[ix].modes[inputs[ix].next_level].clone();
            let ops = mode.mode_type().ops().clone();
            debug!("index '{}': position loop over {}", iv, mode.name());

            let bounds = ops.pos_iter(&inputs[ix].pos, &mode);
            let p_var = Expr::var(format!("p{}", mode.name()), ComponentType::Int);
            let lookup = ops.pos_access(&p_var, &[coord_var.clone()], &mode);
            let lookup_always_valid = lookup.always_valid();
            if let Some(setup) = lookup.setup {
                body.push(setup);
            }
            body.push(Stmt::assign(
                coord_var.clone(),
                lookup
                    .result
                    .expect("pos_access defined for a position-iterable mode"),
            ));
            if !lookup_always_valid {
                if let Some(valid) = lookup.valid {
                    guards.push(valid);
                }
            }
            inputs[ix].pos = p_var.clone();
            inputs[ix].next_level += 1;
            (p_var, bounds)
        }
        Driver::Input(ix) => {
            let mode = inputs[ix].modes[inputs[ix].next_level].clone();
            let ops = mode.mode_type().ops().clone();
            debug!("index '{}': coordinate loop over {}", iv, mode.name());

            let bounds = ops.coord_iter(&[coord_var.clone()], &mode);
            let access = ops.coord_access(&inputs[ix].pos, &[coord_var.clone()], &mode);
            let access_always_valid = access.always_valid();
            if let Some(setup) = access.setup {
                body.push(setup);
            }
            if !access_always_valid {
                if let Some(valid) = access.valid {
                    guards.push(valid);
                }
            }
            inputs[ix].pos = access
                .result
                .expect("coord_access defined for a coordinate-iterable mode");
            inputs[ix].next_level += 1;
            (coord_var.clone(), bounds)
        }
        Driver::Output => {
            let mode = output.modes[output.next_level].clone();
            let ops = mode.mode_type().ops().clone();
            debug!("index '{}': coordinate loop over result {}", iv, mode.name());

            let bounds = ops.coord_iter(&[coord_var.clone()], &mode);
            let access = ops.coord_access(&output.pos, &[coord_var.clone()], &mode);
            output.pos = access
                .result
                .expect("coord_access defined for a coordinate-iterable mode");
            output.next_level += 1;
            (coord_var.clone(), bounds)
        }
    };

    // every other participant locates its position at this coordinate
    for &ix in &part_inputs {
        let level = inputs[ix]
            .access
            .level_of(iv)
            .expect("participant uses this index");
        if inputs[ix].next_level == level {
            resolve_locate(&mut inputs[ix], &coord_var, &mut body, &mut guards)?;
        }
    }
    let out_level = output.access.level_of(iv);
    if out_participates && Some(output.next_level) == out_level {
        resolve_locate(&mut output, &coord_var, &mut body, &mut guards)?;
    }

    let inner = emit_index(k + 1, order, inputs, output, rhs, accumulate)?;
    let inner = match guards.into_iter().reduce(Expr::and) {
        Some(cond) => Stmt::if_then(cond, inner),
        None => inner,
    };
    body.push(inner);

    let begin = bounds.begin.expect("iterator bounds defined");
    let end = bounds.end.expect("iterator bounds defined");
    let mut stmt = Stmt::for_(loop_var, begin, end, Stmt::block(body));
    if let Some(setup) = bounds.setup {
        stmt = Stmt::block(vec![setup, stmt]);
    }
    Ok(stmt)
}

fn resolve_locate(
    operand: &mut Operand,
    coord: &Expr,
    body: &mut Vec<Stmt>,
    guards: &mut Vec<Expr>,
) -> LowerResult<()> {
    let mode = operand.modes[operand.next_level].clone();
    let mode_type = mode.mode_type().clone();
    if !mode_type.has_locate() {
        return Err(LowerError::Unsupported {
            reason: format!(
                "mode `{}` of {} supports neither iteration over this index nor locate",
                mode_type.name(),
                operand.access
            ),
        });
    }
    let lookup = mode_type.ops().locate(&operand.pos, &[coord.clone()], &mode);
    let lookup_always_valid = lookup.always_valid();
    if let Some(setup) = lookup.setup {
        body.push(setup);
    }
    operand.pos = lookup
        .result
        .expect("locate defined when the capability bit is set");
    if !lookup_always_valid {
        if let Some(valid) = lookup.valid {
            guards.push(valid);
        }
    }
    operand.next_level += 1;
    Ok(())
}

fn emit_compute(
    inputs: &[Operand],
    output: &Operand,
    rhs: &IndexExpr,
    accumulate: bool,
) -> Stmt {
    let mut loads: HashMap<String, Expr> = HashMap::new();
    for operand in inputs {
        loads.insert(
            operand.access.key(),
            Expr::load(operand.values_array(), operand.pos.clone()),
        );
    }
    let value = value_expr(rhs, &loads, output.access.tensor.component());
    let out_vals = output.values_array();
    let stored = if accumulate {
        Expr::binary(
            BinOp::Add,
            Expr::load(out_vals.clone(), output.pos.clone()),
            value,
        )
    } else {
        value
    };
    Stmt::store(out_vals, output.pos.clone(), stored)
}

fn value_expr(expr: &IndexExpr, loads: &HashMap<String, Expr>, ty: ComponentType) -> Expr {
    match expr {
        IndexExpr::Access(access) => loads[&access.key()].clone(),
        IndexExpr::Literal(value) => literal(*value, ty),
        IndexExpr::Mul(lhs, rhs) => Expr::binary(
            BinOp::Mul,
            value_expr(lhs, loads, ty),
            value_expr(rhs, loads, ty),
        ),
        IndexExpr::Add(lhs, rhs) => Expr::binary(
            BinOp::Add,
            value_expr(lhs, loads, ty),
            value_expr(rhs, loads, ty),
        ),
    }
}

fn literal(value: f64, ty: ComponentType) -> Expr {
    match ty {
        ComponentType::Int => Expr::int(value as i64),
        ComponentType::Float => Expr::float(value),
        _ => Expr::double(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notation::TensorVar;
    use tengen_ir::{ExprNode, StmtNode};

    fn registry() -> ModeTypeRegistry {
        ModeTypeRegistry::with_builtins()
    }

    fn body_of(func: &Stmt) -> &[Stmt] {
        match func.as_function().unwrap().body.node() {
            StmtNode::Block(b) => &b.stmts,
            other => panic!("function body is not a block: {:?}", other),
        }
    }

    #[test]
    fn test_dense_copy_is_single_loop() {
        // y(i) = x(i), both dense
        let x = TensorVar::new("x", "d", ComponentType::Double).unwrap();
        let y = TensorVar::new("y", "d", ComponentType::Double).unwrap();
        let assign = Assignment::new(y.access("i"), x.access("i").into());
        let func = lower(&assign, "copy", &registry()).unwrap();

        let f = func.as_function().unwrap();
        // inputs: i_dim, x_vals; outputs: y_vals
        assert_eq!(f.inputs.len(), 2);
        assert_eq!(f.inputs[0].as_var().unwrap().name, "i_dim");
        assert_eq!(f.inputs[1].as_var().unwrap().name, "x_vals");
        assert_eq!(f.outputs.len(), 1);
        assert_eq!(f.outputs[0].as_var().unwrap().name, "y_vals");

        let stmts = body_of(&func);
        assert_eq!(stmts.len(), 1);
        match stmts[0].node() {
            StmtNode::For(l) => {
                assert_eq!(l.var.as_var().unwrap().name, "i");
                assert!(l.start.is_int_literal(0));
                assert_eq!(l.end.as_var().unwrap().name, "i_dim");
                // body: direct store, no guards
                match l.body.node() {
                    StmtNode::Block(b) => {
                        assert_eq!(b.stmts.len(), 1);
                        assert!(matches!(b.stmts[0].node(), StmtNode::Store(_)));
                    }
                    other => panic!("expected block body, got {:?}", other),
                }
            }
            other => panic!("expected for loop, got {:?}", other),
        }
    }

    #[test]
    fn test_sparse_copy_iterates_positions() {
        // y(i) = x(i), x compressed, y dense
        let x = TensorVar::new("x", "s", ComponentType::Double).unwrap();
        let y = TensorVar::new("y", "d", ComponentType::Double).unwrap();
        let assign = Assignment::new(y.access("i"), x.access("i").into());
        let func = lower(&assign, "gather", &registry()).unwrap();

        let stmts = body_of(&func);
        match stmts[0].node() {
            StmtNode::For(l) => {
                assert_eq!(l.var.as_var().unwrap().name, "px1");
                // bounds are x1_pos[0] and x1_pos[1]
                match (l.start.node(), l.end.node()) {
                    (ExprNode::Load(b), ExprNode::Load(e)) => {
                        assert_eq!(b.array.as_var().unwrap().name, "x1_pos");
                        assert!(b.index.is_int_literal(0));
                        assert_eq!(e.array.as_var().unwrap().name, "x1_pos");
                        assert!(e.index.is_int_literal(1));
                    }
                    other => panic!("expected loads for bounds, got {:?}", other),
                }
                match l.body.node() {
                    StmtNode::Block(b) => {
                        // i = x1_crd[px1]; y_vals[i] = x_vals[px1];
                        assert_eq!(b.stmts.len(), 2);
                        assert!(matches!(b.stmts[0].node(), StmtNode::Assign(_)));
                        match b.stmts[1].node() {
                            StmtNode::Store(s) => {
                                assert_eq!(s.array.as_var().unwrap().name, "y_vals");
                                assert_eq!(s.index.as_var().unwrap().name, "i");
                            }
                            other => panic!("expected store, got {:?}", other),
                        }
                    }
                    other => panic!("expected block body, got {:?}", other),
                }
            }
            other => panic!("expected for loop, got {:?}", other),
        }
    }

    #[test]
    fn test_csr_spmv_structure() {
        // y(i) = A(i,j) * x(j), A in CSR
        let a = TensorVar::new("A", "ds", ComponentType::Double).unwrap();
        let x = TensorVar::new("x", "d", ComponentType::Double).unwrap();
        let y = TensorVar::new("y", "d", ComponentType::Double).unwrap();
        let assign = Assignment::new(
            y.access("i"),
            IndexExpr::mul(a.access("ij").into(), x.access("j").into()),
        );
        let func = lower(&assign, "spmv", &registry()).unwrap();

        let f = func.as_function().unwrap();
        let names: Vec<&str> = f
            .inputs
            .iter()
            .map(|e| e.as_var().unwrap().name.as_str())
            .collect();
        assert_eq!(
            names,
            ["i_dim", "j_dim", "A2_pos", "A2_crd", "A_vals", "x_vals"]
        );

        let stmts = body_of(&func);
        let outer = match stmts[0].node() {
            StmtNode::For(l) => l,
            other => panic!("expected outer loop, got {:?}", other),
        };
        assert_eq!(outer.var.as_var().unwrap().name, "i");

        let outer_body = match outer.body.node() {
            StmtNode::Block(b) => &b.stmts,
            other => panic!("expected block, got {:?}", other),
        };
        let inner = match outer_body[0].node() {
            StmtNode::For(l) => l,
            other => panic!("expected inner loop, got {:?}", other),
        };
        assert_eq!(inner.var.as_var().unwrap().name, "pA2");
        // inner bounds segment by the row: A2_pos[i] .. A2_pos[i + 1]
        match inner.start.node() {
            ExprNode::Load(l) => {
                assert_eq!(l.array.as_var().unwrap().name, "A2_pos");
                assert_eq!(l.index.as_var().unwrap().name, "i");
            }
            other => panic!("expected load, got {:?}", other),
        }

        // innermost statement accumulates into y_vals[i]
        let inner_body = match inner.body.node() {
            StmtNode::Block(b) => &b.stmts,
            other => panic!("expected block, got {:?}", other),
        };
        match inner_body.last().unwrap().node() {
            StmtNode::Store(s) => {
                assert_eq!(s.array.as_var().unwrap().name, "y_vals");
                assert_eq!(s.index.as_var().unwrap().name, "i");
                match s.value.node() {
                    ExprNode::Binary(add) => {
                        assert_eq!(add.op, BinOp::Add);
                        assert!(matches!(add.lhs.node(), ExprNode::Load(_)));
                        assert!(matches!(add.rhs.node(), ExprNode::Binary(_)));
                    }
                    other => panic!("expected accumulation, got {:?}", other),
                }
            }
            other => panic!("expected store, got {:?}", other),
        }
    }

    #[test]
    fn test_sparse_coiteration_is_rejected() {
        let a = TensorVar::new("a", "s", ComponentType::Double).unwrap();
        let b = TensorVar::new("b", "s", ComponentType::Double).unwrap();
        let y = TensorVar::new("y", "d", ComponentType::Double).unwrap();
        let assign = Assignment::new(
            y.access("i"),
            IndexExpr::mul(a.access("i").into(), b.access("i").into()),
        );
        let err = lower(&assign, "mul", &registry()).unwrap_err();
        assert!(matches!(err, LowerError::Unsupported { .. }));
    }

    #[test]
    fn test_replicated_input_is_rejected() {
        let r = TensorVar::new("r", "r", ComponentType::Double).unwrap();
        let y = TensorVar::new("y", "d", ComponentType::Double).unwrap();
        let assign = Assignment::new(y.access("i"), r.access("i").into());
        let err = lower(&assign, "rep", &registry()).unwrap_err();
        assert!(matches!(err, LowerError::Unsupported { .. }));
    }

    #[test]
    fn test_arity_mismatch_is_reported() {
        let a = TensorVar::new("A", "ds", ComponentType::Double).unwrap();
        let y = TensorVar::new("y", "d", ComponentType::Double).unwrap();
        let assign = Assignment::new(y.access("i"), a.access("i").into());
        let err = lower(&assign, "bad", &registry()).unwrap_err();
        assert!(matches!(err, LowerError::ArityMismatch { expected: 2, got: 1, .. }));
    }

    #[test]
    fn test_scalar_reduction() {
        // s() = x(i), x compressed: accumulate into a single cell
        let x = TensorVar::new("x", "s", ComponentType::Double).unwrap();
        let s = TensorVar::new("s", "", ComponentType::Double).unwrap();
        let assign = Assignment::new(s.access(""), x.access("i").into());
        let func = lower(&assign, "sum", &registry()).unwrap();

        let stmts = body_of(&func);
        match stmts[0].node() {
            StmtNode::For(l) => match l.body.node() {
                StmtNode::Block(b) => match b.stmts.last().unwrap().node() {
                    StmtNode::Store(st) => {
                        assert_eq!(st.array.as_var().unwrap().name, "s_vals");
                        assert!(st.index.is_int_literal(0));
                    }
                    other => panic!("expected store, got {:?}", other),
                },
                other => panic!("expected block, got {:?}", other),
            },
            other => panic!("expected loop, got {:?}", other),
        }
    }
}
