//! C code emission.
//!
//! [`CodeGenC`] translates a [`Function`] IR node into a C translation
//! unit. The algorithm:
//!
//! 1. walk the body with a permissive visitor observing every variable
//!    reference; parameters keep their names, every other variable gets
//!    a hygienic name from [`crate::namer::fresh_name`];
//! 2. collect one local declaration per discovered non-parameter
//!    variable, in first-seen order;
//! 3. print the `int <name>(<inputs>, <outputs>)` signature with types
//!    derived from each parameter's [`ComponentType`];
//! 4. print the body by strict-visitor recursion; variable references
//!    print their table entry, looked up by node identity, so two
//!    distinct variables sharing an original name stay distinct;
//! 5. the outermost block prints the collected declarations first and a
//!    terminal `return 0;` last.
//!
//! Ill-formed IR (a non-variable parameter, a variable missing from the
//! table, a component type with no C rendering) indicates a compiler
//! bug and panics with a diagnostic naming the offending node.

use std::collections::HashSet;

use indexmap::IndexMap;
use log::debug;

use tengen_ir::{
    Assign, BinOp, Binary, Block, Cast, ComponentType, Expr, ExprId, For, Function, IfThenElse,
    IrVisitor, IrVisitorStrict, LitValue, Literal, Load, LoopKind, Stmt, StmtNode, Store, UnOp,
    Unary, Var, While,
};

use crate::namer::fresh_name;

/// The loop hint printed above vectorized loops. Width zero requests
/// width-unbounded vectorization.
pub fn vectorize_pragma(width: usize) -> String {
    let mut pragma = String::from("#pragma clang loop interleave(enable) ");
    if width == 0 {
        pragma.push_str("vectorize(enable)");
    } else {
        pragma.push_str(&format!("vectorize_width({})", width));
    }
    pragma
}

fn c_type(ty: ComponentType, is_ptr: bool) -> String {
    let base = match ty {
        ComponentType::Int => "int",
        ComponentType::Float => "float",
        ComponentType::Double => "double",
        other => panic!("codegen: no C rendering for component type `{}`", other),
    };
    if is_ptr {
        format!("{}*", base)
    } else {
        base.to_string()
    }
}

struct VarEntry {
    expr: Expr,
    name: String,
}

/// Discovers every variable referenced by a function body. Parameters
/// are pre-seeded with their original names; the rest are renamed
/// hygienically on first sight. Keyed by node identity.
struct FindVars {
    vars: IndexMap<ExprId, VarEntry>,
    params: HashSet<ExprId>,
}

impl FindVars {
    fn new(inputs: &[Expr], outputs: &[Expr]) -> FindVars {
        let mut vars = IndexMap::new();
        let mut params = HashSet::new();
        for param in inputs.iter().chain(outputs.iter()) {
            let var = param
                .as_var()
                .unwrap_or_else(|| panic!("codegen: parameter {:?} is not a variable", param));
            if vars
                .insert(
                    param.id(),
                    VarEntry {
                        expr: param.clone(),
                        name: var.name.clone(),
                    },
                )
                .is_some()
            {
                panic!("codegen: duplicate parameter `{}`", var.name);
            }
            params.insert(param.id());
        }
        FindVars { vars, params }
    }
}

impl IrVisitor for FindVars {
    fn visit_var(&mut self, op: &Var, expr: &Expr) {
        if !self.vars.contains_key(&expr.id()) {
            self.vars.insert(
                expr.id(),
                VarEntry {
                    expr: expr.clone(),
                    name: fresh_name(&op.name),
                },
            );
        }
    }
}

/// The C emitter.
#[derive(Default)]
pub struct CodeGenC {
    out: String,
    indent: usize,
    var_names: IndexMap<ExprId, String>,
    func_decls: String,
    func_block: bool,
}

impl CodeGenC {
    pub fn new() -> CodeGenC {
        CodeGenC::default()
    }

    /// Emit a statement (normally a [`Function`] node) as C source.
    pub fn emit(stmt: &Stmt) -> String {
        let mut codegen = CodeGenC::new();
        stmt.accept(&mut codegen);
        codegen.out
    }

    fn push(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn do_indent(&mut self) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
    }

    /// Print a loop or conditional body between braces at the current
    /// indent.
    fn emit_braced(&mut self, body: &Stmt) {
        self.do_indent();
        self.push("{\n");
        if matches!(body.node(), StmtNode::Block(_)) {
            body.accept(self);
        } else {
            self.indent += 1;
            body.accept(self);
            self.indent -= 1;
        }
        self.do_indent();
        self.push("}\n");
    }
}

impl IrVisitorStrict for CodeGenC {
    fn visit_var(&mut self, op: &Var, expr: &Expr) {
        let name = self
            .var_names
            .get(&expr.id())
            .unwrap_or_else(|| panic!("codegen: variable `{}` not in the variable table", op.name))
            .clone();
        self.push(&name);
    }

    fn visit_literal(&mut self, op: &Literal, _expr: &Expr) {
        let text = match op.value {
            LitValue::Int(v) => v.to_string(),
            LitValue::Float(v) => format!("{:?}", v),
            LitValue::Bool(v) => String::from(if v { "1" } else { "0" }),
        };
        self.push(&text);
    }

    fn visit_binary(&mut self, op: &Binary, _expr: &Expr) {
        match op.op {
            // min/max render as ternaries so emitted code needs no
            // helper headers
            BinOp::Min | BinOp::Max => {
                let cmp = if op.op == BinOp::Min { " < " } else { " > " };
                self.push("((");
                op.lhs.accept(self);
                self.push(cmp);
                op.rhs.accept(self);
                self.push(") ? (");
                op.lhs.accept(self);
                self.push(") : (");
                op.rhs.accept(self);
                self.push("))");
            }
            _ => {
                let sym = match op.op {
                    BinOp::Add => " + ",
                    BinOp::Sub => " - ",
                    BinOp::Mul => " * ",
                    BinOp::Div => " / ",
                    BinOp::Rem => " % ",
                    BinOp::BitAnd => " & ",
                    BinOp::Eq => " == ",
                    BinOp::Neq => " != ",
                    BinOp::Gt => " > ",
                    BinOp::Lt => " < ",
                    BinOp::Gte => " >= ",
                    BinOp::Lte => " <= ",
                    BinOp::And => " && ",
                    BinOp::Or => " || ",
                    BinOp::Min | BinOp::Max => unreachable!("handled above"),
                };
                self.push("(");
                op.lhs.accept(self);
                self.push(sym);
                op.rhs.accept(self);
                self.push(")");
            }
        }
    }

    fn visit_unary(&mut self, op: &Unary, _expr: &Expr) {
        let sym = match op.op {
            UnOp::Neg => "-",
            UnOp::Not => "!",
        };
        self.push("(");
        self.push(sym);
        op.operand.accept(self);
        self.push(")");
    }

    fn visit_load(&mut self, op: &Load, _expr: &Expr) {
        op.array.accept(self);
        self.push("[");
        op.index.accept(self);
        self.push("]");
    }

    fn visit_cast(&mut self, op: &Cast, _expr: &Expr) {
        self.push(&format!("({})(", c_type(op.ty, false)));
        op.operand.accept(self);
        self.push(")");
    }

    fn visit_assign(&mut self, op: &Assign, _stmt: &Stmt) {
        self.do_indent();
        op.var.accept(self);
        self.push(" = ");
        op.rhs.accept(self);
        self.push(";\n");
    }

    fn visit_store(&mut self, op: &Store, _stmt: &Stmt) {
        self.do_indent();
        op.array.accept(self);
        self.push("[");
        op.index.accept(self);
        self.push("] = ");
        op.value.accept(self);
        self.push(";\n");
    }

    fn visit_for(&mut self, op: &For, _stmt: &Stmt) {
        if op.kind == LoopKind::Vectorized {
            self.do_indent();
            let pragma = vectorize_pragma(op.vec_width);
            self.push(&pragma);
            self.push("\n");
        }
        self.do_indent();
        self.push("for (");
        op.var.accept(self);
        self.push("=");
        op.start.accept(self);
        self.push("; ");
        op.var.accept(self);
        self.push("<");
        op.end.accept(self);
        self.push("; ");
        op.var.accept(self);
        self.push("+=");
        op.increment.accept(self);
        self.push(")\n");
        self.emit_braced(&op.body);
    }

    fn visit_while(&mut self, op: &While, _stmt: &Stmt) {
        // it is unclear that the C compiler will vectorize a while loop,
        // but the hint is printed all the same
        if op.kind == LoopKind::Vectorized {
            self.do_indent();
            let pragma = vectorize_pragma(op.vec_width);
            self.push(&pragma);
            self.push("\n");
        }
        self.do_indent();
        self.push("while (");
        op.cond.accept(self);
        self.push(")\n");
        self.emit_braced(&op.body);
    }

    fn visit_if_then_else(&mut self, op: &IfThenElse, _stmt: &Stmt) {
        self.do_indent();
        self.push("if (");
        op.cond.accept(self);
        self.push(")\n");
        self.emit_braced(&op.then_case);
        if let Some(else_case) = &op.else_case {
            self.do_indent();
            self.push("else\n");
            self.emit_braced(else_case);
        }
    }

    fn visit_block(&mut self, op: &Block, _stmt: &Stmt) {
        let output_return = self.func_block;
        self.func_block = false;
        self.indent += 1;
        if output_return {
            // the first block of a function carries the declarations
            let decls = std::mem::take(&mut self.func_decls);
            self.push(&decls);
        }
        for stmt in &op.stmts {
            stmt.accept(self);
        }
        if output_return {
            self.do_indent();
            self.push("return 0;\n");
        }
        self.indent -= 1;
    }

    fn visit_function(&mut self, op: &Function, _stmt: &Stmt) {
        debug!(
            "emitting `{}`: {} inputs, {} outputs",
            op.name,
            op.inputs.len(),
            op.outputs.len()
        );

        let mut finder = FindVars::new(&op.inputs, &op.outputs);
        finder.visit_stmt(&op.body);

        let mut decls = String::new();
        for (id, entry) in &finder.vars {
            if finder.params.contains(id) {
                continue;
            }
            let var = entry.expr.as_var().expect("only variables enter the table");
            decls.push_str(&format!(
                "  {} {};\n",
                c_type(var.ty, var.is_ptr),
                entry.name
            ));
        }
        self.func_decls = decls;
        self.var_names = finder
            .vars
            .into_iter()
            .map(|(id, entry)| (id, entry.name))
            .collect();

        self.push(&format!("int {}(", op.name));
        let mut first = true;
        for param in op.inputs.iter().chain(op.outputs.iter()) {
            let var = param.as_var().expect("parameters checked by FindVars");
            if !first {
                self.push(", ");
            }
            first = false;
            self.push(&format!("{} {}", c_type(var.ty, var.is_ptr), var.name));
        }
        self.push(") {\n");

        self.func_block = true;
        op.body.accept(self);
        self.push("}\n");

        // clear function-scope state
        self.func_block = true;
        self.func_decls.clear();
    }
}
