//! Visitors over the IR.
//!
//! Two contracts:
//!
//! - [`IrVisitorStrict`] declares one required method per concrete node
//!   kind, with no defaults. Exhaustiveness is enforced statically, both
//!   by the trait and by the `match` inside [`Expr::accept`] /
//!   [`Stmt::accept`]. Use it for passes that must handle every node
//!   (the C emitter).
//! - [`IrVisitor`] is permissive: every method defaults to a recursive
//!   walk over the node's children in canonical (field declaration)
//!   order, via the `walk_*` free functions. Specialize only the nodes a
//!   pass cares about (variable discovery, node collection).
//!
//! Traversal is pre-order and deterministic.

use crate::expr::{Binary, Cast, Expr, ExprNode, Literal, Load, Unary, Var};
use crate::stmt::{
    Assign, Block, For, Function, IfThenElse, Stmt, StmtNode, Store, While,
};

/// Exhaustive visitor: one method per node kind, no defaults.
pub trait IrVisitorStrict {
    fn visit_var(&mut self, op: &Var, expr: &Expr);
    fn visit_literal(&mut self, op: &Literal, expr: &Expr);
    fn visit_binary(&mut self, op: &Binary, expr: &Expr);
    fn visit_unary(&mut self, op: &Unary, expr: &Expr);
    fn visit_load(&mut self, op: &Load, expr: &Expr);
    fn visit_cast(&mut self, op: &Cast, expr: &Expr);

    fn visit_assign(&mut self, op: &Assign, stmt: &Stmt);
    fn visit_store(&mut self, op: &Store, stmt: &Stmt);
    fn visit_for(&mut self, op: &For, stmt: &Stmt);
    fn visit_while(&mut self, op: &While, stmt: &Stmt);
    fn visit_if_then_else(&mut self, op: &IfThenElse, stmt: &Stmt);
    fn visit_block(&mut self, op: &Block, stmt: &Stmt);
    fn visit_function(&mut self, op: &Function, stmt: &Stmt);
}

impl Expr {
    /// Dispatch to the matching strict visit method.
    pub fn accept(&self, v: &mut dyn IrVisitorStrict) {
        match self.node() {
            ExprNode::Var(op) => v.visit_var(op, self),
            ExprNode::Literal(op) => v.visit_literal(op, self),
            ExprNode::Binary(op) => v.visit_binary(op, self),
            ExprNode::Unary(op) => v.visit_unary(op, self),
            ExprNode::Load(op) => v.visit_load(op, self),
            ExprNode::Cast(op) => v.visit_cast(op, self),
        }
    }
}

impl Stmt {
    /// Dispatch to the matching strict visit method.
    pub fn accept(&self, v: &mut dyn IrVisitorStrict) {
        match self.node() {
            StmtNode::Assign(op) => v.visit_assign(op, self),
            StmtNode::Store(op) => v.visit_store(op, self),
            StmtNode::For(op) => v.visit_for(op, self),
            StmtNode::While(op) => v.visit_while(op, self),
            StmtNode::IfThenElse(op) => v.visit_if_then_else(op, self),
            StmtNode::Block(op) => v.visit_block(op, self),
            StmtNode::Function(op) => v.visit_function(op, self),
        }
    }
}

/// Permissive visitor with default recursive descent.
pub trait IrVisitor: Sized {
    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_var(&mut self, op: &Var, expr: &Expr) {
        let _ = (op, expr);
    }

    fn visit_literal(&mut self, op: &Literal, expr: &Expr) {
        let _ = (op, expr);
    }

    fn visit_binary(&mut self, op: &Binary, expr: &Expr) {
        let _ = expr;
        self.visit_expr(&op.lhs);
        self.visit_expr(&op.rhs);
    }

    fn visit_unary(&mut self, op: &Unary, expr: &Expr) {
        let _ = expr;
        self.visit_expr(&op.operand);
    }

    fn visit_load(&mut self, op: &Load, expr: &Expr) {
        let _ = expr;
        self.visit_expr(&op.array);
        self.visit_expr(&op.index);
    }

    fn visit_cast(&mut self, op: &Cast, expr: &Expr) {
        let _ = expr;
        self.visit_expr(&op.operand);
    }

    fn visit_assign(&mut self, op: &Assign, stmt: &Stmt) {
        let _ = stmt;
        self.visit_expr(&op.var);
        self.visit_expr(&op.rhs);
    }

    fn visit_store(&mut self, op: &Store, stmt: &Stmt) {
        let _ = stmt;
        self.visit_expr(&op.array);
        self.visit_expr(&op.index);
        self.visit_expr(&op.value);
    }

    fn visit_for(&mut self, op: &For, stmt: &Stmt) {
        let _ = stmt;
        self.visit_expr(&op.var);
        self.visit_expr(&op.start);
        self.visit_expr(&op.end);
        self.visit_expr(&op.increment);
        self.visit_stmt(&op.body);
    }

    fn visit_while(&mut self, op: &While, stmt: &Stmt) {
        let _ = stmt;
        self.visit_expr(&op.cond);
        self.visit_stmt(&op.body);
    }

    fn visit_if_then_else(&mut self, op: &IfThenElse, stmt: &Stmt) {
        let _ = stmt;
        self.visit_expr(&op.cond);
        self.visit_stmt(&op.then_case);
        if let Some(else_case) = &op.else_case {
            self.visit_stmt(else_case);
        }
    }

    fn visit_block(&mut self, op: &Block, stmt: &Stmt) {
        let _ = stmt;
        for s in &op.stmts {
            self.visit_stmt(s);
        }
    }

    fn visit_function(&mut self, op: &Function, stmt: &Stmt) {
        let _ = stmt;
        for input in &op.inputs {
            self.visit_expr(input);
        }
        for output in &op.outputs {
            self.visit_expr(output);
        }
        self.visit_stmt(&op.body);
    }
}

/// Dispatch an expression to the matching permissive visit method.
pub fn walk_expr<V: IrVisitor>(v: &mut V, expr: &Expr) {
    match expr.node() {
        ExprNode::Var(op) => v.visit_var(op, expr),
        ExprNode::Literal(op) => v.visit_literal(op, expr),
        ExprNode::Binary(op) => v.visit_binary(op, expr),
        ExprNode::Unary(op) => v.visit_unary(op, expr),
        ExprNode::Load(op) => v.visit_load(op, expr),
        ExprNode::Cast(op) => v.visit_cast(op, expr),
    }
}

/// Dispatch a statement to the matching permissive visit method.
pub fn walk_stmt<V: IrVisitor>(v: &mut V, stmt: &Stmt) {
    match stmt.node() {
        StmtNode::Assign(op) => v.visit_assign(op, stmt),
        StmtNode::Store(op) => v.visit_store(op, stmt),
        StmtNode::For(op) => v.visit_for(op, stmt),
        StmtNode::While(op) => v.visit_while(op, stmt),
        StmtNode::IfThenElse(op) => v.visit_if_then_else(op, stmt),
        StmtNode::Block(op) => v.visit_block(op, stmt),
        StmtNode::Function(op) => v.visit_function(op, stmt),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::ExprId;
    use crate::types::ComponentType;

    /// Records the identity of every expression node, first visit only.
    struct NodeRecorder {
        seen: Vec<ExprId>,
    }

    impl NodeRecorder {
        fn new() -> Self {
            NodeRecorder { seen: Vec::new() }
        }

        fn record(&mut self, expr: &Expr) {
            if !self.seen.contains(&expr.id()) {
                self.seen.push(expr.id());
            }
        }
    }

    impl IrVisitor for NodeRecorder {
        fn visit_expr(&mut self, expr: &Expr) {
            self.record(expr);
            walk_expr(self, expr);
        }
    }

    #[test]
    fn test_preorder_is_deterministic_and_deduplicated() {
        let i = Expr::var("i", ComponentType::Int);
        // i appears twice in (i + 2) * i
        let e = Expr::mul(Expr::add(i.clone(), Expr::int(2)), i.clone());

        let mut first = NodeRecorder::new();
        first.visit_expr(&e);
        let mut second = NodeRecorder::new();
        second.visit_expr(&e);

        assert_eq!(first.seen, second.seen);
        // mul, add, i, 2; the shared i recorded exactly once
        assert_eq!(first.seen.len(), 4);
        assert_eq!(
            first.seen.iter().filter(|id| **id == i.id()).count(),
            1
        );
    }

    #[test]
    fn test_walk_reaches_loop_children() {
        struct VarCounter {
            count: usize,
        }
        impl IrVisitor for VarCounter {
            fn visit_var(&mut self, _op: &Var, _expr: &Expr) {
                self.count += 1;
            }
        }

        let i = Expr::var("i", ComponentType::Int);
        let n = Expr::var("N", ComponentType::Int);
        let x = Expr::ptr("x", ComponentType::Double);
        let y = Expr::ptr("y", ComponentType::Double);
        let body = Stmt::store(y, i.clone(), Expr::load(x, i.clone()));
        let loop_ = Stmt::for_(i, Expr::int(0), n, body);

        let mut counter = VarCounter { count: 0 };
        counter.visit_stmt(&loop_);
        // i (induction) + N + y + i + x + i
        assert_eq!(counter.count, 6);
    }
}
