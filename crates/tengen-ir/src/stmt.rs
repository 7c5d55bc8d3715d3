//! IR statements.
//!
//! Statements share the handle/node split of [`crate::expr`]: a [`Stmt`]
//! is a cheap-clone reference-counted handle, and nodes may be referenced
//! from more than one place. Constructors assert the structural
//! invariants (assignment targets and function parameters must be
//! variables); violations are programmer errors and panic.

use std::fmt;
use std::rc::Rc;

use crate::expr::Expr;

/// Execution strategy tag for loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopKind {
    Serial,
    Parallel,
    Vectorized,
}

/// Assignment to a scalar variable.
#[derive(Debug)]
pub struct Assign {
    pub var: Expr,
    pub rhs: Expr,
}

/// Store through a pointer expression.
#[derive(Debug)]
pub struct Store {
    pub array: Expr,
    pub index: Expr,
    pub value: Expr,
}

/// Counted loop. `vec_width` is meaningful only for
/// [`LoopKind::Vectorized`]; zero requests width-unbounded vectorization.
#[derive(Debug)]
pub struct For {
    pub var: Expr,
    pub start: Expr,
    pub end: Expr,
    pub increment: Expr,
    pub kind: LoopKind,
    pub vec_width: usize,
    pub body: Stmt,
}

/// Condition-driven loop.
#[derive(Debug)]
pub struct While {
    pub cond: Expr,
    pub kind: LoopKind,
    pub vec_width: usize,
    pub body: Stmt,
}

/// Two-armed conditional; the else arm is optional.
#[derive(Debug)]
pub struct IfThenElse {
    pub cond: Expr,
    pub then_case: Stmt,
    pub else_case: Option<Stmt>,
}

/// Statement sequence.
#[derive(Debug)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

/// A generated function: ordered inputs, ordered outputs, one body.
#[derive(Debug)]
pub struct Function {
    pub name: String,
    pub inputs: Vec<Expr>,
    pub outputs: Vec<Expr>,
    pub body: Stmt,
}

/// The statement node sum.
#[derive(Debug)]
pub enum StmtNode {
    Assign(Assign),
    Store(Store),
    For(For),
    While(While),
    IfThenElse(IfThenElse),
    Block(Block),
    Function(Function),
}

/// Shared handle to a statement node.
#[derive(Clone)]
pub struct Stmt {
    node: Rc<StmtNode>,
}

impl Stmt {
    fn new(node: StmtNode) -> Stmt {
        Stmt {
            node: Rc::new(node),
        }
    }

    /// The underlying node.
    pub fn node(&self) -> &StmtNode {
        &self.node
    }

    /// Whether two handles reference the same node.
    pub fn same(a: &Stmt, b: &Stmt) -> bool {
        Rc::ptr_eq(&a.node, &b.node)
    }

    /// Whether this is a block with no statements. Mode mutation hooks
    /// return an empty block to mean "supported, nothing to do".
    pub fn is_empty_block(&self) -> bool {
        matches!(self.node(), StmtNode::Block(b) if b.stmts.is_empty())
    }

    // --- constructors -----------------------------------------------------

    /// `var = rhs`. Panics if `var` is not a variable.
    pub fn assign(var: Expr, rhs: Expr) -> Stmt {
        if var.as_var().is_none() {
            panic!("ill-formed IR: assignment target {:?} is not a variable", var);
        }
        Stmt::new(StmtNode::Assign(Assign { var, rhs }))
    }

    /// `array[index] = value`.
    pub fn store(array: Expr, index: Expr, value: Expr) -> Stmt {
        Stmt::new(StmtNode::Store(Store {
            array,
            index,
            value,
        }))
    }

    /// A serial counted loop with unit increment.
    pub fn for_(var: Expr, start: Expr, end: Expr, body: Stmt) -> Stmt {
        Stmt::loop_(var, start, end, Expr::int(1), LoopKind::Serial, 0, body)
    }

    /// A counted loop with explicit increment, kind and vector width.
    /// Panics if the induction variable is not a variable.
    pub fn loop_(
        var: Expr,
        start: Expr,
        end: Expr,
        increment: Expr,
        kind: LoopKind,
        vec_width: usize,
        body: Stmt,
    ) -> Stmt {
        if var.as_var().is_none() {
            panic!("ill-formed IR: loop induction {:?} is not a variable", var);
        }
        Stmt::new(StmtNode::For(For {
            var,
            start,
            end,
            increment,
            kind,
            vec_width,
            body,
        }))
    }

    /// A condition-driven loop.
    pub fn while_(cond: Expr, body: Stmt) -> Stmt {
        Stmt::new(StmtNode::While(While {
            cond,
            kind: LoopKind::Serial,
            vec_width: 0,
            body,
        }))
    }

    /// A condition-driven loop with kind and vector width.
    pub fn while_kind(cond: Expr, kind: LoopKind, vec_width: usize, body: Stmt) -> Stmt {
        Stmt::new(StmtNode::While(While {
            cond,
            kind,
            vec_width,
            body,
        }))
    }

    /// A one-armed conditional.
    pub fn if_then(cond: Expr, then_case: Stmt) -> Stmt {
        Stmt::new(StmtNode::IfThenElse(IfThenElse {
            cond,
            then_case,
            else_case: None,
        }))
    }

    /// A two-armed conditional.
    pub fn if_then_else(cond: Expr, then_case: Stmt, else_case: Stmt) -> Stmt {
        Stmt::new(StmtNode::IfThenElse(IfThenElse {
            cond,
            then_case,
            else_case: Some(else_case),
        }))
    }

    /// A statement sequence.
    pub fn block(stmts: Vec<Stmt>) -> Stmt {
        Stmt::new(StmtNode::Block(Block { stmts }))
    }

    /// The canonical "supported, nothing to do" statement.
    pub fn empty_block() -> Stmt {
        Stmt::block(Vec::new())
    }

    /// A function definition. Panics unless every input and output is a
    /// variable expression.
    pub fn function(
        name: impl Into<String>,
        inputs: Vec<Expr>,
        outputs: Vec<Expr>,
        body: Stmt,
    ) -> Stmt {
        let name = name.into();
        for param in inputs.iter().chain(outputs.iter()) {
            if param.as_var().is_none() {
                panic!(
                    "ill-formed IR: parameter {:?} of function `{}` is not a variable",
                    param, name
                );
            }
        }
        Stmt::new(StmtNode::Function(Function {
            name,
            inputs,
            outputs,
            body,
        }))
    }

    /// View as a function node, if it is one.
    pub fn as_function(&self) -> Option<&Function> {
        match self.node() {
            StmtNode::Function(f) => Some(f),
            _ => None,
        }
    }
}

impl fmt::Debug for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.node().fmt(f)
    }
}
