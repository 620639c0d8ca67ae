//! Bound syntax tree
//!
//! The tree consumed and produced by the state machine lowering. Semantic
//! analysis has already run: every variable, parameter, field, method and
//! type reference carries the entity it resolves to.

use crate::entity::{FieldId, LocalId, MethodId, ParamId};
use crate::ty::Ty;

/// Source location of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }
}

/// Literal values
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Bool(bool),
    Str(String),
    Null,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Gt,
    Eq,
    NotEq,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

/// A type written in source (annotation, cast target, `new` target)
#[derive(Debug, Clone, PartialEq)]
pub struct TypeRef {
    pub ty: Ty,
    pub span: Span,
}

impl TypeRef {
    pub fn new(ty: Ty, span: Span) -> Self {
        Self { ty, span }
    }
}

/// The method a member access is bound to
#[derive(Debug, Clone, PartialEq)]
pub enum MethodRef {
    /// A method definition reached directly
    Def(MethodId),
    /// A method of a generic class seen through one of its instantiations,
    /// e.g. `add` on `List<T>`; `declaring` is the constructed type
    Mapped { source: MethodId, declaring: Ty },
}

impl MethodRef {
    /// The underlying method definition
    pub fn method_id(&self) -> MethodId {
        match self {
            MethodRef::Def(id) => *id,
            MethodRef::Mapped { source, .. } => *source,
        }
    }
}

/// An expression node
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

/// Expression variants
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    /// Read or write of a local variable
    Local(LocalId),
    /// Read or write of a method parameter
    Param(ParamId),
    /// `target.field`
    Field { target: Box<Expr>, field: FieldId },
    /// `self`, typed as the instance type it denotes
    SelfRef(Ty),
    /// `super`; `method` is bound when `super` is itself the callee of a
    /// chaining call `super(...)`
    Super { method: Option<MethodId> },
    /// `target.method`, used as the callee of a [`ExprKind::Call`]
    Member { target: Box<Expr>, method: MethodRef },
    Call { callee: Box<Expr>, args: Vec<Expr> },
    New { ty: TypeRef, args: Vec<Expr> },
    /// Invocation of the supertype's parameterless constructor
    BaseConstructorCall { base: Ty },
    Assign { target: Box<Expr>, value: Box<Expr> },
    Binary { op: BinaryOp, left: Box<Expr>, right: Box<Expr> },
    Not(Box<Expr>),
    Cast { expr: Box<Expr>, ty: TypeRef },
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Node without a source location, for synthesized code
    pub fn synthetic(kind: ExprKind) -> Self {
        Self::new(kind, Span::default())
    }

    pub fn int(value: i64) -> Self {
        Self::synthetic(ExprKind::Literal(Literal::Int(value)))
    }

    pub fn local(local: LocalId) -> Self {
        Self::synthetic(ExprKind::Local(local))
    }

    pub fn param(param: ParamId) -> Self {
        Self::synthetic(ExprKind::Param(param))
    }

    pub fn self_ref(ty: Ty) -> Self {
        Self::synthetic(ExprKind::SelfRef(ty))
    }

    pub fn field(target: Expr, field: FieldId) -> Self {
        let span = target.span;
        Self::new(
            ExprKind::Field {
                target: Box::new(target),
                field,
            },
            span,
        )
    }

    pub fn member(target: Expr, method: MethodRef) -> Self {
        let span = target.span;
        Self::new(
            ExprKind::Member {
                target: Box::new(target),
                method,
            },
            span,
        )
    }

    pub fn call(callee: Expr, args: Vec<Expr>) -> Self {
        let span = callee.span;
        Self::new(
            ExprKind::Call {
                callee: Box::new(callee),
                args,
            },
            span,
        )
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        let span = target.span;
        Self::new(
            ExprKind::Assign {
                target: Box::new(target),
                value: Box::new(value),
            },
            span,
        )
    }
}

/// A statement node
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

/// Statement variants
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Expr(Expr),
    /// Declaration of a local, with optional annotation and initializer
    Declare {
        local: LocalId,
        ty: Option<TypeRef>,
        init: Option<Expr>,
    },
    Return(Option<Expr>),
    /// A suspension point in the source body
    Yield(Option<Expr>),
    /// A lowered suspension point: park in `state` and hand `value` out
    Suspend { value: Option<Expr>, state: usize },
    If {
        cond: Expr,
        then_block: Block,
        else_block: Option<Block>,
    },
    While { cond: Expr, body: Block },
    Block(Block),
    Try(TryStmt),
    Throw(Option<Expr>),
    Break,
    Continue,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn expr(expr: Expr) -> Self {
        let span = expr.span;
        Self::new(StmtKind::Expr(expr), span)
    }

    pub fn synthetic(kind: StmtKind) -> Self {
        Self::new(kind, Span::default())
    }
}

/// An exception-protected region
#[derive(Debug, Clone, PartialEq)]
pub struct TryStmt {
    pub protected: Block,
    pub handlers: Vec<CatchClause>,
    /// The cleanup (finally) block
    pub ensure: Option<Block>,
}

/// One catch clause of a [`TryStmt`]
#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    /// Local receiving the caught exception
    pub local: Option<LocalId>,
    pub ty: Option<TypeRef>,
    pub body: Block,
    pub span: Span,
}

/// A sequence of statements
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Self { stmts }
    }

    pub fn push(&mut self, stmt: Stmt) {
        self.stmts.push(stmt);
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    /// Visit every type mentioned in the block: annotations, casts, `new`
    /// targets, `self` types, constructed declaring types of mapped members
    pub fn for_each_type(&self, f: &mut impl FnMut(&Ty)) {
        for stmt in &self.stmts {
            stmt_types(stmt, f);
        }
    }
}

fn stmt_types(stmt: &Stmt, f: &mut impl FnMut(&Ty)) {
    match &stmt.kind {
        StmtKind::Expr(e) => expr_types(e, f),
        StmtKind::Declare { ty, init, .. } => {
            if let Some(ty) = ty {
                f(&ty.ty);
            }
            if let Some(init) = init {
                expr_types(init, f);
            }
        }
        StmtKind::Return(e) | StmtKind::Yield(e) | StmtKind::Throw(e) | StmtKind::Suspend { value: e, .. } => {
            if let Some(e) = e {
                expr_types(e, f);
            }
        }
        StmtKind::If {
            cond,
            then_block,
            else_block,
        } => {
            expr_types(cond, f);
            then_block.for_each_type(f);
            if let Some(b) = else_block {
                b.for_each_type(f);
            }
        }
        StmtKind::While { cond, body } => {
            expr_types(cond, f);
            body.for_each_type(f);
        }
        StmtKind::Block(b) => b.for_each_type(f),
        StmtKind::Try(t) => {
            t.protected.for_each_type(f);
            for h in &t.handlers {
                if let Some(ty) = &h.ty {
                    f(&ty.ty);
                }
                h.body.for_each_type(f);
            }
            if let Some(b) = &t.ensure {
                b.for_each_type(f);
            }
        }
        StmtKind::Break | StmtKind::Continue => {}
    }
}

fn expr_types(expr: &Expr, f: &mut impl FnMut(&Ty)) {
    match &expr.kind {
        ExprKind::Literal(_) | ExprKind::Local(_) | ExprKind::Param(_) | ExprKind::Super { .. } => {}
        ExprKind::SelfRef(ty) | ExprKind::BaseConstructorCall { base: ty } => f(ty),
        ExprKind::Field { target, .. } => expr_types(target, f),
        ExprKind::Member { target, method } => {
            expr_types(target, f);
            if let MethodRef::Mapped { declaring, .. } = method {
                f(declaring);
            }
        }
        ExprKind::Call { callee, args } => {
            expr_types(callee, f);
            args.iter().for_each(|a| expr_types(a, f));
        }
        ExprKind::New { ty, args } => {
            f(&ty.ty);
            args.iter().for_each(|a| expr_types(a, f));
        }
        ExprKind::Assign { target, value } => {
            expr_types(target, f);
            expr_types(value, f);
        }
        ExprKind::Binary { left, right, .. } => {
            expr_types(left, f);
            expr_types(right, f);
        }
        ExprKind::Not(e) => expr_types(e, f),
        ExprKind::Cast { expr, ty } => {
            expr_types(expr, f);
            f(&ty.ty);
        }
    }
}
