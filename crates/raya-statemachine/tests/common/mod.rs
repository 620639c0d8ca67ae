//! Shared fixtures for the lowering integration tests

#![allow(dead_code)]

use raya_statemachine::ast::{Block, CatchClause, Expr, ExprKind, MethodRef, Span, Stmt, StmtKind, TryStmt};
use raya_statemachine::entity::{
    GenericOwner, GenericParamId, LocalDef, LocalId, LocalOrigin, MethodDef, MethodId, ParamDef, ParamId,
    TypeDef, TypeDefId,
};
use raya_statemachine::{transform_method, Compilation, GeneratorKind, StateMachine, StateMachineOptions, StateMachineResult, Ty};

/// Declare a non-generic class
pub fn class(cx: &mut Compilation, name: &str) -> TypeDefId {
    cx.add_type(TypeDef::new(name, Span::default()))
}

/// Declare a generic class with the given parameter names
pub fn generic_class(cx: &mut Compilation, name: &str, params: &[&str]) -> (TypeDefId, Vec<GenericParamId>) {
    let id = class(cx, name);
    let params: Vec<GenericParamId> = params
        .iter()
        .map(|p| cx.add_generic_param(*p, GenericOwner::Type(id)))
        .collect();
    cx.type_def_mut(id).generic_params = params.clone();
    (id, params)
}

pub fn method(cx: &mut Compilation, owner: TypeDefId, name: &str, ret: Ty) -> MethodId {
    cx.add_method(MethodDef::new(name, owner, ret, Span::default()))
}

/// Add a used parameter to `method`
pub fn param(cx: &mut Compilation, method: MethodId, name: &str, ty: Ty) -> ParamId {
    let id = cx.add_param(ParamDef {
        name: name.to_string(),
        ty,
        used: true,
    });
    cx.method_mut(method).params.push(id);
    id
}

/// Add a local to `method`
pub fn local(cx: &mut Compilation, method: MethodId, name: &str, ty: Ty, origin: LocalOrigin) -> LocalId {
    let id = cx.add_local(LocalDef {
        name: name.to_string(),
        ty,
        origin,
    });
    cx.method_mut(method).locals.push(id);
    id
}

pub fn set_body(cx: &mut Compilation, method: MethodId, stmts: Vec<Stmt>) {
    cx.method_mut(method).body = Block::new(stmts);
}

pub fn lower(cx: &mut Compilation, method: MethodId) -> StateMachineResult<StateMachine> {
    transform_method(cx, method, &GeneratorKind::new(), &StateMachineOptions::default())
}

// ============================================================================
// Statement helpers
// ============================================================================

pub fn yield_value(value: Expr) -> Stmt {
    Stmt::synthetic(StmtKind::Yield(Some(value)))
}

pub fn yield_int(n: i64) -> Stmt {
    yield_value(Expr::int(n))
}

pub fn expr_stmt(expr: Expr) -> Stmt {
    Stmt::expr(expr)
}

pub fn declare(local: LocalId, init: Expr) -> Stmt {
    Stmt::synthetic(StmtKind::Declare {
        local,
        ty: None,
        init: Some(init),
    })
}

pub fn try_ensure(protected: Vec<Stmt>, ensure: Vec<Stmt>) -> Stmt {
    Stmt::synthetic(StmtKind::Try(TryStmt {
        protected: Block::new(protected),
        handlers: Vec::new(),
        ensure: Some(Block::new(ensure)),
    }))
}

pub fn try_catch(protected: Vec<Stmt>, local: Option<LocalId>, handler: Vec<Stmt>) -> Stmt {
    Stmt::synthetic(StmtKind::Try(TryStmt {
        protected: Block::new(protected),
        handlers: vec![CatchClause {
            local,
            ty: None,
            body: Block::new(handler),
            span: Span::default(),
        }],
        ensure: None,
    }))
}

/// `target.method(args)` bound through a generic instantiation
pub fn mapped_call(target: Expr, method: MethodId, declaring: Ty, args: Vec<Expr>) -> Expr {
    Expr::call(
        Expr::member(
            target,
            MethodRef::Mapped {
                source: method,
                declaring,
            },
        ),
        args,
    )
}

// ============================================================================
// Inspection helpers
// ============================================================================

pub fn driver_body(cx: &Compilation, machine: &StateMachine) -> Block {
    cx.method(machine.synthetic.driver).body.clone()
}

/// Every statement of `block`, nested ones included, in pre-order
pub fn all_stmts(block: &Block) -> Vec<&Stmt> {
    let mut out = Vec::new();
    collect_stmts(block, &mut out);
    out
}

fn collect_stmts<'a>(block: &'a Block, out: &mut Vec<&'a Stmt>) {
    for stmt in &block.stmts {
        out.push(stmt);
        match &stmt.kind {
            StmtKind::If {
                then_block,
                else_block,
                ..
            } => {
                collect_stmts(then_block, out);
                if let Some(b) = else_block {
                    collect_stmts(b, out);
                }
            }
            StmtKind::While { body, .. } => collect_stmts(body, out),
            StmtKind::Block(b) => collect_stmts(b, out),
            StmtKind::Try(t) => {
                collect_stmts(&t.protected, out);
                for h in &t.handlers {
                    collect_stmts(&h.body, out);
                }
                if let Some(b) = &t.ensure {
                    collect_stmts(b, out);
                }
            }
            _ => {}
        }
    }
}

/// Slot numbers of every suspension in `block`, in pre-order
pub fn suspend_states(block: &Block) -> Vec<usize> {
    all_stmts(block)
        .into_iter()
        .filter_map(|s| match s.kind {
            StmtKind::Suspend { state, .. } => Some(state),
            _ => None,
        })
        .collect()
}

/// Number of calls of `method` in `block`
pub fn calls_to(block: &Block, method: MethodId) -> usize {
    all_stmts(block)
        .into_iter()
        .filter(|s| match &s.kind {
            StmtKind::Expr(Expr {
                kind: ExprKind::Call { callee, .. },
                ..
            }) => matches!(&callee.kind, ExprKind::Member { method: m, .. } if m.method_id() == method),
            _ => false,
        })
        .count()
}

/// Generic parameters mentioned anywhere in `block`
pub fn generic_params_in(block: &Block) -> Vec<GenericParamId> {
    let mut params = Vec::new();
    block.for_each_type(&mut |ty| ty.for_each_generic_param(&mut |p| params.push(p)));
    params
}
