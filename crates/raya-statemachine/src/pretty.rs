//! Pretty-printing for lowered output
//!
//! Human-readable dumps of synthetic types, method bodies and slot tables,
//! used in tests and when debugging the lowering.

use std::fmt::Write;

use crate::ast::{Block, Expr, ExprKind, Literal, MethodRef, Stmt, StmtKind};
use crate::compilation::Compilation;
use crate::entity::{MethodId, MethodKind, TypeDefId, Visibility};
use crate::statemachine::{LabelTable, SlotKind, StateMachine};

/// Trait for pretty-printing lowered constructs
pub trait PrettyPrint {
    fn pretty_print(&self, cx: &Compilation) -> String;
}

impl PrettyPrint for TypeDefId {
    fn pretty_print(&self, cx: &Compilation) -> String {
        let def = cx.type_def(*self);
        let mut output = String::new();

        write!(output, "class {}", def.name).unwrap();
        if def.is_generic() {
            let params: Vec<&str> = def
                .generic_params
                .iter()
                .map(|&p| cx.generic_param(p).name.as_str())
                .collect();
            write!(output, "<{}>", params.join(", ")).unwrap();
        }
        if let Some(base) = &def.base {
            write!(output, " extends {}", cx.display_ty(base)).unwrap();
        }
        if !def.interfaces.is_empty() {
            let caps: Vec<String> = def.interfaces.iter().map(|i| cx.display_ty(i)).collect();
            write!(output, " implements {}", caps.join(", ")).unwrap();
        }
        writeln!(output, " {{").unwrap();

        for &field in &def.fields {
            let field = cx.field(field);
            writeln!(output, "  {}{}: {}", visibility(field.visibility), field.name, cx.display_ty(&field.ty)).unwrap();
        }
        for &method in def.constructors.iter().chain(&def.methods) {
            writeln!(output).unwrap();
            for line in method.pretty_print(cx).lines() {
                writeln!(output, "  {}", line).unwrap();
            }
        }

        writeln!(output, "}}").unwrap();
        output
    }
}

impl PrettyPrint for MethodId {
    fn pretty_print(&self, cx: &Compilation) -> String {
        let def = cx.method(*self);
        let mut output = String::new();

        let params: Vec<String> = def
            .params
            .iter()
            .map(|&p| {
                let param = cx.param(p);
                format!("{}: {}", param.name, cx.display_ty(&param.ty))
            })
            .collect();
        match def.kind {
            MethodKind::Constructor => writeln!(output, "{}({}) {{", def.name, params.join(", ")).unwrap(),
            MethodKind::Method => writeln!(
                output,
                "{}fn {}({}) -> {} {{",
                visibility(def.visibility),
                def.name,
                params.join(", "),
                cx.display_ty(&def.return_ty)
            )
            .unwrap(),
        }

        if !def.locals.is_empty() {
            let locals: Vec<String> = def
                .locals
                .iter()
                .map(|&l| format!("{}: {}", cx.local(l).name, cx.display_ty(&cx.local(l).ty)))
                .collect();
            writeln!(output, "  ; locals: {}", locals.join(", ")).unwrap();
        }
        write_block(&mut output, cx, &def.body, 1);
        writeln!(output, "}}").unwrap();
        output
    }
}

impl PrettyPrint for Block {
    fn pretty_print(&self, cx: &Compilation) -> String {
        let mut output = String::new();
        write_block(&mut output, cx, self, 0);
        output
    }
}

impl PrettyPrint for LabelTable {
    fn pretty_print(&self, _cx: &Compilation) -> String {
        let mut output = String::new();
        for (state, slot) in self.iter() {
            let kind = match slot.kind {
                SlotKind::Entry => "entry",
                SlotKind::Finished => "finished",
                SlotKind::Resume => "resume",
                SlotKind::FinishedAlias => "-> finished",
            };
            write!(output, "{:>3}: {}", state, kind).unwrap();
            if let Some(owner) = slot.owner {
                write!(output, " [{}]", owner).unwrap();
            }
            writeln!(output).unwrap();
        }
        output
    }
}

impl PrettyPrint for StateMachine {
    fn pretty_print(&self, cx: &Compilation) -> String {
        let mut output = self.synthetic.id.pretty_print(cx);
        writeln!(output).unwrap();
        writeln!(output, "; slots").unwrap();
        output.push_str(&self.labels.pretty_print(cx));
        writeln!(output, "; construction: {}", expr(cx, &self.construction)).unwrap();
        output
    }
}

fn visibility(visibility: Visibility) -> &'static str {
    match visibility {
        Visibility::Public => "",
        Visibility::Internal => "internal ",
        Visibility::Private => "private ",
    }
}

fn write_block(output: &mut String, cx: &Compilation, block: &Block, indent: usize) {
    for stmt in &block.stmts {
        write_stmt(output, cx, stmt, indent);
    }
}

fn write_stmt(output: &mut String, cx: &Compilation, stmt: &Stmt, indent: usize) {
    let prefix = "  ".repeat(indent);
    match &stmt.kind {
        StmtKind::Expr(e) => writeln!(output, "{}{};", prefix, expr(cx, e)).unwrap(),
        StmtKind::Declare { local, ty, init } => {
            write!(output, "{}let {}", prefix, cx.local(*local).name).unwrap();
            if let Some(ty) = ty {
                write!(output, ": {}", cx.display_ty(&ty.ty)).unwrap();
            }
            if let Some(init) = init {
                write!(output, " = {}", expr(cx, init)).unwrap();
            }
            writeln!(output, ";").unwrap();
        }
        StmtKind::Return(value) => match value {
            Some(v) => writeln!(output, "{}return {};", prefix, expr(cx, v)).unwrap(),
            None => writeln!(output, "{}return;", prefix).unwrap(),
        },
        StmtKind::Yield(value) => match value {
            Some(v) => writeln!(output, "{}yield {};", prefix, expr(cx, v)).unwrap(),
            None => writeln!(output, "{}yield;", prefix).unwrap(),
        },
        StmtKind::Suspend { value, state } => match value {
            Some(v) => writeln!(output, "{}suspend {} -> {};", prefix, expr(cx, v), state).unwrap(),
            None => writeln!(output, "{}suspend -> {};", prefix, state).unwrap(),
        },
        StmtKind::If {
            cond,
            then_block,
            else_block,
        } => {
            writeln!(output, "{}if {} {{", prefix, expr(cx, cond)).unwrap();
            write_block(output, cx, then_block, indent + 1);
            if let Some(else_block) = else_block {
                writeln!(output, "{}}} else {{", prefix).unwrap();
                write_block(output, cx, else_block, indent + 1);
            }
            writeln!(output, "{}}}", prefix).unwrap();
        }
        StmtKind::While { cond, body } => {
            writeln!(output, "{}while {} {{", prefix, expr(cx, cond)).unwrap();
            write_block(output, cx, body, indent + 1);
            writeln!(output, "{}}}", prefix).unwrap();
        }
        StmtKind::Block(block) => {
            writeln!(output, "{}{{", prefix).unwrap();
            write_block(output, cx, block, indent + 1);
            writeln!(output, "{}}}", prefix).unwrap();
        }
        StmtKind::Try(t) => {
            writeln!(output, "{}try {{", prefix).unwrap();
            write_block(output, cx, &t.protected, indent + 1);
            for handler in &t.handlers {
                match handler.local {
                    Some(local) => writeln!(output, "{}}} catch {} {{", prefix, cx.local(local).name).unwrap(),
                    None => writeln!(output, "{}}} catch {{", prefix).unwrap(),
                }
                write_block(output, cx, &handler.body, indent + 1);
            }
            if let Some(ensure) = &t.ensure {
                writeln!(output, "{}}} ensure {{", prefix).unwrap();
                write_block(output, cx, ensure, indent + 1);
            }
            writeln!(output, "{}}}", prefix).unwrap();
        }
        StmtKind::Throw(value) => match value {
            Some(v) => writeln!(output, "{}throw {};", prefix, expr(cx, v)).unwrap(),
            None => writeln!(output, "{}throw;", prefix).unwrap(),
        },
        StmtKind::Break => writeln!(output, "{}break;", prefix).unwrap(),
        StmtKind::Continue => writeln!(output, "{}continue;", prefix).unwrap(),
    }
}

fn expr(cx: &Compilation, e: &Expr) -> String {
    match &e.kind {
        ExprKind::Literal(lit) => match lit {
            Literal::Int(n) => n.to_string(),
            Literal::Bool(b) => b.to_string(),
            Literal::Str(s) => format!("{:?}", s),
            Literal::Null => "null".to_string(),
        },
        ExprKind::Local(local) => cx.local(*local).name.clone(),
        ExprKind::Param(param) => cx.param(*param).name.clone(),
        ExprKind::Field { target, field } => format!("{}.{}", expr(cx, target), cx.field(*field).name),
        ExprKind::SelfRef(_) => "self".to_string(),
        ExprKind::Super { .. } => "super".to_string(),
        ExprKind::Member { target, method } => {
            let name = &cx.method(method.method_id()).name;
            match method {
                MethodRef::Def(_) => format!("{}.{}", expr(cx, target), name),
                MethodRef::Mapped { declaring, .. } => {
                    format!("{}.({}::{})", expr(cx, target), cx.display_ty(declaring), name)
                }
            }
        }
        ExprKind::Call { callee, args } => format!("{}({})", expr(cx, callee), exprs(cx, args)),
        ExprKind::New { ty, args } => format!("new {}({})", cx.display_ty(&ty.ty), exprs(cx, args)),
        ExprKind::BaseConstructorCall { base } => format!("{}::constructor()", cx.display_ty(base)),
        ExprKind::Assign { target, value } => format!("{} = {}", expr(cx, target), expr(cx, value)),
        ExprKind::Binary { op, left, right } => {
            format!("({} {} {})", expr(cx, left), op.symbol(), expr(cx, right))
        }
        ExprKind::Not(operand) => format!("!{}", expr(cx, operand)),
        ExprKind::Cast { expr: inner, ty } => format!("({} as {})", expr(cx, inner), cx.display_ty(&ty.ty)),
    }
}

fn exprs(cx: &Compilation, args: &[Expr]) -> String {
    args.iter().map(|a| expr(cx, a)).collect::<Vec<_>>().join(", ")
}
