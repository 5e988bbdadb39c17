//! AST Dumper module
//!
//! Renders the program tree as indented pseudo-source. Used for debugging
//! and as the textual form snapshot tests compare against.

use std::fmt::Write;

use crate::ast::{Callee, Literal, NodeKind, NodeRef};
use crate::semantic::types::TypeKind;
use crate::semantic::{CompilationContext, ConsClass, SymbolKind, SymbolRef, TypeRef};

const INDENT: &str = "  ";

/// Dumper for AST
pub struct AstDumper<'a> {
    ctx: &'a CompilationContext,
    out: String,
}

impl<'a> AstDumper<'a> {
    fn new(ctx: &'a CompilationContext) -> Self {
        AstDumper { ctx, out: String::new() }
    }

    /// Dump a module's top-level statements.
    pub fn dump_module(ctx: &CompilationContext, module: SymbolRef) -> String {
        let mut dumper = AstDumper::new(ctx);
        let _ = writeln!(dumper.out, "module {}", ctx.name(module));
        if let Some(data) = ctx.symbols.module(module) {
            for &stmt in ctx.ast.block_stmts(data.stmts) {
                dumper.dump_stmt(stmt, 1);
            }
        }
        dumper.out
    }

    /// Dump a single statement, definitions included.
    pub fn dump_stmt_to_string(ctx: &CompilationContext, stmt: NodeRef) -> String {
        let mut dumper = AstDumper::new(ctx);
        dumper.dump_stmt(stmt, 0);
        dumper.out
    }

    /// Format an expression on one line.
    pub fn format_expr(ctx: &CompilationContext, expr: NodeRef) -> String {
        AstDumper::new(ctx).expr(expr)
    }

    fn line(&mut self, depth: usize, text: &str) {
        let _ = writeln!(self.out, "{}{}", INDENT.repeat(depth), text);
    }

    fn dump_block_body(&mut self, header: String, stmts: &[NodeRef], depth: usize) {
        if stmts.is_empty() {
            self.line(depth, &format!("{} {{}}", header));
            return;
        }
        self.line(depth, &format!("{} {{", header));
        for &stmt in stmts {
            self.dump_stmt(stmt, depth + 1);
        }
        self.line(depth, "}");
    }

    fn dump_stmt(&mut self, stmt: NodeRef, depth: usize) {
        let ctx = self.ctx;
        match ctx.ast.get_kind(stmt) {
            NodeKind::Def(data) => self.dump_def(stmt, data.sym, depth),
            NodeKind::ExprStmt(expr) => {
                let text = format!("{};", self.expr(*expr));
                self.line(depth, &text);
            }
            NodeKind::Return(Some(value)) => {
                let text = format!("return {};", self.expr(*value));
                self.line(depth, &text);
            }
            NodeKind::Return(None) => self.line(depth, "return;"),
            NodeKind::Block(data) => {
                let stmts = data.stmts.to_vec();
                self.dump_block_body(String::new(), &stmts, depth);
            }
            _ => {
                let text = format!("{};", self.expr(stmt));
                self.line(depth, &text);
            }
        }
    }

    fn dump_def(&mut self, def: NodeRef, sym: SymbolRef, depth: usize) {
        let ctx = self.ctx;
        let entry = ctx.symbols.get(sym);
        match &entry.kind {
            SymbolKind::Function(func) => {
                let header = self.function_header(def, sym);
                let stmts = ctx.ast.block_stmts(func.body).to_vec();
                self.dump_block_body(header, &stmts, depth);
            }
            SymbolKind::Variable(var) => {
                let keyword = match var.cons_class {
                    ConsClass::Var => "var",
                    ConsClass::Const => "const",
                    ConsClass::Param => "param",
                };
                let text = format!("{} {};", keyword, self.typed_name(def));
                self.line(depth, &text);
            }
            SymbolKind::Type(type_data) => {
                let ty = ctx.types.get(type_data.definition);
                match &ty.kind {
                    TypeKind::Structured(st) => {
                        let header = format!("{} {}", st.class_tag.keyword(), entry.name);
                        let stmts = ctx.ast.block_stmts(st.decls).to_vec();
                        self.dump_block_body(header, &stmts, depth);
                    }
                    TypeKind::Enum { decls, .. } => {
                        let header = format!("enum {}", entry.name);
                        let stmts = ctx.ast.block_stmts(*decls).to_vec();
                        self.dump_block_body(header, &stmts, depth);
                    }
                    TypeKind::Variable { bound } => {
                        let text = format!("type {}: {};", entry.name, ctx.type_name(*bound));
                        self.line(depth, &text);
                    }
                    TypeKind::User { underlying } => {
                        let text = format!("type {} = {};", entry.name, ctx.type_name(*underlying));
                        self.line(depth, &text);
                    }
                    _ => self.line(depth, &format!("type {};", entry.name)),
                }
            }
            SymbolKind::EnumConstant { value, .. } => self.line(depth, &format!("{} = {};", entry.name, value)),
            SymbolKind::Module(module) => {
                let header = format!("module {}", entry.name);
                let stmts = ctx.ast.block_stmts(module.stmts).to_vec();
                self.dump_block_body(header, &stmts, depth);
            }
            _ => {
                let text = format!("def {};", self.typed_name(def));
                self.line(depth, &text);
            }
        }
    }

    /// `fn [Type.]name(formals): ret [pragmas]`
    fn function_header(&mut self, def: NodeRef, sym: SymbolRef) -> String {
        let ctx = self.ctx;
        let entry = ctx.symbols.get(sym);
        let Some(func) = entry.as_function() else {
            return format!("fn {}", entry.name);
        };
        let mut header = String::from("fn ");
        if let Some(binding) = func.type_binding {
            let _ = write!(header, "{}.", ctx.name(binding));
        }
        let formals: Vec<String> = func.formals.iter().map(|&formal| self.formal(formal)).collect();
        let _ = write!(header, "{}({}): {}", entry.name, formals.join(", "), self.declared_type(def, func.ret_type));
        if !entry.pragmas.is_empty() {
            let pragmas: Vec<&str> = entry.pragmas.iter().map(|p| p.as_str()).collect();
            let _ = write!(header, " [{}]", pragmas.join(", "));
        }
        header
    }

    /// `[intent ]name: type[ = default]`
    fn formal(&mut self, formal: NodeRef) -> String {
        let ctx = self.ctx;
        let Some(data) = ctx.ast.def_data(formal) else {
            return self.expr(formal);
        };
        let intent = ctx
            .symbols
            .get(data.sym)
            .as_param()
            .and_then(|param| param.intent.keyword());
        let typed = self.typed_name(formal);
        match intent {
            Some(intent) => format!("{} {}", intent, typed),
            None => typed,
        }
    }

    /// `name: type[ = init]` for a definition.
    fn typed_name(&mut self, def: NodeRef) -> String {
        let ctx = self.ctx;
        let Some(data) = ctx.ast.def_data(def) else {
            return self.expr(def);
        };
        let entry = ctx.symbols.get(data.sym);
        let mut text = format!("{}: {}", entry.name, self.declared_type(def, entry.ty));
        if let Some(init) = data.init {
            let _ = write!(text, " = {}", self.expr(init));
        }
        text
    }

    /// The written type expression of a definition, or its resolved type.
    fn declared_type(&mut self, def: NodeRef, ty: TypeRef) -> String {
        let ctx = self.ctx;
        match ctx.ast.def_data(def).and_then(|data| data.type_expr) {
            Some(type_expr) => self.expr(type_expr),
            None => ctx.type_name(ty).to_string(),
        }
    }

    fn expr(&mut self, node: NodeRef) -> String {
        let ctx = self.ctx;
        match ctx.ast.get_kind(node) {
            NodeKind::SymRef(sym) => ctx.name(*sym).to_string(),
            NodeKind::Literal(Literal::Bool(value)) => value.to_string(),
            NodeKind::Literal(Literal::Int(value)) => value.to_string(),
            NodeKind::Literal(Literal::String(value)) => format!("{:?}", value.as_str()),
            NodeKind::Call(call) => match call.callee {
                Callee::Prim(op) => {
                    let args: Vec<String> = call.args.iter().map(|&arg| self.operand(arg)).collect();
                    match args.as_slice() {
                        [lhs, rhs] => format!("{} {} {}", lhs, op.as_str(), rhs),
                        _ => format!("{}({})", op.as_str(), args.join(", ")),
                    }
                }
                Callee::Expr(callee) => {
                    let args: Vec<String> = call.args.iter().map(|&arg| self.expr(arg)).collect();
                    format!("{}({})", self.expr(callee), args.join(", "))
                }
            },
            NodeKind::MemberAccess(base, field) => format!("{}.{}", self.expr(*base), ctx.name(*field)),
            NodeKind::Cast(ty, expr) => format!("cast<{}>({})", ctx.type_name(*ty), self.expr(*expr)),
            NodeKind::Def(data) => format!("<def {}>", ctx.name(data.sym)),
            NodeKind::Block(_) => "<block>".to_string(),
            NodeKind::ExprStmt(expr) => self.expr(*expr),
            NodeKind::Return(_) => "<return>".to_string(),
        }
    }

    /// Operand of a primitive operator; nested operators get parentheses.
    fn operand(&mut self, node: NodeRef) -> String {
        let ctx = self.ctx;
        let text = self.expr(node);
        match ctx.ast.get_kind(node) {
            NodeKind::Call(call) if matches!(call.callee, Callee::Prim(_)) => format!("({})", text),
            _ => text,
        }
    }
}
