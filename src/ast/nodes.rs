//! AST Node definitions and constructors.
//!
//! A single polymorphic tree covers both the parsed program and the
//! declarations the synthesis stage fabricates. Children are `NodeRef`s into
//! the flattened [`Ast`] storage.

use thin_vec::ThinVec;

use crate::ast::{Ast, NameId, NodeRef};
use crate::semantic::{SymbolRef, TypeRef};
use crate::source_manager::SourceLoc;

#[derive(Debug, Clone)]
pub enum NodeKind {
    // --- Declarations ---
    /// Definition point of a symbol. Function formals and bodies, module
    /// statements and type bodies hang off the symbol's payload.
    Def(DefData),

    // --- Expressions ---
    SymRef(SymbolRef),
    Literal(Literal),
    Call(CallData),
    MemberAccess(NodeRef /* base */, SymbolRef /* field */),
    Cast(TypeRef, NodeRef),

    // --- Statements ---
    Block(BlockData),
    ExprStmt(NodeRef),
    Return(Option<NodeRef>),
}

#[derive(Debug, Clone)]
pub struct DefData {
    pub sym: SymbolRef,
    pub init: Option<NodeRef>,
    /// Declared type as written, before resolution.
    pub type_expr: Option<NodeRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    String(NameId),
}

/// Operators built into the language rather than resolved by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimOp {
    Assign,
    Equal,
    NotEqual,
    LogAnd,
    LogOr,
}

impl PrimOp {
    pub fn as_str(self) -> &'static str {
        match self {
            PrimOp::Assign => "=",
            PrimOp::Equal => "==",
            PrimOp::NotEqual => "!=",
            PrimOp::LogAnd => "&&",
            PrimOp::LogOr => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Callee {
    Prim(PrimOp),
    Expr(NodeRef),
}

#[derive(Debug, Clone)]
pub struct CallData {
    pub callee: Callee,
    pub args: ThinVec<NodeRef>,
}

#[derive(Debug, Clone)]
pub struct BlockData {
    pub stmts: ThinVec<NodeRef>,
    /// Module, function or type whose scope this block is.
    pub owner: Option<SymbolRef>,
}

impl Ast {
    pub fn def(&mut self, sym: SymbolRef, init: Option<NodeRef>, type_expr: Option<NodeRef>, loc: SourceLoc) -> NodeRef {
        let node = self.push_node(NodeKind::Def(DefData { sym, init, type_expr }), loc);
        for child in init.into_iter().chain(type_expr) {
            self.adopt(node, child);
        }
        node
    }

    pub fn sym_ref(&mut self, sym: SymbolRef, loc: SourceLoc) -> NodeRef {
        self.push_node(NodeKind::SymRef(sym), loc)
    }

    pub fn literal(&mut self, literal: Literal, loc: SourceLoc) -> NodeRef {
        self.push_node(NodeKind::Literal(literal), loc)
    }

    pub fn bool_literal(&mut self, value: bool, loc: SourceLoc) -> NodeRef {
        self.literal(Literal::Bool(value), loc)
    }

    pub fn int_literal(&mut self, value: i64, loc: SourceLoc) -> NodeRef {
        self.literal(Literal::Int(value), loc)
    }

    pub fn string_literal(&mut self, value: &str, loc: SourceLoc) -> NodeRef {
        self.literal(Literal::String(NameId::new(value)), loc)
    }

    pub fn call(&mut self, callee: NodeRef, args: impl IntoIterator<Item = NodeRef>, loc: SourceLoc) -> NodeRef {
        let args: ThinVec<NodeRef> = args.into_iter().collect();
        let node = self.push_node(
            NodeKind::Call(CallData {
                callee: Callee::Expr(callee),
                args: args.clone(),
            }),
            loc,
        );
        self.adopt(node, callee);
        for arg in args {
            self.adopt(node, arg);
        }
        node
    }

    pub fn prim_call(&mut self, op: PrimOp, args: impl IntoIterator<Item = NodeRef>, loc: SourceLoc) -> NodeRef {
        let args: ThinVec<NodeRef> = args.into_iter().collect();
        let node = self.push_node(
            NodeKind::Call(CallData {
                callee: Callee::Prim(op),
                args: args.clone(),
            }),
            loc,
        );
        for arg in args {
            self.adopt(node, arg);
        }
        node
    }

    pub fn member(&mut self, base: NodeRef, field: SymbolRef, loc: SourceLoc) -> NodeRef {
        let node = self.push_node(NodeKind::MemberAccess(base, field), loc);
        self.adopt(node, base);
        node
    }

    pub fn cast(&mut self, ty: TypeRef, expr: NodeRef, loc: SourceLoc) -> NodeRef {
        let node = self.push_node(NodeKind::Cast(ty, expr), loc);
        self.adopt(node, expr);
        node
    }

    pub fn block(&mut self, stmts: impl IntoIterator<Item = NodeRef>, owner: Option<SymbolRef>, loc: SourceLoc) -> NodeRef {
        let stmts: ThinVec<NodeRef> = stmts.into_iter().collect();
        let node = self.push_node(
            NodeKind::Block(BlockData {
                stmts: stmts.clone(),
                owner,
            }),
            loc,
        );
        for stmt in stmts {
            self.adopt(node, stmt);
        }
        node
    }

    pub fn expr_stmt(&mut self, expr: NodeRef, loc: SourceLoc) -> NodeRef {
        let node = self.push_node(NodeKind::ExprStmt(expr), loc);
        self.adopt(node, expr);
        node
    }

    pub fn return_stmt(&mut self, value: Option<NodeRef>, loc: SourceLoc) -> NodeRef {
        let node = self.push_node(NodeKind::Return(value), loc);
        if let Some(value) = value {
            self.adopt(node, value);
        }
        node
    }
}
