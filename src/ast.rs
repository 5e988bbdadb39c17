//! Abstract Syntax Tree (AST) storage.
//!
//! The AST is a flattened arena: nodes live in contiguous vectors and refer
//! to each other through [`NodeRef`] handles. Each node records its source
//! location and its parent, which is what the structural mutation primitives
//! (`insert_before`, `insert_after`, `insert_at_head`, `insert_at_tail`,
//! `remove`) maintain.
//!
//! A node is owned by exactly one parent. Splicing a node that is still
//! attached somewhere else is a compiler bug and panics.

use std::num::NonZeroU32;

use thin_vec::ThinVec;

/// Represents an interned string using symbol_table crate.
pub type NameId = symbol_table::GlobalSymbol;

pub use crate::source_manager::{SourceId, SourceLoc};

pub mod dumper;
pub mod nodes;

pub use nodes::*;

/// The flattened AST storage.
#[derive(Clone, Debug, Default)]
pub struct Ast {
    pub kinds: Vec<NodeKind>,
    pub locs: Vec<SourceLoc>,
    parents: Vec<Option<NodeRef>>,
}

/// Node reference type for referencing child nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef(NonZeroU32);

impl NodeRef {
    pub fn new(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(Self)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }

    pub fn index(self) -> usize {
        (self.get() - 1) as usize
    }
}

impl Ast {
    /// Create a new empty AST
    pub fn new() -> Self {
        Ast::default()
    }

    /// Add a node to the AST and return its reference
    pub(crate) fn push_node(&mut self, kind: NodeKind, loc: SourceLoc) -> NodeRef {
        self.kinds.push(kind);
        self.locs.push(loc);
        self.parents.push(None);
        NodeRef::new(self.kinds.len() as u32).expect("NodeRef overflow")
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Get node kind by reference
    pub fn get_kind(&self, node_ref: NodeRef) -> &NodeKind {
        &self.kinds[node_ref.index()]
    }

    pub fn get_kind_mut(&mut self, node_ref: NodeRef) -> &mut NodeKind {
        &mut self.kinds[node_ref.index()]
    }

    pub fn loc(&self, node_ref: NodeRef) -> SourceLoc {
        self.locs[node_ref.index()]
    }

    pub fn set_loc(&mut self, node_ref: NodeRef, loc: SourceLoc) {
        self.locs[node_ref.index()] = loc;
    }

    pub fn parent(&self, node_ref: NodeRef) -> Option<NodeRef> {
        self.parents[node_ref.index()]
    }

    /// Record `parent` as the owner of a detached node.
    pub(crate) fn adopt(&mut self, parent: NodeRef, child: NodeRef) {
        if let Some(existing) = self.parent(child) {
            panic!(
                "ICE: node {} already belongs to node {}, cannot attach it to {}",
                child.get(),
                existing.get(),
                parent.get()
            );
        }
        self.parents[child.index()] = Some(parent);
    }

    pub fn def_data(&self, node_ref: NodeRef) -> Option<&DefData> {
        match self.get_kind(node_ref) {
            NodeKind::Def(data) => Some(data),
            _ => None,
        }
    }

    pub fn def_data_mut(&mut self, node_ref: NodeRef) -> Option<&mut DefData> {
        match self.get_kind_mut(node_ref) {
            NodeKind::Def(data) => Some(data),
            _ => None,
        }
    }

    /// Attach a detached expression as a definition's initializer.
    pub fn set_init(&mut self, def: NodeRef, init: NodeRef) {
        self.adopt(def, init);
        match self.def_data_mut(def) {
            Some(data) if data.init.is_none() => data.init = Some(init),
            _ => panic!("ICE: node {} cannot take initializer {}", def.get(), init.get()),
        }
    }

    /// Attach a detached expression as a definition's declared type.
    pub fn set_type_expr(&mut self, def: NodeRef, type_expr: NodeRef) {
        self.adopt(def, type_expr);
        match self.def_data_mut(def) {
            Some(data) if data.type_expr.is_none() => data.type_expr = Some(type_expr),
            _ => panic!("ICE: node {} cannot take type expression {}", def.get(), type_expr.get()),
        }
    }

    /// Statements of a block node.
    pub fn block_stmts(&self, block: NodeRef) -> &[NodeRef] {
        match self.get_kind(block) {
            NodeKind::Block(data) => &data.stmts,
            other => panic!("ICE: node {} is not a block: {:?}", block.get(), other),
        }
    }

    pub fn block_owner(&self, block: NodeRef) -> Option<crate::semantic::SymbolRef> {
        match self.get_kind(block) {
            NodeKind::Block(data) => data.owner,
            _ => None,
        }
    }

    fn block_stmts_mut(&mut self, block: NodeRef) -> &mut ThinVec<NodeRef> {
        match self.get_kind_mut(block) {
            NodeKind::Block(data) => &mut data.stmts,
            other => panic!("ICE: node {} is not a block: {:?}", block.get(), other),
        }
    }

    /// Children held directly by the node, in evaluation order.
    ///
    /// Children reached through a symbol's payload (function formals and
    /// bodies, module statements, type bodies) are not included; see
    /// `CompilationContext::children`.
    pub fn node_children(&self, node_ref: NodeRef) -> Vec<NodeRef> {
        match self.get_kind(node_ref) {
            NodeKind::Def(data) => data.type_expr.into_iter().chain(data.init).collect(),
            NodeKind::SymRef(_) | NodeKind::Literal(_) => Vec::new(),
            NodeKind::Call(data) => {
                let callee = match data.callee {
                    Callee::Expr(callee) => Some(callee),
                    Callee::Prim(_) => None,
                };
                callee.into_iter().chain(data.args.iter().copied()).collect()
            }
            NodeKind::MemberAccess(base, _) => vec![*base],
            NodeKind::Cast(_, expr) => vec![*expr],
            NodeKind::Block(data) => data.stmts.to_vec(),
            NodeKind::ExprStmt(expr) => vec![*expr],
            NodeKind::Return(value) => value.iter().copied().collect(),
        }
    }

    /// Sequence containing `node` and its position in it.
    fn position_in_block(&self, node: NodeRef) -> (NodeRef, usize) {
        let Some(parent) = self.parent(node) else {
            panic!("ICE: node {} is not part of any statement sequence", node.get());
        };
        let position = self
            .block_stmts(parent)
            .iter()
            .position(|&stmt| stmt == node)
            .unwrap_or_else(|| panic!("ICE: node {} missing from its parent block {}", node.get(), parent.get()));
        (parent, position)
    }

    /// Insert a detached statement immediately before `anchor`.
    pub fn insert_before(&mut self, anchor: NodeRef, node: NodeRef) {
        let (block, position) = self.position_in_block(anchor);
        self.adopt(block, node);
        self.block_stmts_mut(block).insert(position, node);
    }

    /// Insert a detached statement immediately after `anchor`.
    pub fn insert_after(&mut self, anchor: NodeRef, node: NodeRef) {
        let (block, position) = self.position_in_block(anchor);
        self.adopt(block, node);
        self.block_stmts_mut(block).insert(position + 1, node);
    }

    pub fn insert_at_head(&mut self, block: NodeRef, node: NodeRef) {
        self.adopt(block, node);
        self.block_stmts_mut(block).insert(0, node);
    }

    pub fn insert_at_tail(&mut self, block: NodeRef, node: NodeRef) {
        self.adopt(block, node);
        self.block_stmts_mut(block).push(node);
    }

    /// Detach a node from its parent. The node stays in the arena and can be
    /// spliced somewhere else.
    pub fn remove(&mut self, node: NodeRef) {
        let Some(parent) = self.parent(node) else {
            return;
        };
        match self.get_kind_mut(parent) {
            NodeKind::Block(data) => data.stmts.retain(|&stmt| stmt != node),
            NodeKind::Def(data) => {
                if data.init == Some(node) {
                    data.init = None;
                } else if data.type_expr == Some(node) {
                    data.type_expr = None;
                } else {
                    panic!("ICE: node {} is not removable from definition {}", node.get(), parent.get());
                }
            }
            NodeKind::Call(data) if data.args.contains(&node) => data.args.retain(|&arg| arg != node),
            NodeKind::Return(value) if *value == Some(node) => *value = None,
            other => panic!("ICE: cannot remove node {} from {:?}", node.get(), other),
        }
        self.parents[node.index()] = None;
    }
}
