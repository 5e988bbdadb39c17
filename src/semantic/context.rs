//! Compilation context.
//!
//! One `CompilationContext` exists per compilation run. It owns every arena
//! (nodes, symbols, types, sources) together with the run-scoped state the
//! synthesis stage needs: registered modules, the prelude and common module
//! handles, the resolved entry point and all memo tables. Nothing here is
//! process-wide; a fresh run starts from a fresh context.

use hashbrown::{HashMap, HashSet};

use crate::ast::{Ast, Callee, NameId, NodeKind, NodeRef};
use crate::lang_options::SynthesisOptions;
use crate::source_manager::{SourceLoc, SourceManager};

use super::entry_point::EntryPoint;
use super::error::SynthesisError;
use super::symbol_table::{
    ConsClass, ModType, SymbolEntry, SymbolKind, SymbolRef, SymbolTable, TypeData, VariableData,
};
use super::type_registry::TypeRegistry;
use super::types::{TypeKind, TypeRef};

/// Identity-preserving substitution map filled by [`CompilationContext::copy`].
///
/// Every node and every symbol defined inside the copied subtree maps to its
/// clone; references inside the clone are remapped through it.
#[derive(Debug, Default)]
pub struct CopyMap {
    pub nodes: HashMap<NodeRef, NodeRef>,
    pub symbols: HashMap<SymbolRef, SymbolRef>,
}

impl CopyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn symbol(&self, sym: SymbolRef) -> SymbolRef {
        self.symbols.get(&sym).copied().unwrap_or(sym)
    }
}

/// Per-run memo tables guarding against duplicate synthesis.
#[derive(Debug, Default)]
pub(crate) struct SynthesisMemo {
    pub(crate) equality: HashSet<TypeRef>,
    pub(crate) assignment: HashSet<TypeRef>,
    pub(crate) write: HashSet<TypeRef>,
    pub(crate) read: HashSet<TypeRef>,
    pub(crate) instantiations: HashMap<(SymbolRef, Vec<(TypeRef, TypeRef)>), SymbolRef>,
}

pub struct CompilationContext {
    pub ast: Ast,
    pub symbols: SymbolTable,
    pub types: TypeRegistry,
    pub sources: SourceManager,
    pub options: SynthesisOptions,

    /// Every registered module, in registration order.
    pub modules: Vec<SymbolRef>,
    pub prelude: Option<SymbolRef>,
    pub common: Option<SymbolRef>,
    /// Program entry point, set once by entry-point wiring.
    pub entry_point: Option<EntryPoint>,
    /// Sentinel used as the default of formals without one.
    pub nil: SymbolRef,

    pub(crate) memo: SynthesisMemo,
}

impl Default for CompilationContext {
    fn default() -> Self {
        Self::new(SynthesisOptions::default())
    }
}

impl CompilationContext {
    pub fn new(options: SynthesisOptions) -> Self {
        let mut types = TypeRegistry::new();
        let mut symbols = SymbolTable::new();

        // builtin types get symbols so formals and defaults can name them
        for ty in types.builtins() {
            let name = types.name_of(ty);
            let sym = symbols.add(SymbolEntry::new(
                name,
                ty,
                SourceLoc::builtin(),
                SymbolKind::Type(TypeData { definition: ty }),
            ));
            types.get_mut(ty).symbol = Some(sym);
        }

        let nil = symbols.add(SymbolEntry::new(
            NameId::new("nil"),
            types.type_nil,
            SourceLoc::builtin(),
            SymbolKind::Variable(VariableData::new(ConsClass::Const)),
        ));

        CompilationContext {
            ast: Ast::new(),
            symbols,
            types,
            sources: SourceManager::new(),
            options,
            modules: Vec::new(),
            prelude: None,
            common: None,
            entry_point: None,
            nil,
            memo: SynthesisMemo::default(),
        }
    }

    pub fn name(&self, sym: SymbolRef) -> &'static str {
        self.symbols.name(sym).as_str()
    }

    /// Name of a symbol's resolved type.
    pub fn type_name(&self, ty: TypeRef) -> &'static str {
        self.types.name_of(ty).as_str()
    }

    /// Symbol declaring a type; builtin and user types always have one.
    pub fn type_symbol(&self, ty: TypeRef) -> Option<SymbolRef> {
        self.types.get(ty).symbol
    }

    /// Children of a node, including the ones a defined symbol owns.
    pub fn children(&self, node: NodeRef) -> Vec<NodeRef> {
        let mut children = self.ast.node_children(node);
        if let NodeKind::Def(data) = self.ast.get_kind(node) {
            match &self.symbols.get(data.sym).kind {
                SymbolKind::Function(func) => {
                    children.extend(func.formals.iter().copied());
                    children.extend(func.where_expr);
                    children.push(func.body);
                }
                SymbolKind::Module(module) => children.push(module.stmts),
                SymbolKind::Type(type_data) => children.extend(self.types.get(type_data.definition).decls()),
                _ => {}
            }
        }
        children
    }

    /// Preorder snapshot of the subtree rooted at `root`.
    pub fn collect_subtree(&self, root: NodeRef) -> Vec<NodeRef> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            out.push(node);
            let children = self.children(node);
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Snapshot of every node reachable from a registered module, modules in
    /// registration order, each in preorder.
    pub fn collect_asts(&self) -> Vec<NodeRef> {
        let mut out = Vec::new();
        for &module in &self.modules {
            if let Some(def) = self.symbols.get(module).def_point {
                out.extend(self.collect_subtree(def));
            }
        }
        out
    }

    fn collect_defined(&self, pred: impl Fn(&SymbolEntry) -> bool) -> Vec<SymbolRef> {
        self.collect_asts()
            .into_iter()
            .filter_map(|node| self.ast.def_data(node).map(|data| data.sym))
            .filter(|&sym| pred(self.symbols.get(sym)))
            .collect()
    }

    /// Snapshot of every function defined in the program tree.
    pub fn collect_functions(&self) -> Vec<SymbolRef> {
        self.collect_defined(SymbolEntry::is_function)
    }

    /// Snapshot of every type symbol defined in the program tree.
    pub fn collect_type_symbols(&self) -> Vec<SymbolRef> {
        self.collect_defined(|entry| matches!(entry.kind, SymbolKind::Type(_)))
    }

    /// Innermost scope-owning symbol (module, function or type) around a node.
    pub fn enclosing_owner(&self, node: NodeRef) -> Option<SymbolRef> {
        let mut current = self.ast.parent(node);
        while let Some(parent) = current {
            if let Some(owner) = self.ast.block_owner(parent) {
                return Some(owner);
            }
            current = self.ast.parent(parent);
        }
        None
    }

    /// Module a definition lives in, if its innermost scope is a module.
    pub fn enclosing_module(&self, node: NodeRef) -> Option<SymbolRef> {
        self.enclosing_owner(node)
            .filter(|&owner| self.symbols.module(owner).is_some())
    }

    /// Modules of the given classification, in registration order.
    pub fn modules_of_type(&self, mod_type: ModType) -> Vec<SymbolRef> {
        self.modules
            .iter()
            .copied()
            .filter(|&module| self.symbols.module(module).is_some_and(|data| data.mod_type == mod_type))
            .collect()
    }

    /// Statement a type is declared by, used as the splice anchor for the
    /// declarations synthesized for it.
    pub(crate) fn declaring_stmt(&self, type_sym: SymbolRef) -> Result<NodeRef, SynthesisError> {
        let entry = self.symbols.get(type_sym);
        match entry.def_point {
            Some(def) if self.ast.parent(def).is_some() => Ok(def),
            _ => Err(SynthesisError::MissingDefinition {
                name: entry.name.to_string(),
                location: entry.loc,
            }),
        }
    }

    /// Stamp every node of a synthesized subtree, and every symbol it
    /// defines, with the location of the entity that caused its synthesis.
    pub fn reset_loc(&mut self, root: NodeRef, loc: SourceLoc) {
        for node in self.collect_subtree(root) {
            self.ast.set_loc(node, loc);
            if let Some(data) = self.ast.def_data(node) {
                let sym = data.sym;
                self.symbols.get_mut(sym).loc = loc;
            }
        }
    }

    /// Deep-copy a subtree.
    ///
    /// Symbols defined inside the subtree are cloned (formals, locals, nested
    /// functions) and every reference to them inside the clone is redirected
    /// to the clone. References to symbols defined outside stay untouched.
    /// The returned node is detached.
    pub fn copy(&mut self, root: NodeRef, map: &mut CopyMap) -> NodeRef {
        let mut created = Vec::new();
        let new_root = self.copy_node(root, map, &mut created);
        for node in created {
            self.remap_node(node, map);
        }
        let cloned: Vec<SymbolRef> = map.symbols.values().copied().collect();
        for sym in cloned {
            self.remap_symbol(sym, map);
        }
        new_root
    }

    fn copy_node(&mut self, node: NodeRef, map: &mut CopyMap, created: &mut Vec<NodeRef>) -> NodeRef {
        let loc = self.ast.loc(node);
        let new_node = match self.ast.get_kind(node).clone() {
            NodeKind::Def(data) => {
                let type_expr = data.type_expr.map(|n| self.copy_node(n, map, created));
                let init = data.init.map(|n| self.copy_node(n, map, created));
                let mut entry = self.symbols.get(data.sym).clone();
                entry.def_point = None;
                let new_sym = self.symbols.add(entry);
                map.symbols.insert(data.sym, new_sym);
                let new_def = self.ast.def(new_sym, init, type_expr, loc);
                self.symbols.get_mut(new_sym).def_point = Some(new_def);
                self.copy_symbol_payload(new_sym, new_def, map, created);
                new_def
            }
            NodeKind::SymRef(sym) => self.ast.sym_ref(sym, loc),
            NodeKind::Literal(literal) => self.ast.literal(literal, loc),
            NodeKind::Call(data) => {
                let args: Vec<NodeRef> = data.args.iter().map(|&a| self.copy_node(a, map, created)).collect();
                match data.callee {
                    Callee::Prim(op) => self.ast.prim_call(op, args, loc),
                    Callee::Expr(callee) => {
                        let callee = self.copy_node(callee, map, created);
                        self.ast.call(callee, args, loc)
                    }
                }
            }
            NodeKind::MemberAccess(base, field) => {
                let base = self.copy_node(base, map, created);
                self.ast.member(base, field, loc)
            }
            NodeKind::Cast(ty, expr) => {
                let expr = self.copy_node(expr, map, created);
                self.ast.cast(ty, expr, loc)
            }
            NodeKind::Block(data) => {
                let stmts: Vec<NodeRef> = data.stmts.iter().map(|&s| self.copy_node(s, map, created)).collect();
                self.ast.block(stmts, data.owner, loc)
            }
            NodeKind::ExprStmt(expr) => {
                let expr = self.copy_node(expr, map, created);
                self.ast.expr_stmt(expr, loc)
            }
            NodeKind::Return(value) => {
                let value = value.map(|v| self.copy_node(v, map, created));
                self.ast.return_stmt(value, loc)
            }
        };
        map.nodes.insert(node, new_node);
        created.push(new_node);
        new_node
    }

    /// Copy what a cloned symbol owns outside its def node.
    fn copy_symbol_payload(&mut self, sym: SymbolRef, def: NodeRef, map: &mut CopyMap, created: &mut Vec<NodeRef>) {
        let Some(func) = self.symbols.function(sym).cloned() else {
            return;
        };
        let outer = self.symbols.get_scope(func.param_scope).parent;
        let param_scope = self.symbols.push_scope(outer, Some(sym));
        let formals: Vec<NodeRef> = func
            .formals
            .iter()
            .map(|&formal| self.copy_node(formal, map, created))
            .collect();
        for &formal in &formals {
            self.ast.adopt(def, formal);
            if let Some(formal_sym) = self.ast.def_data(formal).map(|d| d.sym) {
                self.symbols.define_in_scope(param_scope, formal_sym);
            }
        }
        let where_expr = func.where_expr.map(|w| self.copy_node(w, map, created));
        if let Some(where_expr) = where_expr {
            self.ast.adopt(def, where_expr);
        }
        let body = self.copy_node(func.body, map, created);
        self.ast.adopt(def, body);

        if let Some(data) = self.symbols.function_mut(sym) {
            data.formals = formals.into_iter().collect();
            data.where_expr = where_expr;
            data.body = body;
            data.param_scope = param_scope;
        }
    }

    fn remap_node(&mut self, node: NodeRef, map: &CopyMap) {
        match self.ast.get_kind_mut(node) {
            NodeKind::SymRef(sym) => *sym = map.symbol(*sym),
            NodeKind::MemberAccess(_, field) => *field = map.symbol(*field),
            NodeKind::Block(data) => data.owner = data.owner.map(|owner| map.symbol(owner)),
            _ => {}
        }
    }

    fn remap_symbol(&mut self, sym: SymbolRef, map: &CopyMap) {
        let entry = self.symbols.get_mut(sym);
        match &mut entry.kind {
            SymbolKind::Function(func) => {
                func.this = func.this.map(|s| map.symbol(s));
                func.setter = func.setter.map(|s| map.symbol(s));
                func.getter = func.getter.map(|s| map.symbol(s));
            }
            SymbolKind::Param(param) => param.type_variable = param.type_variable.map(|s| map.symbol(s)),
            SymbolKind::Forwarding { forward, .. } => *forward = map.symbol(*forward),
            _ => {}
        }
    }

    /// Unknown type's symbol, used as the placeholder default of type formals.
    pub(crate) fn unknown_type_symbol(&self) -> Result<SymbolRef, SynthesisError> {
        self.type_symbol(self.types.type_unknown)
            .ok_or_else(|| SynthesisError::MissingDefinition {
                name: self.type_name(self.types.type_unknown).to_string(),
                location: SourceLoc::builtin(),
            })
    }

    /// Whether `ty` declares a first-class type usable as a value, as opposed
    /// to a type parameter only meaningful for generic instantiation.
    pub(crate) fn is_first_class_type(&self, ty: TypeRef) -> bool {
        match self.types.get(ty).kind {
            TypeKind::User { .. } => true,
            TypeKind::Variable { .. } => self.options.getters_for_type_variables,
            _ => false,
        }
    }
}
