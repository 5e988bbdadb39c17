//! Symbol table management and scope handling.
//!
//! Every named entity of the program lives in one flat arena of
//! [`SymbolEntry`] values addressed by [`SymbolRef`]. Kind-specific data is a
//! tagged payload ([`SymbolKind`]) rather than a subtype, so passes dispatch
//! with exhaustive matches. Back-references (defining node, bound receiver
//! type, owning module) are handles, never owning pointers.

use hashbrown::HashMap;
use std::num::NonZeroU32;

use bitflags::bitflags;
use log::debug;
use serde::Serialize;
use thin_vec::ThinVec;

use crate::ast::{Ast, Literal, NameId, NodeKind, NodeRef};
use crate::source_manager::SourceLoc;

use super::types::TypeRef;

/// Opaque reference to a symbol entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SymbolRef(NonZeroU32);

impl SymbolRef {
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

bitflags! {
    /// Visibility and liveness flags shared by every symbol kind.
    /// DEAD and KEEP_LIVE are consumed by dead code elimination.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct SymbolFlags: u8 {
        const EXPORT = 1 << 0;
        const DEAD = 1 << 1;
        const KEEP_LIVE = 1 << 2;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum VarClass {
    Normal,
    Ref,
    Config,
    State,
}

/// Mutability of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ConsClass {
    Var,
    Const,
    Param, // compile-time constant
}

/// Parameter passing discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Intent {
    Blank,
    In,
    InOut,
    Out,
    Const,
    Ref,
    Param,
    Type,
}

impl Intent {
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            Intent::Blank => None,
            Intent::In => Some("in"),
            Intent::InOut => Some("inout"),
            Intent::Out => Some("out"),
            Intent::Const => Some("const"),
            Intent::Ref => Some("ref"),
            Intent::Param => Some("param"),
            Intent::Type => Some("type"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FnClass {
    Function,
    Constructor,
    Iterator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MethodType {
    NonMethod,
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ModType {
    Internal, // intrinsic, prelude (no codegen)
    Standard, // library modules that need codegen
    Common,   // above the user modules
    User,
    Sentinel,
}

#[derive(Debug, Clone)]
pub struct VariableData {
    pub var_class: VarClass,
    pub cons_class: ConsClass,
    /// Type to dispatch to instead of the declared one (e.g. `super`).
    pub aspect: Option<TypeRef>,
    pub no_default_init: bool,
}

impl VariableData {
    pub fn new(cons_class: ConsClass) -> Self {
        VariableData {
            var_class: VarClass::Normal,
            cons_class,
            aspect: None,
            no_default_init: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParamData {
    pub intent: Intent,
    /// Type parameter this formal binds, for generic formals.
    pub type_variable: Option<SymbolRef>,
    pub is_generic: bool,
}

#[derive(Debug, Clone)]
pub struct TypeData {
    pub definition: TypeRef,
}

#[derive(Debug, Clone)]
pub struct FunctionData {
    /// Def nodes of the formals, in order.
    pub formals: ThinVec<NodeRef>,
    pub ret_type: TypeRef,
    pub this: Option<SymbolRef>,
    /// Field this function writes, if it is a setter.
    pub setter: Option<SymbolRef>,
    /// Field this function reads, if it is a getter.
    pub getter: Option<SymbolRef>,
    pub body: NodeRef,
    /// Receiver type symbol for methods.
    pub type_binding: Option<SymbolRef>,
    pub method_type: MethodType,
    pub param_scope: ScopeId,
    pub fn_class: FnClass,
    pub ret_ref: bool,
    pub where_expr: Option<NodeRef>,
    pub no_parens: bool,
}

#[derive(Debug, Clone)]
pub struct ModuleData {
    pub mod_type: ModType,
    /// Block holding the module's top-level statements.
    pub stmts: NodeRef,
    pub init_fn: Option<SymbolRef>,
    pub mod_scope: ScopeId,
    pub uses: Vec<SymbolRef>,
    pub used_by: Vec<ScopeId>,
}

/// Defines the kind of symbol.
#[derive(Debug, Clone)]
pub enum SymbolKind {
    Unresolved,
    Variable(VariableData),
    Param(ParamData),
    Type(TypeData),
    Function(Box<FunctionData>),
    EnumConstant { init: Option<NodeRef>, value: i64 },
    Module(Box<ModuleData>),
    Forwarding { forward: SymbolRef, renamed: bool },
    Label,
}

/// A named program entity.
#[derive(Debug, Clone)]
pub struct SymbolEntry {
    pub name: NameId,
    /// Name used by generated low-level code.
    pub cname: NameId,
    pub ty: TypeRef,
    pub flags: SymbolFlags,
    pub def_point: Option<NodeRef>,
    pub overload: Option<SymbolRef>,
    pub pragmas: ThinVec<NameId>,
    pub loc: SourceLoc,
    pub kind: SymbolKind,
}

impl SymbolEntry {
    pub fn new(name: NameId, ty: TypeRef, loc: SourceLoc, kind: SymbolKind) -> Self {
        SymbolEntry {
            name,
            cname: name,
            ty,
            flags: SymbolFlags::EXPORT,
            def_point: None,
            overload: None,
            pragmas: ThinVec::new(),
            loc,
            kind,
        }
    }

    pub fn has_pragma(&self, pragma: &str) -> bool {
        self.pragmas.iter().any(|p| p.as_str() == pragma)
    }

    pub fn add_pragma(&mut self, pragma: &str) {
        if !self.has_pragma(pragma) {
            self.pragmas.push(NameId::new(pragma));
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, SymbolKind::Function(_))
    }

    pub fn as_function(&self) -> Option<&FunctionData> {
        match &self.kind {
            SymbolKind::Function(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_function_mut(&mut self) -> Option<&mut FunctionData> {
        match &mut self.kind {
            SymbolKind::Function(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_module(&self) -> Option<&ModuleData> {
        match &self.kind {
            SymbolKind::Module(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_module_mut(&mut self) -> Option<&mut ModuleData> {
        match &mut self.kind {
            SymbolKind::Module(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_param(&self) -> Option<&ParamData> {
        match &self.kind {
            SymbolKind::Param(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_variable(&self) -> Option<&VariableData> {
        match &self.kind {
            SymbolKind::Variable(data) => Some(data),
            _ => None,
        }
    }

    /// The type a type symbol declares.
    pub fn type_definition(&self) -> Option<TypeRef> {
        match &self.kind {
            SymbolKind::Type(data) => Some(data.definition),
            _ => None,
        }
    }
}

/// Scope ID for efficient scope references
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(NonZeroU32);

impl ScopeId {
    pub fn new(id: u32) -> Option<Self> {
        NonZeroU32::new(id).map(Self)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

/// Scope information
#[derive(Debug)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    /// Module or function owning this scope.
    pub owner: Option<SymbolRef>,
    pub symbols: HashMap<NameId, SymbolRef>,
}

/// Symbol table using flattened storage
#[derive(Debug, Default)]
pub struct SymbolTable {
    pub entries: Vec<SymbolEntry>,
    pub scopes: Vec<Scope>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entry: SymbolEntry) -> SymbolRef {
        self.entries.push(entry);
        SymbolRef::new(self.entries.len() as u32).expect("SymbolRef overflow")
    }

    pub fn get(&self, sym: SymbolRef) -> &SymbolEntry {
        &self.entries[sym.index()]
    }

    pub fn get_mut(&mut self, sym: SymbolRef) -> &mut SymbolEntry {
        &mut self.entries[sym.index()]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All symbol handles in allocation order.
    pub fn refs(&self) -> impl Iterator<Item = SymbolRef> + '_ {
        (1..=self.entries.len() as u32).filter_map(SymbolRef::new)
    }

    pub fn name(&self, sym: SymbolRef) -> NameId {
        self.get(sym).name
    }

    pub fn function(&self, sym: SymbolRef) -> Option<&FunctionData> {
        self.get(sym).as_function()
    }

    pub fn function_mut(&mut self, sym: SymbolRef) -> Option<&mut FunctionData> {
        self.get_mut(sym).as_function_mut()
    }

    pub fn module(&self, sym: SymbolRef) -> Option<&ModuleData> {
        self.get(sym).as_module()
    }

    pub fn push_scope(&mut self, parent: Option<ScopeId>, owner: Option<SymbolRef>) -> ScopeId {
        self.scopes.push(Scope {
            parent,
            owner,
            symbols: HashMap::new(),
        });
        let id = ScopeId::new(self.scopes.len() as u32).expect("ScopeId overflow");
        debug!("SymbolTable: pushed scope {} (parent {:?})", id.get(), parent.map(ScopeId::get));
        id
    }

    pub fn get_scope(&self, scope_id: ScopeId) -> &Scope {
        &self.scopes[scope_id.get() as usize - 1]
    }

    pub fn get_scope_mut(&mut self, scope_id: ScopeId) -> &mut Scope {
        &mut self.scopes[scope_id.get() as usize - 1]
    }

    /// Bind a symbol's name in `scope`.
    ///
    /// Functions sharing a name form an overload chain: the newest binding
    /// links to the one it shadows.
    pub fn define_in_scope(&mut self, scope: ScopeId, sym: SymbolRef) {
        let name = self.name(sym);
        let previous = self.get_scope_mut(scope).symbols.insert(name, sym);
        if let Some(previous) = previous
            && previous != sym
            && self.get(previous).is_function()
            && self.get(sym).is_function()
        {
            debug!("SymbolTable: '{}' overloads symbol {}", name, previous.get());
            self.get_mut(sym).overload = Some(previous);
        }
    }

    /// Look a name up starting at `start_scope` and walking outwards.
    pub fn lookup(&self, name: NameId, start_scope: ScopeId) -> Option<SymbolRef> {
        let mut scope_id = start_scope;
        loop {
            let scope = self.get_scope(scope_id);
            if let Some(&sym) = scope.symbols.get(&name) {
                return Some(sym);
            }
            scope_id = scope.parent?;
        }
    }

    /// Point every symbol in `syms` at the same defining node.
    pub fn set_def_points(&mut self, syms: &[SymbolRef], def: NodeRef) {
        for &sym in syms {
            self.get_mut(sym).def_point = Some(def);
        }
    }

    /// Assign ordinals to a run of enum constants: an integer literal
    /// initializer fixes the value, otherwise it is one past the previous.
    pub fn set_enum_values(&mut self, constants: &[SymbolRef], ast: &Ast) {
        let mut next = 0i64;
        for &sym in constants {
            if let SymbolKind::EnumConstant { init, value } = &mut self.get_mut(sym).kind {
                if let Some(init) = *init
                    && let NodeKind::Literal(Literal::Int(v)) = ast.get_kind(init)
                {
                    next = *v;
                }
                *value = next;
                next = next.wrapping_add(1);
            }
        }
    }

    /// Follow a forwarding chain to the symbol it finally names.
    pub fn resolve_forward(&self, sym: SymbolRef) -> SymbolRef {
        let mut current = sym;
        while let SymbolKind::Forwarding { forward, .. } = self.get(current).kind {
            current = forward;
        }
        current
    }

    /// Type of the symbol a (possibly forwarded) name stands for.
    pub fn type_info(&self, sym: SymbolRef) -> TypeRef {
        self.get(self.resolve_forward(sym)).ty
    }

    /// The function a (possibly forwarded) name stands for.
    pub fn fn_symbol(&self, sym: SymbolRef) -> Option<SymbolRef> {
        let target = self.resolve_forward(sym);
        self.get(target).is_function().then_some(target)
    }
}
