//! Program construction.
//!
//! The parser and scope builder of the enclosing compiler hand the synthesis
//! stage a populated tree. These helpers are the API they (and the tests) use
//! to build that tree: every helper keeps symbol, scope and node bookkeeping
//! consistent, so definitions are always reachable from their module and
//! every symbol knows its defining node.

use log::debug;

use crate::ast::{NameId, NodeRef};
use crate::source_manager::SourceLoc;

use super::context::CompilationContext;
use super::error::SynthesisError;
use super::symbol_table::{
    ConsClass, FnClass, FunctionData, Intent, MethodType, ModType, ModuleData, ParamData, ScopeId, SymbolEntry,
    SymbolKind, SymbolRef, TypeData, VariableData,
};
use super::types::{ClassTag, StructuredType, TypeKind, TypeRef};

impl CompilationContext {
    /// Register a new module with an empty statement sequence.
    pub fn new_module(&mut self, name: &str, mod_type: ModType, loc: SourceLoc) -> SymbolRef {
        let stmts = self.ast.block([], None, loc);
        let mod_scope = self.symbols.push_scope(None, None);
        let sym = self.symbols.add(SymbolEntry::new(
            NameId::new(name),
            self.types.type_void,
            loc,
            SymbolKind::Module(Box::new(ModuleData {
                mod_type,
                stmts,
                init_fn: None,
                mod_scope,
                uses: Vec::new(),
                used_by: Vec::new(),
            })),
        ));
        self.set_block_owner(stmts, sym);
        self.symbols.get_scope_mut(mod_scope).owner = Some(sym);

        let def = self.ast.def(sym, None, None, loc);
        self.ast.adopt(def, stmts);
        self.symbols.set_def_points(&[sym], def);
        self.modules.push(sym);
        debug!("Builder: registered {:?} module '{}'", mod_type, name);
        sym
    }

    pub fn set_prelude(&mut self, module: SymbolRef) {
        self.prelude = Some(module);
    }

    pub fn set_common(&mut self, module: SymbolRef) {
        self.common = Some(module);
    }

    /// Record that `module` uses `used`.
    pub fn add_module_use(&mut self, module: SymbolRef, used: SymbolRef) {
        let scope = self.module_scope(module);
        if let Some(data) = self.symbols.get_mut(module).as_module_mut() {
            data.uses.push(used);
        }
        if let Some(data) = self.symbols.get_mut(used).as_module_mut() {
            data.used_by.push(scope);
        }
    }

    /// Top-level statement block of a module.
    pub fn module_stmts(&self, module: SymbolRef) -> NodeRef {
        match self.symbols.module(module) {
            Some(data) => data.stmts,
            None => panic!("ICE: symbol {} is not a module", self.name(module)),
        }
    }

    pub fn module_scope(&self, module: SymbolRef) -> ScopeId {
        match self.symbols.module(module) {
            Some(data) => data.mod_scope,
            None => panic!("ICE: symbol {} is not a module", self.name(module)),
        }
    }

    /// Defining node of a symbol the builder created.
    pub fn def_of(&self, sym: SymbolRef) -> NodeRef {
        match self.symbols.get(sym).def_point {
            Some(def) => def,
            None => panic!("ICE: symbol {} has no definition", self.name(sym)),
        }
    }

    /// Body block of a function.
    pub fn fn_body(&self, func: SymbolRef) -> NodeRef {
        match self.symbols.function(func) {
            Some(data) => data.body,
            None => panic!("ICE: symbol {} is not a function", self.name(func)),
        }
    }

    fn set_block_owner(&mut self, block: NodeRef, owner: SymbolRef) {
        if let crate::ast::NodeKind::Block(data) = self.ast.get_kind_mut(block) {
            data.owner = Some(owner);
        }
    }

    /// Scope names defined directly in `block` are registered in.
    pub(crate) fn scope_of_block(&self, block: NodeRef) -> Option<ScopeId> {
        let owner = self.ast.block_owner(block)?;
        match &self.symbols.get(owner).kind {
            SymbolKind::Module(data) => Some(data.mod_scope),
            SymbolKind::Function(data) => Some(data.param_scope),
            _ => None,
        }
    }

    /// Append a detached definition to `block` and bind its name.
    pub fn append_def(&mut self, block: NodeRef, def: NodeRef) {
        self.ast.insert_at_tail(block, def);
        self.register_def(def);
    }

    /// Bind the name of an attached definition in the scope of its block.
    pub(crate) fn register_def(&mut self, def: NodeRef) {
        let Some(sym) = self.ast.def_data(def).map(|data| data.sym) else {
            return;
        };
        if let Some(block) = self.ast.parent(def)
            && let Some(scope) = self.scope_of_block(block)
        {
            self.symbols.define_in_scope(scope, sym);
        }
    }

    // --- types ---

    /// Declare a record, class, value class or union at the end of `block`.
    pub fn define_structured_type(&mut self, block: NodeRef, name: &str, class_tag: ClassTag, loc: SourceLoc) -> SymbolRef {
        let decls = self.ast.block([], None, loc);
        let ty = self.types.alloc(
            NameId::new(name),
            TypeKind::Structured(Box::new(StructuredType::new(class_tag, decls))),
        );
        let sym = self.add_type_symbol(ty, decls, loc);
        self.append_def(block, self.def_of(sym));
        debug!("Builder: declared {} '{}'", class_tag.keyword(), name);
        sym
    }

    /// Declare an opaque primitive type such as the `file` stream handle.
    pub fn define_primitive_type(&mut self, block: NodeRef, name: &str, loc: SourceLoc) -> SymbolRef {
        let ty = self.types.alloc(NameId::new(name), TypeKind::Primitive);
        let sym = self.symbols.add(SymbolEntry::new(
            NameId::new(name),
            ty,
            loc,
            SymbolKind::Type(TypeData { definition: ty }),
        ));
        self.types.get_mut(ty).symbol = Some(sym);
        let def = self.ast.def(sym, None, None, loc);
        self.symbols.set_def_points(&[sym], def);
        self.append_def(block, def);
        sym
    }

    /// Declare an enum whose constants take their ordinals from explicit
    /// integer initializers or count up from the previous one.
    pub fn define_enum(&mut self, block: NodeRef, name: &str, constants: &[(&str, Option<i64>)], loc: SourceLoc) -> SymbolRef {
        let decls = self.ast.block([], None, loc);
        let ty = self.types.alloc(
            NameId::new(name),
            TypeKind::Enum {
                decls,
                constants: Vec::new(),
            },
        );
        let sym = self.add_type_symbol(ty, decls, loc);

        let mut constant_syms = Vec::with_capacity(constants.len());
        for &(constant, value) in constants {
            let init = value.map(|v| self.ast.int_literal(v, loc));
            let constant_sym = self.symbols.add(SymbolEntry::new(
                NameId::new(constant),
                ty,
                loc,
                SymbolKind::EnumConstant { init, value: 0 },
            ));
            let def = self.ast.def(constant_sym, init, None, loc);
            self.symbols.set_def_points(&[constant_sym], def);
            self.ast.insert_at_tail(decls, def);
            constant_syms.push(constant_sym);
        }
        self.symbols.set_enum_values(&constant_syms, &self.ast);
        if let TypeKind::Enum { constants, .. } = &mut self.types.get_mut(ty).kind {
            *constants = constant_syms;
        }

        self.append_def(block, self.def_of(sym));
        sym
    }

    fn add_type_symbol(&mut self, ty: TypeRef, decls: NodeRef, loc: SourceLoc) -> SymbolRef {
        let name = self.types.name_of(ty);
        let sym = self.symbols.add(SymbolEntry::new(
            name,
            ty,
            loc,
            SymbolKind::Type(TypeData { definition: ty }),
        ));
        self.types.get_mut(ty).symbol = Some(sym);
        self.set_block_owner(decls, sym);
        let def = self.ast.def(sym, None, None, loc);
        self.ast.adopt(def, decls);
        self.symbols.set_def_points(&[sym], def);
        sym
    }

    /// Declared type of a type symbol, which must be structured.
    pub(crate) fn structured_of(&self, type_sym: SymbolRef) -> Option<TypeRef> {
        let ty = self.symbols.get(type_sym).type_definition()?;
        self.types.structured(ty).map(|_| ty)
    }

    fn decls_of(&self, type_sym: SymbolRef) -> (TypeRef, NodeRef) {
        let structured = self
            .symbols
            .get(type_sym)
            .type_definition()
            .and_then(|ty| self.types.structured(ty).map(|st| (ty, st.decls)));
        match structured {
            Some(found) => found,
            None => panic!("ICE: symbol {} is not a structured type", self.name(type_sym)),
        }
    }

    /// Append a field to a structured type. Declared type expression and
    /// initializer can be attached to the returned field's definition with
    /// [`crate::ast::Ast::set_type_expr`] and [`crate::ast::Ast::set_init`].
    pub fn add_field(&mut self, type_sym: SymbolRef, name: &str, ty: TypeRef, cons_class: ConsClass, loc: SourceLoc) -> SymbolRef {
        let (owner, decls) = self.decls_of(type_sym);
        let sym = self.symbols.add(SymbolEntry::new(
            NameId::new(name),
            ty,
            loc,
            SymbolKind::Variable(VariableData::new(cons_class)),
        ));
        let def = self.ast.def(sym, None, None, loc);
        self.symbols.set_def_points(&[sym], def);
        self.ast.insert_at_tail(decls, def);
        if let Some(st) = self.types.structured_mut(owner) {
            st.fields.push(sym);
        }
        sym
    }

    /// Nested generic type parameter with the given bound.
    pub fn add_type_param(&mut self, type_sym: SymbolRef, name: &str, bound: TypeRef, loc: SourceLoc) -> SymbolRef {
        self.add_nested_type(type_sym, name, TypeKind::Variable { bound }, loc)
    }

    /// Nested first-class type alias.
    pub fn add_type_alias(&mut self, type_sym: SymbolRef, name: &str, underlying: TypeRef, loc: SourceLoc) -> SymbolRef {
        self.add_nested_type(type_sym, name, TypeKind::User { underlying }, loc)
    }

    fn add_nested_type(&mut self, type_sym: SymbolRef, name: &str, kind: TypeKind, loc: SourceLoc) -> SymbolRef {
        let (owner, decls) = self.decls_of(type_sym);
        let ty = self.types.alloc(NameId::new(name), kind);
        let sym = self.symbols.add(SymbolEntry::new(
            NameId::new(name),
            ty,
            loc,
            SymbolKind::Type(TypeData { definition: ty }),
        ));
        self.types.get_mut(ty).symbol = Some(sym);
        let def = self.ast.def(sym, None, None, loc);
        self.symbols.set_def_points(&[sym], def);
        self.ast.insert_at_tail(decls, def);
        if let Some(st) = self.types.structured_mut(owner) {
            st.types.push(sym);
        }
        sym
    }

    /// Canonical type symbol for a tuple of `components`.
    ///
    /// The first request fabricates the type and appends its definition to
    /// the prelude; later requests with the same component list return it.
    pub fn lookup_or_define_tuple_type_symbol(&mut self, components: &[TypeRef]) -> Result<SymbolRef, SynthesisError> {
        if let Some(ty) = self.types.lookup_tuple(components)
            && let Some(sym) = self.type_symbol(ty)
        {
            return Ok(sym);
        }
        let prelude = self.prelude.ok_or(SynthesisError::MissingModule {
            which: "prelude",
            location: SourceLoc::builtin(),
        })?;

        let ty = self.types.intern_tuple(components);
        let name = self.types.name_of(ty);
        let mut entry = SymbolEntry::new(name, ty, SourceLoc::builtin(), SymbolKind::Type(TypeData { definition: ty }));
        let component_names: Vec<&str> = components.iter().map(|&c| self.type_name(c)).collect();
        entry.cname = NameId::new(format!("{}_{}", name, component_names.join("_")));
        let sym = self.symbols.add(entry);
        self.types.get_mut(ty).symbol = Some(sym);

        let def = self.ast.def(sym, None, None, SourceLoc::builtin());
        self.symbols.set_def_points(&[sym], def);
        let stmts = self.module_stmts(prelude);
        self.ast.insert_at_tail(stmts, def);
        debug!("Builder: defined tuple type {} ({})", name, component_names.join(", "));
        Ok(sym)
    }

    // --- functions ---

    /// Create a detached function with an empty body.
    pub fn new_function(&mut self, name: &str, ret_type: TypeRef, loc: SourceLoc) -> SymbolRef {
        let body = self.ast.block([], None, loc);
        let param_scope = self.symbols.push_scope(None, None);
        let sym = self.symbols.add(SymbolEntry::new(
            NameId::new(name),
            ret_type,
            loc,
            SymbolKind::Function(Box::new(FunctionData {
                formals: Default::default(),
                ret_type,
                this: None,
                setter: None,
                getter: None,
                body,
                type_binding: None,
                method_type: MethodType::NonMethod,
                param_scope,
                fn_class: FnClass::Function,
                ret_ref: false,
                where_expr: None,
                no_parens: false,
            })),
        ));
        self.set_block_owner(body, sym);
        self.symbols.get_scope_mut(param_scope).owner = Some(sym);

        let def = self.ast.def(sym, None, None, loc);
        self.ast.adopt(def, body);
        self.symbols.set_def_points(&[sym], def);
        sym
    }

    /// Create a function and append it to `block`.
    pub fn define_function(&mut self, block: NodeRef, name: &str, ret_type: TypeRef, loc: SourceLoc) -> SymbolRef {
        let sym = self.new_function(name, ret_type, loc);
        self.append_def(block, self.def_of(sym));
        sym
    }

    /// Append a formal to a function. Default value and declared type
    /// expression go on the returned formal's definition.
    pub fn add_formal(&mut self, func: SymbolRef, name: &str, intent: Intent, ty: TypeRef) -> SymbolRef {
        let loc = self.symbols.get(func).loc;
        let sym = self.symbols.add(SymbolEntry::new(
            NameId::new(name),
            ty,
            loc,
            SymbolKind::Param(ParamData {
                intent,
                type_variable: None,
                is_generic: false,
            }),
        ));
        let def = self.ast.def(sym, None, None, loc);
        self.symbols.set_def_points(&[sym], def);
        self.attach_formal(func, def);
        sym
    }

    /// Append an existing detached formal definition to a function.
    pub(crate) fn attach_formal(&mut self, func: SymbolRef, formal: NodeRef) {
        let fn_def = self.def_of(func);
        self.ast.adopt(fn_def, formal);
        let Some(data) = self.symbols.function_mut(func) else {
            panic!("ICE: symbol {} is not a function", func.get());
        };
        data.formals.push(formal);
        let scope = data.param_scope;
        if let Some(formal_sym) = self.ast.def_data(formal).map(|d| d.sym) {
            self.symbols.define_in_scope(scope, formal_sym);
        }
    }

    /// Formal symbols of a function, in order.
    pub fn formal_symbols(&self, func: SymbolRef) -> Vec<SymbolRef> {
        self.symbols
            .function(func)
            .map(|data| {
                data.formals
                    .iter()
                    .filter_map(|&formal| self.ast.def_data(formal).map(|d| d.sym))
                    .collect()
            })
            .unwrap_or_default()
    }

    // --- expressions ---

    /// Reference to a name that later resolution binds.
    pub fn unresolved(&mut self, name: &str, loc: SourceLoc) -> NodeRef {
        let sym = self.symbols.add(SymbolEntry::new(
            NameId::new(name),
            self.types.type_unknown,
            loc,
            SymbolKind::Unresolved,
        ));
        self.ast.sym_ref(sym, loc)
    }

    /// Type expression naming a type through its declaring symbol.
    pub fn type_expr(&mut self, ty: TypeRef, loc: SourceLoc) -> NodeRef {
        match self.type_symbol(ty) {
            Some(sym) => self.ast.sym_ref(sym, loc),
            None => self.unresolved(self.type_name(ty), loc),
        }
    }
}
