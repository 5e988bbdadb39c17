//! Default method synthesis for structured types.
//!
//! For every record, class, value class and union the program declares, this
//! builds the declarations the source never spells out: per-field setters
//! and getters, getters for first-class nested types, the default
//! constructor and, for types with value semantics, structural `==`, `!=`
//! and `=`. Each declaration is spliced directly ahead of the type's own
//! declaring statement and stamped with the location of the field or type
//! that caused it.

use log::debug;

use crate::ast::{NameId, NodeRef, PrimOp};
use crate::source_manager::SourceLoc;

use super::context::{CompilationContext, CopyMap};
use super::error::SynthesisError;
use super::function_query::{FunctionQuery, function_exists};
use super::output::{DeclKind, SynthesizedDecl};
use super::symbol_table::{ConsClass, FnClass, Intent, MethodType, SymbolKind, SymbolRef};
use super::types::{TypeKind, TypeRef};

/// Name of a user-written constructor that replaces the default one.
const INITIALIZER_NAME: &str = "initialize";
const DATA_CLASS_PRAGMA: &str = "data class";

impl CompilationContext {
    /// Synthesize every default method of a structured type, in order:
    /// accessors, constructor, then `==`, `!=` and `=` for value types.
    ///
    /// Types that are not structured get nothing.
    pub fn build_default_class_methods(&mut self, type_sym: SymbolRef) -> Result<Vec<SynthesizedDecl>, SynthesisError> {
        let Some(ty) = self.structured_of(type_sym) else {
            return Ok(Vec::new());
        };
        let mut built = Vec::new();

        self.build_accessors(type_sym, ty, &mut built)?;
        if self.build_constructor(type_sym, ty)?.is_some() {
            built.push(SynthesizedDecl::new(DeclKind::Constructor));
        }

        let has_value_semantics = self
            .types
            .structured(ty)
            .is_some_and(|st| st.class_tag.has_value_semantics());
        if has_value_semantics {
            if self.memo.equality.insert(ty) {
                self.build_comparison(type_sym, ty, PrimOp::Equal)?;
                built.push(SynthesizedDecl::new(DeclKind::Equality));
                self.build_comparison(type_sym, ty, PrimOp::NotEqual)?;
                built.push(SynthesizedDecl::new(DeclKind::Inequality));
            }
            if self.build_assignment(type_sym, ty)?.is_some() {
                built.push(SynthesizedDecl::new(DeclKind::Assignment));
            }
        }
        Ok(built)
    }

    /// Insert a synthesized definition ahead of the statement declaring
    /// `type_sym` and stamp it with `loc`.
    pub(crate) fn splice_before_type(&mut self, type_sym: SymbolRef, def: NodeRef, loc: SourceLoc) -> Result<(), SynthesisError> {
        let anchor = self.declaring_stmt(type_sym)?;
        self.ast.insert_before(anchor, def);
        self.register_def(def);
        self.reset_loc(def, loc);
        Ok(())
    }

    pub(crate) fn set_ret_type(&mut self, func: SymbolRef, ret_type: TypeRef) {
        let entry = self.symbols.get_mut(func);
        entry.ty = ret_type;
        if let Some(data) = entry.as_function_mut() {
            data.ret_type = ret_type;
        }
    }

    /// Register `func` as a primary method of the structured type `ty`.
    fn add_primary_method(&mut self, func: SymbolRef, type_sym: SymbolRef, ty: TypeRef) {
        if let Some(data) = self.symbols.function_mut(func) {
            data.method_type = MethodType::Primary;
            data.type_binding = Some(type_sym);
        }
        if let Some(st) = self.types.structured_mut(ty) {
            st.methods.push(func);
        }
    }

    /// Copy of the type expression declared on `def`, if any.
    fn copy_type_expr(&mut self, def: NodeRef) -> Option<NodeRef> {
        let type_expr = self.ast.def_data(def)?.type_expr?;
        Some(self.copy(type_expr, &mut CopyMap::new()))
    }

    fn has_getter_for(&self, ty: TypeRef, member: SymbolRef) -> bool {
        self.types.structured(ty).is_some_and(|st| {
            st.methods
                .iter()
                .any(|&method| self.symbols.function(method).is_some_and(|f| f.getter == Some(member)))
        })
    }

    fn build_accessors(&mut self, type_sym: SymbolRef, ty: TypeRef, built: &mut Vec<SynthesizedDecl>) -> Result<(), SynthesisError> {
        let (fields, nested_types) = match self.types.structured(ty) {
            Some(st) => (st.fields.clone(), st.types.clone()),
            None => return Ok(()),
        };

        for field in fields {
            if self.has_getter_for(ty, field) {
                debug!("DefaultMethods: accessors for '{}' already exist", self.name(field));
                continue;
            }
            let name = self.name(field);
            self.build_setter(type_sym, ty, field)?;
            built.push(SynthesizedDecl::for_member(DeclKind::Setter, name));
            self.build_getter(type_sym, ty, field)?;
            built.push(SynthesizedDecl::for_member(DeclKind::Getter, name));
        }

        for nested in nested_types {
            let Some(nested_ty) = self.symbols.get(nested).type_definition() else {
                continue;
            };
            if !self.is_first_class_type(nested_ty) || self.has_getter_for(ty, nested) {
                continue;
            }
            self.build_getter(type_sym, ty, nested)?;
            built.push(SynthesizedDecl::for_member(DeclKind::Getter, self.name(nested)));
        }
        Ok(())
    }

    /// `inline` no-parens getter returning the member by name.
    fn build_getter(&mut self, type_sym: SymbolRef, ty: TypeRef, member: SymbolRef) -> Result<SymbolRef, SynthesisError> {
        let entry = self.symbols.get(member);
        let (name, member_ty, loc) = (entry.name.as_str(), entry.ty, entry.loc);
        let member_def = self.def_of(member);

        let func = self.new_function(name, member_ty, loc);
        self.symbols.get_mut(func).add_pragma("inline");
        let value = self.unresolved(name, loc);
        let ret = self.ast.return_stmt(Some(value), loc);
        self.ast.insert_at_tail(self.fn_body(func), ret);

        let def = self.def_of(func);
        if !self.options.infer_field_types
            && let Some(type_expr) = self.copy_type_expr(member_def)
        {
            self.ast.set_type_expr(def, type_expr);
        }
        self.splice_before_type(type_sym, def, loc)?;

        self.add_primary_method(func, type_sym, ty);
        if let Some(data) = self.symbols.function_mut(func) {
            data.getter = Some(member);
            data.no_parens = true;
        }
        debug!("DefaultMethods: built getter '{}' for {}", name, self.name(type_sym));
        Ok(func)
    }

    /// `inline` no-parens setter taking the setter token and the new value.
    fn build_setter(&mut self, type_sym: SymbolRef, ty: TypeRef, field: SymbolRef) -> Result<SymbolRef, SynthesisError> {
        let entry = self.symbols.get(field);
        let (name, field_ty, loc) = (entry.name.as_str(), entry.ty, entry.loc);
        let field_def = self.def_of(field);
        let eager_types = !self.options.infer_field_types;

        let func = self.new_function(name, self.types.type_void, loc);
        self.symbols.get_mut(func).add_pragma("inline");
        self.add_formal(func, "_setterTokenDummy", Intent::Ref, self.types.type_setter_token);
        let arg_ty = if eager_types { field_ty } else { self.types.type_unknown };
        let arg = self.add_formal(func, "_arg", Intent::Blank, arg_ty);
        if eager_types && let Some(type_expr) = self.copy_type_expr(field_def) {
            self.ast.set_type_expr(self.def_of(arg), type_expr);
        }

        let target = self.unresolved(name, loc);
        let value = self.ast.sym_ref(arg, loc);
        let assign = self.ast.prim_call(PrimOp::Assign, [target, value], loc);
        let stmt = self.ast.expr_stmt(assign, loc);
        self.ast.insert_at_tail(self.fn_body(func), stmt);

        self.splice_before_type(type_sym, self.def_of(func), loc)?;
        self.add_primary_method(func, type_sym, ty);
        if let Some(data) = self.symbols.function_mut(func) {
            data.setter = Some(field);
            data.no_parens = true;
        }
        debug!("DefaultMethods: built setter '{}' for {}", name, self.name(type_sym));
        Ok(func)
    }

    /// Default constructor, unless one is already recorded or the type has a
    /// user-written `initialize`.
    fn build_constructor(&mut self, type_sym: SymbolRef, ty: TypeRef) -> Result<Option<SymbolRef>, SynthesisError> {
        let Some(st) = self.types.structured(ty) else {
            return Ok(None);
        };
        if st.default_constructor.is_some() {
            return Ok(None);
        }
        let (fields, nested_types) = (st.fields.clone(), st.types.clone());

        if let Some(initializer) = FunctionQuery::named(INITIALIZER_NAME).bound_to(type_sym).run(self)? {
            debug!("DefaultMethods: {} has a user initializer", self.name(type_sym));
            if let Some(st) = self.types.structured_mut(ty) {
                st.default_constructor = Some(initializer);
            }
            return Ok(None);
        }

        let type_entry = self.symbols.get(type_sym);
        let (type_name, type_cname, loc) = (type_entry.name, type_entry.cname, type_entry.loc);
        let is_data_class = type_entry.has_pragma(DATA_CLASS_PRAGMA);

        let func = self.new_function(&format!("_construct_{}", type_name), ty, loc);
        self.symbols.get_mut(func).cname = NameId::new(format!("_construct_{}", type_cname));
        if let Some(data) = self.symbols.function_mut(func) {
            data.fn_class = FnClass::Constructor;
        }

        for nested in nested_types {
            let Some(TypeKind::Variable { bound }) = self
                .symbols
                .get(nested)
                .type_definition()
                .map(|nested_ty| self.types.get(nested_ty).kind.clone())
            else {
                continue;
            };
            let formal = self.add_formal(func, self.name(nested), Intent::Type, bound);
            if let SymbolKind::Param(param) = &mut self.symbols.get_mut(formal).kind {
                param.is_generic = true;
                param.type_variable = Some(nested);
            }
            let unknown = self.unknown_type_symbol()?;
            let placeholder = self.ast.sym_ref(unknown, loc);
            self.ast.set_init(self.def_of(formal), placeholder);
        }

        for field in fields {
            let entry = self.symbols.get(field);
            let (name, field_ty) = (entry.name.as_str(), entry.ty);
            let intent = match entry.as_variable() {
                Some(var) if var.cons_class == ConsClass::Param => Intent::Param,
                _ => Intent::Blank,
            };
            let field_def = self.def_of(field);

            let default = match self.ast.def_data(field_def).and_then(|data| data.init) {
                Some(init) => {
                    self.ast.remove(init);
                    init
                }
                None => self.ast.sym_ref(self.nil, loc),
            };
            let type_expr = self.copy_type_expr(field_def);

            let formal = self.add_formal(func, name, intent, field_ty);
            let formal_def = self.def_of(formal);
            self.ast.set_init(formal_def, default);
            if let Some(type_expr) = type_expr {
                self.ast.set_type_expr(formal_def, type_expr);
            }
        }

        self.splice_before_type(type_sym, self.def_of(func), loc)?;
        if let Some(st) = self.types.structured_mut(ty) {
            st.default_constructor = Some(func);
            st.methods.push(func);
        }
        if is_data_class {
            let entry = self.symbols.get_mut(func);
            entry.add_pragma("rename _data_construct");
            entry.add_pragma("keep types");
        }
        if let Some(data) = self.symbols.function_mut(func) {
            data.type_binding = Some(type_sym);
        }
        debug!("DefaultMethods: built constructor for {}", type_name);
        Ok(Some(func))
    }

    /// Structural `==` (an `&&` chain of field `==`) or `!=` (an `||` chain
    /// of field `!=`), folded left in field order.
    fn build_comparison(&mut self, type_sym: SymbolRef, ty: TypeRef, op: PrimOp) -> Result<SymbolRef, SynthesisError> {
        let (join, empty) = match op {
            PrimOp::Equal => (PrimOp::LogAnd, true),
            PrimOp::NotEqual => (PrimOp::LogOr, false),
            other => panic!("ICE: {} is not a structural comparison", other.as_str()),
        };
        let loc = self.symbols.get(type_sym).loc;
        let fields = self.types.structured(ty).map(|st| st.fields.clone()).unwrap_or_default();

        let func = self.new_function(op.as_str(), self.types.type_bool, loc);
        let arg1 = self.add_formal(func, "_arg1", Intent::Blank, ty);
        let arg2 = self.add_formal(func, "_arg2", Intent::Blank, ty);

        let mut cond = None;
        for field in fields {
            let lhs_base = self.ast.sym_ref(arg1, loc);
            let lhs = self.ast.member(lhs_base, field, loc);
            let rhs_base = self.ast.sym_ref(arg2, loc);
            let rhs = self.ast.member(rhs_base, field, loc);
            let leaf = self.ast.prim_call(op, [lhs, rhs], loc);
            cond = Some(match cond {
                Some(acc) => self.ast.prim_call(join, [acc, leaf], loc),
                None => leaf,
            });
        }
        // no fields: every pair of values compares equal
        let cond = match cond {
            Some(cond) => cond,
            None => self.ast.bool_literal(empty, loc),
        };
        let ret = self.ast.return_stmt(Some(cond), loc);
        self.ast.insert_at_tail(self.fn_body(func), ret);

        self.splice_before_type(type_sym, self.def_of(func), loc)?;
        debug!("DefaultMethods: built '{}' for {}", op.as_str(), self.name(type_sym));
        Ok(func)
    }

    /// Field-by-field `=`, unless a two-formal `=` taking this type as its
    /// second formal already exists.
    fn build_assignment(&mut self, type_sym: SymbolRef, ty: TypeRef) -> Result<Option<SymbolRef>, SynthesisError> {
        if self.memo.assignment.contains(&ty) {
            return Ok(None);
        }
        let type_name = self.name(type_sym);
        if let Some(existing) = function_exists(self, PrimOp::Assign.as_str(), Some(2), None, None, Some(type_name))? {
            debug!("DefaultMethods: {} already has '=' (symbol {})", type_name, existing.get());
            return Ok(None);
        }
        self.memo.assignment.insert(ty);

        let loc = self.symbols.get(type_sym).loc;
        let as_method = self.options.assignment_as_method;
        let fields = self.types.structured(ty).map(|st| st.fields.clone()).unwrap_or_default();

        let func = self.new_function(PrimOp::Assign.as_str(), self.types.type_unknown, loc);
        let receiver = if as_method {
            self.add_formal(func, "this", Intent::Ref, ty)
        } else {
            self.add_formal(func, "_arg1", Intent::Blank, ty)
        };
        let source = self.add_formal(func, "_arg2", Intent::Blank, self.types.type_unknown);

        let body = self.fn_body(func);
        for field in fields {
            let lhs_base = self.ast.sym_ref(receiver, loc);
            let lhs = self.ast.member(lhs_base, field, loc);
            let rhs_base = self.ast.sym_ref(source, loc);
            let rhs = self.ast.member(rhs_base, field, loc);
            let assign = self.ast.prim_call(PrimOp::Assign, [lhs, rhs], loc);
            let stmt = self.ast.expr_stmt(assign, loc);
            self.ast.insert_at_tail(body, stmt);
        }
        let result = self.ast.sym_ref(receiver, loc);
        let ret = self.ast.return_stmt(Some(result), loc);
        self.ast.insert_at_tail(body, ret);

        self.splice_before_type(type_sym, self.def_of(func), loc)?;
        if as_method {
            self.add_primary_method(func, type_sym, ty);
            if let Some(data) = self.symbols.function_mut(func) {
                data.this = Some(receiver);
            }
        }
        if as_method || !self.options.infer_field_types {
            self.set_ret_type(func, ty);
        }
        debug!("DefaultMethods: built '=' for {}", type_name);
        Ok(Some(func))
    }
}
