//! Default `fwrite`/`fread` synthesis.
//!
//! Whether a type can be written or read without a user routine, and what
//! that routine does, is up to a [`DefaultIoProvider`]. This module only
//! decides when to ask, builds the function shell around the body the
//! provider returns and splices it next to the type.

use log::debug;

use crate::ast::{NameId, NodeRef, SourceLoc};

use super::context::CompilationContext;
use super::error::SynthesisError;
use super::function_query::function_exists;
use super::output::{DeclKind, SynthesizedDecl};
use super::symbol_table::{Intent, SymbolRef};
use super::types::{ClassTag, TypeRef};

pub const WRITE_FN_NAME: &str = "fwrite";
pub const READ_FN_NAME: &str = "fread";
/// Stream handle type, declared by the prelude.
pub const STREAM_TYPE_NAME: &str = "file";

/// Per-type capability to serialize values without a user routine.
pub trait DefaultIoProvider {
    fn has_default_write(&self, ctx: &CompilationContext, ty: TypeRef) -> bool;

    fn has_default_read(&self, ctx: &CompilationContext, ty: TypeRef) -> bool;

    /// Statements writing `value` to `stream`.
    fn build_default_write_body(
        &self,
        ctx: &mut CompilationContext,
        ty: TypeRef,
        stream: SymbolRef,
        value: SymbolRef,
    ) -> Vec<NodeRef>;

    /// Statements reading `value` from `stream`.
    fn build_default_read_body(
        &self,
        ctx: &mut CompilationContext,
        ty: TypeRef,
        stream: SymbolRef,
        value: SymbolRef,
    ) -> Vec<NodeRef>;
}

/// Field-wise IO for records, classes and value classes.
///
/// Writes `{a = 1, b = 2}` and reads fields back in declaration order.
/// Unions have no default IO: which field is live is not known statically.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralIo;

impl StructuralIo {
    fn supports(ctx: &CompilationContext, ty: TypeRef) -> bool {
        ctx.types
            .structured(ty)
            .is_some_and(|st| st.class_tag != ClassTag::Union)
    }

    fn fields(ctx: &CompilationContext, ty: TypeRef) -> Vec<SymbolRef> {
        ctx.types.structured(ty).map(|st| st.fields.clone()).unwrap_or_default()
    }

    /// `<callee>(stream, arg);`
    fn io_call(ctx: &mut CompilationContext, callee: &str, stream: SymbolRef, arg: NodeRef) -> NodeRef {
        let loc = ctx.ast.loc(arg);
        let callee = ctx.unresolved(callee, loc);
        let stream = ctx.ast.sym_ref(stream, loc);
        let call = ctx.ast.call(callee, [stream, arg], loc);
        ctx.ast.expr_stmt(call, loc)
    }

    fn write_text(ctx: &mut CompilationContext, stream: SymbolRef, text: &str, loc: SourceLoc) -> NodeRef {
        let text = ctx.ast.string_literal(text, loc);
        Self::io_call(ctx, WRITE_FN_NAME, stream, text)
    }
}

impl DefaultIoProvider for StructuralIo {
    fn has_default_write(&self, ctx: &CompilationContext, ty: TypeRef) -> bool {
        Self::supports(ctx, ty)
    }

    fn has_default_read(&self, ctx: &CompilationContext, ty: TypeRef) -> bool {
        Self::supports(ctx, ty)
    }

    fn build_default_write_body(
        &self,
        ctx: &mut CompilationContext,
        ty: TypeRef,
        stream: SymbolRef,
        value: SymbolRef,
    ) -> Vec<NodeRef> {
        let loc = ctx.symbols.get(value).loc;
        let mut stmts = vec![Self::write_text(ctx, stream, "{", loc)];
        for (index, field) in Self::fields(ctx, ty).into_iter().enumerate() {
            if index > 0 {
                stmts.push(Self::write_text(ctx, stream, ", ", loc));
            }
            let label = format!("{} = ", ctx.name(field));
            stmts.push(Self::write_text(ctx, stream, &label, loc));
            let base = ctx.ast.sym_ref(value, loc);
            let member = ctx.ast.member(base, field, loc);
            stmts.push(Self::io_call(ctx, WRITE_FN_NAME, stream, member));
        }
        stmts.push(Self::write_text(ctx, stream, "}", loc));
        stmts
    }

    fn build_default_read_body(
        &self,
        ctx: &mut CompilationContext,
        ty: TypeRef,
        stream: SymbolRef,
        value: SymbolRef,
    ) -> Vec<NodeRef> {
        let loc = ctx.symbols.get(value).loc;
        Self::fields(ctx, ty)
            .into_iter()
            .map(|field| {
                let base = ctx.ast.sym_ref(value, loc);
                let member = ctx.ast.member(base, field, loc);
                Self::io_call(ctx, READ_FN_NAME, stream, member)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IoDirection {
    Write,
    Read,
}

impl IoDirection {
    fn fn_name(self) -> &'static str {
        match self {
            IoDirection::Write => WRITE_FN_NAME,
            IoDirection::Read => READ_FN_NAME,
        }
    }
}

impl CompilationContext {
    /// Synthesize default `fwrite` and `fread` for the type declared by
    /// `type_sym`, each at most once per type and only when no matching
    /// user routine exists.
    pub fn build_default_io_functions(
        &mut self,
        type_sym: SymbolRef,
        io: &dyn DefaultIoProvider,
    ) -> Result<Vec<SynthesizedDecl>, SynthesisError> {
        let mut built = Vec::new();
        if self.options.no_std_includes {
            return Ok(built);
        }
        let Some(ty) = self.symbols.get(type_sym).type_definition() else {
            return Ok(built);
        };

        if io.has_default_write(self, ty) && self.needs_io_function(type_sym, ty, IoDirection::Write)? {
            self.build_io_function(type_sym, ty, io, IoDirection::Write)?;
            built.push(SynthesizedDecl::new(DeclKind::Write));
        }
        if io.has_default_read(self, ty) && self.needs_io_function(type_sym, ty, IoDirection::Read)? {
            self.build_io_function(type_sym, ty, io, IoDirection::Read)?;
            built.push(SynthesizedDecl::new(DeclKind::Read));
        }
        Ok(built)
    }

    fn needs_io_function(&self, type_sym: SymbolRef, ty: TypeRef, direction: IoDirection) -> Result<bool, SynthesisError> {
        let memo = match direction {
            IoDirection::Write => &self.memo.write,
            IoDirection::Read => &self.memo.read,
        };
        if memo.contains(&ty) {
            return Ok(false);
        }
        let type_name = self.name(type_sym);
        let existing = function_exists(
            self,
            direction.fn_name(),
            Some(2),
            None,
            Some(STREAM_TYPE_NAME),
            Some(type_name),
        )?;
        if existing.is_some() {
            debug!("DefaultIo: {} already has '{}'", type_name, direction.fn_name());
        }
        Ok(existing.is_none())
    }

    /// The prelude's stream handle type.
    fn stream_type(&self) -> Result<TypeRef, SynthesisError> {
        let prelude = self.prelude.ok_or(SynthesisError::MissingModule {
            which: "prelude",
            location: SourceLoc::builtin(),
        })?;
        let missing = || SynthesisError::MissingStreamType {
            name: STREAM_TYPE_NAME.to_string(),
            location: self.symbols.get(prelude).loc,
        };
        let sym = self
            .symbols
            .lookup(NameId::new(STREAM_TYPE_NAME), self.module_scope(prelude))
            .ok_or_else(missing)?;
        self.symbols.get(sym).type_definition().ok_or_else(missing)
    }

    fn build_io_function(
        &mut self,
        type_sym: SymbolRef,
        ty: TypeRef,
        io: &dyn DefaultIoProvider,
        direction: IoDirection,
    ) -> Result<SymbolRef, SynthesisError> {
        let stream_ty = self.stream_type()?;
        let entry = self.symbols.get(type_sym);
        let (type_name, loc) = (entry.name, entry.loc);
        let fn_name = direction.fn_name();

        let func = self.new_function(fn_name, self.types.type_void, loc);
        self.symbols.get_mut(func).cname = NameId::new(format!("_auto_{}_{}", type_name, fn_name));
        let stream = self.add_formal(func, "f", Intent::Blank, stream_ty);
        let value_intent = match direction {
            IoDirection::Write => Intent::Blank,
            IoDirection::Read => Intent::InOut,
        };
        let value = self.add_formal(func, "val", value_intent, ty);

        let stmts = match direction {
            IoDirection::Write => io.build_default_write_body(self, ty, stream, value),
            IoDirection::Read => io.build_default_read_body(self, ty, stream, value),
        };
        let body = self.fn_body(func);
        for stmt in stmts {
            self.ast.insert_at_tail(body, stmt);
        }

        self.splice_before_type(type_sym, self.def_of(func), loc)?;
        match direction {
            IoDirection::Write => self.memo.write.insert(ty),
            IoDirection::Read => self.memo.read.insert(ty),
        };
        debug!("DefaultIo: built '{}' for {}", fn_name, type_name);
        Ok(func)
    }
}
