//! Function existence queries.
//!
//! Synthesis asks "is there already a function like this?" before fabricating
//! a declaration. The query runs before type inference, so a formal's type is
//! matched by name against both its resolved type and its declared type
//! expression.

use log::debug;

use crate::ast::{NodeKind, NodeRef};

use super::context::CompilationContext;
use super::error::SynthesisError;
use super::symbol_table::SymbolRef;

/// Name of the program entry point. Duplicates of it are an error rather
/// than an overload set.
pub const ENTRY_POINT_NAME: &str = "main";

/// Filter over all functions defined in the program tree.
#[derive(Debug, Clone, Copy)]
pub struct FunctionQuery<'a> {
    name: &'a str,
    formal_count: Option<usize>,
    type_binding: Option<SymbolRef>,
    formal_types: [Option<&'a str>; 2],
}

impl<'a> FunctionQuery<'a> {
    pub fn named(name: &'a str) -> Self {
        FunctionQuery {
            name,
            formal_count: None,
            type_binding: None,
            formal_types: [None, None],
        }
    }

    /// Require exactly `count` formals.
    pub fn with_formals(mut self, count: usize) -> Self {
        self.formal_count = Some(count);
        self
    }

    /// Require a method bound to the given type symbol.
    pub fn bound_to(mut self, type_sym: SymbolRef) -> Self {
        self.type_binding = Some(type_sym);
        self
    }

    pub fn first_formal_type(mut self, type_name: &'a str) -> Self {
        self.formal_types[0] = Some(type_name);
        self
    }

    pub fn second_formal_type(mut self, type_name: &'a str) -> Self {
        self.formal_types[1] = Some(type_name);
        self
    }

    /// Find the matching function.
    ///
    /// The first match wins, except for the entry point, where a second
    /// match is a user error naming the first one.
    pub fn run(&self, ctx: &CompilationContext) -> Result<Option<SymbolRef>, SynthesisError> {
        let mut matches = ctx.collect_functions().into_iter().filter(|&func| self.matches(ctx, func));
        let Some(first) = matches.next() else {
            debug!("FunctionQuery: no function matches {:?}", self);
            return Ok(None);
        };
        if self.name == ENTRY_POINT_NAME
            && let Some(second) = matches.next()
        {
            let first_loc = ctx.symbols.get(first).loc;
            return Err(SynthesisError::MainMultiplyDefined {
                location: ctx.symbols.get(second).loc,
                first: first_loc,
                first_described: ctx.sources.describe(first_loc),
            });
        }
        debug!("FunctionQuery: '{}' matched symbol {}", self.name, first.get());
        Ok(Some(first))
    }

    fn matches(&self, ctx: &CompilationContext, func: SymbolRef) -> bool {
        let entry = ctx.symbols.get(func);
        let Some(data) = entry.as_function() else {
            return false;
        };
        if entry.name.as_str() != self.name {
            return false;
        }
        if let Some(count) = self.formal_count
            && data.formals.len() != count
        {
            return false;
        }
        if self.type_binding.is_some() && data.type_binding != self.type_binding {
            return false;
        }
        self.formal_types.iter().enumerate().all(|(index, expected)| match expected {
            None => true,
            Some(expected) => data
                .formals
                .get(index)
                .is_some_and(|&formal| formal_has_type(ctx, formal, expected)),
        })
    }
}

/// Whether a formal is of the named type, by resolved type or, failing
/// that, by the name its declared type expression refers to.
pub fn formal_has_type(ctx: &CompilationContext, formal: NodeRef, type_name: &str) -> bool {
    let Some(data) = ctx.ast.def_data(formal) else {
        return false;
    };
    if ctx.type_name(ctx.symbols.get(data.sym).ty) == type_name {
        return true;
    }
    match data.type_expr.map(|expr| ctx.ast.get_kind(expr)) {
        Some(NodeKind::SymRef(named)) => ctx.name(*named) == type_name,
        _ => false,
    }
}

/// Positional form of [`FunctionQuery`].
pub fn function_exists(
    ctx: &CompilationContext,
    name: &str,
    formal_count: Option<usize>,
    type_binding: Option<SymbolRef>,
    first_formal_type: Option<&str>,
    second_formal_type: Option<&str>,
) -> Result<Option<SymbolRef>, SynthesisError> {
    let mut query = FunctionQuery::named(name);
    query.formal_count = formal_count;
    query.type_binding = type_binding;
    query.formal_types = [first_formal_type, second_formal_type];
    query.run(ctx)
}
