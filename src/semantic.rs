//! Semantic synthesis.
//!
//! This module owns the symbol model shared by every later pass and the
//! synthesis stage that completes a parsed program with the declarations it
//! never writes: accessors, default constructors, structural comparison and
//! assignment, default IO routines and the program entry point.
//!
//! The stage works on a snapshot of the program: the list of types to
//! process is collected once, up front, so declarations inserted while
//! processing one type are never visited as if they were user code.

pub mod builder;
pub mod context;
pub mod default_io;
pub mod default_methods;
pub mod entry_point;
pub mod error;
pub mod function_query;
pub mod modules;
pub mod output;
pub mod symbol_table;
pub mod type_registry;
pub mod types;
pub mod wrappers;

use log::debug;

// Re-export key types for public API
pub use context::{CompilationContext, CopyMap};
pub use default_io::{DefaultIoProvider, StructuralIo};
pub use entry_point::EntryPoint;
pub use error::SynthesisError;
pub use function_query::{FunctionQuery, function_exists};
pub use output::{DeclKind, SynthesisReport, SynthesizedDecl};
pub use symbol_table::{
    ConsClass, FnClass, Intent, MethodType, ModType, ScopeId, SymbolEntry, SymbolFlags, SymbolKind, SymbolRef,
    SymbolTable,
};
pub use type_registry::TypeRegistry;
pub use types::{ClassTag, StructuredType, Type, TypeKind, TypeRef};

/// Run the synthesis stage over the whole program.
///
/// Wires the entry point first, then visits every type the program declares
/// at this point: default methods for structured types, then default IO for
/// any type the provider supports. The first error aborts the stage.
pub fn build_default_functions(
    ctx: &mut CompilationContext,
    io: &dyn DefaultIoProvider,
) -> Result<SynthesisReport, SynthesisError> {
    let entry = ctx.build_main()?;
    let mut report = SynthesisReport {
        entry_point: ctx.name(entry.main_fn).to_string(),
        fabricated_main: entry.fabricated,
        ..Default::default()
    };

    let type_symbols = ctx.collect_type_symbols();
    debug!("build_default_functions: {} type symbols to visit", type_symbols.len());
    for type_sym in type_symbols {
        let mut built = ctx.build_default_class_methods(type_sym)?;
        built.extend(ctx.build_default_io_functions(type_sym, io)?);
        report.record(ctx.name(type_sym), built);
    }
    Ok(report)
}
