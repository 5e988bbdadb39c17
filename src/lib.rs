//! Semantic synthesis stage of a compiler for a high-level parallel language.
//!
//! Takes a parsed and scope-resolved program and fills in what the source
//! leaves implicit: field accessors, default constructors, structural
//! comparison and assignment for value types, default IO routines and the
//! program entry point.

/// Contains the AST arena, its mutation primitives and the dumper.
pub mod ast;
/// Contains the diagnostic engine and formatter.
pub mod diagnostic;
/// Contains the synthesis driver.
pub mod driver;
pub mod lang_options;
/// Contains the symbol model and synthesis passes.
pub mod semantic;
pub mod source_manager;
