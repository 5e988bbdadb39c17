//! Common utilities for synthesis tests.
//!
//! Builds the small programs the tests run synthesis over: a prelude holding
//! the `file` stream type, a common module and one user module.
use std::path::Path;

use crate::ast::dumper::AstDumper;
use crate::lang_options::SynthesisOptions;
use crate::semantic::{ClassTag, CompilationContext, ConsClass, ModType, SymbolRef, TypeRef};
use crate::source_manager::SourceLoc;

pub struct TestProgram {
    pub ctx: CompilationContext,
    pub prelude: SymbolRef,
    pub common: SymbolRef,
    pub user: SymbolRef,
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Location on `line` of the test source file.
pub fn loc(ctx: &mut CompilationContext, line: u32) -> SourceLoc {
    let id = ctx.sources.add_file(Path::new("test.kl"));
    SourceLoc::new(id, line)
}

pub fn setup_program() -> TestProgram {
    setup_program_with(SynthesisOptions::default())
}

pub fn setup_program_with(options: SynthesisOptions) -> TestProgram {
    init_logger();
    let mut ctx = CompilationContext::new(options);

    let prelude = ctx.new_module("Prelude", ModType::Internal, SourceLoc::builtin());
    ctx.set_prelude(prelude);
    ctx.define_primitive_type(ctx.module_stmts(prelude), "file", SourceLoc::builtin());

    let common = ctx.new_module("Common", ModType::Common, SourceLoc::builtin());
    ctx.set_common(common);

    let user_loc = loc(&mut ctx, 1);
    let user = ctx.new_module("M", ModType::User, user_loc);
    ctx.add_module_use(user, common);

    TestProgram {
        ctx,
        prelude,
        common,
        user,
    }
}

/// Field of type `ty` whose declared type is written out.
pub fn add_typed_field(ctx: &mut CompilationContext, type_sym: SymbolRef, name: &str, ty: TypeRef, line: u32) -> SymbolRef {
    let field_loc = loc(ctx, line);
    let field = ctx.add_field(type_sym, name, ty, ConsClass::Var, field_loc);
    let type_expr = ctx.type_expr(ty, field_loc);
    ctx.ast.set_type_expr(ctx.def_of(field), type_expr);
    field
}

/// `<tag> Point { var x: int; var y: int; }` in the user module.
pub fn define_point(program: &mut TestProgram, class_tag: ClassTag) -> SymbolRef {
    let ctx = &mut program.ctx;
    let point_loc = loc(ctx, 3);
    let point = ctx.define_structured_type(ctx.module_stmts(program.user), "Point", class_tag, point_loc);
    let int = ctx.types.type_int;
    add_typed_field(ctx, point, "x", int, 4);
    add_typed_field(ctx, point, "y", int, 5);
    point
}

pub fn dump_module(ctx: &CompilationContext, module: SymbolRef) -> String {
    AstDumper::dump_module(ctx, module)
}

/// Names of the functions defined directly in a module, in order.
pub fn function_names(ctx: &CompilationContext, module: SymbolRef) -> Vec<String> {
    ctx.ast
        .block_stmts(ctx.module_stmts(module))
        .iter()
        .filter_map(|&stmt| ctx.ast.def_data(stmt))
        .filter(|data| ctx.symbols.get(data.sym).is_function())
        .map(|data| ctx.name(data.sym).to_string())
        .collect()
}

impl TestProgram {
    /// Structured type declared at the end of the user module.
    pub fn define_type(&mut self, name: &str, class_tag: ClassTag, line: u32) -> SymbolRef {
        let type_loc = loc(&mut self.ctx, line);
        let stmts = self.ctx.module_stmts(self.user);
        self.ctx.define_structured_type(stmts, name, class_tag, type_loc)
    }

    /// Function defined at the end of the user module.
    pub fn define_function(&mut self, name: &str, ret_type: TypeRef, line: u32) -> SymbolRef {
        let fn_loc = loc(&mut self.ctx, line);
        let stmts = self.ctx.module_stmts(self.user);
        self.ctx.define_function(stmts, name, ret_type, fn_loc)
    }
}
