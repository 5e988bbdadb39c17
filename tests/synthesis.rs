//! End-to-end synthesis runs through the driver.

use std::path::Path;

use klepon::ast::dumper::AstDumper;
use klepon::driver::{PipelineError, SynthesisDriver};
use klepon::semantic::{ClassTag, CompilationContext, ConsClass, ModType, StructuralIo, SymbolRef, TypeRef};
use klepon::source_manager::{SourceId, SourceLoc};

struct Program {
    ctx: CompilationContext,
    user: SymbolRef,
    file: SourceId,
}

fn setup() -> Program {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut ctx = CompilationContext::default();
    let file = ctx.sources.add_file(Path::new("shapes.kl"));

    let prelude = ctx.new_module("Prelude", ModType::Internal, SourceLoc::builtin());
    ctx.set_prelude(prelude);
    let prelude_stmts = ctx.module_stmts(prelude);
    ctx.define_primitive_type(prelude_stmts, "file", SourceLoc::builtin());
    let common = ctx.new_module("Common", ModType::Common, SourceLoc::builtin());
    ctx.set_common(common);

    let user = ctx.new_module("Shapes", ModType::User, SourceLoc::new(file, 1));
    Program { ctx, user, file }
}

fn typed_field(program: &mut Program, owner: SymbolRef, name: &str, ty: TypeRef, line: u32) {
    let loc = SourceLoc::new(program.file, line);
    let field = program.ctx.add_field(owner, name, ty, ConsClass::Var, loc);
    let type_expr = program.ctx.type_expr(ty, loc);
    let def = program.ctx.def_of(field);
    program.ctx.ast.set_type_expr(def, type_expr);
}

fn module_def_names(program: &Program) -> Vec<&'static str> {
    let ctx = &program.ctx;
    ctx.ast
        .block_stmts(ctx.module_stmts(program.user))
        .iter()
        .filter_map(|&stmt| ctx.ast.def_data(stmt))
        .map(|data| ctx.name(data.sym))
        .collect()
}

fn define(program: &mut Program, name: &str, class_tag: ClassTag, line: u32) -> SymbolRef {
    let stmts = program.ctx.module_stmts(program.user);
    let loc = SourceLoc::new(program.file, line);
    program.ctx.define_structured_type(stmts, name, class_tag, loc)
}

#[test]
fn whole_program_synthesis() {
    let mut program = setup();
    let int = program.ctx.types.type_int;
    let point = define(&mut program, "Point", ClassTag::Record, 2);
    typed_field(&mut program, point, "x", int, 3);
    typed_field(&mut program, point, "y", int, 4);
    let node = define(&mut program, "Node", ClassTag::Class, 6);
    typed_field(&mut program, node, "value", int, 7);

    let mut driver = SynthesisDriver::new();
    let report = driver.run(&mut program.ctx, &StructuralIo).unwrap();

    assert!(!driver.diagnostics().has_errors());
    assert_eq!(report.total(), 15);
    insta::assert_yaml_snapshot!(&report, @r"
    entry_point: main
    fabricated_main: true
    types:
      Point:
        - kind: Setter
          target: x
        - kind: Getter
          target: x
        - kind: Setter
          target: y
        - kind: Getter
          target: y
        - kind: Constructor
        - kind: Equality
        - kind: Inequality
        - kind: Assignment
        - kind: Write
        - kind: Read
      Node:
        - kind: Setter
          target: value
        - kind: Getter
          target: value
        - kind: Constructor
        - kind: Write
        - kind: Read
    ");

    let main_fn = program.ctx.entry_point.unwrap().main_fn;
    let main_def = program.ctx.def_of(main_fn);
    insta::assert_snapshot!(AstDumper::dump_stmt_to_string(&program.ctx, main_def), @r"
    fn main(): void {
      __init_Prelude();
      __init_Common();
      __init_Shapes();
    }
    ");
}

#[test]
fn rerun_synthesizes_nothing_new() {
    let mut program = setup();
    let int = program.ctx.types.type_int;
    let point = define(&mut program, "Point", ClassTag::Record, 2);
    typed_field(&mut program, point, "x", int, 3);

    let mut driver = SynthesisDriver::new();
    driver.run(&mut program.ctx, &StructuralIo).unwrap();
    let stmts = program.ctx.module_stmts(program.user);
    let before = program.ctx.ast.block_stmts(stmts).len();

    let point_report = program.ctx.build_default_class_methods(point).unwrap();
    let io_report = program.ctx.build_default_io_functions(point, &StructuralIo).unwrap();
    assert!(point_report.is_empty());
    assert!(io_report.is_empty());
    assert_eq!(program.ctx.ast.block_stmts(stmts).len(), before);
}

#[test]
fn io_functions_follow_default_methods() {
    let mut program = setup();
    let int = program.ctx.types.type_int;
    let point = define(&mut program, "Point", ClassTag::Record, 2);
    typed_field(&mut program, point, "x", int, 3);

    SynthesisDriver::new().run(&mut program.ctx, &StructuralIo).unwrap();
    assert_eq!(
        module_def_names(&program),
        vec!["x", "x", "_construct_Point", "==", "!=", "=", "fwrite", "fread", "Point", "main", "__init_Shapes"]
    );
}

#[test]
fn second_driver_run_wires_main_once() {
    let mut program = setup();
    let int = program.ctx.types.type_int;
    let point = define(&mut program, "Point", ClassTag::Record, 2);
    typed_field(&mut program, point, "x", int, 3);

    let mut driver = SynthesisDriver::new();
    let first = driver.run(&mut program.ctx, &StructuralIo).unwrap();
    let names = module_def_names(&program);
    let second = driver.run(&mut program.ctx, &StructuralIo).unwrap();

    assert_eq!(first.total(), 8);
    assert_eq!(second.total(), 0);
    assert_eq!(second.entry_point, "main");
    assert_eq!(module_def_names(&program), names);

    let main_def = program.ctx.def_of(program.ctx.entry_point.unwrap().main_fn);
    insta::assert_snapshot!(AstDumper::dump_stmt_to_string(&program.ctx, main_def), @r"
    fn main(): void {
      __init_Prelude();
      __init_Common();
      __init_Shapes();
    }
    ");
}

#[test]
fn failed_run_reports_diagnostic() {
    let mut program = setup();
    let second = SourceLoc::new(program.file, 20);
    program.ctx.new_module("Extra", ModType::User, second);

    let mut driver = SynthesisDriver::new();
    let err = driver.run(&mut program.ctx, &StructuralIo).unwrap_err();

    assert_eq!(err, PipelineError::Fatal);
    assert!(driver.diagnostics().has_errors());
    assert_eq!(
        driver.format_diagnostics(&program.ctx.sources),
        "error: Code defines multiple modules but no main function. at shapes.kl:20"
    );
    assert_eq!(program.ctx.entry_point, None);
}
