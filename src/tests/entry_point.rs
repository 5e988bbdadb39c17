use super::synthesis_common::{dump_module, loc, setup_program};
use crate::semantic::{Intent, ModType, SynthesisError};

#[test]
fn main_is_fabricated_in_the_only_user_module() {
    let mut program = setup_program();
    let stmt_loc = loc(&mut program.ctx, 2);
    let callee = program.ctx.unresolved("writeln", stmt_loc);
    let greeting = program.ctx.ast.string_literal("hello", stmt_loc);
    let call = program.ctx.ast.call(callee, [greeting], stmt_loc);
    let stmt = program.ctx.ast.expr_stmt(call, stmt_loc);
    let stmts = program.ctx.module_stmts(program.user);
    program.ctx.ast.insert_at_tail(stmts, stmt);

    let entry = program.ctx.build_main().unwrap();
    assert!(entry.fabricated);
    assert_eq!(entry.module, program.user);
    assert_eq!(program.ctx.entry_point, Some(entry));

    insta::assert_snapshot!(dump_module(&program.ctx, program.user), @r#"
    module M
      fn main(): void {
        __init_Prelude();
        __init_Common();
        __init_M();
      }
      fn __init_M(): void {
        writeln("hello");
      }
    "#);
}

#[test]
fn user_main_runs_after_module_initializers() {
    let mut program = setup_program();
    let void = program.ctx.types.type_void;
    let main_fn = program.define_function("main", void, 7);
    let body_loc = loc(&mut program.ctx, 8);
    let callee = program.ctx.unresolved("run", body_loc);
    let call = program.ctx.ast.call(callee, [], body_loc);
    let stmt = program.ctx.ast.expr_stmt(call, body_loc);
    program.ctx.ast.insert_at_tail(program.ctx.fn_body(main_fn), stmt);

    let entry = program.ctx.build_main().unwrap();
    assert!(!entry.fabricated);
    assert_eq!(entry.main_fn, main_fn);

    insta::assert_snapshot!(dump_module(&program.ctx, program.user), @r"
    module M
      fn main(): void {
        __init_Prelude();
        __init_Common();
        __init_M();
        run();
      }
      fn __init_M(): void {}
    ");
}

#[test]
fn second_wiring_keeps_a_single_set_of_init_calls() {
    let mut program = setup_program();
    let first = program.ctx.build_main().unwrap();
    let again = program.ctx.build_main().unwrap();
    assert_eq!(first, again);

    insta::assert_snapshot!(dump_module(&program.ctx, program.user), @r"
    module M
      fn main(): void {
        __init_Prelude();
        __init_Common();
        __init_M();
      }
      fn __init_M(): void {}
    ");
}

#[test]
fn module_initializer_is_created_once() {
    let mut program = setup_program();
    let first = program.ctx.module_init_fn(program.common);
    let second = program.ctx.module_init_fn(program.common);
    assert_eq!(first, second);
    assert_eq!(program.ctx.name(first), "__init_Common");
    let stmts = program.ctx.module_stmts(program.common);
    assert_eq!(program.ctx.ast.block_stmts(stmts).len(), 1);
}

#[test]
fn several_user_modules_need_an_explicit_main() {
    let mut program = setup_program();
    let second_loc = loc(&mut program.ctx, 40);
    program.ctx.new_module("N", ModType::User, second_loc);

    let err = program.ctx.build_main().unwrap_err();
    assert_eq!(err, SynthesisError::MultipleModulesNoMain { location: second_loc });
    assert!(!err.is_internal());
    assert_eq!(err.to_string(), "Code defines multiple modules but no main function.");
}

#[test]
fn program_without_user_module_cannot_get_main() {
    let mut program = setup_program();
    program.ctx.modules.retain(|&m| m != program.user);

    let err = program.ctx.build_main().unwrap_err();
    assert!(matches!(err, SynthesisError::NoUserModule { .. }));
}

#[test]
fn duplicate_main_names_first_occurrence() {
    let mut program = setup_program();
    let void = program.ctx.types.type_void;
    let first = program.define_function("main", void, 7);

    let other_loc = loc(&mut program.ctx, 30);
    let other = program.ctx.new_module("N", ModType::User, other_loc);
    let second_loc = loc(&mut program.ctx, 31);
    let stmts = program.ctx.module_stmts(other);
    let second = program.ctx.define_function(stmts, "main", void, second_loc);

    let err = program.ctx.build_main().unwrap_err();
    assert_eq!(err.location(), program.ctx.symbols.get(second).loc);
    assert_eq!(err.related(), Some(program.ctx.symbols.get(first).loc));
    assert_eq!(err.to_string(), "main multiply defined -- first occurrence at test.kl:7");
}

#[test]
fn main_with_formals_is_not_the_entry_point() {
    let mut program = setup_program();
    let (void, int) = (program.ctx.types.type_void, program.ctx.types.type_int);
    let with_args = program.define_function("main", void, 7);
    program.ctx.add_formal(with_args, "argc", Intent::Blank, int);

    let entry = program.ctx.build_main().unwrap();
    assert!(entry.fabricated);
    assert_ne!(entry.main_fn, with_args);
}

#[test]
fn main_outside_user_module_is_internal_error() {
    let mut program = setup_program();
    let void = program.ctx.types.type_void;
    let main_loc = loc(&mut program.ctx, 3);
    let stmts = program.ctx.module_stmts(program.prelude);
    program.ctx.define_function(stmts, "main", void, main_loc);

    let err = program.ctx.build_main().unwrap_err();
    assert!(matches!(err, SynthesisError::MainInNonUserModule { .. }));
    assert!(err.is_internal());
}

#[test]
fn common_module_is_required() {
    let mut program = setup_program();
    program.ctx.common = None;

    let err = program.ctx.build_main().unwrap_err();
    assert!(matches!(err, SynthesisError::MissingModule { which: "common", .. }));
}
