use hashbrown::HashMap;

use super::synthesis_common::{TestProgram, dump_module, setup_program};
use crate::ast::NameId;
use crate::ast::dumper::AstDumper;
use crate::semantic::{Intent, SymbolKind, SymbolRef, SynthesisError, TypeKind};

/// `fn f(a: int, b: bool = true): int { return a; }` in the user module.
fn define_target(program: &mut TestProgram) -> SymbolRef {
    let (int, boolean) = (program.ctx.types.type_int, program.ctx.types.type_bool);
    let func = program.define_function("f", int, 10);
    let a = program.ctx.add_formal(func, "a", Intent::Blank, int);
    let b = program.ctx.add_formal(func, "b", Intent::Blank, boolean);

    let ctx = &mut program.ctx;
    let loc = ctx.symbols.get(func).loc;
    let default = ctx.ast.bool_literal(true, loc);
    ctx.ast.set_init(ctx.def_of(b), default);
    let value = ctx.ast.sym_ref(a, loc);
    let ret = ctx.ast.return_stmt(Some(value), loc);
    ctx.ast.insert_at_tail(ctx.fn_body(func), ret);
    func
}

fn dump(program: &TestProgram, func: SymbolRef) -> String {
    AstDumper::dump_stmt_to_string(&program.ctx, program.ctx.def_of(func))
}

#[test]
fn order_wrapper_takes_actuals_in_call_order() {
    let mut program = setup_program();
    let func = define_target(&mut program);

    let wrapper = program.ctx.order_wrapper(func, &[1, 0]).unwrap();
    insta::assert_snapshot!(dump(&program, wrapper), @r"
    fn f(b: bool = true, a: int): int {
      return f(a, b);
    }
    ");
    assert_eq!(program.ctx.symbols.get(wrapper).cname.as_str(), "_order_wrap_f");

    // placed right after the wrapped function
    let names: Vec<_> = program
        .ctx
        .ast
        .block_stmts(program.ctx.module_stmts(program.user))
        .iter()
        .filter_map(|&stmt| program.ctx.ast.def_data(stmt))
        .map(|data| program.ctx.symbols.get(data.sym).cname.as_str())
        .collect();
    assert_eq!(names, vec!["f", "_order_wrap_f"]);
}

#[test]
fn order_wrapper_rejects_non_permutations() {
    let mut program = setup_program();
    let func = define_target(&mut program);

    for order in [&[0, 0][..], &[0][..], &[0, 2][..]] {
        let err = program.ctx.order_wrapper(func, order).unwrap_err();
        assert!(matches!(err, SynthesisError::InvalidArgumentOrder { expected: 2, .. }));
    }
    assert_eq!(program.ctx.ast.block_stmts(program.ctx.module_stmts(program.user)).len(), 1);
}

#[test]
fn coercion_wrapper_casts_to_declared_type() {
    let mut program = setup_program();
    let func = define_target(&mut program);
    let int = program.ctx.types.type_int;

    let wrapper = program.ctx.coercion_wrapper(func, &[(1, int)]).unwrap();
    insta::assert_snapshot!(dump(&program, wrapper), @r"
    fn f(a: int, b: int = true): int {
      return f(a, cast<bool>(b));
    }
    ");

    let err = program.ctx.coercion_wrapper(func, &[(5, int)]).unwrap_err();
    assert!(matches!(err, SynthesisError::UnknownFormal { index: 5, .. }));
}

#[test]
fn default_wrapper_evaluates_omitted_defaults() {
    let mut program = setup_program();
    let func = define_target(&mut program);

    let wrapper = program.ctx.default_wrapper(func, &[1]).unwrap();
    insta::assert_snapshot!(dump(&program, wrapper), @r"
    fn f(a: int): int {
      const _default_b: bool = true;
      return f(a, _default_b);
    }
    ");

    let local = program
        .ctx
        .symbols
        .lookup(NameId::new("_default_b"), program.ctx.symbols.function(wrapper).unwrap().param_scope);
    assert!(local.is_some());
}

#[test]
fn void_function_wrapper_calls_without_return() {
    let mut program = setup_program();
    let (void, int) = (program.ctx.types.type_void, program.ctx.types.type_int);
    let func = program.define_function("log", void, 4);
    program.ctx.add_formal(func, "level", Intent::Const, int);

    let wrapper = program.ctx.coercion_wrapper(func, &[]).unwrap();
    insta::assert_snapshot!(dump(&program, wrapper), @r"
    fn log(const level: int): void {
      log(level);
    }
    ");
}

#[test]
fn generic_instantiation_is_cached_per_substitution() {
    let mut program = setup_program();
    let ctx = &mut program.ctx;
    let unknown = ctx.types.type_unknown;
    let elt = ctx.types.alloc(NameId::new("T"), TypeKind::Variable { bound: unknown });
    let (int, boolean) = (ctx.types.type_int, ctx.types.type_bool);

    let func = program.define_function("identity", elt, 6);
    let formal = program.ctx.add_formal(func, "x", Intent::Blank, elt);
    let ctx = &mut program.ctx;
    if let SymbolKind::Param(param) = &mut ctx.symbols.get_mut(formal).kind {
        param.is_generic = true;
    }
    let loc = ctx.symbols.get(func).loc;
    let value = ctx.ast.sym_ref(formal, loc);
    let ret = ctx.ast.return_stmt(Some(value), loc);
    ctx.ast.insert_at_tail(ctx.fn_body(func), ret);

    let to_int = HashMap::from([(elt, int)]);
    let first = ctx.instantiate_generic(func, &to_int);
    let again = ctx.instantiate_generic(func, &to_int);
    let to_bool = HashMap::from([(elt, boolean)]);
    let other = ctx.instantiate_generic(func, &to_bool);

    assert_eq!(first, again);
    assert_ne!(first, other);
    assert_eq!(ctx.symbols.get(first).cname.as_str(), "identity_inst1");
    assert_eq!(ctx.symbols.get(other).cname.as_str(), "identity_inst2");
    assert_eq!(ctx.symbols.function(first).unwrap().ret_type, int);

    let instance_formal = ctx.formal_symbols(first)[0];
    assert_ne!(instance_formal, formal);
    assert_eq!(ctx.symbols.get(instance_formal).ty, int);
    assert!(!ctx.symbols.get(instance_formal).as_param().unwrap().is_generic);
    assert!(ctx.symbols.get(formal).as_param().unwrap().is_generic);

    insta::assert_snapshot!(dump_module(&program.ctx, program.user), @r"
    module M
      fn identity(x: T): T {
        return x;
      }
      fn identity(x: bool): bool {
        return x;
      }
      fn identity(x: int): int {
        return x;
      }
    ");
}
