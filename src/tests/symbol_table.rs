use super::synthesis_common::{define_point, loc, setup_program};
use crate::ast::{Callee, NameId, NodeKind};
use crate::semantic::{ClassTag, CopyMap, Intent, SymbolEntry, SymbolKind, SynthesisError, TypeKind};
use crate::source_manager::SourceLoc;

#[test]
fn same_named_functions_chain_as_overloads() {
    let mut program = setup_program();
    let int = program.ctx.types.type_int;
    let first = program.define_function("area", int, 2);
    let second = program.define_function("area", int, 3);

    let ctx = &program.ctx;
    assert_eq!(ctx.symbols.get(second).overload, Some(first));
    assert_eq!(ctx.symbols.get(first).overload, None);
    let scope = ctx.module_scope(program.user);
    assert_eq!(ctx.symbols.lookup(NameId::new("area"), scope), Some(second));
}

#[test]
fn lookup_walks_to_enclosing_scope() {
    let mut program = setup_program();
    let int = program.ctx.types.type_int;
    let func = program.define_function("twice", int, 2);
    let formal = program.ctx.add_formal(func, "n", Intent::Blank, int);

    let ctx = &mut program.ctx;
    let module_scope = ctx.module_scope(program.user);
    let inner = ctx.symbols.push_scope(Some(module_scope), Some(func));
    let param_scope = ctx.symbols.function(func).unwrap().param_scope;
    ctx.symbols.get_scope_mut(inner).symbols.insert(NameId::new("n"), formal);

    assert_eq!(ctx.symbols.lookup(NameId::new("twice"), inner), Some(func));
    assert_eq!(ctx.symbols.lookup(NameId::new("n"), param_scope), Some(formal));
    assert_eq!(ctx.symbols.lookup(NameId::new("nothing"), inner), None);
}

#[test]
fn enum_constants_count_from_last_explicit_value() {
    let mut program = setup_program();
    let enum_loc = loc(&mut program.ctx, 2);
    let stmts = program.ctx.module_stmts(program.user);
    let color = program.ctx.define_enum(
        stmts,
        "Color",
        &[("red", None), ("green", Some(5)), ("blue", None)],
        enum_loc,
    );

    let ctx = &program.ctx;
    let ty = ctx.symbols.get(color).type_definition().unwrap();
    let TypeKind::Enum { constants, .. } = &ctx.types.get(ty).kind else {
        panic!("Color is not an enum");
    };
    let values: Vec<i64> = constants
        .iter()
        .map(|&c| match ctx.symbols.get(c).kind {
            SymbolKind::EnumConstant { value, .. } => value,
            _ => panic!("not an enum constant"),
        })
        .collect();
    assert_eq!(values, vec![0, 5, 6]);
}

#[test]
fn enum_constant_at_integer_limit() {
    let mut program = setup_program();
    let enum_loc = loc(&mut program.ctx, 2);
    let stmts = program.ctx.module_stmts(program.user);
    let big = program.ctx.define_enum(stmts, "Big", &[("top", Some(i64::MAX)), ("wrapped", None)], enum_loc);

    let ctx = &program.ctx;
    let ty = ctx.symbols.get(big).type_definition().unwrap();
    let TypeKind::Enum { constants, .. } = &ctx.types.get(ty).kind else {
        panic!("Big is not an enum");
    };
    assert!(matches!(ctx.symbols.get(constants[0]).kind, SymbolKind::EnumConstant { value: i64::MAX, .. }));
    assert!(matches!(ctx.symbols.get(constants[1]).kind, SymbolKind::EnumConstant { value: i64::MIN, .. }));
}

#[test]
fn forwarding_resolves_to_final_target() {
    let mut program = setup_program();
    let int = program.ctx.types.type_int;
    let target = program.define_function("target", int, 2);

    let ctx = &mut program.ctx;
    let hop = ctx.symbols.add(SymbolEntry::new(
        NameId::new("alias"),
        ctx.types.type_unknown,
        SourceLoc::builtin(),
        SymbolKind::Forwarding {
            forward: target,
            renamed: true,
        },
    ));
    let outer = ctx.symbols.add(SymbolEntry::new(
        NameId::new("alias2"),
        ctx.types.type_unknown,
        SourceLoc::builtin(),
        SymbolKind::Forwarding {
            forward: hop,
            renamed: true,
        },
    ));

    assert_eq!(ctx.symbols.resolve_forward(outer), target);
    assert_eq!(ctx.symbols.type_info(outer), int);
    assert_eq!(ctx.symbols.fn_symbol(outer), Some(target));
    assert_eq!(ctx.symbols.fn_symbol(ctx.nil), None);
}

#[test]
fn tuple_types_are_canonical() {
    let mut program = setup_program();
    let (int, boolean) = (program.ctx.types.type_int, program.ctx.types.type_bool);

    let first = program.ctx.lookup_or_define_tuple_type_symbol(&[int, boolean]).unwrap();
    let again = program.ctx.lookup_or_define_tuple_type_symbol(&[int, boolean]).unwrap();
    let other = program.ctx.lookup_or_define_tuple_type_symbol(&[boolean, int]).unwrap();

    let ctx = &program.ctx;
    assert_eq!(first, again);
    assert_ne!(first, other);
    assert_eq!(ctx.name(first), "_tuple2");
    assert_eq!(ctx.symbols.get(first).cname.as_str(), "_tuple2_int_bool");

    // defined once, at the end of the prelude
    let prelude_stmts = ctx.ast.block_stmts(ctx.module_stmts(program.prelude));
    let tuple_defs = prelude_stmts
        .iter()
        .filter(|&&stmt| ctx.ast.def_data(stmt).is_some_and(|d| d.sym == first))
        .count();
    assert_eq!(tuple_defs, 1);
    assert_eq!(prelude_stmts.last().copied(), ctx.symbols.get(other).def_point);
}

#[test]
fn tuple_types_need_a_prelude() {
    let mut ctx = crate::semantic::CompilationContext::default();
    let int = ctx.types.type_int;
    let err = ctx.lookup_or_define_tuple_type_symbol(&[int]).unwrap_err();
    assert!(matches!(err, SynthesisError::MissingModule { which: "prelude", .. }));
}

#[test]
fn type_symbol_snapshot_ignores_later_additions() {
    let mut program = setup_program();
    let point = define_point(&mut program, ClassTag::Record);

    let before = program.ctx.collect_type_symbols();
    let names: Vec<&str> = before.iter().map(|&t| program.ctx.name(t)).collect();
    assert_eq!(names, vec!["file", "Point"]);

    program.define_type("Later", ClassTag::Class, 9);
    assert_eq!(before.len(), 2);
    assert_eq!(program.ctx.collect_type_symbols().len(), 3);
    assert!(before.contains(&point));
}

#[test]
fn copy_redirects_inner_references_only() {
    let mut program = setup_program();
    let int = program.ctx.types.type_int;
    let func = program.define_function("identity", int, 2);
    let formal = program.ctx.add_formal(func, "v", Intent::Blank, int);

    let ctx = &mut program.ctx;
    let fn_loc = ctx.symbols.get(func).loc;
    let value = ctx.ast.sym_ref(formal, fn_loc);
    let recurse_callee = ctx.ast.sym_ref(func, fn_loc);
    let recurse = ctx.ast.call(recurse_callee, [value], fn_loc);
    let ret = ctx.ast.return_stmt(Some(recurse), fn_loc);
    ctx.ast.insert_at_tail(ctx.fn_body(func), ret);

    let mut map = CopyMap::new();
    let copy = ctx.copy(ctx.def_of(func), &mut map);
    let clone = map.symbol(func);
    let clone_formal = map.symbol(formal);

    assert_ne!(clone, func);
    assert_ne!(clone_formal, formal);
    assert_eq!(ctx.ast.parent(copy), None);
    assert_eq!(ctx.symbols.get(clone).def_point, Some(copy));
    assert_eq!(ctx.formal_symbols(clone), vec![clone_formal]);

    let body = ctx.fn_body(clone);
    let [stmt] = ctx.ast.block_stmts(body) else {
        panic!("copied body should hold one statement");
    };
    let NodeKind::Return(Some(call)) = ctx.ast.get_kind(*stmt) else {
        panic!("expected a return");
    };
    let NodeKind::Call(call) = ctx.ast.get_kind(*call) else {
        panic!("expected a call");
    };
    // references to symbols defined inside the copied subtree follow the clones
    let Callee::Expr(callee) = call.callee else {
        panic!("expected a named callee");
    };
    assert!(matches!(ctx.ast.get_kind(callee), NodeKind::SymRef(s) if *s == clone));
    assert!(matches!(ctx.ast.get_kind(call.args[0]), NodeKind::SymRef(s) if *s == clone_formal));
    assert_eq!(ctx.ast.block_owner(body), Some(clone));

    // the original is untouched
    let original_body = ctx.fn_body(func);
    assert_eq!(ctx.ast.block_owner(original_body), Some(func));
}
