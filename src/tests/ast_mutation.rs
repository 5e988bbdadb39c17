use super::synthesis_common::{loc, setup_program};
use crate::ast::dumper::AstDumper;
use crate::ast::{Ast, NodeRef, PrimOp};
use crate::semantic::Intent;
use crate::source_manager::SourceLoc;

fn literal_stmt(ast: &mut Ast, value: i64) -> NodeRef {
    let lit = ast.int_literal(value, SourceLoc::builtin());
    ast.expr_stmt(lit, SourceLoc::builtin())
}

#[test]
fn insertions_keep_statement_order() {
    let mut ast = Ast::new();
    let block = ast.block([], None, SourceLoc::builtin());
    let two = literal_stmt(&mut ast, 2);
    ast.insert_at_tail(block, two);
    let one = literal_stmt(&mut ast, 1);
    ast.insert_at_head(block, one);
    let three = literal_stmt(&mut ast, 3);
    ast.insert_after(two, three);
    let middle = literal_stmt(&mut ast, 4);
    ast.insert_before(two, middle);

    assert_eq!(ast.block_stmts(block), &[one, middle, two, three]);
    for &stmt in ast.block_stmts(block) {
        assert_eq!(ast.parent(stmt), Some(block));
    }
}

#[test]
fn removed_node_can_be_spliced_elsewhere() {
    let mut ast = Ast::new();
    let from = ast.block([], None, SourceLoc::builtin());
    let to = ast.block([], None, SourceLoc::builtin());
    let stmt = literal_stmt(&mut ast, 7);
    ast.insert_at_tail(from, stmt);

    ast.remove(stmt);
    assert!(ast.block_stmts(from).is_empty());
    assert_eq!(ast.parent(stmt), None);

    ast.insert_at_tail(to, stmt);
    assert_eq!(ast.block_stmts(to), &[stmt]);
    assert_eq!(ast.parent(stmt), Some(to));
}

#[test]
#[should_panic(expected = "ICE")]
fn attaching_an_attached_node_panics() {
    let mut ast = Ast::new();
    let first = ast.block([], None, SourceLoc::builtin());
    let second = ast.block([], None, SourceLoc::builtin());
    let stmt = literal_stmt(&mut ast, 1);
    ast.insert_at_tail(first, stmt);
    ast.insert_at_tail(second, stmt);
}

#[test]
fn removing_an_initializer_clears_it() {
    let mut program = setup_program();
    let int = program.ctx.types.type_int;
    let func = program.define_function("f", int, 2);
    let formal = program.ctx.add_formal(func, "n", Intent::Blank, int);

    let ctx = &mut program.ctx;
    let def = ctx.def_of(formal);
    let zero = ctx.ast.int_literal(0, SourceLoc::builtin());
    ctx.ast.set_init(def, zero);
    assert_eq!(ctx.ast.def_data(def).unwrap().init, Some(zero));

    ctx.ast.remove(zero);
    assert_eq!(ctx.ast.def_data(def).unwrap().init, None);
    assert_eq!(ctx.ast.parent(zero), None);
}

#[test]
fn reset_loc_stamps_subtree_and_defined_symbols() {
    let mut program = setup_program();
    let int = program.ctx.types.type_int;
    let func = program.define_function("g", int, 2);
    let formal = program.ctx.add_formal(func, "n", Intent::Blank, int);
    let target = loc(&mut program.ctx, 42);

    let ctx = &mut program.ctx;
    let fn_loc = ctx.symbols.get(func).loc;
    let lhs = ctx.ast.sym_ref(formal, fn_loc);
    let rhs = ctx.ast.int_literal(1, fn_loc);
    let test = ctx.ast.prim_call(PrimOp::Equal, [lhs, rhs], fn_loc);
    let ret = ctx.ast.return_stmt(Some(test), fn_loc);
    ctx.ast.insert_at_tail(ctx.fn_body(func), ret);

    let def = ctx.def_of(func);
    ctx.reset_loc(def, target);

    for node in ctx.collect_subtree(def) {
        assert_eq!(ctx.ast.loc(node), target);
    }
    assert_eq!(ctx.symbols.get(func).loc, target);
    assert_eq!(ctx.symbols.get(formal).loc, target);
    insta::assert_snapshot!(AstDumper::format_expr(ctx, test), @"n == 1");
}
