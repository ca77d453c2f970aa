//! End-to-end coverage of the full parse -> HIR -> SB -> optimize
//! pipeline, exercising the frontend instead of hand-built graphs.

use bsc_sb::{lower, opt, sb_proc, Op};

fn compile(source: &str) -> (bsc_hir::Proc, bsc_sb::Context, bsc_sb::Proc) {
    let hir = bsc_frontend::parse_source(source).expect("source parses");
    let (mut ctx, proc) = lower(&hir);
    let proc = sb_proc(&mut ctx, proc.start, proc.end);
    opt(&mut ctx, &proc);
    (hir, ctx, proc)
}

fn reachable_ops(ctx: &bsc_sb::Context, proc: &bsc_sb::Proc) -> Vec<Op> {
    let mut ops = Vec::new();
    ctx.walk(proc.end, |n| ops.push(ctx.node(n).op));
    ops
}

#[test]
fn arithmetic_expression_lowers_to_mul_then_add() {
    let hir = bsc_frontend::parse_source("{ 1 + 2 * 3 }").expect("source parses");
    // INT_CONST(1), INT_CONST(2), INT_CONST(3), MUL, ADD, plus the
    // synthesized RET wrapping the block's trailing value.
    assert_eq!(hir.nodes_in(hir.control_flow_head).count(), 6);

    let (mut ctx, proc) = lower(&hir);
    let proc = sb_proc(&mut ctx, proc.start, proc.end);

    let ops = reachable_ops(&ctx, &proc);
    assert!(ops.iter().any(|op| matches!(op, Op::Mul)));
    assert!(ops.iter().any(|op| matches!(op, Op::Add)));

    let dot = bsc_sb::dump_graphviz(&ctx, &proc);
    assert!(dot.contains("add"));
    assert!(dot.contains("mul"));
}

#[test]
fn if_else_joins_into_a_single_end_region() {
    let source = "{ let a; a = 1; if a { 2 } else { 3 } return; }";
    let (hir, ctx, proc) = compile(source);

    assert!(hir.block_count() >= 4);

    // Neither arm's value is ever read, so both collapse to dead code
    // once `sb_proc` trims inputs unreachable from `end`.
    let ops = reachable_ops(&ctx, &proc);
    let const_values: Vec<i64> = ops
        .iter()
        .filter_map(|op| match op {
            Op::IntConst(v) => Some(*v),
            _ => None,
        })
        .collect();
    assert!(!const_values.contains(&2));
    assert!(!const_values.contains(&3));
}

#[test]
fn while_loop_header_survives_optimization() {
    let source = "{ let x; while x { x = x; } return x; }";
    let (_, ctx, proc) = compile(source);

    let ops = reachable_ops(&ctx, &proc);
    assert!(
        ops.iter().any(|op| matches!(op, Op::Region)),
        "the loop header's region must survive: its memory phi still reads it"
    );
}

#[test]
fn start_is_reachable_from_end_after_trimming() {
    let source = "{ 1 + 1 }";
    let hir = bsc_frontend::parse_source(source).expect("source parses");
    let (mut ctx, proc) = lower(&hir);

    let mut reachable = std::collections::HashSet::new();
    ctx.walk(proc.end, |n| {
        reachable.insert(n);
    });
    assert!(reachable.contains(&proc.start));

    // sb_proc must not panic on a well-formed graph.
    let _proc = sb_proc(&mut ctx, proc.start, proc.end);
}

#[test]
fn unreachable_block_after_return_contributes_no_nodes() {
    let source = "{ return 1; 2 + 2; }";
    let hir = bsc_frontend::parse_source(source).expect("source parses");

    let (mut ctx, proc) = lower(&hir);
    let proc = sb_proc(&mut ctx, proc.start, proc.end);

    let ops = reachable_ops(&ctx, &proc);
    let const_values: Vec<i64> = ops
        .iter()
        .filter_map(|op| match op {
            Op::IntConst(v) => Some(*v),
            _ => None,
        })
        .collect();
    assert!(const_values.contains(&1));
    assert!(!const_values.contains(&2));
}
