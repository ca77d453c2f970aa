//! Graphviz `record`-shaped dump of an SB graph: one node per
//! non-projection op, with numbered input subports `<iK>` and a
//! subport per owned projection. A projection never gets its own
//! record — edges that would originate at a projection are instead
//! drawn from `parent:p_NAME`, matching how projections are read: not
//! as their own instruction, just a named view of one of the parent's
//! results.

use crate::node::{Context, NodeFlags, NodeId, Op, Proc};
use std::fmt::Write;

pub fn dump(ctx: &Context, proc: &Proc) -> String {
    let mut nodes = Vec::new();
    ctx.walk(proc.end, |n| nodes.push(n));
    nodes.reverse();

    let mut out = String::new();
    out.push_str("digraph sb {\n");
    out.push_str("  node [shape=record];\n");

    for &n in &nodes {
        if ctx.node(n).flags.contains(NodeFlags::PROJECTION) {
            continue;
        }
        writeln!(out, "  {} [label=\"{}\"];", n, record_label(ctx, n)).unwrap();
    }

    for &n in &nodes {
        if ctx.node(n).flags.contains(NodeFlags::PROJECTION) {
            continue;
        }
        for (i, input) in ctx.node(n).ins.iter().enumerate() {
            let Some(def) = input else { continue };
            let (from, label) = source_port(ctx, *def);
            writeln!(out, "  {} -> {}:i{} [label=\"{}\"];", from, n, i, label).unwrap();
        }
    }

    out.push_str("}\n");
    out
}

fn record_label(ctx: &Context, n: NodeId) -> String {
    let node = ctx.node(n);
    let mut fields = vec![op_label(node.op)];

    let inputs: Vec<String> = (0..node.ins.len()).map(|i| format!("<i{}> {}", i, i)).collect();
    if !inputs.is_empty() {
        fields.push(format!("{{{}}}", inputs.join("|")));
    }

    for user in &node.users {
        if let Some(port) = projection_port(ctx.node(user.node).op) {
            fields.push(format!("<p_{}> {}", port, port));
        }
    }

    format!("{{{}}}", fields.join("|"))
}

fn op_label(op: Op) -> String {
    match op {
        Op::IntConst(v) => format!("int_const {}", v),
        other => other.mnemonic().to_string(),
    }
}

/// The port name a projection is addressed by when drawn from its
/// parent's record instead of as a node of its own.
fn projection_port(op: Op) -> Option<&'static str> {
    match op {
        Op::StartMem => Some("mem"),
        Op::StartCtrl => Some("ctrl"),
        Op::BranchThen => Some("then"),
        Op::BranchElse => Some("else"),
        _ => None,
    }
}

/// The dot-syntax source of an edge out of `def`: a projection is
/// addressed as its parent's `p_NAME` subport, everything else by its
/// own node id.
fn source_port(ctx: &Context, def: NodeId) -> (String, &'static str) {
    let node = ctx.node(def);
    if let Some(port) = projection_port(node.op) {
        let parent = node.input(0).expect("projection has its parent as input 0");
        (format!("{}:p_{}", parent, port), port)
    } else {
        (def.to_string(), node.op.mnemonic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_chain_contains_add_and_mul() {
        let mut ctx = Context::new();
        let start = ctx.start();
        let start_ctrl = ctx.start_ctrl(start);
        let start_mem = ctx.start_mem(start);
        let c1 = ctx.int_const(1);
        let c2 = ctx.int_const(2);
        let c3 = ctx.int_const(3);
        let mul = ctx.mul(c2, c3);
        let add = ctx.add(c1, mul);
        let end = ctx.end(start_ctrl, start_mem, add);
        let proc = Proc { start, end };

        let out = dump(&ctx, &proc);
        assert!(out.contains("add"));
        assert!(out.contains("mul"));
        assert!(out.contains("digraph sb"));
    }

    #[test]
    fn projection_draws_from_its_parents_port() {
        let mut ctx = Context::new();
        let start = ctx.start();
        let start_ctrl = ctx.start_ctrl(start);
        let start_mem = ctx.start_mem(start);
        let null = ctx.null();
        let end = ctx.end(start_ctrl, start_mem, null);
        let proc = Proc { start, end };

        let out = dump(&ctx, &proc);
        assert!(!out.contains(&format!("{} [label", start_ctrl)));
        assert!(out.contains(&format!("{}:p_ctrl -> {}:i0", start, end)));
        assert!(out.contains(&format!("{}:p_mem -> {}:i1", start, end)));
    }
}
