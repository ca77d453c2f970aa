//! A worklist-driven peephole optimizer: pop a node, consult its
//! idealization rule, and if the rule proposes a replacement, rewrite
//! every user to point at it and delete the original (recursively
//! deleting any input that becomes userless). Replacing before
//! re-queuing users is what keeps deleted nodes from being
//! re-inspected.

use crate::node::{Context, NodeId, Op, Proc};
use bsc_support::Worklist;
use log::trace;

pub fn opt(ctx: &mut Context, proc: &Proc) {
    let mut worklist = Worklist::new();
    ctx.walk(proc.end, |n| worklist.push(n));

    while let Some(n) = worklist.pop() {
        let Some(m) = idealize(ctx, &mut worklist, n) else {
            continue;
        };
        if m == n {
            continue;
        }
        trace!("replacing {:?} with {:?}", n, m);
        replace_node(ctx, &mut worklist, n, m);
    }
}

/// Per-op local rewrite rules. Returns `Some(m)` when `n` can be
/// replaced by `m` (`m == n` counts as "no change"); `None` when the op
/// has no rule.
fn idealize(ctx: &Context, worklist: &mut Worklist<NodeId>, n: NodeId) -> Option<NodeId> {
    match ctx.node(n).op {
        Op::Phi => idealize_phi(ctx, worklist, n),
        Op::Region => idealize_region(ctx, n),
        _ => None,
    }
}

/// A phi whose inputs (besides the region at index 0), ignoring any
/// self-reference, all agree on one value collapses to that value.
/// Collapsing a phi can let its region collapse in turn (the phi was the
/// only thing forcing the region to keep distinct predecessors alive),
/// so the region goes back on the worklist.
fn idealize_phi(ctx: &Context, worklist: &mut Worklist<NodeId>, n: NodeId) -> Option<NodeId> {
    let node = ctx.node(n);
    let region = node.ins[0];
    let mut single: Option<NodeId> = None;
    for &input in &node.ins[1..] {
        let input = input?;
        if input == n {
            continue;
        }
        match single {
            None => single = Some(input),
            Some(s) if s == input => {}
            Some(_) => return None,
        }
    }
    let single = single?;
    if let Some(region) = region {
        worklist.push(region);
    }
    Some(single)
}

/// A region with no phi still reading distinct predecessors from it,
/// and whose control inputs all agree, collapses to that one input.
fn idealize_region(ctx: &Context, n: NodeId) -> Option<NodeId> {
    let node = ctx.node(n);
    if node.users.iter().any(|u| {
        matches!(ctx.node(u.node).op, Op::Phi) && u.index == 0
    }) {
        return None;
    }
    let mut single: Option<NodeId> = None;
    for &input in &node.ins {
        let input = input?;
        match single {
            None => single = Some(input),
            Some(s) if s == input => {}
            Some(_) => return None,
        }
    }
    single
}

/// Point every user of `n` at `m` instead, then delete `n`. `m`'s users
/// (old and newly acquired) go back on the worklist so the rewrite can
/// propagate.
fn replace_node(ctx: &mut Context, worklist: &mut Worklist<NodeId>, n: NodeId, m: NodeId) {
    let users = std::mem::take(&mut ctx.node_mut(n).users);
    for user in &users {
        ctx.node_mut(user.node).ins[user.index] = Some(m);
    }
    ctx.node_mut(m).users.extend(users.iter().copied());

    delete_node(ctx, worklist, n);

    for user in &users {
        worklist.push(user.node);
    }
}

/// Remove `n` from the worklist, drop its outgoing `ins` edges
/// (recursively deleting any input this was the last user of), and
/// leave `n` itself an orphaned, edge-free node for the arena to
/// reclaim on context teardown.
fn delete_node(ctx: &mut Context, worklist: &mut Worklist<NodeId>, n: NodeId) {
    worklist.remove(&n);

    let ins = std::mem::take(&mut ctx.node_mut(n).ins);
    for input in ins.into_iter().flatten() {
        let def = ctx.node_mut(input);
        if let Some(pos) = def.users.iter().position(|u| u.node == n) {
            def.users.swap_remove(pos);
        }
        if ctx.node(input).users.is_empty() {
            delete_node(ctx, worklist, input);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phi_with_one_distinct_value_collapses() {
        let mut ctx = Context::new();
        let c0 = ctx.int_const(0);
        let c1 = ctx.int_const(1);
        let region = ctx.region();
        ctx.provide_region_inputs(region, &[c0, c1]);
        let v = ctx.int_const(42);
        let phi = ctx.phi();
        ctx.provide_phi_inputs(phi, region, &[v, v]);

        let null = ctx.null();
        let end = ctx.end(region, null, phi);
        let proc = Proc { start: c0, end };

        opt(&mut ctx, &proc);

        assert_eq!(ctx.node(end).input(2), Some(v));
    }

    #[test]
    fn region_with_no_phi_user_and_single_input_collapses() {
        let mut ctx = Context::new();
        let start = ctx.start();
        let start_ctrl = ctx.start_ctrl(start);
        let region = ctx.region();
        ctx.provide_region_inputs(region, &[start_ctrl, start_ctrl]);

        let null = ctx.null();
        let end = ctx.end(region, null, null);
        let proc = Proc { start, end };

        opt(&mut ctx, &proc);

        assert_eq!(ctx.node(end).input(0), Some(start_ctrl));
    }

    #[test]
    fn region_survives_while_a_phi_still_reads_it() {
        let mut ctx = Context::new();
        let start = ctx.start();
        let start_ctrl = ctx.start_ctrl(start);
        let region = ctx.region();
        ctx.provide_region_inputs(region, &[start_ctrl, start_ctrl]);

        let v0 = ctx.int_const(1);
        let v1 = ctx.int_const(2);
        let phi = ctx.phi();
        ctx.provide_phi_inputs(phi, region, &[v0, v1]);

        let null = ctx.null();
        let end = ctx.end(region, null, phi);
        let proc = Proc { start, end };

        opt(&mut ctx, &proc);

        assert_eq!(ctx.node(end).input(0), Some(region));
    }

    #[test]
    fn region_collapses_once_the_phi_forcing_it_open_collapses() {
        let mut ctx = Context::new();
        let start = ctx.start();
        let start_ctrl = ctx.start_ctrl(start);
        let region = ctx.region();
        ctx.provide_region_inputs(region, &[start_ctrl, start_ctrl]);

        let v = ctx.int_const(42);
        let phi = ctx.phi();
        ctx.provide_phi_inputs(phi, region, &[v, v]);

        let null = ctx.null();
        let end = ctx.end(region, null, phi);
        let proc = Proc { start, end };

        opt(&mut ctx, &proc);

        assert_eq!(ctx.node(end).input(0), Some(start_ctrl));
        assert_eq!(ctx.node(end).input(2), Some(v));
    }

    #[test]
    fn running_opt_twice_is_idempotent() {
        let mut ctx = Context::new();
        let c0 = ctx.int_const(0);
        let c1 = ctx.int_const(1);
        let region = ctx.region();
        ctx.provide_region_inputs(region, &[c0, c1]);
        let v = ctx.int_const(42);
        let phi = ctx.phi();
        ctx.provide_phi_inputs(phi, region, &[v, v]);
        let end = ctx.end(region, phi, phi);
        let proc = Proc { start: c0, end };

        opt(&mut ctx, &proc);
        let len_after_first = ctx.len();
        opt(&mut ctx, &proc);
        assert_eq!(ctx.len(), len_after_first);
        assert_eq!(ctx.node(end).input(1), Some(v));
    }
}
