//! The SB graph: nodes with explicit control, memory, and data inputs,
//! reverse "user" edges for def-use queries, and a fixed per-op input
//! layout. Nodes are arena-indexed (`NodeId`) rather than boxed and
//! linked by pointer — the graph is cyclic (phi/region back-edges,
//! loops) and optimizer rewrites migrate users between nodes, which
//! wants a stable handle more than it wants owned pointers. See
//! `cranelift-codegen::egraph::node` for the same call.

use bitflags::bitflags;
use bsc_support::{entity_impl, EntityRef};

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct NodeId(u32);
entity_impl!(NodeId, "n");

bitflags! {
    #[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
    pub struct NodeFlags: u8 {
        const PROJECTION        = 0b001;
        const STARTS_BASIC_BLOCK = 0b010;
        const TRANSFERS_CONTROL = 0b100;
    }
}

/// Every SB operation. Constant payloads live on the variant rather than
/// in a side table; `Region`/`Phi` carry no payload of their own, only
/// the inputs recorded in `Node::ins`.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Op {
    Null,
    IntConst(i64),
    Alloca,
    Add,
    Sub,
    Mul,
    Sdiv,
    Start,
    StartMem,
    StartCtrl,
    End,
    Region,
    Phi,
    Branch,
    BranchThen,
    BranchElse,
    Load,
    Store,
}

impl Op {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Op::Null => "null",
            Op::IntConst(_) => "int_const",
            Op::Alloca => "alloca",
            Op::Add => "add",
            Op::Sub => "sub",
            Op::Mul => "mul",
            Op::Sdiv => "sdiv",
            Op::Start => "start",
            Op::StartMem => "start_mem",
            Op::StartCtrl => "start_ctrl",
            Op::End => "end",
            Op::Region => "region",
            Op::Phi => "phi",
            Op::Branch => "branch",
            Op::BranchThen => "branch_then",
            Op::BranchElse => "branch_else",
            Op::Load => "load",
            Op::Store => "store",
        }
    }

    fn flags(self) -> NodeFlags {
        match self {
            Op::Start => NodeFlags::STARTS_BASIC_BLOCK | NodeFlags::TRANSFERS_CONTROL,
            Op::StartMem => NodeFlags::PROJECTION,
            Op::StartCtrl => NodeFlags::PROJECTION | NodeFlags::TRANSFERS_CONTROL,
            Op::Region => NodeFlags::STARTS_BASIC_BLOCK | NodeFlags::TRANSFERS_CONTROL,
            Op::Branch => NodeFlags::TRANSFERS_CONTROL,
            Op::BranchThen | Op::BranchElse => {
                NodeFlags::PROJECTION | NodeFlags::STARTS_BASIC_BLOCK | NodeFlags::TRANSFERS_CONTROL
            }
            _ => NodeFlags::empty(),
        }
    }

    /// Input arity fixed at construction, or `None` for `Region`/`Phi`,
    /// whose input count grows with the procedure's predecessor count
    /// and is filled in later via `provide_region_inputs`/
    /// `provide_phi_inputs`.
    fn fixed_arity(self) -> Option<usize> {
        match self {
            Op::Null | Op::IntConst(_) | Op::Alloca | Op::Start => Some(0),
            Op::Add | Op::Sub | Op::Mul | Op::Sdiv => Some(2),
            Op::StartMem | Op::StartCtrl | Op::BranchThen | Op::BranchElse => Some(1),
            Op::End => Some(3),
            Op::Branch => Some(2),
            Op::Load => Some(3),
            Op::Store => Some(4),
            Op::Region | Op::Phi => None,
        }
    }
}

/// A reverse edge: `def.users` contains a `User{node, index}` for every
/// `node.ins[index] == Some(def)`.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct User {
    pub node: NodeId,
    pub index: usize,
}

pub struct Node {
    pub op: Op,
    pub flags: NodeFlags,
    pub ins: Vec<Option<NodeId>>,
    pub users: Vec<User>,
}

impl Node {
    pub fn input(&self, index: usize) -> Option<NodeId> {
        self.ins[index]
    }
}

/// Owns every node allocated while building and optimizing one
/// procedure. Nodes are never freed individually; deletion just
/// unlinks a node from the `ins`/`users` edges that make it reachable,
/// a "logical delete, bulk free on context teardown" lifecycle.
#[derive(Default)]
pub struct Context {
    nodes: Vec<Node>,
}

impl Context {
    pub fn new() -> Self {
        Context { nodes: Vec::new() }
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn alloc(&mut self, op: Op) -> NodeId {
        let arity = op.fixed_arity().unwrap_or(0);
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Node {
            op,
            flags: op.flags(),
            ins: vec![None; arity],
            users: Vec::new(),
        });
        id
    }

    /// Fill input slot `index` of `node` with `def`, recording a `User`
    /// on `def`. Each slot may only be filled once.
    pub fn set_input(&mut self, node: NodeId, index: usize, def: NodeId) {
        assert!(
            self.nodes[node.index()].ins[index].is_none(),
            "input slot filled twice"
        );
        self.nodes[node.index()].ins[index] = Some(def);
        self.nodes[def.index()].users.push(User { node, index });
    }

    pub fn null(&mut self) -> NodeId {
        self.alloc(Op::Null)
    }

    pub fn int_const(&mut self, value: i64) -> NodeId {
        self.alloc(Op::IntConst(value))
    }

    pub fn alloca(&mut self) -> NodeId {
        self.alloc(Op::Alloca)
    }

    fn binary(&mut self, op: Op, left: NodeId, right: NodeId) -> NodeId {
        let n = self.alloc(op);
        self.set_input(n, 0, left);
        self.set_input(n, 1, right);
        n
    }

    pub fn add(&mut self, left: NodeId, right: NodeId) -> NodeId {
        self.binary(Op::Add, left, right)
    }

    pub fn sub(&mut self, left: NodeId, right: NodeId) -> NodeId {
        self.binary(Op::Sub, left, right)
    }

    pub fn mul(&mut self, left: NodeId, right: NodeId) -> NodeId {
        self.binary(Op::Mul, left, right)
    }

    pub fn sdiv(&mut self, left: NodeId, right: NodeId) -> NodeId {
        self.binary(Op::Sdiv, left, right)
    }

    pub fn start(&mut self) -> NodeId {
        self.alloc(Op::Start)
    }

    pub fn start_mem(&mut self, start: NodeId) -> NodeId {
        let n = self.alloc(Op::StartMem);
        self.set_input(n, 0, start);
        n
    }

    pub fn start_ctrl(&mut self, start: NodeId) -> NodeId {
        let n = self.alloc(Op::StartCtrl);
        self.set_input(n, 0, start);
        n
    }

    pub fn end(&mut self, ctrl: NodeId, mem: NodeId, ret_val: NodeId) -> NodeId {
        let n = self.alloc(Op::End);
        self.set_input(n, 0, ctrl);
        self.set_input(n, 1, mem);
        self.set_input(n, 2, ret_val);
        n
    }

    pub fn region(&mut self) -> NodeId {
        self.alloc(Op::Region)
    }

    pub fn phi(&mut self) -> NodeId {
        self.alloc(Op::Phi)
    }

    /// Back-patch a `Region`'s predecessor-control inputs, in
    /// predecessor order.
    pub fn provide_region_inputs(&mut self, region: NodeId, ins: &[NodeId]) {
        debug_assert!(self.nodes[region.index()].ins.is_empty());
        self.nodes[region.index()].ins = vec![None; ins.len()];
        for (i, &def) in ins.iter().enumerate() {
            self.set_input(region, i, def);
        }
    }

    /// Back-patch a `Phi`'s region and per-predecessor value inputs.
    /// `ins[i]` is the value flowing on `region`'s `i`-th predecessor.
    pub fn provide_phi_inputs(&mut self, phi: NodeId, region: NodeId, ins: &[NodeId]) {
        debug_assert!(self.nodes[phi.index()].ins.is_empty());
        self.nodes[phi.index()].ins = vec![None; ins.len() + 1];
        self.set_input(phi, 0, region);
        for (i, &def) in ins.iter().enumerate() {
            self.set_input(phi, i + 1, def);
        }
    }

    pub fn branch(&mut self, ctrl: NodeId, predicate: NodeId) -> NodeId {
        let n = self.alloc(Op::Branch);
        self.set_input(n, 0, ctrl);
        self.set_input(n, 1, predicate);
        n
    }

    pub fn branch_then(&mut self, branch: NodeId) -> NodeId {
        let n = self.alloc(Op::BranchThen);
        self.set_input(n, 0, branch);
        n
    }

    pub fn branch_else(&mut self, branch: NodeId) -> NodeId {
        let n = self.alloc(Op::BranchElse);
        self.set_input(n, 0, branch);
        n
    }

    pub fn load(&mut self, ctrl: NodeId, mem: NodeId, addr: NodeId) -> NodeId {
        let n = self.alloc(Op::Load);
        self.set_input(n, 0, ctrl);
        self.set_input(n, 1, mem);
        self.set_input(n, 2, addr);
        n
    }

    pub fn store(&mut self, ctrl: NodeId, mem: NodeId, addr: NodeId, value: NodeId) -> NodeId {
        let n = self.alloc(Op::Store);
        self.set_input(n, 0, ctrl);
        self.set_input(n, 1, mem);
        self.set_input(n, 2, addr);
        self.set_input(n, 3, value);
        n
    }

    /// Visit every node reachable from `root` by following `ins`,
    /// depth-first, each node visited once.
    pub fn walk(&self, root: NodeId, mut visit: impl FnMut(NodeId)) {
        let mut stack = vec![root];
        let mut visited = bsc_support::Set::new();
        while let Some(n) = stack.pop() {
            if !visited.insert(n) {
                continue;
            }
            visit(n);
            for input in &self.nodes[n.index()].ins {
                if let Some(def) = input {
                    stack.push(*def);
                }
            }
        }
    }
}

/// The entry/exit pair lowering hands off to the optimizer and
/// scheduler; everything else is reached by walking `ins` from `end`.
#[derive(Copy, Clone, Debug)]
pub struct Proc {
    pub start: NodeId,
    pub end: NodeId,
}

/// Computes the useful node set reachable from `end` via `ins`, asserts
/// `start` is among them, then prunes every `users` entry that points
/// at a node outside that set — stale reverse edges left behind by
/// construction paths lowering didn't ultimately choose (e.g. an
/// unreachable HIR block's locals never got wired into a region, but
/// may still sit in some other node's `users` list from an earlier,
/// abandoned `set_input`).
pub fn sb_proc(ctx: &mut Context, start: NodeId, end: NodeId) -> Proc {
    let mut useful = bsc_support::Set::new();
    ctx.walk(end, |n| {
        useful.insert(n);
    });

    assert!(
        useful.contains(&start),
        "malformed ir: start is not reachable from end"
    );

    for id in useful.iter().copied().collect::<Vec<_>>() {
        ctx.node_mut(id)
            .users
            .retain(|user| useful.contains(&user.node));
    }

    Proc { start, end }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_input_records_a_matching_user() {
        let mut ctx = Context::new();
        let a = ctx.int_const(1);
        let b = ctx.int_const(2);
        let add = ctx.add(a, b);
        assert_eq!(ctx.node(add).input(0), Some(a));
        assert_eq!(ctx.node(add).input(1), Some(b));
        assert_eq!(ctx.node(a).users, vec![User { node: add, index: 0 }]);
        assert_eq!(ctx.node(b).users, vec![User { node: add, index: 1 }]);
    }

    #[test]
    #[should_panic(expected = "input slot filled twice")]
    fn set_input_twice_panics() {
        let mut ctx = Context::new();
        let a = ctx.int_const(1);
        let region = ctx.region();
        ctx.provide_region_inputs(region, &[a]);
        ctx.set_input(region, 0, a);
    }

    #[test]
    fn phi_alignment_matches_region_predecessor_count() {
        let mut ctx = Context::new();
        let c0 = ctx.int_const(0);
        let c1 = ctx.int_const(1);
        let region = ctx.region();
        ctx.provide_region_inputs(region, &[c0, c1]);
        let v0 = ctx.int_const(10);
        let v1 = ctx.int_const(20);
        let phi = ctx.phi();
        ctx.provide_phi_inputs(phi, region, &[v0, v1]);
        assert_eq!(ctx.node(phi).input(0), Some(region));
        assert_eq!(ctx.node(phi).ins.len(), ctx.node(region).ins.len() + 1);
    }

    #[test]
    fn start_projections_carry_the_right_flags() {
        let mut ctx = Context::new();
        let start = ctx.start();
        let mem = ctx.start_mem(start);
        let ctrl = ctx.start_ctrl(start);
        assert!(ctx.node(start).flags.contains(NodeFlags::STARTS_BASIC_BLOCK));
        assert!(ctx.node(mem).flags.contains(NodeFlags::PROJECTION));
        assert!(!ctx.node(mem).flags.contains(NodeFlags::TRANSFERS_CONTROL));
        assert!(ctx.node(ctrl).flags.contains(NodeFlags::TRANSFERS_CONTROL));
    }

    #[test]
    fn walk_visits_every_input_once() {
        let mut ctx = Context::new();
        let a = ctx.int_const(1);
        let add = ctx.add(a, a);
        let mut seen = Vec::new();
        ctx.walk(add, |n| seen.push(n));
        seen.sort_by_key(|n| n.index());
        let mut expected = vec![a, add];
        expected.sort_by_key(|n| n.index());
        assert_eq!(seen, expected);
    }

    #[test]
    fn sb_proc_drops_users_never_reachable_from_end() {
        let mut ctx = Context::new();
        let start = ctx.start();
        let a = ctx.int_const(1);
        let _b = ctx.add(a, a);
        let null = ctx.null();
        let end = ctx.end(start, null, a);

        assert!(!ctx.node(a).users.is_empty());

        let proc = sb_proc(&mut ctx, start, end);

        assert!(ctx.node(a).users.is_empty());
        assert_eq!(proc.start, start);
    }
}
