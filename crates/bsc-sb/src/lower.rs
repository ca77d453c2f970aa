//! Lowers an HIR `Proc` into an SB graph: a region and a memory phi are
//! materialized for every reachable block up front, the block's nodes
//! are then translated in order, and finally every region/phi is
//! back-patched once all predecessor edges are known. No second pass
//! over the blocks is needed once this finishes.
//!
//! `LOCAL`/`LOAD`/`ASSIGN` aren't in the op-by-op translation this
//! module otherwise follows verbatim; they're filled in from the SB
//! op table's `LOAD`/`STORE` input layouts (`[ctrl, mem, addr]` /
//! `[ctrl, mem, addr, value]`): a local becomes an `alloca`, reading it
//! is a `load` pinned to the current control and memory state, and
//! writing it is a `store` that becomes the new memory state.

use crate::node::{Context, Proc as SbProc};
use crate::NodeId as SbNodeId;
use bsc_hir::{BlockId, NodeId as HirNodeId, Op as HirOp, Proc as HirProc};
use bsc_support::{SecondaryMap, Set};

struct BlockState {
    ctrl: SbNodeId,
    mem: SbNodeId,
    ret_val: Option<SbNodeId>,
}

struct EndPath {
    ctrl: SbNodeId,
    mem: SbNodeId,
    ret_val: SbNodeId,
}

pub fn lower(hir: &HirProc) -> (Context, SbProc) {
    let mut ctx = Context::new();

    let reachable = reachable_blocks(hir);

    let mut region_of: SecondaryMap<BlockId, Option<SbNodeId>> = SecondaryMap::new();
    let mut mem_phi_of: SecondaryMap<BlockId, Option<SbNodeId>> = SecondaryMap::new();
    let mut pending_ctrl: SecondaryMap<BlockId, Vec<SbNodeId>> = SecondaryMap::new();
    let mut pending_mem: SecondaryMap<BlockId, Vec<SbNodeId>> = SecondaryMap::new();

    for block in hir.blocks() {
        if reachable.contains(&block) {
            region_of[block] = Some(ctx.region());
            mem_phi_of[block] = Some(ctx.phi());
        }
    }

    let start = ctx.start();
    let start_mem = ctx.start_mem(start);
    let start_ctrl = ctx.start_ctrl(start);
    pending_ctrl[hir.control_flow_head].push(start_ctrl);
    pending_mem[hir.control_flow_head].push(start_mem);

    let mut memo: SecondaryMap<HirNodeId, Option<SbNodeId>> = SecondaryMap::new();
    let null = ctx.null();
    let mut end_paths = Vec::new();

    for block in hir.blocks() {
        if !reachable.contains(&block) {
            continue;
        }

        let mut state = BlockState {
            ctrl: region_of[block].expect("reachable block has a region"),
            mem: mem_phi_of[block].expect("reachable block has a memory phi"),
            ret_val: None,
        };
        let mut ctrl_out: [Option<SbNodeId>; 2] = [None, None];

        for hir_node in hir.nodes_in(block) {
            match hir.node(hir_node).op {
                HirOp::IntConst(v) => {
                    memo[hir_node] = Some(ctx.int_const(v as i64));
                }
                HirOp::Add(l, r) => {
                    memo[hir_node] = Some(ctx.add(memo[l].unwrap(), memo[r].unwrap()));
                }
                HirOp::Sub(l, r) => {
                    memo[hir_node] = Some(ctx.sub(memo[l].unwrap(), memo[r].unwrap()));
                }
                HirOp::Mul(l, r) => {
                    memo[hir_node] = Some(ctx.mul(memo[l].unwrap(), memo[r].unwrap()));
                }
                HirOp::Div(l, r) => {
                    memo[hir_node] = Some(ctx.sdiv(memo[l].unwrap(), memo[r].unwrap()));
                }
                HirOp::Local => {
                    memo[hir_node] = Some(ctx.alloca());
                }
                HirOp::Load { addr } => {
                    let addr = memo[addr].expect("local lowered before its first load");
                    let load = ctx.load(state.ctrl, state.mem, addr);
                    memo[hir_node] = Some(load);
                }
                HirOp::Assign { addr, value } => {
                    let addr = memo[addr].expect("local lowered before its first store");
                    let value = memo[value].unwrap();
                    state.mem = ctx.store(state.ctrl, state.mem, addr, value);
                    memo[hir_node] = Some(value);
                }
                HirOp::Jump { .. } => {
                    // Control sink: the successor inherits whatever
                    // `state.ctrl` already is, filled in below.
                }
                HirOp::Branch { predicate, .. } => {
                    let predicate = memo[predicate].unwrap();
                    let branch = ctx.branch(state.ctrl, predicate);
                    state.ctrl = branch;
                    ctrl_out[0] = Some(ctx.branch_then(branch));
                    ctrl_out[1] = Some(ctx.branch_else(branch));
                }
                HirOp::Ret { value } => {
                    state.ret_val = value.map(|v| memo[v].unwrap());
                }
            }
        }

        let successors = hir.successors(block);
        if successors.is_empty() {
            end_paths.push(EndPath {
                ctrl: state.ctrl,
                mem: state.mem,
                ret_val: state.ret_val.unwrap_or(null),
            });
        } else {
            for (i, &succ) in successors.iter().enumerate() {
                let ctrl = ctrl_out[i].unwrap_or(state.ctrl);
                pending_ctrl[succ].push(ctrl);
                pending_mem[succ].push(state.mem);
            }
        }
    }

    assert!(
        !end_paths.is_empty(),
        "malformed ir: procedure never reaches end"
    );

    for block in hir.blocks() {
        if !reachable.contains(&block) {
            continue;
        }
        let region = region_of[block].unwrap();
        let mem_phi = mem_phi_of[block].unwrap();
        ctx.provide_region_inputs(region, &pending_ctrl[block]);
        ctx.provide_phi_inputs(mem_phi, region, &pending_mem[block]);
    }

    let end_region = ctx.region();
    let end_ctrls: Vec<_> = end_paths.iter().map(|p| p.ctrl).collect();
    ctx.provide_region_inputs(end_region, &end_ctrls);

    let end_mem_phi = ctx.phi();
    let end_mems: Vec<_> = end_paths.iter().map(|p| p.mem).collect();
    ctx.provide_phi_inputs(end_mem_phi, end_region, &end_mems);

    let end_ret_val_phi = ctx.phi();
    let end_ret_vals: Vec<_> = end_paths.iter().map(|p| p.ret_val).collect();
    ctx.provide_phi_inputs(end_ret_val_phi, end_region, &end_ret_vals);

    let end = ctx.end(end_region, end_mem_phi, end_ret_val_phi);

    (ctx, SbProc { start, end })
}

/// DFS over the HIR CFG from `proc.control_flow_head`; unreachable
/// blocks contribute no SB nodes at all.
fn reachable_blocks(proc: &HirProc) -> Set<BlockId> {
    let mut seen = Set::new();
    let mut stack = vec![proc.control_flow_head];
    while let Some(block) = stack.pop() {
        if !seen.insert(block) {
            continue;
        }
        for succ in proc.successors(block) {
            stack.push(succ);
        }
    }
    seen
}
