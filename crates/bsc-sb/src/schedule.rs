//! A GCM scheduler skeleton: walks the control subgraph in reverse
//! postorder from `start` and groups nodes into `Block`s at every
//! `STARTS_BASIC_BLOCK` node. Full global code motion (choosing, for
//! every data node, the earliest/latest legal block among its users)
//! is left for a later pass; this only does block formation and
//! node-to-block assignment.

use crate::node::{Context, NodeFlags, NodeId, Proc};
use bsc_support::{entity_impl, SecondaryMap, Set};

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct BlockId(u32);
entity_impl!(BlockId, "sb_bb_");

pub struct Block {
    pub next: Option<BlockId>,
    pub head: NodeId,
}

pub struct Schedule {
    blocks: Vec<Block>,
    head: Option<BlockId>,
    block_of: SecondaryMap<NodeId, Option<BlockId>>,
}

impl Schedule {
    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.0 as usize]
    }

    pub fn block_of(&self, node: NodeId) -> Option<BlockId> {
        self.block_of.get(node).copied().flatten()
    }

    pub fn head(&self) -> Option<BlockId> {
        self.head
    }

    pub fn blocks(&self) -> ScheduleIter<'_> {
        ScheduleIter {
            schedule: self,
            cur: self.head,
        }
    }
}

pub struct ScheduleIter<'a> {
    schedule: &'a Schedule,
    cur: Option<BlockId>,
}

impl<'a> Iterator for ScheduleIter<'a> {
    type Item = BlockId;
    fn next(&mut self) -> Option<BlockId> {
        let id = self.cur?;
        self.cur = self.schedule.block(id).next;
        Some(id)
    }
}

/// Reverse-postorder over nodes reachable from `start` by following
/// `users` edges filtered to control-transferring consumers, forming a
/// new `Block` at every node flagged `STARTS_BASIC_BLOCK`. Blocks are
/// assembled by prepending, so walking `head -> next` yields them in
/// forward (reverse-postorder) order.
pub fn schedule(ctx: &Context, proc: &Proc) -> Schedule {
    let postorder = control_postorder(ctx, proc.start);

    let mut blocks = Vec::new();
    let mut block_of: SecondaryMap<NodeId, Option<BlockId>> = SecondaryMap::new();
    let mut head = None;

    for &node in postorder.iter().rev() {
        if ctx.node(node).flags.contains(NodeFlags::STARTS_BASIC_BLOCK) {
            let id = BlockId(blocks.len() as u32);
            blocks.push(Block { next: head, head: node });
            head = Some(id);
        }
        if let Some(current) = head {
            block_of[node] = Some(current);
        }
    }

    Schedule {
        blocks,
        head,
        block_of,
    }
}

fn control_postorder(ctx: &Context, start: NodeId) -> Vec<NodeId> {
    let mut visited = Set::new();
    let mut order = Vec::new();
    visit(ctx, start, &mut visited, &mut order);
    order
}

fn visit(ctx: &Context, n: NodeId, visited: &mut Set<NodeId>, order: &mut Vec<NodeId>) {
    if !visited.insert(n) {
        return;
    }
    for user in &ctx.node(n).users {
        if ctx.node(user.node).flags.contains(NodeFlags::TRANSFERS_CONTROL) {
            visit(ctx, user.node, visited, order);
        }
    }
    order.push(n);
}
