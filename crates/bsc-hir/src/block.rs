//! The HIR data model: a `Proc` is an ordered list of `Block`s, each
//! owning an intrusive doubly-linked list of `Node`s. Identity is by
//! index (`BlockId`/`NodeId`) rather than by pointer, following
//! `cranelift-codegen::ir::layout`'s own linked-list-over-indices shape
//! instead of raw `prev`/`next` pointers.

use crate::token::Token;
use bsc_support::{entity_impl, EntityRef};
use smallvec::SmallVec;

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct BlockId(u32);
entity_impl!(BlockId, "bb_");

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct NodeId(u32);
entity_impl!(NodeId, "%");

/// Every HIR operation, payload included. A sum type rather than one
/// tagged union, per the design notes.
#[derive(Clone, Copy, Debug)]
pub enum Op {
    IntConst(i128),
    Add(NodeId, NodeId),
    Sub(NodeId, NodeId),
    Mul(NodeId, NodeId),
    Div(NodeId, NodeId),
    Load { addr: NodeId },
    Assign { addr: NodeId, value: NodeId },
    Local,
    Jump { target: BlockId },
    Branch {
        predicate: NodeId,
        then_block: BlockId,
        else_block: BlockId,
    },
    Ret { value: Option<NodeId> },
}

impl Op {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Op::IntConst(_) => "int_const",
            Op::Add(..) => "add",
            Op::Sub(..) => "sub",
            Op::Mul(..) => "mul",
            Op::Div(..) => "div",
            Op::Load { .. } => "load",
            Op::Assign { .. } => "assign",
            Op::Local => "local",
            Op::Jump { .. } => "jump",
            Op::Branch { .. } => "branch",
            Op::Ret { .. } => "ret",
        }
    }

    /// True for `Jump`/`Branch`/`Ret`: the operations that may terminate
    /// a block. A terminator appears at most once per block and, when
    /// present, is that block's last node.
    pub fn is_terminator(&self) -> bool {
        matches!(self, Op::Jump { .. } | Op::Branch { .. } | Op::Ret { .. })
    }

    /// Successor blocks reachable directly from this operation, in
    /// `[then, else]` order for a branch and `[target]` for a jump.
    pub fn successors(&self) -> SmallVec<[BlockId; 2]> {
        match self {
            Op::Jump { target } => SmallVec::from_slice(&[*target]),
            Op::Branch {
                then_block,
                else_block,
                ..
            } => SmallVec::from_slice(&[*then_block, *else_block]),
            _ => SmallVec::new(),
        }
    }
}

#[derive(Clone)]
pub struct Node {
    pub block: BlockId,
    pub prev: Option<NodeId>,
    pub next: Option<NodeId>,
    pub op: Op,
    pub token: Token,
}

#[derive(Clone)]
pub struct Block {
    pub next: Option<BlockId>,
    pub start: Option<NodeId>,
    pub end: Option<NodeId>,
}

/// An ordered list of blocks, each an intrusive list of nodes, as built
/// directly by the parser. Blocks and nodes are arena-indexed: once
/// created neither is ever physically removed, only unlinked from the
/// lists that matter (predecessor lists, reachability) by later passes.
pub struct Proc {
    pub(crate) blocks: Vec<Block>,
    pub(crate) nodes: Vec<Node>,
    pub control_flow_head: BlockId,
}

impl Proc {
    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.index()]
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Blocks in list order, starting from `control_flow_head`.
    pub fn blocks(&self) -> BlockIter<'_> {
        BlockIter {
            proc: self,
            cur: Some(self.control_flow_head),
        }
    }

    /// Nodes of `block` in list order.
    pub fn nodes_in(&self, block: BlockId) -> NodeIter<'_> {
        NodeIter {
            proc: self,
            cur: self.block(block).start,
        }
    }

    /// The block's terminator, if its last node is a `Jump`/`Branch`/`Ret`.
    pub fn terminator(&self, block: BlockId) -> Option<NodeId> {
        let end = self.block(block).end?;
        if self.node(end).op.is_terminator() {
            Some(end)
        } else {
            None
        }
    }

    pub fn successors(&self, block: BlockId) -> SmallVec<[BlockId; 2]> {
        match self.terminator(block) {
            Some(term) => self.node(term).op.successors(),
            None => SmallVec::new(),
        }
    }
}

pub struct BlockIter<'a> {
    proc: &'a Proc,
    cur: Option<BlockId>,
}

impl<'a> Iterator for BlockIter<'a> {
    type Item = BlockId;
    fn next(&mut self) -> Option<BlockId> {
        let id = self.cur?;
        self.cur = self.proc.block(id).next;
        Some(id)
    }
}

pub struct NodeIter<'a> {
    proc: &'a Proc,
    cur: Option<NodeId>,
}

impl<'a> Iterator for NodeIter<'a> {
    type Item = NodeId;
    fn next(&mut self) -> Option<NodeId> {
        let id = self.cur?;
        self.cur = self.proc.node(id).next;
        Some(id)
    }
}
