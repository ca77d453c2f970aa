//! A cursor-based builder for `Proc`: the parser appends nodes to
//! whichever block is currently open and links new blocks onto the
//! tail of the block list. Append-only: nothing is ever inserted in
//! the middle or removed once pushed.

use crate::block::{Block, BlockId, Node, NodeId, Op, Proc};
use crate::token::Token;
use bsc_support::EntityRef;

pub struct HirBuilder {
    blocks: Vec<Block>,
    nodes: Vec<Node>,
    control_flow_head: Option<BlockId>,
    tail: Option<BlockId>,
    current: Option<BlockId>,
}

impl HirBuilder {
    pub fn new() -> Self {
        HirBuilder {
            blocks: Vec::new(),
            nodes: Vec::new(),
            control_flow_head: None,
            tail: None,
            current: None,
        }
    }

    /// Append a new, empty block to the end of the block list and make
    /// it current. Returns its id.
    pub fn new_block(&mut self) -> BlockId {
        let id = BlockId::new(self.blocks.len());
        self.blocks.push(Block {
            next: None,
            start: None,
            end: None,
        });
        if let Some(tail) = self.tail {
            self.blocks[tail.index()].next = Some(id);
        } else {
            self.control_flow_head = Some(id);
        }
        self.tail = Some(id);
        self.current = Some(id);
        id
    }

    /// The block the builder is currently appending to.
    pub fn current_block(&self) -> BlockId {
        self.current.expect("no block open")
    }

    /// Switch back to appending onto an already-created block, e.g. when
    /// resuming a loop header after emitting its body.
    pub fn switch_to(&mut self, block: BlockId) {
        self.current = Some(block);
    }

    /// Append a node with the given op and source token onto the current
    /// block, returning its id.
    pub fn push_node(&mut self, op: Op, token: Token) -> NodeId {
        let block = self.current_block();
        let id = NodeId::new(self.nodes.len());
        let prev = self.blocks[block.index()].end;
        self.nodes.push(Node {
            block,
            prev,
            next: None,
            op,
            token,
        });
        match prev {
            Some(p) => self.nodes[p.index()].next = Some(id),
            None => self.blocks[block.index()].start = Some(id),
        }
        self.blocks[block.index()].end = Some(id);
        id
    }

    pub fn node_op(&self, id: NodeId) -> &Op {
        &self.nodes[id.index()].op
    }

    pub fn node_op_mut(&mut self, id: NodeId) -> &mut Op {
        &mut self.nodes[id.index()].op
    }

    pub fn node_token(&self, id: NodeId) -> Token {
        self.nodes[id.index()].token
    }

    pub fn finish(self) -> Proc {
        Proc {
            blocks: self.blocks,
            nodes: self.nodes,
            control_flow_head: self
                .control_flow_head
                .expect("a procedure must contain at least one block"),
        }
    }
}

impl Default for HirBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    fn tok() -> Token {
        Token {
            kind: TokenKind::IntLiteral,
            start: 0,
            length: 1,
            line: 1,
        }
    }

    #[test]
    fn blocks_link_in_creation_order() {
        let mut b = HirBuilder::new();
        let b0 = b.new_block();
        let b1 = b.new_block();
        let proc = b.finish();
        assert_eq!(proc.control_flow_head, b0);
        assert_eq!(proc.block(b0).next, Some(b1));
        assert_eq!(proc.block(b1).next, None);
    }

    #[test]
    fn nodes_append_in_order_within_a_block() {
        let mut b = HirBuilder::new();
        b.new_block();
        let n0 = b.push_node(Op::IntConst(1), tok());
        let n1 = b.push_node(Op::IntConst(2), tok());
        let proc = b.finish();
        let ids: Vec<_> = proc.nodes_in(proc.control_flow_head).collect();
        assert_eq!(ids, vec![n0, n1]);
    }

    #[test]
    fn every_nodes_block_field_matches_its_containing_list() {
        let mut b = HirBuilder::new();
        b.new_block();
        b.push_node(Op::IntConst(1), tok());
        b.new_block();
        b.push_node(Op::IntConst(2), tok());
        b.push_node(Op::IntConst(3), tok());
        let proc = b.finish();

        for block in proc.blocks() {
            for node in proc.nodes_in(block) {
                assert_eq!(proc.node(node).block, block);
            }
        }
    }
}
