//! High-level IR: a procedure is an ordered list of basic blocks, each an
//! intrusive doubly-linked list of nodes, built directly by the parser
//! (`bsc-frontend`) with no separate AST stage.

mod block;
mod builder;
mod dump;
mod token;

pub use block::{Block, BlockIter, BlockId, Node, NodeIter, NodeId, Op, Proc};
pub use builder::HirBuilder;
pub use dump::dump;
pub use token::{Token, TokenKind};
