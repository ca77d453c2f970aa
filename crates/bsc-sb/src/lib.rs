mod graphviz;
mod lower;
mod node;
mod opt;
mod schedule;

pub use graphviz::dump as dump_graphviz;
pub use lower::lower;
pub use node::{sb_proc, Context, Node, NodeFlags, NodeId, Op, Proc, User};
pub use opt::opt;
pub use schedule::{schedule, Block, BlockId, Schedule};
