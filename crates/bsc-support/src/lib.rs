//! Shared low-level plumbing for the `bs` compiler: bump arenas with a
//! conflict-aware scratch pool, an entity-reference macro, and the
//! open-addressed containers the rest of the workspace is built on.
//!
//! Everything here is single-threaded and synchronous; none of these
//! types are `Sync`.

mod arena;
mod entity;
mod map;
mod seq;
mod set;
mod worklist;

pub use arena::{Arena, ArenaError, Scratch, ScratchPool};
pub use entity::{EntityRef, SecondaryMap};
pub use map::Map;
pub use seq::Sequence;
pub use set::Set;
pub use worklist::Worklist;
