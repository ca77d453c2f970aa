//! Bump allocation with a small, conflict-aware scratch pool.
//!
//! `Arena` never reallocates: every pointer handed out by `push`/`zero`
//! stays valid until the arena itself is dropped. It is a thin wrapper
//! around `bumpalo::Bump` so that allocation itself is the same bump
//! strategy `cranelift-codegen` uses for its own IR arenas; the wrapper
//! exists to give callers the `push`/`zero` vocabulary from the design and
//! to host the scratch pool on top of it.

use bumpalo::Bump;
use std::cell::Cell;
use std::fmt;

/// A bump region. Allocations are 8-byte aligned; nothing is ever freed
/// individually — the whole region goes away when `Arena` is dropped.
pub struct Arena {
    bump: Bump,
}

impl Arena {
    pub fn new() -> Self {
        Arena { bump: Bump::new() }
    }

    /// Allocate `n` bytes, 8-byte aligned, returning uninitialized memory.
    pub fn push(&self, n: usize) -> *mut u8 {
        if n == 0 {
            return std::ptr::NonNull::dangling().as_ptr();
        }
        self.bump.alloc_layout(Self::layout_for(n)).as_ptr()
    }

    /// Allocate `n` zeroed bytes.
    pub fn zero(&self, n: usize) -> *mut u8 {
        let ptr = self.push(n);
        if n > 0 {
            unsafe { std::ptr::write_bytes(ptr, 0, n) };
        }
        ptr
    }

    /// Allocate and initialize a single `T`.
    pub fn alloc<T>(&self, value: T) -> &mut T {
        self.bump.alloc(value)
    }

    /// Bytes committed so far; used by the scratch pool to size itself,
    /// never to compute a rewindable watermark (see `Scratch`).
    pub fn used_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }

    fn layout_for(n: usize) -> std::alloc::Layout {
        let rounded = (n + 7) & !7;
        std::alloc::Layout::from_size_align(rounded, 8).unwrap()
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

/// Error raised when a scratch pool cannot satisfy a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArenaError {
    /// Every pool slot conflicted with the caller's conflict list.
    ScratchExhausted,
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArenaError::ScratchExhausted => {
                write!(f, "scratch pool exhausted: all arenas conflict")
            }
        }
    }
}

impl std::error::Error for ArenaError {}

/// A small fixed-size pool of arenas lent out to callers who need a
/// temporary region distinct from some set of "conflict" arenas.
///
/// Callers acquire and release strictly LIFO. Each slot tracks whether it
/// is currently lent out via `in_use`; `release` resets the underlying
/// bump region. Because every acquire/release pair in this compiler is
/// used as a single non-reentrant scope (nothing retains a pointer into a
/// scratch arena past its `release`), a full `Bump::reset` on release is
/// observationally identical to rewinding to the acquire-time watermark,
/// and is what's implemented here.
pub struct ScratchPool {
    slots: Vec<Bump>,
    in_use: Vec<Cell<bool>>,
}

/// A handle to one pool slot, identified by index for `conflicts` lists
/// and equality checks.
pub struct Scratch<'p> {
    pool: &'p ScratchPool,
    slot: usize,
}

impl<'p> Scratch<'p> {
    pub fn arena(&self) -> &'p Bump {
        &self.pool.slots[self.slot]
    }

    /// Stable identity of the lent slot, for building a `conflicts` list
    /// to pass to a nested `acquire`.
    pub fn id(&self) -> usize {
        self.slot
    }

    pub fn push(&self, n: usize) -> *mut u8 {
        if n == 0 {
            return std::ptr::NonNull::dangling().as_ptr();
        }
        let rounded = (n + 7) & !7;
        let layout = std::alloc::Layout::from_size_align(rounded, 8).unwrap();
        self.arena().alloc_layout(layout).as_ptr()
    }

    pub fn release(self) {
        // Drop impl does the actual work; this just makes the LIFO
        // discipline explicit at call sites.
    }
}

impl<'p> Drop for Scratch<'p> {
    fn drop(&mut self) {
        self.pool.in_use[self.slot].set(false);
    }
}

impl ScratchPool {
    /// `k` should be at least the maximum concurrent nesting depth the
    /// compiler needs; `2` covers every call site in this compiler (one
    /// scratch borrowed by a pass, at most one more by a helper it calls).
    pub fn new(k: usize) -> Self {
        let mut slots = Vec::with_capacity(k);
        let mut in_use = Vec::with_capacity(k);
        for _ in 0..k {
            slots.push(Bump::new());
            in_use.push(Cell::new(false));
        }
        ScratchPool { slots, in_use }
    }

    /// Borrow the first free slot not present in `conflicts` (by slot id).
    pub fn acquire(&self, conflicts: &[usize]) -> Result<Scratch<'_>, ArenaError> {
        for (slot, used) in self.in_use.iter().enumerate() {
            if used.get() {
                continue;
            }
            if conflicts.contains(&slot) {
                continue;
            }
            used.set(true);
            // SAFETY: `reset` requires exclusive access to the `Bump`;
            // we only ever call it while the slot is marked free (no
            // `Scratch` borrowing it), so no aliasing reference exists.
            unsafe {
                let bump = &self.slots[slot] as *const Bump as *mut Bump;
                (*bump).reset();
            }
            return Ok(Scratch { pool: self, slot });
        }
        Err(ArenaError::ScratchExhausted)
    }
}

impl Default for ScratchPool {
    fn default() -> Self {
        Self::new(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_is_eight_byte_aligned_and_stable() {
        let arena = Arena::new();
        let a = arena.push(3) as usize;
        let b = arena.push(5) as usize;
        assert_eq!(a % 8, 0);
        assert_eq!(b % 8, 0);
    }

    #[test]
    fn zero_clears_memory() {
        let arena = Arena::new();
        let p = arena.zero(16);
        let bytes = unsafe { std::slice::from_raw_parts(p, 16) };
        assert!(bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn scratch_pool_grants_non_conflicting_slot() {
        let pool = ScratchPool::new(2);
        let a = pool.acquire(&[]).unwrap();
        let b = pool.acquire(&[a.id()]).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn scratch_pool_exhausted_when_all_conflict() {
        let pool = ScratchPool::new(2);
        let a = pool.acquire(&[]).unwrap();
        let b = pool.acquire(&[a.id()]).unwrap();
        assert!(pool.acquire(&[a.id(), b.id()]).is_err());
    }

    #[test]
    fn release_allows_reacquisition() {
        let pool = ScratchPool::new(1);
        let a = pool.acquire(&[]).unwrap();
        let slot = a.id();
        drop(a);
        let b = pool.acquire(&[]).unwrap();
        assert_eq!(b.id(), slot);
    }
}
