//! Entity references: small `Copy` index types used in place of pointers
//! for HIR and SB node/block identities, plus `SecondaryMap`, a
//! densely-indexed `K -> V` map keyed on them.
//!
//! This is the same shape as `cranelift-entity`'s `EntityRef` +
//! `entity_impl!` + `SecondaryMap`, scaled down to what this compiler
//! needs (no `PackedOption`, no reserved-value compaction tricks — the
//! ids here never appear in a hot struct field where doubling the size
//! would matter).

use std::fmt;
use std::marker::PhantomData;

/// A densely numbered reference to some entity (an HIR block, an HIR
/// node, an SB node, ...). Implementors wrap a `u32` index.
pub trait EntityRef: Copy + Eq {
    fn new(index: usize) -> Self;
    fn index(self) -> usize;
}

/// Declares a newtype entity reference with the `EntityRef` plumbing and
/// a `Display` impl using `prefix` (e.g. `block` -> `block3`).
#[macro_export]
macro_rules! entity_impl {
    ($name:ident, $prefix:expr) => {
        impl $crate::EntityRef for $name {
            fn new(index: usize) -> Self {
                debug_assert!(index < (u32::MAX as usize));
                $name(index as u32)
            }

            fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                (self as &dyn ::std::fmt::Display).fmt(f)
            }
        }
    };
}

pub use entity_impl;

/// A mapping `K -> V` for densely indexed entity references, backed by a
/// plain `Vec`. Reads of untouched keys return the map's default value;
/// writes grow the backing vector as needed. Iteration order follows
/// index order.
#[derive(Clone)]
pub struct SecondaryMap<K: EntityRef, V: Clone> {
    elems: Vec<V>,
    default: V,
    marker: PhantomData<K>,
}

impl<K: EntityRef, V: Clone + Default> SecondaryMap<K, V> {
    pub fn new() -> Self {
        Self::with_default(V::default())
    }
}

impl<K: EntityRef, V: Clone + Default> Default for SecondaryMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: EntityRef, V: Clone> SecondaryMap<K, V> {
    pub fn with_default(default: V) -> Self {
        SecondaryMap {
            elems: Vec::new(),
            default,
            marker: PhantomData,
        }
    }

    pub fn get(&self, k: K) -> Option<&V> {
        self.elems.get(k.index())
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    pub fn clear(&mut self) {
        self.elems.clear();
    }

    fn resize(&mut self, n: usize) {
        self.elems.resize(n, self.default.clone());
    }
}

impl<K: EntityRef, V: Clone> std::ops::Index<K> for SecondaryMap<K, V> {
    type Output = V;
    fn index(&self, k: K) -> &V {
        self.get(k).unwrap_or(&self.default)
    }
}

impl<K: EntityRef, V: Clone> std::ops::IndexMut<K> for SecondaryMap<K, V> {
    fn index_mut(&mut self, k: K) -> &mut V {
        let i = k.index();
        if i >= self.elems.len() {
            self.resize(i + 1);
        }
        &mut self.elems[i]
    }
}

impl<K: EntityRef + fmt::Debug, V: Clone + fmt::Debug> fmt::Debug for SecondaryMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.elems.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Copy, Clone, PartialEq, Eq)]
    struct TestId(u32);
    entity_impl!(TestId, "t");

    #[test]
    fn display_uses_prefix() {
        assert_eq!(TestId::new(3).to_string(), "t3");
    }

    #[test]
    fn secondary_map_default_and_growth() {
        let mut m: SecondaryMap<TestId, i32> = SecondaryMap::new();
        assert_eq!(m[TestId::new(0)], 0);
        m[TestId::new(5)] = 42;
        assert_eq!(m[TestId::new(5)], 42);
        assert_eq!(m[TestId::new(2)], 0);
        assert_eq!(m.len(), 6);
    }
}
