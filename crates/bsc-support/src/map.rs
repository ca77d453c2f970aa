//! An open-addressed `K -> V` map with the same probing/tombstone/growth
//! contract as `Set`, layering a value slot onto the same key table
//! shape.

use rustc_hash::FxBuildHasher;
use std::hash::{BuildHasher, Hash, Hasher};

const BASE_CAPACITY: usize = 8;

#[derive(Clone)]
enum Slot<K, V> {
    Empty,
    Occupied(K, V),
    Removed,
}

#[derive(Clone)]
pub struct Map<K, V, S = FxBuildHasher> {
    slots: Vec<Slot<K, V>>,
    /// Occupied slots plus tombstones — what the 0.5 load factor check is
    /// measured against, so churn from remove/insert eventually forces a
    /// rehash that clears tombstones out.
    used: usize,
    /// Live entries only. What `len` reports.
    count: usize,
    hasher: S,
}

impl<K: Hash + Eq, V> Map<K, V, FxBuildHasher> {
    pub fn new() -> Self {
        Self::with_hasher(FxBuildHasher::default())
    }
}

impl<K: Hash + Eq, V> Default for Map<K, V, FxBuildHasher> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> Map<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Map {
            slots: Vec::new(),
            used: 0,
            count: 0,
            hasher,
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn hash(&self, key: &K) -> u64 {
        let mut h = self.hasher.build_hasher();
        key.hash(&mut h);
        h.finish()
    }

    fn load_factor_exceeded(&self) -> bool {
        self.capacity() == 0 || (self.used as f64 / self.capacity() as f64) > 0.5
    }

    /// Insert `key -> value`, overwriting any prior value for `key` in
    /// place. Returns the previous value, if any.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if self.load_factor_exceeded() {
            self.grow();
        }
        self.insert_into(key, value)
    }

    /// `used` (occupied + tombstoned) only grows here: a truly-empty slot
    /// is the only case that increments it. Reoccupying a tombstone must
    /// not, or tombstones left by `remove` would never push the load
    /// factor over 0.5 and `grow` would never run to reclaim them.
    fn insert_into(&mut self, key: K, value: V) -> Option<V> {
        let cap = self.capacity();
        let mut i = (self.hash(&key) as usize) % cap;
        for _ in 0..cap {
            match &self.slots[i] {
                Slot::Empty => {
                    self.used += 1;
                    self.count += 1;
                    self.slots[i] = Slot::Occupied(key, value);
                    return None;
                }
                Slot::Removed => {
                    self.count += 1;
                    self.slots[i] = Slot::Occupied(key, value);
                    return None;
                }
                Slot::Occupied(existing, _) if *existing == key => {
                    let old = std::mem::replace(&mut self.slots[i], Slot::Occupied(key, value));
                    return match old {
                        Slot::Occupied(_, v) => Some(v),
                        _ => unreachable!(),
                    };
                }
                Slot::Occupied(..) => {}
            }
            i = (i + 1) % cap;
        }
        unreachable!("open-addressed map: no free slot found below 0.5 load factor")
    }

    fn grow(&mut self) {
        let new_cap = if self.capacity() == 0 {
            BASE_CAPACITY
        } else {
            self.capacity() * 2
        };
        let old = std::mem::replace(&mut self.slots, Self::empty_slots(new_cap));
        self.used = 0;
        self.count = 0;
        for slot in old {
            if let Slot::Occupied(k, v) = slot {
                self.insert_into(k, v);
            }
        }
    }

    fn empty_slots(cap: usize) -> Vec<Slot<K, V>> {
        (0..cap).map(|_| Slot::Empty).collect()
    }

    fn find(&self, key: &K) -> Option<usize> {
        let cap = self.capacity();
        if cap == 0 {
            return None;
        }
        let mut i = (self.hash(key) as usize) % cap;
        for _ in 0..cap {
            match &self.slots[i] {
                Slot::Empty => return None,
                Slot::Occupied(existing, _) if existing == key => return Some(i),
                _ => {}
            }
            i = (i + 1) % cap;
        }
        None
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.find(key).map(|i| match &self.slots[i] {
            Slot::Occupied(_, v) => v,
            _ => unreachable!(),
        })
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let i = self.find(key)?;
        match &mut self.slots[i] {
            Slot::Occupied(_, v) => Some(v),
            _ => unreachable!(),
        }
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let i = self.find(key)?;
        let old = std::mem::replace(&mut self.slots[i], Slot::Removed);
        self.count -= 1;
        match old {
            Slot::Occupied(_, v) => Some(v),
            _ => unreachable!(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.slots.iter().filter_map(|s| match s {
            Slot::Occupied(k, v) => Some((k, v)),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn insert_get_remove_round_trip() {
        let mut m = Map::new();
        assert_eq!(m.insert("a", 1), None);
        assert_eq!(m.insert("a", 2), Some(1));
        assert_eq!(m.get(&"a"), Some(&2));
        assert_eq!(m.remove(&"a"), Some(2));
        assert!(!m.contains_key(&"a"));
    }

    #[test]
    fn tombstone_churn_eventually_forces_a_rehash() {
        let mut m = Map::new();
        let cap_after_first_insert = {
            m.insert(0, 0);
            m.capacity()
        };
        for i in 1..100 {
            m.insert(i, i);
            m.remove(&i);
        }
        assert_eq!(m.len(), 1);
        assert!(m.capacity() > cap_after_first_insert);
    }

    #[test]
    fn matches_reference_map_over_random_ops() {
        // Deterministic pseudo-random sequence of insert/remove ops,
        // checked against `BTreeMap` as the reference implementation.
        let mut reference: BTreeMap<u32, u32> = BTreeMap::new();
        let mut map: Map<u32, u32> = Map::new();
        let mut state: u32 = 0x1234_5678;
        let mut next = || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state
        };

        for _ in 0..2000 {
            let key = next() % 50;
            if next() % 3 == 0 {
                reference.remove(&key);
                map.remove(&key);
            } else {
                let value = next();
                reference.insert(key, value);
                map.insert(key, value);
            }
        }

        for key in 0..50 {
            assert_eq!(reference.get(&key), map.get(&key), "key {key} diverged");
        }
        assert_eq!(reference.len(), map.len());
    }
}
