//! An open-addressed hash set: linear probing, 0.5 load factor,
//! tombstoned removal, doubling from a base capacity of 8, generic
//! over `K: Hash + Eq`.

use rustc_hash::FxBuildHasher;
use std::hash::{BuildHasher, Hash, Hasher};

const BASE_CAPACITY: usize = 8;

#[derive(Clone)]
enum Slot<K> {
    Empty,
    Occupied(K),
    Removed,
}

/// Open-addressed set of `K`. Iteration order is unspecified.
#[derive(Clone)]
pub struct Set<K, S = FxBuildHasher> {
    slots: Vec<Slot<K>>,
    /// Occupied slots plus tombstones — what the 0.5 load factor check is
    /// measured against, so churn from remove/insert eventually forces a
    /// rehash that clears tombstones out.
    used: usize,
    /// Live entries only. What `len` reports.
    count: usize,
    hasher: S,
}

impl<K: Hash + Eq> Set<K, FxBuildHasher> {
    pub fn new() -> Self {
        Self::with_hasher(FxBuildHasher::default())
    }
}

impl<K: Hash + Eq> Default for Set<K, FxBuildHasher> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq, S: BuildHasher> Set<K, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Set {
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

    pub fn insert(&mut self, key: K) -> bool {
        if self.load_factor_exceeded() {
            self.grow();
        }
        self.insert_into(key)
    }

    /// `used` (occupied + tombstoned) only grows here: a truly-empty slot
    /// is the only case that increments it. Reoccupying a tombstone must
    /// not, or tombstones left by `remove` would never push the load
    /// factor over 0.5 and `grow` would never run to reclaim them.
    fn insert_into(&mut self, key: K) -> bool {
        let cap = self.capacity();
        let mut i = (self.hash(&key) as usize) % cap;
        for _ in 0..cap {
            match &self.slots[i] {
                Slot::Empty => {
                    self.used += 1;
                    self.count += 1;
                    self.slots[i] = Slot::Occupied(key);
                    return true;
                }
                Slot::Removed => {
                    self.count += 1;
                    self.slots[i] = Slot::Occupied(key);
                    return true;
                }
                Slot::Occupied(existing) if *existing == key => return false,
                Slot::Occupied(_) => {}
            }
            i = (i + 1) % cap;
        }
        unreachable!("open-addressed set: no free slot found below 0.5 load factor")
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
            if let Slot::Occupied(key) = slot {
                self.insert_into(key);
            }
        }
    }

    fn empty_slots(cap: usize) -> Vec<Slot<K>> {
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
                Slot::Occupied(existing) if existing == key => return Some(i),
                _ => {}
            }
            i = (i + 1) % cap;
        }
        None
    }

    pub fn contains(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    pub fn remove(&mut self, key: &K) -> bool {
        match self.find(key) {
            Some(i) => {
                self.slots[i] = Slot::Removed;
                self.count -= 1;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.slots.iter().filter_map(|s| match s {
            Slot::Occupied(k) => Some(k),
            _ => None,
        })
    }
}

impl<K: Hash + Eq + Clone> FromIterator<K> for Set<K, FxBuildHasher> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = Set::new();
        for k in iter {
            set.insert(k);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_contains_remove_round_trip() {
        let mut s = Set::new();
        assert!(s.insert(1));
        assert!(!s.insert(1));
        assert!(s.contains(&1));
        assert!(s.remove(&1));
        assert!(!s.contains(&1));
        assert!(!s.remove(&1));
    }

    #[test]
    fn grows_past_half_load() {
        let mut s = Set::new();
        for i in 0..100 {
            s.insert(i);
        }
        assert_eq!(s.len(), 100);
        for i in 0..100 {
            assert!(s.contains(&i));
        }
    }

    #[test]
    fn tombstone_churn_eventually_forces_a_rehash() {
        let mut s = Set::new();
        let cap_after_first_insert = {
            s.insert(0);
            s.capacity()
        };
        // Insert-then-remove a fresh key every round: `len()` never grows
        // past 1, but each tombstone left behind should still push `used`
        // over the load factor and force a compacting rehash.
        for i in 1..100 {
            s.insert(i);
            s.remove(&i);
        }
        assert_eq!(s.len(), 1);
        assert!(s.capacity() > cap_after_first_insert);
    }

    #[test]
    fn tombstone_does_not_break_later_lookups() {
        let mut s = Set::new();
        for i in 0..20 {
            s.insert(i);
        }
        for i in 0..10 {
            s.remove(&i);
        }
        for i in 10..20 {
            assert!(s.contains(&i));
        }
        for i in 0..10 {
            assert!(!s.contains(&i));
        }
    }
}
