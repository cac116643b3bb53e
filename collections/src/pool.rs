use crate::ref_store::{Ref, RefVec};
use std::ops::{Index, IndexMut};

/// A recycling store of values addressed by typed handles.
///
/// `alloc` hands back a key either by reusing a released slot or by
/// appending a new one. Slots are value-typed and append-only, so a key
/// stays valid across any later growth; releasing a key merely marks its
/// slot for reuse (the stale value is overwritten by the next `alloc`).
///
/// The pool is the allocation substrate for search structures that churn
/// through millions of short-lived records: one `Vec` relocation on growth
/// replaces per-record heap traffic, and handle equality is integer
/// equality.
#[derive(Clone)]
pub struct Pool<K, V> {
    slots: RefVec<K, V>,
    free: Vec<K>,
}

impl<K: Ref, V> Default for Pool<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ref, V> Pool<K, V> {
    pub fn new() -> Self {
        Pool {
            slots: RefVec::new(),
            free: Vec::new(),
        }
    }

    /// Pre-reserves backing storage for `n` slots. Only an optimization:
    /// the pool grows past `n` on demand.
    pub fn with_capacity(n: usize) -> Self {
        Pool {
            slots: RefVec::with_capacity(n),
            free: Vec::with_capacity(n),
        }
    }

    /// Total number of slots ever created, free or not.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots currently available for reuse.
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Number of live allocations.
    pub fn in_use(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn alloc(&mut self, value: V) -> K {
        match self.free.pop() {
            Some(k) => {
                self.slots[k] = value;
                k
            }
            None => self.slots.push(value),
        }
    }

    /// Returns `k`'s slot to the free list. The caller must not use `k`
    /// afterwards: the slot's content is unspecified until re-allocated.
    pub fn release(&mut self, k: K) {
        debug_assert!(
            !self.free.iter().any(|f| *f == k),
            "slot released twice"
        );
        self.free.push(k);
    }

    pub fn get(&self, k: K) -> &V {
        &self.slots[k]
    }

    pub fn get_mut(&mut self, k: K) -> &mut V {
        &mut self.slots[k]
    }
}

impl<K: Ref, V> Index<K> for Pool<K, V> {
    type Output = V;

    fn index(&self, index: K) -> &Self::Output {
        self.get(index)
    }
}

impl<K: Ref, V> IndexMut<K> for Pool<K, V> {
    fn index_mut(&mut self, index: K) -> &mut Self::Output {
        self.get_mut(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_ref_type;

    create_ref_type!(Id);

    #[test]
    fn alloc_reuses_released_slots() {
        let mut pool: Pool<Id, u64> = Pool::new();
        let a = pool.alloc(1);
        let b = pool.alloc(2);
        assert_eq!(pool.capacity(), 2);

        pool.release(a);
        let c = pool.alloc(3);
        assert_eq!(c, a, "released slot should be handed out again");
        assert_eq!(pool[c], 3);
        assert_eq!(pool[b], 2);
        assert_eq!(pool.capacity(), 2, "no growth while a free slot exists");
    }

    #[test]
    fn handles_stable_across_growth() {
        let mut pool: Pool<Id, usize> = Pool::with_capacity(4);
        let keys: Vec<Id> = (0..10_000).map(|v| pool.alloc(v)).collect();
        for (expected, k) in keys.iter().enumerate() {
            assert_eq!(pool[*k], expected);
        }
    }

    #[test]
    fn balance_after_release_all() {
        let mut pool: Pool<Id, i32> = Pool::new();
        let keys: Vec<Id> = (0..100).map(|v| pool.alloc(v)).collect();
        assert_eq!(pool.in_use(), 100);
        for k in keys {
            pool.release(k);
        }
        assert_eq!(pool.free_count(), pool.capacity());
        assert_eq!(pool.in_use(), 0);
    }
}
