//! Fixed-capacity entity pools
//!
//! Every transient entity (obstacles, projectiles, effects, decorations) lives
//! in a pool sized once at startup. Spawning never allocates; when a pool is
//! exhausted the spawn is dropped and counted.

use serde::{Deserialize, Serialize};

/// Stable reference to a pool slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle(u16);

impl Handle {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Fixed-capacity recycler.
///
/// A slot is either on the free stack or in the active list, never both.
/// The active list keeps activation order so iteration is stable.
#[derive(Debug, Clone)]
pub struct Pool<T> {
    slots: Vec<T>,
    live: Vec<bool>,
    free: Vec<Handle>,
    active: Vec<Handle>,
    dropped: u32,
}

impl<T: Default> Pool<T> {
    /// Pre-allocate `capacity` slots (at most `u16::MAX`)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.min(u16::MAX as usize);
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, T::default);
        Self {
            slots,
            live: vec![false; capacity],
            // Reversed so the first acquire hands out slot 0
            free: (0..capacity as u16).rev().map(Handle).collect(),
            active: Vec::with_capacity(capacity),
            dropped: 0,
        }
    }
}

impl<T> Pool<T> {
    /// Take a free slot, or `None` if the pool is exhausted.
    ///
    /// The slot keeps whatever the previous occupant left in it; use
    /// [`Pool::spawn`] to initialise it in one step.
    pub fn acquire(&mut self) -> Option<Handle> {
        match self.free.pop() {
            Some(handle) => {
                self.live[handle.index()] = true;
                self.active.push(handle);
                Some(handle)
            }
            None => {
                self.dropped = self.dropped.saturating_add(1);
                log::trace!("pool exhausted ({} slots)", self.slots.len());
                None
            }
        }
    }

    /// Acquire a slot and store `value` in it
    pub fn spawn(&mut self, value: T) -> Option<Handle> {
        let handle = self.acquire()?;
        self.slots[handle.index()] = value;
        Some(handle)
    }

    /// Return a slot to the free stack.
    ///
    /// Releasing a slot that is not active is a caller bug; it trips a debug
    /// assertion and is otherwise ignored.
    pub fn release(&mut self, handle: Handle) -> bool {
        if !self.is_active(handle) {
            debug_assert!(false, "release of inactive pool slot {:?}", handle);
            return false;
        }
        if let Some(pos) = self.active.iter().position(|&h| h == handle) {
            self.active.remove(pos);
        }
        self.live[handle.index()] = false;
        self.free.push(handle);
        true
    }

    /// Return every active slot to the free stack
    pub fn release_all(&mut self) {
        for handle in self.active.drain(..) {
            self.live[handle.index()] = false;
            self.free.push(handle);
        }
    }

    #[inline]
    pub fn is_active(&self, handle: Handle) -> bool {
        self.live.get(handle.index()).copied().unwrap_or(false)
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        if self.is_active(handle) {
            self.slots.get(handle.index())
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        if self.is_active(handle) {
            self.slots.get_mut(handle.index())
        } else {
            None
        }
    }

    /// Active entities in activation order
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> + '_ {
        self.active.iter().map(|&h| (h, &self.slots[h.index()]))
    }

    /// Mutate every active entity in place
    pub fn for_each_mut(&mut self, mut f: impl FnMut(Handle, &mut T)) {
        for &handle in &self.active {
            f(handle, &mut self.slots[handle.index()]);
        }
    }

    /// Step every active entity; those for which `f` returns `false` are released.
    pub fn retain(&mut self, mut f: impl FnMut(Handle, &mut T) -> bool) {
        let mut i = 0;
        while i < self.active.len() {
            let handle = self.active[i];
            if f(handle, &mut self.slots[handle.index()]) {
                i += 1;
            } else {
                self.active.remove(i);
                self.live[handle.index()] = false;
                self.free.push(handle);
            }
        }
    }

    /// First active entity (in activation order) matching `pred`
    pub fn find(&self, mut pred: impl FnMut(&T) -> bool) -> Option<Handle> {
        self.active
            .iter()
            .copied()
            .find(|&h| pred(&self.slots[h.index()]))
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    #[inline]
    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    /// Spawns dropped because the pool was exhausted
    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conserved<T>(pool: &Pool<T>) -> bool {
        pool.free_len() + pool.active_len() == pool.capacity()
    }

    #[test]
    fn test_acquire_until_exhausted() {
        let mut pool: Pool<u32> = Pool::with_capacity(3);
        let a = pool.spawn(10).unwrap();
        let b = pool.spawn(20).unwrap();
        let c = pool.spawn(30).unwrap();
        assert_eq!(a.index(), 0);
        assert_ne!(a, b);
        assert_ne!(b, c);

        assert!(pool.spawn(40).is_none());
        assert_eq!(pool.dropped(), 1);
        assert_eq!(pool.active_len(), 3);
        assert!(conserved(&pool));
    }

    #[test]
    fn test_release_returns_slot() {
        let mut pool: Pool<u32> = Pool::with_capacity(2);
        let a = pool.spawn(1).unwrap();
        let _b = pool.spawn(2).unwrap();

        assert!(pool.release(a));
        assert!(!pool.is_active(a));
        assert!(pool.get(a).is_none());
        assert_eq!(pool.free_len(), 1);
        assert!(conserved(&pool));

        // Slot is reusable
        let c = pool.spawn(3).unwrap();
        assert_eq!(c, a);
        assert_eq!(pool.get(c), Some(&3));
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn test_double_release_is_ignored() {
        let mut pool: Pool<u32> = Pool::with_capacity(2);
        let a = pool.spawn(1).unwrap();
        assert!(pool.release(a));
        assert!(!pool.release(a));
        assert_eq!(pool.free_len(), 2);
        assert!(conserved(&pool));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "release of inactive pool slot")]
    fn test_double_release_asserts_in_debug() {
        let mut pool: Pool<u32> = Pool::with_capacity(2);
        let a = pool.spawn(1).unwrap();
        pool.release(a);
        pool.release(a);
    }

    #[test]
    fn test_retain_preserves_order_and_releases() {
        let mut pool: Pool<u32> = Pool::with_capacity(5);
        for v in 1..=5 {
            pool.spawn(v);
        }

        pool.retain(|_, v| *v % 2 == 1);

        let values: Vec<u32> = pool.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![1, 3, 5]);
        assert_eq!(pool.free_len(), 2);
        assert!(conserved(&pool));
    }

    #[test]
    fn test_release_all() {
        let mut pool: Pool<u32> = Pool::with_capacity(4);
        pool.spawn(1);
        pool.spawn(2);
        pool.release_all();
        assert_eq!(pool.active_len(), 0);
        assert_eq!(pool.free_len(), 4);
        assert!(conserved(&pool));
    }

    #[test]
    fn test_find_uses_activation_order() {
        let mut pool: Pool<u32> = Pool::with_capacity(4);
        let _ = pool.spawn(7);
        let second = pool.spawn(9).unwrap();
        let _ = pool.spawn(9);
        assert_eq!(pool.find(|v| *v == 9), Some(second));
        assert_eq!(pool.find(|v| *v == 100), None);
    }
}
