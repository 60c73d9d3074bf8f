//! Handle-addressed storage split into two contiguous blocks.
//!
//! Records live in a dense `Vec`. Slots `[0, boundary)` form block one (the
//! active powders) and `[boundary, len)` form block two (the sleeping ones).
//! Moving a record between blocks, inserting and removing are all O(1) swaps
//! against the boundary or the tail of the vector.
//!
//! Callers never see slot indices. A [`Handle`] resolves through
//! `handle_to_slot`, and `slot_to_handle` is the reverse map that lets a swap
//! repair both sides. Every public method takes the store's single lock for
//! its full duration.

use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use powder_core::{Error, Handle, Result};
use std::collections::BTreeSet;

const VACANT: u32 = u32::MAX;

/// One of the two partitions of a [`PartitionedStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Block {
    /// Block one: records that are processed every tick.
    One,
    /// Block two: records that are skipped until woken.
    Two,
}

#[derive(Debug, Clone)]
struct Slots<T> {
    values: Vec<T>,
    slot_to_handle: Vec<u32>,
    handle_to_slot: Vec<u32>,
    /// Released handles below the highest live one, reused lowest first.
    gaps: BTreeSet<u32>,
    boundary: usize,
}

impl<T> Default for Slots<T> {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            slot_to_handle: Vec::new(),
            handle_to_slot: Vec::new(),
            gaps: BTreeSet::new(),
            boundary: 0,
        }
    }
}

impl<T> Slots<T> {
    fn slot_of(&self, handle: Handle) -> Result<usize> {
        match self.handle_to_slot.get(handle.index()) {
            Some(&slot) if slot != VACANT => Ok(slot as usize),
            _ => Err(Error::InvalidHandle(handle)),
        }
    }

    fn swap_slots(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.values.swap(a, b);
        self.slot_to_handle.swap(a, b);
        self.handle_to_slot[self.slot_to_handle[a] as usize] = a as u32;
        self.handle_to_slot[self.slot_to_handle[b] as usize] = b as u32;
    }

    fn allocate_handle(&mut self, slot: usize) -> u32 {
        match self.gaps.pop_first() {
            Some(handle) => {
                self.handle_to_slot[handle as usize] = slot as u32;
                handle
            }
            None => {
                let handle = self.handle_to_slot.len();
                assert!(handle < VACANT as usize, "partitioned store handle space exhausted");
                self.handle_to_slot.push(slot as u32);
                handle as u32
            }
        }
    }

    fn release_handle(&mut self, handle: u32) {
        self.handle_to_slot[handle as usize] = VACANT;

        if handle as usize + 1 == self.handle_to_slot.len() {
            self.handle_to_slot.pop();
            // Trailing gaps are now the top of the table; trim them as well.
            while let Some(top) = self.handle_to_slot.len().checked_sub(1) {
                if !self.gaps.remove(&(top as u32)) {
                    break;
                }
                self.handle_to_slot.pop();
            }
        } else {
            self.gaps.insert(handle);
        }
    }

    fn insert(&mut self, value: T, block: Block) -> Handle {
        let slot = self.values.len();
        self.values.push(value);
        let handle = self.allocate_handle(slot);
        self.slot_to_handle.push(handle);

        if block == Block::One {
            self.swap_slots(slot, self.boundary);
            self.boundary += 1;
        }

        Handle(handle)
    }

    fn remove(&mut self, handle: Handle) -> Result<T> {
        let mut slot = self.slot_of(handle)?;

        if slot < self.boundary {
            self.boundary -= 1;
            self.swap_slots(slot, self.boundary);
            slot = self.boundary;
        }

        let last = self.values.len() - 1;
        self.swap_slots(slot, last);
        self.slot_to_handle.pop();
        self.release_handle(handle.0);

        // `last` was populated, so the pop always yields the removed value.
        self.values.pop().ok_or(Error::InvalidHandle(handle))
    }

    fn move_to(&mut self, handle: Handle, block: Block) -> Result<()> {
        let slot = self.slot_of(handle)?;
        match block {
            Block::One if slot >= self.boundary => {
                self.swap_slots(slot, self.boundary);
                self.boundary += 1;
            }
            Block::Two if slot < self.boundary => {
                self.boundary -= 1;
                self.swap_slots(slot, self.boundary);
            }
            _ => {}
        }
        Ok(())
    }
}

/// Dense, thread-safe container of `T` with stable handles and two blocks.
#[derive(Debug)]
pub struct PartitionedStore<T> {
    inner: Mutex<Slots<T>>,
}

impl<T> Default for PartitionedStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for PartitionedStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Mutex::new(self.inner.lock().clone()),
        }
    }
}

impl<T> PartitionedStore<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Slots::default()),
        }
    }

    /// Insert at the edge of `block`, growing that block by one.
    pub fn insert(&self, value: T, block: Block) -> Handle {
        self.inner.lock().insert(value, block)
    }

    /// Remove a record and return it. The handle becomes free for reuse.
    pub fn remove_at(&self, handle: Handle) -> Result<T> {
        self.inner.lock().remove(handle)
    }

    /// Wake a record. No-op if it is already in block one.
    pub fn move_to_block_one(&self, handle: Handle) -> Result<()> {
        self.inner.lock().move_to(handle, Block::One)
    }

    /// Put a record to sleep. No-op if it is already in block two.
    pub fn move_to_block_two(&self, handle: Handle) -> Result<()> {
        self.inner.lock().move_to(handle, Block::Two)
    }

    /// Borrow a record. The store stays locked until the guard is dropped, so
    /// do not call back into the store while holding it.
    pub fn get(&self, handle: Handle) -> Option<MappedMutexGuard<'_, T>> {
        MutexGuard::try_map(self.inner.lock(), |slots| {
            let slot = slots.slot_of(handle).ok()?;
            slots.values.get_mut(slot)
        })
        .ok()
    }

    /// Mutably borrow a record. Same locking caveat as [`PartitionedStore::get`].
    pub fn get_mut(&self, handle: Handle) -> Option<MappedMutexGuard<'_, T>> {
        self.get(handle)
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.inner.lock().slot_of(handle).is_ok()
    }

    /// Which block a live record is in.
    pub fn block_of(&self, handle: Handle) -> Option<Block> {
        let slots = self.inner.lock();
        let slot = slots.slot_of(handle).ok()?;
        Some(if slot < slots.boundary { Block::One } else { Block::Two })
    }

    pub fn in_block_one(&self, handle: Handle) -> bool {
        self.block_of(handle) == Some(Block::One)
    }

    pub fn in_block_two(&self, handle: Handle) -> bool {
        self.block_of(handle) == Some(Block::Two)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().values.is_empty()
    }

    pub fn block_one_len(&self) -> usize {
        self.inner.lock().boundary
    }

    pub fn block_two_len(&self) -> usize {
        let slots = self.inner.lock();
        slots.values.len() - slots.boundary
    }

    /// Handles currently in `block`, in slot order.
    pub fn handles(&self, block: Block) -> Vec<Handle> {
        let slots = self.inner.lock();
        let range = match block {
            Block::One => 0..slots.boundary,
            Block::Two => slots.boundary..slots.values.len(),
        };
        slots.slot_to_handle[range].iter().map(|&h| Handle(h)).collect()
    }

    /// Drop every record and forget all handles.
    pub fn clear(&self) {
        *self.inner.lock() = Slots::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    fn assert_partition(store: &PartitionedStore<u32>) {
        assert_eq!(store.block_one_len() + store.block_two_len(), store.len());
    }

    #[test]
    fn test_insert_into_blocks() {
        let store = PartitionedStore::new();
        let a = store.insert(10, Block::One);
        let b = store.insert(20, Block::Two);
        let c = store.insert(30, Block::One);

        assert_eq!(store.len(), 3);
        assert_eq!(store.block_one_len(), 2);
        assert_eq!(store.block_two_len(), 1);
        assert!(store.in_block_one(a));
        assert!(store.in_block_two(b));
        assert!(store.in_block_one(c));

        assert_eq!(*store.get(a).unwrap(), 10);
        assert_eq!(*store.get(b).unwrap(), 20);
        assert_eq!(*store.get(c).unwrap(), 30);
    }

    #[test]
    fn test_move_between_blocks() {
        let store = PartitionedStore::new();
        let a = store.insert(1, Block::One);
        let b = store.insert(2, Block::One);

        store.move_to_block_two(a).unwrap();
        assert!(store.in_block_two(a));
        assert!(store.in_block_one(b));
        assert_eq!(store.block_one_len(), 1);

        // Already asleep: nothing changes.
        store.move_to_block_two(a).unwrap();
        assert_eq!(store.block_one_len(), 1);

        store.move_to_block_one(a).unwrap();
        store.move_to_block_one(a).unwrap();
        assert_eq!(store.block_one_len(), 2);
        assert_eq!(*store.get(a).unwrap(), 1);
        assert_eq!(*store.get(b).unwrap(), 2);
    }

    #[test]
    fn test_remove_active_and_sleeping() {
        let store = PartitionedStore::new();
        let a = store.insert(1, Block::One);
        let b = store.insert(2, Block::Two);
        let c = store.insert(3, Block::One);

        assert_eq!(store.remove_at(a).unwrap(), 1);
        assert_partition(&store);
        assert_eq!(store.block_one_len(), 1);
        assert!(!store.contains(a));

        assert_eq!(store.remove_at(b).unwrap(), 2);
        assert_eq!(store.block_two_len(), 0);
        assert_eq!(*store.get(c).unwrap(), 3);
        assert!(store.in_block_one(c));
    }

    #[test]
    fn test_remove_dead_handle_is_error() {
        let store = PartitionedStore::new();
        let a = store.insert(1, Block::One);
        store.remove_at(a).unwrap();

        assert!(matches!(store.remove_at(a), Err(Error::InvalidHandle(h)) if h == a));
        assert!(store.move_to_block_one(a).is_err());
        assert!(store.move_to_block_two(Handle(99)).is_err());
        assert!(store.get(a).is_none());
    }

    #[test]
    fn test_handle_reuse_prefers_gaps() {
        let store = PartitionedStore::new();
        let a = store.insert(1, Block::One);
        let b = store.insert(2, Block::One);
        let c = store.insert(3, Block::One);

        store.remove_at(a).unwrap();
        let d = store.insert(4, Block::One);
        assert_eq!(d, a);
        assert_eq!(*store.get(b).unwrap(), 2);
        assert_eq!(*store.get(c).unwrap(), 3);
        assert_eq!(*store.get(d).unwrap(), 4);
    }

    #[test]
    fn test_trailing_gaps_are_trimmed() {
        let store = PartitionedStore::new();
        let a = store.insert(1, Block::One);
        let b = store.insert(2, Block::One);
        let c = store.insert(3, Block::One);

        store.remove_at(b).unwrap();
        store.remove_at(c).unwrap();

        // b was parked as a gap, then trimmed along with c, so the next
        // handle continues straight after a.
        let d = store.insert(4, Block::Two);
        assert_eq!(d, Handle(a.0 + 1));
        assert_eq!(store.inner.lock().handle_to_slot.len(), 2);
        assert!(store.inner.lock().gaps.is_empty());
    }

    #[test]
    fn test_get_mut_writes_through() {
        let store = PartitionedStore::new();
        let a = store.insert(1, Block::Two);
        let b = store.insert(2, Block::One);

        *store.get_mut(a).unwrap() = 11;
        store.move_to_block_one(a).unwrap();
        store.move_to_block_two(b).unwrap();

        assert_eq!(*store.get(a).unwrap(), 11);
        assert_eq!(*store.get(b).unwrap(), 2);
    }

    #[test]
    fn test_handles_by_block() {
        let store = PartitionedStore::new();
        let a = store.insert(1, Block::One);
        let b = store.insert(2, Block::Two);

        assert_eq!(store.handles(Block::One), vec![a]);
        assert_eq!(store.handles(Block::Two), vec![b]);
    }

    #[test]
    fn test_clear() {
        let store = PartitionedStore::new();
        let a = store.insert(1, Block::One);
        store.insert(2, Block::Two);

        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.block_one_len(), 0);
        assert!(!store.contains(a));
        assert_eq!(store.insert(3, Block::One), Handle(0));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Insert(u32, bool),
        Remove(usize),
        Wake(usize),
        Sleep(usize),
        Write(usize, u32),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (any::<u32>(), any::<bool>()).prop_map(|(v, one)| Op::Insert(v, one)),
            2 => any::<usize>().prop_map(Op::Remove),
            2 => any::<usize>().prop_map(Op::Wake),
            2 => any::<usize>().prop_map(Op::Sleep),
            1 => (any::<usize>(), any::<u32>()).prop_map(|(i, v)| Op::Write(i, v)),
        ]
    }

    proptest! {
        #[test]
        fn prop_handles_stay_stable(ops in prop::collection::vec(op_strategy(), 1..200)) {
            let store = PartitionedStore::new();
            let mut expected: HashMap<Handle, (u32, Block)> = HashMap::new();
            let mut live: Vec<Handle> = Vec::new();

            for op in ops {
                match op {
                    Op::Insert(value, one) => {
                        let block = if one { Block::One } else { Block::Two };
                        let handle = store.insert(value, block);
                        prop_assert!(!expected.contains_key(&handle));
                        expected.insert(handle, (value, block));
                        live.push(handle);
                    }
                    Op::Remove(i) if !live.is_empty() => {
                        let handle = live.swap_remove(i % live.len());
                        let (value, _) = expected.remove(&handle).unwrap();
                        prop_assert_eq!(store.remove_at(handle).unwrap(), value);
                        prop_assert!(store.remove_at(handle).is_err());
                    }
                    Op::Wake(i) if !live.is_empty() => {
                        let handle = live[i % live.len()];
                        store.move_to_block_one(handle).unwrap();
                        expected.get_mut(&handle).unwrap().1 = Block::One;
                    }
                    Op::Sleep(i) if !live.is_empty() => {
                        let handle = live[i % live.len()];
                        store.move_to_block_two(handle).unwrap();
                        expected.get_mut(&handle).unwrap().1 = Block::Two;
                    }
                    Op::Write(i, value) if !live.is_empty() => {
                        let handle = live[i % live.len()];
                        *store.get_mut(handle).unwrap() = value;
                        expected.get_mut(&handle).unwrap().0 = value;
                    }
                    _ => {}
                }

                prop_assert_eq!(store.block_one_len() + store.block_two_len(), store.len());
                prop_assert_eq!(store.len(), expected.len());

                let active = expected.values().filter(|(_, b)| *b == Block::One).count();
                prop_assert_eq!(store.block_one_len(), active);

                for (&handle, &(value, block)) in &expected {
                    prop_assert_eq!(*store.get(handle).unwrap(), value);
                    prop_assert_eq!(store.block_of(handle), Some(block));
                    prop_assert!(store.in_block_one(handle) != store.in_block_two(handle));
                }
            }
        }
    }
}
