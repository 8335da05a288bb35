//! Thread-safe unordered bag
//!
//! A growable collection of caller-owned handles guarded by a
//! [`FairRwLock`]. The bag permits duplicates and makes no ordering
//! promise: removal swaps the last element into the vacated slot, so
//! iteration order does not survive a removal.
//!
//! `get` and `find_first` are reader operations and run concurrently;
//! `insert` and `remove` are writer operations and run exclusively, per
//! the lock's writer-preference contract. Callers that need several
//! operations under one acquisition (a scan followed by an insert, or a
//! full-membership traversal) use [`Bag::read`] / [`Bag::write`] and
//! compose on the guard.

use crate::error::RelayError;
use crate::rwlock::{FairRwLock, ReadGuard, WriteGuard};

/// Unordered, growable, duplicate-permitting collection of `T` handles.
#[derive(Debug)]
pub struct Bag<T> {
    slots: FairRwLock<Vec<T>>,
}

impl<T> Bag<T> {
    /// Create an empty bag. Allocates nothing until the first insert.
    pub fn new() -> Self {
        Self {
            slots: FairRwLock::new(Vec::new()),
        }
    }

    /// Acquire shared access for composing several read operations
    /// under one consistent snapshot.
    pub fn read(&self) -> BagReadGuard<'_, T> {
        BagReadGuard {
            slots: self.slots.read(),
        }
    }

    /// Acquire exclusive access for composing reads and mutations as one
    /// atomic operation against the bag.
    pub fn write(&self) -> BagWriteGuard<'_, T> {
        BagWriteGuard {
            slots: self.slots.write(),
        }
    }

    /// Number of elements currently present.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the bag holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append an element. Amortized O(1); capacity doubles when full,
    /// starting at 1, and a failed growth leaves the bag unchanged.
    pub fn insert(&self, element: T) -> Result<(), RelayError> {
        self.write().insert(element)
    }

    /// Remove and return the element at `index` by swapping the last
    /// element into its slot. O(1), order-destroying.
    pub fn remove(&self, index: usize) -> Result<T, RelayError> {
        self.write().remove(index)
    }

    /// Linear scan from `start` for the first element matching `pred`,
    /// returning its index. Passing a previous hit + 1 as `start` resumes
    /// the scan past it.
    pub fn find_first<F>(&self, start: usize, pred: F) -> Result<usize, RelayError>
    where
        F: FnMut(&T) -> bool,
    {
        self.read().find_first(start, pred)
    }
}

impl<T: Clone> Bag<T> {
    /// Return a clone of the handle at `index`.
    pub fn get(&self, index: usize) -> Result<T, RelayError> {
        self.read().get(index).cloned()
    }
}

impl<T> Default for Bag<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn element_at<T>(items: &[T], index: usize) -> Result<&T, RelayError> {
    items
        .get(index)
        .ok_or_else(|| RelayError::bad_index(index, items.len()))
}

fn scan_from<T, F>(items: &[T], start: usize, mut pred: F) -> Result<usize, RelayError>
where
    F: FnMut(&T) -> bool,
{
    items
        .iter()
        .enumerate()
        .skip(start)
        .find(|(_, item)| pred(item))
        .map(|(index, _)| index)
        .ok_or(RelayError::NotFound)
}

/// Shared view of the bag, held for the lifetime of one read acquisition.
#[derive(Debug)]
pub struct BagReadGuard<'a, T> {
    slots: ReadGuard<'a, Vec<T>>,
}

impl<T> BagReadGuard<'_, T> {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&T, RelayError> {
        element_at(&self.slots, index)
    }

    pub fn find_first<F>(&self, start: usize, pred: F) -> Result<usize, RelayError>
    where
        F: FnMut(&T) -> bool,
    {
        scan_from(&self.slots, start, pred)
    }

    /// Iterate every element in the snapshot.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.slots.iter()
    }
}

/// Exclusive view of the bag, held for the lifetime of one write
/// acquisition.
#[derive(Debug)]
pub struct BagWriteGuard<'a, T> {
    slots: WriteGuard<'a, Vec<T>>,
}

impl<T> BagWriteGuard<'_, T> {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&T, RelayError> {
        element_at(&self.slots, index)
    }

    pub fn find_first<F>(&self, start: usize, pred: F) -> Result<usize, RelayError>
    where
        F: FnMut(&T) -> bool,
    {
        scan_from(&self.slots, start, pred)
    }

    pub fn insert(&mut self, element: T) -> Result<(), RelayError> {
        if self.slots.len() == self.slots.capacity() {
            let target = match self.slots.capacity() {
                0 => 1,
                cap => cap * 2,
            };
            let additional = target - self.slots.len();
            self.slots.try_reserve_exact(additional)?;
        }
        self.slots.push(element);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<T, RelayError> {
        if index >= self.slots.len() {
            return Err(RelayError::bad_index(index, self.slots.len()));
        }
        Ok(self.slots.swap_remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_insert_and_get() {
        let bag = Bag::new();
        bag.insert("a").unwrap();
        bag.insert("b").unwrap();

        assert_eq!(bag.len(), 2);
        assert_eq!(bag.get(0).unwrap(), "a");
        assert_eq!(bag.get(1).unwrap(), "b");
    }

    #[test]
    fn test_get_out_of_range_is_invalid_argument() {
        let bag: Bag<u32> = Bag::new();
        assert!(matches!(
            bag.get(0),
            Err(RelayError::InvalidArgument(_))
        ));

        bag.insert(1).unwrap();
        assert!(matches!(
            bag.get(1),
            Err(RelayError::InvalidArgument(_))
        ));
        assert!(matches!(
            bag.remove(1),
            Err(RelayError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_capacity_doubles_from_one() {
        let bag = Bag::new();
        let mut observed = Vec::new();
        for i in 0..9 {
            bag.insert(i).unwrap();
            observed.push(bag.read().slots.capacity());
        }
        assert_eq!(observed, vec![1, 2, 4, 4, 8, 8, 8, 8, 16]);
    }

    #[test]
    fn test_remove_swaps_last_into_slot() {
        let bag = Bag::new();
        for item in ["a", "b", "c", "d"] {
            bag.insert(item).unwrap();
        }

        let removed = bag.remove(1).unwrap();
        assert_eq!(removed, "b");
        assert_eq!(bag.len(), 3);
        // Previously-last element now occupies the vacated slot.
        assert_eq!(bag.get(1).unwrap(), "d");

        // Removing the last slot moves nothing.
        let removed = bag.remove(2).unwrap();
        assert_eq!(removed, "c");
        assert_eq!(bag.len(), 2);
    }

    #[test]
    fn test_find_first_resumes_past_prior_hit() {
        let bag = Bag::new();
        for item in ["a", "b", "a"] {
            bag.insert(item).unwrap();
        }

        let first = bag.find_first(0, |item| *item == "a").unwrap();
        assert_eq!(first, 0);

        let second = bag.find_first(first + 1, |item| *item == "a").unwrap();
        assert_eq!(second, 2);

        assert!(matches!(
            bag.find_first(second + 1, |item| *item == "a"),
            Err(RelayError::NotFound)
        ));
    }

    #[test]
    fn test_find_first_past_end_is_not_found() {
        let bag = Bag::new();
        bag.insert(1).unwrap();
        assert!(matches!(
            bag.find_first(5, |_| true),
            Err(RelayError::NotFound)
        ));
    }

    #[test]
    fn test_composed_scan_and_insert_under_one_guard() {
        let bag = Bag::new();
        bag.insert(10).unwrap();

        let mut guard = bag.write();
        assert!(guard.find_first(0, |item| *item == 20).is_err());
        guard.insert(20).unwrap();
        drop(guard);

        assert_eq!(bag.len(), 2);
    }

    #[test]
    fn test_concurrent_inserts_and_removes_converge() {
        const INSERTERS: usize = 4;
        const REMOVERS: usize = 4;
        const INSERTS_EACH: usize = 250;
        const REMOVES_EACH: usize = 100;

        let bag = Arc::new(Bag::new());
        let mut handles = Vec::new();

        for worker in 0..INSERTERS {
            let bag = Arc::clone(&bag);
            handles.push(thread::spawn(move || {
                for i in 0..INSERTS_EACH {
                    bag.insert(worker * INSERTS_EACH + i).unwrap();
                }
            }));
        }

        for _ in 0..REMOVERS {
            let bag = Arc::clone(&bag);
            handles.push(thread::spawn(move || {
                let mut removed = 0;
                while removed < REMOVES_EACH {
                    // More inserts than removes overall, so retrying on an
                    // empty bag always terminates.
                    if bag.remove(0).is_ok() {
                        removed += 1;
                    }
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(
            bag.len(),
            INSERTERS * INSERTS_EACH - REMOVERS * REMOVES_EACH
        );
    }
}
