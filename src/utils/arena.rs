//! Append-only node store addressed by typed handles.
//!
//! Every node of a function's IR lives in one of these arenas. Nodes are never freed
//! individually; removing something from the IR only unlinks it, and the whole region is released
//! when the owning function is dropped. Handles are dense `u32` indices, so a handle stays valid
//! for as long as its arena exists and cross references between nodes never dangle.
//!
//! # Example
//!
//! ```rust,ignore
//! index_type!(
//!     /// A handle
//!     ThingId, "t"
//! );
//!
//! let mut arena: Arena<&str, ThingId> = Arena::new();
//! let a = arena.alloc("a");
//! assert_eq!(arena[a], "a");
//! ```

use std::{
    fmt,
    marker::PhantomData,
    ops::{Index, IndexMut},
};

/// A typed handle into an [`Arena`].
///
/// Implemented by the types generated through `index_type!`.
pub trait ArenaIndex: Copy + Eq + fmt::Debug {
    /// Creates the handle for a raw slot index.
    fn from_index(index: usize) -> Self;

    /// Returns the raw slot index.
    fn index(self) -> usize;
}

/// Region allocator returning stable handles of type `I`.
pub struct Arena<T, I: ArenaIndex> {
    items: Vec<T>,
    _marker: PhantomData<fn() -> I>,
}

impl<T, I: ArenaIndex> Arena<T, I> {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Arena {
            items: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Creates an empty arena with room for `capacity` nodes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Arena {
            items: Vec::with_capacity(capacity),
            _marker: PhantomData,
        }
    }

    /// Stores a node and returns its handle.
    pub fn alloc(&mut self, item: T) -> I {
        let id = I::from_index(self.items.len());
        self.items.push(item);
        id
    }

    /// Stores the node built by `make`, which receives the handle the node will have.
    ///
    /// Used for nodes that record their own identity.
    pub fn alloc_with(&mut self, make: impl FnOnce(I) -> T) -> I {
        let id = I::from_index(self.items.len());
        self.items.push(make(id));
        id
    }

    /// Returns the handle the next allocation will receive.
    #[must_use]
    pub fn next_id(&self) -> I {
        I::from_index(self.items.len())
    }

    /// Returns the node for `id`, or `None` if the handle does not belong to this arena.
    #[must_use]
    pub fn get(&self, id: I) -> Option<&T> {
        self.items.get(id.index())
    }

    /// Mutable variant of [`Arena::get`].
    pub fn get_mut(&mut self, id: I) -> Option<&mut T> {
        self.items.get_mut(id.index())
    }

    /// Returns `true` if `id` addresses a node of this arena.
    #[must_use]
    pub fn contains(&self, id: I) -> bool {
        id.index() < self.items.len()
    }

    /// Number of nodes ever allocated.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if nothing has been allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over `(handle, node)` pairs in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| (I::from_index(i), item))
    }

    /// Iterates over all handles in allocation order.
    pub fn ids(&self) -> impl Iterator<Item = I> {
        (0..self.items.len()).map(I::from_index)
    }
}

impl<T, I: ArenaIndex> Default for Arena<T, I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone, I: ArenaIndex> Clone for Arena<T, I> {
    fn clone(&self) -> Self {
        Arena {
            items: self.items.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: fmt::Debug, I: ArenaIndex> fmt::Debug for Arena<T, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<T, I: ArenaIndex> Index<I> for Arena<T, I> {
    type Output = T;

    /// # Panics
    ///
    /// Aborts if the handle is out of range; a foreign handle is an IR invariant violation.
    fn index(&self, id: I) -> &T {
        match self.items.get(id.index()) {
            Some(item) => item,
            None => fatal!("{:?} out of range (arena holds {})", id, self.items.len()),
        }
    }
}

impl<T, I: ArenaIndex> IndexMut<I> for Arena<T, I> {
    fn index_mut(&mut self, id: I) -> &mut T {
        let len = self.items.len();
        match self.items.get_mut(id.index()) {
            Some(item) => item,
            None => fatal!("{:?} out of range (arena holds {})", id, len),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    index_type!(
        /// Test handle
        TestId, "t"
    );

    #[test]
    fn test_alloc_and_index() {
        let mut arena: Arena<&str, TestId> = Arena::new();
        let a = arena.alloc("a");
        let b = arena.alloc("b");
        assert_eq!(arena[a], "a");
        assert_eq!(arena[b], "b");
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.next_id(), TestId::new(2));
        assert!(arena.contains(b));
        assert!(!arena.contains(TestId::new(2)));
    }

    #[test]
    fn test_alloc_with_sees_own_handle() {
        let mut arena: Arena<TestId, TestId> = Arena::new();
        let id = arena.alloc_with(|id| id);
        assert_eq!(arena[id], id);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_foreign_handle_is_fatal() {
        let arena: Arena<u8, TestId> = Arena::new();
        let _ = arena[TestId::new(0)];
    }

    #[test]
    fn test_display_prefix() {
        assert_eq!(TestId::new(7).to_string(), "t7");
        assert_eq!(format!("{:?}", TestId::new(7)), "TestId(7)");
    }
}
