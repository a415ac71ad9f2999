//! Append-only arena giving blocks and wires stable, dense ids.
//!
//! Items are never reordered or dropped, so an id handed out once stays valid
//! for the arena's lifetime and ids compare in allocation order. Passes that
//! "remove" an item track it in a side set instead.

use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// Trait for opaque ID types used as arena keys.
pub trait ArenaId: Copy {
    /// Creates an ID from a raw `u32` index.
    fn from_raw(index: u32) -> Self;

    /// Returns the raw `u32` index.
    fn as_raw(self) -> u32;
}

/// Defines a `u32` newtype usable as an [`Arena`] key.
///
/// Generated ids are ordered by allocation index, which is what makes
/// `BTreeSet` iteration follow model order.
#[macro_export]
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl $crate::arena::ArenaId for $name {
            fn from_raw(index: u32) -> Self {
                Self(index)
            }

            fn as_raw(self) -> u32 {
                self.0
            }
        }
    };
}

/// A dense, ID-indexed container.
#[derive(Debug, Clone)]
pub struct Arena<I: ArenaId, T> {
    items: Vec<T>,
    _marker: PhantomData<I>,
}

impl<I: ArenaId, T> Default for Arena<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: ArenaId, T> Arena<I, T> {
    /// Creates a new, empty arena.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Returns the ID the next [`alloc`](Self::alloc) will hand out.
    pub fn next_id(&self) -> I {
        I::from_raw(self.items.len() as u32)
    }

    /// Allocates a new item and returns its ID.
    pub fn alloc(&mut self, item: T) -> I {
        let id = self.next_id();
        self.items.push(item);
        id
    }

    /// Returns the number of items ever allocated.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if nothing has been allocated.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over `(ID, &T)` pairs in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| (I::from_raw(i as u32), item))
    }

    /// Iterates over all allocated IDs in allocation order.
    pub fn ids(&self) -> impl Iterator<Item = I> {
        (0..self.items.len() as u32).map(I::from_raw)
    }
}

/// Panics if the ID was not allocated by this arena.
impl<I: ArenaId, T> Index<I> for Arena<I, T> {
    type Output = T;

    fn index(&self, id: I) -> &T {
        &self.items[id.as_raw() as usize]
    }
}

impl<I: ArenaId, T> IndexMut<I> for Arena<I, T> {
    fn index_mut(&mut self, id: I) -> &mut T {
        &mut self.items[id.as_raw() as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::BlockId;

    #[test]
    fn alloc_hands_out_sequential_ids() {
        let mut arena: Arena<BlockId, &str> = Arena::new();
        let a = arena.alloc("gain");
        let b = arena.alloc("sum");
        assert_eq!(a.as_raw(), 0);
        assert_eq!(b.as_raw(), 1);
        assert!(a < b);
        assert_eq!(arena[b], "sum");
    }

    #[test]
    fn next_id_predicts_alloc() {
        let mut arena: Arena<BlockId, u8> = Arena::new();
        arena.alloc(1);
        let predicted = arena.next_id();
        assert_eq!(arena.alloc(2), predicted);
    }

    #[test]
    fn index_mut_updates_in_place() {
        let mut arena: Arena<BlockId, String> = Arena::new();
        let id = arena.alloc("diff".to_string());
        arena[id].push_str("_f");
        assert_eq!(arena[id], "diff_f");
    }

    #[test]
    fn default_is_empty() {
        let arena: Arena<BlockId, u8> = Arena::default();
        assert!(arena.is_empty());
        assert_eq!(arena.len(), 0);
    }

    #[test]
    fn ids_follow_allocation_order() {
        let mut arena: Arena<BlockId, char> = Arena::new();
        for c in ['a', 'b', 'c'] {
            arena.alloc(c);
        }
        let raw: Vec<u32> = arena.ids().map(BlockId::as_raw).collect();
        assert_eq!(raw, vec![0, 1, 2]);
        let values: Vec<char> = arena.iter().map(|(_, c)| *c).collect();
        assert_eq!(values, vec!['a', 'b', 'c']);
    }
}
