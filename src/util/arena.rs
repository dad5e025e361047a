//! Generational arena backing the task table.
//!
//! Tasks are addressed by [`ArenaIndex`]: a slot number paired with a
//! generation counter. Removing a task bumps its slot's generation, so a
//! stale index held by an external wrapper misses cleanly instead of
//! resolving to an unrelated task that later reused the slot. This is the
//! non-owning lookup discipline the manager relies on: indices never extend
//! a task's lifetime.
//!
//! No unsafe code; bounds checks and generation validation do the work.

use core::fmt;

/// A slot number paired with a generation counter.
///
/// Two indices are equal only if both the slot and the generation match, so
/// an index taken before a slot was recycled can never alias the slot's new
/// occupant.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArenaIndex {
    slot: u32,
    generation: u32,
}

impl ArenaIndex {
    /// Builds an index from raw parts (test helper).
    #[inline]
    #[must_use]
    pub const fn new(slot: u32, generation: u32) -> Self {
        Self { slot, generation }
    }

    /// Returns the raw slot number.
    #[inline]
    #[must_use]
    pub const fn slot(self) -> u32 {
        self.slot
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for ArenaIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArenaIndex({}:{})", self.slot, self.generation)
    }
}

#[derive(Debug)]
struct Entry<T> {
    generation: u32,
    state: EntryState<T>,
}

#[derive(Debug)]
enum EntryState<T> {
    Full(T),
    Free { next: Option<u32> },
}

/// A generational slot arena.
///
/// Freed slots are chained into a free list and reused; every reuse bumps
/// the slot generation so outstanding indices to the old occupant go stale.
#[derive(Debug)]
pub struct Arena<T> {
    entries: Vec<Entry<T>>,
    free_head: Option<u32>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    /// Creates an empty arena.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            free_head: None,
            len: 0,
        }
    }

    /// Returns the number of occupied slots.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no slot is occupied.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts a value and returns its index.
    #[inline]
    pub fn insert(&mut self, value: T) -> ArenaIndex {
        self.insert_with(|_| value)
    }

    /// Inserts the value produced by `f`, which receives the index the value
    /// will live at.
    ///
    /// This lets records embed their own final identity without a
    /// placeholder-then-patch step.
    pub fn insert_with<F>(&mut self, f: F) -> ArenaIndex
    where
        F: FnOnce(ArenaIndex) -> T,
    {
        if let Some(slot) = self.free_head {
            let entry = &mut self.entries[slot as usize];
            let next = match entry.state {
                EntryState::Free { next } => next,
                EntryState::Full(_) => unreachable!("free list points at occupied slot"),
            };
            let index = ArenaIndex {
                slot,
                generation: entry.generation,
            };
            let value = f(index);
            self.entries[slot as usize].state = EntryState::Full(value);
            self.free_head = next;
            self.len += 1;
            index
        } else {
            let slot = u32::try_from(self.entries.len()).expect("arena slot overflow");
            let index = ArenaIndex {
                slot,
                generation: 0,
            };
            let value = f(index);
            self.entries.push(Entry {
                generation: 0,
                state: EntryState::Full(value),
            });
            self.len += 1;
            index
        }
    }

    /// Removes and returns the value at `index`.
    ///
    /// Returns `None` for a stale or never-issued index. The slot's
    /// generation is bumped, invalidating every outstanding copy of `index`.
    pub fn remove(&mut self, index: ArenaIndex) -> Option<T> {
        let entry = self.entries.get_mut(index.slot as usize)?;
        if entry.generation != index.generation || !matches!(entry.state, EntryState::Full(_)) {
            return None;
        }
        entry.generation = entry.generation.wrapping_add(1);
        let old = core::mem::replace(
            &mut entry.state,
            EntryState::Free {
                next: self.free_head,
            },
        );
        self.free_head = Some(index.slot);
        self.len -= 1;
        match old {
            EntryState::Full(value) => Some(value),
            EntryState::Free { .. } => unreachable!(),
        }
    }

    /// Returns a reference to the value at `index`, or `None` if stale.
    #[inline]
    #[must_use]
    pub fn get(&self, index: ArenaIndex) -> Option<&T> {
        match self.entries.get(index.slot as usize) {
            Some(Entry {
                generation,
                state: EntryState::Full(value),
            }) if *generation == index.generation => Some(value),
            _ => None,
        }
    }

    /// Returns a mutable reference to the value at `index`, or `None` if stale.
    #[inline]
    pub fn get_mut(&mut self, index: ArenaIndex) -> Option<&mut T> {
        match self.entries.get_mut(index.slot as usize) {
            Some(Entry {
                generation,
                state: EntryState::Full(value),
            }) if *generation == index.generation => Some(value),
            _ => None,
        }
    }

    /// Returns true if `index` resolves to a live value.
    #[must_use]
    pub fn contains(&self, index: ArenaIndex) -> bool {
        self.get(index).is_some()
    }
}
