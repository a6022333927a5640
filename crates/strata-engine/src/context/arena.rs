use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Generational handle into an [`Arena<T>`].
///
/// A handle stays valid until its slot is freed; reusing the slot bumps the
/// generation so stale handles are rejected in O(1).
pub struct Handle<T> {
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    #[inline]
    const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation, _marker: PhantomData }
    }

    #[inline]
    pub fn index(self) -> u32 {
        self.index
    }

    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl<T> Copy for Handle<T> {}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}v{})", self.index, self.generation)
    }
}

#[derive(Debug)]
enum Slot<T> {
    Occupied { generation: u32, value: T },
    Free { generation: u32, next_free: Option<u32> },
}

/// Slot storage with a free list.
#[derive(Debug)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<u32>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    #[inline]
    pub const fn new() -> Self {
        Self { slots: Vec::new(), free_head: None, len: 0 }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn insert(&mut self, value: T) -> Handle<T> {
        self.len += 1;
        if let Some(index) = self.free_head {
            let slot = &mut self.slots[index as usize];
            if let Slot::Free { generation, next_free } = *slot {
                self.free_head = next_free;
                *slot = Slot::Occupied { generation, value };
                return Handle::new(index, generation);
            }
            debug_assert!(false, "free list points at an occupied slot");
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot::Occupied { generation: 0, value });
        Handle::new(index, 0)
    }

    #[inline]
    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.get(handle).is_some()
    }

    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        match self.slots.get(handle.index as usize) {
            Some(Slot::Occupied { generation, value }) if *generation == handle.generation => Some(value),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        match self.slots.get_mut(handle.index as usize) {
            Some(Slot::Occupied { generation, value }) if *generation == handle.generation => Some(value),
            _ => None,
        }
    }

    /// Mutable access to `a` alongside shared access to `b`; `None` when
    /// either handle is invalid or both name the same slot.
    pub fn get_pair(&mut self, a: Handle<T>, b: Handle<T>) -> Option<(&mut T, &T)> {
        if a.index == b.index || !self.contains(a) || !self.contains(b) {
            return None;
        }
        let (ai, bi) = (a.index as usize, b.index as usize);
        let (sa, sb) = if ai < bi {
            let (lo, hi) = self.slots.split_at_mut(bi);
            (&mut lo[ai], &hi[0])
        } else {
            let (lo, hi) = self.slots.split_at_mut(ai);
            (&mut hi[0], &lo[bi])
        };
        match (sa, sb) {
            (Slot::Occupied { value: va, .. }, Slot::Occupied { value: vb, .. }) => Some((va, vb)),
            _ => None,
        }
    }

    /// Frees the slot and returns its value; the slot's next occupant gets a
    /// new generation.
    pub fn remove(&mut self, handle: Handle<T>) -> Option<T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        match slot {
            Slot::Occupied { generation, .. } if *generation == handle.generation => {}
            _ => return None,
        }
        let freed = Slot::Free {
            generation: handle.generation.wrapping_add(1),
            next_free: self.free_head,
        };
        let Slot::Occupied { value, .. } = std::mem::replace(slot, freed) else {
            return None;
        };
        self.free_head = Some(handle.index);
        self.len -= 1;
        Some(value)
    }

    /// Removes every value, invalidating all handles.
    pub fn clear(&mut self) {
        for index in 0..self.slots.len() {
            if let Slot::Occupied { generation, .. } = self.slots[index] {
                self.slots[index] = Slot::Free {
                    generation: generation.wrapping_add(1),
                    next_free: self.free_head,
                };
                self.free_head = Some(index as u32);
            }
        }
        self.len = 0;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| match slot {
            Slot::Occupied { generation, value } => Some((Handle::new(i as u32, *generation), value)),
            Slot::Free { .. } => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_get_remove() {
        let mut a = Arena::new();
        let h = a.insert("one");
        assert_eq!(a.get(h), Some(&"one"));
        assert_eq!(a.len(), 1);
        assert_eq!(a.remove(h), Some("one"));
        assert!(a.get(h).is_none());
        assert!(a.remove(h).is_none());
        assert!(a.is_empty());
    }

    #[test]
    fn reused_slot_rejects_stale_handle() {
        let mut a = Arena::new();
        let old = a.insert(1);
        a.remove(old);
        let new = a.insert(2);
        assert_eq!(new.index(), old.index());
        assert_ne!(new.generation(), old.generation());
        assert!(a.get(old).is_none());
        assert_eq!(a.get(new), Some(&2));
    }

    #[test]
    fn clear_invalidates_everything() {
        let mut a = Arena::new();
        let h1 = a.insert(1);
        let h2 = a.insert(2);
        a.clear();
        assert!(!a.contains(h1) && !a.contains(h2));
        let h3 = a.insert(3);
        assert_eq!(a.iter().count(), 1);
        assert_eq!(a.get(h3), Some(&3));
    }

    #[test]
    fn iter_skips_free_slots() {
        let mut a = Arena::new();
        let h1 = a.insert('a');
        let _h2 = a.insert('b');
        a.remove(h1);
        let values: Vec<char> = a.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec!['b']);
    }

    #[test]
    fn pair_access_needs_distinct_live_slots() {
        let mut arena = Arena::new();
        let a = arena.insert(1);
        let b = arena.insert(2);
        {
            let (x, y) = arena.get_pair(b, a).unwrap();
            *x += *y;
        }
        assert_eq!(arena.get(b), Some(&3));
        assert!(arena.get_pair(a, a).is_none());
        arena.remove(b);
        assert!(arena.get_pair(a, b).is_none());
    }
}
