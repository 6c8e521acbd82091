//! # Registry: Generational Handles for Backend Resources
//!
//! Backends own their GPU objects; the rest of the crate only ever holds a
//! [`Handle`]. A handle is a slot index paired with a generation counter:
//! when a slot is freed its generation is bumped, so a stale handle that
//! survives the free is detected instead of silently aliasing whatever gets
//! allocated into the slot next.
//!
//! ```text
//! slots:     [Some(tex A, gen 0), None (gen 1), Some(tex C, gen 0)]
//! free_list: [1]
//!
//! Handle { index: 1, generation: 0 }  ← freed, lookup fails
//! Handle { index: 1, generation: 1 }  ← next allocation into slot 1
//! ```

use std::fmt;

/// An index + generation pair identifying a live slot in a [`Registry`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    /// Raw slot index. Useful for diagnostics, not for lookups.
    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot storage addressed by generational [`Handle`]s.
pub struct Registry<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Store a value, reusing a freed slot if one is available.
    pub fn insert(&mut self, value: T) -> Handle {
        if let Some(index) = self.free_list.pop() {
            // Generation was already bumped when the slot was freed.
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            Handle {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                value: Some(value),
            });
            Handle {
                index,
                generation: 0,
            }
        }
    }

    /// Remove and return the value. Returns `None` if the handle is stale.
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(handle.index);
        Some(value)
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation == handle.generation {
            slot.value.as_ref()
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation == handle.generation {
            slot.value.as_mut()
        } else {
            None
        }
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    /// Number of live values.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}
