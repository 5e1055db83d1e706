///
/// Handle Registry
///
/// A fixed-capacity slot table that maps the small integer handles a host
/// holds onto resources owned here. One registry exists per resource class
/// (connections, statements, result sets).
///
/// Invariants:
/// - a handle is the index of its slot, and occupied slots never move, so a
///   handle stays valid while other handles come and go
/// - capacity is fixed at construction; a full table is an error, never growth
/// - allocation always takes the lowest empty slot
///
/// Freeing requires a `Handle<T>` token. Tokens are only minted by
/// `allocate`, `lookup`, `lookup_by` and `resolve`, are not `Clone`, and carry
/// the slot generation so a token that outlived a free/reallocate cycle is
/// rejected instead of releasing somebody else's resource.
///

use std::fmt;
use std::marker::PhantomData;

use tracing::{debug, warn};

use crate::error::DbiError;

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Proof that a slot was occupied when this token was minted.
pub struct Handle<T> {
    index: usize,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    fn new(index: usize, generation: u32) -> Self {
        Self {
            index,
            generation,
            _marker: PhantomData,
        }
    }

    /// Slot index, which is the handle value the host sees.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn raw(&self) -> i64 {
        self.index as i64
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("index", &self.index)
            .field("generation", &self.generation)
            .finish()
    }
}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

pub struct Registry<T> {
    class: &'static str,
    slots: Vec<Slot<T>>,
}

impl<T> Registry<T> {
    pub fn new(class: &'static str, capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || Slot {
            generation: 0,
            value: None,
        });
        Self { class, slots }
    }

    pub fn class(&self) -> &'static str {
        self.class
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.value.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|s| s.value.is_none())
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(|s| s.value.is_some())
    }

    /// Occupy the first empty slot with `value`.
    pub fn allocate(&mut self, value: T) -> Result<Handle<T>, DbiError> {
        let Some(index) = self.slots.iter().position(|s| s.value.is_none()) else {
            warn!(class = self.class, capacity = self.capacity(), "handle table exhausted");
            return Err(DbiError::Full {
                class: self.class,
                capacity: self.capacity(),
            });
        };
        let slot = &mut self.slots[index];
        slot.generation = slot.generation.wrapping_add(1);
        slot.value = Some(value);
        debug!(class = self.class, handle = index, "allocated handle");
        Ok(Handle::new(index, slot.generation))
    }

    /// Validate a raw integer handle presented by the host.
    pub fn resolve(&self, raw: i64) -> Result<Handle<T>, DbiError> {
        let not_found = DbiError::NotFound {
            class: self.class,
            handle: raw,
        };
        let Ok(index) = usize::try_from(raw) else {
            return Err(not_found);
        };
        match self.slots.get(index) {
            Some(slot) if slot.value.is_some() => Ok(Handle::new(index, slot.generation)),
            _ => Err(not_found),
        }
    }

    /// Handle of the first slot whose value matches `pred`.
    pub fn lookup_by(&self, mut pred: impl FnMut(&T) -> bool) -> Result<Handle<T>, DbiError> {
        self.slots
            .iter()
            .enumerate()
            .find(|(_, s)| s.value.as_ref().is_some_and(&mut pred))
            .map(|(i, s)| Handle::new(i, s.generation))
            .ok_or(DbiError::NotFound {
                class: self.class,
                handle: -1,
            })
    }

    pub fn get(&self, handle: &Handle<T>) -> Result<&T, DbiError> {
        let slot = self.live_slot(handle)?;
        slot.value.as_ref().ok_or(DbiError::StaleHandle {
            class: self.class,
            handle: handle.raw(),
        })
    }

    pub fn get_mut(&mut self, handle: &Handle<T>) -> Result<&mut T, DbiError> {
        let class = self.class;
        let index = self.live_index(handle)?;
        self.slots[index]
            .value
            .as_mut()
            .ok_or(DbiError::StaleHandle {
                class,
                handle: handle.raw(),
            })
    }

    /// Empty the slot and hand its resource back to the caller.
    pub fn free(&mut self, handle: Handle<T>) -> Result<T, DbiError> {
        let index = self.live_index(&handle)?;
        let value = self.slots[index].value.take().ok_or(DbiError::StaleHandle {
            class: self.class,
            handle: handle.raw(),
        })?;
        debug!(class = self.class, handle = index, "freed handle");
        Ok(value)
    }

    /// Raw handle and value of every occupied slot, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.value.as_ref().map(|v| (i as i64, v)))
    }

    /// Occupied values in slot order.
    pub fn list_active(&self) -> Vec<&T> {
        self.iter().map(|(_, v)| v).collect()
    }

    /// Raw handles of occupied slots in slot order.
    pub fn active_handles(&self) -> Vec<i64> {
        self.iter().map(|(h, _)| h).collect()
    }

    /// Empty every slot, returning the resources in slot order.
    pub fn drain(&mut self) -> Vec<T> {
        let out: Vec<T> = self.slots.iter_mut().filter_map(|s| s.value.take()).collect();
        if !out.is_empty() {
            debug!(class = self.class, count = out.len(), "drained handle table");
        }
        out
    }

    fn live_index(&self, handle: &Handle<T>) -> Result<usize, DbiError> {
        self.live_slot(handle).map(|_| handle.index)
    }

    fn live_slot(&self, handle: &Handle<T>) -> Result<&Slot<T>, DbiError> {
        let slot = self.slots.get(handle.index).ok_or(DbiError::NotFound {
            class: self.class,
            handle: handle.raw(),
        })?;
        if slot.generation != handle.generation || slot.value.is_none() {
            return Err(DbiError::StaleHandle {
                class: self.class,
                handle: handle.raw(),
            });
        }
        Ok(slot)
    }
}

impl<T: PartialEq> Registry<T> {
    /// Handle of the slot holding `id`.
    pub fn lookup(&self, id: &T) -> Result<Handle<T>, DbiError> {
        self.lookup_by(|v| v == id)
    }
}
