use crate::app::Vec2;

/// Minimal lifecycle every pooled entity kind exposes to its pool.
///
/// Destroying an entity means deactivating its slot; the slot keeps its
/// storage and is handed out again by a later `acquire`.
pub trait ActivatableEntity: Default {
    fn position(&self) -> Vec2;
    fn is_active(&self) -> bool;
    fn activate(&mut self, position: Vec2);
    fn deactivate(&mut self);
}

/// Weak reference to a pool slot.
///
/// The generation changes every time the slot is re-acquired, so a handle
/// held across a deactivate/reacquire cycle stops resolving instead of
/// silently pointing at the new occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolHandle {
    index: u32,
    generation: u32,
}

impl PoolHandle {
    pub fn index(self) -> usize {
        self.index as usize
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

#[derive(Debug)]
struct Slot<T> {
    entity: T,
    generation: u32,
}

/// Fixed-capacity container of reusable entity slots.
///
/// Slots are created lazily in insertion order up to `capacity` and never
/// freed; iteration always walks slot order.
#[derive(Debug)]
pub struct EntityPool<T: ActivatableEntity> {
    slots: Vec<Slot<T>>,
    capacity: usize,
}

impl<T: ActivatableEntity> EntityPool<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn active_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.entity.is_active())
            .count()
    }

    /// Activates the first inactive slot at `position`. `None` means the pool
    /// is exhausted; callers treat that as a skipped spawn.
    pub fn acquire(&mut self, position: Vec2) -> Option<PoolHandle> {
        let index = match self.slots.iter().position(|slot| !slot.entity.is_active()) {
            Some(index) => index,
            None if self.slots.len() < self.capacity => {
                self.slots.push(Slot {
                    entity: T::default(),
                    generation: 0,
                });
                self.slots.len() - 1
            }
            None => return None,
        };

        let slot = &mut self.slots[index];
        slot.generation = slot.generation.wrapping_add(1);
        slot.entity.activate(position);
        Some(PoolHandle {
            index: index as u32,
            generation: slot.generation,
        })
    }

    /// Deactivates the slot behind `handle`. Returns false for stale handles
    /// and for slots that were already inactive.
    pub fn release(&mut self, handle: PoolHandle) -> bool {
        match self.get_mut(handle) {
            Some(entity) => {
                entity.deactivate();
                true
            }
            None => false,
        }
    }

    pub fn release_all(&mut self) {
        for slot in &mut self.slots {
            if slot.entity.is_active() {
                slot.entity.deactivate();
            }
        }
    }

    pub fn is_live(&self, handle: PoolHandle) -> bool {
        self.get(handle).is_some()
    }

    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        let slot = self.slots.get(handle.index())?;
        (slot.generation == handle.generation && slot.entity.is_active()).then_some(&slot.entity)
    }

    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.generation == handle.generation && slot.entity.is_active() {
            Some(&mut slot.entity)
        } else {
            None
        }
    }

    /// Handles of every active slot at the moment of the call, in slot order.
    pub fn active_handles(&self) -> Vec<PoolHandle> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.entity.is_active())
            .map(|(index, slot)| PoolHandle {
                index: index as u32,
                generation: slot.generation,
            })
            .collect()
    }

    pub fn iter_active(&self) -> impl Iterator<Item = (PoolHandle, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.entity.is_active())
            .map(|(index, slot)| {
                (
                    PoolHandle {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    &slot.entity,
                )
            })
    }

    /// Visits the slots that were active when the call started. A slot
    /// deactivated by an earlier visit in the same pass is skipped, and a
    /// visit that deactivates its own slot never disturbs the next one.
    pub fn for_each_active(&mut self, mut visit: impl FnMut(PoolHandle, &mut T)) {
        for handle in self.active_handles() {
            if let Some(entity) = self.get_mut(handle) {
                visit(handle, entity);
            }
        }
    }
}
