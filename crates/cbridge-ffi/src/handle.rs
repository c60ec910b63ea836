//! Bounded slot+generation handle table.
//!
//! Each live callback occupies one slot, and the slot index selects the
//! trampoline that native code calls. Released handles have stale
//! generation counters and safely resolve to `None`; double release is a
//! no-op.

/// Handle encoding: upper 32 bits = slot index, lower 32 bits = generation.
pub(crate) fn encode(slot: u32, generation: u32) -> u64 {
    ((slot as u64) << 32) | (generation as u64)
}

pub(crate) fn decode(handle: u64) -> (u32, u32) {
    let slot = (handle >> 32) as u32;
    let generation = handle as u32;
    (slot, generation)
}

struct Slot<T> {
    generation: u32,
    data: Option<T>,
}

/// A slot+generation handle table with at most `limit` slots.
///
/// Reuses slots via a free list, most recently released first.
/// Generation counters increment on removal, making stale handles
/// detectable without UB.
pub(crate) struct HandleTable<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
    limit: u32,
    live: usize,
}

impl<T> HandleTable<T> {
    /// Create an empty table that never grows past `limit` slots.
    pub const fn bounded(limit: u32) -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            limit,
            live: 0,
        }
    }

    /// Insert a value and return its handle, or `None` if every slot is taken.
    pub fn insert(&mut self, value: T) -> Option<u64> {
        let handle = if let Some(slot_idx) = self.free_list.pop() {
            let slot = &mut self.slots[slot_idx as usize];
            slot.data = Some(value);
            encode(slot_idx, slot.generation)
        } else {
            if self.slots.len() >= self.limit as usize {
                return None;
            }
            let slot_idx = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                data: Some(value),
            });
            encode(slot_idx, 0)
        };
        self.live += 1;
        Some(handle)
    }

    /// Get the value behind a handle.
    ///
    /// Returns `None` if the handle is stale (wrong generation) or was never valid.
    pub fn get(&self, handle: u64) -> Option<&T> {
        let (slot_idx, generation) = decode(handle);
        let slot = self.slots.get(slot_idx as usize)?;
        if slot.generation != generation {
            return None;
        }
        slot.data.as_ref()
    }

    /// Get whatever currently occupies a slot, regardless of generation.
    pub fn get_at(&self, slot_idx: u32) -> Option<&T> {
        self.slots.get(slot_idx as usize)?.data.as_ref()
    }

    /// Current handle of an occupied slot.
    pub fn handle_at(&self, slot_idx: u32) -> Option<u64> {
        let slot = self.slots.get(slot_idx as usize)?;
        slot.data.as_ref()?;
        Some(encode(slot_idx, slot.generation))
    }

    /// Remove the value behind a handle, returning it.
    ///
    /// Increments the generation counter and adds the slot to the free list.
    /// If the generation has reached `u32::MAX`, the slot is permanently retired
    /// (not returned to the free list) to prevent ABA handle resurrection after
    /// wraparound.
    /// Returns `None` if the handle is stale (double-remove is safe).
    pub fn remove(&mut self, handle: u64) -> Option<T> {
        let (slot_idx, generation) = decode(handle);
        let slot = self.slots.get_mut(slot_idx as usize)?;
        if slot.generation != generation {
            return None;
        }
        let value = slot.data.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        // A wrapped generation would collide with stale handles from epoch 0.
        if slot.generation != 0 {
            self.free_list.push(slot_idx);
        }
        self.live -= 1;
        Some(value)
    }

    /// Remove every value, invalidating all outstanding handles.
    pub fn clear(&mut self) -> Vec<T> {
        let handles: Vec<u64> = (0..self.slots.len() as u32)
            .filter_map(|i| self.handle_at(i))
            .collect();
        handles.into_iter().filter_map(|h| self.remove(h)).collect()
    }

    /// Number of live values.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Maximum number of slots.
    pub fn limit(&self) -> u32 {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_get_round_trip() {
        let mut table = HandleTable::bounded(4);
        let h = table.insert(42i32).unwrap();
        assert_eq!(table.get(h), Some(&42));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn remove_returns_value() {
        let mut table = HandleTable::bounded(4);
        let h = table.insert(99i32).unwrap();
        assert_eq!(table.remove(h), Some(99));
        assert_eq!(table.get(h), None);
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn double_remove_returns_none() {
        let mut table = HandleTable::bounded(4);
        let h = table.insert(1i32).unwrap();
        assert_eq!(table.remove(h), Some(1));
        assert_eq!(table.remove(h), None);
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn full_table_rejects_insert() {
        let mut table = HandleTable::bounded(2);
        let a = table.insert(1).unwrap();
        table.insert(2).unwrap();
        assert_eq!(table.insert(3), None);
        table.remove(a);
        assert!(table.insert(3).is_some());
    }

    #[test]
    fn free_list_reuses_slots() {
        let mut table = HandleTable::bounded(4);
        let h1 = table.insert(1i32).unwrap();
        table.remove(h1);
        let h2 = table.insert(2i32).unwrap();
        let (slot1, gen1) = decode(h1);
        let (slot2, gen2) = decode(h2);
        assert_eq!(slot1, slot2);
        assert_eq!(gen2, gen1 + 1);
        assert_eq!(table.get(h2), Some(&2));
        assert_eq!(table.get(h1), None);
    }

    #[test]
    fn slot_access_ignores_generation() {
        let mut table = HandleTable::bounded(4);
        let h1 = table.insert("first").unwrap();
        table.remove(h1);
        let h2 = table.insert("second").unwrap();
        let (slot, _) = decode(h1);
        assert_eq!(table.get_at(slot), Some(&"second"));
        assert_eq!(table.handle_at(slot), Some(h2));
        assert_eq!(table.get_at(7), None);
    }

    #[test]
    fn clear_invalidates_everything() {
        let mut table = HandleTable::bounded(8);
        let handles: Vec<u64> = (0..5).map(|i| table.insert(i).unwrap()).collect();
        let drained = table.clear();
        assert_eq!(drained.len(), 5);
        assert_eq!(table.len(), 0);
        assert!(handles.iter().all(|&h| table.get(h).is_none()));
    }

    #[test]
    fn generation_exhaustion_retires_slot() {
        let mut table = HandleTable::bounded(4);
        let h = table.insert(1i32).unwrap();
        table.remove(h);

        table.slots[0].generation = u32::MAX;
        let h2 = table.insert(2i32).unwrap();
        assert_eq!(decode(h2), (0, u32::MAX));

        // Remove wraps generation to 0: slot must NOT be recycled.
        table.remove(h2);
        assert_eq!(table.slots[0].generation, 0);
        assert!(!table.free_list.contains(&0));
        assert_eq!(table.get(encode(0, 0)), None);

        let h3 = table.insert(3i32).unwrap();
        assert_ne!(decode(h3).0, 0, "retired slot must not be reused");
    }
}
