//! Slot allocation for the input ports of a room
//!
//! The roster never decides who sits where on its own. It forwards slot
//! requests to a [`SlotAllocator`], which owns the slot index -> player
//! mapping and enforces at most one player per slot and one slot per player.
//! [`SlotManager`] is the bounded allocator used by [`crate::room::Room`].

use log::debug;
use shared::SlotIndex;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Reasons an allocator refuses a slot assignment
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotError {
    #[error("slot {slot} is out of range (room has {capacity} slots)")]
    OutOfRange { slot: SlotIndex, capacity: usize },
    #[error("slot {slot} is already held by {occupant}")]
    Occupied { slot: SlotIndex, occupant: String },
}

/// Capability the roster needs from a slot allocator
pub trait SlotAllocator {
    /// Binds `player_id` to `slot`. Conflict handling is up to the allocator.
    fn assign_slot(&mut self, player_id: &str, slot: SlotIndex) -> Result<(), SlotError>;

    /// Frees whatever slot `player_id` holds. Releasing an unseated player is a no-op.
    fn release_slot(&mut self, player_id: &str);
}

/// Fixed-capacity allocator mapping slot indices to player ids
#[derive(Debug, Clone)]
pub struct SlotManager {
    capacity: usize,
    occupants: BTreeMap<SlotIndex, String>,
    seats: HashMap<String, SlotIndex>,
}

impl SlotManager {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            occupants: BTreeMap::new(),
            seats: HashMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slot currently held by `player_id`
    pub fn slot_of(&self, player_id: &str) -> Option<SlotIndex> {
        self.seats.get(player_id).copied()
    }

    /// Player currently sitting in `slot`
    pub fn occupant(&self, slot: SlotIndex) -> Option<&str> {
        self.occupants.get(&slot).map(String::as_str)
    }

    /// Lowest slot index nobody holds, if the room is not full
    pub fn first_free_slot(&self) -> Option<SlotIndex> {
        (0..self.capacity).find(|slot| !self.occupants.contains_key(slot))
    }

    pub fn occupied_count(&self) -> usize {
        self.occupants.len()
    }

    /// Occupant of every slot in index order, `None` for empty slots
    pub fn occupancy(&self) -> Vec<Option<&str>> {
        (0..self.capacity).map(|slot| self.occupant(slot)).collect()
    }
}

impl SlotAllocator for SlotManager {
    fn assign_slot(&mut self, player_id: &str, slot: SlotIndex) -> Result<(), SlotError> {
        if slot >= self.capacity {
            return Err(SlotError::OutOfRange {
                slot,
                capacity: self.capacity,
            });
        }

        match self.occupants.get(&slot) {
            Some(occupant) if occupant == player_id => return Ok(()),
            Some(occupant) => {
                return Err(SlotError::Occupied {
                    slot,
                    occupant: occupant.clone(),
                })
            }
            None => {}
        }

        // A player moving seats gives up the old one
        if let Some(previous) = self.seats.insert(player_id.to_string(), slot) {
            self.occupants.remove(&previous);
            debug!("Player {} moved from slot {} to {}", player_id, previous, slot);
        } else {
            debug!("Player {} took slot {}", player_id, slot);
        }
        self.occupants.insert(slot, player_id.to_string());
        Ok(())
    }

    fn release_slot(&mut self, player_id: &str) {
        if let Some(slot) = self.seats.remove(player_id) {
            self.occupants.remove(&slot);
            debug!("Player {} released slot {}", player_id, slot);
        }
    }
}
