//! Room roster management
//!
//! The [`PlayerManager`] owns the player id -> [`PlayerRecord`] roster of a
//! single room and keeps slot occupancy in step with it by calling into a
//! [`SlotAllocator`]. Slot calls are fire-and-forget from the roster's point
//! of view: a refused assignment is logged, and the roster change stands.
//! Multi-step slot operations are not transactional; whatever steps completed
//! before a failure stay applied.

use crate::slot_manager::{SlotAllocator, SlotManager};
use log::{debug, info, warn};
use serde_json::{Map, Value};
use shared::{PlayerInfo, PlayerRecord, SlotHint, SlotIndex};
use std::collections::HashMap;

/// Roster of the players currently in a room
///
/// Without a slot allocator every slot operation is skipped and the roster
/// behaves as a plain keyed store.
#[derive(Debug)]
pub struct PlayerManager<S = SlotManager> {
    /// Records keyed by player id
    players: HashMap<String, PlayerRecord>,
    /// Collaborator owning slot occupancy, if any
    slots: Option<S>,
}

impl<S: SlotAllocator> PlayerManager<S> {
    /// Creates an empty roster that delegates slots to `slots`
    pub fn new(slots: S) -> Self {
        Self {
            players: HashMap::new(),
            slots: Some(slots),
        }
    }

    /// Creates an empty roster with no slot allocator
    pub fn without_slots() -> Self {
        Self {
            players: HashMap::new(),
            slots: None,
        }
    }

    pub fn slots(&self) -> Option<&S> {
        self.slots.as_ref()
    }

    pub fn slots_mut(&mut self) -> Option<&mut S> {
        self.slots.as_mut()
    }

    /// Adds a player, replacing any record already stored under `player_id`
    ///
    /// Returns false when the id or the metadata is empty. A replaced record
    /// is dropped whole, `joined_at` included; nothing is merged. When the
    /// metadata carries a `player_slot` the allocator is asked for that slot,
    /// and the player stays in the roster even if the allocator refuses.
    pub fn add_player(&mut self, player_id: &str, info: &PlayerInfo) -> bool {
        if player_id.is_empty() || info.is_empty() {
            return false;
        }

        let record = PlayerRecord::new(player_id, info);
        let hint = record.slot_hint();
        if self.players.insert(player_id.to_string(), record).is_some() {
            info!("Player {} rejoined, previous record replaced", player_id);
        } else {
            info!("Player {} added", player_id);
        }

        if let Some(slots) = self.slots.as_mut() {
            match hint {
                SlotHint::Absent => {}
                SlotHint::Index(slot) => assign(slots, player_id, slot),
                SlotHint::Invalid => {
                    warn!("Player {} sent an unusable slot hint, not seated", player_id)
                }
            }
        }

        true
    }

    /// Removes a player and releases their slot
    ///
    /// The release happens whether or not the player is in the roster, so an
    /// allocator left holding a stale seat is cleaned up too. Removing an
    /// unknown player is not an error.
    pub fn remove_player(&mut self, player_id: &str) {
        if let Some(slots) = self.slots.as_mut() {
            slots.release_slot(player_id);
        }

        if self.players.remove(player_id).is_some() {
            info!("Player {} removed", player_id);
        }
    }

    pub fn get_player(&self, player_id: &str) -> Option<&PlayerRecord> {
        self.players.get(player_id)
    }

    /// Copy of the roster; changes to it never reach the manager
    pub fn get_all_players(&self) -> HashMap<String, PlayerRecord> {
        self.players.clone()
    }

    /// The roster as a plain JSON object of player id -> flattened record
    pub fn get_players_object(&self) -> Map<String, Value> {
        self.players
            .iter()
            .map(|(id, record)| (id.clone(), record.to_value()))
            .collect()
    }

    /// Shallow-merges `updates` into an existing record
    ///
    /// Unknown players are ignored. A `player_slot` in the updates releases
    /// the current slot and then asks for the new one; if that assignment is
    /// refused the player is left without a slot.
    pub fn update_player(&mut self, player_id: &str, updates: &PlayerInfo) {
        let Some(record) = self.players.get_mut(player_id) else {
            return;
        };

        let ignored = record.merge(updates);
        if !ignored.is_empty() {
            debug!(
                "Ignored reserved fields {:?} in update for player {}",
                ignored, player_id
            );
        }

        let hint = SlotHint::read(updates);
        if !hint.is_defined() {
            return;
        }

        if let Some(slots) = self.slots.as_mut() {
            slots.release_slot(player_id);
            match hint {
                SlotHint::Index(slot) => assign(slots, player_id, slot),
                _ => warn!(
                    "Player {} sent an unusable slot hint, left without a slot",
                    player_id
                ),
            }
        }
    }

    pub fn get_player_count(&self) -> usize {
        self.players.len()
    }

    pub fn has_player(&self, player_id: &str) -> bool {
        self.players.contains_key(player_id)
    }

    /// Player ids currently in the roster, in no particular order
    pub fn player_ids(&self) -> Vec<String> {
        self.players.keys().cloned().collect()
    }

    /// Releases every player's slot, then empties the roster
    pub fn clear(&mut self) {
        if let Some(slots) = self.slots.as_mut() {
            for player_id in self.players.keys() {
                slots.release_slot(player_id);
            }
        }

        info!("Roster cleared ({} players)", self.players.len());
        self.players.clear();
    }
}

fn assign<S: SlotAllocator>(slots: &mut S, player_id: &str, slot: SlotIndex) {
    if let Err(e) = slots.assign_slot(player_id, slot) {
        warn!("Could not seat player {} in slot {}: {}", player_id, slot, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot_manager::SlotError;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq)]
    enum SlotCall {
        Assign(String, SlotIndex),
        Release(String),
    }

    /// Allocator that records every call and optionally refuses assignments
    #[derive(Debug, Default)]
    struct RecordingSlots {
        calls: Vec<SlotCall>,
        refuse: bool,
    }

    impl RecordingSlots {
        fn refusing() -> Self {
            Self {
                calls: Vec::new(),
                refuse: true,
            }
        }

        fn assigns(&self) -> usize {
            self.calls
                .iter()
                .filter(|call| matches!(call, SlotCall::Assign(..)))
                .count()
        }

        fn releases(&self) -> usize {
            self.calls
                .iter()
                .filter(|call| matches!(call, SlotCall::Release(_)))
                .count()
        }
    }

    impl SlotAllocator for RecordingSlots {
        fn assign_slot(&mut self, player_id: &str, slot: SlotIndex) -> Result<(), SlotError> {
            self.calls.push(SlotCall::Assign(player_id.to_string(), slot));
            if self.refuse {
                Err(SlotError::OutOfRange { slot, capacity: 0 })
            } else {
                Ok(())
            }
        }

        fn release_slot(&mut self, player_id: &str) {
            self.calls.push(SlotCall::Release(player_id.to_string()));
        }
    }

    fn info(value: Value) -> PlayerInfo {
        match value {
            Value::Object(map) => map,
            _ => panic!("test metadata must be an object"),
        }
    }

    fn calls(manager: &PlayerManager<RecordingSlots>) -> &[SlotCall] {
        &manager.slots().unwrap().calls
    }

    #[test]
    fn test_add_player() {
        let mut manager = PlayerManager::new(RecordingSlots::default());

        assert!(manager.add_player("p1", &info(json!({"name": "Alice", "player_slot": 0}))));

        assert!(manager.has_player("p1"));
        assert_eq!(manager.get_player_count(), 1);
        assert_eq!(calls(&manager), &[SlotCall::Assign("p1".to_string(), 0)]);

        let value = manager.get_player("p1").unwrap().to_value();
        assert_eq!(value["playerId"], json!("p1"));
        assert_eq!(value["name"], json!("Alice"));
        assert_eq!(value["player_slot"], json!(0));
        assert!(value["joinedAt"].is_u64());
    }

    #[test]
    fn test_add_player_without_slot_hint() {
        let mut manager = PlayerManager::new(RecordingSlots::default());

        assert!(manager.add_player("p1", &info(json!({"name": "Alice"}))));
        assert!(calls(&manager).is_empty());
    }

    #[test]
    fn test_add_player_rejects_empty_input() {
        let mut manager = PlayerManager::new(RecordingSlots::default());

        assert!(!manager.add_player("", &info(json!({"name": "Alice"}))));
        assert!(!manager.add_player("p1", &PlayerInfo::new()));
        assert_eq!(manager.get_player_count(), 0);
        assert!(calls(&manager).is_empty());
    }

    #[test]
    fn test_add_player_replaces_existing() {
        let mut manager = PlayerManager::new(RecordingSlots::default());
        manager.add_player("p1", &info(json!({"name": "Alice", "color": "red"})));

        assert!(manager.add_player("p1", &info(json!({"name": "Alicia"}))));

        assert_eq!(manager.get_player_count(), 1);
        let record = manager.get_player("p1").unwrap();
        assert_eq!(record.get("name"), Some(&json!("Alicia")));
        assert_eq!(record.get("color"), None);
    }

    #[test]
    fn test_add_player_keeps_record_when_slot_refused() {
        let mut manager = PlayerManager::new(RecordingSlots::refusing());

        assert!(manager.add_player("p1", &info(json!({"player_slot": 9}))));
        assert!(manager.has_player("p1"));
        assert_eq!(manager.slots().unwrap().assigns(), 1);
    }

    #[test]
    fn test_add_player_with_invalid_slot_hint() {
        let mut manager = PlayerManager::new(RecordingSlots::default());

        assert!(manager.add_player("p1", &info(json!({"player_slot": "front"}))));
        assert!(manager.has_player("p1"));
        assert!(calls(&manager).is_empty());
    }

    #[test]
    fn test_remove_player() {
        let mut manager = PlayerManager::new(RecordingSlots::default());
        manager.add_player("p1", &info(json!({"name": "Alice"})));

        manager.remove_player("p1");

        assert!(!manager.has_player("p1"));
        assert_eq!(manager.get_player_count(), 0);
        assert_eq!(calls(&manager), &[SlotCall::Release("p1".to_string())]);
    }

    #[test]
    fn test_remove_nonexistent_player_still_releases() {
        let mut manager = PlayerManager::new(RecordingSlots::default());

        manager.remove_player("ghost");
        manager.remove_player("ghost");

        assert!(!manager.has_player("ghost"));
        assert_eq!(manager.slots().unwrap().releases(), 2);
    }

    #[test]
    fn test_get_missing_player() {
        let manager: PlayerManager = PlayerManager::without_slots();
        assert!(manager.get_player("nobody").is_none());
    }

    #[test]
    fn test_get_all_players_is_a_copy() {
        let mut manager: PlayerManager = PlayerManager::without_slots();
        manager.add_player("p1", &info(json!({"name": "Alice"})));

        let mut copy = manager.get_all_players();
        copy.remove("p1");
        copy.insert(
            "p2".to_string(),
            PlayerRecord::new("p2", &info(json!({"name": "Bob"}))),
        );

        assert!(manager.has_player("p1"));
        assert!(!manager.has_player("p2"));
        assert_eq!(manager.get_player_count(), 1);
    }

    #[test]
    fn test_get_players_object() {
        let mut manager: PlayerManager = PlayerManager::without_slots();
        manager.add_player("p1", &info(json!({"name": "Alice"})));
        manager.add_player("p2", &info(json!({"name": "Bob"})));

        let object = manager.get_players_object();

        assert_eq!(object.len(), 2);
        assert_eq!(object["p1"]["name"], json!("Alice"));
        assert_eq!(object["p2"]["playerId"], json!("p2"));
    }

    #[test]
    fn test_update_player_preserves_other_fields() {
        let mut manager = PlayerManager::new(RecordingSlots::default());
        manager.add_player("p1", &info(json!({"a": 1, "b": 2})));

        manager.update_player("p1", &info(json!({"b": 3})));

        let record = manager.get_player("p1").unwrap();
        assert_eq!(record.get("a"), Some(&json!(1)));
        assert_eq!(record.get("b"), Some(&json!(3)));
        assert!(calls(&manager).is_empty());
    }

    #[test]
    fn test_update_unknown_player_is_noop() {
        let mut manager = PlayerManager::new(RecordingSlots::default());

        manager.update_player("ghost", &info(json!({"player_slot": 1})));

        assert!(!manager.has_player("ghost"));
        assert!(calls(&manager).is_empty());
    }

    #[test]
    fn test_update_player_slot_releases_then_assigns() {
        let mut manager = PlayerManager::new(RecordingSlots::default());
        manager.add_player("p1", &info(json!({"player_slot": 0})));

        manager.update_player("p1", &info(json!({"player_slot": 2})));

        assert_eq!(
            calls(&manager),
            &[
                SlotCall::Assign("p1".to_string(), 0),
                SlotCall::Release("p1".to_string()),
                SlotCall::Assign("p1".to_string(), 2),
            ]
        );
        assert_eq!(
            manager.get_player("p1").unwrap().get("player_slot"),
            Some(&json!(2))
        );
    }

    #[test]
    fn test_update_player_refused_slot_leaves_player_unseated() {
        let mut manager = PlayerManager::new(SlotManager::new(2));
        manager.add_player("p1", &info(json!({"player_slot": 0})));
        manager.add_player("p2", &info(json!({"player_slot": 1})));

        manager.update_player("p1", &info(json!({"player_slot": 1})));

        let slots = manager.slots().unwrap();
        assert_eq!(slots.slot_of("p1"), None);
        assert_eq!(slots.occupant(1), Some("p2"));
        assert!(manager.has_player("p1"));
    }

    #[test]
    fn test_operations_without_slot_allocator() {
        let mut manager: PlayerManager = PlayerManager::without_slots();

        assert!(manager.add_player("p1", &info(json!({"player_slot": 0}))));
        manager.update_player("p1", &info(json!({"player_slot": 1})));
        manager.remove_player("p1");
        manager.clear();

        assert!(manager.slots().is_none());
        assert_eq!(manager.get_player_count(), 0);
    }

    #[test]
    fn test_clear() {
        let mut manager = PlayerManager::new(RecordingSlots::default());
        for id in ["p1", "p2", "p3"] {
            manager.add_player(id, &info(json!({"name": id})));
        }

        manager.clear();

        assert_eq!(manager.slots().unwrap().releases(), 3);
        assert_eq!(manager.get_player_count(), 0);
        assert!(manager.player_ids().is_empty());
    }
}
