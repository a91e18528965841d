//! Room controller tying the roster, slots and usernames together
//!
//! A [`Room`] applies [`RoomEvent`]s strictly one at a time. A join is checked
//! against the username bindings first, so a refused identity never touches
//! the roster. Leaves drop the roster entry and slot, then the username.

use crate::player_manager::PlayerManager;
use crate::slot_manager::SlotManager;
use crate::username_manager::{RebindPolicy, UsernameManager};
use log::{info, warn};
use serde_json::{json, Value};
use shared::{Identity, PlayerInfo, RoomEvent, SlotIndex};
use std::collections::HashMap;
use thiserror::Error;

/// Settings for a single room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomConfig {
    /// Number of input slots (emulated ports)
    pub slot_count: usize,
    pub rebind_policy: RebindPolicy,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            slot_count: 4,
            rebind_policy: RebindPolicy::default(),
        }
    }
}

/// Why an event was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("join for {player_id:?} is missing a player id or metadata")]
    InvalidJoin { player_id: String },
    #[error("username {username} is bound to another account")]
    UsernameTaken { username: String },
    #[error("player {player_id} is not in the room")]
    UnknownPlayer { player_id: String },
}

/// Result of an applied event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Joined {
        player_id: String,
        slot: Option<SlotIndex>,
    },
    Left {
        player_id: String,
    },
    Updated {
        player_id: String,
        slot: Option<SlotIndex>,
    },
}

/// Membership state of one netplay room
#[derive(Debug)]
pub struct Room {
    players: PlayerManager<SlotManager>,
    usernames: UsernameManager,
    /// Account each seated player joined with, by player id
    accounts: HashMap<String, String>,
}

impl Room {
    pub fn new(config: RoomConfig) -> Self {
        Self {
            players: PlayerManager::new(SlotManager::new(config.slot_count)),
            usernames: UsernameManager::with_policy(config.rebind_policy),
            accounts: HashMap::new(),
        }
    }

    pub fn players(&self) -> &PlayerManager<SlotManager> {
        &self.players
    }

    pub fn usernames(&self) -> &UsernameManager {
        &self.usernames
    }

    pub fn slots(&self) -> Option<&SlotManager> {
        self.players.slots()
    }

    /// Applies a single membership event
    pub fn apply(&mut self, event: RoomEvent) -> Result<EventOutcome, RoomError> {
        match event {
            RoomEvent::Join {
                player_id,
                identity,
                info,
            } => self.join(player_id, identity, &info),
            RoomEvent::Leave { player_id, user_id } => {
                self.leave(&player_id, user_id.as_deref());
                Ok(EventOutcome::Left { player_id })
            }
            RoomEvent::Update { player_id, updates } => self.update(player_id, &updates),
        }
    }

    fn join(
        &mut self,
        player_id: String,
        identity: Option<Identity>,
        info: &PlayerInfo,
    ) -> Result<EventOutcome, RoomError> {
        if let Some(identity) = &identity {
            if !self
                .usernames
                .is_username_available(&identity.netplay_username, &identity.user_id)
            {
                warn!(
                    "Join of {} refused, username {} is taken",
                    player_id, identity.netplay_username
                );
                return Err(RoomError::UsernameTaken {
                    username: identity.netplay_username.clone(),
                });
            }
        }

        if !self.players.add_player(&player_id, info) {
            return Err(RoomError::InvalidJoin { player_id });
        }

        // A rejoin replaces the record, so the account it replaced lets go of its name
        let previous = match &identity {
            Some(identity) => self
                .accounts
                .insert(player_id.clone(), identity.user_id.clone()),
            None => self.accounts.remove(&player_id),
        };
        if let Some(previous) = previous {
            let same_account = identity
                .as_ref()
                .is_some_and(|identity| identity.user_id == previous);
            if !same_account {
                self.release_account(&previous);
            }
        }

        if let Some(identity) = identity {
            // Availability was checked above and nothing ran in between
            self.usernames
                .bind_username(&identity.netplay_username, &identity.user_id);
        }

        let slot = self.slot_of(&player_id);
        info!("Player {} joined the room (slot {:?})", player_id, slot);
        Ok(EventOutcome::Joined { player_id, slot })
    }

    fn leave(&mut self, player_id: &str, user_id: Option<&str>) {
        self.players.remove_player(player_id);
        let tracked = self.accounts.remove(player_id);
        if let Some(user_id) = user_id {
            self.release_account(user_id);
        }
        if let Some(tracked) = tracked.filter(|tracked| Some(tracked.as_str()) != user_id) {
            self.release_account(&tracked);
        }
        info!("Player {} left the room", player_id);
    }

    /// Unbinds `user_id` unless another seated player still joined with it
    fn release_account(&mut self, user_id: &str) {
        if self.accounts.values().any(|account| account == user_id) {
            return;
        }
        self.usernames.unbind_username(user_id);
    }

    fn update(
        &mut self,
        player_id: String,
        updates: &PlayerInfo,
    ) -> Result<EventOutcome, RoomError> {
        if !self.players.has_player(&player_id) {
            return Err(RoomError::UnknownPlayer { player_id });
        }

        self.players.update_player(&player_id, updates);
        let slot = self.slot_of(&player_id);
        Ok(EventOutcome::Updated { player_id, slot })
    }

    fn slot_of(&self, player_id: &str) -> Option<SlotIndex> {
        self.slots().and_then(|slots| slots.slot_of(player_id))
    }

    /// JSON view of the room: the roster object and the occupant of each slot
    pub fn snapshot(&self) -> Value {
        let slots: Vec<Option<&str>> = self
            .slots()
            .map(|slots| slots.occupancy())
            .unwrap_or_default();

        json!({
            "players": self.players.get_players_object(),
            "slots": slots,
        })
    }

    /// Empties the roster and frees every slot before the room is dropped
    ///
    /// Username bindings are left alone; they are released per account when
    /// each player leaves.
    pub fn close(&mut self) {
        self.players.clear();
        self.accounts.clear();
    }
}

impl Default for Room {
    fn default() -> Self {
        Self::new(RoomConfig::default())
    }
}
