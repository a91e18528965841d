use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Metadata field carrying the requested input slot.
pub const PLAYER_SLOT_FIELD: &str = "player_slot";
/// Record keys owned by the roster; never taken from caller metadata.
pub const PLAYER_ID_FIELD: &str = "playerId";
pub const JOINED_AT_FIELD: &str = "joinedAt";

pub type SlotIndex = usize;

/// Open mapping of arbitrary player fields (display name, capabilities, slot hint).
pub type PlayerInfo = Map<String, Value>;

/// Current time in milliseconds since the Unix epoch
pub fn timestamp_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis() as u64
}

/// Interpretation of a `player_slot` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotHint {
    /// The field is not present.
    Absent,
    Index(SlotIndex),
    /// The field is present but does not hold a non-negative integer.
    Invalid,
}

impl SlotHint {
    pub fn read(info: &PlayerInfo) -> Self {
        match info.get(PLAYER_SLOT_FIELD) {
            None => SlotHint::Absent,
            Some(value) => value
                .as_u64()
                .and_then(|slot| SlotIndex::try_from(slot).ok())
                .map_or(SlotHint::Invalid, SlotHint::Index),
        }
    }

    pub fn is_defined(&self) -> bool {
        !matches!(self, SlotHint::Absent)
    }
}

/// One seated or pending participant of a room.
///
/// Serializes flat, with the metadata fields alongside `playerId` and
/// `joinedAt`, so it reads the same as the object a client sent in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    pub player_id: String,
    pub joined_at: u64,
    #[serde(flatten)]
    pub fields: PlayerInfo,
}

impl PlayerRecord {
    /// Builds a fresh record stamped with the current time.
    ///
    /// Every metadata field is copied over except the reserved record keys,
    /// which the roster sets itself.
    pub fn new(player_id: &str, info: &PlayerInfo) -> Self {
        let fields = info
            .iter()
            .filter(|(key, _)| !is_reserved(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Self {
            player_id: player_id.to_string(),
            joined_at: timestamp_millis(),
            fields,
        }
    }

    /// Shallow merge: every field in `updates` replaces the field of the same
    /// name, nested objects included. Returns the keys that were ignored
    /// because they name reserved record keys.
    pub fn merge(&mut self, updates: &PlayerInfo) -> Vec<String> {
        let mut ignored = Vec::new();
        for (key, value) in updates {
            if is_reserved(key) {
                ignored.push(key.clone());
            } else {
                self.fields.insert(key.clone(), value.clone());
            }
        }
        ignored
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn slot_hint(&self) -> SlotHint {
        SlotHint::read(&self.fields)
    }

    /// The record as the flat JSON object it serializes to
    pub fn to_value(&self) -> Value {
        // String keys and JSON values only, so serialization cannot fail
        serde_json::to_value(self).unwrap_or_default()
    }
}

fn is_reserved(key: &str) -> bool {
    key == PLAYER_ID_FIELD || key == JOINED_AT_FIELD
}

/// A netplay username together with the account id it is claimed for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub netplay_username: String,
    /// Account id taken from the verified identity token.
    pub user_id: String,
}

/// Membership events delivered to a room, one at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoomEvent {
    Join {
        player_id: String,
        #[serde(default)]
        identity: Option<Identity>,
        #[serde(default)]
        info: PlayerInfo,
    },
    Leave {
        player_id: String,
        #[serde(default)]
        user_id: Option<String>,
    },
    Update {
        player_id: String,
        updates: PlayerInfo,
    },
}

impl RoomEvent {
    pub fn player_id(&self) -> &str {
        match self {
            RoomEvent::Join { player_id, .. }
            | RoomEvent::Leave { player_id, .. }
            | RoomEvent::Update { player_id, .. } => player_id,
        }
    }
}

/// Encodes an event as a single JSON line (no trailing newline).
pub fn encode_event(event: &RoomEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(event)
}

pub fn decode_event(line: &str) -> Result<RoomEvent, serde_json::Error> {
    serde_json::from_str(line.trim())
}
