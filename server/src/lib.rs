//! # Netplay Room Library
//!
//! Authoritative membership state for a peer-to-peer netplay room: who is
//! joined, which input slot each participant holds, and which account is
//! allowed to use a given netplay username.
//!
//! ## Module Organization
//!
//! ### Player Manager (`player_manager`)
//! The roster of the room, keyed by player id. Adding, updating and removing
//! players drives the slot allocator; a refused slot never undoes a roster
//! change.
//!
//! ### Slot Manager (`slot_manager`)
//! The [`slot_manager::SlotAllocator`] capability the roster calls into, and
//! a bounded allocator implementing it.
//!
//! ### Username Manager (`username_manager`)
//! Binds netplay usernames to account ids so one account cannot take over
//! another's name. Bindings are removed by account id only.
//!
//! ### Room (`room`)
//! Applies join, leave and update events to the three pieces of state above,
//! one event at a time.
//!
//! ### Replay (`replay`)
//! Reads newline-delimited JSON events from any async reader into a room.
//!
//! ## Concurrency
//!
//! Everything here is synchronous and takes `&mut self`. Events are expected
//! to be applied strictly in order by whoever owns the room; there is no
//! internal locking and no operation is transactional across its steps.
//!
//! ## Usage Example
//!
//! ```rust
//! use server::room::{EventOutcome, Room, RoomConfig};
//! use shared::{decode_event, RoomEvent};
//!
//! let mut room = Room::new(RoomConfig::default());
//!
//! let join = decode_event(
//!     r#"{"type":"join","player_id":"p1","info":{"name":"Alice","player_slot":0}}"#,
//! )
//! .unwrap();
//! let outcome = room.apply(join).unwrap();
//! assert_eq!(
//!     outcome,
//!     EventOutcome::Joined { player_id: "p1".to_string(), slot: Some(0) }
//! );
//!
//! room.apply(RoomEvent::Leave { player_id: "p1".to_string(), user_id: None })
//!     .unwrap();
//! assert_eq!(room.players().get_player_count(), 0);
//! ```

pub mod player_manager;
pub mod replay;
pub mod room;
pub mod slot_manager;
pub mod username_manager;
