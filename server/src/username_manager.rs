//! Netplay username <-> account id bindings
//!
//! A join is checked here before it reaches the roster: a username already
//! claimed by a different account id is refused. Bindings live independently
//! of room membership and are only ever removed by account id.

use log::{debug, info};
use std::collections::HashMap;

/// What happens to an account's previous username when it binds a new one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RebindPolicy {
    /// The old username stays claimed until the account is unbound.
    #[default]
    RetainPrevious,
    /// The old username is freed as part of the rebind.
    ReleasePrevious,
}

#[derive(Debug, Default)]
pub struct UsernameManager {
    username_to_user_id: HashMap<String, String>,
    user_id_to_username: HashMap<String, String>,
    policy: RebindPolicy,
}

impl UsernameManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: RebindPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> RebindPolicy {
        self.policy
    }

    /// Claims `username` for `user_id`
    ///
    /// Returns false, changing nothing, when the username belongs to another
    /// account. Under [`RebindPolicy::RetainPrevious`] an account that already
    /// held a different username keeps that one claimed as well; only the
    /// reverse lookup moves to the new name.
    pub fn bind_username(&mut self, username: &str, user_id: &str) -> bool {
        if let Some(owner) = self.username_to_user_id.get(username) {
            if owner != user_id {
                debug!(
                    "Username {} already bound to {}, refused for {}",
                    username, owner, user_id
                );
                return false;
            }
        }

        let previous = self
            .user_id_to_username
            .insert(user_id.to_string(), username.to_string());
        self.username_to_user_id
            .insert(username.to_string(), user_id.to_string());

        if let Some(previous) = previous.filter(|previous| previous != username) {
            match self.policy {
                RebindPolicy::RetainPrevious => {
                    debug!("User {} rebound from {}, which stays claimed", user_id, previous)
                }
                RebindPolicy::ReleasePrevious => {
                    self.username_to_user_id.remove(&previous);
                    debug!("User {} rebound, released {}", user_id, previous);
                }
            }
        }

        info!("Username {} bound to {}", username, user_id);
        true
    }

    pub fn get_user_id_for_username(&self, username: &str) -> Option<&str> {
        self.username_to_user_id.get(username).map(String::as_str)
    }

    pub fn get_username_for_user_id(&self, user_id: &str) -> Option<&str> {
        self.user_id_to_username.get(user_id).map(String::as_str)
    }

    /// True when `username` is unclaimed or already claimed by `user_id`
    pub fn is_username_available(&self, username: &str, user_id: &str) -> bool {
        self.username_to_user_id
            .get(username)
            .map_or(true, |owner| owner == user_id)
    }

    /// Drops the current binding of `user_id` in both directions
    pub fn unbind_username(&mut self, user_id: &str) {
        if let Some(username) = self.user_id_to_username.remove(user_id) {
            self.username_to_user_id.remove(&username);
            info!("Username {} unbound from {}", username, user_id);
        }
    }

    /// Number of usernames currently claimed, stale claims included
    pub fn claimed_count(&self) -> usize {
        self.username_to_user_id.len()
    }
}
