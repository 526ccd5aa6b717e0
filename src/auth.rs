//! Name-based sign-in
//!
//! There are no credentials: a user is identified by a display name and a
//! locally generated id. The record lives under [`CURRENT_USER_KEY`] until
//! logout. Chat history is stored separately and survives logout.

use crate::error::{Result, ValidationError};
use crate::storage::{read_json, write_json, KeyValueStore, CURRENT_USER_KEY};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use ulid::Ulid;

/// Minimum display name length after trimming
pub const MIN_NAME_LEN: usize = 2;

/// The signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Time-ordered unique id (`user_<ULID>`)
    pub id: String,
    /// Trimmed display name
    pub name: String,
    /// Always true for a persisted user
    pub is_authenticated: bool,
    /// When the name was entered
    pub entry_date: DateTime<Utc>,
}

/// Sign-in service over a key/value store
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn KeyValueStore>,
}

impl AuthService {
    /// Create a service backed by `store`
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Whether `name` is acceptable as a display name
    ///
    /// # Examples
    ///
    /// ```
    /// use cemtras::auth::AuthService;
    ///
    /// assert!(AuthService::is_valid_name(" Jo "));
    /// assert!(!AuthService::is_valid_name("J"));
    /// ```
    pub fn is_valid_name(name: &str) -> bool {
        name.trim().chars().count() >= MIN_NAME_LEN
    }

    /// Create and persist a user for `name`
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::NameTooShort` (wrapped) if the trimmed name is
    /// shorter than [`MIN_NAME_LEN`]; nothing is persisted in that case.
    /// Storage failures are propagated.
    pub fn authenticate(&self, name: &str) -> Result<User> {
        if !Self::is_valid_name(name) {
            return Err(ValidationError::NameTooShort { min: MIN_NAME_LEN }.into());
        }

        let user = User {
            id: format!("user_{}", Ulid::new()),
            name: name.trim().to_string(),
            is_authenticated: true,
            entry_date: Utc::now(),
        };

        write_json(self.store.as_ref(), CURRENT_USER_KEY, &user)?;
        tracing::info!(user_id = %user.id, "User signed in");
        Ok(user)
    }

    /// The persisted user, if any
    pub fn current_user(&self) -> Result<Option<User>> {
        read_json(self.store.as_ref(), CURRENT_USER_KEY)
    }

    /// Forget the persisted user; chat history is left untouched
    pub fn logout(&self) -> Result<()> {
        self.store.remove(CURRENT_USER_KEY)?;
        tracing::info!("User signed out");
        Ok(())
    }
}
