//! User domain entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User domain entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// False until the email address has been verified
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user from validated account data
    pub fn new(id: Uuid, account: NewAccount, password_hash: String, is_active: bool) -> Self {
        let now = Utc::now();
        Self {
            id,
            username: account.username,
            email: account.email,
            first_name: account.first_name,
            last_name: account.last_name,
            password_hash,
            is_active,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// "First Last", falling back to the username
    pub fn full_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }

    /// Mark the account as verified
    pub fn activate(&mut self) {
        self.is_active = true;
        self.updated_at = Utc::now();
    }

    /// Record a successful login
    pub fn touch_login(&mut self) {
        let now = Utc::now();
        self.last_login = Some(now);
        self.updated_at = now;
    }

    /// Value that changes whenever the account changes; binds
    /// verification links to the state they were issued for.
    pub fn state_stamp(&self) -> i64 {
        self.updated_at.timestamp_micros()
    }
}

/// Cleaned registration data, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Plain-text password, hashed by the account service
    pub password: String,
}
