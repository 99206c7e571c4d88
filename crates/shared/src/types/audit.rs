//! Audit and soft-delete values embedded in domain entities.
//!
//! Entities carry these as plain fields rather than inheriting them from a
//! base type, so every record states exactly which bookkeeping it has.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::UserId;

/// Who created and last changed a record, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditInfo {
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// User who created the record.
    pub created_by: UserId,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// User who last updated the record.
    pub updated_by: UserId,
}

impl AuditInfo {
    /// Audit info for a record created now by `user`.
    #[must_use]
    pub fn new(user: UserId) -> Self {
        Self::at(user, Utc::now())
    }

    /// Audit info for a record created at `at` by `user`.
    #[must_use]
    pub const fn at(user: UserId, at: DateTime<Utc>) -> Self {
        Self {
            created_at: at,
            created_by: user,
            updated_at: at,
            updated_by: user,
        }
    }

    /// Records an update by `user`.
    pub fn touch(&mut self, user: UserId) {
        self.updated_at = Utc::now();
        self.updated_by = user;
    }
}

/// Soft-delete state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifecycle {
    /// Whether the record is soft-deleted.
    pub is_deleted: bool,
    /// When the record was soft-deleted.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Lifecycle {
    /// A live record.
    #[must_use]
    pub const fn active() -> Self {
        Self {
            is_deleted: false,
            deleted_at: None,
        }
    }

    /// Marks the record deleted. Deleting twice keeps the first timestamp.
    pub fn soft_delete(&mut self) {
        if !self.is_deleted {
            self.is_deleted = true;
            self.deleted_at = Some(Utc::now());
        }
    }

    /// Returns true if the record is live.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !self.is_deleted
    }
}
