//! User records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use prediction_core::{DomainError, DomainResult, FieldErrors, GroupId, UserId};

use crate::fields;

/// A user identity record.
///
/// # Invariants
/// - `username` is non-blank, at most 150 characters, and unique across users
///   (uniqueness is enforced by the store).
/// - `groups` holds no duplicates.
/// - `date_joined` is set once at creation and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub groups: Vec<GroupId>,
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// Apply a validated patch in place.
    pub fn apply(&mut self, patch: UserPatch) {
        if let Some(username) = patch.username {
            self.username = username;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(groups) = patch.groups {
            self.groups = groups;
        }
    }

    /// Drop a group reference (used when the group is deleted).
    pub fn leave_group(&mut self, group_id: GroupId) -> bool {
        let before = self.groups.len();
        self.groups.retain(|g| *g != group_id);
        before != self.groups.len()
    }
}

/// Raw, unvalidated write input for a user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub groups: Option<Vec<GroupId>>,
}

/// Validated data for a new user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub groups: Vec<GroupId>,
}

impl NewUser {
    pub fn from_input(input: UserInput) -> DomainResult<Self> {
        let mut errors = FieldErrors::new();
        let username = fields::username(&mut errors, input.username);
        let email = fields::email(&mut errors, input.email.unwrap_or_default());
        let groups = fields::dedup_refs(input.groups.unwrap_or_default());

        match (username, email) {
            (Some(username), Some(email)) if errors.is_empty() => Ok(Self { username, email, groups }),
            _ => Err(DomainError::Validation(errors)),
        }
    }

    pub fn into_user(self, id: UserId, date_joined: DateTime<Utc>) -> User {
        User {
            id,
            username: self.username,
            email: self.email,
            groups: self.groups,
            date_joined,
        }
    }
}

/// Validated changes to an existing user. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub groups: Option<Vec<GroupId>>,
}

impl UserPatch {
    /// Validate an update.
    ///
    /// A full update (`partial == false`) requires `username`; a partial one
    /// only validates the fields that are present.
    pub fn from_input(input: UserInput, partial: bool) -> DomainResult<Self> {
        let mut errors = FieldErrors::new();

        let username = match input.username {
            None if partial => None,
            value => fields::username(&mut errors, value),
        };
        let email = input.email.and_then(|e| fields::email(&mut errors, e));
        let groups = input.groups.map(fields::dedup_refs);
        errors.into_result()?;

        Ok(Self { username, email, groups })
    }
}
