use serde::Deserialize;

use prediction_accounts::{Group, GroupInput, User, UserInput};
use prediction_core::{DomainError, DomainResult, FieldErrors, GroupId, UserId};

pub const NO_URL_MATCH: &str = "Invalid hyperlink - No URL match.";

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct UserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    /// Group hyperlinks (`/groups/{id}/`, absolute URLs accepted).
    pub groups: Option<Vec<String>>,
}

impl UserRequest {
    pub fn into_input(self) -> DomainResult<UserInput> {
        let groups = match self.groups {
            None => None,
            Some(links) => {
                let parsed: Option<Vec<GroupId>> = links.iter().map(|l| parse_group_link(l)).collect();
                match parsed {
                    Some(ids) => Some(ids),
                    None => {
                        let mut errors = FieldErrors::new();
                        errors.add("groups", NO_URL_MATCH);
                        return Err(DomainError::Validation(errors));
                    }
                }
            }
        };

        Ok(UserInput {
            username: self.username,
            email: self.email,
            groups,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct GroupRequest {
    pub name: Option<String>,
}

impl From<GroupRequest> for GroupInput {
    fn from(value: GroupRequest) -> Self {
        GroupInput { name: value.name }
    }
}

// -------------------------
// Hyperlinks
// -------------------------

pub fn user_link(id: UserId) -> String {
    format!("/users/{id}/")
}

pub fn group_link(id: GroupId) -> String {
    format!("/groups/{id}/")
}

/// Resolve a group hyperlink back to its id.
///
/// Accepts `/groups/{id}/`, the same without the trailing slash, or an
/// absolute URL whose path has that shape.
pub fn parse_group_link(link: &str) -> Option<GroupId> {
    let path = match link.split_once("://") {
        Some((_scheme, rest)) => &rest[rest.find('/')?..],
        None => link,
    };
    let id = path.strip_prefix("/groups/")?;
    let id = id.strip_suffix('/').unwrap_or(id);
    if id.contains('/') {
        return None;
    }
    id.parse().ok()
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn user_to_json(user: &User) -> serde_json::Value {
    serde_json::json!({
        "url": user_link(user.id),
        "username": user.username,
        "email": user.email,
        "groups": user.groups.iter().copied().map(group_link).collect::<Vec<_>>(),
    })
}

pub fn group_to_json(group: &Group) -> serde_json::Value {
    serde_json::json!({
        "url": group_link(group.id),
        "name": group.name,
    })
}
