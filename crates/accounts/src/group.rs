//! Group records: named collections users can belong to.

use serde::{Deserialize, Serialize};

use prediction_core::{DomainError, DomainResult, FieldErrors, GroupId};

use crate::fields;

/// A named group. `name` is unique across groups (enforced by the store).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
}

impl Group {
    pub fn apply(&mut self, patch: GroupPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupInput {
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGroup {
    pub name: String,
}

impl NewGroup {
    pub fn from_input(input: GroupInput) -> DomainResult<Self> {
        let mut errors = FieldErrors::new();
        match fields::required_text(&mut errors, "name", input.name, fields::GROUP_NAME_MAX_LEN) {
            Some(name) => Ok(Self { name }),
            None => Err(DomainError::Validation(errors)),
        }
    }

    pub fn into_group(self, id: GroupId) -> Group {
        Group { id, name: self.name }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupPatch {
    pub name: Option<String>,
}

impl GroupPatch {
    pub fn from_input(input: GroupInput, partial: bool) -> DomainResult<Self> {
        if input.name.is_none() && partial {
            return Ok(Self::default());
        }
        let NewGroup { name } = NewGroup::from_input(input)?;
        Ok(Self { name: Some(name) })
    }
}
