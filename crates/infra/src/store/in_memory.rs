use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use prediction_accounts::{fields, Group, GroupPatch, NewGroup, NewUser, User, UserPatch};
use prediction_core::{DomainError, DomainResult, GroupId, UserId};

use super::{AccountStore, sort_users_newest_first};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    groups: HashMap<GroupId, Group>,
}

impl Tables {
    fn username_taken(&self, username: &str, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|u| u.username == username && Some(u.id) != except)
    }

    fn group_name_taken(&self, name: &str, except: Option<GroupId>) -> bool {
        self.groups
            .values()
            .any(|g| g.name == name && Some(g.id) != except)
    }

    fn ensure_groups_exist(&self, groups: &[GroupId]) -> DomainResult<()> {
        if groups.iter().all(|g| self.groups.contains_key(g)) {
            Ok(())
        } else {
            Err(DomainError::validation("groups", fields::UNKNOWN_GROUP))
        }
    }
}

/// In-memory store for tests/dev.
///
/// All checks and writes for one operation happen under a single write guard,
/// so uniqueness holds under concurrent requests.
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    inner: RwLock<Tables>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> DomainResult<RwLockReadGuard<'_, Tables>> {
        self.inner
            .read()
            .map_err(|_| DomainError::storage("account store lock poisoned"))
    }

    fn write(&self) -> DomainResult<RwLockWriteGuard<'_, Tables>> {
        self.inner
            .write()
            .map_err(|_| DomainError::storage("account store lock poisoned"))
    }
}

#[async_trait::async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn list_users(&self) -> DomainResult<Vec<User>> {
        let mut users: Vec<User> = self.read()?.users.values().cloned().collect();
        sort_users_newest_first(&mut users);
        Ok(users)
    }

    async fn get_user(&self, id: UserId) -> DomainResult<User> {
        self.read()?.users.get(&id).cloned().ok_or(DomainError::NotFound)
    }

    async fn create_user(&self, new: NewUser, date_joined: DateTime<Utc>) -> DomainResult<User> {
        let mut tables = self.write()?;
        if tables.username_taken(&new.username, None) {
            return Err(DomainError::validation("username", fields::USERNAME_TAKEN));
        }
        tables.ensure_groups_exist(&new.groups)?;

        let user = new.into_user(UserId::new(), date_joined);
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: UserId, patch: UserPatch) -> DomainResult<User> {
        let mut tables = self.write()?;
        if !tables.users.contains_key(&id) {
            return Err(DomainError::NotFound);
        }
        if let Some(username) = &patch.username {
            if tables.username_taken(username, Some(id)) {
                return Err(DomainError::validation("username", fields::USERNAME_TAKEN));
            }
        }
        if let Some(groups) = &patch.groups {
            tables.ensure_groups_exist(groups)?;
        }

        let user = tables.users.get_mut(&id).ok_or(DomainError::NotFound)?;
        user.apply(patch);
        Ok(user.clone())
    }

    async fn delete_user(&self, id: UserId) -> DomainResult<()> {
        self.write()?
            .users
            .remove(&id)
            .map(|_| ())
            .ok_or(DomainError::NotFound)
    }

    async fn list_groups(&self) -> DomainResult<Vec<Group>> {
        let mut groups: Vec<Group> = self.read()?.groups.values().cloned().collect();
        groups.sort_by_key(|g| g.id);
        Ok(groups)
    }

    async fn get_group(&self, id: GroupId) -> DomainResult<Group> {
        self.read()?.groups.get(&id).cloned().ok_or(DomainError::NotFound)
    }

    async fn create_group(&self, new: NewGroup) -> DomainResult<Group> {
        let mut tables = self.write()?;
        if tables.group_name_taken(&new.name, None) {
            return Err(DomainError::validation("name", fields::GROUP_NAME_TAKEN));
        }

        let group = new.into_group(GroupId::new());
        tables.groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn update_group(&self, id: GroupId, patch: GroupPatch) -> DomainResult<Group> {
        let mut tables = self.write()?;
        if !tables.groups.contains_key(&id) {
            return Err(DomainError::NotFound);
        }
        if let Some(name) = &patch.name {
            if tables.group_name_taken(name, Some(id)) {
                return Err(DomainError::validation("name", fields::GROUP_NAME_TAKEN));
            }
        }

        let group = tables.groups.get_mut(&id).ok_or(DomainError::NotFound)?;
        group.apply(patch);
        Ok(group.clone())
    }

    async fn delete_group(&self, id: GroupId) -> DomainResult<()> {
        let mut tables = self.write()?;
        tables.groups.remove(&id).ok_or(DomainError::NotFound)?;

        let released = tables
            .users
            .values_mut()
            .map(|u| u.leave_group(id))
            .filter(|changed| *changed)
            .count();
        tracing::debug!(group_id = %id, released, "group removed from members");
        Ok(())
    }
}
