//! Known users and admins, each persisted as a JSON array.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::chatbot::storage::{Storage, load_or_default, save_json};

/// A Telegram user as the bot remembers them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: i64,
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Member {
    pub fn new(id: i64, first_name: impl Into<String>) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            username: None,
        }
    }
}

/// A persisted list of members, unique by id.
pub struct MemberList {
    members: Vec<Member>,
    storage: Box<dyn Storage>,
    what: &'static str,
}

impl MemberList {
    pub fn load(storage: Box<dyn Storage>, what: &'static str) -> Self {
        let members: Vec<Member> = load_or_default(storage.as_ref(), what);
        info!("{} {what} known", members.len());
        Self { members, storage, what }
    }

    pub fn contains(&self, id: i64) -> bool {
        self.members.iter().any(|m| m.id == id)
    }

    #[cfg(test)]
    pub fn get(&self, id: i64) -> Option<&Member> {
        self.members.iter().find(|m| m.id == id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Insert or refresh a member. Persists only when something changed.
    fn upsert(&mut self, member: &Member) {
        match self.members.iter_mut().find(|m| m.id == member.id) {
            Some(existing) if existing == member => return,
            Some(existing) => *existing = member.clone(),
            None => self.members.push(member.clone()),
        }
        self.persist();
    }

    /// Insert a member unless one with the same id exists.
    fn insert(&mut self, member: &Member) -> bool {
        if self.contains(member.id) {
            return false;
        }
        self.members.push(member.clone());
        self.persist();
        true
    }

    fn remove(&mut self, id: i64) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m.id != id);
        if self.members.len() == before {
            return false;
        }
        self.persist();
        true
    }

    fn persist(&self) {
        // The in-memory list stays authoritative if the write fails
        if let Err(e) = save_json(self.storage.as_ref(), &self.members) {
            warn!("Failed to save {} to {}: {e}", self.what, self.storage.location());
        }
    }
}

/// Users and admins together. Admins are always a subset of users.
pub struct MemberRegistry {
    users: MemberList,
    admins: MemberList,
}

impl MemberRegistry {
    pub fn new(users: MemberList, admins: MemberList) -> Self {
        Self { users, admins }
    }

    pub fn load(users: Box<dyn Storage>, admins: Box<dyn Storage>) -> Self {
        Self::new(MemberList::load(users, "users"), MemberList::load(admins, "admins"))
    }

    pub fn add_user(&mut self, user: &Member) {
        self.users.upsert(user);
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admins.contains(user_id)
    }

    pub fn has_admins(&self) -> bool {
        !self.admins.is_empty()
    }

    /// Promote a user. `false` if they already were an admin.
    pub fn add_admin(&mut self, user: &Member) -> bool {
        self.users.upsert(user);
        let added = self.admins.insert(user);
        if added {
            info!("👑 {} ({}) is now an admin", user.first_name, user.id);
        }
        added
    }

    /// Demote a user. `false` if they were not an admin.
    pub fn remove_admin(&mut self, user: &Member) -> bool {
        let removed = self.admins.remove(user.id);
        if removed {
            info!("{} ({}) is no longer an admin", user.first_name, user.id);
        }
        removed
    }

    #[cfg(test)]
    pub fn user(&self, id: i64) -> Option<&Member> {
        self.users.get(id)
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn admin_count(&self) -> usize {
        self.admins.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chatbot::storage::{FileStorage, MemoryStorage};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn registry() -> MemberRegistry {
        MemberRegistry::load(Box::new(MemoryStorage::new()), Box::new(MemoryStorage::new()))
    }

    #[test]
    fn test_add_user_is_idempotent() {
        let mut reg = registry();
        let alice = Member::new(1, "Alice");
        reg.add_user(&alice);
        reg.add_user(&alice);
        assert_eq!(reg.user_count(), 1);
    }

    #[test]
    fn test_add_user_refreshes_name() {
        let mut reg = registry();
        reg.add_user(&Member::new(1, "Alice"));
        reg.add_user(&Member::new(1, "Alicia"));
        assert_eq!(reg.user_count(), 1);
        assert_eq!(reg.user(1).unwrap().first_name, "Alicia");
    }

    #[test]
    fn test_unchanged_user_is_not_rewritten() {
        let users = Arc::new(MemoryStorage::new());
        let mut reg = MemberRegistry::load(Box::new(users.clone()), Box::new(MemoryStorage::new()));
        let alice = Member::new(1, "Alice");
        reg.add_user(&alice);
        users.write("sentinel").unwrap();
        reg.add_user(&alice);
        assert_eq!(users.contents().as_deref(), Some("sentinel"));
    }

    #[test]
    fn test_add_admin_twice_is_noop() {
        let mut reg = registry();
        let alice = Member::new(1, "Alice");
        assert!(reg.add_admin(&alice));
        assert!(!reg.add_admin(&alice));
        assert_eq!(reg.admin_count(), 1);
        assert!(reg.is_admin(1));
        // Admins are users too
        assert!(reg.user(1).is_some());
    }

    #[test]
    fn test_remove_admin() {
        let mut reg = registry();
        let alice = Member::new(1, "Alice");
        let bob = Member::new(2, "Bob");
        reg.add_admin(&alice);

        assert!(!reg.remove_admin(&bob));
        assert!(reg.remove_admin(&alice));
        assert!(!reg.is_admin(1));
        assert!(!reg.has_admins());
        assert!(!reg.remove_admin(&alice));
    }

    #[test]
    fn test_admins_survive_reload() {
        let dir = TempDir::new().unwrap();
        let admins = dir.path().join("admins.json");
        let users = dir.path().join("users.json");

        {
            let mut reg = MemberRegistry::load(
                Box::new(FileStorage::new(&users)),
                Box::new(FileStorage::new(&admins)),
            );
            reg.add_admin(&Member::new(42, "Sara"));
            reg.add_user(&Member::new(7, "Reza"));
        }

        let reg = MemberRegistry::load(Box::new(FileStorage::new(&users)), Box::new(FileStorage::new(&admins)));
        assert!(reg.is_admin(42));
        assert!(!reg.is_admin(7));
        assert_eq!(reg.user_count(), 2);
    }

    #[test]
    fn test_unreadable_admin_file_starts_empty() {
        let reg = MemberRegistry::load(
            Box::new(MemoryStorage::new()),
            Box::new(MemoryStorage::with_contents("not json")),
        );
        assert!(!reg.has_admins());
    }

    #[test]
    fn test_persisted_format() {
        let admins = Arc::new(MemoryStorage::new());
        let mut reg = MemberRegistry::load(Box::new(MemoryStorage::new()), Box::new(admins.clone()));
        reg.add_admin(&Member::new(5, "Nima"));

        let stored: serde_json::Value = serde_json::from_str(&admins.contents().unwrap()).unwrap();
        assert_eq!(stored, serde_json::json!([{ "id": 5, "first_name": "Nima" }]));
    }
}
