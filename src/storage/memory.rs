//! In-memory user repository.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use chrono::Utc;

use crate::storage::{NewUser, StorageError, StorageResult, User, UserRepository};

#[derive(Default)]
struct Inner {
    users: BTreeMap<u64, User>,
    last_id: u64,
}

impl Inner {
    fn check_unique(&self, email: &str, username: &str, except: Option<u64>) -> StorageResult<()> {
        for user in self.users.values() {
            if Some(user.id) == except {
                continue;
            }
            if user.email == email {
                return Err(StorageError::Duplicate { field: "email" });
            }
            if user.username == username {
                return Err(StorageError::Duplicate { field: "username" });
            }
        }
        Ok(())
    }
}

/// User repository kept entirely in process memory.
#[derive(Default)]
pub struct MemoryUserRepository {
    inner: RwLock<Inner>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn find<P>(&self, predicate: P) -> StorageResult<User>
    where
        P: Fn(&User) -> bool,
    {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .users
            .values()
            .find(|u| predicate(u))
            .cloned()
            .ok_or(StorageError::NotFound)
    }
}

impl UserRepository for MemoryUserRepository {
    fn get_by_id(&self, id: u64) -> StorageResult<User> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.users.get(&id).cloned().ok_or(StorageError::NotFound)
    }

    fn get_by_email(&self, email: &str) -> StorageResult<User> {
        self.find(|u| u.email == email)
    }

    fn get_by_username(&self, username: &str) -> StorageResult<User> {
        self.find(|u| u.username == username)
    }

    fn create(&self, user: NewUser) -> StorageResult<User> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.check_unique(&user.email, &user.username, None)?;

        inner.last_id += 1;
        let now = Utc::now();
        let stored = User {
            id: inner.last_id,
            email: user.email,
            username: user.username,
            name: user.name,
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(stored.id, stored.clone());
        tracing::debug!(user_id = stored.id, "User created");
        Ok(stored)
    }

    fn update(&self, mut user: User) -> StorageResult<User> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let created_at = inner
            .users
            .get(&user.id)
            .map(|u| u.created_at)
            .ok_or(StorageError::NotFound)?;
        inner.check_unique(&user.email, &user.username, Some(user.id))?;

        user.created_at = created_at;
        user.updated_at = Utc::now();
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn delete(&self, id: u64) -> StorageResult<()> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner
            .users
            .remove(&id)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }

    fn list(&self) -> StorageResult<Vec<User>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.users.values().cloned().collect())
    }
}
