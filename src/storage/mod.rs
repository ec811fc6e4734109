//! User persistence.
//!
//! # Data Flow
//! ```text
//! handlers
//!     → UserRepository (trait object in AppState)
//!     → memory.rs (RwLock-guarded map, monotonic ids)
//! ```
//!
//! # Design Decisions
//! - Email and username are unique; violations are typed errors
//! - Ids are assigned by the repository and never reused

pub mod memory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::MemoryUserRepository;

/// A stored application user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub email: String,
    pub username: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("user not found")]
    NotFound,

    #[error("{field} already in use")]
    Duplicate { field: &'static str },
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Operations over the user store.
pub trait UserRepository: Send + Sync {
    fn get_by_id(&self, id: u64) -> StorageResult<User>;
    fn get_by_email(&self, email: &str) -> StorageResult<User>;
    fn get_by_username(&self, username: &str) -> StorageResult<User>;
    fn create(&self, user: NewUser) -> StorageResult<User>;
    fn update(&self, user: User) -> StorageResult<User>;
    fn delete(&self, id: u64) -> StorageResult<()>;
    /// All users, ordered by id.
    fn list(&self) -> StorageResult<Vec<User>>;
}
