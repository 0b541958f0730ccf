//! User account store.
//!
//! Accounts live in memory for the lifetime of the process. The store is a
//! collaborator of the workload gateway and shares no state with it.

use core::error::Error;
use std::collections::BTreeMap;
use std::sync::RwLock;

use api_types::UserRecord;
use error_stack::Report;
use tracing::error;
use tracing::info;

/// Role value marking an administrator.
pub const ADMIN_ROLE: i32 = 1;

/// User store errors
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum UserStoreError {
    #[display("User already exists: {username}")]
    Duplicate { username: String },
    #[display("User not found: {id}")]
    NotFound { id: String },
    #[display("User store unavailable: {message}")]
    Storage { message: String },
}

impl Error for UserStoreError {}

/// CRUD access to user accounts, keyed by an opaque id.
pub trait UserStore: Send + Sync {
    /// Insert `user` and return it with its assigned id. Any id on the input is ignored.
    fn create(&self, user: UserRecord) -> Result<UserRecord, Report<UserStoreError>>;

    fn find_by_username(&self, username: &str)
        -> Result<Option<UserRecord>, Report<UserStoreError>>;

    /// Replace the user with `user.id`. An empty password keeps the stored one.
    fn update(&self, user: UserRecord) -> Result<(), Report<UserStoreError>>;

    fn delete(&self, id: &str) -> Result<(), Report<UserStoreError>>;

    /// All users ordered by id
    fn list(&self) -> Result<Vec<UserRecord>, Report<UserStoreError>>;

    fn count(&self) -> Result<usize, Report<UserStoreError>>;
}

#[derive(Default)]
struct UserTable {
    next_id: u64,
    users: BTreeMap<u64, UserRecord>,
}

impl UserTable {
    fn username_taken(&self, username: &str, except: Option<u64>) -> bool {
        self.users
            .iter()
            .any(|(id, user)| Some(*id) != except && user.username == username)
    }
}

/// [`UserStore`] kept in process memory
#[derive(Default)]
pub struct InMemoryUserStore {
    table: RwLock<UserTable>,
}

fn poisoned<T>(e: std::sync::PoisonError<T>) -> Report<UserStoreError> {
    error!("User table lock poisoned: {e}");
    Report::new(UserStoreError::Storage {
        message: "user table lock poisoned".to_string(),
    })
}

fn parse_id(id: &str) -> Result<u64, Report<UserStoreError>> {
    id.parse().map_err(|_| {
        Report::new(UserStoreError::NotFound { id: id.to_string() })
    })
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserStore for InMemoryUserStore {
    fn create(&self, mut user: UserRecord) -> Result<UserRecord, Report<UserStoreError>> {
        let mut table = self.table.write().map_err(poisoned)?;
        if table.username_taken(&user.username, None) {
            return Err(Report::new(UserStoreError::Duplicate {
                username: user.username,
            }));
        }

        table.next_id += 1;
        let id = table.next_id;
        user.id = id.to_string();
        table.users.insert(id, user.clone());
        info!(id, username = %user.username, "Created user");
        Ok(user)
    }

    fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, Report<UserStoreError>> {
        let table = self.table.read().map_err(poisoned)?;
        Ok(table
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    fn update(&self, mut user: UserRecord) -> Result<(), Report<UserStoreError>> {
        let id = parse_id(&user.id)?;
        let mut table = self.table.write().map_err(poisoned)?;
        let Some(existing) = table.users.get(&id) else {
            return Err(Report::new(UserStoreError::NotFound { id: user.id }));
        };
        if user.password.is_empty() {
            user.password.clone_from(&existing.password);
        }
        if table.username_taken(&user.username, Some(id)) {
            return Err(Report::new(UserStoreError::Duplicate {
                username: user.username,
            }));
        }

        info!(id, username = %user.username, "Updated user");
        table.users.insert(id, user);
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), Report<UserStoreError>> {
        let key = parse_id(id)?;
        let mut table = self.table.write().map_err(poisoned)?;
        match table.users.remove(&key) {
            Some(user) => {
                info!(id, username = %user.username, "Deleted user");
                Ok(())
            }
            None => Err(Report::new(UserStoreError::NotFound { id: id.to_string() })),
        }
    }

    fn list(&self) -> Result<Vec<UserRecord>, Report<UserStoreError>> {
        let table = self.table.read().map_err(poisoned)?;
        Ok(table.users.values().cloned().collect())
    }

    fn count(&self) -> Result<usize, Report<UserStoreError>> {
        Ok(self.table.read().map_err(poisoned)?.users.len())
    }
}
