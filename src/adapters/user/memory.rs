use crate::ports::user::{Error, User, UserPort};
use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};
use uuid::Uuid;

/// In-memory user directory
#[derive(Clone, Debug, Default)]
pub struct MemoryUserDirectory {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl MemoryUserDirectory {
    /// Register a user, replacing any previous one with the same id
    pub fn insert(&self, user: User) -> Result<(), Error> {
        self.users.write()?.insert(user.user_id, user);
        Ok(())
    }
}

#[async_trait::async_trait]
impl UserPort for MemoryUserDirectory {
    async fn find_user(&self, user_id: Uuid) -> Result<User, Error> {
        self.users
            .read()?
            .get(&user_id)
            .cloned()
            .ok_or(Error::UserDoesNotExist(user_id))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("poison error: {0}")]
pub struct ErasedPoisonError(String);

impl<T> From<PoisonError<T>> for Error {
    fn from(err: PoisonError<T>) -> Self {
        Self::Adapter(Box::new(ErasedPoisonError(err.to_string())))
    }
}
