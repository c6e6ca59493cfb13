use chrono::{DateTime, Utc};
use uuid::Uuid;

#[mockall::automock]
#[async_trait::async_trait]
pub trait UserPort {
    async fn find_user(&self, user_id: Uuid) -> Result<User, Error>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct User {
    pub user_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            user_id: Uuid::new_v4(),
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Domain-level error when a user does not exist
    #[error("user {0} does not exist")]
    UserDoesNotExist(Uuid),

    /// Concrete adapter errors
    ///
    /// This could represent any errors from a concrete adapter that is not part of the domain
    /// model, such as connectivity, configuration, or permission errors.
    #[error("adapter error: {0:?}")]
    Adapter(Box<dyn std::error::Error + Send + Sync>),
}
