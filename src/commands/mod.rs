use std::{borrow::Cow, future::Future, pin::Pin, sync::Arc};

use crate::domain::{Catalog, Ledger};

pub mod execute_draw;
pub mod get_balance;
pub mod get_history;
pub mod spend_points;

/// Number of history entries callers should ask for when the user did not pick one
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T, Error>> + Send>>;

/// Entry point for every command and query
///
/// Each request type is served through its own `tower::Service` implementation. Cloning is cheap
/// and clones share the same ports, catalog and random source.
pub struct DomainLogic<D, U, R> {
    database: Arc<D>,
    users: Arc<U>,
    random: Arc<R>,
    catalog: Arc<Catalog>,
    ledger: Ledger,
}

impl<D, U, R> DomainLogic<D, U, R> {
    /// `ledger` validates new transactions and is handed to the store for every balance change,
    /// so a single set of limits applies end to end.
    pub fn new(
        database: Arc<D>,
        users: Arc<U>,
        random: Arc<R>,
        catalog: Arc<Catalog>,
        ledger: Ledger,
    ) -> Self {
        Self {
            database,
            users,
            random,
            catalog,
            ledger,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}

impl<D, U, R> Clone for DomainLogic<D, U, R> {
    fn clone(&self) -> Self {
        Self {
            database: self.database.clone(),
            users: self.users.clone(),
            random: self.random.clone(),
            catalog: self.catalog.clone(),
            ledger: self.ledger,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("database port error: {0:?}")]
    Database(#[from] crate::ports::database::Error),
    #[error("user port error: {0:?}")]
    User(#[from] crate::ports::user::Error),
    #[error("domain error: {0}")]
    Domain(#[from] crate::domain::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(Cow<'static, str>),
}

impl Error {
    /// Whether the user targeted by the request does not exist
    pub fn is_user_not_found(&self) -> bool {
        matches!(
            self,
            Error::User(crate::ports::user::Error::UserDoesNotExist(_))
        )
    }

    /// Whether the request was rejected before anything was stored
    pub fn is_validation(&self) -> bool {
        match self {
            Error::InvalidRequest(_) => true,
            Error::Domain(err) | Error::Database(crate::ports::database::Error::Ledger(err)) => {
                err.is_validation()
            }
            _ => false,
        }
    }

    /// Whether the failure comes from a storage or directory adapter
    ///
    /// The outcome of the request is unknown in that case and the transaction log is the source
    /// of truth.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Error::Database(crate::ports::database::Error::Adapter(_))
                | Error::User(crate::ports::user::Error::Adapter(_))
        )
    }
}

fn check_limit(limit: usize) -> Result<(), Error> {
    if limit == 0 {
        return Err(Error::InvalidRequest("limit must be positive".into()));
    }
    Ok(())
}
