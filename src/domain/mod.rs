use std::borrow::Cow;

use uuid::Uuid;

mod catalog;
mod draw;
mod ledger;

pub use catalog::{default_rewards, Catalog, RarityTier, RewardDefinition, PROBABILITY_TOLERANCE};
pub use draw::{draw, MockRandomSource, RandomSource, SeededRandom, ThreadRandom};
pub use ledger::{
    DrawResult, Ledger, LedgerLimits, PointTransaction, TransactionKind, UserPointAccount,
};

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum Error {
    /// A single reward definition breaks the catalog rules
    #[error("invalid reward {id}: {reason}")]
    InvalidReward { id: u32, reason: Cow<'static, str> },

    /// The catalog as a whole is inconsistent
    ///
    /// This covers duplicate ids and probabilities that do not sum to 1.0.
    #[error("invalid catalog: {0}")]
    InvalidCatalog(Cow<'static, str>),

    /// Ledger limits that contradict each other or the catalog
    #[error("invalid ledger limits: {0}")]
    InvalidLimits(Cow<'static, str>),

    #[error("amount {amount} must be between {min} and {max}")]
    AmountOutOfRange { amount: i64, min: i64, max: i64 },

    #[error("adding {amount} to {balance} would exceed the maximum balance of {max}")]
    BalanceLimitExceeded { balance: i64, amount: i64, max: i64 },

    #[error("insufficient balance: {balance} available, {amount} requested")]
    InsufficientBalance { balance: i64, amount: i64 },

    /// The transaction is not the credit of the draw it is stored with
    #[error("transaction {transaction_id} does not credit draw {draw_id}")]
    DrawCreditMismatch { draw_id: Uuid, transaction_id: Uuid },

    #[error("transaction description cannot be empty")]
    EmptyDescription,

    #[error("no items available to draw")]
    NoItemsAvailable,
}

impl Error {
    /// Whether the error comes from malformed input rather than the current state
    pub fn is_validation(&self) -> bool {
        !matches!(
            self,
            Error::InsufficientBalance { .. } | Error::NoItemsAvailable
        )
    }
}
