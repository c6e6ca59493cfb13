use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use super::{Catalog, Error, RarityTier, RewardDefinition};

/// Outcome of a single draw for a user
#[derive(Clone, Debug, PartialEq)]
pub struct DrawResult {
    pub id: Uuid,
    pub user_id: Uuid,
    pub reward_id: u32,
    pub reward_name: String,
    pub rarity_tier: RarityTier,
    pub points_earned: i64,
    pub created_at: DateTime<Utc>,
}

impl DrawResult {
    pub fn new(user_id: Uuid, reward: &RewardDefinition) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            reward_id: reward.id,
            reward_name: reward.name.clone(),
            rarity_tier: reward.rarity_tier,
            points_earned: reward.point_value,
            created_at: Utc::now(),
        }
    }
}

/// Point balance of a user
#[derive(Clone, Debug, PartialEq)]
pub struct UserPointAccount {
    pub id: Uuid,
    pub user_id: Uuid,
    pub balance: i64,
    /// Incremented by the store on every persisted change
    ///
    /// Conditional updates only go through if the stored version still matches this one.
    pub version: u64,
    pub updated_at: DateTime<Utc>,
}

impl UserPointAccount {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            balance: 0,
            version: 0,
            updated_at: Utc::now(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionKind {
    /// Points credited by a draw
    DrawCredit,
    /// Points spent by the user
    Spend,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::DrawCredit => "draw_credit",
            TransactionKind::Spend => "spend",
        }
    }
}

/// Append-only record of a balance change
#[derive(Clone, Debug, PartialEq)]
pub struct PointTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Always positive, the direction comes from `kind`
    pub amount: i64,
    pub kind: TransactionKind,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl PointTransaction {
    /// Effect of this transaction on the balance
    pub fn signed_amount(&self) -> i64 {
        match self.kind {
            TransactionKind::DrawCredit => self.amount,
            TransactionKind::Spend => -self.amount,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LedgerLimits {
    pub min_tx_amount: i64,
    pub max_tx_amount: i64,
    pub max_balance: i64,
}

impl LedgerLimits {
    /// Check that the limits are coherent and allow crediting every catalog item
    pub fn validate(&self, catalog: &Catalog) -> Result<(), Error> {
        if self.min_tx_amount < 1 {
            return Err(Error::InvalidLimits(
                "min_tx_amount must be at least 1".into(),
            ));
        }
        if self.min_tx_amount > self.max_tx_amount {
            return Err(Error::InvalidLimits(
                format!(
                    "min_tx_amount {} is above max_tx_amount {}",
                    self.min_tx_amount, self.max_tx_amount
                )
                .into(),
            ));
        }
        if self.max_balance < self.max_tx_amount {
            return Err(Error::InvalidLimits(
                format!(
                    "max_balance {} is below max_tx_amount {}",
                    self.max_balance, self.max_tx_amount
                )
                .into(),
            ));
        }

        if let Some(item) = catalog.items().iter().find(|item| {
            item.point_value < self.min_tx_amount || item.point_value > self.max_tx_amount
        }) {
            return Err(Error::InvalidLimits(
                format!(
                    "reward {} awards {} points, outside of {}..={}",
                    item.id, item.point_value, self.min_tx_amount, self.max_tx_amount
                )
                .into(),
            ));
        }

        Ok(())
    }
}

impl Default for LedgerLimits {
    fn default() -> Self {
        Self {
            min_tx_amount: 1,
            max_tx_amount: 10_000,
            max_balance: 1_000_000_000,
        }
    }
}

/// Balance rules
///
/// All operations are pure: they return new values and leave persistence to the caller.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ledger {
    limits: LedgerLimits,
}

impl Ledger {
    pub fn new(limits: LedgerLimits) -> Self {
        Self { limits }
    }

    pub fn credit(&self, account: &UserPointAccount, amount: i64) -> Result<UserPointAccount, Error> {
        self.check_amount(amount)?;

        let balance = account
            .balance
            .checked_add(amount)
            .filter(|balance| *balance <= self.limits.max_balance)
            .ok_or(Error::BalanceLimitExceeded {
                balance: account.balance,
                amount,
                max: self.limits.max_balance,
            })?;

        Ok(UserPointAccount {
            balance,
            updated_at: Utc::now(),
            ..account.clone()
        })
    }

    pub fn debit(&self, account: &UserPointAccount, amount: i64) -> Result<UserPointAccount, Error> {
        self.check_amount(amount)?;

        if account.balance < amount {
            return Err(Error::InsufficientBalance {
                balance: account.balance,
                amount,
            });
        }

        Ok(UserPointAccount {
            balance: account.balance - amount,
            updated_at: Utc::now(),
            ..account.clone()
        })
    }

    /// Apply a transaction to an account according to its kind
    pub fn apply(
        &self,
        account: &UserPointAccount,
        transaction: &PointTransaction,
    ) -> Result<UserPointAccount, Error> {
        match transaction.kind {
            TransactionKind::DrawCredit => self.credit(account, transaction.amount),
            TransactionKind::Spend => self.debit(account, transaction.amount),
        }
    }

    pub fn record_transaction(
        &self,
        user_id: Uuid,
        amount: i64,
        kind: TransactionKind,
        description: impl Into<String>,
    ) -> Result<PointTransaction, Error> {
        self.check_amount(amount)?;

        let description = description.into();
        if description.trim().is_empty() {
            return Err(Error::EmptyDescription);
        }

        Ok(PointTransaction {
            id: Uuid::new_v4(),
            user_id,
            amount,
            kind,
            description,
            created_at: Utc::now(),
        })
    }

    /// Check that `transaction` is the credit matching `result`
    pub fn check_draw_credit(
        &self,
        result: &DrawResult,
        transaction: &PointTransaction,
    ) -> Result<(), Error> {
        if transaction.kind != TransactionKind::DrawCredit
            || transaction.user_id != result.user_id
            || transaction.amount != result.points_earned
        {
            return Err(Error::DrawCreditMismatch {
                draw_id: result.id,
                transaction_id: transaction.id,
            });
        }
        Ok(())
    }

    fn check_amount(&self, amount: i64) -> Result<(), Error> {
        if amount <= 0 || amount < self.limits.min_tx_amount || amount > self.limits.max_tx_amount
        {
            return Err(Error::AmountOutOfRange {
                amount,
                min: self.limits.min_tx_amount,
                max: self.limits.max_tx_amount,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::default_rewards;
    use rstest::*;
    use speculoos::prelude::*;

    #[fixture]
    fn ledger() -> Ledger {
        Ledger::new(LedgerLimits {
            min_tx_amount: 1,
            max_tx_amount: 5_000,
            max_balance: 10_000,
        })
    }

    fn account(balance: i64) -> UserPointAccount {
        UserPointAccount {
            balance,
            ..UserPointAccount::new(Uuid::new_v4())
        }
    }

    #[rstest]
    fn test_credit(ledger: Ledger) {
        let before = account(100);

        let res = ledger.credit(&before, 50);

        assert_that!(res).is_ok().matches(|after| {
            after.balance == 150
                && after.id == before.id
                && after.version == before.version
                && after.updated_at >= before.updated_at
        });
    }

    #[rstest]
    #[case(0)]
    #[case(-10)]
    #[case(5_001)]
    fn test_credit_invalid_amount(ledger: Ledger, #[case] amount: i64) {
        let res = ledger.credit(&account(100), amount);

        assert_that!(res)
            .is_err()
            .matches(|err| matches!(err, Error::AmountOutOfRange { .. }));
    }

    #[rstest]
    fn test_credit_over_max_balance(ledger: Ledger) {
        let before = account(9_000);

        let res = ledger.credit(&before, 1_001);

        assert_that!(res).is_err().is_equal_to(Error::BalanceLimitExceeded {
            balance: 9_000,
            amount: 1_001,
            max: 10_000,
        });
        assert_that!(before.balance).is_equal_to(9_000);
    }

    #[rstest]
    fn test_credit_up_to_max_balance(ledger: Ledger) {
        let res = ledger.credit(&account(9_000), 1_000);

        assert_that!(res).is_ok().matches(|after| after.balance == 10_000);
    }

    #[rstest]
    fn test_debit(ledger: Ledger) {
        let res = ledger.debit(&account(100), 100);

        assert_that!(res).is_ok().matches(|after| after.balance == 0);
    }

    #[rstest]
    fn test_debit_insufficient(ledger: Ledger) {
        let before = account(20);

        let res = ledger.debit(&before, 21);

        assert_that!(res).is_err().is_equal_to(Error::InsufficientBalance {
            balance: 20,
            amount: 21,
        });
        assert_that!(before.balance).is_equal_to(20);
    }

    #[rstest]
    #[case(0)]
    #[case(-1)]
    fn test_debit_invalid_amount(ledger: Ledger, #[case] amount: i64) {
        let res = ledger.debit(&account(100), amount);

        assert_that!(res)
            .is_err()
            .matches(|err| matches!(err, Error::AmountOutOfRange { .. }));
    }

    #[rstest]
    fn test_record_transaction(ledger: Ledger) {
        let user_id = Uuid::new_v4();

        let res = ledger.record_transaction(user_id, 50, TransactionKind::DrawCredit, "Reward");

        assert_that!(res).is_ok().matches(|tx| {
            tx.user_id == user_id
                && tx.amount == 50
                && tx.kind == TransactionKind::DrawCredit
                && tx.description == "Reward"
        });
    }

    #[rstest]
    #[case(0, "Reward")]
    #[case(5_001, "Reward")]
    fn test_record_transaction_invalid_amount(
        ledger: Ledger,
        #[case] amount: i64,
        #[case] description: &str,
    ) {
        let res = ledger.record_transaction(Uuid::new_v4(), amount, TransactionKind::Spend, description);

        assert_that!(res)
            .is_err()
            .matches(|err| matches!(err, Error::AmountOutOfRange { .. }));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn test_record_transaction_empty_description(ledger: Ledger, #[case] description: &str) {
        let res = ledger.record_transaction(Uuid::new_v4(), 10, TransactionKind::Spend, description);

        assert_that!(res).is_err().is_equal_to(Error::EmptyDescription);
    }

    #[rstest]
    #[case(TransactionKind::DrawCredit, 130)]
    #[case(TransactionKind::Spend, 70)]
    fn test_apply(ledger: Ledger, #[case] kind: TransactionKind, #[case] expected: i64) {
        let before = account(100);
        let tx = ledger
            .record_transaction(before.user_id, 30, kind, "Test")
            .unwrap();

        let res = ledger.apply(&before, &tx);

        assert_that!(res).is_ok().matches(|after| after.balance == expected);
        assert_that!(before.balance + tx.signed_amount()).is_equal_to(expected);
    }

    #[rstest]
    fn test_check_draw_credit(ledger: Ledger) {
        let result = DrawResult::new(Uuid::new_v4(), &default_rewards()[2]);
        let tx = ledger
            .record_transaction(result.user_id, 200, TransactionKind::DrawCredit, "Gold")
            .unwrap();

        assert_that!(ledger.check_draw_credit(&result, &tx)).is_ok();
    }

    #[rstest]
    #[case(Uuid::new_v4(), 200, TransactionKind::DrawCredit)]
    #[case(Uuid::nil(), 199, TransactionKind::DrawCredit)]
    #[case(Uuid::nil(), 200, TransactionKind::Spend)]
    fn test_check_draw_credit_mismatch(
        ledger: Ledger,
        #[case] user_id: Uuid,
        #[case] amount: i64,
        #[case] kind: TransactionKind,
    ) {
        let result = DrawResult::new(Uuid::nil(), &default_rewards()[2]);
        let tx = ledger
            .record_transaction(user_id, amount, kind, "Gold")
            .unwrap();

        let res = ledger.check_draw_credit(&result, &tx);

        assert_that!(res).is_err().is_equal_to(Error::DrawCreditMismatch {
            draw_id: result.id,
            transaction_id: tx.id,
        });
    }

    #[rstest]
    fn test_validate_limits() {
        let catalog = Catalog::load(default_rewards()).unwrap();

        assert_that!(LedgerLimits::default().validate(&catalog)).is_ok();
    }

    #[rstest]
    #[case(0, 10_000, 1_000_000)]
    #[case(500, 100, 1_000_000)]
    #[case(1, 10_000, 5_000)]
    // Diamond awards 1000 points
    #[case(1, 999, 1_000_000)]
    // Bronze Coin awards 10 points
    #[case(11, 10_000, 1_000_000)]
    fn test_validate_invalid_limits(
        #[case] min_tx_amount: i64,
        #[case] max_tx_amount: i64,
        #[case] max_balance: i64,
    ) {
        let catalog = Catalog::load(default_rewards()).unwrap();
        let limits = LedgerLimits {
            min_tx_amount,
            max_tx_amount,
            max_balance,
        };

        let res = limits.validate(&catalog);

        assert_that!(res)
            .is_err()
            .matches(|err| matches!(err, Error::InvalidLimits(_)));
    }
}
