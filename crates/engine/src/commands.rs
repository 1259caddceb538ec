//! Command structs for engine write operations.
//!
//! These types group parameters for the write paths (record entry, fund
//! deposit/withdraw), keeping call sites readable and avoiding long argument
//! lists.

use chrono::NaiveDate;

use crate::{Currency, FundTag, TransactionKind};

/// Record one signed ledger entry.
///
/// `amount_minor` may carry either sign; the store normalizes it from the
/// kind's polarity. `date` defaults to `today`, which the caller resolves in
/// the operator timezone.
#[derive(Clone, Debug)]
pub struct RecordEntryCmd {
    pub group_id: i64,
    pub user_id: i64,
    pub currency: Currency,
    pub amount_minor: i64,
    pub kind: TransactionKind,
    pub fund: FundTag,
    pub date: Option<NaiveDate>,
    pub today: NaiveDate,
    pub note: Option<String>,
    pub created_by: Option<i64>,
}

impl RecordEntryCmd {
    #[must_use]
    pub fn new(
        group_id: i64,
        user_id: i64,
        currency: Currency,
        amount_minor: i64,
        kind: TransactionKind,
        today: NaiveDate,
    ) -> Self {
        Self {
            group_id,
            user_id,
            currency,
            amount_minor,
            kind,
            fund: FundTag::None,
            date: None,
            today,
            note: None,
            created_by: None,
        }
    }

    #[must_use]
    pub fn fund(mut self, fund: FundTag) -> Self {
        self.fund = fund;
        self
    }

    #[must_use]
    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Operator recording the entry on the user's behalf.
    #[must_use]
    pub fn created_by(mut self, operator_id: i64) -> Self {
        self.created_by = Some(operator_id);
        self
    }
}

/// Deposit into a fund pool. `amount_minor` must be > 0.
#[derive(Clone, Debug)]
pub struct FundDepositCmd {
    pub group_id: i64,
    pub user_id: i64,
    pub currency: Currency,
    pub amount_minor: i64,
    pub fund: FundTag,
    pub date: Option<NaiveDate>,
    pub today: NaiveDate,
    pub note: Option<String>,
}

impl FundDepositCmd {
    #[must_use]
    pub fn new(
        group_id: i64,
        user_id: i64,
        currency: Currency,
        amount_minor: i64,
        fund: FundTag,
        today: NaiveDate,
    ) -> Self {
        Self {
            group_id,
            user_id,
            currency,
            amount_minor,
            fund,
            date: None,
            today,
            note: None,
        }
    }

    #[must_use]
    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Withdraw from a fund pool. `amount_minor` must be > 0; the pool is
/// allowed to go negative.
#[derive(Clone, Debug)]
pub struct FundWithdrawCmd {
    pub group_id: i64,
    pub user_id: i64,
    pub currency: Currency,
    pub amount_minor: i64,
    pub fund: FundTag,
    pub date: Option<NaiveDate>,
    pub today: NaiveDate,
    pub note: Option<String>,
}

impl FundWithdrawCmd {
    #[must_use]
    pub fn new(
        group_id: i64,
        user_id: i64,
        currency: Currency,
        amount_minor: i64,
        fund: FundTag,
        today: NaiveDate,
    ) -> Self {
        Self {
            group_id,
            user_id,
            currency,
            amount_minor,
            fund,
            date: None,
            today,
            note: None,
        }
    }

    #[must_use]
    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}
