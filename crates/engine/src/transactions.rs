//! Ledger entry primitives.
//!
//! A `Transaction` is one immutable signed entry in the append-only log.
//! Corrections are modeled as new offsetting entries, never as edits.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError, ResultEngine, util};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
    FundDeposit,
    FundWithdrawal,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::FundDeposit => "fund_deposit",
            Self::FundWithdrawal => "fund_withdrawal",
        }
    }

    /// Sign the stored amount carries for this kind: income and deposits are
    /// positive, expenses and withdrawals negative.
    #[must_use]
    pub const fn polarity(self) -> i64 {
        match self {
            Self::Income | Self::FundDeposit => 1,
            Self::Expense | Self::FundWithdrawal => -1,
        }
    }

    /// `true` for the two kinds that move a fund pool.
    #[must_use]
    pub const fn is_fund(self) -> bool {
        matches!(self, Self::FundDeposit | Self::FundWithdrawal)
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            "fund_deposit" => Ok(Self::FundDeposit),
            "fund_withdrawal" => Ok(Self::FundWithdrawal),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

/// Which fund pool (if any) an entry affects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundTag {
    None,
    Shared,
    Private,
}

impl FundTag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Shared => "shared",
            Self::Private => "private",
        }
    }
}

impl TryFrom<&str> for FundTag {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "none" => Ok(Self::None),
            "shared" => Ok(Self::Shared),
            "private" => Ok(Self::Private),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid fund tag: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub group_id: i64,
    pub user_id: i64,
    pub kind: TransactionKind,
    pub date: NaiveDate,
    /// Signed minor units; the sign always matches `kind.polarity()`.
    pub amount_minor: i64,
    pub currency: Currency,
    pub fund: FundTag,
    pub note: Option<String>,
    /// Operator who recorded the entry (entries can be recorded on someone's
    /// behalf); equals `user_id` for self-recorded entries.
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Builds a new entry, normalizing the amount sign from the kind.
    ///
    /// The caller-supplied delta may carry either sign; the store trusts the
    /// kind's polarity, not the caller. Zero is rejected, as is a fund tag
    /// inconsistent with the kind.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        group_id: i64,
        user_id: i64,
        kind: TransactionKind,
        date: NaiveDate,
        signed_minor: i64,
        currency: Currency,
        fund: FundTag,
        note: Option<String>,
        created_by: i64,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if signed_minor == 0 {
            return Err(EngineError::InvalidAmount(
                "amount must not be 0".to_string(),
            ));
        }
        let magnitude = signed_minor
            .checked_abs()
            .ok_or_else(|| EngineError::InvalidAmount("amount too large".to_string()))?;
        if kind.is_fund() && fund == FundTag::None {
            return Err(EngineError::InvalidAmount(
                "fund entries require a fund tag".to_string(),
            ));
        }
        if !kind.is_fund() && fund != FundTag::None {
            return Err(EngineError::InvalidAmount(
                "only fund entries may carry a fund tag".to_string(),
            ));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            group_id,
            user_id,
            kind,
            date,
            amount_minor: kind.polarity() * magnitude,
            currency,
            fund,
            note,
            created_by,
            created_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub group_id: i64,
    pub user_id: i64,
    pub kind: String,
    pub date: Date,
    pub amount_minor: i64,
    pub currency: String,
    pub fund: String,
    pub note: Option<String>,
    pub created_by: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            group_id: ActiveValue::Set(tx.group_id),
            user_id: ActiveValue::Set(tx.user_id),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            date: ActiveValue::Set(tx.date),
            amount_minor: ActiveValue::Set(tx.amount_minor),
            currency: ActiveValue::Set(tx.currency.code().to_string()),
            fund: ActiveValue::Set(tx.fund.as_str().to_string()),
            note: ActiveValue::Set(tx.note.clone()),
            created_by: ActiveValue::Set(tx.created_by),
            created_at: ActiveValue::Set(tx.created_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: util::parse_uuid(&model.id, "transaction")?,
            group_id: model.group_id,
            user_id: model.user_id,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            date: model.date,
            amount_minor: model.amount_minor,
            currency: util::model_currency(&model.currency)?,
            fund: FundTag::try_from(model.fund.as_str())?,
            note: model.note,
            created_by: model.created_by,
            created_at: model.created_at,
        })
    }
}
