use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    Currency, EngineError, FundTag, Period, RecordEntryCmd, ResultEngine, Transaction,
    TransactionKind, transactions,
};

use super::{Engine, normalize_optional_text, with_tx};

/// Filters for listing ledger entries.
///
/// `from` is inclusive and `to` is exclusive (`[from, to)`), both calendar
/// days.
#[derive(Clone, Debug, Default)]
pub struct TransactionListFilter {
    pub user_id: Option<i64>,
    pub currency: Option<Currency>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub fund: Option<FundTag>,
    /// If present, acts as an allow-list of kinds to return.
    pub kinds: Option<Vec<TransactionKind>>,
}

impl TransactionListFilter {
    /// Restrict the filter to one reporting period.
    #[must_use]
    pub fn period(mut self, period: Period) -> Self {
        self.from = Some(period.first_day());
        self.to = Some(period.end_exclusive());
        self
    }
}

fn validate_list_filter(filter: &TransactionListFilter) -> ResultEngine<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from >= to
    {
        return Err(EngineError::InvalidPeriod(
            "invalid range: from must be < to".to_string(),
        ));
    }
    if filter.kinds.as_ref().is_some_and(|k| k.is_empty()) {
        return Err(EngineError::InvalidAmount(
            "kinds must not be empty".to_string(),
        ));
    }
    Ok(())
}

trait ApplyTxFilters: QueryFilter + Sized {
    fn apply_tx_filters(self, filter: &TransactionListFilter) -> Self;
}

impl<T> ApplyTxFilters for T
where
    T: QueryFilter + Sized,
{
    fn apply_tx_filters(mut self, filter: &TransactionListFilter) -> Self {
        if let Some(user_id) = filter.user_id {
            self = self.filter(transactions::Column::UserId.eq(user_id));
        }
        if let Some(currency) = filter.currency {
            self = self.filter(transactions::Column::Currency.eq(currency.code()));
        }
        if let Some(from) = filter.from {
            self = self.filter(transactions::Column::Date.gte(from));
        }
        if let Some(to) = filter.to {
            self = self.filter(transactions::Column::Date.lt(to));
        }
        if let Some(fund) = filter.fund {
            self = self.filter(transactions::Column::Fund.eq(fund.as_str()));
        }
        if let Some(kinds) = &filter.kinds {
            let kinds: Vec<String> = kinds.iter().map(|k| k.as_str().to_string()).collect();
            self = self.filter(transactions::Column::Kind.is_in(kinds));
        }
        self
    }
}

impl Engine {
    /// Appends one signed entry to the ledger and returns its id.
    ///
    /// The amount sign is normalized from the kind's polarity; a zero delta
    /// is rejected with `InvalidAmount`. The entry date defaults to the
    /// caller-resolved `today`.
    pub async fn record(&self, cmd: RecordEntryCmd) -> ResultEngine<Uuid> {
        let RecordEntryCmd {
            group_id,
            user_id,
            currency,
            amount_minor,
            kind,
            fund,
            date,
            today,
            note,
            created_by,
        } = cmd;
        let note = normalize_optional_text(note.as_deref());

        let tx = Transaction::new(
            group_id,
            user_id,
            kind,
            date.unwrap_or(today),
            amount_minor,
            currency,
            fund,
            note,
            created_by.unwrap_or(user_id),
            Utc::now(),
        )?;

        with_tx!(self, |db_tx| {
            transactions::ActiveModel::from(&tx).insert(&db_tx).await?;
            Ok(tx.id)
        })
    }

    /// Lists one group's entries, oldest first (`created_at`, then id).
    ///
    /// The result is a plain materialized `Vec`; callers re-run the query to
    /// restart the sequence.
    pub async fn list_transactions(
        &self,
        group_id: i64,
        filter: &TransactionListFilter,
    ) -> ResultEngine<Vec<Transaction>> {
        validate_list_filter(filter)?;

        let rows = transactions::Entity::find()
            .filter(transactions::Column::GroupId.eq(group_id))
            .apply_tx_filters(filter)
            .order_by_asc(transactions::Column::CreatedAt)
            .order_by_asc(transactions::Column::Id)
            .all(&self.database)
            .await?;

        rows.into_iter().map(Transaction::try_from).collect()
    }

    /// Administrative reset: deletes one group's entries inside one period.
    ///
    /// Never touches other groups or other periods. Requires the caller to
    /// be a group admin or global admin; returns the number of removed
    /// entries (0 on repeat calls).
    pub async fn clear_group_period(
        &self,
        group_id: i64,
        period: Period,
        caller_user_id: i64,
    ) -> ResultEngine<u64> {
        with_tx!(self, |db_tx| {
            if !self.is_admin_on(&db_tx, caller_user_id, group_id).await? {
                return Err(EngineError::PermissionDenied(format!(
                    "user {caller_user_id} is not an admin of group {group_id}"
                )));
            }

            let result = transactions::Entity::delete_many()
                .filter(transactions::Column::GroupId.eq(group_id))
                .filter(transactions::Column::Date.gte(period.first_day()))
                .filter(transactions::Column::Date.lt(period.end_exclusive()))
                .exec(&db_tx)
                .await?;

            Ok(result.rows_affected)
        })
    }
}
