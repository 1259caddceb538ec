use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use sea_orm::{
    ConnectionTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
};

use crate::{Currency, EngineError, ExchangeRate, ResultEngine, exchange_rates};

use super::{Engine, with_tx};

impl Engine {
    /// Upserts the rate for (currency, date); a later write for the same
    /// pair replaces the earlier one (last write wins, no edit history).
    ///
    /// Fails with `InvalidRate` when `rate <= 0`.
    pub async fn set_rate(
        &self,
        currency: Currency,
        date: NaiveDate,
        rate: Decimal,
        set_by: i64,
    ) -> ResultEngine<()> {
        let entry = ExchangeRate::new(currency, date, rate)?;

        with_tx!(self, |db_tx| {
            let existing = exchange_rates::Entity::find_by_id((currency.code().to_string(), date))
                .one(&db_tx)
                .await?;

            let model = exchange_rates::active_model(&entry, set_by, Utc::now());
            if existing.is_some() {
                model.update(&db_tx).await?;
            } else {
                model.insert(&db_tx).await?;
            }
            Ok(())
        })
    }

    /// Returns the rate in effect on `date`: the exact row if present,
    /// otherwise the most recent rate with an earlier effective date (rates
    /// hold until superseded).
    ///
    /// Resolution is per-currency; TWD and CNY succeed or fail
    /// independently. Fails with `NoRateAvailable` when nothing exists on or
    /// before `date`.
    pub async fn resolve_rate(&self, currency: Currency, date: NaiveDate) -> ResultEngine<Decimal> {
        self.resolve_rate_on(&self.database, currency, date)
            .await?
            .ok_or_else(|| {
                EngineError::NoRateAvailable(format!(
                    "no {} rate on or before {date}",
                    currency.code()
                ))
            })
    }

    pub(super) async fn resolve_rate_on<C: ConnectionTrait>(
        &self,
        db: &C,
        currency: Currency,
        date: NaiveDate,
    ) -> ResultEngine<Option<Decimal>> {
        let model = exchange_rates::Entity::find()
            .filter(exchange_rates::Column::Currency.eq(currency.code()))
            .filter(exchange_rates::Column::EffectiveDate.lte(date))
            .order_by_desc(exchange_rates::Column::EffectiveDate)
            .one(db)
            .await?;

        model
            .map(|m| ExchangeRate::try_from(m).map(|r| r.rate))
            .transpose()
    }

    /// Lists the most recently effective rates, newest first (operator
    /// display).
    pub async fn list_rates(&self, limit: u64) -> ResultEngine<Vec<ExchangeRate>> {
        let rows = exchange_rates::Entity::find()
            .order_by_desc(exchange_rates::Column::EffectiveDate)
            .order_by_asc(exchange_rates::Column::Currency)
            .limit(limit)
            .all(&self.database)
            .await?;

        rows.into_iter().map(ExchangeRate::try_from).collect()
    }
}
