//! Operator-entered exchange rates.
//!
//! A rate is the number of currency units per 1 USDT, effective from its date
//! until superseded by a later one. At most one row exists per
//! (currency, date); re-setting the same pair replaces the earlier value.
//! Rates are global, not keyed per group.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{Currency, EngineError, ResultEngine, util};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub currency: Currency,
    pub effective_date: NaiveDate,
    pub rate: Decimal,
}

impl ExchangeRate {
    pub fn new(currency: Currency, effective_date: NaiveDate, rate: Decimal) -> ResultEngine<Self> {
        if rate <= Decimal::ZERO {
            return Err(EngineError::InvalidRate(format!(
                "rate must be > 0, got {rate}"
            )));
        }
        Ok(Self {
            currency,
            effective_date,
            rate,
        })
    }
}

// Rates are persisted as text and re-parsed on load; REAL columns would
// reintroduce the float drift the engine avoids everywhere else.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "exchange_rates")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub currency: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub effective_date: Date,
    pub rate: String,
    pub set_by: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for ExchangeRate {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let rate = Decimal::from_str(&model.rate)
            .map_err(|_| EngineError::InvalidRate(format!("invalid stored rate: {}", model.rate)))?;
        ExchangeRate::new(util::model_currency(&model.currency)?, model.effective_date, rate)
    }
}

pub(crate) fn active_model(
    rate: &ExchangeRate,
    set_by: i64,
    created_at: chrono::DateTime<chrono::Utc>,
) -> ActiveModel {
    ActiveModel {
        currency: ActiveValue::Set(rate.currency.code().to_string()),
        effective_date: ActiveValue::Set(rate.effective_date),
        rate: ActiveValue::Set(rate.rate.to_string()),
        set_by: ActiveValue::Set(set_by),
        created_at: ActiveValue::Set(created_at),
    }
}
