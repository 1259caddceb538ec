//! Read-only report aggregates.
//!
//! A `Report` is request-scoped: computed fresh on every call, owned by the
//! caller, never persisted. Both currencies always appear side by side; a
//! missing rate leaves the raw totals intact and only the USDT figure
//! unavailable.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Currency, FundTag, Period};

/// Breadth of a report: one user, one group, or a whole fleet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "scope")]
pub enum ReportScope {
    Personal { user_id: i64, group_id: i64 },
    Group { group_id: i64 },
    Fleet { group_id: i64 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub scope: ReportScope,
    pub period: Period,
    /// One entry per supported currency, in display order, always both.
    pub currencies: Vec<CurrencySummary>,
    /// Lifetime fund balances for the scope's group(s); negative balances
    /// are surfaced as-is (overdraft is a reported state, not an error).
    pub funds: Vec<FundBalance>,
    /// Per-day breakdown of the period, ascending by date.
    pub days: Vec<DayLine>,
}

impl Report {
    /// Convenience lookup of one currency's summary.
    #[must_use]
    pub fn currency(&self, currency: Currency) -> Option<&CurrencySummary> {
        self.currencies.iter().find(|c| c.currency == currency)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurrencySummary {
    pub currency: Currency,
    /// Sum of income entries (>= 0), minor units.
    pub income_minor: i64,
    /// Sum of expense entries (<= 0), minor units.
    pub expense_minor: i64,
    /// `income_minor + expense_minor`.
    pub net_minor: i64,
    /// Rate resolved at the period's rate anchor; `None` when no rate exists
    /// on or before that date.
    pub rate: Option<Decimal>,
    /// `net / rate`, rounded to 2 decimals; `None` when the rate is
    /// unavailable.
    pub usdt: Option<Decimal>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundBalance {
    pub fund: FundTag,
    pub currency: Currency,
    pub balance_minor: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DayLine {
    pub date: NaiveDate,
    /// Per-currency net for the day, with the rate in effect on that day.
    pub currencies: Vec<DayCurrency>,
    /// Per-user lines (per-group for fleet scope), in first-seen order.
    pub contributors: Vec<ContributorLine>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DayCurrency {
    pub currency: Currency,
    pub amount_minor: i64,
    pub rate: Option<Decimal>,
    pub usdt: Option<Decimal>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorLine {
    /// Display name of the user, or the group name for fleet scope.
    pub label: String,
    pub amounts: Vec<(Currency, i64)>,
}
