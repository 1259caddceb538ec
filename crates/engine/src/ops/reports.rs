use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;

use sea_orm::{ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    ContributorLine, Currency, CurrencySummary, DayCurrency, DayLine, EngineError, ExchangeRate,
    Period, Report, ReportScope, ResultEngine, Transaction, TransactionKind, exchange_rates,
    groups, transactions, users,
};

use super::{Engine, with_tx};

/// All rates relevant to one report, loaded once. Resolution walks the
/// per-currency `(date, rate)` list, sorted ascending by effective date.
struct RateTable {
    rates: HashMap<Currency, Vec<(NaiveDate, Decimal)>>,
}

impl RateTable {
    async fn load<C: ConnectionTrait>(db: &C, up_to: NaiveDate) -> ResultEngine<Self> {
        let rows = exchange_rates::Entity::find()
            .filter(exchange_rates::Column::EffectiveDate.lte(up_to))
            .order_by_asc(exchange_rates::Column::EffectiveDate)
            .all(db)
            .await?;

        let mut rates: HashMap<Currency, Vec<(NaiveDate, Decimal)>> = HashMap::new();
        for model in rows {
            let rate = ExchangeRate::try_from(model)?;
            rates
                .entry(rate.currency)
                .or_default()
                .push((rate.effective_date, rate.rate));
        }
        Ok(Self { rates })
    }

    /// Most recent rate with `effective_date <= date`, per currency.
    fn resolve(&self, currency: Currency, date: NaiveDate) -> Option<Decimal> {
        let list = self.rates.get(&currency)?;
        let idx = list.partition_point(|(d, _)| *d <= date);
        idx.checked_sub(1).map(|i| list[i].1)
    }
}

/// `amount / rate`, in major units, rounded to 2 decimals. `None` rate means
/// the figure is unavailable, never an error.
fn usdt_equivalent(amount_minor: i64, rate: Option<Decimal>) -> Option<Decimal> {
    rate.map(|rate| (Decimal::new(amount_minor, 2) / rate).round_dp(2))
}

#[derive(Default)]
struct DayBucket {
    amounts: HashMap<Currency, i64>,
    /// Contributor key (user id, or group id for fleet scope) in first-seen
    /// order, with per-currency sums.
    contributors: Vec<(i64, HashMap<Currency, i64>)>,
}

impl DayBucket {
    fn add(&mut self, key: i64, currency: Currency, amount_minor: i64) {
        *self.amounts.entry(currency).or_insert(0) += amount_minor;
        let idx = self
            .contributors
            .iter()
            .position(|(k, _)| *k == key)
            .unwrap_or_else(|| {
                self.contributors.push((key, HashMap::new()));
                self.contributors.len() - 1
            });
        *self.contributors[idx].1.entry(currency).or_insert(0) += amount_minor;
    }
}

impl Engine {
    /// Report over one user's entries in one group for the period.
    pub async fn personal_report(
        &self,
        user_id: i64,
        group_id: i64,
        period: Period,
        today: NaiveDate,
    ) -> ResultEngine<Report> {
        let (report, _) = self
            .build_report(ReportScope::Personal { user_id, group_id }, period, today)
            .await?;
        Ok(report)
    }

    /// Report over one group's entries (all users) for the period.
    pub async fn group_report(
        &self,
        group_id: i64,
        period: Period,
        today: NaiveDate,
    ) -> ResultEngine<Report> {
        let (report, _) = self
            .build_report(ReportScope::Group { group_id }, period, today)
            .await?;
        Ok(report)
    }

    /// Report summed across every group in the requesting group's fleet.
    ///
    /// Totals and fund balances fold over all member groups; rate
    /// resolution is unchanged because rates are global, not group-scoped.
    pub async fn fleet_report(
        &self,
        group_id: i64,
        period: Period,
        today: NaiveDate,
    ) -> ResultEngine<Report> {
        let (report, _) = self
            .build_report(ReportScope::Fleet { group_id }, period, today)
            .await?;
        Ok(report)
    }

    /// Same aggregation as the live reports, over a named past month.
    ///
    /// Fails with `NoDataForPeriod` only when the entry query comes back
    /// empty *and* no rate resolves for any currency in that period;
    /// distinguishing "nothing happened" from "nothing to report" stays a
    /// caller-level decision.
    pub async fn historical_report(
        &self,
        scope: ReportScope,
        period: Period,
        today: NaiveDate,
    ) -> ResultEngine<Report> {
        let (report, entry_count) = self.build_report(scope, period, today).await?;
        if entry_count == 0 && report.currencies.iter().all(|c| c.rate.is_none()) {
            return Err(EngineError::NoDataForPeriod(period.to_string()));
        }
        Ok(report)
    }

    async fn build_report(
        &self,
        scope: ReportScope,
        period: Period,
        today: NaiveDate,
    ) -> ResultEngine<(Report, usize)> {
        with_tx!(self, |db_tx| {
            let group_ids = match scope {
                ReportScope::Personal { group_id, .. } | ReportScope::Group { group_id } => {
                    vec![group_id]
                }
                ReportScope::Fleet { group_id } => {
                    self.groups_in_fleet_on(&db_tx, group_id).await?
                }
            };

            let mut query = transactions::Entity::find()
                .filter(transactions::Column::GroupId.is_in(group_ids.iter().copied()))
                .filter(transactions::Column::Date.gte(period.first_day()))
                .filter(transactions::Column::Date.lt(period.end_exclusive()))
                .order_by_asc(transactions::Column::CreatedAt)
                .order_by_asc(transactions::Column::Id);
            if let ReportScope::Personal { user_id, .. } = scope {
                query = query.filter(transactions::Column::UserId.eq(user_id));
            }

            let entries: Vec<Transaction> = query
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Transaction::try_from)
                .collect::<ResultEngine<_>>()?;
            let entry_count = entries.len();

            let labels = self
                .contributor_labels(&db_tx, scope, &group_ids, &entries)
                .await?;
            let rate_table = RateTable::load(&db_tx, period.last_day()).await?;

            // Fold income/expense entries into per-currency totals and day
            // buckets; fund movements feed fund balances only.
            let mut totals: HashMap<Currency, (i64, i64)> = HashMap::new();
            let mut days: BTreeMap<NaiveDate, DayBucket> = BTreeMap::new();
            for entry in &entries {
                if entry.kind.is_fund() {
                    continue;
                }
                let slot = totals.entry(entry.currency).or_default();
                match entry.kind {
                    TransactionKind::Income => slot.0 += entry.amount_minor,
                    _ => slot.1 += entry.amount_minor,
                }

                let key = match scope {
                    ReportScope::Fleet { .. } => entry.group_id,
                    _ => entry.user_id,
                };
                days.entry(entry.date)
                    .or_default()
                    .add(key, entry.currency, entry.amount_minor);
            }

            let anchor = period.rate_anchor(today);
            let currencies = Currency::ALL
                .into_iter()
                .map(|currency| {
                    let (income_minor, expense_minor) =
                        totals.get(&currency).copied().unwrap_or((0, 0));
                    let net_minor = income_minor + expense_minor;
                    let rate = rate_table.resolve(currency, anchor);
                    CurrencySummary {
                        currency,
                        income_minor,
                        expense_minor,
                        net_minor,
                        rate,
                        usdt: usdt_equivalent(net_minor, rate),
                    }
                })
                .collect();

            let day_lines = days
                .into_iter()
                .map(|(date, bucket)| {
                    let day_currencies = Currency::ALL
                        .into_iter()
                        .filter_map(|currency| {
                            bucket.amounts.get(&currency).map(|&amount_minor| {
                                let rate = rate_table.resolve(currency, date);
                                DayCurrency {
                                    currency,
                                    amount_minor,
                                    rate,
                                    usdt: usdt_equivalent(amount_minor, rate),
                                }
                            })
                        })
                        .collect();
                    let contributors = bucket
                        .contributors
                        .into_iter()
                        .map(|(key, sums)| ContributorLine {
                            label: labels
                                .get(&key)
                                .cloned()
                                .unwrap_or_else(|| fallback_label(scope, key)),
                            amounts: Currency::ALL
                                .into_iter()
                                .filter_map(|c| sums.get(&c).map(|&a| (c, a)))
                                .collect(),
                        })
                        .collect();
                    DayLine {
                        date,
                        currencies: day_currencies,
                        contributors,
                    }
                })
                .collect();

            let funds = self.fund_balances_on(&db_tx, &group_ids).await?;

            let report = Report {
                scope,
                period,
                currencies,
                funds,
                days: day_lines,
            };
            Ok((report, entry_count))
        })
    }

    /// Display labels for contributor lines: user display names, or group
    /// names for fleet scope.
    async fn contributor_labels<C: ConnectionTrait>(
        &self,
        db: &C,
        scope: ReportScope,
        group_ids: &[i64],
        entries: &[Transaction],
    ) -> ResultEngine<HashMap<i64, String>> {
        let mut labels = HashMap::new();
        match scope {
            ReportScope::Fleet { .. } => {
                let rows = groups::Entity::find()
                    .filter(groups::Column::GroupId.is_in(group_ids.iter().copied()))
                    .all(db)
                    .await?;
                for row in rows {
                    labels.insert(row.group_id, row.name);
                }
            }
            _ => {
                let mut user_ids: Vec<i64> = entries.iter().map(|e| e.user_id).collect();
                user_ids.sort_unstable();
                user_ids.dedup();
                if !user_ids.is_empty() {
                    let rows = users::Entity::find()
                        .filter(users::Column::UserId.is_in(user_ids))
                        .all(db)
                        .await?;
                    for row in rows {
                        if let Some(name) = row.display_name.or(row.username) {
                            labels.insert(row.user_id, name);
                        }
                    }
                }
            }
        }
        Ok(labels)
    }
}

fn fallback_label(scope: ReportScope, key: i64) -> String {
    match scope {
        ReportScope::Fleet { .. } => format!("Group {key}"),
        _ => format!("User {key}"),
    }
}
