use rust_decimal::Decimal;

use engine::{
    Currency, EngineError, FundTag, FundWithdrawCmd, Period, RecordEntryCmd, ReportScope,
    TransactionKind,
};

mod common;
use common::{day, ledger};

fn dec(raw: &str) -> Decimal {
    raw.parse().unwrap()
}

fn period(raw: &str) -> Period {
    raw.parse().unwrap()
}

#[tokio::test]
async fn personal_report_matches_manual_conversion() {
    let ledger = ledger().await;
    let today = day(2025, 6, 15);

    ledger
        .record(
            RecordEntryCmd::new(
                1,
                10,
                Currency::Twd,
                100_000,
                TransactionKind::Income,
                today,
            )
            .date(day(2025, 6, 1)),
        )
        .await
        .unwrap();
    ledger
        .set_rate(Currency::Twd, day(2025, 6, 1), dec("33.33"), 7)
        .await
        .unwrap();

    let report = ledger
        .personal_report(10, 1, period("2025-06"), today)
        .await
        .unwrap();

    let twd = report.currency(Currency::Twd).unwrap();
    assert_eq!(twd.net_minor, 100_000);
    assert_eq!(twd.rate, Some(dec("33.33")));
    assert_eq!(twd.usdt, Some(dec("30.00")));
}

#[tokio::test]
async fn personal_report_excludes_other_users() {
    let ledger = ledger().await;
    let today = day(2025, 6, 15);

    for user in [10, 11] {
        ledger
            .record(RecordEntryCmd::new(
                1,
                user,
                Currency::Twd,
                100_000,
                TransactionKind::Income,
                today,
            ))
            .await
            .unwrap();
    }

    let report = ledger
        .personal_report(10, 1, period("2025-06"), today)
        .await
        .unwrap();
    assert_eq!(report.currency(Currency::Twd).unwrap().net_minor, 100_000);
}

#[tokio::test]
async fn group_report_surfaces_overdraft_without_rate() {
    let ledger = ledger().await;
    let today = day(2025, 6, 15);

    // CNY withdrawal from the shared fund with no CNY rate set: the report
    // must render the raw figures, not fail.
    ledger
        .fund_withdraw(FundWithdrawCmd::new(
            1,
            10,
            Currency::Cny,
            690,
            FundTag::Shared,
            today,
        ))
        .await
        .unwrap();

    let report = ledger
        .group_report(1, period("2025-06"), today)
        .await
        .unwrap();

    assert_eq!(report.funds.len(), 1);
    assert_eq!(report.funds[0].fund, FundTag::Shared);
    assert_eq!(report.funds[0].currency, Currency::Cny);
    assert_eq!(report.funds[0].balance_minor, -690);

    // Both currencies always render side by side.
    assert_eq!(report.currencies.len(), 2);
    let cny = report.currency(Currency::Cny).unwrap();
    assert_eq!(cny.rate, None);
    assert_eq!(cny.usdt, None);
}

#[tokio::test]
async fn fund_entries_do_not_affect_net_totals() {
    let ledger = ledger().await;
    let today = day(2025, 6, 15);

    ledger
        .record(RecordEntryCmd::new(
            1,
            10,
            Currency::Twd,
            100_000,
            TransactionKind::Income,
            today,
        ))
        .await
        .unwrap();
    ledger
        .record(
            RecordEntryCmd::new(
                1,
                10,
                Currency::Twd,
                40_000,
                TransactionKind::FundDeposit,
                today,
            )
            .fund(FundTag::Private),
        )
        .await
        .unwrap();

    let report = ledger
        .group_report(1, period("2025-06"), today)
        .await
        .unwrap();
    let twd = report.currency(Currency::Twd).unwrap();
    assert_eq!(twd.net_minor, 100_000);
    assert_eq!(report.funds[0].balance_minor, 40_000);
}

#[tokio::test]
async fn fleet_report_sums_member_groups_from_either_side() {
    let ledger = ledger().await;
    let today = day(2025, 6, 15);

    ledger.upsert_group(1, "Alpha").await.unwrap();
    ledger.upsert_group(2, "Beta").await.unwrap();
    ledger.add_group_to_fleet("North", 1).await.unwrap();
    ledger.add_group_to_fleet("North", 2).await.unwrap();

    ledger
        .record(RecordEntryCmd::new(
            1,
            10,
            Currency::Twd,
            100_000,
            TransactionKind::Income,
            today,
        ))
        .await
        .unwrap();
    ledger
        .record(RecordEntryCmd::new(
            2,
            11,
            Currency::Twd,
            50_000,
            TransactionKind::Income,
            today,
        ))
        .await
        .unwrap();

    for requesting_group in [1, 2] {
        let report = ledger
            .fleet_report(requesting_group, period("2025-06"), today)
            .await
            .unwrap();
        assert_eq!(
            report.currency(Currency::Twd).unwrap().net_minor,
            150_000,
            "fleet total must not depend on the requesting group"
        );
    }
}

#[tokio::test]
async fn fleet_totals_equal_sum_of_member_group_totals() {
    let ledger = ledger().await;
    let today = day(2025, 6, 15);

    for group in [1, 2, 3] {
        ledger.upsert_group(group, &format!("G{group}")).await.unwrap();
        ledger.add_group_to_fleet("North", group).await.unwrap();
    }

    let entries = [
        (1, 100_000, TransactionKind::Income),
        (1, 20_000, TransactionKind::Expense),
        (2, 50_000, TransactionKind::Income),
        (3, 70_000, TransactionKind::Income),
        (3, 70_000, TransactionKind::Expense),
    ];
    for (group, amount, kind) in entries {
        ledger
            .record(RecordEntryCmd::new(
                group,
                10,
                Currency::Twd,
                amount,
                kind,
                today,
            ))
            .await
            .unwrap();
    }

    let member_groups = ledger.groups_in_fleet(1).await.unwrap();
    assert_eq!(member_groups, vec![1, 2, 3]);

    let mut summed = 0;
    for group in member_groups {
        let report = ledger.group_report(group, period("2025-06"), today).await.unwrap();
        summed += report.currency(Currency::Twd).unwrap().net_minor;
    }

    let fleet = ledger.fleet_report(1, period("2025-06"), today).await.unwrap();
    assert_eq!(fleet.currency(Currency::Twd).unwrap().net_minor, summed);
}

#[tokio::test]
async fn fleet_of_one_is_just_the_group() {
    let ledger = ledger().await;
    let today = day(2025, 6, 15);

    // Group 9 belongs to no fleet.
    ledger
        .record(RecordEntryCmd::new(
            9,
            10,
            Currency::Cny,
            70_000,
            TransactionKind::Income,
            today,
        ))
        .await
        .unwrap();

    assert_eq!(ledger.groups_in_fleet(9).await.unwrap(), vec![9]);

    let fleet = ledger.fleet_report(9, period("2025-06"), today).await.unwrap();
    let group = ledger.group_report(9, period("2025-06"), today).await.unwrap();
    assert_eq!(
        fleet.currency(Currency::Cny).unwrap().net_minor,
        group.currency(Currency::Cny).unwrap().net_minor
    );
}

#[tokio::test]
async fn partial_rate_degradation_keeps_raw_totals() {
    let ledger = ledger().await;
    let today = day(2025, 6, 15);

    ledger
        .record(RecordEntryCmd::new(
            1,
            10,
            Currency::Twd,
            100_000,
            TransactionKind::Income,
            today,
        ))
        .await
        .unwrap();
    ledger
        .record(RecordEntryCmd::new(
            1,
            10,
            Currency::Cny,
            70_000,
            TransactionKind::Income,
            today,
        ))
        .await
        .unwrap();
    ledger
        .set_rate(Currency::Twd, day(2025, 6, 1), dec("33.33"), 7)
        .await
        .unwrap();

    let report = ledger
        .group_report(1, period("2025-06"), today)
        .await
        .unwrap();

    let twd = report.currency(Currency::Twd).unwrap();
    assert!(twd.usdt.is_some());
    let cny = report.currency(Currency::Cny).unwrap();
    assert_eq!(cny.net_minor, 70_000);
    assert_eq!(cny.usdt, None);
}

#[tokio::test]
async fn day_breakdown_resolves_rates_per_day() {
    let ledger = ledger().await;
    let today = day(2025, 6, 15);

    ledger
        .set_rate(Currency::Twd, day(2025, 6, 1), dec("30"), 7)
        .await
        .unwrap();
    ledger
        .set_rate(Currency::Twd, day(2025, 6, 2), dec("33.33"), 7)
        .await
        .unwrap();
    for date in [day(2025, 6, 1), day(2025, 6, 2)] {
        ledger
            .record(
                RecordEntryCmd::new(
                    1,
                    10,
                    Currency::Twd,
                    100_000,
                    TransactionKind::Income,
                    today,
                )
                .date(date),
            )
            .await
            .unwrap();
    }

    let report = ledger
        .group_report(1, period("2025-06"), today)
        .await
        .unwrap();

    assert_eq!(report.days.len(), 2);
    assert_eq!(report.days[0].date, day(2025, 6, 1));
    assert_eq!(report.days[0].currencies[0].rate, Some(dec("30")));
    assert_eq!(report.days[0].currencies[0].usdt, Some(dec("33.33")));
    assert_eq!(report.days[1].currencies[0].rate, Some(dec("33.33")));

    // The headline figure uses the rate at the period's anchor date.
    let twd = report.currency(Currency::Twd).unwrap();
    assert_eq!(twd.rate, Some(dec("33.33")));
    assert_eq!(twd.usdt, Some(dec("60.01")));
}

#[tokio::test]
async fn contributor_labels_prefer_display_names() {
    let ledger = ledger().await;
    let today = day(2025, 6, 15);

    ledger.upsert_user(10, Some("alice"), Some("Alice")).await.unwrap();

    for user in [10, 11] {
        ledger
            .record(RecordEntryCmd::new(
                1,
                user,
                Currency::Twd,
                50_000,
                TransactionKind::Income,
                today,
            ))
            .await
            .unwrap();
    }

    let report = ledger
        .group_report(1, period("2025-06"), today)
        .await
        .unwrap();
    let labels: Vec<&str> = report.days[0]
        .contributors
        .iter()
        .map(|c| c.label.as_str())
        .collect();
    assert!(labels.contains(&"Alice"));
    assert!(labels.contains(&"User 11"));
}

#[tokio::test]
async fn fleet_day_breakdown_labels_groups() {
    let ledger = ledger().await;
    let today = day(2025, 6, 15);

    ledger.upsert_group(1, "Alpha").await.unwrap();
    ledger.upsert_group(2, "Beta").await.unwrap();
    ledger.add_group_to_fleet("North", 1).await.unwrap();
    ledger.add_group_to_fleet("North", 2).await.unwrap();

    for (group, amount) in [(1, 100_000), (2, 50_000)] {
        ledger
            .record(RecordEntryCmd::new(
                group,
                10,
                Currency::Twd,
                amount,
                TransactionKind::Income,
                today,
            ))
            .await
            .unwrap();
    }

    let report = ledger
        .fleet_report(1, period("2025-06"), today)
        .await
        .unwrap();
    let labels: Vec<&str> = report.days[0]
        .contributors
        .iter()
        .map(|c| c.label.as_str())
        .collect();
    assert_eq!(labels, vec!["Alpha", "Beta"]);
}

#[tokio::test]
async fn historical_report_distinguishes_no_data() {
    let ledger = ledger().await;
    let today = day(2025, 8, 7);
    let scope = ReportScope::Group { group_id: 1 };

    // Nothing recorded, nothing resolvable: the period has no data at all.
    let err = ledger
        .historical_report(scope, period("2024-01"), today)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NoDataForPeriod(_)));

    // With a rate resolvable for the period, an empty month is a valid
    // "nothing happened" report instead of an error.
    ledger
        .set_rate(Currency::Twd, day(2023, 12, 20), dec("31"), 7)
        .await
        .unwrap();
    let report = ledger
        .historical_report(scope, period("2024-01"), today)
        .await
        .unwrap();
    assert_eq!(report.currency(Currency::Twd).unwrap().net_minor, 0);
    assert_eq!(report.currency(Currency::Twd).unwrap().rate, Some(dec("31")));
}

#[tokio::test]
async fn historical_report_uses_period_end_rate() {
    let ledger = ledger().await;
    let today = day(2025, 8, 7);

    ledger
        .record(
            RecordEntryCmd::new(
                1,
                10,
                Currency::Twd,
                100_000,
                TransactionKind::Income,
                today,
            )
            .date(day(2025, 6, 10)),
        )
        .await
        .unwrap();
    ledger
        .set_rate(Currency::Twd, day(2025, 6, 5), dec("30"), 7)
        .await
        .unwrap();
    // Set after the period: must not leak into June's report.
    ledger
        .set_rate(Currency::Twd, day(2025, 7, 1), dec("40"), 7)
        .await
        .unwrap();

    let report = ledger
        .historical_report(ReportScope::Group { group_id: 1 }, period("2025-06"), today)
        .await
        .unwrap();
    let twd = report.currency(Currency::Twd).unwrap();
    assert_eq!(twd.rate, Some(dec("30")));
    assert_eq!(twd.usdt, Some(dec("33.33")));
}
