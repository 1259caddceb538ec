use engine::{
    Currency, EngineError, FundTag, Period, RecordEntryCmd, TransactionKind,
    TransactionListFilter,
};

mod common;
use common::{day, ledger};

#[tokio::test]
async fn record_normalizes_sign_from_kind() {
    let ledger = ledger().await;
    let today = day(2025, 6, 15);

    // Income recorded with a negative delta still lands positive.
    ledger
        .record(RecordEntryCmd::new(
            1,
            10,
            Currency::Twd,
            -100_000,
            TransactionKind::Income,
            today,
        ))
        .await
        .unwrap();
    // Expense recorded with a positive delta still lands negative.
    ledger
        .record(RecordEntryCmd::new(
            1,
            10,
            Currency::Twd,
            25_000,
            TransactionKind::Expense,
            today,
        ))
        .await
        .unwrap();

    let entries = ledger
        .list_transactions(1, &TransactionListFilter::default())
        .await
        .unwrap();
    assert_eq!(entries.len(), 2);

    let income = entries
        .iter()
        .find(|e| e.kind == TransactionKind::Income)
        .unwrap();
    assert_eq!(income.amount_minor, 100_000);
    let expense = entries
        .iter()
        .find(|e| e.kind == TransactionKind::Expense)
        .unwrap();
    assert_eq!(expense.amount_minor, -25_000);
}

#[tokio::test]
async fn zero_amount_rejected() {
    let ledger = ledger().await;

    let err = ledger
        .record(RecordEntryCmd::new(
            1,
            10,
            Currency::Cny,
            0,
            TransactionKind::Income,
            day(2025, 6, 15),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}

#[tokio::test]
async fn date_defaults_to_today() {
    let ledger = ledger().await;
    let today = day(2025, 6, 15);

    ledger
        .record(RecordEntryCmd::new(
            1,
            10,
            Currency::Twd,
            5_000,
            TransactionKind::Income,
            today,
        ))
        .await
        .unwrap();
    ledger
        .record(
            RecordEntryCmd::new(1, 10, Currency::Twd, 5_000, TransactionKind::Income, today)
                .date(day(2025, 6, 2)),
        )
        .await
        .unwrap();

    let entries = ledger
        .list_transactions(1, &TransactionListFilter::default())
        .await
        .unwrap();
    let dates: Vec<_> = entries.iter().map(|e| e.date).collect();
    assert!(dates.contains(&today));
    assert!(dates.contains(&day(2025, 6, 2)));
}

#[tokio::test]
async fn record_on_behalf_keeps_operator() {
    let ledger = ledger().await;

    ledger
        .record(
            RecordEntryCmd::new(
                1,
                10,
                Currency::Twd,
                1_000,
                TransactionKind::Income,
                day(2025, 6, 15),
            )
            .created_by(99)
            .note("  recorded by operator  "),
        )
        .await
        .unwrap();

    let entries = ledger
        .list_transactions(1, &TransactionListFilter::default())
        .await
        .unwrap();
    assert_eq!(entries[0].user_id, 10);
    assert_eq!(entries[0].created_by, 99);
    assert_eq!(entries[0].note.as_deref(), Some("recorded by operator"));
}

#[tokio::test]
async fn list_filters_by_currency_period_and_kind() {
    let ledger = ledger().await;
    let today = day(2025, 6, 15);

    for (currency, amount, kind, date) in [
        (Currency::Twd, 100_000, TransactionKind::Income, day(2025, 6, 1)),
        (Currency::Cny, 70_000, TransactionKind::Income, day(2025, 6, 2)),
        (Currency::Twd, 30_000, TransactionKind::Expense, day(2025, 6, 3)),
        (Currency::Twd, 50_000, TransactionKind::Income, day(2025, 5, 20)),
    ] {
        ledger
            .record(
                RecordEntryCmd::new(1, 10, currency, amount, kind, today).date(date),
            )
            .await
            .unwrap();
    }

    let period: Period = "2025-06".parse().unwrap();
    let filter = TransactionListFilter {
        currency: Some(Currency::Twd),
        kinds: Some(vec![TransactionKind::Income]),
        ..Default::default()
    }
    .period(period);

    let entries = ledger.list_transactions(1, &filter).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].amount_minor, 100_000);
    assert_eq!(entries[0].date, day(2025, 6, 1));
}

#[tokio::test]
async fn list_orders_by_created_at_ascending() {
    let ledger = ledger().await;
    let today = day(2025, 6, 15);

    for amount in [1_000, 2_000, 3_000] {
        ledger
            .record(RecordEntryCmd::new(
                1,
                10,
                Currency::Twd,
                amount,
                TransactionKind::Income,
                today,
            ))
            .await
            .unwrap();
    }

    let entries = ledger
        .list_transactions(1, &TransactionListFilter::default())
        .await
        .unwrap();
    assert_eq!(entries.len(), 3);
    assert!(
        entries
            .windows(2)
            .all(|pair| pair[0].created_at <= pair[1].created_at)
    );
}

#[tokio::test]
async fn empty_kind_list_rejected() {
    let ledger = ledger().await;

    let filter = TransactionListFilter {
        kinds: Some(Vec::new()),
        ..Default::default()
    };
    let err = ledger.list_transactions(1, &filter).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}

#[tokio::test]
async fn clear_group_period_requires_admin() {
    let ledger = ledger().await;
    let today = day(2025, 6, 15);

    ledger
        .record(RecordEntryCmd::new(
            1,
            10,
            Currency::Twd,
            1_000,
            TransactionKind::Income,
            today,
        ))
        .await
        .unwrap();

    let period: Period = "2025-06".parse().unwrap();
    let err = ledger
        .clear_group_period(1, period, 10)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::PermissionDenied(_)));
}

#[tokio::test]
async fn clear_group_period_is_idempotent_and_scoped() {
    let ledger = ledger().await;
    let today = day(2025, 6, 15);

    ledger.upsert_group(1, "Alpha").await.unwrap();
    ledger.upsert_user(9, Some("ops"), None).await.unwrap();
    ledger.grant_group_admin(1, 9).await.unwrap();

    // Two entries in the target period, one before it, one in another group.
    for (group, date) in [
        (1, day(2025, 6, 1)),
        (1, day(2025, 6, 20)),
        (1, day(2025, 5, 31)),
        (2, day(2025, 6, 10)),
    ] {
        ledger
            .record(
                RecordEntryCmd::new(
                    group,
                    10,
                    Currency::Twd,
                    1_000,
                    TransactionKind::Income,
                    today,
                )
                .date(date),
            )
            .await
            .unwrap();
    }

    let period: Period = "2025-06".parse().unwrap();
    assert_eq!(ledger.clear_group_period(1, period, 9).await.unwrap(), 2);
    assert_eq!(ledger.clear_group_period(1, period, 9).await.unwrap(), 0);

    // The May entry and the other group's entry survive.
    let remaining = ledger
        .list_transactions(1, &TransactionListFilter::default())
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].date, day(2025, 5, 31));
    let other_group = ledger
        .list_transactions(2, &TransactionListFilter::default())
        .await
        .unwrap();
    assert_eq!(other_group.len(), 1);
}

#[tokio::test]
async fn global_admin_can_clear_any_group() {
    let ledger = ledger().await;
    let today = day(2025, 6, 15);

    ledger.upsert_user(7, None, Some("boss")).await.unwrap();
    ledger.set_global_admin(7, true).await.unwrap();

    ledger
        .record(RecordEntryCmd::new(
            5,
            10,
            Currency::Cny,
            2_000,
            TransactionKind::Income,
            today,
        ))
        .await
        .unwrap();

    let period: Period = "2025-06".parse().unwrap();
    assert_eq!(ledger.clear_group_period(5, period, 7).await.unwrap(), 1);
}

#[tokio::test]
async fn fund_tag_on_plain_entry_rejected() {
    let ledger = ledger().await;

    let err = ledger
        .record(
            RecordEntryCmd::new(
                1,
                10,
                Currency::Twd,
                1_000,
                TransactionKind::Income,
                day(2025, 6, 15),
            )
            .fund(FundTag::Shared),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}
