use std::collections::HashMap;

use uuid::Uuid;

use sea_orm::{ConnectionTrait, QueryFilter, Statement, prelude::*};

use crate::{
    Currency, EngineError, FundBalance, FundDepositCmd, FundTag, FundWithdrawCmd, RecordEntryCmd,
    ResultEngine, TransactionKind, transactions, util,
};

use super::Engine;

fn validate_fund_args(amount_minor: i64, fund: FundTag) -> ResultEngine<()> {
    if amount_minor <= 0 {
        return Err(EngineError::InvalidAmount(
            "fund amount must be > 0".to_string(),
        ));
    }
    if fund == FundTag::None {
        return Err(EngineError::InvalidAmount(
            "fund operations require a fund tag".to_string(),
        ));
    }
    Ok(())
}

impl Engine {
    /// Deposits into a fund pool: a thin wrapper over `record` with kind
    /// `FundDeposit`; the amount must be positive at this boundary.
    pub async fn fund_deposit(&self, cmd: FundDepositCmd) -> ResultEngine<Uuid> {
        let FundDepositCmd {
            group_id,
            user_id,
            currency,
            amount_minor,
            fund,
            date,
            today,
            note,
        } = cmd;
        validate_fund_args(amount_minor, fund)?;

        let mut record = RecordEntryCmd::new(
            group_id,
            user_id,
            currency,
            amount_minor,
            TransactionKind::FundDeposit,
            today,
        )
        .fund(fund);
        if let Some(date) = date {
            record = record.date(date);
        }
        if let Some(note) = note {
            record = record.note(note);
        }
        self.record(record).await
    }

    /// Withdraws from a fund pool (kind `FundWithdrawal`).
    ///
    /// There is no negative-balance guard: a withdrawal may drive the pool
    /// negative, and reports surface the overdraft instead of hiding it.
    pub async fn fund_withdraw(&self, cmd: FundWithdrawCmd) -> ResultEngine<Uuid> {
        let FundWithdrawCmd {
            group_id,
            user_id,
            currency,
            amount_minor,
            fund,
            date,
            today,
            note,
        } = cmd;
        validate_fund_args(amount_minor, fund)?;

        let mut record = RecordEntryCmd::new(
            group_id,
            user_id,
            currency,
            amount_minor,
            TransactionKind::FundWithdrawal,
            today,
        )
        .fund(fund);
        if let Some(date) = date {
            record = record.date(date);
        }
        if let Some(note) = note {
            record = record.note(note);
        }
        self.record(record).await
    }

    /// Current balance of one fund pool: the signed sum of its deposit and
    /// withdrawal entries. Derived on every call, never stored.
    pub async fn fund_balance(
        &self,
        group_id: i64,
        currency: Currency,
        fund: FundTag,
    ) -> ResultEngine<i64> {
        if fund == FundTag::None {
            return Err(EngineError::InvalidAmount(
                "fund balance requires a fund tag".to_string(),
            ));
        }

        let backend = self.database.get_database_backend();
        let stmt = Statement::from_sql_and_values(
            backend,
            "SELECT COALESCE(SUM(amount_minor), 0) AS sum \
             FROM transactions \
             WHERE group_id = ? AND currency = ? AND fund = ? AND kind IN (?, ?)",
            vec![
                group_id.into(),
                currency.code().into(),
                fund.as_str().into(),
                TransactionKind::FundDeposit.as_str().into(),
                TransactionKind::FundWithdrawal.as_str().into(),
            ],
        );
        let row = self.database.query_one(stmt).await?;
        Ok(row.and_then(|r| r.try_get("", "sum").ok()).unwrap_or(0))
    }

    /// All fund pools of one group that have at least one entry.
    pub async fn fund_balances(&self, group_id: i64) -> ResultEngine<Vec<FundBalance>> {
        self.fund_balances_on(&self.database, &[group_id]).await
    }

    /// Fund balances folded over several groups (fleet reports sum member
    /// groups' pools per fund tag and currency).
    pub(super) async fn fund_balances_on<C: ConnectionTrait>(
        &self,
        db: &C,
        group_ids: &[i64],
    ) -> ResultEngine<Vec<FundBalance>> {
        let rows = transactions::Entity::find()
            .filter(transactions::Column::GroupId.is_in(group_ids.iter().copied()))
            .filter(transactions::Column::Kind.is_in([
                TransactionKind::FundDeposit.as_str(),
                TransactionKind::FundWithdrawal.as_str(),
            ]))
            .all(db)
            .await?;

        let mut sums: HashMap<(FundTag, Currency), i64> = HashMap::new();
        for model in rows {
            let fund = FundTag::try_from(model.fund.as_str())?;
            let currency = util::model_currency(&model.currency)?;
            *sums.entry((fund, currency)).or_insert(0) += model.amount_minor;
        }

        let mut out = Vec::new();
        for fund in [FundTag::Shared, FundTag::Private] {
            for currency in Currency::ALL {
                if let Some(balance_minor) = sums.remove(&(fund, currency)) {
                    out.push(FundBalance {
                        fund,
                        currency,
                        balance_minor,
                    });
                }
            }
        }
        Ok(out)
    }
}
