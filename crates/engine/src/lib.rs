//! Ledger core for Cassa: signed monetary entries per user and group,
//! operator-entered exchange rates, derived fund balances and period reports.
//!
//! The engine owns no process-wide state; everything goes through the
//! [`sea_orm::DatabaseConnection`] handed to [`EngineBuilder::database`].

pub use commands::{FundDepositCmd, FundWithdrawCmd, RecordEntryCmd};
pub use currency::Currency;
pub use error::EngineError;
pub use exchange_rates::ExchangeRate;
pub use money::MoneyCents;
pub use ops::{Engine, EngineBuilder, TransactionListFilter};
pub use period::Period;
pub use report::{
    ContributorLine, CurrencySummary, DayCurrency, DayLine, FundBalance, Report, ReportScope,
};
pub use transactions::{FundTag, Transaction, TransactionKind};

mod commands;
mod currency;
mod error;
mod exchange_rates;
mod fleet_memberships;
mod group_admins;
mod groups;
mod money;
mod ops;
mod period;
mod report;
mod transactions;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
