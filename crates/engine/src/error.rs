//! The module contains the errors the engine can return.
//!
//! All variants are local, recoverable conditions handed back to the caller;
//! none of them represents corrupted state. The engine never retries and
//! never aborts the process on bad input.

use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Zero, malformed or sign-inconsistent delta.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    /// Non-positive or unparseable exchange rate.
    #[error("Invalid rate: {0}")]
    InvalidRate(String),
    /// No rate exists on or before the requested date for a currency.
    #[error("No rate available: {0}")]
    NoRateAvailable(String),
    /// Historical query matched nothing and no rate resolves for the period.
    #[error("No data for period: {0}")]
    NoDataForPeriod(String),
    /// Non-admin caller attempting an administrative operation.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Invalid period: {0}")]
    InvalidPeriod(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidRate(a), Self::InvalidRate(b)) => a == b,
            (Self::NoRateAvailable(a), Self::NoRateAvailable(b)) => a == b,
            (Self::NoDataForPeriod(a), Self::NoDataForPeriod(b)) => a == b,
            (Self::PermissionDenied(a), Self::PermissionDenied(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::InvalidPeriod(a), Self::InvalidPeriod(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
