use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Currency of a ledger entry.
///
/// The ledger tracks exactly two currencies; totals are always reported side
/// by side and never folded into one another. USDT-equivalent figures are a
/// report-level projection, not a stored currency.
///
/// ## Minor units
///
/// Monetary values are stored as an `i64` number of **minor units** (see
/// `MoneyCents`). Both supported currencies use 2 fraction digits, so
/// `1000.50` ⇄ `100050`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Twd,
    Cny,
}

impl Currency {
    /// Both supported currencies, in report display order.
    pub const ALL: [Currency; 2] = [Currency::Twd, Currency::Cny];

    /// Canonical currency code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Currency::Twd => "TWD",
            Currency::Cny => "CNY",
        }
    }

    /// Display symbol used in rendered reports.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Currency::Twd => "NT$",
            Currency::Cny => "CN¥",
        }
    }

    /// Number of fraction digits used when formatting/parsing amounts.
    #[must_use]
    pub const fn minor_units(self) -> u8 {
        match self {
            Currency::Twd | Currency::Cny => 2,
        }
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for Currency {
    type Error = EngineError;

    /// Accepts the canonical codes plus the short forms the operators use
    /// ("TW"/"NT" and "CN"/"RMB").
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "TWD" | "TW" | "NT" | "NT$" => Ok(Currency::Twd),
            "CNY" | "CN" | "CN¥" | "RMB" => Ok(Currency::Cny),
            other => Err(EngineError::InvalidAmount(format!(
                "unsupported currency: {other}"
            ))),
        }
    }
}
