use std::fmt;
use std::str::FromStr;

/// Coins shown when no explicit selection has been made.
pub const DEFAULT_SYMBOLS: [&str; 5] = ["BTC", "ETH", "ADA", "DOGE", "BNB"];

/// Flattened listings columns, in table order.
pub const LISTINGS_COLUMNS: [&str; 8] = [
    "coin_name",
    "coin_symbol",
    "market_cap",
    "percent_change_1h",
    "percent_change_24h",
    "percent_change_7d",
    "price",
    "volume_24h",
];

/// Columns of the price table (and of its CSV export).
pub const PRICE_COLUMNS: [&str; 5] = [
    "coin_name",
    "coin_symbol",
    "market_cap",
    "price",
    "volume_24h",
];

/// Columns of the percent change table.
pub const PERCENT_COLUMNS: [&str; 5] = [
    "coin_name",
    "coin_symbol",
    "percent_change_1h",
    "percent_change_24h",
    "percent_change_7d",
];

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Currency units
//
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Unit that every price, volume & market cap is quoted in.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Currency {
    #[default]
    Usd,
    Btc,
}

impl Currency {
    pub const ALL: [Currency; 2] = [Currency::Usd, Currency::Btc];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Btc => "BTC",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "BTC" => Ok(Currency::Btc),
            other => Err(format!("unsupported currency: {other}")),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Percent change windows
//
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Lookback of the percent change column.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Window {
    #[default]
    Days7,
    Hours24,
    Hours1,
}

impl Window {
    pub const ALL: [Window; 3] = [Window::Days7, Window::Hours24, Window::Hours1];

    pub fn label(&self) -> &'static str {
        match self {
            Window::Days7 => "7d",
            Window::Hours24 => "24h",
            Window::Hours1 => "1h",
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            Window::Days7 => "percent_change_7d",
            Window::Hours24 => "percent_change_24h",
            Window::Hours1 => "percent_change_1h",
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Window {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "7d" => Ok(Window::Days7),
            "24h" => Ok(Window::Hours24),
            "1h" => Ok(Window::Hours1),
            other => Err(format!("unsupported percent change window: {other}")),
        }
    }
}
