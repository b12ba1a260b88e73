use clap::{Args, Parser, Subcommand, ValueEnum};
use coinboard_warehouse::schema::crypto::index::{Currency, Window, DEFAULT_SYMBOLS};
use coinboard_warehouse::Selection;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Sets the level of tracing
    #[arg(long, global = true, value_enum, ignore_case = true, default_value = "INFO")]
    pub trace: TraceLevel,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render every chart & table once for the given selection.
    Dashboard {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Also write the filtered price table to this CSV file.
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Print the normalized listings table.
    Listings {
        #[arg(long, value_enum, ignore_case = true, default_value = "usd")]
        currency: CurrencyArg,

        /// Number of coins to fetch (defaults to LISTINGS_LIMIT).
        #[arg(long)]
        limit: Option<usize>,

        /// Read a saved listings response instead of calling CoinMarketCap.
        #[arg(long)]
        listings_file: Option<String>,
    },

    /// Print the daily closing prices of one coin.
    History {
        symbol: String,

        #[arg(long, value_enum, ignore_case = true, default_value = "usd")]
        currency: CurrencyArg,

        /// Trailing window in days (defaults to HISTORY_DAYS).
        #[arg(long)]
        days: Option<u32>,
    },

    /// Write the filtered price table as CSV.
    Export {
        #[command(flatten)]
        selection: SelectionArgs,

        #[arg(long, short, default_value = "crypto_data.csv")]
        output: PathBuf,
    },

    /// Pick the selection from menus, re-rendering after every change.
    Interactive {
        #[command(flatten)]
        selection: SelectionArgs,
    },
}

#[derive(Args, Debug, Clone)]
pub struct SelectionArgs {
    /// Currency for price
    #[arg(long, value_enum, ignore_case = true, default_value = "usd")]
    pub currency: CurrencyArg,

    /// Coins to show, comma separated.
    #[arg(long, value_delimiter = ',', default_values = DEFAULT_SYMBOLS)]
    pub symbols: Vec<String>,

    /// Percent change time frame
    #[arg(long, value_enum, default_value = "7d")]
    pub window: WindowArg,

    /// Coin of the history chart; the first listed symbol if omitted.
    #[arg(long)]
    pub history: Option<String>,

    /// Read a saved listings response instead of calling CoinMarketCap.
    #[arg(long)]
    pub listings_file: Option<String>,
}

impl SelectionArgs {
    pub fn selection(&self) -> Selection {
        Selection::default()
            .with_currency(self.currency.into())
            .with_symbols(&self.symbols)
            .with_window(self.window.into())
            .with_history_symbol(self.history.as_ref())
    }
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum CurrencyArg {
    Usd,
    Btc,
}

impl From<CurrencyArg> for Currency {
    fn from(arg: CurrencyArg) -> Self {
        match arg {
            CurrencyArg::Usd => Currency::Usd,
            CurrencyArg::Btc => Currency::Btc,
        }
    }
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum WindowArg {
    #[value(name = "7d")]
    Days7,
    #[value(name = "24h")]
    Hours24,
    #[value(name = "1h")]
    Hours1,
}

impl From<WindowArg> for Window {
    fn from(arg: WindowArg) -> Self {
        match arg {
            WindowArg::Days7 => Window::Days7,
            WindowArg::Hours24 => Window::Hours24,
            WindowArg::Hours1 => Window::Hours1,
        }
    }
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum TraceLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl From<TraceLevel> for tracing::Level {
    fn from(level: TraceLevel) -> Self {
        match level {
            TraceLevel::Debug => tracing::Level::DEBUG,
            TraceLevel::Info => tracing::Level::INFO,
            TraceLevel::Warn => tracing::Level::WARN,
            TraceLevel::Error => tracing::Level::ERROR,
        }
    }
}
