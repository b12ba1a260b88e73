use crate::schema::crypto::index::{Currency, Window, DEFAULT_SYMBOLS};

/// What the user currently has selected; every view is a function of this and the fetched data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    pub currency: Currency,
    /// Upper-cased coin symbols.
    pub symbols: Vec<String>,
    pub window: Window,
    /// Coin of the history chart; `None` picks the first listed symbol alphabetically.
    pub history_symbol: Option<String>,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            currency: Currency::default(),
            symbols: DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
            window: Window::default(),
            history_symbol: None,
        }
    }
}

impl Selection {
    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    pub fn with_symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.symbols = Vec::new();
        for symbol in symbols {
            let symbol = symbol.as_ref().trim().to_uppercase();
            if !symbol.is_empty() && !self.symbols.contains(&symbol) {
                self.symbols.push(symbol);
            }
        }
        self
    }

    pub fn with_window(mut self, window: Window) -> Self {
        self.window = window;
        self
    }

    pub fn with_history_symbol(mut self, symbol: Option<impl AsRef<str>>) -> Self {
        self.history_symbol = symbol.map(|s| s.as_ref().trim().to_uppercase());
        self
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|s| s == symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_dashboard_landing_state() {
        let selection = Selection::default();
        assert_eq!(selection.currency, Currency::Usd);
        assert_eq!(selection.window, Window::Days7);
        assert_eq!(selection.symbols, vec!["BTC", "ETH", "ADA", "DOGE", "BNB"]);
        assert!(selection.history_symbol.is_none());
    }

    #[test]
    fn symbols_are_normalized() {
        let selection = Selection::default()
            .with_symbols(["btc", " eth ", "BTC", ""])
            .with_history_symbol(Some("sol"));
        assert_eq!(selection.symbols, vec!["BTC", "ETH"]);
        assert!(selection.contains("ETH"));
        assert!(!selection.contains("eth"));
        assert_eq!(selection.history_symbol.as_deref(), Some("SOL"));
    }
}
