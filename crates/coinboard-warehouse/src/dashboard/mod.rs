pub mod selection;
pub mod views;

pub use selection::Selection;
pub use views::*;

use crate::api::{Http, HttpClient};
use crate::cache::TtlCache;
use crate::config::Config;
use crate::error::FetchError;
use crate::schema::crypto::history::{DateWindow, HistoryQuery, PriceSeries};
use crate::schema::crypto::index::Currency;
use crate::schema::crypto::listings::{Listings, ListingsQuery};
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, trace, warn};

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Frame: every view for one selection
//
////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Error,
    Warning,
}

/// Inline message shown alongside the views; failures never leave the dashboard any other way.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn error(message: impl ToString) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.to_string(),
        }
    }

    pub fn warning(message: impl ToString) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.to_string(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Frame {
    pub currency: Currency,
    /// Every fetched symbol, sorted; the choices offered for selection.
    pub available: Vec<String>,
    /// Coin the history chart was drawn for.
    pub history_symbol: Option<String>,
    pub percent_change: Option<BarChart>,
    pub market_cap: Option<BarChart>,
    pub dominance: Option<Dominance>,
    pub history: Option<LineChart>,
    pub price_table: Vec<PriceRow>,
    pub percent_table: Vec<PercentRow>,
    pub export: Option<CsvExport>,
    pub notices: Vec<Notice>,
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Dashboard
//
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Owns the data sources & their caches; turns a [`Selection`] into a [`Frame`].
///
/// ```rust
/// let listings = CoinMarketCap::from_config(&config);
/// let history = YahooFinance::from_config(&config);
/// let mut dashboard = Dashboard::new(http_client, listings, history, &config);
/// let frame = dashboard.on_selection(&Selection::default()).await;
/// ```
pub struct Dashboard<L, H> {
    http_client: HttpClient,
    listings_source: L,
    history_source: H,
    listings_limit: usize,
    history_days: u32,
    listings_cache: TtlCache<ListingsQuery, Arc<Listings>>,
    history_cache: TtlCache<HistoryQuery, Arc<PriceSeries>>,
}

impl<L, H> Dashboard<L, H>
where
    L: Http<Listings, Query = ListingsQuery>,
    H: Http<PriceSeries, Query = HistoryQuery>,
{
    pub fn new(
        http_client: HttpClient,
        listings_source: L,
        history_source: H,
        config: &Config,
    ) -> Self {
        Self::with_ttl(
            http_client,
            listings_source,
            history_source,
            config.listings_limit,
            config.history_days,
            config.listings_ttl,
        )
    }

    pub fn with_ttl(
        http_client: HttpClient,
        listings_source: L,
        history_source: H,
        listings_limit: usize,
        history_days: u32,
        listings_ttl: Duration,
    ) -> Self {
        Self {
            http_client,
            listings_source,
            history_source,
            listings_limit,
            history_days,
            listings_cache: TtlCache::new(listings_ttl),
            history_cache: TtlCache::unbounded(),
        }
    }

    /// Event handler: recompute every view for `selection`.
    ///
    /// Fetches only happen when the query behind them is not cached (or has expired).
    pub async fn on_selection(&mut self, selection: &Selection) -> Frame {
        let today = chrono::Utc::now().date_naive();
        self.on_selection_at(selection, today).await
    }

    /// [`Self::on_selection`] with the history window ending on `today`.
    pub async fn on_selection_at(&mut self, selection: &Selection, today: NaiveDate) -> Frame {
        let mut frame = Frame {
            currency: selection.currency,
            ..Frame::default()
        };

        let listings = match self.listings(selection.currency).await {
            Ok(listings) => listings,
            Err(e) => {
                error!("listings unavailable: {e}");
                frame.notices.push(Notice::error(e));
                return frame;
            }
        };
        if listings.is_empty() {
            frame
                .notices
                .push(Notice::warning("the listings response contained no coins"));
            return frame;
        }
        frame.available = listings.sorted_symbols();

        // selection views
        let rows = filter(&listings, &selection.symbols);
        trace!("{} of {} listings selected", rows.len(), listings.len());
        frame.percent_change = percent_change_chart(&rows, selection.window);
        frame.market_cap = market_cap_chart(&rows);
        frame.price_table = price_table(&rows);
        frame.percent_table = percent_table(&rows);
        if !frame.price_table.is_empty() {
            match export_csv(&frame.price_table) {
                Ok(export) => frame.export = Some(export),
                Err(e) => {
                    error!("csv export failed: {e}");
                    frame.notices.push(Notice::error(format!("CSV export failed: {e}")));
                }
            }
        }

        // market share of the whole listing
        match dominance(&listings) {
            Ok(share) => frame.dominance = Some(share),
            Err(e) => {
                warn!("{e}");
                frame.notices.push(Notice::warning(e));
            }
        }

        // history of one coin; windows that ended before today's are stale
        let history_symbol = selection
            .history_symbol
            .clone()
            .or_else(|| frame.available.first().cloned());
        let window = DateWindow::trailing(today, self.history_days);
        self.history_cache.retain_keys(|query| query.window.end >= window.end);
        if let Some(symbol) = history_symbol {
            let query = HistoryQuery {
                symbol: symbol.clone(),
                currency: selection.currency,
                window,
            };
            match self.history(query).await {
                Ok(series) => {
                    frame.history =
                        history_chart(&series, &symbol, selection.currency, self.history_days)
                }
                Err(e) => {
                    warn!("history unavailable for {symbol}: {e}");
                    frame.notices.push(Notice::warning(e));
                }
            }
            frame.history_symbol = Some(symbol);
        }

        frame
    }

    /// Drop every cached listing, so the next selection fetches fresh data.
    pub fn refresh(&mut self) {
        debug!("listings cache cleared");
        self.listings_cache.clear();
    }

    async fn listings(&mut self, currency: Currency) -> Result<Arc<Listings>, FetchError> {
        let query = ListingsQuery {
            currency,
            limit: self.listings_limit,
        };
        if let Some(hit) = self.listings_cache.get(&query) {
            trace!("listings cache hit for {query:?}");
            return Ok(hit);
        }

        let listings = Arc::new(
            self.listings_source
                .fetch(&self.http_client, &query)
                .await?,
        );
        self.listings_cache.purge_expired();
        self.listings_cache.insert(query, listings.clone());
        Ok(listings)
    }

    async fn history(&mut self, query: HistoryQuery) -> Result<Arc<PriceSeries>, FetchError> {
        if let Some(hit) = self.history_cache.get(&query) {
            trace!("history cache hit for {query:?}");
            return Ok(hit);
        }

        let series = Arc::new(self.history_source.fetch(&self.http_client, &query).await?);
        self.history_cache.insert(query, series.clone());
        Ok(series)
    }
}
