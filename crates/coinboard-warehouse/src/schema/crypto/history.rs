use super::index::Currency;
use crate::api::*;
use crate::config::Config;
use crate::error::{FetchError, NormalizeError};
use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate};
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, error, trace, warn};

///////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Daily closing prices from Yahoo Finance, per ticker
//
///////////////////////////////////////////////////////////////////////////////////////////////////////

pub struct YahooFinance {
    base_url: String,
}

impl YahooFinance {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.yahoo_base_url.clone())
    }

    fn url(&self, ticker: &str) -> String {
        format!(
            "{}/v8/finance/chart/{ticker}",
            self.base_url.trim_end_matches('/')
        )
    }
}

/// Yahoo's ticker for a crypto pair, e.g. `BTC` in `USD` is `BTC-USD`.
pub fn ticker(symbol: &str, currency: Currency) -> String {
    format!("{}-{currency}", symbol.to_uppercase())
}

/// Calendar days `[start, end)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// The `days` leading up to `end`.
    pub fn trailing(end: NaiveDate, days: u32) -> Self {
        let start = end
            .checked_sub_days(Days::new(days.into()))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end }
    }

    fn epoch_seconds(date: NaiveDate) -> i64 {
        date.and_hms_opt(0, 0, 0)
            .map(|midnight| midnight.and_utc().timestamp())
            .unwrap_or_default()
    }
}

/// Inputs of a history request; every one of them changes the result.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HistoryQuery {
    pub symbol: String,
    pub currency: Currency,
    pub window: DateWindow,
}

impl HistoryQuery {
    pub fn ticker(&self) -> String {
        ticker(&self.symbol, self.currency)
    }
}

// -------------------------------------------------------------------------------------------------

#[async_trait]
impl Http<PriceSeries> for YahooFinance {
    type Query = HistoryQuery;

    async fn fetch(
        &self,
        http_client: &HttpClient,
        query: &HistoryQuery,
    ) -> Result<PriceSeries, FetchError> {
        let ticker = query.ticker();
        let url = self.url(&ticker);
        trace!(
            "Fetching price data for [{ticker}] {} to {} from Yahoo Finance",
            query.window.start,
            query.window.end
        );
        let request = http_client.get(&url).query(&[
            (
                "period1",
                DateWindow::epoch_seconds(query.window.start).to_string(),
            ),
            (
                "period2",
                DateWindow::epoch_seconds(query.window.end).to_string(),
            ),
            ("interval", "1d".to_string()),
        ]);

        let (status, body) = send(request, &url).await?;
        match status {
            StatusCode::NOT_FOUND => {
                warn!("[{ticker}] not found on Yahoo Finance");
                return Err(FetchError::UnknownTicker { ticker });
            }
            status if !status.is_success() => {
                error!("[{ticker}] price fetching failed with {status}\nURL: {url}");
                return Err(FetchError::Status { url, status });
            }
            _ => {}
        }

        // error check the deserialization
        let de = serde_json::from_slice::<PriceHistory>(&body).map_err(|e| {
            error!("[{ticker}] deserialization error: {e}\nURL: {url}");
            NormalizeError::from(e)
        })?;

        if let Some(e) = de.chart.error {
            warn!("[{ticker}] Yahoo Finance error {}: {}", e.code, e.description);
            return Err(FetchError::UnknownTicker { ticker });
        }

        let points = transform(de);
        if points.is_empty() {
            warn!("[{ticker}] contained no price data\nURL: {url}");
            return Err(FetchError::UnknownTicker { ticker });
        }
        debug!("[{ticker}] {} daily closes fetched", points.len());

        Ok(PriceSeries { ticker, points })
    }
}

/// Pair up timestamps & closes, dropping gaps; one point per day, latest wins, dates ascending.
fn transform(history: PriceHistory) -> Vec<PricePoint> {
    let Some(base) = history.chart.result.and_then(|result| result.into_iter().next()) else {
        return vec![];
    };
    let Some(quote) = base.indicators.quote.into_iter().next() else {
        return vec![];
    };

    let mut cells: Vec<(i64, f64)> = base
        .timestamp
        .into_iter()
        .zip(quote.close)
        .filter_map(|(timestamp, close)| close.map(|close| (timestamp, close)))
        .collect();
    cells.sort_by_key(|(timestamp, _)| *timestamp);

    cells
        .into_iter()
        .filter_map(|(timestamp, close)| {
            DateTime::from_timestamp(timestamp, 0).map(|time| (time.date_naive(), close))
        })
        .collect::<BTreeMap<NaiveDate, f64>>()
        .into_iter()
        .map(|(date, close)| PricePoint { date, close })
        .collect()
}

///////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Deserialization
//
///////////////////////////////////////////////////////////////////////////////////////////////////////

// Output: Price
#[derive(Clone, Debug, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PriceSeries {
    pub ticker: String,
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

// Input: Yahoo Finance
#[derive(Deserialize, Debug)]
pub struct PriceHistory {
    pub chart: PriceResponse,
}

#[derive(Deserialize, Debug)]
pub struct PriceResponse {
    pub result: Option<Vec<PriceCategories>>,
    pub error: Option<ChartError>,
}

#[derive(Deserialize, Debug)]
pub struct ChartError {
    pub code: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize, Debug)]
pub struct PriceCategories {
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: Indicators,
}

#[derive(Deserialize, Debug)]
pub struct Indicators {
    pub quote: Vec<Quote>,
}

#[derive(Deserialize, Debug)]
pub struct Quote {
    #[serde(default)]
    pub close: Vec<Option<f64>>,
}
