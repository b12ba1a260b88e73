use super::index::{Currency, Window};
use crate::api::*;
use crate::config::Config;
use crate::error::{FetchError, NormalizeError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::{debug, error, trace, warn};

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// API Documentation: https://coinmarketcap.com/api/documentation/v1/#operation/getV1CryptocurrencyListingsLatest
//
////////////////////////////////////////////////////////////////////////////////////////////////////

const LISTINGS_PATH: &str = "/v1/cryptocurrency/listings/latest";

pub struct CoinMarketCap {
    base_url: String,
    api_key: Option<String>,
}

impl CoinMarketCap {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.cmc_base_url.clone(), config.cmc_api_key.clone())
    }

    fn url(&self) -> String {
        format!("{}{LISTINGS_PATH}", self.base_url.trim_end_matches('/'))
    }
}

/// Inputs of a listings request.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListingsQuery {
    pub currency: Currency,
    pub limit: usize,
}

// -------------------------------------------------------------------------------------------------

#[async_trait]
impl Http<Listings> for CoinMarketCap {
    type Query = ListingsQuery;

    async fn fetch(
        &self,
        http_client: &HttpClient,
        query: &ListingsQuery,
    ) -> Result<Listings, FetchError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            error!("CMC_API_KEY not found; listings unavailable");
            FetchError::MissingCredential("CMC_API_KEY")
        })?;

        let url = self.url();
        debug!(
            "Fetching {} listings in {} from CoinMarketCap",
            query.limit, query.currency
        );
        let request = http_client
            .get(&url)
            .header("Accepts", "application/json")
            .header("X-CMC_PRO_API_KEY", api_key)
            .query(&[
                ("limit", query.limit.to_string()),
                ("convert", query.currency.to_string()),
            ]);

        let (status, body) = send(request, &url).await?;
        if !status.is_success() {
            error!("CoinMarketCap listings request failed with {status}");
            return Err(FetchError::Status { url, status });
        }

        let raw: Value = serde_json::from_slice(&body).map_err(NormalizeError::from)?;
        let mut listings = normalize(&raw, query.currency)?;
        listings.truncate(query.limit);
        trace!("{} listings normalized", listings.len());

        Ok(listings)
    }
}

/// A listings response saved to disk; normalized exactly like a live response.
pub struct ListingsFile {
    path: String,
}

impl ListingsFile {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Http<Listings> for ListingsFile {
    type Query = ListingsQuery;

    async fn fetch(&self, _: &HttpClient, query: &ListingsQuery) -> Result<Listings, FetchError> {
        debug!("Reading listings from {}", self.path);
        let raw: Value = coinboard_util::read_json(&self.path)
            .await
            .map_err(|source| FetchError::File {
                path: self.path.clone(),
                source,
            })?;
        let mut listings = normalize(&raw, query.currency)?;
        listings.truncate(query.limit);
        Ok(listings)
    }
}

/// Either listings source, picked at runtime.
pub enum ListingsSource {
    Api(CoinMarketCap),
    File(ListingsFile),
}

#[async_trait]
impl Http<Listings> for ListingsSource {
    type Query = ListingsQuery;

    async fn fetch(
        &self,
        http_client: &HttpClient,
        query: &ListingsQuery,
    ) -> Result<Listings, FetchError> {
        match self {
            ListingsSource::Api(api) => api.fetch(http_client, query).await,
            ListingsSource::File(file) => file.fetch(http_client, query).await,
        }
    }
}

impl ListingsSource {
    /// A saved response at `path` if given, otherwise the live API.
    pub fn new(config: &Config, path: Option<&str>) -> Self {
        match path {
            Some(path) => ListingsSource::File(ListingsFile::new(path)),
            None => ListingsSource::Api(CoinMarketCap::from_config(config)),
        }
    }
}

///////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Transformation
//
///////////////////////////////////////////////////////////////////////////////////////////////////////

/// One coin's current snapshot, denominated in [`Listings::currency`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Listing {
    #[serde(rename = "coin_name")]
    pub name: String,
    #[serde(rename = "coin_symbol")]
    pub symbol: String,
    pub market_cap: f64,
    pub percent_change_1h: f64,
    pub percent_change_24h: f64,
    pub percent_change_7d: f64,
    pub price: f64,
    pub volume_24h: f64,
}

impl Listing {
    pub fn percent_change(&self, window: Window) -> f64 {
        match window {
            Window::Hours1 => self.percent_change_1h,
            Window::Hours24 => self.percent_change_24h,
            Window::Days7 => self.percent_change_7d,
        }
    }
}

/// Flattened listings, in the provider's rank order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Listings {
    pub currency: Currency,
    pub rows: Vec<Listing>,
}

impl Listings {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn truncate(&mut self, limit: usize) {
        self.rows.truncate(limit);
    }

    pub fn get(&self, symbol: &str) -> Option<&Listing> {
        self.rows.iter().find(|row| row.symbol == symbol)
    }

    /// Every symbol, sorted alphabetically.
    pub fn sorted_symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.rows.iter().map(|row| row.symbol.clone()).collect();
        symbols.sort();
        symbols
    }

    pub fn total_market_cap(&self) -> f64 {
        self.rows.iter().map(|row| row.market_cap).sum()
    }
}

/// Flatten a raw listings response into [`Listings`].
///
/// Every number is read from `quote.<currency>`; a single record missing any field (or holding
/// `null` in it) fails the whole response, as does a negative market cap, price or volume.
///
/// ```json
/// {
///     "data": [
///         {
///             "name": "Bitcoin",
///             "symbol": "BTC",
///             "quote": {
///                 "USD": {
///                     "price": 30000.0,
///                     "volume_24h": 1000000000.0,
///                     "percent_change_1h": 0.1,
///                     "percent_change_24h": -1.2,
///                     "percent_change_7d": 3.2,
///                     "market_cap": 600000000000.0
///                 }
///             }
///         },
///         // ...
///     ]
/// }
/// ```
pub fn normalize(raw: &Value, currency: Currency) -> Result<Listings, NormalizeError> {
    let data = ListingsResponse::deserialize(raw)?
        .data
        .ok_or(NormalizeError::MissingData)?;

    let mut seen = HashSet::with_capacity(data.len());
    let mut rows = Vec::with_capacity(data.len());
    for (index, record) in data.into_iter().enumerate() {
        let row = record.flatten(index, currency)?;
        if !seen.insert(row.symbol.clone()) {
            warn!("duplicate symbol {} in listings; keeping the first", row.symbol);
            continue;
        }
        rows.push(row);
    }

    Ok(Listings { currency, rows })
}

///////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Deserialization
//
///////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Deserialize)]
pub struct ListingsResponse {
    pub data: Option<Vec<CoinRecord>>,
}

#[derive(Debug, Deserialize)]
pub struct CoinRecord {
    pub name: Option<String>,
    pub symbol: Option<String>,
    /// One quote per requested currency code.
    #[serde(default)]
    pub quote: HashMap<String, Quote>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Quote {
    pub price: Option<f64>,
    pub volume_24h: Option<f64>,
    pub percent_change_1h: Option<f64>,
    pub percent_change_24h: Option<f64>,
    pub percent_change_7d: Option<f64>,
    pub market_cap: Option<f64>,
}

impl CoinRecord {
    fn flatten(self, index: usize, currency: Currency) -> Result<Listing, NormalizeError> {
        let quote = QuoteFields {
            quote: self.quote.get(currency.code()),
            index,
            currency,
        };

        Ok(Listing {
            name: self.name.ok_or_else(|| missing(index, "name".to_string()))?,
            symbol: self
                .symbol
                .ok_or_else(|| missing(index, "symbol".to_string()))?,
            market_cap: quote.amount("market_cap", |q| q.market_cap)?,
            percent_change_1h: quote.number("percent_change_1h", |q| q.percent_change_1h)?,
            percent_change_24h: quote.number("percent_change_24h", |q| q.percent_change_24h)?,
            percent_change_7d: quote.number("percent_change_7d", |q| q.percent_change_7d)?,
            price: quote.amount("price", |q| q.price)?,
            volume_24h: quote.amount("volume_24h", |q| q.volume_24h)?,
        })
    }
}

/// One record's quote in the requested currency, if present.
struct QuoteFields<'a> {
    quote: Option<&'a Quote>,
    index: usize,
    currency: Currency,
}

impl QuoteFields<'_> {
    fn path(&self, field: &str) -> String {
        format!("quote.{}.{field}", self.currency)
    }

    fn number(&self, field: &str, pick: fn(&Quote) -> Option<f64>) -> Result<f64, NormalizeError> {
        self.quote
            .and_then(pick)
            .ok_or_else(|| missing(self.index, self.path(field)))
    }

    /// Market cap, price & volume are never negative.
    fn amount(&self, field: &str, pick: fn(&Quote) -> Option<f64>) -> Result<f64, NormalizeError> {
        let value = self.number(field, pick)?;
        if value < 0.0 {
            return Err(NormalizeError::Negative {
                index: self.index,
                field: self.path(field),
            });
        }
        Ok(value)
    }
}

fn missing(index: usize, field: String) -> NormalizeError {
    NormalizeError::MissingField { index, field }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(name: &str, symbol: &str, currency: &str, market_cap: f64) -> Value {
        json!({
            "id": 1,
            "name": name,
            "symbol": symbol,
            "cmc_rank": 1,
            "quote": {
                currency: {
                    "price": 10.0,
                    "volume_24h": 20.0,
                    "percent_change_1h": 0.5,
                    "percent_change_24h": -1.5,
                    "percent_change_7d": 3.2,
                    "market_cap": market_cap,
                    "last_updated": "2024-01-01T00:00:00.000Z"
                }
            }
        })
    }

    #[test]
    fn one_row_per_record() {
        let raw = json!({
            "status": { "error_code": 0 },
            "data": [
                record("Bitcoin", "BTC", "USD", 600.0),
                record("Ethereum", "ETH", "USD", 200.0),
                record("Cardano", "ADA", "USD", 50.0),
            ]
        });

        let listings = normalize(&raw, Currency::Usd).unwrap();
        assert_eq!(listings.len(), 3);
        assert_eq!(listings.currency, Currency::Usd);
        assert_eq!(
            listings.rows[0],
            Listing {
                name: "Bitcoin".to_string(),
                symbol: "BTC".to_string(),
                market_cap: 600.0,
                percent_change_1h: 0.5,
                percent_change_24h: -1.5,
                percent_change_7d: 3.2,
                price: 10.0,
                volume_24h: 20.0,
            }
        );
        assert_eq!(listings.sorted_symbols(), vec!["ADA", "BTC", "ETH"]);
        assert_eq!(listings.total_market_cap(), 850.0);
    }

    #[test]
    fn serialized_columns_follow_table_order() {
        let raw = json!({ "data": [record("Bitcoin", "BTC", "USD", 600.0)] });
        let listings = normalize(&raw, Currency::Usd).unwrap();

        let row = serde_json::to_string(&listings.rows[0]).unwrap();
        let mut last = 0;
        for column in crate::schema::crypto::index::LISTINGS_COLUMNS {
            let at = row.find(&format!("\"{column}\"")).unwrap();
            assert!(at >= last, "{column} out of order in {row}");
            last = at;
        }
    }

    #[test]
    fn reads_the_requested_currency() {
        let raw = json!({ "data": [record("Ethereum", "ETH", "BTC", 0.05)] });
        let listings = normalize(&raw, Currency::Btc).unwrap();
        assert_eq!(listings.rows[0].market_cap, 0.05);

        let err = normalize(&raw, Currency::Usd).unwrap_err();
        assert_eq!(
            err,
            NormalizeError::MissingField {
                index: 0,
                field: "quote.USD.market_cap".to_string()
            }
        );
    }

    #[test]
    fn one_missing_field_fails_everything() {
        let mut broken = record("Ethereum", "ETH", "USD", 200.0);
        broken["quote"]["USD"]
            .as_object_mut()
            .unwrap()
            .remove("volume_24h");
        let raw = json!({ "data": [record("Bitcoin", "BTC", "USD", 600.0), broken] });

        let err = normalize(&raw, Currency::Usd).unwrap_err();
        assert_eq!(
            err,
            NormalizeError::MissingField {
                index: 1,
                field: "quote.USD.volume_24h".to_string()
            }
        );
    }

    #[test]
    fn null_counts_as_missing() {
        let mut broken = record("Bitcoin", "BTC", "USD", 600.0);
        broken["quote"]["USD"]["price"] = Value::Null;
        let raw = json!({ "data": [broken] });
        assert!(normalize(&raw, Currency::Usd).is_err());
    }

    #[test]
    fn missing_data_key() {
        let raw = json!({ "status": { "error_code": 1002, "error_message": "API key missing." } });
        assert_eq!(
            normalize(&raw, Currency::Usd),
            Err(NormalizeError::MissingData)
        );
    }

    #[test]
    fn duplicate_symbols_keep_the_first() {
        let raw = json!({
            "data": [
                record("Bitcoin", "BTC", "USD", 600.0),
                record("Bitcoin Impostor", "BTC", "USD", 1.0),
            ]
        });
        let listings = normalize(&raw, Currency::Usd).unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings.rows[0].name, "Bitcoin");
    }

    #[test]
    fn empty_data_is_an_empty_table() {
        let listings = normalize(&json!({ "data": [] }), Currency::Usd).unwrap();
        assert!(listings.is_empty());
    }

    #[test]
    fn negative_amounts_fail_everything() {
        let raw = json!({
            "data": [
                record("Bitcoin", "BTC", "USD", 600.0),
                record("Ethereum", "ETH", "USD", 200.0),
                record("Cardano", "ADA", "USD", -300.0),
            ]
        });
        assert_eq!(
            normalize(&raw, Currency::Usd),
            Err(NormalizeError::Negative {
                index: 2,
                field: "quote.USD.market_cap".to_string()
            })
        );

        let mut cheap = record("Dogecoin", "DOGE", "USD", 10.0);
        cheap["quote"]["USD"]["price"] = json!(-0.01);
        assert!(matches!(
            normalize(&json!({ "data": [cheap] }), Currency::Usd),
            Err(NormalizeError::Negative { .. })
        ));
    }

    #[test]
    fn negative_percent_changes_are_fine() {
        let mut falling = record("Dogecoin", "DOGE", "USD", 10.0);
        falling["quote"]["USD"]["percent_change_7d"] = json!(-42.0);
        let listings = normalize(&json!({ "data": [falling] }), Currency::Usd).unwrap();
        assert_eq!(listings.rows[0].percent_change_7d, -42.0);
    }

    #[test]
    fn data_must_be_an_array() {
        let raw = json!({ "data": { "BTC": {} } });
        assert!(matches!(
            normalize(&raw, Currency::Usd),
            Err(NormalizeError::Json(_))
        ));
    }
}
