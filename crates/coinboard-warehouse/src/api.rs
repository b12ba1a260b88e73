use crate::config::Config;
use crate::error::FetchError;
use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use std::fmt::Debug;
use std::time::Duration;
use tracing::{error, trace};

pub use reqwest::Client as HttpClient;

/// Fetch framework.
///
/// Every data source (CoinMarketCap listings, Yahoo Finance history, a listings file on disk) is a
/// type implementing [`Http`] for the data type `T` it produces; the dashboard only ever talks to
/// sources through this trait, so any of them can be swapped out.
#[async_trait]
pub trait Http<T>
where
    T: Debug + Send + Sync,
{
    /// Every input that affects the result; doubles as the cache key.
    type Query: Debug + Send + Sync;

    /// How the data type `T` is fetched (& transformed) from the source.
    async fn fetch(&self, http_client: &HttpClient, query: &Self::Query) -> Result<T, FetchError>;
}

/// Build the shared HTTP client from the config.
pub fn build_client(config: &Config) -> anyhow::Result<HttpClient> {
    let client = reqwest::ClientBuilder::new()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(10))
        .build()?;
    Ok(client)
}

/// Send a request and collect the status & body; interpreting the status is left to the caller.
pub(crate) async fn send(
    request: RequestBuilder,
    url: &str,
) -> Result<(StatusCode, Vec<u8>), FetchError> {
    let response = request.send().await.map_err(|e| {
        error!("failed fetching response from {url}");
        FetchError::Network {
            url: url.to_string(),
            source: e,
        }
    })?;

    let status = response.status();
    let body = response.bytes().await.map_err(|e| {
        error!("failed reading response body from {url}");
        FetchError::Network {
            url: url.to_string(),
            source: e,
        }
    })?;
    trace!("{url} responded {status} with {} bytes", body.len());

    Ok((status, body.to_vec()))
}
