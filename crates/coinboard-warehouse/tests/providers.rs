//! HTTP behaviour of the CoinMarketCap & Yahoo Finance sources, against a local mock server.

use chrono::NaiveDate;
use coinboard_warehouse::api::{Http, HttpClient};
use coinboard_warehouse::schema::crypto::history::{DateWindow, HistoryQuery, YahooFinance};
use coinboard_warehouse::schema::crypto::index::Currency;
use coinboard_warehouse::schema::crypto::listings::{CoinMarketCap, ListingsQuery};
use coinboard_warehouse::{FetchError, NormalizeError};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LISTINGS_PATH: &str = "/v1/cryptocurrency/listings/latest";

fn record(name: &str, symbol: &str, market_cap: f64) -> Value {
    json!({
        "name": name,
        "symbol": symbol,
        "quote": {
            "USD": {
                "price": 1.5,
                "volume_24h": 1000.0,
                "percent_change_1h": 0.1,
                "percent_change_24h": -0.2,
                "percent_change_7d": 3.2,
                "market_cap": market_cap
            }
        }
    })
}

fn usd_query(limit: usize) -> ListingsQuery {
    ListingsQuery {
        currency: Currency::Usd,
        limit,
    }
}

mod coinmarketcap {
    use super::*;

    #[tokio::test]
    async fn sends_key_limit_and_currency() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(LISTINGS_PATH))
            .and(header("X-CMC_PRO_API_KEY", "test-key"))
            .and(header("Accepts", "application/json"))
            .and(query_param("limit", "100"))
            .and(query_param("convert", "USD"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": { "error_code": 0 },
                "data": [record("Bitcoin", "BTC", 600.0), record("Ethereum", "ETH", 200.0)]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let source = CoinMarketCap::new(server.uri(), Some("test-key".to_string()));
        let listings = source
            .fetch(&HttpClient::new(), &usd_query(100))
            .await
            .unwrap();

        assert_eq!(listings.len(), 2);
        assert_eq!(listings.rows[1].symbol, "ETH");
        assert_eq!(listings.rows[1].market_cap, 200.0);
    }

    #[tokio::test]
    async fn truncates_to_the_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(LISTINGS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    record("Bitcoin", "BTC", 600.0),
                    record("Ethereum", "ETH", 200.0),
                    record("Cardano", "ADA", 100.0)
                ]
            })))
            .mount(&server)
            .await;

        let source = CoinMarketCap::new(server.uri(), Some("test-key".to_string()));
        let listings = source
            .fetch(&HttpClient::new(), &usd_query(2))
            .await
            .unwrap();
        assert_eq!(listings.len(), 2);
    }

    #[tokio::test]
    async fn missing_key_never_calls_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let source = CoinMarketCap::new(server.uri(), None);
        let err = source
            .fetch(&HttpClient::new(), &usd_query(100))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::MissingCredential("CMC_API_KEY")));
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(LISTINGS_PATH))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "status": { "error_code": 1001, "error_message": "This API Key is invalid." }
            })))
            .mount(&server)
            .await;

        let source = CoinMarketCap::new(server.uri(), Some("bad-key".to_string()));
        let err = source
            .fetch(&HttpClient::new(), &usd_query(100))
            .await
            .unwrap_err();
        match err {
            FetchError::Status { status, .. } => assert_eq!(status.as_u16(), 401),
            other => panic!("expected a status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_record_fails_the_whole_response() {
        let mut broken = record("Ethereum", "ETH", 200.0);
        broken["quote"]["USD"]
            .as_object_mut()
            .unwrap()
            .remove("percent_change_7d");

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(LISTINGS_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "data": [record("Bitcoin", "BTC", 600.0), broken] })),
            )
            .mount(&server)
            .await;

        let source = CoinMarketCap::new(server.uri(), Some("test-key".to_string()));
        let err = source
            .fetch(&HttpClient::new(), &usd_query(100))
            .await
            .unwrap_err();
        match err {
            FetchError::Payload(NormalizeError::MissingField { index, field }) => {
                assert_eq!(index, 1);
                assert_eq!(field, "quote.USD.percent_change_7d");
            }
            other => panic!("expected a payload error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_body_is_a_payload_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(LISTINGS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let source = CoinMarketCap::new(server.uri(), Some("test-key".to_string()));
        let err = source
            .fetch(&HttpClient::new(), &usd_query(100))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Payload(NormalizeError::Json(_))));
    }
}

mod yahoo_finance {
    use super::*;

    fn query(symbol: &str) -> HistoryQuery {
        HistoryQuery {
            symbol: symbol.to_string(),
            currency: Currency::Usd,
            window: DateWindow::trailing(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(), 30),
        }
    }

    #[tokio::test]
    async fn daily_closes_for_the_window() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/BTC-USD"))
            .and(query_param("interval", "1d"))
            .and(query_param("period1", "1704067200")) // 2024-01-01
            .and(query_param("period2", "1706659200")) // 2024-01-31
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "chart": {
                    "result": [{
                        "meta": { "symbol": "BTC-USD", "currency": "USD" },
                        "timestamp": [1704067200, 1704153600, 1704240000],
                        "indicators": {
                            "quote": [{
                                "open": [42280.2, 44187.1, 44961.6],
                                "close": [44167.3, 44957.9, null],
                                "volume": [18426978443_i64, 39335274536_i64, null]
                            }]
                        }
                    }],
                    "error": null
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let source = YahooFinance::new(server.uri());
        let series = source
            .fetch(&HttpClient::new(), &query("btc"))
            .await
            .unwrap();

        assert_eq!(series.ticker, "BTC-USD");
        let closes: Vec<(String, f64)> = series
            .points
            .iter()
            .map(|point| (point.date.to_string(), point.close))
            .collect();
        assert_eq!(
            closes,
            vec![
                ("2024-01-01".to_string(), 44167.3),
                ("2024-01-02".to_string(), 44957.9)
            ]
        );
    }

    #[tokio::test]
    async fn not_found_is_an_unknown_ticker() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/NOPE-USD"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "chart": {
                    "result": null,
                    "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
                }
            })))
            .mount(&server)
            .await;

        let source = YahooFinance::new(server.uri());
        let err = source
            .fetch(&HttpClient::new(), &query("NOPE"))
            .await
            .unwrap_err();
        match err {
            FetchError::UnknownTicker { ticker } => assert_eq!(ticker, "NOPE-USD"),
            other => panic!("expected an unknown ticker, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_series_is_an_unknown_ticker() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/NEW-USD"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "chart": {
                    "result": [{ "meta": {}, "indicators": { "quote": [{}] } }],
                    "error": null
                }
            })))
            .mount(&server)
            .await;

        let source = YahooFinance::new(server.uri());
        let err = source
            .fetch(&HttpClient::new(), &query("NEW"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::UnknownTicker { .. }));
    }

    #[tokio::test]
    async fn server_errors_are_status_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let source = YahooFinance::new(server.uri());
        let err = source
            .fetch(&HttpClient::new(), &query("BTC"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { .. }));
    }
}

mod listings_file {
    use super::*;
    use coinboard_warehouse::schema::crypto::listings::{ListingsFile, ListingsSource};
    use coinboard_warehouse::Config;

    #[tokio::test]
    async fn saved_response_is_normalized_like_a_live_one() {
        let path = std::env::temp_dir().join("coinboard_saved_listings.json");
        let body = json!({
            "data": [
                record("Bitcoin", "BTC", 600.0),
                record("Ethereum", "ETH", 200.0),
                record("Cardano", "ADA", 100.0)
            ]
        });
        tokio::fs::write(&path, body.to_string()).await.unwrap();

        let config = Config::default();
        let source = ListingsSource::new(&config, path.to_str());
        let listings = source
            .fetch(&HttpClient::new(), &usd_query(2))
            .await
            .unwrap();

        let symbols: Vec<&str> = listings.rows.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["BTC", "ETH"]);
        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn missing_file_is_a_file_error() {
        let source = ListingsFile::new("does/not/exist.json");
        let err = source
            .fetch(&HttpClient::new(), &usd_query(100))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::File { .. }), "{err:?}");
    }
}
