//! HTTP fetcher and cache integration tests against a mock chart API

use chrono::NaiveDate;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use macd_backtest::data::{read_csv, DataFetcher, FetchRequest, YahooClient};
use macd_backtest::Error;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn request() -> FetchRequest {
    FetchRequest::new("AAPL", date(2024, 1, 1), date(2024, 1, 6), "1d").unwrap()
}

fn client(server: &MockServer) -> YahooClient {
    YahooClient::with_client(server.uri(), reqwest::Client::new())
}

fn chart_body() -> serde_json::Value {
    // 2024-01-02 .. 2024-01-05 14:30 UTC, New York offset
    serde_json::json!({
        "chart": {
            "result": [{
                "meta": {"symbol": "AAPL", "gmtoffset": -18000},
                "timestamp": [1704205800, 1704292200, 1704378600, 1704465000],
                "indicators": {"quote": [{
                    "open":   [187.15, 184.22, null,   181.99],
                    "high":   [188.44, 185.88, 183.09, 182.76],
                    "low":    [183.89, 183.43, 180.88, 180.17],
                    "close":  [185.64, 184.25, 181.91, 181.18],
                    "volume": [82488700, 58414500, 71983600, 62303300]
                }]}
            }],
            "error": null
        }
    })
}

async fn mount_chart(server: &MockServer, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/AAPL"))
        .and(query_param("interval", "1d"))
        .and(query_param("period1", "1704067200"))
        .and(query_param("period2", "1704499200"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chart_body()))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetch_bars_parses_and_cleans() {
    let server = MockServer::start().await;
    mount_chart(&server, 1).await;

    let series = client(&server).fetch_bars(&request()).await.unwrap();

    // the bar with a null open is dropped
    assert_eq!(series.len(), 3);
    assert_eq!(series.first_date(), Some(date(2024, 1, 2)));
    assert_eq!(series.last_date(), Some(date(2024, 1, 5)));
    assert_eq!(series.closes(), vec![185.64, 184.25, 181.18]);
}

#[tokio::test]
async fn test_api_error_object() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/NOPE"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "chart": {
                "result": null,
                "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}
            }
        })))
        .mount(&server)
        .await;

    let req = FetchRequest::new("NOPE", date(2024, 1, 1), date(2024, 2, 1), "1d").unwrap();
    match client(&server).fetch_bars(&req).await {
        Err(Error::Fetch { symbol, message }) => {
            assert_eq!(symbol, "NOPE");
            assert!(message.contains("Not Found"));
        }
        other => panic!("expected fetch error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_http_status_without_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    match client(&server).fetch_bars(&request()).await {
        Err(Error::Fetch { message, .. }) => assert!(message.contains("500")),
        other => panic!("expected fetch error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_result_is_no_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "chart": {"result": [], "error": null}
        })))
        .mount(&server)
        .await;

    assert!(matches!(
        client(&server).fetch_bars(&request()).await,
        Err(Error::NoData(_))
    ));
}

#[tokio::test]
async fn test_fetcher_writes_and_reuses_cache() {
    let server = MockServer::start().await;
    // second fetch must come from disk
    mount_chart(&server, 1).await;

    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    let fetcher = DataFetcher::new(&data_dir, client(&server));
    let req = request();

    let fetched = fetcher.fetch(&req, false).await.unwrap();
    let cache = fetcher.cache_path(&req);
    assert_eq!(cache, data_dir.join("AAPL_2024-01-01_2024-01-06_1d.csv"));
    assert!(cache.exists());

    let cached = fetcher.fetch(&req, false).await.unwrap();
    assert_eq!(cached, fetched);
    assert_eq!(read_csv(&cache, "AAPL").unwrap(), fetched);
}

#[tokio::test]
async fn test_refresh_bypasses_cache() {
    let server = MockServer::start().await;
    mount_chart(&server, 2).await;

    let dir = tempfile::tempdir().unwrap();
    let fetcher = DataFetcher::new(dir.path(), client(&server));
    let req = request();

    fetcher.fetch(&req, false).await.unwrap();
    fetcher.fetch(&req, true).await.unwrap();
}
