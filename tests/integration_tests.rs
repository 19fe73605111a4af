use chrono::NaiveDate;
use httpmock::prelude::*;
use tempfile::TempDir;
use weekend_fares::utils::validation::Validate;
use weekend_fares::{build_pipeline, AppConfig, SearchEngine};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
}

fn ryanair_config(base_url: &str, output_path: &str) -> AppConfig {
    let toml = format!(
        r#"
[search]
origins = ["BCN"]
first_friday = "2026-03-27"
count = 1

[filter]
europe_price_ceiling = 50
world_price_ceiling = 150

[providers.ryanair]
base_url = "{}"

[output]
path = "{}"
formats = ["txt", "csv", "json"]
"#,
        base_url,
        output_path.replace('\\', "/")
    );
    let config = AppConfig::from_toml_str(&toml).unwrap();
    config.validate().unwrap();
    config
}

fn fare(price: f64, destination: &str, country: &str) -> serde_json::Value {
    serde_json::json!({
        "outbound": {
            "departureAirport": {"iataCode": "BCN", "countryCode": "es"},
            "arrivalAirport": {"iataCode": destination, "countryCode": country},
            "departureDate": "2026-03-27T07:00:00",
            "arrivalDate": "2026-03-27T09:30:00",
            "price": {"value": price, "currencyCode": "EUR"}
        }
    })
}

#[tokio::test]
async fn test_end_to_end_weekend_search() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/farfnd/3/oneWayFares")
            .query_param("departureAirportIataCode", "BCN")
            .query_param("outboundDepartureDateFrom", "2026-03-27");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({
                "fares": [fare(120.0, "JFK", "us"), fare(60.0, "SVQ", "es"), fare(40.0, "MAD", "es")]
            }));
    });

    let config = ryanair_config(&server.base_url(), &output_path);
    let pipeline = build_pipeline(&config, today()).unwrap();
    let summary = SearchEngine::new(pipeline).run().await.unwrap();

    api_mock.assert();
    assert_eq!(summary.ranges_searched, 1);
    assert_eq!(summary.requests, 1);
    assert_eq!(summary.raw_offers, 3);
    assert_eq!(summary.matches, 2);
    assert!(summary.notified);

    let csv = std::fs::read_to_string(temp_dir.path().join("weekend_fares.csv")).unwrap();
    let rows: Vec<&str> = csv.lines().skip(1).collect();
    assert_eq!(rows.len(), 2);
    assert!(rows[0].starts_with("BCN,MAD,ES,2026-03-27,2026-03-30,40.00,150,ryanair,"));
    assert!(rows[1].starts_with("BCN,JFK,US,2026-03-27,2026-03-30,120.00,150,ryanair,"));

    let txt = std::fs::read_to_string(temp_dir.path().join("weekend_fares.txt")).unwrap();
    assert!(txt.contains("BCN → MAD | 2026-03-27 - 2026-03-30 | 40.00€"));
    assert!(!txt.contains("SVQ"));

    let json: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(temp_dir.path().join("weekend_fares.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(json["offers"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_no_matches_skips_notification() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/farfnd/3/oneWayFares");
        then.status(200).json_body(serde_json::json!({
            "fares": [fare(75.0, "SVQ", "es"), fare(300.0, "JFK", "us"), {"outbound": {}}]
        }));
    });

    let config = ryanair_config(&server.base_url(), &output_path);
    let pipeline = build_pipeline(&config, today()).unwrap();
    let summary = SearchEngine::new(pipeline).run().await.unwrap();

    assert_eq!(summary.raw_offers, 3);
    assert_eq!(summary.matches, 0);
    assert!(!summary.notified);
    assert!(!temp_dir.path().join("weekend_fares.csv").exists());
}

#[tokio::test]
async fn test_rate_limited_provider_is_not_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/api/farfnd/3/oneWayFares");
        then.status(429);
    });

    let config = ryanair_config(&server.base_url(), &output_path);
    let pipeline = build_pipeline(&config, today()).unwrap();
    let summary = SearchEngine::new(pipeline).run().await.unwrap();

    // not retried within the run
    api_mock.assert_hits(1);
    assert_eq!(summary.raw_offers, 0);
    assert!(!summary.notified);
}
