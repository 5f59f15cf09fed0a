//! Integration tests for the city table load path: remote fetch first,
//! bundled fallback second, fatal error when both are gone.

use std::path::PathBuf;

use tenki_core::{CityTable, Config, WeatherError};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

const TABLE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:ldWeather="http://weather.livedoor.com/ns/rss/2.0">
  <channel>
    <ldWeather:source>
      <pref title="青森県">
        <city title="青森" id="020010" source="http://example.com/area/2.xml"/>
      </pref>
    </ldWeather:source>
  </channel>
</rss>"#;

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/primary_area.xml")
}

fn http() -> reqwest::Client {
    reqwest::Client::new()
}

#[tokio::test]
async fn remote_table_is_preferred() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(TABLE_XML, "application/xml"))
        .mount(&server)
        .await;

    let config = Config {
        city_table_url: server.uri(),
        // Deliberately broken so a silent fallback would be caught.
        city_table_fallback: PathBuf::from("/nonexistent/primary_area.xml"),
        ..Config::default()
    };

    let table = CityTable::load(&config, &http()).await.expect("remote table loads");
    assert_eq!(table.resolve("青森").expect("青森 is in the table"), "020010");
}

#[tokio::test]
async fn failing_remote_falls_back_to_local_file() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let config = Config {
        city_table_url: server.uri(),
        city_table_fallback: fixture_path(),
        ..Config::default()
    };

    let table = CityTable::load(&config, &http()).await.expect("fallback table loads");
    assert_eq!(table.resolve("大津").expect("大津 is in the fallback"), "250010");
}

#[tokio::test]
async fn unparseable_remote_body_falls_back_too() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<rss><city title=", "application/xml"))
        .mount(&server)
        .await;

    let config = Config {
        city_table_url: server.uri(),
        city_table_fallback: fixture_path(),
        ..Config::default()
    };

    let table = CityTable::load(&config, &http()).await.expect("fallback table loads");
    assert!(!table.is_empty());
}

#[tokio::test]
async fn both_sources_failing_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let config = Config {
        city_table_url: server.uri(),
        city_table_fallback: PathBuf::from("/nonexistent/primary_area.xml"),
        ..Config::default()
    };

    let err = CityTable::load(&config, &http()).await.unwrap_err();
    assert!(matches!(err, WeatherError::ConfigUnavailable));
    assert_eq!(
        err.to_string(),
        "Could not load configuration from weather service nor backup file."
    );
}
