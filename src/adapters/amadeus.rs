//! Amadeus self-service API: OAuth2 client-credentials token exchange and
//! flight-offers search. Offers come back as `itineraries → segments` with
//! ISO-8601 segment durations. Segments only name the arrival airport; its
//! country lives in the response's `dictionaries.locations`, which is copied
//! into every offer payload.
//!
//! Flight-offers requires a destination, so one is configured per source.

use crate::adapters::http::{offers_at, read_body};
use crate::domain::model::{AuthToken, ProviderKind, RawOffer, SearchOutcome, SearchQuery};
use crate::domain::ports::{OfferSource, TokenProvider};
use crate::utils::error::{FareError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

pub const DEFAULT_BASE_URL: &str = "https://test.api.amadeus.com";
pub const DEFAULT_MAX_RESULTS: u32 = 50;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

pub struct AmadeusAuth {
    client: Client,
    base_url: String,
    client_id: String,
    client_secret: String,
}

impl AmadeusAuth {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for AmadeusAuth {
    async fn fetch_token(&self) -> Result<AuthToken> {
        let url = format!("{}/v1/security/oauth2/token", self.base_url);
        let response = self
            .client
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| FareError::AuthenticationError {
                message: format!("token request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FareError::AuthenticationError {
                message: format!("token endpoint returned HTTP {}: {}", status, body),
            });
        }

        let token: TokenResponse =
            response
                .json()
                .await
                .map_err(|e| FareError::AuthenticationError {
                    message: format!("unreadable token response: {}", e),
                })?;

        tracing::debug!("Access token obtained (expires in {:?}s)", token.expires_in);
        Ok(AuthToken(token.access_token))
    }
}

pub struct AmadeusSource {
    client: Client,
    base_url: String,
    destination: String,
    max_results: u32,
}

impl AmadeusSource {
    pub fn new(client: Client, base_url: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            destination: destination.into().trim().to_ascii_uppercase(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }
}

#[async_trait]
impl OfferSource for AmadeusSource {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Amadeus
    }

    fn requires_auth(&self) -> bool {
        true
    }

    async fn search(&self, query: &SearchQuery, token: Option<&AuthToken>) -> SearchOutcome {
        let Some(token) = token else {
            return SearchOutcome::TransportError("missing bearer token".to_string());
        };

        let url = format!("{}/v2/shopping/flight-offers", self.base_url);
        let params = [
            ("originLocationCode", query.origin.clone()),
            ("destinationLocationCode", self.destination.clone()),
            (
                "departureDate",
                query.range.departure().format("%Y-%m-%d").to_string(),
            ),
            (
                "returnDate",
                query.range.return_date().format("%Y-%m-%d").to_string(),
            ),
            ("adults", "1".to_string()),
            ("currencyCode", "EUR".to_string()),
            ("max", self.max_results.to_string()),
        ];

        let response = self
            .client
            .get(&url)
            .bearer_auth(&token.0)
            .query(&params)
            .send()
            .await;

        let body = match read_body(ProviderKind::Amadeus, response).await {
            Ok(body) => body,
            Err(outcome) => return outcome,
        };
        SearchOutcome::Offers(with_locations(&body))
    }
}

/// Offers under `data`, each carrying the response's location dictionary.
fn with_locations(body: &Value) -> Vec<RawOffer> {
    let mut offers = offers_at(ProviderKind::Amadeus, body, "data");
    let Some(locations) = body.pointer("/dictionaries/locations") else {
        return offers;
    };

    for offer in &mut offers {
        if let Some(payload) = offer.payload.as_object_mut() {
            payload
                .entry("dictionaries")
                .or_insert_with(|| json!({"locations": locations}));
        }
    }
    offers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::DateRange;
    use chrono::NaiveDate;
    use httpmock::prelude::*;

    fn query() -> SearchQuery {
        SearchQuery {
            origin: "BCN".to_string(),
            range: DateRange::new(
                NaiveDate::from_ymd_opt(2026, 3, 28).unwrap(),
                NaiveDate::from_ymd_opt(2026, 4, 2).unwrap(),
            )
            .unwrap(),
        }
    }

    #[tokio::test]
    async fn test_fetch_token() {
        let server = MockServer::start();
        let token_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/security/oauth2/token")
                .x_www_form_urlencoded_tuple("grant_type", "client_credentials")
                .x_www_form_urlencoded_tuple("client_id", "id-123");
            then.status(200).json_body(serde_json::json!({
                "type": "amadeusOAuth2Token",
                "access_token": "abc",
                "expires_in": 1799
            }));
        });

        let auth = AmadeusAuth::new(Client::new(), server.base_url(), "id-123", "secret");
        let token = auth.fetch_token().await.unwrap();

        token_mock.assert();
        assert_eq!(token.0, "abc");
    }

    #[tokio::test]
    async fn test_fetch_token_rejected() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/security/oauth2/token");
            then.status(401).body(r#"{"error":"invalid_client"}"#);
        });

        let auth = AmadeusAuth::new(Client::new(), server.base_url(), "id", "wrong");
        let err = auth.fetch_token().await.unwrap_err();
        assert!(matches!(err, FareError::AuthenticationError { .. }));
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_search_sends_bearer_and_dates() {
        let server = MockServer::start();
        let search_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/v2/shopping/flight-offers")
                .header("Authorization", "Bearer abc")
                .query_param("originLocationCode", "BCN")
                .query_param("departureDate", "2026-03-28")
                .query_param("returnDate", "2026-04-02")
                .query_param("destinationLocationCode", "LIS");
            then.status(200).json_body(serde_json::json!({
                "data": [{"id": "1", "price": {"total": "80.00"}}]
            }));
        });

        let source = AmadeusSource::new(Client::new(), server.base_url(), "lis");
        let outcome = source
            .search(&query(), Some(&AuthToken("abc".to_string())))
            .await;

        search_mock.assert();
        match outcome {
            SearchOutcome::Offers(offers) => assert_eq!(offers.len(), 1),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_search_attaches_location_dictionary() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v2/shopping/flight-offers");
            then.status(200).json_body(serde_json::json!({
                "meta": {"count": 1},
                "data": [{
                    "type": "flight-offer",
                    "id": "1",
                    "price": {"currency": "EUR", "total": "120.00", "grandTotal": "120.00"},
                    "itineraries": [{
                        "duration": "PT1H55M",
                        "segments": [{
                            "departure": {"iataCode": "BCN", "terminal": "1", "at": "2026-03-28T07:00:00"},
                            "arrival": {"iataCode": "LIS", "terminal": "1", "at": "2026-03-28T07:55:00"},
                            "duration": "PT1H55M"
                        }]
                    }]
                }],
                "dictionaries": {
                    "locations": {
                        "BCN": {"cityCode": "BCN", "countryCode": "ES"},
                        "LIS": {"cityCode": "LIS", "countryCode": "PT"}
                    }
                }
            }));
        });

        let source = AmadeusSource::new(Client::new(), server.base_url(), "LIS");
        let outcome = source
            .search(&query(), Some(&AuthToken("abc".to_string())))
            .await;

        let offers = match outcome {
            SearchOutcome::Offers(offers) => offers,
            other => panic!("unexpected outcome: {:?}", other),
        };
        assert_eq!(offers.len(), 1);
        assert_eq!(
            offers[0].payload.pointer("/dictionaries/locations/LIS/countryCode"),
            Some(&serde_json::json!("PT"))
        );
    }

    #[tokio::test]
    async fn test_search_without_token_is_a_fault() {
        let source = AmadeusSource::new(Client::new(), "http://127.0.0.1:9", "LIS");
        assert!(matches!(
            source.search(&query(), None).await,
            SearchOutcome::TransportError(_)
        ));
    }
}
