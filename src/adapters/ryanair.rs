use crate::adapters::http::into_outcome;
use crate::domain::model::{AuthToken, ProviderKind, SearchOutcome, SearchQuery};
use crate::domain::ports::OfferSource;
use async_trait::async_trait;
use reqwest::Client;

pub const DEFAULT_BASE_URL: &str = "https://www.ryanair.com";

/// Ryanair fare finder (one-way fares departing on the weekend's first day).
pub struct RyanairSource {
    client: Client,
    base_url: String,
    market: String,
}

impl RyanairSource {
    pub fn new(client: Client, base_url: impl Into<String>, market: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            market: market.into(),
        }
    }
}

#[async_trait]
impl OfferSource for RyanairSource {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Ryanair
    }

    async fn search(&self, query: &SearchQuery, _token: Option<&AuthToken>) -> SearchOutcome {
        let url = format!("{}/api/farfnd/3/oneWayFares", self.base_url);
        let date = query.range.departure().format("%Y-%m-%d").to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("departureAirportIataCode", query.origin.as_str()),
                ("language", "en"),
                ("limit", "1000"),
                ("market", self.market.as_str()),
                ("offset", "0"),
                ("outboundDepartureDateFrom", date.as_str()),
                ("outboundDepartureDateTo", date.as_str()),
            ])
            .send()
            .await;

        into_outcome(ProviderKind::Ryanair, response, "fares").await
    }
}
