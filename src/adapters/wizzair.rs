use crate::adapters::http::into_outcome;
use crate::domain::model::{AuthToken, ProviderKind, SearchOutcome, SearchQuery};
use crate::domain::ports::OfferSource;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

pub const DEFAULT_BASE_URL: &str = "https://be.wizzair.com/5.2.1";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    flight_list: Vec<FlightLeg<'a>>,
    adult_count: u8,
    child_count: u8,
    infant_count: u8,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FlightLeg<'a> {
    departure_station: &'a str,
    arrival_station: &'a str,
    departure_date: String,
}

pub struct WizzAirSource {
    client: Client,
    base_url: String,
}

impl WizzAirSource {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl OfferSource for WizzAirSource {
    fn provider(&self) -> ProviderKind {
        ProviderKind::WizzAir
    }

    async fn search(&self, query: &SearchQuery, _token: Option<&AuthToken>) -> SearchOutcome {
        let url = format!("{}/Api/search/search", self.base_url);
        let payload = SearchRequest {
            flight_list: vec![FlightLeg {
                departure_station: &query.origin,
                // empty arrival station = any destination
                arrival_station: "",
                departure_date: query.range.departure().format("%Y-%m-%d").to_string(),
            }],
            adult_count: 1,
            child_count: 0,
            infant_count: 0,
        };

        let response = self.client.post(&url).json(&payload).send().await;
        into_outcome(ProviderKind::WizzAir, response, "outboundFlights").await
    }
}
