use crate::domain::model::{ProviderKind, RawOffer, SearchOutcome};
use crate::utils::error::Result;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 20;
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";

#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

pub fn build_client(settings: &HttpSettings) -> Result<Client> {
    let client = Client::builder()
        .timeout(settings.timeout)
        .user_agent(settings.user_agent.clone())
        .build()?;
    Ok(client)
}

/// 將 HTTP 回應轉成 SearchOutcome：429 視為限流，其他錯誤一律視為傳輸錯誤
pub async fn into_outcome(
    provider: ProviderKind,
    response: reqwest::Result<Response>,
    offers_key: &str,
) -> SearchOutcome {
    match read_body(provider, response).await {
        Ok(body) => SearchOutcome::Offers(offers_at(provider, &body, offers_key)),
        Err(outcome) => outcome,
    }
}

/// JSON body of a successful response; failures come back as the outcome to report.
pub async fn read_body(
    provider: ProviderKind,
    response: reqwest::Result<Response>,
) -> std::result::Result<Value, SearchOutcome> {
    let response = response.map_err(|e| SearchOutcome::TransportError(e.to_string()))?;

    let status = response.status();
    tracing::debug!("{} response status: {}", provider, status);

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(SearchOutcome::RateLimited);
    }
    if !status.is_success() {
        return Err(SearchOutcome::TransportError(format!("HTTP {}", status)));
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| SearchOutcome::TransportError(format!("invalid JSON body: {}", e)))
}

/// A body without the offers array is an empty result, not a fault.
pub fn offers_at(provider: ProviderKind, body: &Value, key: &str) -> Vec<RawOffer> {
    body.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .cloned()
                .map(|payload| RawOffer::new(provider, payload))
                .collect()
        })
        .unwrap_or_default()
}
