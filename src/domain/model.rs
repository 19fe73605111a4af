use crate::utils::error::{FareError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Price assigned when a raw offer carries no parsable price, so the filter drops it.
pub const SENTINEL_PRICE: f64 = 99999.0;

/// 出發 / 回程日期組合，回程必須晚於出發
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DateRange {
    departure: NaiveDate,
    #[serde(rename = "return")]
    return_date: NaiveDate,
}

impl DateRange {
    pub fn new(departure: NaiveDate, return_date: NaiveDate) -> Result<Self> {
        if return_date <= departure {
            return Err(FareError::InvalidConfigValueError {
                field: "date_range".to_string(),
                value: format!("{} -> {}", departure, return_date),
                reason: "Return date must be after the departure date".to_string(),
            });
        }
        Ok(Self {
            departure,
            return_date,
        })
    }

    pub fn departure(&self) -> NaiveDate {
        self.departure
    }

    pub fn return_date(&self) -> NaiveDate {
        self.return_date
    }

    pub fn nights(&self) -> i64 {
        (self.return_date - self.departure).num_days()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.departure.format("%Y-%m-%d"),
            self.return_date.format("%Y-%m-%d")
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Amadeus,
    Ryanair,
    WizzAir,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProviderKind::Amadeus => "amadeus",
            ProviderKind::Ryanair => "ryanair",
            ProviderKind::WizzAir => "wizzair",
        };
        f.write_str(name)
    }
}

/// Provider payload as received; only the normalizer adapters look inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawOffer {
    pub provider: ProviderKind,
    pub payload: serde_json::Value,
}

impl RawOffer {
    pub fn new(provider: ProviderKind, payload: serde_json::Value) -> Self {
        Self { provider, payload }
    }
}

/// 一筆原始報價連同查詢它的出發地與日期
#[derive(Debug, Clone)]
pub struct FetchedOffer {
    pub origin: String,
    pub range: DateRange,
    pub raw: RawOffer,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalOffer {
    pub origin: String,
    pub destination: Option<String>,
    pub country: Option<String>,
    pub price: f64,
    pub duration_minutes: u32,
    pub link: String,
    pub range: DateRange,
    pub provider: ProviderKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionTier {
    Europe,
    World,
}

#[derive(Debug, Clone)]
pub struct FilterConfig {
    pub europe_codes: HashSet<String>,
    pub europe_price_ceiling: f64,
    pub world_price_ceiling: f64,
    pub min_duration_minutes: u32,
}

impl FilterConfig {
    pub fn new<I, S>(
        europe_codes: I,
        europe_price_ceiling: f64,
        world_price_ceiling: f64,
        min_duration_minutes: u32,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            europe_codes: europe_codes
                .into_iter()
                .map(|code| code.as_ref().trim().to_ascii_uppercase())
                .collect(),
            europe_price_ceiling,
            world_price_ceiling,
            min_duration_minutes,
        }
    }
}

/// Offers that passed filtering, ascending by price.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResultSet {
    offers: Vec<CanonicalOffer>,
}

impl ResultSet {
    pub(crate) fn from_sorted(offers: Vec<CanonicalOffer>) -> Self {
        Self { offers }
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.offers.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CanonicalOffer> {
        self.offers.iter()
    }

    pub fn offers(&self) -> &[CanonicalOffer] {
        &self.offers
    }

    pub fn into_vec(self) -> Vec<CanonicalOffer> {
        self.offers
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Offers(Vec<RawOffer>),
    RateLimited,
    TransportError(String),
}

#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub origin: String,
    pub range: DateRange,
}

#[derive(Clone)]
pub struct AuthToken(pub String);

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub ranges_searched: usize,
    pub requests: usize,
    pub raw_offers: usize,
    pub matches: usize,
    pub notified: bool,
}
