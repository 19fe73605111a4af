//! Provider payload → `CanonicalOffer`.
//!
//! Every field is extracted independently and falls back to a safe default
//! (`None`, `0`, [`SENTINEL_PRICE`], empty link). Nothing in this module
//! returns an error: one malformed offer must never abort a batch.

use crate::domain::model::{CanonicalOffer, DateRange, ProviderKind, RawOffer, SENTINEL_PRICE};
use chrono::{DateTime, NaiveDateTime};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static ISO_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d+)?)S)?)?$")
        .expect("duration pattern is valid")
});

/// Keys tried, in order, when a price is a nested object.
const PRICE_AMOUNT_KEYS: [&str; 4] = ["amount", "total", "grandTotal", "value"];

/// 每個供應商一個 adapter，把各自的原始結構映射到同一個 CanonicalOffer
pub trait OfferAdapter: Send + Sync {
    fn price(&self, payload: &Value) -> Option<f64>;
    fn destination(&self, payload: &Value) -> Option<String>;
    fn country(&self, payload: &Value) -> Option<String>;
    fn duration_minutes(&self, payload: &Value) -> Option<u32>;
    fn link(&self, payload: &Value, origin: &str, range: &DateRange) -> Option<String>;
}

pub fn adapter_for(provider: ProviderKind) -> &'static dyn OfferAdapter {
    match provider {
        ProviderKind::Amadeus => &AmadeusAdapter,
        ProviderKind::Ryanair => &RyanairAdapter,
        ProviderKind::WizzAir => &WizzAirAdapter,
    }
}

pub fn normalize(raw: &RawOffer, origin: &str, queried_range: &DateRange) -> CanonicalOffer {
    let adapter = adapter_for(raw.provider);
    let payload = &raw.payload;

    let price = adapter.price(payload).unwrap_or_else(|| {
        tracing::debug!("{}: unparsable price, using sentinel", raw.provider);
        SENTINEL_PRICE
    });

    CanonicalOffer {
        origin: origin.to_string(),
        destination: adapter.destination(payload),
        country: adapter.country(payload),
        price,
        duration_minutes: adapter.duration_minutes(payload).unwrap_or(0),
        link: adapter.link(payload, origin, queried_range).unwrap_or_default(),
        range: *queried_range,
        provider: raw.provider,
    }
}

// ---------------------------------------------------------------------------
// field parsers
// ---------------------------------------------------------------------------

pub fn parse_price(value: &Value) -> Option<f64> {
    let amount = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_price_str(s),
        Value::Object(map) => PRICE_AMOUNT_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(parse_price)),
        _ => None,
    }?;

    (amount.is_finite() && amount >= 0.0).then_some(amount)
}

/// Accepts `"49,99 €"`, `"€1.234,56"`, `"1,234.56"`, `"1.234 €"`, `"EUR 20"`.
/// With both `,` and `.` present the rightmost is the decimal separator. A lone
/// separator followed by exactly three digits groups thousands; otherwise it is decimal.
pub fn parse_price_str(input: &str) -> Option<f64> {
    let cleaned: String = input
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();
    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let commas = cleaned.matches(',').count();
    let dots = cleaned.matches('.').count();

    let normalized = match (commas, dots) {
        (0, 0) => cleaned,
        (_, 0) if commas > 1 || groups_thousands(&cleaned, ',') => cleaned.replace(',', ""),
        (_, 0) => cleaned.replace(',', "."),
        (0, _) if dots > 1 || groups_thousands(&cleaned, '.') => cleaned.replace('.', ""),
        (0, _) => cleaned,
        _ => {
            let last_comma = cleaned.rfind(',')?;
            let last_dot = cleaned.rfind('.')?;
            if last_comma > last_dot {
                cleaned.replace('.', "").replace(',', ".")
            } else {
                cleaned.replace(',', "")
            }
        }
    };

    normalized.parse::<f64>().ok()
}

/// `1.234` or `12,500`: one to three leading digits (not starting with 0), then three.
fn groups_thousands(number: &str, separator: char) -> bool {
    let Some((int_part, frac_part)) = number.trim_start_matches('-').split_once(separator) else {
        return false;
    };
    (1..=3).contains(&int_part.len())
        && !int_part.starts_with('0')
        && frac_part.len() == 3
        && frac_part.chars().all(|c| c.is_ascii_digit())
}

/// `PT2H30M` → 150. Hour-only, minute-only and zero forms are accepted; seconds are dropped.
pub fn parse_iso_duration(input: &str) -> Option<u32> {
    let upper = input.trim().to_ascii_uppercase();
    let caps = ISO_DURATION.captures(&upper)?;

    // "P" and "PT" carry no component
    if (1..=4).all(|i| caps.get(i).is_none()) {
        return None;
    }

    let component = |i: usize| -> Option<u32> {
        match caps.get(i) {
            Some(m) => m.as_str().parse::<u32>().ok(),
            None => Some(0),
        }
    };

    let days = component(1)?;
    let hours = component(2)?;
    let minutes = component(3)?;

    days.checked_mul(24 * 60)?
        .checked_add(hours.checked_mul(60)?)?
        .checked_add(minutes)
}

fn parse_timestamp(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(input) {
        return Some(with_offset.naive_utc());
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
}

/// Minutes between departure and arrival; `None` when either is missing or the order is inverted.
///
/// Timestamps with an offset are compared in UTC. Timestamps without one are
/// airport-local, so the result is off by the time-zone gap between the two
/// airports, and a westbound hop that lands "earlier" yields `None`.
fn minutes_between(departure: Option<&Value>, arrival: Option<&Value>) -> Option<u32> {
    let departure = parse_timestamp(departure?.as_str()?)?;
    let arrival = parse_timestamp(arrival?.as_str()?)?;
    let minutes = (arrival - departure).num_minutes();
    u32::try_from(minutes).ok()
}

/// Trimmed, uppercased, non-empty code.
fn code(value: Option<&Value>) -> Option<String> {
    let text = value?.as_str()?.trim();
    (!text.is_empty()).then(|| text.to_ascii_uppercase())
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    let text = value?.as_str()?.trim();
    (!text.is_empty()).then(|| text.to_string())
}

// ---------------------------------------------------------------------------
// Amadeus: flight-offers with itineraries → segments
// ---------------------------------------------------------------------------

pub struct AmadeusAdapter;

impl AmadeusAdapter {
    /// Arrival leaf of the last segment of the outbound itinerary.
    fn final_arrival(payload: &Value) -> Option<&Value> {
        payload
            .pointer("/itineraries/0/segments")?
            .as_array()?
            .last()?
            .get("arrival")
    }
}

impl OfferAdapter for AmadeusAdapter {
    fn price(&self, payload: &Value) -> Option<f64> {
        parse_price(payload.get("price")?)
    }

    fn destination(&self, payload: &Value) -> Option<String> {
        code(Self::final_arrival(payload)?.get("iataCode"))
    }

    /// Inline `countryCode` first, then `dictionaries.locations[IATA]`.
    fn country(&self, payload: &Value) -> Option<String> {
        let arrival = Self::final_arrival(payload)?;
        code(arrival.get("countryCode")).or_else(|| {
            let iata = code(arrival.get("iataCode"))?;
            code(
                payload
                    .get("dictionaries")?
                    .get("locations")?
                    .get(iata.as_str())?
                    .get("countryCode"),
            )
        })
    }

    fn duration_minutes(&self, payload: &Value) -> Option<u32> {
        let itineraries = payload.get("itineraries")?.as_array()?;
        let total = itineraries
            .iter()
            .filter_map(|itinerary| itinerary.get("segments")?.as_array())
            .flatten()
            .map(|segment| {
                segment
                    .get("duration")
                    .and_then(Value::as_str)
                    .and_then(parse_iso_duration)
                    .unwrap_or(0)
            })
            .fold(0u32, u32::saturating_add);
        Some(total)
    }

    fn link(&self, payload: &Value, _origin: &str, _range: &DateRange) -> Option<String> {
        non_empty_str(payload.get("self")).or_else(|| non_empty_str(payload.pointer("/links/self")))
    }
}

// ---------------------------------------------------------------------------
// Ryanair: farfnd fares
// ---------------------------------------------------------------------------

pub struct RyanairAdapter;

impl RyanairAdapter {
    fn arrival_airport(payload: &Value) -> Option<&Value> {
        payload
            .pointer("/outbound/arrivalAirport")
            .or_else(|| payload.get("arrivalAirport"))
    }
}

impl OfferAdapter for RyanairAdapter {
    fn price(&self, payload: &Value) -> Option<f64> {
        parse_price(payload.pointer("/outbound/price")?)
    }

    fn destination(&self, payload: &Value) -> Option<String> {
        code(Self::arrival_airport(payload)?.get("iataCode"))
    }

    fn country(&self, payload: &Value) -> Option<String> {
        let airport = Self::arrival_airport(payload)?;
        code(airport.get("countryCode")).or_else(|| code(airport.pointer("/city/countryCode")))
    }

    fn duration_minutes(&self, payload: &Value) -> Option<u32> {
        let outbound = payload.get("outbound")?;
        minutes_between(outbound.get("departureDate"), outbound.get("arrivalDate"))
    }

    fn link(&self, payload: &Value, origin: &str, range: &DateRange) -> Option<String> {
        let destination = self.destination(payload)?;
        Some(format!(
            "https://www.ryanair.com/gb/en/trip/flights/select?adults=1&dateOut={}&dateIn={}&isReturn=true&originIata={}&destinationIata={}",
            range.departure().format("%Y-%m-%d"),
            range.return_date().format("%Y-%m-%d"),
            origin,
            destination
        ))
    }
}

// ---------------------------------------------------------------------------
// Wizz Air: search outboundFlights
// ---------------------------------------------------------------------------

pub struct WizzAirAdapter;

impl OfferAdapter for WizzAirAdapter {
    fn price(&self, payload: &Value) -> Option<f64> {
        payload
            .get("price")
            .and_then(parse_price)
            .or_else(|| parse_price(payload.pointer("/fares/0/basePrice")?))
    }

    fn destination(&self, payload: &Value) -> Option<String> {
        code(payload.get("arrivalStation"))
    }

    fn country(&self, payload: &Value) -> Option<String> {
        code(payload.get("arrivalCountry")).or_else(|| code(payload.get("countryCode")))
    }

    fn duration_minutes(&self, payload: &Value) -> Option<u32> {
        payload
            .get("duration")
            .and_then(Value::as_str)
            .and_then(parse_iso_duration)
            .or_else(|| {
                minutes_between(
                    payload.get("departureDateTime"),
                    payload.get("arrivalDateTime"),
                )
            })
    }

    fn link(&self, payload: &Value, origin: &str, range: &DateRange) -> Option<String> {
        let destination = self.destination(payload)?;
        Some(format!(
            "https://wizzair.com/#/booking/select-flight/{}/{}/{}/{}/1/0/0/null",
            origin,
            destination,
            range.departure().format("%Y-%m-%d"),
            range.return_date().format("%Y-%m-%d")
        ))
    }
}
