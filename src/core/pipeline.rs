use crate::core::aggregate::ResultAggregator;
use crate::core::filter::RegionFilter;
use crate::core::normalize::normalize;
use crate::domain::model::{
    AuthToken, DateRange, FetchedOffer, ResultSet, RunSummary, SearchOutcome, SearchQuery,
};
use crate::domain::ports::{Notifier, OfferSource, Pipeline, TokenProvider};
use crate::utils::error::{FareError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Lower bound on the pause between two consecutive search calls.
pub const MIN_REQUEST_DELAY: Duration = Duration::from_millis(400);

/// 週末機票搜尋流程：日期 × 出發地 × 供應商，依序查詢（不並行）
pub struct FareSearchPipeline<N: Notifier> {
    origins: Vec<String>,
    ranges: Vec<DateRange>,
    sources: Vec<Box<dyn OfferSource>>,
    token_provider: Option<Box<dyn TokenProvider>>,
    filter: RegionFilter,
    notifier: N,
    request_delay: Duration,
    requests: AtomicUsize,
    raw_offers: AtomicUsize,
}

impl<N: Notifier> FareSearchPipeline<N> {
    pub fn new(
        origins: Vec<String>,
        ranges: Vec<DateRange>,
        filter: RegionFilter,
        notifier: N,
    ) -> Self {
        Self {
            origins,
            ranges,
            sources: Vec::new(),
            token_provider: None,
            filter,
            notifier,
            request_delay: MIN_REQUEST_DELAY,
            requests: AtomicUsize::new(0),
            raw_offers: AtomicUsize::new(0),
        }
    }

    pub fn with_source(mut self, source: Box<dyn OfferSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn with_token_provider(mut self, provider: Box<dyn TokenProvider>) -> Self {
        self.token_provider = Some(provider);
        self
    }

    /// Delays shorter than [`MIN_REQUEST_DELAY`] are raised to it.
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay.max(MIN_REQUEST_DELAY);
        self
    }

    pub fn ranges(&self) -> &[DateRange] {
        &self.ranges
    }

    pub fn request_delay(&self) -> Duration {
        self.request_delay
    }

    async fn authenticate(&self) -> Result<Option<AuthToken>> {
        if !self.sources.iter().any(|source| source.requires_auth()) {
            return Ok(None);
        }

        let provider = self.token_provider.as_ref().ok_or_else(|| {
            FareError::config("A provider requires authentication but no token provider is configured")
        })?;

        tracing::info!("🔑 Requesting access token");
        match provider.fetch_token().await {
            Ok(token) => Ok(Some(token)),
            Err(e @ FareError::AuthenticationError { .. }) => Err(e),
            Err(other) => Err(FareError::AuthenticationError {
                message: other.to_string(),
            }),
        }
    }
}

#[async_trait::async_trait]
impl<N: Notifier> Pipeline for FareSearchPipeline<N> {
    async fn extract(&self) -> Result<Vec<FetchedOffer>> {
        let token = self.authenticate().await?;

        if self.sources.is_empty() {
            tracing::warn!("No offer sources enabled, nothing to search");
        }

        let mut fetched = Vec::new();
        let mut first_call = true;

        for range in &self.ranges {
            for origin in &self.origins {
                for source in &self.sources {
                    if !first_call {
                        tokio::time::sleep(self.request_delay).await;
                    }
                    first_call = false;

                    let query = SearchQuery {
                        origin: origin.clone(),
                        range: *range,
                    };
                    let bearer = if source.requires_auth() {
                        token.as_ref()
                    } else {
                        None
                    };

                    self.requests.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!("📡 {} {} {}", source.provider(), origin, range);

                    match source.search(&query, bearer).await {
                        SearchOutcome::Offers(raws) => {
                            tracing::debug!(
                                "{} {} {}: {} offers",
                                source.provider(),
                                origin,
                                range,
                                raws.len()
                            );
                            self.raw_offers.fetch_add(raws.len(), Ordering::Relaxed);
                            fetched.extend(raws.into_iter().map(|raw| FetchedOffer {
                                origin: origin.clone(),
                                range: *range,
                                raw,
                            }));
                        }
                        SearchOutcome::RateLimited => {
                            tracing::warn!(
                                "⏳ {} rate limited for {} {}, skipping",
                                source.provider(),
                                origin,
                                range
                            );
                        }
                        SearchOutcome::TransportError(reason) => {
                            tracing::warn!(
                                "⚠️ {} failed for {} {}: {}",
                                source.provider(),
                                origin,
                                range,
                                reason
                            );
                        }
                    }
                }
            }
        }

        Ok(fetched)
    }

    async fn transform(&self, data: Vec<FetchedOffer>) -> Result<ResultSet> {
        let total = data.len();
        let mut aggregator = ResultAggregator::new();

        for fetched in data {
            let offer = normalize(&fetched.raw, &fetched.origin, &fetched.range);
            if self.filter.passes(&offer) {
                aggregator.push(offer);
            }
        }

        tracing::info!("🔎 {} of {} offers passed the filter", aggregator.len(), total);
        Ok(aggregator.finish())
    }

    async fn load(&self, result: ResultSet) -> Result<RunSummary> {
        let mut summary = RunSummary {
            ranges_searched: self.ranges.len(),
            requests: self.requests.load(Ordering::Relaxed),
            raw_offers: self.raw_offers.load(Ordering::Relaxed),
            matches: result.len(),
            notified: false,
        };

        if result.is_empty() {
            tracing::info!("No flights found today.");
            return Ok(summary);
        }

        self.notifier.notify(&result).await?;
        summary.notified = true;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{FilterConfig, ProviderKind, RawOffer};
    use chrono::NaiveDate;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn range(dep: (i32, u32, u32), ret: (i32, u32, u32)) -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(dep.0, dep.1, dep.2).unwrap(),
            NaiveDate::from_ymd_opt(ret.0, ret.1, ret.2).unwrap(),
        )
        .unwrap()
    }

    fn fare(price: f64, destination: &str, country: &str) -> RawOffer {
        RawOffer::new(
            ProviderKind::Ryanair,
            json!({
                "outbound": {
                    "arrivalAirport": {"iataCode": destination, "countryCode": country},
                    "departureDate": "2026-03-28T07:00:00",
                    "arrivalDate": "2026-03-28T09:00:00",
                    "price": {"value": price, "currencyCode": "EUR"}
                }
            }),
        )
    }

    struct StubSource {
        outcome: SearchOutcome,
        needs_auth: bool,
        queries: Arc<Mutex<Vec<(String, DateRange, bool)>>>,
    }

    impl StubSource {
        fn new(outcome: SearchOutcome) -> Self {
            Self {
                outcome,
                needs_auth: false,
                queries: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait::async_trait]
    impl OfferSource for StubSource {
        fn provider(&self) -> ProviderKind {
            ProviderKind::Ryanair
        }

        fn requires_auth(&self) -> bool {
            self.needs_auth
        }

        async fn search(&self, query: &SearchQuery, token: Option<&AuthToken>) -> SearchOutcome {
            self.queries
                .lock()
                .unwrap()
                .push((query.origin.clone(), query.range, token.is_some()));
            self.outcome.clone()
        }
    }

    struct StubAuth {
        succeed: bool,
    }

    #[async_trait::async_trait]
    impl TokenProvider for StubAuth {
        async fn fetch_token(&self) -> Result<AuthToken> {
            if self.succeed {
                Ok(AuthToken("token".to_string()))
            } else {
                Err(FareError::AuthenticationError {
                    message: "invalid_client".to_string(),
                })
            }
        }
    }

    #[derive(Clone, Default)]
    struct RecordingNotifier {
        sent: Arc<Mutex<Vec<ResultSet>>>,
    }

    #[async_trait::async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, results: &ResultSet) -> Result<()> {
            self.sent.lock().unwrap().push(results.clone());
            Ok(())
        }
    }

    fn filter() -> RegionFilter {
        RegionFilter::new(FilterConfig::new(["ES", "FR"], 50.0, 150.0, 1))
    }

    async fn run<N: Notifier>(pipeline: &FareSearchPipeline<N>) -> Result<RunSummary> {
        let fetched = pipeline.extract().await?;
        let results = pipeline.transform(fetched).await?;
        pipeline.load(results).await
    }

    #[tokio::test]
    async fn test_weekend_scenario_keeps_cheap_europe_and_world_offers() {
        let source = StubSource::new(SearchOutcome::Offers(vec![
            fare(40.0, "MAD", "ES"),
            fare(60.0, "SVQ", "ES"),
            fare(120.0, "JFK", "US"),
        ]));
        let notifier = RecordingNotifier::default();
        let pipeline = FareSearchPipeline::new(
            vec!["BCN".to_string()],
            vec![range((2026, 3, 28), (2026, 4, 2))],
            filter(),
            notifier.clone(),
        )
        .with_source(Box::new(source));

        let summary = run(&pipeline).await.unwrap();

        assert_eq!(summary.requests, 1);
        assert_eq!(summary.raw_offers, 3);
        assert_eq!(summary.matches, 2);
        assert!(summary.notified);

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let results: Vec<(f64, Option<&str>)> = sent[0]
            .iter()
            .map(|o| (o.price, o.country.as_deref()))
            .collect();
        assert_eq!(results, vec![(40.0, Some("ES")), (120.0, Some("US"))]);
    }

    #[tokio::test]
    async fn test_queries_iterate_ranges_then_origins() {
        let source = StubSource::new(SearchOutcome::Offers(Vec::new()));
        let queries = source.queries.clone();
        let first = range((2026, 3, 27), (2026, 3, 30));
        let second = range((2026, 4, 10), (2026, 4, 13));
        let pipeline = FareSearchPipeline::new(
            vec!["BCN".to_string(), "GRO".to_string()],
            vec![first, second],
            filter(),
            RecordingNotifier::default(),
        )
        .with_source(Box::new(source));

        let started = std::time::Instant::now();
        pipeline.extract().await.unwrap();

        let queries = queries.lock().unwrap();
        let order: Vec<(&str, DateRange)> =
            queries.iter().map(|(o, r, _)| (o.as_str(), *r)).collect();
        assert_eq!(
            order,
            vec![("BCN", first), ("GRO", first), ("BCN", second), ("GRO", second)]
        );
        // three pauses between four calls
        assert!(started.elapsed() >= MIN_REQUEST_DELAY * 3);
    }

    #[tokio::test]
    async fn test_rate_limited_pair_yields_zero_offers() {
        let pipeline = FareSearchPipeline::new(
            vec!["BCN".to_string()],
            vec![range((2026, 3, 27), (2026, 3, 30))],
            filter(),
            RecordingNotifier::default(),
        )
        .with_source(Box::new(StubSource::new(SearchOutcome::RateLimited)))
        .with_source(Box::new(StubSource::new(SearchOutcome::Offers(vec![fare(
            30.0, "MAD", "ES",
        )]))));

        let fetched = pipeline.extract().await.unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].origin, "BCN");
    }

    #[tokio::test]
    async fn test_transport_error_is_absorbed() {
        let notifier = RecordingNotifier::default();
        let pipeline = FareSearchPipeline::new(
            vec!["BCN".to_string()],
            vec![range((2026, 3, 27), (2026, 3, 30))],
            filter(),
            notifier.clone(),
        )
        .with_source(Box::new(StubSource::new(SearchOutcome::TransportError(
            "connection reset".to_string(),
        ))));

        let summary = run(&pipeline).await.unwrap();
        assert_eq!(summary.matches, 0);
        assert!(!summary.notified);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_auth_failure_aborts_before_any_search() {
        let mut source = StubSource::new(SearchOutcome::Offers(Vec::new()));
        source.needs_auth = true;
        let queries = source.queries.clone();
        let pipeline = FareSearchPipeline::new(
            vec!["BCN".to_string()],
            vec![range((2026, 3, 27), (2026, 3, 30))],
            filter(),
            RecordingNotifier::default(),
        )
        .with_source(Box::new(source))
        .with_token_provider(Box::new(StubAuth { succeed: false }));

        let err = pipeline.extract().await.unwrap_err();
        assert!(matches!(err, FareError::AuthenticationError { .. }));
        assert!(queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_token_is_passed_only_to_sources_requiring_auth() {
        let mut secured = StubSource::new(SearchOutcome::Offers(Vec::new()));
        secured.needs_auth = true;
        let secured_queries = secured.queries.clone();
        let public = StubSource::new(SearchOutcome::Offers(Vec::new()));
        let public_queries = public.queries.clone();

        let pipeline = FareSearchPipeline::new(
            vec!["BCN".to_string()],
            vec![range((2026, 3, 27), (2026, 3, 30))],
            filter(),
            RecordingNotifier::default(),
        )
        .with_source(Box::new(secured))
        .with_source(Box::new(public))
        .with_token_provider(Box::new(StubAuth { succeed: true }));

        pipeline.extract().await.unwrap();
        assert!(secured_queries.lock().unwrap()[0].2);
        assert!(!public_queries.lock().unwrap()[0].2);
    }

    #[tokio::test]
    async fn test_missing_token_provider_is_config_error() {
        let mut source = StubSource::new(SearchOutcome::Offers(Vec::new()));
        source.needs_auth = true;
        let pipeline = FareSearchPipeline::new(
            vec!["BCN".to_string()],
            vec![range((2026, 3, 27), (2026, 3, 30))],
            filter(),
            RecordingNotifier::default(),
        )
        .with_source(Box::new(source));

        let err = pipeline.extract().await.unwrap_err();
        assert!(matches!(err, FareError::ConfigError { .. }));
    }

    #[test]
    fn test_request_delay_has_floor() {
        let pipeline = FareSearchPipeline::new(
            Vec::new(),
            Vec::new(),
            filter(),
            RecordingNotifier::default(),
        )
        .with_request_delay(Duration::from_millis(10));
        assert_eq!(pipeline.request_delay(), MIN_REQUEST_DELAY);

        let pipeline = pipeline.with_request_delay(Duration::from_secs(2));
        assert_eq!(pipeline.request_delay(), Duration::from_secs(2));
    }
}
