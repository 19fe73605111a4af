use crate::adapters::amadeus::{AmadeusAuth, AmadeusSource};
use crate::adapters::http::build_client;
use crate::adapters::report::ReportNotifier;
use crate::adapters::ryanair::RyanairSource;
use crate::adapters::storage::LocalStorage;
use crate::adapters::wizzair::WizzAirSource;
use crate::config::AppConfig;
use crate::core::filter::RegionFilter;
use crate::core::pipeline::FareSearchPipeline;
use crate::utils::error::Result;
use crate::utils::validation::validate_required_field;
use chrono::NaiveDate;

pub type ConfiguredPipeline = FareSearchPipeline<ReportNotifier<LocalStorage>>;

/// 依配置組裝搜尋流程；日期解析錯誤在此即中止
pub fn build_pipeline(config: &AppConfig, today: NaiveDate) -> Result<ConfiguredPipeline> {
    let ranges = config.date_ranges(today)?;
    let client = build_client(&config.http_settings())?;

    let storage = LocalStorage::new(config.output_path().to_string());
    let notifier = ReportNotifier::new(storage, config.report_formats()?);

    let mut pipeline = FareSearchPipeline::new(
        config.origins().to_vec(),
        ranges,
        RegionFilter::new(config.filter_config()),
        notifier,
    )
    .with_request_delay(config.request_delay());

    if let Some(amadeus) = config.amadeus() {
        let client_id = validate_required_field("providers.amadeus.client_id", &amadeus.client_id)?;
        let client_secret =
            validate_required_field("providers.amadeus.client_secret", &amadeus.client_secret)?;
        let destination =
            validate_required_field("providers.amadeus.destination", &amadeus.destination)?;

        pipeline = pipeline
            .with_source(Box::new(
                AmadeusSource::new(client.clone(), amadeus.base_url(), destination.as_str())
                    .with_max_results(amadeus.max_results()),
            ))
            .with_token_provider(Box::new(AmadeusAuth::new(
                client.clone(),
                amadeus.base_url(),
                client_id.as_str(),
                client_secret.as_str(),
            )));
    }

    if let Some(ryanair) = config.ryanair() {
        pipeline = pipeline.with_source(Box::new(RyanairSource::new(
            client.clone(),
            ryanair.base_url(),
            ryanair.market(),
        )));
    }

    if let Some(wizzair) = config.wizzair() {
        pipeline = pipeline.with_source(Box::new(WizzAirSource::new(
            client.clone(),
            wizzair.base_url(),
        )));
    }

    Ok(pipeline)
}
