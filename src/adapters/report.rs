use crate::core::Storage;
use crate::domain::model::{CanonicalOffer, ResultSet};
use crate::domain::ports::Notifier;
use crate::utils::error::{FareError, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::str::FromStr;

pub const SUBJECT: &str = "Weekend flight alerts";
pub const SUPPORTED_FORMATS: [&str; 3] = ["txt", "csv", "json"];

const UNKNOWN_DESTINATION: &str = "UNK";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Txt,
    Csv,
    Json,
}

impl ReportFormat {
    pub fn filename(&self) -> &'static str {
        match self {
            ReportFormat::Txt => "weekend_fares.txt",
            ReportFormat::Csv => "weekend_fares.csv",
            ReportFormat::Json => "weekend_fares.json",
        }
    }
}

impl FromStr for ReportFormat {
    type Err = FareError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "txt" => Ok(ReportFormat::Txt),
            "csv" => Ok(ReportFormat::Csv),
            "json" => Ok(ReportFormat::Json),
            other => Err(FareError::InvalidConfigValueError {
                field: "output.formats".to_string(),
                value: other.to_string(),
                reason: format!("Unsupported format. Valid formats: {}", SUPPORTED_FORMATS.join(", ")),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    origin: &'a str,
    destination: &'a str,
    country: &'a str,
    departure: String,
    #[serde(rename = "return")]
    return_date: String,
    price: String,
    duration_minutes: u32,
    provider: String,
    link: &'a str,
}

impl<'a> From<&'a CanonicalOffer> for CsvRow<'a> {
    fn from(offer: &'a CanonicalOffer) -> Self {
        Self {
            origin: &offer.origin,
            destination: offer.destination.as_deref().unwrap_or(UNKNOWN_DESTINATION),
            country: offer.country.as_deref().unwrap_or(""),
            departure: offer.range.departure().format("%Y-%m-%d").to_string(),
            return_date: offer.range.return_date().format("%Y-%m-%d").to_string(),
            price: format!("{:.2}", offer.price),
            duration_minutes: offer.duration_minutes,
            provider: offer.provider.to_string(),
            link: &offer.link,
        }
    }
}

/// Body of the alert: one block per offer, cheapest first.
pub fn render_text(results: &ResultSet) -> String {
    let mut body = String::from("Cheap weekend flights:\n\n");
    for offer in results.iter() {
        body.push_str(&format!(
            "{} → {} | {} | {:.2}€\n{}\n\n",
            offer.origin,
            offer.destination.as_deref().unwrap_or(UNKNOWN_DESTINATION),
            offer.range,
            offer.price,
            offer.link
        ));
    }
    body
}

pub fn render_csv(results: &ResultSet) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for offer in results.iter() {
        writer.serialize(CsvRow::from(offer))?;
    }
    writer.into_inner().map_err(|e| {
        FareError::IoError(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
    })
}

/// 通知：將結果寫成報表檔並輸出摘要到日誌
pub struct ReportNotifier<S: Storage> {
    storage: S,
    formats: Vec<ReportFormat>,
}

impl<S: Storage> ReportNotifier<S> {
    pub fn new(storage: S, formats: Vec<ReportFormat>) -> Self {
        Self { storage, formats }
    }
}

#[async_trait]
impl<S: Storage> Notifier for ReportNotifier<S> {
    async fn notify(&self, results: &ResultSet) -> Result<()> {
        let text = render_text(results);
        tracing::info!("✉️ {} ({} flights)\n{}", SUBJECT, results.len(), text);

        for format in &self.formats {
            let data = match format {
                ReportFormat::Txt => format!("{}\n\n{}", SUBJECT, text).into_bytes(),
                ReportFormat::Csv => render_csv(results)?,
                ReportFormat::Json => serde_json::to_vec_pretty(results)?,
            };
            tracing::debug!("Writing {} ({} bytes)", format.filename(), data.len());
            self.storage.write_file(format.filename(), &data).await?;
        }

        Ok(())
    }
}
