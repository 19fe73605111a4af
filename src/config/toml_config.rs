use crate::adapters::http::{HttpSettings, DEFAULT_TIMEOUT_SECONDS, DEFAULT_USER_AGENT};
use crate::adapters::report::{ReportFormat, SUPPORTED_FORMATS};
use crate::adapters::{amadeus, ryanair, wizzair};
use crate::core::dates::{parse_date, parse_extra_ranges, DateRangeGenerator};
use crate::core::pipeline::MIN_REQUEST_DELAY;
use crate::domain::model::{DateRange, FilterConfig};
use crate::utils::error::{FareError, Result};
use crate::utils::validation::{self, Validate};
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_INTERVAL_DAYS: u32 = 14;
pub const DEFAULT_COUNT: u32 = 12;
pub const DEFAULT_EUROPE_PRICE: f64 = 50.0;
pub const DEFAULT_WORLD_PRICE: f64 = 150.0;
pub const DEFAULT_MIN_DURATION_MINUTES: u32 = 1;
pub const DEFAULT_OUTPUT_PATH: &str = "./output";

/// European countries plus Morocco, which is priced like a European destination.
pub const DEFAULT_EUROPE_CODES: [&str; 46] = [
    "AL", "AD", "AT", "BY", "BE", "BA", "BG", "HR", "CY", "CZ", "DK", "EE", "FI", "FR", "DE",
    "GR", "HU", "IS", "IE", "IT", "LV", "LI", "LT", "LU", "MT", "MD", "MC", "ME", "NL", "MK",
    "NO", "PL", "PT", "RO", "RU", "SM", "RS", "SK", "SI", "ES", "SE", "CH", "UA", "GB", "VA",
    "MA",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub search: SearchConfig,
    #[serde(default)]
    pub filter: FilterSection,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub origins: Vec<String>,
    pub first_friday: Option<String>,
    pub interval_days: Option<u32>,
    pub count: Option<u32>,
    pub extra_ranges: Option<Vec<(String, String)>>,
    pub request_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterSection {
    pub europe_codes: Option<Vec<String>>,
    pub europe_price_ceiling: Option<f64>,
    pub world_price_ceiling: Option<f64>,
    pub min_duration_minutes: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    pub amadeus: Option<AmadeusConfig>,
    pub ryanair: Option<RyanairConfig>,
    pub wizzair: Option<WizzAirConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AmadeusConfig {
    pub enabled: Option<bool>,
    pub base_url: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub destination: Option<String>,
    pub max_results: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RyanairConfig {
    pub enabled: Option<bool>,
    pub base_url: Option<String>,
    pub market: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WizzAirConfig {
    pub enabled: Option<bool>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HttpConfig {
    pub timeout_seconds: Option<u64>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: Option<String>,
    pub formats: Option<Vec<String>>,
}

impl AmadeusConfig {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(amadeus::DEFAULT_BASE_URL)
    }

    pub fn max_results(&self) -> u32 {
        self.max_results.unwrap_or(amadeus::DEFAULT_MAX_RESULTS)
    }
}

impl RyanairConfig {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(ryanair::DEFAULT_BASE_URL)
    }

    pub fn market(&self) -> &str {
        self.market.as_deref().unwrap_or("en-gb")
    }
}

impl WizzAirConfig {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(wizzair::DEFAULT_BASE_URL)
    }
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(FareError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| FareError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${AMADEUS_CLIENT_SECRET})，未設定者保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| FareError::config(e.to_string()))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn origins(&self) -> &[String] {
        &self.search.origins
    }

    pub fn interval_days(&self) -> u32 {
        self.search.interval_days.unwrap_or(DEFAULT_INTERVAL_DAYS)
    }

    pub fn count(&self) -> u32 {
        self.search.count.unwrap_or(DEFAULT_COUNT)
    }

    pub fn request_delay(&self) -> Duration {
        self.search
            .request_delay_ms
            .map(Duration::from_millis)
            .unwrap_or(MIN_REQUEST_DELAY)
    }

    /// Configured first Friday, or `today` when unset. Snapping happens in the generator.
    pub fn anchor(&self, today: NaiveDate) -> Result<NaiveDate> {
        match &self.search.first_friday {
            Some(value) => parse_date("search.first_friday", value),
            None => Ok(today),
        }
    }

    pub fn extra_ranges(&self) -> Result<Vec<DateRange>> {
        parse_extra_ranges(self.search.extra_ranges.as_deref().unwrap_or_default())
    }

    pub fn date_ranges(&self, today: NaiveDate) -> Result<Vec<DateRange>> {
        let generator = DateRangeGenerator::new(
            self.anchor(today)?,
            self.interval_days(),
            self.count(),
            self.extra_ranges()?,
        );
        Ok(generator.generate())
    }

    pub fn filter_config(&self) -> FilterConfig {
        let europe_price = self
            .filter
            .europe_price_ceiling
            .unwrap_or(DEFAULT_EUROPE_PRICE);
        let world_price = self.filter.world_price_ceiling.unwrap_or(DEFAULT_WORLD_PRICE);
        let min_duration = self
            .filter
            .min_duration_minutes
            .unwrap_or(DEFAULT_MIN_DURATION_MINUTES);

        match &self.filter.europe_codes {
            Some(codes) => FilterConfig::new(codes, europe_price, world_price, min_duration),
            None => FilterConfig::new(DEFAULT_EUROPE_CODES, europe_price, world_price, min_duration),
        }
    }

    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            timeout: Duration::from_secs(self.http.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS)),
            user_agent: self
                .http
                .user_agent
                .clone()
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        }
    }

    pub fn output_path(&self) -> &str {
        self.output.path.as_deref().unwrap_or(DEFAULT_OUTPUT_PATH)
    }

    pub fn report_formats(&self) -> Result<Vec<ReportFormat>> {
        match &self.output.formats {
            Some(formats) => formats.iter().map(|f| f.parse()).collect(),
            None => Ok(vec![ReportFormat::Txt, ReportFormat::Csv]),
        }
    }

    pub fn amadeus(&self) -> Option<&AmadeusConfig> {
        self.providers.amadeus.as_ref().filter(|c| c.is_enabled())
    }

    pub fn ryanair(&self) -> Option<&RyanairConfig> {
        self.providers.ryanair.as_ref().filter(|c| c.is_enabled())
    }

    pub fn wizzair(&self) -> Option<&WizzAirConfig> {
        self.providers.wizzair.as_ref().filter(|c| c.is_enabled())
    }

    pub fn enabled_providers(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.amadeus().is_some() {
            names.push("amadeus");
        }
        if self.ryanair().is_some() {
            names.push("ryanair");
        }
        if self.wizzair().is_some() {
            names.push("wizzair");
        }
        names
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        if self.search.origins.is_empty() {
            return Err(FareError::MissingConfigError {
                field: "search.origins".to_string(),
            });
        }
        for origin in &self.search.origins {
            validation::validate_airport_code("search.origins", origin)?;
        }

        validation::validate_positive_number("search.interval_days", u64::from(self.interval_days()), 1)?;
        validation::validate_positive_number("search.count", u64::from(self.count()), 1)?;
        if let Some(delay) = self.search.request_delay_ms {
            validation::validate_positive_number(
                "search.request_delay_ms",
                delay,
                MIN_REQUEST_DELAY.as_millis() as u64,
            )?;
        }

        // 日期在啟動時就解析，錯誤直接中止
        if let Some(value) = &self.search.first_friday {
            parse_date("search.first_friday", value)?;
        }
        self.extra_ranges()?;

        let filter = self.filter_config();
        validation::validate_price("filter.europe_price_ceiling", filter.europe_price_ceiling)?;
        validation::validate_price("filter.world_price_ceiling", filter.world_price_ceiling)?;

        if let Some(timeout) = self.http.timeout_seconds {
            validation::validate_positive_number("http.timeout_seconds", timeout, 1)?;
        }

        validation::validate_path("output.path", self.output_path())?;
        if let Some(formats) = &self.output.formats {
            validation::validate_allowed_values("output.formats", formats, &SUPPORTED_FORMATS)?;
        }

        if self.enabled_providers().is_empty() {
            return Err(FareError::ConfigValidationError {
                field: "providers".to_string(),
                message: "At least one provider must be enabled".to_string(),
            });
        }

        if let Some(amadeus) = self.amadeus() {
            validation::validate_url("providers.amadeus.base_url", amadeus.base_url())?;
            let client_id =
                validation::validate_required_field("providers.amadeus.client_id", &amadeus.client_id)?;
            let client_secret = validation::validate_required_field(
                "providers.amadeus.client_secret",
                &amadeus.client_secret,
            )?;
            for (field, value) in [
                ("providers.amadeus.client_id", client_id),
                ("providers.amadeus.client_secret", client_secret),
            ] {
                validation::validate_non_empty_string(field, value)?;
                if value.contains("${") {
                    return Err(FareError::MissingConfigError {
                        field: format!("{} (unresolved {})", field, value),
                    });
                }
            }
            // flight-offers has no open-destination mode
            let destination = validation::validate_required_field(
                "providers.amadeus.destination",
                &amadeus.destination,
            )?;
            validation::validate_airport_code("providers.amadeus.destination", destination)?;
        }
        if let Some(ryanair) = self.ryanair() {
            validation::validate_url("providers.ryanair.base_url", ryanair.base_url())?;
        }
        if let Some(wizzair) = self.wizzair() {
            validation::validate_url("providers.wizzair.base_url", wizzair.base_url())?;
        }

        Ok(())
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
