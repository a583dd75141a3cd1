//! Application configuration structures.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Upper bound the Finding API accepts for `entriesPerPage`.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Upstream API and HTTP client settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Pagination, pacing and retry behavior
    #[serde(default)]
    pub scrape: ScrapeConfig,

    /// Title heuristics data
    #[serde(default)]
    pub parsing: ParsingConfig,

    /// Output locations and toggles
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration, falling back to defaults when the file is missing.
    ///
    /// A file that exists but does not parse is an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        log::debug!("Loading config from {}", path.display());
        Self::load(path)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.api.endpoint.trim().is_empty() {
            return Err(AppError::config("api.endpoint is empty"));
        }
        url::Url::parse(&self.api.endpoint)?;
        if self.api.user_agent.trim().is_empty() {
            return Err(AppError::config("api.user_agent is empty"));
        }
        if self.api.timeout_secs == 0 {
            return Err(AppError::config("api.timeout_secs must be > 0"));
        }
        if !self.api.keyword_template.contains("{year}") {
            return Err(AppError::config(
                "api.keyword_template must contain {year}",
            ));
        }
        if self.scrape.page_size == 0 || self.scrape.page_size > MAX_PAGE_SIZE {
            return Err(AppError::config(format!(
                "scrape.page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        if self.scrape.max_pages == 0 && !self.scrape.all_pages {
            return Err(AppError::config("scrape.max_pages must be > 0"));
        }
        if self.scrape.retry_max_delay_ms < self.scrape.retry_base_delay_ms {
            return Err(AppError::config(
                "scrape.retry_max_delay_ms must be >= scrape.retry_base_delay_ms",
            ));
        }
        if self.parsing.grading_services.is_empty() {
            return Err(AppError::config("parsing.grading_services is empty"));
        }
        if self.parsing.grading_services.iter().any(|s| s.trim().is_empty()) {
            return Err(AppError::config("parsing.grading_services has a blank entry"));
        }
        Ok(())
    }
}

/// Finding API and HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Finding service endpoint
    #[serde(default = "defaults::endpoint")]
    pub endpoint: String,

    /// Environment variable holding the application id
    #[serde(default = "defaults::app_id_env")]
    pub app_id_env: String,

    /// Search keywords; `{year}` is substituted per year
    #[serde(default = "defaults::keyword_template")]
    pub keyword_template: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl ApiConfig {
    /// Search keywords for a given year.
    pub fn keywords_for(&self, year: u32) -> String {
        self.keyword_template.replace("{year}", &year.to_string())
    }

    /// Read the application id from the environment.
    pub fn app_id(&self) -> Result<String> {
        match env::var(&self.app_id_env) {
            Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
            _ => Err(AppError::MissingCredential(self.app_id_env.clone())),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::endpoint(),
            app_id_env: defaults::app_id_env(),
            keyword_template: defaults::keyword_template(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Pagination, pacing and retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Listings requested per page
    #[serde(default = "defaults::page_size")]
    pub page_size: u32,

    /// Page cap per year
    #[serde(default = "defaults::max_pages")]
    pub max_pages: u32,

    /// Ignore the page cap and stream until the upstream runs dry
    #[serde(default)]
    pub all_pages: bool,

    /// Delay between upstream requests in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Retries per page after the first attempt
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// First backoff delay in milliseconds
    #[serde(default = "defaults::retry_base_delay")]
    pub retry_base_delay_ms: u64,

    /// Backoff ceiling in milliseconds
    #[serde(default = "defaults::retry_max_delay")]
    pub retry_max_delay_ms: u64,
}

impl ScrapeConfig {
    /// Effective page cap, `None` when unbounded.
    pub fn page_cap(&self) -> Option<u32> {
        (!self.all_pages).then_some(self.max_pages)
    }
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            page_size: defaults::page_size(),
            max_pages: defaults::max_pages(),
            all_pages: false,
            request_delay_ms: defaults::request_delay(),
            max_retries: defaults::max_retries(),
            retry_base_delay_ms: defaults::retry_base_delay(),
            retry_max_delay_ms: defaults::retry_max_delay(),
        }
    }
}

/// Title heuristics data. Extend these lists for new brands and graders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsingConfig {
    /// Brand, set and filler words never taken as a player name
    #[serde(default = "defaults::brand_stopwords")]
    pub brand_stopwords: Vec<String>,

    /// Grading service prefixes recognized before a grade value
    #[serde(default = "defaults::grading_services")]
    pub grading_services: Vec<String>,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            brand_stopwords: defaults::brand_stopwords(),
            grading_services: defaults::grading_services(),
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for CSV files
    #[serde(default = "defaults::output_dir")]
    pub dir: PathBuf,

    /// Also write one file spanning all years
    #[serde(default)]
    pub combined: bool,

    /// Download gallery images next to the CSV output
    #[serde(default)]
    pub download_images: bool,

    /// Directory for downloaded images
    #[serde(default = "defaults::images_dir")]
    pub images_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: defaults::output_dir(),
            combined: false,
            download_images: false,
            images_dir: defaults::images_dir(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Api defaults
    pub fn endpoint() -> String {
        "https://svcs.ebay.com/services/search/FindingService/v1".into()
    }
    pub fn app_id_env() -> String {
        "EBAY_APP_ID".into()
    }
    pub fn keyword_template() -> String {
        "{year} sports trading card".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; card-scraper/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Scrape defaults
    pub fn page_size() -> u32 {
        super::MAX_PAGE_SIZE
    }
    pub fn max_pages() -> u32 {
        10
    }
    pub fn request_delay() -> u64 {
        1000
    }
    pub fn max_retries() -> u32 {
        3
    }
    pub fn retry_base_delay() -> u64 {
        1000
    }
    pub fn retry_max_delay() -> u64 {
        30_000
    }

    // Parsing defaults
    pub fn brand_stopwords() -> Vec<String> {
        [
            // Manufacturers and product lines
            "TOPPS", "UPPER", "DECK", "FLEER", "DONRUSS", "BOWMAN", "OPEECHEE", "PANINI",
            "SELECT", "PRIZM", "OPTIC", "CHROME", "HOOPS", "STADIUM", "CLUB", "SKYBOX",
            "SCORE", "LEAF", "KOBE", "FINEST", "ULTRA", "HERITAGE", "METAL",
            // Card descriptors
            "RC", "ROOKIE", "CARD", "CARDS", "REFRACTOR", "AUTO", "AUTOGRAPH", "PATCH",
            "PARALLEL", "INSERT", "HOF", "SP", "SSP", "VINTAGE", "LOT", "SET",
            // Parallels and finishes
            "GOLD", "SILVER", "HOLO", "MOJO", "WAVE", "SHIMMER", "SCOPE", "NEON", "LAZER",
            "PULSAR", "CRACKED", "ICE", "SPARKLE", "FOIL", "TINSEL",
            // Condition words
            "GEM", "MINT", "MT", "NM", "EX", "GRADED", "RAW",
            // Sports
            "BASEBALL", "BASKETBALL", "FOOTBALL", "HOCKEY", "SOCCER", "SPORTS", "TRADING",
            "NBA", "NFL", "MLB", "NHL",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }
    pub fn grading_services() -> Vec<String> {
        vec!["PSA".into(), "BGS".into(), "SGC".into()]
    }

    // Output defaults
    pub fn output_dir() -> PathBuf {
        PathBuf::from(".")
    }
    pub fn images_dir() -> PathBuf {
        PathBuf::from("images")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scrape.page_size, 100);
        assert_eq!(config.scrape.page_cap(), Some(10));
        assert!(!config.output.combined);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [scrape]
            request_delay_ms = 250

            [parsing]
            grading_services = ["PSA", "BGS", "SGC", "CGC"]
            "#,
        )
        .unwrap();

        assert_eq!(config.scrape.request_delay_ms, 250);
        assert_eq!(config.scrape.page_size, 100);
        assert_eq!(config.parsing.grading_services.len(), 4);
        assert!(config.parsing.brand_stopwords.contains(&"TOPPS".to_string()));
        assert_eq!(config.api.app_id_env, "EBAY_APP_ID");
    }

    #[test]
    fn test_validate_rejects_oversized_page() {
        let mut config = Config::default();
        config.scrape.page_size = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_page_cap() {
        let mut config = Config::default();
        config.scrape.max_pages = 0;
        assert!(config.validate().is_err());

        config.scrape.all_pages = true;
        assert!(config.validate().is_ok());
        assert_eq!(config.scrape.page_cap(), None);
    }

    #[test]
    fn test_validate_rejects_template_without_year() {
        let mut config = Config::default();
        config.api.keyword_template = "sports trading card".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_keywords_for() {
        let api = ApiConfig::default();
        assert_eq!(api.keywords_for(1986), "1986 sports trading card");
    }

    #[test]
    fn test_missing_credential() {
        let api = ApiConfig {
            app_id_env: "CARD_SCRAPER_TEST_UNSET_VARIABLE".into(),
            ..ApiConfig::default()
        };
        assert!(matches!(api.app_id(), Err(AppError::MissingCredential(_))));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default("/nonexistent/card-scraper.toml").unwrap();
        assert_eq!(config.scrape.max_pages, 10);
    }

    #[test]
    fn test_load_or_default_rejects_broken_file() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[scrape]\npage_size = \"lots\"\n").unwrap();
        let err = Config::load_or_default(tmp.path()).unwrap_err();
        assert!(matches!(err, AppError::Toml(_)));
        assert!(err.is_configuration());
    }
}
