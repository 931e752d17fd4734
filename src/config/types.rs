use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Station-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub geocoding: GeocodingConfig,
    #[serde(default)]
    pub traversal: TraversalConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Target site layout
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SiteConfig {
    /// The listing endpoint serving discovery and listing responses
    pub listing_url: String,

    /// `id` of the region `<select>`; also the region form field name
    #[serde(default = "default_region_control")]
    pub region_control: String,

    /// `id` of the sub-region `<select>`; also the sub-region form field name
    #[serde(default = "default_sub_region_control")]
    pub sub_region_control: String,

    /// Class attribute of the station table (space separated classes)
    #[serde(default = "default_table_class")]
    pub table_class: String,
}

/// Retry policy and client identity for the listing site
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FetchConfig {
    /// Total attempts per request, first one included
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between failed attempts (milliseconds)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Overall request timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Pool of client identities; one is picked per process
    #[serde(default = "default_user_agents")]
    pub user_agents: Vec<String>,
}

impl FetchConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            timeout_secs: default_timeout_secs(),
            user_agents: default_user_agents(),
        }
    }
}

/// External geocoding service
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GeocodingConfig {
    /// JSON geocoding endpoint taking `address` and `key` query parameters
    #[serde(default = "default_geocoding_endpoint")]
    pub endpoint: String,

    /// API key; may instead be supplied on the command line or environment
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            endpoint: default_geocoding_endpoint(),
            api_key: None,
        }
    }
}

/// How much of the taxonomy a run visits
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TraversalConfig {
    #[serde(default = "default_max_regions")]
    pub max_regions: SelectionLimit,

    #[serde(default = "default_max_sub_regions")]
    pub max_sub_regions_per_region: SelectionLimit,

    /// Pause after every sub-region (milliseconds)
    #[serde(default = "default_area_delay_ms")]
    pub area_delay_ms: u64,
}

impl TraversalConfig {
    pub fn area_delay(&self) -> Duration {
        Duration::from_millis(self.area_delay_ms)
    }
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            max_regions: default_max_regions(),
            max_sub_regions_per_region: default_max_sub_regions(),
            area_delay_ms: default_area_delay_ms(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path to the CSV file (truncated on every run)
    #[serde(default = "default_csv_path")]
    pub csv_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
        }
    }
}

/// Upper bound on how many discovered items a run visits
///
/// In TOML this is either a positive integer or the string `"unlimited"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawLimit")]
pub enum SelectionLimit {
    Unlimited,
    First(usize),
}

impl SelectionLimit {
    /// Keeps the leading items allowed by this limit, in discovery order
    pub fn select<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        match *self {
            Self::Unlimited => items,
            Self::First(n) => &items[..n.min(items.len())],
        }
    }
}

impl std::fmt::Display for SelectionLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unlimited => write!(f, "unlimited"),
            Self::First(n) => write!(f, "first {}", n),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLimit {
    Count(usize),
    Keyword(String),
}

impl TryFrom<RawLimit> for SelectionLimit {
    type Error = String;

    fn try_from(raw: RawLimit) -> Result<Self, Self::Error> {
        match raw {
            RawLimit::Count(n) => Ok(Self::First(n)),
            RawLimit::Keyword(word) if word.eq_ignore_ascii_case("unlimited") => {
                Ok(Self::Unlimited)
            }
            RawLimit::Keyword(word) => Err(format!(
                "expected a count or \"unlimited\", got \"{}\"",
                word
            )),
        }
    }
}

fn default_region_control() -> String {
    "ddlCity".to_string()
}

fn default_sub_region_control() -> String {
    "ddlArea".to_string()
}

fn default_table_class() -> String {
    "table table-striped".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    5000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agents() -> Vec<String> {
    [
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:91.0) Gecko/20100101 Firefox/91.0",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.2 Safari/605.1.15",
    ]
    .iter()
    .map(|ua| ua.to_string())
    .collect()
}

fn default_geocoding_endpoint() -> String {
    "https://maps.googleapis.com/maps/api/geocode/json".to_string()
}

fn default_max_regions() -> SelectionLimit {
    SelectionLimit::First(1)
}

fn default_max_sub_regions() -> SelectionLimit {
    SelectionLimit::First(5)
}

fn default_area_delay_ms() -> u64 {
    1000
}

fn default_csv_path() -> String {
    "cng_stations_with_lat_long.csv".to_string()
}
