use crate::config::types::{
    Config, FetchConfig, GeocodingConfig, OutputConfig, SelectionLimit, SiteConfig,
    TraversalConfig,
};
use crate::harvest::{control_selector, table_selector};
use crate::{ConfigError, ConfigResult};
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_site_config(&config.site)?;
    validate_fetch_config(&config.fetch)?;
    validate_geocoding_config(&config.geocoding)?;
    validate_traversal_config(&config.traversal)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Picks the geocoding API key, preferring an explicit override over the file
///
/// Blank keys are treated as absent.
pub fn resolve_api_key(config: &Config, cli_key: Option<&str>) -> ConfigResult<String> {
    fn present(key: Option<&str>) -> Option<&str> {
        key.map(str::trim).filter(|key| !key.is_empty())
    }

    present(cli_key)
        .or_else(|| present(config.geocoding.api_key.as_deref()))
        .map(str::to_string)
        .ok_or(ConfigError::MissingApiKey)
}

fn validate_site_config(config: &SiteConfig) -> ConfigResult<()> {
    validate_http_url("listing-url", &config.listing_url)?;

    for (name, value) in [
        ("region-control", &config.region_control),
        ("sub-region-control", &config.sub_region_control),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }

        if value.chars().any(char::is_whitespace) {
            return Err(ConfigError::Validation(format!(
                "{} must be a single element id, got '{}'",
                name, value
            )));
        }

        if control_selector(value).is_none() {
            return Err(ConfigError::Validation(format!(
                "{} '{}' is not a usable element id",
                name, value
            )));
        }
    }

    if config.table_class.trim().is_empty() {
        return Err(ConfigError::Validation(
            "table-class cannot be empty".to_string(),
        ));
    }

    if table_selector(&config.table_class).is_none() {
        return Err(ConfigError::Validation(format!(
            "table-class '{}' is not a valid CSS class list",
            config.table_class
        )));
    }

    Ok(())
}

fn validate_fetch_config(config: &FetchConfig) -> ConfigResult<()> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.user_agents.is_empty() {
        return Err(ConfigError::Validation(
            "user-agents must contain at least one entry".to_string(),
        ));
    }

    if config.user_agents.iter().any(|ua| ua.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "user-agents cannot contain blank entries".to_string(),
        ));
    }

    Ok(())
}

fn validate_geocoding_config(config: &GeocodingConfig) -> ConfigResult<()> {
    validate_http_url("geocoding endpoint", &config.endpoint)
}

fn validate_traversal_config(config: &TraversalConfig) -> ConfigResult<()> {
    for (name, limit) in [
        ("max-regions", config.max_regions),
        ("max-sub-regions-per-region", config.max_sub_regions_per_region),
    ] {
        if limit == SelectionLimit::First(0) {
            return Err(ConfigError::Validation(format!(
                "{} must be positive or \"unlimited\"",
                name
            )));
        }
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> ConfigResult<()> {
    if config.csv_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "csv-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates that `value` is an absolute http(s) URL
fn validate_http_url(name: &str, value: &str) -> ConfigResult<()> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "{} '{}' must use http or https",
            name, value
        )));
    }

    Ok(())
}
