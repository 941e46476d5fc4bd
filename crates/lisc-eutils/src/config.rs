//! E-Utilities client configuration.

use std::time::Duration;

use lisc_counts::CollectOptions;

/// Public E-Utilities endpoint.
pub const DEFAULT_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// Database searched when none is configured.
pub const DEFAULT_DB: &str = "pubmed";

/// Request ceiling with an API key: ten per second.
const KEYED_INTERVAL: Duration = Duration::from_millis(100);

/// Configuration for the E-Utilities client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EUtilsConfig {
    /// Base URL; endpoint names such as `esearch.fcgi` are appended.
    pub base_url: String,
    /// Entrez database to search.
    pub db: String,
    /// Restrict matches to one search field (e.g. `TIAB`).
    pub field: Option<String>,
    /// NCBI API key, raising the request ceiling.
    pub api_key: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for EUtilsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            db: DEFAULT_DB.to_string(),
            field: None,
            api_key: None,
            timeout: Duration::from_secs(30),
        }
    }
}

impl EUtilsConfig {
    /// Create configuration from environment variables.
    ///
    /// Reads:
    /// - `LISC_EUTILS_URL` - Optional, defaults to the public endpoint
    /// - `LISC_DB` - Optional, defaults to `pubmed`
    /// - `LISC_FIELD` - Optional search field restriction
    /// - `NCBI_API_KEY` - Optional API key
    /// - `LISC_TIMEOUT_SECS` - Optional, defaults to 30
    pub fn from_env() -> Result<Self, EUtilsConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, EUtilsConfigError> {
        let present = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = present("LISC_EUTILS_URL") {
            config.base_url = url;
        }
        if let Some(db) = present("LISC_DB") {
            config.db = db;
        }
        config.field = present("LISC_FIELD");
        config.api_key = present("NCBI_API_KEY");
        if let Some(secs) = present("LISC_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| EUtilsConfigError::InvalidValue {
                name: "LISC_TIMEOUT_SECS".to_string(),
                reason: format!("{secs:?} is not a whole number of seconds"),
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks that the configuration is usable.
    pub fn validate(&self) -> Result<(), EUtilsConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(EUtilsConfigError::InvalidValue {
                name: "base_url".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }
        if self.db.trim().is_empty() {
            return Err(EUtilsConfigError::InvalidValue {
                name: "db".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }
        if self.timeout.is_zero() {
            return Err(EUtilsConfigError::InvalidValue {
                name: "timeout".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Full URL of one E-Utilities endpoint.
    pub fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), name)
    }

    /// Collection options whose spacing matches the service ceiling for
    /// this configuration.
    pub fn recommended_options(&self) -> CollectOptions {
        let options = CollectOptions::default();
        match self.api_key {
            Some(_) => options.with_min_interval(KEYED_INTERVAL),
            None => options,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EUtilsConfigError {
    #[error("invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use lisc_counts::DEFAULT_MIN_INTERVAL;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_without_env() {
        let config = EUtilsConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, EUtilsConfig::default());
        assert_eq!(config.db, "pubmed");
    }

    #[test]
    fn reads_all_variables() {
        let config = EUtilsConfig::from_lookup(lookup(&[
            ("LISC_EUTILS_URL", "http://localhost:8080/eutils/"),
            ("LISC_DB", "pmc"),
            ("LISC_FIELD", "TIAB"),
            ("NCBI_API_KEY", "abc123"),
            ("LISC_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();

        assert_eq!(config.db, "pmc");
        assert_eq!(config.field.as_deref(), Some("TIAB"));
        assert_eq!(config.api_key.as_deref(), Some("abc123"));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(
            config.endpoint("esearch.fcgi"),
            "http://localhost:8080/eutils/esearch.fcgi"
        );
    }

    #[test]
    fn blank_values_are_ignored() {
        let config = EUtilsConfig::from_lookup(lookup(&[("NCBI_API_KEY", "  "), ("LISC_DB", "")]))
            .unwrap();
        assert_eq!(config.api_key, None);
        assert_eq!(config.db, DEFAULT_DB);
    }

    #[test]
    fn rejects_bad_timeout() {
        for value in ["soon", "0", "-3"] {
            let result = EUtilsConfig::from_lookup(lookup(&[("LISC_TIMEOUT_SECS", value)]));
            assert!(result.is_err(), "{value}");
        }
    }

    #[test]
    fn api_key_tightens_spacing() {
        let mut config = EUtilsConfig::default();
        assert_eq!(config.recommended_options().min_interval, DEFAULT_MIN_INTERVAL);

        config.api_key = Some("key".to_string());
        assert_eq!(
            config.recommended_options().min_interval,
            Duration::from_millis(100)
        );
    }
}
