//! Browser configuration.

use std::env;

/// Environment variable holding the access key id.
pub const KEY_ID_VAR: &str = "DDBV_KEY_ID";
/// Environment variable holding the secret access key.
pub const SECRET_KEY_VAR: &str = "DDBV_ACC_KEY";
/// Environment variable holding the table name prefix.
pub const STACK_VAR: &str = "DDBV_STACK";
/// Environment variable overriding the region.
pub const REGION_VAR: &str = "DDBV_REGION";
/// Environment variable overriding the service endpoint.
pub const ENDPOINT_VAR: &str = "DDBV_ENDPOINT_URL";
/// Environment variable overriding the initial page size.
pub const PAGE_SIZE_VAR: &str = "DDBV_PAGE_SIZE";

/// Default region when `DDBV_REGION` is unset.
pub const DEFAULT_REGION: &str = "ap-southeast-2";
/// Default page size when `DDBV_PAGE_SIZE` is unset or unparsable.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Credentials and connection settings for one browser instance.
#[derive(Clone)]
pub struct BrowserConfig {
    /// Access key id.
    pub access_key_id: Option<String>,
    /// Secret access key.
    pub secret_access_key: Option<String>,
    /// Region the client talks to.
    pub region: String,
    /// Only tables whose names start with this prefix are listed. Empty means all.
    pub table_prefix: String,
    /// Endpoint override, e.g. a local emulator.
    pub endpoint_url: Option<String>,
    /// Page size a new session starts with.
    pub page_size: u32,
}

impl std::fmt::Debug for BrowserConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserConfig")
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .field("region", &self.region)
            .field("table_prefix", &self.table_prefix)
            .field("endpoint_url", &self.endpoint_url)
            .field("page_size", &self.page_size)
            .finish()
    }
}

impl BrowserConfig {
    /// Create configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable source.
    ///
    /// Empty values are treated as unset.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        Self {
            access_key_id: get(KEY_ID_VAR),
            secret_access_key: get(SECRET_KEY_VAR),
            region: get(REGION_VAR).unwrap_or_else(|| DEFAULT_REGION.to_owned()),
            table_prefix: get(STACK_VAR).unwrap_or_default(),
            endpoint_url: get(ENDPOINT_VAR),
            page_size: get(PAGE_SIZE_VAR)
                .and_then(|v| v.trim().parse::<u32>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_PAGE_SIZE),
        }
    }

    /// Names of the required variables that are not set.
    #[must_use]
    pub fn missing_variables(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.access_key_id.is_none() {
            missing.push(KEY_ID_VAR);
        }
        if self.secret_access_key.is_none() {
            missing.push(SECRET_KEY_VAR);
        }
        missing
    }

    /// Whether both credentials are present.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.missing_variables().is_empty()
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            access_key_id: None,
            secret_access_key: None,
            region: DEFAULT_REGION.to_owned(),
            table_prefix: String::new(),
            endpoint_url: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_should_apply_defaults() {
        let config = BrowserConfig::from_lookup(lookup(&[]));
        assert_eq!(config.region, "ap-southeast-2");
        assert_eq!(config.table_prefix, "");
        assert_eq!(config.page_size, 10);
        assert!(config.endpoint_url.is_none());
        assert_eq!(config.missing_variables(), vec![KEY_ID_VAR, SECRET_KEY_VAR]);
    }

    #[test]
    fn test_should_read_all_variables() {
        let config = BrowserConfig::from_lookup(lookup(&[
            ("DDBV_KEY_ID", "AKIA"),
            ("DDBV_ACC_KEY", "secret"),
            ("DDBV_STACK", "prod-"),
            ("DDBV_REGION", "us-west-2"),
            ("DDBV_ENDPOINT_URL", "http://localhost:4566"),
            ("DDBV_PAGE_SIZE", "30"),
        ]));
        assert!(config.has_credentials());
        assert_eq!(config.table_prefix, "prod-");
        assert_eq!(config.region, "us-west-2");
        assert_eq!(config.endpoint_url.as_deref(), Some("http://localhost:4566"));
        assert_eq!(config.page_size, 30);
    }

    #[test]
    fn test_should_treat_empty_and_invalid_values_as_unset() {
        let config = BrowserConfig::from_lookup(lookup(&[
            ("DDBV_KEY_ID", ""),
            ("DDBV_ACC_KEY", "secret"),
            ("DDBV_PAGE_SIZE", "0"),
        ]));
        assert_eq!(config.missing_variables(), vec![KEY_ID_VAR]);
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_should_redact_secret_in_debug() {
        let config = BrowserConfig::from_lookup(lookup(&[("DDBV_ACC_KEY", "hunter2")]));
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
