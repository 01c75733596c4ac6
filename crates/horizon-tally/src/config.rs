//! Configuration loaded from TOML.
//!
//! Every field has a default, so an empty file is a valid configuration.
//!
//! ```toml
//! [api]
//! endpoint = "https://example.appsync-api.eu-west-1.amazonaws.com/graphql"
//! api_key = "da2-..."
//! timeout_secs = 30
//!
//! [paging]
//! page_size = 25
//! max_pages_per_load_all = 1000
//!
//! [images]
//! width = 64
//! height = 64
//! format = "webp"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use horizon_tally_core::logging::targets;
use horizon_tally_core::ImageOptions;
use serde::{Deserialize, Serialize};

use crate::collection::DEFAULT_MAX_PAGES_PER_LOAD_ALL;

/// Largest page size the backend accepts.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read or written.
    #[error("failed to access config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid TOML or does not match the expected shape.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    /// The configuration could not be written as TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// A value is out of range or missing.
    #[error("invalid config value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
    /// The GraphQL client could not be built from `[api]`.
    #[cfg(feature = "networking")]
    #[error("failed to build GraphQL client: {0}")]
    Network(#[from] horizon_tally_net::NetworkError),
}

/// A specialized Result type for configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Backend connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// GraphQL endpoint URL.
    pub endpoint: String,
    /// API key, sent as `x-api-key`.
    pub api_key: Option<String>,
    /// Bearer token, sent as `Authorization: Bearer`.
    pub bearer_token: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: None,
            bearer_token: None,
            timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    /// The request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagingConfig {
    /// Items requested per page (`limit`).
    pub page_size: u32,
    /// Upper bound on pages fetched by one `fetch_all`.
    pub max_pages_per_load_all: usize,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            page_size: 25,
            max_pages_per_load_all: DEFAULT_MAX_PAGES_PER_LOAD_ALL,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TallyConfig {
    pub api: ApiConfig,
    pub paging: PagingConfig,
    pub images: ImageOptions,
}

impl TallyConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(
            target: targets::CONFIG,
            path = %path.display(),
            page_size = config.paging.page_size,
            "loaded configuration"
        );
        Ok(config)
    }

    /// Writes the configuration as TOML.
    pub fn save(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Checks value ranges.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(1..=MAX_PAGE_SIZE).contains(&self.paging.page_size) {
            return Err(ConfigError::Invalid {
                field: "paging.page_size",
                reason: format!("must be between 1 and {}", MAX_PAGE_SIZE),
            });
        }
        if self.paging.max_pages_per_load_all == 0 {
            return Err(ConfigError::Invalid {
                field: "paging.max_pages_per_load_all",
                reason: "must be at least 1".into(),
            });
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "api.timeout_secs",
                reason: "must be at least 1".into(),
            });
        }
        if self.images.width == 0 || self.images.height == 0 {
            return Err(ConfigError::Invalid {
                field: "images",
                reason: "width and height must be non-zero".into(),
            });
        }
        Ok(())
    }

    /// Like [`validate`](Self::validate), and also requires an HTTP(S)
    /// endpoint.
    pub fn validate_for_network(&self) -> ConfigResult<()> {
        self.validate()?;
        let endpoint = self.api.endpoint.trim();
        if endpoint.is_empty() {
            return Err(ConfigError::Invalid {
                field: "api.endpoint",
                reason: "an endpoint is required".into(),
            });
        }
        if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
            return Err(ConfigError::Invalid {
                field: "api.endpoint",
                reason: format!("'{}' is not an http(s) URL", endpoint),
            });
        }
        Ok(())
    }
}

#[cfg(feature = "networking")]
impl TallyConfig {
    /// Builds a GraphQL client from `[api]`.
    pub fn graphql_client(&self) -> ConfigResult<horizon_tally_net::GraphQLClient> {
        self.validate_for_network()?;
        let mut builder = horizon_tally_net::GraphQLClient::builder(self.api.endpoint.trim())
            .request_timeout(self.api.timeout());
        if let Some(key) = &self.api.api_key {
            builder = builder.api_key(key);
        }
        if let Some(token) = &self.api.bearer_token {
            builder = builder.bearer_auth(token);
        }
        Ok(builder.build()?)
    }

    /// A page source for `query`, requesting `[paging] page_size` items
    /// per page.
    pub fn page_source<T>(
        &self,
        client: horizon_tally_net::GraphQLClient,
        query: horizon_tally_net::ListQuery,
    ) -> horizon_tally_net::GraphQLPageSource<T> {
        horizon_tally_net::GraphQLPageSource::new(client, query.with_limit(self.paging.page_size))
    }
}
