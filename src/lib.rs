//! PSC map library - re-exports for testing and external use.
//!
//! The core models foreign persons with significant control (PSCs) of UK
//! companies: records are classified, located, searched and linked, and the
//! view can be serialized into a shareable URL token.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::Mutex;

pub mod classify;
pub mod codec;
pub mod dataset;
pub mod geocode;
pub mod handlers;
pub mod index;
pub mod links;
pub mod location;
pub mod models;
pub mod render;
pub mod session;
pub mod templates;

// ============================================================================
// Configuration
// ============================================================================

pub const DEFAULT_DATASET: &str = "pscs_list_of_non-uk_corp_pscs_v3.5.json";
pub const DEFAULT_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_GEOCODER: &str = "https://nominatim.openstreetmap.org/search";

pub const ENV_DATASET: &str = "PSC_MAP_DATASET";
pub const ENV_ADDR: &str = "PSC_MAP_ADDR";
pub const ENV_GEOCODER: &str = "PSC_MAP_GEOCODER";
pub const ENV_LIMIT: &str = "PSC_MAP_LIMIT";

/// Sent on every outbound request; Nominatim refuses anonymous clients.
pub const USER_AGENT: &str = concat!("psc-map/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("PSC_MAP_ADDR is not a socket address: {0}")]
    Addr(String),
    #[error("PSC_MAP_LIMIT is not a record count: {0}")]
    Limit(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub dataset: DatasetSource,
    pub addr: SocketAddr,
    pub geocoder: String,
    /// Maximum raw rows ingested; `None` ingests everything.
    pub limit: Option<usize>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unset or blank values take the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let dataset_text = get(ENV_DATASET).unwrap_or_else(|| DEFAULT_DATASET.to_string());
        let dataset = DatasetSource::parse(&dataset_text);
        let addr_text = get(ENV_ADDR).unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = addr_text
            .trim()
            .parse()
            .map_err(|_| ConfigError::Addr(addr_text.clone()))?;
        let geocoder = get(ENV_GEOCODER).unwrap_or_else(|| DEFAULT_GEOCODER.to_string());
        let limit = match get(ENV_LIMIT) {
            Some(v) => Some(v.trim().parse().map_err(|_| ConfigError::Limit(v.clone()))?),
            None => None,
        };

        Ok(Self {
            dataset,
            addr,
            geocoder,
            limit,
        })
    }
}

// ============================================================================
// Application State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub session: Arc<Mutex<Session>>,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            config,
            session: Arc::new(Mutex::new(Session::new())),
            http,
        })
    }
}

// Re-export commonly used types
pub use models::{
    Bounds, Category, LatLng, Mode, RawRecord, Record, RecordMetadata, ViewSnapshot, Viewport,
};

pub use classify::{classify, classify_flags, warning_labels};

pub use location::{
    resolve_coordinates, resolve_link_endpoints, resolve_position, LinkEndpoints, Unplottable,
};

pub use index::{ingest, BuildReport, IngestError, RecordIndex};

pub use links::{BulkSelectionError, LinkGraph, MAX_BULK_SELECTION};

pub use render::{LinkSegment, RenderBoundary, RenderCommand, RenderQueue};

pub use codec::{decode, decode_query, encode, DecodeError, DecodedView, MAX_SHARED_LINKS};

pub use session::{LoadTicket, RestoreOutcome, RestoreReport, Session, SessionError, Share};

pub use dataset::{DatasetError, DatasetSource};

pub use geocode::{GeocodeError, Place};

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.dataset, DatasetSource::File(DEFAULT_DATASET.into()));
        assert_eq!(config.addr.to_string(), DEFAULT_ADDR);
        assert_eq!(config.geocoder, DEFAULT_GEOCODER);
        assert_eq!(config.limit, None);
    }

    #[test]
    fn test_config_overrides() {
        let config = Config::from_lookup(lookup(&[
            (ENV_DATASET, "https://example.org/pscs.json"),
            (ENV_ADDR, "0.0.0.0:8080"),
            (ENV_LIMIT, "500"),
            (ENV_GEOCODER, " "),
        ]))
        .unwrap();
        assert_eq!(config.dataset, DatasetSource::Url("https://example.org/pscs.json".into()));
        assert_eq!(config.addr.port(), 8080);
        assert_eq!(config.limit, Some(500));
        assert_eq!(config.geocoder, DEFAULT_GEOCODER);
    }

    #[test]
    fn test_config_rejects_bad_values() {
        assert!(matches!(
            Config::from_lookup(lookup(&[(ENV_ADDR, "localhost")])),
            Err(ConfigError::Addr(_))
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[(ENV_LIMIT, "lots")])),
            Err(ConfigError::Limit(_))
        ));
    }
}
