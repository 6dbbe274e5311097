//! Search configuration
//!
//! A [`FinderConfig`] is built once (defaults, then environment, then CLI
//! flags), validated, and handed to every client by reference.

use mdscout_common::{MdscoutError, Result};
use std::str::FromStr;
use std::time::Duration;

// ============================================================================
// Defaults
// ============================================================================

/// UniProt REST root.
pub const DEFAULT_UNIPROT_URL: &str = "https://rest.uniprot.org";

/// RCSB search API v2 query endpoint.
pub const DEFAULT_RCSB_SEARCH_URL: &str = "https://search.rcsb.org/rcsbsearch/v2/query";

/// RCSB data API root (the `core/...` resources hang off this).
pub const DEFAULT_RCSB_DATA_URL: &str = "https://data.rcsb.org/rest/v1";

pub const DEFAULT_MAX_LENGTH: u32 = 300;
pub const DEFAULT_MAX_ATOMS: u64 = 50_000;
pub const DEFAULT_MAX_RESOLUTION: f64 = 3.0;
pub const DEFAULT_NUM_CANDIDATES: usize = 100;
pub const DEFAULT_NUM_STRUCTURES: usize = 50;
pub const DEFAULT_STRUCTURES_PER_CANDIDATE: usize = 5;
pub const DEFAULT_TARGET_RESULTS: usize = 50;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Shortest sequence length UniProt candidates may have.
pub const MIN_SEQUENCE_LENGTH: u32 = 50;

/// Cooperative pauses applied after remote calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delays {
    /// Between RCSB search pages
    pub search_page: Duration,
    /// After each polymer / non-polymer entity fetch
    pub entity_lookup: Duration,
    /// After each structure examined by the direct search
    pub direct_detail: Duration,
    /// After each structure examined on behalf of a UniProt candidate
    pub candidate_detail: Duration,
}

impl Default for Delays {
    fn default() -> Self {
        Self {
            search_page: Duration::from_millis(300),
            entity_lookup: Duration::from_millis(50),
            direct_detail: Duration::from_millis(200),
            candidate_detail: Duration::from_millis(300),
        }
    }
}

/// Immutable settings for one search run
#[derive(Debug, Clone, PartialEq)]
pub struct FinderConfig {
    /// Longest UniProt sequence accepted
    pub max_length: u32,

    /// Atom budget for "laptop suitable" structures
    pub max_atoms: u64,

    /// Worst resolution (Å) accepted by the direct RCSB search
    pub max_resolution: f64,

    /// UniProt candidates to retain (annotated flow)
    pub num_candidates: usize,

    /// Structure ids to examine (direct flow)
    pub num_structures: usize,

    /// Structure ids examined per candidate
    pub structures_per_candidate: usize,

    /// Qualifying rows after which the annotated flow stops
    pub target_results: usize,

    pub uniprot_base_url: String,
    pub rcsb_search_url: String,
    pub rcsb_data_url: String,

    pub request_timeout: Duration,
    pub delays: Delays,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            max_atoms: DEFAULT_MAX_ATOMS,
            max_resolution: DEFAULT_MAX_RESOLUTION,
            num_candidates: DEFAULT_NUM_CANDIDATES,
            num_structures: DEFAULT_NUM_STRUCTURES,
            structures_per_candidate: DEFAULT_STRUCTURES_PER_CANDIDATE,
            target_results: DEFAULT_TARGET_RESULTS,
            uniprot_base_url: DEFAULT_UNIPROT_URL.to_string(),
            rcsb_search_url: DEFAULT_RCSB_SEARCH_URL.to_string(),
            rcsb_data_url: DEFAULT_RCSB_DATA_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            delays: Delays::default(),
        }
    }
}

impl FinderConfig {
    /// Defaults overridden by `MDSCOUT_*` environment variables
    ///
    /// Environment variables:
    /// - `MDSCOUT_MAX_LENGTH`, `MDSCOUT_MAX_ATOMS`, `MDSCOUT_MAX_RESOLUTION`
    /// - `MDSCOUT_NUM_CANDIDATES`, `MDSCOUT_NUM_STRUCTURES`, `MDSCOUT_TARGET_RESULTS`
    /// - `MDSCOUT_UNIPROT_URL`, `MDSCOUT_RCSB_SEARCH_URL`, `MDSCOUT_RCSB_DATA_URL`
    /// - `MDSCOUT_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(v) = env_parse("MDSCOUT_MAX_LENGTH")? {
            config.max_length = v;
        }
        if let Some(v) = env_parse("MDSCOUT_MAX_ATOMS")? {
            config.max_atoms = v;
        }
        if let Some(v) = env_parse("MDSCOUT_MAX_RESOLUTION")? {
            config.max_resolution = v;
        }
        if let Some(v) = env_parse("MDSCOUT_NUM_CANDIDATES")? {
            config.num_candidates = v;
        }
        if let Some(v) = env_parse("MDSCOUT_NUM_STRUCTURES")? {
            config.num_structures = v;
        }
        if let Some(v) = env_parse("MDSCOUT_TARGET_RESULTS")? {
            config.target_results = v;
        }
        if let Ok(url) = std::env::var("MDSCOUT_UNIPROT_URL") {
            config.uniprot_base_url = url;
        }
        if let Ok(url) = std::env::var("MDSCOUT_RCSB_SEARCH_URL") {
            config.rcsb_search_url = url;
        }
        if let Ok(url) = std::env::var("MDSCOUT_RCSB_DATA_URL") {
            config.rcsb_data_url = url;
        }
        if let Some(secs) = env_parse("MDSCOUT_TIMEOUT_SECS")? {
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Reject settings that would make a run meaningless
    pub fn validate(&self) -> Result<()> {
        if self.max_length < MIN_SEQUENCE_LENGTH {
            return Err(MdscoutError::config(format!(
                "max_length must be at least {} (got {})",
                MIN_SEQUENCE_LENGTH, self.max_length
            )));
        }
        if self.max_atoms == 0 {
            return Err(MdscoutError::config("max_atoms must be greater than zero"));
        }
        if self.max_resolution.is_nan() || self.max_resolution <= 0.0 {
            return Err(MdscoutError::config(format!(
                "max_resolution must be positive (got {})",
                self.max_resolution
            )));
        }
        for (name, value) in [
            ("num_candidates", self.num_candidates),
            ("num_structures", self.num_structures),
            ("structures_per_candidate", self.structures_per_candidate),
            ("target_results", self.target_results),
        ] {
            if value == 0 {
                return Err(MdscoutError::config(format!("{} must be at least 1", name)));
            }
        }
        Ok(())
    }

    /// Build the shared HTTP client for all remote calls
    pub fn http_client(&self) -> Result<reqwest::Client> {
        let client = reqwest::Client::builder()
            .timeout(self.request_timeout)
            .user_agent(concat!("mdscout/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(client)
    }
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| MdscoutError::parse(format!("{}='{}': {}", key, raw, e))),
        Err(_) => Ok(None),
    }
}
