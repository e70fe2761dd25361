use serde::{Deserialize, Serialize};

use crate::fingerprint::matcher::DEFAULT_MIN_MATCH_COUNT;
use crate::spectrum::filter::EdgeProfile;
use crate::spectrum::peaks::DEFAULT_PEAK_THRESHOLD;

/// Configuration for SoundPrint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path of the SQLite fingerprint index
    pub database_path: String,

    /// Base URL of the optional remote fingerprint service
    pub service_base_url: String,

    /// Timeout for network requests in seconds
    pub network_timeout: u64,

    /// Peak-picker strength threshold (0.0 to 1.0)
    pub peak_threshold: f64,

    /// Minimum number of verified targets before a candidate anchor counts
    pub min_match_count: usize,

    /// Edge-enhancement profile applied before peak picking
    pub edge_profile: EdgeProfile,

    /// Whether to suppress verbose debug output
    pub quiet_mode: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "soundprint.db".to_string(),
            service_base_url: "http://liveplustest.sinaapp.com".to_string(),
            network_timeout: 20,
            peak_threshold: DEFAULT_PEAK_THRESHOLD,
            min_match_count: DEFAULT_MIN_MATCH_COUNT,
            edge_profile: EdgeProfile::Laplacian,
            quiet_mode: true, // Default to quiet mode for clean output
        }
    }
}

impl Config {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the index database path
    pub fn with_database_path(mut self, path: &str) -> Self {
        self.database_path = path.to_string();
        self
    }

    /// Set the remote service base URL
    pub fn with_service_base_url(mut self, url: &str) -> Self {
        self.service_base_url = url.to_string();
        self
    }

    /// Set the network timeout
    pub fn with_network_timeout(mut self, timeout: u64) -> Self {
        self.network_timeout = timeout;
        self
    }

    /// Set the peak-picker threshold
    pub fn with_peak_threshold(mut self, threshold: f64) -> Self {
        self.peak_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Set the candidate acceptance threshold
    pub fn with_min_match_count(mut self, count: usize) -> Self {
        self.min_match_count = count;
        self
    }

    /// Select the edge-enhancement profile
    pub fn with_edge_profile(mut self, profile: EdgeProfile) -> Self {
        self.edge_profile = profile;
        self
    }

    /// Enable or disable quiet mode (suppress verbose output)
    pub fn with_quiet_mode(mut self, quiet: bool) -> Self {
        self.quiet_mode = quiet;
        self
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
