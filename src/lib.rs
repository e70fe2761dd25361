//! # SoundPrint Library
//!
//! A Rust library for landmark-pair acoustic fingerprinting with a local
//! SQLite index. Clips are reduced to a sparse set of spectrogram peaks,
//! the peaks are paired into anchor/target records, and a query clip is
//! identified by the time-offset histogram of its matching anchors.
//!
//! ## Features
//!
//! - Sliding-window FFT spectrogram over 44.1 kHz 16-bit mono PCM
//! - Laplacian edge enhancement, normalization and non-maximum suppression
//! - Combinatorial anchor/target fingerprints stored in SQLite
//! - Offset-histogram matching against the enrolled corpus
//! - Cross-platform live capture and an optional remote fingerprint service
//!
//! ## Example
//!
//! ```rust,no_run
//! use soundprint::{SoundPrint, Config};
//!
//! let config = Config::default();
//! let mut engine = SoundPrint::new(config).unwrap();
//!
//! engine.enroll_from_wav("song.wav", "My Song").unwrap();
//! match engine.identify_from_wav("clip.wav") {
//!     Ok(matches) => {
//!         if let Some(best) = matches.first() {
//!             println!("Identified: {}", best.song_name);
//!         }
//!     }
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

pub mod config;
pub mod audio;
pub mod spectrum;
pub mod fingerprint;
pub mod store;
pub mod output;

// Core API
mod soundprint;
pub use crate::soundprint::{Identification, SoundPrint};
pub use config::Config;
pub use output::{MatchOutput, OutputFormat};

// Re-export key types for convenience
pub use fingerprint::matcher::SongMatch;
pub use fingerprint::Landmark;
pub use spectrum::Spectrogram;

/// Current version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error types for the library
#[derive(Debug)]
pub enum SoundPrintError {
    /// The PCM producer delivered something other than 44.1 kHz 16-bit audio.
    UnsupportedFormat(String),
    /// The spectrogram is too short or flat to normalize.
    EmptySpectrogram,
    /// The index store rejected an operation; writes roll back.
    StoreUnavailable(String),
    /// The store was busy or locked; the enrollment may be retried.
    TransactionConflict(String),
    AudioError(String),
    NetworkError(String),
    InvalidInput(String),
    ConfigError(String),
}

impl std::fmt::Display for SoundPrintError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SoundPrintError::UnsupportedFormat(msg) => write!(f, "Unsupported PCM format: {}", msg),
            SoundPrintError::EmptySpectrogram => write!(f, "Empty spectrogram: not enough distinct data to normalize"),
            SoundPrintError::StoreUnavailable(msg) => write!(f, "Index store unavailable: {}", msg),
            SoundPrintError::TransactionConflict(msg) => write!(f, "Index store transaction conflict: {}", msg),
            SoundPrintError::AudioError(msg) => write!(f, "Audio error: {}", msg),
            SoundPrintError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            SoundPrintError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            SoundPrintError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for SoundPrintError {}

/// Result type for the library
pub type Result<T> = std::result::Result<T, SoundPrintError>;
