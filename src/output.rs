use serde::{Deserialize, Serialize};

use crate::soundprint::Identification;

/// Output format for identification results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Simple one-line format: "Song (id N, peak P, offset F)"
    Simple,
    /// Full JSON with all metadata
    Json,
    /// CSV format for logging
    Csv,
    /// Custom format with placeholders
    Custom(&'static str),
}

/// Formatted identification output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchOutput {
    pub format: String,
    pub content: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl MatchOutput {
    /// Format an identification according to the specified format
    pub fn format_result(result: &Identification, format: OutputFormat) -> Self {
        let content = match format {
            OutputFormat::Simple => {
                format!(
                    "{} (id {}, peak {}, offset {})",
                    result.song_name, result.song_id, result.alignment_peak, result.offset_frames
                )
            }
            OutputFormat::Json => {
                serde_json::to_string(&result).unwrap_or_else(|_| "{}".to_string())
            }
            OutputFormat::Csv => {
                format!(
                    "\"{}\",{},{},{},{},\"{}\"",
                    result.song_name,
                    result.song_id,
                    result.alignment_peak,
                    result.score,
                    result.offset_frames,
                    result.identified_at.format("%Y-%m-%d %H:%M:%S UTC")
                )
            }
            OutputFormat::Custom(template) => Self::format_custom(result, template),
        };

        MatchOutput {
            format: format.to_string(),
            content,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Format using a custom template with placeholders
    fn format_custom(result: &Identification, template: &str) -> String {
        template
            .replace("{song}", &result.song_name)
            .replace("{id}", &result.song_id.to_string())
            .replace("{peak}", &result.alignment_peak.to_string())
            .replace("{score}", &result.score.to_string())
            .replace("{offset}", &result.offset_frames.to_string())
            .replace("{timestamp}", &result.identified_at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
    }

    /// Get CSV header
    pub fn csv_header() -> &'static str {
        "\"Song\",\"Id\",\"AlignmentPeak\",\"Score\",\"OffsetFrames\",\"Timestamp\""
    }
}

impl std::fmt::Display for MatchOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Simple => write!(f, "Simple"),
            OutputFormat::Json => write!(f, "Json"),
            OutputFormat::Csv => write!(f, "Csv"),
            OutputFormat::Custom(template) => write!(f, "Custom({})", template),
        }
    }
}
