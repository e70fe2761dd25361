pub mod builder;
pub mod communication;
pub mod matcher;

/// A local maximum of the normalized, edge-filtered spectrogram.
///
/// `freq` is the FFT bin, `time` the frame index, `strength` the normalized
/// magnitude that survived the peak threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landmark {
    pub freq: usize,
    pub time: usize,
    pub strength: f64,
}

// The pairing constants below are the fingerprint contract: two databases
// are only interchangeable if they were built with the same values.

/// Lower edge of the usable band, in bin units (exclusive).
pub const BAND_LOW_BIN: usize = 20;
/// Upper edge of the usable band, in bin units (exclusive).
pub const BAND_HIGH_BIN: usize = 400;
/// How far forward of its anchor a target may sit, in frames.
pub const PAIR_WINDOW_FRAMES: usize = 45;
/// How close behind its anchor a target may sit, in frames (exclusive).
pub const MIN_PAIR_OFFSET_FRAMES: usize = 5;
/// Half-width of the frequency window around the anchor, in bins.
pub const PAIR_FREQ_TOLERANCE: usize = 30;
/// An anchor is persisted only with strictly more targets than this.
pub const MIN_TARGETS_PER_ANCHOR: usize = 3;

/// Keep only the landmarks inside the usable band.
pub fn band_filter(landmarks: &[Landmark]) -> Vec<Landmark> {
    landmarks
        .iter()
        .copied()
        .filter(|landmark| landmark.freq > BAND_LOW_BIN && landmark.freq < BAND_HIGH_BIN)
        .collect()
}

/// Enumerate the target zone of the anchor at `anchor_index`.
///
/// `ordered` must be sorted by time (the raster order the peak picker
/// emits). The scan walks forward from the anchor, skips landmarks less
/// than [`MIN_PAIR_OFFSET_FRAMES`] ahead or outside the frequency window,
/// and stops once past [`PAIR_WINDOW_FRAMES`].
pub(crate) fn targets_in_zone<'a>(ordered: &'a [Landmark], anchor_index: usize) -> Vec<&'a Landmark> {
    let anchor = &ordered[anchor_index];
    let mut targets = Vec::new();

    for candidate in &ordered[anchor_index + 1..] {
        if candidate.time > anchor.time + PAIR_WINDOW_FRAMES {
            break;
        }
        if candidate.time <= anchor.time + MIN_PAIR_OFFSET_FRAMES {
            continue;
        }
        if candidate.freq + PAIR_FREQ_TOLERANCE <= anchor.freq {
            continue;
        }
        if candidate.freq >= anchor.freq + PAIR_FREQ_TOLERANCE {
            continue;
        }
        targets.push(candidate);
    }

    targets
}
