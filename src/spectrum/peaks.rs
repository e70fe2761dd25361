use crate::fingerprint::Landmark;
use crate::spectrum::Spectrogram;

/// Default strength threshold below which cells are never considered.
pub const DEFAULT_PEAK_THRESHOLD: f64 = 0.12;

/// Radius of the square exclusion neighborhood around a candidate peak.
pub const NEIGHBORHOOD_RADIUS: usize = 5;

/// Pick the local maxima of a normalized spectrogram.
///
/// A cell becomes a landmark when its strength exceeds `threshold` and no
/// cell in the (2A+1)x(2A+1) window around it is strictly stronger, with
/// A = [`NEIGHBORHOOD_RADIUS`]. Cells closer than A to any edge are never
/// candidates. Landmarks come out in raster order: time-major, then
/// frequency.
pub fn find_peaks(normalized: &Spectrogram, threshold: f64) -> Vec<Landmark> {
    let frames = normalized.frames();
    let bins = normalized.bins();
    let radius = NEIGHBORHOOD_RADIUS;

    let mut landmarks = Vec::new();
    if frames.len() <= 2 * radius || bins <= 2 * radius {
        return landmarks;
    }

    for time in radius..frames.len() - radius {
        for freq in radius..bins - radius {
            let strength = frames[time][freq];
            if strength <= threshold {
                continue;
            }
            if is_local_max(frames, time, freq, radius, strength) {
                landmarks.push(Landmark {
                    freq,
                    time,
                    strength,
                });
            }
        }
    }

    landmarks
}

/// Scan the exclusion window centered on (time, freq), bailing out as soon
/// as a strictly stronger neighbor turns up. Equal-strength neighbors do
/// not reject the candidate.
fn is_local_max(frames: &[Vec<f64>], time: usize, freq: usize, radius: usize, strength: f64) -> bool {
    for line in &frames[time - radius..=time + radius] {
        for &neighbor in &line[freq - radius..=freq + radius] {
            if neighbor > strength {
                return false;
            }
        }
    }
    true
}
