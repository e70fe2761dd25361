use serde::{Deserialize, Serialize};

use crate::spectrum::Spectrogram;

/// Edge-enhancement profile applied to the magnitude spectrogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeProfile {
    /// 3x3 Laplacian with a heavy center weight. Sharp spectral ridges
    /// dominate over slowly varying bands; the canonical profile.
    Laplacian,
    /// Sobel gradient magnitude, kept for offline-decoded audio.
    Sobel,
}

const LAPLACIAN: [[f64; 3]; 3] = [
    [-1.0, -2.0, -1.0],
    [-2.0, 13.0, -2.0],
    [-1.0, -2.0, -1.0],
];

const SOBEL_GX: [[f64; 3]; 3] = [
    [-1.0, 0.0, 1.0],
    [-2.0, 0.0, 2.0],
    [-1.0, 0.0, 1.0],
];

const SOBEL_GY: [[f64; 3]; 3] = [
    [1.0, 2.0, 1.0],
    [0.0, 0.0, 0.0],
    [-1.0, -2.0, -1.0],
];

/// Apply the edge profile to every interior cell of the spectrogram.
///
/// The output is a fresh spectrogram of the same shape. Cells on the
/// one-cell border are zero, and negative filter responses clamp to zero.
pub fn edge_filter(spectrogram: &Spectrogram, profile: EdgeProfile) -> Spectrogram {
    let frames = spectrogram.frames();
    let bins = spectrogram.bins();
    let frame_count = frames.len();

    let mut filtered = Vec::with_capacity(frame_count);
    for time in 0..frame_count {
        let mut line = vec![0.0f64; bins];
        if time >= 1 && time + 1 < frame_count && bins >= 3 {
            for freq in 1..bins - 1 {
                let response = match profile {
                    EdgeProfile::Laplacian => convolve3x3(frames, time, freq, &LAPLACIAN),
                    EdgeProfile::Sobel => {
                        let gx = convolve3x3(frames, time, freq, &SOBEL_GX);
                        let gy = convolve3x3(frames, time, freq, &SOBEL_GY);
                        (gx * gx + gy * gy).sqrt()
                    }
                };
                line[freq] = response.max(0.0);
            }
        }
        filtered.push(line);
    }

    Spectrogram::from_frames(filtered)
}

fn convolve3x3(frames: &[Vec<f64>], time: usize, freq: usize, kernel: &[[f64; 3]; 3]) -> f64 {
    let mut acc = 0.0;
    for dt in 0..3 {
        for df in 0..3 {
            acc += frames[time + dt - 1][freq + df - 1] * kernel[dt][df];
        }
    }
    acc
}
