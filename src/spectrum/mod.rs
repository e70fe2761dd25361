pub mod fft;
pub mod filter;
pub mod legacy;
pub mod normalize;
pub mod peaks;

pub use fft::FftEngine;
pub use filter::{edge_filter, EdgeProfile};
pub use legacy::read_spectrogram_file;
pub use normalize::normalize;
pub use peaks::find_peaks;

use crate::audio::framer::Framer;

/// Magnitude spectrogram: one row per frame, `bins` nonnegative magnitudes
/// per row. Frame index is discrete time, element index is the frequency
/// bin. Rows are only ever appended while a clip is being ingested.
#[derive(Debug, Clone)]
pub struct Spectrogram {
    frames: Vec<Vec<f64>>,
    bins: usize,
}

impl Spectrogram {
    pub fn new(bins: usize) -> Self {
        Self {
            frames: Vec::new(),
            bins,
        }
    }

    /// Wrap already-computed rows. Every row must hold the same bin count.
    pub fn from_frames(frames: Vec<Vec<f64>>) -> Self {
        let bins = frames.first().map(|row| row.len()).unwrap_or(0);
        debug_assert!(frames.iter().all(|row| row.len() == bins));
        Self { frames, bins }
    }

    pub fn push_frame(&mut self, frame: Vec<f64>) {
        debug_assert_eq!(frame.len(), self.bins);
        self.frames.push(frame);
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn bins(&self) -> usize {
        self.bins
    }

    pub fn frames(&self) -> &[Vec<f64>] {
        &self.frames
    }

    pub fn frames_mut(&mut self) -> &mut [Vec<f64>] {
        &mut self.frames
    }
}

/// Streams int16 PCM through the framer and FFT engine, appending one
/// magnitude frame per `frame_size` consecutive samples.
pub struct SpectrogramBuilder {
    framer: Framer,
    engine: FftEngine,
    spectrogram: Spectrogram,
}

impl SpectrogramBuilder {
    pub fn new(frame_size: usize) -> Self {
        Self {
            framer: Framer::new(frame_size),
            engine: FftEngine::new(frame_size),
            spectrogram: Spectrogram::new(frame_size / 2),
        }
    }

    /// Feed PCM samples; whole frames are transformed right away.
    pub fn push_samples(&mut self, samples: &[i16]) {
        self.framer.push(samples);
        while let Some(frame) = self.framer.next_frame() {
            let mut magnitudes = Vec::new();
            self.engine.magnitudes(&frame, &mut magnitudes);
            self.spectrogram.push_frame(magnitudes);
        }
    }

    /// Finish the clip, discarding any partial trailing samples.
    pub fn finish(self) -> Spectrogram {
        self.spectrogram
    }
}
