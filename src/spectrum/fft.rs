use chfft::RFft1D;

/// Real-input FFT of a fixed power-of-two length.
///
/// The transform plan and the input scratch buffer are allocated once and
/// reused across calls, so a warmed-up engine behaves identically frame
/// after frame. No window function is applied to the input; the edge filter
/// downstream is tuned for the resulting leakage.
pub struct FftEngine {
    size: usize,
    fft_object: RFft1D<f64>,
    input: Vec<f64>,
}

impl FftEngine {
    pub fn new(size: usize) -> Self {
        assert!(size.is_power_of_two(), "FFT length must be a power of two");
        Self {
            size,
            fft_object: RFft1D::new(size),
            input: vec![0.0; size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Magnitude spectrum of one frame: `out` receives `size / 2` values of
    /// `sqrt(re^2 + im^2)` for bins `0..size/2`.
    pub fn magnitudes(&mut self, frame: &[i16], out: &mut Vec<f64>) {
        assert_eq!(frame.len(), self.size);

        for (slot, sample) in self.input.iter_mut().zip(frame) {
            *slot = f64::from(*sample);
        }

        let spectrum = self.fft_object.forward(&self.input);

        out.clear();
        out.extend(
            spectrum[..self.size / 2]
                .iter()
                .map(|bin| (bin.re * bin.re + bin.im * bin.im).sqrt()),
        );
    }
}
