use hound::{SampleFormat, WavReader};

use crate::audio::framer::{select_channel_zero, PcmFormat};
use crate::{Result, SoundPrintError};

/// Read a 44.1 kHz 16-bit PCM WAV file into a mono sample buffer.
///
/// Multi-channel files are reduced to channel 0. Anything that is not
/// integer 16-bit PCM at 44.1 kHz is rejected; this crate never resamples.
pub fn read_wav_samples(path: &str) -> Result<Vec<i16>> {
    let reader = WavReader::open(path)
        .map_err(|e| SoundPrintError::InvalidInput(format!("failed to open WAV file '{}': {}", path, e)))?;

    let spec = reader.spec();
    if spec.sample_format != SampleFormat::Int {
        return Err(SoundPrintError::UnsupportedFormat(
            "floating-point WAV samples are not supported".to_string(),
        ));
    }
    let format = PcmFormat {
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
        channels: spec.channels,
    };
    format.ensure_supported()?;

    let mut samples = Vec::new();
    for sample in reader.into_samples::<i16>() {
        let sample = sample
            .map_err(|e| SoundPrintError::InvalidInput(format!("failed to read WAV data from '{}': {}", path, e)))?;
        samples.push(sample);
    }

    Ok(select_channel_zero(&samples, format.channels))
}
