use crate::spectrum::Spectrogram;
use crate::{Result, SoundPrintError};

/// Rescale the interior of a filtered spectrogram to [0, 1] using the
/// observed global minimum and maximum. Border cells stay zero.
///
/// Fails with `EmptySpectrogram` when there are fewer than 3 frames or when
/// the interior is flat (`max == min`), which is what an all-silent clip
/// produces after edge filtering.
pub fn normalize(filtered: &mut Spectrogram) -> Result<()> {
    let frame_count = filtered.frame_count();
    let bins = filtered.bins();
    if frame_count < 3 || bins < 3 {
        return Err(SoundPrintError::EmptySpectrogram);
    }

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    {
        let frames = filtered.frames();
        for line in &frames[1..frame_count - 1] {
            for &value in &line[1..bins - 1] {
                if value < min {
                    min = value;
                }
                if value > max {
                    max = value;
                }
            }
        }
    }

    if max == min {
        return Err(SoundPrintError::EmptySpectrogram);
    }

    let span = max - min;
    for line in &mut filtered.frames_mut()[1..frame_count - 1] {
        for value in &mut line[1..bins - 1] {
            *value = (*value - min) / span;
        }
    }

    Ok(())
}
