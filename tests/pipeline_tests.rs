use std::f64::consts::PI;
use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use soundprint::audio::framer::{select_channel_zero, Framer, PcmFormat, BATCH_FRAME_SAMPLES};
use soundprint::fingerprint::Landmark;
use soundprint::spectrum::peaks::NEIGHBORHOOD_RADIUS;
use soundprint::spectrum::{
    edge_filter, find_peaks, normalize, read_spectrogram_file, EdgeProfile, FftEngine, Spectrogram,
    SpectrogramBuilder,
};
use soundprint::SoundPrintError;

const SAMPLE_RATE: f64 = 44_100.0;

fn sine_clip(freq_hz: f64, seconds: f64, amplitude: f64) -> Vec<i16> {
    let total = (seconds * SAMPLE_RATE) as usize;
    (0..total)
        .map(|i| (amplitude * (2.0 * PI * freq_hz * i as f64 / SAMPLE_RATE).sin()) as i16)
        .collect()
}

fn landmark_pipeline(samples: &[i16]) -> Result<Vec<Landmark>, SoundPrintError> {
    let mut builder = SpectrogramBuilder::new(BATCH_FRAME_SAMPLES);
    builder.push_samples(samples);
    let spectrogram = builder.finish();
    let mut filtered = edge_filter(&spectrogram, EdgeProfile::Laplacian);
    normalize(&mut filtered)?;
    Ok(find_peaks(&filtered, 0.12))
}

fn random_spectrogram(frames: usize, bins: usize, seed: u64) -> Spectrogram {
    let mut rng = StdRng::seed_from_u64(seed);
    let rows = (0..frames)
        .map(|_| (0..bins).map(|_| rng.gen::<f64>() * 1000.0).collect())
        .collect();
    Spectrogram::from_frames(rows)
}

#[test]
fn framer_emits_whole_frames_and_discards_tail() {
    let mut framer = Framer::new(8);
    framer.push(&[1; 5]);
    assert!(framer.next_frame().is_none());

    framer.push(&[2; 14]);
    let first = framer.next_frame().unwrap();
    let second = framer.next_frame().unwrap();
    assert_eq!(first.len(), 8);
    assert_eq!(second.len(), 8);
    assert_eq!(&first[..5], &[1; 5]);
    assert_eq!(&first[5..], &[2; 3]);

    // three samples remain, which is not enough for another frame
    assert!(framer.next_frame().is_none());
    assert_eq!(framer.pending_len(), 3);
}

#[test]
fn pcm_format_gate_rejects_wrong_rates_and_depths() {
    let good = PcmFormat {
        sample_rate: 44_100,
        bits_per_sample: 16,
        channels: 2,
    };
    assert!(good.ensure_supported().is_ok());

    let wrong_rate = PcmFormat {
        sample_rate: 48_000,
        ..good
    };
    match wrong_rate.ensure_supported() {
        Err(SoundPrintError::UnsupportedFormat(_)) => {}
        other => panic!("expected UnsupportedFormat, got {:?}", other),
    }

    let wrong_depth = PcmFormat {
        bits_per_sample: 24,
        ..good
    };
    assert!(wrong_depth.ensure_supported().is_err());
}

#[test]
fn channel_reduction_selects_channel_zero() {
    let interleaved = [10, -1, 20, -2, 30, -3];
    assert_eq!(select_channel_zero(&interleaved, 2), vec![10, 20, 30]);
    assert_eq!(select_channel_zero(&interleaved, 1), interleaved.to_vec());
}

#[test]
fn fft_peak_sits_at_the_expected_bin() {
    let samples = sine_clip(1000.0, 0.2, 10_000.0);
    let mut engine = FftEngine::new(BATCH_FRAME_SAMPLES);
    let mut magnitudes = Vec::new();
    engine.magnitudes(&samples[..BATCH_FRAME_SAMPLES], &mut magnitudes);
    assert_eq!(magnitudes.len(), BATCH_FRAME_SAMPLES / 2);

    let strongest = magnitudes
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
        .map(|(bin, _)| bin)
        .unwrap();
    let expected = (1000.0 * BATCH_FRAME_SAMPLES as f64 / SAMPLE_RATE).round() as i64;
    assert!((strongest as i64 - expected).abs() <= 1);
}

#[test]
fn sine_landmarks_share_one_frequency() {
    let samples = sine_clip(1000.0, 5.0, 10_000.0);
    let frame_count = samples.len() / BATCH_FRAME_SAMPLES;
    let landmarks = landmark_pipeline(&samples).unwrap();

    assert!(!landmarks.is_empty());
    assert!(landmarks.len() <= frame_count);

    let expected = (1000.0 * BATCH_FRAME_SAMPLES as f64 / SAMPLE_RATE).round() as i64;
    let radius = NEIGHBORHOOD_RADIUS;
    for landmark in &landmarks {
        assert!((landmark.freq as i64 - expected).abs() <= 1);
        assert!(landmark.time >= radius);
        assert!(landmark.time < frame_count - radius);
        assert!(landmark.strength > 0.12);
        assert!(landmark.strength <= 1.0);
    }
}

#[test]
fn silence_cannot_be_normalized() {
    let samples = vec![0i16; (5.0 * SAMPLE_RATE) as usize];
    match landmark_pipeline(&samples) {
        Err(SoundPrintError::EmptySpectrogram) => {}
        other => panic!("expected EmptySpectrogram, got {:?}", other.map(|l| l.len())),
    }
}

#[test]
fn too_few_frames_cannot_be_normalized() {
    // two frames of audio is below the normalizer's minimum
    let samples = sine_clip(1000.0, 0.2, 10_000.0);
    match landmark_pipeline(&samples[..2 * BATCH_FRAME_SAMPLES]) {
        Err(SoundPrintError::EmptySpectrogram) => {}
        other => panic!("expected EmptySpectrogram, got {:?}", other.map(|l| l.len())),
    }
}

#[test]
fn short_clips_produce_no_landmarks() {
    // ten frames is one short of the smallest spectrogram with an
    // interior cell, so the picker has nothing to scan
    let spectrogram = random_spectrogram(2 * NEIGHBORHOOD_RADIUS, 64, 11);
    let mut filtered = edge_filter(&spectrogram, EdgeProfile::Laplacian);
    normalize(&mut filtered).unwrap();
    assert!(find_peaks(&filtered, 0.12).is_empty());
}

#[test]
fn normalized_interior_is_unit_interval_with_zero_borders() {
    for profile in [EdgeProfile::Laplacian, EdgeProfile::Sobel].iter() {
        let spectrogram = random_spectrogram(40, 64, 23);
        let mut filtered = edge_filter(&spectrogram, *profile);
        normalize(&mut filtered).unwrap();

        let frames = filtered.frames();
        let bins = filtered.bins();
        for (time, line) in frames.iter().enumerate() {
            for (freq, &value) in line.iter().enumerate() {
                if time == 0 || time + 1 == frames.len() || freq == 0 || freq + 1 == bins {
                    assert_eq!(value, 0.0, "border cell ({}, {}) must be zero", time, freq);
                } else {
                    assert!(value >= 0.0 && value <= 1.0, "cell ({}, {}) = {}", time, freq, value);
                }
            }
        }
    }
}

#[test]
fn peaks_are_isolated_and_in_raster_order() {
    let spectrogram = random_spectrogram(60, 80, 37);
    let mut filtered = edge_filter(&spectrogram, EdgeProfile::Laplacian);
    normalize(&mut filtered).unwrap();
    let landmarks = find_peaks(&filtered, 0.12);
    assert!(!landmarks.is_empty());

    let radius = NEIGHBORHOOD_RADIUS as i64;
    for (i, a) in landmarks.iter().enumerate() {
        for b in &landmarks[i + 1..] {
            let dt = (a.time as i64 - b.time as i64).abs();
            let df = (a.freq as i64 - b.freq as i64).abs();
            assert!(
                dt > radius || df > radius,
                "peaks ({}, {}) and ({}, {}) share an exclusion window",
                a.time,
                a.freq,
                b.time,
                b.freq
            );
        }
    }

    for pair in landmarks.windows(2) {
        assert!(pair[0].time < pair[1].time || (pair[0].time == pair[1].time && pair[0].freq < pair[1].freq));
    }
}

#[test]
fn legacy_reader_truncates_partial_rows() {
    let bins = 8;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let mut written = Vec::new();
    for row in 0..3 {
        for bin in 0..bins {
            let value = (row * bins + bin) as f64 * 0.5;
            written.push(value);
            file.write_f64::<LittleEndian>(value).unwrap();
        }
    }
    // a partial fourth row that must be dropped
    file.write_f64::<LittleEndian>(999.0).unwrap();
    file.write_f64::<LittleEndian>(998.0).unwrap();
    file.flush().unwrap();

    let spectrogram = read_spectrogram_file(file.path().to_str().unwrap(), bins).unwrap();
    assert_eq!(spectrogram.frame_count(), 3);
    assert_eq!(spectrogram.bins(), bins);
    for (time, line) in spectrogram.frames().iter().enumerate() {
        for (bin, &value) in line.iter().enumerate() {
            assert_eq!(value, written[time * bins + bin]);
        }
    }
}
