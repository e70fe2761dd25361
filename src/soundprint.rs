use crate::audio::framer::BATCH_FRAME_SAMPLES;
use crate::audio::recorder::{AudioError, AudioRecorder, CaptureSession};
use crate::audio::wav::read_wav_samples;
use crate::config::Config;
use crate::fingerprint::builder::enroll_landmarks;
use crate::fingerprint::communication::{search_by_service, upload_next_song, ServiceMatch};
use crate::fingerprint::matcher::match_landmarks;
use crate::fingerprint::Landmark;
use crate::spectrum::{edge_filter, find_peaks, normalize, read_spectrogram_file, Spectrogram, SpectrogramBuilder};
use crate::store::IndexStore;
use crate::{Result, SoundPrintError};

/// Main SoundPrint struct driving enrollment and identification.
pub struct SoundPrint {
    config: Config,
    store: IndexStore,
}

/// Result of identifying a clip against the local corpus.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Identification {
    pub song_id: i64,
    pub song_name: String,
    /// Hits piled up at the winning time offset; the ranking key.
    pub alignment_peak: usize,
    /// Total hits for the song across all offsets.
    pub score: usize,
    /// Where the query clip starts inside the song, in frames.
    pub offset_frames: i64,
    pub identified_at: chrono::DateTime<chrono::Utc>,
}

impl SoundPrint {
    /// Create a new SoundPrint instance, opening (or creating) the index
    /// database named by the configuration.
    pub fn new(config: Config) -> Result<Self> {
        let store = IndexStore::open(&config.database_path)?;
        Ok(Self { config, store })
    }

    /// Create an instance around an existing store, e.g. an in-memory one.
    pub fn with_store(config: Config, store: IndexStore) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the landmark pipeline over a sample buffer: spectrogram, edge
    /// filter, normalization, peak picking.
    pub fn landmarks_from_samples(&self, samples: &[i16], frame_size: usize) -> Result<Vec<Landmark>> {
        let mut builder = SpectrogramBuilder::new(frame_size);
        builder.push_samples(samples);
        let spectrogram = builder.finish();
        self.landmarks_from_spectrogram(&spectrogram)
    }

    /// Run the landmark pipeline over an existing magnitude spectrogram.
    pub fn landmarks_from_spectrogram(&self, spectrogram: &Spectrogram) -> Result<Vec<Landmark>> {
        let mut filtered = edge_filter(spectrogram, self.config.edge_profile);
        normalize(&mut filtered)?;
        Ok(find_peaks(&filtered, self.config.peak_threshold))
    }

    /// Enroll a WAV file under `name`; returns the new song id.
    pub fn enroll_from_wav(&mut self, path: &str, name: &str) -> Result<i64> {
        let samples = read_wav_samples(path)?;
        self.enroll_samples(name, &samples)
    }

    /// Enroll a raw 44.1 kHz mono int16 buffer under `name`.
    pub fn enroll_samples(&mut self, name: &str, samples: &[i16]) -> Result<i64> {
        let landmarks = self.landmarks_from_samples(samples, BATCH_FRAME_SAMPLES)?;
        self.enroll_landmark_list(name, &landmarks)
    }

    /// Enroll an already-extracted landmark list under `name`.
    pub fn enroll_landmark_list(&mut self, name: &str, landmarks: &[Landmark]) -> Result<i64> {
        enroll_landmarks(&mut self.store, name, landmarks)
    }

    /// Identify a WAV clip; returns the ranked matches, best first.
    pub fn identify_from_wav(&self, path: &str) -> Result<Vec<Identification>> {
        let samples = read_wav_samples(path)?;
        self.identify_samples(&samples)
    }

    /// Identify a raw 44.1 kHz mono int16 clip.
    pub fn identify_samples(&self, samples: &[i16]) -> Result<Vec<Identification>> {
        let landmarks = self.landmarks_from_samples(samples, BATCH_FRAME_SAMPLES)?;
        self.identify_landmark_list(&landmarks)
    }

    /// Identify a clip stored as a raw spectrogram file from the offline
    /// decode path (headerless little-endian f64 magnitudes, row-major).
    pub fn identify_from_spectrogram_file(&self, path: &str) -> Result<Vec<Identification>> {
        let spectrogram = read_spectrogram_file(path, BATCH_FRAME_SAMPLES / 2)?;
        let landmarks = self.landmarks_from_spectrogram(&spectrogram)?;
        self.identify_landmark_list(&landmarks)
    }

    /// Identify an already-extracted landmark list.
    pub fn identify_landmark_list(&self, landmarks: &[Landmark]) -> Result<Vec<Identification>> {
        let ranked = match_landmarks(&self.store, landmarks, self.config.min_match_count)?;

        let mut identifications = Vec::with_capacity(ranked.len());
        for entry in ranked {
            let song_name = self
                .store
                .song_by_id(entry.song_id)?
                .map(|song| song.name)
                .unwrap_or_else(|| "Unknown".to_string());
            identifications.push(Identification {
                song_id: entry.song_id,
                song_name,
                alignment_peak: entry.alignment_peak,
                score: entry.score,
                offset_frames: entry.offset,
                identified_at: chrono::Utc::now(),
            });
        }
        Ok(identifications)
    }

    /// Start live capture from `device_name` (or the default input device).
    /// Stop the returned session to get the captured spectrogram, then feed
    /// it to [`SoundPrint::landmarks_from_spectrogram`].
    pub fn start_capture(&self, device_name: Option<String>) -> Result<CaptureSession> {
        AudioRecorder::start(device_name, self.config.quiet_mode).map_err(map_audio_error)
    }

    /// Upload the next not-yet-uploaded song's fingerprint to the remote
    /// service. `None` means the upload cursor is already at the end.
    pub fn upload_next_song(&mut self) -> Result<Option<i64>> {
        upload_next_song(&mut self.store, &self.config)
    }

    /// Ask the remote service to identify a landmark list.
    pub fn search_by_service(&self, landmarks: &[Landmark]) -> Result<Vec<ServiceMatch>> {
        search_by_service(landmarks, &self.config)
    }

    /// Read access to the underlying store, mainly for inspection tools.
    pub fn store(&self) -> &IndexStore {
        &self.store
    }
}

fn map_audio_error(error: AudioError) -> SoundPrintError {
    match error {
        AudioError::UnsupportedFormat(msg) => SoundPrintError::UnsupportedFormat(msg),
        other => SoundPrintError::AudioError(other.to_string()),
    }
}
