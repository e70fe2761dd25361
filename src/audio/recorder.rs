use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};

use crate::audio::framer::{LIVE_FRAME_SAMPLES, REQUIRED_SAMPLE_RATE};
use crate::spectrum::{Spectrogram, SpectrogramBuilder};

/// Number of capture buffers allowed in flight between the audio callback
/// and the spectrogram worker.
const FIFO_BOUND: usize = 2;

/// Cross-platform audio recorder using CPAL
pub struct AudioRecorder;

/// Audio recording error
#[derive(Debug)]
pub enum AudioError {
    DeviceError(String),
    StreamError(String),
    ConfigError(String),
    UnsupportedFormat(String),
}

impl std::fmt::Display for AudioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioError::DeviceError(msg) => write!(f, "Audio device error: {}", msg),
            AudioError::StreamError(msg) => write!(f, "Audio stream error: {}", msg),
            AudioError::ConfigError(msg) => write!(f, "Audio config error: {}", msg),
            AudioError::UnsupportedFormat(msg) => write!(f, "Unsupported capture format: {}", msg),
        }
    }
}

impl std::error::Error for AudioError {}

/// A running live capture.
///
/// The audio callback does no DSP: it accumulates whole frames of
/// [`LIVE_FRAME_SAMPLES`] samples and enqueues them on a bounded FIFO. A
/// worker thread drains the FIFO through the spectrogram pipeline, so frames
/// always land in capture order.
pub struct CaptureSession {
    stream: Stream,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<Spectrogram>>,
}

impl CaptureSession {
    /// Stop capturing and return the spectrogram accumulated so far.
    ///
    /// The stop signal is level-triggered: the callback stops enqueueing
    /// immediately, the worker drains whatever is still queued, and no
    /// partial frame is retained.
    pub fn stop(mut self) -> Spectrogram {
        self.running.store(false, Ordering::SeqCst);

        // Dropping the stream tears down the callback and with it the
        // sending half of the FIFO, which lets the worker run dry.
        drop(self.stream);

        match self.worker.take() {
            Some(worker) => worker
                .join()
                .unwrap_or_else(|_| Spectrogram::new(LIVE_FRAME_SAMPLES / 2)),
            None => Spectrogram::new(LIVE_FRAME_SAMPLES / 2),
        }
    }
}

impl AudioRecorder {
    /// Start recording from `device_name` (or the default input device).
    pub fn start(device_name: Option<String>, quiet_mode: bool) -> Result<CaptureSession, AudioError> {
        let host = cpal::default_host();

        // Get the audio device
        let device = if let Some(name) = device_name {
            Self::find_device_by_name(&host, &name)?
        } else {
            host.default_input_device().ok_or_else(|| {
                AudioError::DeviceError("No default input device found".to_string())
            })?
        };

        // Get the default input config
        let config = device.default_input_config().map_err(|e| {
            AudioError::ConfigError(format!("Failed to get default input config: {}", e))
        })?;

        let sample_rate = config.sample_rate().0;
        if sample_rate != REQUIRED_SAMPLE_RATE {
            return Err(AudioError::UnsupportedFormat(format!(
                "input device runs at {} Hz, need {} Hz",
                sample_rate, REQUIRED_SAMPLE_RATE
            )));
        }

        // Bounded FIFO between the callback and the spectrogram worker
        let (frame_tx, frame_rx) = mpsc::sync_channel::<Vec<i16>>(FIFO_BOUND);
        let running = Arc::new(AtomicBool::new(true));

        let stream = Self::create_input_stream(&device, config, frame_tx, running.clone(), quiet_mode)?;

        // Start the stream
        stream
            .play()
            .map_err(|e| AudioError::StreamError(format!("Failed to start stream: {}", e)))?;

        // The worker owns the whole spectrogram build and hands it back
        // when the FIFO runs dry.
        let worker = thread::spawn(move || {
            let mut builder = SpectrogramBuilder::new(LIVE_FRAME_SAMPLES);
            for buffer in frame_rx {
                builder.push_samples(&buffer);
            }
            builder.finish()
        });

        Ok(CaptureSession {
            stream,
            running,
            worker: Some(worker),
        })
    }

    /// Find a device by name
    fn find_device_by_name(host: &cpal::Host, name: &str) -> Result<Device, AudioError> {
        let devices = host.input_devices().map_err(|e| {
            AudioError::DeviceError(format!("Failed to enumerate input devices: {}", e))
        })?;

        for device in devices {
            if let Ok(device_name) = device.name() {
                if device_name == name {
                    return Ok(device);
                }
            }
        }

        let devices = host.output_devices().map_err(|e| {
            AudioError::DeviceError(format!("Failed to enumerate output devices: {}", e))
        })?;

        for device in devices {
            if let Ok(device_name) = device.name() {
                if device_name == name {
                    return Ok(device);
                }
            }
        }

        Err(AudioError::DeviceError(format!(
            "Device '{}' not found",
            name
        )))
    }

    /// Create an input stream for the given device
    fn create_input_stream(
        device: &Device,
        config: cpal::SupportedStreamConfig,
        frame_tx: SyncSender<Vec<i16>>,
        running: Arc<AtomicBool>,
        quiet_mode: bool,
    ) -> Result<Stream, AudioError> {
        let stream_config = StreamConfig {
            channels: config.channels(),
            sample_rate: config.sample_rate(),
            buffer_size: cpal::BufferSize::Default,
        };

        let channels = config.channels() as usize;

        let stream: Result<Stream, cpal::BuildStreamError> = match config.sample_format() {
            cpal::SampleFormat::I16 => {
                let mut enqueue = frame_enqueuer(frame_tx, running);

                device.build_input_stream(
                    &stream_config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        for &sample in data.iter().step_by(channels) {
                            enqueue(sample);
                        }
                    },
                    move |err| {
                        if !quiet_mode {
                            eprintln!("An error occurred on the input audio stream: {}", err);
                        }
                    },
                    None,
                )
            }
            cpal::SampleFormat::F32 => {
                let mut enqueue = frame_enqueuer(frame_tx, running);

                device.build_input_stream(
                    &stream_config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        for &sample in data.iter().step_by(channels) {
                            let sample_i16 = (sample * 32767.0).max(-32768.0).min(32767.0) as i16;
                            enqueue(sample_i16);
                        }
                    },
                    move |err| {
                        if !quiet_mode {
                            eprintln!("An error occurred on the input audio stream: {}", err);
                        }
                    },
                    None,
                )
            }
            cpal::SampleFormat::U16 => {
                let mut enqueue = frame_enqueuer(frame_tx, running);

                device.build_input_stream(
                    &stream_config,
                    move |data: &[u16], _: &cpal::InputCallbackInfo| {
                        for &sample in data.iter().step_by(channels) {
                            let sample_i16 = (sample as i32 - 32768) as i16;
                            enqueue(sample_i16);
                        }
                    },
                    move |err| {
                        if !quiet_mode {
                            eprintln!("An error occurred on the input audio stream: {}", err);
                        }
                    },
                    None,
                )
            }
            _ => {
                return Err(AudioError::ConfigError(format!(
                    "Unsupported sample format: {:?}",
                    config.sample_format()
                )));
            }
        };

        stream.map_err(|e| AudioError::StreamError(format!("Failed to create input stream: {}", e)))
    }

    /// List available input devices
    pub fn list_input_devices() -> Result<Vec<String>, AudioError> {
        let host = cpal::default_host();
        let devices = host.input_devices().map_err(|e| {
            AudioError::DeviceError(format!("Failed to enumerate input devices: {}", e))
        })?;
        let o_devices = host.output_devices().map_err(|e| {
            AudioError::DeviceError(format!("Failed to enumerate output devices: {}", e))
        })?;

        let mut device_names = Vec::new();
        for device in devices {
            if let Ok(name) = device.name() {
                device_names.push(name);
            }
        }
        for device in o_devices {
            if let Ok(name) = device.name() {
                device_names.push(name);
            }
        }

        Ok(device_names)
    }
}

/// Per-sample accumulator run inside the audio callback.
///
/// Fills whole frames of [`LIVE_FRAME_SAMPLES`] and hands them to the FIFO.
/// When both in-flight slots are taken the newest frame is dropped rather
/// than blocking the audio thread; the surviving frames keep capture order.
fn frame_enqueuer(frame_tx: SyncSender<Vec<i16>>, running: Arc<AtomicBool>) -> impl FnMut(i16) {
    let mut frame_buffer: Vec<i16> = Vec::with_capacity(LIVE_FRAME_SAMPLES);

    move |sample: i16| {
        if !running.load(Ordering::SeqCst) {
            return;
        }
        frame_buffer.push(sample);
        if frame_buffer.len() == LIVE_FRAME_SAMPLES {
            let full = std::mem::replace(&mut frame_buffer, Vec::with_capacity(LIVE_FRAME_SAMPLES));
            match frame_tx.try_send(full) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {}
                Err(TrySendError::Disconnected(_)) => {}
            }
        }
    }
}
