pub mod framer;
pub mod recorder;
pub mod wav;

pub use framer::{Framer, PcmFormat};
pub use recorder::{AudioRecorder, CaptureSession};
pub use wav::read_wav_samples;
