use std::fs::File;
use std::io::BufReader;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::spectrum::Spectrogram;
use crate::{Result, SoundPrintError};

/// Read a raw spectrogram file produced by the offline decode path.
///
/// The format is a headerless sequence of little-endian IEEE-754 doubles,
/// row-major, `bins` magnitudes per frame. A partial trailing row means the
/// producer was cut off mid-write; the reader truncates at the last
/// complete frame and returns what it has.
pub fn read_spectrogram_file(path: &str, bins: usize) -> Result<Spectrogram> {
    let file = File::open(path)
        .map_err(|e| SoundPrintError::InvalidInput(format!("failed to open spectrogram file '{}': {}", path, e)))?;
    let mut reader = BufReader::new(file);

    let mut spectrogram = Spectrogram::new(bins);
    loop {
        let mut row = vec![0.0f64; bins];
        match reader.read_f64_into::<LittleEndian>(&mut row) {
            Ok(()) => spectrogram.push_frame(row),
            Err(ref e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => {
                return Err(SoundPrintError::InvalidInput(format!(
                    "failed to read spectrogram file '{}': {}",
                    path, e
                )))
            }
        }
    }

    Ok(spectrogram)
}
