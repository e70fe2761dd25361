use crate::fingerprint::{band_filter, targets_in_zone, Landmark, MIN_TARGETS_PER_ANCHOR};
use crate::store::IndexStore;
use crate::{Result, SoundPrintError};

/// Enroll one song's landmark list under `name` and return the new song id.
///
/// Landmarks are restricted to the usable band, then every remaining
/// landmark is tried as an anchor; anchors that collect more than
/// [`MIN_TARGETS_PER_ANCHOR`] targets in their forward zone are persisted
/// together with their targets. The whole song goes into one transaction.
/// A busy store gets exactly one more attempt before the conflict surfaces.
pub fn enroll_landmarks(store: &mut IndexStore, name: &str, landmarks: &[Landmark]) -> Result<i64> {
    let usable = band_filter(landmarks);

    match write_song(store, name, &usable) {
        Err(SoundPrintError::TransactionConflict(_)) => write_song(store, name, &usable),
        outcome => outcome,
    }
}

fn write_song(store: &mut IndexStore, name: &str, usable: &[Landmark]) -> Result<i64> {
    let writer = store.song_transaction()?;
    let song_id = writer.insert_song(name)?;

    for (index, anchor) in usable.iter().enumerate() {
        let targets = targets_in_zone(usable, index);
        if targets.len() <= MIN_TARGETS_PER_ANCHOR {
            continue;
        }

        let anchor_id = writer.insert_anchor(anchor.freq as i64, anchor.time as i64, song_id)?;
        for target in targets {
            writer.insert_target(anchor_id, target.freq as i64, (target.time - anchor.time) as i64)?;
        }
    }

    writer.commit()?;
    Ok(song_id)
}
