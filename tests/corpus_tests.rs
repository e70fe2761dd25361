use soundprint::fingerprint::builder::enroll_landmarks;
use soundprint::fingerprint::matcher::match_landmarks;
use soundprint::fingerprint::Landmark;
use soundprint::store::IndexStore;
use soundprint::SoundPrintError;

/// A deterministic "melody": one landmark every `spacing` frames, with the
/// frequency bin wandering pseudo-randomly inside `span` bins above
/// `base_bin`. The sequence never repeats within a song, so offset
/// histograms have a single unambiguous peak.
fn melody_landmarks(frames: usize, base_bin: usize, span: usize, spacing: usize, seed: u64) -> Vec<Landmark> {
    let mut state = seed;
    let mut landmarks = Vec::new();
    let mut time = 0usize;
    while time < frames {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        landmarks.push(Landmark {
            freq: base_bin + (state >> 33) as usize % span,
            time,
            strength: 0.5,
        });
        time += spacing;
    }
    landmarks
}

/// Cut `[from, to)` out of a landmark list and rebase its times to zero,
/// like a query clip recorded from the middle of a song.
fn clip_window(landmarks: &[Landmark], from: usize, to: usize) -> Vec<Landmark> {
    landmarks
        .iter()
        .filter(|landmark| landmark.time >= from && landmark.time < to)
        .map(|landmark| Landmark {
            freq: landmark.freq,
            time: landmark.time - from,
            strength: landmark.strength,
        })
        .collect()
}

#[test]
fn song_and_anchor_ids_are_monotonic() {
    let mut store = IndexStore::open_in_memory().unwrap();

    let first = store.insert_song("first").unwrap();
    let second = store.insert_song("second").unwrap();
    let third = store.insert_song("second").unwrap(); // duplicate names are fine
    assert!(first > 0);
    assert!(second > first);
    assert!(third > second);

    let anchor_a = store.insert_anchor(100, 10, first).unwrap();
    let anchor_b = store.insert_anchor(101, 20, first).unwrap();
    assert!(anchor_a > 0);
    assert!(anchor_b > anchor_a);
}

#[test]
fn options_roundtrip() {
    let mut store = IndexStore::open_in_memory().unwrap();
    assert_eq!(store.get_option("lastUploadSong").unwrap(), None);

    store.set_option("lastUploadSong", 7).unwrap();
    assert_eq!(store.get_option("lastUploadSong").unwrap(), Some(7));

    store.set_option("lastUploadSong", 9).unwrap();
    assert_eq!(store.get_option("lastUploadSong").unwrap(), Some(9));
}

#[test]
fn count_targets_uses_closed_intervals() {
    let mut store = IndexStore::open_in_memory().unwrap();
    let song_id = store.insert_song("intervals").unwrap();
    let anchor_id = store.insert_anchor(100, 10, song_id).unwrap();
    store.insert_target(anchor_id, 100, 10).unwrap();

    assert_eq!(store.count_targets(anchor_id, 100, 100, 10, 10).unwrap(), 1);
    assert_eq!(store.count_targets(anchor_id, 99, 101, 9, 11).unwrap(), 1);
    assert_eq!(store.count_targets(anchor_id, 101, 103, 9, 11).unwrap(), 0);
    assert_eq!(store.count_targets(anchor_id, 99, 101, 11, 13).unwrap(), 0);
    assert_eq!(store.count_targets(anchor_id + 1, 99, 101, 9, 11).unwrap(), 0);
}

#[test]
fn iterate_songs_after_walks_in_id_order() {
    let mut store = IndexStore::open_in_memory().unwrap();
    let first = store.insert_song("one").unwrap();
    let second = store.insert_song("two").unwrap();

    let song = store.iterate_songs_after(0).unwrap().unwrap();
    assert_eq!(song.id, first);
    assert_eq!(song.name, "one");

    let song = store.iterate_songs_after(first).unwrap().unwrap();
    assert_eq!(song.id, second);

    assert!(store.iterate_songs_after(second).unwrap().is_none());
}

#[test]
fn enrolled_anchors_carry_more_than_three_targets() {
    let mut store = IndexStore::open_in_memory().unwrap();
    let landmarks = melody_landmarks(900, 60, 25, 9, 1);
    let song_id = enroll_landmarks(&mut store, "melody", &landmarks).unwrap();
    assert!(song_id > 0);

    let anchors = store.anchors_by_song(song_id).unwrap();
    assert!(!anchors.is_empty());
    for anchor in &anchors {
        assert_eq!(anchor.song_id, song_id);
        let targets = store.targets_by_anchor(anchor.id).unwrap();
        assert!(targets.len() > 3, "anchor {} has only {} targets", anchor.id, targets.len());
        for target in targets {
            assert!(target.time_offset > 5);
            assert!(target.time_offset <= 45);
        }
    }
}

#[test]
fn out_of_band_landmarks_are_rejected() {
    let mut store = IndexStore::open_in_memory().unwrap();
    let landmarks: Vec<Landmark> = (0..60)
        .map(|index| Landmark {
            freq: 5 + (index % 16),
            time: index * 9,
            strength: 0.5,
        })
        .collect();
    assert!(landmarks.iter().all(|landmark| landmark.freq <= 20));

    let song_id = enroll_landmarks(&mut store, "subsonic", &landmarks).unwrap();
    assert!(store.anchors_by_song(song_id).unwrap().is_empty());

    let ranked = match_landmarks(&store, &landmarks, 2).unwrap();
    assert!(ranked.is_empty());
}

#[test]
fn self_match_tops_the_ranking() {
    let mut store = IndexStore::open_in_memory().unwrap();
    let landmarks = melody_landmarks(1800, 60, 25, 9, 1);
    let song_id = enroll_landmarks(&mut store, "self", &landmarks).unwrap();

    let ranked = match_landmarks(&store, &landmarks, 2).unwrap();
    assert!(!ranked.is_empty());
    let best = &ranked[0];
    assert_eq!(best.song_id, song_id);
    assert_eq!(best.offset, 0);
    assert!(best.alignment_peak >= 1);
    assert!(best.score >= best.alignment_peak);
}

#[test]
fn two_song_corpus_prefers_the_enrolled_source() {
    let mut store = IndexStore::open_in_memory().unwrap();
    let song_a = melody_landmarks(3000, 60, 25, 9, 1);
    let song_b = melody_landmarks(3000, 70, 31, 10, 2);
    let id_a = enroll_landmarks(&mut store, "song a", &song_a).unwrap();
    let id_b = enroll_landmarks(&mut store, "song b", &song_b).unwrap();

    let query = clip_window(&song_a, 0, 1500);
    let ranked = match_landmarks(&store, &query, 2).unwrap();
    assert!(!ranked.is_empty());
    assert_eq!(ranked[0].song_id, id_a);

    let peak_a = ranked[0].alignment_peak;
    let peak_b = ranked
        .iter()
        .find(|entry| entry.song_id == id_b)
        .map(|entry| entry.alignment_peak)
        .unwrap_or(0);
    assert!(peak_a >= 3 * peak_b, "peak_a = {}, peak_b = {}", peak_a, peak_b);
}

#[test]
fn offset_of_a_shifted_query_is_recovered() {
    let mut store = IndexStore::open_in_memory().unwrap();
    let song_a = melody_landmarks(3000, 60, 25, 9, 1);
    let id_a = enroll_landmarks(&mut store, "shifted", &song_a).unwrap();

    let query = clip_window(&song_a, 500, 1500);
    let ranked = match_landmarks(&store, &query, 2).unwrap();
    assert!(!ranked.is_empty());
    assert_eq!(ranked[0].song_id, id_a);
    assert!(
        (ranked[0].offset - 500).abs() <= 1,
        "expected offset near 500, got {}",
        ranked[0].offset
    );
}

#[test]
fn failed_enrollment_leaves_no_song_behind() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("fingerprints.db");
    let db_path = db_path.to_str().unwrap();

    let mut store = IndexStore::open(db_path).unwrap();
    let landmarks = melody_landmarks(900, 60, 25, 9, 1);
    let first_id = enroll_landmarks(&mut store, "survivor", &landmarks).unwrap();

    // sabotage the target table behind the store's back so the next
    // enrollment dies halfway through its transaction
    let raw = rusqlite::Connection::open(db_path).unwrap();
    raw.execute_batch("ALTER TABLE Check_freq_index RENAME TO Check_freq_index_hidden")
        .unwrap();

    match enroll_landmarks(&mut store, "casualty", &landmarks) {
        Err(SoundPrintError::StoreUnavailable(_)) => {}
        other => panic!("expected StoreUnavailable, got {:?}", other),
    }

    raw.execute_batch("ALTER TABLE Check_freq_index_hidden RENAME TO Check_freq_index")
        .unwrap();
    drop(raw);

    // the transaction rolled back: no second song row, no stray anchors
    assert!(store.iterate_songs_after(first_id).unwrap().is_none());
    let survivors = store.anchors_by_song(first_id).unwrap();
    assert!(!survivors.is_empty());
    let ranked = match_landmarks(&store, &landmarks, 2).unwrap();
    assert_eq!(ranked[0].song_id, first_id);
}
