use std::collections::HashMap;

use crate::fingerprint::{band_filter, targets_in_zone, Landmark};
use crate::store::IndexStore;
use crate::Result;

/// Default minimum number of verified targets for a candidate anchor.
pub const DEFAULT_MIN_MATCH_COUNT: usize = 2;

/// Ranked per-song outcome of a query.
///
/// `alignment_peak` is the primary ranking key: genuine matches pile up at
/// a single anchor-minus-query time offset, while accidental hits scatter
/// across offsets. `offset` is where that pile sits, which is also the
/// query clip's start position inside the song.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongMatch {
    pub song_id: i64,
    pub score: usize,
    pub alignment_peak: usize,
    pub offset: i64,
}

/// One accepted candidate anchor.
struct Hit {
    song_id: i64,
    offset: i64,
}

/// Match a query landmark list against the enrolled corpus.
///
/// Every usable-band query landmark is tried as an anchor: stored anchors
/// with the same frequency bin are candidates, and each candidate is
/// verified by probing the store for the query's own target zone (with one
/// bin and one frame of slack on each axis). Candidates confirmed by at
/// least `min_match_count` targets become hits; hits aggregate into
/// per-song offset histograms that decide the ranking.
///
/// An empty result is a perfectly normal outcome, not an error.
pub fn match_landmarks(store: &IndexStore, query: &[Landmark], min_match_count: usize) -> Result<Vec<SongMatch>> {
    let usable = band_filter(query);
    let mut hits: Vec<Hit> = Vec::new();

    for (index, anchor) in usable.iter().enumerate() {
        let candidates = store.find_anchors_by_freq(anchor.freq as i64)?;
        if candidates.is_empty() {
            continue;
        }

        let targets = targets_in_zone(&usable, index);
        if targets.is_empty() {
            continue;
        }

        for candidate in &candidates {
            let mut match_count = 0usize;
            for target in &targets {
                let freq = target.freq as i64;
                let offset = (target.time - anchor.time) as i64;
                let found = store.count_targets(candidate.id, freq - 1, freq + 1, offset - 1, offset + 1)?;
                if found > 0 {
                    match_count += 1;
                }
            }

            if match_count >= min_match_count {
                hits.push(Hit {
                    song_id: candidate.song_id,
                    offset: candidate.time - anchor.time as i64,
                });
            }
        }
    }

    Ok(rank_hits(&hits))
}

/// Fold hits into per-song offset histograms and rank the songs by their
/// histogram peak, breaking ties by total hit count.
fn rank_hits(hits: &[Hit]) -> Vec<SongMatch> {
    let mut histograms: HashMap<i64, HashMap<i64, usize>> = HashMap::new();
    for hit in hits {
        *histograms
            .entry(hit.song_id)
            .or_insert_with(HashMap::new)
            .entry(hit.offset)
            .or_insert(0) += 1;
    }

    let mut ranked: Vec<SongMatch> = histograms
        .into_iter()
        .map(|(song_id, histogram)| {
            let score = histogram.values().sum();
            let mut alignment_peak = 0usize;
            let mut best_offset = 0i64;
            for (&offset, &count) in &histogram {
                if count > alignment_peak || (count == alignment_peak && offset < best_offset) {
                    alignment_peak = count;
                    best_offset = offset;
                }
            }
            SongMatch {
                song_id,
                score,
                alignment_peak,
                offset: best_offset,
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.alignment_peak
            .cmp(&a.alignment_peak)
            .then(b.score.cmp(&a.score))
            .then(a.song_id.cmp(&b.song_id))
    });
    ranked
}
