use std::io::Write;
use std::time::Duration;

use flate2::write::GzEncoder;
use flate2::Compression;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use serde_json::{json, Value};

use crate::config::Config;
use crate::fingerprint::Landmark;
use crate::store::{IndexStore, Song};
use crate::{Result, SoundPrintError};

/// WorkOption key tracking the last song pushed to the remote service.
const UPLOAD_CURSOR_OPTION: &str = "lastUploadSong";

const UPLOAD_ENDPOINT: &str = "/music/uploadSongFreqData.php";
const SEARCH_ENDPOINT: &str = "/music/findSongByFreqData.php";

/// One row of a search-by-service response.
#[derive(Debug, Clone)]
pub struct ServiceMatch {
    pub song_id: i64,
    pub count: i64,
    pub filename: String,
}

/// Upload the next song past the cursor to the remote service.
///
/// Returns the uploaded song's id, or `None` when every song in the list
/// has already been uploaded. The cursor only advances when the service
/// acknowledges with `errno == 0`, so a failed upload is retried on the
/// next call.
pub fn upload_next_song(store: &mut IndexStore, config: &Config) -> Result<Option<i64>> {
    let cursor = store.get_option(UPLOAD_CURSOR_OPTION)?.unwrap_or(0);
    let song = match store.iterate_songs_after(cursor)? {
        Some(song) => song,
        None => return Ok(None),
    };

    let payload = upload_payload(store, &song)?;
    let response = post_gzip_json(config, UPLOAD_ENDPOINT, &payload)?;
    check_errno(&response, "upload")?;

    store.set_option(UPLOAD_CURSOR_OPTION, song.id)?;
    Ok(Some(song.id))
}

/// Ask the remote service to identify a landmark list.
pub fn search_by_service(landmarks: &[Landmark], config: &Config) -> Result<Vec<ServiceMatch>> {
    let payload = search_payload(landmarks);
    let response = post_gzip_json(config, SEARCH_ENDPOINT, &payload)?;
    check_errno(&response, "search")?;

    let rows = response
        .get("data")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut matches = Vec::new();
    for row in rows {
        matches.push(ServiceMatch {
            song_id: row.get("song_id").and_then(Value::as_i64).unwrap_or(0),
            count: row.get("count").and_then(Value::as_i64).unwrap_or(0),
            filename: row.get("filename").and_then(Value::as_str).unwrap_or("").to_string(),
        });
    }
    Ok(matches)
}

/// Build the upload document for one song: its name and every anchor with
/// the anchor's target ("check") list.
pub fn upload_payload(store: &IndexStore, song: &Song) -> Result<Value> {
    let mut anchors = Vec::new();
    for anchor in store.anchors_by_song(song.id)? {
        let checks: Vec<Value> = store
            .targets_by_anchor(anchor.id)?
            .into_iter()
            .map(|target| json!({"freq": target.freq, "offset": target.time_offset}))
            .collect();
        anchors.push(json!({"freq": anchor.freq, "time": anchor.time, "checks": checks}));
    }

    Ok(json!({"song": song.name, "anchors": anchors}))
}

/// Build the search document: the bare (freq, time) list of the query.
pub fn search_payload(landmarks: &[Landmark]) -> Value {
    let data: Vec<Value> = landmarks
        .iter()
        .map(|landmark| json!({"freq": landmark.freq, "time": landmark.time}))
        .collect();
    json!({"data": data})
}

/// GZip a JSON document the way the service expects it on the wire.
pub fn gzip_payload(payload: &Value) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(payload.to_string().as_bytes())
        .map_err(|e| SoundPrintError::NetworkError(format!("failed to compress payload: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| SoundPrintError::NetworkError(format!("failed to finish compressing payload: {}", e)))
}

fn check_errno(response: &Value, action: &str) -> Result<()> {
    let errno = response.get("errno").and_then(Value::as_i64).unwrap_or(-1);
    if errno != 0 {
        let error = response
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown service error");
        return Err(SoundPrintError::NetworkError(format!(
            "{} rejected by service (errno {}): {}",
            action, errno, error
        )));
    }
    Ok(())
}

fn post_gzip_json(config: &Config, endpoint: &str, payload: &Value) -> Result<Value> {
    let body = gzip_payload(payload)?;
    let url = format!("{}{}", config.service_base_url.trim_end_matches('/'), endpoint);

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(config.network_timeout))
        .build()
        .map_err(|e| SoundPrintError::NetworkError(format!("failed to build HTTP client: {}", e)))?;

    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        "gzip/json"
            .parse()
            .map_err(|e| SoundPrintError::NetworkError(format!("invalid content type: {}", e)))?,
    );

    let response = client
        .post(&url)
        .headers(headers)
        .body(body)
        .send()
        .map_err(|e| SoundPrintError::NetworkError(format!("request to {} failed: {}", url, e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SoundPrintError::NetworkError(format!(
            "HTTP error: {} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown")
        )));
    }

    let response_text = response
        .text()
        .map_err(|e| SoundPrintError::NetworkError(format!("failed to read response body: {}", e)))?;

    serde_json::from_str(&response_text).map_err(|e| {
        SoundPrintError::NetworkError(format!(
            "failed to parse JSON response: {}. Raw response: '{}'",
            e, response_text
        ))
    })
}
