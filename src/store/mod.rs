use std::path::Path;

use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Transaction};

use crate::{Result, SoundPrintError};

/// One row of the songlist table.
#[derive(Debug, Clone)]
pub struct Song {
    pub id: i64,
    pub name: String,
}

/// One row of the anchor table.
#[derive(Debug, Clone)]
pub struct Anchor {
    pub id: i64,
    pub freq: i64,
    pub time: i64,
    pub song_id: i64,
}

/// One target of an anchor, stored as a frequency and a forward time offset.
#[derive(Debug, Clone, Copy)]
pub struct Target {
    pub freq: i64,
    pub time_offset: i64,
}

// Table and column names are shared with other tools reading the same
// database files, so they are part of the on-disk contract.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS songlist (id INTEGER PRIMARY KEY, name TEXT);
CREATE TABLE IF NOT EXISTS Anchor_freq_index (id INTEGER PRIMARY KEY, freq INTEGER, time INTEGER, song_id INTEGER);
CREATE TABLE IF NOT EXISTS Check_freq_index (Anchor_id INTEGER, freq INTEGER, time_offset INTEGER);
CREATE TABLE IF NOT EXISTS WorkOption (name TEXT PRIMARY KEY, value INTEGER);
CREATE INDEX IF NOT EXISTS idx_anchor_freq ON Anchor_freq_index (freq);
CREATE INDEX IF NOT EXISTS idx_check_anchor ON Check_freq_index (Anchor_id, freq, time_offset);
";

/// The fingerprint index store.
///
/// Single writer: enrollment takes `&mut self` and wraps each song in one
/// transaction, matching only ever reads. Busy or locked databases surface
/// as `TransactionConflict` so the caller can retry the song; everything
/// else is `StoreUnavailable`.
pub struct IndexStore {
    conn: Connection,
}

fn store_error(error: rusqlite::Error) -> SoundPrintError {
    match &error {
        rusqlite::Error::SqliteFailure(code, _)
            if code.code == ErrorCode::DatabaseBusy || code.code == ErrorCode::DatabaseLocked =>
        {
            SoundPrintError::TransactionConflict(error.to_string())
        }
        _ => SoundPrintError::StoreUnavailable(error.to_string()),
    }
}

impl IndexStore {
    /// Open (creating and initializing if needed) the store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path).map_err(store_error)?;
        Self::with_connection(conn)
    }

    /// In-memory store, mainly for tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(store_error)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA).map_err(store_error)?;
        Ok(Self { conn })
    }

    /// Insert a song row and return its id. Names are free text; the same
    /// name may be enrolled more than once.
    pub fn insert_song(&mut self, name: &str) -> Result<i64> {
        insert_song_on(&self.conn, name)
    }

    pub fn insert_anchor(&mut self, freq: i64, time: i64, song_id: i64) -> Result<i64> {
        insert_anchor_on(&self.conn, freq, time, song_id)
    }

    pub fn insert_target(&mut self, anchor_id: i64, freq: i64, time_offset: i64) -> Result<()> {
        insert_target_on(&self.conn, anchor_id, freq, time_offset)
    }

    /// All anchors whose frequency bin matches exactly.
    pub fn find_anchors_by_freq(&self, freq: i64) -> Result<Vec<Anchor>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT id, freq, time, song_id FROM Anchor_freq_index WHERE freq = ?1")
            .map_err(store_error)?;
        let rows = stmt
            .query_map(params![freq], |row| {
                Ok(Anchor {
                    id: row.get(0)?,
                    freq: row.get(1)?,
                    time: row.get(2)?,
                    song_id: row.get(3)?,
                })
            })
            .map_err(store_error)?;

        let mut anchors = Vec::new();
        for row in rows {
            anchors.push(row.map_err(store_error)?);
        }
        Ok(anchors)
    }

    /// Count the targets of `anchor_id` inside the closed frequency and
    /// offset intervals.
    pub fn count_targets(&self, anchor_id: i64, freq_lo: i64, freq_hi: i64, off_lo: i64, off_hi: i64) -> Result<i64> {
        let mut stmt = self
            .conn
            .prepare_cached(
                "SELECT COUNT(*) FROM Check_freq_index \
                 WHERE Anchor_id = ?1 AND freq BETWEEN ?2 AND ?3 AND time_offset BETWEEN ?4 AND ?5",
            )
            .map_err(store_error)?;
        stmt.query_row(params![anchor_id, freq_lo, freq_hi, off_lo, off_hi], |row| row.get(0))
            .map_err(store_error)
    }

    /// The first song with an id greater than `id`, in id order. Drives the
    /// upload cursor.
    pub fn iterate_songs_after(&self, id: i64) -> Result<Option<Song>> {
        self.conn
            .query_row(
                "SELECT id, name FROM songlist WHERE id > ?1 ORDER BY id LIMIT 1",
                params![id],
                |row| {
                    Ok(Song {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()
            .map_err(store_error)
    }

    pub fn song_by_id(&self, id: i64) -> Result<Option<Song>> {
        self.conn
            .query_row("SELECT id, name FROM songlist WHERE id = ?1", params![id], |row| {
                Ok(Song {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })
            .optional()
            .map_err(store_error)
    }

    /// All anchors of one song, for the upload payload.
    pub fn anchors_by_song(&self, song_id: i64) -> Result<Vec<Anchor>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT id, freq, time, song_id FROM Anchor_freq_index WHERE song_id = ?1")
            .map_err(store_error)?;
        let rows = stmt
            .query_map(params![song_id], |row| {
                Ok(Anchor {
                    id: row.get(0)?,
                    freq: row.get(1)?,
                    time: row.get(2)?,
                    song_id: row.get(3)?,
                })
            })
            .map_err(store_error)?;

        let mut anchors = Vec::new();
        for row in rows {
            anchors.push(row.map_err(store_error)?);
        }
        Ok(anchors)
    }

    /// All targets of one anchor, for the upload payload.
    pub fn targets_by_anchor(&self, anchor_id: i64) -> Result<Vec<Target>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT freq, time_offset FROM Check_freq_index WHERE Anchor_id = ?1")
            .map_err(store_error)?;
        let rows = stmt
            .query_map(params![anchor_id], |row| {
                Ok(Target {
                    freq: row.get(0)?,
                    time_offset: row.get(1)?,
                })
            })
            .map_err(store_error)?;

        let mut targets = Vec::new();
        for row in rows {
            targets.push(row.map_err(store_error)?);
        }
        Ok(targets)
    }

    pub fn get_option(&self, name: &str) -> Result<Option<i64>> {
        self.conn
            .query_row("SELECT value FROM WorkOption WHERE name = ?1", params![name], |row| row.get(0))
            .optional()
            .map_err(store_error)
    }

    pub fn set_option(&mut self, name: &str, value: i64) -> Result<()> {
        self.conn
            .execute("REPLACE INTO WorkOption (name, value) VALUES (?1, ?2)", params![name, value])
            .map_err(store_error)?;
        Ok(())
    }

    /// Begin the single write transaction covering one song's enrollment.
    pub fn song_transaction(&mut self) -> Result<SongWriter<'_>> {
        let tx = self.conn.transaction().map_err(store_error)?;
        Ok(SongWriter { tx })
    }
}

/// Write handle scoped to one song. Dropping it without `commit` rolls the
/// whole song back, anchors and targets included.
pub struct SongWriter<'conn> {
    tx: Transaction<'conn>,
}

impl<'conn> SongWriter<'conn> {
    pub fn insert_song(&self, name: &str) -> Result<i64> {
        insert_song_on(&self.tx, name)
    }

    pub fn insert_anchor(&self, freq: i64, time: i64, song_id: i64) -> Result<i64> {
        insert_anchor_on(&self.tx, freq, time, song_id)
    }

    pub fn insert_target(&self, anchor_id: i64, freq: i64, time_offset: i64) -> Result<()> {
        insert_target_on(&self.tx, anchor_id, freq, time_offset)
    }

    pub fn commit(self) -> Result<()> {
        self.tx.commit().map_err(store_error)
    }
}

fn insert_song_on(conn: &Connection, name: &str) -> Result<i64> {
    conn.execute("INSERT INTO songlist (name) VALUES (?1)", params![name])
        .map_err(store_error)?;
    Ok(conn.last_insert_rowid())
}

fn insert_anchor_on(conn: &Connection, freq: i64, time: i64, song_id: i64) -> Result<i64> {
    conn.execute(
        "INSERT INTO Anchor_freq_index (freq, time, song_id) VALUES (?1, ?2, ?3)",
        params![freq, time, song_id],
    )
    .map_err(store_error)?;
    Ok(conn.last_insert_rowid())
}

fn insert_target_on(conn: &Connection, anchor_id: i64, freq: i64, time_offset: i64) -> Result<()> {
    conn.execute(
        "INSERT INTO Check_freq_index (Anchor_id, freq, time_offset) VALUES (?1, ?2, ?3)",
        params![anchor_id, freq, time_offset],
    )
    .map_err(store_error)?;
    Ok(())
}
