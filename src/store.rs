#![forbid(unsafe_code)]

//! SQLite persistence for playlists, queue streams and stream sources.
//!
//! Every entity supports soft delete (a `deleted` timestamp) next to a hard
//! `remove`. ID lists and watermarks are stored as JSON text columns.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use libsql::{Builder, Connection, Row, params};

use crate::model::{Playlist, QueueStream, StreamSource, StreamSourceType};

pub const DATABASE_FILE: &str = "streamqueue.db";

const PLAYLIST_COLUMNS: &str = "id, name, play_watched_streams, allow_duplicates, \
     stream_ids_json, stream_source_ids_json, added, deleted";
const QUEUE_STREAM_COLUMNS: &str = "id, name, uri, is_web, stream_source_id, watched, \
     background_content, added, deleted";
const STREAM_SOURCE_COLUMNS: &str = "id, name, uri, is_web, source_type, enable_fetch, \
     background_content, last_fetched, last_successful_fetched, last_fetched_ids_json, \
     added, deleted";

/// The subset of store operations the fetch reconciler needs. Kept as a
/// trait so tests can inject failures.
#[allow(async_fn_in_trait)]
pub trait FetchStore {
    async fn get_playlist(&self, id: &str) -> Result<Option<Playlist>>;
    async fn get_stream_source(&self, id: &str) -> Result<Option<StreamSource>>;
    async fn update_playlist(&self, playlist: &Playlist) -> Result<bool>;
    async fn update_stream_source(&self, source: &StreamSource) -> Result<bool>;
    async fn delete_queue_stream(&self, id: &str) -> Result<bool>;
    async fn add_streams(
        &self,
        playlist_id: &str,
        streams: &[QueueStream],
    ) -> Result<Vec<QueueStream>>;
}

async fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode=WAL;
        PRAGMA synchronous=NORMAL;
        "#,
    )
    .await?;
    Ok(())
}

async fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS playlists (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            play_watched_streams INTEGER NOT NULL DEFAULT 1,
            allow_duplicates INTEGER NOT NULL DEFAULT 1,
            stream_ids_json TEXT NOT NULL DEFAULT '[]',
            stream_source_ids_json TEXT NOT NULL DEFAULT '[]',
            added TEXT NOT NULL,
            deleted TEXT
        );

        CREATE TABLE IF NOT EXISTS queue_streams (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            uri TEXT NOT NULL,
            is_web INTEGER NOT NULL DEFAULT 1,
            stream_source_id TEXT,
            watched TEXT,
            background_content INTEGER NOT NULL DEFAULT 0,
            added TEXT NOT NULL,
            deleted TEXT
        );

        CREATE TABLE IF NOT EXISTS stream_sources (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            uri TEXT NOT NULL,
            is_web INTEGER NOT NULL DEFAULT 1,
            source_type TEXT NOT NULL,
            enable_fetch INTEGER NOT NULL DEFAULT 0,
            background_content INTEGER NOT NULL DEFAULT 0,
            last_fetched TEXT,
            last_successful_fetched TEXT,
            last_fetched_ids_json TEXT NOT NULL DEFAULT '[]',
            added TEXT NOT NULL,
            deleted TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_queue_streams_source ON queue_streams(stream_source_id);
        "#,
    )
    .await?;
    Ok(())
}

fn format_ts(value: Option<DateTime<Utc>>) -> Option<String> {
    value.map(|ts| ts.to_rfc3339())
}

fn parse_ts(value: Option<String>) -> Result<Option<DateTime<Utc>>> {
    value
        .map(|raw| {
            DateTime::parse_from_rfc3339(&raw)
                .map(|ts| ts.with_timezone(&Utc))
                .with_context(|| format!("parsing stored timestamp {raw}"))
        })
        .transpose()
}

fn parse_required_ts(value: String) -> Result<DateTime<Utc>> {
    parse_ts(Some(value))?.context("missing timestamp")
}

fn parse_ids(raw: &str, label: &str) -> Result<Vec<String>> {
    serde_json::from_str(raw).with_context(|| format!("parsing stored {label} JSON"))
}

fn include_flag(include_soft_deleted: bool) -> i64 {
    include_soft_deleted as i64
}

async fn insert_queue_stream(conn: &Connection, stream: &QueueStream) -> Result<()> {
    conn.execute(
            &format!(
                "INSERT INTO queue_streams ({QUEUE_STREAM_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
            ),
            params![
                stream.id.as_str(),
                stream.name.as_str(),
                stream.uri.as_str(),
                stream.is_web as i64,
                stream.stream_source_id.as_deref(),
                format_ts(stream.watched),
                stream.background_content as i64,
                stream.added.to_rfc3339(),
                format_ts(stream.deleted),
            ],
        )
        .await
        .with_context(|| format!("inserting queue stream {}", stream.id))?;
    Ok(())
}

async fn write_playlist(conn: &Connection, playlist: &Playlist) -> Result<bool> {
    let stream_ids_json = serde_json::to_string(&playlist.stream_ids)?;
    let source_ids_json = serde_json::to_string(&playlist.stream_source_ids)?;
    let affected = conn
        .execute(
            r#"
            UPDATE playlists SET
                name = ?2,
                play_watched_streams = ?3,
                allow_duplicates = ?4,
                stream_ids_json = ?5,
                stream_source_ids_json = ?6,
                deleted = ?7
            WHERE id = ?1
            "#,
            params![
                playlist.id.as_str(),
                playlist.name.as_str(),
                playlist.play_watched_streams as i64,
                playlist.allow_duplicates as i64,
                stream_ids_json,
                source_ids_json,
                format_ts(playlist.deleted),
            ],
        )
        .await
        .with_context(|| format!("updating playlist {}", playlist.id))?;
    Ok(affected > 0)
}

/// Inserts the streams the playlist accepts and saves its ID list, all on
/// `conn`. Returns the applied streams; empty when the playlist row did not
/// update.
async fn stage_streams(
    conn: &Connection,
    playlist: &mut Playlist,
    streams: &[QueueStream],
    mut known_uris: Vec<String>,
) -> Result<Vec<QueueStream>> {
    let mut applied = Vec::new();
    for stream in streams {
        if !playlist.allow_duplicates && known_uris.iter().any(|uri| uri == &stream.uri) {
            tracing::debug!(uri = %stream.uri, "skipping duplicate stream");
            continue;
        }
        insert_queue_stream(conn, stream).await?;
        playlist.stream_ids.push(stream.id.clone());
        known_uris.push(stream.uri.clone());
        applied.push(stream.clone());
    }
    if applied.is_empty() || !write_playlist(conn, playlist).await? {
        return Ok(Vec::new());
    }
    Ok(applied)
}

/// Handle around a single libsql connection.
#[derive(Debug)]
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Opens (and if necessary creates) the database and its schema.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating storage directory {}", parent.display()))?;
        }

        let db = Builder::new_local(path)
            .build()
            .await
            .with_context(|| format!("opening database {}", path.display()))?;
        let conn = db.connect()?;
        configure_connection(&conn).await?;
        ensure_schema(&conn).await?;
        Ok(Self { conn })
    }

    /// Opens `streamqueue.db` inside the configured storage directory.
    pub async fn open_in(storage_dir: &Path) -> Result<Self> {
        Self::open(&storage_dir.join(DATABASE_FILE)).await
    }

    // Playlists

    pub async fn add_playlist(&self, playlist: &Playlist) -> Result<()> {
        let stream_ids_json = serde_json::to_string(&playlist.stream_ids)?;
        let source_ids_json = serde_json::to_string(&playlist.stream_source_ids)?;
        self.conn
            .execute(
                &format!(
                    "INSERT INTO playlists ({PLAYLIST_COLUMNS}) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
                ),
                params![
                    playlist.id.as_str(),
                    playlist.name.as_str(),
                    playlist.play_watched_streams as i64,
                    playlist.allow_duplicates as i64,
                    stream_ids_json,
                    source_ids_json,
                    playlist.added.to_rfc3339(),
                    format_ts(playlist.deleted),
                ],
            )
            .await
            .with_context(|| format!("inserting playlist {}", playlist.id))?;
        Ok(())
    }

    pub async fn playlist(&self, id: &str, include_soft_deleted: bool) -> Result<Option<Playlist>> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT {PLAYLIST_COLUMNS} FROM playlists \
                     WHERE id = ?1 AND (?2 = 1 OR deleted IS NULL)"
                ),
                params![id, include_flag(include_soft_deleted)],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_playlist(&row)?)),
            None => Ok(None),
        }
    }

    /// Playlists in creation order, which is also the order `i<index>`
    /// arguments refer to.
    pub async fn playlists(&self, include_soft_deleted: bool) -> Result<Vec<Playlist>> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT {PLAYLIST_COLUMNS} FROM playlists \
                     WHERE ?1 = 1 OR deleted IS NULL ORDER BY added ASC, rowid ASC"
                ),
                params![include_flag(include_soft_deleted)],
            )
            .await?;
        let mut playlists = Vec::new();
        while let Some(row) = rows.next().await? {
            playlists.push(row_to_playlist(&row)?);
        }
        Ok(playlists)
    }

    pub async fn playlist_ids(&self, include_soft_deleted: bool) -> Result<Vec<String>> {
        self.ids_from("playlists", include_soft_deleted).await
    }

    pub async fn update_playlist(&self, playlist: &Playlist) -> Result<bool> {
        write_playlist(&self.conn, playlist).await
    }

    pub async fn delete_playlist(&self, id: &str) -> Result<bool> {
        self.soft_delete("playlists", id).await
    }

    pub async fn restore_playlist(&self, id: &str) -> Result<bool> {
        self.restore("playlists", id).await
    }

    pub async fn remove_playlist(&self, id: &str, include_soft_deleted: bool) -> Result<bool> {
        self.hard_remove("playlists", id, include_soft_deleted).await
    }

    pub async fn playlist_exists(&self, id: &str) -> Result<bool> {
        self.exists_in("playlists", id).await
    }

    /// Inserts `streams` and appends their IDs to the playlist in the given
    /// order. Returns the streams that were actually applied; when the
    /// playlist refuses duplicates, streams whose URI it already holds are
    /// left out.
    pub async fn add_streams(
        &self,
        playlist_id: &str,
        streams: &[QueueStream],
    ) -> Result<Vec<QueueStream>> {
        let Some(mut playlist) = self.playlist(playlist_id, false).await? else {
            return Ok(Vec::new());
        };
        if streams.is_empty() {
            return Ok(Vec::new());
        }

        let known_uris: Vec<String> = if playlist.allow_duplicates {
            Vec::new()
        } else {
            self.streams_by_playlist_id(playlist_id, false)
                .await?
                .into_iter()
                .map(|stream| stream.uri)
                .collect()
        };

        // Rows and the playlist's ID list land together or not at all.
        let tx = self.conn.transaction().await?;
        match stage_streams(&tx, &mut playlist, streams, known_uris).await {
            Ok(applied) if !applied.is_empty() => {
                tx.commit()
                    .await
                    .with_context(|| format!("committing streams for playlist {playlist_id}"))?;
                Ok(applied)
            }
            Ok(_) => {
                tx.rollback().await?;
                Ok(Vec::new())
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "rolling back stream append failed");
                }
                Err(err)
            }
        }
    }

    /// Soft-deletes the given streams. IDs stay in the playlist so the
    /// streams can be restored later.
    pub async fn delete_streams(
        &self,
        playlist_id: &str,
        stream_ids: &[String],
    ) -> Result<Vec<QueueStream>> {
        let Some(playlist) = self.playlist(playlist_id, false).await? else {
            return Ok(Vec::new());
        };
        let mut deleted = Vec::new();
        for id in stream_ids {
            if !playlist.stream_ids.contains(id) {
                continue;
            }
            let Some(stream) = self.queue_stream(id, false).await? else {
                continue;
            };
            if self.delete_queue_stream(id).await? {
                deleted.push(stream);
            }
        }
        Ok(deleted)
    }

    pub async fn restore_streams(
        &self,
        playlist_id: &str,
        stream_ids: &[String],
    ) -> Result<Vec<QueueStream>> {
        let Some(playlist) = self.playlist(playlist_id, false).await? else {
            return Ok(Vec::new());
        };
        let mut restored = Vec::new();
        for id in stream_ids {
            if !playlist.stream_ids.contains(id) {
                continue;
            }
            if self.restore_queue_stream(id).await?
                && let Some(stream) = self.queue_stream(id, false).await?
            {
                restored.push(stream);
            }
        }
        Ok(restored)
    }

    /// Streams of a playlist in playback order. Dangling IDs are skipped.
    pub async fn streams_by_playlist_id(
        &self,
        playlist_id: &str,
        include_soft_deleted: bool,
    ) -> Result<Vec<QueueStream>> {
        let Some(playlist) = self.playlist(playlist_id, include_soft_deleted).await? else {
            return Ok(Vec::new());
        };
        let mut streams = Vec::with_capacity(playlist.stream_ids.len());
        for id in &playlist.stream_ids {
            if let Some(stream) = self.queue_stream(id, include_soft_deleted).await? {
                streams.push(stream);
            }
        }
        Ok(streams)
    }

    pub async fn sources_by_playlist_id(
        &self,
        playlist_id: &str,
        include_soft_deleted: bool,
    ) -> Result<Vec<StreamSource>> {
        let Some(playlist) = self.playlist(playlist_id, include_soft_deleted).await? else {
            return Ok(Vec::new());
        };
        let mut sources = Vec::with_capacity(playlist.stream_source_ids.len());
        for id in &playlist.stream_source_ids {
            if let Some(source) = self.stream_source(id, include_soft_deleted).await? {
                sources.push(source);
            }
        }
        Ok(sources)
    }

    // Queue streams

    pub async fn add_queue_stream(&self, stream: &QueueStream) -> Result<()> {
        insert_queue_stream(&self.conn, stream).await
    }

    pub async fn queue_stream(
        &self,
        id: &str,
        include_soft_deleted: bool,
    ) -> Result<Option<QueueStream>> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT {QUEUE_STREAM_COLUMNS} FROM queue_streams \
                     WHERE id = ?1 AND (?2 = 1 OR deleted IS NULL)"
                ),
                params![id, include_flag(include_soft_deleted)],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_queue_stream(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn queue_streams(&self, include_soft_deleted: bool) -> Result<Vec<QueueStream>> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT {QUEUE_STREAM_COLUMNS} FROM queue_streams \
                     WHERE ?1 = 1 OR deleted IS NULL ORDER BY added ASC, rowid ASC"
                ),
                params![include_flag(include_soft_deleted)],
            )
            .await?;
        let mut streams = Vec::new();
        while let Some(row) = rows.next().await? {
            streams.push(row_to_queue_stream(&row)?);
        }
        Ok(streams)
    }

    pub async fn queue_stream_ids(&self, include_soft_deleted: bool) -> Result<Vec<String>> {
        self.ids_from("queue_streams", include_soft_deleted).await
    }

    pub async fn update_queue_stream(&self, stream: &QueueStream) -> Result<bool> {
        let affected = self
            .conn
            .execute(
                r#"
                UPDATE queue_streams SET
                    name = ?2,
                    uri = ?3,
                    is_web = ?4,
                    stream_source_id = ?5,
                    watched = ?6,
                    background_content = ?7,
                    deleted = ?8
                WHERE id = ?1
                "#,
                params![
                    stream.id.as_str(),
                    stream.name.as_str(),
                    stream.uri.as_str(),
                    stream.is_web as i64,
                    stream.stream_source_id.as_deref(),
                    format_ts(stream.watched),
                    stream.background_content as i64,
                    format_ts(stream.deleted),
                ],
            )
            .await
            .with_context(|| format!("updating queue stream {}", stream.id))?;
        Ok(affected > 0)
    }

    pub async fn delete_queue_stream(&self, id: &str) -> Result<bool> {
        self.soft_delete("queue_streams", id).await
    }

    pub async fn restore_queue_stream(&self, id: &str) -> Result<bool> {
        self.restore("queue_streams", id).await
    }

    pub async fn remove_queue_stream(&self, id: &str, include_soft_deleted: bool) -> Result<bool> {
        self.hard_remove("queue_streams", id, include_soft_deleted).await
    }

    pub async fn queue_stream_exists(&self, id: &str) -> Result<bool> {
        self.exists_in("queue_streams", id).await
    }

    // Stream sources

    pub async fn add_stream_source(&self, source: &StreamSource) -> Result<()> {
        let ids_json = serde_json::to_string(&source.last_fetched_ids)?;
        self.conn
            .execute(
                &format!(
                    "INSERT INTO stream_sources ({STREAM_SOURCE_COLUMNS}) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
                ),
                params![
                    source.id.as_str(),
                    source.name.as_str(),
                    source.uri.as_str(),
                    source.is_web as i64,
                    source.source_type.as_str(),
                    source.enable_fetch as i64,
                    source.background_content as i64,
                    format_ts(source.last_fetched),
                    format_ts(source.last_successful_fetched),
                    ids_json,
                    source.added.to_rfc3339(),
                    format_ts(source.deleted),
                ],
            )
            .await
            .with_context(|| format!("inserting stream source {}", source.id))?;
        Ok(())
    }

    pub async fn stream_source(
        &self,
        id: &str,
        include_soft_deleted: bool,
    ) -> Result<Option<StreamSource>> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT {STREAM_SOURCE_COLUMNS} FROM stream_sources \
                     WHERE id = ?1 AND (?2 = 1 OR deleted IS NULL)"
                ),
                params![id, include_flag(include_soft_deleted)],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_stream_source(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn stream_sources(&self, include_soft_deleted: bool) -> Result<Vec<StreamSource>> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT {STREAM_SOURCE_COLUMNS} FROM stream_sources \
                     WHERE ?1 = 1 OR deleted IS NULL ORDER BY added ASC, rowid ASC"
                ),
                params![include_flag(include_soft_deleted)],
            )
            .await?;
        let mut sources = Vec::new();
        while let Some(row) = rows.next().await? {
            sources.push(row_to_stream_source(&row)?);
        }
        Ok(sources)
    }

    pub async fn stream_source_ids(&self, include_soft_deleted: bool) -> Result<Vec<String>> {
        self.ids_from("stream_sources", include_soft_deleted).await
    }

    pub async fn update_stream_source(&self, source: &StreamSource) -> Result<bool> {
        let ids_json = serde_json::to_string(&source.last_fetched_ids)?;
        let affected = self
            .conn
            .execute(
                r#"
                UPDATE stream_sources SET
                    name = ?2,
                    uri = ?3,
                    is_web = ?4,
                    source_type = ?5,
                    enable_fetch = ?6,
                    background_content = ?7,
                    last_fetched = ?8,
                    last_successful_fetched = ?9,
                    last_fetched_ids_json = ?10,
                    deleted = ?11
                WHERE id = ?1
                "#,
                params![
                    source.id.as_str(),
                    source.name.as_str(),
                    source.uri.as_str(),
                    source.is_web as i64,
                    source.source_type.as_str(),
                    source.enable_fetch as i64,
                    source.background_content as i64,
                    format_ts(source.last_fetched),
                    format_ts(source.last_successful_fetched),
                    ids_json,
                    format_ts(source.deleted),
                ],
            )
            .await
            .with_context(|| format!("updating stream source {}", source.id))?;
        Ok(affected > 0)
    }

    pub async fn delete_stream_source(&self, id: &str) -> Result<bool> {
        self.soft_delete("stream_sources", id).await
    }

    pub async fn remove_stream_source(&self, id: &str, include_soft_deleted: bool) -> Result<bool> {
        self.hard_remove("stream_sources", id, include_soft_deleted).await
    }

    pub async fn stream_source_exists(&self, id: &str) -> Result<bool> {
        self.exists_in("stream_sources", id).await
    }

    // Shared helpers. `table` is always one of the constants above.

    async fn ids_from(&self, table: &str, include_soft_deleted: bool) -> Result<Vec<String>> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT id FROM {table} WHERE ?1 = 1 OR deleted IS NULL \
                     ORDER BY added ASC, rowid ASC"
                ),
                params![include_flag(include_soft_deleted)],
            )
            .await?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next().await? {
            ids.push(row.get::<String>(0)?);
        }
        Ok(ids)
    }

    async fn soft_delete(&self, table: &str, id: &str) -> Result<bool> {
        let affected = self
            .conn
            .execute(
                &format!("UPDATE {table} SET deleted = ?2 WHERE id = ?1 AND deleted IS NULL"),
                params![id, Utc::now().to_rfc3339()],
            )
            .await
            .with_context(|| format!("soft-deleting {id} from {table}"))?;
        Ok(affected > 0)
    }

    async fn restore(&self, table: &str, id: &str) -> Result<bool> {
        let affected = self
            .conn
            .execute(
                &format!("UPDATE {table} SET deleted = NULL WHERE id = ?1 AND deleted IS NOT NULL"),
                params![id],
            )
            .await
            .with_context(|| format!("restoring {id} in {table}"))?;
        Ok(affected > 0)
    }

    async fn hard_remove(&self, table: &str, id: &str, include_soft_deleted: bool) -> Result<bool> {
        let affected = self
            .conn
            .execute(
                &format!("DELETE FROM {table} WHERE id = ?1 AND (?2 = 1 OR deleted IS NULL)"),
                params![id, include_flag(include_soft_deleted)],
            )
            .await
            .with_context(|| format!("removing {id} from {table}"))?;
        Ok(affected > 0)
    }

    /// Soft-deleted rows do not count as existing.
    async fn exists_in(&self, table: &str, id: &str) -> Result<bool> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT 1 FROM {table} WHERE id = ?1 AND deleted IS NULL"),
                params![id],
            )
            .await?;
        Ok(rows.next().await?.is_some())
    }
}

impl FetchStore for Store {
    async fn get_playlist(&self, id: &str) -> Result<Option<Playlist>> {
        self.playlist(id, false).await
    }

    async fn get_stream_source(&self, id: &str) -> Result<Option<StreamSource>> {
        self.stream_source(id, false).await
    }

    async fn update_playlist(&self, playlist: &Playlist) -> Result<bool> {
        Store::update_playlist(self, playlist).await
    }

    async fn update_stream_source(&self, source: &StreamSource) -> Result<bool> {
        Store::update_stream_source(self, source).await
    }

    async fn delete_queue_stream(&self, id: &str) -> Result<bool> {
        Store::delete_queue_stream(self, id).await
    }

    async fn add_streams(
        &self,
        playlist_id: &str,
        streams: &[QueueStream],
    ) -> Result<Vec<QueueStream>> {
        Store::add_streams(self, playlist_id, streams).await
    }
}

// Column order must match the *_COLUMNS constants.

fn row_to_playlist(row: &Row) -> Result<Playlist> {
    let stream_ids_json: String = row.get(4)?;
    let source_ids_json: String = row.get(5)?;
    Ok(Playlist {
        id: row.get(0)?,
        name: row.get(1)?,
        play_watched_streams: row.get::<i64>(2)? != 0,
        allow_duplicates: row.get::<i64>(3)? != 0,
        stream_ids: parse_ids(&stream_ids_json, "stream ids")?,
        stream_source_ids: parse_ids(&source_ids_json, "stream source ids")?,
        added: parse_required_ts(row.get(6)?)?,
        deleted: parse_ts(row.get(7)?)?,
    })
}

fn row_to_queue_stream(row: &Row) -> Result<QueueStream> {
    Ok(QueueStream {
        id: row.get(0)?,
        name: row.get(1)?,
        uri: row.get(2)?,
        is_web: row.get::<i64>(3)? != 0,
        stream_source_id: row.get(4)?,
        watched: parse_ts(row.get(5)?)?,
        background_content: row.get::<i64>(6)? != 0,
        added: parse_required_ts(row.get(7)?)?,
        deleted: parse_ts(row.get(8)?)?,
    })
}

fn row_to_stream_source(row: &Row) -> Result<StreamSource> {
    let source_type: String = row.get(4)?;
    let ids_json: String = row.get(9)?;
    Ok(StreamSource {
        id: row.get(0)?,
        name: row.get(1)?,
        uri: row.get(2)?,
        is_web: row.get::<i64>(3)? != 0,
        source_type: StreamSourceType::parse(&source_type),
        enable_fetch: row.get::<i64>(5)? != 0,
        background_content: row.get::<i64>(6)? != 0,
        last_fetched: parse_ts(row.get(7)?)?,
        last_successful_fetched: parse_ts(row.get(8)?)?,
        last_fetched_ids: parse_ids(&ids_json, "last fetched ids")?,
        added: parse_required_ts(row.get(10)?)?,
        deleted: parse_ts(row.get(11)?)?,
    })
}
