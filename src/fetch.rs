#![forbid(unsafe_code)]

//! Fetch reconciliation: pulls new videos from a playlist's sources and
//! appends them to the playlist in chronological order.
//!
//! Each source remembers the IDs it saw most recently (its watermark).
//! A fetch lists the channel newest-first, scans until it reaches something
//! already known or out of bounds, then reverses what it kept so the oldest
//! new video ends up first in the playlist.

use std::io::{self, Write};

use chrono::{DateTime, Utc};

use crate::config::DEFAULT_FETCH_LIMIT_SINGLE_SOURCE;
use crate::error::{Error, Result};
use crate::lister::{Candidate, ChannelLister};
use crate::model::{QueueStream, StreamSource, StreamSourceType};
use crate::store::FetchStore;
use crate::title::sanitize;
use crate::watermark::Watermark;

/// Date bounds and mode shared by every source of one fetch call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchWindow {
    pub take_after: Option<DateTime<Utc>>,
    pub take_before: Option<DateTime<Utc>>,
    /// Decide novelty by remembered IDs instead of by date.
    pub take_new_only: bool,
}

impl FetchWindow {
    pub fn new_only() -> Self {
        Self {
            take_new_only: true,
            ..Self::default()
        }
    }
}

/// What the scan does with one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanStep {
    Stop,
    Skip,
    Take,
}

/// Scan rules, checked in this order; the first that fires decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanRule {
    AlreadySeen,
    OlderThanLowerBound,
    NewerThanUpperBound,
    BatchExhausted,
}

const SCAN_RULES: [ScanRule; 4] = [
    ScanRule::AlreadySeen,
    ScanRule::OlderThanLowerBound,
    ScanRule::NewerThanUpperBound,
    ScanRule::BatchExhausted,
];

struct ScanContext<'a> {
    watermark: &'a Watermark,
    window: FetchWindow,
    batch_size: usize,
}

impl ScanRule {
    /// `examined` counts the current candidate too.
    fn apply(self, candidate: &Candidate, examined: usize, ctx: &ScanContext<'_>) -> Option<ScanStep> {
        let window = &ctx.window;
        let fired = match self {
            Self::AlreadySeen => window.take_new_only && ctx.watermark.contains(&candidate.id),
            Self::OlderThanLowerBound => {
                !window.take_new_only
                    && matches!(
                        (window.take_after, candidate.publish_date),
                        (Some(bound), Some(published)) if published < bound
                    )
            }
            Self::NewerThanUpperBound => {
                !window.take_new_only
                    && matches!(
                        (window.take_before, candidate.publish_date),
                        (Some(bound), Some(published)) if published > bound
                    )
            }
            Self::BatchExhausted => examined > ctx.batch_size,
        };
        if !fired {
            return None;
        }
        Some(match self {
            Self::NewerThanUpperBound => ScanStep::Skip,
            _ => ScanStep::Stop,
        })
    }
}

fn scan_step(candidate: &Candidate, examined: usize, ctx: &ScanContext<'_>) -> ScanStep {
    SCAN_RULES
        .iter()
        .find_map(|rule| rule.apply(candidate, examined, ctx))
        .unwrap_or(ScanStep::Take)
}

/// Rejects batch sizes below one before anything is touched.
pub fn checked_batch_size(batch_size: i64) -> Result<usize> {
    if batch_size < 1 {
        return Err(Error::argument(format!(
            "batch size must be at least 1, got {batch_size}"
        )));
    }
    usize::try_from(batch_size).map_err(|_| Error::argument("batch size is too large"))
}

/// Placeholder strategy for local directories: nothing new, watermark kept.
pub fn fetch_from_directory(
    source: Option<&StreamSource>,
) -> Result<(Vec<QueueStream>, Vec<String>)> {
    let source = source.ok_or_else(|| Error::argument("stream source is required"))?;
    tracing::debug!(source = %source.name, "directory sources have no fetch strategy yet");
    Ok((Vec::new(), source.last_fetched_ids.clone()))
}

pub struct FetchService<S, L> {
    store: S,
    lister: L,
    list_limit: usize,
}

impl<S, L> FetchService<S, L>
where
    S: FetchStore,
    L: ChannelLister,
{
    pub fn new(store: S, lister: L) -> Self {
        Self {
            store,
            lister,
            list_limit: DEFAULT_FETCH_LIMIT_SINGLE_SOURCE,
        }
    }

    /// Caps how many entries the lister is asked for per source.
    pub fn with_list_limit(mut self, list_limit: usize) -> Self {
        self.list_limit = list_limit.max(1);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn lister(&self) -> &L {
        &self.lister
    }

    /// Fetches every enabled source of the playlist and appends the new
    /// streams to it. Returns how many streams the playlist actually took.
    pub async fn fetch(
        &self,
        playlist_id: &str,
        batch_size: i64,
        window: FetchWindow,
    ) -> Result<usize> {
        Ok(self.fetch_streams(playlist_id, batch_size, window).await?.len())
    }

    /// Same as [`fetch`](Self::fetch) but hands back the appended streams.
    pub async fn fetch_streams(
        &self,
        playlist_id: &str,
        batch_size: i64,
        window: FetchWindow,
    ) -> Result<Vec<QueueStream>> {
        let batch_size = checked_batch_size(batch_size)?;

        let Some(playlist) = self.store.get_playlist(playlist_id).await? else {
            tracing::warn!(playlist_id, "playlist not found, nothing fetched");
            return Ok(Vec::new());
        };

        let mut new_streams: Vec<QueueStream> = Vec::new();
        for source_id in &playlist.stream_source_ids {
            let Some(mut source) = self.store.get_stream_source(source_id).await? else {
                tracing::warn!(
                    %source_id,
                    playlist = %playlist.name,
                    "stream source not found, consider purging playlists"
                );
                continue;
            };
            if !source.enable_fetch {
                continue;
            }

            // In new-only mode the last successful fetch stands in for the
            // caller's lower bound.
            let source_window = FetchWindow {
                take_after: if window.take_new_only {
                    source.last_successful_fetched
                } else {
                    window.take_after
                },
                ..window
            };

            let (fetched, ids) = match (source.is_web, source.source_type) {
                (true, StreamSourceType::Youtube) => {
                    self.fetch_from_channel(Some(&source), batch_size, source_window)?
                }
                (_, kind) => {
                    tracing::warn!(
                        source = %source.name,
                        kind = kind.as_str(),
                        "no fetch strategy for this source type, skipping"
                    );
                    continue;
                }
            };

            let now = Utc::now();
            source.last_fetched = Some(now);
            source.last_fetched_ids = ids;
            if !fetched.is_empty() {
                source.last_successful_fetched = Some(now);
            }

            match self.store.update_stream_source(&source).await {
                Ok(true) => {
                    println!("{}: {} new", source.name, fetched.len());
                    new_streams.extend(fetched);
                }
                Ok(false) => tracing::warn!(
                    source = %source.name,
                    id = %source.id,
                    dropped = fetched.len(),
                    "could not update source, its streams were not added"
                ),
                Err(err) => tracing::warn!(
                    source = %source.name,
                    id = %source.id,
                    dropped = fetched.len(),
                    error = %err,
                    "could not update source, its streams were not added"
                ),
            }
            let _ = io::stdout().flush();
        }

        if new_streams.is_empty() {
            return Ok(Vec::new());
        }
        match self.store.add_streams(&playlist.id, &new_streams).await {
            Ok(applied) => Ok(applied),
            Err(err) => {
                tracing::warn!(
                    playlist = %playlist.name,
                    error = %err,
                    "could not add fetched streams to playlist"
                );
                Ok(Vec::new())
            }
        }
    }

    /// The YouTube strategy: returns the new streams oldest-first together
    /// with the source's updated watermark.
    pub fn fetch_from_channel(
        &self,
        source: Option<&StreamSource>,
        batch_size: usize,
        window: FetchWindow,
    ) -> Result<(Vec<QueueStream>, Vec<String>)> {
        let source = source.ok_or_else(|| Error::argument("stream source is required"))?;
        let unchanged = || (Vec::new(), source.last_fetched_ids.clone());

        tracing::debug!(source = %source.name, uri = %source.uri, "listing channel");
        let channel = match self.lister.list_channel(&source.uri, self.list_limit) {
            Ok(Some(channel)) => channel,
            Ok(None) => {
                tracing::warn!(
                    source = %source.name,
                    uri = %source.uri,
                    "channel could not be found or is not valid, remove it and add it back"
                );
                return Ok(unchanged());
            }
            Err(err) => {
                tracing::warn!(source = %source.name, error = %err, "listing channel failed");
                return Ok(unchanged());
            }
        };

        let Some(last_seen_id) = channel.videos.first().map(|video| video.id.clone()) else {
            tracing::warn!(channel = %channel.name, "channel has no videos");
            return Ok(unchanged());
        };

        let mut watermark =
            Watermark::from_ids(source.last_fetched_ids.iter().cloned(), batch_size);

        if window.take_new_only && window.take_after.is_none() && watermark.contains(&last_seen_id) {
            tracing::debug!(channel = %channel.name, "no new videos since last fetch");
            return Ok(unchanged());
        }

        let ctx = ScanContext {
            watermark: &watermark,
            window,
            batch_size,
        };
        let mut accepted: Vec<&Candidate> = Vec::new();
        for (index, candidate) in channel.videos.iter().enumerate() {
            match scan_step(candidate, index + 1, &ctx) {
                ScanStep::Stop => break,
                ScanStep::Skip => continue,
                ScanStep::Take => accepted.push(candidate),
            }
        }
        accepted.reverse();

        let now = Utc::now();
        let streams = accepted
            .into_iter()
            .map(|candidate| to_queue_stream(candidate, source, now))
            .collect();

        watermark.push(last_seen_id);
        Ok((streams, watermark.into_vec()))
    }

    /// Clears fetched streams and source bookkeeping so the next fetch starts
    /// over. Returns how many playlists were reset without any failure.
    pub async fn reset_fetch_status(&self, playlist_ids: &[String]) -> Result<usize> {
        let mut reset = 0;
        for playlist_id in playlist_ids {
            let Some(mut playlist) = self.store.get_playlist(playlist_id).await? else {
                tracing::warn!(%playlist_id, "playlist not found, not reset");
                continue;
            };

            let mut failures = 0usize;
            for stream_id in &playlist.stream_ids {
                match self.store.delete_queue_stream(stream_id).await {
                    Ok(true) => {}
                    Ok(false) => tracing::debug!(%stream_id, "stream already deleted"),
                    Err(err) => {
                        failures += 1;
                        tracing::warn!(%stream_id, error = %err, "could not delete stream");
                    }
                }
            }

            playlist.stream_ids.clear();
            if !self.store.update_playlist(&playlist).await.unwrap_or(false) {
                failures += 1;
                tracing::warn!(playlist = %playlist.name, "could not clear playlist streams");
            }

            for source_id in &playlist.stream_source_ids {
                let Some(mut source) = self.store.get_stream_source(source_id).await? else {
                    failures += 1;
                    tracing::warn!(%source_id, "stream source not found, not reset");
                    continue;
                };
                source.last_fetched = None;
                source.last_fetched_ids.clear();
                if !self.store.update_stream_source(&source).await.unwrap_or(false) {
                    failures += 1;
                    tracing::warn!(source = %source.name, "could not reset stream source");
                }
            }

            if failures == 0 {
                reset += 1;
            } else {
                tracing::warn!(playlist = %playlist.name, failures, "playlist partially reset");
            }
        }
        Ok(reset)
    }
}

fn to_queue_stream(candidate: &Candidate, source: &StreamSource, now: DateTime<Utc>) -> QueueStream {
    let mut stream = QueueStream::new(sanitize(&candidate.title), candidate.watch_url.clone());
    stream.is_web = true;
    stream.stream_source_id = Some(source.id.clone());
    stream.background_content = source.background_content;
    stream.added = now;
    stream
}
