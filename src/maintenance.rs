#![forbid(unsafe_code)]

//! Housekeeping over the whole store: prune, purge, search and the
//! soft-deleted listing.
//!
//! Destructive operations are split into a `prepare_*` step that only reads
//! and a `do_*` step that applies the prepared bundle, so callers can show a
//! summary and ask before anything changes.

use std::collections::HashSet;

use regex::{Regex, RegexBuilder};

use crate::error::{Error, Result};
use crate::model::{EntityBundle, Playlist};
use crate::store::Store;

/// Watched streams of a playlist that does not replay watched streams.
///
/// The playlist itself is returned as the bundle's only playlist so
/// [`do_prune`] knows where to drop the IDs from.
pub async fn prepare_prune(
    store: &Store,
    playlist_id: &str,
    include_soft_deleted: bool,
) -> Result<EntityBundle> {
    let playlist = store
        .playlist(playlist_id, include_soft_deleted)
        .await?
        .ok_or_else(|| Error::NotFound {
            kind: "Playlist",
            id: playlist_id.to_string(),
        })?;
    if playlist.play_watched_streams {
        return Ok(EntityBundle::default());
    }

    let queue_streams = store
        .streams_by_playlist_id(&playlist.id, include_soft_deleted)
        .await?
        .into_iter()
        .filter(|stream| stream.watched.is_some())
        .collect();
    Ok(EntityBundle {
        playlists: vec![playlist],
        queue_streams,
        stream_sources: Vec::new(),
    })
}

pub async fn do_prune(
    store: &Store,
    bundle: &EntityBundle,
    include_soft_deleted: bool,
    permanently: bool,
) -> Result<bool> {
    let Some(playlist) = bundle.playlists.first() else {
        return Ok(false);
    };
    if bundle.queue_streams.is_empty() {
        return Ok(false);
    }

    let mut playlist = playlist.clone();
    for stream in &bundle.queue_streams {
        let applied = if permanently {
            store.remove_queue_stream(&stream.id, include_soft_deleted).await?
        } else {
            store.delete_queue_stream(&stream.id).await?
        };
        if !applied {
            tracing::debug!(stream = %stream.id, "stream was already gone");
        }
        playlist.stream_ids.retain(|id| id != &stream.id);
    }
    Ok(store.update_playlist(&playlist).await?)
}

/// Every soft-deleted entity.
pub async fn prepare_purge(store: &Store) -> Result<EntityBundle> {
    get_all_soft_deleted(store).await
}

/// Permanently removes the entities of a bundle from [`prepare_purge`].
pub async fn do_purge(store: &Store, bundle: &EntityBundle) -> Result<bool> {
    if bundle.is_empty() {
        return Ok(false);
    }
    let mut all_removed = true;
    for stream in &bundle.queue_streams {
        all_removed &= store.remove_queue_stream(&stream.id, true).await?;
    }
    for source in &bundle.stream_sources {
        all_removed &= store.remove_stream_source(&source.id, true).await?;
    }
    for playlist in &bundle.playlists {
        all_removed &= store.remove_playlist(&playlist.id, true).await?;
    }
    Ok(all_removed)
}

/// Finds streams and sources no playlist refers to, and playlists holding
/// IDs of entities that no longer exist.
///
/// Playlists in the returned bundle already have their dangling IDs removed.
pub async fn prepare_purge_playlists(
    store: &Store,
    include_soft_deleted: bool,
) -> Result<EntityBundle> {
    let playlists = store.playlists(include_soft_deleted).await?;
    let linked_streams: HashSet<&str> = playlists
        .iter()
        .flat_map(|playlist| playlist.stream_ids.iter().map(String::as_str))
        .collect();
    let linked_sources: HashSet<&str> = playlists
        .iter()
        .flat_map(|playlist| playlist.stream_source_ids.iter().map(String::as_str))
        .collect();

    let mut bundle = EntityBundle::default();
    for stream in store.queue_streams(include_soft_deleted).await? {
        if !linked_streams.contains(stream.id.as_str()) {
            bundle.queue_streams.push(stream);
        }
    }
    for source in store.stream_sources(include_soft_deleted).await? {
        if !linked_sources.contains(source.id.as_str()) {
            bundle.stream_sources.push(source);
        }
    }

    let known_streams: HashSet<String> = store
        .queue_stream_ids(include_soft_deleted)
        .await?
        .into_iter()
        .collect();
    let known_sources: HashSet<String> = store
        .stream_source_ids(include_soft_deleted)
        .await?
        .into_iter()
        .collect();
    for playlist in &playlists {
        let mut cleaned = playlist.clone();
        cleaned.stream_ids.retain(|id| known_streams.contains(id));
        cleaned
            .stream_source_ids
            .retain(|id| known_sources.contains(id));
        if cleaned != *playlist {
            bundle.playlists.push(cleaned);
        }
    }
    Ok(bundle)
}

/// Applies a bundle from [`prepare_purge_playlists`]: unlinked entities are
/// deleted (or removed when `permanently`) and cleaned playlists saved.
pub async fn do_purge_playlists(
    store: &Store,
    bundle: &EntityBundle,
    include_soft_deleted: bool,
    permanently: bool,
) -> Result<bool> {
    if bundle.is_empty() {
        return Ok(false);
    }
    let mut all_applied = true;
    for stream in &bundle.queue_streams {
        all_applied &= if permanently {
            store.remove_queue_stream(&stream.id, include_soft_deleted).await?
        } else {
            store.delete_queue_stream(&stream.id).await?
        };
    }
    for source in &bundle.stream_sources {
        all_applied &= if permanently {
            store.remove_stream_source(&source.id, include_soft_deleted).await?
        } else {
            store.delete_stream_source(&source.id).await?
        };
    }
    for playlist in &bundle.playlists {
        all_applied &= store.update_playlist(playlist).await?;
    }
    Ok(all_applied)
}

/// Case-insensitive regex search over stream and source names and URIs and
/// playlist names.
pub async fn search(store: &Store, term: &str, include_soft_deleted: bool) -> Result<EntityBundle> {
    let pattern = build_search_pattern(term)?;
    let mut bundle = EntityBundle::default();

    bundle.queue_streams = store
        .queue_streams(include_soft_deleted)
        .await?
        .into_iter()
        .filter(|stream| pattern.is_match(&stream.name) || pattern.is_match(&stream.uri))
        .collect();
    bundle.stream_sources = store
        .stream_sources(include_soft_deleted)
        .await?
        .into_iter()
        .filter(|source| pattern.is_match(&source.name) || pattern.is_match(&source.uri))
        .collect();
    bundle.playlists = store
        .playlists(include_soft_deleted)
        .await?
        .into_iter()
        .filter(|playlist: &Playlist| pattern.is_match(&playlist.name))
        .collect();

    if bundle.is_empty() {
        tracing::debug!(term, "search found nothing");
    }
    Ok(bundle)
}

fn build_search_pattern(term: &str) -> Result<Regex> {
    RegexBuilder::new(term)
        .case_insensitive(true)
        .build()
        .map_err(|err| Error::argument(format!("invalid search pattern {term:?}: {err}")))
}

pub async fn get_all_soft_deleted(store: &Store) -> Result<EntityBundle> {
    Ok(EntityBundle {
        playlists: store
            .playlists(true)
            .await?
            .into_iter()
            .filter(|playlist| playlist.deleted.is_some())
            .collect(),
        queue_streams: store
            .queue_streams(true)
            .await?
            .into_iter()
            .filter(|stream| stream.deleted.is_some())
            .collect(),
        stream_sources: store
            .stream_sources(true)
            .await?
            .into_iter()
            .filter(|source| source.deleted.is_some())
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QueueStream, StreamSource};
    use chrono::Utc;
    use tempfile::tempdir;

    async fn create_store() -> anyhow::Result<(tempfile::TempDir, Store)> {
        let dir = tempdir()?;
        let store = Store::open_in(dir.path()).await?;
        Ok((dir, store))
    }

    async fn playlist_with_streams(
        store: &Store,
        replay_watched: bool,
        streams: &[(&str, bool)],
    ) -> anyhow::Result<(Playlist, Vec<QueueStream>)> {
        let mut playlist = Playlist::new("Later");
        playlist.play_watched_streams = replay_watched;
        store.add_playlist(&playlist).await?;
        let streams: Vec<_> = streams
            .iter()
            .map(|(name, watched)| {
                let mut stream = QueueStream::new(*name, format!("https://example.com/{name}"));
                if *watched {
                    stream.watched = Some(Utc::now());
                }
                stream
            })
            .collect();
        let applied = store.add_streams(&playlist.id, &streams).await?;
        let playlist = store.playlist(&playlist.id, false).await?.expect("playlist");
        Ok((playlist, applied))
    }

    #[tokio::test]
    async fn prune_only_targets_watched_streams() -> anyhow::Result<()> {
        let (_dir, store) = create_store().await?;
        let (playlist, streams) =
            playlist_with_streams(&store, false, &[("seen", true), ("unseen", false)]).await?;

        let bundle = prepare_prune(&store, &playlist.id, false).await?;
        assert_eq!(bundle.queue_streams.len(), 1);
        assert_eq!(bundle.queue_streams[0].name, "seen");

        assert!(do_prune(&store, &bundle, false, false).await?);
        let stored = store.playlist(&playlist.id, false).await?.expect("playlist");
        assert_eq!(stored.stream_ids, vec![streams[1].id.clone()]);
        let pruned = store.queue_stream(&streams[0].id, true).await?.expect("stream");
        assert!(pruned.deleted.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn prune_permanently_removes_rows() -> anyhow::Result<()> {
        let (_dir, store) = create_store().await?;
        let (playlist, streams) = playlist_with_streams(&store, false, &[("seen", true)]).await?;
        let bundle = prepare_prune(&store, &playlist.id, false).await?;
        assert!(do_prune(&store, &bundle, false, true).await?);
        assert!(store.queue_stream(&streams[0].id, true).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn prune_skips_replaying_playlists_and_reports_missing() -> anyhow::Result<()> {
        let (_dir, store) = create_store().await?;
        let (playlist, _) = playlist_with_streams(&store, true, &[("seen", true)]).await?;
        let bundle = prepare_prune(&store, &playlist.id, false).await?;
        assert!(bundle.is_empty());
        assert!(!do_prune(&store, &bundle, false, false).await?);

        let err = prepare_prune(&store, "missing", false).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: "Playlist", .. }));
        Ok(())
    }

    #[tokio::test]
    async fn purge_removes_only_soft_deleted() -> anyhow::Result<()> {
        let (_dir, store) = create_store().await?;
        let (_playlist, streams) =
            playlist_with_streams(&store, true, &[("gone", false), ("kept", false)]).await?;
        let source = StreamSource::new("Chan", "https://www.youtube.com/@chan", true);
        store.add_stream_source(&source).await?;
        store.delete_queue_stream(&streams[0].id).await?;
        store.delete_stream_source(&source.id).await?;

        let bundle = prepare_purge(&store).await?;
        assert_eq!(bundle.queue_streams.len(), 1);
        assert_eq!(bundle.stream_sources.len(), 1);
        assert!(bundle.playlists.is_empty());

        assert!(do_purge(&store, &bundle).await?);
        assert!(store.queue_stream(&streams[0].id, true).await?.is_none());
        assert!(store.stream_source(&source.id, true).await?.is_none());
        assert!(store.queue_stream(&streams[1].id, false).await?.is_some());
        assert!(get_all_soft_deleted(&store).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn purge_playlists_finds_unlinked_and_dangling() -> anyhow::Result<()> {
        let (_dir, store) = create_store().await?;
        let (mut playlist, streams) = playlist_with_streams(&store, true, &[("kept", false)]).await?;
        playlist.stream_ids.push("dangling-stream".into());
        playlist.stream_source_ids.push("dangling-source".into());
        store.update_playlist(&playlist).await?;

        let orphan = QueueStream::new("orphan", "https://example.com/orphan");
        store.add_queue_stream(&orphan).await?;
        let lonely = StreamSource::new("Lonely", "https://www.youtube.com/@lonely", true);
        store.add_stream_source(&lonely).await?;

        let bundle = prepare_purge_playlists(&store, false).await?;
        assert_eq!(bundle.queue_streams.len(), 1);
        assert_eq!(bundle.queue_streams[0].id, orphan.id);
        assert_eq!(bundle.stream_sources.len(), 1);
        assert_eq!(bundle.playlists.len(), 1);
        assert_eq!(bundle.playlists[0].stream_ids, vec![streams[0].id.clone()]);
        assert!(bundle.playlists[0].stream_source_ids.is_empty());

        assert!(do_purge_playlists(&store, &bundle, false, false).await?);
        let stored = store.playlist(&playlist.id, false).await?.expect("playlist");
        assert_eq!(stored.stream_ids, vec![streams[0].id.clone()]);
        assert!(store.queue_stream(&orphan.id, false).await?.is_none());
        assert!(store.queue_stream(&orphan.id, true).await?.is_some());
        assert!(prepare_purge_playlists(&store, false).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn search_is_case_insensitive_regex() -> anyhow::Result<()> {
        let (_dir, store) = create_store().await?;
        let (_playlist, _) =
            playlist_with_streams(&store, true, &[("Rust Talk", false), ("Cooking", false)]).await?;
        let source = StreamSource::new("Rustaceans", "https://www.youtube.com/@crab", true);
        store.add_stream_source(&source).await?;

        let found = search(&store, "^rust", false).await?;
        assert_eq!(found.queue_streams.len(), 1);
        assert_eq!(found.stream_sources.len(), 1);
        assert!(found.playlists.is_empty());

        let by_uri = search(&store, "example\\.com/cook", false).await?;
        assert_eq!(by_uri.queue_streams[0].name, "Cooking");

        let playlists = search(&store, "LATER", false).await?;
        assert_eq!(playlists.playlists.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn search_honors_soft_delete_flag() -> anyhow::Result<()> {
        let (_dir, store) = create_store().await?;
        let (_playlist, streams) = playlist_with_streams(&store, true, &[("Hidden", false)]).await?;
        store.delete_queue_stream(&streams[0].id).await?;
        assert!(search(&store, "hidden", false).await?.queue_streams.is_empty());
        assert_eq!(search(&store, "hidden", true).await?.queue_streams.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn invalid_search_pattern_is_an_argument_error() -> anyhow::Result<()> {
        let (_dir, store) = create_store().await?;
        let err = search(&store, "(unclosed", false).await.unwrap_err();
        assert!(matches!(err, Error::Argument(_)));
        Ok(())
    }

    #[tokio::test]
    async fn soft_deleted_listing_groups_by_kind() -> anyhow::Result<()> {
        let (_dir, store) = create_store().await?;
        let (playlist, streams) = playlist_with_streams(&store, true, &[("a", false)]).await?;
        store.delete_playlist(&playlist.id).await?;
        store.delete_queue_stream(&streams[0].id).await?;

        let deleted = get_all_soft_deleted(&store).await?;
        assert_eq!(deleted.playlists.len(), 1);
        assert_eq!(deleted.queue_streams.len(), 1);
        assert!(deleted.stream_sources.is_empty());
        Ok(())
    }
}
