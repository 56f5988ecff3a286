#![forbid(unsafe_code)]

//! Command-line front end: playlist and source management, fetching and
//! housekeeping over the local store.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use streamqueue_tools::{
    config::{DEFAULT_ENV_PATH, SETTING_KEYS, Settings, SettingsOverrides, resolve_settings, upsert_env_value},
    download::Downloader,
    fetch::{FetchService, FetchWindow},
    init_tracing,
    lister::YtDlpLister,
    maintenance,
    model::{EntityBundle, Playlist, QueueStream, StreamSource},
    store::Store,
    title::page_title,
};

const AFFIRMATIVE: &[&str] = &["yes", "y", "1"];

#[derive(Debug, Parser)]
#[command(name = "streamqueue", version, about = "Manage playlists of streams and fetch new videos from sources")]
struct Cli {
    /// Settings file to read (defaults to `.env` in the working directory).
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,
    /// Overrides LOCAL_STORAGE_PATH.
    #[arg(long, global = true)]
    storage_path: Option<PathBuf>,
    #[arg(long, global = true)]
    debug: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create, delete and inspect playlists.
    Playlist {
        #[command(subcommand)]
        command: PlaylistCommand,
    },
    /// Fetch new streams for playlists (all when none given).
    Fetch {
        playlists: Vec<String>,
        #[arg(long)]
        batch_size: Option<i64>,
        /// Only take videos published on or after this date (YYYY-MM-DD).
        #[arg(long)]
        after: Option<String>,
        /// Only take videos published on or before this date (YYYY-MM-DD).
        #[arg(long)]
        before: Option<String>,
        /// Select by date window instead of by previously seen videos.
        /// Implied by `--after` and `--before`.
        #[arg(long)]
        by_date: bool,
    },
    /// Delete fetched streams and forget what sources have seen.
    Reset {
        playlists: Vec<String>,
        #[arg(long)]
        yes: bool,
    },
    /// Remove watched streams from playlists that do not replay them.
    Prune {
        playlists: Vec<String>,
        #[arg(long)]
        permanently: bool,
        #[arg(long)]
        include_deleted: bool,
        #[arg(long)]
        yes: bool,
    },
    /// Permanently remove everything that was soft-deleted.
    Purge {
        #[arg(long)]
        yes: bool,
    },
    /// Remove unlinked streams and sources and dangling playlist IDs.
    PurgePlaylists {
        #[arg(long)]
        permanently: bool,
        #[arg(long)]
        include_deleted: bool,
        #[arg(long)]
        yes: bool,
    },
    /// Manage single streams in a playlist.
    Stream {
        #[command(subcommand)]
        command: StreamCommand,
    },
    /// Manage fetch sources of a playlist.
    Source {
        #[command(subcommand)]
        command: SourceCommand,
    },
    /// Search names and URIs (case-insensitive regex).
    Search {
        term: String,
        #[arg(long)]
        include_deleted: bool,
    },
    /// List soft-deleted entities.
    Deleted,
    /// Show or change settings.
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
}

#[derive(Debug, Subcommand)]
enum PlaylistCommand {
    Add {
        name: String,
        /// Skip watched streams during playback.
        #[arg(long)]
        no_replay_watched: bool,
        #[arg(long)]
        no_duplicates: bool,
    },
    Delete { ids: Vec<String> },
    Restore { ids: Vec<String> },
    List {
        #[arg(long)]
        include_deleted: bool,
    },
    Details {
        ids: Vec<String>,
        #[arg(long)]
        include_deleted: bool,
    },
}

#[derive(Debug, Subcommand)]
enum StreamCommand {
    Add {
        playlist: String,
        uri: String,
        #[arg(long)]
        name: Option<String>,
    },
    Delete { playlist: String, ids: Vec<String> },
    Restore { playlist: String, ids: Vec<String> },
    /// Download web streams of a playlist (all when no IDs given).
    Download { playlist: String, ids: Vec<String> },
}

#[derive(Debug, Subcommand)]
enum SourceCommand {
    Add {
        playlist: String,
        uri: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        no_fetch: bool,
        #[arg(long)]
        background: bool,
    },
    Delete { playlist: String, ids: Vec<String> },
    List { playlist: Option<String> },
}

#[derive(Debug, Subcommand)]
enum SettingsCommand {
    Show,
    Set { key: String, value: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Command::Settings {
        command: SettingsCommand::Set { key, value },
    } = &cli.command
    {
        init_tracing(cli.debug);
        return set_setting(cli.env_file.clone(), key, value);
    }

    let settings = resolve_settings(SettingsOverrides {
        local_storage_path: cli.storage_path.clone(),
        debug: cli.debug.then_some(true),
        env_path: cli.env_file.clone(),
    })
    .context("loading settings")?;
    init_tracing(settings.debug);

    let store = Store::open_in(&settings.local_storage_path)
        .await
        .context("opening store")?;
    let lister = YtDlpLister::new(&settings.yt_dlp_bin);

    match cli.command {
        Command::Playlist { command } => run_playlist(&store, command).await,
        Command::Fetch {
            playlists,
            batch_size,
            after,
            before,
            by_date,
        } => {
            let window = fetch_window(after.as_deref(), before.as_deref(), by_date)?;
            let batch_size = batch_size.unwrap_or(settings.fetch_batch_size as i64);
            let ids = resolve_playlist_ids(&store, &playlists, true).await?;
            let downloader = settings
                .download_web_streams
                .then(|| Downloader::new(lister.clone(), &settings.local_storage_path));
            let service = FetchService::new(store, lister)
                .with_list_limit(settings.fetch_limit_single_source);
            let mut total = 0;
            for id in ids {
                let added = service.fetch_streams(&id, batch_size, window).await?;
                let name = playlist_name(service.store(), &id).await?;
                println!("Fetched {} new stream(s) for \"{name}\".", added.len());
                if let Some(downloader) = &downloader {
                    let written = downloader.download_web_streams(&added);
                    println!("Downloaded {} stream(s).", written.len());
                }
                total += added.len();
            }
            println!("Fetched {total} new stream(s) in total.");
            Ok(())
        }
        Command::Reset { playlists, yes } => {
            let ids = resolve_playlist_ids(&store, &playlists, true).await?;
            println!(
                "Resetting {} playlist(s): all their streams will be deleted and sources refetched.",
                ids.len()
            );
            if !confirm("Do you want to reset fetch status?", yes)? {
                println!("Reset aborted by user.");
                return Ok(());
            }
            let service = FetchService::new(store, lister);
            let reset = service.reset_fetch_status(&ids).await?;
            println!("Reset {reset}/{} playlist(s).", ids.len());
            Ok(())
        }
        Command::Prune {
            playlists,
            permanently,
            include_deleted,
            yes,
        } => {
            let ids = resolve_playlist_ids(&store, &playlists, true).await?;
            for id in ids {
                let bundle = maintenance::prepare_prune(&store, &id, include_deleted).await?;
                let Some(playlist) = bundle.playlists.first() else {
                    println!("Playlist {id} replays watched streams, nothing to prune.");
                    continue;
                };
                print_header(&format!("Prune summary for \"{}\"", playlist.name), permanently);
                print_streams(&bundle.queue_streams, "No QueueStreams will be removed");
                if bundle.queue_streams.is_empty() {
                    continue;
                }
                if !confirm(&action_prompt(permanently), yes)? {
                    println!("Prune aborted by user.");
                    continue;
                }
                if maintenance::do_prune(&store, &bundle, include_deleted, permanently).await? {
                    println!("Pruned {} stream(s).", bundle.queue_streams.len());
                } else {
                    println!("Prune of \"{}\" failed.", playlist.name);
                }
            }
            Ok(())
        }
        Command::Purge { yes } => {
            let bundle = maintenance::prepare_purge(&store).await?;
            print_header("Purge summary", true);
            print_bundle(&bundle);
            if bundle.is_empty() {
                println!("No data was available.");
                return Ok(());
            }
            if !confirm(&action_prompt(true), yes)? {
                println!("Purge aborted by user.");
                return Ok(());
            }
            let done = maintenance::do_purge(&store, &bundle).await?;
            println!("Purge {}.", if done { "complete" } else { "partially applied" });
            Ok(())
        }
        Command::PurgePlaylists {
            permanently,
            include_deleted,
            yes,
        } => {
            let bundle = maintenance::prepare_purge_playlists(&store, include_deleted).await?;
            print_header("Purge summary", permanently);
            print_streams(&bundle.queue_streams, "No unlinked QueueStreams");
            print_sources(&bundle.stream_sources, "No unlinked StreamSources");
            println!("\nPlaylists with dangling IDs");
            if bundle.playlists.is_empty() {
                println!("None");
            }
            for playlist in &bundle.playlists {
                println!("{} - {}", playlist.id, playlist.name);
            }
            if bundle.is_empty() {
                println!("No data was available.");
                return Ok(());
            }
            if !confirm(&action_prompt(permanently), yes)? {
                println!("Purge aborted by user.");
                return Ok(());
            }
            let done =
                maintenance::do_purge_playlists(&store, &bundle, include_deleted, permanently)
                    .await?;
            println!("Purge {}.", if done { "complete" } else { "partially applied" });
            Ok(())
        }
        Command::Stream { command } => run_stream(&store, &lister, &settings, command).await,
        Command::Source { command } => run_source(&store, &lister, command).await,
        Command::Search {
            term,
            include_deleted,
        } => {
            let found = maintenance::search(&store, &term, include_deleted).await?;
            if found.is_empty() {
                println!("No results for \"{term}\".");
            } else {
                print_bundle(&found);
            }
            Ok(())
        }
        Command::Deleted => {
            let deleted = maintenance::get_all_soft_deleted(&store).await?;
            if deleted.is_empty() {
                println!("Nothing is soft-deleted.");
            } else {
                print_bundle(&deleted);
            }
            Ok(())
        }
        Command::Settings { .. } => {
            show_settings(&settings);
            Ok(())
        }
    }
}

async fn run_playlist(store: &Store, command: PlaylistCommand) -> Result<()> {
    match command {
        PlaylistCommand::Add {
            name,
            no_replay_watched,
            no_duplicates,
        } => {
            let mut playlist = Playlist::new(name);
            playlist.play_watched_streams = !no_replay_watched;
            playlist.allow_duplicates = !no_duplicates;
            store.add_playlist(&playlist).await?;
            println!("Added playlist \"{}\" ({}).", playlist.name, playlist.id);
        }
        PlaylistCommand::Delete { ids } => {
            for id in resolve_playlist_ids(store, &ids, false).await? {
                report(store.delete_playlist(&id).await?, "Deleted", "playlist", &id);
            }
        }
        PlaylistCommand::Restore { ids } => {
            let listing = store.playlist_ids(true).await?;
            for id in resolve_ids(&ids, &listing)? {
                report(store.restore_playlist(&id).await?, "Restored", "playlist", &id);
            }
        }
        PlaylistCommand::List { include_deleted } => {
            let playlists = store.playlists(include_deleted).await?;
            if playlists.is_empty() {
                println!("No playlists.");
            }
            for (index, playlist) in playlists.iter().enumerate() {
                println!("{index} - {}", playlist.summary());
            }
        }
        PlaylistCommand::Details {
            ids,
            include_deleted,
        } => {
            let listing = store.playlist_ids(include_deleted).await?;
            let ids = if ids.is_empty() { listing.clone() } else { resolve_ids(&ids, &listing)? };
            for id in ids {
                let Some(playlist) = store.playlist(&id, include_deleted).await? else {
                    println!("Playlist {id} could not be found.");
                    continue;
                };
                println!("{}", playlist.details(true));
                let streams = store.streams_by_playlist_id(&id, include_deleted).await?;
                print_streams(&streams, "No streams");
                let sources = store.sources_by_playlist_id(&id, include_deleted).await?;
                print_sources(&sources, "No sources");
                println!();
            }
        }
    }
    Ok(())
}

async fn run_stream(
    store: &Store,
    lister: &YtDlpLister,
    settings: &Settings,
    command: StreamCommand,
) -> Result<()> {
    match command {
        StreamCommand::Add {
            playlist,
            uri,
            name,
        } => {
            let playlist = require_playlist(store, &playlist).await?;
            let name = name
                .or_else(|| page_title(&uri, lister))
                .unwrap_or_else(|| uri.clone());
            let stream = QueueStream::new(name, uri);
            let applied = store
                .add_streams(&playlist.id, std::slice::from_ref(&stream))
                .await?;
            if applied.is_empty() {
                println!("Stream was not added to \"{}\" (duplicate?).", playlist.name);
            } else {
                println!("Added \"{}\" to \"{}\".", stream.name, playlist.name);
            }
        }
        StreamCommand::Delete { playlist, ids } => {
            let playlist = require_playlist(store, &playlist).await?;
            let ids = resolve_ids(&ids, &playlist.stream_ids)?;
            let deleted = store.delete_streams(&playlist.id, &ids).await?;
            println!("Deleted {}/{} stream(s).", deleted.len(), ids.len());
        }
        StreamCommand::Restore { playlist, ids } => {
            let playlist = require_playlist(store, &playlist).await?;
            let ids = resolve_ids(&ids, &playlist.stream_ids)?;
            let restored = store.restore_streams(&playlist.id, &ids).await?;
            println!("Restored {}/{} stream(s).", restored.len(), ids.len());
        }
        StreamCommand::Download { playlist, ids } => {
            let playlist = require_playlist(store, &playlist).await?;
            let ids = if ids.is_empty() {
                playlist.stream_ids.clone()
            } else {
                resolve_ids(&ids, &playlist.stream_ids)?
            };
            let downloader = Downloader::new(lister.clone(), &settings.local_storage_path);
            let mut downloaded = 0;
            for id in &ids {
                let Some(stream) = store.queue_stream(id, false).await? else {
                    println!("Stream {id} could not be found.");
                    continue;
                };
                if !stream.is_web {
                    println!("Skipping \"{}\", not a web stream.", stream.name);
                    continue;
                }
                match downloader.download(&stream) {
                    Ok(path) => {
                        downloaded += 1;
                        println!("Downloaded \"{}\" to {}.", stream.name, path.display());
                    }
                    Err(err) => eprintln!("Warning: could not download \"{}\": {err}", stream.name),
                }
            }
            println!("Downloaded {downloaded}/{} stream(s).", ids.len());
        }
    }
    Ok(())
}

async fn run_source(store: &Store, lister: &YtDlpLister, command: SourceCommand) -> Result<()> {
    match command {
        SourceCommand::Add {
            playlist,
            uri,
            name,
            no_fetch,
            background,
        } => {
            let mut playlist = require_playlist(store, &playlist).await?;
            let name = name
                .or_else(|| page_title(&uri, lister))
                .unwrap_or_else(|| uri.clone());
            let mut source = StreamSource::new(name, uri, !no_fetch);
            source.background_content = background;
            store.add_stream_source(&source).await?;
            playlist.stream_source_ids.push(source.id.clone());
            if !store.update_playlist(&playlist).await? {
                bail!("could not link source to playlist {}", playlist.id);
            }
            println!("Added source \"{}\" to \"{}\".", source.name, playlist.name);
        }
        SourceCommand::Delete { playlist, ids } => {
            let mut playlist = require_playlist(store, &playlist).await?;
            let ids = resolve_ids(&ids, &playlist.stream_source_ids)?;
            for id in &ids {
                report(store.delete_stream_source(id).await?, "Deleted", "source", id);
            }
            playlist.stream_source_ids.retain(|id| !ids.contains(id));
            store.update_playlist(&playlist).await?;
        }
        SourceCommand::List { playlist } => {
            let sources = match playlist {
                Some(playlist) => {
                    let playlist = require_playlist(store, &playlist).await?;
                    store.sources_by_playlist_id(&playlist.id, false).await?
                }
                None => store.stream_sources(false).await?,
            };
            if sources.is_empty() {
                println!("No sources.");
            }
            for (index, source) in sources.iter().enumerate() {
                println!("{index} - {}", source.summary());
            }
        }
    }
    Ok(())
}

fn set_setting(env_file: Option<PathBuf>, key: &str, value: &str) -> Result<()> {
    let key = key.to_ascii_uppercase();
    if !SETTING_KEYS.contains(&key.as_str()) {
        bail!("unknown setting {key}; known settings: {}", SETTING_KEYS.join(", "));
    }
    let path = env_file.unwrap_or_else(|| PathBuf::from(DEFAULT_ENV_PATH));
    upsert_env_value(&path, &key, value)?;
    println!("Set {key} in {}.", path.display());
    Ok(())
}

fn show_settings(settings: &Settings) {
    println!("Settings from {}", settings.env_path.display());
    for (key, value) in settings.entries() {
        println!("{key}={value}");
    }
}

/// Maps `i<index>` inputs onto `listing`; anything else is taken as a raw ID.
fn resolve_ids(inputs: &[String], listing: &[String]) -> Result<Vec<String>> {
    inputs
        .iter()
        .map(|input| {
            let index = input
                .strip_prefix('i')
                .and_then(|rest| rest.parse::<usize>().ok());
            match index {
                Some(index) => listing
                    .get(index)
                    .cloned()
                    .ok_or_else(|| anyhow!("index {index} is out of range ({} entries)", listing.len())),
                None => Ok(input.clone()),
            }
        })
        .collect()
}

/// Resolves playlist inputs; an empty list means every playlist when
/// `all_when_empty` is set.
async fn resolve_playlist_ids(
    store: &Store,
    inputs: &[String],
    all_when_empty: bool,
) -> Result<Vec<String>> {
    let listing = store.playlist_ids(false).await?;
    if inputs.is_empty() && all_when_empty {
        return Ok(listing);
    }
    resolve_ids(inputs, &listing)
}

async fn require_playlist(store: &Store, input: &str) -> Result<Playlist> {
    let ids = resolve_playlist_ids(store, &[input.to_string()], false).await?;
    let id = ids.first().cloned().unwrap_or_default();
    store
        .playlist(&id, false)
        .await?
        .ok_or_else(|| streamqueue_tools::error::Error::NotFound { kind: "Playlist", id }.into())
}

async fn playlist_name(store: &Store, id: &str) -> Result<String> {
    Ok(store
        .playlist(id, false)
        .await?
        .map(|playlist| playlist.name)
        .unwrap_or_else(|| id.to_string()))
}

fn parse_date(value: &str) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid date {value:?}, expected YYYY-MM-DD"))?;
    date.and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .ok_or_else(|| anyhow!("invalid date {value:?}"))
}

/// Date bounds only apply outside new-only mode, so giving either one
/// switches to date selection.
fn fetch_window(after: Option<&str>, before: Option<&str>, by_date: bool) -> Result<FetchWindow> {
    let take_after = after.map(parse_date).transpose()?;
    let take_before = before.map(parse_date).transpose()?;
    Ok(FetchWindow {
        take_new_only: !(by_date || take_after.is_some() || take_before.is_some()),
        take_after,
        take_before,
    })
}

fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    print!("{prompt} (y/n): ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(is_affirmative(&answer))
}

fn is_affirmative(answer: &str) -> bool {
    AFFIRMATIVE.contains(&answer.trim().to_ascii_lowercase().as_str())
}

fn action_prompt(permanently: bool) -> String {
    format!(
        "Do you want to {} this data?",
        if permanently { "PERMANENTLY REMOVE" } else { "DELETE" }
    )
}

fn report(applied: bool, verb: &str, kind: &str, id: &str) {
    if applied {
        println!("{verb} {kind} {id}.");
    } else {
        println!("{kind} {id} was not changed (missing or already done).");
    }
}

fn print_header(title: &str, permanently: bool) {
    println!(
        "\n{title}, the following data will be {}:",
        if permanently { "PERMANENTLY REMOVED" } else { "DELETED" }
    );
}

fn print_streams(streams: &[QueueStream], empty: &str) {
    println!("\nQueueStreams");
    if streams.is_empty() {
        println!("{empty}");
    }
    for (index, stream) in streams.iter().enumerate() {
        println!("{index} - {}", stream.details(true, true));
    }
}

fn print_sources(sources: &[StreamSource], empty: &str) {
    println!("\nStreamSources");
    if sources.is_empty() {
        println!("{empty}");
    }
    for (index, source) in sources.iter().enumerate() {
        println!("{index} - {}", source.details(true, true));
    }
}

fn print_bundle(bundle: &EntityBundle) {
    println!("\nPlaylists");
    if bundle.playlists.is_empty() {
        println!("None");
    }
    for playlist in &bundle.playlists {
        println!("{}", playlist.details(true));
    }
    print_streams(&bundle.queue_streams, "None");
    print_sources(&bundle.stream_sources, "None");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn resolve_ids_maps_indices_and_keeps_raw_ids() {
        let listing = strings(&["aaa", "bbb", "ccc"]);
        let resolved = resolve_ids(&strings(&["i2", "raw-id", "i0"]), &listing).unwrap();
        assert_eq!(resolved, strings(&["ccc", "raw-id", "aaa"]));
    }

    #[test]
    fn resolve_ids_rejects_out_of_range_index() {
        let err = resolve_ids(&strings(&["i5"]), &strings(&["a"])).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn non_numeric_i_prefix_is_a_raw_id() {
        let resolved = resolve_ids(&strings(&["ignore"]), &[]).unwrap();
        assert_eq!(resolved, strings(&["ignore"]));
    }

    #[test]
    fn parse_date_is_midnight_utc() {
        let parsed = parse_date("2024-03-05").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-03-05T00:00:00+00:00");
        assert!(parse_date("05/03/2024").is_err());
    }

    #[test]
    fn affirmative_answers() {
        assert!(is_affirmative("y\n"));
        assert!(is_affirmative(" YES "));
        assert!(is_affirmative("1"));
        assert!(!is_affirmative("n"));
        assert!(!is_affirmative(""));
    }

    #[test]
    fn cli_parses_fetch_flags() {
        let cli = Cli::try_parse_from([
            "streamqueue",
            "fetch",
            "i0",
            "--batch-size",
            "3",
            "--after",
            "2024-01-01",
            "--by-date",
        ])
        .unwrap();
        match cli.command {
            Command::Fetch {
                playlists,
                batch_size,
                after,
                by_date,
                ..
            } => {
                assert_eq!(playlists, strings(&["i0"]));
                assert_eq!(batch_size, Some(3));
                assert_eq!(after.as_deref(), Some("2024-01-01"));
                assert!(by_date);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn date_bounds_switch_fetch_to_date_mode() {
        let window = fetch_window(Some("2024-01-01"), None, false).unwrap();
        assert!(!window.take_new_only);
        assert_eq!(window.take_after, Some(parse_date("2024-01-01").unwrap()));
        assert_eq!(window.take_before, None);

        let window = fetch_window(None, Some("2024-02-01"), false).unwrap();
        assert!(!window.take_new_only);
        assert_eq!(window.take_before, Some(parse_date("2024-02-01").unwrap()));

        assert!(!fetch_window(None, None, true).unwrap().take_new_only);
        assert_eq!(fetch_window(None, None, false).unwrap(), FetchWindow::new_only());
        assert!(fetch_window(Some("soon"), None, false).is_err());
    }

    #[test]
    fn cli_parses_stream_download() {
        let cli = Cli::try_parse_from(["streamqueue", "stream", "download", "i1"]).unwrap();
        match cli.command {
            Command::Stream {
                command: StreamCommand::Download { playlist, ids },
            } => {
                assert_eq!(playlist, "i1");
                assert!(ids.is_empty());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn set_setting_rejects_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        assert!(set_setting(Some(path.clone()), "NOPE", "1").is_err());
        set_setting(Some(path.clone()), "fetch_batch_size", "4").unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw, "FETCH_BATCH_SIZE=\"4\"\n");
    }
}
