#![forbid(unsafe_code)]

//! Cron-style job that fetches new streams for every playlist in the store.

use anyhow::{Context, Result, bail};
use std::env;
use std::path::PathBuf;
use streamqueue_tools::{
    config::{SettingsOverrides, resolve_settings},
    download::Downloader,
    fetch::{FetchService, FetchWindow},
    init_tracing,
    lister::YtDlpLister,
    store::Store,
};

#[derive(Debug, Clone, Default, PartialEq)]
struct RoutineArgs {
    env_file: Option<PathBuf>,
    storage_path: Option<PathBuf>,
    batch_size: Option<i64>,
}

impl RoutineArgs {
    fn parse() -> Result<Self> {
        Self::from_iter(env::args().skip(1))
    }

    #[cfg(test)]
    fn from_slice(values: &[&str]) -> Result<Self> {
        Self::from_iter(values.iter().map(|value| value.to_string()))
    }

    fn from_iter<I>(iter: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = Self::default();
        let mut args = iter.into_iter();

        while let Some(arg) = args.next() {
            let (flag, inline) = match arg.split_once('=') {
                Some((flag, value)) if flag.starts_with("--") => (flag.to_string(), Some(value.to_string())),
                _ => (arg.clone(), None),
            };
            let mut value = |name: &str| -> Result<String> {
                match inline.clone() {
                    Some(value) => Ok(value),
                    None => args
                        .next()
                        .ok_or_else(|| anyhow::anyhow!("{name} requires a value")),
                }
            };

            match flag.as_str() {
                "--env-file" => parsed.env_file = Some(PathBuf::from(value("--env-file")?)),
                "--storage-path" => {
                    parsed.storage_path = Some(PathBuf::from(value("--storage-path")?))
                }
                "--batch-size" => {
                    let raw = value("--batch-size")?;
                    let size = raw
                        .parse::<i64>()
                        .with_context(|| format!("invalid --batch-size {raw:?}"))?;
                    parsed.batch_size = Some(size);
                }
                _ => bail!("unknown argument: {arg}"),
            }
        }
        Ok(parsed)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = RoutineArgs::parse()?;
    let settings = resolve_settings(SettingsOverrides {
        local_storage_path: args.storage_path.clone(),
        env_path: args.env_file.clone(),
        ..SettingsOverrides::default()
    })
    .context("loading settings")?;
    init_tracing(settings.debug);

    let store = Store::open_in(&settings.local_storage_path)
        .await
        .context("opening store")?;
    let playlists = store.playlists(false).await?;
    if playlists.is_empty() {
        println!(
            "No playlists found in {}.",
            settings.local_storage_path.display()
        );
        return Ok(());
    }

    let batch_size = args
        .batch_size
        .unwrap_or(settings.fetch_batch_size as i64);
    let lister = YtDlpLister::new(&settings.yt_dlp_bin);
    let downloader = settings
        .download_web_streams
        .then(|| Downloader::new(lister.clone(), &settings.local_storage_path));
    let service = FetchService::new(store, lister)
        .with_list_limit(settings.fetch_limit_single_source);

    println!("Found {} playlist(s) to fetch.", playlists.len());
    let mut total = 0;
    let mut failed = 0;
    for (index, playlist) in playlists.iter().enumerate() {
        println!();
        println!(
            "[{}/{}] Fetching playlist: {}",
            index + 1,
            playlists.len(),
            playlist.name
        );
        match service
            .fetch_streams(&playlist.id, batch_size, FetchWindow::new_only())
            .await
        {
            Ok(added) => {
                println!("  Added {} new stream(s)", added.len());
                if let Some(downloader) = &downloader {
                    let written = downloader.download_web_streams(&added);
                    println!("  Downloaded {} stream(s)", written.len());
                }
                total += added.len();
            }
            Err(err) => {
                failed += 1;
                eprintln!("  Warning: fetch failed for {}: {err}", playlist.name);
            }
        }
    }

    println!();
    println!("Routine fetch complete: {total} new stream(s), {failed} failed playlist(s).");
    Ok(())
}
