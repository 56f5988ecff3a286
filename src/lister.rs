#![forbid(unsafe_code)]

//! Channel listing through `yt-dlp`.
//!
//! The reconciler only needs candidates newest-first plus the channel's
//! display name, so the trait stays small and tests can swap in a fake.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::error::{Error, Result};

pub const DEFAULT_YT_DLP: &str = "yt-dlp";

/// A listed video that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: String,
    pub title: String,
    /// `None` when the platform did not expose any date for the entry.
    pub publish_date: Option<DateTime<Utc>>,
    pub watch_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub name: String,
    /// Newest first.
    pub videos: Vec<Candidate>,
}

pub trait ChannelLister {
    /// Lists up to `limit` of the channel's newest videos. `Ok(None)` means
    /// the channel could not be resolved.
    fn list_channel(&self, uri: &str, limit: usize) -> Result<Option<Channel>>;

    /// Title of a single video page, if the platform knows it.
    fn video_title(&self, url: &str) -> Result<Option<String>>;
}

/// Subset of `yt-dlp --flat-playlist --dump-single-json` we read.
#[derive(Debug, Deserialize)]
struct FlatPlaylist {
    channel: Option<String>,
    uploader: Option<String>,
    title: Option<String>,
    #[serde(default)]
    entries: Vec<FlatEntry>,
}

#[derive(Debug, Deserialize)]
struct FlatEntry {
    id: Option<String>,
    title: Option<String>,
    url: Option<String>,
    timestamp: Option<i64>,
    release_timestamp: Option<i64>,
    upload_date: Option<String>,
}

impl FlatEntry {
    fn into_candidate(self) -> Option<Candidate> {
        let id = self.id.filter(|id| !id.trim().is_empty())?;
        let publish_date = self
            .timestamp
            .or(self.release_timestamp)
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
            .or_else(|| self.upload_date.as_deref().and_then(upload_date_to_utc));
        let watch_url = self
            .url
            .filter(|url| url.starts_with("http://") || url.starts_with("https://"))
            .unwrap_or_else(|| format!("https://www.youtube.com/watch?v={id}"));
        Some(Candidate {
            title: self.title.unwrap_or_else(|| id.clone()),
            id,
            publish_date,
            watch_url,
        })
    }
}

/// Runs the `yt-dlp` binary found at `program`.
#[derive(Debug, Clone)]
pub struct YtDlpLister {
    program: PathBuf,
}

impl Default for YtDlpLister {
    fn default() -> Self {
        Self::new(DEFAULT_YT_DLP)
    }
}

impl YtDlpLister {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub(crate) fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.stdin(Stdio::null());
        command
    }
}

impl ChannelLister for YtDlpLister {
    fn list_channel(&self, uri: &str, limit: usize) -> Result<Option<Channel>> {
        let list_url = build_channel_list_url(uri);
        let output = self
            .command()
            .arg("--flat-playlist")
            .arg("--dump-single-json")
            .arg("--ignore-errors")
            .arg("--playlist-end")
            .arg(limit.max(1).to_string())
            .arg("--extractor-args")
            .arg("youtubetab:approximate_date")
            .arg(&list_url)
            .output()
            .map_err(|err| {
                Error::Lister(format!("running {}: {err}", self.program.display()))
            })?;

        if !output.status.success() {
            tracing::debug!(
                url = %list_url,
                status = %output.status,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "channel listing failed"
            );
            return Ok(None);
        }

        parse_channel(&output.stdout)
    }

    fn video_title(&self, url: &str) -> Result<Option<String>> {
        let output = self
            .command()
            .arg("--skip-download")
            .arg("--get-title")
            .arg(url)
            .output()
            .map_err(|err| {
                Error::Lister(format!("running {}: {err}", self.program.display()))
            })?;
        if !output.status.success() {
            return Ok(None);
        }
        let title = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(Some(title).filter(|title| !title.is_empty()))
    }
}

fn parse_channel(stdout: &[u8]) -> Result<Option<Channel>> {
    let playlist: FlatPlaylist = serde_json::from_slice(stdout)
        .map_err(|err| Error::Lister(format!("parsing yt-dlp output: {err}")))?;
    let Some(name) = playlist
        .channel
        .or(playlist.uploader)
        .or(playlist.title)
        .filter(|name| !name.trim().is_empty())
    else {
        return Ok(None);
    };
    let videos = playlist
        .entries
        .into_iter()
        .filter_map(FlatEntry::into_candidate)
        .collect();
    Ok(Some(Channel { name, videos }))
}

/// Points a channel URL at its uploads tab without doubling `/videos`.
fn build_channel_list_url(channel_url: &str) -> String {
    let trimmed = channel_url.trim();
    let (base, query) = match trimmed.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (trimmed, None),
    };
    let base = base.trim_end_matches('/');

    // Playlists and single videos are listed as given.
    let lower = base.to_ascii_lowercase();
    let is_channel = lower.contains("/@")
        || lower.contains("/channel/")
        || lower.contains("/user/")
        || lower.contains("/c/");
    let mut result = if !is_channel || lower.ends_with("/videos") {
        base.to_string()
    } else {
        format!("{base}/videos")
    };

    if let Some(query) = query {
        result.push('?');
        result.push_str(query);
    }
    result
}

/// yt-dlp's `YYYYMMDD` dates, taken as midnight UTC.
fn upload_date_to_utc(value: &str) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(value, "%Y%m%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    #[cfg(unix)]
    use std::os::unix::fs::PermissionsExt;
    use tempfile::tempdir;

    fn install_ytdlp_stub(dir: &Path, body: &str) -> PathBuf {
        let script_path = dir.join("yt-dlp");
        fs::write(&script_path, format!("#!/usr/bin/env bash\nset -eu\n{body}\n")).unwrap();
        #[cfg(unix)]
        {
            let mut perms = fs::metadata(&script_path).unwrap().permissions();
            perms.set_mode(0o755);
            fs::set_permissions(&script_path, perms).unwrap();
        }
        script_path
    }

    #[test]
    fn build_channel_list_url_appends_videos_tab_once() {
        assert_eq!(
            build_channel_list_url("https://www.youtube.com/@Chan/"),
            "https://www.youtube.com/@Chan/videos"
        );
        assert_eq!(
            build_channel_list_url("https://www.youtube.com/@Chan/videos"),
            "https://www.youtube.com/@Chan/videos"
        );
        assert_eq!(
            build_channel_list_url("https://www.youtube.com/channel/UC123?hl=en"),
            "https://www.youtube.com/channel/UC123/videos?hl=en"
        );
        assert_eq!(
            build_channel_list_url("https://www.youtube.com/playlist?list=PL1"),
            "https://www.youtube.com/playlist?list=PL1"
        );
    }

    #[test]
    fn parse_channel_reads_entries_and_dates() {
        let json = br#"{
            "channel": "Chan",
            "entries": [
                {"id": "new", "title": "Newest", "url": "https://www.youtube.com/watch?v=new", "timestamp": 1700000000},
                {"id": "old", "title": "Older", "upload_date": "20230102"},
                {"id": "", "title": "broken"}
            ]
        }"#;
        let channel = parse_channel(json).unwrap().expect("channel");
        assert_eq!(channel.name, "Chan");
        assert_eq!(channel.videos.len(), 2);
        assert_eq!(channel.videos[0].id, "new");
        assert_eq!(
            channel.videos[0].publish_date.map(|ts| ts.timestamp()),
            Some(1_700_000_000)
        );
        assert_eq!(
            channel.videos[1].watch_url,
            "https://www.youtube.com/watch?v=old"
        );
        assert_eq!(
            channel.videos[1].publish_date.map(|ts| ts.date_naive().to_string()),
            Some("2023-01-02".to_string())
        );
    }

    #[test]
    fn parse_channel_without_name_is_not_found() {
        let channel = parse_channel(br#"{"entries": []}"#).unwrap();
        assert!(channel.is_none());
    }

    #[test]
    fn stub_listing_is_parsed() {
        let temp = tempdir().unwrap();
        let stub = install_ytdlp_stub(
            temp.path(),
            r#"echo '{"uploader":"Stub","entries":[{"id":"a","title":"A","timestamp":1700000000}]}'"#,
        );
        let lister = YtDlpLister::new(stub);
        let channel = lister
            .list_channel("https://www.youtube.com/@stub", 5)
            .unwrap()
            .expect("channel");
        assert_eq!(channel.name, "Stub");
        assert_eq!(channel.videos[0].title, "A");
    }

    #[test]
    fn failing_stub_means_channel_not_found() {
        let temp = tempdir().unwrap();
        let stub = install_ytdlp_stub(temp.path(), "echo 'ERROR: not found' >&2\nexit 1");
        let lister = YtDlpLister::new(stub);
        assert!(lister.list_channel("https://www.youtube.com/@gone", 5).unwrap().is_none());
    }

    #[test]
    fn stub_receives_playlist_end_limit() {
        let temp = tempdir().unwrap();
        let log = temp.path().join("args.txt");
        let stub = install_ytdlp_stub(
            temp.path(),
            &format!(
                "printf '%s\\n' \"$@\" > '{}'\necho '{{\"channel\":\"C\",\"entries\":[]}}'",
                log.display()
            ),
        );
        let lister = YtDlpLister::new(stub);
        let channel = lister.list_channel("https://www.youtube.com/@c", 7).unwrap();
        assert!(channel.expect("channel").videos.is_empty());
        let args = fs::read_to_string(&log).unwrap();
        assert!(args.lines().any(|line| line == "7"));
        assert!(args.lines().any(|line| line == "https://www.youtube.com/@c/videos"));
    }

    #[test]
    fn video_title_trims_output() {
        let temp = tempdir().unwrap();
        let stub = install_ytdlp_stub(temp.path(), "echo '  A Title  '");
        let lister = YtDlpLister::new(stub);
        assert_eq!(
            lister.video_title("https://youtu.be/x").unwrap().as_deref(),
            Some("A Title")
        );
    }

    #[test]
    fn missing_program_is_a_lister_error() {
        let lister = YtDlpLister::new("/definitely/not/yt-dlp");
        let err = lister.list_channel("https://www.youtube.com/@c", 1).unwrap_err();
        assert!(matches!(err, Error::Lister(_)));
    }
}
