#![forbid(unsafe_code)]

//! Local copies of web streams, stored under
//! `<storage>/video/<source kind>/<timestamp>_<name>.<ext>`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::lister::YtDlpLister;
use crate::model::{QueueStream, StreamSourceType};
use crate::title::sanitize;

pub const DEFAULT_EXTENSION: &str = "mp4";

/// Downloads streams with the same `yt-dlp` binary the lister runs.
#[derive(Debug, Clone)]
pub struct Downloader {
    yt_dlp: YtDlpLister,
    storage_root: PathBuf,
}

impl Downloader {
    pub fn new(yt_dlp: YtDlpLister, storage_root: impl Into<PathBuf>) -> Self {
        Self {
            yt_dlp,
            storage_root: storage_root.into(),
        }
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    /// Target file for a download, creating its directory.
    pub fn video_path(
        &self,
        source_name: &str,
        name: &str,
        extension: &str,
        now: DateTime<Utc>,
    ) -> Result<PathBuf> {
        let directory = self.storage_root.join("video").join(source_name);
        fs::create_dir_all(&directory).map_err(|err| {
            Error::Download(format!("creating {}: {err}", directory.display()))
        })?;
        let file_name = format!(
            "{}_{}.{extension}",
            now.format("%Y%m%d%H%M%S"),
            sanitize(name)
        )
        .replace(' ', "_")
        .to_lowercase();
        Ok(directory.join(file_name))
    }

    /// Downloads one web stream and returns where it landed.
    pub fn download(&self, stream: &QueueStream) -> Result<PathBuf> {
        if !stream.is_web {
            return Err(Error::argument(format!(
                "stream {} is not a web stream",
                stream.id
            )));
        }
        let source_name = StreamSourceType::from_uri(&stream.uri).as_str();
        let path = self.video_path(source_name, &stream.name, DEFAULT_EXTENSION, Utc::now())?;

        tracing::info!(url = %stream.uri, path = %path.display(), "downloading stream");
        let output = self
            .yt_dlp
            .command()
            .arg("--format")
            .arg(format!("best[ext={DEFAULT_EXTENSION}]/best"))
            .arg("--merge-output-format")
            .arg(DEFAULT_EXTENSION)
            .arg("--output")
            .arg(&path)
            .arg("--no-playlist")
            .arg("--no-overwrites")
            .arg("--no-warnings")
            .arg(&stream.uri)
            .output()
            .map_err(|err| {
                Error::Download(format!("running {}: {err}", self.yt_dlp.program().display()))
            })?;

        if !output.status.success() {
            return Err(Error::Download(format!(
                "{} exited with {}: {}",
                stream.uri,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        if !path.is_file() {
            return Err(Error::Download(format!(
                "{} produced no file at {}",
                stream.uri,
                path.display()
            )));
        }
        Ok(path)
    }

    /// Downloads every web stream in `streams`, logging failures and moving
    /// on. Returns the files that were written.
    pub fn download_web_streams(&self, streams: &[QueueStream]) -> Vec<PathBuf> {
        let mut written = Vec::new();
        for stream in streams.iter().filter(|stream| stream.is_web) {
            match self.download(stream) {
                Ok(path) => written.push(path),
                Err(err) => {
                    tracing::warn!(stream_id = %stream.id, error = %err, "download failed, skipping");
                }
            }
        }
        written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    #[cfg(unix)]
    use std::os::unix::fs::PermissionsExt;
    use tempfile::tempdir;

    /// Writes the `--output` target the way yt-dlp would.
    const WRITING_STUB: &str = r#"out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "--output" ]; then out="$2"; shift; fi
  shift
done
printf 'video' > "$out""#;

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

    fn downloader(dir: &Path, body: &str) -> Downloader {
        let program = install_ytdlp_stub(dir, body);
        Downloader::new(YtDlpLister::new(program), dir.join("storage"))
    }

    #[test]
    fn video_path_is_stamped_and_normalised() {
        let dir = tempdir().unwrap();
        let downloader = Downloader::new(YtDlpLister::default(), dir.path());
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 12, 30, 45).unwrap();

        let path = downloader
            .video_path("youtube", "My Video: Part 1", "mp4", now)
            .unwrap();
        assert_eq!(
            path,
            dir.path()
                .join("video")
                .join("youtube")
                .join("20240305123045_my_video_part_1.mp4")
        );
        assert!(path.parent().unwrap().is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn download_writes_under_source_directory() {
        let dir = tempdir().unwrap();
        let downloader = downloader(dir.path(), WRITING_STUB);
        let stream = QueueStream::new("Launch Day", "https://www.youtube.com/watch?v=abc");

        let path = downloader.download(&stream).unwrap();
        assert!(path.starts_with(dir.path().join("storage/video/youtube")));
        let file_name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(file_name.ends_with("_launch_day.mp4"), "{file_name}");
        assert_eq!(fs::read_to_string(&path).unwrap(), "video");
    }

    #[cfg(unix)]
    #[test]
    fn failing_ytdlp_is_a_download_error() {
        let dir = tempdir().unwrap();
        let downloader = downloader(dir.path(), "echo 'unavailable' >&2\nexit 1");
        let stream = QueueStream::new("gone", "https://odysee.com/@chan/gone");

        let err = downloader.download(&stream).unwrap_err();
        assert!(matches!(err, Error::Download(ref message) if message.contains("unavailable")));
    }

    #[cfg(unix)]
    #[test]
    fn success_without_a_file_is_a_download_error() {
        let dir = tempdir().unwrap();
        let downloader = downloader(dir.path(), "exit 0");
        let stream = QueueStream::new("empty", "https://www.youtube.com/watch?v=empty");

        assert!(matches!(downloader.download(&stream), Err(Error::Download(_))));
    }

    #[test]
    fn local_streams_are_not_downloaded() {
        let dir = tempdir().unwrap();
        let downloader = Downloader::new(YtDlpLister::new(dir.path().join("missing")), dir.path());
        let stream = QueueStream::new("local", "/media/clip.mp4");

        assert!(matches!(downloader.download(&stream), Err(Error::Argument(_))));
        assert!(downloader.download_web_streams(&[stream]).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn batch_download_skips_failures() {
        let dir = tempdir().unwrap();
        let body = format!("case \"${{@: -1}}\" in *bad*) exit 1 ;; esac\n{WRITING_STUB}");
        let downloader = downloader(dir.path(), &body);
        let streams = [
            QueueStream::new("good one", "https://www.youtube.com/watch?v=good"),
            QueueStream::new("bad one", "https://www.youtube.com/watch?v=bad"),
            QueueStream::new("local", "/media/clip.mp4"),
        ];

        let written = downloader.download_web_streams(&streams);
        assert_eq!(written.len(), 1);
        assert!(written[0].to_string_lossy().ends_with("_good_one.mp4"));
    }
}
