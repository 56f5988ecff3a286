#![forbid(unsafe_code)]

//! Settings loaded from a `.env` file and the process environment.
//!
//! Precedence is explicit override, then environment variable, then the
//! file, then the built-in default.

use anyhow::{Context, Result, anyhow};
use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
};

use crate::lister::DEFAULT_YT_DLP;

pub const DEFAULT_ENV_PATH: &str = ".env";
pub const DEFAULT_FETCH_LIMIT_SINGLE_SOURCE: usize = 100;
pub const DEFAULT_FETCH_BATCH_SIZE: usize = 10;

/// Every key `settings show` prints, in display order.
pub const SETTING_KEYS: &[&str] = &[
    "DEBUG",
    "LOCAL_STORAGE_PATH",
    "LOG_WATCHED",
    "DOWNLOAD_WEB_STREAMS",
    "REMOVE_WATCHED_ON_FETCH",
    "PLAYED_ALWAYS_WATCHED",
    "WATCHED_LOG_FILEPATH",
    "LOG_DIR_PATH",
    "BROWSER_BIN",
    "FETCH_LIMIT_SINGLE_SOURCE",
    "FETCH_BATCH_SIZE",
    "YT_DLP_BIN",
];

#[derive(Debug, Clone)]
pub struct Settings {
    pub debug: bool,
    pub local_storage_path: PathBuf,
    pub log_watched: bool,
    pub download_web_streams: bool,
    pub remove_watched_on_fetch: bool,
    pub played_always_watched: bool,
    pub watched_log_filepath: Option<PathBuf>,
    pub log_dir_path: Option<PathBuf>,
    pub browser_bin: Option<String>,
    /// Upper bound on how many entries the lister is asked for per source.
    pub fetch_limit_single_source: usize,
    pub fetch_batch_size: usize,
    pub yt_dlp_bin: PathBuf,
    /// File the settings were read from; `settings set` writes back here.
    pub env_path: PathBuf,
}

impl Settings {
    /// `(key, value)` pairs for display.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let path = |value: &Option<PathBuf>| {
            value
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default()
        };
        vec![
            ("DEBUG", self.debug.to_string()),
            (
                "LOCAL_STORAGE_PATH",
                self.local_storage_path.display().to_string(),
            ),
            ("LOG_WATCHED", self.log_watched.to_string()),
            ("DOWNLOAD_WEB_STREAMS", self.download_web_streams.to_string()),
            (
                "REMOVE_WATCHED_ON_FETCH",
                self.remove_watched_on_fetch.to_string(),
            ),
            (
                "PLAYED_ALWAYS_WATCHED",
                self.played_always_watched.to_string(),
            ),
            ("WATCHED_LOG_FILEPATH", path(&self.watched_log_filepath)),
            ("LOG_DIR_PATH", path(&self.log_dir_path)),
            (
                "BROWSER_BIN",
                self.browser_bin.clone().unwrap_or_default(),
            ),
            (
                "FETCH_LIMIT_SINGLE_SOURCE",
                self.fetch_limit_single_source.to_string(),
            ),
            ("FETCH_BATCH_SIZE", self.fetch_batch_size.to_string()),
            ("YT_DLP_BIN", self.yt_dlp_bin.display().to_string()),
        ]
    }
}

#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub local_storage_path: Option<PathBuf>,
    pub debug: Option<bool>,
    pub env_path: Option<PathBuf>,
}

pub fn load_settings() -> Result<Settings> {
    resolve_settings(SettingsOverrides::default())
}

pub fn resolve_settings(overrides: SettingsOverrides) -> Result<Settings> {
    let env_path = overrides
        .env_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ENV_PATH));
    let file_vars = read_env_file(&env_path)?;
    let mut settings = build_settings_with_overrides(&file_vars, env_var_string, overrides)?;
    settings.env_path = env_path;
    Ok(settings)
}

#[cfg(test)]
fn build_settings(
    file_vars: &HashMap<String, String>,
    env_lookup: impl Fn(&str) -> Option<String>,
) -> Result<Settings> {
    build_settings_with_overrides(file_vars, env_lookup, SettingsOverrides::default())
}

fn build_settings_with_overrides(
    file_vars: &HashMap<String, String>,
    env_lookup: impl Fn(&str) -> Option<String>,
    overrides: SettingsOverrides,
) -> Result<Settings> {
    let lookup = |key: &str| lookup_value(key, file_vars, &env_lookup);
    let flag = |key: &str| lookup(key).and_then(|value| parse_bool(&value)).unwrap_or(false);
    let count = |key: &str, default: usize| {
        lookup(key)
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(default)
    };

    let local_storage_path = overrides
        .local_storage_path
        .map(|path| path.to_string_lossy().into_owned())
        .or_else(|| lookup("LOCAL_STORAGE_PATH"))
        .ok_or_else(|| anyhow!("LOCAL_STORAGE_PATH not set"))?;

    Ok(Settings {
        debug: overrides.debug.unwrap_or_else(|| flag("DEBUG")),
        local_storage_path: PathBuf::from(local_storage_path),
        log_watched: flag("LOG_WATCHED"),
        download_web_streams: flag("DOWNLOAD_WEB_STREAMS"),
        remove_watched_on_fetch: flag("REMOVE_WATCHED_ON_FETCH"),
        played_always_watched: flag("PLAYED_ALWAYS_WATCHED"),
        watched_log_filepath: lookup("WATCHED_LOG_FILEPATH").map(PathBuf::from),
        log_dir_path: lookup("LOG_DIR_PATH").map(PathBuf::from),
        browser_bin: lookup("BROWSER_BIN"),
        fetch_limit_single_source: count(
            "FETCH_LIMIT_SINGLE_SOURCE",
            DEFAULT_FETCH_LIMIT_SINGLE_SOURCE,
        ),
        fetch_batch_size: count("FETCH_BATCH_SIZE", DEFAULT_FETCH_BATCH_SIZE),
        yt_dlp_bin: PathBuf::from(lookup("YT_DLP_BIN").unwrap_or_else(|| DEFAULT_YT_DLP.into())),
        env_path: PathBuf::from(DEFAULT_ENV_PATH),
    })
}

/// Accepts the spellings people actually put in `.env` files.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Some(true),
        "false" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

fn env_var_string(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn lookup_value(
    key: &str,
    file_vars: &HashMap<String, String>,
    env_lookup: &impl Fn(&str) -> Option<String>,
) -> Option<String> {
    env_lookup(key)
        .or_else(|| file_vars.get(key).cloned())
        .filter(|value| !value.trim().is_empty())
}

pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;
    Ok(content.lines().filter_map(parse_env_line).collect())
}

/// One `KEY=value` line, optionally prefixed with `export`. Comments, blank
/// lines and lines without a key yield `None`.
fn parse_env_line(line: &str) -> Option<(String, String)> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let assignment = trimmed.strip_prefix("export ").unwrap_or(trimmed);
    let (key, raw) = assignment.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), parse_env_value(raw.trim())))
}

/// Double-quoted values undo the escaping [`upsert_env_value`] applies;
/// single-quoted values are taken literally.
fn parse_env_value(raw: &str) -> String {
    if let Some(inner) = raw.strip_prefix('"').and_then(|value| value.strip_suffix('"')) {
        let mut value = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            match (c, chars.clone().next()) {
                ('\\', Some(next @ ('\\' | '"'))) => {
                    value.push(next);
                    chars.next();
                }
                _ => value.push(c),
            }
        }
        return value;
    }
    raw.strip_prefix('\'')
        .and_then(|value| value.strip_suffix('\''))
        .unwrap_or(raw)
        .to_string()
}

/// Updates or appends a single key inside the `.env` file while preserving
/// unrelated lines and comments.
pub fn upsert_env_value(path: &Path, key: &str, value: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).with_context(|| format!("Creating {}", parent.display()))?;
    }

    let raw = fs::read_to_string(path).unwrap_or_default();
    let mut lines = Vec::new();
    let mut updated = false;
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");

    for line in raw.lines() {
        let trimmed = line.trim_start();
        let indent = &line[..line.len() - trimmed.len()];
        let (prefix, rest) = match trimmed.strip_prefix("export ") {
            Some(stripped) => ("export ", stripped),
            None => ("", trimmed),
        };
        match rest.split_once('=') {
            Some((candidate, _)) if candidate.trim() == key => {
                lines.push(format!("{indent}{prefix}{key}=\"{escaped}\""));
                updated = true;
            }
            _ => lines.push(line.to_string()),
        }
    }

    if !updated {
        lines.push(format!("{key}=\"{escaped}\""));
    }

    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, lines.join("\n") + "\n")
        .with_context(|| format!("Writing {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("Replacing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn make_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    fn settings_from(contents: &str) -> Settings {
        let cfg = make_config(contents);
        let vars = read_env_file(cfg.path()).unwrap();
        build_settings(&vars, |_| None).unwrap()
    }

    #[test]
    fn defaults_apply_when_only_storage_is_set() {
        let settings = settings_from("LOCAL_STORAGE_PATH=\"/data\"\n");
        assert_eq!(settings.local_storage_path, PathBuf::from("/data"));
        assert!(!settings.debug);
        assert_eq!(
            settings.fetch_limit_single_source,
            DEFAULT_FETCH_LIMIT_SINGLE_SOURCE
        );
        assert_eq!(settings.fetch_batch_size, DEFAULT_FETCH_BATCH_SIZE);
        assert_eq!(settings.yt_dlp_bin, PathBuf::from("yt-dlp"));
        assert!(settings.browser_bin.is_none());
    }

    #[test]
    fn missing_storage_path_is_an_error() {
        let vars = read_env_file(make_config("DEBUG=True\n").path()).unwrap();
        let err = build_settings(&vars, |_| None).unwrap_err();
        assert!(err.to_string().contains("LOCAL_STORAGE_PATH"));
    }

    #[test]
    fn booleans_accept_python_style_values() {
        let settings = settings_from(
            "LOCAL_STORAGE_PATH=/d\nDEBUG=True\nLOG_WATCHED=0\nDOWNLOAD_WEB_STREAMS=yes\n",
        );
        assert!(settings.debug);
        assert!(!settings.log_watched);
        assert!(settings.download_web_streams);
    }

    #[test]
    fn invalid_numbers_fall_back_to_defaults() {
        let settings = settings_from(
            "LOCAL_STORAGE_PATH=/d\nFETCH_LIMIT_SINGLE_SOURCE=lots\nFETCH_BATCH_SIZE=0\n",
        );
        assert_eq!(
            settings.fetch_limit_single_source,
            DEFAULT_FETCH_LIMIT_SINGLE_SOURCE
        );
        assert_eq!(settings.fetch_batch_size, DEFAULT_FETCH_BATCH_SIZE);
    }

    #[test]
    fn env_wins_over_file_and_override_wins_over_env() {
        let vars = read_env_file(
            make_config("LOCAL_STORAGE_PATH=\"/file\"\nFETCH_BATCH_SIZE=\"3\"\n").path(),
        )
        .unwrap();
        let env = |key: &str| match key {
            "LOCAL_STORAGE_PATH" => Some("/env".to_string()),
            "FETCH_BATCH_SIZE" => Some("7".to_string()),
            _ => None,
        };
        let settings = build_settings(&vars, env).unwrap();
        assert_eq!(settings.local_storage_path, PathBuf::from("/env"));
        assert_eq!(settings.fetch_batch_size, 7);

        let settings = build_settings_with_overrides(
            &vars,
            env,
            SettingsOverrides {
                local_storage_path: Some(PathBuf::from("/override")),
                debug: Some(true),
                env_path: None,
            },
        )
        .unwrap();
        assert_eq!(settings.local_storage_path, PathBuf::from("/override"));
        assert!(settings.debug);
    }

    #[test]
    fn read_env_file_handles_export_and_quotes() {
        let cfg = make_config(
            r#"
            export LOCAL_STORAGE_PATH="/media"
            BROWSER_BIN='firefox'
            WATCHED_LOG_FILEPATH =  "/logs/watched.txt"
            # comment
            INVALID_LINE
            "#,
        );
        let vars = read_env_file(cfg.path()).unwrap();
        assert_eq!(vars.get("LOCAL_STORAGE_PATH").unwrap(), "/media");
        assert_eq!(vars.get("BROWSER_BIN").unwrap(), "firefox");
        assert_eq!(vars.get("WATCHED_LOG_FILEPATH").unwrap(), "/logs/watched.txt");
        assert!(!vars.contains_key("INVALID_LINE"));
    }

    #[test]
    fn upserted_values_read_back_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        let tricky = r#"C:\Apps\browser "x""#;

        upsert_env_value(&path, "BROWSER_BIN", tricky).unwrap();
        let vars = read_env_file(&path).unwrap();
        assert_eq!(vars.get("BROWSER_BIN").unwrap(), tricky);

        // Saving again must not stack another layer of escapes.
        upsert_env_value(&path, "BROWSER_BIN", vars.get("BROWSER_BIN").unwrap()).unwrap();
        let vars = read_env_file(&path).unwrap();
        assert_eq!(vars.get("BROWSER_BIN").unwrap(), tricky);
    }

    #[test]
    fn lone_backslashes_survive_in_quoted_values() {
        assert_eq!(parse_env_value(r#""C:\Apps\x""#), r"C:\Apps\x");
        assert_eq!(parse_env_value(r"'a\\b'"), r"a\\b");
        assert_eq!(parse_env_value("plain"), "plain");
    }

    #[test]
    fn read_env_file_missing_file_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let vars = read_env_file(&dir.path().join("missing.env")).unwrap();
        assert!(vars.is_empty());
    }

    #[test]
    fn upsert_env_value_replaces_in_place_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, "# settings\nexport DEBUG=\"False\"\nLOCAL_STORAGE_PATH=/d\n").unwrap();

        upsert_env_value(&path, "DEBUG", "True").unwrap();
        upsert_env_value(&path, "BROWSER_BIN", "my \"browser\"").unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = raw.lines().collect();
        assert_eq!(lines[0], "# settings");
        assert_eq!(lines[1], "export DEBUG=\"True\"");
        assert_eq!(lines[3], "BROWSER_BIN=\"my \\\"browser\\\"\"");
    }

    #[test]
    fn resolve_settings_remembers_env_path() {
        let cfg = make_config("LOCAL_STORAGE_PATH=/d\n");
        let settings = resolve_settings(SettingsOverrides {
            env_path: Some(cfg.path().to_path_buf()),
            ..SettingsOverrides::default()
        })
        .unwrap();
        assert_eq!(settings.env_path, cfg.path());
    }

    #[test]
    fn entries_cover_every_key() {
        let settings = settings_from("LOCAL_STORAGE_PATH=/d\n");
        let keys: Vec<_> = settings.entries().into_iter().map(|(key, _)| key).collect();
        assert_eq!(keys, SETTING_KEYS);
    }
}
