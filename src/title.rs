#![forbid(unsafe_code)]

//! Display-name helpers: title sanitizing and page-title lookup.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::lister::ChannelLister;
use crate::model::StreamSourceType;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";
const FORBIDDEN: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

static TITLE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("title regex is valid")
});

/// Strips control and path-hostile characters and collapses whitespace.
pub fn sanitize(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .filter(|c| !FORBIDDEN.contains(c))
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Looks up a human readable name for `url`.
///
/// YouTube video pages go through the lister (the HTML title there is just
/// "YouTube" without JavaScript); channels and everything else are fetched
/// over HTTP. Returns `None` when nothing usable was found.
pub fn page_title(url: &str, lister: &impl ChannelLister) -> Option<String> {
    let lower = url.to_ascii_lowercase();
    let is_channel = lower.contains("/user/")
        || lower.contains("/channel/")
        || lower.contains("/@")
        || lower.contains("/c/");

    let title = if StreamSourceType::from_uri(url) == StreamSourceType::Youtube && !is_channel {
        tracing::debug!(%url, "getting title from yt-dlp");
        match lister.video_title(url) {
            Ok(title) => title,
            Err(err) => {
                tracing::warn!(%url, error = %err, "could not fetch video title");
                None
            }
        }
    } else {
        tracing::debug!(%url, "getting title from page");
        match fetch_html_title(url) {
            Ok(title) => title,
            Err(err) => {
                tracing::warn!(%url, error = %err, "could not fetch page title");
                None
            }
        }
    };

    title.map(|title| sanitize(&title)).filter(|title| !title.is_empty())
}

fn fetch_html_title(url: &str) -> anyhow::Result<Option<String>> {
    let agent = ureq::AgentBuilder::new()
        .timeout(Duration::from_secs(20))
        .user_agent(USER_AGENT)
        .build();
    let body = agent.get(url).call()?.into_string()?;
    Ok(extract_title(&body))
}

fn extract_title(html: &str) -> Option<String> {
    let raw = TITLE_TAG.captures(html)?.get(1)?.as_str();
    let decoded = decode_entities(raw.trim());
    Some(decoded).filter(|title| !title.is_empty())
}

fn decode_entities(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
