//! Source locator rules
//!
//! A locator is the URL a user submits for download. It is stored verbatim
//! (after trimming) and never fetched; this module only decides whether it is
//! acceptable and what human-readable name the job gets.

use crate::config::LocatorConfig;
use crate::error::{Error, Result};
use regex::Regex;
use std::sync::LazyLock;

/// `/<name>_<digits>.htm` anywhere in the path, as used by the image site's detail pages
static DETAIL_PAGE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"/([^/]+)_(\d+)\.htm").ok());

/// Validate a submitted locator and return its normalized form
///
/// Accepts absolute `http`/`https` URLs whose host is one of
/// `config.allowed_hosts` or a subdomain of one.
pub fn validate_locator(raw: &str, config: &LocatorConfig) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("url", "URL is required"));
    }
    if trimmed.len() > config.max_length {
        return Err(Error::validation(
            "url",
            format!("URL must be at most {} characters", config.max_length),
        ));
    }

    let parsed =
        url::Url::parse(trimmed).map_err(|_| Error::validation("url", "Invalid URL format"))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(Error::validation(
                "url",
                format!(
                    "URL scheme '{}' is not allowed; only http and https are supported",
                    scheme
                ),
            ));
        }
    }

    let host = parsed
        .host_str()
        .map(|h| h.to_ascii_lowercase())
        .ok_or_else(|| Error::validation("url", "URL must include a host"))?;

    if !config.allowed_hosts.iter().any(|allowed| host_matches(&host, allowed)) {
        return Err(Error::validation(
            "url",
            format!("URL must point to {}", config.allowed_hosts.join(" or ")),
        ));
    }

    Ok(trimmed.to_string())
}

fn host_matches(host: &str, allowed: &str) -> bool {
    let allowed = allowed.trim().to_ascii_lowercase();
    host == allowed
        || host
            .strip_suffix(allowed.as_str())
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Derive a job's display name from its locator
///
/// Takes `<name>` from a `/<name>_<digits>.htm` path segment, percent-decodes
/// it and turns dashes into spaces. Anything else yields `fallback`.
pub fn display_name(locator: &str, fallback: &str) -> String {
    let path = match url::Url::parse(locator) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => locator.to_string(),
    };

    let Some(regex) = DETAIL_PAGE.as_ref() else {
        return fallback.to_string();
    };

    let Some(raw_name) = regex.captures(&path).and_then(|c| c.get(1)) else {
        return fallback.to_string();
    };

    let decoded = urlencoding::decode(raw_name.as_str())
        .map(|d| d.into_owned())
        .unwrap_or_else(|_| raw_name.as_str().to_string());

    let name = file_safe(&decoded.replace('-', " "));
    if name.is_empty() {
        fallback.to_string()
    } else {
        name
    }
}

/// Reduce a name to something usable as a single path component
///
/// Path separators and control characters become spaces, runs of whitespace
/// collapse, and leading or trailing dots are dropped so the result can never
/// name a parent directory.
pub fn file_safe(name: &str) -> String {
    let spaced: String = name
        .chars()
        .map(|c| {
            if c == '/' || c == '\\' || c.is_control() {
                ' '
            } else {
                c
            }
        })
        .collect();

    let collapsed = spaced.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_matches(|c: char| c == '.' || c.is_whitespace())
        .to_string()
}
