// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Origin matching for intercepted requests.

use tracing::debug;
use url::Url;

/// Decides whether a request URL belongs to the configured backend origins.
#[derive(Clone, Debug)]
pub struct DomainMatcher {
    origins: Vec<String>,
}

impl DomainMatcher {
    /// Build a matcher from configured base URLs.
    ///
    /// Base URLs that fail to parse are kept verbatim (minus a trailing
    /// slash) so the substring fallback can still use them.
    pub fn new<I, S>(base_urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut origins: Vec<String> = Vec::new();
        for base in base_urls {
            let base = base.as_ref().trim();
            if base.is_empty() {
                continue;
            }
            let origin = origin_of(base).unwrap_or_else(|| base.trim_end_matches('/').to_string());
            if !origins.contains(&origin) {
                origins.push(origin);
            }
        }
        Self { origins }
    }

    /// Allowed origins, in configuration order.
    pub fn origins(&self) -> &[String] {
        &self.origins
    }

    /// True if `url`'s origin equals a configured origin.
    ///
    /// Malformed URLs fall back to substring containment of each origin
    /// without its scheme. The fallback is lossy and never an error.
    pub fn matches(&self, url: &str) -> bool {
        match Url::parse(url) {
            Ok(parsed) => {
                let origin = parsed.origin();
                origin.is_tuple() && self.origins.contains(&origin.ascii_serialization())
            }
            Err(_) => {
                let hit = self
                    .origins
                    .iter()
                    .any(|o| url.contains(strip_scheme(o)));
                debug!(url, hit, "url did not parse, used substring fallback");
                hit
            }
        }
    }
}

/// ASCII origin (`scheme://host[:port]`) of a URL, if it has a tuple origin.
fn origin_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let origin = parsed.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}

fn strip_scheme(origin: &str) -> &str {
    origin
        .split_once("://")
        .map_or(origin, |(_, rest)| rest)
}

#[cfg(test)]
#[path = "matcher_tests.rs"]
mod tests;
