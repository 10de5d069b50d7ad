//! In-memory cache of a `.properties` file
//!
//! The file is read and parsed once when the cache is built; every lookup
//! afterwards is served from memory.

use super::config::ConfigSource;
use super::TelemetryResult;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Parsed `key=value` pairs loaded from a properties file
#[derive(Debug, Clone, Default)]
pub struct PropertiesCache {
    entries: HashMap<String, String>,
}

impl PropertiesCache {
    /// Load a properties file from disk
    pub fn load<P: AsRef<Path>>(path: P) -> TelemetryResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).inspect_err(|e| {
            warn!("Failed to read properties file {}: {}", path.display(), e);
        })?;
        let cache = Self::parse(&contents);
        debug!(
            "Loaded {} properties from {}",
            cache.entries.len(),
            path.display()
        );
        Ok(cache)
    }

    /// Load a properties file, falling back to an empty cache when it is missing
    pub fn load_or_empty<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(cache) => cache,
            Err(_) => {
                warn!("Continuing with empty properties cache");
                Self::default()
            }
        }
    }

    /// Parse properties text
    ///
    /// Lines starting with `#` or `!` are comments. A line ending in an odd
    /// number of backslashes continues on the next line, whose leading
    /// whitespace is dropped. The key ends at the first unescaped `=`, `:` or
    /// whitespace; `\t`, `\n`, `\r`, `\f` and `\uXXXX` escapes are decoded
    /// and any other escaped character stands for itself. Values are trimmed
    /// at both ends. Later keys override earlier ones.
    pub fn parse(contents: &str) -> Self {
        let mut entries = HashMap::new();
        let mut logical = String::new();
        let mut continuing = false;

        for raw in contents.lines() {
            let line = raw.trim_start();
            if !continuing
                && (line.is_empty() || line.starts_with('#') || line.starts_with('!'))
            {
                continue;
            }

            continuing = ends_with_continuation(line);
            if continuing {
                logical.push_str(&line[..line.len() - 1]);
                continue;
            }

            logical.push_str(line);
            let (key, value) = split_entry(&logical);
            entries.insert(key, value);
            logical.clear();
        }

        if continuing {
            let (key, value) = split_entry(&logical);
            entries.insert(key, value);
        }

        Self { entries }
    }

    /// Build a cache directly from key/value pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Look up a property
    pub fn get_property(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A trailing backslash continues the line unless it is itself escaped
fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

/// Split one logical line into its unescaped key and value
fn split_entry(line: &str) -> (String, String) {
    let mut key_end = line.len();
    let mut value_start = line.len();
    let mut escaped = false;

    for (idx, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                key_end = idx;
                value_start = idx + 1;
                break;
            }
            c if c.is_whitespace() => {
                key_end = idx;
                let rest = line[idx..].trim_start();
                let rest_start = line.len() - rest.len();
                value_start = match rest.chars().next() {
                    Some('=') | Some(':') => rest_start + 1,
                    _ => rest_start,
                };
                break;
            }
            _ => {}
        }
    }

    (
        unescape(&line[..key_end]),
        unescape(line[value_start..].trim()),
    )
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{000C}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    out
}

impl ConfigSource for PropertiesCache {
    fn get(&self, key: &str) -> Option<String> {
        self.get_property(key).map(str::to_string)
    }
}
