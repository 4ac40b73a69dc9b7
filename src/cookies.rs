//! Key/value cookie collection with wire (de)serialization.

use std::collections::BTreeMap;

use crate::headers::HeaderSet;

/// Cookie collection with unique keys and last-write-wins semantics.
///
/// The wire form is a `"; "`-joined list of `k=v` pairs. Encoding order is
/// deterministic (sorted by key), and `parse(&jar.encode()) == jar` holds for
/// any jar whose values contain no `;` or `=`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    values: BTreeMap<String, String>,
}

impl CookieJar {
    /// Create an empty jar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a jar from name/value pairs. Duplicate keys keep the last value.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self { values }
    }

    /// Parse a raw wire cookie string.
    ///
    /// Splits on `;`, trims each segment, and splits each segment on the
    /// first `=`. Segments without an `=` get an empty value; empty segments
    /// are skipped.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let mut jar = Self::new();
        for segment in raw.split(';') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let mut parts = segment.splitn(2, '=');
            let name = parts.next().unwrap_or("").trim();
            let value = parts.next().unwrap_or("").trim();
            if !name.is_empty() {
                jar.values.insert(name.to_string(), value.to_string());
            }
        }
        jar
    }

    /// Parse the cookie-bearing entry out of a header collection.
    ///
    /// Returns an empty jar when no such entry exists.
    #[must_use]
    pub fn from_headers(headers: &HeaderSet) -> Self {
        headers.get("cookie").map(Self::parse).unwrap_or_default()
    }

    /// Insert or replace a cookie.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Wire encoding: `"; "`-joined `k=v` pairs. An empty jar encodes to the
    /// empty string and contributes no header.
    #[must_use]
    pub fn encode(&self) -> String {
        self.values
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CookieJar {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wire_string() {
        let jar = CookieJar::parse("user=me;token=abc");
        assert_eq!(jar.get("user"), Some("me"));
        assert_eq!(jar.get("token"), Some("abc"));
        assert_eq!(jar.len(), 2);
    }

    #[test]
    fn test_parse_trims_and_skips_empty_segments() {
        let jar = CookieJar::parse(" a=1 ;; b = 2 ;");
        assert_eq!(jar.get("a"), Some("1"));
        assert_eq!(jar.get("b"), Some("2"));
        assert_eq!(jar.len(), 2);
    }

    #[test]
    fn test_parse_splits_on_first_equals() {
        let jar = CookieJar::parse("flag;pair=a=b");
        assert_eq!(jar.get("flag"), Some(""));
        assert_eq!(jar.get("pair"), Some("a=b"));
    }

    #[test]
    fn test_set_upserts() {
        let mut jar = CookieJar::new();
        jar.set("one", "1");
        jar.set("one", "2");
        assert_eq!(jar.get("one"), Some("2"));
        assert_eq!(jar.len(), 1);
    }

    #[test]
    fn test_encode_round_trip() {
        let jar = CookieJar::from_pairs([("user", "me"), ("token", "abc")]);
        assert_eq!(CookieJar::parse(&jar.encode()), jar);
    }

    #[test]
    fn test_empty_jar_encodes_to_empty_string() {
        assert_eq!(CookieJar::new().encode(), "");
    }

    #[test]
    fn test_from_headers() {
        let headers = HeaderSet::from_pairs([("Cookie", "a=b; c=d")]);
        let jar = CookieJar::from_headers(&headers);
        assert_eq!(jar.get("a"), Some("b"));
        assert_eq!(jar.get("c"), Some("d"));

        assert!(CookieJar::from_headers(&HeaderSet::new()).is_empty());
    }
}
