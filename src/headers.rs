//! Case-insensitive, multi-value HTTP header collection.
//!
//! Headers are kept as an ordered sequence of `(name, value)` pairs. Name
//! comparison is case-insensitive per RFC 7230, multiple entries with the
//! same name are legal, and insertion order is preserved so that `get`
//! returns the first matching value and `getall` returns all of them in
//! order.

use smallvec::SmallVec;

/// Maximum inline header pairs before heap allocation.
/// Most requests carry ≤16 headers.
pub const MAX_INLINE_HEADERS: usize = 16;

type PairVec = SmallVec<[(String, String); MAX_INLINE_HEADERS]>;

/// Ordered, case-insensitive, multi-value header collection.
///
/// Two `HeaderSet`s are equal iff their pair multisets are equal, regardless
/// of insertion order.
#[derive(Debug, Clone, Default)]
pub struct HeaderSet {
    entries: PairVec,
}

/// Strip the transport prefix from a raw wire key, if present.
///
/// Wire environments hand headers over as `HTTP_`-prefixed keys (e.g.
/// `HTTP_USER_AGENT`); entries without the prefix are transport metadata,
/// not headers.
fn strip_wire_prefix(key: &str) -> Option<&str> {
    let prefix = key.get(..5)?;
    if prefix.eq_ignore_ascii_case("HTTP_") {
        key.get(5..)
    } else {
        None
    }
}

impl HeaderSet {
    /// Create an empty header set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a header set from a flat sequence of name/value pairs.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let entries = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self { entries }
    }

    /// Build a header set from raw wire entries.
    ///
    /// Entries without the transport prefix are skipped. Prefixed keys are
    /// normalized (prefix stripped, underscores mapped to hyphens, remaining
    /// case preserved). Transports that fold repeated headers into one
    /// comma-joined entry get split back into separate pairs.
    #[must_use]
    pub fn from_wire(raw: &[(String, String)]) -> Self {
        let mut set = Self::new();
        for (key, value) in raw {
            let Some(stripped) = strip_wire_prefix(key) else {
                continue;
            };
            let name = stripped.replace('_', "-");
            let mut pushed = false;
            for part in value.split(',') {
                let part = part.trim();
                if !part.is_empty() {
                    set.entries.push((name.clone(), part.to_string()));
                    pushed = true;
                }
            }
            if !pushed {
                set.entries.push((name, String::new()));
            }
        }
        set
    }

    /// First value whose name matches case-insensitively.
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All values whose name matches case-insensitively, in insertion order.
    #[must_use]
    pub fn getall(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Append a pair. Never replaces an existing entry with the same name.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Owned pair list in insertion order, as handed to the wire output.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.entries.to_vec()
    }
}

impl PartialEq for HeaderSet {
    fn eq(&self, other: &Self) -> bool {
        if self.entries.len() != other.entries.len() {
            return false;
        }
        let mut left: Vec<_> = self.entries.iter().collect();
        let mut right: Vec<_> = other.entries.iter().collect();
        left.sort();
        right.sort();
        left == right
    }
}

impl Eq for HeaderSet {}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_is_case_insensitive() {
        let headers = HeaderSet::from_pairs([("I-Am", "terminator")]);
        assert_eq!(headers.get("i-am"), Some("terminator"));
        assert_eq!(headers.get("I-AM"), Some("terminator"));
        assert_eq!(headers.get("missing"), None);
    }

    #[test]
    fn test_add_appends_and_getall_preserves_order() {
        let mut headers = HeaderSet::new();
        headers.add("Some", "a");
        headers.add("Some", "b");
        assert_eq!(headers.getall("some"), vec!["a", "b"]);
        assert_eq!(headers.get("Some"), Some("a"));
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn test_from_wire_normalizes_keys() {
        let raw = vec![
            ("HTTP_USER_AGENT".to_string(), "test client".to_string()),
            ("HTTP_HOST".to_string(), "localhost:8080".to_string()),
            ("REMOTE_ADDR".to_string(), "127.0.0.1".to_string()),
        ];
        let headers = HeaderSet::from_wire(&raw);
        assert_eq!(headers.get("user-agent"), Some("test client"));
        assert_eq!(headers.get("host"), Some("localhost:8080"));
        // Non-prefixed transport metadata is not a header.
        assert!(!headers.contains("remote-addr"));
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn test_from_wire_splits_comma_joined_values() {
        let raw = vec![(
            "HTTP_ACCEPT".to_string(),
            "text/html, application/json".to_string(),
        )];
        let headers = HeaderSet::from_wire(&raw);
        assert_eq!(headers.getall("accept"), vec!["text/html", "application/json"]);
    }

    #[test]
    fn test_from_wire_keeps_empty_value() {
        let raw = vec![("HTTP_X_EMPTY".to_string(), String::new())];
        let headers = HeaderSet::from_wire(&raw);
        assert_eq!(headers.get("x-empty"), Some(""));
    }

    #[test]
    fn test_equality_ignores_order() {
        let a = HeaderSet::from_pairs([("One", "1"), ("Two", "2")]);
        let b = HeaderSet::from_pairs([("Two", "2"), ("One", "1")]);
        assert_eq!(a, b);

        let c = HeaderSet::from_pairs([("One", "1")]);
        assert_ne!(a, c);
    }

    #[test]
    fn test_equality_counts_duplicates() {
        let a = HeaderSet::from_pairs([("X", "1"), ("X", "1")]);
        let b = HeaderSet::from_pairs([("X", "1")]);
        assert_ne!(a, b);
    }
}
