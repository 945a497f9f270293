// wbrewrite::wburl
//
// The archival URL reference tying a capture timestamp, a replay modifier,
// and the captured page's original URL together. `UrlRewriter` carries one
// of these to know which timestamp/modifier to stamp onto every rewritten
// URL and which URL to treat as the initial base for resolving relatives.
//
// Grounded on pywb's `wburl.py` (see examples/original_source), which
// parses the same three fields out of a path segment such as
// `20131226101010im_/http://example.com/some/img.gif`.

use std::fmt;

/// A parsed archival URL reference: `{timestamp}{modifier}/{target_url}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WbUrl {
    pub timestamp: String,
    pub modifier: String,
    pub target_url: String,
}

impl WbUrl {
    pub fn new(timestamp: impl Into<String>, modifier: impl Into<String>, target_url: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            modifier: modifier.into(),
            target_url: target_url.into(),
        }
    }

    /// Parse a wburl path segment, e.g. `20131226101010im_/http://example.com/a.gif`
    /// or `20131226101010/http://example.com/index.html`.
    ///
    /// The timestamp is the leading run of ASCII digits; everything between
    /// the timestamp and the first `/` is the modifier (often empty); the
    /// remainder is the target URL. Returns `None` if no leading digit run
    /// is present.
    pub fn parse(wburl: &str) -> Option<Self> {
        let digit_len = wburl.chars().take_while(|c| c.is_ascii_digit()).count();
        if digit_len == 0 {
            return None;
        }
        let (timestamp, rest) = wburl.split_at(digit_len);
        let slash = rest.find('/')?;
        let (modifier, target) = rest.split_at(slash);
        let target_url = &target[1..];
        Some(Self::new(timestamp, modifier, target_url))
    }
}

impl fmt::Display for WbUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}/{}", self.timestamp, self.modifier, self.target_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_modifier() {
        let w = WbUrl::parse("20131226101010im_/http://example.com/some/img.gif").unwrap();
        assert_eq!(w.timestamp, "20131226101010");
        assert_eq!(w.modifier, "im_");
        assert_eq!(w.target_url, "http://example.com/some/img.gif");
    }

    #[test]
    fn parses_without_modifier() {
        let w = WbUrl::parse("20131226101010/http://example.com/some/path/index.html").unwrap();
        assert_eq!(w.timestamp, "20131226101010");
        assert_eq!(w.modifier, "");
        assert_eq!(w.target_url, "http://example.com/some/path/index.html");
    }

    #[test]
    fn rejects_missing_timestamp() {
        assert!(WbUrl::parse("/http://example.com").is_none());
    }

    #[test]
    fn display_roundtrips() {
        let w = WbUrl::new("20131226101010", "im_", "http://example.com/a.gif");
        assert_eq!(w.to_string(), "20131226101010im_/http://example.com/a.gif");
    }
}
