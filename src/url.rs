// wbrewrite::url
//
// URL rewriting for archive replay. Every absolute or relative URL that
// flows through the HTML/CSS rewriters is resolved against the current
// base URL and stamped with the archive prefix, capture timestamp, and a
// resource-type modifier so the browser re-fetches it from the replay
// endpoint instead of the live web.
//
// Output format:  <prefix><timestamp><modifier?>/<absolute-target-url>
//
// Grounded on examples/nexora240-lgtm-Internex's `url::encode_url` /
// `encode_url_with_base` pair, adapted from a forward-proxy `/proxy?url=`
// encoding to the archive's `prefix + timestamp + modifier + '/' + url`
// encoding described by the wburl reference implementation.

use url::Url;

use crate::wburl::WbUrl;

/// Schemes that are never rewritten — they either carry no network
/// resource (`javascript:`) or are already self-contained (`mailto:`,
/// `data:`).
const PASSTHROUGH_SCHEMES: &[&str] = &["javascript:", "mailto:", "data:"];

/// Resolves relative URLs against a mutable base and stamps absolute URLs
/// with the archive prefix, capture timestamp, and resource modifier.
///
/// Pure aside from `set_base_url`; never panics on malformed input — URL
/// resolution failures fall back to returning the input unchanged.
#[derive(Debug, Clone)]
pub struct UrlRewriter {
    wburl: WbUrl,
    prefix: String,
    base_url: String,
}

impl UrlRewriter {
    pub fn new(wburl: WbUrl, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let base_url = wburl.target_url.clone();
        Self { wburl, prefix, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve `value` against `base_url` and return the archive-prefixed
    /// URL. `value` is returned unchanged when empty, a bare fragment, or
    /// prefixed with a passthrough scheme. `modifier` overrides the
    /// wburl's own modifier when given (e.g. `Some("im_")` for `<img>`).
    pub fn rewrite(&self, value: &str, modifier: Option<&str>) -> String {
        if value.is_empty() || value.starts_with('#') {
            return value.to_string();
        }

        let lower = value.trim_start().to_ascii_lowercase();
        if PASSTHROUGH_SCHEMES.iter().any(|scheme| lower.starts_with(scheme)) {
            return value.to_string();
        }

        let absolute = match self.resolve(value) {
            Some(u) => u,
            None => return value.to_string(),
        };

        // An explicitly empty modifier (the table's "generic" entries) falls
        // back to the wburl's own modifier, same as passing `None`.
        let modifier = modifier.filter(|m| !m.is_empty()).unwrap_or(&self.wburl.modifier);
        format!("{}{}{}/{}", self.prefix, self.wburl.timestamp, modifier, absolute)
    }

    /// Replace `base_url` with the absolute resolution of `value` against
    /// the current `base_url`. Leaves `base_url` untouched if resolution
    /// fails.
    pub fn set_base_url(&mut self, value: &str) {
        if let Some(resolved) = self.resolve(value) {
            self.base_url = resolved;
        }
    }

    /// Resolve `value` against `base_url`, tolerating malformed URLs on
    /// either side by returning `None` rather than raising.
    fn resolve(&self, value: &str) -> Option<String> {
        match Url::parse(value) {
            Ok(u) => Some(u.to_string()),
            Err(_) => {
                let base = Url::parse(&self.base_url).ok()?;
                base.join(value).ok().map(|u| u.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewriter() -> UrlRewriter {
        UrlRewriter::new(
            WbUrl::new("20131226101010", "", "http://example.com/some/path/index.html"),
            "/web/",
        )
    }

    #[test]
    fn rewrites_relative_against_base() {
        let r = rewriter();
        assert_eq!(
            r.rewrite("page.html", None),
            "/web/20131226101010/http://example.com/some/path/page.html"
        );
    }

    #[test]
    fn rewrites_with_modifier_override() {
        let r = rewriter();
        assert_eq!(
            r.rewrite("../img.gif", Some("im_")),
            "/web/20131226101010im_/http://example.com/some/img.gif"
        );
    }

    #[test]
    fn fragment_unchanged() {
        let r = rewriter();
        assert_eq!(r.rewrite("#abc", None), "#abc");
    }

    #[test]
    fn empty_unchanged() {
        let r = rewriter();
        assert_eq!(r.rewrite("", None), "");
    }

    #[test]
    fn javascript_scheme_unchanged() {
        let r = rewriter();
        assert_eq!(r.rewrite("javascript:void(0)", None), "javascript:void(0)");
    }

    #[test]
    fn mailto_scheme_unchanged() {
        let r = rewriter();
        assert_eq!(r.rewrite("mailto:a@b.com", None), "mailto:a@b.com");
    }

    #[test]
    fn data_scheme_unchanged() {
        let r = rewriter();
        assert_eq!(r.rewrite("data:text/plain,hi", None), "data:text/plain,hi");
    }

    #[test]
    fn malformed_base_leaves_base_unchanged() {
        let mut r = rewriter();
        r.set_base_url("not a valid base \u{0}");
        assert_eq!(r.base_url(), "http://example.com/some/path/index.html");
    }

    #[test]
    fn set_base_url_changes_resolution() {
        let mut r = rewriter();
        r.set_base_url("http://example.com/other/dir/");
        assert_eq!(
            r.rewrite("x.html", None),
            "/web/20131226101010/http://example.com/other/dir/x.html"
        );
    }

    #[test]
    fn reapplying_to_already_rewritten_url_reprefixes() {
        // Documents the contract: the rewriter is not idempotent. An
        // already-prefixed URL has no scheme of its own, so a second pass
        // resolves it against the base and stamps a second prefix rather
        // than recognizing and skipping the first one.
        let r = rewriter();
        let once = r.rewrite("page.html", None);
        let twice = r.rewrite(&once, None);
        assert_ne!(once, twice);
        assert!(twice.starts_with("/web/20131226101010/"));
        assert!(twice.contains(&once[1..]) || twice.ends_with(&once));
    }

    #[test]
    fn absolute_input_ignores_base() {
        let r = rewriter();
        assert_eq!(
            r.rewrite("http://another.com/a.html", None),
            "/web/20131226101010/http://another.com/a.html"
        );
    }
}
