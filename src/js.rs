// wbrewrite::js
//
// JavaScript rewriter. Not a JS parser: applies a small, fixed, ordered
// list of textual rules over the raw source text. `window.location` ->
// `window.WB_wombat_location` is a literal substitution; absolute
// `http(s)://` URL string literals are resolved and archive-stamped the
// same way an HTML attribute would be, through the same `UrlRewriter`
// the HTML/CSS sub-rewriters share.
//
// examples/nexora240-lgtm-Internex's `js.rs` builds a full swc AST visitor
// instead, but that crate targets a live forward proxy rewriting arbitrary
// third-party JS. pywb's original `regex_rewriters.JSRewriter` (see
// examples/original_source) is the lineage this rewriter actually follows,
// and its default rule set does both things this module does: substitute
// `window.location` and archive-rewrite absolute URL literals found in the
// source text. Compiled patterns are cached process-wide via `once_cell`,
// same as the CSS/HTML sub-rewriters.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::url::UrlRewriter;

/// One literal-to-literal substitution applied in order, before the
/// URL-literal pass.
struct Substitution {
    pattern: Regex,
    replacement: &'static str,
}

static DEFAULT_SUBSTITUTIONS: Lazy<Vec<Substitution>> = Lazy::new(|| {
    vec![Substitution {
        pattern: Regex::new(r"window\.location").unwrap(),
        replacement: "window.WB_wombat_location",
    }]
});

/// Matches a single- or double-quoted `http(s)://` string literal, captured
/// without its quotes so the quote character can be preserved on rewrite.
static URL_LITERAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""(https?://[^"]*)"|'(https?://[^']*)'"#).unwrap());

/// Applies a fixed, ordered set of textual rules to JavaScript text.
pub struct JsRewriter {
    substitutions: &'static [Substitution],
}

impl JsRewriter {
    /// The stock rewriter: the `window.location` substitution plus
    /// archive-rewriting of absolute URL string literals.
    pub fn new() -> Self {
        Self { substitutions: &DEFAULT_SUBSTITUTIONS }
    }

    pub fn rewrite(&self, js_text: &str, rewriter: &UrlRewriter) -> String {
        let mut out = js_text.to_string();
        for sub in self.substitutions {
            out = sub.pattern.replace_all(&out, sub.replacement).into_owned();
        }
        out = URL_LITERAL_RE
            .replace_all(&out, |caps: &Captures| match (caps.get(1), caps.get(2)) {
                (Some(url), _) => format!("\"{}\"", rewriter.rewrite(url.as_str(), None)),
                (_, Some(url)) => format!("'{}'", rewriter.rewrite(url.as_str(), None)),
                _ => caps[0].to_string(),
            })
            .into_owned();
        out
    }
}

impl Default for JsRewriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wburl::WbUrl;

    fn rewriter() -> UrlRewriter {
        UrlRewriter::new(
            WbUrl::new("20131226101010", "", "http://example.com/some/path/index.html"),
            "/web/",
        )
    }

    #[test]
    fn rewrites_window_location_and_url_literal() {
        let js = JsRewriter::new();
        let out = js.rewrite(r#"window.location = "http://example.com/a/b/c.html""#, &rewriter());
        assert_eq!(
            out,
            r#"window.WB_wombat_location = "/web/20131226101010/http://example.com/a/b/c.html""#
        );
    }

    #[test]
    fn leaves_unrelated_text_untouched() {
        let js = JsRewriter::new();
        let out = js.rewrite("var x = 1 + 2;", &rewriter());
        assert_eq!(out, "var x = 1 + 2;");
    }

    #[test]
    fn rewrites_multiple_occurrences() {
        let js = JsRewriter::new();
        let out = js.rewrite("window.location; window.location;", &rewriter());
        assert_eq!(out, "window.WB_wombat_location; window.WB_wombat_location;");
    }

    #[test]
    fn rewrites_single_quoted_url_literal() {
        let js = JsRewriter::new();
        let out = js.rewrite("var u = 'http://example.com/x.js';", &rewriter());
        assert_eq!(out, "var u = '/web/20131226101010/http://example.com/x.js';");
    }

    #[test]
    fn leaves_relative_string_literals_untouched() {
        let js = JsRewriter::new();
        let out = js.rewrite(r#"var s = "not a url";"#, &rewriter());
        assert_eq!(out, r#"var s = "not a url";"#);
    }
}
