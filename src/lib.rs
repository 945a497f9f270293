// wbrewrite
//
// URL-rewriting HTML/CSS/JS transformer for archive replay. Given a
// `UrlRewriter` bound to a capture's timestamp and target URL, rewrites
// every URL-bearing attribute, inline style, inline script, and meta
// refresh in an HTML document so a browser fetches resources from the
// replay endpoint instead of the live web.
//
// Module layout, leaves first:
//   wburl  — the {timestamp, modifier, target_url} reference HtmlRewriter's
//            UrlRewriter is built from.
//   url    — UrlRewriter: the core URL-stamping operation.
//   css    — CssRewriter: url()/@import rewriting.
//   js     — JsRewriter: fixed textual substitutions and URL-literal
//            rewriting over JS text.
//   html   — HtmlRewriter: the streaming tokenizer-driven rewriter tying
//            the above together.
//   sink   — the output sink trait plus the default in-memory accumulator.
//   error  — the crate's error taxonomy.

pub mod css;
pub mod error;
pub mod html;
pub mod js;
pub mod sink;
pub mod url;
pub mod wburl;

pub use css::CssRewriter;
pub use error::{RewriteError, Result};
pub use html::{HtmlRewriter, HtmlRewriterBuilder};
pub use js::JsRewriter;
pub use sink::{FmtSink, MemorySink, OutputSink};
pub use url::UrlRewriter;
pub use wburl::WbUrl;
