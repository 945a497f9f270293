// wbrewrite::html
//
// Streaming HTML rewriter. Drives html5ever's low-level tokenizer directly
// (no DOM, no tree builder) and reacts to each token as it is produced:
// start/start-end tags get their URL-bearing attributes rewritten, text
// inside `<script>`/`<style>` is delegated to the JS/CSS sub-rewriters, and
// a configured head-insert fragment is emitted at the earliest point the
// rewriter is certain the head region has begun (or that there is none).
//
// The `parse_context` flag and the TokenSink/BufferQueue wiring follow
// examples/LunNova-x's `site/src/url_rewriter.rs`, which tokenizes HTML the
// same way (flag-based script/style tracking rather than telling the
// tokenizer to switch into its own raw-text state) and carries the same
// caveat: this is correct for well-formed archived pages but, like that
// reference, can mis-tokenize a `<script>` body containing a literal `<`
// that looks like a tag open. examples/nexora240-lgtm-Internex's `html.rs`
// walks a full DOM instead; that approach can't express the streaming,
// chunk-at-a-time `rewrite()`/`close()` contract this crate needs, so the
// attribute tables and per-tag rewrite rules are carried over from it but
// the tokenizer driving is grounded on LunNova-x instead.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use html5ever::tokenizer::{
    BufferQueue, EndTag, StartTag, Tag, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use html5ever::Attribute;
use html5ever::tokenizer::TokenizerResult;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::css::CssRewriter;
use crate::error::{RewriteError, Result};
use crate::js::JsRewriter;
use crate::sink::{MemorySink, OutputSink};
use crate::url::UrlRewriter;

/// An HTML element whose body is not HTML and must be dispatched to a
/// sub-rewriter: `<script>` to `JsRewriter`, `<style>` to `CssRewriter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StateTag {
    Script,
    Style,
}

impl StateTag {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "script" => Some(StateTag::Script),
            "style" => Some(StateTag::Style),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            StateTag::Script => "script",
            StateTag::Style => "style",
        }
    }
}

static STATE_TAGS: Lazy<HashSet<&'static str>> = Lazy::new(|| ["script", "style"].into_iter().collect());

static HEAD_TAGS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "html", "head", "base", "link", "meta", "title", "style", "script", "object", "bgsound",
    ]
    .into_iter()
    .collect()
});

/// tag -> {attr -> modifier}. An empty modifier means "use the wburl's own
/// modifier"; `"meta"` and `"head"` carry no generically-rewritable attrs of
/// their own and exist only so their start tags are routed through the
/// attribute path instead of passthrough (`meta`'s `content` attribute is
/// special-cased for meta-refresh below; `head`'s start tag needs to be
/// seen so head-insertion can fire on it).
static REWRITE_TAGS: Lazy<HashMap<&'static str, HashMap<&'static str, &'static str>>> = Lazy::new(|| {
    fn attrs(pairs: &[(&'static str, &'static str)]) -> HashMap<&'static str, &'static str> {
        pairs.iter().cloned().collect()
    }

    let mut tags = HashMap::new();
    tags.insert("a", attrs(&[("href", "")]));
    tags.insert("area", attrs(&[("href", "")]));
    tags.insert("base", attrs(&[("href", "")]));
    tags.insert("applet", attrs(&[("codebase", "oe_"), ("archive", "oe_")]));
    tags.insert("blockquote", attrs(&[("cite", "")]));
    tags.insert("del", attrs(&[("cite", "")]));
    tags.insert("ins", attrs(&[("cite", "")]));
    tags.insert("q", attrs(&[("cite", "")]));
    tags.insert("body", attrs(&[("background", "im_")]));
    tags.insert("embed", attrs(&[("src", "oe_")]));
    tags.insert("head", attrs(&[]));
    tags.insert("iframe", attrs(&[("src", "if_")]));
    tags.insert("img", attrs(&[("src", "im_")]));
    tags.insert("input", attrs(&[("src", "im_")]));
    tags.insert("form", attrs(&[("action", "")]));
    tags.insert("frame", attrs(&[("src", "fr_")]));
    tags.insert("link", attrs(&[("href", "oe_")]));
    tags.insert("meta", attrs(&[]));
    tags.insert("object", attrs(&[("codebase", "oe_"), ("data", "oe_")]));
    tags.insert("ref", attrs(&[("href", "oe_")]));
    tags.insert("script", attrs(&[("src", "js_")]));
    tags.insert("div", attrs(&[("data-src", ""), ("data-uri", "")]));
    tags.insert("li", attrs(&[("data-src", ""), ("data-uri", "")]));
    tags
});

static META_REFRESH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)^(?P<prefix>[^;]*;\s*url\s*=\s*)(?P<url>.*)$").unwrap());

/// `<delay> ; url = <URL>` — extract, rewrite, and re-splice the URL
/// portion, preserving everything else byte-for-byte. On regex mismatch
/// (no `url=` segment, e.g. a bare delay) the value is returned unchanged.
fn rewrite_meta_refresh(content: &str, url_rewriter: &UrlRewriter) -> String {
    match META_REFRESH_RE.captures(content) {
        Some(caps) => {
            let prefix = &caps["prefix"];
            let url = &caps["url"];
            format!("{}{}", prefix, url_rewriter.rewrite(url, None))
        }
        None => content.to_string(),
    }
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr_value(s: &str) -> String {
    s.replace('&', "&amp;").replace('"', "&quot;")
}

fn write_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape_attr_value(value));
    out.push('"');
}

// ---------------------------------------------------------------------------
// TokenSink
// ---------------------------------------------------------------------------

struct RewriteSink<S: OutputSink> {
    url_rewriter: RefCell<UrlRewriter>,
    head_insert: RefCell<Option<String>>,
    parse_context: RefCell<Option<StateTag>>,
    js_rewriter: JsRewriter,
    css_rewriter: CssRewriter,
    out: RefCell<S>,
    err: RefCell<Option<RewriteError>>,
}

impl<S: OutputSink> RewriteSink<S> {
    fn emit(&self, s: &str) {
        if let Err(e) = self.out.borrow_mut().write(s) {
            *self.err.borrow_mut() = Some(RewriteError::from(e));
        }
    }

    fn handle_start_tag(&self, tag: &Tag) {
        let tag_name: &str = &tag.name;

        {
            let mut parse_context = self.parse_context.borrow_mut();
            if STATE_TAGS.contains(tag_name) && parse_context.is_none() {
                *parse_context = StateTag::from_name(tag_name);
            } else if parse_context.is_none() && !HEAD_TAGS.contains(tag_name) {
                drop(parse_context);
                if let Some(insert) = self.head_insert.borrow_mut().take() {
                    self.emit(&insert);
                }
            }
        }

        let mut out = String::new();
        out.push('<');
        out.push_str(tag_name);

        if REWRITE_TAGS.contains_key(tag_name) {
            self.rewrite_attrs(tag_name, &tag.attrs, &mut out);
        } else {
            for attr in &tag.attrs {
                write_attr(&mut out, &attr.name.local, &attr.value);
            }
        }

        out.push_str(if tag.self_closing { "/>" } else { ">" });
        self.emit(&out);

        if tag_name == "head" && self.parse_context.borrow().is_none() {
            if let Some(insert) = self.head_insert.borrow_mut().take() {
                self.emit(&insert);
            }
        }
    }

    fn rewrite_attrs(&self, tag_name: &str, attrs: &[Attribute], out: &mut String) {
        let rewrite_table = REWRITE_TAGS.get(tag_name);
        let is_meta_refresh = tag_name == "meta"
            && attrs
                .iter()
                .any(|a| a.name.local.as_ref().eq_ignore_ascii_case("http-equiv") && a.value.eq_ignore_ascii_case("refresh"));

        let mut url_rewriter = self.url_rewriter.borrow_mut();

        for attr in attrs {
            let attr_name: &str = &attr.name.local;
            let attr_value: &str = &attr.value;

            let new_value = if attr_value.to_ascii_lowercase().starts_with("javascript:") || attr_name.starts_with("on")
            {
                self.js_rewriter.rewrite(attr_value, &url_rewriter)
            } else if attr_name == "style" {
                self.css_rewriter.rewrite(attr_value, &url_rewriter)
            } else if tag_name == "meta" && attr_name == "content" && is_meta_refresh {
                rewrite_meta_refresh(attr_value, &url_rewriter)
            } else {
                if tag_name == "base" && attr_name == "href" && !attr_value.is_empty() {
                    url_rewriter.set_base_url(attr_value);
                }
                match rewrite_table.and_then(|m| m.get(attr_name)) {
                    Some(modifier) => url_rewriter.rewrite(attr_value, Some(*modifier)),
                    None => attr_value.to_string(),
                }
            };

            write_attr(out, attr_name, &new_value);
        }
    }

    fn handle_end_tag(&self, tag: &Tag) {
        let tag_name: &str = &tag.name;
        {
            let mut parse_context = self.parse_context.borrow_mut();
            if parse_context.map(StateTag::as_str) == Some(tag_name) {
                *parse_context = None;
            }
        }
        self.emit(&format!("</{}>", tag_name));
    }

    fn handle_text(&self, text: &str) {
        match *self.parse_context.borrow() {
            Some(StateTag::Script) => {
                let rewritten = self.js_rewriter.rewrite(text, &self.url_rewriter.borrow());
                self.emit(&rewritten);
            }
            Some(StateTag::Style) => {
                let rewritten = self.css_rewriter.rewrite(text, &self.url_rewriter.borrow());
                self.emit(&rewritten);
            }
            None => self.emit(&escape_text(text)),
        }
    }

    fn handle_comment(&self, text: &str) {
        let body = match *self.parse_context.borrow() {
            Some(StateTag::Script) => self.js_rewriter.rewrite(text, &self.url_rewriter.borrow()),
            Some(StateTag::Style) => self.css_rewriter.rewrite(text, &self.url_rewriter.borrow()),
            None => text.to_string(),
        };
        self.emit(&format!("<!--{}-->", body));
    }
}

impl<S: OutputSink> TokenSink for RewriteSink<S> {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<Self::Handle> {
        match token {
            Token::TagToken(ref tag) => match tag.kind {
                StartTag => self.handle_start_tag(tag),
                EndTag => self.handle_end_tag(tag),
            },
            Token::CharacterTokens(ref text) => self.handle_text(text),
            Token::CommentToken(ref text) => self.handle_comment(text),
            Token::DoctypeToken(ref doctype) => {
                let mut out = String::from("<!DOCTYPE");
                if let Some(name) = &doctype.name {
                    out.push(' ');
                    out.push_str(name);
                }
                if let Some(public_id) = &doctype.public_id {
                    out.push_str(" PUBLIC \"");
                    out.push_str(public_id);
                    out.push('"');
                    if let Some(system_id) = &doctype.system_id {
                        out.push_str(" \"");
                        out.push_str(system_id);
                        out.push('"');
                    }
                } else if let Some(system_id) = &doctype.system_id {
                    out.push_str(" SYSTEM \"");
                    out.push_str(system_id);
                    out.push('"');
                }
                out.push('>');
                self.emit(&out);
            }
            Token::NullCharacterToken => self.emit("\u{FFFD}"),
            Token::ParseError(ref msg) => log::debug!("tokenizer recoverable error: {msg}"),
            Token::EOFToken => {}
        }
        TokenSinkResult::Continue
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Construction options for `HtmlRewriter` (`url_rewriter` is mandatory and
/// taken directly by `HtmlRewriterBuilder::new`; everything else is
/// optional and defaults as documented on each setter).
pub struct HtmlRewriterBuilder<S: OutputSink> {
    url_rewriter: UrlRewriter,
    head_insert: Option<String>,
    js_rewriter: JsRewriter,
    css_rewriter: CssRewriter,
    out: S,
}

impl HtmlRewriterBuilder<MemorySink> {
    pub fn new(url_rewriter: UrlRewriter) -> Self {
        Self {
            url_rewriter,
            head_insert: None,
            js_rewriter: JsRewriter::new(),
            css_rewriter: CssRewriter::new(),
            out: MemorySink::new(),
        }
    }
}

impl<S: OutputSink> HtmlRewriterBuilder<S> {
    /// Fragment emitted at most once, at the earliest point the rewriter is
    /// certain the head region has begun (or that the document has none).
    pub fn head_insert(mut self, fragment: impl Into<String>) -> Self {
        self.head_insert = Some(fragment.into());
        self
    }

    pub fn js_rewriter(mut self, rewriter: JsRewriter) -> Self {
        self.js_rewriter = rewriter;
        self
    }

    pub fn css_rewriter(mut self, rewriter: CssRewriter) -> Self {
        self.css_rewriter = rewriter;
        self
    }

    /// Plug in a streaming sink instead of the default in-memory accumulator.
    pub fn outstream<S2: OutputSink>(self, out: S2) -> HtmlRewriterBuilder<S2> {
        HtmlRewriterBuilder {
            url_rewriter: self.url_rewriter,
            head_insert: self.head_insert,
            js_rewriter: self.js_rewriter,
            css_rewriter: self.css_rewriter,
            out,
        }
    }

    pub fn build(self) -> HtmlRewriter<S> {
        HtmlRewriter::from_parts(self.url_rewriter, self.head_insert, self.js_rewriter, self.css_rewriter, self.out)
    }
}

/// Streaming HTML rewriter bound to one document and one `UrlRewriter`.
///
/// Feed it one or more chunks via `rewrite()`; call `close()` once at
/// end-of-stream. Not meant to be shared across concurrent invocations —
/// one instance per document, per the single-threaded scheduling model
/// this crate targets.
pub struct HtmlRewriter<S: OutputSink = MemorySink> {
    tokenizer: Tokenizer<RewriteSink<S>>,
}

impl HtmlRewriter<MemorySink> {
    /// Shorthand for `HtmlRewriterBuilder::new(url_rewriter).build()`.
    pub fn new(url_rewriter: UrlRewriter) -> Self {
        HtmlRewriterBuilder::new(url_rewriter).build()
    }
}

impl<S: OutputSink> HtmlRewriter<S> {
    fn from_parts(
        url_rewriter: UrlRewriter,
        head_insert: Option<String>,
        js_rewriter: JsRewriter,
        css_rewriter: CssRewriter,
        out: S,
    ) -> Self {
        let sink = RewriteSink {
            url_rewriter: RefCell::new(url_rewriter),
            head_insert: RefCell::new(head_insert),
            parse_context: RefCell::new(None),
            js_rewriter,
            css_rewriter,
            out: RefCell::new(out),
            err: RefCell::new(None),
        };
        let tokenizer = Tokenizer::new(sink, TokenizerOpts::default());
        Self { tokenizer }
    }

    /// Feed a chunk; returns accumulated output since the previous call
    /// when using the default in-memory sink. A streaming sink receives
    /// writes directly and this returns an empty string.
    pub fn rewrite(&mut self, chunk: &str) -> Result<String> {
        let mut input = BufferQueue::default();
        input.push_back(chunk.into());
        loop {
            match self.tokenizer.feed(&mut input) {
                TokenizerResult::Done => break,
                TokenizerResult::Script(_) => continue,
            }
        }
        self.check_err()?;
        Ok(self.tokenizer.sink.out.borrow_mut().drain().unwrap_or_default())
    }

    /// Terminate parsing. If a `<script>`/`<style>` body was left open,
    /// synthesizes its closing tag first so the buffered body is flushed
    /// through the JS/CSS sub-rewriter exactly as if it had been closed in
    /// the source document.
    pub fn close(&mut self) -> Result<String> {
        let mut result = String::new();

        let pending = *self.tokenizer.sink.parse_context.borrow();
        if let Some(tag) = pending {
            let synthetic = format!("</{}>", tag.as_str());
            result.push_str(&self.rewrite(&synthetic)?);
        }

        self.tokenizer.end();
        self.check_err()?;
        result.push_str(&self.tokenizer.sink.out.borrow_mut().drain().unwrap_or_default());
        Ok(result)
    }

    fn check_err(&self) -> Result<()> {
        if let Some(e) = self.tokenizer.sink.err.borrow_mut().take() {
            return Err(e);
        }
        Ok(())
    }

    pub fn base_url(&self) -> String {
        self.tokenizer.sink.url_rewriter.borrow().base_url().to_string()
    }
}
