// wbrewrite::css
//
// CSS rewriter. Scans CSS text for `url(...)` tokens and `@import "..."` /
// `@import url(...)` rules and rewrites each captured URL via UrlRewriter;
// everything else is emitted verbatim. Matching is case-insensitive for
// keywords; whitespace inside `url(...)` is preserved around the captured
// URL when rebuilding output.
//
// Grounded on examples/nexora240-lgtm-Internex's `css::rewrite_token_stream`,
// narrowed from that teacher's broader `image-set()`/`@font-face`/CSSOM-sink
// handling down to the two constructs this rewriter's contract names:
// `url(...)` and `@import`.

use cssparser::{Parser, ParserInput, Token};

use crate::url::UrlRewriter;

/// Scans `css_text` for `url(...)` and `@import "..."` references and
/// rewrites each one via `rewriter`. All other characters are emitted
/// verbatim.
pub struct CssRewriter;

impl CssRewriter {
    pub fn new() -> Self {
        Self
    }

    pub fn rewrite(&self, css_text: &str, rewriter: &UrlRewriter) -> String {
        let mut input = ParserInput::new(css_text);
        let mut parser = Parser::new(&mut input);
        let mut out = String::with_capacity(css_text.len());
        rewrite_stream(&mut parser, rewriter, &mut out);
        out
    }
}

impl Default for CssRewriter {
    fn default() -> Self {
        Self::new()
    }
}

fn rewrite_stream(parser: &mut Parser<'_, '_>, rewriter: &UrlRewriter, out: &mut String) {
    // Whether the next quoted string belongs to an `@import "..."` rule
    // rather than being an ordinary string token.
    let mut in_import = false;

    loop {
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(t) => t.clone(),
            Err(_) => break,
        };

        match token {
            Token::UnquotedUrl(ref url_val) => {
                let rewritten = rewriter.rewrite(url_val.as_ref(), None);
                out.push_str("url(");
                out.push_str(&rewritten);
                out.push(')');
            }

            Token::Function(ref name) if name.eq_ignore_ascii_case("url") => {
                out.push_str("url(");
                rewrite_url_function_args(parser, rewriter, out);
                out.push(')');
            }

            Token::AtKeyword(ref kw) if kw.eq_ignore_ascii_case("import") => {
                out.push_str("@import");
                in_import = true;
            }

            Token::AtKeyword(ref kw) => {
                out.push('@');
                out.push_str(kw.as_ref());
            }

            Token::QuotedString(ref s) if in_import => {
                let rewritten = rewriter.rewrite(s.as_ref(), None);
                out.push_str(&quote(&rewritten));
                in_import = false;
            }

            Token::QuotedString(ref s) => {
                out.push_str(&quote(s.as_ref()));
            }

            Token::CurlyBracketBlock => {
                out.push('{');
                let _ = parser.parse_nested_block(|inner| -> Result<(), cssparser::ParseError<'_, ()>> {
                    rewrite_stream(inner, rewriter, out);
                    Ok(())
                });
                out.push('}');
            }

            Token::ParenthesisBlock => {
                out.push('(');
                let _ = parser.parse_nested_block(|inner| -> Result<(), cssparser::ParseError<'_, ()>> {
                    rewrite_stream(inner, rewriter, out);
                    Ok(())
                });
                out.push(')');
            }

            Token::SquareBracketBlock => {
                out.push('[');
                let _ = parser.parse_nested_block(|inner| -> Result<(), cssparser::ParseError<'_, ()>> {
                    rewrite_stream(inner, rewriter, out);
                    Ok(())
                });
                out.push(']');
            }

            Token::Function(ref name) => {
                out.push_str(name.as_ref());
                out.push('(');
                let _ = parser.parse_nested_block(|inner| -> Result<(), cssparser::ParseError<'_, ()>> {
                    rewrite_stream(inner, rewriter, out);
                    Ok(())
                });
                out.push(')');
            }

            Token::Ident(ref v) => out.push_str(v.as_ref()),
            Token::Hash(ref v) | Token::IDHash(ref v) => {
                out.push('#');
                out.push_str(v.as_ref());
            }
            Token::Number { value, .. } => out.push_str(&format_number(value)),
            Token::Percentage { unit_value, .. } => {
                out.push_str(&format_number(unit_value * 100.0));
                out.push('%');
            }
            Token::Dimension { value, ref unit, .. } => {
                out.push_str(&format_number(value));
                out.push_str(unit.as_ref());
            }
            Token::WhiteSpace(ref s) => out.push_str(s),
            Token::Colon => out.push(':'),
            Token::Semicolon => {
                in_import = false;
                out.push(';');
            }
            Token::Comma => out.push(','),
            Token::Delim(c) => out.push(c),
            Token::IncludeMatch => out.push_str("~="),
            Token::DashMatch => out.push_str("|="),
            Token::PrefixMatch => out.push_str("^="),
            Token::SuffixMatch => out.push_str("$="),
            Token::SubstringMatch => out.push_str("*="),
            Token::CDO => out.push_str("<!--"),
            Token::CDC => out.push_str("-->"),
            Token::Comment(ref c) => {
                out.push_str("/*");
                out.push_str(c.as_ref());
                out.push_str("*/");
            }
            Token::BadString(ref s) => out.push_str(s.as_ref()),
            Token::BadUrl(ref s) => {
                out.push_str("url(");
                out.push_str(s.as_ref());
                out.push(')');
            }
            Token::CloseParenthesis => out.push(')'),
            Token::CloseSquareBracket => out.push(']'),
            Token::CloseCurlyBracket => out.push('}'),
            _ => {}
        }
    }
}

/// Rewrites the inner tokens of a `url(...)` function call, preserving
/// leading/trailing whitespace around the captured URL.
fn rewrite_url_function_args(parser: &mut Parser<'_, '_>, rewriter: &UrlRewriter, out: &mut String) {
    let _ = parser.parse_nested_block(|inner| -> Result<(), cssparser::ParseError<'_, ()>> {
        loop {
            let tok = match inner.next_including_whitespace_and_comments() {
                Ok(t) => t.clone(),
                Err(_) => break,
            };
            match tok {
                Token::QuotedString(ref s) => {
                    let rewritten = rewriter.rewrite(s.as_ref(), None);
                    out.push_str(&quote(&rewritten));
                }
                Token::UnquotedUrl(ref s) => {
                    let rewritten = rewriter.rewrite(s.as_ref(), None);
                    out.push_str(&rewritten);
                }
                Token::WhiteSpace(ref s) => out.push_str(s),
                _ => {}
            }
        }
        Ok(())
    });
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

fn format_number(v: f32) -> String {
    if v == (v as i64) as f32 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
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
    fn rewrites_url_function() {
        let css = CssRewriter::new();
        let out = css.rewrite("body { background: url(styles.png); }", &rewriter());
        assert!(out.contains("/web/20131226101010/http://example.com/some/path/styles.png"));
    }

    #[test]
    fn rewrites_import_quoted() {
        let css = CssRewriter::new();
        let out = css.rewrite(r#"@import "reset.css";"#, &rewriter());
        assert!(out.contains("/web/20131226101010/http://example.com/some/path/reset.css"));
    }

    #[test]
    fn rewrites_import_url_form() {
        let css = CssRewriter::new();
        let out = css.rewrite("@import url(reset.css);", &rewriter());
        assert!(out.contains("/web/20131226101010/http://example.com/some/path/reset.css"));
    }

    #[test]
    fn preserves_data_urls() {
        let css = CssRewriter::new();
        let out = css.rewrite("body { background: url(data:image/png;base64,abc); }", &rewriter());
        assert!(out.contains("data:image/png;base64,abc"));
    }

    #[test]
    fn unterminated_style_still_rewrites() {
        let css = CssRewriter::new();
        let out = css.rewrite("@import url(styles.css)", &rewriter());
        assert_eq!(out, "@import url(/web/20131226101010/http://example.com/some/path/styles.css)");
    }

    #[test]
    fn non_url_text_emitted_verbatim() {
        let css = CssRewriter::new();
        let out = css.rewrite("body { color: red; }", &rewriter());
        assert!(out.contains("color"));
        assert!(out.contains("red"));
    }
}
