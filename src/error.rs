// wbrewrite::error
//
// Error taxonomy for the rewriter. Almost every failure mode here is
// non-fatal by design: malformed URLs, malformed meta-refresh values, and
// tokenizer oddities all degrade to passthrough rather than raising, per the
// rewriter's "never corrupt the document" contract. The only case that
// actually surfaces a `Result::Err` to a caller is a write failure on a
// caller-supplied streaming sink.

use std::fmt;

/// Errors that can escape the rewriter's public API.
///
/// Every other taxonomy entry described in the design notes
/// (`MalformedUrl`, `MalformedMetaRefresh`, `TokenizerRecoverable`,
/// `UnterminatedStateTag`) is handled internally by falling back to
/// passthrough and is never represented here.
#[derive(thiserror::Error, Debug)]
pub enum RewriteError {
    /// The output sink failed to accept a write. This is the only case in
    /// which the rewriter aborts a document instead of degrading gracefully.
    #[error("output sink write failed: {0}")]
    Sink(#[from] fmt::Error),
}

pub type Result<T> = std::result::Result<T, RewriteError>;
