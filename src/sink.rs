// wbrewrite::sink
//
// Output sink abstraction. The rewriter never builds a whole-document
// string internally; every emitted token is pushed straight to the sink so
// callers can plug a streaming writer (a socket, a `BufWriter`, …) without
// the rewriter buffering the document twice.

use std::fmt::{self, Write as _};

/// A write-only character sink consumed by `HtmlRewriter`.
///
/// Implementations only need to accept UTF-8 text; the rewriter itself
/// performs no buffering beyond what a single `write` call needs.
pub trait OutputSink {
    fn write(&mut self, s: &str) -> fmt::Result;

    /// Drain and return output buffered since the last drain, for sinks
    /// that accumulate in memory. Streaming sinks keep the default, which
    /// returns `None` since writes already reached their destination.
    fn drain(&mut self) -> Option<String> {
        None
    }
}

/// The default sink: an in-memory accumulator.
///
/// `rewrite()` calls against the default sink return the output written
/// since the previous call, matching the "default is an in-memory
/// accumulator" construction option; a streaming sink instead receives
/// writes directly and `rewrite()` returns an empty string.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub buff: String,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain and return everything accumulated so far.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.buff)
    }
}

impl OutputSink for MemorySink {
    fn write(&mut self, s: &str) -> fmt::Result {
        self.buff.write_str(s)
    }

    fn drain(&mut self) -> Option<String> {
        Some(self.take())
    }
}

/// Adapts any `std::fmt::Write` implementor into an `OutputSink`, for
/// callers who already have a `String` or a custom formatter-backed writer
/// and don't want the drain-on-`rewrite` accounting `MemorySink` does.
pub struct FmtSink<W: fmt::Write>(pub W);

impl<W: fmt::Write> OutputSink for FmtSink<W> {
    fn write(&mut self, s: &str) -> fmt::Result {
        self.0.write_str(s)
    }
}
