//! Async line reader
//!
//! Splits an `AsyncRead` into a stream of lines with bounded memory: at
//! most one pending partial line plus one in-flight read chunk are ever
//! held at once. The buffer is owned by the reader itself rather than
//! shared process-wide state, so each stream has independent memory.

use async_stream::try_stream;
use futures_core::Stream;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::ReadError;

/// A line read from the source, along with its 1-based position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub number: usize,
    pub text: String,
}

#[derive(Debug, Clone, Copy)]
pub struct ReadOptions {
    /// Lines longer than this are truncated to this many bytes rather than
    /// growing the buffer without bound; `None` disables the limit.
    pub max_line_length: Option<usize>,
    /// When false, blank lines (after trimming the trailing newline) are
    /// dropped rather than yielded.
    pub include_empty: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions {
            max_line_length: Some(1 << 20),
            include_empty: false,
        }
    }
}

const CHUNK_SIZE: usize = 64 * 1024;

/// Splits `reader` into a stream of raw lines (newline stripped). The
/// reader is never closed here — ownership and lifecycle of the
/// underlying source (a file, a process-owned stdin) belong to the
/// caller, which must not destroy a source it did not open.
pub fn read_lines<R>(mut reader: R, options: ReadOptions) -> impl Stream<Item = Result<String, ReadError>>
where
    R: AsyncRead + Unpin,
{
    try_stream! {
        let mut pending = String::new();
        let mut chunk = vec![0u8; CHUNK_SIZE];

        loop {
            let n = reader.read(&mut chunk).await.map_err(ReadError::Io)?;
            if n == 0 {
                break;
            }
            pending.push_str(&String::from_utf8_lossy(&chunk[..n]));

            // Eagerly split on every chunk, not only once a newline turns
            // up: a line with no embedded `\n` must still be capped at
            // `max_line_length` as it accumulates, or `pending` grows
            // without bound across reads.
            for piece in drain_ready(&mut pending, options.max_line_length) {
                if options.include_empty || !piece.is_empty() {
                    yield piece;
                }
            }
        }

        // EOF: flush whatever is left, splitting it the same way.
        while !pending.is_empty() {
            let piece = take_one(&mut pending, options.max_line_length);
            if options.include_empty || !piece.is_empty() {
                yield piece;
            }
        }
    }
}

/// Drains every line or oversized prefix currently extractable from
/// `pending` without blocking for more input: each embedded newline
/// yields a line (split further if it exceeds `max` before the
/// newline), and any remaining newline-free prefix beyond `max` is
/// split off too. What's left in `pending` afterward is always a
/// partial line no longer than `max` bytes (or the whole tail, if
/// `max` is `None`).
fn drain_ready(pending: &mut String, max: Option<usize>) -> Vec<String> {
    let mut out = Vec::new();
    loop {
        match pending.find('\n') {
            Some(pos) => {
                if let Some(max) = max {
                    // Strictly greater than: a line whose content is
                    // exactly `max` bytes, newline included, is still
                    // within bound and should be consumed as a normal
                    // line below rather than split with the trailing
                    // newline left dangling as a spurious empty line.
                    if max > 0 && pos > max {
                        let boundary = floor_char_boundary(pending, max);
                        out.push(pending.drain(..boundary).collect());
                        continue;
                    }
                }
                let mut line: String = pending.drain(..=pos).collect();
                if line.ends_with('\n') {
                    line.pop();
                }
                if line.ends_with('\r') {
                    line.pop();
                }
                out.push(line);
            }
            None => {
                if let Some(max) = max {
                    if max > 0 && pending.len() > max {
                        let boundary = floor_char_boundary(pending, max);
                        out.push(pending.drain(..boundary).collect());
                        continue;
                    }
                }
                break;
            }
        }
    }
    out
}

/// EOF variant of the oversized-prefix split: no newline will ever
/// arrive, so this always makes progress by taking either a
/// `max`-sized prefix or the whole remaining buffer.
fn take_one(pending: &mut String, max: Option<usize>) -> String {
    match max {
        Some(max) if max > 0 && pending.len() > max => {
            let boundary = floor_char_boundary(pending, max);
            pending.drain(..boundary).collect()
        }
        _ => std::mem::take(pending),
    }
}

/// The largest byte index `<= index` that lands on a UTF-8 char
/// boundary in `s`, so splitting there never slices a multi-byte
/// character in half.
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Wraps a line stream with 1-based line numbers.
pub fn numbered<S>(lines: S) -> impl Stream<Item = Result<Line, ReadError>>
where
    S: Stream<Item = Result<String, ReadError>>,
{
    use futures_util::StreamExt;
    lines.enumerate().map(|(i, result)| {
        result.map(|text| Line {
            number: i + 1,
            text,
        })
    })
}
