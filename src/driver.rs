//! Event stream driver
//!
//! Composes the line reader, vendor auto-detection, and per-line parsing
//! into a single `Stream<Item = AgentEvent>`. Parse failures never
//! terminate the stream: they become `Error` events (and, in debug mode,
//! an accompanying `Debug` event) so one malformed line never takes down
//! an otherwise-healthy run.

use async_stream::stream;
use futures_core::Stream;
use futures_util::{pin_mut, StreamExt};
use tokio::io::AsyncRead;

use crate::error::{DetectionError, ReadError};
use crate::event::AgentEvent;
use crate::line_reader::{self, ReadOptions};
use crate::vendor::{PriceTable, Registry, Vendor};

#[derive(Debug, Clone, Copy)]
pub struct DriverOptions {
    pub read: ReadOptions,
    /// Emit a `lineNumber/line/error` debug event alongside every `error`
    /// event, and a trailing summary `debug` event at end-of-stream.
    pub debug: bool,
    /// Converts Claude `usage` events into `cost` events when set; left
    /// `None` (the default) they fall back to `debug`, since no
    /// canonical price table is shipped with this crate.
    pub claude_prices: Option<PriceTable>,
}

impl Default for DriverOptions {
    fn default() -> Self {
        DriverOptions {
            read: ReadOptions::default(),
            debug: false,
            claude_prices: None,
        }
    }
}

/// Either a fixed vendor, or `Auto` to sample the stream and detect one.
#[derive(Debug, Clone, Copy)]
pub enum VendorChoice {
    Fixed(Vendor),
    Auto,
}

/// Drives `reader` through vendor detection (if requested) and parsing,
/// yielding normalized events. Errors surfaced before the first event is
/// yielded (I/O failure, detection failure) come back as `Err` from the
/// stream's first item via [`DriverError`].
pub fn stream_events<R>(
    reader: R,
    vendor: VendorChoice,
    options: DriverOptions,
) -> impl Stream<Item = Result<AgentEvent, DriverError>>
where
    R: AsyncRead + Unpin,
{
    stream! {
        let lines = line_reader::read_lines(reader, options.read);
        pin_mut!(lines);

        let registry = Registry::default();

        // Step 1: resolve the vendor, buffering a look-ahead window when
        // auto-detecting so those lines can be replayed through the
        // chosen parser.
        let mut lookahead: Vec<String> = Vec::new();
        let resolved_vendor = match vendor {
            VendorChoice::Fixed(v) => v,
            VendorChoice::Auto => {
                const SAMPLE: usize = crate::vendor::DETECTION_SAMPLE_LINES;
                while lookahead.len() < SAMPLE {
                    match lines.next().await {
                        Some(Ok(line)) => lookahead.push(line),
                        Some(Err(e)) => {
                            yield Err(DriverError::Read(e));
                            return;
                        }
                        None => break,
                    }
                }
                let sample_refs: Vec<&str> = lookahead.iter().map(String::as_str).collect();
                match registry.detect_detailed(&sample_refs) {
                    Ok((v, _)) => v,
                    Err(e) => {
                        yield Err(DriverError::Detection(e));
                        return;
                    }
                }
            }
        };

        let mut parser = registry.parser_for(resolved_vendor, options.claude_prices);

        let mut total_lines = 0usize;
        let mut successful_lines = 0usize;
        let mut error_lines = 0usize;

        let mut line_number = 0usize;
        for buffered in lookahead {
            line_number += 1;
            total_lines += 1;
            match parser.parse_line(&buffered, line_number) {
                Ok(events) => {
                    successful_lines += 1;
                    for event in events {
                        yield Ok(event);
                    }
                }
                Err(e) => {
                    error_lines += 1;
                    if options.debug {
                        yield Ok(AgentEvent::debug(serde_json::json!({
                            "lineNumber": line_number,
                            "line": buffered,
                            "error": e.to_string(),
                        })));
                    }
                    yield Ok(AgentEvent::error(e.to_string()));
                }
            }
        }

        loop {
            match lines.next().await {
                Some(Ok(raw_line)) => {
                    line_number += 1;
                    total_lines += 1;
                    match parser.parse_line(&raw_line, line_number) {
                        Ok(events) => {
                            successful_lines += 1;
                            for event in events {
                                yield Ok(event);
                            }
                        }
                        Err(e) => {
                            error_lines += 1;
                            if options.debug {
                                yield Ok(AgentEvent::debug(serde_json::json!({
                                    "lineNumber": line_number,
                                    "line": raw_line,
                                    "error": e.to_string(),
                                })));
                            }
                            yield Ok(AgentEvent::error(e.to_string()));
                        }
                    }
                }
                Some(Err(e)) => {
                    yield Err(DriverError::Read(e));
                    return;
                }
                None => break,
            }
        }

        for event in parser.flush() {
            yield Ok(event);
        }

        if options.debug {
            let success_rate = if total_lines == 0 {
                1.0
            } else {
                successful_lines as f64 / total_lines as f64
            };
            yield Ok(AgentEvent::debug(serde_json::json!({
                "summary": {
                    "totalLines": total_lines,
                    "successfulLines": successful_lines,
                    "errorLines": error_lines,
                    "successRate": success_rate,
                }
            })));
        }
    }
}

/// Terminal driver failure: occurs before or during streaming and ends
/// the sequence. Distinct from `ParseError`, which is recovered inline.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error(transparent)]
    Detection(#[from] DetectionError),
}
