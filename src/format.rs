//! Format driver
//!
//! Wraps a byte source, a vendor choice, and a renderer into a lazy
//! sequence of text chunks: pull an event, feed it to the renderer,
//! yield anything non-empty, then yield `flush()` at end-of-stream.

use async_stream::stream;
use futures_core::Stream;
use futures_util::{pin_mut, StreamExt};
use tokio::io::AsyncRead;

use crate::driver::{self, DriverError, DriverOptions, VendorChoice};
use crate::render::ansi::AnsiRenderer;
use crate::render::html::HtmlRenderer;
use crate::render::json::JsonRenderer;
use crate::render::{Format, RenderOptions, Renderer};

/// Builds the renderer named by `format`, pre-configured with `options`.
fn make_renderer(format: Format, options: RenderOptions) -> Box<dyn Renderer> {
    match format {
        Format::Ansi => Box::new(AnsiRenderer::new(options)),
        Format::Html => Box::new(HtmlRenderer::new(options)),
        Format::Json => Box::new(JsonRenderer::new(options)),
    }
}

/// Pulls normalized events from [`driver::stream_events`] and renders
/// each into text, yielding only non-empty chunks, then the renderer's
/// `flush()` output at end-of-stream. Terminal errors from the event
/// stream propagate as `Err` and end the sequence without a flush — no
/// trailing material is emitted on abnormal termination.
pub fn stream_format<R>(
    reader: R,
    vendor: VendorChoice,
    format: Format,
    driver_options: DriverOptions,
    render_options: RenderOptions,
) -> impl Stream<Item = Result<String, DriverError>>
where
    R: AsyncRead + Unpin,
{
    stream! {
        let events = driver::stream_events(reader, vendor, driver_options);
        pin_mut!(events);

        let mut renderer = make_renderer(format, render_options);

        while let Some(item) = events.next().await {
            match item {
                Ok(event) => {
                    let chunk = renderer.render(&event);
                    if !chunk.is_empty() {
                        yield Ok(chunk);
                    }
                }
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }

        let trailing = renderer.flush();
        if !trailing.is_empty() {
            yield Ok(trailing);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vendor::Vendor;

    async fn collect(input: &'static [u8], format: Format) -> Vec<String> {
        collect_with(input, format, RenderOptions::default()).await
    }

    async fn collect_with(input: &'static [u8], format: Format, render_options: RenderOptions) -> Vec<String> {
        let stream = stream_format(
            input,
            VendorChoice::Fixed(Vendor::Claude),
            format,
            DriverOptions::default(),
            render_options,
        );
        pin_mut!(stream);
        let mut out = Vec::new();
        while let Some(chunk) = stream.next().await {
            out.push(chunk.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn ansi_format_yields_non_empty_chunks_per_message() {
        colored::control::set_override(false);
        let input = b"{\"type\":\"message\",\"role\":\"user\",\"content\":\"hi\"}\n";
        let chunks = collect(input, Format::Ansi).await;
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].contains("hi"));
    }

    #[tokio::test]
    async fn json_pretty_mode_only_yields_at_flush() {
        let input = b"{\"type\":\"message\",\"role\":\"user\",\"content\":\"hi\"}\n";
        let options = RenderOptions {
            compact_mode: false,
            ..RenderOptions::default()
        };
        let chunks = collect_with(input, Format::Json, options).await;
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].trim_start().starts_with('['));
    }

    #[tokio::test]
    async fn html_format_escapes_message_text() {
        let input = b"{\"type\":\"message\",\"role\":\"user\",\"content\":\"<script>\"}\n";
        let chunks = collect(input, Format::Html).await;
        assert!(chunks[0].contains("&lt;script&gt;"));
    }
}
