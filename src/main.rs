//! Thin CLI entry point
//!
//! Parses arguments, opens the input file or stdin, wires
//! `format::stream_format` into stdout, and maps errors to exit codes.
//! All the actual work lives in the library; this binary is glue.

use std::io::IsTerminal;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use futures_util::{pin_mut, StreamExt};
use tokio::io::{AsyncWriteExt, BufWriter};

use agentfmt::cli::{Args, EnvHints};
use agentfmt::driver::{DriverOptions, VendorChoice};
use agentfmt::render::RenderOptions;
use agentfmt::{logging, stream_format, Format};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    logging::init_logging(args.debug);

    match try_main(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Holds the real work in an `anyhow::Result`, threading `?` through
/// setup and I/O rather than hand-matching every fallible step. Parse
/// errors never reach here — they surface as `Error` events inside the
/// stream and do not affect the exit code: a stream with parse errors
/// still exits `0`.
async fn try_main(args: Args) -> anyhow::Result<()> {
    let vendor = args.vendor_choice().map_err(anyhow::Error::msg)?;
    let format = args.output_format().map_err(anyhow::Error::msg)?;

    let env_hints = EnvHints::from_env();
    if env_hints.no_color {
        colored::control::set_override(false);
    }
    let render_options: RenderOptions = (&args).into();
    let driver_options: DriverOptions = (&args).into();

    match &args.input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open {}", path.display()))?;
            drain(file, vendor, format, driver_options, render_options).await
        }
        None => {
            if std::io::stdin().is_terminal() {
                tracing::warn!("reading from an interactive terminal; expected piped input");
            }
            drain(tokio::io::stdin(), vendor, format, driver_options, render_options).await
        }
    }
}

async fn drain<R>(
    reader: R,
    vendor: VendorChoice,
    format: Format,
    driver_options: DriverOptions,
    render_options: RenderOptions,
) -> anyhow::Result<()>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let chunks = stream_format(reader, vendor, format, driver_options, render_options);
    pin_mut!(chunks);

    let stdout = tokio::io::stdout();
    let mut out = BufWriter::new(stdout);

    while let Some(chunk) = chunks.next().await {
        let text = chunk.context("reading the event stream")?;
        out.write_all(text.as_bytes()).await.context("writing to stdout")?;
    }

    out.flush().await.context("flushing stdout")?;
    Ok(())
}
