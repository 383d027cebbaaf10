//! Command-line argument surface
//!
//! `clap` types never leak past this module: `Args` is translated via
//! `From<&Args>` into the library's own `DriverOptions`/`RenderOptions`,
//! keeping the `clap`-derived struct separate from the business-logic
//! types it drives.

use std::collections::HashSet;
use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;

use crate::driver::{DriverOptions, VendorChoice};
use crate::line_reader::ReadOptions;
use crate::render::{Format, RenderOptions};
use crate::vendor::Vendor;

#[derive(Debug, Parser)]
#[command(name = "agentfmt", about = "Streaming formatter for AI-agent CLI JSON event streams")]
pub struct Args {
    /// Input file path. Omit to read from stdin.
    pub input: Option<PathBuf>,

    /// Vendor parser to use: auto, claude, gemini, amp.
    #[arg(long, short = 'v', default_value = "auto")]
    pub vendor: String,

    /// Output format: ansi, html, json.
    #[arg(long, short = 'f', default_value = "ansi")]
    pub format: String,

    /// Shortcut for --format html.
    #[arg(long, conflicts_with = "format")]
    pub html: bool,

    /// Shortcut for --format json.
    #[arg(long, conflicts_with = "format")]
    pub json: bool,

    #[arg(long)]
    pub hide_tools: bool,

    #[arg(long)]
    pub hide_cost: bool,

    #[arg(long)]
    pub hide_debug: bool,

    #[arg(long)]
    pub collapse_tools: bool,

    /// Comma-separated event types to retain (msg,tool,cost,error,debug).
    /// Overrides the hide-* flags when present.
    #[arg(long)]
    pub only: Option<String>,

    /// Pretty-print JSON as an indented array instead of compact JSONL.
    /// Independent of `--debug`: compact mode stays the default either way.
    #[arg(long)]
    pub pretty: bool,

    /// Emit driver diagnostic events (per-line error context, a trailing
    /// summary) and raise the log level. Does not affect JSON compactness;
    /// pair with `--pretty` for pretty-printed diagnostics.
    #[arg(long, short = 'd')]
    pub debug: bool,

    /// Attach an ISO-8601 timestamp to each rendered event.
    #[arg(long)]
    pub show_timestamps: bool,

    /// Maximum bytes retained for a single line before truncation.
    #[arg(long, default_value_t = 1 << 20)]
    pub max_line_length: usize,
}

impl Args {
    pub fn vendor_choice(&self) -> Result<VendorChoice, String> {
        if self.vendor.eq_ignore_ascii_case("auto") {
            Ok(VendorChoice::Auto)
        } else {
            Vendor::from_str(&self.vendor).map(VendorChoice::Fixed)
        }
    }

    pub fn output_format(&self) -> Result<Format, String> {
        if self.html {
            return Ok(Format::Html);
        }
        if self.json {
            return Ok(Format::Json);
        }
        match self.format.to_ascii_lowercase().as_str() {
            "ansi" => Ok(Format::Ansi),
            "html" => Ok(Format::Html),
            "json" => Ok(Format::Json),
            other => Err(format!("unknown format {other:?} (expected ansi, html, or json)")),
        }
    }
}

/// Reads the two environment variables this CLI respects
/// (`NO_COLOR`/`COLUMNS`) once, at CLI entry, rather than threading
/// global state through the library. `columns` is advisory and unused
/// by any renderer today; it is read here so a future wrapping-aware
/// renderer has somewhere to get it without touching this module again.
#[derive(Debug, Clone, Copy)]
pub struct EnvHints {
    pub no_color: bool,
    pub columns: Option<usize>,
}

impl EnvHints {
    pub fn from_env() -> Self {
        EnvHints {
            no_color: std::env::var_os("NO_COLOR").is_some(),
            columns: std::env::var("COLUMNS").ok().and_then(|v| v.parse().ok()),
        }
    }
}

impl From<&Args> for RenderOptions {
    fn from(args: &Args) -> Self {
        let only = args.only.as_ref().map(|list| {
            list.split(',')
                .map(|s| s.trim().to_ascii_lowercase())
                .filter(|s| !s.is_empty())
                .collect::<HashSet<String>>()
        });
        RenderOptions {
            hide_tools: args.hide_tools,
            hide_cost: args.hide_cost,
            hide_debug: args.hide_debug,
            collapse_tools: args.collapse_tools,
            compact_mode: !args.pretty,
            show_timestamps: args.show_timestamps,
            only,
        }
    }
}

impl From<&Args> for DriverOptions {
    fn from(args: &Args) -> Self {
        DriverOptions {
            read: ReadOptions {
                max_line_length: Some(args.max_line_length),
                include_empty: false,
            },
            debug: args.debug,
            claude_prices: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::parse_from(std::iter::once("agentfmt").chain(argv.iter().copied()))
    }

    #[test]
    fn default_vendor_is_auto() {
        let args = parse(&[]);
        assert!(matches!(args.vendor_choice().unwrap(), VendorChoice::Auto));
    }

    #[test]
    fn html_shortcut_overrides_format() {
        let args = parse(&["--html"]);
        assert_eq!(args.output_format().unwrap(), Format::Html);
    }

    #[test]
    fn only_flag_builds_allow_set_overriding_hide_flags() {
        let args = parse(&["--only", "msg, tool", "--hide-tools"]);
        let options: RenderOptions = (&args).into();
        let allowed = options.only.unwrap();
        assert!(allowed.contains("msg"));
        assert!(allowed.contains("tool"));
    }

    #[test]
    fn unknown_vendor_is_rejected() {
        let args = parse(&["--vendor", "codex"]);
        assert!(args.vendor_choice().is_err());
    }

    #[test]
    fn debug_alone_keeps_compact_json_by_default() {
        let args = parse(&["--debug"]);
        let options: RenderOptions = (&args).into();
        assert!(options.compact_mode);
        let driver_options: DriverOptions = (&args).into();
        assert!(driver_options.debug);
    }

    #[test]
    fn pretty_alone_does_not_enable_debug_diagnostics() {
        let args = parse(&["--pretty"]);
        let options: RenderOptions = (&args).into();
        assert!(!options.compact_mode);
        let driver_options: DriverOptions = (&args).into();
        assert!(!driver_options.debug);
    }

    #[test]
    fn pretty_and_debug_combine_independently() {
        let args = parse(&["--pretty", "--debug"]);
        let options: RenderOptions = (&args).into();
        let driver_options: DriverOptions = (&args).into();
        assert!(!options.compact_mode);
        assert!(driver_options.debug);
    }
}
