//! agentfmt - streaming formatter for AI-agent CLI JSON event streams.
//!
//! Normalizes heterogeneous vendor JSONL (Claude Code, Gemini CLI, Amp
//! Code) into a closed [`event::AgentEvent`] algebra, then renders it as
//! ANSI, HTML, or JSON text. The whole pipeline runs single-threaded and
//! cooperative: nothing here spawns a task or a thread.

pub mod cli;
pub mod driver;
pub mod error;
pub mod event;
pub mod format;
pub mod line_reader;
pub mod logging;
pub mod render;
pub mod vendor;

pub use driver::{stream_events, DriverError, DriverOptions, VendorChoice};
pub use event::AgentEvent;
pub use format::stream_format;
pub use render::{Format, RenderOptions};
pub use vendor::Vendor;
