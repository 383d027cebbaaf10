//! Renderer interface and shared filtering/state plumbing
//!
//! A pure `render(event) -> String` contract: the same event stream can
//! feed a terminal, an HTML fragment, or a JSON sink without the
//! renderer owning any I/O.

pub mod ansi;
pub mod html;
pub mod json;

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use crate::event::AgentEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ansi,
    Html,
    Json,
}

/// Filtering and presentation options recognized by every renderer.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub hide_tools: bool,
    pub hide_cost: bool,
    pub hide_debug: bool,
    pub collapse_tools: bool,
    /// JSON renderer only: one event per line instead of a pretty array.
    pub compact_mode: bool,
    pub show_timestamps: bool,
    /// `--only`: an explicit allow-set of event tags (`msg`, `tool`,
    /// `cost`, `error`, `debug`). When present, this overrides the three
    /// `hide_*` bools entirely rather than combining with them.
    pub only: Option<HashSet<String>>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            hide_tools: false,
            hide_cost: false,
            hide_debug: false,
            collapse_tools: false,
            compact_mode: true,
            show_timestamps: false,
            only: None,
        }
    }
}

/// True when `event` survives the shared `hideTools`/`hideCost`/`hideDebug`
/// filters, or the `only` allow-set when one is configured. Every
/// renderer calls this before doing any formatting work so filtering
/// behaves identically across ANSI/HTML/JSON.
pub fn should_emit(event: &AgentEvent, options: &RenderOptions) -> bool {
    if let Some(allowed) = &options.only {
        return allowed.contains(event.tag());
    }
    match event {
        AgentEvent::Tool { .. } => !options.hide_tools,
        AgentEvent::Cost { .. } => !options.hide_cost,
        AgentEvent::Debug { .. } => !options.hide_debug,
        AgentEvent::Msg { .. } | AgentEvent::Error { .. } => true,
    }
}

/// Per-tool bookkeeping held across `start`/`stdout`/`stderr`/`end`
/// phases for one tool name. Lives in `RenderContext`, not the event
/// type itself: no back-pointers to events, just a flat map owned by
/// the renderer.
#[derive(Debug, Clone)]
pub struct ToolState {
    pub started: bool,
    /// Buffered stdout/stderr, used only when `collapse_tools` is set.
    pub buffered: String,
    /// Monotonic instant the tool's `start` phase was observed.
    /// Informational only; no renderer branches on elapsed time today.
    pub started_at: Instant,
}

impl Default for ToolState {
    fn default() -> Self {
        ToolState {
            started: false,
            buffered: String::new(),
            started_at: Instant::now(),
        }
    }
}

/// State threaded through a renderer's lifetime: which tools are open,
/// how many messages have been seen, and the previously rendered event
/// (used by renderers that need adjacent-event context, e.g. deciding
/// whether to insert a separator).
#[derive(Debug)]
pub struct RenderContext {
    pub tools: HashMap<String, ToolState>,
    pub message_count: usize,
    pub previous_event: Option<AgentEvent>,
    /// When this rendering pass began.
    pub render_start_time: Instant,
}

impl Default for RenderContext {
    fn default() -> Self {
        RenderContext {
            tools: HashMap::new(),
            message_count: 0,
            previous_event: None,
            render_start_time: Instant::now(),
        }
    }
}

impl RenderContext {
    pub fn new() -> Self {
        RenderContext::default()
    }

    pub fn record(&mut self, event: &AgentEvent) {
        if matches!(event, AgentEvent::Msg { .. }) {
            self.message_count += 1;
        }
        self.previous_event = Some(event.clone());
    }
}

/// Implemented by each output format. `render_batch`'s default impl
/// concatenates individual `render` calls, which equals the
/// concatenation of individual renders by construction — override
/// only for a genuine batch optimization (the JSON renderer's
/// pretty-array mode does).
pub trait Renderer {
    fn render(&mut self, event: &AgentEvent) -> String;

    fn render_batch(&mut self, events: &[AgentEvent]) -> String {
        events.iter().map(|e| self.render(e)).collect()
    }

    /// Called once at end-of-stream: emits trailing material (e.g. a
    /// warning for any tool still in `start` state) and releases state.
    fn flush(&mut self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Role, ToolPhase};

    #[test]
    fn should_emit_respects_hide_flags() {
        let options = RenderOptions {
            hide_tools: true,
            hide_cost: true,
            hide_debug: true,
            ..RenderOptions::default()
        };
        assert!(!should_emit(&AgentEvent::tool_start("bash", None), &options));
        assert!(!should_emit(&AgentEvent::Cost { delta_usd: 1.0 }, &options));
        assert!(!should_emit(&AgentEvent::debug(serde_json::json!({})), &options));
        assert!(should_emit(&AgentEvent::msg(Role::User, "hi"), &options));
        assert!(should_emit(&AgentEvent::error("oops"), &options));
    }

    #[test]
    fn context_tracks_message_count_and_previous_event() {
        let mut ctx = RenderContext::new();
        ctx.record(&AgentEvent::msg(Role::User, "hi"));
        ctx.record(&AgentEvent::tool_start("bash", None));
        assert_eq!(ctx.message_count, 1);
        assert!(matches!(ctx.previous_event, Some(AgentEvent::Tool { .. })));
    }

    #[test]
    fn tool_state_defaults_to_not_started_with_empty_buffer() {
        let state = ToolState::default();
        assert!(!state.started);
        assert!(state.buffered.is_empty());
        let _ = ToolPhase::Start;
    }
}
