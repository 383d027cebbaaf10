//! JSON renderer
//!
//! Compact mode emits one JSON object per line; the default (pretty)
//! mode accumulates events and renders them as a single pretty-printed
//! array at flush time, which is the one renderer that genuinely
//! benefits from overriding `render_batch` rather than just
//! concatenating per-event output.

use serde_json::{json, Value};

use crate::error::RenderError;
use crate::event::AgentEvent;

use super::{should_emit, RenderContext, RenderOptions, Renderer};

pub struct JsonRenderer {
    options: RenderOptions,
    ctx: RenderContext,
    /// Buffered events for pretty (non-compact) mode; flushed as one
    /// array at end-of-stream.
    pending: Vec<Value>,
}

impl JsonRenderer {
    pub fn new(options: RenderOptions) -> Self {
        JsonRenderer {
            options,
            ctx: RenderContext::new(),
            pending: Vec::new(),
        }
    }

    fn to_value(&self, event: &AgentEvent) -> Result<Value, RenderError> {
        let mut value = serde_json::to_value(event)?;
        if self.options.show_timestamps {
            if let Value::Object(map) = &mut value {
                map.insert(
                    "timestamp".to_string(),
                    json!(chrono::Utc::now().to_rfc3339()),
                );
            }
        }
        Ok(value)
    }

    /// Builds the substituted `error` event spec.md §7 calls for when an
    /// event fails to render: a plain `json!` literal rather than another
    /// trip through `to_value`, since `to_value` is the very thing that
    /// just failed.
    fn error_value(&self, err: &RenderError) -> Value {
        let mut value = json!({"t": "error", "message": format!("failed to render event: {err}")});
        if self.options.show_timestamps {
            if let Value::Object(map) = &mut value {
                map.insert(
                    "timestamp".to_string(),
                    json!(chrono::Utc::now().to_rfc3339()),
                );
            }
        }
        value
    }

    /// Renders `event`, isolating a serialization failure by substituting
    /// the `error` event in its place instead of propagating the failure
    /// through the public `Renderer` interface.
    fn render_value(&self, event: &AgentEvent) -> Value {
        self.to_value(event).unwrap_or_else(|e| self.error_value(&e))
    }
}

impl Renderer for JsonRenderer {
    fn render(&mut self, event: &AgentEvent) -> String {
        if !should_emit(event, &self.options) {
            self.ctx.record(event);
            return String::new();
        }
        let value = self.render_value(event);
        self.ctx.record(event);

        if self.options.compact_mode {
            format!("{value}\n")
        } else {
            self.pending.push(value);
            String::new()
        }
    }

    fn render_batch(&mut self, events: &[AgentEvent]) -> String {
        if !self.options.compact_mode {
            // Batch form still just accumulates; the array is only
            // materialized at flush, so batching has no extra
            // optimization to offer beyond what individual render()
            // calls already do here.
            return events.iter().map(|e| self.render(e)).collect();
        }
        let mut out = String::new();
        for event in events {
            if should_emit(event, &self.options) {
                out.push_str(&format!("{}\n", self.render_value(event)));
            }
            self.ctx.record(event);
        }
        out
    }

    fn flush(&mut self) -> String {
        if self.options.compact_mode {
            return String::new();
        }
        let array = Value::Array(std::mem::take(&mut self.pending));
        serde_json::to_string_pretty(&array).unwrap_or_default() + "\n"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Role;

    #[test]
    fn compact_mode_emits_one_line_per_event() {
        let options = RenderOptions {
            compact_mode: true,
            ..RenderOptions::default()
        };
        let mut renderer = JsonRenderer::new(options);
        let out = renderer.render(&AgentEvent::msg(Role::User, "hi"));
        assert_eq!(out.lines().count(), 1);
        assert!(out.contains("\"t\":\"msg\""));
    }

    #[test]
    fn pretty_mode_buffers_until_flush() {
        let options = RenderOptions {
            compact_mode: false,
            ..RenderOptions::default()
        };
        let mut renderer = JsonRenderer::new(options);
        let during = renderer.render(&AgentEvent::msg(Role::User, "hi"));
        assert!(during.is_empty());
        let flushed = renderer.flush();
        assert!(flushed.trim_start().starts_with('['));
        assert!(flushed.contains("\"t\": \"msg\""));
    }

    #[test]
    fn hidden_events_are_dropped_in_both_modes() {
        let options = RenderOptions {
            compact_mode: true,
            hide_cost: true,
            ..RenderOptions::default()
        };
        let mut renderer = JsonRenderer::new(options);
        assert_eq!(renderer.render(&AgentEvent::Cost { delta_usd: 1.0 }), "");
    }

    #[test]
    fn render_failure_substitutes_an_error_value_instead_of_null() {
        let renderer = JsonRenderer::new(RenderOptions::default());
        let cause = serde_json::from_str::<Value>("not json").unwrap_err();
        let substituted = renderer.error_value(&RenderError::Serialize(cause));
        assert_eq!(substituted["t"], json!("error"));
        assert!(substituted["message"].as_str().unwrap().contains("failed to render event"));
    }

    #[test]
    fn render_batch_equals_concatenated_individual_renders_in_compact_mode() {
        let options = RenderOptions {
            compact_mode: true,
            ..RenderOptions::default()
        };
        let events = vec![AgentEvent::msg(Role::User, "a"), AgentEvent::msg(Role::Assistant, "b")];
        let mut a = JsonRenderer::new(options.clone());
        let mut b = JsonRenderer::new(options);
        let batched = a.render_batch(&events);
        let individually: String = events.iter().map(|e| b.render(e)).collect();
        assert_eq!(batched, individually);
    }
}
