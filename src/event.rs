//! The normalized event algebra
//!
//! `AgentEvent` is a closed, five-variant tagged union. Every vendor
//! parser produces `Vec<AgentEvent>` from a single line; every renderer
//! consumes `&AgentEvent` one at a time. The `t` discriminator matches
//! the wire contract exactly, so the JSON renderer's output is this
//! type's `Serialize` impl with no extra mapping step.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// One lifecycle point of a named tool invocation.
///
/// `phase` obeys the grammar `start (stdout|stderr)* end` per tool name;
/// enforcing that grammar is the renderer's `ToolState`, not this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolPhase {
    Start,
    Stdout,
    Stderr,
    End,
}

/// Normalized event emitted by a vendor parser and consumed by a renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum AgentEvent {
    #[serde(rename = "msg")]
    Msg {
        role: Role,
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        timestamp: Option<i64>,
    },
    #[serde(rename = "tool")]
    Tool {
        name: String,
        phase: ToolPhase,
        #[serde(skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        exit_code: Option<i32>,
        /// Correlates phases of one invocation for vendors (Claude) that key
        /// on an opaque call id rather than name. Informational only; not
        /// part of the wire contract beyond being present when known.
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
    #[serde(rename = "cost")]
    Cost { delta_usd: f64 },
    #[serde(rename = "error")]
    Error { message: String },
    #[serde(rename = "debug")]
    Debug { raw: Value },
}

impl AgentEvent {
    /// Short tag string, used by `--only` filtering and the summary event.
    pub fn tag(&self) -> &'static str {
        match self {
            AgentEvent::Msg { .. } => "msg",
            AgentEvent::Tool { .. } => "tool",
            AgentEvent::Cost { .. } => "cost",
            AgentEvent::Error { .. } => "error",
            AgentEvent::Debug { .. } => "debug",
        }
    }

    pub fn msg(role: Role, text: impl Into<String>) -> Self {
        AgentEvent::Msg {
            role,
            text: text.into(),
            timestamp: None,
        }
    }

    pub fn tool_start(name: impl Into<String>, id: Option<String>) -> Self {
        AgentEvent::Tool {
            name: name.into(),
            phase: ToolPhase::Start,
            text: None,
            exit_code: None,
            id,
        }
    }

    pub fn tool_output(name: impl Into<String>, phase: ToolPhase, text: impl Into<String>) -> Self {
        debug_assert!(matches!(phase, ToolPhase::Stdout | ToolPhase::Stderr));
        AgentEvent::Tool {
            name: name.into(),
            phase,
            text: Some(text.into()),
            exit_code: None,
            id: None,
        }
    }

    pub fn tool_end(name: impl Into<String>, exit_code: i32) -> Self {
        AgentEvent::Tool {
            name: name.into(),
            phase: ToolPhase::End,
            text: None,
            exit_code: Some(exit_code),
            id: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        AgentEvent::Error {
            message: message.into(),
        }
    }

    pub fn debug(raw: Value) -> Self {
        AgentEvent::Debug { raw }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_matches_serde_discriminator() {
        let events = vec![
            AgentEvent::msg(Role::User, "hi"),
            AgentEvent::tool_start("bash", None),
            AgentEvent::Cost { delta_usd: 0.01 },
            AgentEvent::error("boom"),
            AgentEvent::debug(serde_json::json!({"x": 1})),
        ];
        for event in events {
            let value = serde_json::to_value(&event).unwrap();
            assert_eq!(value["t"].as_str().unwrap(), event.tag());
        }
    }

    #[test]
    fn msg_text_is_never_null() {
        let event = AgentEvent::msg(Role::Assistant, "");
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["text"], serde_json::json!(""));
    }

    #[test]
    fn round_trip_preserves_debug_raw_structurally() {
        let raw = serde_json::json!({"nested": {"a": [1, 2, 3]}, "b": null});
        let event = AgentEvent::debug(raw.clone());
        let text = serde_json::to_string(&event).unwrap();
        let back: AgentEvent = serde_json::from_str(&text).unwrap();
        match back {
            AgentEvent::Debug { raw: got } => assert_eq!(got, raw),
            _ => panic!("expected debug event"),
        }
    }
}
