//! HTML fragment renderer
//!
//! No surrounding document, just semantic fragments. Inline Markdown is
//! walked with `pulldown-cmark`, but every text node is re-escaped by
//! hand rather than trusting the crate's own HTML writer, to guarantee
//! the exact `&<>"'` escape contract regardless of how pulldown-cmark's
//! writer behaves.

use pulldown_cmark::{Event as MdEvent, Parser as MdParser, Tag, TagEnd};

use crate::event::{AgentEvent, Role, ToolPhase};

use super::{should_emit, RenderContext, RenderOptions, Renderer, ToolState};

pub struct HtmlRenderer {
    options: RenderOptions,
    ctx: RenderContext,
}

impl HtmlRenderer {
    pub fn new(options: RenderOptions) -> Self {
        HtmlRenderer {
            options,
            ctx: RenderContext::new(),
        }
    }

    fn role_class(role: Role) -> &'static str {
        match role {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }

    fn render_msg(&self, role: Role, text: &str) -> String {
        format!(
            "{}<div class=\"msg msg-{}\">{}</div>\n",
            timestamp_span(self.options.show_timestamps),
            Self::role_class(role),
            markdown_to_html(text)
        )
    }

    fn render_tool(&mut self, name: &str, phase: ToolPhase, text: Option<&str>, exit_code: Option<i32>) -> String {
        let prefix = timestamp_span(self.options.show_timestamps);
        let state = self.ctx.tools.entry(name.to_string()).or_default();
        let class_name = escape_html(name);
        match phase {
            ToolPhase::Start => {
                let mut out = String::new();
                if state.started {
                    out.push_str(&format!(
                        "<div class=\"error\">tool {class_name} restarted before it ended</div>\n"
                    ));
                    state.buffered.clear();
                }
                state.started = true;
                state.started_at = std::time::Instant::now();
                out.push_str(&format!(
                    "{prefix}<div class=\"tool tool-{class_name}\"><div class=\"tool-start\">{class_name}</div>\n"
                ));
                out
            }
            ToolPhase::Stdout | ToolPhase::Stderr => {
                let text = text.unwrap_or_default();
                let escaped = escape_html(text);
                let phase_class = if phase == ToolPhase::Stderr { "stderr" } else { "stdout" };
                if self.options.collapse_tools {
                    state.buffered.push_str(&format!("<div class=\"tool-{phase_class}\">{escaped}</div>\n"));
                    String::new()
                } else {
                    format!("{prefix}<div class=\"tool-{phase_class}\">{escaped}</div>\n")
                }
            }
            ToolPhase::End => {
                let mut out = String::new();
                if self.options.collapse_tools && !state.buffered.is_empty() {
                    out.push_str(&state.buffered);
                }
                out.push_str(&format!(
                    "{prefix}<div class=\"tool-end\" data-exit-code=\"{}\"></div></div>\n",
                    exit_code.unwrap_or(0)
                ));
                self.ctx.tools.remove(name);
                out
            }
        }
    }
}

impl Renderer for HtmlRenderer {
    fn render(&mut self, event: &AgentEvent) -> String {
        if !should_emit(event, &self.options) {
            self.ctx.record(event);
            return String::new();
        }
        let out = match event {
            AgentEvent::Msg { role, text, .. } => self.render_msg(*role, text),
            AgentEvent::Tool {
                name,
                phase,
                text,
                exit_code,
                ..
            } => self.render_tool(name, *phase, text.as_deref(), *exit_code),
            AgentEvent::Cost { delta_usd } => format!(
                "{}<div class=\"cost\">${delta_usd:.4}</div>\n",
                timestamp_span(self.options.show_timestamps)
            ),
            AgentEvent::Error { message } => format!(
                "{}<div class=\"error\">{}</div>\n",
                timestamp_span(self.options.show_timestamps),
                escape_html(message)
            ),
            AgentEvent::Debug { raw } => format!(
                "{}<pre class=\"debug\">{}</pre>\n",
                timestamp_span(self.options.show_timestamps),
                escape_html(&serde_json::to_string(raw).unwrap_or_default())
            ),
        };
        self.ctx.record(event);
        out
    }

    fn flush(&mut self) -> String {
        let mut out = String::new();
        let mut dangling: Vec<(String, ToolState)> = self.ctx.tools.drain().collect();
        dangling.sort_by(|a, b| a.0.cmp(&b.0));
        for (name, _) in dangling {
            out.push_str(&format!(
                "<div class=\"tool-warning\">{} never completed</div>\n",
                escape_html(&name)
            ));
        }
        out
    }
}

/// `showTimestamps`: an ISO-8601 prefix ahead of each rendered fragment,
/// mirroring the JSON renderer's `timestamp` field A
/// free function so callers can hold a mutable borrow of `self.ctx`
/// (e.g. a `ToolState` entry) while still reading this flag.
fn timestamp_span(show_timestamps: bool) -> String {
    if show_timestamps {
        format!(
            "<span class=\"timestamp\">{}</span>",
            escape_html(&chrono::Utc::now().to_rfc3339())
        )
    } else {
        String::new()
    }
}

/// Escapes the five HTML-significant characters: `& < > " '`.
/// Deliberately hand-written rather than delegated to pulldown-cmark's
/// writer, which this renderer only uses for Markdown structure, not
/// escaping policy.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn markdown_to_html(text: &str) -> String {
    let mut out = String::new();
    let mut fence_open = false;
    for event in MdParser::new(text) {
        match event {
            MdEvent::Start(Tag::Strong) => out.push_str("<strong>"),
            MdEvent::End(TagEnd::Strong) => out.push_str("</strong>"),
            MdEvent::Start(Tag::Emphasis) => out.push_str("<em>"),
            MdEvent::End(TagEnd::Emphasis) => out.push_str("</em>"),
            MdEvent::Code(code) => {
                out.push_str("<code>");
                out.push_str(&escape_html(&code));
                out.push_str("</code>");
            }
            MdEvent::Start(Tag::CodeBlock(_)) => {
                fence_open = true;
                out.push_str("<pre><code>");
            }
            MdEvent::End(TagEnd::CodeBlock) => {
                fence_open = false;
                out.push_str("</code></pre>");
            }
            MdEvent::Text(t) => out.push_str(&escape_html(&t)),
            MdEvent::SoftBreak | MdEvent::HardBreak => out.push(' '),
            _ => {}
        }
    }
    // Line-safety: a fence left open at message end is still closed,
    // matching the ANSI renderer's contract.
    if fence_open {
        out.push_str("</code></pre>");
    }
    out
}
