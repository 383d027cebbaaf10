//! ANSI terminal renderer
//!
//! Role coloring and tool/cost/error/debug line shapes follow the
//! closed `AgentEvent` algebra directly. The inline Markdown transform
//! is a hand-rolled delimiter-counting state machine rather than a
//! document-oriented Markdown renderer: a crate built for whole
//! documents (headers, lists, wrapping) has no notion of "close an
//! unterminated fence at message end," which this renderer's
//! line-safety contract requires.

use colored::Colorize;

use crate::event::{AgentEvent, Role, ToolPhase};

use super::{should_emit, RenderContext, RenderOptions, Renderer, ToolState};

pub struct AnsiRenderer {
    options: RenderOptions,
    ctx: RenderContext,
}

impl AnsiRenderer {
    pub fn new(options: RenderOptions) -> Self {
        AnsiRenderer {
            options,
            ctx: RenderContext::new(),
        }
    }

    fn role_label(role: Role) -> colored::ColoredString {
        match role {
            Role::User => "user".cyan(),
            Role::Assistant => "assistant".green(),
            Role::System => "system".dimmed(),
        }
    }

    fn render_msg(&self, role: Role, text: &str) -> String {
        format!(
            "{}{}: {}\n",
            timestamp_prefix(self.options.show_timestamps),
            Self::role_label(role),
            inline_markdown(text)
        )
    }

    fn render_tool(&mut self, name: &str, phase: ToolPhase, text: Option<&str>, exit_code: Option<i32>) -> String {
        let prefix = timestamp_prefix(self.options.show_timestamps);
        let state = self.ctx.tools.entry(name.to_string()).or_default();
        match phase {
            ToolPhase::Start => {
                let mut out = String::new();
                if state.started {
                    out.push_str(&format!(
                        "{}\n",
                        format!("error: tool {name} restarted before it ended").red().bold()
                    ));
                    state.buffered.clear();
                }
                state.started = true;
                state.started_at = std::time::Instant::now();
                out.push_str(&format!("{}{} {}\n", prefix, "▶".blue(), name.bold()));
                out
            }
            ToolPhase::Stdout | ToolPhase::Stderr => {
                let text = text.unwrap_or_default();
                if self.options.collapse_tools {
                    state.buffered.push_str(text);
                    state.buffered.push('\n');
                    String::new()
                } else if phase == ToolPhase::Stderr {
                    format!("{prefix}{}\n", text.red())
                } else {
                    format!("{prefix}{text}\n")
                }
            }
            ToolPhase::End => {
                let success = exit_code.unwrap_or(0) == 0;
                let mut out = String::new();
                if self.options.collapse_tools && !state.buffered.is_empty() {
                    out.push_str(&state.buffered);
                }
                let glyph = if success { "✓".green() } else { "✗".red() };
                out.push_str(&format!("{prefix}{} {} (exit {})\n", glyph, name, exit_code.unwrap_or(0)));
                self.ctx.tools.remove(name);
                out
            }
        }
    }
}

impl Renderer for AnsiRenderer {
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
                "{}{} ${:.4}\n",
                timestamp_prefix(self.options.show_timestamps),
                "$".yellow(),
                delta_usd
            ),
            AgentEvent::Error { message } => format!(
                "{}{}\n",
                timestamp_prefix(self.options.show_timestamps),
                format!("error: {message}").red().bold()
            ),
            AgentEvent::Debug { raw } => format!(
                "{}{}\n",
                timestamp_prefix(self.options.show_timestamps),
                serde_json::to_string(raw).unwrap_or_default().dimmed()
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
            out.push_str(&format!("{} {} never completed\n", "⚠".yellow(), name));
        }
        out
    }
}

/// `showTimestamps`: an ISO-8601 prefix ahead of each rendered line,
/// mirroring the JSON renderer's `timestamp` field A free
/// function rather than a method so callers can hold a mutable borrow of
/// `self.ctx` (e.g. a `ToolState` entry) while still reading this flag.
fn timestamp_prefix(show_timestamps: bool) -> String {
    if show_timestamps {
        format!("{} ", chrono::Utc::now().to_rfc3339().dimmed())
    } else {
        String::new()
    }
}

/// Line-safe inline Markdown transform: `**bold**`, `*italic*`,
/// `` `code` ``, and fenced code blocks rendered dim and verbatim. A
/// fence opened but not closed within `text` is closed implicitly at
/// message end so a streamed message can never leave the terminal in a
/// dimmed/code-formatted state.
fn inline_markdown(text: &str) -> String {
    enum State {
        Normal,
        Bold,
        Italic,
        Code,
        Fence,
    }

    let mut out = String::with_capacity(text.len());
    let mut state = State::Normal;
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match state {
            State::Normal => {
                if chars[i..].starts_with(&['`', '`', '`']) {
                    out.push_str(&"```".dimmed().to_string());
                    state = State::Fence;
                    i += 3;
                } else if chars[i..].starts_with(&['*', '*']) {
                    state = State::Bold;
                    i += 2;
                } else if chars[i] == '*' {
                    state = State::Italic;
                    i += 1;
                } else if chars[i] == '`' {
                    state = State::Code;
                    i += 1;
                } else {
                    out.push(chars[i]);
                    i += 1;
                }
            }
            State::Bold => {
                if chars[i..].starts_with(&['*', '*']) {
                    state = State::Normal;
                    i += 2;
                } else {
                    let start = i;
                    while i < chars.len() && !chars[i..].starts_with(&['*', '*']) {
                        i += 1;
                    }
                    let run: String = chars[start..i].iter().collect();
                    out.push_str(&run.bold().to_string());
                }
            }
            State::Italic => {
                if chars[i] == '*' {
                    state = State::Normal;
                    i += 1;
                } else {
                    let start = i;
                    while i < chars.len() && chars[i] != '*' {
                        i += 1;
                    }
                    let run: String = chars[start..i].iter().collect();
                    out.push_str(&run.italic().to_string());
                }
            }
            State::Code => {
                if chars[i] == '`' {
                    state = State::Normal;
                    i += 1;
                } else {
                    let start = i;
                    while i < chars.len() && chars[i] != '`' {
                        i += 1;
                    }
                    let run: String = chars[start..i].iter().collect();
                    out.push_str(&run.on_black().white().to_string());
                }
            }
            State::Fence => {
                if chars[i..].starts_with(&['`', '`', '`']) {
                    out.push_str(&"```".dimmed().to_string());
                    state = State::Normal;
                    i += 3;
                } else {
                    let start = i;
                    while i < chars.len() && !chars[i..].starts_with(&['`', '`', '`']) {
                        i += 1;
                    }
                    let run: String = chars[start..i].iter().collect();
                    out.push_str(&run.dimmed().to_string());
                }
            }
        }
    }

    // Close anything left open at message end: line-safety contract.
    match state {
        State::Fence => out.push_str(&"```".dimmed().to_string()),
        State::Bold | State::Italic | State::Code => {}
        State::Normal => {}
    }

    out
}
