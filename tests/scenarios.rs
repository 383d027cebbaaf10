//! End-to-end scenarios driving the full stream_events/stream_format
//! pipeline against raw byte input, mirroring the concrete scenarios and
//! boundary behaviors used to validate the event algebra and renderers.

use std::io::Write;

use agentfmt::driver::{stream_events, DriverOptions, VendorChoice};
use agentfmt::event::{AgentEvent, Role, ToolPhase};
use agentfmt::render::ansi::AnsiRenderer;
use agentfmt::render::json::JsonRenderer;
use agentfmt::render::{RenderOptions, Renderer};
use agentfmt::vendor::Vendor;
use futures_util::{pin_mut, StreamExt};

async fn events_for(input: &'static [u8], vendor: VendorChoice) -> Vec<AgentEvent> {
    let stream = stream_events(input, vendor, DriverOptions::default());
    pin_mut!(stream);
    let mut out = Vec::new();
    while let Some(item) = stream.next().await {
        out.push(item.unwrap());
    }
    out
}

#[tokio::test]
async fn s1_claude_message_produces_one_msg_event() {
    let input = b"{\"type\":\"message\",\"role\":\"assistant\",\"content\":\"Hello\"}\n";
    let events = events_for(input, VendorChoice::Fixed(Vendor::Claude)).await;
    assert_eq!(events, vec![AgentEvent::msg(Role::Assistant, "Hello")]);
}

#[tokio::test]
async fn s2_mixed_valid_invalid_yields_msg_error_msg() {
    let input = b"{\"type\":\"message\",\"role\":\"user\",\"content\":\"Start\"}\nnot json\n{\"type\":\"message\",\"role\":\"user\",\"content\":\"End\"}\n";
    let events = events_for(input, VendorChoice::Fixed(Vendor::Claude)).await;
    let tags: Vec<&str> = events.iter().map(|e| e.tag()).collect();
    assert_eq!(tags, vec!["msg", "error", "msg"]);
}

#[tokio::test]
async fn s3_claude_tool_lifecycle() {
    let input = b"{\"type\":\"tool_use\",\"id\":\"1\",\"name\":\"bash\"}\n{\"type\":\"tool_result\",\"tool_use_id\":\"1\",\"output\":\"ok\"}\n";
    let events = events_for(input, VendorChoice::Fixed(Vendor::Claude)).await;
    assert_eq!(
        events,
        vec![
            AgentEvent::tool_start("bash", Some("1".to_string())),
            AgentEvent::tool_output("bash", ToolPhase::Stdout, "ok"),
            AgentEvent::tool_end("bash", 0),
        ]
    );
}

#[tokio::test]
async fn s4_auto_detect_selects_claude_despite_noise() {
    let mut input = String::new();
    for _ in 0..8 {
        input.push_str("{\"type\":\"message\",\"role\":\"user\",\"content\":\"hi\"}\n");
    }
    input.push_str("garbage one\n");
    input.push_str("garbage two\n");
    let leaked: &'static str = Box::leak(input.into_boxed_str());
    let events = events_for(leaked.as_bytes(), VendorChoice::Auto).await;
    let msg_count = events.iter().filter(|e| e.tag() == "msg").count();
    let error_count = events.iter().filter(|e| e.tag() == "error").count();
    assert_eq!(msg_count, 8);
    assert_eq!(error_count, 2);
}

#[tokio::test]
async fn s5_collapse_tools_emits_single_block_between_markers() {
    colored::control::set_override(false);
    let mut events = vec![AgentEvent::tool_start("bash", None)];
    for i in 0..100 {
        events.push(AgentEvent::tool_output("bash", ToolPhase::Stdout, format!("line {i}")));
    }
    events.push(AgentEvent::tool_end("bash", 0));

    let options = RenderOptions {
        collapse_tools: true,
        ..RenderOptions::default()
    };
    let mut renderer = AnsiRenderer::new(options);
    let mut chunks: Vec<String> = events.iter().map(|e| renderer.render(e)).collect();
    chunks.retain(|c| !c.is_empty());
    // start line, then one combined block+status at end.
    assert_eq!(chunks.len(), 2);
    assert!(chunks[1].contains("line 0"));
    assert!(chunks[1].contains("line 99"));
}

#[tokio::test]
async fn s6_flush_warns_about_unterminated_tool_and_clears_state() {
    colored::control::set_override(false);
    let mut renderer = AnsiRenderer::new(RenderOptions::default());
    renderer.render(&AgentEvent::tool_start("foo", None));
    let flushed = renderer.flush();
    assert!(!flushed.is_empty());
    assert!(flushed.contains("foo"));
    // second flush has nothing left to report.
    assert!(renderer.flush().is_empty());
}

#[tokio::test]
async fn empty_input_yields_zero_events_and_empty_render() {
    let events = events_for(b"", VendorChoice::Fixed(Vendor::Claude)).await;
    assert!(events.is_empty());

    let mut renderer = JsonRenderer::new(RenderOptions {
        compact_mode: true,
        ..RenderOptions::default()
    });
    assert!(renderer.flush().is_empty());
}

#[tokio::test]
async fn whitespace_only_input_yields_zero_events() {
    let events = events_for(b"   \n\t\n", VendorChoice::Fixed(Vendor::Claude)).await;
    assert!(events.is_empty());
}

#[tokio::test]
async fn oversized_line_splits_into_at_least_ten_error_events() {
    let mut input = "x".repeat(100);
    input.push('\n');
    let leaked: &'static str = Box::leak(input.into_boxed_str());
    let options = DriverOptions {
        read: agentfmt::line_reader::ReadOptions {
            max_line_length: Some(10),
            include_empty: true,
        },
        debug: false,
        claude_prices: None,
    };
    let stream = stream_events(leaked.as_bytes(), VendorChoice::Fixed(Vendor::Claude), options);
    pin_mut!(stream);
    let mut error_count = 0;
    while let Some(item) = stream.next().await {
        if matches!(item.unwrap(), AgentEvent::Error { .. }) {
            error_count += 1;
        }
    }
    assert!(error_count >= 10);
}

#[tokio::test]
async fn unicode_text_round_trips_through_json_renderer() {
    let text = "héllo 🎉 wörld — café";
    let event = AgentEvent::msg(Role::User, text);
    let mut renderer = JsonRenderer::new(RenderOptions {
        compact_mode: true,
        ..RenderOptions::default()
    });
    let rendered = renderer.render(&event);
    let parsed: AgentEvent = serde_json::from_str(rendered.trim()).unwrap();
    assert_eq!(parsed, event);
}

#[tokio::test]
async fn reads_from_a_real_file_on_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "{{\"type\":\"message\",\"role\":\"user\",\"content\":\"from disk\"}}").unwrap();
    file.flush().unwrap();

    let opened = tokio::fs::File::open(file.path()).await.unwrap();
    let stream = stream_events(opened, VendorChoice::Fixed(Vendor::Claude), DriverOptions::default());
    pin_mut!(stream);
    let mut events = Vec::new();
    while let Some(item) = stream.next().await {
        events.push(item.unwrap());
    }
    assert_eq!(events, vec![AgentEvent::msg(Role::User, "from disk")]);
}

#[tokio::test]
async fn json_renderer_round_trip_with_no_filters() {
    let events = vec![
        AgentEvent::msg(Role::User, "hi"),
        AgentEvent::tool_start("bash", None),
        AgentEvent::tool_output("bash", ToolPhase::Stdout, "ok"),
        AgentEvent::tool_end("bash", 0),
        AgentEvent::Cost { delta_usd: 0.01 },
        AgentEvent::error("boom"),
        AgentEvent::debug(serde_json::json!({"x": 1})),
    ];
    let mut renderer = JsonRenderer::new(RenderOptions {
        compact_mode: true,
        ..RenderOptions::default()
    });
    let rendered = renderer.render_batch(&events);
    let round_tripped: Vec<AgentEvent> = rendered
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(round_tripped, events);
}
