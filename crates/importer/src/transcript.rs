use callsync_elevenlabs::{ConversationTurn, ToolCall, ToolResult};
use callsync_transcript::{
    Segment, SegmentKind, Speaker, Speech, ToolInvocation, ToolOutcome,
};
use serde_json::{Map, Value, json};

use crate::error::Error;

/// Map an ordered provider transcript into the unified segment timeline.
///
/// Turns without a time offset have no place on the timeline and contribute
/// nothing. Within a turn the emission order is fixed: speech, then tool
/// calls, then tool results, each in provider order. No cross-turn
/// reordering happens; mapping the same transcript twice yields the same
/// segment list.
pub fn map_transcript(turns: &[ConversationTurn]) -> Result<Vec<Segment>, Error> {
    let mut segments = Vec::new();

    for (index, turn) in turns.iter().enumerate() {
        let Some(start_ms) = turn_start_ms(turn) else {
            continue;
        };
        let end_ms = turn_end_ms(turns, index);

        if let Some(message) = turn.message.as_deref().filter(|m| !m.is_empty()) {
            segments.push(speech_segment(turn, message, start_ms, end_ms)?);
        }
        for call in &turn.tool_calls {
            segments.push(tool_call_segment(call, start_ms)?);
        }
        for result in &turn.tool_results {
            segments.push(tool_result_segment(result, start_ms)?);
        }
    }

    Ok(segments)
}

/// Turn start: the turn's own offset plus the elapsed time of its first
/// metric in wire order (0 when the turn has no metrics).
fn turn_start_ms(turn: &ConversationTurn) -> Option<f64> {
    let base_ms = (turn.time_in_call_secs? * 1000) as f64;
    let elapsed_secs = turn
        .conversation_turn_metrics
        .as_ref()
        .and_then(|metrics| metrics.first_elapsed_time())
        .unwrap_or(0.0);
    Some(base_ms + elapsed_secs * 1000.0)
}

/// Turn end: the next turn's raw offset, unscaled by metrics, when that turn
/// has one. The last turn's end stays open.
fn turn_end_ms(turns: &[ConversationTurn], index: usize) -> Option<f64> {
    turns
        .get(index + 1)?
        .time_in_call_secs
        .map(|secs| (secs * 1000) as f64)
}

fn normalize_role(role: Option<&str>) -> Speaker {
    match role {
        Some("user") => Speaker::User,
        Some("agent") | Some("assistant") => Speaker::Agent,
        _ => Speaker::Agent,
    }
}

fn speech_segment(
    turn: &ConversationTurn,
    message: &str,
    start_ms: f64,
    end_ms: Option<f64>,
) -> Result<Segment, Error> {
    let speaker = normalize_role(turn.role.as_deref());
    let mut builder = Segment::builder(SegmentKind::Speech(
        Speech::new(speaker).with_text(message),
    ))
    .start_ms(start_ms)
    .metadata(turn_metadata(turn)?);
    if let Some(end_ms) = end_ms {
        builder = builder.end_ms(end_ms);
    }
    Ok(builder.build()?)
}

/// Provider-specific turn fields ride along in segment metadata. Only fields
/// actually present on the turn are included.
fn turn_metadata(turn: &ConversationTurn) -> Result<Map<String, Value>, Error> {
    let mut metadata = Map::new();
    if let Some(interrupted) = turn.interrupted {
        metadata.insert("interrupted".into(), Value::Bool(interrupted));
    }
    if let Some(agent_metadata) = &turn.agent_metadata {
        metadata.insert("agent_metadata".into(), agent_metadata.clone());
    }
    if let Some(metrics) = &turn.conversation_turn_metrics {
        metadata.insert(
            "conversation_turn_metrics".into(),
            serde_json::to_value(metrics)?,
        );
    }
    if let Some(source_medium) = &turn.source_medium {
        metadata.insert("source_medium".into(), Value::String(source_medium.clone()));
    }
    if let Some(rag_retrieval_info) = &turn.rag_retrieval_info {
        metadata.insert("rag_retrieval_info".into(), rag_retrieval_info.clone());
    }
    if let Some(llm_usage) = &turn.llm_usage {
        metadata.insert("llm_usage".into(), llm_usage.clone());
    }
    if let Some(original_message) = &turn.original_message {
        metadata.insert(
            "original_message".into(),
            Value::String(original_message.clone()),
        );
    }
    if let Some(feedback) = &turn.feedback {
        metadata.insert("feedback".into(), feedback.clone());
    }
    Ok(metadata)
}

/// Tool parameters arrive as a JSON-encoded string. An unparsable string is
/// preserved under a `raw` key rather than failing the turn.
fn parse_tool_params(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| json!({ "raw": raw }))
}

fn tool_call_segment(call: &ToolCall, at_ms: f64) -> Result<Segment, Error> {
    let invocation = ToolInvocation {
        name: call.tool_name.clone(),
        request_id: call.request_id.clone(),
        params: call.params_as_json.as_deref().map(parse_tool_params),
    };

    let mut metadata = Map::new();
    if let Some(kind) = &call.kind {
        metadata.insert("type".into(), Value::String(kind.clone()));
    }
    if let Some(called) = call.tool_has_been_called {
        metadata.insert("tool_has_been_called".into(), Value::Bool(called));
    }
    if let Some(details) = &call.tool_details {
        metadata.insert("tool_details".into(), details.clone());
    }

    Ok(Segment::builder(SegmentKind::ToolCall(invocation))
        .start_ms(at_ms)
        .end_ms(at_ms)
        .metadata(metadata)
        .build()?)
}

fn tool_result_segment(result: &ToolResult, at_ms: f64) -> Result<Segment, Error> {
    let mut payload = Map::new();
    if let Some(value) = &result.result_value {
        payload.insert("value".into(), value.clone());
    }
    if let Some(body) = &result.result {
        payload.insert("payload".into(), body.clone());
    }

    let error = match (result.is_error, &result.raw_error_message) {
        (Some(true), Some(message)) => Some(message.clone()),
        _ => None,
    };

    let outcome = ToolOutcome {
        name: result.tool_name.clone(),
        request_id: result.request_id.clone(),
        result: if payload.is_empty() {
            None
        } else {
            Some(Value::Object(payload))
        },
        is_error: result.is_error,
        error,
    };

    let mut metadata = Map::new();
    if let Some(kind) = &result.kind {
        metadata.insert("type".into(), Value::String(kind.clone()));
    }
    if let Some(latency) = result.tool_latency_secs {
        metadata.insert("tool_latency_secs".into(), json!(latency));
    }
    if let Some(error_type) = &result.error_type {
        metadata.insert("error_type".into(), Value::String(error_type.clone()));
    }
    if let Some(updates) = &result.dynamic_variable_updates {
        metadata.insert("dynamic_variable_updates".into(), updates.clone());
    }

    Ok(Segment::builder(SegmentKind::ToolResult(outcome))
        .start_ms(at_ms)
        .end_ms(at_ms)
        .metadata(metadata)
        .build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use callsync_transcript::Role;
    use serde_json::json;

    fn turn(value: Value) -> ConversationTurn {
        serde_json::from_value(value).unwrap()
    }

    fn speech_turn(role: &str, message: &str, secs: u64) -> ConversationTurn {
        turn(json!({
            "role": role,
            "message": message,
            "time_in_call_secs": secs,
        }))
    }

    #[test]
    fn two_turn_conversation_maps_to_two_speech_segments() {
        let turns = vec![
            speech_turn("user", "Hi", 0),
            speech_turn("assistant", "Hello", 2),
        ];
        let segments = map_transcript(&turns).unwrap();

        assert_eq!(segments.len(), 2);

        assert_eq!(segments[0].role(), Role::User);
        assert_eq!(segments[0].text(), Some("Hi"));
        assert_eq!(segments[0].start_ms(), Some(0));
        assert_eq!(segments[0].end_ms(), Some(2000));

        assert_eq!(segments[1].role(), Role::Agent);
        assert_eq!(segments[1].text(), Some("Hello"));
        assert_eq!(segments[1].start_ms(), Some(2000));
        assert_eq!(segments[1].end_ms(), None);
    }

    #[test]
    fn turn_without_time_offset_emits_nothing() {
        let turns = vec![
            turn(json!({
                "role": "agent",
                "message": "untimed",
                "tool_calls": [{"tool_name": "lookup"}],
            })),
            speech_turn("user", "Hi", 3),
        ];
        let segments = map_transcript(&turns).unwrap();

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text(), Some("Hi"));
        assert_eq!(segments[0].start_ms(), Some(3000));
    }

    #[test]
    fn first_metric_in_wire_order_offsets_start() {
        // Key order is deliberately anti-lexicographic; wire order must win.
        let raw = r#"[
            {
                "role": "agent",
                "message": "Hello",
                "time_in_call_secs": 1,
                "conversation_turn_metrics": {
                    "metrics": {
                        "zeta_ttfb": {"elapsed_time": 0.5},
                        "alpha_ttfb": {"elapsed_time": 9.0}
                    }
                }
            },
            {
                "role": "user",
                "message": "Hi",
                "time_in_call_secs": 4,
                "conversation_turn_metrics": {
                    "metrics": {"any": {"elapsed_time": 1.0}}
                }
            }
        ]"#;
        let turns: Vec<ConversationTurn> = serde_json::from_str(raw).unwrap();
        let segments = map_transcript(&turns).unwrap();

        // 1s offset + 0.5s first-metric elapsed.
        assert_eq!(segments[0].start_ms(), Some(1500));
        // End borrows the next turn's raw offset, unscaled by its metrics.
        assert_eq!(segments[0].end_ms(), Some(4000));
        assert_eq!(segments[1].start_ms(), Some(5000));
    }

    #[test]
    fn tool_calls_and_results_are_zero_width_instants() {
        let turns = vec![turn(json!({
            "role": "agent",
            "message": "checking",
            "time_in_call_secs": 2,
            "tool_calls": [{"tool_name": "lookup", "request_id": "req_1"}],
            "tool_results": [{"tool_name": "lookup", "request_id": "req_1", "result_value": "ok"}],
        }))];
        let segments = map_transcript(&turns).unwrap();

        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].role(), Role::Agent);
        assert_eq!(segments[1].role(), Role::AgentFunction);
        assert_eq!(segments[2].role(), Role::AgentResult);

        for segment in &segments[1..] {
            assert_eq!(segment.start_ms(), Some(2000));
            assert_eq!(segment.end_ms(), Some(2000));
        }
    }

    #[test]
    fn tool_params_json_string_is_parsed() {
        let turns = vec![turn(json!({
            "role": "agent",
            "time_in_call_secs": 1,
            "tool_calls": [{"tool_name": "lookup", "params_as_json": "{\"x\":1}"}],
        }))];
        let segments = map_transcript(&turns).unwrap();

        let SegmentKind::ToolCall(invocation) = segments[0].kind() else {
            panic!("expected a tool call segment");
        };
        assert_eq!(invocation.params, Some(json!({"x": 1})));
    }

    #[test]
    fn unparsable_tool_params_fall_back_to_raw() {
        let turns = vec![turn(json!({
            "role": "agent",
            "time_in_call_secs": 1,
            "tool_calls": [{"tool_name": "lookup", "params_as_json": "not json"}],
        }))];
        let segments = map_transcript(&turns).unwrap();

        let SegmentKind::ToolCall(invocation) = segments[0].kind() else {
            panic!("expected a tool call segment");
        };
        assert_eq!(invocation.params, Some(json!({"raw": "not json"})));
    }

    #[test]
    fn tool_result_error_message_only_when_flagged() {
        let turns = vec![turn(json!({
            "role": "agent",
            "time_in_call_secs": 1,
            "tool_results": [
                {"tool_name": "a", "is_error": true, "raw_error_message": "boom"},
                {"tool_name": "b", "is_error": false, "raw_error_message": "ignored"},
            ],
        }))];
        let segments = map_transcript(&turns).unwrap();

        let SegmentKind::ToolResult(first) = segments[0].kind() else {
            panic!("expected a tool result segment");
        };
        assert_eq!(first.error.as_deref(), Some("boom"));

        let SegmentKind::ToolResult(second) = segments[1].kind() else {
            panic!("expected a tool result segment");
        };
        assert_eq!(second.error, None);
    }

    #[test]
    fn tool_result_payload_keys() {
        let turns = vec![turn(json!({
            "role": "agent",
            "time_in_call_secs": 1,
            "tool_results": [
                {"tool_name": "a", "result_value": "42", "result": {"status": "ok"}},
                {"tool_name": "b"},
            ],
        }))];
        let segments = map_transcript(&turns).unwrap();

        let SegmentKind::ToolResult(both) = segments[0].kind() else {
            panic!("expected a tool result segment");
        };
        assert_eq!(
            both.result,
            Some(json!({"value": "42", "payload": {"status": "ok"}}))
        );

        let SegmentKind::ToolResult(neither) = segments[1].kind() else {
            panic!("expected a tool result segment");
        };
        assert_eq!(neither.result, None);
    }

    #[test]
    fn unknown_or_missing_role_defaults_to_agent() {
        let turns = vec![
            speech_turn("system", "a", 0),
            turn(json!({"message": "b", "time_in_call_secs": 1})),
        ];
        let segments = map_transcript(&turns).unwrap();
        assert_eq!(segments[0].role(), Role::Agent);
        assert_eq!(segments[1].role(), Role::Agent);
    }

    #[test]
    fn empty_message_emits_no_speech_but_keeps_tools() {
        let turns = vec![turn(json!({
            "role": "agent",
            "message": "",
            "time_in_call_secs": 1,
            "tool_calls": [{"tool_name": "lookup"}],
        }))];
        let segments = map_transcript(&turns).unwrap();

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].role(), Role::AgentFunction);
    }

    #[test]
    fn metadata_contains_only_present_fields() {
        let turns = vec![turn(json!({
            "role": "user",
            "message": "Hi",
            "time_in_call_secs": 0,
            "interrupted": true,
            "source_medium": "audio",
            "llm_usage": {"total_tokens": 12},
        }))];
        let segments = map_transcript(&turns).unwrap();

        let metadata = segments[0].metadata();
        assert_eq!(metadata["interrupted"], json!(true));
        assert_eq!(metadata["source_medium"], json!("audio"));
        assert_eq!(metadata["llm_usage"], json!({"total_tokens": 12}));
        assert!(!metadata.contains_key("agent_metadata"));
        assert!(!metadata.contains_key("feedback"));
    }

    #[test]
    fn tool_segment_metadata_from_present_fields() {
        let turns = vec![turn(json!({
            "role": "agent",
            "time_in_call_secs": 1,
            "tool_calls": [{
                "type": "client",
                "tool_name": "lookup",
                "tool_has_been_called": true,
            }],
            "tool_results": [{
                "type": "client",
                "tool_name": "lookup",
                "tool_latency_secs": 0.4,
                "dynamic_variable_updates": {"plan": "pro"},
            }],
        }))];
        let segments = map_transcript(&turns).unwrap();

        let call_meta = segments[0].metadata();
        assert_eq!(call_meta["type"], json!("client"));
        assert_eq!(call_meta["tool_has_been_called"], json!(true));
        assert!(!call_meta.contains_key("tool_details"));

        let result_meta = segments[1].metadata();
        assert_eq!(result_meta["tool_latency_secs"], json!(0.4));
        assert_eq!(result_meta["dynamic_variable_updates"], json!({"plan": "pro"}));
        assert!(!result_meta.contains_key("error_type"));
    }

    #[test]
    fn mapping_is_deterministic() {
        let turns = vec![
            speech_turn("user", "Hi", 0),
            turn(json!({
                "role": "assistant",
                "message": "Hello",
                "time_in_call_secs": 2,
                "tool_calls": [{"tool_name": "lookup", "params_as_json": "{\"x\":1}"}],
            })),
        ];

        let first = map_transcript(&turns).unwrap();
        let second = map_transcript(&turns).unwrap();

        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
