use callsync_elevenlabs::{ConversationMetadata, ConversationWithRecording};
use callsync_transcript::{Segment, SegmentKind, Speaker, Speech};
use callsync_tuner::CreateCallRequest;

use crate::error::Error;
use crate::transcript::map_transcript;

/// Flat rate charged per minute of call time, on top of the provider's
/// per-call LLM price.
const COST_PER_MINUTE_USD: f64 = 0.10;
const CENTS_PER_USD: f64 = 100.0;

/// Epoch values below this are seconds; at or above, already milliseconds.
const EPOCH_MS_THRESHOLD: i64 = 10_000_000_000;

/// Substituted end-timestamp delta when the call duration is unknown.
const FALLBACK_DURATION_MS: u64 = 60_000;

fn coerce_epoch_ms(value: i64) -> i64 {
    if value < EPOCH_MS_THRESHOLD {
        value * 1000
    } else {
        value
    }
}

fn call_cost_cents(metadata: &ConversationMetadata) -> f64 {
    let mut usd = 0.0;
    if let Some(charging) = &metadata.charging {
        usd += charging.llm_price.unwrap_or(0.0);
    }
    if let Some(secs) = metadata.call_duration_secs {
        usd += (secs as f64 / 60.0) * COST_PER_MINUTE_USD;
    }
    usd * CENTS_PER_USD
}

fn placeholder_segment(duration_ms: Option<u64>) -> Result<Segment, Error> {
    Ok(Segment::builder(SegmentKind::Speech(
        Speech::new(Speaker::Agent).with_text("No transcript available"),
    ))
    .start_ms(0.0)
    .end_ms(duration_ms.unwrap_or(1000) as f64)
    .build()?)
}

/// Aggregate one enriched conversation into the outbound call record.
///
/// A validation failure in any emitted segment fails the whole conversation;
/// the caller decides what to do with the batch. The returned record always
/// carries at least one segment.
pub fn build_call_request(
    conversation: &ConversationWithRecording,
) -> Result<CreateCallRequest, Error> {
    let detail = &conversation.conversation;
    let metadata = &detail.metadata;

    let start_timestamp = metadata.start_time_unix_secs.map(coerce_epoch_ms);
    let duration_ms = metadata.call_duration_secs.map(|secs| secs * 1000);

    let now_ms = chrono::Utc::now().timestamp_millis();
    let end_timestamp = start_timestamp.unwrap_or(now_ms)
        + duration_ms.unwrap_or(FALLBACK_DURATION_MS) as i64;

    let (call_type, caller_phone_number) = match &metadata.phone_call {
        Some(phone) => ("phone_call", phone.external_number.clone()),
        None => ("voice", None),
    };

    let mut segments = map_transcript(&detail.transcript)?;
    if segments.is_empty() {
        segments.push(placeholder_segment(duration_ms)?);
    }

    Ok(CreateCallRequest {
        call_id: detail.conversation_id.clone(),
        call_type: call_type.to_string(),
        transcript_with_tool_calls: segments,
        start_timestamp: start_timestamp.unwrap_or(now_ms),
        end_timestamp,
        recording_url: conversation.recording_url.clone(),
        transcript: None,
        duration_ms,
        call_status: detail.status.clone(),
        disconnection_reason: metadata.termination_reason.clone(),
        caller_phone_number,
        call_successful: None,
        user_sentiment: None,
        in_voicemail: None,
        collected_dynamic_variables: None,
        call_cost: Some(call_cost_cents(metadata)),
        call_analysis: detail.analysis.clone(),
        general_meta_data_raw: Some(serde_json::to_value(metadata)?),
        recording_multi_channel_url: None,
    })
}
