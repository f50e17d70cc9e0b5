use callsync_transcript::Segment;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One finished call, as the create-call endpoint expects it. Optional fields
/// are dropped from the wire when unset.
#[derive(Debug, Clone, Serialize)]
pub struct CreateCallRequest {
    pub call_id: String,
    pub call_type: String,
    pub transcript_with_tool_calls: Vec<Segment>,
    pub start_timestamp: i64,
    pub end_timestamp: i64,
    pub recording_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disconnection_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caller_phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_successful: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_sentiment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_voicemail: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collected_dynamic_variables: Option<Value>,
    /// Total cost in the smallest currency unit (cents).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_analysis: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub general_meta_data_raw: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recording_multi_channel_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCallResponse {
    pub id: i64,
    pub provider_call_id: String,
    pub is_new: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use callsync_transcript::{SegmentKind, Speaker, Speech};
    use serde_json::json;

    #[test]
    fn none_fields_are_omitted_on_the_wire() {
        let segment = Segment::builder(SegmentKind::Speech(
            Speech::new(Speaker::Agent).with_text("Hi"),
        ))
        .start_ms(0.0)
        .end_ms(1000.0)
        .build()
        .unwrap();

        let request = CreateCallRequest {
            call_id: "conv_1".into(),
            call_type: "voice".into(),
            transcript_with_tool_calls: vec![segment],
            start_timestamp: 1_000_000,
            end_timestamp: 1_060_000,
            recording_url: " ".into(),
            transcript: None,
            duration_ms: Some(60_000),
            call_status: Some("done".into()),
            disconnection_reason: None,
            caller_phone_number: None,
            call_successful: None,
            user_sentiment: None,
            in_voicemail: None,
            collected_dynamic_variables: None,
            call_cost: Some(10.0),
            call_analysis: None,
            general_meta_data_raw: None,
            recording_multi_channel_url: None,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["call_id"], "conv_1");
        assert_eq!(value["duration_ms"], 60_000);
        assert!(value.get("transcript").is_none());
        assert!(value.get("caller_phone_number").is_none());
        assert_eq!(
            value["transcript_with_tool_calls"],
            json!([{
                "role": "agent",
                "text": "Hi",
                "start_ms": 0,
                "end_ms": 1000,
                "metadata": {},
            }])
        );
    }
}
