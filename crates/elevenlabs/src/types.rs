use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct ListConversationsResponse {
    #[serde(default)]
    pub conversations: Vec<ConversationSummary>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConversationSummary {
    pub conversation_id: String,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub agent_name: Option<String>,
    #[serde(default)]
    pub start_time_unix_secs: Option<i64>,
    #[serde(default)]
    pub call_duration_secs: Option<u64>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Conversation {
    pub conversation_id: String,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub transcript: Vec<ConversationTurn>,
    #[serde(default)]
    pub metadata: ConversationMetadata,
    #[serde(default)]
    pub analysis: Option<Value>,
}

/// One conversation detail paired with its resolved recording URL.
#[derive(Debug, Clone)]
pub struct ConversationWithRecording {
    pub conversation: Conversation,
    pub recording_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConversationTurn {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub time_in_call_secs: Option<u64>,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default)]
    pub tool_results: Vec<ToolResult>,
    #[serde(default)]
    pub interrupted: Option<bool>,
    #[serde(default)]
    pub conversation_turn_metrics: Option<TurnMetrics>,
    #[serde(default)]
    pub agent_metadata: Option<Value>,
    #[serde(default)]
    pub source_medium: Option<String>,
    #[serde(default)]
    pub rag_retrieval_info: Option<Value>,
    #[serde(default)]
    pub llm_usage: Option<Value>,
    #[serde(default)]
    pub original_message: Option<String>,
    #[serde(default)]
    pub feedback: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolCall {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub params_as_json: Option<String>,
    #[serde(default)]
    pub tool_has_been_called: Option<bool>,
    #[serde(default)]
    pub tool_details: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolResult {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub result_value: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub is_error: Option<bool>,
    #[serde(default)]
    pub raw_error_message: Option<String>,
    #[serde(default)]
    pub tool_latency_secs: Option<f64>,
    #[serde(default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub dynamic_variable_updates: Option<Value>,
}

/// Per-turn latency metrics.
///
/// Entries are kept in wire order: the first metric the provider emits is the
/// one whose `elapsed_time` offsets the turn's start, so an unordered map
/// would make timing derivation non-deterministic.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TurnMetrics {
    #[serde(
        default,
        deserialize_with = "ordered_metrics::deserialize",
        serialize_with = "ordered_metrics::serialize"
    )]
    pub metrics: Vec<(String, TurnMetric)>,
}

impl TurnMetrics {
    pub fn first_elapsed_time(&self) -> Option<f64> {
        self.metrics.first().map(|(_, metric)| metric.elapsed_time)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TurnMetric {
    pub elapsed_time: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

mod ordered_metrics {
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};

    use super::TurnMetric;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<(String, TurnMetric)>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PairsVisitor;

        impl<'de> Visitor<'de> for PairsVisitor {
            type Value = Vec<(String, TurnMetric)>;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a map of metric entries")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(entry) = access.next_entry::<String, TurnMetric>()? {
                    entries.push(entry);
                }
                Ok(entries)
            }
        }

        deserializer.deserialize_map(PairsVisitor)
    }

    pub fn serialize<S>(entries: &[(String, TurnMetric)], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, value) in entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Conversation-level metadata. The typed fields are the ones the call
/// builder consumes; everything else the provider sends rides along in
/// `extra` so the raw blob can be re-emitted unmodified.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConversationMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time_unix_secs: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_duration_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub termination_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_call: Option<PhoneCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charging: Option<Charging>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PhoneCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Charging {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_price: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
