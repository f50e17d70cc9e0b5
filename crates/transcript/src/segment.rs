use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Millisecond fields accept fractional input but are stored as integers,
/// rounded up so a segment never ends before the audio it covers.
fn ceil_ms(value: f64) -> u64 {
    value.ceil().max(0.0) as u64
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error(
        "segment with role '{role}' must include timing: non-empty 'words' with \
         start_ms/end_ms, or 'start_ms' and 'end_ms', or 'start_ms' and 'duration_ms'"
    )]
    MissingTiming { role: Role },
}

/// Wire role of a segment. `user` and `agent` are the speech roles and the
/// only ones that require timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    NodeTransition,
    User,
    Agent,
    AgentFunction,
    AgentResult,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::NodeTransition => "node_transition",
            Role::User => "user",
            Role::Agent => "agent",
            Role::AgentFunction => "agent_function",
            Role::AgentResult => "agent_result",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Agent,
}

impl Speaker {
    pub fn role(&self) -> Role {
        match self {
            Speaker::User => Role::User,
            Speaker::Agent => Role::Agent,
        }
    }
}

/// Word-level timing, preferred over segment-level spans when available.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Word {
    pub word: String,
    pub start_ms: u64,
    pub end_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl Word {
    pub fn new(word: impl Into<String>, start_ms: f64, end_ms: f64) -> Self {
        Self {
            word: word.into(),
            start_ms: ceil_ms(start_ms),
            end_ms: ceil_ms(end_ms),
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Speech {
    pub speaker: Speaker,
    pub text: Option<String>,
    pub words: Vec<Word>,
}

impl Speech {
    pub fn new(speaker: Speaker) -> Self {
        Self {
            speaker,
            text: None,
            words: Vec::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_words(mut self, words: Vec<Word>) -> Self {
        self.words = words;
        self
    }
}

/// Tool invocation detail, carried by `agent_function` segments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolInvocation {
    pub name: Option<String>,
    pub request_id: Option<String>,
    pub params: Option<Value>,
}

/// Tool result detail, carried by `agent_result` segments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolOutcome {
    pub name: Option<String>,
    pub request_id: Option<String>,
    pub result: Option<Value>,
    pub is_error: Option<bool>,
    pub error: Option<String>,
}

/// Workflow node transition. The source node serializes as `from`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeTransition {
    #[serde(rename = "from")]
    pub from_node: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Per-kind payload. Each variant carries only the fields its role uses;
/// the shared base (timing, metadata) lives on [`Segment`].
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentKind {
    Speech(Speech),
    ToolCall(ToolInvocation),
    ToolResult(ToolOutcome),
    NodeTransition(NodeTransition),
}

impl SegmentKind {
    pub fn role(&self) -> Role {
        match self {
            SegmentKind::Speech(speech) => speech.speaker.role(),
            SegmentKind::ToolCall(_) => Role::AgentFunction,
            SegmentKind::ToolResult(_) => Role::AgentResult,
            SegmentKind::NodeTransition(_) => Role::NodeTransition,
        }
    }
}

/// One unit in the unified call timeline.
///
/// Invariants, enforced by [`SegmentBuilder::build`]:
/// - speech segments (`user`/`agent`) carry a timing source: non-empty words,
///   or a start offset (paired with an end or a duration when one is known);
/// - `end_ms` is derived as `start_ms + duration_ms` when only those two are
///   supplied, and is authoritative once set;
/// - all millisecond fields are integers (fractional input is rounded up).
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    kind: SegmentKind,
    start_ms: Option<u64>,
    end_ms: Option<u64>,
    duration_ms: Option<u64>,
    metadata: Map<String, Value>,
    extra: Map<String, Value>,
}

impl Segment {
    pub fn builder(kind: SegmentKind) -> SegmentBuilder {
        SegmentBuilder::new(kind)
    }

    pub fn role(&self) -> Role {
        self.kind.role()
    }

    pub fn kind(&self) -> &SegmentKind {
        &self.kind
    }

    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            SegmentKind::Speech(speech) => speech.text.as_deref(),
            _ => None,
        }
    }

    pub fn start_ms(&self) -> Option<u64> {
        self.start_ms
    }

    pub fn end_ms(&self) -> Option<u64> {
        self.end_ms
    }

    pub fn duration_ms(&self) -> Option<u64> {
        self.duration_ms
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }
}

pub struct SegmentBuilder {
    kind: SegmentKind,
    start_ms: Option<f64>,
    end_ms: Option<f64>,
    duration_ms: Option<f64>,
    metadata: Map<String, Value>,
    extra: Map<String, Value>,
}

impl SegmentBuilder {
    fn new(kind: SegmentKind) -> Self {
        Self {
            kind,
            start_ms: None,
            end_ms: None,
            duration_ms: None,
            metadata: Map::new(),
            extra: Map::new(),
        }
    }

    pub fn start_ms(mut self, ms: f64) -> Self {
        self.start_ms = Some(ms);
        self
    }

    pub fn end_ms(mut self, ms: f64) -> Self {
        self.end_ms = Some(ms);
        self
    }

    pub fn duration_ms(mut self, ms: f64) -> Self {
        self.duration_ms = Some(ms);
        self
    }

    pub fn metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Opaque passthrough field, flattened to the top level on the wire.
    pub fn extra_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn build(self) -> Result<Segment, ValidationError> {
        let start_ms = self.start_ms.map(ceil_ms);
        let duration_ms = self.duration_ms.map(ceil_ms);
        let mut end_ms = self.end_ms.map(ceil_ms);

        if end_ms.is_none() {
            if let (Some(start), Some(duration)) = (start_ms, duration_ms) {
                end_ms = Some(start + duration);
            }
        }

        // Speech needs a place on the timeline: word timings, or a start
        // offset (the end may legitimately be open when there is no following
        // turn to borrow it from). Duration-only or end-only is not enough.
        if let SegmentKind::Speech(speech) = &self.kind {
            let has_words = !speech.words.is_empty();
            if !has_words && start_ms.is_none() {
                return Err(ValidationError::MissingTiming {
                    role: self.kind.role(),
                });
            }
        }

        Ok(Segment {
            kind: self.kind,
            start_ms,
            end_ms,
            duration_ms,
            metadata: self.metadata,
            extra: self.extra,
        })
    }
}

#[derive(Serialize)]
struct ToolWire<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_error: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl<'a> ToolWire<'a> {
    fn invocation(call: &'a ToolInvocation) -> Self {
        Self {
            name: call.name.as_deref(),
            request_id: call.request_id.as_deref(),
            params: call.params.as_ref(),
            result: None,
            is_error: None,
            error: None,
        }
    }

    fn outcome(outcome: &'a ToolOutcome) -> Self {
        Self {
            name: outcome.name.as_deref(),
            request_id: outcome.request_id.as_deref(),
            params: None,
            result: outcome.result.as_ref(),
            is_error: outcome.is_error,
            error: outcome.error.as_deref(),
        }
    }
}

impl Serialize for Segment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("role", &self.role())?;

        if let SegmentKind::Speech(speech) = &self.kind {
            if let Some(text) = &speech.text {
                map.serialize_entry("text", text)?;
            }
            if !speech.words.is_empty() {
                map.serialize_entry("words", &speech.words)?;
            }
        }

        if let Some(ms) = self.start_ms {
            map.serialize_entry("start_ms", &ms)?;
        }
        if let Some(ms) = self.end_ms {
            map.serialize_entry("end_ms", &ms)?;
        }
        if let Some(ms) = self.duration_ms {
            map.serialize_entry("duration_ms", &ms)?;
        }

        match &self.kind {
            SegmentKind::NodeTransition(node) => map.serialize_entry("node", node)?,
            SegmentKind::ToolCall(call) => {
                map.serialize_entry("tool", &ToolWire::invocation(call))?
            }
            SegmentKind::ToolResult(outcome) => {
                map.serialize_entry("tool", &ToolWire::outcome(outcome))?
            }
            SegmentKind::Speech(_) => {}
        }

        map.serialize_entry("metadata", &self.metadata)?;

        for (key, value) in &self.extra {
            map.serialize_entry(key, value)?;
        }

        map.end()
    }
}
