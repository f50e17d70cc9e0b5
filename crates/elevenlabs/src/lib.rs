mod client;
mod error;
mod types;

pub use client::{ConversationQuery, DEFAULT_API_BASE, ElevenLabsClient};
pub use error::Error;
pub use types::{
    Charging, Conversation, ConversationMetadata, ConversationSummary, ConversationTurn,
    ConversationWithRecording, ListConversationsResponse, PhoneCall, ToolCall, ToolResult,
    TurnMetric, TurnMetrics,
};
