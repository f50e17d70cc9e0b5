use callsync_http::HttpClient;

use crate::error::Error;
use crate::types::{
    Conversation, ConversationSummary, ConversationWithRecording, ListConversationsResponse,
};

pub const DEFAULT_API_BASE: &str = "https://api.elevenlabs.io";

/// Maximum page size accepted by the conversation listing endpoint.
const PAGE_SIZE: u32 = 100;

/// Destination requires a non-empty recording URL; this is the agreed
/// placeholder when the audio endpoint cannot be reached.
const RECORDING_URL_FALLBACK: &str = " ";

#[derive(Debug, Clone, Default)]
pub struct ConversationQuery {
    pub agent_id: String,
    pub call_start_after_unix: Option<i64>,
    pub call_start_before_unix: Option<i64>,
}

pub struct ElevenLabsClient<C> {
    http: C,
    api_base: String,
}

impl<C: HttpClient> ElevenLabsClient<C> {
    pub fn new(http: C) -> Self {
        Self {
            http,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Override the public API base, used to compose absolute recording URLs.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    async fn list_page(
        &self,
        query: &ConversationQuery,
        cursor: Option<&str>,
    ) -> Result<ListConversationsResponse, Error> {
        let mut query_parts = vec![
            format!("agent_id={}", urlencoding::encode(&query.agent_id)),
            format!("page_size={PAGE_SIZE}"),
        ];
        if let Some(after) = query.call_start_after_unix {
            query_parts.push(format!("call_start_after_unix={after}"));
        }
        if let Some(before) = query.call_start_before_unix {
            query_parts.push(format!("call_start_before_unix={before}"));
        }
        if let Some(cursor) = cursor {
            query_parts.push(format!("cursor={}", urlencoding::encode(cursor)));
        }

        let path = format!("/v1/convai/conversations?{}", query_parts.join("&"));
        let response = self.http.get(&path).await.map_err(Error::Http)?;
        if !response.is_success() {
            return Err(Error::Api {
                status: response.status,
                body: response.body_text(),
            });
        }
        Ok(serde_json::from_slice(&response.body)?)
    }

    /// List every conversation for the agent in the given window, following
    /// pagination cursors until the provider reports no more pages.
    pub async fn list_conversations(
        &self,
        query: &ConversationQuery,
    ) -> Result<Vec<ConversationSummary>, Error> {
        let mut all = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = self.list_page(query, cursor.as_deref()).await?;
            all.extend(page.conversations);
            if !page.has_more {
                break;
            }
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        Ok(all)
    }

    pub async fn get_conversation(&self, conversation_id: &str) -> Result<Conversation, Error> {
        let path = format!("/v1/convai/conversations/{conversation_id}");
        let response = self.http.get(&path).await.map_err(Error::Http)?;
        if !response.is_success() {
            return Err(Error::Api {
                status: response.status,
                body: response.body_text(),
            });
        }
        Ok(serde_json::from_slice(&response.body)?)
    }

    /// Probe the audio endpoint and return a publicly usable recording URL.
    /// Best-effort: any failure logs a warning and yields the placeholder.
    pub async fn recording_url(&self, conversation_id: &str) -> String {
        let path = format!("/v1/convai/conversations/{conversation_id}/audio");
        match self.http.get(&path).await {
            Ok(response) if response.is_success() => format!("{}{}", self.api_base, path),
            Ok(response) => {
                tracing::warn!(
                    conversation_id = %conversation_id,
                    status = response.status,
                    "recording_unavailable"
                );
                RECORDING_URL_FALLBACK.to_string()
            }
            Err(err) => {
                tracing::warn!(
                    conversation_id = %conversation_id,
                    error = %err,
                    "recording_probe_failed"
                );
                RECORDING_URL_FALLBACK.to_string()
            }
        }
    }

    /// List, then enrich each summary with its full transcript and recording
    /// URL. A failure on one conversation skips it and keeps the rest; a
    /// failure listing at all propagates.
    pub async fn fetch_conversations(
        &self,
        query: &ConversationQuery,
    ) -> Result<Vec<ConversationWithRecording>, Error> {
        let summaries = self.list_conversations(query).await?;
        let total = summaries.len();
        tracing::info!(agent_id = %query.agent_id, total, "conversations_listed");

        let mut enriched = Vec::with_capacity(total);
        for (index, summary) in summaries.into_iter().enumerate() {
            let conversation = match self.get_conversation(&summary.conversation_id).await {
                Ok(conversation) => conversation,
                Err(err) => {
                    tracing::warn!(
                        conversation_id = %summary.conversation_id,
                        error = %err,
                        "conversation_skipped"
                    );
                    continue;
                }
            };
            let recording_url = self.recording_url(&summary.conversation_id).await;
            tracing::info!(
                index = index + 1,
                total,
                conversation_id = %summary.conversation_id,
                "conversation_fetched"
            );
            enriched.push(ConversationWithRecording {
                conversation,
                recording_url,
            });
        }

        Ok(enriched)
    }
}
