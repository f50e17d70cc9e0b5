use callsync_http::HttpClient;

use crate::error::Error;
use crate::types::{CreateCallRequest, CreateCallResponse};

const CREATE_CALL_PATH: &str = "/api/v1/public/call";

/// Query parameters required on every create-call request.
#[derive(Debug, Clone)]
pub struct CallScope {
    pub workspace_id: String,
    pub agent_remote_identifier: String,
}

pub struct TunerClient<C> {
    http: C,
}

impl<C: HttpClient> TunerClient<C> {
    pub fn new(http: C) -> Self {
        Self { http }
    }

    pub async fn create_call(
        &self,
        scope: &CallScope,
        request: &CreateCallRequest,
    ) -> Result<CreateCallResponse, Error> {
        let path = format!(
            "{CREATE_CALL_PATH}?workspace_id={}&agent_remote_identifier={}",
            urlencoding::encode(&scope.workspace_id),
            urlencoding::encode(&scope.agent_remote_identifier),
        );
        let body = serde_json::to_vec(request)?;
        let response = self
            .http
            .post(&path, body, "application/json")
            .await
            .map_err(Error::Http)?;
        if !response.is_success() {
            return Err(Error::Api {
                status: response.status,
                body: response.body_text(),
            });
        }
        Ok(serde_json::from_slice(&response.body)?)
    }
}
