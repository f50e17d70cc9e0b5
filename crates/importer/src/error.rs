#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] callsync_transcript::ValidationError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
