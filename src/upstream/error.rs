use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("upstream responded with {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),
}
