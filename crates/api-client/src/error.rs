use kardex_core::KardexError;

/// Longest response body kept in a [`ClientError::Status`] message.
const BODY_EXCERPT_LEN: usize = 200;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to build HTTP client: {0}")]
    Build(reqwest::Error),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} answered {status}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },
    #[error("{url} returned 404")]
    NotFound { url: String },
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

impl ClientError {
    pub(crate) fn status(status: u16, url: impl Into<String>, body: &str) -> Self {
        let body = match body.char_indices().nth(BODY_EXCERPT_LEN) {
            Some((cut, _)) => format!("{}...", &body[..cut]),
            None => body.to_string(),
        };
        ClientError::Status {
            status,
            url: url.into(),
            body,
        }
    }
}

impl From<ClientError> for KardexError {
    fn from(err: ClientError) -> Self {
        KardexError::Backend(Box::new(err))
    }
}
