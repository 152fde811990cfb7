use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("http transport error: {0}")]
    Http(#[from] reqwest_middleware::Error),

    #[error("request failed with status {0}")]
    Status(reqwest::StatusCode),

    #[error("failed to decode response: {0}")]
    Decode(#[from] reqwest::Error),

    #[error("no authenticated client")]
    NotAuthenticated,
}

pub type Result<T> = std::result::Result<T, GraphError>;
