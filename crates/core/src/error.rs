use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("path has no file name: {0}")]
    MissingFileName(String),

    #[error("document root is not a json object: {0}")]
    NotAnObject(String),

    #[error("designation field is not a string in {0}")]
    DesignationType(String),

    #[error("no usable designation for {0}")]
    BlankDesignation(String),
}

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("completion returned no choices")]
    EmptyResponse,
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Model output that does not match the JSON contract a stage asked for.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResponseParseError {
    #[error("model response was empty")]
    Empty,

    #[error("model response is not valid json: {0}")]
    Malformed(String),

    #[error("model response root is not a json object")]
    NotAnObject,

    #[error("field `{0}` is neither a string nor null")]
    FieldType(&'static str),
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("chat completion failed: {0}")]
    Completion(#[from] CompletionError),

    #[error("query was cancelled")]
    Cancelled,

    #[error("catalog refresh task failed: {0}")]
    CatalogRefresh(#[from] tokio::task::JoinError),
}

pub type Result<T, E = QueryError> = std::result::Result<T, E>;
