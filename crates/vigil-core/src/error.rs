use thiserror::Error;

#[derive(Debug, Error)]
pub enum VigilError {
    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("abi error: {0}")]
    Abi(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type VigilResult<T> = Result<T, VigilError>;
