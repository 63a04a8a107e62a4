//! Node runtime error type.

use thiserror::Error;

/// Result alias used throughout the node runtime.
pub type NodeResult<T> = Result<T, NodeError>;

/// Errors the node runtime can raise.
///
/// Per the error-handling design, almost every variant here is treated as
/// fatal by its caller: the runtime does not retry or silently continue
/// after a broker, decode, or type-mismatch failure.
#[derive(Error, Debug)]
pub enum NodeError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("broker error: {0}")]
    Broker(String),

    #[error("unknown port '{0}'")]
    UnknownPort(String),

    #[error("message type mismatch on port '{port}': expected '{expected}', got '{actual}'")]
    TypeMismatch {
        port: String,
        expected: String,
        actual: String,
    },

    #[error("unknown message type '{0}'")]
    UnknownMessageType(String),

    #[error("representation '{representation}' is not implemented by message type '{type_name}'")]
    UnsupportedRepresentation {
        type_name: String,
        representation: String,
    },

    #[error("decode error on port '{port}': {source}")]
    Decode {
        port: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("encode error: {0}")]
    Encode(String),

    #[error("processing function failed: {0}")]
    Processing(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("config file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config file parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}
