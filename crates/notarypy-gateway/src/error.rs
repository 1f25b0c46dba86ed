//! Gateway error types.

use std::net::SocketAddr;

use thiserror::Error;

use notarypy_core::CoreError;

/// Errors raised while assembling or running the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The configured bind address does not parse.
    #[error("invalid bind address '{addr}': {source}")]
    InvalidBind {
        /// Address as configured.
        addr: String,
        /// Parse failure.
        #[source]
        source: std::net::AddrParseError,
    },

    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    BindFailed {
        /// Address we tried to bind.
        addr: SocketAddr,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The resolver could not be built from configuration.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A function event could not be decoded or a response encoded.
    #[error("invalid function event: {0}")]
    InvalidEvent(#[from] serde_json::Error),

    /// The server stopped with an I/O error.
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
