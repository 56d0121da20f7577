use thiserror::Error;

/// All errors produced by parley-core.
#[derive(Debug, Error)]
pub enum ParleyError {
    #[error("invalid OSC address {0:?}: must be non-empty and start with '/'")]
    InvalidAddress(String),

    #[error("invalid destination host {0:?}")]
    InvalidHost(String),

    #[error("invalid destination port {0:?}: must be in 1..=65535")]
    InvalidPort(String),

    #[error("invalid wait value {0:?}: must be a non-negative integer (ms)")]
    InvalidWait(String),

    #[error("malformed command block near {0:?}")]
    MalformedCommand(String),

    #[error("packet for {address} has no arguments")]
    NoArguments { address: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("outbound channel is full, scheduler cannot keep up")]
    Backpressure,

    #[error("outbound channel closed")]
    ChannelClosed,

    #[error("engine is already running")]
    AlreadyRunning,

    #[error("engine is not running")]
    NotRunning,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ParleyError>;
