//! # Client Error Types
//!
//! Errors surfaced by the client facade, the transport and config loading.

use std::io;
use std::path::PathBuf;

use netcode_protocol::EncodeError;
use thiserror::Error;

use crate::state::ConnectionState;

/// Errors returned by the client facade.
#[derive(Error, Debug)]
pub enum ClientError {
    /// `connect` was called while a connection is still active.
    #[error("client is already active (state: {0})")]
    AlreadyActive(ConnectionState),

    /// The packet could not be encoded; nothing was queued.
    #[error("encode failed: {0}")]
    Encode(#[from] EncodeError),

    /// Opening the transport failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The client this handle belongs to has been dropped.
    #[error("client has been dropped")]
    Closed,

    /// The worker thread could not be spawned.
    #[error("failed to spawn connection worker: {0}")]
    Spawn(#[source] io::Error),
}

/// Errors raised by a transport. Any of these ends the connection worker.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Socket-level failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The host could not be resolved.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The remote end of the transport is gone.
    #[error("transport closed")]
    Closed,

    /// Any other transport failure.
    #[error("transport fault: {0}")]
    Fault(String),
}

/// Errors that can occur while loading a [`ClientConfig`](crate::ClientConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },

    /// The config file is not valid TOML for a client config.
    #[error("failed to parse client config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
