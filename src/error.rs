use crate::{bridge::SdkError, value::ValueKind};
use std::io;
use thiserror::Error;

/// Errors surfaced to callers of the bridge's boundary operations.
///
/// Event normalization itself never fails; see [`EventNormalizer`](crate::EventNormalizer).
#[derive(Debug, Error)]
pub enum Error {
    #[error("Encountered an invalid JSON payload ({0})")]
    Json(#[from] serde_json::Error),

    #[error("Encountered an invalid configuration ({0})")]
    Config(#[from] serde_yaml::Error),

    #[error("Encountered a payload line of {observed} bytes (limit is {limit})")]
    LineTooLong { observed: usize, limit: usize },

    #[error("Expected a {expected} payload, found {found}")]
    UnexpectedPayload {
        expected: ValueKind,
        found: ValueKind,
    },

    #[error("The host did not provide package information")]
    PackageInfoUnavailable,

    #[error("The native SDK rejected the call ({0})")]
    Sdk(#[from] SdkError),

    #[error("The transport buffer is full ({0} pending events)")]
    BufferFull(usize),

    #[error("The transport has been closed")]
    TransportClosed,

    #[error("A native send task failed ({0})")]
    Join(#[from] tokio::task::JoinError),

    #[error(
        "Encountered an IO error while reading the input stream ({})",
        .0.kind()
    )]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn unexpected_payload(expected: ValueKind, found: ValueKind) -> Self {
        Error::UnexpectedPayload { expected, found }
    }
}
