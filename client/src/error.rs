use clearbomb_core::GameError;
use clearbomb_protocol::{Rejection, SessionId};
use thiserror::Error;

use crate::TransportError;

#[derive(Error, Clone, Debug, PartialEq)]
pub enum SyncError {
    /// Refused locally, no request was sent.
    #[error(transparent)]
    Game(#[from] GameError),
    /// Refused by the service; the optimistic effect was rolled back.
    #[error("rejected by service: {0}")]
    Rejected(#[from] Rejection),
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The service is on another session than the one this client was playing. The authoritative board has
    /// been adopted and all pending effects dropped.
    #[error("session changed from {expected} to {actual}")]
    SessionMismatch {
        expected: SessionId,
        actual: SessionId,
    },
    #[error("no board fetched yet")]
    NotSynced,
}
