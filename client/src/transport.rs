use clearbomb_protocol::{GameService, Request, Response};
use std::future::Future;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum TransportError {
    #[error("service unavailable: {0}")]
    Unavailable(String),
    #[error("malformed message: {0}")]
    Codec(String),
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Codec(err.to_string())
    }
}

/// Carries one request to the service and brings its response back.
///
/// Sends on the same transport may be in flight concurrently; responses can come back in any order.
pub trait Transport {
    fn send(&self, request: Request) -> impl Future<Output = Result<Response, TransportError>>;
}

/// In-process transport that still goes through the JSON codec, so the wire format is exercised end to end.
#[derive(Debug)]
pub struct LocalTransport {
    service: Mutex<GameService>,
}

impl LocalTransport {
    pub fn new(service: GameService) -> Self {
        Self {
            service: Mutex::new(service),
        }
    }

    /// Runs `f` with exclusive access to the service, e.g. to drive its timer.
    pub fn with_service<R>(&self, f: impl FnOnce(&mut GameService) -> R) -> Result<R, TransportError> {
        let mut service = self
            .service
            .lock()
            .map_err(|_| TransportError::Unavailable("service lock poisoned".into()))?;
        Ok(f(&mut service))
    }
}

impl Transport for LocalTransport {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        let body = serde_json::to_string(&request)?;
        log::trace!("-> {}", body);
        let reply = self.with_service(|service| service.handle_json(&body))??;
        log::trace!("<- {}", reply);
        Ok(serde_json::from_str(&reply)?)
    }
}
