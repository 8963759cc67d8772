//! Client side of a Clear Bomb game: optimistic local play kept in sync with an authoritative [`GameService`].
//!
//! [`ClientState`] holds all synchronisation logic without doing any I/O; [`SyncClient`] drives it over a
//! [`Transport`].
//!
//! [`GameService`]: clearbomb_protocol::GameService

pub use error::*;
pub use selection::*;
pub use state::*;
pub use sync::*;
pub use transport::*;

mod error;
mod selection;
mod state;
mod sync;
mod transport;
