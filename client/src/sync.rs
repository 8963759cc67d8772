use clearbomb_core::{BoardGeometry, BoardView, CellRange, Coord2, GameConfig, SelectionRect};
use clearbomb_protocol::Selection;
use std::cell::RefCell;

use crate::*;

/// Drives a [`ClientState`] over a [`Transport`].
///
/// The state sits in a `RefCell` that is never borrowed across an `.await`, so several dispatches may be in
/// flight at once on a single task (see `futures_util::join!`).
#[derive(Debug)]
pub struct SyncClient<T> {
    transport: T,
    state: RefCell<ClientState>,
}

impl<T: Transport> SyncClient<T> {
    /// An unsynced client; call [`SyncClient::refresh`] before playing.
    pub fn new(transport: T, config: GameConfig) -> Self {
        Self {
            transport,
            state: RefCell::new(ClientState::new(config)),
        }
    }

    /// Creates a client and fetches the current board.
    pub async fn connect(transport: T, config: GameConfig) -> Result<Self, SyncError> {
        let client = Self::new(transport, config);
        client.refresh().await?;
        Ok(client)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn view(&self) -> BoardView {
        self.state.borrow().view().clone()
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.state.borrow().elapsed_secs()
    }

    pub fn tick(&self) -> bool {
        self.state.borrow_mut().tick()
    }

    /// Read access to the synchronisation state, for inspection only.
    pub fn with_state<R>(&self, f: impl FnOnce(&ClientState) -> R) -> R {
        f(&self.state.borrow())
    }

    pub async fn dispatch(&self, action: Action) -> Result<Reconciled, SyncError> {
        let issued = self.state.borrow_mut().begin(action)?;
        let Some(Issued { ticket, request }) = issued else {
            return Ok(Reconciled::Unchanged);
        };

        let result = self.transport.send(request).await;
        self.state.borrow_mut().complete(ticket, result)
    }

    pub async fn refresh(&self) -> Result<Reconciled, SyncError> {
        self.dispatch(Action::Fetch).await
    }

    pub async fn reveal(&self, coords: Coord2) -> Result<Reconciled, SyncError> {
        self.dispatch(Action::Reveal(coords)).await
    }

    pub async fn flag(&self, coords: Coord2) -> Result<Reconciled, SyncError> {
        self.dispatch(Action::Flag(coords)).await
    }

    pub async fn auto_mark(
        &self,
        rect: SelectionRect,
        geometry: BoardGeometry,
    ) -> Result<Reconciled, SyncError> {
        self.dispatch(Action::AutoMark(Selection::Pixels { rect, geometry }))
            .await
    }

    pub async fn auto_mark_cells(&self, range: CellRange) -> Result<Reconciled, SyncError> {
        self.dispatch(Action::AutoMark(Selection::Cells { range }))
            .await
    }

    pub async fn reset(&self, config: Option<GameConfig>) -> Result<Reconciled, SyncError> {
        self.dispatch(Action::Reset(config)).await
    }
}
