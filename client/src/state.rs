use clearbomb_core::{
    BoardView, CellState, Coord2, GameConfig, GameError, GameStatus, PlayerView, deduce_mines,
    map_selection_to_cells,
};
use clearbomb_protocol::{Outcome, Request, Response, Revision, Selection, SessionId};
use std::collections::BTreeMap;

use crate::{SyncError, TransportError};

/// A user gesture, before it has been checked against the displayed board.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    Fetch,
    Reveal(Coord2),
    Flag(Coord2),
    AutoMark(Selection),
    /// `None` replays the current configuration.
    Reset(Option<GameConfig>),
}

impl Action {
    pub fn target(&self) -> Target {
        match *self {
            Self::Fetch => Target::Snapshot,
            Self::Reveal(coords) | Self::Flag(coords) => Target::Cell(coords),
            Self::AutoMark(_) => Target::Selection,
            Self::Reset(_) => Target::Board,
        }
    }
}

/// What an in-flight request is about. A target has at most one request whose response still counts.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Target {
    Cell(Coord2),
    Selection,
    Snapshot,
    Board,
}

/// Handle for one in-flight request, handed back to [`ClientState::complete`] with its response.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Ticket {
    pub id: u64,
    pub target: Target,
    /// Local reset generation the request was issued in.
    pub epoch: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Issued {
    pub ticket: Ticket,
    pub request: Request,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Reconciled {
    /// The response was accepted and its optimistic effect retired.
    Applied,
    /// The response belonged to a superseded request or an earlier session and was ignored.
    Discarded,
    /// Nothing was sent since the action had no effect.
    Unchanged,
}

#[derive(Clone, Debug, PartialEq)]
enum Effect {
    Cells {
        cells: Vec<(Coord2, CellState)>,
        status: Option<GameStatus>,
    },
    Replace(BoardView),
}

impl Effect {
    const NONE: Self = Self::Cells {
        cells: Vec::new(),
        status: None,
    };

    fn apply(&self, view: &mut BoardView) {
        match self {
            Self::Cells { cells, status } => {
                for &(coords, state) in cells {
                    view.set_state(coords, state);
                }
                if let Some(status) = *status {
                    view.status = status;
                }
            }
            Self::Replace(board) => *view = board.clone(),
        }
    }
}

/// Session bookkeeping a reset replaces, put back if the reset fails.
#[derive(Copy, Clone, Debug, PartialEq)]
struct Rollback {
    session: Option<SessionId>,
    retired: Option<SessionId>,
    elapsed_secs: u32,
}

#[derive(Clone, Debug, PartialEq)]
struct Pending {
    id: u64,
    effect: Effect,
    rollback: Option<Rollback>,
}

/// Sans-IO synchronisation state: the last confirmed snapshot plus the optimistic effects of every request still
/// in flight.
///
/// The displayed board is always `confirmed` with the pending effects replayed in issue order, so rolling an
/// action back is only a matter of dropping its entry.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientState {
    session: Option<SessionId>,
    /// Newest session known to be replaced; responses from it or anything older are stale.
    retired: Option<SessionId>,
    revision: Revision,
    epoch: u64,
    next_ticket: u64,
    confirmed: BoardView,
    pending: BTreeMap<Target, Pending>,
    displayed: BoardView,
    elapsed_secs: u32,
}

impl ClientState {
    /// Starts unsynced, showing a blank board of `config` until the first snapshot arrives.
    pub fn new(config: GameConfig) -> Self {
        let blank = BoardView::blank(config);
        Self {
            session: None,
            retired: None,
            revision: 0,
            epoch: 0,
            next_ticket: 0,
            confirmed: blank.clone(),
            pending: BTreeMap::new(),
            displayed: blank,
            elapsed_secs: 0,
        }
    }

    /// Board as the player should see it.
    pub fn view(&self) -> &BoardView {
        &self.displayed
    }

    /// Last snapshot the service sent.
    pub fn confirmed(&self) -> &BoardView {
        &self.confirmed
    }

    pub fn session(&self) -> Option<SessionId> {
        self.session
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_pending(&self, target: Target) -> bool {
        self.pending.contains_key(&target)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    /// Advances the local timer by one second while the displayed game is running.
    pub fn tick(&mut self) -> bool {
        if self.displayed.status == GameStatus::Active {
            self.elapsed_secs = self.elapsed_secs.saturating_add(1);
            true
        } else {
            false
        }
    }

    /// Checks `action` against the displayed board, applies its optimistic effect and returns the request to send.
    ///
    /// `Ok(None)` means the action is a no-op and nothing needs to be sent. An earlier request on the same target
    /// is superseded: its effect is replaced and its response will be discarded.
    pub fn begin(&mut self, action: Action) -> Result<Option<Issued>, SyncError> {
        let target = action.target();
        let mut rollback = None;
        let (request, effect) = match action {
            Action::Fetch => (Request::FetchBoard, Effect::NONE),
            Action::Reveal(coords) => {
                self.check_mutable(coords)?;
                if self.displayed.state_at(coords) != CellState::Hidden {
                    log::trace!("reveal on {:?} is a no-op", coords);
                    return Ok(None);
                }
                let status = self.displayed.status.is_pending().then_some(GameStatus::Active);
                let effect = Effect::Cells {
                    cells: vec![(coords, CellState::Revealed)],
                    status,
                };
                (Request::Reveal { position: coords.into() }, effect)
            }
            Action::Flag(coords) => {
                self.check_mutable(coords)?;
                if self.displayed.status.is_pending() {
                    return Err(GameError::InvalidTransition.into());
                }
                let state = match self.displayed.state_at(coords) {
                    CellState::Hidden => CellState::Flagged,
                    CellState::Flagged => CellState::Hidden,
                    CellState::Revealed => return Err(GameError::InvalidTransition.into()),
                };
                let effect = Effect::Cells {
                    cells: vec![(coords, state)],
                    status: None,
                };
                (Request::Flag { position: coords.into() }, effect)
            }
            Action::AutoMark(selection) => {
                self.check_synced()?;
                if self.displayed.status.is_finished() {
                    return Err(GameError::GameOver.into());
                }
                let (rows, columns) = (self.displayed.rows, self.displayed.columns);
                let range = match &selection {
                    Selection::Pixels { rect, geometry } => {
                        map_selection_to_cells(*rect, geometry.cell_size, geometry.origin, rows, columns)
                    }
                    Selection::Cells { range } => range.clamped((rows, columns)),
                };
                let cells = deduce_mines(&self.displayed, range)
                    .into_iter()
                    .map(|coords| (coords, CellState::Flagged))
                    .collect();
                let effect = Effect::Cells {
                    cells,
                    status: None,
                };
                (Request::AutoMark { selection }, effect)
            }
            Action::Reset(config) => {
                let config = match config {
                    Some(config) => config.validate()?,
                    None => self.displayed.config(),
                };
                rollback = Some(Rollback {
                    session: self.session,
                    retired: self.retired,
                    elapsed_secs: self.elapsed_secs,
                });
                self.epoch += 1;
                self.pending.clear();
                self.retire(self.session);
                self.session = None;
                self.elapsed_secs = 0;
                log::debug!("reset to {:?}, epoch {}", config, self.epoch);
                let request = Request::Reset {
                    config: Some(config.into()),
                };
                (request, Effect::Replace(BoardView::blank(config)))
            }
        };

        self.next_ticket += 1;
        let ticket = Ticket {
            id: self.next_ticket,
            target,
            epoch: self.epoch,
        };
        let pending = Pending {
            id: ticket.id,
            effect,
            rollback,
        };
        if let Some(previous) = self.pending.insert(target, pending) {
            log::debug!("ticket {} supersedes {} on {:?}", ticket.id, previous.id, target);
        }
        self.rebuild();

        Ok(Some(Issued { ticket, request }))
    }

    /// Reconciles the response to `ticket`.
    ///
    /// Failures roll the optimistic effect back and are returned as errors; every other pending effect is kept.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        result: Result<Response, TransportError>,
    ) -> Result<Reconciled, SyncError> {
        if ticket.epoch != self.epoch {
            log::debug!("discarding ticket {} from epoch {}", ticket.id, ticket.epoch);
            return Ok(Reconciled::Discarded);
        }
        let rollback = match self.pending.get(&ticket.target) {
            Some(pending) if pending.id == ticket.id => pending.rollback,
            _ => {
                log::debug!("discarding superseded ticket {}", ticket.id);
                return Ok(Reconciled::Discarded);
            }
        };
        self.pending.remove(&ticket.target);

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                log::warn!("request {} failed: {}", ticket.id, err);
                self.roll_back(rollback);
                return Err(err.into());
            }
        };

        // A reset is answered by the session it retires when it is refused.
        if ticket.target != Target::Board && self.is_retired(response.session) {
            log::debug!(
                "discarding ticket {} answered by retired session {}",
                ticket.id,
                response.session
            );
            self.rebuild();
            return Ok(Reconciled::Discarded);
        }

        let view = match response.outcome {
            Outcome::Board(view) => view,
            Outcome::Rejected(rejection) => {
                log::info!("request {} rejected: {}", ticket.id, rejection);
                self.roll_back(rollback);
                return Err(rejection.into());
            }
        };

        match self.session {
            Some(expected) if expected != response.session && ticket.target != Target::Board => {
                log::warn!(
                    "service moved from session {} to {}, dropping {} pending actions",
                    expected,
                    response.session,
                    self.pending.len()
                );
                self.pending.clear();
                self.epoch += 1;
                self.retire(Some(expected));
                self.adopt(response.session, response.revision, view);
                return Err(SyncError::SessionMismatch {
                    expected,
                    actual: response.session,
                });
            }
            _ => {}
        }

        if response.revision >= self.revision || self.session != Some(response.session) {
            self.adopt(response.session, response.revision, view);
        } else {
            log::trace!(
                "keeping revision {} over older {}",
                self.revision,
                response.revision
            );
            self.rebuild();
        }
        Ok(Reconciled::Applied)
    }

    fn adopt(&mut self, session: SessionId, revision: Revision, view: BoardView) {
        self.retire(session.checked_sub(1));
        self.session = Some(session);
        self.revision = revision;
        self.elapsed_secs = self.elapsed_secs.max(view.elapsed_secs);
        self.confirmed = view;
        self.rebuild();
    }

    fn retire(&mut self, session: Option<SessionId>) {
        self.retired = self.retired.max(session);
    }

    fn is_retired(&self, session: SessionId) -> bool {
        self.retired.is_some_and(|retired| session <= retired)
    }

    /// Drops a failed request's effect; a failed reset also gets the session it replaced back.
    fn roll_back(&mut self, rollback: Option<Rollback>) {
        if let Some(rollback) = rollback {
            log::debug!("reset failed, back on session {:?}", rollback.session);
            self.session = rollback.session;
            self.retired = rollback.retired;
            self.elapsed_secs = rollback.elapsed_secs;
        }
        self.rebuild();
    }

    fn rebuild(&mut self) {
        let mut effects: Vec<_> = self.pending.values().collect();
        effects.sort_by_key(|pending| pending.id);

        let mut displayed = self.confirmed.clone();
        for pending in effects {
            pending.effect.apply(&mut displayed);
        }
        self.displayed = displayed;
    }

    /// Mutations need a known session, or at least a reset on its way to establish one.
    fn check_synced(&self) -> Result<(), SyncError> {
        if self.session.is_none() && !self.pending.contains_key(&Target::Board) {
            return Err(SyncError::NotSynced);
        }
        Ok(())
    }

    fn check_mutable(&self, coords: Coord2) -> Result<(), SyncError> {
        self.check_synced()?;
        if !self.displayed.contains(coords) {
            return Err(GameError::OutOfBounds.into());
        }
        if self.displayed.status.is_finished() {
            return Err(GameError::GameOver.into());
        }
        Ok(())
    }
}
