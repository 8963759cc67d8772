use clearbomb_core::{GameConfig, GameError, GameSession};
use rand::prelude::*;

use crate::*;

/// The authoritative side: owns the session and answers requests one at a time.
///
/// Taking `&mut self` per request is what serializes board mutations; hosts that share the service across tasks
/// must wrap it in a lock.
#[derive(Debug)]
pub struct GameService {
    session: GameSession,
    session_id: SessionId,
    revision: Revision,
    rng: SmallRng,
}

impl GameService {
    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        Self::from_rng(config, SmallRng::from_os_rng())
    }

    /// Fixes the seed sequence so that whole games can be replayed.
    pub fn with_seed(config: GameConfig, seed: u64) -> Result<Self, GameError> {
        Self::from_rng(config, SmallRng::seed_from_u64(seed))
    }

    /// Serves an existing session, e.g. one built from a fixed layout. `seed` drives later resets.
    pub fn with_session(session: GameSession, seed: u64) -> Self {
        Self {
            session,
            session_id: 1,
            revision: 0,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    fn from_rng(config: GameConfig, mut rng: SmallRng) -> Result<Self, GameError> {
        let session = GameSession::new(config, rng.next_u64())?;
        Ok(Self {
            session,
            session_id: 1,
            revision: 0,
            rng,
        })
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn revision(&self) -> Revision {
        self.revision
    }

    /// Drives the session timer; call once per second.
    pub fn tick(&mut self) -> bool {
        self.session.tick()
    }

    pub fn handle(&mut self, request: Request) -> Response {
        log::debug!("session {}: {:?}", self.session_id, request);

        let is_mutation = request.is_mutation();
        let result = match request {
            Request::FetchBoard => Ok(()),
            Request::Reveal { position } => self.session.reveal(position.into()).map(|_| ()),
            Request::Flag { position } => self.session.toggle_flag(position.into()).map(|_| ()),
            Request::AutoMark { selection } => match selection {
                Selection::Pixels { rect, geometry } => {
                    self.session.auto_mark_selection(rect, geometry).map(|_| ())
                }
                Selection::Cells { range } => self.session.auto_mark(range).map(|_| ()),
            },
            Request::Reset { config } => self.reset(config),
        };

        let outcome = match result {
            Ok(()) => {
                if is_mutation {
                    self.revision += 1;
                }
                Outcome::Board(self.session.view())
            }
            Err(err) => {
                log::debug!("session {}: rejected with {}", self.session_id, err);
                Outcome::Rejected(err.into())
            }
        };

        Response {
            session: self.session_id,
            revision: self.revision,
            outcome,
        }
    }

    /// JSON surface of [`GameService::handle`]; malformed bodies are answered with a `BadRequest` rejection.
    pub fn handle_json(&mut self, body: &str) -> serde_json::Result<String> {
        let response = match serde_json::from_str::<Request>(body) {
            Ok(request) => self.handle(request),
            Err(err) => {
                log::warn!("malformed request: {}", err);
                Response {
                    session: self.session_id,
                    revision: self.revision,
                    outcome: Outcome::Rejected(Rejection::bad_request(err.to_string())),
                }
            }
        };
        serde_json::to_string(&response)
    }

    fn reset(&mut self, config: Option<BoardConfig>) -> Result<(), GameError> {
        let config = config.map(BoardConfig::validate).transpose()?;
        let seed = self.rng.next_u64();
        self.session.reset(config, seed)?;
        self.session_id += 1;
        log::info!(
            "session {}: new {:?} board {}x{} with {} mines",
            self.session_id,
            self.session.difficulty(),
            self.session.board().config().rows,
            self.session.board().config().columns,
            self.session.board().config().mines
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clearbomb_core::{CellState, GameStatus, Position};

    fn service() -> GameService {
        GameService::with_seed(GameConfig::new(9, 9, 10).unwrap(), 5).unwrap()
    }

    fn board(response: Response) -> BoardView {
        match response.outcome {
            Outcome::Board(view) => view,
            Outcome::Rejected(rejection) => panic!("unexpected rejection: {rejection}"),
        }
    }

    fn rejection(response: Response) -> Rejection {
        match response.outcome {
            Outcome::Rejected(rejection) => rejection,
            Outcome::Board(_) => panic!("expected a rejection"),
        }
    }

    fn reveal(row: u8, column: u8) -> Request {
        Request::Reveal {
            position: Position::new(row, column),
        }
    }

    #[test]
    fn fetch_returns_pending_board() {
        let mut service = service();
        let view = board(service.handle(Request::FetchBoard));

        assert_eq!(view.status, GameStatus::Pending);
        assert_eq!((view.rows, view.columns, view.mines), (9, 9, 10));
        assert!(view.cells.iter().all(|cell| cell.state == CellState::Hidden));
    }

    #[test]
    fn first_reveal_after_reset_is_always_safe() {
        let mut service = service();
        for _ in 0..50 {
            let config = BoardConfig {
                rows: 9,
                columns: 9,
                mines: 10,
            };
            board(service.handle(Request::Reset {
                config: Some(config),
            }));
            let view = board(service.handle(reveal(4, 4)));

            assert_eq!(view.status, GameStatus::Active);
            assert_eq!(view.cell((4, 4)).unwrap().adjacent_mines, Some(0));
        }
    }

    #[test]
    fn reset_bumps_session_and_rejects_bad_config() {
        let mut service = service();
        let before = service.session_id();

        let response = service.handle(Request::Reset {
            config: Some(BoardConfig {
                rows: 9,
                columns: 9,
                mines: 80,
            }),
        });
        assert_eq!(response.session, before);
        assert_eq!(rejection(response).kind, ErrorKind::Configuration);

        let response = service.handle(Request::Reset { config: None });
        assert_eq!(response.session, before + 1);
        assert_eq!(board(response).difficulty, clearbomb_core::Difficulty::Beginner);
    }

    #[test]
    fn flag_before_first_reveal_is_invalid() {
        let mut service = service();
        let response = service.handle(Request::Flag {
            position: Position::new(0, 0),
        });
        assert_eq!(rejection(response).kind, ErrorKind::InvalidTransition);
    }

    #[test]
    fn out_of_bounds_reveal_is_rejected() {
        let mut service = service();
        let response = service.handle(reveal(9, 0));
        assert_eq!(rejection(response).kind, ErrorKind::OutOfBounds);
    }

    #[test]
    fn game_over_rejects_mutations() {
        let mut service = service();
        board(service.handle(reveal(4, 4)));

        // Reveal every cell until the game ends one way or the other.
        let mut last = None;
        'outer: for row in 0..9 {
            for column in 0..9 {
                let view = board(service.handle(reveal(row, column)));
                if view.status.is_finished() {
                    last = Some(view.status);
                    break 'outer;
                }
            }
        }
        assert!(last.is_some());

        assert_eq!(rejection(service.handle(reveal(0, 0))).kind, ErrorKind::GameOver);
        let response = service.handle(Request::AutoMark {
            selection: Selection::Cells {
                range: clearbomb_core::CellRange::spanning((0, 0), (8, 8)),
            },
        });
        assert_eq!(rejection(response).kind, ErrorKind::GameOver);
        board(service.handle(Request::FetchBoard));
    }

    #[test]
    fn json_surface_round_trips_and_reports_bad_requests() {
        let mut service = service();

        let body = service
            .handle_json(r#"{"action":"reveal","position":{"row":4,"column":4}}"#)
            .unwrap();
        let response: Response = serde_json::from_str(&body).unwrap();
        assert_eq!(board(response).status, GameStatus::Active);

        let body = service.handle_json(r#"{"action":"explode"}"#).unwrap();
        let response: Response = serde_json::from_str(&body).unwrap();
        assert_eq!(rejection(response).kind, ErrorKind::BadRequest);
    }

    #[test]
    fn revision_counts_successful_mutations() {
        let mut service = service();
        assert_eq!(service.handle(Request::FetchBoard).revision, 0);
        assert_eq!(service.handle(reveal(4, 4)).revision, 1);
        assert_eq!(service.handle(reveal(20, 4)).revision, 1);
        assert_eq!(service.handle(Request::Reset { config: None }).revision, 2);
        assert_eq!(service.handle(Request::FetchBoard).revision, 2);
    }

    #[test]
    fn same_seed_replays_same_games() {
        let mut a = service();
        let mut b = service();

        let view_a = board(a.handle(reveal(0, 0)));
        let view_b = board(b.handle(reveal(0, 0)));

        assert_eq!(view_a, view_b);
    }
}
