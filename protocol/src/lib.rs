//! Transport-agnostic messages exchanged between a Clear Bomb client and the authoritative game service.

use clearbomb_core::{
    BoardGeometry, BoardView, CellRange, GameConfig, GameError, Position, SelectionRect,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use service::*;

mod service;

/// Identifies one game from reset to reset. Every response carries the id of the session it was computed on.
pub type SessionId = u64;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    FetchBoard,
    Reveal { position: Position },
    Flag { position: Position },
    AutoMark { selection: Selection },
    Reset { config: Option<BoardConfig> },
}

impl Request {
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Self::FetchBoard)
    }
}

/// Auto-mark scope, either the raw pointer drag or an already mapped cell range.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Selection {
    Pixels {
        rect: SelectionRect,
        geometry: BoardGeometry,
    },
    Cells {
        range: CellRange,
    },
}

/// Requested board dimensions before validation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub rows: u32,
    pub columns: u32,
    pub mines: u32,
}

impl BoardConfig {
    pub fn validate(self) -> Result<GameConfig, GameError> {
        GameConfig::new(self.rows, self.columns, self.mines)
    }
}

impl From<GameConfig> for BoardConfig {
    fn from(config: GameConfig) -> Self {
        Self {
            rows: config.rows.into(),
            columns: config.columns.into(),
            mines: config.mines.into(),
        }
    }
}

/// Counts the successful mutations a service has applied, across sessions.
///
/// Responses computed later always carry a greater or equal revision, so a client can tell an old snapshot that
/// arrived late from a newer one.
pub type Revision = u64;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub session: SessionId,
    pub revision: Revision,
    pub outcome: Outcome,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", content = "payload", rename_all = "camelCase")]
pub enum Outcome {
    Board(BoardView),
    Rejected(Rejection),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    Configuration,
    InvalidTransition,
    OutOfBounds,
    GameOver,
    BadRequest,
}

#[derive(Error, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind:?}: {message}")]
pub struct Rejection {
    pub kind: ErrorKind,
    pub message: String,
}

impl Rejection {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::BadRequest,
            message: message.into(),
        }
    }
}

impl From<GameError> for Rejection {
    fn from(err: GameError) -> Self {
        let kind = match err {
            GameError::Configuration(_) => ErrorKind::Configuration,
            GameError::InvalidTransition => ErrorKind::InvalidTransition,
            GameError::OutOfBounds => ErrorKind::OutOfBounds,
            GameError::GameOver => ErrorKind::GameOver,
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clearbomb_core::Point;
    use serde_json::json;

    #[test]
    fn requests_use_camel_case_tags() {
        let request: Request =
            serde_json::from_value(json!({"action": "reveal", "position": {"row": 4, "column": 2}}))
                .unwrap();
        assert_eq!(
            request,
            Request::Reveal {
                position: Position::new(4, 2)
            }
        );

        let request: Request = serde_json::from_value(json!({
            "action": "autoMark",
            "selection": {"kind": "cells", "range": {"rowBegin": 0, "rowEnd": 2, "colBegin": 1, "colEnd": 3}}
        }))
        .unwrap();
        assert_eq!(
            request,
            Request::AutoMark {
                selection: Selection::Cells {
                    range: CellRange::spanning((0, 1), (2, 3))
                }
            }
        );
    }

    #[test]
    fn pixel_selection_and_reset_payloads_parse() {
        let request: Request = serde_json::from_value(json!({
            "action": "autoMark",
            "selection": {
                "kind": "pixels",
                "rect": {"start": {"x": 20.0, "y": 20.0}, "end": {"x": 85.0, "y": 85.0}},
                "geometry": {"cellSize": 32.0, "origin": {"x": 0.0, "y": 0.0}}
            }
        }))
        .unwrap();
        assert_eq!(
            request,
            Request::AutoMark {
                selection: Selection::Pixels {
                    rect: SelectionRect::new(Point::new(20.0, 20.0), Point::new(85.0, 85.0)),
                    geometry: BoardGeometry {
                        cell_size: 32.0,
                        origin: Point::new(0.0, 0.0)
                    },
                }
            }
        );

        let request: Request = serde_json::from_value(
            json!({"action": "reset", "config": {"rows": 9, "columns": 9, "mines": 10}}),
        )
        .unwrap();
        assert!(matches!(request, Request::Reset { config: Some(_) }));

        let request: Request =
            serde_json::from_value(json!({"action": "reset", "config": null})).unwrap();
        assert_eq!(request, Request::Reset { config: None });
    }

    #[test]
    fn rejection_maps_game_errors() {
        let rejection = Rejection::from(GameError::GameOver);
        assert_eq!(rejection.kind, ErrorKind::GameOver);

        let err = GameConfig::new(1, 1, 1).unwrap_err();
        assert_eq!(Rejection::from(err).kind, ErrorKind::Configuration);
    }

    #[test]
    fn board_config_validates_raw_values() {
        let config = BoardConfig {
            rows: 300,
            columns: 9,
            mines: 10,
        };
        assert!(config.validate().is_err());

        let config = BoardConfig::from(GameConfig::new(9, 9, 10).unwrap());
        assert_eq!(config.validate(), GameConfig::new(9, 9, 10));
    }
}
