//! Embedded game sessions: per-game media objects and the interactive
//! controller that drives one game on the table surface.

pub mod controller;
pub mod snake;

use crate::entities::GameKind;
use crate::media::Releasable;
use crate::positioning::{Positioning, PositioningUpdate};
use snake::SnakeGameMedia;

/// Client-local view of one game's lifecycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GamePhase {
    NotStarted,
    Started,
    Over,
    /// Terminal; the registry entry is gone.
    Closed,
}

/// One running game's media object, dispatched over the sealed set of
/// game kinds.
pub enum GameMedia {
    Snake(SnakeGameMedia),
}

impl GameMedia {
    pub fn kind(&self) -> GameKind {
        match self {
            Self::Snake(_) => GameKind::Snake,
        }
    }

    pub fn game_id(&self) -> &str {
        match self {
            Self::Snake(snake) => snake.game_id(),
        }
    }

    pub fn initiator(&self) -> bool {
        match self {
            Self::Snake(snake) => snake.initiator(),
        }
    }

    pub fn phase(&self) -> GamePhase {
        match self {
            Self::Snake(snake) => snake.phase(),
        }
    }

    pub fn positioning(&self) -> Positioning {
        match self {
            Self::Snake(snake) => snake.positioning(),
        }
    }

    pub fn set_positioning(&self, positioning: Positioning) {
        match self {
            Self::Snake(snake) => snake.set_positioning(positioning),
        }
    }

    pub fn apply_positioning(&self, update: &PositioningUpdate) {
        match self {
            Self::Snake(snake) => snake.apply_positioning(update),
        }
    }

    pub fn start_game(&self) {
        match self {
            Self::Snake(snake) => snake.start_game(),
        }
    }

    pub fn close_game(&self) {
        match self {
            Self::Snake(snake) => snake.close_game(),
        }
    }

    pub fn join_game(&self, snake_color: Option<&str>) {
        match self {
            Self::Snake(snake) => snake.join_game(snake_color),
        }
    }

    pub fn leave_game(&self) {
        match self {
            Self::Snake(snake) => snake.leave_game(),
        }
    }

    pub fn destroy(&mut self) {
        match self {
            Self::Snake(snake) => snake.destroy(),
        }
    }
}

impl Releasable for GameMedia {
    fn release(&mut self) {
        self.destroy();
    }
}
