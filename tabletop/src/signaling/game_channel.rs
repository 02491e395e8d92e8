//! The per-game-instance channel.
//!
//! Every running game gets its own socket at
//! `.../games/{gameType}/{gameId}`. The universal operations (start,
//! join, leave, close, state queries) are shared by all game types; the
//! snake-specific operations ride the same channel. The controller
//! announces itself with `getInitialGameStates` on open so a late joiner
//! immediately learns whether the game is already running.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::{GameKind, SessionIdentity};
use crate::signaling::socket::{ListenerId, SocketController, TransportState};

/// Per-game attribute bag, keyed username → instance. The attribute
/// values themselves (snake color, score, ...) stay opaque.
pub type PlayersState = HashMap<String, HashMap<String, serde_json::Value>>;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SnakeDirection {
    Up,
    Down,
    Left,
    Right,
}

/// Header for operations addressed to the game itself.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameHeader {
    pub table_id: String,
    pub game_type: GameKind,
    pub game_id: String,
}

/// Header for operations addressed to the game by one player.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerGameHeader {
    pub table_id: String,
    pub username: String,
    pub instance: String,
    pub game_type: GameKind,
    pub game_id: String,
}

/// Snake moves name the player but not the game type (the channel is
/// already snake-specific).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnakePlayerHeader {
    pub table_id: String,
    pub username: String,
    pub instance: String,
    pub game_id: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridSizeHeader {
    pub table_id: String,
    pub game_id: String,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinGameData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snake_color: Option<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectionData {
    pub direction: SnakeDirection,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridSizeData {
    pub grid_size: u32,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnakeColorData {
    pub new_snake_color: String,
}

/// Messages sent up a game channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutgoingGameMessage {
    StartGame {
        header: GameHeader,
    },
    CloseGame {
        header: GameHeader,
    },
    JoinGame {
        header: PlayerGameHeader,
        data: JoinGameData,
    },
    LeaveGame {
        header: PlayerGameHeader,
    },
    GetPlayersState {
        header: PlayerGameHeader,
    },
    GetInitialGameStates {
        header: PlayerGameHeader,
    },
    SnakeDirectionChange {
        header: SnakePlayerHeader,
        data: DirectionData,
    },
    ChangeGridSize {
        header: GridSizeHeader,
        data: GridSizeData,
    },
    ChangeSnakeColor {
        header: SnakePlayerHeader,
        data: SnakeColorData,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStateData {
    pub game_state: serde_json::Value,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayersStateData {
    pub players_state: PlayersState,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialGameStatesData {
    pub started: bool,
    pub game_over: bool,
    pub players_state: PlayersState,
}

/// Messages pushed down a game channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum IncomingGameMessage {
    GameStarted,
    GameStateUpdate { data: GameStateData },
    GameOver,
    PlayersStateUpdated { data: PlayersStateData },
    GridSizeChanged { data: GridSizeData },
    InitialGameStatesReturned { data: InitialGameStatesData },
    #[serde(other)]
    Unknown,
}

/// Controller for one game instance's channel.
pub struct GameChannelSocket {
    identity: SessionIdentity,
    kind: GameKind,
    game_id: String,
    socket: Arc<SocketController<IncomingGameMessage, OutgoingGameMessage>>,
}

impl GameChannelSocket {
    pub fn new(
        url: impl Into<String>,
        identity: SessionIdentity,
        kind: GameKind,
        game_id: impl Into<String>,
    ) -> Self {
        let game_id = game_id.into();
        let hello = OutgoingGameMessage::GetInitialGameStates {
            header: player_header(&identity, kind, &game_id),
        };
        Self {
            socket: Arc::new(SocketController::new(url).with_hello(hello)),
            identity,
            kind,
            game_id,
        }
    }

    pub fn connect(&self) {
        self.socket.spawn_connect();
    }

    pub fn state(&self) -> TransportState {
        self.socket.state()
    }

    pub fn add_listener(
        &self,
        listener: impl Fn(&IncomingGameMessage) + Send + Sync + 'static,
    ) -> ListenerId {
        self.socket.add_listener(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) {
        self.socket.remove_listener(id);
    }

    pub fn deliver_frame(&self, raw: &str) {
        self.socket.deliver_frame(raw);
    }

    pub fn teardown(&self) {
        self.socket.teardown();
    }

    fn game_header(&self) -> GameHeader {
        GameHeader {
            table_id: self.identity.table_id.clone(),
            game_type: self.kind,
            game_id: self.game_id.clone(),
        }
    }

    fn player_header(&self) -> PlayerGameHeader {
        player_header(&self.identity, self.kind, &self.game_id)
    }

    fn snake_header(&self) -> SnakePlayerHeader {
        SnakePlayerHeader {
            table_id: self.identity.table_id.clone(),
            username: self.identity.username.clone(),
            instance: self.identity.instance.clone(),
            game_id: self.game_id.clone(),
        }
    }

    pub fn start_game(&self) {
        self.socket.send(&OutgoingGameMessage::StartGame {
            header: self.game_header(),
        });
    }

    pub fn close_game(&self) {
        self.socket.send(&OutgoingGameMessage::CloseGame {
            header: self.game_header(),
        });
    }

    pub fn join_game(&self, snake_color: Option<&str>) {
        self.socket.send(&OutgoingGameMessage::JoinGame {
            header: self.player_header(),
            data: JoinGameData {
                snake_color: snake_color.map(str::to_string),
            },
        });
    }

    pub fn leave_game(&self) {
        self.socket.send(&OutgoingGameMessage::LeaveGame {
            header: self.player_header(),
        });
    }

    pub fn get_players_state(&self) {
        self.socket.send(&OutgoingGameMessage::GetPlayersState {
            header: self.player_header(),
        });
    }

    pub fn snake_direction_change(&self, direction: SnakeDirection) {
        self.socket.send(&OutgoingGameMessage::SnakeDirectionChange {
            header: self.snake_header(),
            data: DirectionData { direction },
        });
    }

    pub fn change_grid_size(&self, grid_size: u32) {
        self.socket.send(&OutgoingGameMessage::ChangeGridSize {
            header: GridSizeHeader {
                table_id: self.identity.table_id.clone(),
                game_id: self.game_id.clone(),
            },
            data: GridSizeData { grid_size },
        });
    }

    pub fn change_snake_color(&self, new_snake_color: &str) {
        self.socket.send(&OutgoingGameMessage::ChangeSnakeColor {
            header: self.snake_header(),
            data: SnakeColorData {
                new_snake_color: new_snake_color.to_string(),
            },
        });
    }

    #[cfg(test)]
    pub(crate) fn open_with(
        &self,
        sender: tokio::sync::mpsc::UnboundedSender<tokio_tungstenite::tungstenite::Message>,
    ) {
        self.socket.open_with(sender);
    }
}

fn player_header(identity: &SessionIdentity, kind: GameKind, game_id: &str) -> PlayerGameHeader {
    PlayerGameHeader {
        table_id: identity.table_id.clone(),
        username: identity.username.clone(),
        instance: identity.instance.clone(),
        game_type: kind,
        game_id: game_id.to_string(),
    }
}
