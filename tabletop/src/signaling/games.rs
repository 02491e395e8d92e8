//! The games-server signaling channel.
//!
//! Carries game lifecycle for the whole table: initiations, closures,
//! and the active-game catch-up sent when a user joins. The channel's
//! default handler owns the games registry — it creates a media object
//! (with its own per-game channel) on `gameInitiated` and destroys it on
//! `gameClosed`, before listener fan-out sees the message.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::Endpoints;
use crate::entities::{GameKind, PeerRef, SessionIdentity};
use crate::games::GameMedia;
use crate::games::snake::SnakeGameMedia;
use crate::media::SharedMedia;
use crate::positioning::{Positioning, PositioningUpdate};
use crate::rtc::{UiEvents, lock};
use crate::signaling::socket::{ListenerId, SocketController, TransportState};

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GamesSignalingHeader {
    pub table_id: String,
    pub game_type: GameKind,
    pub game_id: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiatorData {
    pub initiator: PeerRef,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositioningData {
    pub positioning: PositioningUpdate,
}

/// Messages sent up the games signaling channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutgoingGamesMessage {
    InitiateGame {
        header: GamesSignalingHeader,
        data: InitiatorData,
    },
    UpdateContentPositioning {
        header: GamesSignalingHeader,
        data: PositioningData,
    },
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRefHeader {
    pub game_type: GameKind,
    pub game_id: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveGameEntry {
    pub game_type: GameKind,
    pub game_id: String,
    pub positioning: Positioning,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveGamesData {
    pub active_games: Vec<ActiveGameEntry>,
}

/// Messages pushed down the games signaling channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum IncomingGamesMessage {
    GameInitiated {
        header: GameRefHeader,
        data: InitiatorData,
    },
    GameClosed {
        header: GameRefHeader,
    },
    UserJoinedTable {
        data: ActiveGamesData,
    },
    #[serde(other)]
    Unknown,
}

/// Controller for the games signaling channel of one session.
pub struct GamesSignalingSocket {
    identity: SessionIdentity,
    socket: Arc<SocketController<IncomingGamesMessage, OutgoingGamesMessage>>,
}

impl GamesSignalingSocket {
    pub fn new(
        endpoints: Endpoints,
        identity: SessionIdentity,
        media: SharedMedia,
        ui: UiEvents,
    ) -> Self {
        let url = endpoints.games_signaling_url(&identity);
        let handler_identity = identity.clone();
        let socket = SocketController::new(url).with_default_handler(move |message| {
            Self::on_lifecycle(&endpoints, &handler_identity, &media, &ui, message);
        });
        Self {
            identity,
            socket: Arc::new(socket),
        }
    }

    fn on_lifecycle(
        endpoints: &Endpoints,
        identity: &SessionIdentity,
        media: &SharedMedia,
        ui: &UiEvents,
        message: &IncomingGamesMessage,
    ) {
        match message {
            IncomingGamesMessage::GameInitiated { header, data } => match header.game_type {
                GameKind::Snake => {
                    let initiator = data.initiator.username == identity.username
                        && data.initiator.instance == identity.instance;
                    let snake = SnakeGameMedia::new(
                        endpoints,
                        identity,
                        &header.game_id,
                        initiator,
                        None,
                        ui.clone(),
                    );
                    lock(media).games.insert(
                        GameKind::Snake,
                        &header.game_id,
                        GameMedia::Snake(snake),
                    );
                    ui.rerender();
                }
            },
            IncomingGamesMessage::GameClosed { header } => {
                if lock(media).games.remove(header.game_type, &header.game_id) {
                    ui.rerender();
                }
            }
            IncomingGamesMessage::UserJoinedTable { data } => {
                for active in &data.active_games {
                    match active.game_type {
                        GameKind::Snake => {
                            let snake = SnakeGameMedia::new(
                                endpoints,
                                identity,
                                &active.game_id,
                                false,
                                Some(active.positioning),
                                ui.clone(),
                            );
                            lock(media).games.insert(
                                GameKind::Snake,
                                &active.game_id,
                                GameMedia::Snake(snake),
                            );
                        }
                    }
                }
                ui.rerender();
            }
            IncomingGamesMessage::Unknown => {}
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
        listener: impl Fn(&IncomingGamesMessage) + Send + Sync + 'static,
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

    fn header(&self, game_type: GameKind, game_id: &str) -> GamesSignalingHeader {
        GamesSignalingHeader {
            table_id: self.identity.table_id.clone(),
            game_type,
            game_id: game_id.to_string(),
        }
    }

    /// Ask the server to create a new game; returns the generated id.
    /// The media object itself is created when `gameInitiated` echoes
    /// back, same as on every other client.
    pub fn initiate_game(&self, game_type: GameKind) -> String {
        let game_id = Uuid::new_v4().to_string();
        self.initiate_game_with_id(game_type, &game_id);
        game_id
    }

    pub fn initiate_game_with_id(&self, game_type: GameKind, game_id: &str) {
        self.socket.send(&OutgoingGamesMessage::InitiateGame {
            header: self.header(game_type, game_id),
            data: InitiatorData {
                initiator: PeerRef::new(
                    self.identity.username.clone(),
                    self.identity.instance.clone(),
                ),
            },
        });
    }

    /// Relay one (possibly partial) placement change to the server so it
    /// can catch up late joiners.
    pub fn update_content_positioning(
        &self,
        game_type: GameKind,
        game_id: &str,
        positioning: PositioningUpdate,
    ) {
        self.socket.send(&OutgoingGamesMessage::UpdateContentPositioning {
            header: self.header(game_type, game_id),
            data: PositioningData { positioning },
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
