//! The snake game's media object.
//!
//! Owns the game's channel socket and mirrors the server's lifecycle
//! pushes into a client-local phase. The initiator flag is true only on
//! the peer whose `initiateGame` created the game.

use std::sync::{Arc, Mutex};

use crate::config::Endpoints;
use crate::entities::{GameKind, SessionIdentity};
use crate::games::GamePhase;
use crate::positioning::{Positioning, PositioningUpdate};
use crate::rtc::{UiEvents, lock};
use crate::signaling::game_channel::{
    GameChannelSocket, IncomingGameMessage, PlayersState, SnakeDirection,
};

const DEFAULT_GRID_SIZE: u32 = 15;

struct SnakeShared {
    phase: GamePhase,
    players_state: PlayersState,
    grid_size: u32,
    positioning: Positioning,
}

pub struct SnakeGameMedia {
    game_id: String,
    initiator: bool,
    channel: GameChannelSocket,
    shared: Arc<Mutex<SnakeShared>>,
    ui: UiEvents,
}

impl SnakeGameMedia {
    /// Build the media object and open its channel. `positioning` is the
    /// server-known placement for games discovered at join time; freshly
    /// initiated games take the default.
    pub fn new(
        endpoints: &Endpoints,
        identity: &SessionIdentity,
        game_id: impl Into<String>,
        initiator: bool,
        positioning: Option<Positioning>,
        ui: UiEvents,
    ) -> Self {
        let game_id = game_id.into();
        let url = endpoints.game_channel_url(identity, GameKind::Snake, &game_id);
        let channel = GameChannelSocket::new(url, identity.clone(), GameKind::Snake, &game_id);

        let shared = Arc::new(Mutex::new(SnakeShared {
            phase: GamePhase::NotStarted,
            players_state: PlayersState::new(),
            grid_size: DEFAULT_GRID_SIZE,
            positioning: positioning.unwrap_or_default(),
        }));

        let state = Arc::clone(&shared);
        let events = ui.clone();
        channel.add_listener(move |message| {
            Self::on_channel_message(&state, &events, message);
        });
        channel.connect();

        Self {
            game_id,
            initiator,
            channel,
            shared,
            ui,
        }
    }

    fn on_channel_message(
        shared: &Arc<Mutex<SnakeShared>>,
        ui: &UiEvents,
        message: &IncomingGameMessage,
    ) {
        let mut state = lock(shared);
        match message {
            IncomingGameMessage::GameStarted => {
                state.phase = GamePhase::Started;
            }
            IncomingGameMessage::GameOver => {
                state.phase = GamePhase::Over;
            }
            IncomingGameMessage::GameStateUpdate { .. } => {
                // Board contents render elsewhere; a redraw is all we owe.
            }
            IncomingGameMessage::PlayersStateUpdated { data } => {
                state.players_state = data.players_state.clone();
            }
            IncomingGameMessage::GridSizeChanged { data } => {
                state.grid_size = data.grid_size;
            }
            IncomingGameMessage::InitialGameStatesReturned { data } => {
                state.phase = if data.game_over {
                    GamePhase::Over
                } else if data.started {
                    GamePhase::Started
                } else {
                    GamePhase::NotStarted
                };
                state.players_state = data.players_state.clone();
            }
            IncomingGameMessage::Unknown => return,
        }
        drop(state);
        ui.rerender();
    }

    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    pub fn initiator(&self) -> bool {
        self.initiator
    }

    pub fn phase(&self) -> GamePhase {
        lock(&self.shared).phase
    }

    pub fn grid_size(&self) -> u32 {
        lock(&self.shared).grid_size
    }

    pub fn players_state(&self) -> PlayersState {
        lock(&self.shared).players_state.clone()
    }

    pub fn positioning(&self) -> Positioning {
        lock(&self.shared).positioning
    }

    pub fn set_positioning(&self, positioning: Positioning) {
        lock(&self.shared).positioning = positioning;
    }

    pub fn apply_positioning(&self, update: &PositioningUpdate) {
        lock(&self.shared).positioning.apply(update);
    }

    pub fn channel(&self) -> &GameChannelSocket {
        &self.channel
    }

    pub fn start_game(&self) {
        self.channel.start_game();
    }

    pub fn close_game(&self) {
        self.channel.close_game();
    }

    pub fn join_game(&self, snake_color: Option<&str>) {
        self.channel.join_game(snake_color);
    }

    pub fn leave_game(&self) {
        self.channel.leave_game();
    }

    pub fn snake_direction_change(&self, direction: SnakeDirection) {
        self.channel.snake_direction_change(direction);
    }

    pub fn change_grid_size(&self, grid_size: u32) {
        self.channel.change_grid_size(grid_size);
    }

    pub fn change_snake_color(&self, new_snake_color: &str) {
        self.channel.change_snake_color(new_snake_color);
    }

    /// Tear down the channel and mark the game closed. Runs when the
    /// registry entry is deleted; safe to run more than once.
    pub fn destroy(&mut self) {
        self.channel.teardown();
        lock(&self.shared).phase = GamePhase::Closed;
        self.ui.rerender();
    }
}
