//! # Tabletop
//!
//! Session and signaling core for a multi-user virtual table client.
//!
//! A table is a shared surface users join to share cameras, screens,
//! audio, uploaded content, and embedded games. Each concern is served by
//! its own WebSocket signaling server; this crate owns the client side of
//! those channels and the state they drive.
//!
//! ## Architecture
//!
//! One [`session::SessionOrchestrator`] manages the lifecycle of a joined
//! table. On join it opens six per-concern channels:
//!
//! - **Table**: membership, seating, backgrounds, reactions
//! - **Games signaling**: game lifecycle for the whole table
//! - **Media**: WebRTC transport negotiation (mediasoup-style)
//! - **Static content**: image/svg/text upload notifications
//! - **Video**: video upload notifications
//! - **Live text**: collaborative text editing operations
//!
//! All channels share one wire format, JSON envelopes with a `type` tag
//! and optional `header`/`data` payloads, and one transport controller,
//! [`signaling::socket::SocketController`]. Media and content resources
//! live in registries ([`media::MediaState`]) whose entries are released
//! exactly once before deletion. Embedded games get a per-game channel
//! and media object ([`games::snake::SnakeGameMedia`]) plus an input and
//! placement controller ([`games::controller::GameController`]).
//!
//! ## Core Modules
//!
//! - [`session`]: join/leave orchestration across every channel
//! - [`signaling`]: per-concern socket controllers and wire messages
//! - [`media`]: registries owning media, content, and game resources
//! - [`games`]: embedded game sessions and their UI controller
//! - [`table_state`]: reducer over table membership pushes

pub mod config;
pub mod entities;
pub mod error;
pub mod games;
pub mod media;
pub mod positioning;
pub mod rtc;
pub mod session;
pub mod signaling;
pub mod table_state;
pub mod timing;

pub use config::Endpoints;
pub use entities::{ContentType, GameKind, PeerRef, SessionIdentity, TableColor};
pub use error::SignalError;
pub use media::{MediaState, SharedMedia, shared_media};
pub use positioning::{Position, Positioning, PositioningUpdate, Scale};
pub use rtc::{UiEvent, UiEvents};
pub use session::{SessionOrchestrator, SessionState};
pub use table_state::TableState;
