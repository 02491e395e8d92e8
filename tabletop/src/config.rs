//! Endpoint configuration for the per-concern signaling servers.
//!
//! Consolidates all environment variable reads and derives the per-session
//! WebSocket URLs (`wss://{host}:{port}/ws/{tableId}/{username}/{instance}`
//! plus a concern-specific subpath).

use crate::entities::{GameKind, SessionIdentity};

/// Host and port of one signaling server.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServerEndpoint {
    pub host: String,
    pub port: u16,
}

impl ServerEndpoint {
    fn base(&self, identity: &SessionIdentity) -> String {
        format!(
            "wss://{}:{}/ws/{}/{}/{}",
            self.host, self.port, identity.table_id, identity.username, identity.instance
        )
    }
}

/// Endpoints of every signaling server one session talks to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Endpoints {
    pub table: ServerEndpoint,
    pub games: ServerEndpoint,
    pub media: ServerEndpoint,
    pub static_content: ServerEndpoint,
    pub video: ServerEndpoint,
    pub live_text: ServerEndpoint,
}

impl Endpoints {
    /// Load endpoints from environment variables, falling back to local
    /// development defaults.
    pub fn from_env() -> Self {
        Self {
            table: endpoint_env("TABLE_SERVER", 7631),
            games: endpoint_env("GAMES_SERVER", 7890),
            media: endpoint_env("MEDIA_SERVER", 7445),
            static_content: endpoint_env("STATIC_CONTENT_SERVER", 7889),
            video: endpoint_env("VIDEO_SERVER", 7556),
            live_text: endpoint_env("LIVE_TEXT_SERVER", 7334),
        }
    }

    pub fn table_url(&self, identity: &SessionIdentity) -> String {
        self.table.base(identity)
    }

    pub fn games_signaling_url(&self, identity: &SessionIdentity) -> String {
        format!("{}/signaling", self.games.base(identity))
    }

    pub fn game_channel_url(
        &self,
        identity: &SessionIdentity,
        game_type: GameKind,
        game_id: &str,
    ) -> String {
        format!("{}/games/{game_type}/{game_id}", self.games.base(identity))
    }

    pub fn media_url(&self, identity: &SessionIdentity) -> String {
        self.media.base(identity)
    }

    pub fn static_content_url(&self, identity: &SessionIdentity) -> String {
        self.static_content.base(identity)
    }

    pub fn video_url(&self, identity: &SessionIdentity) -> String {
        self.video.base(identity)
    }

    pub fn live_text_url(&self, identity: &SessionIdentity) -> String {
        self.live_text.base(identity)
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::from_env()
    }
}

fn endpoint_env(prefix: &str, default_port: u16) -> ServerEndpoint {
    ServerEndpoint {
        host: std::env::var(format!("{prefix}_HOST")).unwrap_or_else(|_| "localhost".to_string()),
        port: parse_env_or(&format!("{prefix}_PORT"), default_port),
    }
}

/// Helper to parse an environment variable with a default fallback.
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
