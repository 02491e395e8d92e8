//! Identity and content classification types shared across channels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One joined client, identified by table, username, and instance. The
/// instance distinguishes simultaneous connections for the same username
/// (multiple tabs or devices).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionIdentity {
    pub table_id: String,
    pub username: String,
    pub instance: String,
}

impl SessionIdentity {
    pub fn new(
        table_id: impl Into<String>,
        username: impl Into<String>,
        instance: impl Into<String>,
    ) -> Self {
        Self {
            table_id: table_id.into(),
            username: username.into(),
            instance: instance.into(),
        }
    }
}

impl fmt::Display for SessionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}/{}", self.table_id, self.username, self.instance)
    }
}

/// A (username, instance) pair referring to some table occupant.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerRef {
    pub username: String,
    pub instance: String,
}

impl PeerRef {
    pub fn new(username: impl Into<String>, instance: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            instance: instance.into(),
        }
    }
}

/// Every kind of content that can live on the table surface or be the
/// target of a reaction.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentType {
    Camera,
    Screen,
    ScreenAudio,
    Audio,
    Application,
    Image,
    SoundClip,
    Svg,
    Text,
    Video,
    Games,
}

/// The sealed set of embedded game types.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameKind {
    Snake,
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Snake => "snake",
        };
        write!(f, "{repr}")
    }
}

/// Seat marker colors assignable to table occupants.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TableColor {
    Cyan,
    Orange,
    Blue,
    Green,
    Yellow,
    Purple,
    Pink,
    Black,
    White,
    Brown,
    Lime,
    Coral,
    Gray,
    Navy,
    LightBlue,
    TableTop,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_kind_wire_name() {
        assert_eq!(serde_json::to_string(&GameKind::Snake).unwrap(), "\"snake\"");
        assert_eq!(GameKind::Snake.to_string(), "snake");
    }

    #[test]
    fn test_content_type_camel_case_names() {
        assert_eq!(
            serde_json::to_string(&ContentType::ScreenAudio).unwrap(),
            "\"screenAudio\""
        );
        assert_eq!(
            serde_json::to_string(&ContentType::SoundClip).unwrap(),
            "\"soundClip\""
        );
    }

    #[test]
    fn test_table_color_camel_case_names() {
        assert_eq!(
            serde_json::to_string(&TableColor::LightBlue).unwrap(),
            "\"lightBlue\""
        );
        let back: TableColor = serde_json::from_str("\"tableTop\"").unwrap();
        assert_eq!(back, TableColor::TableTop);
    }

    #[test]
    fn test_session_identity_display() {
        let identity = SessionIdentity::new("t1", "alice", "i1");
        assert_eq!(identity.to_string(), "t1/alice/i1");
    }
}
