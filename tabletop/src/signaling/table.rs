//! The table membership channel.
//!
//! Carries seating, presence, background, and reaction traffic for one
//! table. The controller announces itself with `joinTable` as soon as the
//! transport opens.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::{ContentType, SessionIdentity, TableColor};
use crate::signaling::socket::{ListenerId, SocketController, TransportState};

/// Header naming the session a table message is about.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionHeader {
    pub table_id: String,
    pub username: String,
    pub instance: String,
}

impl From<&SessionIdentity> for SessionHeader {
    fn from(identity: &SessionIdentity) -> Self {
        Self {
            table_id: identity.table_id.clone(),
            username: identity.username.clone(),
            instance: identity.instance.clone(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatMoveHeader {
    pub table_id: String,
    pub username: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetHeader {
    pub table_id: String,
    pub username: String,
    pub target_username: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionHeader {
    pub table_id: String,
    pub content_type: ContentType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionData {
    pub reaction: String,
    pub reaction_style: String,
}

/// Which way occupants shuffle around the table.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatDirection {
    Left,
    Right,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundData {
    pub background: serde_json::Value,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveSeatsData {
    pub direction: SeatDirection,
}

/// Messages sent up the table channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutgoingTableMessage {
    JoinTable {
        header: SessionHeader,
    },
    LeaveTable {
        header: SessionHeader,
    },
    ChangeTableBackground {
        header: SessionHeader,
        data: BackgroundData,
    },
    MoveSeats {
        header: SeatMoveHeader,
        data: MoveSeatsData,
    },
    SwapSeats {
        header: TargetHeader,
    },
    KickFromTable {
        header: TargetHeader,
    },
    Reaction {
        header: ReactionHeader,
        data: ReactionData,
    },
}

/// One occupant as the server reports them.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableUser {
    pub color: TableColor,
    pub seat: u32,
    pub online: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDataPayload {
    pub user_data: HashMap<String, TableUser>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLeftHeader {
    pub username: String,
    pub online: bool,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatsSwappedData {
    pub username: String,
    pub target_username: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KickedData {
    pub target_username: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionOccurredHeader {
    pub content_type: ContentType,
    #[serde(default)]
    pub content_id: Option<String>,
    #[serde(default)]
    pub instance_id: Option<String>,
}

/// Messages pushed down the table channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum IncomingTableMessage {
    TableBackgroundChanged {
        data: BackgroundData,
    },
    UserJoinedTable {
        data: UserDataPayload,
    },
    UserLeftTable {
        header: UserLeftHeader,
    },
    SeatsMoved {
        data: UserDataPayload,
    },
    SeatsSwapped {
        data: SeatsSwappedData,
    },
    KickedFromTable {
        data: KickedData,
    },
    ReactionOccurred {
        header: ReactionOccurredHeader,
        data: ReactionData,
    },
    #[serde(other)]
    Unknown,
}

/// Controller for the table channel of one session.
pub struct TableSocket {
    identity: SessionIdentity,
    socket: Arc<SocketController<IncomingTableMessage, OutgoingTableMessage>>,
}

impl TableSocket {
    /// Build the controller; `joinTable` goes out automatically on open.
    pub fn new(url: impl Into<String>, identity: SessionIdentity) -> Self {
        let hello = OutgoingTableMessage::JoinTable {
            header: SessionHeader::from(&identity),
        };
        Self {
            socket: Arc::new(SocketController::new(url).with_hello(hello)),
            identity,
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
        listener: impl Fn(&IncomingTableMessage) + Send + Sync + 'static,
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

    fn session_header(&self) -> SessionHeader {
        SessionHeader::from(&self.identity)
    }

    pub fn join_table(&self) {
        self.socket.send(&OutgoingTableMessage::JoinTable {
            header: self.session_header(),
        });
    }

    pub fn leave_table(&self) {
        self.socket.send(&OutgoingTableMessage::LeaveTable {
            header: self.session_header(),
        });
    }

    pub fn change_table_background(&self, background: serde_json::Value) {
        self.socket.send(&OutgoingTableMessage::ChangeTableBackground {
            header: self.session_header(),
            data: BackgroundData { background },
        });
    }

    pub fn move_seats(&self, direction: SeatDirection, username: &str) {
        self.socket.send(&OutgoingTableMessage::MoveSeats {
            header: SeatMoveHeader {
                table_id: self.identity.table_id.clone(),
                username: username.to_string(),
            },
            data: MoveSeatsData { direction },
        });
    }

    /// Swapping with yourself is a no-op.
    pub fn swap_seats(&self, target_username: &str) {
        if target_username == self.identity.username {
            return;
        }
        self.socket.send(&OutgoingTableMessage::SwapSeats {
            header: TargetHeader {
                table_id: self.identity.table_id.clone(),
                username: self.identity.username.clone(),
                target_username: target_username.to_string(),
            },
        });
    }

    /// Kicking yourself is a no-op.
    pub fn kick_from_table(&self, target_username: &str) {
        if target_username == self.identity.username {
            return;
        }
        self.socket.send(&OutgoingTableMessage::KickFromTable {
            header: TargetHeader {
                table_id: self.identity.table_id.clone(),
                username: self.identity.username.clone(),
                target_username: target_username.to_string(),
            },
        });
    }

    pub fn reaction(
        &self,
        content_type: ContentType,
        reaction: &str,
        reaction_style: &str,
        content_id: Option<&str>,
        instance_id: Option<&str>,
    ) {
        self.socket.send(&OutgoingTableMessage::Reaction {
            header: ReactionHeader {
                table_id: self.identity.table_id.clone(),
                content_type,
                content_id: content_id.map(str::to_string),
                instance_id: instance_id.map(str::to_string),
            },
            data: ReactionData {
                reaction: reaction.to_string(),
                reaction_style: reaction_style.to_string(),
            },
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> SessionIdentity {
        SessionIdentity::new("t1", "alice", "i1")
    }

    #[test]
    fn test_join_table_wire_shape() {
        let message = OutgoingTableMessage::JoinTable {
            header: SessionHeader::from(&identity()),
        };
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["type"], "joinTable");
        assert_eq!(json["header"]["tableId"], "t1");
        assert_eq!(json["header"]["username"], "alice");
        assert_eq!(json["header"]["instance"], "i1");
    }

    #[test]
    fn test_reaction_omits_absent_targets() {
        let message = OutgoingTableMessage::Reaction {
            header: ReactionHeader {
                table_id: "t1".to_string(),
                content_type: ContentType::Games,
                content_id: Some("g1".to_string()),
                instance_id: None,
            },
            data: ReactionData {
                reaction: "wave".to_string(),
                reaction_style: "burst".to_string(),
            },
        };
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["header"]["contentType"], "games");
        assert_eq!(json["header"]["contentId"], "g1");
        assert!(json["header"].get("instanceId").is_none());
        assert_eq!(json["data"]["reactionStyle"], "burst");
    }

    #[test]
    fn test_user_joined_table_parses_user_map() {
        let raw = r#"{
            "type": "userJoinedTable",
            "data": {"userData": {"alice": {"color": "cyan", "seat": 1, "online": true}}}
        }"#;
        let message: IncomingTableMessage = serde_json::from_str(raw).unwrap();
        let IncomingTableMessage::UserJoinedTable { data } = message else {
            panic!("wrong variant");
        };
        let alice = &data.user_data["alice"];
        assert_eq!(alice.color, TableColor::Cyan);
        assert_eq!(alice.seat, 1);
        assert!(alice.online);
    }

    #[test]
    fn test_self_swap_and_self_kick_send_nothing() {
        let table = TableSocket::new("wss://example:1/ws/t1/alice/i1", identity());
        // Never-connected controller: a send would be dropped anyway, but
        // the guard must short-circuit before serialization.
        table.swap_seats("alice");
        table.kick_from_table("alice");
        assert_eq!(table.state(), TransportState::Connecting);
    }

    #[test]
    fn test_unknown_incoming_type_is_tolerated() {
        let message: IncomingTableMessage =
            serde_json::from_str(r#"{"type":"brandNew","data":{}}"#).unwrap();
        assert_eq!(message, IncomingTableMessage::Unknown);
    }
}
