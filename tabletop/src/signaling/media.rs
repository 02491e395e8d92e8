//! The media (WebRTC transport) signaling channel.
//!
//! Transport negotiation itself lives behind the capability seams in
//! [`crate::rtc`]; this channel only carries the control messages that
//! drive it. Producer and consumer lifecycle notifications keep their
//! payloads opaque since only the capability layer interprets them.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::entities::{PeerRef, SessionIdentity};
use crate::signaling::socket::{ListenerId, SocketController, TransportState};

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaHeader {
    pub table_id: String,
    pub username: String,
    pub instance: String,
}

impl From<&SessionIdentity> for MediaHeader {
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
pub struct RemoveProducerHeader {
    pub table_id: String,
    pub username: String,
    pub instance: String,
    pub producer_type: String,
    pub data_stream_type: String,
}

/// Messages sent up the media channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutgoingMediaMessage {
    Unsubscribe { header: MediaHeader },
    RemoveProducer { header: RemoveProducerHeader },
    CreateConsumerTransport { header: MediaHeader },
    CreateProducerTransport { header: MediaHeader },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterCapabilitiesData {
    pub router_rtp_capabilities: serde_json::Value,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewConsumerHeader {
    pub username: String,
    pub instance: String,
}

impl NewConsumerHeader {
    pub fn peer(&self) -> PeerRef {
        PeerRef::new(self.username.clone(), self.instance.clone())
    }
}

/// Messages pushed down the media channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum IncomingMediaMessage {
    RouterCapabilities {
        data: RouterCapabilitiesData,
    },
    NewConsumerWasCreated {
        header: NewConsumerHeader,
        data: serde_json::Value,
    },
    #[serde(other)]
    Unknown,
}

/// Controller for the media signaling channel of one session.
pub struct MediaSocket {
    identity: SessionIdentity,
    socket: Arc<SocketController<IncomingMediaMessage, OutgoingMediaMessage>>,
}

impl MediaSocket {
    pub fn new(url: impl Into<String>, identity: SessionIdentity) -> Self {
        Self {
            socket: Arc::new(SocketController::new(url)),
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
        listener: impl Fn(&IncomingMediaMessage) + Send + Sync + 'static,
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

    fn header(&self) -> MediaHeader {
        MediaHeader::from(&self.identity)
    }

    pub fn unsubscribe(&self) {
        self.socket.send(&OutgoingMediaMessage::Unsubscribe {
            header: self.header(),
        });
    }

    /// Announce removal of the local position/scale/rotation data producer.
    pub fn remove_positioning_producer(&self) {
        self.socket.send(&OutgoingMediaMessage::RemoveProducer {
            header: RemoveProducerHeader {
                table_id: self.identity.table_id.clone(),
                username: self.identity.username.clone(),
                instance: self.identity.instance.clone(),
                producer_type: "json".to_string(),
                data_stream_type: "positionScaleRotation".to_string(),
            },
        });
    }

    pub fn create_consumer_transport(&self) {
        self.socket.send(&OutgoingMediaMessage::CreateConsumerTransport {
            header: self.header(),
        });
    }

    pub fn create_producer_transport(&self) {
        self.socket.send(&OutgoingMediaMessage::CreateProducerTransport {
            header: self.header(),
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
