//! Static content, video, and live text editing channels.
//!
//! These three concerns share a pattern: the server pushes upload/delete
//! notifications, the client updates its content registries and asks the
//! bundles to redraw. Upload itself happens out of band (HTTP), so the
//! outbound surface is small.
//!
//! Wire quirk: uploads addressed to a single table instance use the
//! historical `...Tabled` type names; variants here carry explicit
//! renames so the enum names can say what they mean.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::entities::ContentType;
use crate::rtc::UiEvents;
use crate::signaling::socket::{ListenerId, SocketController, TransportState};

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentHeader {
    pub content_type: ContentType,
    pub content_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
}

/// Messages sent up the static content channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutgoingStaticContentMessage {
    RequestCatchUpTableData,
}

/// Messages pushed down the static content channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum IncomingStaticContentMessage {
    ResponsedCatchUpTableData {
        data: serde_json::Value,
    },
    ImageUploadedToTable {
        header: ContentHeader,
    },
    #[serde(rename = "imageUploadedToTabled")]
    ImageUploadedToTableInstance {
        header: ContentHeader,
    },
    SvgUploadedToTable {
        header: ContentHeader,
    },
    #[serde(rename = "svgUploadedToTabled")]
    SvgUploadedToTableInstance {
        header: ContentHeader,
    },
    TextUploadedToTable {
        header: ContentHeader,
    },
    #[serde(rename = "textUploadedToTabled")]
    TextUploadedToTableInstance {
        header: ContentHeader,
    },
    ContentReuploaded {
        header: ContentHeader,
    },
    ContentDeleted {
        header: ContentHeader,
    },
    CreatedNewInstances {
        data: serde_json::Value,
    },
    #[serde(other)]
    Unknown,
}

/// Messages pushed down the video channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum IncomingVideoMessage {
    VideoUploadedToTable {
        header: ContentHeader,
    },
    #[serde(rename = "videoUploadedToTabled")]
    VideoUploadedToTableInstance {
        header: ContentHeader,
    },
    #[serde(other)]
    Unknown,
}

/// Controller for the static content channel. Asks the server to catch
/// the client up on existing table content as soon as it opens.
pub struct StaticContentSocket {
    socket: Arc<SocketController<IncomingStaticContentMessage, OutgoingStaticContentMessage>>,
}

impl StaticContentSocket {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            socket: Arc::new(
                SocketController::new(url)
                    .with_hello(OutgoingStaticContentMessage::RequestCatchUpTableData),
            ),
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
        listener: impl Fn(&IncomingStaticContentMessage) + Send + Sync + 'static,
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
}

/// Controller for the video channel. Receive-only.
pub struct VideoSocket {
    socket: Arc<SocketController<IncomingVideoMessage, serde_json::Value>>,
}

impl VideoSocket {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            socket: Arc::new(SocketController::new(url)),
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
        listener: impl Fn(&IncomingVideoMessage) + Send + Sync + 'static,
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
}

/// Controller for the collaborative text editing channel. Frames are
/// editor operations interpreted by the text layer, so both directions
/// stay untyped here.
pub struct LiveTextSocket {
    socket: Arc<SocketController<serde_json::Value, serde_json::Value>>,
}

impl LiveTextSocket {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            socket: Arc::new(SocketController::new(url)),
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
        listener: impl Fn(&serde_json::Value) + Send + Sync + 'static,
    ) -> ListenerId {
        self.socket.add_listener(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) {
        self.socket.remove_listener(id);
    }

    pub fn send(&self, operation: &serde_json::Value) {
        self.socket.send(operation);
    }

    pub fn deliver_frame(&self, raw: &str) {
        self.socket.deliver_frame(raw);
    }

    pub fn teardown(&self) {
        self.socket.teardown();
    }
}

/// Bridges content notifications into bundle redraws. Every bundle shows
/// the same shared content, so any upload/delete on any channel asks the
/// UI for one rerender.
#[derive(Clone)]
pub struct BundleWatcher {
    ui: UiEvents,
}

impl BundleWatcher {
    pub fn new(ui: UiEvents) -> Self {
        Self { ui }
    }

    pub fn on_static_content(&self, message: &IncomingStaticContentMessage) {
        if !matches!(message, IncomingStaticContentMessage::Unknown) {
            self.ui.rerender();
        }
    }

    pub fn on_video(&self, message: &IncomingVideoMessage) {
        if !matches!(message, IncomingVideoMessage::Unknown) {
            self.ui.rerender();
        }
    }
}
