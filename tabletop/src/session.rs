//! Session orchestration: the lifecycle of one joined table.
//!
//! Owns every per-concern socket slot, the shared media registries, the
//! WebRTC transports, and the media-active flags, and enforces the
//! teardown order on leave: sockets go down first so no late server push
//! can repopulate a registry mid-teardown, then subscriptions, producers,
//! registries, flags, and transports, in that order.

use log::{debug, warn};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::config::Endpoints;
use crate::entities::{GameKind, SessionIdentity};
use crate::media::SharedMedia;
use crate::rtc::{CapabilitySink, DataProducer, MediaTransport, UiEvent, UiEvents, lock};
use crate::signaling::content::{
    BundleWatcher, IncomingStaticContentMessage, LiveTextSocket, StaticContentSocket, VideoSocket,
};
use crate::signaling::games::GamesSignalingSocket;
use crate::signaling::media::{IncomingMediaMessage, MediaSocket};
use crate::signaling::table::TableSocket;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionState {
    Idle,
    /// Sockets are constructed but the join is not yet announced.
    Joining,
    Joined,
}

#[derive(Default)]
struct Slots {
    table: Option<Arc<TableSocket>>,
    live_text: Option<Arc<LiveTextSocket>>,
    static_content: Option<Arc<StaticContentSocket>>,
    video: Option<Arc<VideoSocket>>,
    games: Option<Arc<GamesSignalingSocket>>,
    media: Option<Arc<MediaSocket>>,
}

struct SessionInner {
    endpoints: Endpoints,
    instance: String,
    identity: Option<SessionIdentity>,
    state: SessionState,
    slots: Slots,
    media: SharedMedia,
    ui: UiEvents,
    device: Box<dyn CapabilitySink>,
    consumer_transport: Option<Box<dyn MediaTransport>>,
    producer_transport: Option<Box<dyn MediaTransport>>,
    is_subscribed: bool,
    is_camera: bool,
    is_screen: bool,
    is_audio: bool,
    muted_audio: bool,
}

/// At most one active session per orchestrator.
pub struct SessionOrchestrator {
    inner: Arc<Mutex<SessionInner>>,
}

impl SessionOrchestrator {
    pub fn new(
        endpoints: Endpoints,
        media: SharedMedia,
        ui: UiEvents,
        device: Box<dyn CapabilitySink>,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionInner {
                endpoints,
                instance: Uuid::new_v4().to_string(),
                identity: None,
                state: SessionState::Idle,
                slots: Slots::default(),
                media,
                ui,
                device,
                consumer_transport: None,
                producer_transport: None,
                is_subscribed: false,
                is_camera: false,
                is_screen: false,
                is_audio: false,
                muted_audio: false,
            })),
        }
    }

    pub fn state(&self) -> SessionState {
        lock(&self.inner).state
    }

    pub fn is_joined(&self) -> bool {
        self.state() == SessionState::Joined
    }

    pub fn identity(&self) -> Option<SessionIdentity> {
        lock(&self.inner).identity.clone()
    }

    pub fn subscribed(&self) -> bool {
        lock(&self.inner).is_subscribed
    }

    pub fn table_socket(&self) -> Option<Arc<TableSocket>> {
        lock(&self.inner).slots.table.clone()
    }

    pub fn live_text_socket(&self) -> Option<Arc<LiveTextSocket>> {
        lock(&self.inner).slots.live_text.clone()
    }

    pub fn static_content_socket(&self) -> Option<Arc<StaticContentSocket>> {
        lock(&self.inner).slots.static_content.clone()
    }

    pub fn video_socket(&self) -> Option<Arc<VideoSocket>> {
        lock(&self.inner).slots.video.clone()
    }

    pub fn games_signaling(&self) -> Option<Arc<GamesSignalingSocket>> {
        lock(&self.inner).slots.games.clone()
    }

    pub fn media_socket(&self) -> Option<Arc<MediaSocket>> {
        lock(&self.inner).slots.media.clone()
    }

    /// Join a table, implicitly leaving any previous one. Rejoining the
    /// current (tableId, username) is a no-op; blank ids are ignored.
    pub fn join_table(&self, table_id: &str, username: &str) {
        let mut inner = lock(&self.inner);
        let table_id = table_id.trim();
        let username = username.trim();
        if table_id.is_empty() || username.is_empty() {
            warn!("ignoring join with blank table id or username");
            return;
        }
        if let Some(identity) = &inner.identity {
            if identity.table_id == table_id && identity.username == username {
                return;
            }
        }
        if inner.identity.is_some() {
            Self::leave_locked(&mut inner);
        }

        let identity = SessionIdentity::new(table_id, username, inner.instance.clone());
        debug!("joining table as {identity}");
        inner.state = SessionState::Joining;

        let table = Arc::new(TableSocket::new(
            inner.endpoints.table_url(&identity),
            identity.clone(),
        ));
        table.connect();
        inner.slots.table = Some(table);

        let live_text = Arc::new(LiveTextSocket::new(inner.endpoints.live_text_url(&identity)));
        live_text.connect();
        inner.slots.live_text = Some(live_text);

        let static_content = Arc::new(StaticContentSocket::new(
            inner.endpoints.static_content_url(&identity),
        ));
        let watcher = BundleWatcher::new(inner.ui.clone());
        let registries = Arc::clone(&inner.media);
        static_content.add_listener(move |message| {
            if let IncomingStaticContentMessage::ContentDeleted { header } = message {
                lock(&registries).static_content.remove(
                    header.content_type,
                    &header.content_id,
                    header.instance_id.as_deref(),
                );
            }
            watcher.on_static_content(message);
        });
        static_content.connect();
        inner.slots.static_content = Some(static_content);

        let video = Arc::new(VideoSocket::new(inner.endpoints.video_url(&identity)));
        let watcher = BundleWatcher::new(inner.ui.clone());
        video.add_listener(move |message| watcher.on_video(message));
        video.connect();
        inner.slots.video = Some(video);

        let games = Arc::new(GamesSignalingSocket::new(
            inner.endpoints.clone(),
            identity.clone(),
            Arc::clone(&inner.media),
            inner.ui.clone(),
        ));
        games.connect();
        inner.slots.games = Some(games);

        let media_socket = Arc::new(MediaSocket::new(
            inner.endpoints.media_url(&identity),
            identity.clone(),
        ));
        let session = Arc::downgrade(&self.inner);
        media_socket.add_listener(move |message| {
            if let IncomingMediaMessage::RouterCapabilities { data } = message {
                if let Some(inner) = session.upgrade() {
                    Self::on_router_capabilities(&inner, data.router_rtp_capabilities.clone());
                }
            }
        });
        media_socket.connect();
        inner.slots.media = Some(media_socket);

        inner.identity = Some(identity);
        inner.state = SessionState::Joined;
        inner.ui.emit(UiEvent::InTable(true));
        inner.ui.rerender();
    }

    /// Leave the current table. Idempotent: without an active session
    /// nothing is constructed, destroyed, or sent.
    pub fn leave_table(&self) {
        let mut inner = lock(&self.inner);
        if inner.identity.is_none() {
            debug!("leave requested with no active session");
            return;
        }
        Self::leave_locked(&mut inner);
    }

    fn leave_locked(inner: &mut SessionInner) {
        // Sockets first, so no late push can repopulate a registry while
        // the rest of the teardown runs. The notifications below still go
        // through the (now closed) media socket, where they are dropped.
        let table = inner.slots.table.take();
        let static_content = inner.slots.static_content.take();
        let media_socket = inner.slots.media.take();
        let live_text = inner.slots.live_text.take();
        let games = inner.slots.games.take();
        let video = inner.slots.video.take();
        if let Some(table) = &table {
            table.teardown();
        }
        if let Some(static_content) = &static_content {
            static_content.teardown();
        }
        if let Some(media_socket) = &media_socket {
            media_socket.teardown();
        }
        if let Some(live_text) = &live_text {
            live_text.teardown();
        }
        if let Some(games) = &games {
            games.teardown();
        }
        if let Some(video) = &video {
            video.teardown();
        }

        Self::unsubscribe_locked(inner, media_socket.as_deref());

        lock(&inner.media).data_streams.remove_positioning_producer();
        if let Some(media_socket) = &media_socket {
            media_socket.remove_positioning_producer();
        }

        lock(&inner.media).release_all();

        inner.ui.emit(UiEvent::ControlsEnabled(true));
        inner.device.reset();
        if let Some(mut transport) = inner.consumer_transport.take() {
            transport.close();
        }
        if let Some(mut transport) = inner.producer_transport.take() {
            transport.close();
        }
        inner.is_camera = false;
        inner.ui.emit(UiEvent::CameraActive(false));
        inner.is_screen = false;
        inner.ui.emit(UiEvent::ScreenActive(false));
        inner.is_audio = false;
        inner.ui.emit(UiEvent::AudioActive(false));
        inner.muted_audio = false;
        inner.ui.emit(UiEvent::AudioMuted(false));
        inner.is_subscribed = false;
        inner.ui.emit(UiEvent::InTable(false));
        inner.identity = None;
        inner.state = SessionState::Idle;
    }

    fn unsubscribe_locked(inner: &mut SessionInner, media_socket: Option<&MediaSocket>) {
        if !inner.is_subscribed {
            return;
        }
        inner.is_subscribed = false;
        if let Some(identity) = &inner.identity {
            lock(&inner.media)
                .remote
                .retain_only(&identity.username, &identity.instance);
        }
        if let Some(media_socket) = media_socket {
            media_socket.unsubscribe();
        }
    }

    /// Edge-triggered subscription toggle. Turning it off prunes the
    /// bundle map down to the local user and notifies the server;
    /// turning it on requests a consumer transport.
    pub fn toggle_subscription(&self) {
        let mut inner = lock(&self.inner);
        if inner.identity.is_none() {
            return;
        }
        if inner.is_subscribed {
            let media_socket = inner.slots.media.clone();
            Self::unsubscribe_locked(&mut inner, media_socket.as_deref());
        } else {
            inner.is_subscribed = true;
            if let Some(media_socket) = &inner.slots.media {
                media_socket.create_consumer_transport();
            }
        }
    }

    /// Capability handshake: load the router's capabilities into the
    /// device, then request both transports. Both fire once per message.
    fn on_router_capabilities(inner: &Arc<Mutex<SessionInner>>, capabilities: serde_json::Value) {
        let mut inner = lock(inner);
        // The read task snapshots listeners before invoking them, so a
        // frame can land here after leave has already run.
        if inner.identity.is_none() {
            return;
        }
        inner.device.load(capabilities);
        inner.is_subscribed = true;
        if let Some(media_socket) = &inner.slots.media {
            media_socket.create_consumer_transport();
            media_socket.create_producer_transport();
        }
    }

    pub fn set_consumer_transport(&self, transport: Box<dyn MediaTransport>) {
        let mut inner = lock(&self.inner);
        if let Some(mut old) = inner.consumer_transport.replace(transport) {
            old.close();
        }
    }

    pub fn set_producer_transport(&self, transport: Box<dyn MediaTransport>) {
        let mut inner = lock(&self.inner);
        if let Some(mut old) = inner.producer_transport.replace(transport) {
            old.close();
        }
    }

    /// Install the local position/scale/rotation data producer.
    pub fn set_positioning_producer(&self, producer: Box<dyn DataProducer>) {
        let inner = lock(&self.inner);
        lock(&inner.media)
            .data_streams
            .set_positioning_producer(producer);
    }

    pub fn set_camera_active(&self, active: bool) {
        let mut inner = lock(&self.inner);
        inner.is_camera = active;
        inner.ui.emit(UiEvent::CameraActive(active));
    }

    pub fn set_screen_active(&self, active: bool) {
        let mut inner = lock(&self.inner);
        inner.is_screen = active;
        inner.ui.emit(UiEvent::ScreenActive(active));
    }

    pub fn set_audio_active(&self, active: bool) {
        let mut inner = lock(&self.inner);
        inner.is_audio = active;
        inner.ui.emit(UiEvent::AudioActive(active));
    }

    pub fn toggle_mute(&self) {
        let mut inner = lock(&self.inner);
        inner.muted_audio = !inner.muted_audio;
        let muted = inner.muted_audio;
        inner.ui.emit(UiEvent::AudioMuted(muted));
    }

    /// Ask the games server for a fresh game; the registry entry appears
    /// when `gameInitiated` echoes back.
    pub fn initiate_game(&self, kind: GameKind) -> Option<String> {
        lock(&self.inner)
            .slots
            .games
            .as_ref()
            .map(|games| games.initiate_game(kind))
    }
}
