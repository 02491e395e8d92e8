//! Seams to the WebRTC capability layer and the UI.
//!
//! The media pipeline (device capability negotiation, transports, data
//! producers/consumers) and the rendering layer are external collaborators.
//! This module defines the narrow traits and handles the session core uses
//! to talk to them, so everything here can be faked in tests.

use log::debug;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tokio::sync::mpsc;

/// Lock a mutex, recovering the inner state if a holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── UI events ───────────────────────────────────────────────────────

/// State changes the rendering layer mirrors. The session core never
/// draws anything; it emits these and moves on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UiEvent {
    Rerender,
    InTable(bool),
    ControlsEnabled(bool),
    CameraActive(bool),
    ScreenActive(bool),
    AudioActive(bool),
    AudioMuted(bool),
    GameControlsHidden { game_id: String, hidden: bool },
    AdjustmentButtonsActive { game_id: String, active: bool },
    SidePanelActive(bool),
}

/// Cloneable emitter for [`UiEvent`]s. Emission never fails; if the
/// receiving side is gone the event is dropped.
#[derive(Clone)]
pub struct UiEvents {
    sender: mpsc::UnboundedSender<UiEvent>,
}

impl UiEvents {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<UiEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// An emitter whose events go nowhere. For headless use.
    pub fn disconnected() -> Self {
        let (events, _receiver) = Self::channel();
        events
    }

    pub fn emit(&self, event: UiEvent) {
        let _ = self.sender.send(event);
    }

    pub fn rerender(&self) {
        self.emit(UiEvent::Rerender);
    }
}

// ── Device capabilities ─────────────────────────────────────────────

/// The mediasoup device capability object. `routerCapabilities` payloads
/// are loaded into it before any transport is requested.
pub trait CapabilitySink: Send {
    fn load(&mut self, capabilities: serde_json::Value);
    fn reset(&mut self);
    fn is_loaded(&self) -> bool;
}

/// Capability sink that just retains the last loaded payload.
#[derive(Debug, Default)]
pub struct StoredCapabilities {
    capabilities: Option<serde_json::Value>,
}

impl CapabilitySink for StoredCapabilities {
    fn load(&mut self, capabilities: serde_json::Value) {
        self.capabilities = Some(capabilities);
    }

    fn reset(&mut self) {
        self.capabilities = None;
    }

    fn is_loaded(&self) -> bool {
        self.capabilities.is_some()
    }
}

// ── Transports and data streams ─────────────────────────────────────

/// A live WebRTC transport. The session only ever closes it.
pub trait MediaTransport: Send {
    fn close(&mut self);
}

/// The sending half of a peer data channel owned by the local user.
pub trait DataProducer: Send {
    fn is_open(&self) -> bool;
    fn send_text(&self, text: &str);
    fn close(&mut self);
}

/// [`DataProducer`] backed by an unbounded channel. Doubles as the test
/// double and as glue for hosts that forward frames themselves.
pub struct ChannelDataProducer {
    sender: mpsc::UnboundedSender<String>,
    open: bool,
}

impl ChannelDataProducer {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender, open: true }, receiver)
    }
}

impl DataProducer for ChannelDataProducer {
    fn is_open(&self) -> bool {
        self.open
    }

    fn send_text(&self, text: &str) {
        if self.open {
            let _ = self.sender.send(text.to_string());
        }
    }

    fn close(&mut self) {
        self.open = false;
    }
}

/// Message handler attached to a remote peer's data stream.
pub type StreamHandler = Arc<dyn Fn(&str) + Send + Sync>;

struct StreamInner {
    next_id: u64,
    handlers: Vec<(u64, StreamHandler)>,
}

/// The receiving side of one remote peer's data channel. Consumer glue
/// pushes incoming frames in with [`RemoteDataStream::deliver`]; local
/// subscribers attach handlers that are detached through the returned
/// [`StreamSubscription`].
#[derive(Clone)]
pub struct RemoteDataStream {
    inner: Arc<Mutex<StreamInner>>,
}

impl RemoteDataStream {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(StreamInner {
                next_id: 0,
                handlers: Vec::new(),
            })),
        }
    }

    pub fn attach(&self, handler: StreamHandler) -> StreamSubscription {
        let mut inner = lock(&self.inner);
        let id = inner.next_id;
        inner.next_id += 1;
        inner.handlers.push((id, handler));
        StreamSubscription {
            inner: Arc::downgrade(&self.inner),
            id,
        }
    }

    pub fn handler_count(&self) -> usize {
        lock(&self.inner).handlers.len()
    }

    /// Deliver one raw frame to every attached handler, in attach order.
    pub fn deliver(&self, text: &str) {
        let handlers: Vec<StreamHandler> = lock(&self.inner)
            .handlers
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();
        for handler in handlers {
            handler(text);
        }
    }
}

impl Default for RemoteDataStream {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for one attached stream handler. Detaches the exact handler it
/// was created for, on [`StreamSubscription::detach`] or on drop.
pub struct StreamSubscription {
    inner: Weak<Mutex<StreamInner>>,
    id: u64,
}

impl StreamSubscription {
    pub fn detach(&self) {
        if let Some(inner) = self.inner.upgrade() {
            lock(&inner).handlers.retain(|(id, _)| *id != self.id);
        } else {
            debug!("stream already gone, nothing to detach");
        }
    }
}

impl Drop for StreamSubscription {
    fn drop(&mut self) {
        self.detach();
    }
}

// ── Reactions ───────────────────────────────────────────────────────

/// Plays reaction effects addressed to a piece of content. Rendering of
/// the effect is out of scope; the session only forwards.
pub trait ReactionSink: Send {
    fn play(&mut self, reaction: &str, style: &str);
}

/// Reaction sink that discards everything.
#[derive(Debug, Default)]
pub struct NoopReactionSink;

impl ReactionSink for NoopReactionSink {
    fn play(&mut self, _reaction: &str, _style: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_stream_handlers_fire_in_attach_order() {
        let stream = RemoteDataStream::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let first = Arc::clone(&order);
        let _sub_a = stream.attach(Arc::new(move |_| lock(&first).push("a")));
        let second = Arc::clone(&order);
        let _sub_b = stream.attach(Arc::new(move |_| lock(&second).push("b")));

        stream.deliver("x");
        assert_eq!(*lock(&order), vec!["a", "b"]);
    }

    #[test]
    fn test_subscription_detach_removes_only_its_handler() {
        let stream = RemoteDataStream::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counted = Arc::clone(&hits);
        let sub = stream.attach(Arc::new(move |_| {
            counted.fetch_add(1, Ordering::SeqCst);
        }));
        let counted = Arc::clone(&hits);
        let _kept = stream.attach(Arc::new(move |_| {
            counted.fetch_add(1, Ordering::SeqCst);
        }));

        sub.detach();
        sub.detach(); // second detach is a no-op
        stream.deliver("x");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(stream.handler_count(), 1);
    }

    #[test]
    fn test_subscription_detaches_on_drop() {
        let stream = RemoteDataStream::new();
        {
            let _sub = stream.attach(Arc::new(|_| {}));
            assert_eq!(stream.handler_count(), 1);
        }
        assert_eq!(stream.handler_count(), 0);
    }

    #[test]
    fn test_closed_data_producer_drops_sends() {
        let (mut producer, mut receiver) = ChannelDataProducer::new();
        producer.send_text("one");
        producer.close();
        producer.send_text("two");
        assert_eq!(receiver.try_recv().unwrap(), "one");
        assert!(receiver.try_recv().is_err());
    }
}
