//! Generic WebSocket controller underlying every signaling channel.
//!
//! One controller owns one connection: a background read task that parses
//! incoming JSON frames and fans them out to registered listeners, and a
//! write task fed through an unbounded channel. Controllers are created in
//! the `Connecting` state and become `Open` once the handshake completes;
//! sends in any other state are silently dropped. There is no reconnect
//! logic here: when a transport dies, the caller re-joins the session.

use futures_util::{SinkExt, StreamExt};
use log::{debug, error, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::error::SignalError;
use crate::rtc::lock;

/// Lifecycle of the underlying transport.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TransportState {
    Connecting,
    Open,
    Closed,
}

/// Identifies one registered listener so removal can never miss.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ListenerId(u64);

type Handler<In> = Arc<dyn Fn(&In) + Send + Sync>;

struct Shared<In> {
    state: TransportState,
    outbound: Option<mpsc::UnboundedSender<Message>>,
    listeners: Vec<(ListenerId, Handler<In>)>,
    next_listener_id: u64,
    default_handler: Option<Handler<In>>,
    torn_down: bool,
}

/// One duplex signaling channel with typed incoming (`In`) and outgoing
/// (`Out`) messages.
pub struct SocketController<In, Out> {
    url: String,
    hello: Option<Out>,
    shared: Arc<Mutex<Shared<In>>>,
    read_task: Mutex<Option<JoinHandle<()>>>,
}

impl<In, Out> SocketController<In, Out>
where
    In: DeserializeOwned + Send + 'static,
    Out: Serialize + Send + Sync + 'static,
{
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            hello: None,
            shared: Arc::new(Mutex::new(Shared {
                state: TransportState::Connecting,
                outbound: None,
                listeners: Vec::new(),
                next_listener_id: 0,
                default_handler: None,
                torn_down: false,
            })),
            read_task: Mutex::new(None),
        }
    }

    /// Announce message sent as soon as the transport opens.
    pub fn with_hello(mut self, hello: Out) -> Self {
        self.hello = Some(hello);
        self
    }

    /// Internal handler that runs before listener fan-out, for lifecycle
    /// messages the channel itself owns.
    pub fn with_default_handler(self, handler: impl Fn(&In) + Send + Sync + 'static) -> Self {
        lock(&self.shared).default_handler = Some(Arc::new(handler));
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> TransportState {
        lock(&self.shared).state
    }

    /// Open the transport and start the read/write tasks. A controller
    /// torn down mid-handshake drops the fresh connection on the floor.
    pub async fn connect(&self) -> Result<(), SignalError> {
        let (ws, _) = connect_async(self.url.as_str())
            .await
            .map_err(|source| SignalError::Connect {
                url: self.url.clone(),
                source,
            })?;
        let (mut sink, mut stream) = ws.split();
        let (sender, mut receiver) = mpsc::unbounded_channel::<Message>();

        {
            let mut shared = lock(&self.shared);
            if shared.torn_down {
                debug!("torn down during handshake, discarding {}", self.url);
                return Ok(());
            }
            shared.outbound = Some(sender);
            shared.state = TransportState::Open;
        }

        tokio::spawn(async move {
            while let Some(message) = receiver.recv().await {
                if sink.send(message).await.is_err() {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        if let Some(hello) = &self.hello {
            self.send(hello);
        }

        let shared = Arc::clone(&self.shared);
        let url = self.url.clone();
        let read_task = tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                match frame {
                    Ok(Message::Text(text)) => Self::dispatch(&shared, &text),
                    Ok(Message::Binary(bytes)) => match std::str::from_utf8(&bytes) {
                        Ok(text) => Self::dispatch(&shared, text),
                        Err(err) => warn!("discarding non-utf8 binary frame: {err}"),
                    },
                    Ok(Message::Close(_)) => break,
                    Err(err) => {
                        warn!("transport error on {url}: {err}");
                        break;
                    }
                    _ => {}
                }
            }
            let mut shared = lock(&shared);
            shared.state = TransportState::Closed;
            shared.outbound = None;
        });
        *lock(&self.read_task) = Some(read_task);

        Ok(())
    }

    /// Connect in the background. Connection failures are logged, not
    /// surfaced; the transport just never reaches `Open`.
    pub fn spawn_connect(self: &Arc<Self>) {
        let controller = Arc::clone(self);
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(async move {
                if let Err(err) = controller.connect().await {
                    warn!("{err}");
                    lock(&controller.shared).state = TransportState::Closed;
                }
            });
        } else {
            debug!("no runtime, leaving {} unconnected", self.url);
        }
    }

    /// Register a listener; it sees every parsed message in registration
    /// order. Returns the id to remove exactly this listener later.
    pub fn add_listener(&self, listener: impl Fn(&In) + Send + Sync + 'static) -> ListenerId {
        let mut shared = lock(&self.shared);
        let id = ListenerId(shared.next_listener_id);
        shared.next_listener_id += 1;
        shared.listeners.push((id, Arc::new(listener)));
        id
    }

    /// Remove one listener. Unknown ids are a no-op.
    pub fn remove_listener(&self, id: ListenerId) {
        lock(&self.shared)
            .listeners
            .retain(|(listener_id, _)| *listener_id != id);
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.shared).listeners.len()
    }

    /// Serialize and send `message` if the transport is open; otherwise
    /// drop it silently. Never queues, never errors.
    pub fn send(&self, message: &Out) {
        let shared = lock(&self.shared);
        if shared.state != TransportState::Open {
            debug!("dropping send on non-open transport {}", self.url);
            return;
        }
        let Some(outbound) = &shared.outbound else {
            return;
        };
        match serde_json::to_string(message) {
            Ok(text) => {
                let _ = outbound.send(Message::Text(text.into()));
            }
            Err(err) => warn!("failed to serialize outgoing message: {err}"),
        }
    }

    /// Run one raw frame through the parse/fan-out path. The read task
    /// funnels every frame through here; hosts that receive frames some
    /// other way (or tests) may call it directly.
    pub fn deliver_frame(&self, raw: &str) {
        Self::dispatch(&self.shared, raw);
    }

    fn dispatch(shared: &Arc<Mutex<Shared<In>>>, raw: &str) {
        let message: In = match serde_json::from_str(raw) {
            Ok(message) => message,
            Err(err) => {
                warn!("discarding malformed frame: {err}");
                return;
            }
        };

        // Snapshot handlers so listeners may add/remove/send reentrantly.
        let (default_handler, listeners) = {
            let shared = lock(shared);
            (
                shared.default_handler.clone(),
                shared
                    .listeners
                    .iter()
                    .map(|(_, handler)| Arc::clone(handler))
                    .collect::<Vec<_>>(),
            )
        };
        if let Some(handler) = &default_handler {
            Self::invoke(handler, &message);
        }
        for listener in &listeners {
            Self::invoke(listener, &message);
        }
    }

    fn invoke(handler: &Handler<In>, message: &In) {
        if catch_unwind(AssertUnwindSafe(|| handler(message))).is_err() {
            error!("listener panicked; continuing fan-out");
        }
    }

    /// Close the transport, clear every listener, and detach the tasks.
    /// Safe to call repeatedly and on a never-connected controller; any
    /// send afterwards is silently dropped.
    pub fn teardown(&self) {
        {
            let mut shared = lock(&self.shared);
            shared.torn_down = true;
            shared.state = TransportState::Closed;
            // Dropping the outbound sender ends the write task, which
            // closes the sink.
            shared.outbound = None;
            shared.listeners.clear();
            shared.default_handler = None;
        }
        if let Some(read_task) = lock(&self.read_task).take() {
            read_task.abort();
        }
    }

    /// Attach an outbound channel and mark the transport open without a
    /// real connection. Used by in-process harnesses.
    #[cfg(test)]
    pub(crate) fn open_with(&self, sender: mpsc::UnboundedSender<Message>) {
        let mut shared = lock(&self.shared);
        shared.outbound = Some(sender);
        shared.state = TransportState::Open;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde::Deserialize;

    #[derive(Clone, Debug, Deserialize, PartialEq)]
    #[serde(tag = "type", rename_all = "camelCase")]
    enum TestIncoming {
        Ping { data: PingData },
        #[serde(other)]
        Unknown,
    }

    #[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
    struct PingData {
        seq: u64,
    }

    #[derive(Clone, Debug, Serialize, PartialEq)]
    #[serde(tag = "type", rename_all = "camelCase")]
    enum TestOutgoing {
        Pong { data: PingData },
    }

    type TestSocket = SocketController<TestIncoming, TestOutgoing>;

    fn recorder(
        socket: &TestSocket,
        label: &'static str,
        seen: &Arc<Mutex<Vec<(&'static str, u64)>>>,
    ) -> ListenerId {
        let seen = Arc::clone(seen);
        socket.add_listener(move |message| {
            if let TestIncoming::Ping { data } = message {
                lock(&seen).push((label, data.seq));
            }
        })
    }

    #[test]
    fn test_listeners_fire_in_registration_order() {
        let socket = TestSocket::new("wss://example:1/ws");
        let seen = Arc::new(Mutex::new(Vec::new()));
        recorder(&socket, "a", &seen);
        recorder(&socket, "b", &seen);
        recorder(&socket, "c", &seen);

        socket.deliver_frame(r#"{"type":"ping","data":{"seq":1}}"#);
        assert_eq!(*lock(&seen), vec![("a", 1), ("b", 1), ("c", 1)]);
    }

    #[test]
    fn test_removed_listener_no_longer_fires() {
        let socket = TestSocket::new("wss://example:1/ws");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let first = recorder(&socket, "a", &seen);
        recorder(&socket, "b", &seen);

        socket.remove_listener(first);
        socket.remove_listener(first); // unknown id, no-op
        socket.deliver_frame(r#"{"type":"ping","data":{"seq":2}}"#);
        assert_eq!(*lock(&seen), vec![("b", 2)]);
    }

    #[test]
    fn test_malformed_frame_is_discarded_without_panic() {
        let socket = TestSocket::new("wss://example:1/ws");
        let seen = Arc::new(Mutex::new(Vec::new()));
        recorder(&socket, "a", &seen);

        socket.deliver_frame("not json at all {{{");
        socket.deliver_frame(r#"{"type":"ping","data":{"seq":3}}"#);
        assert_eq!(*lock(&seen), vec![("a", 3)]);
    }

    #[test]
    fn test_unknown_message_type_reaches_listeners_as_unknown() {
        let socket = TestSocket::new("wss://example:1/ws");
        let unknowns = Arc::new(Mutex::new(0usize));
        let counted = Arc::clone(&unknowns);
        socket.add_listener(move |message| {
            if matches!(message, TestIncoming::Unknown) {
                *lock(&counted) += 1;
            }
        });

        socket.deliver_frame(r#"{"type":"somethingNew","data":{}}"#);
        assert_eq!(*lock(&unknowns), 1);
    }

    #[test]
    fn test_panicking_listener_does_not_stop_fan_out() {
        let socket = TestSocket::new("wss://example:1/ws");
        let seen = Arc::new(Mutex::new(Vec::new()));
        socket.add_listener(|_: &TestIncoming| panic!("listener bug"));
        recorder(&socket, "b", &seen);

        socket.deliver_frame(r#"{"type":"ping","data":{"seq":4}}"#);
        assert_eq!(*lock(&seen), vec![("b", 4)]);
    }

    #[test]
    fn test_send_before_open_is_dropped() {
        let socket = TestSocket::new("wss://example:1/ws");
        assert_eq!(socket.state(), TransportState::Connecting);
        // Nothing to observe but the absence of a panic: there is no
        // transport at all yet.
        socket.send(&TestOutgoing::Pong {
            data: PingData { seq: 0 },
        });
    }

    #[tokio::test]
    async fn test_send_when_open_writes_serialized_frame() {
        let socket = TestSocket::new("wss://example:1/ws");
        let (sender, mut receiver) = mpsc::unbounded_channel();
        socket.open_with(sender);

        socket.send(&TestOutgoing::Pong {
            data: PingData { seq: 7 },
        });
        let frame = receiver.try_recv().unwrap();
        assert_eq!(
            frame.into_text().unwrap().as_str(),
            r#"{"type":"pong","data":{"seq":7}}"#
        );
    }

    #[tokio::test]
    async fn test_teardown_is_idempotent_and_clears_listeners() {
        let socket = TestSocket::new("wss://example:1/ws");
        let (sender, mut receiver) = mpsc::unbounded_channel();
        socket.open_with(sender);
        let seen = Arc::new(Mutex::new(Vec::new()));
        recorder(&socket, "a", &seen);

        socket.teardown();
        assert_eq!(socket.state(), TransportState::Closed);
        assert_eq!(socket.listener_count(), 0);

        socket.teardown();
        assert_eq!(socket.listener_count(), 0);

        // Sends and frames after teardown are no-ops.
        socket.send(&TestOutgoing::Pong {
            data: PingData { seq: 9 },
        });
        assert!(receiver.try_recv().is_err());
        socket.deliver_frame(r#"{"type":"ping","data":{"seq":9}}"#);
        assert!(lock(&seen).is_empty());
    }

    #[test]
    fn test_teardown_on_never_connected_controller() {
        let socket = TestSocket::new("wss://example:1/ws");
        socket.teardown();
        assert_eq!(socket.state(), TransportState::Closed);
    }

    proptest! {
        /// Any interleaving of adds and removes delivers to exactly the
        /// currently-registered listeners, in registration order.
        #[test]
        fn prop_delivery_matches_live_registration_order(ops in proptest::collection::vec(0u8..3, 1..40)) {
            let socket = TestSocket::new("wss://example:1/ws");
            let seen = Arc::new(Mutex::new(Vec::new()));
            let mut live: Vec<(u64, ListenerId)> = Vec::new();
            let mut label = 0u64;

            for op in ops {
                match op {
                    0 => {
                        label += 1;
                        let tag = label;
                        let seen_by = Arc::clone(&seen);
                        let id = socket.add_listener(move |message: &TestIncoming| {
                            if matches!(message, TestIncoming::Ping { .. }) {
                                lock(&seen_by).push(tag);
                            }
                        });
                        live.push((tag, id));
                    }
                    1 if !live.is_empty() => {
                        let (_, id) = live.remove(live.len() / 2);
                        socket.remove_listener(id);
                    }
                    _ => {}
                }
            }

            socket.deliver_frame(r#"{"type":"ping","data":{"seq":0}}"#);
            let expected: Vec<u64> = live.iter().map(|(tag, _)| *tag).collect();
            prop_assert_eq!(&*lock(&seen), &expected);
        }
    }
}
