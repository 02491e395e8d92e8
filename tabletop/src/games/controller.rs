//! Interactive controller for one embedded game on the table surface.
//!
//! Bridges four input sources into the game's shared placement and
//! lifecycle: keyboard shortcuts, pointer drag gestures (direct and
//! group-select), remote peers' positioning data streams, and
//! server-pushed reactions. All methods run on the UI event path; the
//! controller owns no tasks beyond its two debounce timers.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::entities::{ContentType, GameKind, PeerRef, SessionIdentity};
use crate::media::{POSITION_SCALE_ROTATION, SharedMedia};
use crate::positioning::{BoardMetrics, Position, Positioning, PositioningUpdate};
use crate::rtc::{ReactionSink, StreamSubscription, UiEvent, UiEvents, lock};
use crate::signaling::games::GamesSignalingSocket;
use crate::signaling::media::IncomingMediaMessage;
use crate::signaling::table::IncomingTableMessage;
use crate::timing::ScheduledTask;

/// Controls reappear-then-hide debounce after the pointer leaves.
const LEAVE_HIDE_DELAY: Duration = Duration::from_millis(1250);
/// Idle hide while hovering the main surface without moving.
const IDLE_HIDE_DELAY: Duration = Duration::from_millis(5000);
/// Fraction of the game's width forming the adjustment-button edge.
const ADJUSTMENT_EDGE_FRACTION: f64 = 0.1;

const MIN_SCALE_PERCENT: f64 = 5.0;

/// Sub-elements whose hover state keeps the controls visible.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HoverZone {
    Main,
    Pan,
    Scale,
    Rotate,
    Popup,
    Buttons,
}

#[derive(Default)]
struct HoverFlags {
    main: bool,
    pan: bool,
    scale: bool,
    rotate: bool,
    popup: bool,
    buttons: bool,
}

impl HoverFlags {
    fn flag_mut(&mut self, zone: HoverZone) -> &mut bool {
        match zone {
            HoverZone::Main => &mut self.main,
            HoverZone::Pan => &mut self.pan,
            HoverZone::Scale => &mut self.scale,
            HoverZone::Rotate => &mut self.rotate,
            HoverZone::Popup => &mut self.popup,
            HoverZone::Buttons => &mut self.buttons,
        }
    }

    fn active_count(&self) -> usize {
        [
            self.main,
            self.pan,
            self.scale,
            self.rotate,
            self.popup,
            self.buttons,
        ]
        .iter()
        .filter(|flag| **flag)
        .count()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DragKind {
    Move,
    Scale,
    Rotate,
}

/// Pointer coordinates in pixels, relative to the board's top-left.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DragPoint {
    pub x: f64,
    pub y: f64,
}

/// Horizontal extent of the game element, for edge detection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GameRect {
    pub left: f64,
    pub width: f64,
}

/// One item targeted by a multi-select group signal.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffectedItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ContentType,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDragStartData {
    pub affected: Vec<AffectedItem>,
    pub start_drag_position: DragPoint,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDragData {
    pub affected: Vec<AffectedItem>,
    pub drag_position: DragPoint,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffectedData {
    pub affected: Vec<AffectedItem>,
}

/// Multi-select drag signals broadcast to every content controller; each
/// acts only when its own id appears in `affected`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GroupSignal {
    GroupDragStart { data: GroupDragStartData },
    GroupDrag { data: GroupDragData },
    GroupDragEnd { data: AffectedData },
    GroupDelete { data: AffectedData },
}

impl GroupSignal {
    fn affected(&self) -> &[AffectedItem] {
        match self {
            Self::GroupDragStart { data } => &data.affected,
            Self::GroupDrag { data } => &data.affected,
            Self::GroupDragEnd { data } => &data.affected,
            Self::GroupDelete { data } => &data.affected,
        }
    }
}

/// Frame relayed over the position/scale/rotation data channels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositioningStreamMessage {
    pub table_id: String,
    pub game_id: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub positioning: Positioning,
}

pub struct GameController {
    identity: SessionIdentity,
    kind: GameKind,
    game_id: String,
    media: SharedMedia,
    signaling: Arc<GamesSignalingSocket>,
    ui: UiEvents,
    reactions: Box<dyn ReactionSink>,

    hide_controls: Arc<AtomicBool>,
    hovering: HoverFlags,
    leave_timer: ScheduledTask,
    movement_timeout: ScheduledTask,
    adjustment_buttons_active: bool,

    drag: Option<DragKind>,
    group_start: Option<DragPoint>,
    saved_position: Option<Position>,

    board: Option<BoardMetrics>,
    game_rect: Option<GameRect>,

    positioning_listeners: HashMap<PeerRef, StreamSubscription>,
}

impl GameController {
    pub fn new(
        identity: SessionIdentity,
        kind: GameKind,
        game_id: impl Into<String>,
        media: SharedMedia,
        signaling: Arc<GamesSignalingSocket>,
        ui: UiEvents,
        reactions: Box<dyn ReactionSink>,
    ) -> Self {
        Self {
            identity,
            kind,
            game_id: game_id.into(),
            media,
            signaling,
            ui,
            reactions,
            hide_controls: Arc::new(AtomicBool::new(false)),
            hovering: HoverFlags::default(),
            leave_timer: ScheduledTask::new(),
            movement_timeout: ScheduledTask::new(),
            adjustment_buttons_active: false,
            drag: None,
            group_start: None,
            saved_position: None,
            board: None,
            game_rect: None,
            positioning_listeners: HashMap::new(),
        }
    }

    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    pub fn controls_hidden(&self) -> bool {
        self.hide_controls.load(Ordering::SeqCst)
    }

    pub fn adjustment_buttons_active(&self) -> bool {
        self.adjustment_buttons_active
    }

    pub fn drag_active(&self) -> bool {
        self.drag.is_some()
    }

    /// Board dimensions, refreshed by the host whenever the board element
    /// resizes or unmounts.
    pub fn set_board_metrics(&mut self, board: Option<BoardMetrics>) {
        self.board = board;
    }

    pub fn set_game_rect(&mut self, rect: Option<GameRect>) {
        self.game_rect = rect;
    }

    // ── Lifecycle shortcuts ─────────────────────────────────────────

    fn with_game<R>(&self, action: impl FnOnce(&crate::games::GameMedia) -> R) -> Option<R> {
        let media = lock(&self.media);
        media.games.get(self.kind, &self.game_id).map(action)
    }

    fn game_started(&self) -> bool {
        self.with_game(|game| game.phase() == crate::games::GamePhase::Started)
            .unwrap_or(false)
    }

    pub fn start_game(&self) {
        self.with_game(|game| game.start_game());
    }

    pub fn join_game(&self, snake_color: Option<&str>) {
        self.with_game(|game| game.join_game(snake_color));
    }

    pub fn leave_game(&self) {
        self.with_game(|game| game.leave_game());
    }

    pub fn close_game(&self) {
        self.with_game(|game| game.close_game());
    }

    /// Keyboard shortcuts; inert while the controls are hidden or a text
    /// input has focus.
    pub fn handle_key(&mut self, key: &str, text_input_focused: bool) {
        if self.controls_hidden() || text_input_focused {
            return;
        }
        match key.to_lowercase().as_str() {
            "p" => self.start_game(),
            "j" => self.join_game(None),
            "l" => self.leave_game(),
            "x" | "delete" | "escape" => self.close_game(),
            "y" => self.begin_drag(DragKind::Scale),
            "g" => self.begin_drag(DragKind::Move),
            "r" => self.begin_drag(DragKind::Rotate),
            _ => {}
        }
    }

    // ── Drag gestures ───────────────────────────────────────────────

    /// Arm a one-shot drag session; pointer moves adjust the game until
    /// the next pointer-down ends it.
    pub fn begin_drag(&mut self, kind: DragKind) {
        self.drag = Some(kind);
    }

    /// Pointer-down ends whatever drag session is active.
    pub fn pointer_down(&mut self) {
        if self.drag.is_some() {
            self.end_drag();
        }
    }

    /// Apply one pointer move to the active drag. Skipped when no drag is
    /// armed or the board is not mounted.
    pub fn apply_drag(&mut self, pointer: DragPoint) {
        let Some(kind) = self.drag else {
            return;
        };
        let Some(board) = self.board else {
            return;
        };
        if board.width <= 0.0 || board.height <= 0.0 {
            return;
        }

        let Some(mut positioning) = self.with_game(|game| game.positioning()) else {
            return;
        };
        match kind {
            DragKind::Move => {
                positioning.position.left = (pointer.x / board.width * 100.0).clamp(0.0, 100.0);
                positioning.position.top = (pointer.y / board.height * 100.0).clamp(0.0, 100.0);
            }
            DragKind::Scale => {
                let anchor_x = positioning.position.left / 100.0 * board.width;
                let anchor_y = positioning.position.top / 100.0 * board.height;
                let side = (pointer.x - anchor_x)
                    .hypot(pointer.y - anchor_y)
                    .max(MIN_SCALE_PERCENT / 100.0 * board.width);
                // Square scaling: both axes follow the drag distance.
                let percent = (side / board.width * 100.0).max(MIN_SCALE_PERCENT);
                positioning.scale.x = percent;
                positioning.scale.y = percent;
            }
            DragKind::Rotate => {
                let anchor_x = positioning.position.left / 100.0 * board.width;
                let anchor_y = positioning.position.top / 100.0 * board.height;
                let degrees = (pointer.y - anchor_y)
                    .atan2(pointer.x - anchor_x)
                    .to_degrees();
                positioning.rotation = degrees.rem_euclid(360.0);
            }
        }
        self.commit_positioning(positioning);
    }

    fn commit_positioning(&self, positioning: Positioning) {
        let media = lock(&self.media);
        if let Some(game) = media.games.get(self.kind, &self.game_id) {
            game.set_positioning(positioning);
        }
        // Continuous updates ride the data channel while the gesture is
        // live; the signaling relay happens once at gesture end.
        if media.data_streams.is_open() {
            let frame = PositioningStreamMessage {
                table_id: self.identity.table_id.clone(),
                game_id: self.game_id.clone(),
                content_type: ContentType::Games,
                positioning,
            };
            if let Ok(text) = serde_json::to_string(&frame) {
                media.data_streams.send_positioning(&text);
            }
        }
        drop(media);
        self.ui.rerender();
    }

    /// Close the drag session and relay the final placement to the games
    /// server so late joiners catch up.
    pub fn end_drag(&mut self) {
        if self.drag.take().is_none() {
            return;
        }
        self.group_start = None;
        self.saved_position = None;
        if let Some(positioning) = self.with_game(|game| game.positioning()) {
            self.signaling.update_content_positioning(
                self.kind,
                &self.game_id,
                PositioningUpdate {
                    position: Some(positioning.position),
                    scale: Some(positioning.scale),
                    rotation: Some(positioning.rotation),
                },
            );
        }
    }

    // ── Group signals ───────────────────────────────────────────────

    fn is_affected(&self, affected: &[AffectedItem]) -> bool {
        affected
            .iter()
            .any(|item| item.id == self.game_id && item.kind == ContentType::Games)
    }

    pub fn handle_group_signal(&mut self, signal: &GroupSignal) {
        if !self.is_affected(signal.affected()) {
            return;
        }
        match signal {
            GroupSignal::GroupDragStart { data } => {
                self.begin_drag(DragKind::Move);
                self.group_start = Some(data.start_drag_position);
                self.saved_position = self.with_game(|game| game.positioning().position);
            }
            GroupSignal::GroupDrag { data } => {
                let (Some(start), Some(saved)) = (self.group_start, self.saved_position) else {
                    return;
                };
                if self.board.is_none() {
                    return;
                }
                // Group drag positions arrive in percent-of-board units.
                let mut positioning = match self.with_game(|game| game.positioning()) {
                    Some(positioning) => positioning,
                    None => return,
                };
                positioning.position.left =
                    (saved.left + data.drag_position.x - start.x).clamp(0.0, 100.0);
                positioning.position.top =
                    (saved.top + data.drag_position.y - start.y).clamp(0.0, 100.0);
                self.commit_positioning(positioning);
            }
            GroupSignal::GroupDragEnd { .. } => self.end_drag(),
            GroupSignal::GroupDelete { .. } => self.close_game(),
        }
    }

    // ── Remote positioning streams ──────────────────────────────────

    /// Subscribe to every remote peer's position/scale/rotation stream,
    /// skipping pairs that already have a live handler.
    pub fn attach_positioning_listeners(&mut self) {
        let streams = lock(&self.media).remote.streams_of_type(POSITION_SCALE_ROTATION);
        for (peer, stream) in streams {
            if self.positioning_listeners.contains_key(&peer) {
                continue;
            }
            let media = Arc::clone(&self.media);
            let ui = self.ui.clone();
            let table_id = self.identity.table_id.clone();
            let kind = self.kind;
            let game_id = self.game_id.clone();
            let subscription = stream.attach(Arc::new(move |text: &str| {
                let Ok(frame) = serde_json::from_str::<PositioningStreamMessage>(text) else {
                    return;
                };
                if frame.table_id != table_id
                    || frame.game_id != game_id
                    || frame.content_type != ContentType::Games
                {
                    return;
                }
                if let Some(game) = lock(&media).games.get(kind, &game_id) {
                    game.set_positioning(frame.positioning);
                }
                ui.rerender();
            }));
            self.positioning_listeners.insert(peer, subscription);
        }
    }

    /// Drop every stream handler this controller attached.
    pub fn detach_positioning_listeners(&mut self) {
        self.positioning_listeners.clear();
    }

    /// New consumers mean a new peer's streams may have appeared.
    pub fn handle_media_message(&mut self, message: &IncomingMediaMessage) {
        if matches!(message, IncomingMediaMessage::NewConsumerWasCreated { .. }) {
            self.attach_positioning_listeners();
        }
    }

    // ── Reactions ───────────────────────────────────────────────────

    pub fn handle_table_message(&mut self, message: &IncomingTableMessage) {
        let IncomingTableMessage::ReactionOccurred { header, data } = message else {
            return;
        };
        if header.content_type == ContentType::Games
            && header.content_id.as_deref() == Some(self.game_id.as_str())
        {
            self.reactions.play(&data.reaction, &data.reaction_style);
        }
    }

    // ── Hover bookkeeping ───────────────────────────────────────────

    fn set_hidden(&self, hidden: bool) {
        if self.hide_controls.swap(hidden, Ordering::SeqCst) != hidden {
            self.ui.emit(UiEvent::GameControlsHidden {
                game_id: self.game_id.clone(),
                hidden,
            });
        }
    }

    fn schedule_hide(task: &mut ScheduledTask, delay: Duration, controller: &Self) {
        let hide_controls = Arc::clone(&controller.hide_controls);
        let ui = controller.ui.clone();
        let game_id = controller.game_id.clone();
        task.schedule(delay, move || {
            if !hide_controls.swap(true, Ordering::SeqCst) {
                ui.emit(UiEvent::GameControlsHidden {
                    game_id,
                    hidden: true,
                });
            }
        });
    }

    pub fn pointer_enter(&mut self, zone: HoverZone) {
        *self.hovering.flag_mut(zone) = true;
        self.set_hidden(false);
        self.leave_timer.cancel();
    }

    pub fn pointer_leave(&mut self, zone: HoverZone) {
        *self.hovering.flag_mut(zone) = false;
        self.movement_timeout.cancel();

        if self.hovering.active_count() == 0 && !self.leave_timer.is_pending() {
            let mut leave_timer = std::mem::take(&mut self.leave_timer);
            Self::schedule_hide(&mut leave_timer, LEAVE_HIDE_DELAY, self);
            self.leave_timer = leave_timer;
        }
    }

    /// Pointer movement inside a zone: unhides the controls, tracks the
    /// right-edge adjustment-button region, and re-arms the idle hide
    /// while over the main surface.
    pub fn pointer_move(&mut self, zone: HoverZone, client_x: f64) {
        self.set_hidden(false);

        if let Some(rect) = self.game_rect {
            let threshold = rect.left + rect.width * (1.0 - ADJUSTMENT_EDGE_FRACTION);
            let in_edge = client_x >= threshold;
            if in_edge != self.adjustment_buttons_active {
                self.adjustment_buttons_active = in_edge;
                self.ui.emit(UiEvent::AdjustmentButtonsActive {
                    game_id: self.game_id.clone(),
                    active: in_edge,
                });
                self.ui.rerender();
            }
        }

        self.movement_timeout.cancel();
        if zone == HoverZone::Main && (self.hovering.active_count() == 1 || self.game_started()) {
            let mut movement_timeout = std::mem::take(&mut self.movement_timeout);
            Self::schedule_hide(&mut movement_timeout, IDLE_HIDE_DELAY, self);
            self.movement_timeout = movement_timeout;
        }
    }

    /// Release timers and stream handlers; runs on unmount or teardown.
    pub fn teardown(&mut self) {
        self.leave_timer.cancel();
        self.movement_timeout.cancel();
        self.detach_positioning_listeners();
        self.drag = None;
        self.group_start = None;
        self.saved_position = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Endpoints;
    use crate::media::shared_media;
    use crate::rtc::{NoopReactionSink, RemoteDataStream};
    use crate::signaling::table::{ReactionData, ReactionOccurredHeader};
    use std::sync::Mutex;

    fn identity() -> SessionIdentity {
        SessionIdentity::new("t1", "alice", "i1")
    }

    fn controller_with_game() -> (GameController, SharedMedia, Arc<GamesSignalingSocket>) {
        let media = shared_media();
        let (ui, _events) = UiEvents::channel();
        let signaling = Arc::new(GamesSignalingSocket::new(
            Endpoints::from_env(),
            identity(),
            Arc::clone(&media),
            ui.clone(),
        ));
        signaling.deliver_frame(
            r#"{
                "type": "gameInitiated",
                "header": {"gameType": "snake", "gameId": "g1"},
                "data": {"initiator": {"username": "alice", "instance": "i1"}}
            }"#,
        );
        let controller = GameController::new(
            identity(),
            GameKind::Snake,
            "g1",
            Arc::clone(&media),
            Arc::clone(&signaling),
            ui,
            Box::new(NoopReactionSink),
        );
        (controller, media, signaling)
    }

    fn game_positioning(media: &SharedMedia) -> Positioning {
        lock(media)
            .games
            .get(GameKind::Snake, "g1")
            .unwrap()
            .positioning()
    }

    #[test]
    fn test_key_g_arms_one_shot_move_drag() {
        let (mut controller, media, _signaling) = controller_with_game();
        controller.set_board_metrics(Some(BoardMetrics {
            width: 1000.0,
            height: 500.0,
        }));

        controller.handle_key("g", false);
        assert!(controller.drag_active());

        controller.apply_drag(DragPoint { x: 500.0, y: 250.0 });
        let positioning = game_positioning(&media);
        assert_eq!(positioning.position.left, 50.0);
        assert_eq!(positioning.position.top, 50.0);

        controller.pointer_down();
        assert!(!controller.drag_active());

        // Further moves do nothing once the session ended.
        controller.apply_drag(DragPoint { x: 0.0, y: 0.0 });
        assert_eq!(game_positioning(&media).position.left, 50.0);
    }

    #[test]
    fn test_keys_ignored_when_hidden_or_typing() {
        let (mut controller, _media, _signaling) = controller_with_game();
        controller.handle_key("g", true);
        assert!(!controller.drag_active());

        controller.hide_controls.store(true, Ordering::SeqCst);
        controller.handle_key("g", false);
        assert!(!controller.drag_active());
    }

    #[test]
    fn test_drag_without_board_metrics_is_skipped() {
        let (mut controller, media, _signaling) = controller_with_game();
        let before = game_positioning(&media);

        controller.begin_drag(DragKind::Move);
        controller.apply_drag(DragPoint { x: 100.0, y: 100.0 });
        assert_eq!(game_positioning(&media), before);
    }

    #[test]
    fn test_attach_positioning_listeners_is_idempotent() {
        let (mut controller, media, _signaling) = controller_with_game();
        let stream = RemoteDataStream::new();
        lock(&media)
            .remote
            .ensure_bundle(&PeerRef::new("bob", "i2"))
            .data_streams
            .insert(POSITION_SCALE_ROTATION.to_string(), stream.clone());

        controller.attach_positioning_listeners();
        controller.attach_positioning_listeners();
        assert_eq!(stream.handler_count(), 1);

        // A new peer appearing later still gets attached.
        let late = RemoteDataStream::new();
        lock(&media)
            .remote
            .ensure_bundle(&PeerRef::new("carol", "i1"))
            .data_streams
            .insert(POSITION_SCALE_ROTATION.to_string(), late.clone());
        controller.handle_media_message(&IncomingMediaMessage::NewConsumerWasCreated {
            header: crate::signaling::media::NewConsumerHeader {
                username: "carol".to_string(),
                instance: "i1".to_string(),
            },
            data: serde_json::Value::Null,
        });
        assert_eq!(late.handler_count(), 1);
        assert_eq!(stream.handler_count(), 1);

        controller.detach_positioning_listeners();
        assert_eq!(stream.handler_count(), 0);
        assert_eq!(late.handler_count(), 0);
    }

    #[test]
    fn test_remote_positioning_overwrites_local_value() {
        let (mut controller, media, _signaling) = controller_with_game();
        let stream = RemoteDataStream::new();
        lock(&media)
            .remote
            .ensure_bundle(&PeerRef::new("bob", "i2"))
            .data_streams
            .insert(POSITION_SCALE_ROTATION.to_string(), stream.clone());
        controller.attach_positioning_listeners();

        stream.deliver(
            r#"{
                "tableId": "t1",
                "gameId": "g1",
                "type": "games",
                "positioning": {
                    "position": {"left": 1.0, "top": 2.0},
                    "scale": {"x": 3.0, "y": 4.0},
                    "rotation": 5.0
                }
            }"#,
        );
        assert_eq!(game_positioning(&media).rotation, 5.0);

        // Frames for another game leave this one alone.
        stream.deliver(
            r#"{
                "tableId": "t1",
                "gameId": "other",
                "type": "games",
                "positioning": {
                    "position": {"left": 9.0, "top": 9.0},
                    "scale": {"x": 9.0, "y": 9.0},
                    "rotation": 9.0
                }
            }"#,
        );
        assert_eq!(game_positioning(&media).rotation, 5.0);
    }

    #[test]
    fn test_group_drag_moves_by_delta_when_affected() {
        let (mut controller, media, _signaling) = controller_with_game();
        controller.set_board_metrics(Some(BoardMetrics {
            width: 1000.0,
            height: 500.0,
        }));
        let affected = vec![AffectedItem {
            id: "g1".to_string(),
            kind: ContentType::Games,
        }];

        controller.handle_group_signal(&GroupSignal::GroupDragStart {
            data: GroupDragStartData {
                affected: affected.clone(),
                start_drag_position: DragPoint { x: 10.0, y: 10.0 },
            },
        });
        controller.handle_group_signal(&GroupSignal::GroupDrag {
            data: GroupDragData {
                affected: affected.clone(),
                drag_position: DragPoint { x: 15.0, y: 30.0 },
            },
        });

        let positioning = game_positioning(&media);
        assert_eq!(positioning.position.left, 42.5);
        assert_eq!(positioning.position.top, 57.5);

        controller.handle_group_signal(&GroupSignal::GroupDragEnd {
            data: AffectedData { affected },
        });
        assert!(!controller.drag_active());
    }

    #[test]
    fn test_group_signals_for_other_content_are_ignored() {
        let (mut controller, media, _signaling) = controller_with_game();
        controller.set_board_metrics(Some(BoardMetrics {
            width: 1000.0,
            height: 500.0,
        }));
        let before = game_positioning(&media);

        controller.handle_group_signal(&GroupSignal::GroupDragStart {
            data: GroupDragStartData {
                affected: vec![AffectedItem {
                    id: "someImage".to_string(),
                    kind: ContentType::Image,
                }],
                start_drag_position: DragPoint { x: 0.0, y: 0.0 },
            },
        });
        assert!(!controller.drag_active());
        assert_eq!(game_positioning(&media), before);
    }

    #[test]
    fn test_reaction_bridges_only_for_this_game() {
        struct RecordingSink(Arc<Mutex<Vec<(String, String)>>>);
        impl ReactionSink for RecordingSink {
            fn play(&mut self, reaction: &str, style: &str) {
                lock(&self.0).push((reaction.to_string(), style.to_string()));
            }
        }

        let media = shared_media();
        let (ui, _events) = UiEvents::channel();
        let signaling = Arc::new(GamesSignalingSocket::new(
            Endpoints::from_env(),
            identity(),
            Arc::clone(&media),
            ui.clone(),
        ));
        let played = Arc::new(Mutex::new(Vec::new()));
        let mut controller = GameController::new(
            identity(),
            GameKind::Snake,
            "g1",
            media,
            signaling,
            ui,
            Box::new(RecordingSink(Arc::clone(&played))),
        );

        let reaction = |content_id: &str| IncomingTableMessage::ReactionOccurred {
            header: ReactionOccurredHeader {
                content_type: ContentType::Games,
                content_id: Some(content_id.to_string()),
                instance_id: None,
            },
            data: ReactionData {
                reaction: "wave".to_string(),
                reaction_style: "burst".to_string(),
            },
        };
        controller.handle_table_message(&reaction("other"));
        assert!(lock(&played).is_empty());
        controller.handle_table_message(&reaction("g1"));
        assert_eq!(lock(&played).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_controls_hide_after_leave_debounce() {
        let (mut controller, _media, _signaling) = controller_with_game();
        controller.pointer_enter(HoverZone::Main);
        controller.pointer_leave(HoverZone::Main);
        assert!(!controller.controls_hidden());

        tokio::time::sleep(Duration::from_millis(1300)).await;
        tokio::task::yield_now().await;
        assert!(controller.controls_hidden());

        // Re-entering unhides and cancels any pending hide.
        controller.pointer_enter(HoverZone::Main);
        assert!(!controller.controls_hidden());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_zone_changes_do_not_hide() {
        let (mut controller, _media, _signaling) = controller_with_game();
        controller.pointer_enter(HoverZone::Main);
        controller.pointer_enter(HoverZone::Buttons);
        controller.pointer_leave(HoverZone::Main);

        tokio::time::sleep(Duration::from_millis(2000)).await;
        tokio::task::yield_now().await;
        // Still hovering the buttons, so nothing was scheduled.
        assert!(!controller.controls_hidden());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_on_main_surface_hides_after_five_seconds() {
        let (mut controller, _media, _signaling) = controller_with_game();
        controller.pointer_enter(HoverZone::Main);
        controller.pointer_move(HoverZone::Main, 0.0);

        tokio::time::sleep(Duration::from_millis(4000)).await;
        tokio::task::yield_now().await;
        assert!(!controller.controls_hidden());

        // Movement re-arms the timeout.
        controller.pointer_move(HoverZone::Main, 0.0);
        tokio::time::sleep(Duration::from_millis(5100)).await;
        tokio::task::yield_now().await;
        assert!(controller.controls_hidden());
    }

    #[test]
    fn test_adjustment_buttons_follow_right_edge() {
        let (mut controller, _media, _signaling) = controller_with_game();
        controller.set_game_rect(Some(GameRect {
            left: 100.0,
            width: 200.0,
        }));
        controller.pointer_enter(HoverZone::Main);

        controller.pointer_move(HoverZone::Main, 150.0);
        assert!(!controller.adjustment_buttons_active());

        controller.pointer_move(HoverZone::Main, 290.0);
        assert!(controller.adjustment_buttons_active());

        controller.pointer_move(HoverZone::Main, 150.0);
        assert!(!controller.adjustment_buttons_active());
    }
}
