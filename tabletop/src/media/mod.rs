//! Registries owning the session's media and content resources.
//!
//! Every entry owns a release routine that must run exactly once before
//! the entry leaves its map, whether it is deleted, overwritten, or swept
//! by full session teardown. Release is synchronous and never touches the
//! network, so teardown stays reliable after the sockets are gone.

use std::collections::HashMap;

use crate::entities::{ContentType, GameKind, PeerRef};
use crate::games::GameMedia;
use crate::rtc::{DataProducer, RemoteDataStream};

/// Owned resource that must be released before its registry slot is
/// reused or deleted.
pub trait Releasable {
    fn release(&mut self);
}

/// Keyed map of owned entries. All mutation paths release first.
pub struct Registry<T: Releasable> {
    entries: HashMap<String, T>,
}

impl<T: Releasable> Registry<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Store `item` under `key`, releasing any live entry already there.
    pub fn insert(&mut self, key: impl Into<String>, item: T) {
        if let Some(mut old) = self.entries.insert(key.into(), item) {
            old.release();
        }
    }

    /// Release and delete the entry under `key`. Missing keys are a no-op.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(mut entry) => {
                entry.release();
                true
            }
            None => false,
        }
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut T> {
        self.entries.get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    /// Release everything and empty the map.
    pub fn clear(&mut self) {
        for (_, mut entry) in self.entries.drain() {
            entry.release();
        }
    }
}

impl<T: Releasable> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// One owned media resource (a track, an element, a decoder) whose
/// cleanup is captured as a closure at creation time.
pub struct MediaItem {
    pub kind: ContentType,
    on_release: Option<Box<dyn FnOnce() + Send>>,
}

impl MediaItem {
    pub fn new(kind: ContentType, on_release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            kind,
            on_release: Some(Box::new(on_release)),
        }
    }

    /// An item with no cleanup of its own.
    pub fn inert(kind: ContentType) -> Self {
        Self {
            kind,
            on_release: None,
        }
    }
}

impl Releasable for MediaItem {
    fn release(&mut self) {
        if let Some(on_release) = self.on_release.take() {
            on_release();
        }
    }
}

/// The local user's own capture resources.
#[derive(Default)]
pub struct UserMedia {
    pub camera: Registry<MediaItem>,
    pub screen: Registry<MediaItem>,
    pub screen_audio: Registry<MediaItem>,
    pub audio: Option<MediaItem>,
}

impl UserMedia {
    pub fn release_all(&mut self) {
        self.camera.clear();
        self.screen.clear();
        self.screen_audio.clear();
        if let Some(mut audio) = self.audio.take() {
            audio.release();
        }
    }
}

/// One content category, split between content addressed to the whole
/// table and content addressed to single table instances.
#[derive(Default)]
pub struct ContentPartition {
    pub table: Registry<MediaItem>,
    pub table_instances: Registry<MediaItem>,
}

impl ContentPartition {
    pub fn release_all(&mut self) {
        self.table.clear();
        self.table_instances.clear();
    }
}

/// All static content shared on the table surface.
#[derive(Default)]
pub struct StaticContentMedia {
    pub application: ContentPartition,
    pub image: ContentPartition,
    pub sound_clip: ContentPartition,
    pub svg: ContentPartition,
    pub text: ContentPartition,
    pub video: ContentPartition,
}

impl StaticContentMedia {
    pub fn partition_mut(&mut self, content_type: ContentType) -> Option<&mut ContentPartition> {
        match content_type {
            ContentType::Application => Some(&mut self.application),
            ContentType::Image => Some(&mut self.image),
            ContentType::SoundClip => Some(&mut self.sound_clip),
            ContentType::Svg => Some(&mut self.svg),
            ContentType::Text => Some(&mut self.text),
            ContentType::Video => Some(&mut self.video),
            _ => None,
        }
    }

    /// Delete one content item. Instance content is keyed by its
    /// instance id, table content by the content id.
    pub fn remove(
        &mut self,
        content_type: ContentType,
        content_id: &str,
        instance_id: Option<&str>,
    ) -> bool {
        let Some(partition) = self.partition_mut(content_type) else {
            return false;
        };
        match instance_id {
            Some(instance_id) => partition.table_instances.remove(instance_id),
            None => partition.table.remove(content_id),
        }
    }

    pub fn release_all(&mut self) {
        self.application.release_all();
        self.image.release_all();
        self.sound_clip.release_all();
        self.svg.release_all();
        self.text.release_all();
        self.video.release_all();
    }

    pub fn is_empty(&self) -> bool {
        [
            &self.application,
            &self.image,
            &self.sound_clip,
            &self.svg,
            &self.text,
            &self.video,
        ]
        .iter()
        .all(|p| p.table.is_empty() && p.table_instances.is_empty())
    }
}

/// Running games, nested game kind → game id → media object. A kind with
/// no remaining games disappears from the outer map.
#[derive(Default)]
pub struct GamesRegistry {
    games: HashMap<GameKind, HashMap<String, GameMedia>>,
}

impl GamesRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: GameKind, game_id: impl Into<String>, media: GameMedia) {
        let slot = self.games.entry(kind).or_default();
        if let Some(mut old) = slot.insert(game_id.into(), media) {
            old.release();
        }
    }

    /// Destroy one game and delete it; drops the kind's sub-map when it
    /// was the last one.
    pub fn remove(&mut self, kind: GameKind, game_id: &str) -> bool {
        let Some(slot) = self.games.get_mut(&kind) else {
            return false;
        };
        let removed = match slot.remove(game_id) {
            Some(mut media) => {
                media.release();
                true
            }
            None => false,
        };
        if slot.is_empty() {
            self.games.remove(&kind);
        }
        removed
    }

    pub fn get(&self, kind: GameKind, game_id: &str) -> Option<&GameMedia> {
        self.games.get(&kind)?.get(game_id)
    }

    pub fn get_mut(&mut self, kind: GameKind, game_id: &str) -> Option<&mut GameMedia> {
        self.games.get_mut(&kind)?.get_mut(game_id)
    }

    pub fn contains(&self, kind: GameKind, game_id: &str) -> bool {
        self.get(kind, game_id).is_some()
    }

    pub fn has_kind(&self, kind: GameKind) -> bool {
        self.games.contains_key(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    pub fn clear(&mut self) {
        for (_, mut slot) in self.games.drain() {
            for (_, mut media) in slot.drain() {
                media.release();
            }
        }
    }
}

/// Everything known about one remote participant bundle.
#[derive(Default)]
pub struct RemoteBundle {
    pub media: Registry<MediaItem>,
    pub data_streams: HashMap<String, RemoteDataStream>,
}

pub const POSITION_SCALE_ROTATION: &str = "positionScaleRotation";

impl RemoteBundle {
    pub fn positioning_stream(&self) -> Option<&RemoteDataStream> {
        self.data_streams.get(POSITION_SCALE_ROTATION)
    }
}

impl Releasable for RemoteBundle {
    fn release(&mut self) {
        self.media.clear();
        self.data_streams.clear();
    }
}

/// Remote participants keyed username → instance.
#[derive(Default)]
pub struct RemoteMedia {
    bundles: HashMap<String, HashMap<String, RemoteBundle>>,
}

impl RemoteMedia {
    pub fn ensure_bundle(&mut self, peer: &PeerRef) -> &mut RemoteBundle {
        self.bundles
            .entry(peer.username.clone())
            .or_default()
            .entry(peer.instance.clone())
            .or_default()
    }

    pub fn get(&self, peer: &PeerRef) -> Option<&RemoteBundle> {
        self.bundles.get(&peer.username)?.get(&peer.instance)
    }

    /// Every peer currently exposing a data stream of `stream_type`.
    pub fn streams_of_type(&self, stream_type: &str) -> Vec<(PeerRef, RemoteDataStream)> {
        let mut found = Vec::new();
        for (username, instances) in &self.bundles {
            for (instance, bundle) in instances {
                if let Some(stream) = bundle.data_streams.get(stream_type) {
                    found.push((PeerRef::new(username.clone(), instance.clone()), stream.clone()));
                }
            }
        }
        found
    }

    /// Prune to only the local `(username, instance)` bundle, releasing
    /// everything else.
    pub fn retain_only(&mut self, username: &str, instance: &str) {
        self.bundles.retain(|name, instances| {
            if name != username {
                for (_, mut bundle) in instances.drain() {
                    bundle.release();
                }
                return false;
            }
            instances.retain(|inst, bundle| {
                let keep = inst == instance;
                if !keep {
                    bundle.release();
                }
                keep
            });
            !instances.is_empty()
        });
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    pub fn clear(&mut self) {
        for (_, mut instances) in self.bundles.drain() {
            for (_, mut bundle) in instances.drain() {
                bundle.release();
            }
        }
    }
}

/// The local user's outgoing data channels. Currently only the
/// position/scale/rotation stream exists.
#[derive(Default)]
pub struct UserDataStreams {
    producer: Option<Box<dyn DataProducer>>,
}

impl UserDataStreams {
    pub fn set_positioning_producer(&mut self, producer: Box<dyn DataProducer>) {
        if let Some(mut old) = self.producer.take() {
            old.close();
        }
        self.producer = Some(producer);
    }

    pub fn is_open(&self) -> bool {
        self.producer.as_ref().is_some_and(|p| p.is_open())
    }

    /// Push one positioning frame if the channel is open.
    pub fn send_positioning(&self, text: &str) {
        if let Some(producer) = &self.producer {
            if producer.is_open() {
                producer.send_text(text);
            }
        }
    }

    /// Close the channel and drop it.
    pub fn remove_positioning_producer(&mut self) {
        if let Some(mut producer) = self.producer.take() {
            producer.close();
        }
    }
}

/// All session media state, grouped so controllers can share one handle.
#[derive(Default)]
pub struct MediaState {
    pub user_media: UserMedia,
    pub static_content: StaticContentMedia,
    pub games: GamesRegistry,
    pub remote: RemoteMedia,
    pub data_streams: UserDataStreams,
}

impl MediaState {
    pub fn release_all(&mut self) {
        self.user_media.release_all();
        self.static_content.release_all();
        self.games.clear();
        self.remote.clear();
        self.data_streams.remove_positioning_producer();
    }

    pub fn is_empty(&self) -> bool {
        self.user_media.camera.is_empty()
            && self.user_media.screen.is_empty()
            && self.user_media.screen_audio.is_empty()
            && self.user_media.audio.is_none()
            && self.static_content.is_empty()
            && self.games.is_empty()
            && self.remote.is_empty()
            && !self.data_streams.is_open()
    }
}

/// Shared handle every controller mutates through.
pub type SharedMedia = std::sync::Arc<std::sync::Mutex<MediaState>>;

pub fn shared_media() -> SharedMedia {
    std::sync::Arc::new(std::sync::Mutex::new(MediaState::default()))
}
