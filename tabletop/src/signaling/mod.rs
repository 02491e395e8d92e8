//! Per-concern WebSocket signaling channels.
//!
//! [`socket`] holds the generic controller; the remaining modules wrap it
//! with the typed message contract of one concern.

pub mod content;
pub mod game_channel;
pub mod games;
pub mod media;
pub mod socket;
pub mod table;
