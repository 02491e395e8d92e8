//! Placement of shared content on the table surface.
//!
//! All coordinates are percentages of the table board, so positioning is
//! resolution independent and can be relayed between peers as-is.

use serde::{Deserialize, Serialize};

/// Top-left corner of a content item, in percent of the board.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub left: f64,
    pub top: f64,
}

/// Width/height of a content item, in percent of the board.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scale {
    pub x: f64,
    pub y: f64,
}

/// Full placement of one content item.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Positioning {
    pub position: Position,
    pub scale: Scale,
    /// Rotation in degrees around the top-left corner.
    pub rotation: f64,
}

impl Default for Positioning {
    /// A freshly initiated game sits centered at a quarter of the board.
    fn default() -> Self {
        Self {
            position: Position {
                left: 37.5,
                top: 37.5,
            },
            scale: Scale { x: 25.0, y: 25.0 },
            rotation: 0.0,
        }
    }
}

impl Positioning {
    /// Apply a partial update, leaving unspecified fields untouched.
    pub fn apply(&mut self, update: &PositioningUpdate) {
        if let Some(position) = update.position {
            self.position = position;
        }
        if let Some(scale) = update.scale {
            self.scale = scale;
        }
        if let Some(rotation) = update.rotation {
            self.rotation = rotation;
        }
    }
}

/// Partial positioning carried by `updateContentPositioning`. Absent
/// fields are omitted from the wire frame entirely.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositioningUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<Scale>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
}

impl PositioningUpdate {
    pub fn position(position: Position) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }
}

/// Pixel dimensions of the mounted board element. Operations needing the
/// board skip silently when it is not mounted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoardMetrics {
    pub width: f64,
    pub height: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_positioning_is_centered_quarter() {
        let positioning = Positioning::default();
        assert_eq!(positioning.position.left, 37.5);
        assert_eq!(positioning.position.top, 37.5);
        assert_eq!(positioning.scale.x, 25.0);
        assert_eq!(positioning.rotation, 0.0);
    }

    #[test]
    fn test_partial_update_leaves_other_fields() {
        let mut positioning = Positioning::default();
        positioning.apply(&PositioningUpdate {
            rotation: Some(90.0),
            ..PositioningUpdate::default()
        });
        assert_eq!(positioning.rotation, 90.0);
        assert_eq!(positioning.position.left, 37.5);
        assert_eq!(positioning.scale.y, 25.0);
    }

    #[test]
    fn test_update_serialization_omits_absent_fields() {
        let update = PositioningUpdate::position(Position {
            left: 10.0,
            top: 20.0,
        });
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["position"]["left"], 10.0);
        assert!(json.get("scale").is_none());
        assert!(json.get("rotation").is_none());
    }

    #[test]
    fn test_positioning_roundtrip_matches_wire_shape() {
        let positioning = Positioning::default();
        let json = serde_json::to_value(positioning).unwrap();
        assert_eq!(json["position"]["top"], 37.5);
        assert_eq!(json["scale"]["x"], 25.0);
        let back: Positioning = serde_json::from_value(json).unwrap();
        assert_eq!(back, positioning);
    }
}
