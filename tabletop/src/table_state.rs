//! Table membership state.
//!
//! A reducer over the table channel's push stream. Every handler either
//! replaces the whole occupant map or performs one localized mutation, so
//! no message can leave the map half-updated.

use std::collections::HashMap;

use crate::positioning::BoardMetrics;
use crate::rtc::{UiEvent, UiEvents, lock};
use crate::signaling::table::{IncomingTableMessage, TableUser};

/// Whether the table fills the viewport by width or by height.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum AspectDirection {
    #[default]
    Width,
    Height,
}

pub struct TableState {
    users: HashMap<String, TableUser>,
    aspect: AspectDirection,
    side_panel_active: bool,
    ui: UiEvents,
}

impl TableState {
    pub fn new(ui: UiEvents) -> Self {
        Self {
            users: HashMap::new(),
            aspect: AspectDirection::default(),
            side_panel_active: false,
            ui,
        }
    }

    pub fn users(&self) -> &HashMap<String, TableUser> {
        &self.users
    }

    pub fn aspect(&self) -> AspectDirection {
        self.aspect
    }

    pub fn side_panel_active(&self) -> bool {
        self.side_panel_active
    }

    /// Apply one table push message.
    pub fn handle_table_message(&mut self, message: &IncomingTableMessage) {
        match message {
            IncomingTableMessage::UserJoinedTable { data }
            | IncomingTableMessage::SeatsMoved { data } => {
                self.users = data.user_data.clone();
                self.ui.rerender();
            }
            IncomingTableMessage::UserLeftTable { header } => {
                if let Some(user) = self.users.get_mut(&header.username) {
                    user.online = header.online;
                    self.ui.rerender();
                }
            }
            IncomingTableMessage::SeatsSwapped { data } => {
                self.swap_seats(&data.username, &data.target_username);
            }
            IncomingTableMessage::KickedFromTable { data } => {
                if self.users.remove(&data.target_username).is_some() {
                    self.ui.rerender();
                }
            }
            _ => {}
        }
    }

    /// Exchange two users' seat numbers, leaving colors and online flags
    /// untouched. A no-op unless both users are present.
    fn swap_seats(&mut self, username: &str, target_username: &str) {
        let (Some(seat), Some(target_seat)) = (
            self.users.get(username).map(|u| u.seat),
            self.users.get(target_username).map(|u| u.seat),
        ) else {
            return;
        };
        if let Some(user) = self.users.get_mut(username) {
            user.seat = target_seat;
        }
        if let Some(target) = self.users.get_mut(target_username) {
            target.seat = seat;
        }
        self.ui.rerender();
    }

    /// Recompute which axis the table fills, from the mounted element's
    /// size. Skipped when the table is not mounted.
    pub fn recompute_aspect(&mut self, table: Option<BoardMetrics>) {
        let Some(table) = table else {
            return;
        };
        let aspect = if table.width >= table.height {
            AspectDirection::Width
        } else {
            AspectDirection::Height
        };
        if aspect != self.aspect {
            self.aspect = aspect;
            self.ui.rerender();
        }
    }

    /// Keyboard handling for the table surface; shift+S toggles the side
    /// panel. Inert while a text input has focus.
    pub fn handle_key(&mut self, key: &str, shift: bool, text_input_focused: bool) {
        if text_input_focused {
            return;
        }
        if key.to_lowercase() == "s" && shift {
            self.side_panel_active = !self.side_panel_active;
            self.ui
                .emit(UiEvent::SidePanelActive(self.side_panel_active));
            self.ui.rerender();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::TableColor;
    use crate::signaling::table::{KickedData, SeatsSwappedData, UserDataPayload, UserLeftHeader};

    fn user(color: TableColor, seat: u32) -> TableUser {
        TableUser {
            color,
            seat,
            online: true,
        }
    }

    fn state() -> TableState {
        let (ui, _events) = UiEvents::channel();
        TableState::new(ui)
    }

    fn joined(users: &[(&str, TableUser)]) -> IncomingTableMessage {
        IncomingTableMessage::UserJoinedTable {
            data: UserDataPayload {
                user_data: users
                    .iter()
                    .map(|(name, user)| (name.to_string(), *user))
                    .collect(),
            },
        }
    }

    #[test]
    fn test_join_replaces_whole_map_then_swap_exchanges_seats() {
        let mut state = state();
        state.handle_table_message(&joined(&[("alice", user(TableColor::Cyan, 1))]));
        assert_eq!(state.users().len(), 1);
        assert_eq!(state.users()["alice"].seat, 1);

        state.handle_table_message(&joined(&[
            ("alice", user(TableColor::Cyan, 1)),
            ("bob", user(TableColor::Orange, 3)),
        ]));
        state.handle_table_message(&IncomingTableMessage::SeatsSwapped {
            data: SeatsSwappedData {
                username: "alice".to_string(),
                target_username: "bob".to_string(),
            },
        });

        assert_eq!(state.users()["alice"].seat, 3);
        assert_eq!(state.users()["bob"].seat, 1);
        assert_eq!(state.users()["alice"].color, TableColor::Cyan);
        assert_eq!(state.users()["bob"].color, TableColor::Orange);
    }

    #[test]
    fn test_swap_with_missing_user_changes_nothing() {
        let mut state = state();
        state.handle_table_message(&joined(&[("alice", user(TableColor::Cyan, 1))]));
        state.handle_table_message(&IncomingTableMessage::SeatsSwapped {
            data: SeatsSwappedData {
                username: "alice".to_string(),
                target_username: "ghost".to_string(),
            },
        });
        assert_eq!(state.users()["alice"].seat, 1);
    }

    #[test]
    fn test_leave_flips_online_only() {
        let mut state = state();
        state.handle_table_message(&joined(&[("alice", user(TableColor::Cyan, 2))]));
        state.handle_table_message(&IncomingTableMessage::UserLeftTable {
            header: UserLeftHeader {
                username: "alice".to_string(),
                online: false,
            },
        });
        let alice = &state.users()["alice"];
        assert!(!alice.online);
        assert_eq!(alice.seat, 2);
        assert_eq!(alice.color, TableColor::Cyan);
    }

    #[test]
    fn test_kick_deletes_exactly_one_user() {
        let mut state = state();
        state.handle_table_message(&joined(&[
            ("alice", user(TableColor::Cyan, 1)),
            ("bob", user(TableColor::Orange, 2)),
        ]));
        state.handle_table_message(&IncomingTableMessage::KickedFromTable {
            data: KickedData {
                target_username: "bob".to_string(),
            },
        });
        assert!(state.users().contains_key("alice"));
        assert!(!state.users().contains_key("bob"));
    }

    #[test]
    fn test_aspect_follows_table_shape() {
        let mut state = state();
        assert_eq!(state.aspect(), AspectDirection::Width);
        state.recompute_aspect(Some(BoardMetrics {
            width: 500.0,
            height: 800.0,
        }));
        assert_eq!(state.aspect(), AspectDirection::Height);
        state.recompute_aspect(None);
        assert_eq!(state.aspect(), AspectDirection::Height);
    }

    #[test]
    fn test_shift_s_toggles_side_panel_unless_typing() {
        let mut state = state();
        state.handle_key("s", true, false);
        assert!(state.side_panel_active());
        state.handle_key("s", true, true);
        assert!(state.side_panel_active());
        state.handle_key("S", true, false);
        assert!(!state.side_panel_active());
        state.handle_key("s", false, false);
        assert!(!state.side_panel_active());
    }
}
