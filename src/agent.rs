//! A connected participant: identity, privileges, and the seats it controls
//! in its bound game.

use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Privileges {
    pub admin: bool,
}

/// What an inbound command should do, decided without side effects so the
/// caller (the model) can perform the actual send/kick against state this
/// type doesn't have access to.
pub enum Route {
    Kick,
    Denied,
    Game(u32),
    NoGame,
}

pub struct Agent {
    pub id: u32,
    pub channel_id: u32,
    pub name: String,
    pub game_id: Option<u32>,
    pub player_indices: HashSet<usize>,
    pub privileges: Privileges,
}

impl Agent {
    pub fn new(id: u32, channel_id: u32, privileges: Privileges) -> Self {
        Agent {
            id,
            channel_id,
            name: "<unset>".to_string(),
            game_id: None,
            player_indices: HashSet::new(),
            privileges,
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_game(&mut self, game_id: u32) {
        self.game_id = Some(game_id);
    }

    pub fn add_player_index(&mut self, index: usize) {
        self.player_indices.insert(index);
    }

    pub fn route(&self, command: &str) -> Route {
        if command == "kick" {
            return if self.privileges.admin {
                Route::Kick
            } else {
                Route::Denied
            };
        }
        match self.game_id {
            Some(game_id) => Route::Game(game_id),
            None => Route::NoGame,
        }
    }
}
