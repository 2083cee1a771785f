//! The wire-level `error <kind> [<detail>]` taxonomy, as a typed enum with a
//! manual `Display` rather than a raw formatted string at each call site.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidSyntax,
    NotToMove,
    MoveSyntax,
    MoveInvalid,
    InvalidPlayerIndex,
    InvalidUser,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            ErrorKind::InvalidSyntax => "invalid_syntax",
            ErrorKind::NotToMove => "not_to_move",
            ErrorKind::MoveSyntax => "move_syntax",
            ErrorKind::MoveInvalid => "move_invalid",
            ErrorKind::InvalidPlayerIndex => "invalid_player_index",
            ErrorKind::InvalidUser => "invalid_user",
        };
        write!(f, "error {tag}")
    }
}

/// Formats an `error <kind> <detail>` line. `unknown_command` and
/// `no_game_selected` always carry a detail (the offending command) so they
/// are built directly rather than through [`ErrorKind`].
pub fn unknown_command(command: &str) -> String {
    format!("error unknown_command {command}")
}

pub fn no_game_selected(command: &str) -> String {
    format!("error no_game_selected {command}")
}

pub fn permission_denied(command: &str) -> String {
    format!("error permission_denied {command}")
}
