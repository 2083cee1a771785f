//! Parses a `<position> <letters>` pair into a typed [`Move`].
//!
//! The position is either `<letter><digits>` (vertical) or
//! `<digits><letter>` (horizontal). Rows are 1-based and columns are
//! `a..o` externally; both are converted to 0-based internally.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

pub const NUM_ROWS: usize = 15;
pub const NUM_COLS: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Move {
    pub start: (usize, usize), // (row, col), 0-based
    pub direction: Direction,
    pub letters: Vec<char>,
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (row, col) = self.start;
        let col_letter = (b'a' + col as u8) as char;
        match self.direction {
            Direction::Horizontal => write!(f, "{}{}", row + 1, col_letter)?,
            Direction::Vertical => write!(f, "{}{}", col_letter, row + 1)?,
        }
        write!(f, " ")?;
        for &letter in &self.letters {
            write!(f, "{letter}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveSyntaxError;

impl fmt::Display for MoveSyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "move_syntax")
    }
}

impl std::error::Error for MoveSyntaxError {}

fn vertical_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([a-z])([0-9]+)$").unwrap())
}

fn horizontal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([0-9]+)([a-z])$").unwrap())
}

pub fn parse_move(position: &str, letters: &str) -> Result<Move, MoveSyntaxError> {
    let (direction, col_str, row_str) = if let Some(caps) = vertical_re().captures(position) {
        (
            Direction::Vertical,
            caps[1].to_string(),
            caps[2].to_string(),
        )
    } else if let Some(caps) = horizontal_re().captures(position) {
        (
            Direction::Horizontal,
            caps[2].to_string(),
            caps[1].to_string(),
        )
    } else {
        return Err(MoveSyntaxError);
    };

    let row: i64 = row_str.parse().map_err(|_| MoveSyntaxError)? - 1;
    if row < 0 || row as usize >= NUM_ROWS {
        return Err(MoveSyntaxError);
    }
    let col = col_str.chars().next().ok_or(MoveSyntaxError)? as i64 - 'a' as i64;
    if col < 0 || col as usize >= NUM_COLS {
        return Err(MoveSyntaxError);
    }

    let mut parsed_letters = Vec::with_capacity(letters.len());
    for c in letters.chars() {
        let lower = c.to_ascii_lowercase();
        if !lower.is_ascii_lowercase() {
            return Err(MoveSyntaxError);
        }
        parsed_letters.push(lower);
    }
    if parsed_letters.is_empty() {
        return Err(MoveSyntaxError);
    }

    Ok(Move {
        start: (row as usize, col as usize),
        direction,
        letters: parsed_letters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_horizontal_form() {
        let mv = parse_move("7h", "cat").unwrap();
        assert_eq!(mv.start, (6, 7));
        assert_eq!(mv.direction, Direction::Horizontal);
        assert_eq!(mv.letters, vec!['c', 'a', 't']);
    }

    #[test]
    fn parses_vertical_form() {
        let mv = parse_move("h7", "cat").unwrap();
        assert_eq!(mv.start, (6, 7));
        assert_eq!(mv.direction, Direction::Vertical);
    }

    #[test]
    fn rejects_out_of_range_row() {
        assert!(parse_move("16h", "cat").is_err());
        assert!(parse_move("0h", "cat").is_err());
    }

    #[test]
    fn rejects_out_of_range_col() {
        assert!(parse_move("7p", "cat").is_err());
    }

    #[test]
    fn rejects_non_alpha_letters() {
        assert!(parse_move("7h", "c4t").is_err());
    }

    #[test]
    fn lowercases_letters() {
        let mv = parse_move("7h", "CAT").unwrap();
        assert_eq!(mv.letters, vec!['c', 'a', 't']);
    }

    #[test]
    fn display_round_trips_horizontal() {
        let mv = parse_move("7h", "cat").unwrap();
        assert_eq!(mv.to_string(), "7h cat");
    }

    #[test]
    fn display_round_trips_vertical() {
        let mv = parse_move("h7", "cat").unwrap();
        assert_eq!(mv.to_string(), "h7 cat");
    }

    #[test]
    fn boundary_corners_accepted() {
        assert!(parse_move("1a", "c").is_ok());
        assert!(parse_move("15o", "c").is_ok());
    }
}
