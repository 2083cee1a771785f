//! Line-protocol framing: splits one input line into a command and its
//! arguments.
//!
//! Two token shapes are recognised, matched left-to-right after trimming
//! leading whitespace: a double-quoted run (which may contain `\"` escapes;
//! the surrounding quotes are stripped on emission) or a bare run of
//! `[A-Za-z0-9_]+`. Any other character at a token-start position fails the
//! whole line.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^(?:"(?:[^"\\]|\\.)*"|[A-Za-z0-9_]+)"#).unwrap())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidSyntax;

impl fmt::Display for InvalidSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid_syntax")
    }
}

impl std::error::Error for InvalidSyntax {}

/// Tokenizes one line. An empty (or whitespace-only) line yields an empty
/// vector rather than an error — callers should silently ignore it.
pub fn tokenize(line: &str) -> Result<Vec<String>, InvalidSyntax> {
    let mut rest = line;
    let mut tokens = Vec::new();

    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            return Ok(tokens);
        }

        let m = token_re().find(rest).ok_or(InvalidSyntax)?;
        let raw = m.as_str();
        let token = if let Some(inner) = raw.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
            unescape_quotes(inner)
        } else {
            raw.to_string()
        };
        tokens.push(token);
        rest = &rest[m.end()..];
    }
}

fn unescape_quotes(s: &str) -> String {
    s.replace("\\\"", "\"")
}

/// Renders a single token the way it would need to appear on the wire:
/// bare if it's already an identifier run, quoted (with internal quotes
/// escaped) otherwise. Used to re-emit arguments such as player names that
/// may contain spaces.
pub fn quote_token(token: &str) -> String {
    let is_bare = !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if is_bare {
        token.to_string()
    } else {
        format!("\"{}\"", token.replace('"', "\\\""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_plain_identifiers() {
        assert_eq!(
            tokenize("move 7h cat").unwrap(),
            vec!["move", "7h", "cat"]
        );
    }

    #[test]
    fn strips_surrounding_quotes() {
        assert_eq!(
            tokenize(r#"move 7h "cat""#).unwrap(),
            vec!["move", "7h", "cat"]
        );
    }

    #[test]
    fn unescapes_internal_quotes() {
        assert_eq!(
            tokenize(r#"debug "he said \"hi\"""#).unwrap(),
            vec!["debug", "he said \"hi\""]
        );
    }

    #[test]
    fn empty_line_yields_no_tokens() {
        assert_eq!(tokenize("").unwrap(), Vec::<String>::new());
        assert_eq!(tokenize("   ").unwrap(), Vec::<String>::new());
    }

    #[test]
    fn invalid_leading_character_fails_whole_line() {
        assert!(tokenize("move @oops").is_err());
    }

    #[test]
    fn round_trips_through_quoting() {
        let original = vec!["kick".to_string(), "a b".to_string(), "plain".to_string()];
        let rendered: Vec<String> = original.iter().map(|t| quote_token(t)).collect();
        let line = rendered.join(" ");
        let reparsed = tokenize(&line).unwrap();
        assert_eq!(reparsed, original);
    }
}
