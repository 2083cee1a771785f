//! The trivial engine: reads and discards every line the server sends it
//! until EOF. Useful as a non-interactive seat when exercising the server
//! without a real player.

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::tokenizer;

/// Drains stdin, validating syntax but ignoring every command, until EOF.
pub async fn run() {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            _ => break,
        };
        if tokenizer::tokenize(&line).is_err() {
            eprintln!("debug invalid command syntax received from server: {line:?}");
        }
    }
    eprintln!("debug exiting");
}
