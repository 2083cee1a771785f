//! Channel: pairs a line-stream I/O (stdio or a spawned child process) with
//! the reader task that frames incoming records and a writer handle the
//! dispatcher can use to push outbound lines.
//!
//! The reader task owns the read half exclusively; the write half lives
//! behind a `tokio::sync::Mutex` shared between the reader (for immediate
//! `error invalid_syntax` replies) and whoever holds the `Channel` handle
//! (the dispatcher, for outbound sends and kicks).

use std::process::Stdio as StdStdio;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Mutex;

use crate::error::ErrorKind;
use crate::tokenizer;

/// One event emitted by a channel's reader task. `Finished` is emitted
/// exactly once, at the end of the channel's lifetime, regardless of why
/// the reader loop ended.
#[derive(Debug, Clone)]
pub enum ChannelEvent {
    Message {
        channel_id: u32,
        command: String,
        args: Vec<String>,
    },
    Finished {
        channel_id: u32,
    },
}

enum ReaderLines {
    Stdio(Lines<BufReader<tokio::io::Stdin>>),
    Child(Lines<BufReader<ChildStdout>>),
}

impl ReaderLines {
    async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        match self {
            ReaderLines::Stdio(lines) => lines.next_line().await,
            ReaderLines::Child(lines) => lines.next_line().await,
        }
    }
}

enum Writer {
    Stdio(tokio::io::Stdout),
    Child(ChildStdin),
}

impl Writer {
    /// Writes one line plus a trailing newline. A write failure means the
    /// peer is gone; the send is discarded rather than propagated.
    async fn send_line(&mut self, line: &str) {
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');
        let result = match self {
            Writer::Stdio(w) => w.write_all(buf.as_bytes()).await,
            Writer::Child(w) => w.write_all(buf.as_bytes()).await,
        };
        let _ = result;
    }

    /// Idempotent close of the write side only. A no-op for stdio.
    async fn cleanup(&mut self) {
        if let Writer::Child(w) = self {
            let _ = w.shutdown().await;
        }
    }
}

/// A registered channel. Owned by the dispatcher's channel registry.
pub struct Channel {
    pub id: u32,
    pub agent_id: u32,
    pub master: bool,
    writer: Arc<Mutex<Writer>>,
    child: Option<Child>,
}

impl Channel {
    /// Wraps the process's own stdio. Always `master`: an stdio channel's
    /// disconnection is load-bearing for shutdown.
    pub fn spawn_stdio(
        id: u32,
        agent_id: u32,
        events: UnboundedSender<ChannelEvent>,
    ) -> Channel {
        let lines = ReaderLines::Stdio(BufReader::new(tokio::io::stdin()).lines());
        let writer = Arc::new(Mutex::new(Writer::Stdio(tokio::io::stdout())));

        tokio::spawn(run_reader(id, lines, Arc::clone(&writer), events));

        Channel {
            id,
            agent_id,
            master: true,
            writer,
            child: None,
        }
    }

    /// Spawns `cmd` through the host's default shell with piped stdin/stdout
    /// and stderr merged into stdout, then starts its reader task.
    pub fn spawn_child(
        id: u32,
        agent_id: u32,
        cmd: &str,
        events: UnboundedSender<ChannelEvent>,
    ) -> std::io::Result<Channel> {
        // `2>&1` inside the shell duplicates the child's stderr onto the same
        // pipe its stdout was given below, merging the two streams the way a
        // plain child-process I/O is specified to.
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(format!("{cmd} 2>&1"))
            .stdin(StdStdio::piped())
            .stdout(StdStdio::piped())
            .spawn()?;

        let stdout = child.stdout.take().expect("piped stdout");
        let stdin = child.stdin.take().expect("piped stdin");

        let lines = ReaderLines::Child(BufReader::new(stdout).lines());
        let writer = Arc::new(Mutex::new(Writer::Child(stdin)));

        tokio::spawn(run_reader(id, lines, Arc::clone(&writer), events));

        Ok(Channel {
            id,
            agent_id,
            master: false,
            writer,
            child: Some(child),
        })
    }

    pub async fn send_line(&self, line: &str) {
        self.writer.lock().await.send_line(line).await;
    }

    /// Idempotent close of the write side only; does not wait for a child
    /// to exit. Used when a channel finalizes on its own (EOF/`exit`).
    pub async fn cleanup(&self) {
        self.writer.lock().await.cleanup().await;
    }

    /// Full close: shuts down the write side and, for a child-process
    /// channel, waits for the child to exit and reports its return code.
    /// Used by the kick path and by the final shutdown sweep. A no-op for
    /// stdio, matching the stdio I/O's own close semantics.
    pub async fn close(&mut self) -> Option<std::process::ExitStatus> {
        self.writer.lock().await.cleanup().await;
        match self.child.as_mut() {
            Some(child) => child.wait().await.ok(),
            None => None,
        }
    }
}

async fn run_reader(
    channel_id: u32,
    mut lines: ReaderLines,
    writer: Arc<Mutex<Writer>>,
    events: UnboundedSender<ChannelEvent>,
) {
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            _ => break,
        };

        match tokenizer::tokenize(&line) {
            Err(_) => {
                writer
                    .lock()
                    .await
                    .send_line(&ErrorKind::InvalidSyntax.to_string())
                    .await;
                continue;
            }
            Ok(tokens) if tokens.is_empty() => continue,
            Ok(mut tokens) => {
                let command = tokens.remove(0);
                if command == "exit" {
                    break;
                }
                if command == "debug" {
                    if let Some(text) = tokens.first() {
                        eprintln!("{channel_id}: {text}");
                    }
                    continue;
                }
                let _ = events.send(ChannelEvent::Message {
                    channel_id,
                    command,
                    args: tokens,
                });
            }
        }
    }

    let _ = events.send(ChannelEvent::Finished { channel_id });
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn child_echo_round_trips_a_message() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut channel = Channel::spawn_child(1, 7, "cat", tx).expect("spawn cat");

        channel.send_line("hello_world").await;

        let event = rx.recv().await.expect("expected an event");
        match event {
            ChannelEvent::Message {
                channel_id,
                command,
                args,
            } => {
                assert_eq!(channel_id, 1);
                assert_eq!(command, "hello_world");
                assert!(args.is_empty());
            }
            other => panic!("expected Message, got {other:?}"),
        }

        channel.close().await;
    }

    #[tokio::test]
    async fn child_finalizes_exactly_once_on_eof() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut channel = Channel::spawn_child(2, 9, "true", tx).expect("spawn true");
        channel.close().await;

        let mut finished_count = 0;
        while let Ok(event) = rx.try_recv() {
            if matches!(event, ChannelEvent::Finished { channel_id: 2 }) {
                finished_count += 1;
            }
        }
        // `true` exits immediately, closing its stdout; the reader task
        // should observe EOF and emit its terminal event on its own.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        while let Ok(event) = rx.try_recv() {
            if matches!(event, ChannelEvent::Finished { channel_id: 2 }) {
                finished_count += 1;
            }
        }
        assert_eq!(finished_count, 1);
    }
}
