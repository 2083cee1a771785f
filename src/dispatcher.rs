//! Serializes events from every channel onto one consumer task. This is the
//! single point where `Model`/`Agent`/`Game` state is ever mutated, which is
//! what makes the rest of the system safe without per-object locks.

use std::collections::HashMap;
use std::fmt;
use std::process::ExitStatus;
use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::channel::{Channel, ChannelEvent};
use crate::logger::Logger;
use crate::model::Model;

/// Loggable occurrences raised by the dispatcher itself (as opposed to game
/// or wire-protocol events, which go out over a channel instead).
enum DispatcherEvent {
    ChildExited { channel_id: u32, status: ExitStatus },
}

impl fmt::Display for DispatcherEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatcherEvent::ChildExited { channel_id, status } => {
                write!(f, "channel {channel_id} child exited: {status}")
            }
        }
    }
}

pub struct Dispatcher {
    channels: HashMap<u32, Channel>,
    events_tx: UnboundedSender<ChannelEvent>,
    events_rx: UnboundedReceiver<ChannelEvent>,
    finished: bool,
    logger: Arc<Logger>,
}

impl Dispatcher {
    pub fn new(logger: Arc<Logger>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Dispatcher {
            channels: HashMap::new(),
            events_tx,
            events_rx,
            finished: false,
            logger,
        }
    }

    /// A clone of this the dispatcher can hand to a channel factory so its
    /// reader task can enqueue events.
    pub fn events_sender(&self) -> UnboundedSender<ChannelEvent> {
        self.events_tx.clone()
    }

    pub fn register(&mut self, channel: Channel) {
        self.channels.insert(channel.id, channel);
    }

    /// Resolves `channel_id` and writes `line` through its I/O. Discarded
    /// silently if the channel has already been removed.
    pub async fn send(&self, channel_id: u32, line: &str) {
        if let Some(channel) = self.channels.get(&channel_id) {
            channel.send_line(line).await;
        }
    }

    /// Closes the target channel out-of-band. Its reader task will observe
    /// end-of-stream and flow through normal finalization. For a
    /// child-process channel this blocks the consumer task until the child
    /// exits — mirroring the reference implementation, which performs the
    /// same wait on the same single-threaded event loop.
    pub async fn kick(&mut self, channel_id: u32) {
        if let Some(channel) = self.channels.get_mut(&channel_id) {
            if let Some(status) = channel.close().await {
                self.logger
                    .info(DispatcherEvent::ChildExited { channel_id, status });
            }
        }
    }

    async fn next_event(&mut self) -> Option<ChannelEvent> {
        self.events_rx.recv().await
    }

    /// Runs the consumer loop to completion: until the last master channel
    /// disconnects, drains whatever is left in the queue, then closes every
    /// remaining channel.
    pub async fn run(mut self, mut model: Model) {
        while !self.finished {
            let Some(event) = self.next_event().await else {
                break;
            };
            self.dispatch_event(event, &mut model).await;
        }

        while let Ok(event) = self.events_rx.try_recv() {
            if let ChannelEvent::Finished { channel_id } = event {
                self.channels.remove(&channel_id);
            }
        }

        for (channel_id, mut channel) in self.channels.drain() {
            if let Some(status) = channel.close().await {
                self.logger
                    .info(DispatcherEvent::ChildExited { channel_id, status });
            }
        }
    }

    async fn dispatch_event(&mut self, event: ChannelEvent, model: &mut Model) {
        match event {
            ChannelEvent::Finished { channel_id } => {
                self.cleanup_channel(channel_id, model).await;
            }
            ChannelEvent::Message {
                channel_id,
                command,
                args,
            } => {
                let Some(agent_id) = self.channels.get(&channel_id).map(|c| c.agent_id) else {
                    return;
                };
                model.handle_message(agent_id, &command, &args, self).await;
            }
        }
    }

    async fn cleanup_channel(&mut self, channel_id: u32, model: &mut Model) {
        let Some(channel) = self.channels.remove(&channel_id) else {
            return;
        };
        channel.cleanup().await;
        let agent_id = channel.agent_id;
        model.handle_disconnect(agent_id, self).await;

        let masters_remaining = self.channels.values().filter(|c| c.master).count();
        if masters_remaining == 0 {
            self.finished = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Privileges;
    use crate::model::Model;
    use crate::wordlist::WordList;
    use std::time::Duration;

    /// Spawns two real child-process channels, seats them as players, runs a
    /// command through the full channel → dispatcher → model → game path,
    /// and confirms the dispatcher shuts down once its master channel exits.
    #[tokio::test]
    async fn full_wiring_processes_a_command_and_shuts_down_on_master_exit() {
        let word_list = Arc::new(WordList::from_words(
            ["cat", "dog"].into_iter().map(String::from),
        ));
        let mut model = Model::new(word_list);
        let mut dispatcher = Dispatcher::new(Arc::new(Logger::new(0)));

        let agent0 = model.create_agent(0, Privileges { admin: true });
        let mut engine0 =
            Channel::spawn_child(0, agent0, "echo get_word_list", dispatcher.events_sender())
                .expect("spawn engine0");
        engine0.master = true;
        dispatcher.register(engine0);
        model.seat_player(agent0);

        let agent1 = model.create_agent(1, Privileges { admin: true });
        let engine1 = Channel::spawn_child(1, agent1, "cat", dispatcher.events_sender())
            .expect("spawn engine1");
        dispatcher.register(engine1);
        model.seat_player(agent1);

        model.start_game(&mut dispatcher).await;

        // engine0 is the only master channel; once `echo` exits and its
        // reader observes EOF, the dispatcher should drain and terminate
        // rather than hang waiting on engine1's still-running `cat`.
        tokio::time::timeout(Duration::from_secs(5), dispatcher.run(model))
            .await
            .expect("dispatcher should shut down once the master channel exits");
    }
}
