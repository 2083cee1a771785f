//! Registry of Agents and the single hosted Game; routes inbound events to
//! whichever owns them. Stateless policy glue — the Game carries the
//! interesting state.

use std::collections::HashMap;
use std::sync::Arc;

use crate::agent::{Agent, Privileges, Route};
use crate::dispatcher::Dispatcher;
use crate::error::{self, ErrorKind};
use crate::game::Game;
use crate::wordlist::WordList;

pub struct Model {
    agents: HashMap<u32, Agent>,
    next_agent_id: u32,
    game: Game,
    game_id: u32,
}

impl Model {
    pub fn new(word_list: Arc<WordList>) -> Self {
        let game_id = 0;
        Model {
            agents: HashMap::new(),
            next_agent_id: 0,
            game: Game::new(game_id, word_list),
            game_id,
        }
    }

    /// Registers a new Agent bound to `channel_id` and returns its id.
    pub fn create_agent(&mut self, channel_id: u32, privileges: Privileges) -> u32 {
        let id = self.next_agent_id;
        self.next_agent_id += 1;
        self.agents.insert(id, Agent::new(id, channel_id, privileges));
        id
    }

    /// Sets the display name of an already-registered agent.
    pub fn set_agent_name(&mut self, agent_id: u32, name: impl Into<String>) {
        if let Some(agent) = self.agents.get_mut(&agent_id) {
            agent.set_name(name);
        }
    }

    /// Seats `agent_id` as a new player in the hosted game.
    pub fn seat_player(&mut self, agent_id: u32) {
        let index = self.game.add_player(agent_id);
        if let Some(agent) = self.agents.get_mut(&agent_id) {
            agent.set_game(self.game_id);
            agent.add_player_index(index);
        }
    }

    /// Adds `agent_id` as a watcher of the hosted game without seating it as
    /// a player.
    pub fn watch(&mut self, agent_id: u32) {
        self.game.add_watcher(agent_id);
        if let Some(agent) = self.agents.get_mut(&agent_id) {
            agent.set_game(self.game_id);
        }
    }

    pub async fn start_game(&mut self, dispatcher: &mut Dispatcher) {
        self.game.start(&self.agents, dispatcher).await;
    }

    pub async fn handle_message(
        &mut self,
        agent_id: u32,
        command: &str,
        args: &[String],
        dispatcher: &mut Dispatcher,
    ) {
        let Some(agent) = self.agents.get(&agent_id) else {
            return;
        };

        match agent.route(command) {
            Route::Kick => self.handle_kick(agent_id, args, dispatcher).await,
            Route::Denied => {
                self.reply(agent_id, dispatcher, &error::permission_denied("kick"))
                    .await;
            }
            Route::Game(game_id) if game_id == self.game_id => {
                self.game
                    .handle_message(command, args, agent_id, &self.agents, dispatcher)
                    .await;
            }
            Route::Game(_) | Route::NoGame => {
                self.reply(agent_id, dispatcher, &error::no_game_selected(command))
                    .await;
            }
        }
    }

    async fn handle_kick(&mut self, agent_id: u32, args: &[String], dispatcher: &mut Dispatcher) {
        let target = args
            .first()
            .and_then(|raw| raw.parse::<u32>().ok())
            .and_then(|target_id| self.agents.get(&target_id).map(|a| (target_id, a.channel_id)));

        match target {
            Some((_, channel_id)) => dispatcher.kick(channel_id).await,
            None => {
                self.reply(agent_id, dispatcher, &ErrorKind::InvalidUser.to_string())
                    .await
            }
        }
    }

    pub async fn handle_disconnect(&mut self, agent_id: u32, dispatcher: &mut Dispatcher) {
        let Some(agent) = self.agents.remove(&agent_id) else {
            return;
        };
        if agent.game_id == Some(self.game_id) {
            let player_indices: Vec<usize> = agent.player_indices.iter().copied().collect();
            self.game
                .handle_disconnect(agent_id, &player_indices, &self.agents, dispatcher)
                .await;
        }
    }

    async fn reply(&self, agent_id: u32, dispatcher: &mut Dispatcher, line: &str) {
        if let Some(agent) = self.agents.get(&agent_id) {
            dispatcher.send(agent.channel_id, line).await;
        }
    }
}
