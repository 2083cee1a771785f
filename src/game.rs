//! The Scrabble game: board, racks, pool, turn rotation, and atomic move
//! validation/scoring.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rand::seq::SliceRandom;

use crate::agent::Agent;
use crate::dispatcher::Dispatcher;
use crate::error::{self, ErrorKind};
use crate::move_parser::{self, Direction, Move, NUM_COLS, NUM_ROWS};
use crate::tables;
use crate::tokenizer;
use crate::wordlist::WordList;

pub const INITIAL_TILES: usize = 7;

struct Player {
    agent_id: Option<u32>,
    rack: HashMap<char, u32>,
    score: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct InvalidMove;

pub struct Game {
    #[allow(dead_code)]
    pub id: u32,
    board: Vec<Option<char>>,
    players: Vec<Player>,
    watchers: HashSet<u32>,
    pool: Vec<char>,
    to_move: Option<usize>,
    word_list: Arc<WordList>,
}

impl Game {
    pub fn new(id: u32, word_list: Arc<WordList>) -> Self {
        let mut pool = Vec::new();
        for &(letter, freq) in tables::LETTER_FREQUENCIES.iter() {
            for _ in 0..freq {
                pool.push(letter);
            }
        }
        pool.shuffle(&mut rand::thread_rng());

        Game {
            id,
            board: vec![None; NUM_ROWS * NUM_COLS],
            players: Vec::new(),
            watchers: HashSet::new(),
            pool,
            to_move: None,
            word_list,
        }
    }

    pub fn add_player(&mut self, agent_id: u32) -> usize {
        let index = self.players.len();
        self.players.push(Player {
            agent_id: Some(agent_id),
            rack: HashMap::new(),
            score: 0,
        });
        self.watchers.insert(agent_id);
        index
    }

    pub fn add_watcher(&mut self, agent_id: u32) {
        self.watchers.insert(agent_id);
    }

    pub async fn start(&mut self, agents: &HashMap<u32, Agent>, dispatcher: &mut Dispatcher) {
        for index in 0..self.players.len() {
            for _ in 0..INITIAL_TILES {
                self.draw_tile(index);
            }
        }

        for index in 0..self.players.len() {
            if let Some(agent_id) = self.players[index].agent_id {
                self.send_to(agents, dispatcher, agent_id, "start_game").await;
                self.send_to(
                    agents,
                    dispatcher,
                    agent_id,
                    &format!("player_index {index}"),
                )
                .await;
            }
        }

        for index in 0..self.players.len() {
            let name = self.players[index]
                .agent_id
                .and_then(|agent_id| agents.get(&agent_id))
                .map(|agent| agent.name.clone())
                .unwrap_or_else(|| "<unset>".to_string());
            self.broadcast(
                agents,
                dispatcher,
                &format!("player {index} {}", tokenizer::quote_token(&name)),
            )
            .await;
        }

        self.to_move = Some(0);
        self.broadcast(agents, dispatcher, "to_move 0").await;
    }

    pub async fn handle_message(
        &mut self,
        command: &str,
        args: &[String],
        agent_id: u32,
        agents: &HashMap<u32, Agent>,
        dispatcher: &mut Dispatcher,
    ) {
        match command {
            "move" => {
                if args.len() != 2 {
                    self.send_to(agents, dispatcher, agent_id, &ErrorKind::MoveSyntax.to_string())
                        .await;
                    return;
                }
                match move_parser::parse_move(&args[0], &args[1]) {
                    Ok(mv) => self.request_move(agent_id, agents, dispatcher, mv).await,
                    Err(_) => {
                        self.send_to(agents, dispatcher, agent_id, &ErrorKind::MoveSyntax.to_string())
                            .await;
                    }
                }
            }
            "get_word_list" => self.send_word_list(agents, dispatcher, agent_id).await,
            "get_rack" => match args.first().and_then(|s| s.parse::<usize>().ok()) {
                Some(index) => self.send_rack(agents, dispatcher, agent_id, index).await,
                None => {
                    self.send_to(agents, dispatcher, agent_id, &ErrorKind::InvalidPlayerIndex.to_string())
                        .await;
                }
            },
            other => {
                self.send_to(
                    agents,
                    dispatcher,
                    agent_id,
                    &error::unknown_command(other),
                )
                .await;
            }
        }
    }

    pub async fn handle_disconnect(
        &mut self,
        agent_id: u32,
        player_indices: &[usize],
        agents: &HashMap<u32, Agent>,
        dispatcher: &mut Dispatcher,
    ) {
        for &index in player_indices {
            if let Some(player) = self.players.get_mut(index) {
                player.agent_id = None;
            }
        }
        self.watchers.remove(&agent_id);
        for &index in player_indices {
            self.broadcast(agents, dispatcher, &format!("dropped {index}"))
                .await;
        }
    }

    async fn request_move(
        &mut self,
        agent_id: u32,
        agents: &HashMap<u32, Agent>,
        dispatcher: &mut Dispatcher,
        mv: Move,
    ) {
        let Some(to_move) = self.to_move else {
            self.send_to(agents, dispatcher, agent_id, &ErrorKind::NotToMove.to_string())
                .await;
            return;
        };
        let owns_turn = self.players[to_move].agent_id == Some(agent_id);
        if !owns_turn {
            self.send_to(agents, dispatcher, agent_id, &ErrorKind::NotToMove.to_string())
                .await;
            return;
        }

        match self.make_move(to_move, &mv) {
            Err(InvalidMove) => {
                self.send_to(agents, dispatcher, agent_id, &ErrorKind::MoveInvalid.to_string())
                    .await;
            }
            Ok(score) => {
                self.players[to_move].score += score;
                let line = format!("move_made {to_move} {mv} {score}");
                self.broadcast(agents, dispatcher, &line).await;

                while self.rack_size(to_move) < INITIAL_TILES {
                    if !self.draw_tile(to_move) {
                        break;
                    }
                }

                self.to_move = Some((to_move + 1) % self.players.len());
                self.broadcast(
                    agents,
                    dispatcher,
                    &format!("to_move {}", self.to_move.unwrap()),
                )
                .await;
            }
        }
    }

    /// Validates and scores `mv` against copies of the board and the
    /// acting player's rack; only commits either if every induced word of
    /// length > 1 is in the word list.
    fn make_move(&mut self, player_index: usize, mv: &Move) -> Result<u32, InvalidMove> {
        let mut board = self.board.clone();
        let mut rack = self.players[player_index].rack.clone();
        let mut score: u32 = 0;

        let (row, col) = mv.start;
        let (dx, dy): (i32, i32) = match mv.direction {
            Direction::Horizontal => (1, 0),
            Direction::Vertical => (0, 1),
        };
        let (ox, oy): (i32, i32) = match mv.direction {
            Direction::Horizontal => (0, 1),
            Direction::Vertical => (1, 0),
        };

        let mut words_made: Vec<(i32, i32, i32, i32)> = vec![(col as i32, row as i32, dx, dy)];

        for (letter_index, &letter) in mv.letters.iter().enumerate() {
            let tile_x = col as i32 + dx * letter_index as i32;
            let tile_y = row as i32 + dy * letter_index as i32;
            if !in_bounds(tile_x, tile_y) {
                return Err(InvalidMove);
            }
            let idx = board_index(tile_x, tile_y);
            match board[idx] {
                Some(existing) if existing != letter => return Err(InvalidMove),
                Some(_) => {} // passes through an existing tile; no rack consumption
                None => {
                    let count = rack.get(&letter).copied().unwrap_or(0);
                    if count < 1 {
                        return Err(InvalidMove);
                    }
                    rack.insert(letter, count - 1);
                    board[idx] = Some(letter);
                }
            }
            words_made.push((tile_x, tile_y, ox, oy));
        }

        for &(pos_x, pos_y, word_dx, word_dy) in &words_made {
            let mut offsets = [0i32; 2];
            for (slot, scale) in [-1i32, 1i32].into_iter().enumerate() {
                let mut extent = 0i32;
                for step in 1.. {
                    let test_x = pos_x + scale * word_dx * step;
                    let test_y = pos_y + scale * word_dy * step;
                    if !in_bounds(test_x, test_y) {
                        break;
                    }
                    if board[board_index(test_x, test_y)].is_none() {
                        break;
                    }
                    extent += scale;
                }
                offsets[slot] = extent;
            }

            let (start_offset, end_offset) = (offsets[0], offsets[1]);
            let length = end_offset - start_offset + 1;
            if length > 1 {
                let mut word = String::with_capacity(length as usize);
                for i in 0..length {
                    let tile_x = pos_x + (start_offset + i) * word_dx;
                    let tile_y = pos_y + (start_offset + i) * word_dy;
                    let letter = board[board_index(tile_x, tile_y)]
                        .expect("every cell along an induced word is filled");
                    word.push(letter);
                    score += tables::letter_score(letter);
                }
                if !self.word_list.contains(&word) {
                    return Err(InvalidMove);
                }
            }
        }

        self.board = board;
        self.players[player_index].rack = rack;
        Ok(score)
    }

    /// Draws one tile from the pool into the player's rack. Returns `false`
    /// (a no-op, not an error) once the pool is empty.
    fn draw_tile(&mut self, player_index: usize) -> bool {
        match self.pool.pop() {
            Some(tile) => {
                *self.players[player_index].rack.entry(tile).or_insert(0) += 1;
                true
            }
            None => false,
        }
    }

    fn rack_size(&self, player_index: usize) -> usize {
        self.players[player_index].rack.values().sum::<u32>() as usize
    }

    async fn send_word_list(
        &self,
        agents: &HashMap<u32, Agent>,
        dispatcher: &mut Dispatcher,
        agent_id: u32,
    ) {
        self.send_to(
            agents,
            dispatcher,
            agent_id,
            &format!("word_count {}", self.word_list.len()),
        )
        .await;
        for (index, word) in self.word_list.iter().enumerate() {
            self.send_to(agents, dispatcher, agent_id, &format!("word {index} {word}"))
                .await;
        }
    }

    async fn send_rack(
        &self,
        agents: &HashMap<u32, Agent>,
        dispatcher: &mut Dispatcher,
        agent_id: u32,
        player_index: usize,
    ) {
        let owns_seat = self
            .players
            .get(player_index)
            .is_some_and(|p| p.agent_id == Some(agent_id));
        if !owns_seat {
            self.send_to(agents, dispatcher, agent_id, &ErrorKind::InvalidPlayerIndex.to_string())
                .await;
            return;
        }

        let player = &self.players[player_index];
        self.send_to(
            agents,
            dispatcher,
            agent_id,
            &format!("tile_count {}", self.rack_size(player_index)),
        )
        .await;

        let mut i = 0;
        for (&tile, &count) in &player.rack {
            for _ in 0..count {
                self.send_to(agents, dispatcher, agent_id, &format!("tile {i} {tile}"))
                    .await;
                i += 1;
            }
        }
    }

    async fn broadcast(&self, agents: &HashMap<u32, Agent>, dispatcher: &mut Dispatcher, line: &str) {
        for &watcher in &self.watchers {
            if let Some(agent) = agents.get(&watcher) {
                dispatcher.send(agent.channel_id, line).await;
            }
        }
    }

    async fn send_to(
        &self,
        agents: &HashMap<u32, Agent>,
        dispatcher: &mut Dispatcher,
        agent_id: u32,
        line: &str,
    ) {
        if let Some(agent) = agents.get(&agent_id) {
            dispatcher.send(agent.channel_id, line).await;
        }
    }

    #[cfg(test)]
    fn letter_total(&self, letter: char) -> u32 {
        let in_pool = self.pool.iter().filter(|&&c| c == letter).count() as u32;
        let in_racks: u32 = self
            .players
            .iter()
            .map(|p| p.rack.get(&letter).copied().unwrap_or(0))
            .sum();
        let on_board = self.board.iter().filter(|&&c| c == Some(letter)).count() as u32;
        in_pool + in_racks + on_board
    }
}

fn in_bounds(x: i32, y: i32) -> bool {
    x >= 0 && (x as usize) < NUM_COLS && y >= 0 && (y as usize) < NUM_ROWS
}

fn board_index(x: i32, y: i32) -> usize {
    (y as usize) * NUM_COLS + (x as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Privileges;
    use crate::logger::Logger;
    use std::collections::HashMap;

    fn word_list() -> Arc<WordList> {
        Arc::new(WordList::from_words(
            ["cat", "dog", "drape", "pear", "apple"]
                .into_iter()
                .map(String::from),
        ))
    }

    fn test_dispatcher() -> Dispatcher {
        Dispatcher::new(Arc::new(Logger::new(0)))
    }

    fn two_player_agents() -> HashMap<u32, Agent> {
        let mut agents = HashMap::new();
        let mut a0 = Agent::new(0, 0, Privileges { admin: true });
        a0.set_name("player0");
        a0.set_game(0);
        a0.add_player_index(0);
        agents.insert(0, a0);
        let mut a1 = Agent::new(1, 1, Privileges { admin: true });
        a1.set_name("player1");
        a1.set_game(0);
        a1.add_player_index(1);
        agents.insert(1, a1);
        agents
    }

    fn stock_rack(game: &mut Game, player_index: usize, letters: &str) {
        for c in letters.chars() {
            *game.players[player_index].rack.entry(c).or_insert(0) += 1;
        }
    }

    #[test]
    fn tile_conservation_holds_after_construction() {
        let game = Game::new(0, word_list());
        for &(letter, freq) in tables::LETTER_FREQUENCIES.iter() {
            assert_eq!(game.letter_total(letter), freq, "letter {letter}");
        }
    }

    #[test]
    fn single_letter_word_yields_zero_score_and_is_accepted() {
        let mut game = Game::new(0, word_list());
        game.add_player(0);
        stock_rack(&mut game, 0, "x");
        let mv = move_parser::parse_move("8h", "x").unwrap();
        let score = game.make_move(0, &mv).expect("single letter placement accepted");
        assert_eq!(score, 0);
    }

    #[test]
    fn valid_word_scores_sum_of_letters() {
        let mut game = Game::new(0, word_list());
        game.add_player(0);
        stock_rack(&mut game, 0, "cat");
        let mv = move_parser::parse_move("7h", "cat").unwrap();
        let score = game.make_move(0, &mv).expect("cat is in the word list");
        assert_eq!(score, 5); // c=3 + a=1 + t=1
        assert_eq!(game.rack_size(0), 0);
    }

    #[test]
    fn invalid_word_rolls_back_board_and_rack() {
        let mut game = Game::new(0, word_list());
        game.add_player(0);
        stock_rack(&mut game, 0, "caz");
        let before_board = game.board.clone();
        let before_rack = game.players[0].rack.clone();

        let mv = move_parser::parse_move("7h", "caz").unwrap();
        let err = game.make_move(0, &mv);
        assert!(err.is_err());
        assert_eq!(game.board, before_board);
        assert_eq!(game.players[0].rack, before_rack);
    }

    #[test]
    fn out_of_bounds_placement_is_invalid() {
        let mut game = Game::new(0, word_list());
        game.add_player(0);
        stock_rack(&mut game, 0, "catcat");
        // starting at column 'm' (12) going right with 6 letters runs off the
        // 15-wide board.
        let mv = move_parser::parse_move("1m", "catcat").unwrap();
        assert!(game.make_move(0, &mv).is_err());
    }

    #[tokio::test]
    async fn turn_advances_on_success_and_holds_on_failure() {
        let mut game = Game::new(0, word_list());
        game.add_player(0);
        game.add_player(1);
        let agents = two_player_agents();
        let mut dispatcher = test_dispatcher();

        game.to_move = Some(0);
        stock_rack(&mut game, 0, "cat");
        game.handle_message(
            "move",
            &["7h".to_string(), "cat".to_string()],
            0,
            &agents,
            &mut dispatcher,
        )
        .await;
        assert_eq!(game.to_move, Some(1));

        stock_rack(&mut game, 1, "caz");
        game.handle_message(
            "move",
            &["8h".to_string(), "caz".to_string()],
            1,
            &agents,
            &mut dispatcher,
        )
        .await;
        // caz isn't a word; to_move must not have advanced.
        assert_eq!(game.to_move, Some(1));
    }

    #[tokio::test]
    async fn move_out_of_turn_is_rejected_without_mutation() {
        let mut game = Game::new(0, word_list());
        game.add_player(0);
        game.add_player(1);
        let agents = two_player_agents();
        let mut dispatcher = test_dispatcher();

        game.to_move = Some(0);
        stock_rack(&mut game, 1, "cat");
        game.handle_message(
            "move",
            &["7h".to_string(), "cat".to_string()],
            1,
            &agents,
            &mut dispatcher,
        )
        .await;
        assert_eq!(game.to_move, Some(0));
        assert!(game.board.iter().all(|c| c.is_none()));
    }

    #[tokio::test]
    async fn disconnect_clears_seat_and_broadcasts_dropped() {
        let mut game = Game::new(0, word_list());
        game.add_player(0);
        game.add_player(1);
        let agents = two_player_agents();
        let mut dispatcher = test_dispatcher();

        game.handle_disconnect(0, &[0], &agents, &mut dispatcher).await;
        assert_eq!(game.players[0].agent_id, None);
        assert!(!game.watchers.contains(&0));
        // seat 1 is untouched and turn rotation still references it
        assert_eq!(game.players[1].agent_id, Some(1));
    }
}
