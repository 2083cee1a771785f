use std::fmt;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand};
use scrabble_server::agent::Privileges;
use scrabble_server::channel::Channel;
use scrabble_server::dispatcher::Dispatcher;
use scrabble_server::dummy_engine;
use scrabble_server::logger::Logger;
use scrabble_server::model::Model;
use scrabble_server::wordlist::WordList;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(ClapArgs, Debug, Clone)]
struct GameArgs {
    /// Seat an engine: a child-process command, or "-" for the interactive
    /// stdio agent. Repeatable; at least two required.
    #[arg(short = 'e', long = "engine")]
    engine: Vec<String>,

    /// Path to the word list file
    #[arg(short = 'w', long = "words")]
    words: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(
    name = "scrabble",
    version,
    about = "A turn-based Scrabble-style game server",
    long_about = "Hosts a single Scrabble game over line-oriented channels: the\n\
                  process's own stdio plus zero or more spawned engine children.\n\
                  Runs a game by default; pass a subcommand to do something else."
)]
struct Args {
    #[command(flatten)]
    game: GameArgs,

    #[command(subcommand)]
    command: Option<Command>,

    /// Increase output verbosity (-v verbose, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Host a game (the default when no subcommand is given)
    Game(GameArgs),
    /// Run the trivial engine that discards every command it receives
    DummyEngine,
}

// ── OPERATIONAL LOG EVENTS ────────────────────────────────────────────────────

enum ServerEvent<'a> {
    Starting { engines: usize },
    SpawningEngine { cmd: &'a str },
    SpawnFailed { cmd: &'a str, error: &'a std::io::Error },
    WordListLoaded { words: usize },
    MainThreadExiting,
}

impl fmt::Display for ServerEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerEvent::Starting { engines } => write!(f, "starting game with {engines} engines"),
            ServerEvent::SpawningEngine { cmd } => write!(f, "spawning engine: {cmd}"),
            ServerEvent::SpawnFailed { cmd, error } => {
                write!(f, "failed to spawn engine {cmd:?}: {error}")
            }
            ServerEvent::WordListLoaded { words } => write!(f, "loaded {words} words"),
            ServerEvent::MainThreadExiting => write!(f, "main thread exiting"),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let logger = Arc::new(Logger::new(args.verbose));

    match args.command {
        Some(Command::DummyEngine) => {
            dummy_engine::run().await;
            ExitCode::SUCCESS
        }
        Some(Command::Game(game_args)) => run_game(&logger, game_args).await,
        None => run_game(&logger, args.game).await,
    }
}

async fn run_game(logger: &Arc<Logger>, game_args: GameArgs) -> ExitCode {
    if game_args.engine.len() < 2 {
        eprintln!("at least 2 engines must be specified on command line using --engine.");
        return ExitCode::FAILURE;
    }
    let Some(words_path) = game_args.words else {
        eprintln!("a file containing the list of valid words must be specified using --words.");
        return ExitCode::FAILURE;
    };

    let word_list = match WordList::load(&words_path).await {
        Ok(list) => list,
        Err(error) => {
            eprintln!("unable to load word list from {words_path:?}: {error}");
            return ExitCode::FAILURE;
        }
    };
    logger.info(ServerEvent::WordListLoaded { words: word_list.len() });

    let mut model = Model::new(Arc::new(word_list));
    let mut dispatcher = Dispatcher::new(Arc::clone(logger));

    logger.info(ServerEvent::Starting { engines: game_args.engine.len() });

    let std_agent_id = model.create_agent(0, Privileges { admin: true });
    model.set_agent_name(std_agent_id, format!("player{std_agent_id}"));
    dispatcher.register(Channel::spawn_stdio(0, std_agent_id, dispatcher.events_sender()));

    let mut next_channel_id: u32 = 1;
    for engine in &game_args.engine {
        if engine == "-" {
            model.seat_player(std_agent_id);
            continue;
        }

        logger.verbose(ServerEvent::SpawningEngine { cmd: engine });
        let channel_id = next_channel_id;
        next_channel_id += 1;
        let agent_id = model.create_agent(channel_id, Privileges { admin: true });
        model.set_agent_name(agent_id, format!("player{agent_id}"));

        match Channel::spawn_child(channel_id, agent_id, engine, dispatcher.events_sender()) {
            Ok(channel) => {
                dispatcher.register(channel);
                model.seat_player(agent_id);
            }
            Err(error) => {
                logger.warn(ServerEvent::SpawnFailed { cmd: engine, error: &error });
                return ExitCode::FAILURE;
            }
        }
    }

    model.watch(std_agent_id);
    model.start_game(&mut dispatcher).await;

    dispatcher.run(model).await;

    logger.info(ServerEvent::MainThreadExiting);
    ExitCode::SUCCESS
}
