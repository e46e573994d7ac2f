mod controller;
mod model;
mod session;
mod stats;
mod store;
mod view;
mod words;
use crate::controller::Controller;
use crate::session::Session;
use crate::store::{open_store, SavedState};
use crate::view::stats_lines;
use crate::words::{Word, WordList, WordPool};
use anyhow::Context;
use lexopt::{Arg, Parser, ValueExt};
use patharg::InputArg;
use std::fs::File;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, Eq, PartialEq)]
struct Options {
    state_file: Option<PathBuf>,
    log_file: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
struct GameOptions {
    answers: WordList,
    guesses: WordList,
    word: Option<Word>,
    hard: bool,
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum Command {
    Play(Options, GameOptions),
    Stats(Options),
    ClearStats(Options),
    Help,
    Version,
}

impl Command {
    fn from_parser(mut parser: Parser) -> Result<Command, lexopt::Error> {
        let mut opts = Options::default();
        let mut game_opts = GameOptions::default();
        let mut stats = false;
        let mut clear_stats = false;
        while let Some(arg) = parser.next()? {
            match arg {
                Arg::Short('h') | Arg::Long("help") => return Ok(Command::Help),
                Arg::Short('V') | Arg::Long("version") => return Ok(Command::Version),
                Arg::Short('a') | Arg::Long("answers") => {
                    game_opts.answers = WordList::File(InputArg::from_arg(parser.value()?));
                }
                Arg::Short('g') | Arg::Long("guesses") => {
                    game_opts.guesses = WordList::File(InputArg::from_arg(parser.value()?));
                }
                Arg::Short('w') | Arg::Long("word") => {
                    game_opts.word = Some(parser.value()?.parse()?);
                }
                Arg::Long("hard") => game_opts.hard = true,
                Arg::Short('s') | Arg::Long("state-file") => {
                    opts.state_file = Some(PathBuf::from(parser.value()?));
                }
                Arg::Long("log-file") => opts.log_file = Some(PathBuf::from(parser.value()?)),
                Arg::Long("stats") => stats = true,
                Arg::Long("clear-stats") => clear_stats = true,
                _ => return Err(arg.unexpected()),
            }
        }
        Ok(if clear_stats {
            Command::ClearStats(opts)
        } else if stats {
            Command::Stats(opts)
        } else {
            Command::Play(opts, game_opts)
        })
    }

    fn run(self) -> anyhow::Result<()> {
        match self {
            Command::Play(opts, game_opts) => {
                init_logging(opts.log_file.as_deref())?;
                let mut pool = WordPool::load(game_opts.answers, game_opts.guesses)?;
                if let Some(word) = game_opts.word {
                    if !pool.is_valid_secret(&word.to_string()) {
                        log::info!("Secret word {word} is not in the answer list");
                    }
                    pool = pool.with_secret(word);
                }
                let mut session = Session::open(pool, open_store(opts.state_file), rand::rng());
                if game_opts.hard {
                    session.set_hard_mode(true);
                }
                Controller::new(session).run()?;
            }
            Command::Stats(opts) => {
                init_logging(opts.log_file.as_deref())?;
                let state = load_state(opts.state_file)?;
                for ln in stats_lines(&state.stats, None) {
                    println!("{ln}");
                }
            }
            Command::ClearStats(opts) => {
                init_logging(opts.log_file.as_deref())?;
                let mut store = open_store(opts.state_file);
                let mut state = store
                    .load()
                    .context("failed to load saved state")?
                    .unwrap_or_default();
                state.stats.clear();
                store.save(&state).context("failed to save cleared statistics")?;
                println!("Statistics cleared.");
            }
            Command::Help => {
                println!("Usage: wordle [<options>]");
                println!();
                println!("Play Wordle in your terminal");
                println!();
                println!("Options:");
                println!("  -a <FILE>, --answers <FILE>");
                println!("                    Select secret words from <FILE> instead of the");
                println!("                    builtin list");
                println!();
                println!("  -g <FILE>, --guesses <FILE>");
                println!("                    Accept the words in <FILE> as guesses in");
                println!("                    addition to the secret words");
                println!();
                println!("  -w <WORD>, --word <WORD>");
                println!(
                    "                    Use <WORD> as the secret word.  Good for testing and"
                );
                println!("                    playing against others.");
                println!();
                println!("  --hard            Turn on hard mode: every revealed letter must be");
                println!("                    used in later guesses");
                println!();
                println!("  -s <FILE>, --state-file <FILE>");
                println!("                    Save games, statistics, and settings in <FILE>");
                println!();
                println!("  --stats           Show statistics and exit");
                println!("  --clear-stats     Reset statistics and exit");
                println!("  --log-file <FILE> Write log messages to <FILE>");
                println!("  -h, --help        Display this help message and exit");
                println!("  -V, --version     Show the program version and exit");
            }
            Command::Version => {
                println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
            }
        }
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    Command::from_parser(Parser::from_env())?.run()
}

/// Logging is off unless a log file is given (in which case the default
/// level is `info`), as the game takes over the terminal.  `RUST_LOG`
/// overrides the level either way.
fn init_logging(log_file: Option<&Path>) -> anyhow::Result<()> {
    let default_filter = if log_file.is_some() { "info" } else { "off" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter));
    if let Some(path) = log_file {
        let fp = File::create(path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        builder
            .target(env_logger::Target::Pipe(Box::new(fp)))
            .write_style(env_logger::WriteStyle::Never);
    }
    builder.init();
    Ok(())
}

fn load_state(state_file: Option<PathBuf>) -> anyhow::Result<SavedState> {
    let state = open_store(state_file)
        .load()
        .context("failed to load saved state")?
        .unwrap_or_default();
    Ok(state)
}
