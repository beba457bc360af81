use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use trailhead::curriculum::loader;
use trailhead::progress::{Achievements, Action, JsonFileStore, ProgressMachine};
use trailhead::sim::tictactoe::{self, Opening};
use trailhead::sim::{
    self, GameOutcome, MazeEnv, Player, QAgent, QParams, SelfPlayConfig, TicTacToe,
    TicTacToeAgent, TrainConfig,
};
use trailhead::tutor::{ExplanationRequest, Tutor};
use trailhead::{App, Config, report};

#[derive(Parser)]
#[command(name = "trailhead")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Curriculum JSON to use instead of the built-in one
    #[arg(long, global = true)]
    curriculum: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show progress through the curriculum
    Status,
    /// Forget all progress and badges
    Reset,
    /// Validate a curriculum file
    Check {
        /// Path to the curriculum JSON
        path: PathBuf,
    },
    /// Ask the tutor to explain a step (1-based)
    Explain { phase: usize, step: usize },
    /// Train a Q-learning agent to walk out of a random maze
    Maze {
        #[arg(long, default_value_t = 8)]
        width: usize,
        #[arg(long, default_value_t = 8)]
        height: usize,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long, default_value_t = 500)]
        episodes: usize,
    },
    /// Teach two agents tic-tac-toe by self-play, or play against one
    #[command(name = "tictactoe")]
    TicTacToe {
        #[command(subcommand)]
        command: TicTacToeCommand,
    },
}

#[derive(Subcommand)]
enum TicTacToeCommand {
    /// Train both agents against each other and save them
    Train {
        #[arg(long, default_value_t = 20_000)]
        games: usize,
        /// Board side, from 3 to 9
        #[arg(long, default_value_t = 3)]
        size: usize,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Play against the trained agent in the terminal
    Play {
        /// Your symbol, x or o
        #[arg(long, default_value = "x")]
        symbol: Player,
        #[arg(long, default_value_t = 3)]
        size: usize,
    },
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| "trailhead=info".into())
}

/// The TUI owns the screen, so its logs go to a file
fn init_file_logging() -> Result<()> {
    let path = Config::log_path()?;
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_target(false).with_ansi(false).with_writer(Mutex::new(file)))
        .init();
    Ok(())
}

fn init_stderr_logging() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None => init_file_logging()?,
        Some(_) => init_stderr_logging(),
    }

    let config = Config::load()?;
    let curriculum_path = cli.curriculum.or_else(|| config.curriculum_path.clone());

    match cli.command {
        Some(Commands::Status) => {
            let curriculum = loader::load(curriculum_path.as_deref())?;
            let machine =
                ProgressMachine::restore(curriculum, JsonFileStore::in_dir(&Config::data_dir()?));
            let achievements = Achievements::load_or_default(&Config::achievements_path()?);
            print!("{}", report::status(&machine, &achievements));
        }
        Some(Commands::Reset) => {
            let curriculum = loader::load(curriculum_path.as_deref())?;
            let mut machine =
                ProgressMachine::restore(curriculum, JsonFileStore::in_dir(&Config::data_dir()?));
            machine.dispatch(Action::Reset);

            let achievements_path = Config::achievements_path()?;
            if achievements_path.exists() {
                std::fs::remove_file(&achievements_path).with_context(|| {
                    format!("Failed to remove {}", achievements_path.display())
                })?;
            }
            println!("Progress cleared.");
        }
        Some(Commands::Check { path }) => {
            let curriculum = loader::load_file(&path)?;
            let quizzes = curriculum.phases.iter().filter(|p| p.has_quiz()).count();
            println!(
                "{}: {} phases, {} steps, {} quizzes",
                path.display(),
                curriculum.phase_count(),
                curriculum.step_count(),
                quizzes
            );
        }
        Some(Commands::Explain { phase, step }) => {
            let curriculum = loader::load(curriculum_path.as_deref())?;
            let (Some(phase_index), Some(step_index)) = (phase.checked_sub(1), step.checked_sub(1))
            else {
                bail!("Phase and step numbers start at 1");
            };
            let (Some(p), Some(s)) =
                (curriculum.phase(phase_index), curriculum.step(phase_index, step_index))
            else {
                bail!("No step {step} in phase {phase}");
            };

            let request = ExplanationRequest::new(&p.title, &s.title, &s.content);
            let text = Tutor::connect(config.tutor_model).explain(&request).await;
            println!("{text}");
        }
        Some(Commands::Maze { width, height, seed, episodes }) => {
            let maze = sim::generate_maze(height, width, seed)?;
            let mut env = MazeEnv::corner_to_corner(maze)?;
            let mut agent = QAgent::new(QParams::default(), seed);
            let train_config = TrainConfig { episodes, ..TrainConfig::default() };

            let history = sim::train(&mut env, &mut agent, train_config);
            print!("{}", report::training(&history, (episodes / 10).max(1)));

            let solved = history.iter().filter(|e| e.reached_goal).count();
            println!("\nSolved {solved} of {episodes} episodes.\n");

            let path = sim::greedy_path(&mut env, &mut agent, train_config.max_steps);
            println!("{}", report::rollout(&env, path.as_deref()));
        }
        Some(Commands::TicTacToe { command }) => match command {
            TicTacToeCommand::Train { games, size, seed } => train_tictactoe(games, size, seed)?,
            TicTacToeCommand::Play { symbol, size } => play_tictactoe(symbol, size)?,
        },
        None => {
            let curriculum = loader::load(curriculum_path.as_deref())?;
            let mut app = App::new(config, curriculum)?;
            app.run().await?;
        }
    }

    Ok(())
}

fn train_tictactoe(games: usize, size: usize, seed: u64) -> Result<()> {
    let mut game = TicTacToe::new(size)?;
    let data_dir = Config::data_dir()?;
    let x_path = data_dir.join(tictactoe::agent_file(Player::X, size));
    let o_path = data_dir.join(tictactoe::agent_file(Player::O, size));

    let mut x = TicTacToeAgent::new(tictactoe::self_play_params(), seed);
    let mut o = TicTacToeAgent::new(tictactoe::self_play_params(), seed.wrapping_add(1));
    if x.load_table(&x_path)? | o.load_table(&o_path)? {
        println!("Continuing from the saved {size}x{size} agents.");
    }

    let config = SelfPlayConfig { games, window: (games / 10).max(1), seed };
    let records = tictactoe::self_play(&mut game, &mut x, &mut o, config);
    print!("{}", report::self_play(&records));

    let record = tictactoe::evaluate(&mut game, &mut x, &mut o, 1000);
    println!("\n{}", report::evaluation(&record));

    x.save_table(&x_path)?;
    o.save_table(&o_path)?;
    println!("Saved both agents to {}", data_dir.display());
    Ok(())
}

fn play_tictactoe(human: Player, size: usize) -> Result<()> {
    let mut game = TicTacToe::new(size)?;
    let ai = human.other();
    let path = Config::data_dir()?.join(tictactoe::agent_file(ai, size));
    let mut agent = TicTacToeAgent::new(tictactoe::self_play_params(), rand::random());
    if !agent.load_table(&path)? {
        tracing::warn!("No trained agent at {}", path.display());
        println!("The AI has not trained yet. Try `trailhead tictactoe train --size {size}`.");
    }

    let mut previous = None;
    loop {
        let first = match tictactoe::opening(previous, human) {
            Opening::Random => coin_toss(),
            Opening::Player(player) => player,
            Opening::HumanChooses if ask("You won! Do you want to start? [y/n] ")? => human,
            Opening::HumanChooses => ai,
        };
        game.reset(first);
        println!("\nYou are {human}. {first} starts.");

        while !game.is_over() {
            if game.current_player() == ai {
                let Some(cell) = tictactoe::best_move(&game, &mut agent) else {
                    break;
                };
                game.play(cell)?;
                println!("The AI plays {cell}.");
                continue;
            }
            print!("{}", game.render(true));
            let Some(input) = prompt("Your move: ")? else {
                return Ok(());
            };
            match game.parse_move(&input) {
                Ok(cell) => {
                    game.play(cell)?;
                }
                Err(e) => println!("{e}"),
            }
        }

        print!("{}", game.render(false));
        previous = game.outcome();
        match previous {
            Some(GameOutcome::Win(winner)) if winner == human => println!("You win!"),
            Some(GameOutcome::Win(_)) => println!("The AI wins."),
            _ => println!("It's a draw."),
        }
        if !ask("Play again? [y/n] ")? {
            return Ok(());
        }
    }
}

fn coin_toss() -> Player {
    if rand::random::<bool>() { Player::X } else { Player::O }
}

/// Print `question` and read one line, `None` at end of input
fn prompt(question: &str) -> Result<Option<String>> {
    print!("{question}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    if std::io::stdin().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

fn ask(question: &str) -> Result<bool> {
    Ok(prompt(question)?.is_some_and(|answer| answer.trim().eq_ignore_ascii_case("y")))
}
