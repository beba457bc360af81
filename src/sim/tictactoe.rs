//! Tic-tac-toe on an N x N board, learned by two agents playing each other
//!
//! The board is the environment of the second phase of the curriculum. Each
//! agent only learns once a game is over: every move it made is credited with
//! the final result, discounted by how far the move was from the end.

use std::fmt::{self, Write};
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::SimError;
use super::agent::{QAgent, QParams};

pub const MIN_SIZE: usize = 3;
pub const MAX_SIZE: usize = 9;

/// Cells as the agents see them: 0 empty, 1 for X, 2 for O
pub type BoardState = Vec<u8>;

pub type TicTacToeAgent = QAgent<BoardState, usize>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Player {
    X,
    O,
}

impl Player {
    pub fn other(self) -> Self {
        match self {
            Player::X => Player::O,
            Player::O => Player::X,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Player::X => 'X',
            Player::O => 'O',
        }
    }

    fn mark(self) -> u8 {
        match self {
            Player::X => 1,
            Player::O => 2,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for Player {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "x" => Ok(Player::X),
            "o" => Ok(Player::O),
            other => Err(format!("unknown symbol '{other}', expected x or o")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Win(Player),
    Draw,
}

/// What a move did to the game
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveResult {
    /// 1.0 when the move won the game
    pub reward: f64,
    pub done: bool,
}

/// An N x N board with N in a row to win
#[derive(Debug, Clone)]
pub struct TicTacToe {
    size: usize,
    cells: Vec<Option<Player>>,
    current: Player,
    outcome: Option<GameOutcome>,
    lines: Vec<Vec<usize>>,
}

impl TicTacToe {
    /// An empty board, X to move
    pub fn new(size: usize) -> Result<Self, SimError> {
        if !(MIN_SIZE..=MAX_SIZE).contains(&size) {
            return Err(SimError::BoardSize { size });
        }
        Ok(Self {
            size,
            cells: vec![None; size * size],
            current: Player::X,
            outcome: None,
            lines: winning_lines(size),
        })
    }

    /// Clear the board for a new game started by `first`
    pub fn reset(&mut self, first: Player) -> BoardState {
        self.cells.fill(None);
        self.current = first;
        self.outcome = None;
        self.state()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn current_player(&self) -> Player {
        self.current
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn cell(&self, index: usize) -> Option<Player> {
        self.cells.get(index).copied().flatten()
    }

    pub fn state(&self) -> BoardState {
        self.cells.iter().map(|c| c.map_or(0, Player::mark)).collect()
    }

    /// Indices of the empty cells, none once the game is over
    pub fn valid_actions(&self) -> Vec<usize> {
        if self.is_over() {
            return Vec::new();
        }
        (0..self.cells.len()).filter(|&i| self.cells[i].is_none()).collect()
    }

    /// Mark `cell` for the player to move and hand the turn over
    pub fn play(&mut self, cell: usize) -> Result<MoveResult, SimError> {
        if self.is_over() {
            return Err(SimError::GameOver);
        }
        match self.cells.get(cell) {
            None => return Err(SimError::OutOfRange { cell }),
            Some(Some(_)) => return Err(SimError::Occupied { cell }),
            Some(None) => {}
        }

        let mover = self.current;
        self.cells[cell] = Some(mover);
        let mut reward = 0.0;
        if self.has_won(mover) {
            self.outcome = Some(GameOutcome::Win(mover));
            reward = 1.0;
        } else if self.cells.iter().all(Option::is_some) {
            self.outcome = Some(GameOutcome::Draw);
        }
        self.current = mover.other();

        Ok(MoveResult { reward, done: self.is_over() })
    }

    fn has_won(&self, player: Player) -> bool {
        self.lines.iter().any(|line| line.iter().all(|&i| self.cells[i] == Some(player)))
    }

    /// Grid drawing; with `numbered` the empty cells show their index
    pub fn render(&self, numbered: bool) -> String {
        let separator = vec!["───"; self.size].join("┼");
        let mut out = String::new();
        for row in 0..self.size {
            if row > 0 {
                let _ = writeln!(out, "{separator}");
            }
            let cells: Vec<String> = (0..self.size)
                .map(|col| {
                    let index = row * self.size + col;
                    match self.cells[index] {
                        Some(player) => format!(" {player} "),
                        None if numbered => format!("{index:^3}"),
                        None => "   ".to_string(),
                    }
                })
                .collect();
            let _ = writeln!(out, "{}", cells.join("│"));
        }
        out
    }

    /// Read a human's move, which must name an empty cell
    pub fn parse_move(&self, input: &str) -> Result<usize, SimError> {
        let cell: usize =
            input.trim().parse().map_err(|_| SimError::NotACell { input: input.trim().into() })?;
        if cell >= self.cells.len() {
            return Err(SimError::OutOfRange { cell });
        }
        if self.cells[cell].is_some() {
            return Err(SimError::Occupied { cell });
        }
        Ok(cell)
    }
}

/// Every row, column and both diagonals of an N x N board
fn winning_lines(size: usize) -> Vec<Vec<usize>> {
    let mut lines = Vec::with_capacity(size * 2 + 2);
    for i in 0..size {
        lines.push((0..size).map(|col| i * size + col).collect());
        lines.push((0..size).map(|row| row * size + i).collect());
    }
    lines.push((0..size).map(|i| i * size + i).collect());
    lines.push((0..size).map(|i| i * size + (size - 1 - i)).collect());
    lines
}

/// Learning parameters for self-play
///
/// Every game ends in a win, a loss or a draw, so there is nothing to
/// discount between moves and gamma stays at 1.
pub fn self_play_params() -> QParams {
    QParams { alpha: 0.5, gamma: 1.0, epsilon: 1.0, epsilon_min: 0.001, epsilon_decay: 0.9997 }
}

/// Final rewards for X and O
fn rewards(outcome: GameOutcome) -> (f64, f64) {
    match outcome {
        GameOutcome::Win(Player::X) => (1.0, -1.0),
        GameOutcome::Win(Player::O) => (-1.0, 1.0),
        GameOutcome::Draw => (0.0, 0.0),
    }
}

/// Wins and draws over a run of games
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Record {
    pub x_wins: usize,
    pub o_wins: usize,
    pub draws: usize,
}

impl Record {
    pub fn add(&mut self, outcome: GameOutcome) {
        match outcome {
            GameOutcome::Win(Player::X) => self.x_wins += 1,
            GameOutcome::Win(Player::O) => self.o_wins += 1,
            GameOutcome::Draw => self.draws += 1,
        }
    }

    pub fn games(&self) -> usize {
        self.x_wins + self.o_wins + self.draws
    }

    pub fn draw_rate(&self) -> f64 {
        if self.games() == 0 { 0.0 } else { self.draws as f64 / self.games() as f64 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelfPlayConfig {
    pub games: usize,
    /// Games per reported record
    pub window: usize,
    /// Decides who opens each game
    pub seed: u64,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        Self { games: 20_000, window: 2_000, seed: 0 }
    }
}

/// Play one game between the two agents, then let both learn from it
pub fn play_training_game(
    game: &mut TicTacToe,
    x: &mut TicTacToeAgent,
    o: &mut TicTacToeAgent,
    first: Player,
) -> GameOutcome {
    game.reset(first);
    let mut x_moves = Vec::new();
    let mut o_moves = Vec::new();

    while !game.is_over() {
        let state = game.state();
        let actions = game.valid_actions();
        let (agent, moves) = match game.current_player() {
            Player::X => (&mut *x, &mut x_moves),
            Player::O => (&mut *o, &mut o_moves),
        };
        let Some(action) = agent.choose_action(&state, &actions) else {
            break;
        };
        moves.push((state, action));
        if let Err(e) = game.play(action) {
            tracing::warn!("Agent chose an illegal move: {e}");
            break;
        }
    }

    let outcome = game.outcome().unwrap_or(GameOutcome::Draw);
    let (x_reward, o_reward) = rewards(outcome);
    x.learn_from_episode(&x_moves, x_reward);
    o.learn_from_episode(&o_moves, o_reward);
    outcome
}

/// Train both agents against each other, one record per window of games
pub fn self_play(
    game: &mut TicTacToe,
    x: &mut TicTacToeAgent,
    o: &mut TicTacToeAgent,
    config: SelfPlayConfig,
) -> Vec<Record> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let window = config.window.max(1);
    let mut records = Vec::with_capacity(config.games / window + 1);
    let mut current = Record::default();

    for played in 1..=config.games {
        let first = if rng.r#gen::<bool>() { Player::X } else { Player::O };
        current.add(play_training_game(game, x, o, first));

        if played % window == 0 || played == config.games {
            tracing::debug!(
                played,
                x_wins = current.x_wins,
                o_wins = current.o_wins,
                draws = current.draws,
                epsilon = x.epsilon(),
                "Self-play progress"
            );
            records.push(current);
            current = Record::default();
        }
    }
    records
}

/// The learned move for the player to move, never exploring
pub fn best_move(game: &TicTacToe, agent: &mut TicTacToeAgent) -> Option<usize> {
    agent.best_action(&game.state(), &game.valid_actions())
}

/// Greedy games between the two agents, X and O opening alternately
pub fn evaluate(
    game: &mut TicTacToe,
    x: &mut TicTacToeAgent,
    o: &mut TicTacToeAgent,
    games: usize,
) -> Record {
    let mut record = Record::default();
    for played in 0..games {
        let first = if played % 2 == 0 { Player::X } else { Player::O };
        game.reset(first);
        while !game.is_over() {
            let agent = match game.current_player() {
                Player::X => &mut *x,
                Player::O => &mut *o,
            };
            let Some(action) = best_move(game, agent) else {
                break;
            };
            if game.play(action).is_err() {
                break;
            }
        }
        record.add(game.outcome().unwrap_or(GameOutcome::Draw));
    }
    record
}

/// Who opens the next game against a human
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opening {
    /// Toss a coin
    Random,
    Player(Player),
    /// The human decides
    HumanChooses,
}

/// Draws and the first game go to a coin toss, the AI opens after it wins and
/// a human who just won picks
pub fn opening(previous: Option<GameOutcome>, human: Player) -> Opening {
    match previous {
        None | Some(GameOutcome::Draw) => Opening::Random,
        Some(GameOutcome::Win(winner)) if winner == human => Opening::HumanChooses,
        Some(GameOutcome::Win(_)) => Opening::Player(human.other()),
    }
}

/// File name for a trained agent
pub fn agent_file(player: Player, size: usize) -> String {
    format!("tictactoe_{}_{size}x{size}.json", player.symbol().to_ascii_lowercase())
}
