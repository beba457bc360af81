//! A tiny reinforcement learning playground
//!
//! The maze phase of the curriculum talks about an agent learning to walk out
//! of a grid maze, and the phase before it about two agents learning
//! tic-tac-toe by playing each other. This module holds both environments, the
//! tabular Q-learning agent they share and their training loops.

pub mod agent;
pub mod env;
pub mod maze;
pub mod tictactoe;
pub mod train;

use thiserror::Error;

pub use agent::{QAgent, QParams};
pub use env::{Direction, MazeEnv, Position, StepResult};
pub use maze::{Cell, Maze, generate_maze};
pub use tictactoe::{GameOutcome, Player, Record, SelfPlayConfig, TicTacToe, TicTacToeAgent};
pub use train::{EpisodeStats, TrainConfig, greedy_path, train};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimError {
    #[error("maze dimensions must be at least 1x1")]
    ZeroSize,

    #[error("a {height}x{width} maze is too large")]
    TooLarge { height: usize, width: usize },

    #[error("position ({row}, {col}) is outside the maze or inside a wall")]
    Blocked { row: usize, col: usize },

    #[error("board size must be between 3 and 9, got {size}")]
    BoardSize { size: usize },

    #[error("cell {cell} is already taken")]
    Occupied { cell: usize },

    #[error("cell {cell} is not on the board")]
    OutOfRange { cell: usize },

    #[error("'{input}' is not a cell number")]
    NotACell { input: String },

    #[error("the game is already over")]
    GameOver,
}
