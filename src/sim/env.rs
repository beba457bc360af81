//! The maze as a reinforcement learning environment

use std::fmt;

use super::SimError;
use super::maze::Maze;

/// (row, column)
pub type Position = (usize, usize);

/// Cost of every step that does not reach the goal
pub const STEP_REWARD: f64 = -0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] =
        [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    /// Parse WASD keys or direction names
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "w" | "up" => Some(Direction::Up),
            "s" | "down" => Some(Direction::Down),
            "a" | "left" => Some(Direction::Left),
            "d" | "right" => Some(Direction::Right),
            _ => None,
        }
    }

    fn apply(self, (row, col): Position) -> Option<Position> {
        match self {
            Direction::Up => row.checked_sub(1).map(|r| (r, col)),
            Direction::Down => Some((row + 1, col)),
            Direction::Left => col.checked_sub(1).map(|c| (row, c)),
            Direction::Right => Some((row, col + 1)),
        }
    }
}

/// What one step did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepResult {
    pub position: Position,
    pub reward: f64,
    pub done: bool,
}

#[derive(Debug, Clone)]
pub struct MazeEnv {
    maze: Maze,
    start: Position,
    goal: Position,
    position: Position,
}

impl MazeEnv {
    pub fn new(maze: Maze, start: Position, goal: Position) -> Result<Self, SimError> {
        for (row, col) in [start, goal] {
            if !maze.is_open(row, col) {
                return Err(SimError::Blocked { row, col });
            }
        }
        Ok(Self { maze, start, goal, position: start })
    }

    /// Start at the top-left cell, exit at the bottom-right one
    pub fn corner_to_corner(maze: Maze) -> Result<Self, SimError> {
        let goal = (maze.rows().saturating_sub(2), maze.cols().saturating_sub(2));
        Self::new(maze, (1, 1), goal)
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn start(&self) -> Position {
        self.start
    }

    pub fn goal(&self) -> Position {
        self.goal
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Reward for reaching the goal, scaled by maze size
    pub fn goal_reward(&self) -> f64 {
        10.0 * (self.maze.rows() * self.maze.cols()) as f64
    }

    /// Put the agent back on the start cell
    pub fn reset(&mut self) -> Position {
        self.position = self.start;
        self.position
    }

    /// Move one cell. Walls and the border leave the agent where it is.
    pub fn step(&mut self, direction: Direction) -> StepResult {
        if let Some((row, col)) = direction.apply(self.position) {
            if self.maze.is_open(row, col) {
                self.position = (row, col);
            }
        }

        let done = self.position == self.goal;
        let reward = if done { self.goal_reward() } else { STEP_REWARD };
        StepResult { position: self.position, reward, done }
    }

    /// Render the maze with the agent, the goal and an optional trail
    pub fn render(&self, trail: &[Position]) -> String {
        let mut out = String::new();
        for row in 0..self.maze.rows() {
            if row > 0 {
                out.push('\n');
            }
            for col in 0..self.maze.cols() {
                let here = (row, col);
                let c = if here == self.position {
                    'A'
                } else if here == self.goal {
                    'G'
                } else if !self.maze.is_open(row, col) {
                    '#'
                } else if trail.contains(&here) {
                    '.'
                } else {
                    ' '
                };
                out.push(c);
            }
        }
        out
    }
}

impl fmt::Display for MazeEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&[]))
    }
}
