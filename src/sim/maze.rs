//! Perfect mazes by randomized depth-first backtracking

use std::fmt;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::SimError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Wall,
    Open,
}

impl Cell {
    fn from_char(c: char) -> Self {
        if c == '#' { Cell::Wall } else { Cell::Open }
    }
}

/// A grid of walls and corridors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Maze {
    cells: Vec<Vec<Cell>>,
}

impl Maze {
    /// Build from rows of text where `#` is a wall
    pub fn from_rows(rows: &[&str]) -> Result<Self, SimError> {
        let cells: Vec<Vec<Cell>> =
            rows.iter().map(|row| row.chars().map(Cell::from_char).collect()).collect();
        if cells.is_empty() || cells[0].is_empty() {
            return Err(SimError::ZeroSize);
        }
        Ok(Self { cells })
    }

    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    pub fn cols(&self) -> usize {
        self.cells.first().map_or(0, Vec::len)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<Cell> {
        self.cells.get(row).and_then(|r| r.get(col)).copied()
    }

    pub fn is_open(&self, row: usize, col: usize) -> bool {
        self.cell(row, col) == Some(Cell::Open)
    }

    pub fn open_cells(&self) -> usize {
        self.cells.iter().flatten().filter(|c| **c == Cell::Open).count()
    }
}

impl fmt::Display for Maze {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.cells.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let line: String =
                row.iter().map(|c| if *c == Cell::Wall { '#' } else { ' ' }).collect();
            f.write_str(&line)?;
        }
        Ok(())
    }
}

const NEIGHBOURS: [(isize, isize); 4] = [(0, 2), (0, -2), (2, 0), (-2, 0)];

/// Largest grid, walls included, that `generate_maze` will allocate
pub const MAX_GRID_CELLS: usize = 1 << 22;

/// Generate a `height` by `width` cell maze on a `(2h+1) x (2w+1)` grid
///
/// Every pair of cells is joined by exactly one path. The same seed always
/// yields the same maze.
pub fn generate_maze(height: usize, width: usize, seed: u64) -> Result<Maze, SimError> {
    if height == 0 || width == 0 {
        return Err(SimError::ZeroSize);
    }

    let (rows, cols) = grid_size(height, width).ok_or(SimError::TooLarge { height, width })?;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut cells = vec![vec![Cell::Wall; cols]; rows];

    let start = (rng.gen_range(0..height) * 2 + 1, rng.gen_range(0..width) * 2 + 1);
    cells[start.0][start.1] = Cell::Open;

    // Each frame is a cell with its shuffled neighbours and how many were tried
    let mut stack = vec![(start, shuffled(&mut rng), 0usize)];

    while let Some(frame) = stack.last_mut() {
        let ((row, col), neighbours, tried) = frame;
        let Some(&(dr, dc)) = neighbours.get(*tried) else {
            stack.pop();
            continue;
        };
        *tried += 1;

        let (r, c) = (*row as isize + dr, *col as isize + dc);
        if r <= 0 || c <= 0 || r as usize >= rows || c as usize >= cols {
            continue;
        }
        let (r, c) = (r as usize, c as usize);
        if cells[r][c] == Cell::Wall {
            let wall = ((*row + r) / 2, (*col + c) / 2);
            cells[wall.0][wall.1] = Cell::Open;
            cells[r][c] = Cell::Open;
            stack.push(((r, c), shuffled(&mut rng), 0));
        }
    }

    Ok(Maze { cells })
}

/// Rows and columns of the wall grid, or `None` past `MAX_GRID_CELLS`
fn grid_size(height: usize, width: usize) -> Option<(usize, usize)> {
    let rows = height.checked_mul(2)?.checked_add(1)?;
    let cols = width.checked_mul(2)?.checked_add(1)?;
    (rows.checked_mul(cols)? <= MAX_GRID_CELLS).then_some((rows, cols))
}

fn shuffled(rng: &mut StdRng) -> [(isize, isize); 4] {
    let mut neighbours = NEIGHBOURS;
    neighbours.shuffle(rng);
    neighbours
}
