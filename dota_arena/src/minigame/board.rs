//! Tic-tac-toe board.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of cells on the board
pub const CELLS: usize = 9;

/// Rows, columns and both diagonals
const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Mark placed by a player. X always moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mark {
    X,
    O,
}

impl Mark {
    /// The other player's mark
    pub fn other(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }

    /// Turn number stored in the database (1 for X, 2 for O)
    pub fn turn_number(self) -> i16 {
        match self {
            Mark::X => 1,
            Mark::O => 2,
        }
    }

    pub fn from_turn_number(turn: i16) -> Option<Mark> {
        match turn {
            1 => Some(Mark::X),
            2 => Some(Mark::O),
            _ => None,
        }
    }

    fn symbol(self) -> char {
        match self {
            Mark::X => 'X',
            Mark::O => 'O',
        }
    }
}

/// How a finished board ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Winner(Mark),
    Draw,
}

/// 3x3 board, cells numbered 0..9 row by row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Board {
    cells: [Option<Mark>; CELLS],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, cell: usize) -> Option<Mark> {
        self.cells.get(cell).copied().flatten()
    }

    pub fn is_free(&self, cell: usize) -> bool {
        cell < CELLS && self.cells[cell].is_none()
    }

    /// Place a mark on a free cell, returns false if the cell is out of range or taken
    pub fn place(&mut self, cell: usize, mark: Mark) -> bool {
        if !self.is_free(cell) {
            return false;
        }
        self.cells[cell] = Some(mark);
        true
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// Mark owning a complete line, if any
    pub fn winner(&self) -> Option<Mark> {
        LINES.iter().find_map(|&[a, b, c]| match self.cells[a] {
            Some(mark) if self.cells[b] == Some(mark) && self.cells[c] == Some(mark) => {
                Some(mark)
            }
            _ => None,
        })
    }

    /// Result of the board if the game is over
    pub fn outcome(&self) -> Option<Outcome> {
        match self.winner() {
            Some(mark) => Some(Outcome::Winner(mark)),
            None if self.is_full() => Some(Outcome::Draw),
            None => None,
        }
    }

    /// Encode as nine characters: `0` empty, `1` X, `2` O
    pub fn encode(&self) -> String {
        self.cells
            .iter()
            .map(|cell| match cell {
                None => '0',
                Some(Mark::X) => '1',
                Some(Mark::O) => '2',
            })
            .collect()
    }

    /// Decode the nine-character form produced by [`Board::encode`]
    pub fn decode(encoded: &str) -> Option<Board> {
        if encoded.len() != CELLS {
            return None;
        }

        let mut board = Board::new();
        for (cell, ch) in encoded.chars().enumerate() {
            board.cells[cell] = match ch {
                '0' => None,
                '1' => Some(Mark::X),
                '2' => Some(Mark::O),
                _ => return None,
            };
        }
        Some(board)
    }
}

impl fmt::Display for Board {
    /// Empty cells show their 1-based number so players can pick a move
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..3 {
            if row > 0 {
                writeln!(f, "---+---+---")?;
            }
            let cells: Vec<String> = (0..3)
                .map(|col| {
                    let cell = row * 3 + col;
                    match self.cells[cell] {
                        Some(mark) => mark.symbol().to_string(),
                        None => (cell + 1).to_string(),
                    }
                })
                .collect();
            writeln!(f, " {} | {} | {}", cells[0], cells[1], cells[2])?;
        }
        Ok(())
    }
}
