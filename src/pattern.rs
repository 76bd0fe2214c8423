// src/pattern.rs
// Win detection: named shapes and admin-configured cell patterns.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::card::Cell;
use crate::defs::{pattern_index, Number, CELLSPERCARD, GRID_SIZE};
use crate::error::BingoError;

const N: usize = GRID_SIZE as usize;

// Mark state addressed as grid[row][col].
type Grid = [[bool; N]; N];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WinPattern {
    FullHouse,
    HorizontalLine,
    VerticalLine,
    Diagonal,
}

impl WinPattern {
    pub fn as_str(self) -> &'static str {
        match self {
            WinPattern::FullHouse => "FULL_HOUSE",
            WinPattern::HorizontalLine => "HORIZONTAL_LINE",
            WinPattern::VerticalLine => "VERTICAL_LINE",
            WinPattern::Diagonal => "DIAGONAL",
        }
    }
}

impl fmt::Display for WinPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WinPattern {
    type Err = BingoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FULL_HOUSE" => Ok(WinPattern::FullHouse),
            "HORIZONTAL_LINE" => Ok(WinPattern::HorizontalLine),
            "VERTICAL_LINE" => Ok(WinPattern::VerticalLine),
            "DIAGONAL" => Ok(WinPattern::Diagonal),
            _ => Err(BingoError::UnknownPattern(s.to_string())),
        }
    }
}

/// Set of pattern indices (`row * 5 + col`) that must be marked to win.
/// An empty set, like the full set, means every cell counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct WinningPattern(BTreeSet<u8>);

impl WinningPattern {
    pub fn from_indices<I: IntoIterator<Item = u8>>(indices: I) -> Result<Self, BingoError> {
        let mut set = BTreeSet::new();
        for index in indices {
            if index as usize >= CELLSPERCARD {
                return Err(BingoError::InvalidPatternIndex(index));
            }
            set.insert(index);
        }
        Ok(WinningPattern(set))
    }

    pub fn full_house() -> Self {
        WinningPattern((0..CELLSPERCARD as u8).collect())
    }

    pub fn row(row: u8) -> Result<Self, BingoError> {
        if row >= GRID_SIZE {
            return Err(BingoError::InvalidPatternIndex(row));
        }
        Self::from_indices((0..GRID_SIZE).map(|col| pattern_index(row, col)))
    }

    pub fn column(col: u8) -> Result<Self, BingoError> {
        if col >= GRID_SIZE {
            return Err(BingoError::InvalidPatternIndex(col));
        }
        Self::from_indices((0..GRID_SIZE).map(|row| pattern_index(row, col)))
    }

    pub fn main_diagonal() -> Self {
        WinningPattern((0..GRID_SIZE).map(|i| pattern_index(i, i)).collect())
    }

    pub fn anti_diagonal() -> Self {
        WinningPattern((0..GRID_SIZE).map(|i| pattern_index(i, GRID_SIZE - 1 - i)).collect())
    }

    pub fn four_corners() -> Self {
        let last = GRID_SIZE - 1;
        WinningPattern(
            [(0, 0), (0, last), (last, 0), (last, last)]
                .into_iter()
                .map(|(row, col)| pattern_index(row, col))
                .collect(),
        )
    }

    pub fn x_shape() -> Self {
        let mut set = Self::main_diagonal().0;
        set.extend(Self::anti_diagonal().0);
        WinningPattern(set)
    }

    /// Look up one of the preset shapes offered to game admins:
    /// FULL_HOUSE, FOUR_CORNERS, X, MAIN_DIAGONAL, ANTI_DIAGONAL, ROW_<n>, COLUMN_<n>.
    pub fn preset(name: &str) -> Result<Self, BingoError> {
        let upper = name.trim().to_ascii_uppercase();
        let unknown = || BingoError::UnknownPattern(name.to_string());
        match upper.as_str() {
            "FULL_HOUSE" => Ok(Self::full_house()),
            "FOUR_CORNERS" => Ok(Self::four_corners()),
            "X" => Ok(Self::x_shape()),
            "MAIN_DIAGONAL" => Ok(Self::main_diagonal()),
            "ANTI_DIAGONAL" => Ok(Self::anti_diagonal()),
            other => {
                if let Some(n) = other.strip_prefix("ROW_") {
                    let row = n.parse::<u8>().map_err(|_| unknown())?;
                    Self::row(row).map_err(|_| unknown())
                } else if let Some(n) = other.strip_prefix("COLUMN_") {
                    let col = n.parse::<u8>().map_err(|_| unknown())?;
                    Self::column(col).map_err(|_| unknown())
                } else {
                    Err(unknown())
                }
            }
        }
    }

    /// True when the pattern puts every cell in scope.
    pub fn requires_all(&self) -> bool {
        self.0.is_empty() || self.0.len() == CELLSPERCARD
    }

    pub fn covers(&self, index: u8) -> bool {
        (index as usize) < CELLSPERCARD && (self.0.is_empty() || self.0.contains(&index))
    }

    /// Indices as configured (possibly empty).
    pub fn indices(&self) -> Vec<u8> {
        self.0.iter().copied().collect()
    }
}

impl TryFrom<Vec<u8>> for WinningPattern {
    type Error = BingoError;

    fn try_from(indices: Vec<u8>) -> Result<Self, Self::Error> {
        WinningPattern::from_indices(indices)
    }
}

impl From<WinningPattern> for Vec<u8> {
    fn from(pattern: WinningPattern) -> Self {
        pattern.indices()
    }
}

// The FREE cell counts as marked whatever its flag says.
fn marks_grid(cells: &[Cell]) -> Result<Grid, BingoError> {
    if cells.len() != CELLSPERCARD {
        return Err(BingoError::InvalidCellCount(cells.len()));
    }

    let mut seen = [[false; N]; N];
    let mut grid = [[false; N]; N];
    for cell in cells {
        let (row, col) = (cell.row as usize, cell.col as usize);
        if row >= N || col >= N || seen[row][col] {
            return Err(BingoError::InvalidCellPosition { row: cell.row, col: cell.col });
        }
        seen[row][col] = true;
        grid[row][col] = cell.marked || cell.is_free();
    }
    Ok(grid)
}

/// Check a card's marks against one of the named win shapes.
pub fn check_win(cells: &[Cell], pattern: WinPattern) -> Result<bool, BingoError> {
    let grid = marks_grid(cells)?;

    let won = match pattern {
        WinPattern::FullHouse => grid.iter().all(|row| row.iter().all(|&marked| marked)),
        WinPattern::HorizontalLine => grid.iter().any(|row| row.iter().all(|&marked| marked)),
        WinPattern::VerticalLine => (0..N).any(|col| (0..N).all(|row| grid[row][col])),
        WinPattern::Diagonal => {
            (0..N).all(|i| grid[i][i]) || (0..N).all(|i| grid[i][N - 1 - i])
        }
    };
    Ok(won)
}

/// Check that every cell covered by the configured pattern is marked.
pub fn check_pattern_win(cells: &[Cell], pattern: &WinningPattern) -> Result<bool, BingoError> {
    let grid = marks_grid(cells)?;

    for (row, marks) in grid.iter().enumerate() {
        for (col, &marked) in marks.iter().enumerate() {
            if !marked && pattern.covers(pattern_index(row as u8, col as u8)) {
                return Ok(false);
            }
        }
    }
    Ok(true)
}

/// Called numbers inside the pattern that the player has not marked yet.
pub fn hint_numbers(
    cells: &[Cell],
    pattern: &WinningPattern,
    called: &[Number],
) -> Result<Vec<Number>, BingoError> {
    marks_grid(cells)?;

    Ok(cells
        .iter()
        .filter(|cell| !cell.marked && pattern.covers(cell.pattern_index()))
        .filter_map(|cell| cell.number.number())
        .filter(|number| called.contains(number))
        .collect())
}
