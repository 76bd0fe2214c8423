// src/card.rs
// Card model and the 5x5 card generator.

use std::collections::HashSet;
use std::fmt;

use rand::Rng;
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::defs::{column_of, Number, CELLSPERCARD, COLUMN_RANGES, FREE_COL, FREE_ROW, GRID_SIZE};
use crate::error::BingoError;

// Upper bound on rejection-sampling draws for a single column.
pub const MAX_SAMPLING_ATTEMPTS: usize = 1_000;

const FREE_TAG: &str = "FREE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Letter {
    B,
    I,
    N,
    G,
    O,
}

impl Letter {
    pub const ALL: [Letter; GRID_SIZE as usize] = [Letter::B, Letter::I, Letter::N, Letter::G, Letter::O];

    pub fn from_col(col: u8) -> Option<Letter> {
        Self::ALL.get(col as usize).copied()
    }

    pub fn col(self) -> u8 {
        self as u8
    }

    pub fn range(self) -> (Number, Number) {
        COLUMN_RANGES[self as usize]
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Content of a cell: a drawable number, or the free center square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellNumber {
    Number(Number),
    Free,
}

impl CellNumber {
    pub fn number(self) -> Option<Number> {
        match self {
            CellNumber::Number(n) => Some(n),
            CellNumber::Free => None,
        }
    }

    pub fn is_free(self) -> bool {
        matches!(self, CellNumber::Free)
    }
}

impl fmt::Display for CellNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellNumber::Number(n) => write!(f, "{n}"),
            CellNumber::Free => f.write_str(FREE_TAG),
        }
    }
}

// Stored card matrices carry the free square as the string "FREE".
impl Serialize for CellNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellNumber::Number(n) => serializer.serialize_u8(*n),
            CellNumber::Free => serializer.serialize_str(FREE_TAG),
        }
    }
}

impl<'de> Deserialize<'de> for CellNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(Number),
            Tag(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(CellNumber::Number(n)),
            Raw::Tag(tag) if tag == FREE_TAG => Ok(CellNumber::Free),
            Raw::Tag(other) => Err(de::Error::custom(format!("unexpected cell value '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub id: String,
    pub letter: Letter,
    pub number: CellNumber,
    pub row: u8,
    pub col: u8,
    pub marked: bool,
}

impl Cell {
    pub fn new(letter: Letter, row: u8, number: CellNumber) -> Self {
        Cell {
            id: format!("{letter}{row}"),
            letter,
            number,
            row,
            col: letter.col(),
            marked: number.is_free(),
        }
    }

    pub fn pattern_index(&self) -> u8 {
        crate::defs::pattern_index(self.row, self.col)
    }

    pub fn is_free(&self) -> bool {
        self.number.is_free()
    }
}

/// A validated 25-cell card, stored column-major (B0..B4, I0..I4, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Cell>", into = "Vec<Cell>")]
pub struct Card {
    cells: Vec<Cell>,
}

impl Card {
    /// Build a card from external cell data, enforcing every card invariant.
    pub fn from_cells(mut cells: Vec<Cell>) -> Result<Self, BingoError> {
        if cells.len() != CELLSPERCARD {
            return Err(BingoError::InvalidCellCount(cells.len()));
        }

        let mut positions = HashSet::new();
        let mut ids = HashSet::new();
        let mut numbers = HashSet::new();

        for cell in &cells {
            if cell.row >= GRID_SIZE || cell.col >= GRID_SIZE || !positions.insert((cell.row, cell.col)) {
                return Err(BingoError::InvalidCellPosition { row: cell.row, col: cell.col });
            }
            if Letter::from_col(cell.col) != Some(cell.letter) {
                return Err(BingoError::InvalidCard(format!(
                    "cell {} has letter {} in column {}",
                    cell.id, cell.letter, cell.col
                )));
            }
            if !ids.insert(cell.id.as_str()) {
                return Err(BingoError::InvalidCard(format!("duplicate cell id {}", cell.id)));
            }

            let is_center = cell.row == FREE_ROW && cell.col == FREE_COL;
            match cell.number {
                CellNumber::Free if !is_center => {
                    return Err(BingoError::InvalidCard(format!("FREE cell outside the center at {}", cell.id)));
                }
                CellNumber::Free if !cell.marked => {
                    return Err(BingoError::InvalidCard("FREE cell must be marked".to_string()));
                }
                CellNumber::Free => {}
                CellNumber::Number(_) if is_center => {
                    return Err(BingoError::InvalidCard("center cell must be FREE".to_string()));
                }
                CellNumber::Number(n) => {
                    match column_of(n) {
                        None => return Err(BingoError::NumberOutOfRange(n)),
                        Some(col) if col != cell.col => {
                            return Err(BingoError::InvalidCard(format!(
                                "number {n} does not belong to column {}",
                                cell.letter
                            )));
                        }
                        Some(_) => {}
                    }
                    if !numbers.insert(n) {
                        return Err(BingoError::InvalidCard(format!("number {n} appears twice")));
                    }
                }
            }
        }

        cells.sort_by_key(|cell| (cell.col, cell.row));
        Ok(Card { cells })
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, row: u8, col: u8) -> Option<&Cell> {
        if row >= GRID_SIZE || col >= GRID_SIZE {
            return None;
        }
        self.cells.get((col * GRID_SIZE + row) as usize)
    }

    /// Every drawable number on the card, in column-major order.
    pub fn numbers(&self) -> Vec<Number> {
        self.cells.iter().filter_map(|cell| cell.number.number()).collect()
    }

    pub fn marked_numbers(&self) -> Vec<Number> {
        self.cells
            .iter()
            .filter(|cell| cell.marked)
            .filter_map(|cell| cell.number.number())
            .collect()
    }

    pub fn contains(&self, number: Number) -> bool {
        self.cells.iter().any(|cell| cell.number == CellNumber::Number(number))
    }

    /// Set the mark of a cell by id and return the resulting state.
    /// The FREE cell stays marked whatever is requested.
    pub fn set_marked(&mut self, cell_id: &str, marked: bool) -> Result<bool, BingoError> {
        let cell = self
            .cells
            .iter_mut()
            .find(|cell| cell.id == cell_id)
            .ok_or_else(|| BingoError::InvalidCard(format!("no cell with id '{cell_id}'")))?;
        if !cell.is_free() {
            cell.marked = marked;
        }
        Ok(cell.marked)
    }

    /// Mark the cell holding `number`; false when the card does not carry it.
    pub fn mark_number(&mut self, number: Number) -> bool {
        match self.cells.iter_mut().find(|cell| cell.number == CellNumber::Number(number)) {
            Some(cell) => {
                cell.marked = true;
                true
            }
            None => false,
        }
    }

    pub fn clear_marks(&mut self) {
        for cell in self.cells.iter_mut().filter(|cell| !cell.is_free()) {
            cell.marked = false;
        }
    }
}

impl TryFrom<Vec<Cell>> for Card {
    type Error = BingoError;

    fn try_from(cells: Vec<Cell>) -> Result<Self, Self::Error> {
        Card::from_cells(cells)
    }
}

impl From<Card> for Vec<Cell> {
    fn from(card: Card) -> Self {
        card.cells
    }
}

/// Generate one random card: five distinct numbers per column from the
/// column range, with the N column's middle slot replaced by FREE.
pub fn generate_card<R: Rng>(rng: &mut R) -> Result<Card, BingoError> {
    let mut cells = Vec::with_capacity(CELLSPERCARD);

    for letter in Letter::ALL {
        let (low, high) = letter.range();
        let column = sample_distinct(rng, letter.col(), low, high, GRID_SIZE as usize)?;

        for (row, number) in column.into_iter().enumerate() {
            let row = row as u8;
            let number = if letter.col() == FREE_COL && row == FREE_ROW {
                CellNumber::Free
            } else {
                CellNumber::Number(number)
            };
            cells.push(Cell::new(letter, row, number));
        }
    }

    Ok(Card { cells })
}

// Rejection sampling of `needed` distinct values in low..=high.
fn sample_distinct<R: Rng>(
    rng: &mut R,
    col: u8,
    low: Number,
    high: Number,
    needed: usize,
) -> Result<Vec<Number>, BingoError> {
    let exhausted = BingoError::ColumnExhausted { col, needed, low, high };
    if low > high {
        return Err(exhausted);
    }

    let mut numbers = Vec::with_capacity(needed);
    let mut attempts = 0;
    while numbers.len() < needed {
        if attempts == MAX_SAMPLING_ATTEMPTS {
            return Err(exhausted);
        }
        attempts += 1;

        let candidate = rng.random_range(low..=high);
        if !numbers.contains(&candidate) {
            numbers.push(candidate);
        }
    }
    Ok(numbers)
}
