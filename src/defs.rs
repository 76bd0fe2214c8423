// src/defs.rs
// Fixed geometry and number ranges for the 75-ball game.

pub type Number = u8;

pub const FIRSTNUMBER: Number = 1;
pub const LASTNUMBER: Number = 75;
pub const BALLSNUMBER: usize = (LASTNUMBER - FIRSTNUMBER + 1) as usize;

pub const GRID_SIZE: u8 = 5; // rows and columns per card
pub const CELLSPERCARD: usize = (GRID_SIZE as usize) * (GRID_SIZE as usize);
pub const FREE_ROW: u8 = 2;
pub const FREE_COL: u8 = 2;

// Inclusive number range of each column, B through O.
pub const COLUMN_RANGES: [(Number, Number); GRID_SIZE as usize] = [
    (1, 15),
    (16, 30),
    (31, 45),
    (46, 60),
    (61, 75),
];

/// Flatten a grid position into its pattern index (`row * 5 + col`).
pub const fn pattern_index(row: u8, col: u8) -> u8 {
    row * GRID_SIZE + col
}

/// Column a drawable number belongs to, or `None` when outside 1..=75.
pub fn column_of(number: Number) -> Option<u8> {
    COLUMN_RANGES
        .iter()
        .position(|&(low, high)| (low..=high).contains(&number))
        .map(|col| col as u8)
}
