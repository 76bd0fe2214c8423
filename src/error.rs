// src/error.rs
// Error taxonomy shared by the engine and the game host.

use thiserror::Error;

use crate::defs::Number;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BingoError {
    /// Rejection sampling could not collect enough distinct numbers for a column.
    /// Only reachable if the column range constants are broken.
    #[error("column {col} could not supply {needed} distinct numbers from {low}..={high}")]
    ColumnExhausted { col: u8, needed: usize, low: Number, high: Number },

    #[error("expected 25 cells, got {0}")]
    InvalidCellCount(usize),

    #[error("cell position ({row}, {col}) is out of the grid or repeated")]
    InvalidCellPosition { row: u8, col: u8 },

    #[error("invalid card: {0}")]
    InvalidCard(String),

    #[error("unknown win pattern '{0}'")]
    UnknownPattern(String),

    #[error("pattern index {0} is outside 0..=24")]
    InvalidPatternIndex(u8),

    #[error("number {0} is outside 1..=75")]
    NumberOutOfRange(Number),

    #[error("number {0} has already been called")]
    AlreadyCalled(Number),

    #[error("no numbers remaining in pouch")]
    PouchEmpty,

    #[error("every ticket PIN is already in use")]
    PinsExhausted,

    #[error("game '{0}' not found")]
    GameNotFound(String),

    #[error("ticket '{0}' not found")]
    TicketNotFound(String),

    #[error("claim '{0}' not found")]
    ClaimNotFound(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("failed to persist game: {0}")]
    Persistence(String),

    #[error("failed to acquire {0} lock")]
    StateUnavailable(&'static str),
}

impl BingoError {
    /// True for errors caused by the caller's input rather than game state.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            BingoError::InvalidCellCount(_)
                | BingoError::InvalidCellPosition { .. }
                | BingoError::InvalidCard(_)
                | BingoError::UnknownPattern(_)
                | BingoError::InvalidPatternIndex(_)
                | BingoError::NumberOutOfRange(_)
        )
    }
}
