// src/board.rs
// The authoritative, append-only history of called numbers for a game.

use serde::{Deserialize, Serialize};

use crate::defs::{column_of, Number};
use crate::error::BingoError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Number>", into = "Vec<Number>")]
pub struct CalledNumbers(Vec<Number>);

impl CalledNumbers {
    pub fn new() -> Self {
        CalledNumbers(Vec::new())
    }

    /// Append a newly drawn number. Out-of-range and repeated numbers are refused.
    pub fn push(&mut self, number: Number) -> Result<(), BingoError> {
        if column_of(number).is_none() {
            return Err(BingoError::NumberOutOfRange(number));
        }
        if self.contains(number) {
            return Err(BingoError::AlreadyCalled(number));
        }
        self.0.push(number);
        Ok(())
    }

    pub fn contains(&self, number: Number) -> bool {
        self.0.contains(&number)
    }

    pub fn as_slice(&self) -> &[Number] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The most recent call.
    pub fn current(&self) -> Option<Number> {
        self.0.last().copied()
    }

    /// Up to `n` calls preceding the current one, newest first.
    pub fn recent(&self, n: usize) -> Vec<Number> {
        if self.0.len() <= 1 {
            return Vec::new();
        }
        let previous = &self.0[..self.0.len() - 1];
        previous.iter().rev().take(n).copied().collect()
    }

    pub fn sorted(&self) -> Vec<Number> {
        let mut sorted = self.0.clone();
        sorted.sort_unstable();
        sorted
    }
}

impl TryFrom<Vec<Number>> for CalledNumbers {
    type Error = BingoError;

    fn try_from(numbers: Vec<Number>) -> Result<Self, Self::Error> {
        let mut called = CalledNumbers::new();
        for number in numbers {
            called.push(number)?;
        }
        Ok(called)
    }
}

impl From<CalledNumbers> for Vec<Number> {
    fn from(called: CalledNumbers) -> Self {
        called.0
    }
}
