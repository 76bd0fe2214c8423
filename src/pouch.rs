// src/pouch.rs
// Ball sequence generation and the draw cursor over it.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::defs::{Number, BALLSNUMBER, FIRSTNUMBER, LASTNUMBER};
use crate::error::BingoError;

pub type BallSequence = Vec<Number>;

/// Uniformly random permutation of 1..=75 (Fisher-Yates).
pub fn shuffled_sequence<R: Rng>(rng: &mut R) -> BallSequence {
    let mut balls: BallSequence = (FIRSTNUMBER..=LASTNUMBER).collect();
    for i in (1..balls.len()).rev() {
        let j = rng.random_range(0..=i);
        balls.swap(i, j);
    }
    balls
}

/// The draw order of one game, consumed front to back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pouch {
    sequence: BallSequence,
    drawn: usize,
}

impl Pouch {
    pub fn with_rng<R: Rng>(rng: &mut R) -> Self {
        Pouch {
            sequence: shuffled_sequence(rng),
            drawn: 0,
        }
    }

    /// Rebuild a pouch for a game already in progress. `called` must be a
    /// prefix of `sequence`, and `sequence` a permutation of 1..=75.
    pub fn resume(sequence: BallSequence, called: &[Number]) -> Result<Self, BingoError> {
        if sequence.len() != BALLSNUMBER {
            return Err(BingoError::InvalidState(format!(
                "ball sequence has {} numbers, expected {BALLSNUMBER}",
                sequence.len()
            )));
        }
        let mut seen = [false; BALLSNUMBER];
        for &number in &sequence {
            if !(FIRSTNUMBER..=LASTNUMBER).contains(&number) {
                return Err(BingoError::NumberOutOfRange(number));
            }
            let slot = &mut seen[(number - FIRSTNUMBER) as usize];
            if *slot {
                return Err(BingoError::InvalidState(format!("ball {number} appears twice in sequence")));
            }
            *slot = true;
        }
        if !sequence.starts_with(called) {
            return Err(BingoError::InvalidState(
                "called numbers do not match the ball sequence".to_string(),
            ));
        }

        Ok(Pouch {
            drawn: called.len(),
            sequence,
        })
    }

    pub fn len(&self) -> usize {
        self.sequence.len() - self.drawn
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Next ball in the sequence, or `None` once all 75 are out.
    pub fn draw(&mut self) -> Option<Number> {
        let next = self.sequence.get(self.drawn).copied()?;
        self.drawn += 1;
        Some(next)
    }

    pub fn remaining(&self) -> &[Number] {
        &self.sequence[self.drawn..]
    }

    pub fn sequence(&self) -> &[Number] {
        &self.sequence
    }
}
