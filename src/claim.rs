// src/claim.rs
// Anti-cheat validation of a player's bingo claim.
//
// The shape is checked before the marks are cross-checked against the called
// numbers, so a player who simply has not finished yet gets "keep playing"
// while a player with marks on uncalled numbers gets the list to unmark.

use serde::{Deserialize, Serialize};

use crate::card::Cell;
use crate::defs::Number;
use crate::error::BingoError;
use crate::pattern::{check_pattern_win, WinningPattern};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimRejection {
    PatternNotMet,
    InvalidMarks { numbers: Vec<Number> },
}

impl ClaimRejection {
    /// Player-facing guidance for this rejection.
    pub fn message(&self) -> String {
        match self {
            ClaimRejection::PatternNotMet => {
                "The winning pattern is not complete yet, keep playing".to_string()
            }
            ClaimRejection::InvalidMarks { numbers } => {
                let list = numbers
                    .iter()
                    .map(Number::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("These numbers have not been called, unmark them: {list}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimVerdict {
    Accepted,
    Rejected { reason: ClaimRejection },
}

impl ClaimVerdict {
    pub fn rejection(&self) -> Option<&ClaimRejection> {
        match self {
            ClaimVerdict::Accepted => None,
            ClaimVerdict::Rejected { reason } => Some(reason),
        }
    }
}

/// Decide whether a claim stands against the pattern and the call history.
pub fn validate_claim(
    cells: &[Cell],
    pattern: &WinningPattern,
    called: &[Number],
) -> Result<ClaimVerdict, BingoError> {
    if !check_pattern_win(cells, pattern)? {
        return Ok(ClaimVerdict::Rejected { reason: ClaimRejection::PatternNotMet });
    }

    let uncalled: Vec<Number> = cells
        .iter()
        .filter(|cell| cell.marked)
        .filter_map(|cell| cell.number.number())
        .filter(|number| !called.contains(number))
        .collect();

    if uncalled.is_empty() {
        Ok(ClaimVerdict::Accepted)
    } else {
        Ok(ClaimVerdict::Rejected {
            reason: ClaimRejection::InvalidMarks { numbers: uncalled },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::generate_card;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn row_zero_card() -> Vec<Cell> {
        let card = generate_card(&mut StdRng::seed_from_u64(31)).unwrap();
        let mut cells: Vec<Cell> = card.into();
        for cell in cells.iter_mut().filter(|cell| cell.row == 0) {
            cell.marked = true;
        }
        cells
    }

    fn numbers_in_row(cells: &[Cell], row: u8) -> Vec<Number> {
        cells
            .iter()
            .filter(|cell| cell.row == row)
            .filter_map(|cell| cell.number.number())
            .collect()
    }

    #[test]
    fn test_accepts_called_marks() {
        let cells = row_zero_card();
        let called = numbers_in_row(&cells, 0);
        let pattern = WinningPattern::row(0).unwrap();
        assert_eq!(validate_claim(&cells, &pattern, &called), Ok(ClaimVerdict::Accepted));
    }

    #[test]
    fn test_rejects_uncalled_marks() {
        let cells = row_zero_card();
        let mut called = numbers_in_row(&cells, 0);
        let missing = called.remove(2);
        let pattern = WinningPattern::row(0).unwrap();

        let verdict = validate_claim(&cells, &pattern, &called).unwrap();
        assert_eq!(
            verdict.rejection(),
            Some(&ClaimRejection::InvalidMarks { numbers: vec![missing] })
        );
    }

    #[test]
    fn test_uncalled_marks_outside_pattern_still_reject() {
        let mut cells = row_zero_card();
        let called = numbers_in_row(&cells, 0);
        let stray = cells.iter_mut().find(|cell| cell.row == 3 && cell.col == 1).unwrap();
        stray.marked = true;
        let stray_number = stray.number.number().unwrap();

        let verdict = validate_claim(&cells, &WinningPattern::row(0).unwrap(), &called).unwrap();
        assert_eq!(
            verdict,
            ClaimVerdict::Rejected {
                reason: ClaimRejection::InvalidMarks { numbers: vec![stray_number] }
            }
        );
    }

    #[test]
    fn test_shape_checked_first() {
        let cells = row_zero_card();
        let verdict = validate_claim(&cells, &WinningPattern::row(1).unwrap(), &[]).unwrap();
        assert_eq!(verdict.rejection(), Some(&ClaimRejection::PatternNotMet));
    }

    #[test]
    fn test_malformed_input_is_error() {
        let mut cells = row_zero_card();
        cells.truncate(10);
        assert_eq!(
            validate_claim(&cells, &WinningPattern::default(), &[]),
            Err(BingoError::InvalidCellCount(10))
        );
    }

    #[test]
    fn test_rejection_messages() {
        assert!(ClaimRejection::PatternNotMet.message().contains("keep playing"));
        let message = ClaimRejection::InvalidMarks { numbers: vec![4, 62] }.message();
        assert!(message.ends_with("4, 62"));
    }

    #[test]
    fn test_verdict_json() {
        let verdict = ClaimVerdict::Rejected {
            reason: ClaimRejection::InvalidMarks { numbers: vec![9] },
        };
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["verdict"], "REJECTED");
        assert_eq!(json["reason"]["kind"], "INVALID_MARKS");
        assert_eq!(json["reason"]["numbers"], serde_json::json!([9]));
    }
}
