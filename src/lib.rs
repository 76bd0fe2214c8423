// lib.rs
// Library modules for the bingo engine and game host

pub mod defs;
pub mod error;
pub mod card;
pub mod pouch;
pub mod board;
pub mod pattern;
pub mod claim;
pub mod game;
pub mod config;
pub mod logging;
pub mod api_handlers;
pub mod server;

pub use card::{generate_card, Card, Cell, CellNumber, Letter};
pub use claim::{validate_claim, ClaimRejection, ClaimVerdict};
pub use error::BingoError;
pub use pattern::{check_pattern_win, check_win, WinPattern, WinningPattern};
pub use pouch::{shuffled_sequence, BallSequence, Pouch};
