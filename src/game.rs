// src/game.rs
// Host-side game state: the authoritative called-number log, issued tickets
// and the claim queue, plus the registry of running games.
//
// Each game keeps its mutable state behind a single mutex so draws,
// marks and claim adjudication are serialized per game.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::board::CalledNumbers;
use crate::card::{generate_card, Card};
use crate::claim::{validate_claim, ClaimRejection, ClaimVerdict};
use crate::config::ServerConfig;
use crate::defs::Number;
use crate::error::BingoError;
use crate::logging::{log_info, log_warning};
use crate::pattern::{hint_numbers, WinningPattern};
use crate::pouch::Pouch;

// Ticket PINs are four decimal digits.
const PIN_SPACE: u16 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    Waiting,
    Playing,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Active,
    Claimed,
    Winner,
    Lost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimStatus {
    Pending,
    Confirmed,
    Rejected,
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: String,
    pub card_matrix: Card,
    pub pin: String,
    pub status: TicketStatus,
    pub phone: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRecord {
    pub id: String,
    pub ticket_id: String,
    pub submitted_at: DateTime<Utc>,
    pub sequence: u64,
    pub called_count: usize,
    pub status: ClaimStatus,
}

/// The game record as exchanged with the outside world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub id: String,
    pub called_numbers: Vec<Number>,
    pub current_number: Option<Number>,
    pub winning_pattern: Vec<u8>,
    pub hints_enabled: bool,
    pub status: GameStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimOutcome {
    Queued { claim: ClaimRecord },
    Rejected { reason: ClaimRejection, message: String },
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    #[serde(flatten)]
    pub record: GameRecord,
    pub created_at: DateTime<Utc>,
    pub ball_sequence: Vec<Number>,
    pub tickets: Vec<Ticket>,
    pub claims: Vec<ClaimRecord>,
    pub dumped_at: DateTime<Utc>,
}

struct GameState {
    status: GameStatus,
    pouch: Pouch,
    called: CalledNumbers,
    winning_pattern: WinningPattern,
    hints_enabled: bool,
    tickets: Vec<Ticket>,
    claims: Vec<ClaimRecord>,
    next_ticket: u64,
    next_claim: u64,
    rng: StdRng,
}

impl GameState {
    fn ticket_mut(&mut self, ticket_id: &str) -> Result<&mut Ticket, BingoError> {
        self.tickets
            .iter_mut()
            .find(|ticket| ticket.id == ticket_id)
            .ok_or_else(|| BingoError::TicketNotFound(ticket_id.to_string()))
    }

    fn claim_position(&self, claim_id: &str) -> Result<usize, BingoError> {
        self.claims
            .iter()
            .position(|claim| claim.id == claim_id)
            .ok_or_else(|| BingoError::ClaimNotFound(claim_id.to_string()))
    }

    fn pending_claims(&self) -> Vec<ClaimRecord> {
        let mut pending: Vec<ClaimRecord> = self
            .claims
            .iter()
            .filter(|claim| claim.status == ClaimStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by_key(|claim| claim.sequence);
        pending
    }

    // Uniform pick among the PINs no ticket holds yet.
    fn unique_pin(&mut self) -> Result<String, BingoError> {
        let taken: HashSet<&str> = self.tickets.iter().map(|ticket| ticket.pin.as_str()).collect();
        let free: Vec<u16> = (0..PIN_SPACE)
            .filter(|pin| !taken.contains(format!("{pin:04}").as_str()))
            .collect();
        if free.is_empty() {
            return Err(BingoError::PinsExhausted);
        }
        let pin = free[self.rng.random_range(0..free.len())];
        Ok(format!("{pin:04}"))
    }

    fn record(&self, id: &str) -> GameRecord {
        GameRecord {
            id: id.to_string(),
            called_numbers: self.called.as_slice().to_vec(),
            current_number: self.called.current(),
            winning_pattern: self.winning_pattern.indices(),
            hints_enabled: self.hints_enabled,
            status: self.status,
        }
    }
}

#[derive(Clone)]
pub struct Game {
    id: String,
    created_at: DateTime<Utc>,
    state: Arc<Mutex<GameState>>,
}

impl Game {
    pub fn new(config: &ServerConfig) -> Self {
        Self::with_seed(config, rand::random())
    }

    /// Game whose ball order, cards and pins derive from `seed`.
    pub fn with_seed(config: &ServerConfig, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let pouch = Pouch::with_rng(&mut rng);

        Self {
            id: format!("game_{:08x}", rand::random::<u32>()),
            created_at: Utc::now(),
            state: Arc::new(Mutex::new(GameState {
                status: GameStatus::Waiting,
                pouch,
                called: CalledNumbers::new(),
                winning_pattern: config.winning_pattern.clone(),
                hints_enabled: config.hints_enabled,
                tickets: Vec::new(),
                claims: Vec::new(),
                next_ticket: 1,
                next_claim: 1,
                rng,
            })),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn lock(&self) -> Result<MutexGuard<'_, GameState>, BingoError> {
        self.state.lock().map_err(|_| BingoError::StateUnavailable("game"))
    }

    pub fn status(&self) -> Result<GameStatus, BingoError> {
        Ok(self.lock()?.status)
    }

    pub fn start(&self) -> Result<(), BingoError> {
        let mut state = self.lock()?;
        match state.status {
            GameStatus::Waiting => {
                state.status = GameStatus::Playing;
                log_info(&format!("Game {} started", self.id));
                Ok(())
            }
            GameStatus::Playing => Err(BingoError::InvalidState("game already started".to_string())),
            GameStatus::Finished => Err(BingoError::InvalidState("game is finished".to_string())),
        }
    }

    /// Draw the next ball and append it to the called log. Once the pouch is
    /// exhausted the game finishes and `PouchEmpty` is returned.
    pub fn draw_number(&self) -> Result<Number, BingoError> {
        let mut state = self.lock()?;
        if state.status != GameStatus::Playing {
            return Err(BingoError::InvalidState("numbers can only be drawn while playing".to_string()));
        }

        match state.pouch.draw() {
            Some(number) => {
                state.called.push(number)?;
                log_info(&format!(
                    "Game {}: called {number} ({} remaining)",
                    self.id,
                    state.pouch.len()
                ));
                Ok(number)
            }
            None => {
                state.status = GameStatus::Finished;
                log_warning(&format!("Game {}: pouch exhausted, game finished", self.id));
                Err(BingoError::PouchEmpty)
            }
        }
    }

    pub fn called_numbers(&self) -> Result<CalledNumbers, BingoError> {
        Ok(self.lock()?.called.clone())
    }

    pub fn set_winning_pattern(&self, pattern: WinningPattern) -> Result<(), BingoError> {
        let mut state = self.lock()?;
        if state.status == GameStatus::Finished {
            return Err(BingoError::InvalidState("game is finished".to_string()));
        }
        if !state.pending_claims().is_empty() {
            return Err(BingoError::InvalidState(
                "pattern cannot change while claims are pending".to_string(),
            ));
        }
        log_info(&format!("Game {}: winning pattern set to {:?}", self.id, pattern.indices()));
        state.winning_pattern = pattern;
        Ok(())
    }

    pub fn set_hints_enabled(&self, enabled: bool) -> Result<(), BingoError> {
        self.lock()?.hints_enabled = enabled;
        Ok(())
    }

    pub fn issue_ticket(&self, name: &str, phone: &str) -> Result<Ticket, BingoError> {
        let mut state = self.lock()?;
        if state.status == GameStatus::Finished {
            return Err(BingoError::InvalidState("game is finished".to_string()));
        }

        let pin = state.unique_pin()?;
        let card = generate_card(&mut state.rng)?;
        let ticket = Ticket {
            id: format!("T{:04}", state.next_ticket),
            card_matrix: card,
            pin,
            status: TicketStatus::Active,
            phone: phone.to_string(),
            name: name.to_string(),
        };
        state.next_ticket += 1;
        state.tickets.push(ticket.clone());

        log_info(&format!("Game {}: issued ticket {} to '{name}'", self.id, ticket.id));
        Ok(ticket)
    }

    pub fn ticket(&self, ticket_id: &str) -> Result<Ticket, BingoError> {
        let state = self.lock()?;
        state
            .tickets
            .iter()
            .find(|ticket| ticket.id == ticket_id)
            .cloned()
            .ok_or_else(|| BingoError::TicketNotFound(ticket_id.to_string()))
    }

    pub fn ticket_by_pin(&self, pin: &str) -> Result<Ticket, BingoError> {
        let state = self.lock()?;
        state
            .tickets
            .iter()
            .find(|ticket| ticket.pin == pin)
            .cloned()
            .ok_or_else(|| BingoError::TicketNotFound(format!("pin {pin}")))
    }

    pub fn tickets(&self) -> Result<Vec<Ticket>, BingoError> {
        Ok(self.lock()?.tickets.clone())
    }

    /// Player-controlled mark. Marks are frozen once a claim is pending.
    pub fn mark_cell(&self, ticket_id: &str, cell_id: &str, marked: bool) -> Result<Ticket, BingoError> {
        let mut state = self.lock()?;
        let ticket = state.ticket_mut(ticket_id)?;
        if ticket.status != TicketStatus::Active {
            return Err(BingoError::InvalidState(format!(
                "ticket {ticket_id} is {:?} and can no longer be marked",
                ticket.status
            )));
        }
        ticket.card_matrix.set_marked(cell_id, marked)?;
        Ok(ticket.clone())
    }

    /// Called numbers the player could still mark; empty when hints are off.
    pub fn hints(&self, ticket_id: &str) -> Result<Vec<Number>, BingoError> {
        let mut state = self.lock()?;
        if !state.hints_enabled {
            return Ok(Vec::new());
        }
        let pattern = state.winning_pattern.clone();
        let called = state.called.clone();
        let ticket = state.ticket_mut(ticket_id)?;
        hint_numbers(ticket.card_matrix.cells(), &pattern, called.as_slice())
    }

    /// Validate a claim against the current call history and queue it for
    /// the host when it stands.
    pub fn submit_claim(&self, ticket_id: &str) -> Result<ClaimOutcome, BingoError> {
        let mut state = self.lock()?;
        if state.status != GameStatus::Playing {
            return Err(BingoError::InvalidState("claims are only accepted while playing".to_string()));
        }

        let pattern = state.winning_pattern.clone();
        let called = state.called.clone();
        let ticket = state.ticket_mut(ticket_id)?;
        if ticket.status != TicketStatus::Active {
            return Err(BingoError::InvalidState(format!(
                "ticket {ticket_id} is {:?} and cannot claim",
                ticket.status
            )));
        }

        match validate_claim(ticket.card_matrix.cells(), &pattern, called.as_slice())? {
            ClaimVerdict::Rejected { reason } => {
                log_info(&format!("Game {}: claim by {ticket_id} rejected: {reason:?}", self.id));
                let message = reason.message();
                Ok(ClaimOutcome::Rejected { reason, message })
            }
            ClaimVerdict::Accepted => {
                ticket.status = TicketStatus::Claimed;
                let claim = ClaimRecord {
                    id: format!("C{:04}", state.next_claim),
                    ticket_id: ticket_id.to_string(),
                    submitted_at: Utc::now(),
                    sequence: state.next_claim,
                    called_count: called.len(),
                    status: ClaimStatus::Pending,
                };
                state.next_claim += 1;
                state.claims.push(claim.clone());
                log_info(&format!(
                    "Game {}: claim {} by {ticket_id} queued after {} calls",
                    self.id, claim.id, claim.called_count
                ));
                Ok(ClaimOutcome::Queued { claim })
            }
        }
    }

    /// Pending claims in arrival order.
    pub fn pending_claims(&self) -> Result<Vec<ClaimRecord>, BingoError> {
        Ok(self.lock()?.pending_claims())
    }

    pub fn claims(&self) -> Result<Vec<ClaimRecord>, BingoError> {
        Ok(self.lock()?.claims.clone())
    }

    /// Confirm the earliest pending claim as the winner. Every other pending
    /// claim is superseded and the game finishes.
    pub fn confirm_claim(&self, claim_id: &str) -> Result<ClaimRecord, BingoError> {
        let mut state = self.lock()?;
        let position = state.claim_position(claim_id)?;
        if state.claims[position].status != ClaimStatus::Pending {
            return Err(BingoError::InvalidState(format!("claim {claim_id} is not pending")));
        }
        if let Some(first) = state.pending_claims().first() {
            if first.id != claim_id {
                return Err(BingoError::InvalidState(format!(
                    "claim {} was submitted earlier and must be adjudicated first",
                    first.id
                )));
            }
        }

        let mut losing_tickets = Vec::new();
        for claim in state.claims.iter_mut() {
            if claim.status != ClaimStatus::Pending {
                continue;
            }
            if claim.id == claim_id {
                claim.status = ClaimStatus::Confirmed;
            } else {
                claim.status = ClaimStatus::Superseded;
                losing_tickets.push(claim.ticket_id.clone());
            }
        }

        let winner = state.claims[position].ticket_id.clone();
        state.ticket_mut(&winner)?.status = TicketStatus::Winner;
        for ticket_id in &losing_tickets {
            state.ticket_mut(ticket_id)?.status = TicketStatus::Lost;
        }
        state.status = GameStatus::Finished;

        log_info(&format!(
            "Game {}: claim {claim_id} confirmed, ticket {winner} wins ({} superseded)",
            self.id,
            losing_tickets.len()
        ));
        Ok(state.claims[position].clone())
    }

    /// Turn a pending claim down; the ticket returns to play.
    pub fn reject_claim(&self, claim_id: &str) -> Result<ClaimRecord, BingoError> {
        let mut state = self.lock()?;
        let position = state.claim_position(claim_id)?;
        if state.claims[position].status != ClaimStatus::Pending {
            return Err(BingoError::InvalidState(format!("claim {claim_id} is not pending")));
        }

        state.claims[position].status = ClaimStatus::Rejected;
        let ticket_id = state.claims[position].ticket_id.clone();
        state.ticket_mut(&ticket_id)?.status = TicketStatus::Active;

        log_info(&format!("Game {}: claim {claim_id} rejected by host", self.id));
        Ok(state.claims[position].clone())
    }

    pub fn record(&self) -> Result<GameRecord, BingoError> {
        Ok(self.lock()?.record(&self.id))
    }

    /// Record, tickets and claims taken under one lock.
    pub fn snapshot(&self) -> Result<GameSnapshot, BingoError> {
        let state = self.lock()?;
        Ok(GameSnapshot {
            record: state.record(&self.id),
            created_at: self.created_at,
            ball_sequence: state.pouch.sequence().to_vec(),
            tickets: state.tickets.clone(),
            claims: state.claims.clone(),
            dumped_at: Utc::now(),
        })
    }

    /// Write the game snapshot to `<dir>/<game id>.json`.
    pub fn dump_to_json(&self, dir: &Path) -> Result<PathBuf, BingoError> {
        let snapshot = self.snapshot()?;
        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| BingoError::Persistence(format!("failed to serialize game state: {e}")))?;

        fs::create_dir_all(dir)
            .map_err(|e| BingoError::Persistence(format!("failed to create {}: {e}", dir.display())))?;
        let path = dir.join(format!("{}.json", self.id));
        fs::write(&path, json)
            .map_err(|e| BingoError::Persistence(format!("failed to write {}: {e}", path.display())))?;

        log_info(&format!("Game {} dumped to {}", self.id, path.display()));
        Ok(path)
    }

    pub fn game_info(&self) -> String {
        match self.lock() {
            Ok(state) => format!(
                "Game[id={}, created={}, status={:?}, called={}, tickets={}, pending_claims={}]",
                self.id,
                self.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
                state.status,
                state.called.len(),
                state.tickets.len(),
                state.pending_claims().len()
            ),
            Err(_) => format!("Game[id={}, state unavailable]", self.id),
        }
    }
}

#[derive(Default)]
pub struct GameRegistry {
    games: Mutex<HashMap<String, Arc<Game>>>,
}

impl GameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Arc<Game>>>, BingoError> {
        self.games.lock().map_err(|_| BingoError::StateUnavailable("game registry"))
    }

    pub fn add_game(&self, game: Arc<Game>) -> Result<(), BingoError> {
        let mut games = self.lock()?;
        if games.contains_key(game.id()) {
            return Err(BingoError::InvalidState(format!("game '{}' already registered", game.id())));
        }
        games.insert(game.id().to_string(), game);
        Ok(())
    }

    pub fn get_game(&self, game_id: &str) -> Result<Arc<Game>, BingoError> {
        self.lock()?
            .get(game_id)
            .cloned()
            .ok_or_else(|| BingoError::GameNotFound(game_id.to_string()))
    }

    /// All games, oldest first.
    pub fn list_games(&self) -> Result<Vec<Arc<Game>>, BingoError> {
        let mut games: Vec<Arc<Game>> = self.lock()?.values().cloned().collect();
        games.sort_by_key(|game| game.created_at());
        Ok(games)
    }

    pub fn len(&self) -> usize {
        self.lock().map(|games| games.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing_game() -> Game {
        let game = Game::with_seed(&ServerConfig::default(), 2024);
        game.start().unwrap();
        game
    }

    fn mark_all_called(game: &Game, ticket: &Ticket) {
        let called = game.called_numbers().unwrap();
        for cell in ticket.card_matrix.cells() {
            if let Some(number) = cell.number.number() {
                if called.contains(number) {
                    game.mark_cell(&ticket.id, &cell.id, true).unwrap();
                }
            }
        }
    }

    // Draw until every number on the ticket has been called.
    fn draw_until_full(game: &Game, ticket: &Ticket) {
        let numbers = ticket.card_matrix.numbers();
        while !numbers.iter().all(|n| game.called_numbers().unwrap().contains(*n)) {
            game.draw_number().unwrap();
        }
    }

    #[test]
    fn test_game_creation() {
        let game = Game::new(&ServerConfig::default());
        assert!(game.id().starts_with("game_"));
        assert_eq!(game.id().len(), 13);

        let record = game.record().unwrap();
        assert_eq!(record.status, GameStatus::Waiting);
        assert!(record.called_numbers.is_empty());
        assert_eq!(record.current_number, None);
        assert!(record.winning_pattern.is_empty());
        assert!(!record.hints_enabled);
    }

    #[test]
    fn test_unique_game_ids() {
        let config = ServerConfig::default();
        assert_ne!(Game::new(&config).id(), Game::new(&config).id());
    }

    #[test]
    fn test_start_transitions() {
        let game = Game::with_seed(&ServerConfig::default(), 1);
        assert!(game.draw_number().is_err());
        game.start().unwrap();
        assert!(game.start().is_err());
        assert_eq!(game.status().unwrap(), GameStatus::Playing);
    }

    #[test]
    fn test_draw_until_exhausted() {
        let game = playing_game();
        let mut drawn = Vec::new();
        for _ in 0..75 {
            drawn.push(game.draw_number().unwrap());
        }
        let record = game.record().unwrap();
        assert_eq!(record.called_numbers, drawn);
        assert_eq!(record.current_number, drawn.last().copied());

        assert_eq!(game.draw_number(), Err(BingoError::PouchEmpty));
        assert_eq!(game.status().unwrap(), GameStatus::Finished);
    }

    #[test]
    fn test_same_seed_same_draws() {
        let config = ServerConfig::default();
        let a = Game::with_seed(&config, 77);
        let b = Game::with_seed(&config, 77);
        a.start().unwrap();
        b.start().unwrap();
        for _ in 0..10 {
            assert_eq!(a.draw_number().unwrap(), b.draw_number().unwrap());
        }
    }

    #[test]
    fn test_issue_ticket() {
        let game = playing_game();
        let first = game.issue_ticket("Ada", "555-0101").unwrap();
        let second = game.issue_ticket("Bo", "555-0102").unwrap();

        assert_eq!(first.id, "T0001");
        assert_eq!(second.id, "T0002");
        assert_eq!(first.pin.len(), 4);
        assert_ne!(first.pin, second.pin);
        assert_eq!(first.status, TicketStatus::Active);
        assert_eq!(game.ticket_by_pin(&second.pin).unwrap().name, "Bo");
        assert!(matches!(game.ticket("T9999"), Err(BingoError::TicketNotFound(_))));
    }

    fn fill_pins(game: &Game, keep_free: Option<&str>) {
        let template = game.issue_ticket("seed", "").unwrap();
        let mut state = game.lock().unwrap();
        state.tickets.clear();
        for pin in (0..PIN_SPACE).map(|pin| format!("{pin:04}")) {
            if Some(pin.as_str()) == keep_free {
                continue;
            }
            state.tickets.push(Ticket { id: format!("X{pin}"), pin, ..template.clone() });
        }
    }

    #[test]
    fn test_issue_ticket_when_pins_exhausted() {
        let game = playing_game();
        fill_pins(&game, None);

        assert_eq!(game.issue_ticket("late", ""), Err(BingoError::PinsExhausted));
        assert_eq!(game.tickets().unwrap().len(), PIN_SPACE as usize);
        // the lock is released, the game keeps serving
        assert_eq!(game.status().unwrap(), GameStatus::Playing);
    }

    #[test]
    fn test_issue_ticket_takes_last_free_pin() {
        let game = playing_game();
        fill_pins(&game, Some("4321"));

        let ticket = game.issue_ticket("last", "").unwrap();
        assert_eq!(ticket.pin, "4321");
        assert_eq!(game.issue_ticket("later", ""), Err(BingoError::PinsExhausted));
    }

    #[test]
    fn test_pending_claims_follow_arrival_order() {
        let game = playing_game();
        let ada = game.issue_ticket("Ada", "").unwrap();
        let bo = game.issue_ticket("Bo", "").unwrap();
        draw_until_full(&game, &ada);
        draw_until_full(&game, &bo);
        mark_all_called(&game, &ada);
        mark_all_called(&game, &bo);
        game.submit_claim(&ada.id).unwrap();
        game.submit_claim(&bo.id).unwrap();

        // wall clock stepped back between the two submissions
        {
            let mut state = game.lock().unwrap();
            state.claims[1].submitted_at = state.claims[0].submitted_at - chrono::Duration::seconds(30);
        }

        let pending = game.pending_claims().unwrap();
        assert_eq!(pending[0].ticket_id, ada.id);
        assert_eq!(pending[1].ticket_id, bo.id);
        assert!(game.confirm_claim(&pending[1].id).is_err());
        assert_eq!(game.confirm_claim(&pending[0].id).unwrap().ticket_id, ada.id);
    }

    #[test]
    fn test_premature_claim_is_rejected() {
        let game = playing_game();
        let ticket = game.issue_ticket("Ada", "").unwrap();
        for _ in 0..5 {
            game.draw_number().unwrap();
        }
        mark_all_called(&game, &ticket);

        match game.submit_claim(&ticket.id).unwrap() {
            ClaimOutcome::Rejected { reason, .. } => assert_eq!(reason, ClaimRejection::PatternNotMet),
            other => panic!("unexpected outcome {other:?}"),
        }
        assert!(game.pending_claims().unwrap().is_empty());
        assert_eq!(game.ticket(&ticket.id).unwrap().status, TicketStatus::Active);
    }

    #[test]
    fn test_fabricated_marks_are_rejected() {
        let game = playing_game();
        let ticket = game.issue_ticket("Ada", "").unwrap();
        for cell in ticket.card_matrix.cells() {
            game.mark_cell(&ticket.id, &cell.id, true).unwrap();
        }

        match game.submit_claim(&ticket.id).unwrap() {
            ClaimOutcome::Rejected { reason: ClaimRejection::InvalidMarks { numbers }, .. } => {
                assert_eq!(numbers, ticket.card_matrix.numbers());
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn test_claim_queue_and_confirmation() {
        let game = playing_game();
        let ada = game.issue_ticket("Ada", "").unwrap();
        let bo = game.issue_ticket("Bo", "").unwrap();
        draw_until_full(&game, &ada);
        draw_until_full(&game, &bo);
        mark_all_called(&game, &ada);
        mark_all_called(&game, &bo);

        let first = match game.submit_claim(&bo.id).unwrap() {
            ClaimOutcome::Queued { claim } => claim,
            other => panic!("unexpected outcome {other:?}"),
        };
        let second = match game.submit_claim(&ada.id).unwrap() {
            ClaimOutcome::Queued { claim } => claim,
            other => panic!("unexpected outcome {other:?}"),
        };

        let pending = game.pending_claims().unwrap();
        assert_eq!(pending.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(), vec![first.id.as_str(), second.id.as_str()]);
        assert_eq!(game.ticket(&bo.id).unwrap().status, TicketStatus::Claimed);
        assert!(game.mark_cell(&bo.id, "B0", false).is_err());
        assert!(game.submit_claim(&bo.id).is_err());
        assert!(game.set_winning_pattern(WinningPattern::four_corners()).is_err());

        // later claims wait for the earlier one
        assert!(game.confirm_claim(&second.id).is_err());

        let confirmed = game.confirm_claim(&first.id).unwrap();
        assert_eq!(confirmed.status, ClaimStatus::Confirmed);
        assert_eq!(game.ticket(&bo.id).unwrap().status, TicketStatus::Winner);
        assert_eq!(game.ticket(&ada.id).unwrap().status, TicketStatus::Lost);
        assert_eq!(game.claims().unwrap()[1].status, ClaimStatus::Superseded);
        assert_eq!(game.status().unwrap(), GameStatus::Finished);
        assert!(game.draw_number().is_err());
    }

    #[test]
    fn test_reject_claim_returns_ticket_to_play() {
        let game = playing_game();
        let ticket = game.issue_ticket("Ada", "").unwrap();
        draw_until_full(&game, &ticket);
        mark_all_called(&game, &ticket);

        let claim = match game.submit_claim(&ticket.id).unwrap() {
            ClaimOutcome::Queued { claim } => claim,
            other => panic!("unexpected outcome {other:?}"),
        };
        let rejected = game.reject_claim(&claim.id).unwrap();
        assert_eq!(rejected.status, ClaimStatus::Rejected);
        assert_eq!(game.ticket(&ticket.id).unwrap().status, TicketStatus::Active);
        assert!(game.reject_claim(&claim.id).is_err());
        assert!(matches!(game.confirm_claim("C9999"), Err(BingoError::ClaimNotFound(_))));
    }

    #[test]
    fn test_hints() {
        let game = playing_game();
        let ticket = game.issue_ticket("Ada", "").unwrap();
        draw_until_full(&game, &ticket);
        assert!(game.hints(&ticket.id).unwrap().is_empty());

        game.set_hints_enabled(true).unwrap();
        let hints = game.hints(&ticket.id).unwrap();
        assert_eq!(hints, ticket.card_matrix.numbers());

        mark_all_called(&game, &ticket);
        assert!(game.hints(&ticket.id).unwrap().is_empty());
    }

    #[test]
    fn test_dump_to_json() {
        let game = playing_game();
        game.issue_ticket("Ada", "555").unwrap();
        game.draw_number().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = game.dump_to_json(dir.path()).unwrap();
        let content = fs::read_to_string(path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&content).unwrap();

        assert_eq!(json["id"], game.id());
        assert_eq!(json["status"], "PLAYING");
        assert_eq!(json["calledNumbers"].as_array().unwrap().len(), 1);
        assert_eq!(json["ballSequence"].as_array().unwrap().len(), 75);
        assert_eq!(json["tickets"][0]["cardMatrix"][12]["number"], "FREE");
    }

    #[test]
    fn test_snapshot_is_consistent() {
        let game = playing_game();
        game.issue_ticket("Ada", "").unwrap();
        for _ in 0..3 {
            game.draw_number().unwrap();
        }

        let snapshot = game.snapshot().unwrap();
        assert_eq!(snapshot.record, game.record().unwrap());
        assert_eq!(snapshot.record.called_numbers, snapshot.ball_sequence[..3].to_vec());
        assert_eq!(snapshot.tickets.len(), 1);
    }

    #[test]
    fn test_game_info() {
        let game = playing_game();
        let info = game.game_info();
        assert!(info.contains(game.id()));
        assert!(info.contains("status=Playing"));
        assert!(info.contains("called=0"));
    }

    #[test]
    fn test_registry() {
        let registry = GameRegistry::new();
        let config = ServerConfig::default();
        let game = Arc::new(Game::new(&config));
        registry.add_game(Arc::clone(&game)).unwrap();
        assert!(registry.add_game(Arc::clone(&game)).is_err());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get_game(game.id()).unwrap().id(), game.id());
        assert!(matches!(registry.get_game("game_missing"), Err(BingoError::GameNotFound(_))));

        registry.add_game(Arc::new(Game::new(&config))).unwrap();
        let listed = registry.list_games().unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().any(|listed_game| listed_game.id() == game.id()));
    }
}
