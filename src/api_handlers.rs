// src/api_handlers.rs
// JSON route handlers for the bingo HTTP API.
//
// Handlers take the already-collected request body so they can be driven
// directly from tests; `server.rs` owns the hyper plumbing.

use std::sync::Arc;

use hyper::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::ServerConfig;
use crate::error::BingoError;
use crate::game::{Game, GameRegistry};
use crate::logging::{log_error, log_info, log_warning};
use crate::pattern::WinningPattern;

pub struct AppState {
    pub registry: GameRegistry,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self { registry: GameRegistry::new(), config }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn body(&self) -> Value {
        let error_response = ErrorResponse { error: self.message.clone() };
        serde_json::to_value(&error_response).unwrap_or_else(|_| json!({ "error": self.message }))
    }
}

impl From<BingoError> for ApiError {
    fn from(err: BingoError) -> Self {
        let status = match &err {
            BingoError::GameNotFound(_) | BingoError::TicketNotFound(_) | BingoError::ClaimNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            BingoError::InvalidState(_)
            | BingoError::AlreadyCalled(_)
            | BingoError::PouchEmpty
            | BingoError::PinsExhausted => {
                StatusCode::CONFLICT
            }
            e if e.is_malformed_input() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError::new(status, err.to_string())
    }
}

pub type ApiResult = Result<Value, ApiError>;

#[derive(Deserialize)]
pub struct PatternRequest {
    pub pattern: Option<Vec<u8>>,
    pub named: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRequest {
    pub hints_enabled: bool,
}

#[derive(Deserialize)]
pub struct TicketRequest {
    pub name: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkRequest {
    pub cell_id: String,
    pub marked: bool,
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, format!("Invalid JSON in request body: {e}")))
}

fn to_json<T: Serialize>(value: &T) -> ApiResult {
    serde_json::to_value(value)
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to serialize response: {e}")))
}

fn game(app_state: &AppState, game_id: &str) -> Result<Arc<Game>, ApiError> {
    Ok(app_state.registry.get_game(game_id)?)
}

/// Dispatch a request to its handler and produce the status and JSON body.
pub async fn route(app_state: &Arc<AppState>, method: &Method, path: &str, body: &[u8]) -> (StatusCode, Value) {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let result = match (method, segments.as_slice()) {
        (&Method::GET, ["games"]) => handle_gameslist(app_state).await,
        (&Method::POST, ["newgame"]) => handle_newgame(app_state).await,
        (&Method::GET, [game_id, "status"]) => handle_status(app_state, game_id).await,
        (&Method::POST, [game_id, "start"]) => handle_start(app_state, game_id).await,
        (&Method::POST, [game_id, "draw"]) => handle_draw(app_state, game_id).await,
        (&Method::POST, [game_id, "pattern"]) => handle_pattern(app_state, game_id, body).await,
        (&Method::POST, [game_id, "settings"]) => handle_settings(app_state, game_id, body).await,
        (&Method::POST, [game_id, "tickets"]) => handle_issue_ticket(app_state, game_id, body).await,
        (&Method::GET, [game_id, "tickets"]) => handle_tickets(app_state, game_id).await,
        (&Method::GET, [game_id, "tickets", "pin", pin]) => handle_ticket_by_pin(app_state, game_id, pin).await,
        (&Method::GET, [game_id, "tickets", ticket_id]) => handle_ticket(app_state, game_id, ticket_id).await,
        (&Method::POST, [game_id, "tickets", ticket_id, "mark"]) => {
            handle_mark(app_state, game_id, ticket_id, body).await
        }
        (&Method::GET, [game_id, "tickets", ticket_id, "hints"]) => {
            handle_hints(app_state, game_id, ticket_id).await
        }
        (&Method::POST, [game_id, "tickets", ticket_id, "claim"]) => {
            handle_claim(app_state, game_id, ticket_id).await
        }
        (&Method::GET, [game_id, "claims"]) => handle_claims(app_state, game_id).await,
        (&Method::POST, [game_id, "claims", claim_id, "confirm"]) => {
            handle_confirm(app_state, game_id, claim_id).await
        }
        (&Method::POST, [game_id, "claims", claim_id, "reject"]) => {
            handle_reject(app_state, game_id, claim_id).await
        }
        (&Method::POST, [game_id, "dumpgame"]) => handle_dumpgame(app_state, game_id).await,
        _ => Err(ApiError::new(StatusCode::NOT_FOUND, format!("No route for {method} {path}"))),
    };

    match result {
        Ok(value) => (StatusCode::OK, value),
        Err(err) => {
            if err.status.is_server_error() {
                log_error(&format!("{method} {path} failed: {}", err.message));
            }
            (err.status, err.body())
        }
    }
}

pub async fn handle_gameslist(app_state: &AppState) -> ApiResult {
    let records = app_state
        .registry
        .list_games()?
        .iter()
        .map(|game| game.record())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(json!({ "games": records }))
}

pub async fn handle_newgame(app_state: &AppState) -> ApiResult {
    let game = Arc::new(Game::new(&app_state.config));
    app_state.registry.add_game(Arc::clone(&game))?;
    log_info(&format!("Created new game: {}", game.game_info()));
    to_json(&game.record()?)
}

pub async fn handle_status(app_state: &AppState, game_id: &str) -> ApiResult {
    to_json(&game(app_state, game_id)?.record()?)
}

pub async fn handle_start(app_state: &AppState, game_id: &str) -> ApiResult {
    let game = game(app_state, game_id)?;
    game.start()?;
    to_json(&game.record()?)
}

pub async fn handle_draw(app_state: &AppState, game_id: &str) -> ApiResult {
    let game = game(app_state, game_id)?;
    let number = game.draw_number()?;
    Ok(json!({ "number": number, "game": game.record()? }))
}

pub async fn handle_pattern(app_state: &AppState, game_id: &str, body: &[u8]) -> ApiResult {
    let request: PatternRequest = parse_body(body)?;
    let pattern = match (request.pattern, request.named) {
        (Some(indices), None) => WinningPattern::from_indices(indices)?,
        (None, Some(name)) => WinningPattern::preset(&name)?,
        _ => {
            return Err(ApiError::new(
                StatusCode::BAD_REQUEST,
                "Provide exactly one of 'pattern' or 'named'",
            ));
        }
    };

    let game = game(app_state, game_id)?;
    game.set_winning_pattern(pattern)?;
    to_json(&game.record()?)
}

pub async fn handle_settings(app_state: &AppState, game_id: &str, body: &[u8]) -> ApiResult {
    let request: SettingsRequest = parse_body(body)?;
    let game = game(app_state, game_id)?;
    game.set_hints_enabled(request.hints_enabled)?;
    to_json(&game.record()?)
}

pub async fn handle_issue_ticket(app_state: &AppState, game_id: &str, body: &[u8]) -> ApiResult {
    let request: TicketRequest = parse_body(body)?;
    if request.name.trim().is_empty() {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "Ticket holder name is required"));
    }
    let ticket = game(app_state, game_id)?.issue_ticket(request.name.trim(), request.phone.trim())?;
    to_json(&ticket)
}

pub async fn handle_ticket(app_state: &AppState, game_id: &str, ticket_id: &str) -> ApiResult {
    to_json(&game(app_state, game_id)?.ticket(ticket_id)?)
}

pub async fn handle_tickets(app_state: &AppState, game_id: &str) -> ApiResult {
    let tickets = game(app_state, game_id)?.tickets()?;
    Ok(json!({ "tickets": tickets }))
}

pub async fn handle_ticket_by_pin(app_state: &AppState, game_id: &str, pin: &str) -> ApiResult {
    to_json(&game(app_state, game_id)?.ticket_by_pin(pin)?)
}

pub async fn handle_mark(app_state: &AppState, game_id: &str, ticket_id: &str, body: &[u8]) -> ApiResult {
    let request: MarkRequest = parse_body(body)?;
    let ticket = game(app_state, game_id)?.mark_cell(ticket_id, &request.cell_id, request.marked)?;
    to_json(&ticket)
}

pub async fn handle_hints(app_state: &AppState, game_id: &str, ticket_id: &str) -> ApiResult {
    let hints = game(app_state, game_id)?.hints(ticket_id)?;
    Ok(json!({ "hints": hints }))
}

pub async fn handle_claim(app_state: &AppState, game_id: &str, ticket_id: &str) -> ApiResult {
    to_json(&game(app_state, game_id)?.submit_claim(ticket_id)?)
}

pub async fn handle_claims(app_state: &AppState, game_id: &str) -> ApiResult {
    let pending = game(app_state, game_id)?.pending_claims()?;
    Ok(json!({ "claims": pending }))
}

pub async fn handle_confirm(app_state: &AppState, game_id: &str, claim_id: &str) -> ApiResult {
    let game = game(app_state, game_id)?;
    let claim = game.confirm_claim(claim_id)?;

    if let Err(e) = game.dump_to_json(&app_state.config.data_dir) {
        log_warning(&format!("Game {game_id} finished but could not be dumped: {e}"));
    }

    Ok(json!({ "claim": claim, "game": game.record()? }))
}

pub async fn handle_reject(app_state: &AppState, game_id: &str, claim_id: &str) -> ApiResult {
    to_json(&game(app_state, game_id)?.reject_claim(claim_id)?)
}

pub async fn handle_dumpgame(app_state: &AppState, game_id: &str) -> ApiResult {
    let path = game(app_state, game_id)?.dump_to_json(&app_state.config.data_dir)?;
    Ok(json!({ "path": path.display().to_string() }))
}
