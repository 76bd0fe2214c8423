// src/server.rs
// HTTP/1 server for the bingo API, built directly on hyper and tokio.

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use crate::api_handlers::{route, AppState};
use crate::config::ServerConfig;
use crate::game::Game;
use crate::logging::{log_error, log_error_stderr, log_info};

// How often the accept loop checks the shutdown flag.
const ACCEPT_POLL: Duration = Duration::from_millis(100);

/// Spawn the API server with one initial game registered.
pub fn start_server(config: ServerConfig) -> (tokio::task::JoinHandle<()>, Arc<AtomicBool>) {
    let shutdown_signal = Arc::new(AtomicBool::new(false));
    let shutdown_clone = Arc::clone(&shutdown_signal);

    let app_state = Arc::new(AppState::new(config.clone()));
    let game = Arc::new(Game::new(&config));
    match app_state.registry.add_game(Arc::clone(&game)) {
        Ok(()) => log_info(&format!("Registered initial game: {}", game.game_info())),
        Err(e) => log_error(&format!("Failed to register initial game: {e}")),
    }

    let handle = tokio::spawn(async move {
        let ip = match config.host.parse::<IpAddr>() {
            Ok(ip) => ip,
            Err(e) => {
                log_error_stderr(&format!("Invalid bind host '{}': {e}", config.host));
                return;
            }
        };
        let addr = SocketAddr::from((ip, config.port));
        let listener = match TcpListener::bind(&addr).await {
            Ok(listener) => listener,
            Err(e) => {
                log_error_stderr(&format!("Failed to start API server on {addr}: {e}"));
                return;
            }
        };

        log_info(&format!("Server listening on {addr}"));
        serve(listener, app_state, shutdown_clone).await;
    });

    (handle, shutdown_signal)
}

/// Accept connections until `shutdown` is raised.
pub async fn serve(listener: TcpListener, app_state: Arc<AppState>, shutdown: Arc<AtomicBool>) {
    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        match tokio::time::timeout(ACCEPT_POLL, listener.accept()).await {
            Ok(Ok((stream, _))) => {
                let app_state = Arc::clone(&app_state);
                let io = TokioIo::new(stream);

                tokio::spawn(async move {
                    let service = service_fn(move |req| handle_request(req, Arc::clone(&app_state)));
                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        log_error_stderr(&format!("Error serving connection: {err:?}"));
                    }
                });
            }
            Ok(Err(e)) => {
                log_error_stderr(&format!("Error accepting connection: {e}"));
                break;
            }
            Err(_) => {}
        }
    }
    log_info("API server shutting down");
}

async fn handle_request(
    req: Request<Incoming>,
    app_state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();

    let (status, payload) = match body.collect().await {
        Ok(collected) => {
            let bytes = collected.to_bytes();
            route(&app_state, &parts.method, parts.uri.path(), &bytes).await
        }
        Err(_) => (
            StatusCode::BAD_REQUEST,
            serde_json::json!({ "error": "Failed to read request body" }),
        ),
    };

    Ok(json_response(status, &payload))
}

fn json_response(status: StatusCode, payload: &serde_json::Value) -> Response<Full<Bytes>> {
    let body = serde_json::to_string(payload).unwrap_or_else(|_| "{}".to_string());
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(body.clone())))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from(body))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn request(addr: SocketAddr, raw: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(raw.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_serve_round_trip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app_state = Arc::new(AppState::new(ServerConfig::default()));
        let shutdown = Arc::new(AtomicBool::new(false));
        let handle = tokio::spawn(serve(listener, Arc::clone(&app_state), Arc::clone(&shutdown)));

        let response = request(
            addr,
            "POST /newgame HTTP/1.1\r\nHost: localhost\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.contains("\"status\":\"WAITING\""));
        assert_eq!(app_state.registry.len(), 1);

        let response = request(
            addr,
            "GET /nowhere HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 404 Not Found"));
        assert!(response.to_ascii_lowercase().contains("access-control-allow-origin: *"));

        shutdown.store(true, Ordering::Relaxed);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_start_server_refuses_invalid_host() {
        let config = ServerConfig { host: "not-a-host".to_string(), port: 0, ..ServerConfig::default() };
        let (handle, _shutdown) = start_server(config);
        let finished = tokio::time::timeout(Duration::from_secs(5), handle).await;
        assert!(matches!(finished, Ok(Ok(()))));
    }

    #[test]
    fn test_json_response_headers() {
        let response = json_response(StatusCode::CONFLICT, &serde_json::json!({ "error": "x" }));
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(response.headers()["content-type"], "application/json");
    }
}
