//! Axum-based gateway for the unit conversion chat. Config-driven via CoreConfig.

mod handlers;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::State,
    http::Method,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use unitchat_core::{unit_catalog, CoreConfig, ResponseGate, SessionStore, SubmissionWorkflow};
use unitchat_skills::ModelRouter;

const FRONTEND_DIR: &str = "unitchat-frontend";

/// Pre-flight check: configuration loads, the API key is present when required,
/// and the port is free.
fn run_verify() -> Result<(), String> {
    print!("Checking configuration... ");
    let config = CoreConfig::load().map_err(|e| format!("Config load failed: {}", e))?;
    println!("OK (mode: {}, model: {})", config.llm_mode.as_str(), config.model);

    print!("Checking API key... ");
    if config.needs_api_key() {
        config.require_api_key().map_err(|e| e.to_string())?;
        println!("OK");
    } else {
        println!("not required in {} mode", config.llm_mode.as_str());
    }

    if config.frontend_enabled {
        let dir = frontend_root_dir();
        print!("Checking {}... ", FRONTEND_DIR);
        if dir.join("index.html").exists() {
            println!("OK");
        } else {
            println!("MISSING (UI will not be served from {})", dir.display());
        }
    }

    let port = config.port;
    print!("Checking port {}... ", port);
    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], port));
    match std::net::TcpListener::bind(addr) {
        Ok(listener) => {
            drop(listener);
            println!("OK (available)");
        }
        Err(e) => {
            return Err(format!("Port {} BLOCKED: {}", port, e));
        }
    }

    println!("\n✅ SUCCESS: Ready to start gateway.");
    Ok(())
}

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env::var calls)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[unitchat-gateway] .env not loaded: {} (using system environment)", e);
    }

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--verify") {
        match run_verify() {
            Ok(()) => std::process::exit(0),
            Err(e) => {
                eprintln!("❌ PRE-FLIGHT FAILED: {}", e);
                std::process::exit(1);
            }
        }
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match CoreConfig::load() {
        Ok(config) => Arc::new(config),
        Err(e) => fatal(&e),
    };
    let router = match ModelRouter::from_config(&config) {
        Ok(router) => router,
        Err(e) => fatal(&e),
    };

    let state = AppState::new(Arc::clone(&config), router);
    let app = build_app(state);

    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => fatal(&format!("cannot bind {}: {}", addr, e)),
    };
    tracing::info!("{} listening on {}", config.app_name, addr);
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Logs and prints a startup failure, then exits with status 1.
fn fatal(err: &dyn std::fmt::Display) -> ! {
    tracing::error!("Startup failed: {}", err);
    eprintln!("❌ {}", err);
    std::process::exit(1)
}

fn frontend_root_dir() -> PathBuf {
    // Prefer the working directory (run from workspace root); fall back to the workspace
    // root as seen from add-ons/unitchat-gateway.
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let from_cwd = cwd.join(FRONTEND_DIR);
    if from_cwd.exists() {
        return from_cwd;
    }

    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join(FRONTEND_DIR)
}

fn build_app(state: AppState) -> Router {
    let frontend_enabled = state.config.frontend_enabled;

    // CORS: allow Backend/API (8001-8099) and Frontend/UI (3001-3099) port ranges.
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(|origin: &axum::http::HeaderValue, _| {
            let s = origin.to_str().unwrap_or("");
            let port = s
                .rsplit(':')
                .next()
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(0);
            (3001..=3099).contains(&port) || (8001..=8099).contains(&port)
        }))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS, Method::DELETE])
        .allow_headers(tower_http::cors::Any);

    let mut app = Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/status", get(status))
        .route("/api/v1/units", get(units))
        .route("/api/v1/chat", post(handlers::chat::chat))
        .route(
            "/api/v1/session/:id",
            get(handlers::chat::get_session).delete(handlers::chat::end_session),
        )
        .route(
            "/api/v1/session/:id/history/toggle",
            post(handlers::chat::toggle_history),
        )
        .with_state(state);

    if frontend_enabled {
        let frontend_dir = frontend_root_dir();
        let index_file = frontend_dir.join("index.html");

        // Map `/` -> `unitchat-frontend/index.html`
        app = app.route_service("/", ServeFile::new(index_file));

        // Map `/ui/*` -> `unitchat-frontend/*`
        app = app.nest_service("/ui", ServeDir::new(frontend_dir));
    }

    app.layer(cors)
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) config: Arc<CoreConfig>,
    pub(crate) workflow: Arc<SubmissionWorkflow>,
    pub(crate) sessions: Arc<SessionStore>,
}

impl AppState {
    /// Wires the gate and workflow around `router` using the configured vocabulary and timeout.
    fn new(config: Arc<CoreConfig>, router: ModelRouter) -> Self {
        let gate = ResponseGate::new(Arc::new(router), config.keyword_set())
            .with_timeout(config.request_timeout());
        Self {
            workflow: Arc::new(SubmissionWorkflow::new(gate)),
            sessions: Arc::new(config.session_store()),
            config,
        }
    }
}

/// GET /api/v1/health – liveness check for UI and scripts.
async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

/// GET /api/v1/status – identity and model settings for the UI header.
async fn status(State(state): State<AppState>) -> axum::Json<serde_json::Value> {
    let gate = state.workflow.gate();
    axum::Json(serde_json::json!({
        "app_name": state.config.app_name,
        "port": state.config.port,
        "llm_mode": state.config.llm_mode,
        "model": gate.model_name(),
        "keyword_count": gate.keywords().len(),
        "request_timeout_secs": gate.timeout().as_secs(),
        "active_sessions": state.sessions.len(),
    }))
}

/// GET /api/v1/units – catalog for the "View Supported Units" panel.
async fn units() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "categories": unit_catalog() }))
}
