//! HTTP Server for the liftsim API.
//!
//! Runs a building on the fixed-rate simulator and exposes it over HTTP.
//! The web shell is served from the static directory when one is given.
//!
//! # API Endpoints
//!
//! | Method | Path              | Description                          |
//! |--------|-------------------|--------------------------------------|
//! | GET    | `/health`         | Health check                         |
//! | GET    | `/api/building`   | Snapshot of elevators and floors     |
//! | POST   | `/api/requests`   | Queue a passenger request            |
//! | GET    | `/api/events`     | SSE stream of simulation events      |
//! | GET    | `/api/logs`       | SSE stream for real-time logs        |

use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    response::{
        sse::{Event as SseEvent, KeepAlive},
        Json, Sse,
    },
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use log::{error, info};
use serde_json::{json, Value};
use std::{
    convert::Infallible,
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::{cors::CorsLayer, services::ServeDir};

use super::logs::LOG_BROADCASTER;
use super::types::{error_response, PassengerRequest, PassengerResponse};
use crate::config::SimulationConfig;
use crate::error::{RequestError, ServerError, ServerResult};
use crate::models::{Building, BuildingSnapshot};
use crate::monitor::EventBroadcaster;
use crate::simulation::FixedRateSimulator;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub building: Arc<Building>,
    pub simulator: Arc<FixedRateSimulator>,
    pub events: Arc<EventBroadcaster>,
}

/// Builds the application router.
pub fn router(state: AppState, static_dir: Option<&Path>) -> Router {
    // Permissive CORS for the dev server of the shell
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    let api = Router::new()
        .route("/health", get(health))
        .route("/api/building", get(building))
        .route("/api/requests", post(create_request))
        .route("/api/events", get(sse_events))
        .route("/api/logs", get(sse_logs));

    let app = match static_dir {
        Some(dir) => api.fallback_service(ServeDir::new(dir)),
        None => api.route("/", get(health)),
    };

    app.layer(cors).with_state(state)
}

/// Start the simulation and the HTTP server; returns after Ctrl-C.
pub async fn start_server(
    port: u16,
    config: SimulationConfig,
    static_dir: Option<PathBuf>,
) -> ServerResult<()> {
    let events = Arc::new(EventBroadcaster::default());
    let building = Arc::new(
        config
            .building_builder()
            .reactor(events.clone())
            .build()?,
    );
    let simulator = Arc::new(FixedRateSimulator::new(
        building.bus().clone(),
        config.tick_rate(),
    ));

    let runner = {
        let simulator = simulator.clone();
        tokio::task::spawn_blocking(move || simulator.start())
    };

    let state = AppState {
        building,
        simulator: simulator.clone(),
        events,
    };
    let app = router(state, static_dir.as_deref());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Liftsim server running on http://localhost:{}", port);
    info!("   GET  /api/building - Building snapshot");
    info!("   POST /api/requests - Queue a passenger");
    info!("   GET  /api/events   - SSE event stream");
    info!("   GET  /api/logs     - SSE log stream");
    if let Some(dir) = &static_dir {
        info!("   Serving shell from {}", dir.display());
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    simulator.shutdown();
    runner
        .await
        .map_err(|e| ServerError::Internal(format!("Simulation task failed: {}", e)))??;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
        return;
    }
    info!("Ctrl-C received, shutting down");
}

/// Health check endpoint
async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "liftsim",
        "version": env!("CARGO_PKG_VERSION"),
        "clock": state.building.snapshot().clock,
        "endpoints": {
            "building": "GET /api/building",
            "requests": "POST /api/requests",
            "events": "GET /api/events (SSE)",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// Building snapshot endpoint
async fn building(State(state): State<AppState>) -> Json<BuildingSnapshot> {
    Json(state.building.snapshot())
}

/// Passenger request endpoint
async fn create_request(
    State(state): State<AppState>,
    Json(body): Json<PassengerRequest>,
) -> Result<(StatusCode, Json<PassengerResponse>), (StatusCode, Json<Value>)> {
    match state.building.request(body.origin, body.destination) {
        Ok(passenger) => Ok((
            StatusCode::ACCEPTED,
            Json(PassengerResponse::queued(&passenger, body.origin)),
        )),
        Err(e @ (RequestError::FloorOutOfRange { .. } | RequestError::SameFloor(_))) => {
            Err((StatusCode::BAD_REQUEST, Json(error_response(&e.to_string()))))
        }
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(error_response(&e.to_string())),
        )),
    }
}

/// SSE endpoint for simulation events
async fn sse_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = state.events.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let event = result.ok()?;
        let json = serde_json::to_string(&event).ok()?;
        Some(Ok(SseEvent::default().event(event.kind()).data(json)))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(SseEvent::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
