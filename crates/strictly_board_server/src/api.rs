//! HTTP interface: JSON routes and a Server-Sent Events feed per session.

use crate::GameEngine;
use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use strictly_board::{Action, GameError, PlayerId, SessionId};
use tower::ServiceBuilder;
use tracing::{debug, info, instrument, warn};

/// Body of `POST /sessions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    /// Creator's player id.
    pub creator_id: PlayerId,
    /// Creator's display name.
    pub creator_name: String,
}

/// Reply to `POST /sessions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    /// Id of the new session.
    pub session_id: SessionId,
}

/// Body of `POST /sessions/{id}/players`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRequest {
    /// Joining player's id.
    pub player_id: PlayerId,
    /// Display name.
    pub name: String,
}

/// Body of `POST /sessions/{id}/actions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Acting player.
    pub player_id: PlayerId,
    /// The action, e.g. `{"kind": "ROLL_DICE"}`.
    pub action: Action,
}

/// Body of `POST /sessions/{id}/end`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndRequest {
    /// Declared winner, if any.
    #[serde(default)]
    pub winner: Option<PlayerId>,
}

/// JSON error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

/// A [`GameError`] rendered as an HTTP response.
#[derive(Debug, derive_more::From)]
pub struct ApiError(GameError);

impl ApiError {
    /// Status code for the wrapped error.
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            GameError::SessionNotFound { .. } => StatusCode::NOT_FOUND,
            GameError::SessionExists { .. }
            | GameError::SessionAlreadyStarted { .. }
            | GameError::SessionFull { .. }
            | GameError::DuplicatePlayer { .. }
            | GameError::SessionNotActive { .. }
            | GameError::NotEnoughPlayers { .. } => StatusCode::CONFLICT,
            GameError::NotYourTurn { .. } => StatusCode::FORBIDDEN,
            GameError::UnknownActionKind { .. } => StatusCode::BAD_REQUEST,
            GameError::UnknownPlayer { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            GameError::InvariantViolation { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(error = %self.0, "Request failed");
        } else {
            debug!(error = %self.0, %status, "Request rejected");
        }
        let body = ErrorBody {
            error: self.0.code().to_string(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Builds the router over `engine`.
pub fn router(engine: GameEngine) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/sessions", post(create_session).get(list_sessions))
        .route("/sessions/{id}", get(get_session))
        .route("/sessions/{id}/players", post(join_session))
        .route("/sessions/{id}/start", post(start_session))
        .route("/sessions/{id}/actions", post(submit_action))
        .route("/sessions/{id}/end", post(end_session))
        .route("/sessions/{id}/events", get(session_events))
        .route("/players/{player_id}/sessions", get(player_sessions))
        .layer(ServiceBuilder::new().map_request(|req: Request<Body>| {
            info!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
            req
        }))
        .with_state(engine)
}

async fn health() -> &'static str {
    "ok"
}

#[instrument(skip(engine, req), fields(creator_id = %req.creator_id))]
async fn create_session(
    State(engine): State<GameEngine>,
    Json(req): Json<CreateSessionRequest>,
) -> ApiResult<impl IntoResponse> {
    let session_id = engine.create_session(&req.creator_id, &req.creator_name)?;
    Ok((StatusCode::CREATED, Json(CreateSessionResponse { session_id })))
}

async fn list_sessions(State(engine): State<GameEngine>) -> impl IntoResponse {
    Json(engine.list_sessions())
}

#[instrument(skip(engine))]
async fn get_session(
    State(engine): State<GameEngine>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(engine.get_session(&id)?))
}

#[instrument(skip(engine, req), fields(player_id = %req.player_id))]
async fn join_session(
    State(engine): State<GameEngine>,
    Path(id): Path<String>,
    Json(req): Json<JoinRequest>,
) -> ApiResult<impl IntoResponse> {
    let player = engine.join_session(&id, &req.player_id, &req.name)?;
    Ok((StatusCode::CREATED, Json(player)))
}

#[instrument(skip(engine))]
async fn start_session(
    State(engine): State<GameEngine>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    engine.start_session(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(engine, req), fields(player_id = %req.player_id, kind = %req.action.kind))]
async fn submit_action(
    State(engine): State<GameEngine>,
    Path(id): Path<String>,
    Json(req): Json<ActionRequest>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(engine.submit_action(&id, &req.player_id, &req.action)?))
}

#[instrument(skip(engine, req))]
async fn end_session(
    State(engine): State<GameEngine>,
    Path(id): Path<String>,
    Json(req): Json<EndRequest>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(engine.end_session(&id, req.winner.as_deref())?))
}

#[instrument(skip(engine))]
async fn player_sessions(
    State(engine): State<GameEngine>,
    Path(player_id): Path<String>,
) -> impl IntoResponse {
    Json(engine.sessions_for_player(&player_id))
}

/// Streams every committed document of a session as a `session` event.
#[instrument(skip(engine))]
async fn session_events(
    State(engine): State<GameEngine>,
    Path(id): Path<String>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    engine.get_session(&id)?;
    let subscription = engine.subscribe(&id);
    info!("Event stream opened");

    let events = stream::unfold(subscription, |mut subscription| async move {
        let update = subscription.recv().await?;
        let event = match update {
            Some(doc) => Event::default()
                .event("session")
                .id(doc.version().to_string())
                .json_data(&*doc)
                .unwrap_or_else(|e| {
                    warn!(error = %e, "Failed to encode session event");
                    Event::default().event("error").data(e.to_string())
                }),
            None => Event::default().event("missing").data("null"),
        };
        Some((Ok(event), subscription))
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
