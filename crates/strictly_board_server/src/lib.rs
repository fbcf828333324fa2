//! Strictly Board Server - concurrent session engine over `strictly_board`.
//!
//! # Architecture
//!
//! - **Store**: one mutex per session; mutations run on a draft and commit
//!   atomically with a version bump
//! - **Bus**: bounded per-subscriber queues, released in version order
//! - **Engine**: the public operations, composed from store and game rules
//! - **API**: axum routes and a Server-Sent Events feed
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use strictly_board::{Action, ScriptedDice};
//! use strictly_board_server::{EngineConfig, GameEngine};
//!
//! let engine = GameEngine::new(
//!     EngineConfig::default(),
//!     Arc::new(ScriptedDice::new([(3, 4)]).unwrap()),
//! );
//! let id = engine.create_session("alice", "Alice").unwrap();
//! engine.join_session(&id, "bob", "Bob").unwrap();
//! engine.start_session(&id).unwrap();
//! engine.submit_action(&id, "alice", &Action::roll_dice()).unwrap();
//!
//! let session = engine.get_session(&id).unwrap();
//! assert_eq!(*session.players()[0].position(), 7);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod api;
mod bus;
mod config;
mod engine;
mod store;

pub use api::{
    ActionRequest, ApiError, CreateSessionRequest, CreateSessionResponse, EndRequest, ErrorBody,
    JoinRequest, router,
};
pub use bus::{SessionUpdate, Subscription, SubscriptionBus};
pub use config::{ConfigError, HOST_VAR, PORT_VAR, ServerConfig};
pub use engine::{EngineConfig, GameEngine};
pub use store::{Mutation, SessionStore};
