//! Visage Server - HTTP gateway for face-biometric registration and login.
//!
//! JSON in, JSON out on every endpoint; see `visage_api` for the wire types.
//! The decision pipeline itself lives in `visage_core`, this crate only
//! orchestrates it and maps failures to the response contract.

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod sessions;
pub mod state;

pub use config::{ServerConfig, SESSION_COOKIE};
pub use error::{ServerError, ServerResult};
pub use routes::build_router;
pub use sessions::CurrentAccount;
pub use state::AppState;
