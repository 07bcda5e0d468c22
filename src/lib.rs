//! PantryPal challenge service
//!
//! Users submit cooking-challenge requests built around ingredients they
//! have on hand. An admin approves or denies each request; approval
//! publishes it as a challenge that other users can claim and complete.
//!
//! - `lifecycle`: input validation and the request/challenge workflow
//! - `api`: axum routes over the workflow
//! - `server`: HTTP serving with tracing, CORS and body limits
//! - `config`: TOML file plus command-line overrides
//!
//! Persistence lives in the `pantrypal-storage` crate.

pub mod api;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod server;

pub use api::{router, ApiState};
pub use config::{AppConfig, Overrides, ServerConfig, StoreConfig};
pub use error::ServiceError;
pub use lifecycle::ChallengeService;
pub use server::{build_app, run_server};

pub use pantrypal_storage as storage;
