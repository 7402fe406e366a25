//! Storefront HTTP API.
//!
//! Routes:
//! - `GET /`: plain-text greeting, used as the load balancer health check
//! - `GET /health`: JSON liveness
//! - `POST /auth/signup`: self-service registration with the user pool

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod state;

pub use app::router;
pub use state::AppState;
