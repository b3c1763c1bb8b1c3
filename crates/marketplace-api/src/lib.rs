//! Marketplace REST API
//!
//! Axum router for the buyer and seller endpoints. Every response, including
//! failures and unknown routes, uses the same JSON envelope.

pub mod error;
pub mod extract;
pub mod response;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use response::{ApiResponse, Envelope};
pub use routes::create_router;
pub use state::{AppState, MetricsHandle};
