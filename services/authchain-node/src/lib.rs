//! AuthChain node service.
//!
//! HTTP adapter over the authentication protocol, peer sync and consensus
//! of one node. The binary in `main.rs` loads configuration and serves
//! [`routes::build_router`]; tests serve the same router on an ephemeral
//! port.

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
