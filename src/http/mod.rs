//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, identity + access decision, forwarding)
//!     → response.rs (challenge / denied / unavailable terminals)
//! ```

pub mod response;
pub mod server;

pub use server::{AppState, HttpServer, StartupError};
