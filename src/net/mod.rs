//! Network layer: optional TLS termination for the listener.
//!
//! The proxy consumes a plaintext byte stream per connection; when TLS
//! is enabled the handshake is handled by axum-server before requests
//! reach the dispatcher.

pub mod tls;
