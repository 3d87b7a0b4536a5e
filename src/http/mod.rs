//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID)
//!     → middleware/cors.rs (preflight answers, CORS headers)
//!     → proxy.rs (route, resolve, rewrite, forward)
//!     → response.rs (relay upstream response or render gateway error)
//!     → Send to client
//! ```

pub mod middleware;
pub mod proxy;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, GatewayState, HttpServer};
