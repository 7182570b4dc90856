//! HTTP API module.
//!
//! Router, handlers, session auth and the SSE log stream.

pub mod logs;
pub mod middleware;
pub mod server;
pub mod session;
pub mod state;
pub mod types;

pub use logs::*;
pub use server::{build_router, start_server};
pub use state::AppState;
pub use types::*;
