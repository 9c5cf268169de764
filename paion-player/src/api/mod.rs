//! HTTP API for the PAION player
//!
//! The embedded UI at `/` drives the JSON endpoints under `/api`.

pub mod handlers;
pub mod server;
pub mod sse;

pub use server::{create_router, AppContext};
