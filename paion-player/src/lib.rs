//! # PAION Player Library (paion-player)
//!
//! Local-only web player and verifier for AIFM bundles.
//!
//! **Purpose:** Load `.aifm` bundles into an in-memory playlist, verify
//! their integrity, expose metadata and companion assets over a small HTTP
//! API, and stream the payload audio to a browser `<audio>` element.
//!
//! **Architecture:** axum HTTP service + embedded single-page UI; all
//! bundle inspection runs on blocking worker threads.

pub mod api;
pub mod config;
pub mod error;
pub mod payload;
pub mod scan;
pub mod state;

pub use error::{Error, Result};
pub use state::PlayerState;
