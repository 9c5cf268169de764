//! # PAION Common Library
//!
//! Shared code for PAION tools:
//! - AIFM bundle manifest access
//! - Integrity verification (SHA-256 hashed_files table)
//! - Asset member selection and MIME guessing
//! - Event types (PlayerEvent enum)

pub mod assets;
pub mod error;
pub mod events;
pub mod manifest;
pub mod verify;

pub use error::{Error, Result};
