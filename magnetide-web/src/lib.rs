//! Magnetide Web - JSON API Server

#![warn(missing_docs)]
#![warn(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
#![warn(clippy::too_many_lines)]
//!
//! Thin presentation-facing layer over the search aggregator. Exposes one
//! JSON endpoint per provider plus torrent details; no HTML is served.

pub mod handlers;
pub mod server;

// Re-export main types
pub use server::{AppState, ServerError, router, run_server};
