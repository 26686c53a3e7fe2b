//! Rollcall API server library.
//!
//! Holds the HTTP surface (notification fetch, event ingestion, health), the
//! WebSocket push hub and the wiring that connects the event pipeline to
//! them, so integration tests and the binary share one router.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod pipeline;
pub mod router;
pub mod routes;
pub mod state;
pub mod ws;
