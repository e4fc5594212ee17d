//! querytally binary library.
//!
//! Exposes the binary's modules for integration testing.
//! In production, `querytally` is used as a binary (main.rs).

pub mod app;
pub mod cli;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod output;
pub mod reindex;
