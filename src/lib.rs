//! REVENUE FLEET — periodic revenue bot orchestration.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod entropy;
pub mod activity;
pub mod credentials;
pub mod wallets;
pub mod registry;
pub mod engine;
pub mod compliance;
pub mod dashboard;
