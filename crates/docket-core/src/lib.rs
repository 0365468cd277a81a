//! Core types and trait definitions for the Docket proposal portal.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! only async machinery it pulls in is `tokio::sync`, which backs the row
//! change feed. All other crates depend on it; it depends on nothing
//! proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod identity;
pub mod moderation;
pub mod notice;
pub mod profile;
pub mod roll;
pub mod service;
pub mod student;
pub mod submission;

pub use error::{Error, Result};
