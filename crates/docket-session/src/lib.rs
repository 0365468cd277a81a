//! Session persistence and sign-in flows for the Docket portal.
//!
//! The portal holds one logical identity, replicated across a durable
//! file slot and an in-process backup ([`slots`]). A
//! [`store::SessionStore`] owns the pair and publishes changes on a
//! watch channel the UI subscribes to. [`auth::AuthFlow`] drives the
//! student and admin sign-in paths against any
//! [`DataService`](docket_core::service::DataService), binding each
//! roll number to the first device it signs in from ([`device`]).
//!
//! Works the same against a local SQLite store or the HTTP client; the
//! flows only see the trait.

pub mod auth;
pub mod device;
pub mod error;
pub mod slots;
pub mod store;

pub use error::{Error, Result, Toast, ToastLevel};
