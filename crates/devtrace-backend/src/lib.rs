//! # devtrace-backend
//!
//! HTTP adapter for the DevTrace runtime backend.
//!
//! - **Client**: [`HttpBackend`] implements the runtime's collaborator
//!   traits over the backend's JSON API and `/live` SSE stream
//! - **Config**: Base URL and request timeout
//! - **Wire**: Request/response envelopes specific to the HTTP surface
//!
//! ## Crate Position
//!
//! Leaf adapter. Depends on: devtrace-core, devtrace-runtime.
//! Depended on by: embedding applications.

#![deny(unsafe_code)]

pub mod client;
pub mod config;
pub mod errors;
pub mod wire;

// Re-export main public API
pub use client::HttpBackend;
pub use config::BackendConfig;
pub use errors::BackendError;
