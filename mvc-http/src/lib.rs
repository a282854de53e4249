//! Axum host for `mvc-core` controllers.
//!
//! [`MvcApp`] activates controllers through the core registrar and mounts
//! every handler chain on an `axum::Router`. Requests are converted into a
//! [`Context`](mvc_core::Context), run through the chain, and the finished
//! context is turned back into a response.

pub mod app;
pub mod dispatch;
pub mod error;
pub mod layers;

pub use app::{join_path, MvcApp};
pub use error::error_response;
pub use layers::{catch_panic_layer, default_trace, init_tracing};

pub use axum;
pub use axum::Router;
pub use mvc_core;
