//! In-process HTTP client for exercising an [`MvcApp`](mvc_http::MvcApp)
//! without binding a port.

mod app;

pub use app::{TestApp, TestRequest, TestResponse};
