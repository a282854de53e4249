//! Request dispatch: axum request in, handler chain, axum response out.

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::rejection::RawPathParamsRejection;
use axum::extract::{RawPathParams, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use http_body_util::LengthLimitError;
use mvc_core::{Context, Handler, ResponseParts};

use crate::error::error_response;

/// A registered handler chain: middleware first, the controller handler last.
#[derive(Clone)]
pub struct Chain {
    handlers: Arc<[Handler]>,
    body_limit: usize,
}

impl Chain {
    pub fn new(handlers: Vec<Handler>, body_limit: usize) -> Self {
        Self {
            handlers: handlers.into(),
            body_limit,
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run every handler in order, stopping as soon as one stops the context.
    pub fn run(&self, ctx: &mut Context) {
        for handler in self.handlers.iter() {
            if ctx.is_stopped() {
                break;
            }
            handler(ctx);
        }
    }

    /// Serve one request through the chain.
    pub async fn serve(
        self,
        params: Result<RawPathParams, RawPathParamsRejection>,
        request: Request,
    ) -> Response {
        let params: Vec<(String, String)> = match &params {
            Ok(params) => params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            Err(RawPathParamsRejection::MissingPathParams(_)) => Vec::new(),
            Err(rejection) => {
                return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
            }
        };

        let (parts, body) = request.into_parts();
        let body = match read_body(body, self.body_limit).await {
            Ok(body) => body,
            Err(response) => return response,
        };

        let mut ctx = Context::from_parts(parts.method, parts.uri, parts.headers, body)
            .with_params(params);
        self.run(&mut ctx);
        into_response(ctx.into_response_parts())
    }
}

async fn read_body(body: Body, limit: usize) -> Result<Bytes, Response> {
    axum::body::to_bytes(body, limit).await.map_err(|err| {
        let inner = err.into_inner();
        if inner.is::<LengthLimitError>() {
            error_response(
                StatusCode::PAYLOAD_TOO_LARGE,
                format!("request body exceeds {limit} bytes"),
            )
        } else {
            tracing::debug!(error = %inner, "failed to read request body");
            error_response(StatusCode::BAD_REQUEST, "failed to read request body")
        }
    })
}

/// Build the HTTP response for a finished request.
///
/// The written body wins. When nothing was written but the request produced
/// view data, the view data is rendered as a JSON object.
pub fn into_response(parts: ResponseParts) -> Response {
    let ResponseParts {
        status,
        headers,
        body,
        view_data,
    } = parts;

    let mut response = if body.is_empty() && !view_data.is_empty() {
        Json(serde_json::Value::Object(view_data)).into_response()
    } else {
        Response::new(Body::from(body))
    };
    *response.status_mut() = status;
    response.headers_mut().extend(headers);
    response
}
