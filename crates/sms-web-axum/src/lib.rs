use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use sms_core::Headers;
use sms_web_generic::{HeaderConverter, ResponseConverter, WebhookProcessor};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<WebhookProcessor>,
}

/// Axum-specific header converter
pub struct AxumHeaderConverter;

impl HeaderConverter for AxumHeaderConverter {
    type HeaderType = HeaderMap;

    fn to_generic_headers(headers: &Self::HeaderType) -> Headers {
        headers
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    v.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect()
    }
}

/// Axum-specific response converter
pub struct AxumResponseConverter;

impl ResponseConverter for AxumResponseConverter {
    type ResponseType = axum::response::Response;

    fn from_webhook_response(response: sms_core::WebhookResponse) -> Self::ResponseType {
        let status = axum::http::StatusCode::from_u16(response.status.as_u16())
            .unwrap_or(axum::http::StatusCode::INTERNAL_SERVER_ERROR);

        let mut res = (status, response.body).into_response();
        if let Ok(content_type) = HeaderValue::from_str(&response.content_type) {
            res.headers_mut().insert(header::CONTENT_TYPE, content_type);
        }
        res
    }
}

/// Inbound SMS handler: POST /sms
pub async fn sms_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let generic_headers = AxumHeaderConverter::to_generic_headers(&headers);
    let response = state.processor.process_webhook(generic_headers, &body).await;
    AxumResponseConverter::from_webhook_response(response)
}

pub async fn health() -> &'static str {
    "ok"
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/sms", post(sms_webhook))
        .route("/health", get(health))
        .with_state(state)
}
