use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::{Value as JsonValue, json};

use vapers_infra::{WebhookReply, webhook};

use crate::app::services::AppServices;

/// `GET /api/chat-ventas`: tell browsers poking the endpoint to use POST.
pub async fn chat_ventas_get() -> axum::response::Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "ok": false, "error": "Usa POST en /api/chat-ventas" })),
    )
        .into_response()
}

/// `POST /api/chat-ventas`: forward `{prompt, days, ...}` to the sales chat webhook.
pub async fn chat_ventas(
    Extension(services): Extension<Arc<AppServices>>,
    body: Bytes,
) -> axum::response::Response {
    let payload = payload_or_empty(&body);
    tracing::debug!(payload = %payload, "chat-ventas payload");

    let path = &services.webhook_paths.chat_ventas;
    let reply = webhook::forward(services.webhook.as_ref(), "chat-ventas", path, &payload).await;
    reply_to_response(reply)
}

/// `POST /api/resumen-7dias-email`: trigger the 7-day summary email webhook.
pub async fn summary_email(
    Extension(services): Extension<Arc<AppServices>>,
    body: Bytes,
) -> axum::response::Response {
    let payload = payload_or_empty(&body);

    let path = &services.webhook_paths.summary_email;
    let reply =
        webhook::forward(services.webhook.as_ref(), "resumen-7dias-email", path, &payload).await;
    reply_to_response(reply)
}

// A missing or unparsable body is forwarded as `{}`.
fn payload_or_empty(body: &[u8]) -> JsonValue {
    serde_json::from_slice(body).unwrap_or_else(|_| json!({}))
}

fn reply_to_response(reply: WebhookReply) -> axum::response::Response {
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(reply.body)).into_response()
}
