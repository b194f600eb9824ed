//! Outbound automation webhooks (sales chat, summary email).
//!
//! The API forwards the caller's JSON payload to the configured webhook and
//! relays the answer. Upstream failures are turned into JSON replies rather
//! than errors so the caller always gets a body it can show.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value as JsonValue, json};
use thiserror::Error;

/// Number of characters of the upstream body written to the logs.
const BODY_PREVIEW_CHARS: usize = 800;

pub const NON_JSON_REPLY_ERROR: &str = "Respuesta no JSON desde n8n";

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("webhook base url is not configured")]
    NotConfigured,

    #[error("invalid webhook header: {0}")]
    InvalidHeader(String),

    #[error("webhook request failed: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for WebhookError {
    fn from(err: reqwest::Error) -> Self {
        WebhookError::Transport(err.to_string())
    }
}

/// Raw upstream answer: status code and body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: String,
}

/// What the API sends back to its own caller.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookReply {
    pub status: u16,
    pub body: JsonValue,
}

/// Transport seam for webhook calls.
#[async_trait]
pub trait WebhookClient: Send + Sync {
    async fn post_json(
        &self,
        path: &str,
        payload: &JsonValue,
    ) -> Result<UpstreamResponse, WebhookError>;
}

#[derive(Debug, Clone)]
pub struct WebhookSettings {
    pub base_url: String,
    /// Extra header sent with every call, e.g. `("X-N8N-Key", "secret")`.
    pub auth_header: Option<(String, String)>,
    pub timeout: Duration,
}

/// `reqwest`-backed webhook client.
#[derive(Debug, Clone)]
pub struct HttpWebhookClient {
    client: reqwest::Client,
    settings: WebhookSettings,
}

impl HttpWebhookClient {
    pub fn new(settings: WebhookSettings) -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder().timeout(settings.timeout).build()?;
        Ok(Self { client, settings })
    }

    fn url_for(&self, path: &str) -> Result<String, WebhookError> {
        let base = self.settings.base_url.trim_end_matches('/');
        if base.is_empty() {
            return Err(WebhookError::NotConfigured);
        }
        Ok(format!("{base}{path}"))
    }
}

#[async_trait]
impl WebhookClient for HttpWebhookClient {
    async fn post_json(
        &self,
        path: &str,
        payload: &JsonValue,
    ) -> Result<UpstreamResponse, WebhookError> {
        let url = self.url_for(path)?;
        tracing::info!(url = %url, "forwarding webhook request");

        let mut request = self.client.post(&url).json(payload);
        if let Some((name, value)) = &self.settings.auth_header {
            let name = reqwest::header::HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| WebhookError::InvalidHeader(e.to_string()))?;
            request = request.header(name, value.as_str());
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(UpstreamResponse { status, body })
    }
}

/// Turn an upstream answer into the reply relayed to the caller.
///
/// Success statuses collapse to 200; failures keep the upstream status. A
/// body that is not JSON is wrapped with the raw text.
pub fn relay(upstream: UpstreamResponse) -> WebhookReply {
    let status = match upstream.status {
        200..=299 => 200,
        0 => 500,
        other => other,
    };

    let body = serde_json::from_str::<JsonValue>(&upstream.body).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "webhook replied with non-JSON body");
        json!({
            "ok": false,
            "error": NON_JSON_REPLY_ERROR,
            "raw": upstream.body,
        })
    });

    WebhookReply { status, body }
}

/// Reply used when the webhook could not be reached at all.
pub fn transport_failure(label: &str, err: &WebhookError) -> WebhookReply {
    WebhookReply {
        status: 500,
        body: json!({
            "ok": false,
            "error": format!("Error interno proxy {label}"),
            "detail": err.to_string(),
        }),
    }
}

/// Forward `payload` to `path` and build the reply for the caller.
///
/// `label` names the proxy in logs and error bodies (e.g. `chat-ventas`).
pub async fn forward(
    client: &dyn WebhookClient,
    label: &str,
    path: &str,
    payload: &JsonValue,
) -> WebhookReply {
    match client.post_json(path, payload).await {
        Ok(upstream) => {
            let preview: String = upstream.body.chars().take(BODY_PREVIEW_CHARS).collect();
            tracing::info!(
                proxy = label,
                status = upstream.status,
                body = %preview,
                "webhook replied"
            );
            relay(upstream)
        }
        Err(err) => {
            tracing::error!(proxy = label, error = %err, "webhook proxy failed");
            transport_failure(label, &err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct ScriptedClient {
        reply: Mutex<Option<Result<UpstreamResponse, WebhookError>>>,
        seen: Mutex<Vec<(String, JsonValue)>>,
    }

    impl ScriptedClient {
        fn new(reply: Result<UpstreamResponse, WebhookError>) -> Self {
            Self {
                reply: Mutex::new(Some(reply)),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl WebhookClient for ScriptedClient {
        async fn post_json(
        &self,
        path: &str,
        payload: &JsonValue,
    ) -> Result<UpstreamResponse, WebhookError> {
            self.seen.lock().unwrap().push((path.to_string(), payload.clone()));
            self.reply
                .lock()
                .unwrap()
                .take()
                .unwrap_or(Err(WebhookError::Transport("no scripted reply".to_string())))
        }
    }

    fn upstream(status: u16, body: &str) -> UpstreamResponse {
        UpstreamResponse {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn relay_collapses_success_statuses_to_200() {
        let reply = relay(upstream(201, r#"{"answer":"ok"}"#));
        assert_eq!(reply.status, 200);
        assert_eq!(reply.body, json!({"answer": "ok"}));
    }

    #[test]
    fn relay_keeps_upstream_failure_status() {
        let reply = relay(upstream(404, r#"{"message":"workflow not active"}"#));
        assert_eq!(reply.status, 404);
        assert_eq!(reply.body["message"], "workflow not active");
    }

    #[test]
    fn relay_wraps_non_json_body() {
        let reply = relay(upstream(502, "<html>Bad gateway</html>"));
        assert_eq!(reply.status, 502);
        assert_eq!(reply.body["ok"], false);
        assert_eq!(reply.body["error"], NON_JSON_REPLY_ERROR);
        assert_eq!(reply.body["raw"], "<html>Bad gateway</html>");
    }

    #[test]
    fn transport_failure_is_500_with_detail() {
        let reply = transport_failure("chat-ventas", &WebhookError::NotConfigured);
        assert_eq!(reply.status, 500);
        assert_eq!(reply.body["error"], "Error interno proxy chat-ventas");
        assert_eq!(reply.body["detail"], "webhook base url is not configured");
    }

    #[test]
    fn url_requires_base() {
        let client = HttpWebhookClient::new(WebhookSettings {
            base_url: String::new(),
            auth_header: None,
            timeout: Duration::from_secs(1),
        })
        .unwrap();
        assert!(matches!(client.url_for("/webhook/x"), Err(WebhookError::NotConfigured)));

        let client = HttpWebhookClient::new(WebhookSettings {
            base_url: "http://n8n.local/".to_string(),
            auth_header: None,
            timeout: Duration::from_secs(1),
        })
        .unwrap();
        assert_eq!(client.url_for("/webhook/x").unwrap(), "http://n8n.local/webhook/x");
    }

    #[tokio::test]
    async fn forward_passes_payload_and_relays_reply() {
        let client = ScriptedClient::new(Ok(upstream(200, r#"{"ok":true,"text":"3 ventas"}"#)));
        let payload = json!({"prompt": "¿cuánto vendí?", "days": 7});

        let reply = forward(&client, "chat-ventas", "/webhook/chat-ventas", &payload).await;

        assert_eq!(reply.status, 200);
        assert_eq!(reply.body["text"], "3 ventas");
        let seen = client.seen.lock().unwrap();
        assert_eq!(seen.as_slice(), &[("/webhook/chat-ventas".to_string(), payload)]);
    }

    #[tokio::test]
    async fn forward_maps_transport_errors() {
        let refused = WebhookError::Transport("connection refused".to_string());
        let client = ScriptedClient::new(Err(refused));

        let reply = forward(&client, "resumen-7dias-email", "/webhook/x", &json!({})).await;

        assert_eq!(reply.status, 500);
        assert_eq!(reply.body["error"], "Error interno proxy resumen-7dias-email");
        assert_eq!(reply.body["detail"], "webhook request failed: connection refused");
    }
}
