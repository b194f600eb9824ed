use std::sync::Arc;

use vapers_infra::{
    HttpWebhookClient, InMemoryFinanceLedger, InMemoryInventory, WebhookClient, WebhookError,
    WebhookSettings,
};

use crate::config::WebhookConfig;

/// Webhook paths the proxy routes forward to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookPaths {
    pub chat_ventas: String,
    pub summary_email: String,
}

/// Everything the handlers need, shared behind an `Arc`.
pub struct AppServices {
    pub inventory: InMemoryInventory,
    pub finance: InMemoryFinanceLedger,
    pub webhook: Arc<dyn WebhookClient>,
    pub webhook_paths: WebhookPaths,
}

impl AppServices {
    pub fn new(webhook: Arc<dyn WebhookClient>, webhook_paths: WebhookPaths) -> Self {
        Self {
            inventory: InMemoryInventory::in_memory(),
            finance: InMemoryFinanceLedger::in_memory(),
            webhook,
            webhook_paths,
        }
    }
}

pub fn build_services(config: &WebhookConfig) -> Result<AppServices, WebhookError> {
    let client = HttpWebhookClient::new(WebhookSettings {
        base_url: config.base_url.clone(),
        auth_header: config.auth_header.clone(),
        timeout: config.timeout,
    })?;

    if config.base_url.is_empty() {
        tracing::warn!("N8N_BASE_URL not set; chat and summary proxies will answer 500");
    }

    Ok(AppServices::new(
        Arc::new(client),
        WebhookPaths {
            chat_ventas: config.chat_ventas_path.clone(),
            summary_email: config.summary_email_path.clone(),
        },
    ))
}
