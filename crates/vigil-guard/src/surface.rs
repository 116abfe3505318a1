use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};
use uuid::Uuid;
use vigil_core::ExplainReport;

/// The out-of-band surface that renders an explanation and collects a
/// human decision. Publishing is fire-and-forget; decisions flow back as
/// events into the coordinator, never through this trait.
#[async_trait]
pub trait DecisionSurface: Send + Sync {
    async fn present(&self, id: Uuid, report: &ExplainReport);
}

/// Surface for setups where the client polls `/pending/{id}` instead of
/// receiving a push.
pub struct NullSurface;

#[async_trait]
impl DecisionSurface for NullSurface {
    async fn present(&self, _id: Uuid, _report: &ExplainReport) {}
}

/// Pushes the explanation to one or more webhook receivers.
pub struct WebhookSurface {
    client: reqwest::Client,
    urls: Vec<String>,
}

impl WebhookSurface {
    pub fn new(urls: Vec<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            urls,
        }
    }
}

#[async_trait]
impl DecisionSurface for WebhookSurface {
    async fn present(&self, id: Uuid, report: &ExplainReport) {
        let payload = serde_json::json!({ "id": id, "report": report });
        for url in &self.urls {
            let sent = self
                .client
                .post(url)
                .json(&payload)
                .timeout(Duration::from_secs(10))
                .send()
                .await;
            match sent {
                Ok(resp) if resp.status().is_success() => {
                    info!(%id, url = %url, "explanation published")
                }
                Ok(resp) => warn!(%id, url = %url, status = %resp.status(), "surface rejected explanation"),
                Err(e) => warn!(%id, url = %url, error = %e, "surface publish failed"),
            }
        }
    }
}
