use async_trait::async_trait;
use reqwest::{header, Client};
use std::time::Duration;

use crate::config::WebhookConfig;
use crate::orchestrator::ResultMap;
use crate::utils::error::{AppError, Result};

/// Destination for a finished batch's prices.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResultForwarder: Send + Sync {
    async fn forward(&self, results: &ResultMap) -> Result<()>;
}

/// POSTs the result map as a JSON object to a fixed URL.
pub struct HttpWebhook {
    client: Client,
    url: String,
}

impl HttpWebhook {
    pub fn new(config: &WebhookConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ResultForwarder for HttpWebhook {
    async fn forward(&self, results: &ResultMap) -> Result<()> {
        tracing::info!(url = %self.url, products = results.len(), "Forwarding prices to webhook");

        let response = self
            .client
            .post(&self.url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(results)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Webhook rejected prices");
            return Err(AppError::Forwarding {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(status = %status, "Webhook accepted prices");
        Ok(())
    }
}
