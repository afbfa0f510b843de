//! Run summary reporting and notification delivery
//!
//! A run accumulates per-URL results into a [`RunReport`]; at the end the
//! rendered body is handed to a [`Notifier`]. Delivery is strictly
//! append-only from the engine's point of view: the ledger never reads the
//! report, and a delivery failure never rolls back committed ledger state.

use crate::config::WebhookConfig;
use crate::processor::Outcome;
use crate::{Error, Result};
use async_trait::async_trait;

/// Accumulated results of one processing run
#[derive(Debug, Default, Clone)]
pub struct RunReport {
    downloaded: Vec<String>,
    duplicates: Vec<String>,
    skipped: Vec<String>,
    errors: Vec<String>,
}

impl RunReport {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of processing one URL
    pub fn record(&mut self, url: &str, outcome: &Outcome) {
        match outcome {
            Outcome::Downloaded { content_id } => self.downloaded.push(content_id.clone()),
            Outcome::Duplicate { content_id } => self.duplicates.push(content_id.clone()),
            Outcome::AlreadyProcessed | Outcome::Pending => self.skipped.push(url.to_string()),
            Outcome::FetchFailed { reason } => {
                self.errors.push(format!("{}: {}", url, reason));
            }
        }
    }

    /// Number of successful downloads recorded
    pub fn downloaded_count(&self) -> usize {
        self.downloaded.len()
    }

    /// Number of per-URL errors recorded
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// True when nothing at all was recorded
    pub fn is_empty(&self) -> bool {
        self.downloaded.is_empty()
            && self.duplicates.is_empty()
            && self.skipped.is_empty()
            && self.errors.is_empty()
    }

    /// Render the operator-facing report body
    ///
    /// Returns `None` for an empty run so callers can skip notification
    /// entirely when there is nothing to report.
    pub fn render(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }

        let section = |title: &str, lines: &[String]| {
            format!("{} ::\n\n{}\n", title, lines.join("\n"))
        };

        Some(
            [
                section("Downloaded", &self.downloaded),
                section("Duplicates", &self.duplicates),
                section("Skipped", &self.skipped),
                section("Errors", &self.errors),
            ]
            .join("\n"),
        )
    }
}

/// Trait for delivering a run report to an external sink
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver the rendered report body
    async fn notify(&self, body: &str) -> Result<()>;
}

/// Delivers run reports as JSON POSTs to configured webhook endpoints
///
/// Every configured endpoint is attempted even when an earlier one fails;
/// any failed delivery surfaces as [`Error::Notification`] after the loop.
/// By the time a report is sent, all ledger state is committed and must
/// stay committed, so callers log delivery errors rather than propagate
/// them.
pub struct WebhookNotifier {
    client: reqwest::Client,
    webhooks: Vec<WebhookConfig>,
}

impl WebhookNotifier {
    /// Create a notifier for the configured webhook endpoints
    pub fn new(webhooks: Vec<WebhookConfig>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(Error::Network)?;

        Ok(Self { client, webhooks })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, body: &str) -> Result<()> {
        let mut failed = 0usize;

        for webhook in &self.webhooks {
            let payload = serde_json::json!({
                "sender": webhook.sender_name,
                "body": body,
                "timestamp": chrono::Utc::now().timestamp(),
            });

            match self.client.post(&webhook.url).json(&payload).send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!(url = %webhook.url, "Report delivered");
                }
                Ok(response) => {
                    tracing::warn!(
                        url = %webhook.url,
                        status = %response.status(),
                        "Report delivery rejected"
                    );
                    failed += 1;
                }
                Err(e) => {
                    tracing::warn!(url = %webhook.url, error = %e, "Report delivery failed");
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            return Err(Error::Notification(format!(
                "{} of {} webhook deliveries failed",
                failed,
                self.webhooks.len()
            )));
        }

        Ok(())
    }
}
