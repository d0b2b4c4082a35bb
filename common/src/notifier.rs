// Outbound change notifications
// The cooldown timestamp is recorded before the transport call is spawned,
// so throttling never depends on transport latency or outcome.

use crate::config::NotificationServiceConfig;
use crate::errors::NotifyError;
use crate::models::{ChangeEvent, NotificationConfig};
use crate::telemetry;
use crate::throttle::{Clock, ThrottleState};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// WebhookTransport delivers one alert for a changed endpoint
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    async fn send(&self, config: &NotificationConfig, identifier: &str) -> Result<(), NotifyError>;
}

/// Posts to `{base}/trigger/{eventName}/with/key/{key}` with a single
/// form field named by `bodyKey`
pub struct MakerWebhookTransport {
    client: Client,
    base_url: String,
}

impl MakerWebhookTransport {
    pub fn new(config: &NotificationServiceConfig) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| NotifyError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.service_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn trigger_url(&self, config: &NotificationConfig) -> String {
        format!(
            "{}/trigger/{}/with/key/{}",
            self.base_url, config.event_name, config.service_key
        )
    }
}

#[async_trait]
impl WebhookTransport for MakerWebhookTransport {
    #[tracing::instrument(skip(self, config), fields(event = %config.event_name))]
    async fn send(&self, config: &NotificationConfig, identifier: &str) -> Result<(), NotifyError> {
        let params = [(config.payload_field.as_str(), identifier)];

        let response = self
            .client
            .post(self.trigger_url(config))
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

/// Notifier owns the throttle state and decides whether a change may be
/// announced right now
pub struct Notifier {
    config: Arc<NotificationConfig>,
    transport: Arc<dyn WebhookTransport>,
    clock: Arc<dyn Clock>,
    throttle: ThrottleState,
    in_flight: JoinSet<()>,
}

impl Notifier {
    pub fn new(
        config: NotificationConfig,
        transport: Arc<dyn WebhookTransport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            transport,
            clock,
            throttle: ThrottleState::new(),
            in_flight: JoinSet::new(),
        }
    }

    pub fn config(&self) -> &NotificationConfig {
        &self.config
    }

    pub fn throttle(&self) -> &ThrottleState {
        &self.throttle
    }

    /// Dispatch an alert for `change` unless its endpoint is cooling down.
    ///
    /// Returns true when a dispatch was attempted. The transport call runs
    /// in the background; its failure is logged and nothing else.
    pub fn maybe_notify(&mut self, change: &ChangeEvent) -> bool {
        self.reap_finished();

        let now = self.clock.now_epoch_seconds();
        let identifier = change.identifier.as_str();

        if !self
            .throttle
            .try_acquire(identifier, now, self.config.cooldown_seconds)
        {
            info!(
                endpoint = %identifier,
                cooldown_seconds = self.config.cooldown_seconds,
                "Notification for {} ignored due to cooldown",
                identifier
            );
            telemetry::record_notification_suppressed();
            return false;
        }

        info!(endpoint = %identifier, "Dispatching change notification");
        telemetry::record_notification_dispatched();

        let config = self.config.clone();
        let transport = self.transport.clone();
        let identifier = identifier.to_string();

        self.in_flight.spawn(async move {
            match transport.send(&config, &identifier).await {
                Ok(()) => debug!(endpoint = %identifier, "Notification delivered"),
                Err(e) => {
                    warn!(endpoint = %identifier, error = %e, "Notification delivery failed");
                    telemetry::record_notification_failed();
                }
            }
        });

        true
    }

    /// Wait for every in-flight dispatch to finish
    pub async fn flush(&mut self) {
        while let Some(joined) = self.in_flight.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Notification task failed to complete");
            }
        }
    }

    fn reap_finished(&mut self) {
        while let Some(joined) = self.in_flight.try_join_next() {
            if let Err(e) = joined {
                warn!(error = %e, "Notification task failed to complete");
            }
        }
    }
}
