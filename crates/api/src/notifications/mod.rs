//! Security alert dispatch.
//!
//! The login gate publishes [`SecurityAlert`]s on an [`AlertBus`]. Publishing
//! never blocks or fails the login that triggered it. [`run_alert_logger`]
//! subscribes to the bus and delivers each alert as a structured `warn`
//! event on the `security_alert` target.

use taskguard_core::alert::SecurityAlert;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Tracing target for security alerts, for routing in log pipelines.
pub const ALERT_TARGET: &str = "security_alert";

/// Alerts buffered per subscriber before the oldest are dropped.
const ALERT_BUFFER: usize = 256;

/// Fan-out channel for security alerts.
#[derive(Clone)]
pub struct AlertBus {
    sender: broadcast::Sender<SecurityAlert>,
}

impl AlertBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(ALERT_BUFFER);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SecurityAlert> {
        self.sender.subscribe()
    }

    /// Publish `alert` to every subscriber. An alert raised while nobody is
    /// subscribed is logged and dropped.
    pub fn publish(&self, alert: SecurityAlert) {
        if let Err(broadcast::error::SendError(alert)) = self.sender.send(alert) {
            tracing::debug!(email = %alert.email, "No alert subscribers, delivering inline");
            deliver(&alert);
        }
    }
}

impl Default for AlertBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Deliver alerts from `receiver` until the bus closes or `cancel` fires.
pub async fn run_alert_logger(
    mut receiver: broadcast::Receiver<SecurityAlert>,
    cancel: CancellationToken,
) {
    tracing::info!("Security alert logger started");
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Security alert logger stopping");
                break;
            }
            received = receiver.recv() => match received {
                Ok(alert) => deliver(&alert),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Security alert logger lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Alert bus closed, security alert logger stopping");
                    break;
                }
            },
        }
    }
}

fn deliver(alert: &SecurityAlert) {
    tracing::warn!(
        target: ALERT_TARGET,
        email = %alert.email,
        attempts = alert.attempts,
        ip = %alert.ip_address,
        user_agent = alert.user_agent.as_deref().unwrap_or("-"),
        raised_at = %alert.raised_at,
        "Security alert: repeated failed login attempts"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn alert(email: &str) -> SecurityAlert {
        SecurityAlert {
            email: email.to_string(),
            attempts: 10,
            ip_address: "10.0.0.1".to_string(),
            user_agent: None,
            raised_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn subscribers_receive_published_alerts() {
        let bus = AlertBus::new();
        let mut receiver = bus.subscribe();

        bus.publish(alert("jane@example.com"));

        let received = receiver.try_recv().expect("alert should be queued");
        assert_eq!(received.email, "jane@example.com");
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn publishing_without_subscribers_does_not_fail() {
        AlertBus::new().publish(alert("jane@example.com"));
    }

    #[tokio::test]
    async fn logger_stops_on_cancel() {
        let bus = AlertBus::new();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_alert_logger(bus.subscribe(), cancel.clone()));

        bus.publish(alert("jane@example.com"));
        cancel.cancel();

        tokio::time::timeout(std::time::Duration::from_secs(1), handle)
            .await
            .expect("logger should stop")
            .expect("logger should not panic");
    }
}
