use crate::domain::fee::FeeNotification;
use crate::domain::ports::{Notifier, NotifierRef};
use std::time::Duration;
use tracing::warn;

const DELIVERY_ATTEMPTS: u32 = 3;
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Fire-and-forget delivery to the downstream messaging collaborator.
///
/// Delivery runs on its own retry budget, smaller than the fee job's, and
/// failures are logged and swallowed: they never surface into the fee
/// pipeline's result.
pub struct NotificationHook {
    notifier: NotifierRef,
}

impl NotificationHook {
    pub fn new(notifier: NotifierRef) -> Self {
        Self { notifier }
    }

    pub async fn send(&self, notification: FeeNotification) {
        for attempt in 1..=DELIVERY_ATTEMPTS {
            match tokio::time::timeout(DELIVERY_TIMEOUT, self.notifier.deliver(&notification)).await
            {
                Ok(Ok(())) => return,
                Ok(Err(e)) => {
                    warn!(attempt, source = %notification.source, error = %e, "notification delivery failed");
                }
                Err(_) => {
                    warn!(attempt, source = %notification.source, "notification delivery timed out");
                }
            }
        }
        warn!(
            source = %notification.source,
            "notification dropped after {DELIVERY_ATTEMPTS} attempts"
        );
    }
}
