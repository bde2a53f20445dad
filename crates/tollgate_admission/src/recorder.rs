//! Asynchronous usage recording.

use crate::UsageNotifier;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tollgate_core::{TenantId, UsageDelta};
use tollgate_interface::TenantStore;
use tracing::{debug, error, info, instrument, warn};

/// Default capacity of the usage queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Message types for the usage recorder.
#[derive(Debug)]
pub enum UsageMessage {
    /// Apply one admitted call's usage
    Record {
        /// Tenant to charge
        tenant: TenantId,
        /// Counter increments
        delta: UsageDelta,
        /// When the generation completed
        at: DateTime<Utc>,
    },
    /// Drain the queue and stop
    Shutdown,
}

/// Submission side of the usage queue.
///
/// Submission never blocks the response path: a full queue drops the
/// sample and logs it, making backpressure visible instead of stalling
/// callers. The consequence is the accepted soft-limit property, where
/// quota checks can run ahead of un-recorded usage by the number of
/// in-flight requests.
#[derive(Debug, Clone)]
pub struct RecorderHandle {
    tx: mpsc::Sender<UsageMessage>,
}

impl RecorderHandle {
    /// Enqueue one admitted call's usage without awaiting completion.
    pub fn submit(&self, tenant: TenantId, delta: UsageDelta, at: DateTime<Utc>) {
        let message = UsageMessage::Record { tenant, delta, at };
        match self.tx.try_send(message) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(UsageMessage::Record { tenant, .. })) => {
                warn!(tenant = %tenant, "Usage queue full, dropping sample");
            }
            Err(mpsc::error::TrySendError::Closed(UsageMessage::Record { tenant, .. })) => {
                warn!(tenant = %tenant, "Usage recorder stopped, dropping sample");
            }
            Err(_) => {}
        }
    }

    /// Ask the recorder to drain outstanding messages and stop.
    pub async fn shutdown(&self) {
        if self.tx.send(UsageMessage::Shutdown).await.is_err() {
            debug!("Usage recorder already stopped");
        }
    }
}

/// Writer task applying usage increments off the response path.
///
/// One recorder consumes the bounded queue, applies each delta through
/// the store's atomic-increment contract, and hands the resulting token
/// percentage to the notifier. Store failures are logged with tenant
/// and operation and the worker keeps going; an increment is never
/// retried.
pub struct UsageRecorder {
    store: Arc<dyn TenantStore>,
    notifier: UsageNotifier,
    rx: mpsc::Receiver<UsageMessage>,
}

impl UsageRecorder {
    /// Create a recorder and its submission handle.
    pub fn channel(
        store: Arc<dyn TenantStore>,
        notifier: UsageNotifier,
        capacity: usize,
    ) -> (RecorderHandle, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            RecorderHandle { tx },
            Self {
                store,
                notifier,
                rx,
            },
        )
    }

    /// Run the recorder loop until shutdown.
    ///
    /// On shutdown the queue is closed and every message already
    /// buffered is applied before the task exits.
    #[instrument(skip(self))]
    pub async fn run(mut self) {
        info!("Usage recorder started");
        while let Some(message) = self.rx.recv().await {
            match message {
                UsageMessage::Record { tenant, delta, at } => {
                    self.apply(&tenant, delta, at).await;
                }
                UsageMessage::Shutdown => {
                    self.rx.close();
                    let mut drained = 0usize;
                    while let Some(message) = self.rx.recv().await {
                        if let UsageMessage::Record { tenant, delta, at } = message {
                            self.apply(&tenant, delta, at).await;
                            drained += 1;
                        }
                    }
                    info!(drained, "Usage recorder shutting down");
                    break;
                }
            }
        }
    }

    /// Spawn the recorder on the current runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn apply(&self, tenant: &TenantId, delta: UsageDelta, at: DateTime<Utc>) {
        if let Err(e) = self.store.apply_usage(tenant, delta, at).await {
            error!(tenant = %tenant, operation = "apply_usage", error = %e, "Failed to record usage");
            return;
        }
        debug!(
            tenant = %tenant,
            tokens = delta.tokens(),
            cost = delta.cost(),
            "Recorded usage"
        );

        // Threshold alerts need the post-increment percentage.
        let percent = match self.store.load(tenant).await {
            Ok(record) => record.token_percent(),
            Err(e) => {
                error!(tenant = %tenant, operation = "load", error = %e, "Failed to reload usage");
                return;
            }
        };
        if let Some(percent) = percent
            && let Err(e) = self.notifier.notify_usage(tenant, percent).await
        {
            error!(tenant = %tenant, operation = "notify_usage", error = %e, "Failed to send alert");
        }
    }
}
