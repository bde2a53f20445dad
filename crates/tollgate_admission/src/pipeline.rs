//! The admission pipeline state machine.

use crate::RecorderHandle;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tollgate_core::{AdmissionState, Decision, PricingTable, ReasonCode, TenantId, TokenUsage};
use tollgate_error::{StoreError, StoreErrorKind, TollgateResult};
use tollgate_interface::{TenantRecord, TenantStore};
use tollgate_ledger::{QuotaGate, SubscriptionGate, usage_delta};
use tollgate_rate_limit::LimiterRegistry;
use tracing::{debug, error, instrument};

/// Deadlines for store round trips on the request path.
///
/// Single-digit seconds: a hung store must surface as a failure, not an
/// indefinite stall, and quota and subscription checks fail closed on
/// it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_getters::Getters, derive_new::new)]
pub struct StoreTimeouts {
    /// Deadline for reads in seconds
    read_secs: u64,
    /// Deadline for writes in seconds
    write_secs: u64,
}

impl Default for StoreTimeouts {
    fn default() -> Self {
        Self {
            read_secs: 5,
            write_secs: 5,
        }
    }
}

/// One inbound message's identity for admission.
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters, derive_new::new)]
pub struct AdmissionRequest {
    /// Tenant the message belongs to
    tenant_id: TenantId,
    /// Client identity for rate limiting (typically the caller's IP)
    client_key: String,
    /// Traffic class naming the rate policy
    traffic_class: String,
}

/// Gates every inbound message before the AI call.
///
/// Stages run unconditionally in the fixed order rate limit,
/// subscription, quota; the first failure is terminal, so a denial
/// reports exactly one reason. The pipeline never calls the AI
/// provider: on an allowed decision the caller dispatches the call and
/// reports completion through [`report_success`](Self::report_success).
///
/// Failure asymmetry: the rate limiter is in-process state and stays
/// available when storage is down (fail open), while a store failure
/// during the subscription or quota stage is returned as an error and
/// the message must not proceed (fail closed), so an outage never
/// bypasses billing limits.
pub struct AdmissionPipeline {
    limiters: Arc<LimiterRegistry>,
    store: Arc<dyn TenantStore>,
    quota: QuotaGate,
    subscription: SubscriptionGate,
    pricing: PricingTable,
    recorder: RecorderHandle,
    timeouts: StoreTimeouts,
}

impl AdmissionPipeline {
    /// Assemble a pipeline from its injected collaborators.
    pub fn new(
        limiters: Arc<LimiterRegistry>,
        store: Arc<dyn TenantStore>,
        quota: QuotaGate,
        pricing: PricingTable,
        recorder: RecorderHandle,
        timeouts: StoreTimeouts,
    ) -> Self {
        Self {
            limiters,
            store,
            quota,
            subscription: SubscriptionGate,
            pricing,
            recorder,
            timeouts,
        }
    }

    /// Decide whether one inbound message may proceed to the AI call.
    ///
    /// # Errors
    ///
    /// Returns a store error when the quota or subscription stage
    /// cannot consult its backing store within the deadline; the caller
    /// must treat that as a denial with a generic message (fail
    /// closed).
    #[instrument(
        skip(self, request),
        fields(tenant = %request.tenant_id(), class = %request.traffic_class())
    )]
    pub async fn admit(&self, request: &AdmissionRequest) -> TollgateResult<Decision> {
        let now = Utc::now();
        debug!(state = %AdmissionState::Received, "Evaluating admission");

        // Stage 1: rate limit. Purely in-process, never fails.
        let limiter = self.limiters.limiter(request.traffic_class());
        if !limiter.allow_at(request.client_key(), now) {
            debug!(state = %AdmissionState::Denied, reason = %ReasonCode::RateLimited, "Denied");
            return Ok(Decision::deny(
                ReasonCode::RateLimited,
                "Rate limit exceeded. Please slow down.",
            )
            .with_retry_after_seconds(limiter.retry_after_secs(now))
            .with_resets_at(limiter.policy().window_reset(now)));
        }
        debug!(state = %AdmissionState::RateChecked, "Rate limit passed");

        // Stages 2 and 3 read the same record snapshot.
        let record = self.load_record(request.tenant_id()).await?;

        let decision = self.subscription.check(&record, now);
        if !decision.allowed() {
            debug!(state = %AdmissionState::Denied, reason = %decision.reason(), "Denied");
            return Ok(decision);
        }
        debug!(state = %AdmissionState::SubscriptionChecked, "Subscription passed");

        let (decision, repair) = self.quota.evaluate(&record, now).into_parts();
        if let Some(repair) = repair {
            self.persist_repair(request.tenant_id(), repair).await?;
        }
        debug!(state = %AdmissionState::QuotaChecked, "Quota checked");

        if *decision.allowed() {
            debug!(state = %AdmissionState::Admitted, "Admitted");
        } else {
            debug!(state = %AdmissionState::Denied, reason = %decision.reason(), "Denied");
        }
        Ok(decision)
    }

    /// Report a completed generation so its usage is recorded.
    ///
    /// Fire and forget: the increment is queued for the recorder task
    /// and this call returns immediately. Only successful generations
    /// are reported; denials and provider failures cost nothing.
    pub fn report_success(&self, tenant: &TenantId, model: &str, tokens: TokenUsage) {
        let delta = usage_delta(&self.pricing, model, tokens);
        self.recorder.submit(tenant.clone(), delta, Utc::now());
    }

    /// Remaining requests in the client's current window, for response
    /// headers.
    pub fn remaining(&self, traffic_class: &str, client_key: &str) -> u32 {
        self.limiters.limiter(traffic_class).remaining(client_key)
    }

    async fn load_record(&self, tenant: &TenantId) -> TollgateResult<TenantRecord> {
        let deadline = Duration::from_secs(*self.timeouts.read_secs());
        match timeout(deadline, self.store.load(tenant)).await {
            Ok(Ok(record)) => Ok(record),
            Ok(Err(e)) => {
                error!(tenant = %tenant, operation = "load", error = %e, "Tenant store read failed");
                Err(e.into())
            }
            Err(_) => {
                error!(tenant = %tenant, operation = "load", "Tenant store read timed out");
                Err(StoreError::new(StoreErrorKind::Timeout {
                    operation: "load".to_string(),
                    after_secs: *self.timeouts.read_secs(),
                })
                .into())
            }
        }
    }

    async fn persist_repair(
        &self,
        tenant: &TenantId,
        repair: tollgate_ledger::LimitRepair,
    ) -> TollgateResult<()> {
        let deadline = Duration::from_secs(*self.timeouts.write_secs());
        let write = self.store.set_limits(
            tenant,
            *repair.daily_limit(),
            *repair.monthly_limit(),
            None,
        );
        match timeout(deadline, write).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                error!(tenant = %tenant, operation = "set_limits", error = %e, "Limit repair failed");
                Err(e.into())
            }
            Err(_) => {
                error!(tenant = %tenant, operation = "set_limits", "Limit repair timed out");
                Err(StoreError::new(StoreErrorKind::Timeout {
                    operation: "set_limits".to_string(),
                    after_secs: *self.timeouts.write_secs(),
                })
                .into())
            }
        }
    }
}

impl std::fmt::Debug for AdmissionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionPipeline")
            .field("timeouts", &self.timeouts)
            .finish_non_exhaustive()
    }
}
