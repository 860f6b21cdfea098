//! Entry points invoked from the platform event dispatcher callback.

use std::sync::Arc;

use async_trait::async_trait;

use attestra_core::{ActorId, AppResult};
use attestra_domain::{Attribution, ChangeEvent, WindowCheck};

use crate::attribution_service::AttributionService;
use crate::lifecycle_service::RequestRecordStore;
use crate::throttle_service::ThrottleService;


/// A change event paired with its attributed actor.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributedChange {
    /// The platform event as delivered.
    pub event: ChangeEvent,
    /// Best-effort attribution outcome.
    pub attribution: Attribution,
}

/// Sink port receiving attributed changes for downstream formatting and
/// delivery.
#[async_trait]
pub trait ChangeRecordSink: Send + Sync {
    /// Hands one attributed change to the downstream pipeline.
    async fn publish(&self, change: AttributedChange) -> AppResult<()>;
}

/// Application service behind the event dispatcher boundary.
#[derive(Clone)]
pub struct EventService {
    throttle: ThrottleService,
    attribution: AttributionService,
    records: Arc<dyn RequestRecordStore>,
    sink: Arc<dyn ChangeRecordSink>,
}

impl EventService {
    /// Creates the service from its collaborators.
    #[must_use]
    pub fn new(
        throttle: ThrottleService,
        attribution: AttributionService,
        records: Arc<dyn RequestRecordStore>,
        sink: Arc<dyn ChangeRecordSink>,
    ) -> Self {
        Self {
            throttle,
            attribution,
            records,
            sink,
        }
    }

    /// Handles one state-change notification: attributes it and hands the
    /// result downstream. An unknown actor is published as such, never
    /// treated as a failure.
    pub async fn on_change_event(&self, event: ChangeEvent) -> AppResult<()> {
        let attribution = self
            .attribution
            .attribute(
                &event.scope,
                event.kind,
                event.target_id.as_ref(),
                event.occurred_at,
            )
            .await;

        self.sink.publish(AttributedChange { event, attribution }).await
    }

    /// Gates one user-initiated request.
    ///
    /// The throttle check completes before any downstream work: a limited
    /// request is answered from the decision alone. Accepted requests are
    /// handed to the record store, where the retention lifecycle takes
    /// over.
    pub async fn on_user_request(
        &self,
        actor: &ActorId,
        operation: &str,
    ) -> AppResult<WindowCheck> {
        let decision = self.throttle.check_operation(actor, operation).await?;
        if decision.limited {
            return Ok(decision);
        }

        self.records.append(actor, operation).await?;
        Ok(decision)
    }
}
