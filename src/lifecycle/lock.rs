//! Lock Transition Controller
//!
//! The client only ever drives the two edges into the locked state. A month
//! that is already locked is refused here and never sent to the service.

use std::sync::Arc;
use statig::prelude::*;
use tracing::{info, warn, Instrument};

use super::resolver::{self, MonthStateResolver};
use super::session::MonthSession;
use super::state_machine::{MonthEvent, MonthLifecycle, MonthPhase};
use super::types::{LifecycleError, ValidationError};
use crate::portal::{DocumentService, LockReceipt};
use crate::telemetry::{create_month_span, generate_correlation_id};

#[derive(Debug, Clone, PartialEq)]
pub struct LockOutcome {
    pub receipt: LockReceipt,
    pub previous_phase: MonthPhase,
    pub phase: MonthPhase,
}

#[derive(Clone)]
pub struct LockController {
    service: Arc<dyn DocumentService>,
    resolver: MonthStateResolver,
}

impl LockController {
    pub fn new(service: Arc<dyn DocumentService>) -> Self {
        let resolver = MonthStateResolver::new(service.clone());
        Self { service, resolver }
    }

    /// Lock the session's month.
    ///
    /// `month_note` is mandatory when the month was reopened and this session
    /// changed documents.
    pub async fn lock(
        &self,
        month: &mut MonthSession,
        month_note: Option<&str>,
    ) -> Result<LockOutcome, LifecycleError> {
        let period = month.period();
        let correlation_id = generate_correlation_id();
        let span = create_month_span("lock", Some(period), None, Some(&correlation_id));

        async {
            let mut machine = MonthLifecycle::new(period).state_machine();
            machine.handle(&MonthEvent::observe(month.record()));
            let previous_phase = machine.inner().phase();

            if !machine.inner().can_lock() {
                warn!("Month already locked; no request sent");
                return Err(LifecycleError::from(ValidationError::AlreadyLocked { period }));
            }

            resolver::can_lock(period, month.record(), month.log(), month_note).inspect_err(|e| {
                warn!(reason = %e, "Lock rejected locally");
            })?;

            let note = month_note
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string);

            let receipt = self.service.save_lock(period, note).await.inspect_err(|e| {
                warn!(error = ?e, "Lock request failed");
            })?;
            machine.handle(&MonthEvent::Lock);

            month.refresh(&self.resolver).await?;
            machine.handle(&MonthEvent::observe(month.record()));

            let phase = machine.inner().phase();
            info!(?previous_phase, ?phase, "Lock submitted");
            Ok::<_, LifecycleError>(LockOutcome {
                receipt,
                previous_phase,
                phase,
            })
        }
        .instrument(span)
        .await
    }
}

impl std::fmt::Debug for LockController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockController").finish_non_exhaustive()
    }
}
