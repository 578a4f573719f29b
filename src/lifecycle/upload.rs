//! Upload Orchestrator
//!
//! Sends one staged file per request. Every rule that can be checked locally
//! is checked before the request goes out; on success the month is refetched
//! so the session reflects what the service actually stored.

use std::sync::Arc;
use tracing::{info, warn, Instrument};

use super::resolver::MonthStateResolver;
use super::session::MonthSession;
use super::types::{LifecycleError, SessionUpdate, ValidationError};
use crate::portal::{DocumentService, PortalError, SlotKey, UploadReceipt, UploadRequest};
use crate::telemetry::{create_month_span, generate_correlation_id};

/// Result of an upload the service accepted.
#[derive(Debug)]
pub struct UploadOutcome {
    pub receipt: UploadReceipt,
    /// Set when the month could not be refetched afterwards; the session
    /// record is then older than the upload.
    pub refresh_error: Option<PortalError>,
}

impl UploadOutcome {
    pub fn is_stale(&self) -> bool {
        self.refresh_error.is_some()
    }
}

#[derive(Clone)]
pub struct UploadOrchestrator {
    service: Arc<dyn DocumentService>,
    resolver: MonthStateResolver,
}

impl UploadOrchestrator {
    pub fn new(service: Arc<dyn DocumentService>) -> Self {
        let resolver = MonthStateResolver::new(service.clone());
        Self { service, resolver }
    }

    pub fn resolver(&self) -> &MonthStateResolver {
        &self.resolver
    }

    /// Build the request for `slot`, or the reason it may not be sent.
    pub fn prepare(
        &self,
        month: &MonthSession,
        slot: &SlotKey,
    ) -> Result<UploadRequest, ValidationError> {
        let staged = month.staged(slot);
        let file = staged
            .and_then(|s| s.file.clone())
            .ok_or_else(|| ValidationError::MissingFile { slot: slot.clone() })?;

        let view = month.slot_view(slot);
        if !view.editable {
            return Err(ValidationError::SlotLocked { slot: slot.clone() });
        }

        let note = staged.and_then(|s| s.trimmed_note()).map(str::to_string);
        if view.note_required && note.is_none() {
            return Err(ValidationError::NoteRequired { slot: slot.clone() });
        }

        Ok(UploadRequest {
            period: month.period(),
            slot: slot.clone(),
            file,
            note,
        })
    }

    /// Submit the file staged for `slot`.
    ///
    /// On failure the staged file and note stay in place for a retry. Once
    /// the service accepted the file the call succeeds, even if the refetch
    /// that follows fails.
    pub async fn submit(
        &self,
        month: &mut MonthSession,
        slot: &SlotKey,
    ) -> Result<UploadOutcome, LifecycleError> {
        let correlation_id = generate_correlation_id();
        let span = create_month_span(
            "upload",
            Some(month.period()),
            Some(&slot.label()),
            Some(&correlation_id),
        );

        async {
            let request = self.prepare(month, slot).inspect_err(|e| {
                warn!(reason = %e, "Upload rejected locally");
            })?;

            let view = month.slot_view(slot);
            let note_attached = request.note.is_some();

            let receipt = self.service.upload(request).await.inspect_err(|e| {
                warn!(error = ?e, "Upload failed; staged input kept");
            })?;

            month.clear_staged(slot);
            month.log_mut().record(SessionUpdate {
                slot: slot.clone(),
                replaced: view.is_update,
                note_required: view.note_required,
                note_attached,
            });
            info!(replaced = view.is_update, "Upload accepted");

            let refresh_error = month.refresh(&self.resolver).await.err();
            if let Some(e) = &refresh_error {
                warn!(error = ?e, "Upload accepted but month refetch failed");
            }
            Ok::<_, LifecycleError>(UploadOutcome {
                receipt,
                refresh_error,
            })
        }
        .instrument(span)
        .await
    }

    /// Submit every staged slot in order. A failed slot does not stop the
    /// rest; each reports its own outcome.
    pub async fn submit_all(
        &self,
        month: &mut MonthSession,
    ) -> Vec<(SlotKey, Result<UploadOutcome, LifecycleError>)> {
        let mut results = Vec::new();
        for slot in month.staged_slots() {
            let result = self.submit(month, &slot).await;
            results.push((slot, result));
        }
        results
    }
}

impl std::fmt::Debug for UploadOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadOrchestrator").finish_non_exhaustive()
    }
}
