//! Month State Resolver
//!
//! Turns a fetched [`MonthRecord`] into per-slot affordances: whether a slot
//! can be edited, whether an edit counts as an update, and whether that
//! update must carry a justification note.

use std::sync::Arc;
use tracing::{debug, instrument};

use super::types::{Period, SessionLog, ValidationError};
use crate::notes::merge_notes;
use crate::portal::{DocumentService, DocumentSlot, EmployeeAssignment, MonthRecord, Note, PortalError, SlotKey};

/// A slot may be edited while the month is open, or after it closed if the
/// slot holds a document an admin left unlocked.
pub fn can_edit(slot: Option<&DocumentSlot>, month_locked: bool) -> bool {
    if !month_locked {
        return true;
    }
    matches!(slot, Some(doc) if !doc.is_locked)
}

pub fn is_update(slot: Option<&DocumentSlot>) -> bool {
    slot.is_some()
}

pub fn note_required(record: &MonthRecord, slot: Option<&DocumentSlot>) -> bool {
    record.was_locked_once && is_update(slot)
}

/// Everything the upload page shows for one slot.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotView {
    pub key: SlotKey,
    pub document: Option<DocumentSlot>,
    pub editable: bool,
    pub is_update: bool,
    pub note_required: bool,
}

impl SlotView {
    pub fn action_label(&self) -> &'static str {
        if self.is_update {
            "Update"
        } else {
            "Upload"
        }
    }
}

pub fn slot_view(record: &MonthRecord, key: &SlotKey) -> SlotView {
    let document = record.document(key);
    SlotView {
        key: key.clone(),
        document: document.cloned(),
        editable: can_edit(document, record.is_locked),
        is_update: is_update(document),
        note_required: note_required(record, document),
    }
}

pub fn slot_views(record: &MonthRecord) -> Vec<SlotView> {
    record
        .slot_keys()
        .iter()
        .map(|key| slot_view(record, key))
        .collect()
}

/// Check every precondition for locking `period`.
///
/// A blank month note counts as missing.
pub fn can_lock(
    period: Period,
    record: &MonthRecord,
    session: &SessionLog,
    month_note: Option<&str>,
) -> Result<(), ValidationError> {
    if record.is_locked {
        return Err(ValidationError::AlreadyLocked { period });
    }

    if let Some(update) = session.missing_notes().next() {
        return Err(ValidationError::NoteRequired {
            slot: update.slot.clone(),
        });
    }

    let has_note = month_note.is_some_and(|n| !n.trim().is_empty());
    if record.was_locked_once && session.has_updates() && !has_note {
        return Err(ValidationError::MonthNoteRequired);
    }

    Ok(())
}

/// Fetches month state from the document service.
#[derive(Clone)]
pub struct MonthStateResolver {
    service: Arc<dyn DocumentService>,
}

impl MonthStateResolver {
    pub fn new(service: Arc<dyn DocumentService>) -> Self {
        Self { service }
    }

    /// Current month snapshot; a month the service doesn't know yet resolves
    /// to the default empty, unlocked record.
    #[instrument(skip_all, fields(period = %period))]
    pub async fn resolve(&self, period: Period) -> Result<MonthRecord, PortalError> {
        match self.service.fetch_month(period).await? {
            Some(record) => Ok(record),
            None => {
                debug!("No month data yet, using empty record");
                Ok(MonthRecord::default())
            }
        }
    }

    #[instrument(skip_all, fields(period = %period))]
    pub async fn resolve_assignment(
        &self,
        period: Period,
    ) -> Result<Option<EmployeeAssignment>, PortalError> {
        self.service.fetch_assignment(period).await
    }

    /// Notes from the notes API merged with the notes embedded in `record`.
    #[instrument(skip_all, fields(period = %period))]
    pub async fn resolve_notes(
        &self,
        period: Period,
        record: &MonthRecord,
    ) -> Result<Vec<Note>, PortalError> {
        let remote = self.service.fetch_notes(period).await?.unwrap_or_default();
        Ok(merge_notes(&record.embedded_notes(), &remote))
    }
}

impl std::fmt::Debug for MonthStateResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonthStateResolver").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::types::SessionUpdate;
    use crate::portal::client::MockDocumentService;
    use crate::portal::OtherCategory;
    use chrono::{TimeZone, Utc};

    fn doc(locked: bool) -> DocumentSlot {
        DocumentSlot {
            file_name: "statement.pdf".to_string(),
            file_size: 1024,
            uploaded_at: Utc.with_ymd_and_hms(2026, 2, 3, 10, 0, 0).unwrap(),
            uploaded_by: "client@example.com".to_string(),
            is_locked: locked,
            notes: vec![],
        }
    }

    fn period() -> Period {
        Period::new(2026, 2).unwrap()
    }

    #[test]
    fn test_open_month_is_always_editable() {
        assert!(can_edit(None, false));
        assert!(can_edit(Some(&doc(true)), false));
        assert!(can_edit(Some(&doc(false)), false));
    }

    #[test]
    fn test_locked_month_only_allows_unlocked_existing_slots() {
        assert!(!can_edit(None, true));
        assert!(!can_edit(Some(&doc(true)), true));
        assert!(can_edit(Some(&doc(false)), true));
    }

    #[test]
    fn test_note_never_required_before_first_lock() {
        let mut record = MonthRecord::default();
        record.slots.sales = Some(doc(false));

        assert!(!note_required(&record, record.slots.sales.as_ref()));
        assert!(!note_required(&record, None));
    }

    #[test]
    fn test_note_required_for_updates_after_reopen() {
        let mut record = MonthRecord {
            was_locked_once: true,
            ..MonthRecord::default()
        };
        record.slots.purchase = Some(doc(false));

        assert!(note_required(&record, record.slots.purchase.as_ref()));
        // First upload into an empty slot needs no justification
        assert!(!note_required(&record, record.slots.bank.as_ref()));
    }

    #[test]
    fn test_slot_views_for_locked_month_with_exception() {
        let mut record = MonthRecord {
            is_locked: true,
            was_locked_once: true,
            ..MonthRecord::default()
        };
        record.slots.bank = Some(doc(true));
        record.slots.sales = Some(doc(false));
        record.other.push(OtherCategory {
            category_name: "Payroll".to_string(),
            document: None,
        });

        let views = slot_views(&record);
        assert_eq!(views.len(), 4);

        let sales = &views[0];
        assert_eq!(sales.key, SlotKey::Sales);
        assert!(sales.editable);
        assert!(sales.note_required);
        assert_eq!(sales.action_label(), "Update");

        let purchase = &views[1];
        assert!(!purchase.editable);
        assert_eq!(purchase.action_label(), "Upload");

        let bank = &views[2];
        assert!(!bank.editable);

        let payroll = &views[3];
        assert_eq!(payroll.key, SlotKey::Other("Payroll".to_string()));
        assert!(!payroll.editable);
    }

    #[test]
    fn test_can_lock_refuses_locked_month() {
        let record = MonthRecord {
            is_locked: true,
            ..MonthRecord::default()
        };
        assert_eq!(
            can_lock(period(), &record, &SessionLog::new(), None),
            Err(ValidationError::AlreadyLocked { period: period() })
        );
    }

    #[test]
    fn test_can_lock_requires_month_note_after_reopen_with_updates() {
        let record = MonthRecord {
            was_locked_once: true,
            ..MonthRecord::default()
        };
        let mut session = SessionLog::new();

        // Nothing changed this session: no note needed
        assert!(can_lock(period(), &record, &session, None).is_ok());

        session.record(SessionUpdate {
            slot: SlotKey::Sales,
            replaced: false,
            note_required: false,
            note_attached: false,
        });
        assert_eq!(
            can_lock(period(), &record, &session, Some("   ")),
            Err(ValidationError::MonthNoteRequired)
        );
        assert!(can_lock(period(), &record, &session, Some("added missing invoices")).is_ok());
    }

    #[test]
    fn test_can_lock_refuses_unjustified_update() {
        let record = MonthRecord::default();
        let mut session = SessionLog::new();
        session.record(SessionUpdate {
            slot: SlotKey::Purchase,
            replaced: true,
            note_required: true,
            note_attached: false,
        });

        assert_eq!(
            can_lock(period(), &record, &session, Some("month note")),
            Err(ValidationError::NoteRequired {
                slot: SlotKey::Purchase
            })
        );
    }

    #[tokio::test]
    async fn test_resolve_falls_back_to_empty_record() {
        let mut service = MockDocumentService::new();
        service.expect_fetch_month().times(1).returning(|_| Ok(None));

        let resolver = MonthStateResolver::new(Arc::new(service));
        let record = resolver.resolve(period()).await.unwrap();

        assert_eq!(record, MonthRecord::default());
    }

    #[tokio::test]
    async fn test_resolve_propagates_other_errors() {
        let mut service = MockDocumentService::new();
        service
            .expect_fetch_month()
            .returning(|_| Err(PortalError::NetworkError("connection reset".to_string())));

        let resolver = MonthStateResolver::new(Arc::new(service));
        let err = resolver.resolve(period()).await.unwrap_err();

        assert!(matches!(err, PortalError::NetworkError(_)));
    }

    #[tokio::test]
    async fn test_resolve_notes_merges_both_sources() {
        let shared = Note {
            note: "replaced bank export".to_string(),
            added_by: "client".to_string(),
            added_at: Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap(),
            category: Some("bank".to_string()),
        };
        let remote_only = Note {
            note: "reviewed".to_string(),
            added_by: "accountant".to_string(),
            added_at: Utc.with_ymd_and_hms(2026, 3, 4, 9, 0, 0).unwrap(),
            category: Some("month".to_string()),
        };

        let mut record = MonthRecord::default();
        let mut bank = doc(false);
        bank.notes.push(Note {
            category: None,
            ..shared.clone()
        });
        record.slots.bank = Some(bank);

        let remote = vec![shared.clone(), remote_only.clone()];
        let mut service = MockDocumentService::new();
        service
            .expect_fetch_notes()
            .returning(move |_| Ok(Some(remote.clone())));

        let resolver = MonthStateResolver::new(Arc::new(service));
        let notes = resolver.resolve_notes(period(), &record).await.unwrap();

        assert_eq!(notes, vec![shared, remote_only]);
    }
}
