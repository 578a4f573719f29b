use std::collections::BTreeMap;

use super::resolver::{self, MonthStateResolver, SlotView};
use super::types::{Period, SessionLog, ValidationError};
use crate::portal::{MonthRecord, PortalError, SlotKey, UploadFile};

/// File and note the user has picked for a slot but not yet submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedUpload {
    pub file: Option<UploadFile>,
    pub note: Option<String>,
}

impl StagedUpload {
    /// The staged note with surrounding whitespace removed, if not blank.
    pub fn trimmed_note(&self) -> Option<&str> {
        self.note
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }
}

/// Working state of the upload page for one selected month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthSession {
    period: Period,
    record: MonthRecord,
    staged: BTreeMap<SlotKey, StagedUpload>,
    log: SessionLog,
}

impl MonthSession {
    pub fn new(period: Period, record: MonthRecord) -> Self {
        Self {
            period,
            record,
            staged: BTreeMap::new(),
            log: SessionLog::new(),
        }
    }

    /// Fetch the month and start a session on it.
    pub async fn load(resolver: &MonthStateResolver, period: Period) -> Result<Self, PortalError> {
        let record = resolver.resolve(period).await?;
        Ok(Self::new(period, record))
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn record(&self) -> &MonthRecord {
        &self.record
    }

    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    pub fn slot_view(&self, slot: &SlotKey) -> SlotView {
        resolver::slot_view(&self.record, slot)
    }

    pub fn slot_views(&self) -> Vec<SlotView> {
        resolver::slot_views(&self.record)
    }

    pub fn stage_file(&mut self, slot: SlotKey, file: UploadFile) -> Result<(), ValidationError> {
        if let SlotKey::Other(name) = &slot {
            if name.trim().is_empty() {
                return Err(ValidationError::InvalidCategory { name: name.clone() });
            }
        }
        self.staged.entry(slot).or_default().file = Some(file);
        Ok(())
    }

    pub fn stage_note(&mut self, slot: SlotKey, note: impl Into<String>) {
        self.staged.entry(slot).or_default().note = Some(note.into());
    }

    pub fn staged(&self, slot: &SlotKey) -> Option<&StagedUpload> {
        self.staged.get(slot)
    }

    /// Slots with a file waiting to be submitted, in slot order.
    pub fn staged_slots(&self) -> Vec<SlotKey> {
        self.staged
            .iter()
            .filter(|(_, staged)| staged.file.is_some())
            .map(|(slot, _)| slot.clone())
            .collect()
    }

    pub(crate) fn clear_staged(&mut self, slot: &SlotKey) {
        self.staged.remove(slot);
    }

    pub(crate) fn log_mut(&mut self) -> &mut SessionLog {
        &mut self.log
    }

    /// Switch to another month. Staged input and the session log belong to
    /// the previous month and are dropped.
    pub async fn select(
        &mut self,
        resolver: &MonthStateResolver,
        period: Period,
    ) -> Result<(), PortalError> {
        let record = resolver.resolve(period).await?;
        *self = Self::new(period, record);
        Ok(())
    }

    pub async fn refresh(&mut self, resolver: &MonthStateResolver) -> Result<(), PortalError> {
        self.record = resolver.resolve(self.period).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> MonthSession {
        MonthSession::new(Period::new(2026, 6).unwrap(), MonthRecord::default())
    }

    #[test]
    fn test_staging_file_and_note() {
        let mut month = session();
        month
            .stage_file(SlotKey::Sales, UploadFile::new("s.pdf", vec![1, 2, 3]))
            .unwrap();
        month.stage_note(SlotKey::Sales, "  corrected  ");
        month.stage_note(SlotKey::Bank, "note without file");

        let staged = month.staged(&SlotKey::Sales).unwrap();
        assert_eq!(staged.file.as_ref().unwrap().file_name, "s.pdf");
        assert_eq!(staged.trimmed_note(), Some("corrected"));
        assert_eq!(month.staged_slots(), vec![SlotKey::Sales]);
    }

    #[test]
    fn test_blank_note_is_treated_as_missing() {
        let staged = StagedUpload {
            file: None,
            note: Some("   ".to_string()),
        };
        assert_eq!(staged.trimmed_note(), None);
    }

    #[test]
    fn test_blank_category_name_is_rejected() {
        let mut month = session();
        let err = month
            .stage_file(SlotKey::Other(" ".to_string()), UploadFile::new("x.pdf", vec![]))
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidCategory { .. }));
        assert!(month.staged_slots().is_empty());
    }
}
