// Wire types for the client-upload document service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single justification entry attached to a month or a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub note: String,
    pub added_by: String,
    pub added_at: DateTime<Utc>,
    /// Which slot or category the note belongs to; `month` for month-level notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// One uploaded document occupying a slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSlot {
    pub file_name: String,
    #[serde(default)]
    pub file_size: u64,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default)]
    pub uploaded_by: String,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default)]
    pub notes: Vec<Note>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthSlots {
    #[serde(default)]
    pub sales: Option<DocumentSlot>,
    #[serde(default)]
    pub purchase: Option<DocumentSlot>,
    #[serde(default)]
    pub bank: Option<DocumentSlot>,
}

/// Client-named optional document bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtherCategory {
    pub category_name: String,
    #[serde(default)]
    pub document: Option<DocumentSlot>,
}

/// Snapshot of one client's submission state for a (year, month).
///
/// `Default` is the state of a month the service has no record for:
/// unlocked, never locked, every slot empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthRecord {
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default)]
    pub was_locked_once: bool,
    #[serde(default)]
    pub locked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub slots: MonthSlots,
    #[serde(default)]
    pub other: Vec<OtherCategory>,
    #[serde(default)]
    pub month_notes: Vec<Note>,
}

impl MonthRecord {
    /// Document currently held by `slot`, if any.
    pub fn document(&self, slot: &SlotKey) -> Option<&DocumentSlot> {
        match slot {
            SlotKey::Sales => self.slots.sales.as_ref(),
            SlotKey::Purchase => self.slots.purchase.as_ref(),
            SlotKey::Bank => self.slots.bank.as_ref(),
            SlotKey::Other(name) => self
                .other
                .iter()
                .find(|c| c.category_name == *name)
                .and_then(|c| c.document.as_ref()),
        }
    }

    /// Every slot key present on this record: the three required slots
    /// followed by the client-defined categories in server order.
    pub fn slot_keys(&self) -> Vec<SlotKey> {
        let mut keys = vec![SlotKey::Sales, SlotKey::Purchase, SlotKey::Bank];
        keys.extend(
            self.other
                .iter()
                .map(|c| SlotKey::Other(c.category_name.clone())),
        );
        keys
    }

    /// All notes embedded in the record, tagged with the slot they came from.
    pub fn embedded_notes(&self) -> Vec<Note> {
        let mut notes: Vec<Note> = self
            .month_notes
            .iter()
            .cloned()
            .map(|n| tag_note(n, "month"))
            .collect();

        for key in self.slot_keys() {
            if let Some(doc) = self.document(&key) {
                let label = key.label();
                notes.extend(doc.notes.iter().cloned().map(|n| tag_note(n, &label)));
            }
        }
        notes
    }
}

fn tag_note(mut note: Note, category: &str) -> Note {
    if note.category.is_none() {
        note.category = Some(category.to_string());
    }
    note
}

/// Identifies a document slot: one of the three required categories or a
/// client-named other category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlotKey {
    Sales,
    Purchase,
    Bank,
    Other(String),
}

impl SlotKey {
    /// Value of the multipart `type` field.
    pub fn wire_type(&self) -> &'static str {
        match self {
            SlotKey::Sales => "sales",
            SlotKey::Purchase => "purchase",
            SlotKey::Bank => "bank",
            SlotKey::Other(_) => "other",
        }
    }

    pub fn category_name(&self) -> Option<&str> {
        match self {
            SlotKey::Other(name) => Some(name.as_str()),
            _ => None,
        }
    }

    /// Human-facing label, also used as a note category.
    pub fn label(&self) -> String {
        match self {
            SlotKey::Other(name) => name.clone(),
            other => other.wire_type().to_string(),
        }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotKey::Other(name) => write!(f, "other:{name}"),
            other => f.write_str(other.wire_type()),
        }
    }
}

/// Staff member responsible for a month's accounting. Display only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeAssignment {
    pub employee_name: String,
    #[serde(default)]
    pub employee_email: Option<String>,
    #[serde(default)]
    pub assigned_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub document: Option<DocumentSlot>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockReceipt {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub locked_at: Option<DateTime<Utc>>,
}

/// A file selected for upload, held in memory until submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Read a file from disk, keeping only its final path component as name.
    pub async fn from_path(path: &std::path::Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self { file_name, bytes })
    }
}

/// Body of the save-lock request.
#[derive(Debug, Clone, Serialize)]
pub struct LockRequest {
    pub year: i32,
    pub month: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}
