//! Payment reminder preferences
//!
//! The client can answer the monthly payment reminder with "will pay" or
//! "paid". Answers are kept per `(client_id, year, month)` in a local JSON
//! file; nothing here talks to the document service.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::lifecycle::Period;

#[derive(Debug, Error)]
pub enum ReminderError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Unknown reminder preference '{0}' (expected unset, will-pay or paid)")]
    UnknownPreference(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderPreference {
    #[default]
    Unset,
    WillPay,
    Paid,
}

impl FromStr for ReminderPreference {
    type Err = ReminderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "unset" => Ok(ReminderPreference::Unset),
            "will_pay" => Ok(ReminderPreference::WillPay),
            "paid" => Ok(ReminderPreference::Paid),
            _ => Err(ReminderError::UnknownPreference(s.to_string())),
        }
    }
}

impl std::fmt::Display for ReminderPreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ReminderPreference::Unset => "unset",
            ReminderPreference::WillPay => "will pay",
            ReminderPreference::Paid => "paid",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReminderKey {
    pub client_id: String,
    pub period: Period,
}

impl ReminderKey {
    pub fn new(client_id: impl Into<String>, period: Period) -> Self {
        Self {
            client_id: client_id.into(),
            period,
        }
    }

    fn storage_key(&self) -> String {
        format!("{}:{}", self.client_id, self.period)
    }
}

/// Whether the payment reminder for `period` should be shown on `today`.
///
/// The reminder shows during the first `window_days` days of the month after
/// the period, and only while the client has not answered it.
pub fn should_remind(
    today: NaiveDate,
    period: Period,
    preference: ReminderPreference,
    window_days: u32,
) -> bool {
    if preference != ReminderPreference::Unset || window_days == 0 {
        return false;
    }
    Period::containing(today) == period.next() && today.day() <= window_days
}

#[async_trait]
pub trait ReminderStore: Send + Sync {
    async fn get(&self, key: &ReminderKey) -> Result<ReminderPreference, ReminderError>;

    async fn set(&self, key: &ReminderKey, preference: ReminderPreference) -> Result<(), ReminderError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ReminderFile {
    version: u32,
    preferences: BTreeMap<String, ReminderPreference>,
}

const FILE_VERSION: u32 = 1;

/// [`ReminderStore`] backed by a single JSON file.
#[derive(Debug)]
pub struct FileReminderStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileReminderStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_file(&self) -> Result<ReminderFile, ReminderError> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No reminder file yet");
                Ok(ReminderFile {
                    version: FILE_VERSION,
                    ..Default::default()
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn write_file(&self, file: &ReminderFile) -> Result<(), ReminderError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        // Write to a sibling temp file and rename so readers never see a partial file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(file)?).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl ReminderStore for FileReminderStore {
    async fn get(&self, key: &ReminderKey) -> Result<ReminderPreference, ReminderError> {
        let file = self.read_file().await?;
        Ok(file
            .preferences
            .get(&key.storage_key())
            .copied()
            .unwrap_or_default())
    }

    async fn set(&self, key: &ReminderKey, preference: ReminderPreference) -> Result<(), ReminderError> {
        let _guard = self.write_lock.lock().await;
        let mut file = self.read_file().await?;
        file.version = FILE_VERSION;

        if preference == ReminderPreference::Unset {
            file.preferences.remove(&key.storage_key());
        } else {
            file.preferences.insert(key.storage_key(), preference);
        }

        self.write_file(&file).await?;
        info!(client = %key.client_id, period = %key.period, %preference, "Reminder preference saved");
        Ok(())
    }
}
