use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use super::with_portal;
use crate::lifecycle::{LifecycleError, LockController, MonthSession, Period, UploadOrchestrator};
use crate::portal::{DocumentService, SlotKey, UploadFile};

pub struct UploadCommand {
    pub period: Period,
    pub files: Vec<(SlotKey, PathBuf)>,
    pub note: Option<String>,
    pub lock: bool,
    pub month_note: Option<String>,
}

impl UploadCommand {
    pub fn new(period: Period) -> Self {
        Self {
            period,
            files: Vec::new(),
            note: None,
            lock: false,
            month_note: None,
        }
    }

    pub fn with_file(mut self, slot: SlotKey, path: PathBuf) -> Self {
        self.files.push((slot, path));
        self
    }

    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note;
        self
    }

    pub fn with_lock(mut self, lock: bool, month_note: Option<String>) -> Self {
        self.lock = lock;
        self.month_note = month_note;
        self
    }

    pub async fn execute(&self) -> Result<()> {
        if self.files.is_empty() {
            bail!("Nothing to upload: pass at least one of --sales, --purchase, --bank or --other");
        }

        let mut staged = Vec::with_capacity(self.files.len());
        for (slot, path) in &self.files {
            let file = UploadFile::from_path(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            staged.push((slot.clone(), file));
        }

        with_portal(|service| self.run(service, staged)).await
    }

    /// Upload every staged file, then lock when asked and nothing failed.
    async fn run(
        &self,
        service: Arc<dyn DocumentService>,
        staged: Vec<(SlotKey, UploadFile)>,
    ) -> Result<()> {
        let period = self.period;
        let orchestrator = UploadOrchestrator::new(service.clone());
        let mut month = MonthSession::load(orchestrator.resolver(), period).await?;

        for (slot, file) in staged {
            month.stage_file(slot.clone(), file)?;
            if let Some(note) = &self.note {
                month.stage_note(slot, note.clone());
            }
        }

        println!();
        println!("📤 Uploading documents for {period}");
        let mut failed = 0;
        for (slot, result) in orchestrator.submit_all(&mut month).await {
            match result {
                Ok(outcome) => {
                    let message = outcome
                        .receipt
                        .message
                        .clone()
                        .unwrap_or_else(|| "uploaded".to_string());
                    println!("   ✅ {}: {}", slot.label(), message);
                    if let Some(e) = &outcome.refresh_error {
                        println!("      ⚠️  Uploaded, but the month could not be reloaded: {e}");
                    }
                }
                Err(e) => {
                    failed += 1;
                    let rejected = match &e {
                        LifecycleError::Validation(_) => true,
                        LifecycleError::Portal(portal) => portal.is_client_rejection(),
                    };
                    let icon = if rejected { "⚠️ " } else { "❌" };
                    println!("   {} {}: {}", icon, slot.label(), e);
                }
            }
        }

        if failed > 0 {
            bail!("{failed} upload(s) did not go through; nothing was locked");
        }

        if self.lock {
            let controller = LockController::new(service);
            let outcome = controller
                .lock(&mut month, self.month_note.as_deref())
                .await?;
            println!();
            println!(
                "🔒 {}",
                outcome
                    .receipt
                    .message
                    .unwrap_or_else(|| format!("Month {period} locked"))
            );
        }

        Ok(())
    }
}
