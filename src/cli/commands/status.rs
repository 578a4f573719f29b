use anyhow::Result;
use chrono::Local;
use statig::prelude::*;

use super::with_portal;
use crate::config::config;
use crate::lifecycle::{MonthEvent, MonthLifecycle, MonthPhase, MonthSession, MonthStateResolver, Period};
use crate::reminders::{should_remind, FileReminderStore, ReminderKey, ReminderStore};

pub struct StatusCommand {
    pub period: Period,
}

impl StatusCommand {
    pub fn new(period: Period) -> Self {
        Self { period }
    }

    pub async fn execute(&self) -> Result<()> {
        let period = self.period;
        println!("📒 MONTH STATUS {period}");
        println!("==========================");

        with_portal(|service| async move {
            let resolver = MonthStateResolver::new(service);
            let month = MonthSession::load(&resolver, period).await?;
            println!();

            let mut machine = MonthLifecycle::new(period).state_machine();
            machine.handle(&MonthEvent::observe(month.record()));
            match machine.inner().phase() {
                MonthPhase::Open => println!("🟢 Open - documents can be uploaded"),
                MonthPhase::Locked => {
                    let when = month
                        .record()
                        .locked_at
                        .map(|t| format!(" since {}", t.format("%Y-%m-%d %H:%M")))
                        .unwrap_or_default();
                    println!("🔒 Locked{when}");
                }
                MonthPhase::Reopened => {
                    println!("🟠 Reopened by your bookkeeper - replacing a file needs a note")
                }
            }
            println!();

            println!("📄 DOCUMENTS:");
            println!("────────────");
            for view in month.slot_views() {
                let state = if view.editable { "" } else { " 🔒" };
                match &view.document {
                    Some(doc) => println!(
                        "   {} {}: {} ({} bytes, {} by {}){}",
                        if view.editable { "✏️ " } else { "📎" },
                        view.key.label(),
                        doc.file_name,
                        doc.file_size,
                        doc.uploaded_at.format("%Y-%m-%d"),
                        doc.uploaded_by,
                        state
                    ),
                    None => println!("   ⬜ {}: nothing uploaded{}", view.key.label(), state),
                }
                if view.editable {
                    let hint = if view.note_required { " (note required)" } else { "" };
                    println!("      → {}{}", view.action_label(), hint);
                }
            }
            println!();

            match resolver.resolve_assignment(period).await {
                Ok(Some(assignment)) => {
                    let email = assignment
                        .employee_email
                        .map(|e| format!(" <{e}>"))
                        .unwrap_or_default();
                    println!("👤 Bookkeeper: {}{}", assignment.employee_name, email);
                }
                Ok(None) => println!("👤 Bookkeeper: not assigned yet"),
                Err(e) => println!("⚠️  Could not load bookkeeper assignment: {e}"),
            }
            println!();

            match resolver.resolve_notes(period, month.record()).await {
                Ok(notes) if notes.is_empty() => println!("📝 No notes"),
                Ok(notes) => {
                    println!("📝 NOTES:");
                    for note in notes {
                        println!(
                            "   [{}] {} ({}): {}",
                            note.category.as_deref().unwrap_or("month"),
                            note.added_at.format("%Y-%m-%d %H:%M"),
                            note.added_by,
                            note.note
                        );
                    }
                }
                Err(e) => println!("⚠️  Could not load notes: {e}"),
            }

            Ok(())
        })
        .await?;

        self.show_reminder().await
    }

    async fn show_reminder(&self) -> Result<()> {
        let cfg = config()?;
        let store = FileReminderStore::new(&cfg.reminders.state_file_path);
        let key = ReminderKey::new(cfg.client_id(), self.period);
        let preference = store.get(&key).await?;

        if should_remind(
            Local::now().date_naive(),
            self.period,
            preference,
            cfg.reminders.window_days,
        ) {
            println!();
            println!("🔔 Payment for {} is due.", self.period);
            println!(
                "   Answer with: ledger-portal remind --year {} --month {} --set will-pay|paid",
                self.period.year(),
                self.period.month()
            );
        }
        Ok(())
    }
}
