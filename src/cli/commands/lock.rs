use anyhow::Result;

use super::with_portal;
use crate::lifecycle::{LockController, MonthPhase, MonthSession, MonthStateResolver, Period};

pub struct LockCommand {
    pub period: Period,
    pub month_note: Option<String>,
}

impl LockCommand {
    pub fn new(period: Period, month_note: Option<String>) -> Self {
        Self { period, month_note }
    }

    pub async fn execute(&self) -> Result<()> {
        let period = self.period;
        let month_note = self.month_note.clone();

        with_portal(|service| async move {
            let resolver = MonthStateResolver::new(service.clone());
            let mut month = MonthSession::load(&resolver, period).await?;

            let controller = LockController::new(service);
            let outcome = controller.lock(&mut month, month_note.as_deref()).await?;

            println!();
            if outcome.previous_phase == MonthPhase::Reopened {
                println!("🔁 Reopened month {period} locked again");
            }
            println!(
                "🔒 {}",
                outcome
                    .receipt
                    .message
                    .unwrap_or_else(|| format!("Month {period} locked"))
            );
            if let Some(locked_at) = month.record().locked_at {
                println!("   Locked at {}", locked_at.format("%Y-%m-%d %H:%M"));
            }
            Ok(())
        })
        .await
    }
}
