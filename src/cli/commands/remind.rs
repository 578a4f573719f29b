use anyhow::Result;
use chrono::Local;

use crate::config::config;
use crate::lifecycle::Period;
use crate::reminders::{should_remind, FileReminderStore, ReminderKey, ReminderPreference, ReminderStore};

pub struct RemindCommand {
    pub period: Period,
    pub set: Option<ReminderPreference>,
}

impl RemindCommand {
    pub fn new(period: Period, set: Option<ReminderPreference>) -> Self {
        Self { period, set }
    }

    pub async fn execute(&self) -> Result<()> {
        let cfg = config()?;
        let store = FileReminderStore::new(&cfg.reminders.state_file_path);
        let key = ReminderKey::new(cfg.client_id(), self.period);

        if let Some(preference) = self.set {
            store.set(&key, preference).await?;
            println!("✅ Payment reminder for {} set to: {}", self.period, preference);
            return Ok(());
        }

        let preference = store.get(&key).await?;
        println!("🔔 Payment reminder for {}: {}", self.period, preference);
        if should_remind(
            Local::now().date_naive(),
            self.period,
            preference,
            cfg.reminders.window_days,
        ) {
            println!("   ⏰ Due now - answer with --set will-pay or --set paid");
        }
        Ok(())
    }
}
