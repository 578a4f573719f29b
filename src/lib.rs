// Ledger Portal Library - client-side monthly document submission
// This exposes the core components for testing and integration

pub mod cli;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod notes;
pub mod portal;
pub mod reminders;
pub mod telemetry;

// Re-export key types for easy access
pub use config::{config, init_config, LedgerPortalConfig};
pub use http::RateLimitedHttpClient;
pub use lifecycle::{
    LifecycleError, LockController, LockOutcome, MonthPhase, MonthSession, MonthStateResolver,
    Period, UploadOrchestrator, ValidationError,
};
pub use notes::merge_notes;
pub use portal::{DocumentService, MonthRecord, PortalClient, PortalError, SlotKey};
pub use reminders::{should_remind, FileReminderStore, ReminderPreference, ReminderStore};
pub use telemetry::{create_month_span, generate_correlation_id, init_telemetry};
