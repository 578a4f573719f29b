// Monthly document submission lifecycle
//
// Resolver, upload orchestration and lock transitions for one client month,
// driven against the remote document service.

pub mod lock;
pub mod resolver;
pub mod session;
pub mod state_machine;
pub mod types;
pub mod upload;

pub use lock::{LockController, LockOutcome};
pub use resolver::{can_edit, can_lock, is_update, note_required, MonthStateResolver, SlotView};
pub use session::{MonthSession, StagedUpload};
pub use state_machine::{MonthEvent, MonthLifecycle, MonthPhase};
pub use types::{
    LifecycleError, Period, SessionLog, SessionUpdate, ValidationError, NOTE_REQUIRED_MESSAGE,
};
pub use upload::{UploadOrchestrator, UploadOutcome};
