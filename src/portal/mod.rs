// Client side of the remote client-upload document service

pub mod client;
pub mod errors;
pub mod types;

pub use client::{DocumentService, PortalClient, UploadRequest};
pub use errors::PortalError;
pub use types::{
    DocumentSlot, EmployeeAssignment, LockReceipt, MonthRecord, MonthSlots, Note, OtherCategory,
    SlotKey, UploadFile, UploadReceipt,
};
