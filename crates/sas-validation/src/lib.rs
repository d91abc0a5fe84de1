//! # sas-validation — Ticket and Handpay Validation Engine
//!
//! The long-poll surface of the validation subsystem. The host reads
//! validation records, configures Secure Enhanced validation, answers
//! System validation cash-outs, redeems inserted tickets and sets the
//! host-control bits through the seven long polls this crate answers.
//!
//! ## Components
//!
//! - [`ValidationRecordSelector`]: one pending record per transaction class
//!   (ticket, handpay), reported through 0x4D with implied ack/nack hooks.
//! - [`ValidationSchemeSelector`]: the host-control bits the scheme and
//!   devices allow (0x7B).
//! - [`long_poll`]: fixed-width payload codecs and one handler per long
//!   poll.
//! - [`ValidationEngine`]: assembly over the collaborators and dispatch.
//!
//! ## Usage
//!
//! ```ignore
//! let engine = ValidationEngine::builder()
//!     .store(Arc::new(FileStore::open("sas-state.json")))
//!     .configuration(config)
//!     .device_status(devices)
//!     .bank(bank)
//!     .transaction_history(history)
//!     .build()?;
//!
//! if let Some(response) = engine.dispatch(LongPollCode::SendEnhancedValidationInformation, &[0x00])? {
//!     send(&response.payload);
//!     // On the host's next poll:
//!     if let Some(hook) = response.implied {
//!         hook.ack();
//!     }
//! }
//! ```

pub mod engine;
pub mod error;
pub mod long_poll;
pub mod scheme;
pub mod selector;

pub use engine::{ValidationEngine, ValidationEngineBuilder};
pub use error::EngineError;
pub use long_poll::{LongPollCode, LongPollResponse};
pub use scheme::{FeatureChange, ValidationFeatures, ValidationSchemeSelector};
pub use selector::{
    FunctionCode, ImpliedAck, PendingValidationRecord, Selection, ValidationRecordSelector,
    ValidationResponse, ValidationType, NO_RECEIPT_TICKET_NUMBER,
};
