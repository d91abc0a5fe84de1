//! Engine errors.
//!
//! Protocol rejections travel inside response payloads. These are the
//! failures that stop a long poll from producing any response at all.

use thiserror::Error;

use sas_core::CodecError;
use sas_store::StorageError;

/// Errors raised while assembling the engine or dispatching a long poll.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A required collaborator was not supplied to the builder.
    #[error("missing collaborator: {0}")]
    MissingCollaborator(&'static str),

    /// A persisted record could not be loaded or its writer not started.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A command payload could not be decoded or a response not encoded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}
