use dpe_dom::PatchError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum AggregateError {
    #[error("adapter is already attached to this aggregate")]
    AdapterAlreadyAttached,
    #[error("adapter is not attached to this aggregate")]
    AdapterNotAttached,
    #[error("source patch could not be applied: {0}")]
    Patch(#[from] PatchError),
    #[error("source patch touches an unknown row at {0}")]
    UnknownRow(String),
}
