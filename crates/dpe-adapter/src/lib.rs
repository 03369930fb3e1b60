//! Document adapters for the document property editor.
//!
//! A document adapter produces an `Adapter` document (see [`dpe_dom`]) and
//! announces changes to it through reset, change and message events. This
//! crate provides:
//!
//! - the [`DocumentAdapter`] trait and its event hub, [`AdapterEvents`];
//! - [`ValueAdapter`], an in-memory adapter over a single document;
//! - [`RowAggregateAdapter`], which merges several source adapters into one
//!   document for multi-selection editing, driven by a pluggable
//!   [`RowAggregatePolicy`];
//! - [`LabeledRowPolicy`], the policy that identifies rows by their first
//!   label;
//! - [`cli`], the library side of the `dpe-merge` binary.
//!
//! Everything here is single-threaded: adapters are shared through `Rc` and
//! events are delivered synchronously.

pub mod adapter;
pub mod aggregate;
pub mod cli;
pub mod error;
pub mod events;
pub mod labeled;
pub mod message;
pub mod value_adapter;

pub use adapter::{same_adapter, DocumentAdapter, DocumentAdapterPtr};
pub use aggregate::{AggregateOptions, AggregateRow, RowAggregateAdapter, RowAggregatePolicy};
pub use error::AggregateError;
pub use events::{AdapterEvents, HandlerId};
pub use labeled::{LabeledRowAggregateAdapter, LabeledRowPolicy};
pub use message::AdapterMessage;
pub use value_adapter::ValueAdapter;
