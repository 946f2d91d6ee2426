#![forbid(unsafe_code)]

//! Publisher/notify runtime for `over`.
//!
//! An owner wraps the computation of its latest state in a [`Publisher`],
//! UI components register a listener plus the field name they want the value
//! under, and the owner calls [`Publisher::notify`] whenever its state
//! changes. Publishers can be chained so one `notify()` fans out to others.
//!
//! Everything here is single-threaded and synchronous. Diagnostics go through
//! `tracing`; the crate installs no subscriber.

pub mod config;
pub mod error;
pub mod reactive;

pub use config::PublisherConfig;
pub use error::{ChainError, ListenerError, ProducerError, PublishError};
pub use reactive::{
    FieldName, Notify, NotifyReport, PartialState, Publisher, RegistrationId, Update, notify_fn,
    try_notify_fn,
};
