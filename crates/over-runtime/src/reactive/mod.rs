#![forbid(unsafe_code)]

//! Publish/notify bindings for pushing computed state into UI components.
//!
//! This module provides the registry-and-notify primitives:
//!
//! - [`Publisher`]: wraps a producer function and pushes its output to
//!   registered listeners, each under its own field name.
//! - [`Update`]: the producer's output, `Produced(value)` or `Skipped`.
//! - [`PartialState`]: the `{ field: value }` object a listener receives.
//! - [`Notify`]: a chain target; publishers chain into each other through it.
//! - [`NotifyReport`]: what one notification cycle did.
//!
//! # Architecture
//!
//! `Publisher<T>` uses `Rc` + `RefCell` for single-threaded shared ownership.
//! Chained targets are stored as `Weak` references and pruned lazily during
//! notification.
//!
//! # Invariants
//!
//! 1. Chained targets are notified, in registration order, before the
//!    producer runs.
//! 2. The producer runs once per notification cycle.
//! 3. Listeners are notified in registration order.
//! 4. A failing listener or chained target never stops the cycle.
//! 5. Registration ids are never reused by the same publisher.

pub mod chain;
pub mod publisher;
pub mod registration;
pub mod report;
pub mod update;

pub use chain::{Notify, notify_fn, try_notify_fn};
pub use publisher::Publisher;
pub use registration::{FieldName, RegistrationId};
pub use report::NotifyReport;
pub use update::{PartialState, Update};
