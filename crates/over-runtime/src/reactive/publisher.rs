#![forbid(unsafe_code)]

//! Push computed state into registered listeners.
//!
//! # Design
//!
//! [`Publisher<T>`] wraps a producer function and two lists, listener
//! registrations and chained notify targets, in shared reference-counted
//! storage. The owner calls [`notify()`](Publisher::notify) whenever its state
//! changes:
//!
//! ```text
//! notify()
//!   ├─ 1. chained targets, in order   (weak; dead ones skipped)
//!   ├─ 2. producer, exactly once      (Skipped ─► return)
//!   └─ 3. listeners, in order         ({ field: value } per listener)
//! ```
//!
//! # Invariants
//!
//! 1. The producer runs at most once per `notify()`, whatever the listener
//!    count.
//! 2. Chained targets run before the producer and before any listener.
//! 3. Registration ids are unique for the lifetime of the publisher.
//! 4. The producer is fixed at construction.
//!
//! # Failure Modes
//!
//! - **Producer fails**: the error propagates out of `notify()` (before any
//!   listener) or out of `register()` (initial value). A panicking producer
//!   unwinds.
//! - **Listener fails or panics**: logged at `warn`, counted, and delivery
//!   continues with the next listener.
//! - **Chained target fails or panics**: logged at `warn`, counted, and the
//!   chain phase continues.
//! - **Chain cycle** (A → B → A, or a chained target calling `notify()` on
//!   its own publisher): the nested call is refused with
//!   [`PublishError::Reentrant`] (seen by a chained caller as
//!   [`ChainError::Reentrant`]), logged, and counted in
//!   [`NotifyReport::reentrant`].
//!
//! # Reentrancy
//!
//! Both lists are snapshotted before iteration and no borrow is held while a
//! callback runs. A callback may register, unregister or notify on the same
//! publisher. A listener added mid-cycle is first notified on the next cycle;
//! one removed mid-cycle still receives the value of the cycle in flight.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::config::PublisherConfig;
use crate::error::{
    ChainError, ChainResult, ListenerError, ListenerResult, ProducerError, PublishError, Result,
    panic_message,
};

use super::chain::{ChainLink, Notify};
use super::registration::{FieldName, IdCounter, Registration, RegistrationId};
use super::report::NotifyReport;
use super::update::{PartialState, Update};

type Producer<T> = Box<dyn Fn() -> std::result::Result<Update<T>, ProducerError>>;

/// Shared interior for [`Publisher<T>`].
struct PublisherInner<T> {
    producer: Producer<T>,
    registrations: RefCell<Vec<Registration<T>>>,
    chain: RefCell<Vec<ChainLink>>,
    ids: IdCounter,
    /// Set while the chain phase runs; guards chain cycles.
    chaining: Cell<bool>,
    /// Nested `notify()` calls refused during the current chain phase.
    refused: Cell<usize>,
    config: PublisherConfig,
}

/// Restores the `chaining` flag when the chain phase ends, even by unwinding.
struct ChainingGuard<'a> {
    flag: &'a Cell<bool>,
    previous: bool,
}

impl<'a> ChainingGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        let previous = flag.replace(true);
        Self { flag, previous }
    }
}

impl Drop for ChainingGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(self.previous);
    }
}

/// Pushes one computed value to many listeners, each under its own field.
///
/// Cloning a `Publisher` creates a new handle to the **same** registrations
/// and chain. The owner holds the publisher; there is no global registry.
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use over_runtime::reactive::{Publisher, Update};
///
/// let counter = Rc::new(RefCell::new(1));
/// let source = Rc::clone(&counter);
/// let publisher = Publisher::new(move || Update::Produced(*source.borrow()));
///
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let sink = Rc::clone(&seen);
/// let (id, initial) = publisher
///     .register_listener(move |state| sink.borrow_mut().push(state.to_pair()), "count")
///     .expect("valid field name");
/// assert_eq!(id.raw(), 112);
/// assert_eq!(initial, Some(Update::Produced(1)));
///
/// *counter.borrow_mut() = 2;
/// publisher.notify().expect("producer is infallible");
/// assert_eq!(*seen.borrow(), vec![("count".to_string(), 2)]);
/// ```
pub struct Publisher<T> {
    inner: Rc<PublisherInner<T>>,
}

impl<T> Clone for Publisher<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Publisher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<RegistrationId> = self
            .inner
            .registrations
            .borrow()
            .iter()
            .map(Registration::id)
            .collect();
        f.debug_struct("Publisher")
            .field("name", &self.inner.config.label())
            .field("registrations", &ids)
            .field("chain", &self.inner.chain.borrow().len())
            .field("last_id", &self.inner.ids.last())
            .finish()
    }
}

impl<T: 'static> Publisher<T> {
    /// Create a publisher around an infallible producer.
    pub fn new(producer: impl Fn() -> Update<T> + 'static) -> Self {
        Self::with_config(PublisherConfig::default(), producer)
    }

    /// Create a publisher with explicit configuration.
    pub fn with_config(config: PublisherConfig, producer: impl Fn() -> Update<T> + 'static) -> Self {
        Self::fallible_with_config(config, move || Ok(producer()))
    }

    /// Create a publisher around a producer that can fail.
    ///
    /// Producer errors surface from [`register`](Self::register) and
    /// [`notify`](Self::notify) as [`PublishError::Producer`].
    pub fn fallible(
        producer: impl Fn() -> std::result::Result<Update<T>, ProducerError> + 'static,
    ) -> Self {
        Self::fallible_with_config(PublisherConfig::default(), producer)
    }

    /// Create a fallible publisher with explicit configuration.
    pub fn fallible_with_config(
        config: PublisherConfig,
        producer: impl Fn() -> std::result::Result<Update<T>, ProducerError> + 'static,
    ) -> Self {
        Self {
            inner: Rc::new(PublisherInner {
                producer: Box::new(producer),
                registrations: RefCell::new(Vec::new()),
                chain: RefCell::new(Vec::new()),
                ids: IdCounter::new(config.id_seed),
                chaining: Cell::new(false),
                refused: Cell::new(0),
                config,
            }),
        }
    }

    /// Register a listener under `field`.
    ///
    /// Returns the new id and, unless `skip_initial` is set, the producer's
    /// current output (possibly [`Update::Skipped`]). The listener itself is
    /// not called; applying the initial value is up to the caller.
    ///
    /// # Errors
    ///
    /// - [`PublishError::EmptyFieldName`]: nothing is registered.
    /// - [`PublishError::IdsExhausted`]: nothing is registered.
    /// - [`PublishError::Producer`]: the registration is kept and its id is
    ///   carried in the error.
    pub fn register(
        &self,
        listener: impl Fn(&PartialState<T>) -> ListenerResult + 'static,
        field: impl AsRef<str>,
        skip_initial: bool,
    ) -> Result<(RegistrationId, Option<Update<T>>)> {
        let field = FieldName::new(field)?;
        let id = self.inner.ids.next()?;
        self.inner
            .registrations
            .borrow_mut()
            .push(Registration::new(id, field.clone(), Rc::new(listener)));
        debug!(
            message = "publisher.registered",
            publisher = self.inner.config.label(),
            id = id.raw(),
            field = field.as_str()
        );

        if skip_initial {
            return Ok((id, None));
        }
        let initial = self
            .inner
            .produce()
            .map_err(|source| PublishError::Producer {
                source,
                registration: Some(id),
            })?;
        Ok((id, Some(initial)))
    }

    /// Register an infallible listener and fetch the initial value.
    pub fn register_listener(
        &self,
        listener: impl Fn(&PartialState<T>) + 'static,
        field: impl AsRef<str>,
    ) -> Result<(RegistrationId, Option<Update<T>>)> {
        self.register(
            move |state| {
                listener(state);
                Ok(())
            },
            field,
            false,
        )
    }

    /// Remove the registration with `id`.
    ///
    /// Unknown ids are ignored, so calling this twice is harmless. Returns
    /// whether a registration was removed.
    pub fn unregister(&self, id: RegistrationId) -> bool {
        let mut registrations = self.inner.registrations.borrow_mut();
        let Some(idx) = registrations.iter().position(|r| r.id() == id) else {
            return false;
        };
        registrations.remove(idx);
        debug!(
            message = "publisher.unregistered",
            publisher = self.inner.config.label(),
            id = id.raw()
        );
        true
    }

    /// Chain `target` so it is notified at the start of every `notify()`.
    ///
    /// Only a weak reference is kept. Chaining the same target twice
    /// notifies it twice.
    pub fn register_callback(&self, target: &Rc<dyn Notify>) {
        self.inner.chain.borrow_mut().push(ChainLink::new(target));
    }

    /// Remove the first chain entry pointing at `target`.
    ///
    /// Returns whether an entry was removed.
    pub fn unregister_callback(&self, target: &Rc<dyn Notify>) -> bool {
        let mut chain = self.inner.chain.borrow_mut();
        let Some(idx) = chain.iter().position(|link| link.points_to(target)) else {
            return false;
        };
        chain.remove(idx);
        true
    }

    /// Chain another publisher.
    pub fn chain<U: 'static>(&self, downstream: &Publisher<U>) {
        self.register_callback(&downstream.as_notify());
    }

    /// Remove the first chain entry pointing at `downstream`.
    pub fn unchain<U: 'static>(&self, downstream: &Publisher<U>) -> bool {
        self.unregister_callback(&downstream.as_notify())
    }

    /// This publisher as a chain target.
    ///
    /// The returned `Rc` shares the publisher's state; chaining it keeps
    /// only a weak reference.
    #[must_use]
    pub fn as_notify(&self) -> Rc<dyn Notify> {
        let inner: Rc<PublisherInner<T>> = Rc::clone(&self.inner);
        inner
    }

    /// Run one notification cycle.
    ///
    /// # Errors
    ///
    /// - [`PublishError::Producer`] if the producer fails; no listener has
    ///   been called at that point.
    /// - [`PublishError::Reentrant`] if this publisher is still running its
    ///   chain phase, e.g. a chained target calling back into it. The outer
    ///   cycle counts the refusal in [`NotifyReport::reentrant`].
    ///
    /// Listener and chain failures are not errors; see the returned
    /// [`NotifyReport`].
    pub fn notify(&self) -> Result<NotifyReport> {
        self.inner.run()
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.registrations.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.registrations.borrow().is_empty()
    }

    /// Registered ids, in registration order.
    #[must_use]
    pub fn ids(&self) -> Vec<RegistrationId> {
        self.inner
            .registrations
            .borrow()
            .iter()
            .map(Registration::id)
            .collect()
    }

    #[must_use]
    pub fn contains(&self, id: RegistrationId) -> bool {
        self.inner
            .registrations
            .borrow()
            .iter()
            .any(|r| r.id() == id)
    }

    /// Chain entries, live or not yet pruned.
    #[must_use]
    pub fn chain_len(&self) -> usize {
        self.inner.chain.borrow().len()
    }

    #[must_use]
    pub fn config(&self) -> &PublisherConfig {
        &self.inner.config
    }

    /// Whether two handles share the same publisher.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> PublisherInner<T> {
    fn produce(&self) -> std::result::Result<Update<T>, ProducerError> {
        (self.producer)()
    }

    fn run(&self) -> Result<NotifyReport> {
        if self.chaining.get() {
            self.refused.set(self.refused.get() + 1);
            warn!(
                message = "publisher.reentrant_notify",
                publisher = self.config.label()
            );
            return Err(PublishError::Reentrant);
        }
        let span = tracing::debug_span!(
            "publisher.notify",
            publisher = self.config.label(),
            listeners = tracing::field::Empty,
            delivered = tracing::field::Empty
        );
        let _entered = span.enter();
        let mut report = NotifyReport::default();

        self.run_chain(&mut report);

        let update = self.produce().map_err(|source| PublishError::Producer {
            source,
            registration: None,
        })?;
        let value = match update {
            Update::Produced(value) => Rc::new(value),
            Update::Skipped => {
                trace!(message = "publisher.skipped", publisher = self.config.label());
                report.skipped = true;
                return Ok(report);
            }
        };

        let snapshot = self.registrations.borrow().clone();
        span.record("listeners", snapshot.len());
        for registration in &snapshot {
            let state = PartialState::new(registration.field().clone(), Rc::clone(&value));
            match self.deliver(registration, &state) {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    report.listener_failures += 1;
                    warn!(
                        message = "publisher.listener_failed",
                        publisher = self.config.label(),
                        id = registration.id().raw(),
                        field = registration.field().as_str(),
                        error = %err
                    );
                }
            }
        }
        span.record("delivered", report.delivered);
        Ok(report)
    }

    fn run_chain(&self, report: &mut NotifyReport) {
        let links = self.chain.borrow().clone();
        if links.is_empty() {
            return;
        }
        let _guard = ChainingGuard::enter(&self.chaining);
        self.refused.set(0);

        for link in &links {
            let Some(target) = link.upgrade() else {
                report.dead_links += 1;
                debug!(message = "publisher.dead_link", publisher = self.config.label());
                continue;
            };
            report.chained += 1;
            if let Err(err) = self.invoke_chained(target.as_ref()) {
                report.chain_failures += 1;
                warn!(
                    message = "publisher.chain_failed",
                    publisher = self.config.label(),
                    chained = target.name(),
                    error = %err
                );
            }
        }

        report.reentrant = self.refused.replace(0);

        if report.dead_links > 0 && self.config.prune_dead_links {
            self.chain.borrow_mut().retain(ChainLink::is_live);
        }
    }

    fn deliver(&self, registration: &Registration<T>, state: &PartialState<T>) -> ListenerResult {
        if !self.config.catch_panics {
            return registration.call(state);
        }
        panic::catch_unwind(AssertUnwindSafe(|| registration.call(state)))
            .unwrap_or_else(|payload| Err(ListenerError::Panicked(panic_message(&*payload))))
    }

    fn invoke_chained(&self, target: &dyn Notify) -> ChainResult {
        if !self.config.catch_panics {
            return target.notify();
        }
        panic::catch_unwind(AssertUnwindSafe(|| target.notify()))
            .unwrap_or_else(|payload| Err(ChainError::Panicked(panic_message(&*payload))))
    }
}

impl<T> Notify for PublisherInner<T> {
    fn notify(&self) -> ChainResult {
        match self.run() {
            Ok(_) => Ok(()),
            Err(PublishError::Reentrant) => Err(ChainError::Reentrant),
            Err(PublishError::Producer { source, .. }) => Err(ChainError::Producer(source)),
            Err(other) => Err(ChainError::failed(other.to_string())),
        }
    }

    fn name(&self) -> &str {
        self.config.label()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
