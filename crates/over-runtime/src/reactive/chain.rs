#![forbid(unsafe_code)]

//! Chained notify targets.
//!
//! A publisher can fan its `notify()` out to other publishers (or anything
//! implementing [`Notify`]) before computing its own value. Chain entries are
//! held as `Weak` references: the upstream publisher never keeps a downstream
//! target alive, and entries whose target is gone are skipped.
//!
//! # Invariants
//!
//! 1. Entries are not deduplicated; chaining the same target twice notifies
//!    it twice.
//! 2. Identity is the target allocation, not its type: two `Rc` clones of the
//!    same target are the same entry.

use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::ChainResult;

/// Something that can be notified with no arguments.
///
/// [`Publisher`](super::Publisher) implements this through
/// [`as_notify`](super::Publisher::as_notify), which is how publishers chain
/// into each other.
pub trait Notify {
    /// Run a notification. Failures are reported, never propagated further
    /// than the upstream publisher's log.
    fn notify(&self) -> ChainResult;

    /// Name used in logs.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Wrap an infallible closure as a chain target.
///
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use over_runtime::reactive::{Publisher, Update, notify_fn};
///
/// let hits = Rc::new(Cell::new(0));
/// let counter = Rc::clone(&hits);
/// let target = notify_fn("counter", move || counter.set(counter.get() + 1));
///
/// let publisher = Publisher::new(|| Update::Produced(1));
/// publisher.register_callback(&target);
/// publisher.notify().expect("producer is infallible");
/// assert_eq!(hits.get(), 1);
/// ```
pub fn notify_fn(name: &'static str, f: impl Fn() + 'static) -> Rc<dyn Notify> {
    Rc::new(FnNotify {
        name,
        f: move || {
            f();
            Ok(())
        },
    })
}

/// Wrap a fallible closure as a chain target.
pub fn try_notify_fn(name: &'static str, f: impl Fn() -> ChainResult + 'static) -> Rc<dyn Notify> {
    Rc::new(FnNotify { name, f })
}

struct FnNotify<F> {
    name: &'static str,
    f: F,
}

impl<F> Notify for FnNotify<F>
where
    F: Fn() -> ChainResult,
{
    fn notify(&self) -> ChainResult {
        (self.f)()
    }

    fn name(&self) -> &str {
        self.name
    }
}

/// One entry of a publisher's chain list.
#[derive(Clone)]
pub(crate) struct ChainLink {
    target: Weak<dyn Notify>,
}

impl fmt::Debug for ChainLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainLink")
            .field("live", &self.is_live())
            .finish()
    }
}

impl ChainLink {
    pub(crate) fn new(target: &Rc<dyn Notify>) -> Self {
        Self {
            target: Rc::downgrade(target),
        }
    }

    pub(crate) fn upgrade(&self) -> Option<Rc<dyn Notify>> {
        self.target.upgrade()
    }

    pub(crate) fn is_live(&self) -> bool {
        self.target.strong_count() > 0
    }

    /// Whether this entry refers to the same allocation as `target`.
    pub(crate) fn points_to(&self, target: &Rc<dyn Notify>) -> bool {
        std::ptr::addr_eq(self.target.as_ptr(), Rc::as_ptr(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChainError;
    use std::cell::Cell;

    #[test]
    fn notify_fn_runs_closure() {
        let hits = Rc::new(Cell::new(0u32));
        let h = Rc::clone(&hits);
        let target = notify_fn("hits", move || h.set(h.get() + 1));

        assert_eq!(target.notify(), Ok(()));
        assert_eq!(target.notify(), Ok(()));
        assert_eq!(hits.get(), 2);
        assert_eq!(target.name(), "hits");
    }

    #[test]
    fn try_notify_fn_reports_failure() {
        let target = try_notify_fn("broken", || Err(ChainError::failed("nope")));
        assert_eq!(target.notify(), Err(ChainError::Failed("nope".into())));
    }

    #[test]
    fn link_does_not_keep_target_alive() {
        let target = notify_fn("t", || {});
        let link = ChainLink::new(&target);
        assert!(link.is_live());
        assert!(link.upgrade().is_some());

        drop(target);
        assert!(!link.is_live());
        assert!(link.upgrade().is_none());
    }

    #[test]
    fn link_identity_is_by_allocation() {
        let a = notify_fn("a", || {});
        let a_again = Rc::clone(&a);
        let b = notify_fn("a", || {});
        let link = ChainLink::new(&a);

        assert!(link.points_to(&a));
        assert!(link.points_to(&a_again));
        assert!(!link.points_to(&b));
    }

    #[test]
    fn default_name_is_type_name() {
        struct Plain;
        impl Notify for Plain {
            fn notify(&self) -> ChainResult {
                Ok(())
            }
        }
        assert!(Plain.name().ends_with("Plain"));
    }
}
