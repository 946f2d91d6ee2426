#![forbid(unsafe_code)]

//! over public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users.
//!
//! ```
//! use over::prelude::*;
//!
//! let publisher = Publisher::new(|| Update::Produced("ready"));
//! let (id, initial) = publisher
//!     .register(|_| Ok(()), "status", false)
//!     .expect("valid field name");
//! assert_eq!(initial, Some(Update::Produced("ready")));
//! assert!(publisher.unregister(id));
//! ```

pub use over_runtime::{
    ChainError, FieldName, ListenerError, Notify, NotifyReport, PartialState, ProducerError,
    PublishError, Publisher, PublisherConfig, RegistrationId, Update, notify_fn, try_notify_fn,
};

pub mod prelude {
    pub use over_runtime as runtime;
    pub use over_runtime::{
        ListenerError, Notify, PartialState, PublishError, Publisher, PublisherConfig, Update,
        notify_fn,
    };
}

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn prelude_covers_chaining() {
        let hits = Rc::new(Cell::new(0u32));
        let h = Rc::clone(&hits);
        let target = notify_fn("hits", move || h.set(h.get() + 1));
        let publisher = Publisher::with_config(
            PublisherConfig::default().with_name("facade"),
            || Update::Produced(1u8),
        );
        publisher.register_callback(&target);

        let report = publisher.notify().expect("notify");

        assert_eq!(report.chained, 1);
        assert_eq!(hits.get(), 1);
        assert_eq!(runtime::config::DEFAULT_ID_SEED, 111);
    }
}
