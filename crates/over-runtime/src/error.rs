#![forbid(unsafe_code)]

//! Error types for publishing.
//!
//! Only producer faults surface to the owner. Listener and chain faults are
//! caught per callback, logged, and counted in the
//! [`NotifyReport`](crate::reactive::NotifyReport).

use std::any::Any;

use thiserror::Error;

use crate::reactive::RegistrationId;

pub type Result<T> = std::result::Result<T, PublishError>;

/// Outcome of one listener invocation.
pub type ListenerResult = std::result::Result<(), ListenerError>;

/// Outcome of one chained invocation.
pub type ChainResult = std::result::Result<(), ChainError>;

/// Errors returned to the owner of a publisher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    #[error("field name must not be empty")]
    EmptyFieldName,

    #[error("registration ids exhausted (last id {last})")]
    IdsExhausted { last: u64 },

    /// `notify()` was called on a publisher that is still running its own
    /// chain phase. The nested call is refused instead of recursing.
    #[error("publisher is already running its chain phase")]
    Reentrant,

    /// The producer failed. `registration` is set when the failure came from
    /// the initial value of `register`; that registration stays in place.
    #[error("producer failed: {source}")]
    Producer {
        #[source]
        source: ProducerError,
        registration: Option<RegistrationId>,
    },
}

impl PublishError {
    /// The producer error, if this is one.
    #[must_use]
    pub fn producer(&self) -> Option<&ProducerError> {
        match self {
            Self::Producer { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Failure reported by a fallible producer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProducerError {
    message: String,
}

impl ProducerError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Failure raised by a listener callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListenerError {
    #[error("listener failed: {0}")]
    Failed(String),

    #[error("listener panicked: {0}")]
    Panicked(String),
}

impl ListenerError {
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Failure raised by a chained notify target.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("chained notify failed: {0}")]
    Failed(String),

    #[error("chained notify panicked: {0}")]
    Panicked(String),

    /// The target is already running its own chain phase (a chain cycle).
    #[error("chained publisher is already notifying")]
    Reentrant,

    #[error("chained producer failed: {0}")]
    Producer(#[from] ProducerError),
}

impl ChainError {
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Best-effort text for a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            PublishError::EmptyFieldName.to_string(),
            "field name must not be empty"
        );
        let err = PublishError::Producer {
            source: ProducerError::new("db offline"),
            registration: None,
        };
        assert_eq!(err.to_string(), "producer failed: db offline");
        assert_eq!(err.producer().map(ProducerError::message), Some("db offline"));
        assert_eq!(
            ListenerError::failed("bad state").to_string(),
            "listener failed: bad state"
        );
        assert_eq!(
            ChainError::Reentrant.to_string(),
            "chained publisher is already notifying"
        );
    }

    #[test]
    fn producer_error_converts_into_chain_error() {
        let err: ChainError = ProducerError::new("boom").into();
        assert_eq!(err, ChainError::Producer(ProducerError::new("boom")));
    }

    #[test]
    fn panic_payloads() {
        let caught = std::panic::catch_unwind(|| panic!("static str")).unwrap_err();
        assert_eq!(panic_message(&*caught), "static str");

        let caught = std::panic::catch_unwind(|| panic!("formatted {}", 7)).unwrap_err();
        assert_eq!(panic_message(&*caught), "formatted 7");

        let caught = std::panic::catch_unwind(|| std::panic::panic_any(42u8)).unwrap_err();
        assert_eq!(panic_message(&*caught), "non-string panic payload");
    }
}
