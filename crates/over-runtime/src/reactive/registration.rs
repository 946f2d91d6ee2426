#![forbid(unsafe_code)]

//! Listener registrations.
//!
//! A [`Registration`] binds one listener callback and the field name it
//! wants values under to a [`RegistrationId`]. Ids come from a per-publisher
//! [`IdCounter`] that only moves forward, so an id is never reused while the
//! publisher lives.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::error::{ListenerResult, PublishError};

use super::update::PartialState;

/// Identifier returned by `register`, used later to `unregister`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistrationId(u64);

impl RegistrationId {
    /// Create an id from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw id value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Non-empty name of the component field a value is delivered under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldName(Rc<str>);

impl FieldName {
    /// Validate and wrap a field name.
    ///
    /// # Errors
    ///
    /// [`PublishError::EmptyFieldName`] if `name` is empty.
    pub fn new(name: impl AsRef<str>) -> Result<Self, PublishError> {
        let name = name.as_ref();
        if name.is_empty() {
            return Err(PublishError::EmptyFieldName);
        }
        Ok(Self(Rc::from(name)))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for FieldName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for FieldName {
    type Error = PublishError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for FieldName {
    type Error = PublishError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Listener callback as stored by the publisher.
pub(crate) type Listener<T> = Rc<dyn Fn(&PartialState<T>) -> ListenerResult>;

/// One listening component.
pub(crate) struct Registration<T> {
    id: RegistrationId,
    field: FieldName,
    listener: Listener<T>,
}

impl<T> Clone for Registration<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            field: self.field.clone(),
            listener: Rc::clone(&self.listener),
        }
    }
}

impl<T> fmt::Debug for Registration<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("field", &self.field)
            .finish_non_exhaustive()
    }
}

impl<T> Registration<T> {
    pub(crate) fn new(id: RegistrationId, field: FieldName, listener: Listener<T>) -> Self {
        Self {
            id,
            field,
            listener,
        }
    }

    pub(crate) fn id(&self) -> RegistrationId {
        self.id
    }

    pub(crate) fn field(&self) -> &FieldName {
        &self.field
    }

    pub(crate) fn call(&self, state: &PartialState<T>) -> ListenerResult {
        (self.listener)(state)
    }
}

/// Increment-then-use id source.
#[derive(Debug)]
pub(crate) struct IdCounter {
    last: Cell<u64>,
}

impl IdCounter {
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            last: Cell::new(seed),
        }
    }

    pub(crate) fn next(&self) -> Result<RegistrationId, PublishError> {
        let last = self.last.get();
        let next = last
            .checked_add(1)
            .ok_or(PublishError::IdsExhausted { last })?;
        self.last.set(next);
        Ok(RegistrationId(next))
    }

    pub(crate) fn last(&self) -> u64 {
        self.last.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_name_rejects_empty() {
        assert_eq!(FieldName::new(""), Err(PublishError::EmptyFieldName));
        assert_eq!(
            FieldName::try_from(String::new()),
            Err(PublishError::EmptyFieldName)
        );
        let name = FieldName::try_from("data").expect("non-empty");
        assert_eq!(name.as_str(), "data");
        assert_eq!(name.to_string(), "data");
    }

    #[test]
    fn counter_increments_then_uses() {
        let ids = IdCounter::new(111);
        assert_eq!(ids.next(), Ok(RegistrationId::new(112)));
        assert_eq!(ids.next(), Ok(RegistrationId::new(113)));
        assert_eq!(ids.last(), 113);
    }

    #[test]
    fn counter_reports_exhaustion() {
        let ids = IdCounter::new(u64::MAX - 1);
        assert_eq!(ids.next().map(RegistrationId::raw), Ok(u64::MAX));
        assert_eq!(
            ids.next(),
            Err(PublishError::IdsExhausted { last: u64::MAX })
        );
        // A failed allocation leaves the counter where it was.
        assert_eq!(ids.last(), u64::MAX);
    }

    #[test]
    fn registration_clone_shares_listener() {
        let listener: Listener<i32> = Rc::new(|_: &PartialState<i32>| -> ListenerResult { Ok(()) });
        let reg = Registration::new(
            RegistrationId::new(5),
            FieldName::new("n").expect("non-empty"),
            listener,
        );
        let copy = reg.clone();
        assert!(Rc::ptr_eq(&reg.listener, &copy.listener));
        assert_eq!(copy.id(), RegistrationId::new(5));
        assert!(format!("{reg:?}").contains("Registration"));
    }
}
