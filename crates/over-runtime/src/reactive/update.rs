#![forbid(unsafe_code)]

//! Producer output and the single-key state handed to listeners.

use std::rc::Rc;

use super::registration::FieldName;

/// What a producer returns on each call.
///
/// `Skipped` suppresses delivery for that notification cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Update<T> {
    /// A fresh value to push to listeners.
    Produced(T),
    /// Nothing to deliver this time.
    Skipped,
}

impl<T> Update<T> {
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    #[must_use]
    pub fn is_produced(&self) -> bool {
        matches!(self, Self::Produced(_))
    }

    /// Borrow the produced value.
    #[must_use]
    pub fn produced(&self) -> Option<&T> {
        match self {
            Self::Produced(value) => Some(value),
            Self::Skipped => None,
        }
    }

    #[must_use]
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Produced(value) => Some(value),
            Self::Skipped => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Update<U> {
        match self {
            Self::Produced(value) => Update::Produced(f(value)),
            Self::Skipped => Update::Skipped,
        }
    }
}

impl<T> From<Option<T>> for Update<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::Produced(value),
            None => Self::Skipped,
        }
    }
}

/// The `{ field: value }` object a listener merges into its component state.
///
/// All listeners of one notification cycle share the same produced value;
/// cloning a `PartialState` clones an `Rc`, not the value.
#[derive(Debug, PartialEq, Eq)]
pub struct PartialState<T> {
    field: FieldName,
    value: Rc<T>,
}

impl<T> Clone for PartialState<T> {
    fn clone(&self) -> Self {
        Self {
            field: self.field.clone(),
            value: Rc::clone(&self.value),
        }
    }
}

impl<T> PartialState<T> {
    pub(crate) fn new(field: FieldName, value: Rc<T>) -> Self {
        Self { field, value }
    }

    /// Key the value is stored under.
    #[must_use]
    pub fn field(&self) -> &FieldName {
        &self.field
    }

    #[must_use]
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Shared handle to the produced value.
    #[must_use]
    pub fn shared(&self) -> Rc<T> {
        Rc::clone(&self.value)
    }

    #[must_use]
    pub fn into_parts(self) -> (FieldName, Rc<T>) {
        (self.field, self.value)
    }
}

impl<T: Clone> PartialState<T> {
    /// Owned `(field, value)` pair, ready to merge into a state map.
    #[must_use]
    pub fn to_pair(&self) -> (String, T) {
        (self.field.to_string(), T::clone(&self.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_accessors() {
        let produced = Update::Produced(3);
        assert!(produced.is_produced());
        assert!(!produced.is_skipped());
        assert_eq!(produced.produced(), Some(&3));
        assert_eq!(produced.map(|v| v * 2).into_option(), Some(6));

        let skipped: Update<i32> = Update::Skipped;
        assert!(skipped.is_skipped());
        assert_eq!(skipped.produced(), None);
        assert_eq!(skipped.into_option(), None);
    }

    #[test]
    fn update_from_option() {
        assert_eq!(Update::from(Some("x")), Update::Produced("x"));
        assert_eq!(Update::<&str>::from(None), Update::Skipped);
    }

    #[test]
    fn partial_state_shares_value() {
        let field = FieldName::new("data").expect("non-empty");
        let value = Rc::new(vec![1, 2, 3]);
        let a = PartialState::new(field.clone(), Rc::clone(&value));
        let b = a.clone();

        assert_eq!(a.field().as_str(), "data");
        assert_eq!(b.value(), &vec![1, 2, 3]);
        assert!(Rc::ptr_eq(&a.shared(), &b.shared()));
        assert_eq!(a.to_pair(), ("data".to_string(), vec![1, 2, 3]));

        let (f, v) = b.into_parts();
        assert_eq!(f, field);
        assert!(Rc::ptr_eq(&v, &value));
    }
}
