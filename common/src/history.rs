//! Append-only [`History`] of state transitions.

use std::{borrow::Cow, slice};

use derive_more::Display;

use crate::DateTime;

/// Append-only log of the states an entity went through.
///
/// There is no way to remove or rewrite an [`Entry`] once it's appended, so
/// the length of a [`History`] never decreases. Entities keep their
/// [`History`] private and expose it by shared reference only.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct History<S> {
    /// [`Entry`]s in the order they were appended.
    entries: Vec<Entry<S>>,
}

impl<S> History<S> {
    /// Creates a new [`History`] starting with the provided `state`.
    #[must_use]
    pub fn starting_with(
        state: S,
        at: DateTime,
        reason: impl Into<Reason>,
    ) -> Self {
        Self {
            entries: vec![Entry {
                state,
                at,
                reason: reason.into(),
            }],
        }
    }

    /// Appends a new [`Entry`] to this [`History`].
    pub fn append(&mut self, state: S, at: DateTime, reason: impl Into<Reason>) {
        self.entries.push(Entry {
            state,
            at,
            reason: reason.into(),
        });
    }

    /// Returns all the [`Entry`]s of this [`History`], oldest first.
    #[must_use]
    pub fn entries(&self) -> &[Entry<S>] {
        &self.entries
    }

    /// Returns an iterator over the [`Entry`]s of this [`History`], oldest
    /// first.
    pub fn iter(&self) -> slice::Iter<'_, Entry<S>> {
        self.entries.iter()
    }

    /// Returns the most recent [`Entry`] of this [`History`].
    #[must_use]
    pub fn last(&self) -> Option<&Entry<S>> {
        self.entries.last()
    }

    /// Returns the number of [`Entry`]s in this [`History`].
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Indicates whether this [`History`] has no [`Entry`]s.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'h, S> IntoIterator for &'h History<S> {
    type Item = &'h Entry<S>;
    type IntoIter = slice::Iter<'h, Entry<S>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Single transition recorded in a [`History`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Entry<S> {
    /// State entered by this transition.
    pub state: S,

    /// [`DateTime`] when the state was entered.
    pub at: DateTime,

    /// [`Reason`] of the transition.
    pub reason: Reason,
}

/// Human-readable reason of a transition.
#[derive(Clone, Debug, Display, Eq, Hash, PartialEq)]
pub struct Reason(Cow<'static, str>);

impl Reason {
    /// Returns this [`Reason`] as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Reason {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<&'static str> for Reason {
    fn from(reason: &'static str) -> Self {
        Self(Cow::Borrowed(reason))
    }
}

impl From<String> for Reason {
    fn from(reason: String) -> Self {
        Self(Cow::Owned(reason))
    }
}

#[cfg(test)]
mod spec {
    use crate::DateTime;

    use super::History;

    #[test]
    fn appends_in_order() {
        let at = DateTime::from_rfc3339("2024-05-01T10:00:00Z").unwrap();
        let mut history = History::starting_with(1, at, "created");
        history.append(2, at, "moved");
        history.append(3, at, String::from("moved again"));

        assert_eq!(history.len(), 3);
        assert_eq!(
            history.iter().map(|e| e.state).collect::<Vec<_>>(),
            [1, 2, 3],
        );
        assert_eq!(history.last().unwrap().reason.as_str(), "moved again");
        assert_eq!(history.entries()[0].reason.as_str(), "created");
    }
}
