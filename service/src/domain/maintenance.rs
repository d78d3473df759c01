//! Maintenance [`Order`] definitions.

use common::{unit, DateTime, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{property, Version};
#[cfg(doc)]
use crate::domain::Property;

/// Work order keeping a [`Property`] in maintenance while open.
#[derive(Clone, Debug)]
pub struct Order {
    /// ID of this [`Order`].
    pub id: Id,

    /// ID of the [`Property`] this [`Order`] is about.
    pub property_id: property::Id,

    /// [`Description`] of the work to be done.
    pub description: Description,

    /// [`DateTime`] when this [`Order`] was opened.
    pub opened_at: CreationDateTime,

    /// [`DateTime`] when this [`Order`] was closed, if it was.
    pub closed_at: Option<ClosureDateTime>,

    /// [`Version`] of this [`Order`].
    pub version: Version,
}

impl Order {
    /// Opens a new [`Order`] for the provided [`Property`].
    #[must_use]
    pub fn open(
        property_id: property::Id,
        description: Description,
        opened_at: CreationDateTime,
    ) -> Self {
        Self {
            id: Id::new(),
            property_id,
            description,
            opened_at,
            closed_at: None,
            version: Version::default(),
        }
    }

    /// Indicates whether this [`Order`] is still open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }

    /// Closes this [`Order`].
    ///
    /// Returns `false` if it's been closed already.
    pub fn close(&mut self, at: DateTime) -> bool {
        if self.closed_at.is_some() {
            return false;
        }
        self.closed_at = Some(at.coerce());
        true
    }
}

/// ID of a maintenance [`Order`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Description of a maintenance [`Order`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(forward)]
pub struct Description(String);

impl Description {
    /// Creates a new [`Description`] if the given `description` is valid.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Option<Self> {
        let description = description.into();
        Self::check(&description).then_some(Self(description))
    }

    /// Checks whether the given `description` is a valid [`Description`].
    fn check(description: impl AsRef<str>) -> bool {
        let description = description.as_ref();
        description.trim() == description
            && !description.is_empty()
            && description.len() <= 512
    }
}

impl FromStr for Description {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Description`")
    }
}

/// [`DateTime`] when a maintenance [`Order`] was opened.
pub type CreationDateTime = DateTimeOf<(Order, unit::Creation)>;

/// [`DateTime`] when a maintenance [`Order`] was closed.
pub type ClosureDateTime = DateTimeOf<(Order, unit::Closure)>;
