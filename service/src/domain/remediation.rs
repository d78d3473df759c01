//! [`Remediation`] definitions.

use common::{define_kind, unit, DateTime, DateTimeOf};
use derive_more::{Display, From, FromStr, Into};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{maintenance::Description, property, Version};
#[cfg(doc)]
use crate::domain::Property;

/// Follow-up task to be done about a [`Property`] before some deadline.
///
/// Overdue [`Kind::PendingIssue`] remediations make their [`Property`]
/// pending.
#[derive(Clone, Debug)]
pub struct Remediation {
    /// ID of this [`Remediation`].
    pub id: Id,

    /// ID of the [`Property`] this [`Remediation`] is about.
    pub property_id: property::Id,

    /// [`Kind`] of this [`Remediation`].
    pub kind: Kind,

    /// [`Description`] of this [`Remediation`].
    pub description: Description,

    /// [`DateTime`] before which this [`Remediation`] should be resolved.
    pub due_at: DueDateTime,

    /// [`Status`] of this [`Remediation`].
    pub status: Status,

    /// [`DateTime`] when this [`Remediation`] was created.
    pub created_at: CreationDateTime,

    /// [`Version`] of this [`Remediation`].
    pub version: Version,
}

impl Remediation {
    /// Creates a new [`Status::Open`] [`Remediation`].
    #[must_use]
    pub fn new(
        property_id: property::Id,
        kind: Kind,
        description: Description,
        due_at: DueDateTime,
        created_at: CreationDateTime,
    ) -> Self {
        Self {
            id: Id::new(),
            property_id,
            kind,
            description,
            due_at,
            status: Status::Open,
            created_at,
            version: Version::default(),
        }
    }

    /// Indicates whether this [`Remediation`] is still open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == Status::Open
    }

    /// Indicates whether this [`Remediation`] is open past its due date at
    /// the provided moment.
    #[must_use]
    pub fn is_overdue(&self, now: DateTime) -> bool {
        self.is_open() && self.due_at.coerce() < now
    }

    /// Indicates whether this [`Remediation`] makes its [`Property`] pending
    /// at the provided moment.
    #[must_use]
    pub fn is_pending_issue(&self, now: DateTime) -> bool {
        self.kind == Kind::PendingIssue && self.is_overdue(now)
    }

    /// Moves this [`Remediation`] into the provided terminal [`Status`].
    ///
    /// Returns `false` if it's not open anymore.
    pub fn close(&mut self, status: Status) -> bool {
        if !self.is_open() || status == Status::Open {
            return false;
        }
        self.status = status;
        true
    }
}

/// ID of a [`Remediation`].
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

define_kind! {
    #[doc = "Kind of a [`Remediation`]."]
    enum Kind {
        #[doc = "Issue blocking the [`Property`] once overdue."]
        PendingIssue = 1,

        #[doc = "Routine task never blocking the [`Property`]."]
        Routine = 2,
    }
}

define_kind! {
    #[doc = "Status of a [`Remediation`]."]
    enum Status {
        #[doc = "Remains to be done."]
        Open = 1,

        #[doc = "Done."]
        Resolved = 2,

        #[doc = "Won't be done."]
        Cancelled = 3,
    }
}

/// [`DateTime`] when a [`Remediation`] was created.
pub type CreationDateTime = DateTimeOf<(Remediation, unit::Creation)>;

/// Marker type indicating a [`Remediation`] deadline.
#[derive(Clone, Copy, Debug)]
pub struct Due;

/// [`DateTime`] before which a [`Remediation`] should be resolved.
pub type DueDateTime = DateTimeOf<(Remediation, Due)>;
