//! [`Property`] definitions.

use std::sync::LazyLock;

use common::{
    define_kind,
    history::{self, Reason},
    unit, DateTime, DateTimeOf, History,
};
use derive_more::{AsRef, Display, Error, From, FromStr, Into};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{negotiation, Version};
#[cfg(doc)]
use crate::domain::Negotiation;

/// Real-estate unit tracked through listing, negotiation, maintenance and
/// inspection.
///
/// [`Status`] of a [`Property`] is never set directly: it changes only via
/// the named operations of this type, each appending to its [`History`].
#[derive(Clone, Debug)]
pub struct Property {
    /// ID of this [`Property`].
    pub id: Id,

    /// Unique [`Code`] of this [`Property`].
    pub code: Code,

    /// [`Address`] of this [`Property`].
    pub address: Address,

    /// [`Kind`] of this [`Property`].
    pub kind: Kind,

    /// [`DateTime`] when this [`Property`] was created.
    pub created_at: CreationDateTime,

    /// [`Version`] of this [`Property`].
    pub version: Version,

    /// Current [`Status`] of this [`Property`].
    status: Status,

    /// ID of the non-terminal [`Negotiation`] holding this [`Property`], if
    /// any.
    active_negotiation_id: Option<negotiation::Id>,

    /// Indicator whether this [`Property`] has open maintenance orders.
    has_open_maintenance: bool,

    /// Indicator whether this [`Property`] has open pending issues.
    has_open_pending: bool,

    /// [`ScheduledStatus`] to be applied later, if any.
    scheduled: Option<ScheduledStatus>,

    /// [`History`] of [`Status`] changes.
    history: History<Status>,
}

impl Property {
    /// Creates a new [`Property`] in the [`Status::Available`].
    #[must_use]
    pub fn new(
        code: Code,
        address: Address,
        kind: Kind,
        created_at: CreationDateTime,
    ) -> Self {
        Self {
            id: Id::new(),
            code,
            address,
            kind,
            created_at,
            version: Version::default(),
            status: Status::Available,
            active_negotiation_id: None,
            has_open_maintenance: false,
            has_open_pending: false,
            scheduled: None,
            history: History::starting_with(
                Status::Available,
                created_at.coerce(),
                "property registered",
            ),
        }
    }

    /// Returns the current [`Status`] of this [`Property`].
    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    /// Returns ID of the [`Negotiation`] holding this [`Property`], if any.
    #[must_use]
    pub fn active_negotiation_id(&self) -> Option<negotiation::Id> {
        self.active_negotiation_id
    }

    /// Indicates whether this [`Property`] has open maintenance orders.
    #[must_use]
    pub fn has_open_maintenance(&self) -> bool {
        self.has_open_maintenance
    }

    /// Indicates whether this [`Property`] has open pending issues.
    #[must_use]
    pub fn has_open_pending(&self) -> bool {
        self.has_open_pending
    }

    /// Indicates whether this [`Property`] is [`Status::Available`] despite
    /// having open pending issues.
    #[must_use]
    pub fn is_available_while_pending(&self) -> bool {
        self.has_open_pending && self.status == Status::Available
    }

    /// Returns the [`ScheduledStatus`] of this [`Property`], if any.
    #[must_use]
    pub fn scheduled(&self) -> Option<&ScheduledStatus> {
        self.scheduled.as_ref()
    }

    /// Returns the [`History`] of [`Status`] changes of this [`Property`].
    #[must_use]
    pub fn history(&self) -> &History<Status> {
        &self.history
    }

    /// Moves this [`Property`] into the provided [`Status`].
    ///
    /// Returns `false` without touching the [`History`] if this [`Property`]
    /// is in the provided [`Status`] already.
    pub fn change_status(
        &mut self,
        status: Status,
        reason: impl Into<Reason>,
        at: DateTime,
    ) -> bool {
        if self.status == status {
            return false;
        }
        self.status = status;
        self.history.append(status, at, reason);
        true
    }

    /// Links the [`Negotiation`] with the provided ID to this [`Property`] and
    /// moves it into [`Status::InNegotiation`].
    ///
    /// Linking the same [`Negotiation`] twice is allowed.
    ///
    /// # Errors
    ///
    /// With [`NegotiationConflict`] if this [`Property`] is linked to another
    /// [`Negotiation`] already.
    pub fn attach_negotiation(
        &mut self,
        id: negotiation::Id,
        at: DateTime,
    ) -> Result<bool, NegotiationConflict> {
        match self.active_negotiation_id {
            Some(active) if active != id => Err(NegotiationConflict {
                property_id: self.id,
                active,
            }),
            Some(_) | None => {
                let linked = self.active_negotiation_id.replace(id).is_none();
                let moved = self.change_status(
                    Status::InNegotiation,
                    "negotiation attached",
                    at,
                );
                Ok(linked || moved)
            }
        }
    }

    /// Unlinks the [`Negotiation`] with the provided ID from this [`Property`]
    /// and moves it into [`Status::Available`].
    ///
    /// Does nothing if this [`Property`] isn't linked to that [`Negotiation`].
    pub fn release_negotiation(
        &mut self,
        id: negotiation::Id,
        at: DateTime,
    ) -> bool {
        if self.active_negotiation_id != Some(id) {
            return false;
        }
        self.active_negotiation_id = None;
        _ = self.change_status(Status::Available, "negotiation released", at);
        true
    }

    /// Sets the open maintenance flag of this [`Property`].
    ///
    /// Returns whether the flag has changed.
    pub fn set_open_maintenance(&mut self, open: bool) -> bool {
        std::mem::replace(&mut self.has_open_maintenance, open) != open
    }

    /// Sets the open pending flag of this [`Property`].
    ///
    /// Returns whether the flag has changed.
    pub fn set_open_pending(&mut self, open: bool) -> bool {
        std::mem::replace(&mut self.has_open_pending, open) != open
    }

    /// Schedules the provided [`ScheduledStatus`], replacing the previous one,
    /// if any.
    pub fn schedule(&mut self, scheduled: ScheduledStatus) {
        self.scheduled = Some(scheduled);
    }

    /// Applies the [`ScheduledStatus`] of this [`Property`] if it's due at the
    /// provided moment.
    ///
    /// The schedule is consumed once due. It's discarded without any
    /// [`Status`] change if this [`Property`] has left the
    /// [`ScheduledStatus::expected`] one in the meantime.
    pub fn apply_scheduled(&mut self, now: DateTime) -> ScheduleOutcome {
        match self.scheduled.take() {
            None => ScheduleOutcome::Nothing,
            Some(s) if s.effective_at.coerce() > now => {
                self.scheduled = Some(s);
                ScheduleOutcome::NotDue
            }
            Some(ScheduledStatus {
                status,
                expected,
                reason,
                ..
            }) => {
                if self.status == expected {
                    _ = self.change_status(status, reason, now);
                    ScheduleOutcome::Applied
                } else {
                    ScheduleOutcome::Discarded
                }
            }
        }
    }
}

/// Error of linking a [`Negotiation`] to a [`Property`] held by another one.
#[derive(Clone, Copy, Debug, Display, Error)]
#[display(
    "`Property(id: {property_id})` is held by `Negotiation(id: {active})`"
)]
pub struct NegotiationConflict {
    /// ID of the [`Property`].
    pub property_id: Id,

    /// ID of the [`Negotiation`] holding the [`Property`].
    pub active: negotiation::Id,
}

/// [`Status`] change of a [`Property`] postponed until some moment.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScheduledStatus {
    /// [`Status`] to move the [`Property`] into.
    pub status: Status,

    /// [`Status`] the [`Property`] is expected to still be in.
    pub expected: Status,

    /// [`DateTime`] since which the change is due.
    pub effective_at: ScheduleDateTime,

    /// Reason of the change.
    pub reason: Reason,
}

/// Outcome of applying a [`ScheduledStatus`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScheduleOutcome {
    /// Nothing is scheduled.
    Nothing,

    /// Scheduled change is not due yet.
    NotDue,

    /// Scheduled change has been applied.
    Applied,

    /// Scheduled change has been dropped, since the [`Property`] left the
    /// expected [`Status`].
    Discarded,
}

/// ID of a [`Property`].
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

/// Unique code of a [`Property`] used by the back office staff.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(forward)]
pub struct Code(String);

impl Code {
    /// Creates a new [`Code`] if the given `code` is valid.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Option<Self> {
        let code = code.into();
        Self::check(&code).then_some(Self(code))
    }

    /// Checks whether the given `code` is a valid [`Code`].
    fn check(code: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Code`] invariants:
        /// - Must start with an uppercase letter or a digit;
        /// - Must contain only uppercase letters, digits and dashes;
        /// - Must be between 2 and 32 characters long.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[A-Z0-9][A-Z0-9-]{1,31}$").expect("valid regex")
        });

        REGEX.is_match(code.as_ref())
    }
}

impl FromStr for Code {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Code`")
    }
}

/// Full address of a [`Property`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(forward)]
pub struct Address(String);

impl Address {
    /// Creates a new [`Address`] if the given `address` is valid.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Option<Self> {
        let address = address.into();
        Self::check(&address).then_some(Self(address))
    }

    /// Checks whether the given `address` is a valid [`Address`].
    fn check(address: impl AsRef<str>) -> bool {
        let address = address.as_ref();
        address.trim() == address && !address.is_empty() && address.len() <= 512
    }
}

impl FromStr for Address {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Address`")
    }
}

define_kind! {
    #[doc = "Kind of a [`Property`]."]
    enum Kind {
        #[doc = "An apartment in a building."]
        Apartment = 1,

        #[doc = "A detached house."]
        House = 2,

        #[doc = "A commercial unit."]
        Commercial = 3,

        #[doc = "A land plot."]
        Land = 4,
    }
}

define_kind! {
    #[doc = "Availability status of a [`Property`]."]
    enum Status {
        #[doc = "Can be offered to clients."]
        Available = 1,

        #[doc = "Will become available after the move-out inspection."]
        ScheduledForAvailability = 2,

        #[doc = "Held by an active [`Negotiation`]."]
        InNegotiation = 3,

        #[doc = "Undergoing maintenance."]
        InMaintenance = 4,

        #[doc = "Blocked by pending issues or obligations."]
        Unavailable = 5,

        #[doc = "Awaiting the inspection after a tenant moved out."]
        InMoveOutInspection = 6,
    }
}

/// Single [`Status`] change recorded in the [`History`] of a [`Property`].
pub type HistoryEntry = history::Entry<Status>;

/// [`DateTime`] when a [`Property`] was created.
pub type CreationDateTime = DateTimeOf<(Property, unit::Creation)>;

/// Marker type indicating a postponed [`Property`] [`Status`] change.
#[derive(Clone, Copy, Debug)]
pub struct Schedule;

/// [`DateTime`] when a [`ScheduledStatus`] becomes due.
pub type ScheduleDateTime = DateTimeOf<(Property, Schedule)>;

/// Marker type indicating a tenant moving out of a [`Property`].
#[derive(Clone, Copy, Debug)]
pub struct MoveOut;

/// [`DateTime`] when a tenant moves out of a [`Property`].
pub type MoveOutDateTime = DateTimeOf<(Property, MoveOut)>;

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::DateTime;

    use crate::domain::negotiation;

    use super::{
        Address, Code, Kind, Property, ScheduleOutcome, ScheduledStatus,
        Status,
    };

    fn at(s: &str) -> DateTime {
        DateTime::from_rfc3339(s).unwrap()
    }

    fn property() -> Property {
        Property::new(
            Code::new("APT-101").unwrap(),
            Address::new("Rua das Flores, 10").unwrap(),
            Kind::Apartment,
            at("2024-01-01T00:00:00Z").coerce(),
        )
    }

    #[test]
    fn validates_code() {
        assert!(Code::new("APT-101").is_some());
        assert!(Code::new("7B").is_some());
        assert!(Code::new("apt-101").is_none());
        assert!(Code::new("-APT").is_none());
        assert!(Code::new("A").is_none());
        assert!(Code::new("A".repeat(33)).is_none());
    }

    #[test]
    fn starts_available_with_history() {
        let p = property();

        assert_eq!(p.status(), Status::Available);
        assert_eq!(p.history().len(), 1);
        assert_eq!(p.history().entries()[0].state, Status::Available);
        assert!(p.active_negotiation_id().is_none());
    }

    #[test]
    fn change_status_is_idempotent() {
        let mut p = property();
        let now = at("2024-01-02T00:00:00Z");

        assert!(p.change_status(Status::InMaintenance, "leak", now));
        assert!(!p.change_status(Status::InMaintenance, "leak", now));
        assert!(!p.change_status(Status::InMaintenance, "other", now));

        assert_eq!(p.history().len(), 2);
        assert_eq!(p.history().last().unwrap().reason.as_str(), "leak");
    }

    #[test]
    fn attaches_same_negotiation_twice() {
        let mut p = property();
        let now = at("2024-01-02T00:00:00Z");
        let n = negotiation::Id::new();

        assert!(p.attach_negotiation(n, now).unwrap());
        assert!(!p.attach_negotiation(n, now).unwrap());

        assert_eq!(p.active_negotiation_id(), Some(n));
        assert_eq!(p.status(), Status::InNegotiation);
        assert_eq!(p.history().len(), 2);
    }

    #[test]
    fn rejects_another_negotiation() {
        let mut p = property();
        let now = at("2024-01-02T00:00:00Z");
        let first = negotiation::Id::new();
        _ = p.attach_negotiation(first, now).unwrap();

        let err = p.attach_negotiation(negotiation::Id::new(), now).unwrap_err();

        assert_eq!(err.active, first);
        assert_eq!(p.active_negotiation_id(), Some(first));
    }

    #[test]
    fn releases_only_linked_negotiation() {
        let mut p = property();
        let now = at("2024-01-02T00:00:00Z");
        let n = negotiation::Id::new();
        _ = p.attach_negotiation(n, now).unwrap();

        assert!(!p.release_negotiation(negotiation::Id::new(), now));
        assert_eq!(p.status(), Status::InNegotiation);

        assert!(p.release_negotiation(n, now));
        assert!(p.active_negotiation_id().is_none());
        assert_eq!(p.status(), Status::Available);
        assert!(!p.release_negotiation(n, now));
        assert_eq!(p.history().len(), 3);
    }

    #[test]
    fn applies_scheduled_status_when_due() {
        let mut p = property();
        let now = at("2024-02-01T00:00:00Z");
        _ = p.change_status(Status::InMoveOutInspection, "move-out", now);
        p.schedule(ScheduledStatus {
            status: Status::ScheduledForAvailability,
            expected: Status::InMoveOutInspection,
            effective_at: (now + Duration::from_secs(86_400)).coerce(),
            reason: "move-out inspection window over".into(),
        });

        assert_eq!(p.apply_scheduled(now), ScheduleOutcome::NotDue);
        assert_eq!(p.status(), Status::InMoveOutInspection);

        let later = now + Duration::from_secs(2 * 86_400);
        assert_eq!(p.apply_scheduled(later), ScheduleOutcome::Applied);
        assert_eq!(p.status(), Status::ScheduledForAvailability);
        assert!(p.scheduled().is_none());
        assert_eq!(p.apply_scheduled(later), ScheduleOutcome::Nothing);
    }

    #[test]
    fn discards_schedule_if_status_moved_on() {
        let mut p = property();
        let now = at("2024-02-01T00:00:00Z");
        _ = p.change_status(Status::InMoveOutInspection, "move-out", now);
        p.schedule(ScheduledStatus {
            status: Status::ScheduledForAvailability,
            expected: Status::InMoveOutInspection,
            effective_at: now.coerce(),
            reason: "move-out inspection window over".into(),
        });
        _ = p.change_status(Status::InMaintenance, "broken boiler", now);

        assert_eq!(p.apply_scheduled(now), ScheduleOutcome::Discarded);
        assert_eq!(p.status(), Status::InMaintenance);
        assert!(p.scheduled().is_none());
    }
}
