//! [`FinancialEntry`] definitions.

use common::{
    define_kind,
    history::{self, Reason},
    unit, DateTime, DateTimeOf, History, Money,
};
use derive_more::{Display, Error, From, FromStr, Into};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{property, Version};
#[cfg(doc)]
use crate::domain::Property;

/// Financial obligation (deposit, rent, fee) related to a [`Property`].
///
/// An entry with [`FinancialEntry::blocks_availability()`] keeps its
/// [`Property`] unavailable until the entry reaches a terminal [`Status`].
#[derive(Clone, Debug)]
pub struct FinancialEntry {
    /// ID of this [`FinancialEntry`].
    pub id: Id,

    /// ID of the [`Property`] this [`FinancialEntry`] refers to.
    pub reference_id: property::Id,

    /// [`Kind`] of this [`FinancialEntry`].
    pub kind: Kind,

    /// Amount of this [`FinancialEntry`].
    pub amount: Money,

    /// [`DateTime`] when this [`FinancialEntry`] is due.
    pub due_at: DueDateTime,

    /// [`DateTime`] when this [`FinancialEntry`] was created.
    pub created_at: CreationDateTime,

    /// [`Version`] of this [`FinancialEntry`].
    pub version: Version,

    /// Indicator whether this [`FinancialEntry`] blocks its [`Property`].
    blocks_availability: bool,

    /// Current [`Status`] of this [`FinancialEntry`].
    status: Status,

    /// [`DateTime`] when this [`FinancialEntry`] was paid, if it was.
    paid_at: Option<PaymentDateTime>,

    /// [`History`] of [`Status`] changes.
    history: History<Status>,
}

impl FinancialEntry {
    /// Creates a new [`Status::Pending`] [`FinancialEntry`].
    #[must_use]
    pub fn new(
        reference_id: property::Id,
        kind: Kind,
        amount: Money,
        due_at: DueDateTime,
        blocks_availability: bool,
        created_at: CreationDateTime,
    ) -> Self {
        Self {
            id: Id::new(),
            reference_id,
            kind,
            amount,
            due_at,
            created_at,
            version: Version::default(),
            blocks_availability,
            status: Status::Pending,
            paid_at: None,
            history: History::starting_with(
                Status::Pending,
                created_at.coerce(),
                "entry registered",
            ),
        }
    }

    /// Indicates whether this [`FinancialEntry`] was created as blocking its
    /// [`Property`].
    #[must_use]
    pub fn blocks_availability(&self) -> bool {
        self.blocks_availability
    }

    /// Returns the current [`Status`] of this [`FinancialEntry`].
    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    /// Returns [`DateTime`] when this [`FinancialEntry`] was paid, if it was.
    #[must_use]
    pub fn paid_at(&self) -> Option<PaymentDateTime> {
        self.paid_at
    }

    /// Returns the [`History`] of [`Status`] changes of this
    /// [`FinancialEntry`].
    #[must_use]
    pub fn history(&self) -> &History<Status> {
        &self.history
    }

    /// Indicates whether this [`FinancialEntry`] currently blocks its
    /// [`Property`].
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        self.blocks_availability && !self.status.is_terminal()
    }

    /// Marks this [`FinancialEntry`] as [`Status::Received`].
    ///
    /// Returns `false` if it's been received already.
    ///
    /// # Errors
    ///
    /// With a [`TransitionError`] if this [`FinancialEntry`] is cancelled.
    pub fn receive(
        &mut self,
        paid_at: PaymentDateTime,
        at: DateTime,
    ) -> Result<bool, TransitionError> {
        match self.status {
            Status::Received => Ok(false),
            Status::Cancelled => Err(TransitionError {
                id: self.id,
                from: self.status,
                to: Status::Received,
            }),
            Status::Pending | Status::Overdue => {
                self.status = Status::Received;
                self.paid_at = Some(paid_at);
                self.history.append(Status::Received, at, "payment received");
                Ok(true)
            }
        }
    }

    /// Marks this [`FinancialEntry`] as [`Status::Cancelled`].
    ///
    /// Returns `false` if it's been cancelled already.
    ///
    /// # Errors
    ///
    /// With a [`TransitionError`] if this [`FinancialEntry`] is received.
    pub fn cancel(
        &mut self,
        reason: impl Into<Reason>,
        at: DateTime,
    ) -> Result<bool, TransitionError> {
        match self.status {
            Status::Cancelled => Ok(false),
            Status::Received => Err(TransitionError {
                id: self.id,
                from: self.status,
                to: Status::Cancelled,
            }),
            Status::Pending | Status::Overdue => {
                self.status = Status::Cancelled;
                self.history.append(Status::Cancelled, at, reason);
                Ok(true)
            }
        }
    }

    /// Marks this [`FinancialEntry`] as [`Status::Overdue`] if it's still
    /// [`Status::Pending`] and its due date is before the provided
    /// `reference` one.
    ///
    /// Returns whether the [`Status`] has changed.
    pub fn escalate(&mut self, reference: DueDateTime, at: DateTime) -> bool {
        if self.status != Status::Pending || self.due_at >= reference {
            return false;
        }
        self.status = Status::Overdue;
        self.history.append(Status::Overdue, at, "due date passed");
        true
    }
}

/// Error of a [`FinancialEntry`] [`Status`] change not permitted from its
/// current [`Status`].
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("`FinancialEntry(id: {id})` cannot move from `{from}` to `{to}`")]
pub struct TransitionError {
    /// ID of the [`FinancialEntry`].
    pub id: Id,

    /// Current [`Status`] of the [`FinancialEntry`].
    pub from: Status,

    /// Requested [`Status`] of the [`FinancialEntry`].
    pub to: Status,
}

/// ID of a [`FinancialEntry`].
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
    #[doc = "Kind of a [`FinancialEntry`]."]
    enum Kind {
        #[doc = "Security deposit."]
        Deposit = 1,

        #[doc = "Periodic rent."]
        Rent = 2,

        #[doc = "Agency or administrative fee."]
        Fee = 3,

        #[doc = "Repair cost charged to a party."]
        Repair = 4,
    }
}

define_kind! {
    #[doc = "Status of a [`FinancialEntry`]."]
    enum Status {
        #[doc = "Awaits payment."]
        Pending = 1,

        #[doc = "Paid."]
        Received = 2,

        #[doc = "Awaits payment past its due date."]
        Overdue = 3,

        #[doc = "Will never be paid."]
        Cancelled = 4,
    }
}

impl Status {
    /// Indicates whether this [`Status`] is terminal.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Received | Self::Cancelled)
    }
}

/// Single [`Status`] change recorded in the [`History`] of a
/// [`FinancialEntry`].
pub type HistoryEntry = history::Entry<Status>;

/// [`DateTime`] when a [`FinancialEntry`] was created.
pub type CreationDateTime = DateTimeOf<(FinancialEntry, unit::Creation)>;

/// Marker type indicating a [`FinancialEntry`] due date.
#[derive(Clone, Copy, Debug)]
pub struct Due;

/// [`DateTime`] when a [`FinancialEntry`] is due.
pub type DueDateTime = DateTimeOf<(FinancialEntry, Due)>;

/// [`DateTime`] when a [`FinancialEntry`] was paid.
pub type PaymentDateTime = DateTimeOf<(FinancialEntry, unit::Closure)>;
