//! [`Negotiation`] definitions.

use common::{
    define_kind,
    history::{self, Reason},
    unit, DateTime, DateTimeOf, History,
};
use derive_more::{AsRef, Display, Error, From, FromStr, Into};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{property, Version};
#[cfg(doc)]
use crate::domain::Property;

/// Deal about a [`Property`] moving through the sales pipeline.
///
/// A [`Negotiation`] starts in [`Stage::LeadCaptured`] and ends in either
/// [`Stage::Completed`] or [`Stage::Cancelled`], after which it never moves
/// again.
#[derive(Clone, Debug)]
pub struct Negotiation {
    /// ID of this [`Negotiation`].
    pub id: Id,

    /// ID of the [`Property`] this [`Negotiation`] is about.
    pub property_id: property::Id,

    /// [`ClientName`] of the party interested in the [`Property`].
    pub client_name: ClientName,

    /// [`DateTime`] when this [`Negotiation`] was created.
    pub created_at: CreationDateTime,

    /// [`Version`] of this [`Negotiation`].
    pub version: Version,

    /// Current [`Stage`] of this [`Negotiation`].
    stage: Stage,

    /// [`DateTime`] when the sent proposal expires, if any.
    proposal_expires_at: Option<ProposalExpirationDateTime>,

    /// [`History`] of [`Stage`] changes.
    history: History<Stage>,
}

impl Negotiation {
    /// Creates a new [`Negotiation`] in the [`Stage::LeadCaptured`].
    #[must_use]
    pub fn new(
        property_id: property::Id,
        client_name: ClientName,
        created_at: CreationDateTime,
    ) -> Self {
        Self {
            id: Id::new(),
            property_id,
            client_name,
            created_at,
            version: Version::default(),
            stage: Stage::LeadCaptured,
            proposal_expires_at: None,
            history: History::starting_with(
                Stage::LeadCaptured,
                created_at.coerce(),
                "lead captured",
            ),
        }
    }

    /// Returns the current [`Stage`] of this [`Negotiation`].
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Returns [`DateTime`] when the proposal of this [`Negotiation`] expires.
    ///
    /// Always [`None`] unless this [`Negotiation`] is in the
    /// [`Stage::ProposalSent`].
    #[must_use]
    pub fn proposal_expires_at(&self) -> Option<ProposalExpirationDateTime> {
        self.proposal_expires_at
    }

    /// Returns the [`History`] of [`Stage`] changes of this [`Negotiation`].
    #[must_use]
    pub fn history(&self) -> &History<Stage> {
        &self.history
    }

    /// Indicates whether this [`Negotiation`] reached a terminal [`Stage`].
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.stage.is_terminal()
    }

    /// Indicates whether the proposal of this [`Negotiation`] has expired by
    /// the provided moment.
    #[must_use]
    pub fn is_proposal_expired(&self, now: DateTime) -> bool {
        self.stage == Stage::ProposalSent
            && self.proposal_expires_at.is_some_and(|at| at.coerce() < now)
    }

    /// Moves this [`Negotiation`] into the provided [`Stage`].
    ///
    /// The `proposal_expires_at` is taken into account only when moving into
    /// the [`Stage::ProposalSent`], and is cleared when leaving it.
    ///
    /// Returns `false` without touching the [`History`] if this
    /// [`Negotiation`] is in the provided [`Stage`] already.
    ///
    /// # Errors
    ///
    /// With an [`AdvanceError`] if this [`Negotiation`] is terminal.
    pub fn advance(
        &mut self,
        stage: Stage,
        reason: impl Into<Reason>,
        proposal_expires_at: Option<ProposalExpirationDateTime>,
        at: DateTime,
    ) -> Result<bool, AdvanceError> {
        if self.stage == stage {
            return Ok(false);
        }
        match self.stage {
            Stage::Cancelled => return Err(AdvanceError::Cancelled(self.id)),
            Stage::Completed => return Err(AdvanceError::Completed(self.id)),
            Stage::LeadCaptured
            | Stage::VisitScheduled
            | Stage::ProposalSent
            | Stage::DocumentAnalysis
            | Stage::ContractDrafting => {}
        }

        self.stage = stage;
        self.proposal_expires_at = (stage == Stage::ProposalSent)
            .then_some(proposal_expires_at)
            .flatten();
        self.history.append(stage, at, reason);
        Ok(true)
    }
}

/// Error of advancing a terminal [`Negotiation`].
#[derive(Clone, Copy, Debug, Display, Error)]
pub enum AdvanceError {
    /// [`Negotiation`] is cancelled.
    #[display("`Negotiation(id: {_0})` is cancelled")]
    Cancelled(#[error(not(source))] Id),

    /// [`Negotiation`] is completed.
    #[display("`Negotiation(id: {_0})` is completed")]
    Completed(#[error(not(source))] Id),
}

/// ID of a [`Negotiation`].
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

/// Name of the client negotiating a [`Property`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(forward)]
pub struct ClientName(String);

impl ClientName {
    /// Creates a new [`ClientName`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`ClientName`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name && !name.is_empty() && name.len() <= 256
    }
}

impl FromStr for ClientName {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `ClientName`")
    }
}

define_kind! {
    #[doc = "Stage of a [`Negotiation`] in the sales pipeline."]
    enum Stage {
        #[doc = "Interested client has been registered."]
        LeadCaptured = 1,

        #[doc = "Visit to the [`Property`] has been arranged."]
        VisitScheduled = 2,

        #[doc = "Proposal has been sent and awaits an answer."]
        ProposalSent = 3,

        #[doc = "Client documents are being analyzed."]
        DocumentAnalysis = 4,

        #[doc = "Contract is being drafted."]
        ContractDrafting = 5,

        #[doc = "Deal is closed successfully."]
        Completed = 6,

        #[doc = "Deal is abandoned."]
        Cancelled = 7,
    }
}

impl Stage {
    /// Indicates whether this [`Stage`] is terminal.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Single [`Stage`] change recorded in the [`History`] of a [`Negotiation`].
pub type HistoryEntry = history::Entry<Stage>;

/// [`DateTime`] when a [`Negotiation`] was created.
pub type CreationDateTime = DateTimeOf<(Negotiation, unit::Creation)>;

/// Marker type indicating a [`Negotiation`] proposal expiration.
#[derive(Clone, Copy, Debug)]
pub struct ProposalExpiration;

/// [`DateTime`] when a [`Negotiation`] proposal expires.
pub type ProposalExpirationDateTime =
    DateTimeOf<(Negotiation, ProposalExpiration)>;
