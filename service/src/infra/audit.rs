//! [`Audit`]-related definitions.

use std::{convert::Infallible, sync::Arc};

use common::{operations::Record, DateTime};
use derive_more::{Display, From};
use tokio::sync::Mutex;
use tracing as log;
use uuid::Uuid;

use crate::domain::{
    financial_entry, maintenance, negotiation, property, remediation,
};
#[cfg(doc)]
use crate::domain::{FinancialEntry, Negotiation, Property, Remediation};

/// Audit sink recording facts about performed state changes.
pub use common::Handler as Audit;

/// Single fact about a performed state change.
#[derive(Clone, Debug, Display)]
#[display("{actor} {action} {target} at {at}: {details}")]
pub struct Entry {
    /// [`Actor`] who initiated the change.
    pub actor: Actor,

    /// [`Action`] that has been performed.
    pub action: Action,

    /// [`Target`] of the performed [`Action`].
    pub target: Target,

    /// Free-form details of the change.
    pub details: String,

    /// [`DateTime`] when the change happened.
    pub at: DateTime,
}

impl Entry {
    /// Creates a new [`Entry`] happened right now.
    #[must_use]
    pub fn now(
        actor: Actor,
        action: Action,
        target: impl Into<Target>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            actor,
            action,
            target: target.into(),
            details: details.into(),
            at: DateTime::now(),
        }
    }
}

/// Initiator of a state change.
#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq)]
pub enum Actor {
    /// Periodic sweep or an internal cascade.
    #[default]
    #[display("system")]
    System,

    /// Back office operator with the provided ID.
    #[display("operator({_0})")]
    Operator(Uuid),
}

/// Kind of a performed state change.
#[derive(Clone, Copy, Debug, Eq, PartialEq, strum::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// [`Property`] has been created.
    PropertyCreated,

    /// [`Property`] received a move-out notice.
    MoveOutNoticed,

    /// Scheduled [`property::Status`] has been applied.
    ScheduledStatusApplied,

    /// Maintenance [`Order`] has been opened.
    ///
    /// [`Order`]: maintenance::Order
    MaintenanceOpened,

    /// Maintenance [`Order`] has been closed.
    ///
    /// [`Order`]: maintenance::Order
    MaintenanceClosed,

    /// Pending signal of a [`Property`] has changed.
    PendingStatusChanged,

    /// [`Negotiation`] has been linked to its [`Property`].
    NegotiationAttached,

    /// [`Negotiation`] has been unlinked from its [`Property`].
    NegotiationReleased,

    /// [`Negotiation`] has been created.
    NegotiationCreated,

    /// [`Negotiation`] has moved to another [`negotiation::Stage`].
    NegotiationAdvanced,

    /// [`Remediation`] has been opened.
    RemediationOpened,

    /// [`Remediation`] has been resolved or cancelled.
    RemediationClosed,

    /// [`FinancialEntry`] has been registered.
    FinancialEntryRegistered,

    /// Payment of a [`FinancialEntry`] has been received.
    PaymentRegistered,

    /// [`FinancialEntry`] has been cancelled.
    FinancialEntryCancelled,

    /// [`FinancialEntry`] has become overdue.
    FinancialEntryEscalated,
}

/// Aggregate a performed state change is about.
#[derive(Clone, Copy, Debug, Display, Eq, From, PartialEq)]
pub enum Target {
    /// [`Property`] with the provided ID.
    #[display("Property({_0})")]
    Property(property::Id),

    /// [`Negotiation`] with the provided ID.
    #[display("Negotiation({_0})")]
    Negotiation(negotiation::Id),

    /// [`FinancialEntry`] with the provided ID.
    #[display("FinancialEntry({_0})")]
    FinancialEntry(financial_entry::Id),

    /// Maintenance [`Order`] with the provided ID.
    ///
    /// [`Order`]: maintenance::Order
    #[display("MaintenanceOrder({_0})")]
    MaintenanceOrder(maintenance::Id),

    /// [`Remediation`] with the provided ID.
    #[display("Remediation({_0})")]
    Remediation(remediation::Id),
}

/// [`Audit`] sink emitting [`Entry`]s as [`tracing`] events.
#[derive(Clone, Copy, Debug, Default)]
pub struct Log;

impl Audit<Record<Entry>> for Log {
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Record(entry): Record<Entry>,
    ) -> Result<Self::Ok, Self::Err> {
        log::info!(
            target: "audit",
            actor = %entry.actor,
            action = %entry.action,
            subject = %entry.target,
            at = %entry.at,
            "{}",
            entry.details,
        );
        Ok(())
    }
}

/// [`Audit`] sink collecting [`Entry`]s in memory.
#[derive(Clone, Debug, Default)]
pub struct Memory(Arc<Mutex<Vec<Entry>>>);

impl Memory {
    /// Returns all the [`Entry`]s recorded so far.
    pub async fn entries(&self) -> Vec<Entry> {
        self.0.lock().await.clone()
    }
}

impl Audit<Record<Entry>> for Memory {
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Record(entry): Record<Entry>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0.lock().await.push(entry);
        Ok(())
    }
}
