//! Helpers for testing [`Command`]s against an in-memory [`Service`].

use std::str::FromStr as _;

use common::{
    operations::{By, Insert, Select, Update},
    DateTime, Money,
};
use tracerr::Traced;
use uuid::Uuid;

use crate::{
    command::{
        CreateNegotiation, CreateProperty, OpenMaintenance, OpenRemediation,
        RegisterFinancialEntry,
    },
    domain::{
        financial_entry, maintenance, negotiation, property, remediation,
        FinancialEntry, Negotiation, Property, Remediation, Version,
    },
    infra::{
        audit,
        database::{self, memory},
        Database,
    },
    query, Command, Config, Service,
};

/// [`Service`] backed by in-memory storage and audit sink.
pub(crate) type TestService = Service<database::Memory, audit::Memory>;

/// Creates a new empty [`TestService`].
pub(crate) fn service() -> TestService {
    Service::from_parts(
        Config::default(),
        database::Memory::default(),
        audit::Memory::default(),
    )
}

/// [`Service`] sharing the storage of a [`TestService`], but failing every
/// [`Update`] of the poisoned rows.
pub(crate) type FaultyService = Service<Faulty, audit::Memory>;

/// [`database::Memory`] failing [`Update`]s of some rows as if they were
/// concurrently modified.
#[derive(Clone, Debug)]
pub(crate) struct Faulty {
    /// Underlying storage.
    db: database::Memory,

    /// IDs of the rows whose [`Update`]s fail.
    poisoned: Vec<String>,
}

/// [`Database`] operation possibly touching a poisoned row of [`Faulty`].
pub(crate) trait Poisonable {
    /// Returns ID of the row this operation writes, if any.
    fn written(&self) -> Option<String> {
        None
    }
}

impl<W, B> Poisonable for Select<By<W, B>> {}

impl<T> Poisonable for Insert<T> {}

macro_rules! impl_poisonable_update {
    ($($ty:ty),+ $(,)?) => {$(
        impl Poisonable for Update<$ty> {
            fn written(&self) -> Option<String> {
                Some(self.0.id.to_string())
            }
        }
    )+};
}

impl_poisonable_update!(
    FinancialEntry,
    maintenance::Order,
    Negotiation,
    Property,
    Remediation,
);

impl<Op> Database<Op> for Faulty
where
    Op: Poisonable,
    database::Memory: Database<Op, Err = Traced<database::Error>>,
{
    type Ok = <database::Memory as Database<Op>>::Ok;
    type Err = Traced<database::Error>;

    async fn execute(&self, op: Op) -> Result<Self::Ok, Self::Err> {
        if let Some(id) = op.written().filter(|id| self.poisoned.contains(id))
        {
            return Err(tracerr::new!(database::Error::from(
                memory::Error::Stale {
                    entity: "Poisoned",
                    id,
                    read: Version::default(),
                    stored: Version::default().next(),
                }
            )));
        }
        <database::Memory as Database<Op>>::execute(&self.db, op).await
    }
}

/// Creates a new [`FaultyService`] over the storage of the provided
/// [`TestService`], failing [`Update`]s of the rows with `poisoned` IDs.
pub(crate) fn faulty<I>(
    svc: &TestService,
    poisoned: impl IntoIterator<Item = I>,
) -> FaultyService
where
    I: ToString,
{
    Service::from_parts(
        Config::default(),
        Faulty {
            db: svc.database().clone(),
            poisoned: poisoned.into_iter().map(|id| id.to_string()).collect(),
        },
        audit::Memory::default(),
    )
}

/// Executes the provided [`Command`] returning its untraced error.
pub(crate) async fn exec<Cmd, T, E>(svc: &TestService, cmd: Cmd) -> Result<T, E>
where
    TestService: Command<Cmd, Ok = T, Err = Traced<E>>,
{
    svc.execute(cmd).await.map_err(Traced::into_inner)
}

pub(crate) fn operator() -> audit::Actor {
    audit::Actor::Operator(Uuid::new_v4())
}

pub(crate) fn at(s: &str) -> DateTime {
    DateTime::from_rfc3339(s).unwrap()
}

pub(crate) fn money(s: &str) -> Money {
    Money::from_str(s).unwrap()
}

/// Creates a new [`property::Status::Available`] [`Property`].
pub(crate) async fn property(svc: &TestService, code: &str) -> Property {
    exec(
        svc,
        CreateProperty {
            code: property::Code::new(code).unwrap(),
            address: property::Address::new("Rua das Flores, 12").unwrap(),
            kind: property::Kind::Apartment,
            actor: operator(),
        },
    )
    .await
    .unwrap()
}

/// Creates a new [`Negotiation`] holding the provided [`Property`].
pub(crate) async fn negotiation(
    svc: &TestService,
    property_id: property::Id,
) -> Negotiation {
    exec(
        svc,
        CreateNegotiation {
            property_id,
            client_name: negotiation::ClientName::new("Ana Lima").unwrap(),
            actor: operator(),
        },
    )
    .await
    .unwrap()
}

pub(crate) async fn maintenance(
    svc: &TestService,
    property_id: property::Id,
) -> maintenance::Order {
    exec(
        svc,
        OpenMaintenance {
            property_id,
            description: maintenance::Description::new("Leaking faucet")
                .unwrap(),
            actor: operator(),
        },
    )
    .await
    .unwrap()
}

pub(crate) async fn remediation(
    svc: &TestService,
    property_id: property::Id,
    kind: remediation::Kind,
    due_at: DateTime,
) -> Remediation {
    exec(
        svc,
        OpenRemediation {
            property_id,
            kind,
            description: maintenance::Description::new("Broken window")
                .unwrap(),
            due_at: due_at.coerce(),
            actor: operator(),
        },
    )
    .await
    .unwrap()
}

/// Registers a new [`financial_entry::Kind::Deposit`] due on 2024-04-10.
pub(crate) async fn financial_entry(
    svc: &TestService,
    property_id: property::Id,
    amount: &str,
    blocks_availability: bool,
) -> FinancialEntry {
    exec(
        svc,
        RegisterFinancialEntry {
            reference_id: property_id,
            kind: financial_entry::Kind::Deposit,
            amount: money(amount),
            due_at: at("2024-04-10T00:00:00Z").coerce(),
            blocks_availability,
            actor: operator(),
        },
    )
    .await
    .unwrap()
}

pub(crate) async fn get_property(
    svc: &TestService,
    id: property::Id,
) -> Property {
    svc.execute(query::property::ById::by(id))
        .await
        .unwrap()
        .unwrap()
}

pub(crate) async fn get_negotiation(
    svc: &TestService,
    id: negotiation::Id,
) -> Negotiation {
    svc.execute(query::negotiation::ById::by(id))
        .await
        .unwrap()
        .unwrap()
}

pub(crate) async fn get_entry(
    svc: &TestService,
    id: financial_entry::Id,
) -> FinancialEntry {
    svc.execute(query::financial_entry::ById::by(id))
        .await
        .unwrap()
        .unwrap()
}
