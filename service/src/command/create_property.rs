//! [`Command`] for creating a new [`Property`].

use std::fmt;

use common::{
    operations::{By, Insert, Record, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{property, Property},
    error,
    infra::{audit, database, Audit, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`property::Status::Available`]
/// [`Property`].
#[derive(Clone, Debug)]
pub struct CreateProperty {
    /// Unique [`property::Code`] of the new [`Property`].
    pub code: property::Code,

    /// [`property::Address`] of the new [`Property`].
    pub address: property::Address,

    /// [`property::Kind`] of the new [`Property`].
    pub kind: property::Kind,

    /// [`audit::Actor`] creating the [`Property`].
    pub actor: audit::Actor,
}

impl<Db, Au> Command<CreateProperty> for Service<Db, Au>
where
    Db: Database<
            Select<By<Option<Property>, property::Code>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<Insert<Property>, Err = Traced<database::Error>>,
    Au: Audit<Record<audit::Entry>, Ok = (), Err: fmt::Display>,
{
    type Ok = Property;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateProperty,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateProperty {
            code,
            address,
            kind,
            actor,
        } = cmd;

        let existing = self
            .database()
            .execute(Select(By::<Option<Property>, _>::new(code.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if existing.is_some() {
            return Err(tracerr::new!(E::CodeOccupied(code)));
        }

        let property =
            Property::new(code, address, kind, DateTime::now().coerce());

        self.database()
            .execute(Insert(property.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            "`Property(id: {}, code: {})` created",
            property.id,
            property.code,
        );
        self.record(audit::Entry::now(
            actor,
            audit::Action::PropertyCreated,
            property.id,
            format!("code: {}, kind: {}", property.code, property.kind),
        ))
        .await;

        Ok(property)
    }
}

/// Error of [`CreateProperty`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`property::Code`] is used by another [`Property`].
    #[display("`Property(code: {_0})` already exists")]
    CodeOccupied(#[error(not(source))] property::Code),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),
}

impl ExecutionError {
    /// Returns [`error::Kind`] of this [`ExecutionError`].
    #[must_use]
    pub fn kind(&self) -> error::Kind {
        match self {
            Self::CodeOccupied(_) => error::Kind::Conflict,
            Self::Db(e) => e.kind(),
        }
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::property::{self, Status},
        error, fixture,
        infra::audit,
    };

    use super::CreateProperty;

    fn cmd(code: &str) -> CreateProperty {
        CreateProperty {
            code: property::Code::new(code).unwrap(),
            address: property::Address::new("Av. Paulista, 1000").unwrap(),
            kind: property::Kind::Commercial,
            actor: fixture::operator(),
        }
    }

    #[tokio::test]
    async fn creates_available_property() {
        let svc = fixture::service();

        let p = fixture::exec(&svc, cmd("SP-1000")).await.unwrap();
        assert_eq!(p.status(), Status::Available);
        assert_eq!(p.history().len(), 1);
        assert!(p.active_negotiation_id().is_none());

        let stored = fixture::get_property(&svc, p.id).await;
        assert_eq!(stored.code, p.code);

        let entries = svc.audit().entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, audit::Action::PropertyCreated);
    }

    #[tokio::test]
    async fn rejects_duplicate_code() {
        let svc = fixture::service();
        _ = fixture::exec(&svc, cmd("SP-1000")).await.unwrap();

        let err = fixture::exec(&svc, cmd("SP-1000")).await.unwrap_err();
        assert_eq!(err.kind(), error::Kind::Conflict);
    }
}
