//! In-memory [`Database`] implementation.

mod impls;

use std::{collections::HashMap, hash::Hash, sync::Arc};

use derive_more::{Display, Error as StdError};
use tokio::sync::RwLock;

use crate::domain::{
    financial_entry, maintenance, negotiation, property, remediation,
    FinancialEntry, Negotiation, Property, Remediation, Version,
};
#[cfg(doc)]
use crate::infra::Database;

/// In-memory [`Database`] keeping every aggregate in a shared [`Storage`].
///
/// Clones share the same [`Storage`]. Every operation holds the lock only
/// for its own duration.
#[derive(Clone, Debug, Default)]
pub struct Memory(Arc<RwLock<Storage>>);

/// Tables of a [`Memory`] database.
#[derive(Debug, Default)]
struct Storage {
    /// [`Property`] table.
    properties: HashMap<property::Id, Property>,

    /// [`Negotiation`] table.
    negotiations: HashMap<negotiation::Id, Negotiation>,

    /// [`FinancialEntry`] table.
    financial_entries: HashMap<financial_entry::Id, FinancialEntry>,

    /// [`maintenance::Order`] table.
    maintenance_orders: HashMap<maintenance::Id, maintenance::Order>,

    /// [`Remediation`] table.
    remediations: HashMap<remediation::Id, Remediation>,
}

/// [`Memory`] database error.
#[derive(Clone, Debug, Display, StdError)]
pub enum Error {
    /// Row with the same ID is stored already.
    #[display("`{entity}(id: {id})` already exists")]
    AlreadyExists {
        /// Name of the stored entity.
        entity: &'static str,

        /// ID of the stored entity.
        id: String,
    },

    /// Row with the provided ID is not stored.
    #[display("`{entity}(id: {id})` does not exist")]
    NotExists {
        /// Name of the entity.
        entity: &'static str,

        /// ID of the entity.
        id: String,
    },

    /// [`Property`] with the same [`property::Code`] is stored already.
    #[display("`Property(code: {_0})` already exists")]
    DuplicateCode(#[error(not(source))] property::Code),

    /// Row has been updated since it was read.
    #[display(
        "`{entity}(id: {id})` is stale: read at version {read}, but stored \
         at version {stored}"
    )]
    Stale {
        /// Name of the entity.
        entity: &'static str,

        /// ID of the entity.
        id: String,

        /// [`Version`] the row was read at.
        read: Version,

        /// [`Version`] of the stored row.
        stored: Version,
    },
}

/// Row of a [`Memory`] table carrying its [`Version`].
trait Row {
    /// Returns a mutable reference to the [`Version`] of this [`Row`].
    fn version_mut(&mut self) -> &mut Version;
}

macro_rules! impl_row {
    ($($ty:ty),+ $(,)?) => {$(
        impl Row for $ty {
            fn version_mut(&mut self) -> &mut Version {
                &mut self.version
            }
        }
    )+};
}

impl_row!(
    FinancialEntry,
    maintenance::Order,
    Negotiation,
    Property,
    Remediation,
);

/// Inserts a new `row` into the provided `table`.
fn insert<K, V>(
    table: &mut HashMap<K, V>,
    entity: &'static str,
    id: K,
    row: V,
) -> Result<(), Error>
where
    K: Eq + Hash + ToString,
{
    if table.contains_key(&id) {
        return Err(Error::AlreadyExists {
            entity,
            id: id.to_string(),
        });
    }
    _ = table.insert(id, row);
    Ok(())
}

/// Replaces the existing `row` in the provided `table`, bumping its
/// [`Version`].
///
/// Fails with [`Error::Stale`] if the stored row has another [`Version`] than
/// the provided one.
fn update<K, V>(
    table: &mut HashMap<K, V>,
    entity: &'static str,
    id: K,
    mut row: V,
) -> Result<(), Error>
where
    K: Eq + Hash + ToString,
    V: Row,
{
    let stored = table.get_mut(&id).ok_or_else(|| Error::NotExists {
        entity,
        id: id.to_string(),
    })?;
    let (read, current) = (*row.version_mut(), *stored.version_mut());
    if read != current {
        return Err(Error::Stale {
            entity,
            id: id.to_string(),
            read,
            stored: current,
        });
    }
    *row.version_mut() = read.next();
    *stored = row;
    Ok(())
}

#[cfg(test)]
mod spec {
    use common::{
        operations::{By, Insert, Select, Update},
        DateTime,
    };

    use crate::{
        domain::{property, Property, Version},
        error,
        infra::{database, Database as _},
    };

    use super::{Error, Memory};

    fn property(code: &str) -> Property {
        Property::new(
            property::Code::new(code).unwrap(),
            property::Address::new("Rua das Flores, 10").unwrap(),
            property::Kind::Apartment,
            DateTime::now().coerce(),
        )
    }

    #[tokio::test]
    async fn rejects_duplicate_codes() {
        let db = Memory::default();
        db.execute(Insert(property("AP-101"))).await.unwrap();

        let err = db.execute(Insert(property("AP-101"))).await.unwrap_err();
        assert!(matches!(
            err.into_inner(),
            database::Error::Memory(Error::DuplicateCode(code))
                if AsRef::<str>::as_ref(&code) == "AP-101",
        ));
    }

    #[tokio::test]
    async fn rejects_updating_unknown_rows() {
        let db = Memory::default();

        let err = db.execute(Update(property("AP-101"))).await.unwrap_err();
        assert!(matches!(
            err.into_inner(),
            database::Error::Memory(Error::NotExists { entity, .. })
                if entity == "Property",
        ));
    }

    #[tokio::test]
    async fn rejects_stale_updates() {
        let db = Memory::default();
        let p = property("AP-101");
        db.execute(Insert(p.clone())).await.unwrap();
        let by_id = || Select(By::<Option<Property>, _>::new(p.id));
        let mut a = db.execute(by_id()).await.unwrap().unwrap();
        let mut b = db.execute(by_id()).await.unwrap().unwrap();

        let now = DateTime::now();
        _ = a.change_status(property::Status::InMaintenance, "leak", now);
        db.execute(Update(a)).await.unwrap();

        _ = b.set_open_pending(true);
        let err = db.execute(Update(b)).await.unwrap_err().into_inner();
        assert_eq!(err.kind(), error::Kind::Conflict);
        assert!(matches!(
            err,
            database::Error::Memory(Error::Stale { read, stored, .. })
                if read == Version::default() && stored == read.next(),
        ));

        let stored = db.execute(by_id()).await.unwrap().unwrap();
        assert_eq!(stored.status(), property::Status::InMaintenance);
        assert!(!stored.has_open_pending());
        assert_eq!(stored.history().len(), 2);
        assert_eq!(stored.version, Version::default().next());
    }

    #[tokio::test]
    async fn bumps_version_on_update() {
        let db = Memory::default();
        let p = property("AP-101");
        db.execute(Insert(p.clone())).await.unwrap();

        db.execute(Update(p.clone())).await.unwrap();
        let stored = db
            .execute(Select(By::<Option<Property>, _>::new(p.id)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.version, p.version.next());

        db.execute(Update(stored)).await.unwrap();
    }

    #[tokio::test]
    async fn selects_by_code() {
        let db = Memory::default();
        let p = property("AP-101");
        db.execute(Insert(p.clone())).await.unwrap();

        let found = db
            .execute(Select(By::<Option<Property>, _>::new(p.code.clone())))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, p.id);
    }
}
