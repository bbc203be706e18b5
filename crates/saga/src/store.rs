//! The two record repositories behind one handle.

use common::PairKey;
use domain::{PendingApplication, Relationship};
use relation_store::{KeyedCache, Persistor, Repository};

use crate::error::Result;

/// Cache-aside access to pending applications and relationships.
///
/// Both repositories share one persistor and one cache; records are told
/// apart by their kind.
pub struct RelationStore<P, C> {
    applications: Repository<PendingApplication, P, C>,
    relationships: Repository<Relationship, P, C>,
}

impl<P: Clone, C: Clone> Clone for RelationStore<P, C> {
    fn clone(&self) -> Self {
        Self {
            applications: self.applications.clone(),
            relationships: self.relationships.clone(),
        }
    }
}

impl<P, C> RelationStore<P, C>
where
    P: Persistor + Clone,
    C: KeyedCache + Clone,
{
    pub fn new(persistor: P, cache: C) -> Self {
        Self {
            applications: Repository::new(persistor.clone(), cache.clone()),
            relationships: Repository::new(persistor, cache),
        }
    }

    pub fn applications(&self) -> &Repository<PendingApplication, P, C> {
        &self.applications
    }

    pub fn relationships(&self) -> &Repository<Relationship, P, C> {
        &self.relationships
    }

    /// Loads both records stored for `key`.
    pub async fn load_pair(
        &self,
        key: PairKey,
    ) -> Result<(Option<Relationship>, Option<PendingApplication>)> {
        let (relationship, application) =
            futures_util::try_join!(self.relationships.load(key), self.applications.load(key))?;
        Ok((relationship, application))
    }
}
