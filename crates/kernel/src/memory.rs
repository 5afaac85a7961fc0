//! In-memory provisioner used for dry runs and tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::SeedError;
use crate::provisioner::Provisioner;
use crate::seed::{FixtureDocument, RoleGrant, UserRecord};

#[derive(Debug, Clone, Default, Serialize)]
pub struct MemoryDatabase {
    pub users: BTreeMap<String, UserRecord>,
    pub collections: BTreeMap<String, Vec<FixtureDocument>>,
}

/// Keeps databases in a shared map with the same create semantics as the
/// server: duplicate users and collections are rejected, inserts create the
/// collection on demand.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvisioner {
    databases: Arc<RwLock<BTreeMap<String, MemoryDatabase>>>,
}

impl MemoryProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every database touched so far
    pub async fn snapshot(&self) -> BTreeMap<String, MemoryDatabase> {
        self.databases.read().await.clone()
    }
}

#[async_trait]
impl Provisioner for MemoryProvisioner {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn create_user(
        &self,
        database: &str,
        username: &str,
        _password: &str,
        roles: &[RoleGrant],
    ) -> Result<(), SeedError> {
        let mut databases = self.databases.write().await;
        let db = databases.entry(database.to_string()).or_default();
        if db.users.contains_key(username) {
            return Err(SeedError::user_exists(database, username));
        }
        db.users.insert(
            username.to_string(),
            UserRecord {
                user: username.to_string(),
                db: database.to_string(),
                roles: roles.to_vec(),
            },
        );
        Ok(())
    }

    async fn create_collection(&self, database: &str, collection: &str) -> Result<(), SeedError> {
        let mut databases = self.databases.write().await;
        let db = databases.entry(database.to_string()).or_default();
        if db.collections.contains_key(collection) {
            return Err(SeedError::collection_exists(database, collection));
        }
        db.collections.insert(collection.to_string(), Vec::new());
        Ok(())
    }

    async fn insert_document(
        &self,
        database: &str,
        collection: &str,
        document: &FixtureDocument,
    ) -> Result<(), SeedError> {
        let mut databases = self.databases.write().await;
        databases
            .entry(database.to_string())
            .or_default()
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(document.clone());
        Ok(())
    }

    async fn user_info(
        &self,
        database: &str,
        username: &str,
    ) -> Result<Option<UserRecord>, SeedError> {
        let databases = self.databases.read().await;
        Ok(databases
            .get(database)
            .and_then(|db| db.users.get(username))
            .cloned())
    }

    async fn documents(
        &self,
        database: &str,
        collection: &str,
    ) -> Result<Vec<FixtureDocument>, SeedError> {
        let databases = self.databases.read().await;
        Ok(databases
            .get(database)
            .and_then(|db| db.collections.get(collection))
            .cloned()
            .unwrap_or_default())
    }
}
