use async_trait::async_trait;

use crate::error::SeedError;
use crate::seed::{FixtureDocument, RoleGrant, UserRecord};

/// Database operations a seed plan needs.
///
/// Backends implement these against a privileged session; no method checks
/// for existing state before acting.
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Short backend name used in logs
    fn name(&self) -> &'static str;

    /// Create `username` in `database` with the given roles
    async fn create_user(
        &self,
        database: &str,
        username: &str,
        password: &str,
        roles: &[RoleGrant],
    ) -> Result<(), SeedError>;

    /// Create an empty collection
    async fn create_collection(&self, database: &str, collection: &str) -> Result<(), SeedError>;

    /// Insert one document into a collection
    async fn insert_document(
        &self,
        database: &str,
        collection: &str,
        document: &FixtureDocument,
    ) -> Result<(), SeedError>;

    /// Look up a user defined on `database`
    async fn user_info(&self, database: &str, username: &str)
        -> Result<Option<UserRecord>, SeedError>;

    /// All documents in a collection, empty if the collection does not exist
    async fn documents(
        &self,
        database: &str,
        collection: &str,
    ) -> Result<Vec<FixtureDocument>, SeedError>;
}
