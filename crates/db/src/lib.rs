//! MongoDB client factory and [`Provisioner`] implementation.

use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    bson::{self, doc, Document},
    error::ErrorKind,
    options::{ClientOptions, Credential},
    Client,
};
use serde::Deserialize;

use seedkit_kernel::{
    settings::DatabaseSettings, FixtureDocument, Provisioner, RoleGrant, SeedError, UserRecord,
};

/// Server error code for `createUser` on an existing user.
const USER_ALREADY_EXISTS: i32 = 51003;
/// Server error code for `create` on an existing namespace.
const NAMESPACE_EXISTS: i32 = 48;

/// Build a client from settings and check it with a `ping`.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<Client> {
    let mut opts = ClientOptions::parse(&settings.uri)
        .await
        .with_context(|| "failed to parse MongoDB connection string")?;

    opts.app_name = Some(settings.app_name.clone());
    opts.server_selection_timeout = Some(Duration::from_millis(
        settings.server_selection_timeout_ms,
    ));
    opts.credential = credential(settings)?;

    tracing::info!(target: "seedkit-db", hosts = ?opts.hosts, "connecting to MongoDB");

    let client = Client::with_options(opts).with_context(|| "failed to create MongoDB client")?;
    client
        .database("admin")
        .run_command(doc! { "ping": 1 })
        .await
        .with_context(|| "MongoDB ping failed")?;

    tracing::info!(target: "seedkit-db", "connected to MongoDB");
    Ok(client)
}

/// Admin credential from settings; username and password must be set together.
fn credential(settings: &DatabaseSettings) -> anyhow::Result<Option<Credential>> {
    match (&settings.username, &settings.password) {
        (Some(username), Some(password)) => Ok(Some(
            Credential::builder()
                .username(username.clone())
                .password(password.clone())
                .source(settings.auth_source.clone())
                .build(),
        )),
        (None, None) => Ok(None),
        (Some(_), None) => Err(anyhow!(
            "database.username is set but database.password is missing"
        )),
        (None, Some(_)) => Err(anyhow!(
            "database.password is set but database.username is missing"
        )),
    }
}

/// Runs seed operations against a live MongoDB deployment.
#[derive(Clone)]
pub struct MongoProvisioner {
    client: Client,
}

impl MongoProvisioner {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connect using settings and wrap the client.
    pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<Self> {
        Ok(Self::new(connect(settings).await?))
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[derive(Debug, Deserialize)]
struct UsersInfoReply {
    #[serde(default)]
    users: Vec<UserRecord>,
}

#[async_trait]
impl Provisioner for MongoProvisioner {
    fn name(&self) -> &'static str {
        "mongodb"
    }

    async fn create_user(
        &self,
        database: &str,
        username: &str,
        password: &str,
        roles: &[RoleGrant],
    ) -> Result<(), SeedError> {
        let roles = bson::to_bson(roles).context("failed to encode roles")?;
        self.client
            .database(database)
            .run_command(doc! {
                "createUser": username,
                "pwd": password,
                "roles": roles,
            })
            .await
            .map_err(|e| classify(e, database, username))?;
        Ok(())
    }

    async fn create_collection(&self, database: &str, collection: &str) -> Result<(), SeedError> {
        self.client
            .database(database)
            .create_collection(collection)
            .await
            .map_err(|e| classify(e, database, collection))?;
        Ok(())
    }

    async fn insert_document(
        &self,
        database: &str,
        collection: &str,
        document: &FixtureDocument,
    ) -> Result<(), SeedError> {
        self.client
            .database(database)
            .collection::<FixtureDocument>(collection)
            .insert_one(document)
            .await
            .with_context(|| format!("failed to insert into '{database}.{collection}'"))?;
        Ok(())
    }

    async fn user_info(
        &self,
        database: &str,
        username: &str,
    ) -> Result<Option<UserRecord>, SeedError> {
        let reply: Document = self
            .client
            .database(database)
            .run_command(doc! {
                "usersInfo": { "user": username, "db": database },
            })
            .await
            .with_context(|| format!("usersInfo failed for '{username}' on '{database}'"))?;

        let reply: UsersInfoReply =
            bson::from_document(reply).context("failed to decode usersInfo reply")?;
        Ok(reply.users.into_iter().next())
    }

    async fn documents(
        &self,
        database: &str,
        collection: &str,
    ) -> Result<Vec<FixtureDocument>, SeedError> {
        let cursor = self
            .client
            .database(database)
            .collection::<FixtureDocument>(collection)
            .find(doc! {})
            .await
            .with_context(|| format!("failed to query '{database}.{collection}'"))?;

        let documents: Vec<FixtureDocument> = cursor
            .try_collect()
            .await
            .with_context(|| format!("failed to read '{database}.{collection}'"))?;
        Ok(documents)
    }
}

fn classify(error: mongodb::error::Error, database: &str, name: &str) -> SeedError {
    let code = match &*error.kind {
        ErrorKind::Command(command) => Some(command.code),
        _ => None,
    };
    from_code(code, database, name).unwrap_or_else(|| SeedError::Backend(error.into()))
}

fn from_code(code: Option<i32>, database: &str, name: &str) -> Option<SeedError> {
    match code? {
        USER_ALREADY_EXISTS => Some(SeedError::user_exists(database, name)),
        NAMESPACE_EXISTS => Some(SeedError::collection_exists(database, name)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_user_code_maps_to_user_exists() {
        let error = from_code(Some(USER_ALREADY_EXISTS), "blog-db", "blog-db-user").unwrap();
        assert!(matches!(
            error,
            SeedError::UserExists { ref database, ref user }
                if database == "blog-db" && user == "blog-db-user"
        ));
    }

    #[test]
    fn namespace_exists_maps_to_collection_exists() {
        let error = from_code(Some(NAMESPACE_EXISTS), "blog-db", "dummy").unwrap();
        assert!(matches!(error, SeedError::CollectionExists { .. }));
    }

    #[test]
    fn other_codes_stay_backend_errors() {
        assert!(from_code(Some(13), "blog-db", "blog-db-user").is_none());
        assert!(from_code(None, "blog-db", "blog-db-user").is_none());
    }

    fn settings(username: Option<&str>, password: Option<&str>) -> DatabaseSettings {
        DatabaseSettings {
            username: username.map(str::to_string),
            password: password.map(str::to_string),
            ..DatabaseSettings::default()
        }
    }

    #[test]
    fn credential_requires_username_and_password_together() {
        assert!(credential(&settings(Some("root"), None)).is_err());
        assert!(credential(&settings(None, Some("example"))).is_err());
    }

    #[test]
    fn credential_uses_auth_source() {
        let credential = credential(&settings(Some("root"), Some("example")))
            .unwrap()
            .unwrap();
        assert_eq!(credential.username.as_deref(), Some("root"));
        assert_eq!(credential.source.as_deref(), Some("admin"));
    }

    #[test]
    fn no_credential_when_unauthenticated() {
        assert!(credential(&settings(None, None)).unwrap().is_none());
    }

    #[test]
    fn users_info_reply_ignores_server_fields() {
        let reply = doc! {
            "users": [{
                "_id": "blog-db.blog-db-user",
                "user": "blog-db-user",
                "db": "blog-db",
                "mechanisms": ["SCRAM-SHA-1", "SCRAM-SHA-256"],
                "roles": [{ "role": "readWrite", "db": "blog-db" }],
            }],
            "ok": 1.0,
        };
        let reply: UsersInfoReply = bson::from_document(reply).unwrap();
        assert_eq!(
            reply.users,
            vec![UserRecord {
                user: "blog-db-user".to_string(),
                db: "blog-db".to_string(),
                roles: vec![RoleGrant::read_write("blog-db")],
            }]
        );
    }
}
