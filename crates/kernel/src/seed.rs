//! Seed requests, role grants, and the fixture document.

use serde::{Deserialize, Serialize};

/// The only role ever granted to a seeded user.
pub const READ_WRITE_ROLE: &str = "readWrite";

/// Collection created by the fixture step.
pub const FIXTURE_COLLECTION: &str = "dummy";

/// Value stored in the single fixture document.
pub const FIXTURE_VALUE: &str = "This is a dummy document";

/// A database/user/password triple to provision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedRequest {
    pub database: String,
    pub username: String,
    pub password: String,
}

impl SeedRequest {
    pub fn new(
        database: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// The grant for this request: `readWrite` on its own database.
    pub fn role(&self) -> RoleGrant {
        RoleGrant::read_write(&self.database)
    }

    /// Copy of the request with the password masked, for display.
    pub fn redacted(&self) -> Self {
        Self {
            password: "********".to_string(),
            ..self.clone()
        }
    }
}

/// A role scoped to one database, in the server's `{ role, db }` shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    pub role: String,
    pub db: String,
}

impl RoleGrant {
    pub fn read_write(db: impl Into<String>) -> Self {
        Self {
            role: READ_WRITE_ROLE.to_string(),
            db: db.into(),
        }
    }
}

/// A user as reported back by the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user: String,
    pub db: String,
    #[serde(default)]
    pub roles: Vec<RoleGrant>,
}

/// Body of a fixture document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureDocument {
    pub value: String,
}

/// A collection plus the one document seeded into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    pub collection: String,
    pub document: FixtureDocument,
}

impl Fixture {
    /// The `dummy` collection with its placeholder document.
    pub fn dummy() -> Self {
        Self {
            collection: FIXTURE_COLLECTION.to_string(),
            document: FixtureDocument {
                value: FIXTURE_VALUE.to_string(),
            },
        }
    }
}

/// Which flavour of the seed script to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// Users and roles only.
    UsersOnly,
    /// Users and roles, then the `dummy` collection with one document.
    #[default]
    WithFixture,
}

impl Variant {
    pub fn fixture(self) -> Option<Fixture> {
        match self {
            Variant::UsersOnly => None,
            Variant::WithFixture => Some(Fixture::dummy()),
        }
    }
}
