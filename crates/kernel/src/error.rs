//! Error types shared by every provisioner backend

use thiserror::Error;

/// Failures surfaced while seeding or verifying a database
#[derive(Error, Debug)]
pub enum SeedError {
    #[error("user '{user}' already exists on database '{database}'")]
    UserExists { database: String, user: String },

    #[error("collection '{collection}' already exists in database '{database}'")]
    CollectionExists {
        database: String,
        collection: String,
    },

    #[error("verification failed: {message}")]
    Verification { message: String },

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl SeedError {
    /// Create a user-exists error
    pub fn user_exists(database: impl Into<String>, user: impl Into<String>) -> Self {
        Self::UserExists {
            database: database.into(),
            user: user.into(),
        }
    }

    /// Create a collection-exists error
    pub fn collection_exists(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self::CollectionExists {
            database: database.into(),
            collection: collection.into(),
        }
    }

    /// Create a verification error
    pub fn verification(message: impl Into<String>) -> Self {
        Self::Verification {
            message: message.into(),
        }
    }
}
